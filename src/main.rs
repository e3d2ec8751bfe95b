use clap::{Parser, Subcommand};
use raw_backfill::confirm::{Gate, Prompter};
use raw_backfill::context::RunContext;
use raw_backfill::identity::ExifReader;
use raw_backfill::run::{self, CameraSources};
use raw_backfill::{config, output};
use std::path::PathBuf;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Called once per process.
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "raw-backfill")]
#[command(about = "Copy RAW originals from camera storage next to their curated previews")]
#[command(long_about = "\
Copy RAW originals from camera storage next to their curated previews

You sort and select JPEG/HEIC previews into a material folder tree. This tool
finds, for every preview without a RAW sibling, the RAW file on the camera
card that was shot together with it and copies it into the same folder.

  material/                       camera card
  ├── 2024-spring/                DCIM/
  │   ├── IMG_0001.JPG            ├── 100CANON/
  │   ├── IMG_0001.CR2   ◀────────│   ├── IMG_0001.CR2
  │   └── IMG_0004.JPG            │   ├── IMG_0002.CR2
  └── ...                         │   └── IMG_0004.CR2

A RAW file is only copied when its name matches the preview AND its camera
make, model and capture time match the preview's EXIF data. Files already
present are never overwritten.

Run 'raw-backfill gen-config' to print a documented raw-backfill.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Camera storage roots (paths, or drive letters on Windows).
    /// Discovered automatically when omitted.
    #[arg(short, long, num_args = 1..)]
    source: Vec<String>,

    /// Material folder [default: current directory]
    #[arg(short, long)]
    destination: Option<PathBuf>,

    /// Import every folder's RAW files without asking
    #[arg(short, long)]
    yes: bool,

    /// Show planned copies without prompting or copying
    #[arg(long)]
    dry_run: bool,

    /// Ask to run again after each run
    #[arg(long)]
    repeat: bool,

    /// Write a JSON summary of each run to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Config file [default: <destination>/raw-backfill.toml if present]
    #[arg(long)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print a stock raw-backfill.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::GenConfig) = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let material_root = match cli.destination {
        Some(ref dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let config = match cli.config {
        Some(ref path) => config::load_config_file(path)?,
        None => config::load_config(&material_root)?,
    };
    let ctx = RunContext::new(config)
        .auto_confirm(cli.yes)
        .dry_run(cli.dry_run)
        .verbosity(cli.verbose);
    init_logging(&ctx);

    let mut prompter = Prompter::stdio();
    loop {
        let sources = CameraSources::from_tokens(&cli.source);
        let summary = {
            let mut gate = if ctx.auto_confirm {
                Gate::Auto
            } else {
                Gate::Interactive(&mut prompter)
            };
            run::run(&ctx, &material_root, &sources, &ExifReader, &mut gate)?
        };

        output::print_summary(&summary, ctx.verbosity > 0);
        if let Some(ref path) = cli.report {
            std::fs::write(path, serde_json::to_string_pretty(&summary)?)?;
        }

        if !cli.repeat || !prompter.confirm("Run again?", None, &[], false)? {
            break;
        }
    }

    Ok(())
}

/// Info by default; `-v`/`-vv` raise it, and `RUST_LOG` overrides both.
fn init_logging(ctx: &RunContext) {
    env_logger::Builder::new()
        .filter_level(ctx.log_level())
        .parse_default_env()
        .init();
}
