//! Yes/no confirmation prompts.
//!
//! ```text
//! Material folder /photos/2024-spring will receive these RAW files:
//!     /media/card/DCIM/100CANON/IMG_0001.CR2
//!     /media/card/DCIM/100CANON/IMG_0004.CR2
//! Import? [Y/n]
//! ```
//!
//! Answers are matched case-insensitively against small accept/decline
//! vocabularies (English and Chinese). An empty answer takes the default.
//! Anything else re-prompts: garbage is never read as consent. A closed
//! input stream declines, since there is nobody left to ask.
//!
//! [`Gate::Auto`] answers without touching the console; it backs `--yes`
//! for unattended runs. Copy batches are always accepted, single questions
//! get the answer the caller picked for unattended use.

use std::io::{self, BufRead, Write};
use thiserror::Error;

const ACCEPT: &[&str] = &["y", "yes", "是", "是的", "好"];
const DECLINE: &[&str] = &["n", "no", "否", "不"];

#[derive(Error, Debug)]
pub enum ConfirmError {
    #[error("console IO error: {0}")]
    Io(#[from] io::Error),
}

/// Map a raw answer to a decision. `None` means unrecognized.
pub fn parse_answer(input: &str, default: bool) -> Option<bool> {
    let answer = input.trim().to_lowercase();
    if answer.is_empty() {
        Some(default)
    } else if ACCEPT.contains(&answer.as_str()) {
        Some(true)
    } else if DECLINE.contains(&answer.as_str()) {
        Some(false)
    } else {
        None
    }
}

/// Interactive prompt over any line source and sink.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `message` and `items`, then ask `prompt` until a recognized
    /// answer arrives.
    pub fn confirm(
        &mut self,
        prompt: &str,
        message: Option<&str>,
        items: &[String],
        default: bool,
    ) -> Result<bool, ConfirmError> {
        if let Some(message) = message {
            writeln!(self.output, "{message}")?;
        }
        for item in items {
            writeln!(self.output, "    {item}")?;
        }
        let hint = if default { "[Y/n]" } else { "[y/N]" };

        loop {
            write!(self.output, "{prompt} {hint} ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                log::warn!("input closed while waiting for an answer, declining");
                return Ok(false);
            }
            match parse_answer(&line, default) {
                Some(answer) => return Ok(answer),
                None => writeln!(self.output, "Invalid input, please answer y or n.")?,
            }
        }
    }

    /// Consume the prompter, returning the output sink.
    pub fn into_output(self) -> W {
        self.output
    }
}

/// How a run asks for permission.
pub enum Gate<'a> {
    /// Never blocks.
    Auto,
    Interactive(&'a mut dyn Confirm),
}

impl Gate<'_> {
    /// Ask for a batch of pending actions. Auto mode accepts silently.
    pub fn confirm_batch(
        &mut self,
        prompt: &str,
        message: &str,
        items: &[String],
        default: bool,
    ) -> Result<bool, ConfirmError> {
        match self {
            Gate::Auto => Ok(true),
            Gate::Interactive(c) => c.ask(prompt, Some(message), items, default),
        }
    }

    /// Ask a single question. Auto mode answers `unattended` instead of
    /// `default`, so the caller decides what `--yes` implies for it.
    pub fn ask(
        &mut self,
        prompt: &str,
        default: bool,
        unattended: bool,
    ) -> Result<bool, ConfirmError> {
        match self {
            Gate::Auto => Ok(unattended),
            Gate::Interactive(c) => c.ask(prompt, None, &[], default),
        }
    }
}

/// Object-safe face of [`Prompter`], so a [`Gate`] can hold any prompter.
pub trait Confirm {
    fn ask(
        &mut self,
        prompt: &str,
        message: Option<&str>,
        items: &[String],
        default: bool,
    ) -> Result<bool, ConfirmError>;
}

impl<R: BufRead, W: Write> Confirm for Prompter<R, W> {
    fn ask(
        &mut self,
        prompt: &str,
        message: Option<&str>,
        items: &[String],
        default: bool,
    ) -> Result<bool, ConfirmError> {
        self.confirm(prompt, message, items, default)
    }
}
