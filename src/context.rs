//! Run-scoped settings, passed explicitly to every stage.

use crate::config::BackfillConfig;
use crate::formats::FormatTable;

#[derive(Debug, Clone)]
pub struct RunContext {
    /// Accept every folder's copy list without prompting.
    pub auto_confirm: bool,
    /// Plan and print, but neither prompt nor copy.
    pub dry_run: bool,
    /// `-v` count; 0 is the default level.
    pub verbosity: u8,
    pub config: BackfillConfig,
    /// Extension table derived from `config`.
    pub formats: FormatTable,
}

impl RunContext {
    pub fn new(config: BackfillConfig) -> Self {
        let formats = config.format_table();
        Self {
            auto_confirm: false,
            dry_run: false,
            verbosity: 0,
            config,
            formats,
        }
    }

    pub fn auto_confirm(mut self, yes: bool) -> Self {
        self.auto_confirm = yes;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Log level for this verbosity: info by default, `-v` debug, `-vv` trace.
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbosity {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new(BackfillConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::ExtensionClass;

    #[test]
    fn formats_follow_config() {
        let mut config = BackfillConfig::default();
        config.formats.extra_compressed = vec!["avif".into()];
        let ctx = RunContext::new(config);
        assert_eq!(ctx.formats.classify("a.avif"), ExtensionClass::Compressed);
    }

    #[test]
    fn verbosity_maps_to_log_level() {
        assert_eq!(RunContext::default().log_level(), log::LevelFilter::Info);
        assert_eq!(
            RunContext::default().verbosity(1).log_level(),
            log::LevelFilter::Debug
        );
        assert_eq!(
            RunContext::default().verbosity(5).log_level(),
            log::LevelFilter::Trace
        );
    }
}
