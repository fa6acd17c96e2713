use clap::{ArgAction, Args};
use log::LevelFilter;
use simple_logger::SimpleLogger;

/// Log output settings shared by every subcommand.
#[derive(Clone, Copy, Debug, Args)]
pub struct Verbosity {
    /// Logs more detail: `-v` adds per-worker progress, `-vv` every
    /// single record.
    #[clap(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Logs less: `-q` keeps warnings and errors, `-qq` only errors,
    /// `-qqq` silences logging.
    #[clap(
        short,
        long,
        action = ArgAction::Count,
        global = true,
        conflicts_with = "verbose"
    )]
    pub quiet: u8,
}

impl Verbosity {
    /// Installs `simple_logger` as the global logger.
    pub fn setup(self) -> eyre::Result<()> {
        SimpleLogger::new().with_level(self.level_filter()).init()?;
        Ok(())
    }

    fn level_filter(self) -> LevelFilter {
        match i16::from(self.verbose) - i16::from(self.quiet) {
            ..=-3 => LevelFilter::Off,
            -2 => LevelFilter::Error,
            -1 => LevelFilter::Warn,
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
