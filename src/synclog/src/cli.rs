use clap::{Parser, Subcommand};

use crate::cmd::*;

mod args;

/// The CLI interface for the synclog application.
#[derive(Debug, Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
pub struct Cli {
    /// The selected command.
    #[clap(subcommand)]
    pub command: SynclogCommand,

    #[clap(flatten)]
    pub verbosity: args::Verbosity,
}

/// The top-level commands supported by synclog.
#[derive(Debug, Subcommand)]
pub enum SynclogCommand {
    Run(run::Run),
    Verify(verify::Verify),
}

impl Command for SynclogCommand {
    fn handle(self) -> eyre::Result<()> {
        match self {
            Self::Run(run) => run.handle(),
            Self::Verify(verify) => verify.handle(),
        }
    }
}
