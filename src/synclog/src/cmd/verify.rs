use std::{
    collections::BTreeMap,
    fs,
    io::{self, BufReader},
    path::{Path, PathBuf},
};

use clap::Args;
use glob::glob;
use rayon::prelude::*;
use synclog_writer::verify::{Summary, VerifyError, verify};

use super::Command;

/// Subcommand for checking that log files are well-formed.
///
/// A log passes when every line is a complete record and the counters
/// run from 0 upwards without gaps or repeats.
#[derive(Debug, Args)]
pub struct Verify {
    /// The log files to check.
    ///
    /// UNIX glob patterns are supported to check many files at once.
    input: String,

    /// Prints the summaries as JSON instead of plain text.
    #[clap(long)]
    json: bool,
}

fn verify_file(path: &Path) -> Result<Summary, VerifyError> {
    let file = fs::File::open(path)?;
    verify(BufReader::new(file))
}

fn print_summary(path: &Path, summary: &Summary) {
    println!(
        "{}: {} records from {} callers",
        path.display(),
        summary.records,
        summary.callers.len()
    );

    for (caller, records) in &summary.callers {
        println!("  {caller}: {records}");
    }
}

impl Command for Verify {
    fn handle(self) -> eyre::Result<()> {
        let paths: Vec<PathBuf> = glob(&self.input)?.collect::<Result<_, _>>()?;
        if paths.is_empty() {
            eyre::bail!("failed to find files matching '{}'", self.input);
        }

        let results: Vec<_> = paths
            .into_par_iter()
            .map(|path| {
                let result = verify_file(&path);
                (path, result)
            })
            .collect();

        let total = results.len();
        let mut passed = BTreeMap::new();
        for (path, result) in results {
            match result {
                Ok(summary) => {
                    log::debug!("'{}' passed verification", path.display());
                    passed.insert(path, summary);
                }

                Err(e) => log::error!("'{}' failed verification: {e}", path.display()),
            }
        }

        if self.json {
            let out: BTreeMap<_, _> = passed
                .iter()
                .map(|(path, summary)| (path.display().to_string(), summary))
                .collect();

            serde_json::to_writer_pretty(io::stdout().lock(), &out)?;
            println!();
        } else {
            for (path, summary) in &passed {
                print_summary(path, summary);
            }
        }

        let failed = total - passed.len();
        if failed > 0 {
            eyre::bail!("{failed} of {total} logs failed verification");
        }

        Ok(())
    }
}
