use std::path::PathBuf;

use crate::cli::Cli;
use crate::index::ScanOptions;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub original: PathBuf,
    pub new: PathBuf,
    pub output: PathBuf,
    pub verbose: bool,
    pub case_insensitive: bool,
}

impl RuntimeConfig {
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            case_insensitive: self.case_insensitive,
            verbose: self.verbose,
        }
    }
}

impl From<Cli> for RuntimeConfig {
    fn from(cli: Cli) -> Self {
        Self {
            original: PathBuf::from(cli.orig),
            new: PathBuf::from(cli.new),
            output: cli.out,
            verbose: cli.verbose,
            case_insensitive: cli.icase,
        }
    }
}
