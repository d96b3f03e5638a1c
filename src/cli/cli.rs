use std::path::PathBuf;

use clap::Parser;
use clap::builder::NonEmptyStringValueParser;

use crate::application::data::LogLevel;

/// Copies files that exist in the new tree but not in the original tree.
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Cli {
    /// The directory with the original files
    #[clap(long, value_parser = NonEmptyStringValueParser::new())]
    pub orig: String,

    /// The directory with the new files
    #[clap(long, value_parser = NonEmptyStringValueParser::new())]
    pub new: String,

    /// The directory to copy the new files to
    #[clap(long, default_value = "./file_diff")]
    pub out: PathBuf,

    /// Print every visited directory and every diff file
    #[clap(long)]
    pub verbose: bool,

    /// Ignore the case of file names when comparing
    #[clap(long)]
    pub icase: bool,

    #[clap(long, short, default_value = "info", value_enum)]
    pub log_level: LogLevel,
}
