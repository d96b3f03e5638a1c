use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use compio::BufResult;
use compio::fs::File;
use compio::io::{AsyncReadAt, AsyncWriteAtExt};
use derive_more::Display;
use snafu::{ResultExt, Snafu};
use tracing::{debug, error, info, warn};

use crate::index::FileEntry;

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Outcome of a best-effort copy run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
#[display("{copied} files copied ({bytes} bytes), {skipped} skipped, {failed} failed")]
pub struct CopySummary {
    pub copied: usize,
    /// Files already sitting at their destination
    pub skipped: usize,
    pub failed: usize,
    pub bytes: u64,
}

/// Copies `source_dir/file_name` to `dest_dir/file_name`, replacing any
/// existing destination file. Returns the number of bytes written.
///
/// Refuses to copy a file onto itself, which happens when the output
/// directory lives inside the scanned tree. A failure part way through
/// leaves the partial destination file behind.
pub async fn copy_file(
    dest_dir: &Path,
    source_dir: &Path,
    file_name: &OsStr,
) -> Result<u64, CopyError> {
    let source_path = source_dir.join(file_name);
    let dest_path = dest_dir.join(file_name);

    let source = File::open(&source_path).await.context(OpenSourceSnafu {
        path: source_path.clone(),
    })?;
    // Creating the destination truncates it, so this has to come first
    if is_same_file(&source_path, &dest_path) {
        return SameFileSnafu { path: dest_path }.fail();
    }
    let mut destination = File::create(&dest_path)
        .await
        .context(CreateDestinationSnafu {
            path: dest_path.clone(),
        })?;

    let bytes = stream(&source, &mut destination)
        .await
        .context(TransferSnafu {
            from: source_path,
            to: dest_path,
        })?;

    Ok(bytes)
}

fn is_same_file(source: &Path, destination: &Path) -> bool {
    match (
        std::fs::canonicalize(source),
        std::fs::canonicalize(destination),
    ) {
        (Ok(source), Ok(destination)) => source == destination,
        _ => false,
    }
}

async fn stream(source: &File, destination: &mut File) -> std::io::Result<u64> {
    let mut buffer: Vec<u8> = Vec::with_capacity(COPY_BUFFER_SIZE);
    let mut position = 0u64;

    loop {
        buffer.clear();
        let BufResult(read, returned) = source.read_at(buffer, position).await;
        buffer = returned;
        if read? == 0 {
            return Ok(position);
        }

        let BufResult(written, returned) = destination.write_all_at(buffer, position).await;
        buffer = returned;
        written?;
        position += buffer.len() as u64;
    }
}

/// Copies every entry into `dest_dir` one after another.
///
/// A failed copy is logged and skipped; it never stops the remaining entries.
pub async fn copy_all<'a>(
    dest_dir: &Path,
    entries: impl IntoIterator<Item = &'a FileEntry>,
    verbose: bool,
) -> CopySummary {
    let mut summary = CopySummary::default();

    for entry in entries {
        if verbose {
            info!("Found diff file {}", entry.name.to_string_lossy());
        }

        match copy_file(dest_dir, &entry.directory, entry.file_name()).await {
            Ok(bytes) => {
                debug!("Copied {} ({} bytes)", entry.path().display(), bytes);
                summary.copied += 1;
                summary.bytes += bytes;
            }
            Err(CopyError::SameFileError { path }) => {
                warn!("Skipping {}, it is already in the output directory", path.display());
                summary.skipped += 1;
            }
            Err(e) => {
                error!("{}", snafu::Report::from_error(e));
                summary.failed += 1;
            }
        }
    }

    summary
}

#[derive(Debug, Snafu)]
pub enum CopyError {
    #[snafu(display("Cannot open {}", path.display()))]
    OpenSourceError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Could not create {}", path.display()))]
    CreateDestinationError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("{} is both source and destination", path.display()))]
    SameFileError { path: PathBuf },
    #[snafu(display("Could not copy {} to {}", from.display(), to.display()))]
    TransferError {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}
