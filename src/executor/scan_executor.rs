use std::num::NonZeroUsize;
use std::path::PathBuf;

use compio::dispatcher::{Dispatcher, DispatcherBuilder};
use futures::future::join_all;
use futures_channel::oneshot::Receiver;
use snafu::{ResultExt, Snafu};
use tracing::{debug, info};

use crate::index::{Index, IndexError, ScanOptions, index_tree};

/// Runs independent tree scans on dedicated worker threads and waits for all
/// of them before handing back the indices.
pub struct ScanExecutor {
    dispatcher: Dispatcher,
}

impl ScanExecutor {
    /// Creates an executor with one worker thread per root to scan
    pub fn for_roots(root_count: usize) -> Result<Self, ScanExecutorCreationError> {
        let workers_num = NonZeroUsize::new(root_count).unwrap_or(NonZeroUsize::MIN);
        debug!("Using {} worker threads for scanning", workers_num);

        let dispatcher = DispatcherBuilder::new()
            .worker_threads(workers_num)
            .build()
            .context(DispatcherSnafu)?;

        Ok(Self { dispatcher })
    }

    /// Scans every root concurrently and returns the indices in root order.
    ///
    /// Completion is only synchronized at the end; the first failing root (in
    /// root order) is reported.
    pub async fn scan_all(
        &self,
        roots: &[PathBuf],
        options: ScanOptions,
    ) -> Result<Vec<Index>, ScanError> {
        let receivers = roots
            .iter()
            .map(|root| self.dispatch_scan(root.clone(), options))
            .collect::<Result<Vec<_>, _>>()?;

        let results = join_all(receivers).await;
        debug!("All {} scans finished", results.len());

        results
            .into_iter()
            .zip(roots)
            .map(|(result, root)| {
                result
                    .context(CanceledSnafu { path: root.clone() })?
                    .context(IndexSnafu)
            })
            .collect()
    }

    fn dispatch_scan(
        &self,
        root: PathBuf,
        options: ScanOptions,
    ) -> Result<Receiver<Result<Index, IndexError>>, ScanError> {
        let path = root.clone();

        let receiver = self
            .dispatcher
            .dispatch(move || async move { index_tree(&root, &options) })
            .map_err(|e| ScanError::DispatchError {
                path: path.clone(),
                error: e.to_string(),
            })?;

        info!("Dispatched scan of {}", path.display());
        Ok(receiver)
    }
}

#[derive(Debug, Snafu)]
pub enum ScanExecutorCreationError {
    #[snafu(display("Failed to create scan dispatcher"))]
    DispatcherError { source: std::io::Error },
}

#[derive(Debug, Snafu)]
pub enum ScanError {
    #[snafu(display("Failed to dispatch scan of {}: {}", path.display(), error))]
    DispatchError { path: PathBuf, error: String },
    #[snafu(display("Scan of {} got cancelled", path.display()))]
    CanceledError {
        path: PathBuf,
        source: futures_channel::oneshot::Canceled,
    },
    #[snafu(display("Failed to index tree"))]
    IndexError { source: IndexError },
}
