mod scan_executor;

pub use scan_executor::{ScanError, ScanExecutor, ScanExecutorCreationError};
