//! Best-effort transfer of diff results into the output directory.

mod copier;

pub use copier::{CopySummary, copy_all};
