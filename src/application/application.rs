use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use compio::fs;
use snafu::Snafu;
use snafu::prelude::*;
use tracing::{debug, info, warn};

use crate::application::RuntimeConfig;
use crate::copier::{CopySummary, copy_all};
use crate::diff::diff;
use crate::executor::{ScanError, ScanExecutor, ScanExecutorCreationError};
use crate::index::Index;

pub struct Application;

impl Application {
    pub async fn run(
        app_config: impl Into<RuntimeConfig>,
    ) -> Result<CopySummary, ApplicationError> {
        let app_config: RuntimeConfig = app_config.into();
        debug!("Runtime config: {:?}", app_config);

        Self::prepare_destination(&app_config.output).await?;

        info!(
            "Starting to compare dir {} with {} and writing files to {}",
            app_config.original.display(),
            app_config.new.display(),
            app_config.output.display()
        );

        let roots = vec![
            absolute(&app_config.original)?,
            absolute(&app_config.new)?,
        ];

        let executor = ScanExecutor::for_roots(roots.len()).context(ScanExecutorCreationSnafu)?;
        let indices = executor
            .scan_all(&roots, app_config.scan_options())
            .await
            .context(ScanSnafu)?;
        let [original_index, new_index]: [Index; 2] =
            indices
                .try_into()
                .map_err(|indices: Vec<Index>| ApplicationError::MissingIndex {
                    count: indices.len(),
                })?;
        debug!(
            "Indexed {} original and {} new files",
            original_index.len(),
            new_index.len()
        );

        let summary = copy_all(
            &app_config.output,
            diff(&original_index, &new_index),
            app_config.verbose,
        )
        .await;

        if summary.failed > 0 {
            warn!("Finished with errors: {}", summary);
        } else {
            info!("Finished: {}", summary);
        }

        Ok(summary)
    }

    /// Makes sure the output directory exists, creating it (non-recursively)
    /// when missing
    async fn prepare_destination(output: &Path) -> Result<(), ApplicationError> {
        match fs::metadata(output).await {
            Ok(metadata) if metadata.is_dir() => Ok(()),
            Ok(_) => DestinationNotDirectorySnafu {
                path: output.to_path_buf(),
            }
            .fail(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("Creating output directory {}", output.display());
                fs::create_dir(output).await.context(DestinationCreateSnafu {
                    path: output.to_path_buf(),
                })
            }
            Err(e) => Err(e).context(DestinationStatusSnafu {
                path: output.to_path_buf(),
            }),
        }
    }
}

fn absolute(path: &Path) -> Result<PathBuf, ApplicationError> {
    std::path::absolute(path).context(AbsolutePathSnafu {
        path: path.to_path_buf(),
    })
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Error when checking for destination folder {}", path.display()))]
    DestinationStatusError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Could not create output directory {}", path.display()))]
    DestinationCreateError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Output path {} is not a directory", path.display()))]
    DestinationNotDirectory { path: PathBuf },
    #[snafu(display("Failed to resolve absolute path of {}", path.display()))]
    AbsolutePathError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Critical failure encountered during scanner creation"))]
    ScanExecutorCreationError { source: ScanExecutorCreationError },
    #[snafu(display("Critical failure encountered while scanning the trees"))]
    ScanError { source: ScanError },
    /// Guards the two-index destructuring; `scan_all` yields one index per root
    #[snafu(display("Expected 2 indices from scanning, got {}", count))]
    MissingIndex { count: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs as std_fs;
    use tempfile::TempDir;

    struct Fixture {
        _temp_dir: TempDir,
        original: PathBuf,
        new: PathBuf,
        output: PathBuf,
    }

    impl Fixture {
        fn new(original_files: &[(&str, &str)], new_files: &[(&str, &str)]) -> Self {
            let temp_dir = TempDir::new().expect("Failed to create temp directory");
            let original = temp_dir.path().join("orig");
            let new = temp_dir.path().join("new");
            let output = temp_dir.path().join("out");
            write_tree(&original, original_files);
            write_tree(&new, new_files);
            Self {
                _temp_dir: temp_dir,
                original,
                new,
                output,
            }
        }

        fn config(&self, case_insensitive: bool) -> RuntimeConfig {
            RuntimeConfig {
                original: self.original.clone(),
                new: self.new.clone(),
                output: self.output.clone(),
                verbose: true,
                case_insensitive,
            }
        }

        fn output_files(&self) -> HashSet<String> {
            std_fs::read_dir(&self.output)
                .expect("Output directory should exist")
                .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
                .collect()
        }
    }

    fn write_tree(root: &Path, files: &[(&str, &str)]) {
        std_fs::create_dir_all(root).unwrap();
        for (relative, content) in files {
            let path = root.join(relative);
            std_fs::create_dir_all(path.parent().unwrap()).unwrap();
            std_fs::write(path, content).unwrap();
        }
    }

    fn names(names: &[&str]) -> HashSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[compio::test]
    async fn superset_original_copies_nothing() {
        let fixture = Fixture::new(
            &[("a.txt", "1"), ("deep/b.txt", "2"), ("c.txt", "3")],
            &[("a.txt", "changed"), ("other/b.txt", "2")],
        );

        let summary = Application::run(fixture.config(false)).await.unwrap();

        assert_eq!(summary, CopySummary::default());
        assert!(fixture.output_files().is_empty());
    }

    #[compio::test]
    async fn disjoint_trees_copy_every_new_file_flat() {
        let fixture = Fixture::new(
            &[("old.txt", "old")],
            &[("one.txt", "first"), ("nested/dir/two.txt", "second")],
        );

        let summary = Application::run(fixture.config(false)).await.unwrap();

        assert_eq!(summary.copied, 2);
        assert_eq!(fixture.output_files(), names(&["one.txt", "two.txt"]));
        assert_eq!(
            std_fs::read_to_string(fixture.output.join("two.txt")).unwrap(),
            "second"
        );
    }

    #[compio::test]
    async fn second_run_into_existing_output_is_identical() {
        let fixture = Fixture::new(&[("a.txt", "a")], &[("a.txt", "a"), ("b.txt", "b")]);

        let first = Application::run(fixture.config(false)).await.unwrap();
        let second = Application::run(fixture.config(false)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(fixture.output_files(), names(&["b.txt"]));
        assert_eq!(
            std_fs::read_to_string(fixture.output.join("b.txt")).unwrap(),
            "b"
        );
    }

    #[compio::test]
    async fn case_insensitive_mode_matches_differently_cased_names() {
        let fixture = Fixture::new(&[("Foo.txt", "foo")], &[("foo.txt", "foo")]);

        let summary = Application::run(fixture.config(true)).await.unwrap();
        assert_eq!(summary.copied, 0);
        assert!(fixture.output_files().is_empty());

        let summary = Application::run(fixture.config(false)).await.unwrap();
        assert_eq!(summary.copied, 1);
        assert_eq!(fixture.output_files(), names(&["foo.txt"]));
    }

    #[compio::test]
    async fn colliding_new_names_copy_exactly_one_file() {
        let fixture = Fixture::new(&[], &[("a/x.txt", "from a"), ("b/x.txt", "from b")]);

        let summary = Application::run(fixture.config(false)).await.unwrap();

        assert_eq!(summary.copied, 1);
        assert_eq!(fixture.output_files(), names(&["x.txt"]));
        let content = std_fs::read_to_string(fixture.output.join("x.txt")).unwrap();
        assert!(content == "from a" || content == "from b");
    }

    #[compio::test]
    async fn failed_copy_does_not_block_the_rest() {
        let fixture = Fixture::new(&[], &[("blocked.txt", "x"), ("fine.txt", "fine")]);
        std_fs::create_dir_all(fixture.output.join("blocked.txt")).unwrap();

        let summary = Application::run(fixture.config(false)).await.unwrap();

        assert_eq!(summary.copied, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(
            std_fs::read_to_string(fixture.output.join("fine.txt")).unwrap(),
            "fine"
        );
    }

    #[cfg(unix)]
    #[compio::test]
    async fn non_utf8_names_are_compared_byte_for_byte() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let fixture = Fixture::new(&[], &[]);
        let existing = OsStr::from_bytes(b"a\xff");
        let added = OsStr::from_bytes(b"a\xfe");
        std_fs::write(fixture.original.join(existing), "old").unwrap();
        std_fs::write(fixture.new.join(added), "new").unwrap();

        let summary = Application::run(fixture.config(false)).await.unwrap();

        assert_eq!(summary.copied, 1);
        assert_eq!(std_fs::read(fixture.output.join(added)).unwrap(), b"new");
        assert!(!fixture.output.join(existing).exists());
    }

    #[compio::test]
    async fn output_inside_new_tree_keeps_content_across_runs() {
        let fixture = Fixture::new(&[], &[("x.txt", "payload")]);
        let mut config = fixture.config(false);
        config.output = fixture.new.join("file_diff");

        let first = Application::run(config.clone()).await.unwrap();
        let second = Application::run(config.clone()).await.unwrap();

        assert_eq!(first.copied, 1);
        assert_eq!(second.failed, 0);
        assert_eq!(second.copied + second.skipped, 1);
        assert_eq!(
            std_fs::read_to_string(config.output.join("x.txt")).unwrap(),
            "payload"
        );
        assert_eq!(
            std_fs::read_to_string(fixture.new.join("x.txt")).unwrap(),
            "payload"
        );
    }

    #[compio::test]
    async fn missing_original_tree_is_fatal() {
        let fixture = Fixture::new(&[], &[("a.txt", "a")]);
        std_fs::remove_dir(&fixture.original).unwrap();

        let result = Application::run(fixture.config(false)).await;

        assert!(matches!(result, Err(ApplicationError::ScanError { .. })));
        assert!(fixture.output_files().is_empty());
    }

    #[compio::test]
    async fn output_path_that_is_a_file_is_fatal() {
        let fixture = Fixture::new(&[], &[("a.txt", "a")]);
        std_fs::write(&fixture.output, "not a directory").unwrap();

        let result = Application::run(fixture.config(false)).await;

        assert!(matches!(
            result,
            Err(ApplicationError::DestinationNotDirectory { .. })
        ));
    }

    #[compio::test]
    async fn output_with_missing_parent_is_fatal() {
        let fixture = Fixture::new(&[], &[("a.txt", "a")]);
        let mut config = fixture.config(false);
        config.output = fixture.output.join("missing/parent");

        let result = Application::run(config).await;

        assert!(matches!(
            result,
            Err(ApplicationError::DestinationCreateError { .. })
        ));
    }
}
