//! Writing generated classes to disk.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::GenError;
use crate::php::{Emit, PhpFile};

/// Sink for generated files.
pub trait Writer {
    /// Write every file, returning how many were written.
    fn write(&mut self, files: &[PhpFile]) -> Result<usize, GenError>;
}

/// Writes one `.php` file per class under a base directory.
///
/// Paths follow PSR-4: the class `App\AwsGen\S3\S3Client` lands at
/// `App/AwsGen/S3/S3Client.php` relative to the base directory. When the
/// autoloader already maps a namespace prefix onto the base directory, set
/// [`DirWriter::psr4_prefix`] to strip that prefix from every path.
#[derive(Debug)]
pub struct DirWriter {
    dir: PathBuf,
    psr4_prefix: Option<PathBuf>,
}

impl DirWriter {
    /// `create` makes the base directory (and parents) instead of requiring
    /// it to exist.
    pub fn new(dir: &Path, create: bool) -> Result<Self, GenError> {
        if create {
            fs::create_dir_all(dir).map_err(|source| GenError::Write {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        if !dir.is_dir() {
            return Err(GenError::NotADirectory {
                path: dir.to_path_buf(),
            });
        }
        let dir = dir.canonicalize().map_err(|source| GenError::Read {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            dir,
            psr4_prefix: None,
        })
    }

    /// Namespace prefix the autoloader maps onto the base directory,
    /// e.g. `App\` for `"psr-4": {"App\\": "src/"}`.
    pub fn psr4_prefix(mut self, prefix: &str) -> Self {
        let prefix = prefix.trim_matches('\\');
        self.psr4_prefix = if prefix.is_empty() {
            None
        } else {
            Some(prefix.split('\\').collect())
        };
        self
    }

    /// The canonicalized base directory.
    pub fn resolved_dir(&self) -> &Path {
        &self.dir
    }
}

impl Writer for DirWriter {
    fn write(&mut self, files: &[PhpFile]) -> Result<usize, GenError> {
        let mut written = 0;
        for file in files {
            let rel = PathBuf::from(file.path());
            let rel = match &self.psr4_prefix {
                Some(prefix) => rel.strip_prefix(prefix).unwrap_or(&rel).to_path_buf(),
                None => rel,
            };
            let dest = self.dir.join(rel);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|source| GenError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            fs::write(&dest, file.emit()).map_err(|source| GenError::Write {
                path: dest.clone(),
                source,
            })?;
            debug!(path = %dest.display(), "wrote file");
            written += 1;
        }
        info!(written, dir = %self.dir.display(), "wrote generated classes");
        Ok(written)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::php::{ClassKind, PhpClass};

    fn file(namespace: &str, name: &str) -> PhpFile {
        PhpFile::new(PhpClass::new(ClassKind::Class, namespace, name))
    }

    #[test]
    fn test_write_creates_nested_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let mut writer = DirWriter::new(tmp.path(), false).unwrap();
        let files = vec![
            file("App\\AwsGen", "AbstractInput"),
            file("App\\AwsGen\\S3", "S3Client"),
        ];
        let written = writer.write(&files).unwrap();
        assert_eq!(written, 2);
        assert!(tmp.path().join("App/AwsGen/AbstractInput.php").is_file());
        let client = fs::read_to_string(tmp.path().join("App/AwsGen/S3/S3Client.php")).unwrap();
        assert!(client.starts_with("<?php\n\nnamespace App\\AwsGen\\S3;\n"));
    }

    #[test]
    fn test_psr4_prefix_strips_leading_segments() {
        let tmp = tempfile::tempdir().unwrap();
        let mut writer = DirWriter::new(tmp.path(), false)
            .unwrap()
            .psr4_prefix("App\\");
        writer.write(&[file("App\\AwsGen\\S3", "S3Client")]).unwrap();
        assert!(tmp.path().join("AwsGen/S3/S3Client.php").is_file());
        assert!(!tmp.path().join("App").exists());
    }

    #[test]
    fn test_missing_directory_without_create_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("out");
        let err = DirWriter::new(&missing, false).unwrap_err();
        assert!(matches!(err, GenError::NotADirectory { .. }));
        DirWriter::new(&missing, true).unwrap();
        assert!(missing.is_dir());
    }

    #[test]
    fn test_rewrite_is_byte_identical() {
        let tmp = tempfile::tempdir().unwrap();
        let mut writer = DirWriter::new(tmp.path(), false).unwrap();
        let files = vec![file("App\\AwsGen\\S3", "Bucket")];
        writer.write(&files).unwrap();
        let path = tmp.path().join("App/AwsGen/S3/Bucket.php");
        let first = fs::read(&path).unwrap();
        writer.write(&files).unwrap();
        assert_eq!(fs::read(&path).unwrap(), first);
    }
}
