//! Multipart upload parts

use std::path::{Path, PathBuf};

use tokio::fs::File;

use crate::error::Error;

/// A file to upload and the form field it is sent under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartParameter {
    /// Path of the file on disk
    pub file_path: PathBuf,
    /// Form field name
    pub parameter_key: String,
}

impl MultipartParameter {
    /// Create a new [`MultipartParameter`]
    pub fn new(file_path: impl Into<PathBuf>, parameter_key: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            parameter_key: parameter_key.into(),
        }
    }

    /// File name sent in the part's `Content-Disposition`
    pub fn file_name(&self) -> String {
        self.file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.parameter_key.clone())
    }
}

/// An opened upload part with its size known up front
#[derive(Debug)]
pub struct OpenPart {
    /// Form field name
    pub parameter_key: String,
    /// File name
    pub file_name: String,
    /// Open file handle
    pub file: File,
    /// Size in bytes
    pub len: u64,
}

async fn open(path: &Path) -> Result<(File, u64), Error> {
    let file = File::open(path).await.map_err(|err| {
        tracing::warn!("Could not open upload part {}: {err}", path.display());
        err
    })?;
    let len = file.metadata().await?.len();
    Ok((file, len))
}

/// Open every part, failing on the first unreadable file
pub async fn open_all(parameters: &[MultipartParameter]) -> Result<Vec<OpenPart>, Error> {
    let mut parts = Vec::with_capacity(parameters.len());
    for parameter in parameters {
        let (file, len) = open(&parameter.file_path).await?;
        parts.push(OpenPart {
            parameter_key: parameter.parameter_key.clone(),
            file_name: parameter.file_name(),
            file,
            len,
        });
    }
    Ok(parts)
}

/// Sum of the part sizes
pub fn total_len(parts: &[OpenPart]) -> u64 {
    parts.iter().map(|part| part.len).sum()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_file_name() {
        let parameter = MultipartParameter::new("/tmp/photos/cat.png", "avatar");
        assert_eq!(parameter.file_name(), "cat.png");

        let parameter = MultipartParameter::new("/", "avatar");
        assert_eq!(parameter.file_name(), "avatar");
    }

    #[tokio::test]
    async fn test_open_all() {
        let mut first = tempfile::NamedTempFile::new().expect("Temp file");
        first.write_all(b"hello").expect("Write");
        let mut second = tempfile::NamedTempFile::new().expect("Temp file");
        second.write_all(b"courier!").expect("Write");

        let parts = open_all(&[
            MultipartParameter::new(first.path(), "a"),
            MultipartParameter::new(second.path(), "b"),
        ])
        .await
        .expect("Files open");

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].parameter_key, "a");
        assert_eq!(parts[0].len, 5);
        assert_eq!(parts[1].len, 8);
        assert_eq!(total_len(&parts), 13);
    }

    #[tokio::test]
    async fn test_open_all_missing_file() {
        let dir = tempfile::tempdir().expect("Temp dir");
        let err = open_all(&[MultipartParameter::new(dir.path().join("missing"), "a")])
            .await
            .expect_err("File does not exist");
        assert!(matches!(err, Error::Io(_)));
    }
}
