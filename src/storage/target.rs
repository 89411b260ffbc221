use crate::error::StorageError;
use std::path::{Path, PathBuf};
use url::Url;

/// Where persistent storage lives, as parsed from a connection string
#[derive(Debug, Clone, PartialEq)]
pub enum StorageTarget {
    /// A sqlite database backed by a file on the local disk
    File { url: String, path: PathBuf },
    /// A sqlite database held in process memory
    Memory { url: String },
    /// A network database server (postgres and friends)
    Remote { url: String },
}

impl StorageTarget {
    pub fn parse(url: &str) -> Result<Self, StorageError> {
        let url = url.trim();

        if let Some(rest) = url.strip_prefix("sqlite:") {
            let rest = rest.strip_prefix("//").unwrap_or(rest);
            let rest = rest.split('?').next().unwrap_or_default();

            if rest.is_empty() || rest == ":memory:" {
                return Ok(StorageTarget::Memory {
                    url: url.to_string(),
                });
            }

            return Ok(StorageTarget::File {
                url: url.to_string(),
                path: PathBuf::from(rest),
            });
        }

        let parsed = Url::parse(url).map_err(|e| StorageError::InvalidTarget {
            target: redact(url),
            details: e.to_string(),
        })?;

        if parsed.host_str().is_none() {
            return Err(StorageError::InvalidTarget {
                target: redact(url),
                details: "missing host".to_string(),
            });
        }

        Ok(StorageTarget::Remote {
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        match self {
            StorageTarget::File { url, .. }
            | StorageTarget::Memory { url }
            | StorageTarget::Remote { url } => url,
        }
    }

    /// Connection string safe to log
    pub fn redacted(&self) -> String {
        redact(self.url())
    }

    pub fn is_file_backed(&self) -> bool {
        matches!(self, StorageTarget::File { .. })
    }

    pub fn file_path(&self) -> Option<&Path> {
        match self {
            StorageTarget::File { path, .. } => Some(path),
            _ => None,
        }
    }

    /// True for a file-backed target whose file is not on disk yet
    pub fn is_missing_file(&self) -> bool {
        self.file_path().is_some_and(|path| !path.exists())
    }
}

/// Replace the password component of a URL-form connection string
pub fn redact(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) if parsed.password().is_some() => {
            if parsed.set_password(Some("***")).is_ok() {
                parsed.to_string()
            } else {
                url.to_string()
            }
        }
        _ => url.to_string(),
    }
}
