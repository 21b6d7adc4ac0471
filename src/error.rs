use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Distribution '{0}' not found in manifest\n\n\
             Hint: Check the `key` fields of the distribution manifest (bundle.json)\n\
             and make sure --dist-key matches one of them exactly.")]
    Config(String),

    #[error("Missing required configuration: {}\n\n\
             Hint: Set the environment variables listed above and run again.",
             .0.join(", "))]
    MissingConfig(Vec<String>),

    #[error("Failed to parse {prefix}_VERSION from {}: missing {}",
            path.display(), missing.join(", "))]
    VersionParse {
        path: PathBuf,
        prefix: String,
        missing: Vec<String>,
    },

    #[error("Failed to fetch module index from {url}: {reason}")]
    IndexFetch { url: String, reason: String },

    #[error("Failed to acquire {module} {version}: {reason}")]
    Acquisition {
        module: String,
        version: String,
        reason: String,
    },

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn index_fetch(url: &str, reason: impl std::fmt::Display) -> Self {
        Error::IndexFetch {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn acquisition(module: &str, version: &str, reason: impl std::fmt::Display) -> Self {
        Error::Acquisition {
            module: module.to_string(),
            version: version.to_string(),
            reason: reason.to_string(),
        }
    }
}
