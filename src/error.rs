use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AblistError {
    #[error("{context}: {source}")]
    Network {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{context}: {source}")]
    Parse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cached manifest not found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("{context}: {source}")]
    Filesystem {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl AblistError {
    pub fn network(context: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            context: context.into(),
            source,
        }
    }

    pub fn parse(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Parse {
            context: context.into(),
            source,
        }
    }

    pub fn filesystem(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Filesystem {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, AblistError>;
