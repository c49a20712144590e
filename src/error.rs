use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::channel::TransportError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The document could not be read from disk.
    #[error("Error reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Post '{title}' has {length} characters after conversion, the limit is {limit}")]
    LengthExceeded {
        title: String,
        length: usize,
        limit: usize,
    },

    /// The channel rejected or never received the text message.
    #[error("Error sending post '{title}': {source}")]
    Transport {
        title: String,
        #[source]
        source: TransportError,
    },

    #[error("Deferred post store error at {}: {message}", path.display())]
    Store { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn store(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Error::Store {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
