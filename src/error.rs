use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort the run before any worker starts.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read proxy list: {path}")]
    ProxyList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read credential file: {path}")]
    CredentialFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read proxy list from stdin")]
    Stdin(#[source] std::io::Error),
}

/// Errors that abort the run because the output file is unusable.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to create output file: {path}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write to output file: {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
