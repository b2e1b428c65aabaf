use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("writing {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not launch validator {program}: {source}")]
    ValidatorLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{document} did not validate: {detail}")]
    Invalid { document: PathBuf, detail: String },

    #[error("publishing to {path}: {source}")]
    Publish {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
