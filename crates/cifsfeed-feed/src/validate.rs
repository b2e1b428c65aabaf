//! Schema validation through an external `xmllint`.

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::info;

use crate::FeedError;

/// Runs `<program> --schema <schema> --noout <document>`.
///
/// The document is valid when the program exits successfully.
#[derive(Debug, Clone)]
pub struct Validator {
    program: String,
    schema: PathBuf,
}

impl Validator {
    pub fn new(program: impl Into<String>, schema: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            schema: schema.into(),
        }
    }

    pub async fn validate(&self, document: &Path) -> Result<(), FeedError> {
        let output = Command::new(&self.program)
            .arg("--schema")
            .arg(&self.schema)
            .arg("--noout")
            .arg(document)
            .output()
            .await
            .map_err(|source| FeedError::ValidatorLaunch {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FeedError::Invalid {
                document: document.to_path_buf(),
                detail: match stderr.trim() {
                    "" => output.status.to_string(),
                    text => text.to_string(),
                },
            });
        }
        info!(document = %document.display(), schema = %self.schema.display(), "feed validates");
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn success_exit_is_valid() {
        let validator = Validator::new("true", "schema.xsd");
        validator.validate(Path::new("feed.xml")).await.unwrap();
    }

    #[tokio::test]
    async fn failure_exit_is_invalid() {
        let validator = Validator::new("false", "schema.xsd");
        let err = validator.validate(Path::new("feed.xml")).await.unwrap_err();
        assert!(matches!(err, FeedError::Invalid { .. }));
    }

    #[tokio::test]
    async fn missing_program_is_launch_error() {
        let validator = Validator::new("/nonexistent/xmllint", "schema.xsd");
        let err = validator.validate(Path::new("feed.xml")).await.unwrap_err();
        assert!(matches!(err, FeedError::ValidatorLaunch { .. }));
    }
}
