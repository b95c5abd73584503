use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Output of a failed log command, or the reason it could not be started.
#[derive(Debug, Error)]
#[error("{}", String::from_utf8_lossy(.output))]
pub struct FetchError {
    pub output: Vec<u8>,
}

impl FetchError {
    fn new(output: impl Into<Vec<u8>>) -> Self {
        Self {
            output: output.into(),
        }
    }
}

#[async_trait]
pub trait LogFetcher: Send + Sync {
    /// Logs of one container, stdout followed by stderr.
    async fn fetch(
        &self,
        pod: &str,
        namespace: &str,
        container: &str,
        previous: bool,
    ) -> Result<Vec<u8>, FetchError>;
}

/// Fetches logs by running `<kubectl> logs ...`.
pub struct Kubectl {
    binary: PathBuf,
}

impl Kubectl {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

pub fn logs_args(pod: &str, namespace: &str, container: &str, previous: bool) -> Vec<String> {
    vec![
        "logs".to_string(),
        pod.to_string(),
        "-n".to_string(),
        namespace.to_string(),
        "-c".to_string(),
        container.to_string(),
        format!("--previous={}", previous),
    ]
}

#[async_trait]
impl LogFetcher for Kubectl {
    async fn fetch(
        &self,
        pod: &str,
        namespace: &str,
        container: &str,
        previous: bool,
    ) -> Result<Vec<u8>, FetchError> {
        let args = logs_args(pod, namespace, container, previous);
        debug!("Invoking command: {} {}", self.binary.display(), args.join(" "));

        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .await
            .map_err(|e| FetchError::new(format!("could not run {}; {}", self.binary.display(), e)))?;

        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);

        if !output.status.success() {
            debug!(
                "{} exited with {:?} for {}/{}",
                self.binary.display(),
                output.status.code(),
                pod,
                container
            );
            return Err(FetchError::new(combined));
        }
        Ok(combined)
    }
}
