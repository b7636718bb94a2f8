//! Loading pass content from files and URLs.

use crate::validation::{validate_path, validate_url};
use crate::{Config, PassArtifact, PassOrigin, Result, WalletError};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Loads pass artifacts.
///
/// Every load is a single attempt; failures surface immediately.
///
/// # Example
///
/// ```no_run
/// use walletmux::loader::PassLoader;
/// use walletmux::Config;
///
/// #[tokio::main]
/// async fn main() -> walletmux::Result<()> {
///     let loader = PassLoader::new(&Config::default())?;
///     let artifact = loader.load_from_path("/tmp/boarding.pkpass").await?;
///     println!("{} bytes from {}", artifact.bytes().len(), artifact.origin());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct PassLoader {
    client: reqwest::Client,
}

impl PassLoader {
    /// Creates a loader using the download settings from `config`.
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.download_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| WalletError::Other(anyhow::anyhow!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Reads a pass file.
    ///
    /// # Errors
    ///
    /// - [`WalletError::FileNotFound`]: nothing readable exists at `path`
    ///   (missing, or a directory)
    /// - [`WalletError::FileReadError`]: the file exists but reading it failed
    pub async fn load_from_path(&self, path: impl AsRef<Path>) -> Result<PassArtifact> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        validate_path(&shown)?;

        let metadata = match fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(WalletError::FileNotFound(shown))
            }
            Err(e) => {
                return Err(WalletError::FileReadError {
                    path: shown,
                    source: e,
                })
            }
        };
        if !metadata.is_file() {
            return Err(WalletError::FileNotFound(shown));
        }

        let bytes = fs::read(path).await.map_err(|e| WalletError::FileReadError {
            path: shown.clone(),
            source: e,
        })?;

        tracing::debug!(path = %shown, size = bytes.len(), "loaded pass file");
        Ok(PassArtifact::new(bytes, PassOrigin::LocalPath(PathBuf::from(path))))
    }

    /// Downloads a pass with a single GET request.
    ///
    /// # Errors
    ///
    /// - [`WalletError::InvalidArgument`]: `url` is not an http(s) URL
    /// - [`WalletError::DownloadError`]: transport failure or non-success status
    /// - [`WalletError::NoData`]: the response body was empty
    pub async fn load_from_url(&self, url: &str) -> Result<PassArtifact> {
        let parsed = validate_url(url)?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| WalletError::DownloadError(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WalletError::DownloadError(format!(
                "{}: HTTP {}",
                url, status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| WalletError::DownloadError(format!("{}: {}", url, e)))?;
        if bytes.is_empty() {
            return Err(WalletError::NoData(url.to_string()));
        }

        tracing::debug!(url, size = bytes.len(), "downloaded pass");
        Ok(PassArtifact::new(bytes.to_vec(), PassOrigin::Url(url.to_string())))
    }

    /// Reads several pass files, all or nothing.
    ///
    /// Files are read in order and the first failure is returned; it names the
    /// path that failed. No artifacts are returned unless every file loaded.
    pub async fn load_multiple<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<PassArtifact>> {
        let mut artifacts = Vec::with_capacity(paths.len());
        for path in paths {
            artifacts.push(self.load_from_path(path).await?);
        }
        Ok(artifacts)
    }
}
