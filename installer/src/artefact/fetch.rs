//! Artefact retrieval for release archives.
//!
//! Provides a trait-based abstraction for downloading archive bytes so that
//! the install pipeline can run against an injected fake in tests. The
//! production implementation speaks HTTPS through `ureq`; storage-bucket
//! URLs (`s3://bucket/key`) are rewritten to the bucket's public HTTPS
//! endpoint before the request is made.

use log::debug;
use std::path::Path;
use std::time::Duration;

/// Default network timeout for a single archive download.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait for retrieving an archive into a local file.
///
/// # Examples
///
/// ```
/// use release_installer::artefact::fetch::HttpFetcher;
///
/// let fetcher = HttpFetcher::default();
/// // Use fetcher.fetch(url, dest) in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArtefactFetcher {
    /// Download `url` and write the body to `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the resource is missing, or
    /// the destination cannot be written.
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError>;
}

/// Errors arising from archive retrieval.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The transport failed (connection, TLS, timeout, or non-404 status).
    #[error("download failed for {url}: {reason}")]
    Http {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The storage location has no object at this URL (HTTP 404).
    #[error("artefact not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// The URL scheme is not one this fetcher can retrieve.
    #[error("unsupported URL scheme: {url}")]
    UnsupportedScheme {
        /// The rejected URL.
        url: String,
    },

    /// I/O error writing the downloaded file.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTPS downloader using a `ureq` agent with a global timeout.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Create a fetcher whose requests time out after `timeout`.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT)
    }
}

impl ArtefactFetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        let transport_url = transport_url(url)?;
        debug!("fetching {transport_url} into {}", dest.display());
        let response = self
            .agent
            .get(&transport_url)
            .call()
            .map_err(|e| map_ureq_error(&transport_url, &e))?;
        let mut file = std::fs::File::create(dest)?;
        let mut body = response.into_body();
        let written = std::io::copy(&mut body.as_reader(), &mut file).map_err(|e| {
            FetchError::Http {
                url: transport_url.clone(),
                reason: e.to_string(),
            }
        })?;
        file.sync_all()?;
        debug!("fetched {written} bytes from {transport_url}");
        Ok(())
    }
}

/// Translate a descriptor URL into the HTTPS URL actually requested.
///
/// `https://` URLs pass through unchanged. `s3://bucket/key` becomes the
/// virtual-hosted bucket endpoint `https://bucket.s3.amazonaws.com/key`.
///
/// # Errors
///
/// Returns [`FetchError::UnsupportedScheme`] for any other scheme or for an
/// `s3://` URL without both a bucket and a key.
///
/// # Examples
///
/// ```
/// use release_installer::artefact::fetch::transport_url;
///
/// let url = transport_url("s3://data.example.io/tool/tool.tar.gz").expect("supported");
/// assert_eq!(url, "https://data.example.io.s3.amazonaws.com/tool/tool.tar.gz");
/// ```
pub fn transport_url(url: &str) -> Result<String, FetchError> {
    if url.starts_with("https://") {
        return Ok(url.to_owned());
    }
    let unsupported = || FetchError::UnsupportedScheme {
        url: url.to_owned(),
    };
    let location = url.strip_prefix("s3://").ok_or_else(unsupported)?;
    match location.split_once('/') {
        Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => {
            Ok(format!("https://{bucket}.s3.amazonaws.com/{key}"))
        }
        _ => Err(unsupported()),
    }
}

/// Map a ureq error to a [`FetchError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> FetchError {
    match err {
        ureq::Error::StatusCode(404) => FetchError::NotFound {
            url: url.to_owned(),
        },
        other => FetchError::Http {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
