//! Byte transports for vault blobs.
//!
//! A vault is a directory tree on a static host. The browser only ever needs
//! "give me the bytes at this location", so that is the whole [`Transport`]
//! trait. Two implementations:
//!
//! - [`HttpTransport`]: plain `GET`, no custom headers, non-2xx is an error.
//! - [`FsTransport`]: the same tree on local disk, addressed by path.
//!
//! No retries, no timeouts beyond the HTTP client's defaults.

use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request to {location} failed: {source}")]
    Http {
        location: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{location} returned HTTP {status}")]
    Status { location: String, status: u16 },
    #[error("cannot read {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },
}

/// Fetch raw bytes by location.
///
/// Must be `Sync`: multi-part files are fetched from rayon workers.
pub trait Transport: Sync {
    fn fetch(&self, location: &str) -> Result<Vec<u8>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn fetch(&self, location: &str) -> Result<Vec<u8>, TransportError> {
        (**self).fetch(location)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn fetch(&self, location: &str) -> Result<Vec<u8>, TransportError> {
        (**self).fetch(location)
    }
}

/// Blocking HTTP(S) transport.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, location: &str) -> Result<Vec<u8>, TransportError> {
        debug!(location, "GET");
        let http_err = |source| TransportError::Http {
            location: location.to_string(),
            source,
        };
        let response = self.client.get(location).send().map_err(http_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                location: location.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.bytes().map_err(http_err)?;
        Ok(body.to_vec())
    }
}

/// Local directory mirror of a static host.
///
/// Locations are filesystem paths; `file://` prefixes are stripped.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsTransport;

impl Transport for FsTransport {
    fn fetch(&self, location: &str) -> Result<Vec<u8>, TransportError> {
        let path = PathBuf::from(location.strip_prefix("file://").unwrap_or(location));
        debug!(path = %path.display(), "read");
        std::fs::read(&path).map_err(|source| TransportError::Io {
            location: location.to_string(),
            source,
        })
    }
}

/// Whether a location should go over HTTP.
pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Pick the transport for a vault location by its scheme.
pub fn transport_for(location: &str) -> Box<dyn Transport> {
    if is_remote(location) {
        Box::new(HttpTransport::new())
    } else {
        Box::new(FsTransport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn remote_detection() {
        assert!(is_remote("https://example.org/vault"));
        assert!(is_remote("http://localhost:8000"));
        assert!(!is_remote("/srv/vault"));
        assert!(!is_remote("file:///srv/vault"));
        assert!(!is_remote("vaults/https"));
    }

    #[test]
    fn fs_transport_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("index.vault");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let bytes = FsTransport.fetch(path.to_str().unwrap()).unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[test]
    fn fs_transport_strips_file_scheme() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.enc");
        std::fs::write(&path, b"x").unwrap();

        let location = format!("file://{}", path.display());
        assert_eq!(FsTransport.fetch(&location).unwrap(), b"x");
    }

    #[test]
    fn fs_transport_missing_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let location = tmp.path().join("nope").display().to_string();
        let err = FsTransport.fetch(&location).unwrap_err();
        assert!(matches!(err, TransportError::Io { .. }));
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn boxed_transport_delegates() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("b.enc");
        std::fs::write(&path, b"boxed").unwrap();

        let transport = transport_for(path.to_str().unwrap());
        assert_eq!(transport.fetch(path.to_str().unwrap()).unwrap(), b"boxed");
    }
}
