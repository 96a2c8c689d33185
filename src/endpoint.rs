use url::Url;

use crate::{Error, Result};

/// The note-store endpoint URL decomposed into the pieces a transport needs.
///
/// The URL itself is not configured anywhere; it arrives in the token
/// exchange response and differs per account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Endpoint {
    /// Parse a note-store URL. A URL without an explicit port gets 443 for
    /// an encrypted scheme and 80 otherwise.
    pub fn parse(raw: &str) -> Result<Endpoint> {
        let url = Url::parse(raw).map_err(|e| Error::BadEndpoint(e.to_string()))?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::BadEndpoint(format!("no host in {}", raw)))?
            .to_string();
        let scheme = url.scheme().to_string();
        let port = match url.port() {
            Some(explicit) => explicit,
            None if scheme == "https" => 443,
            None => 80,
        };
        Ok(Endpoint {
            scheme,
            host,
            port,
            path: url.path().to_string(),
        })
    }

    pub fn is_secure(&self) -> bool {
        self.scheme == "https"
    }

    /// The shard identifier: the third segment of the note-store path.
    ///
    /// This is a path-layout contract with the backing service; a path that
    /// is too shallow has no shard.
    pub fn shard_id(&self) -> Option<&str> {
        self.path.split('/').filter(|s| !s.is_empty()).nth(2)
    }
}
