//! DSN Builder
//!
//! Turns a backend configuration record into a connection descriptor: the
//! final address string plus the backend-specific overrides the provisioner
//! needs. Oracle descriptors always pass through the architecture-dependent
//! authentication rewrite.

pub mod embedded;
pub mod oracle;
pub mod params;
pub mod relational;

use url::Url;

use crate::error::{DsnParseError, EngineError};
use crate::models::{Backend, BackendConfig};
use crate::platform::PlatformAdapter;

pub use embedded::{EmbeddedDescriptor, NamingStrategy};
pub use oracle::{AuthMode, OracleDescriptor, POOL_CONNECTION_CLASS};
pub use relational::RelationalDescriptor;

/// Placeholder replacing passwords in logged and reported addresses.
pub const REDACTED: &str = "xxxxx";

/// Host, port and database (service name or schema) re-derived from an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub database: String,
}

/// Descriptor for any of the three backends.
#[derive(Debug, Clone)]
pub enum ConnectionDescriptor {
    Oracle(OracleDescriptor),
    Relational(RelationalDescriptor),
    Embedded(EmbeddedDescriptor),
}

impl ConnectionDescriptor {
    pub fn backend(&self) -> Backend {
        match self {
            ConnectionDescriptor::Oracle(_) => Backend::Oracle,
            ConnectionDescriptor::Relational(_) => Backend::MySql,
            ConnectionDescriptor::Embedded(_) => Backend::Sqlite,
        }
    }

    /// Address with the password masked, safe for logs and error text.
    pub fn redacted_address(&self) -> String {
        match self {
            ConnectionDescriptor::Oracle(d) => d.redacted_address(),
            ConnectionDescriptor::Relational(d) => d.redacted_address(),
            ConnectionDescriptor::Embedded(d) => d.address(),
        }
    }
}

/// Builds descriptors. Linux library-path export goes through `platform`.
pub struct DsnBuilder<'a> {
    platform: &'a dyn PlatformAdapter,
}

impl<'a> DsnBuilder<'a> {
    pub fn new(platform: &'a dyn PlatformAdapter) -> Self {
        Self { platform }
    }

    pub fn build(&self, config: &BackendConfig) -> Result<ConnectionDescriptor, EngineError> {
        match config {
            BackendConfig::Oracle(cfg) => self.oracle(cfg).map(ConnectionDescriptor::Oracle),
            BackendConfig::Relational(cfg) => {
                Ok(ConnectionDescriptor::Relational(self.relational(cfg)?))
            }
            BackendConfig::Embedded(cfg) => Ok(ConnectionDescriptor::Embedded(self.embedded(cfg))),
        }
    }

    pub fn oracle(&self, cfg: &crate::models::OracleConfig) -> Result<OracleDescriptor, EngineError> {
        oracle::build(cfg, self.platform)
    }

    pub fn relational(
        &self,
        cfg: &crate::models::RelationalConfig,
    ) -> Result<RelationalDescriptor, EngineError> {
        relational::build(cfg)
    }

    pub fn embedded(&self, cfg: &crate::models::EmbeddedConfig) -> EmbeddedDescriptor {
        embedded::build(cfg)
    }
}

/// Replaces the password of a URL-style address with `xxxxx`.
///
/// Falls back to masking everything between the first `:` of the userinfo
/// and the last `@` when the address does not parse as a URL.
pub fn redact_address(address: &str) -> String {
    if let Ok(mut url) = Url::parse(address) {
        if url.password().is_some() && url.set_password(Some(REDACTED)).is_ok() {
            return url.to_string();
        }
        return address.to_string();
    }

    let Some(scheme_end) = address.find("://") else {
        return address.to_string();
    };
    let rest = &address[scheme_end + 3..];
    let authority_end = rest.find('/').unwrap_or(rest.len());
    let Some(at) = rest[..authority_end].rfind('@') else {
        return address.to_string();
    };
    match rest[..at].find(':') {
        Some(colon) => format!(
            "{}{}:{}{}",
            &address[..scheme_end + 3],
            &rest[..colon],
            REDACTED,
            &rest[at..]
        ),
        None => address.to_string(),
    }
}

/// Parses a URL-style address, mapping failures to `DsnParseError`.
pub(crate) fn parse_address(backend: Backend, address: &str) -> Result<Url, DsnParseError> {
    Url::parse(address).map_err(|e| DsnParseError::new(backend, redact_address(address), e.to_string()))
}

/// Re-derives host, port and first path segment from an address.
pub fn endpoint_of(backend: Backend, address: &str) -> Result<Endpoint, DsnParseError> {
    let url = parse_address(backend, address)?;
    let fail = |reason: &str| DsnParseError::new(backend, redact_address(address), reason);

    let host = url.host_str().filter(|h| !h.is_empty()).ok_or_else(|| fail("missing host"))?;
    let port = url.port().ok_or_else(|| fail("missing port"))?;
    let database = url
        .path_segments()
        .and_then(|mut segments| segments.next())
        .unwrap_or_default();

    Ok(Endpoint {
        host: host.to_string(),
        port,
        database: urlencoding::decode(database)
            .map_err(|e| fail(&e.to_string()))?
            .into_owned(),
    })
}
