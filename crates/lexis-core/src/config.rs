//! Service configuration.
//!
//! The service object is constructed from an explicit config struct; there is
//! no process-global client. `from_env` is a convenience loader for the usual
//! deployment shape.

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::identity;

/// Default base for derived temporary-term URIs.
pub const DEFAULT_TEMPORARY_URI_BASE: &str = "temporary:";

/// Everything needed to connect the service: both backends plus the URI
/// bases the identity generator mints from.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// PostgreSQL connection URL for the authoritative store.
    pub database_url: String,
    /// Directory holding the on-disk search index.
    pub index_dir: PathBuf,
    /// Base prepended to generated local-term URIs; must itself be a valid
    /// http(s) URI prefix.
    pub local_uri_base: String,
    /// Base prepended to derived temporary-term URIs.
    pub temporary_uri_base: String,
}

impl ServiceConfig {
    pub fn new(
        database_url: impl Into<String>,
        index_dir: impl Into<PathBuf>,
        local_uri_base: impl Into<String>,
    ) -> Self {
        Self {
            database_url: database_url.into(),
            index_dir: index_dir.into(),
            local_uri_base: local_uri_base.into(),
            temporary_uri_base: DEFAULT_TEMPORARY_URI_BASE.to_string(),
        }
    }

    /// Override the temporary-term URI base.
    pub fn temporary_uri_base(mut self, base: impl Into<String>) -> Self {
        self.temporary_uri_base = base.into();
        self
    }

    /// Load from the environment (`.env` honored when present):
    /// `LEXIS_DATABASE_URL`, `LEXIS_INDEX_DIR`, `LEXIS_LOCAL_URI_BASE`,
    /// and optional `LEXIS_TEMPORARY_URI_BASE`.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let required = |name: &str| {
            std::env::var(name)
                .map_err(|_| Error::Config(format!("Must supply {} to connect", name)))
        };

        let config = Self {
            database_url: required("LEXIS_DATABASE_URL")?,
            index_dir: PathBuf::from(required("LEXIS_INDEX_DIR")?),
            local_uri_base: required("LEXIS_LOCAL_URI_BASE")?,
            temporary_uri_base: std::env::var("LEXIS_TEMPORARY_URI_BASE")
                .unwrap_or_else(|_| DEFAULT_TEMPORARY_URI_BASE.to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the settings a connect would otherwise fail on confusingly.
    pub fn validate(&self) -> Result<()> {
        if self.database_url.is_empty() {
            return Err(Error::Config("database_url must not be empty".into()));
        }
        if self.local_uri_base.is_empty() {
            return Err(Error::Config("local_uri_base must not be empty".into()));
        }
        if self.temporary_uri_base.is_empty() {
            return Err(Error::Config(
                "temporary_uri_base must not be empty".into(),
            ));
        }
        // Generated local URIs must pass the same strict grammar external
        // URIs are held to.
        identity::validate_uri(&identity::local_uri(&self.local_uri_base)).map_err(|_| {
            Error::Config(format!(
                "local_uri_base is not a valid http(s) URI prefix: {}",
                self.local_uri_base
            ))
        })?;
        Ok(())
    }
}
