//! Client construction options and environment configuration.

use std::env;

use thiserror::Error;

use crate::client::CalxClient;
use crate::signer::Credentials;

pub const DEFAULT_HOST: &str = "http://localhost:3000";
pub const API_PREFIX: &str = "/api/v1";

pub const ENV_ACCESS_ID: &str = "CALX_ACCESS_ID";
pub const ENV_SECRET_KEY: &str = "CALX_SECRET_KEY";
pub const ENV_HOST: &str = "CALX_HOST";

/// Options accepted at client construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientOptions {
    /// Scheme and authority of the API, e.g. `https://calx.example.com`.
    /// Defaults to [`DEFAULT_HOST`].
    pub host: Option<String>,
}

impl ClientOptions {
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Host with the API prefix appended.
    pub fn base_url(&self) -> String {
        let host = self.host.as_deref().unwrap_or(DEFAULT_HOST);
        format!("{}{API_PREFIX}", host.trim_end_matches('/'))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),
}

/// Credentials and options read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalxConfig {
    pub credentials: Credentials,
    pub options: ClientOptions,
}

impl CalxConfig {
    /// Read `CALX_ACCESS_ID`, `CALX_SECRET_KEY` and optionally `CALX_HOST`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`CalxConfig::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(name))
        };
        let access_id = required(ENV_ACCESS_ID)?;
        let secret_key = required(ENV_SECRET_KEY)?;
        let host = lookup(ENV_HOST).filter(|v| !v.is_empty());

        Ok(Self {
            credentials: Credentials::new(access_id, secret_key),
            options: ClientOptions { host },
        })
    }

    /// Default client built from this configuration.
    pub fn into_client(self) -> CalxClient {
        CalxClient::with_options(
            self.credentials.access_id(),
            self.credentials.secret_key(),
            self.options,
        )
    }
}
