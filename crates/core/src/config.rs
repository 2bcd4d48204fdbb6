//! Runtime configuration read from the environment

use std::path::PathBuf;
use std::time::Duration;

use crate::{Error, Result};

pub const DEFAULT_DATA_DIR: &str = ".taskdash-data";
pub const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com";
pub const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com";
pub const DEFAULT_LANDING_ROUTE: &str = "/";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Where tasks are kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Memory,
    File { path: PathBuf },
    Firestore(FirestoreConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub api_key: String,
    pub firestore_url: String,
    pub identity_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub backend: Backend,
    pub landing_route: String,
    /// Limit for one store or sign-in request
    pub request_timeout: Duration,
}

impl Config {
    /// Read the configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let backend = match var("TASKDASH_BACKEND")
            .unwrap_or_else(|| "file".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "memory" => Backend::Memory,
            "file" => {
                let data_dir = var("TASKDASH_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.into());
                Backend::File {
                    path: PathBuf::from(data_dir).join("tasks.json"),
                }
            }
            "firestore" => {
                let required = |name: &str| {
                    var(name).ok_or_else(|| {
                        Error::InvalidInput(format!("{} must be set for the firestore backend", name))
                    })
                };
                Backend::Firestore(FirestoreConfig {
                    project_id: required("TASKDASH_FIRESTORE_PROJECT")?,
                    api_key: required("TASKDASH_FIREBASE_API_KEY")?,
                    firestore_url: var("TASKDASH_FIRESTORE_URL")
                        .unwrap_or_else(|| DEFAULT_FIRESTORE_URL.into()),
                    identity_url: var("TASKDASH_IDENTITY_URL")
                        .unwrap_or_else(|| DEFAULT_IDENTITY_URL.into()),
                })
            }
            other => {
                return Err(Error::InvalidInput(format!(
                    "Unsupported backend '{}', expected memory, file or firestore",
                    other
                )))
            }
        };

        let timeout_secs = match var("TASKDASH_REQUEST_TIMEOUT_SECS") {
            Some(value) => value.parse::<u64>().ok().filter(|secs| *secs > 0).ok_or_else(|| {
                Error::InvalidInput(format!(
                    "TASKDASH_REQUEST_TIMEOUT_SECS must be a positive number of seconds, got '{}'",
                    value
                ))
            })?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Self {
            backend,
            landing_route: var("TASKDASH_LANDING_ROUTE")
                .unwrap_or_else(|| DEFAULT_LANDING_ROUTE.into()),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
