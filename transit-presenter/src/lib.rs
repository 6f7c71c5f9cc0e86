//! Transit Presenter - form-to-result front end for transit optimization
//!
//! This crate provides:
//! - A view-model with an explicit tab state machine (trip vs. work commute)
//! - Form normalization into the JSON payload the optimization backend expects
//! - An HTTP backend client with a typed error taxonomy
//! - Pure HTML renderers for trip and work-schedule results
//! - A small local key-value store for the Google Maps API key

pub mod backend;
pub mod form;
pub mod page;
pub mod presenter;
pub mod render;
pub mod results;
pub mod store;
pub mod tabs;

pub use backend::{Backend, BackendError, HttpBackend};
pub use form::{FormFields, PayloadError, RequestPayload};
pub use presenter::{Presenter, SubmitOutcome};
pub use tabs::{Tab, TabController};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading presenter configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Configuration for the presenter
#[derive(Debug, Clone, serde::Deserialize)]
pub struct PresenterConfig {
    /// Base URL of the optimization backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the trip optimization endpoint
    #[serde(default = "default_trip_endpoint")]
    pub trip_endpoint: String,

    /// Path of the work-schedule optimization endpoint
    #[serde(default = "default_work_endpoint")]
    pub work_endpoint: String,

    /// File backing local storage (None = storage disabled)
    #[serde(default = "default_storage_path")]
    pub storage_path: Option<PathBuf>,

    /// Tab marked active when the page is first built
    #[serde(default)]
    pub initial_tab: Tab,

    /// Optional request timeout; requests wait indefinitely when unset
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_base_url() -> String { "http://localhost:5000".to_string() }
fn default_trip_endpoint() -> String { "/api/optimize-trip".to_string() }
fn default_work_endpoint() -> String { "/api/optimize-work".to_string() }
fn default_storage_path() -> Option<PathBuf> { Some(PathBuf::from(".transit/storage.json")) }

impl Default for PresenterConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            trip_endpoint: default_trip_endpoint(),
            work_endpoint: default_work_endpoint(),
            storage_path: default_storage_path(),
            initial_tab: Tab::default(),
            request_timeout_secs: None,
        }
    }
}

impl PresenterConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Endpoint path wired to a tab's form
    pub fn endpoint_for(&self, tab: Tab) -> &str {
        match tab {
            Tab::OptimizeTrip => &self.trip_endpoint,
            Tab::OptimizeWork => &self.work_endpoint,
        }
    }
}
