//! Webhook configuration
//!
//! The webhook reads a single YAML document mounted into its Pod:
//!
//! ```yaml
//! trace:
//!   sampleRate: 0.25
//! ```
//!
//! Parsing and validation are separate steps. A parsed [`Config`] may still
//! hold an out-of-range rate; only [`Config::validate`] produces the
//! [`SampleRate`] the tracer is built from, so an invalid rate can never reach
//! the sampler.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Root of the webhook configuration file
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Settings for span contexts added to Pods
    #[serde(default)]
    pub trace: TraceConfig,
}

/// Configuration for the span contexts the webhook mints
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceConfig {
    /// Probability in `[0, 1]` that a minted trace is marked sampled
    #[serde(default)]
    pub sample_rate: f64,
}

/// A sampling probability known to lie in `[0, 1]`
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct SampleRate(f64);

impl SampleRate {
    /// Sample every trace
    pub const ALWAYS: SampleRate = SampleRate(1.0);

    /// Sample no trace
    pub const NEVER: SampleRate = SampleRate(0.0);

    /// Validate a raw rate. NaN and values outside `[0, 1]` are rejected, never clamped.
    pub fn new(rate: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&rate) {
            return Err(Error::validation(format!(
                "sampling rate must be between 0 and 1 inclusive, got {rate}"
            )));
        }
        Ok(Self(rate))
    }

    /// The underlying probability
    pub fn get(self) -> f64 {
        self.0
    }
}

impl Config {
    /// Read and parse a YAML configuration file
    ///
    /// The result is not validated; call [`Config::validate`] before use.
    pub async fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::config(format!(
                "could not read YAML configuration file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| {
            Error::config(format!("could not unmarshal YAML configuration file: {e}"))
        })
    }

    /// Check every field and return the validated sampling rate
    pub fn validate(&self) -> Result<SampleRate> {
        SampleRate::new(self.trace.sample_rate)
    }
}
