//! Runtime configuration

use fieldwave_core::{FieldwaveError, FieldwaveResult};
use serde::{Deserialize, Serialize};

/// Round engine configuration, shared network-wide
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Seconds a neighbor stays visible after its last message
    pub retention: f64,
    /// Seconds an unvisited temporal slot survives (defaults to `retention`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_retention: Option<f64>,
}

impl RuntimeConfig {
    /// Configuration with the given neighbor retention window
    pub fn new(retention: f64) -> FieldwaveResult<Self> {
        let config = RuntimeConfig {
            retention,
            state_retention: None,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_state_retention(mut self, state_retention: f64) -> FieldwaveResult<Self> {
        self.state_retention = Some(state_retention);
        self.validate()?;
        Ok(self)
    }

    /// Check every window is finite and strictly positive
    pub fn validate(&self) -> FieldwaveResult<()> {
        check_window("retention", self.retention)?;
        if let Some(state_retention) = self.state_retention {
            check_window("state_retention", state_retention)?;
        }
        Ok(())
    }

    /// Effective temporal slot window
    pub fn state_window(&self) -> f64 {
        self.state_retention.unwrap_or(self.retention)
    }
}

fn check_window(name: &str, value: f64) -> FieldwaveResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(FieldwaveError::InvalidConfig(format!(
            "{} must be finite and positive, got {}",
            name, value
        )));
    }
    Ok(())
}
