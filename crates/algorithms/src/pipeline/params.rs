//! Delineation parameters and named profiles

use crate::density::{BandwidthRule, DensityParams};
use crate::finish::FinishParams;
use crate::threshold::ThresholdParams;
use downtown_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// All parameters of the per-town delineation.
///
/// Every field has a default, so a JSON file only needs to name the
/// values it changes:
///
/// ```json
/// { "density": { "cell_size": 150 }, "finish": { "second_buffer": 50 } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DowntownParams {
    pub density: DensityParams,
    pub threshold: ThresholdParams,
    pub finish: FinishParams,
}

fn invalid(name: &'static str, value: impl fmt::Display, reason: &str) -> Error {
    Error::InvalidParameter {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(name, value, "must be finite and non-negative"))
    }
}

fn positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(name, value, "must be finite and positive"))
    }
}

impl DowntownParams {
    /// Parse parameters from JSON text, then validate them.
    pub fn from_json(text: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(text)?;
        params.validate()?;
        Ok(params)
    }

    /// Read parameters from a JSON file, then validate them.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Check every value before any town runs.
    ///
    /// # Errors
    /// [`Error::InvalidParameter`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        positive("cell_size", self.density.cell_size)?;
        if let BandwidthRule::Fixed(h) = self.density.bandwidth {
            positive("bandwidth", h)?;
        }

        let t = self.threshold.threshold;
        if !(t.is_finite() && (0.0..1.0).contains(&t)) {
            return Err(invalid("threshold", t, "must be in [0, 1)"));
        }

        let f = &self.finish;
        non_negative("buffer_distance", f.buffer_distance)?;
        positive("miter_limit", f.miter_limit)?;
        non_negative("smoothness", f.smoothness)?;
        if f.densify == 0 {
            return Err(invalid("densify", f.densify, "must be at least 1"));
        }
        if let Some(d) = f.second_buffer {
            non_negative("second_buffer", d)?;
        }
        Ok(())
    }
}

/// Named parameter sets of the delineation variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamsProfile {
    /// Buffer 30, smoothness 5, no second buffer
    Baseline,
    /// Baseline followed by a second buffer of 50
    Stabilized,
}

impl ParamsProfile {
    pub const ALL: [ParamsProfile; 2] = [ParamsProfile::Baseline, ParamsProfile::Stabilized];

    /// Look up a profile by name or version alias (`v1`, `v2`)
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "v1" | "baseline" => Ok(ParamsProfile::Baseline),
            "v2" | "stabilized" => Ok(ParamsProfile::Stabilized),
            _ => Err(Error::UnknownProfile(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ParamsProfile::Baseline => "baseline",
            ParamsProfile::Stabilized => "stabilized",
        }
    }

    pub fn version(&self) -> &'static str {
        match self {
            ParamsProfile::Baseline => "v1",
            ParamsProfile::Stabilized => "v2",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ParamsProfile::Baseline => "buffer 30, smoothness 5",
            ParamsProfile::Stabilized => "buffer 30, smoothness 5, second buffer 50",
        }
    }

    /// The full parameter set of this profile
    pub fn params(&self) -> DowntownParams {
        let mut params = DowntownParams::default();
        if let ParamsProfile::Stabilized = self {
            params.finish.second_buffer = Some(50.0);
        }
        params
    }
}

impl Default for ParamsProfile {
    fn default() -> Self {
        ParamsProfile::Stabilized
    }
}

impl fmt::Display for ParamsProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
