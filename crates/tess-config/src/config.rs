use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tess_core::{
    DEFAULT_COHERENCE, DEFAULT_ROTATION_SPEED, DEFAULT_TICK_HZ, EngineSettings, ProjectionConfig,
    SECOND_PLANE_RATIO,
};

use crate::error::{ConfigError, Result};

/// Shortest period the render loop and field task accept.
pub const MIN_PERIOD: Duration = Duration::from_nanos(1);

/// Longest period the render loop and field task accept.
pub const MAX_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// On-disk engine configuration. Every section and field is optional in the
/// file; missing values take the engine defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub projection: ProjectionSection,
    pub rotation: RotationSection,
    pub signal: SignalSection,
    pub render: RenderSection,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectionSection {
    pub base_focal_distance: f64,
    pub singularity_epsilon: f64,
    pub saturation: f64,
    pub w_amplification: f64,
}

impl Default for ProjectionSection {
    fn default() -> Self {
        let p = ProjectionConfig::default();
        Self {
            base_focal_distance: p.base_focal_distance,
            singularity_epsilon: p.singularity_epsilon,
            saturation: p.saturation,
            w_amplification: p.w_amplification,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RotationSection {
    /// Radians per tick.
    pub speed: f64,
    pub second_plane_ratio: f64,
}

impl Default for RotationSection {
    fn default() -> Self {
        Self {
            speed: DEFAULT_ROTATION_SPEED,
            second_plane_ratio: SECOND_PLANE_RATIO,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SignalSection {
    pub initial_coherence: f64,
    /// Period of the synthetic coherence field, in milliseconds.
    pub field_interval_ms: u64,
}

impl Default for SignalSection {
    fn default() -> Self {
        Self {
            initial_coherence: DEFAULT_COHERENCE,
            field_interval_ms: 250,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSection {
    pub tick_hz: f64,
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            tick_hz: DEFAULT_TICK_HZ,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`. A missing file yields the defaults; any other read
    /// failure is an error.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                tracing::debug!("loading config from {}", path.display());
                Self::from_toml_str(&content)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values the engine cannot run with. Coherence and speed are not
    /// checked here: the engine clamps them.
    pub fn validate(&self) -> Result<()> {
        let p = &self.projection;
        positive("projection.base_focal_distance", p.base_focal_distance)?;
        positive("projection.singularity_epsilon", p.singularity_epsilon)?;
        positive("projection.saturation", p.saturation)?;
        finite("projection.w_amplification", p.w_amplification)?;
        finite("rotation.speed", self.rotation.speed)?;
        finite("rotation.second_plane_ratio", self.rotation.second_plane_ratio)?;
        positive("render.tick_hz", self.render.tick_hz)?;
        match hz_period(self.render.tick_hz) {
            Some(period) if (MIN_PERIOD..=MAX_PERIOD).contains(&period) => {}
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "render.tick_hz {} gives no period in [{MIN_PERIOD:?}, {MAX_PERIOD:?}]",
                    self.render.tick_hz
                )));
            }
        }
        let field = Duration::from_millis(self.signal.field_interval_ms);
        if !(MIN_PERIOD..=MAX_PERIOD).contains(&field) {
            return Err(ConfigError::Invalid(format!(
                "signal.field_interval_ms must be between 1 and {}, got {}",
                MAX_PERIOD.as_millis(),
                self.signal.field_interval_ms
            )));
        }
        Ok(())
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            projection: ProjectionConfig {
                base_focal_distance: self.projection.base_focal_distance,
                singularity_epsilon: self.projection.singularity_epsilon,
                saturation: self.projection.saturation,
                w_amplification: self.projection.w_amplification,
            },
            rotation_speed: self.rotation.speed,
            second_plane_ratio: self.rotation.second_plane_ratio,
            initial_coherence: self.signal.initial_coherence,
        }
    }

    /// Render period, kept within [`MIN_PERIOD`, `MAX_PERIOD`] even for a
    /// config that skipped `validate`.
    pub fn tick_interval(&self) -> Duration {
        hz_period(self.render.tick_hz)
            .unwrap_or(MAX_PERIOD)
            .clamp(MIN_PERIOD, MAX_PERIOD)
    }

    pub fn field_interval(&self) -> Duration {
        Duration::from_millis(self.signal.field_interval_ms).clamp(MIN_PERIOD, MAX_PERIOD)
    }
}

/// `1 / hz` as a `Duration`, or `None` when it is not representable.
fn hz_period(hz: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(1.0 / hz).ok()
}

fn finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} must be finite, got {value}")))
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")))
    }
}
