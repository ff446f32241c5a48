//! Machine configuration: cable geometry, motor profile and motion constants.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub machine: MachineConfig,
    #[serde(default)]
    pub motors: MotorConfig,
    #[serde(default)]
    pub motion: MotionConfig,
}

/// Fixed geometry of the wall plotter. All lengths in millimeters.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MachineConfig {
    /// Horizontal distance between the two cable anchors.
    #[serde(default = "default_anchor_separation")]
    pub anchor_separation: f64,
    /// Y coordinate of both anchors in draw-surface coordinates.
    #[serde(default = "default_anchor_height")]
    pub anchor_height: f64,
    #[serde(default = "default_spool_diameter")]
    pub spool_diameter: f64,
    #[serde(default = "default_steps_per_revolution")]
    pub steps_per_revolution: u32,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            anchor_separation: default_anchor_separation(),
            anchor_height: default_anchor_height(),
            spool_diameter: default_spool_diameter(),
            steps_per_revolution: default_steps_per_revolution(),
        }
    }
}

impl MachineConfig {
    pub fn spool_circumference(&self) -> f64 {
        self.spool_diameter * std::f64::consts::PI
    }

    /// Cable travel produced by a single motor step.
    pub fn mm_per_step(&self) -> f64 {
        self.spool_circumference() / self.steps_per_revolution as f64
    }

    pub fn x_min(&self) -> f64 {
        -self.anchor_separation * 0.5
    }

    pub fn x_max(&self) -> f64 {
        self.anchor_separation * 0.5
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MotorConfig {
    /// Cruise speed in steps/second.
    #[serde(default = "default_speed")]
    pub speed: f64,
    /// Ramp acceleration in steps/second².
    #[serde(default = "default_acceleration")]
    pub acceleration: f64,
    #[serde(default = "default_invert_m1")]
    pub invert_m1: bool,
    #[serde(default)]
    pub invert_m2: bool,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            acceleration: default_acceleration(),
            invert_m1: default_invert_m1(),
            invert_m2: false,
        }
    }
}

/// How a straight segment distributes steps over the two motors.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SegmentMode {
    /// Bresenham interleave, one blocking single-step move at a time.
    #[default]
    Sequenced,
    /// Both motors ramp their full delta at once, polled in turn.
    Concurrent,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MotionConfig {
    /// Pause between consecutive major-axis steps, microseconds.
    #[serde(default = "default_line_delay_us")]
    pub line_delay_us: u32,
    /// Target chord length when subdividing arcs, millimeters.
    #[serde(default = "default_arc_segment_length")]
    pub arc_segment_length: f64,
    /// Chords between exact trigonometric recomputations.
    #[serde(default = "default_arc_correction_interval")]
    pub arc_correction_interval: u32,
    /// Arcs shorter than this are dropped.
    #[serde(default = "default_min_arc_length")]
    pub min_arc_length: f64,
    #[serde(default)]
    pub segment_mode: SegmentMode,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            line_delay_us: default_line_delay_us(),
            arc_segment_length: default_arc_segment_length(),
            arc_correction_interval: default_arc_correction_interval(),
            min_arc_length: default_min_arc_length(),
            segment_mode: SegmentMode::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.machine;
        if m.anchor_separation <= 0.0 {
            return Err(ConfigError::Invalid("machine.anchor_separation must be > 0".to_string()));
        }
        if m.spool_diameter <= 0.0 {
            return Err(ConfigError::Invalid("machine.spool_diameter must be > 0".to_string()));
        }
        if m.steps_per_revolution == 0 {
            return Err(ConfigError::Invalid("machine.steps_per_revolution must be > 0".to_string()));
        }
        if self.motors.speed <= 0.0 || self.motors.acceleration <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "motors.speed and motors.acceleration must be > 0 (got {} / {})",
                self.motors.speed, self.motors.acceleration
            )));
        }
        if self.motion.arc_segment_length <= 0.0 {
            return Err(ConfigError::Invalid("motion.arc_segment_length must be > 0".to_string()));
        }
        if self.motion.arc_correction_interval == 0 {
            return Err(ConfigError::Invalid("motion.arc_correction_interval must be >= 1".to_string()));
        }
        if self.motion.min_arc_length < 0.0 {
            return Err(ConfigError::Invalid("motion.min_arc_length must not be negative".to_string()));
        }
        Ok(())
    }
}

fn default_anchor_separation() -> f64 { 505.0 }
fn default_anchor_height() -> f64 { 300.0 }
fn default_spool_diameter() -> f64 { 35.0 }
fn default_steps_per_revolution() -> u32 { 2048 }
fn default_speed() -> f64 { 10_000.0 }
fn default_acceleration() -> f64 { 100_000.0 }
fn default_invert_m1() -> bool { true }
fn default_line_delay_us() -> u32 { 1 }
fn default_arc_segment_length() -> f64 { 1.0 }
fn default_arc_correction_interval() -> u32 { 25 }
fn default_min_arc_length() -> f64 { 0.001 }

pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        tracing::error!("Failed to read config file '{}': {}", path, e);
        ConfigError::Io(e)
    })?;
    let config: Config = toml::from_str(&contents).map_err(|e| {
        tracing::error!("Failed to parse config TOML: {}", e);
        ConfigError::Toml(e)
    })?;
    config.validate()?;
    Ok(config)
}
