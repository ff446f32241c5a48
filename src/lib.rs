// src/lib.rs - wallplot-rs: motion core for a two-cable wall plotter
pub mod config;
pub mod gcode;
pub mod hardware;
pub mod motion;
pub mod scheduler;
pub mod simulator;

pub use config::{Config, ConfigError, SegmentMode, load_config};
pub use gcode::{GCodeExecutor, ProgramReport};
pub use hardware::{CoilDriver, CoilPins, UnipolarCoils};
pub use motion::{MotionError, MotionRequest, Plotter, PlotterStatus, Point};
pub use scheduler::{Micros, StdClock, TimeInterface};
pub use simulator::{RecordingPins, SimClock};
