// src/scheduler/mod.rs - Microsecond time base for the step loop
pub mod std_time;
pub mod time_interface;

pub use std_time::StdClock;
pub use time_interface::{Micros, TimeInterface};
