//! Environment driver.
//!
//! The clock advances a day fraction and derives the quantities every agent
//! reads each tick: temperature, phase and photosynthetic efficiency.

pub mod clock;

pub use clock::{ClockConfig, Conditions, DayPhase, EnvironmentClock, TemperatureCurve};
