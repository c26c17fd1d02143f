//! Core types and utilities

pub mod error;
pub mod logging;
pub mod time;

pub use error::Error;
pub use time::{TickTimer, TICK_PERIOD};
