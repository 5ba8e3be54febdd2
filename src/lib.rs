//! A control loop that resizes cloud node groups based on scheduling
//! pressure and underutilization.

pub mod cli;
pub mod common;
pub mod config;
pub mod error;
pub mod metrics;

pub mod core;

pub use error::{CaError, CaResult};
