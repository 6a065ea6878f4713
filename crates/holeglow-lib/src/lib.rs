//! Holeglow: Pi-hole status and host health on a PiGlow LED board.

pub mod board;
pub mod config;
pub mod error;
pub mod led;
pub mod metrics;
pub mod monitor;
pub mod render;
pub mod snapshot;
pub mod status;

pub use error::HoleglowError;
