//! Infrastructure layer (adapters/implementations).
//!
//! This module contains IO-facing pieces: config files, the transport seam and hashing.

pub mod app_config;
pub mod hash;
pub mod transport;
