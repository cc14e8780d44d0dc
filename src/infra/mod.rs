//! Infrastructure layer (adapters/implementations).
//!
//! This module contains the diff engine and the IO-facing integrations
//! (git snapshots, SARIF logs, configuration files).

pub mod app_config;
pub mod diff;
pub mod hash;
pub mod sarif;
pub mod snapshot;
pub mod workspace;
