//! Common functionality for offset_planner.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod cli;
pub mod configuration;
pub mod financing;
pub mod input;
pub mod log;
pub mod market;
pub mod model;
pub mod output;
pub mod planning;
pub mod purchase;
pub mod region;
pub mod settings;
pub mod stock;
pub mod summary;
pub mod typology;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get config dir for program.
///
/// Falls back to the current directory if the platform has no config directory.
pub fn get_offset_planner_config_dir() -> PathBuf {
    let mut dir = dirs::config_dir().unwrap_or_default();
    dir.push("offset_planner");
    dir
}
