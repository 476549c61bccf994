// Jackson Coxson
//! Orchestration of pymobiledevice3 for spoofing the location of an iOS device.
//!
//! Every device capability is delegated to the external utility. This crate
//! builds its command lines, scrapes its text output and sequences the steps.

pub mod admin;
pub mod config;
pub mod console;
pub mod location_simulation;
pub mod mounter;
pub mod process;
pub mod prompt;
pub mod syslog;
pub mod tunnel;
pub mod utility;

mod lines;

pub use config::SpooferConfig;
pub use syslog::Confirmation;
pub use tunnel::{TunnelInfo, TunnelProcess};
pub use utility::Utility;

use std::io;

use thiserror::Error;

/// Errors that stop the spoofing sequence
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SpooferError {
    #[error("console io failed")]
    Io(#[from] io::Error),
    #[error("failed to spawn {program}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("administrator privileges are required")]
    NotElevated,
    #[error("developer mode is not enabled")]
    DeveloperModeDisabled,
    #[error("tunnel output is missing {}", missing.join(", "))]
    TunnelIncomplete { missing: Vec<&'static str> },
    #[error("input aborted")]
    Aborted,
}
