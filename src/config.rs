// Jackson Coxson
//! Settings collected from the command line and environment

use std::time::Duration;

use crate::utility::Utility;

pub const DEFAULT_SYSLOG_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_TUNNEL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct SpooferConfig {
    /// How pymobiledevice3 is invoked
    pub utility: Utility,
    /// Window for scraping the tunnel's identifier, address and port
    pub tunnel_timeout: Duration,
    /// Window for finding a confirmation line in the device syslog
    pub syslog_timeout: Duration,
    /// Coordinates given up front, skipping the prompts
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub skip_admin_check: bool,
}

impl Default for SpooferConfig {
    fn default() -> Self {
        Self {
            utility: Utility::from_env_var(),
            tunnel_timeout: Duration::from_secs(DEFAULT_TUNNEL_TIMEOUT_SECS),
            syslog_timeout: Duration::from_secs(DEFAULT_SYSLOG_TIMEOUT_SECS),
            latitude: None,
            longitude: None,
            skip_admin_check: false,
        }
    }
}
