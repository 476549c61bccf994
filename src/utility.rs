// Jackson Coxson
//! Command lines for the pymobiledevice3 utility

use std::process::Stdio;

use tokio::process::Command;

/// Environment variable overriding the interpreter that runs pymobiledevice3
pub const PYTHON_ENV_VAR: &str = "IOSSPOOFER_PYTHON";
pub const DEFAULT_PYTHON: &str = "python";

/// How pymobiledevice3 is invoked.
///
/// Every subcommand is spawned as `program prefix... subcommand...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utility {
    pub program: String,
    pub prefix: Vec<String>,
}

impl Utility {
    /// Runs the utility as a module of the given interpreter
    pub fn python(interpreter: impl Into<String>) -> Self {
        Self {
            program: interpreter.into(),
            prefix: vec!["-m".to_string(), "pymobiledevice3".to_string()],
        }
    }

    /// Uses `IOSSPOOFER_PYTHON` when set, otherwise `python`
    pub fn from_env_var() -> Self {
        match std::env::var(PYTHON_ENV_VAR) {
            Ok(var) if !var.trim().is_empty() => Self::python(var.trim()),
            _ => Self::default(),
        }
    }

    pub fn start_tunnel_args() -> Vec<String> {
        strings(&["lockdown", "start-tunnel"])
    }

    pub fn auto_mount_args() -> Vec<String> {
        strings(&["mounter", "auto-mount"])
    }

    pub fn simulate_set_args(host: &str, port: &str, latitude: f64, longitude: f64) -> Vec<String> {
        let mut args = strings(&[
            "developer",
            "dvt",
            "simulate-location",
            "set",
            "--rsd",
            host,
            port,
            "--",
        ]);
        // `--` keeps negative coordinates from being parsed as options
        args.push(latitude.to_string());
        args.push(longitude.to_string());
        args
    }

    pub fn simulate_clear_args(host: &str, port: &str) -> Vec<String> {
        strings(&[
            "developer",
            "dvt",
            "simulate-location",
            "clear",
            "--rsd",
            host,
            port,
        ])
    }

    pub fn syslog_args() -> Vec<String> {
        strings(&["syslog", "live", "-m", "SpringBoard"])
    }

    /// Full argv for a subcommand, program first
    pub fn argv(&self, args: &[String]) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.prefix.iter().cloned())
            .chain(args.iter().cloned())
            .collect()
    }

    /// The command line as echoed to the console
    pub fn display(&self, args: &[String]) -> String {
        self.argv(args).join(" ")
    }

    /// Builds a command for a subcommand with every stdio stream discarded.
    ///
    /// Callers pipe the streams they intend to read.
    pub fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.prefix)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }
}

impl Default for Utility {
    fn default() -> Self {
        Self::python(DEFAULT_PYTHON)
    }
}

fn strings(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}
