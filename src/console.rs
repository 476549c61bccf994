// Jackson Coxson
//! Console rendering

use colored::{ColoredString, Colorize};
use tokio::process::Command;
use tracing::debug;

pub const BANNER: &str = r#"
 _  _____ _____  _____                    __              __   __
(_)|  _  /  ___|/  ___|                  / _|             \ \ / /
 _ | | | \ `--. \ `--. _ __   ___   ___ | |_ ___ _ __ _____\ V /
| || | | |`--. \ `--. \ '_ \ / _ \ / _ \|  _/ _ \ '__|______/   \
| |\ \_/ /\__/ //\__/ / |_) | (_) | (_) | ||  __/ |        / /^\ \
|_| \___/\____/ \____/| .__/ \___/ \___/|_| \___|_|        \/   \/
                      | |
                      |_|
"#;

/// Clears the terminal by running the platform's clear command.
///
/// Failure leaves the screen as it is.
pub async fn clear_terminal() {
    #[cfg(windows)]
    let status = Command::new("cmd").args(["/C", "cls"]).status().await;
    #[cfg(not(windows))]
    let status = Command::new("clear").status().await;

    if let Err(e) = status {
        debug!("Unable to clear terminal: {e:?}");
    }
}

pub fn banner() {
    println!("{}", BANNER.white().on_black());
}

/// Prints `body` inside a box, colouring the frame with `paint`
pub fn panel(body: &str, paint: fn(&str) -> ColoredString) {
    for line in frame(body) {
        println!("{}", paint(&line));
    }
}

/// Box-drawing frame around `body`, one entry per output line
pub fn frame(body: &str) -> Vec<String> {
    let lines: Vec<&str> = body.lines().collect();
    let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);

    let mut framed = Vec::with_capacity(lines.len() + 2);
    framed.push(format!("╭{}╮", "─".repeat(width + 2)));
    for line in lines {
        let pad = width - line.chars().count();
        framed.push(format!("│ {line}{} │", " ".repeat(pad)));
    }
    framed.push(format!("╰{}╯", "─".repeat(width + 2)));
    framed
}

pub fn green(s: &str) -> ColoredString {
    s.green()
}

pub fn yellow(s: &str) -> ColoredString {
    s.yellow()
}

pub fn blue(s: &str) -> ColoredString {
    s.blue()
}

pub fn plain(s: &str) -> ColoredString {
    s.normal()
}

/// Echoes an external command before it runs
pub fn announce(action: &str, command_line: &str) {
    println!("{} {}", format!("→ {action}").magenta(), command_line.white());
}
