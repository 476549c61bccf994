// Jackson Coxson
// Spoofs the location of an iOS device through pymobiledevice3

use std::time::Duration;

use clap::{Arg, Command, value_parser};
use colored::Colorize;
use iosspoofer::{
    Confirmation, SpooferConfig, SpooferError, TunnelInfo, TunnelProcess, admin,
    config::{DEFAULT_SYSLOG_TIMEOUT_SECS, DEFAULT_TUNNEL_TIMEOUT_SECS},
    console,
    location_simulation,
    mounter::{self, MountOutcome},
    prompt::{LATITUDE_RANGE, LONGITUDE_RANGE, Prompter},
    syslog,
    utility::{PYTHON_ENV_VAR, Utility},
};
use tracing_subscriber::EnvFilter;

const STEP_PAUSE: Duration = Duration::from_millis(300);
const MOUNT_SETTLE: Duration = Duration::from_millis(350);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = Command::new("iosspoofer")
        .about("Spoof the GPS location of an iOS device using pymobiledevice3")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECS")
                .value_parser(value_parser!(u64))
                .help(format!(
                    "Seconds to watch syslog for confirmation [default: {DEFAULT_SYSLOG_TIMEOUT_SECS}]"
                )),
        )
        .arg(
            Arg::new("tunnel_timeout")
                .long("tunnel-timeout")
                .value_name("SECS")
                .value_parser(value_parser!(u64))
                .help(format!(
                    "Seconds to wait for the tunnel to report its address [default: {DEFAULT_TUNNEL_TIMEOUT_SECS}]"
                )),
        )
        .arg(
            Arg::new("python")
                .long("python")
                .value_name("PATH")
                .help(format!(
                    "Interpreter with pymobiledevice3 installed (defaults to ${PYTHON_ENV_VAR}, then python)"
                )),
        )
        .arg(
            Arg::new("latitude")
                .long("latitude")
                .value_name("DEG")
                .allow_negative_numbers(true)
                .value_parser(parse_latitude)
                .help("Latitude to simulate, skips the prompt"),
        )
        .arg(
            Arg::new("longitude")
                .long("longitude")
                .value_name("DEG")
                .allow_negative_numbers(true)
                .value_parser(parse_longitude)
                .help("Longitude to simulate, skips the prompt"),
        )
        .arg(
            Arg::new("skip_admin_check")
                .long("skip-admin-check")
                .action(clap::ArgAction::SetTrue)
                .help("Do not require administrator privileges"),
        )
        .get_matches();

    let mut config = SpooferConfig::default();
    if let Some(secs) = matches.get_one::<u64>("timeout") {
        config.syslog_timeout = Duration::from_secs(*secs);
    }
    if let Some(secs) = matches.get_one::<u64>("tunnel_timeout") {
        config.tunnel_timeout = Duration::from_secs(*secs);
    }
    if let Some(python) = matches.get_one::<String>("python") {
        config.utility = Utility::python(python);
    }
    config.latitude = matches.get_one::<f64>("latitude").copied();
    config.longitude = matches.get_one::<f64>("longitude").copied();
    config.skip_admin_check = matches.get_flag("skip_admin_check");

    if let Err(e) = run(&config).await {
        eprintln!("{}", fatal_message(&e).red().bold());
        std::process::exit(1);
    }
}

async fn run(config: &SpooferConfig) -> Result<(), SpooferError> {
    console::clear_terminal().await;
    console::banner();

    if !config.skip_admin_check {
        admin::require_admin().await?;
    }

    let mut prompter = Prompter::stdio();
    println!(
        "{}",
        "Make sure Developer Mode is enabled on your iPhone (Settings → Privacy & Security)."
            .yellow()
    );
    if !prompter.confirm("Is Developer Mode enabled and your iPhone unlocked?", false)? {
        return Err(SpooferError::DeveloperModeDisabled);
    }

    println!("{}\n", "Starting lockdown tunnel and reading output...".cyan());
    let (mut tunnel, info) =
        TunnelProcess::launch(&config.utility, config.tunnel_timeout, |line| {
            println!("{}", line.cyan())
        })
        .await?;
    println!("\n{} {}", "UDID:".green().bold(), info.udid);
    println!("{} {}:{}\n", "Tunnel:".green().bold(), info.host, info.port);

    let res = spoof(config, &mut prompter, &mut tunnel, &info).await;
    if res.is_err() {
        tunnel.close();
    }
    res
}

async fn spoof<R, W>(
    config: &SpooferConfig,
    prompter: &mut Prompter<R, W>,
    tunnel: &mut TunnelProcess,
    info: &TunnelInfo,
) -> Result<(), SpooferError>
where
    R: std::io::BufRead,
    W: std::io::Write,
{
    let utility = &config.utility;

    tokio::time::sleep(STEP_PAUSE).await;
    console::announce(
        "Mounting Developer Disk Image",
        &utility.display(&Utility::auto_mount_args()),
    );
    match mounter::auto_mount(utility).await? {
        MountOutcome::AlreadyMounted => {
            println!(
                "{}\n",
                "Developer Disk Image already mounted, continuing...".yellow()
            );
        }
        MountOutcome::Completed { stdout, stderr, .. } => {
            print_output(&stdout, &stderr);
            tokio::time::sleep(MOUNT_SETTLE).await;
        }
    }
    tokio::time::sleep(STEP_PAUSE).await;

    let latitude = match config.latitude {
        Some(l) => l,
        None => prompter.float_in("Enter latitude", 0.0, LATITUDE_RANGE)?,
    };
    let longitude = match config.longitude {
        Some(l) => l,
        None => prompter.float_in("Enter longitude", 0.0, LONGITUDE_RANGE)?,
    };
    println!();

    console::announce(
        "Starting simulate-location (background)",
        &utility.display(&Utility::simulate_set_args(
            &info.host, &info.port, latitude, longitude,
        )),
    );
    let mut simulation =
        location_simulation::spawn_background(utility, &info.host, &info.port, latitude, longitude)?;
    if let Some(pid) = simulation.id() {
        println!(
            "{}\n",
            format!("simulate-location process PID: {pid}, kept running to preserve spoof.")
                .dimmed()
        );
    }

    let timeout_secs = config.syslog_timeout.as_secs();
    println!(
        "{}",
        format!("→ Watching device syslog for confirmation (timeout {timeout_secs}s)...").cyan()
    );
    // the simulation is left running here, killing it drops the spoof on some setups
    match syslog::watch_for_confirmation(utility, config.syslog_timeout).await {
        Confirmation::Matched(line) => {
            console::panel(
                &format!("✅ Verified, spoof confirmed via syslog!\n\nMatched log line:\n{line}"),
                console::green,
            );
        }
        Confirmation::TimedOut => {
            console::panel(
                "⚠ Could not verify spoof via syslog within timeout. The spoof may still be active.",
                console::yellow,
            );
            println!(
                "{}",
                format!(
                    "If unsure, open Maps on device to confirm location or increase the --timeout value (current: {timeout_secs}s)."
                )
                .dimmed()
            );
        }
    }

    println!();
    if prompter.confirm("Disconnect & clear spoof and close tunnel now?", false)? {
        console::announce(
            "Clearing spoofed location",
            &utility.display(&Utility::simulate_clear_args(&info.host, &info.port)),
        );
        match location_simulation::clear(utility, &info.host, &info.port).await {
            Ok(output) => {
                print_output(&output.stdout, &output.stderr);
                if output.success {
                    console::panel("✅ Spoof cleared successfully.", console::blue);
                } else {
                    console::panel(
                        "⚠ Clear command returned non-zero; spoof may still be active.",
                        console::yellow,
                    );
                }
            }
            Err(e) => println!("{}", format!("Error clearing spoof: {e}").red()),
        }

        location_simulation::stop(&mut simulation).await;
        tunnel.close();
        console::panel("Tunnel closed and cleaned up.", console::blue);
    } else {
        let mut body = format!(
            "Leaving spoof active and tunnel open. To clear later run:\n\n{}\n\nThen terminate simulate process (PID shown above) or reboot device.",
            utility.display(&Utility::simulate_clear_args(&info.host, &info.port))
        );
        if let Some(pid) = tunnel.id() {
            body.push_str(&format!("\nThe tunnel keeps running as PID {pid}."));
        }
        console::panel(&body, console::plain);
    }

    println!("\n{}", "Done.".bold());
    Ok(())
}

fn print_output(stdout: &str, stderr: &str) {
    if !stdout.is_empty() {
        println!("{}", stdout.green());
    }
    if !stderr.is_empty() {
        println!("{}", stderr.red());
    }
}

fn fatal_message(e: &SpooferError) -> String {
    match e {
        SpooferError::NotElevated => "⛔ Please run this tool as Administrator!".to_string(),
        SpooferError::DeveloperModeDisabled => {
            "Abort: enable Developer Mode and unlock your phone.".to_string()
        }
        SpooferError::TunnelIncomplete { missing } => format!(
            "Failed to parse tunnel output (UDID/host/port). Is device connected & trusted? (missing {})",
            missing.join(", ")
        ),
        SpooferError::Aborted => "Aborted!".to_string(),
        e => format!("Error: {e}"),
    }
}

fn parse_latitude(s: &str) -> Result<f64, String> {
    parse_in_range(s, LATITUDE_RANGE)
}

fn parse_longitude(s: &str) -> Result<f64, String> {
    parse_in_range(s, LONGITUDE_RANGE)
}

fn parse_in_range(s: &str, range: std::ops::RangeInclusive<f64>) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("'{s}' is not a valid float"))?;
    if range.contains(&v) {
        Ok(v)
    } else {
        Err(format!(
            "{v} is not in the range {}<=x<={}",
            range.start(),
            range.end()
        ))
    }
}
