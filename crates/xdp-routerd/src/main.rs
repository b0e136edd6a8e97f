//! routerd entry point.
//!
//! Loads the XDP forwarding program, attaches it to the configured
//! interfaces, programs its tables and reports counters until SIGINT or
//! SIGTERM.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use xdp_router_bpf::{ProgramImage, XdpLoader, XdpMode};
use xdp_routerd::daemon::shutdown_signal;
use xdp_routerd::{check_config, parse_log_level, RouterConfig, RouterDaemon, SystemResolver};

/// XDP router control plane
#[derive(Parser, Debug)]
#[command(name = "routerd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short = 'c', long)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the file
    #[arg(short = 'l', long, value_parser = level_arg)]
    log_level: Option<LevelFilter>,

    /// XDP attach mode (generic, driver, hardware); overrides the file
    #[arg(short = 'm', long)]
    xdp_mode: Option<XdpMode>,

    /// Validate and encode the configuration, then exit
    #[arg(long)]
    check: bool,
}

fn level_arg(s: &str) -> Result<LevelFilter, String> {
    parse_log_level(s).map_err(|e| e.to_string())
}

fn init_logging(level: LevelFilter) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| format!("Failed to set logger: {e}"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match RouterConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("routerd: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(mode) = args.xdp_mode {
        config.xdp_mode = mode;
    }

    let level = match args.log_level.map_or_else(|| config.log_filter(), Ok) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("routerd: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_logging(level) {
        eprintln!("routerd: {e}");
        return ExitCode::FAILURE;
    }

    info!(
        config = %args.config.display(),
        interfaces = ?config.interfaces,
        program = %config.program.display(),
        mode = %config.xdp_mode,
        "Starting routerd"
    );

    if args.check {
        return match check_config(&config, &SystemResolver) {
            Ok(report) => {
                println!("configuration OK: {report}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!(error = %e, "Configuration check failed");
                ExitCode::FAILURE
            }
        };
    }

    let image = match ProgramImage::from_path(&config.program) {
        Ok(image) => image,
        Err(e) => {
            error!(error = %e, "Cannot read data-plane program");
            return ExitCode::FAILURE;
        }
    };
    let loader = XdpLoader::new(config.xdp_mode);

    let mut daemon = RouterDaemon::new(config, Box::new(SystemResolver));
    if let Err(e) = daemon.start(&loader, &image) {
        error!(error = %e, state = %daemon.state(), "routerd failed to start");
        return ExitCode::FAILURE;
    }

    match daemon.run_until(shutdown_signal()).await {
        Ok(polls) => {
            info!(polls, "routerd stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "routerd stopped with error");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["routerd", "--config", "router.yaml"]);
        assert_eq!(args.config, PathBuf::from("router.yaml"));
        assert_eq!(args.log_level, None);
        assert_eq!(args.xdp_mode, None);
        assert!(!args.check);
    }

    #[test]
    fn test_config_is_required() {
        assert!(Args::try_parse_from(["routerd"]).is_err());
    }

    #[test]
    fn test_args_overrides() {
        let args = Args::parse_from([
            "routerd",
            "-c",
            "/tmp/r.yaml",
            "-l",
            "debug",
            "--xdp-mode",
            "native",
            "--check",
        ]);
        assert_eq!(args.config, PathBuf::from("/tmp/r.yaml"));
        assert_eq!(args.log_level, Some(LevelFilter::DEBUG));
        assert_eq!(args.xdp_mode, Some(XdpMode::Driver));
        assert!(args.check);
    }

    #[test]
    fn test_invalid_log_level_arg() {
        let err = Args::try_parse_from(["routerd", "-c", "r.yaml", "-l", "verbose"]).unwrap_err();
        assert!(err.to_string().contains("invalid log level: verbose"), "{err}");
    }

    #[test]
    fn test_invalid_xdp_mode_arg() {
        assert!(Args::try_parse_from(["routerd", "-c", "r.yaml", "-m", "turbo"]).is_err());
    }
}
