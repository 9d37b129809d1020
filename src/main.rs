//! # ring0 peer
//!
//! Joins the multicast group and plays the coordinator or branch role until
//! interrupted.
//!
//! ```text
//! RING0_ROLE=frodo  ring0            # coordinator
//! RING0_ROLE=gotham ring0            # branch
//! ring0 --config ring0.toml --peer-id springfield --interval-secs 5
//! ```

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ring0::{Config, Node, PeerId, RandomOracle};

/// Multicast ring-holder coordination peer
#[derive(Parser, Debug)]
#[command(name = "ring0")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (TOML)
    #[arg(short, long, env = "RING0_CONFIG")]
    config: Option<PathBuf>,

    /// This peer's identity
    #[arg(long, env = "RING0_ROLE")]
    peer_id: Option<String>,

    /// Identity of the coordinator peer
    #[arg(long, env = "RING0_COORDINATOR")]
    coordinator: Option<String>,

    /// Multicast group address
    #[arg(long)]
    group: Option<Ipv4Addr>,

    /// UDP port
    #[arg(short, long)]
    port: Option<u16>,

    /// Interface address used to join the group
    #[arg(long)]
    interface: Option<Ipv4Addr>,

    /// Seconds between announcements (coordinator) or queries (branch)
    #[arg(long)]
    interval_secs: Option<f64>,

    /// Forget a ring-holder not heard from for this many seconds
    #[arg(long)]
    holder_ttl_secs: Option<f64>,

    /// Election candidate (repeatable, replaces the configured list)
    #[arg(long = "member")]
    members: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, default_value = "false")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.json_logs);

    info!("Starting ring0 v{}", ring0::VERSION);

    let config = load_config(&args)?;
    info!(
        peer = %config.peer_id,
        role = %config.role(),
        group = %config.group_socket_addr(),
        "Configuration loaded"
    );

    let oracle = RandomOracle::new(config.members.clone());
    let node = Node::bind(&config, oracle).context("Failed to join the ring")?;
    info!(
        "ring0 socket listening on {}:{}",
        config.peer_id,
        node.local_addr()?.port()
    );

    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);
    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
        }
        let _ = signal_tx.send(());
    });

    node.run(shutdown_tx).await.context("ring0 node failed")?;

    info!("ring0 shutdown complete");
    Ok(())
}

/// Builds the configuration from an optional file plus CLI / env overrides
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(peer_id) = &args.peer_id {
        config.peer_id = PeerId::from(peer_id.as_str());
    }
    if let Some(coordinator) = &args.coordinator {
        config.coordinator = PeerId::from(coordinator.as_str());
    }
    if let Some(group) = args.group {
        config.group_addr = group;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(interface) = args.interface {
        config.interface = interface;
    }
    if let Some(secs) = args.interval_secs {
        config.interval = Duration::try_from_secs_f64(secs).context("Invalid --interval-secs")?;
    }
    if let Some(secs) = args.holder_ttl_secs {
        config.holder_ttl =
            Some(Duration::try_from_secs_f64(secs).context("Invalid --holder-ttl-secs")?);
    }
    if !args.members.is_empty() {
        config.members = args.members.iter().map(|m| PeerId::from(m.as_str())).collect();
    }

    config.validate()?;
    Ok(config)
}

/// Initialize structured logging with tracing
fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ring0::Role;

    #[test]
    fn test_cli_overrides() {
        let args = Args::parse_from([
            "ring0",
            "--peer-id",
            "frodo",
            "--interval-secs",
            "2.5",
            "--member",
            "gotham",
            "--member",
            "metropolis",
        ]);
        let config = load_config(&args).unwrap();

        assert_eq!(config.role(), Role::Coordinator);
        assert_eq!(config.interval, Duration::from_millis(2500));
        assert_eq!(config.members, vec![PeerId::from("gotham"), PeerId::from("metropolis")]);
        assert_eq!(config.port, 9001);
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let path = std::env::temp_dir().join(format!("ring0-cli-{}.toml", PeerId::random()));
        std::fs::write(&path, "peer_id = \"gotham\"\nport = 9100\ninterval = 3\n").unwrap();

        let args = Args::parse_from([
            "ring0",
            "--config",
            path.to_str().unwrap(),
            "--peer-id",
            "frodo",
        ]);
        let config = load_config(&args);
        std::fs::remove_file(&path).unwrap();
        let config = config.unwrap();

        assert_eq!(config.peer_id, PeerId::from("frodo"));
        assert_eq!(config.role(), Role::Coordinator);
        // values the command line leaves alone come from the file
        assert_eq!(config.port, 9100);
        assert_eq!(config.interval, Duration::from_secs(3));
    }

    #[test]
    fn test_role_from_environment() {
        std::env::set_var("RING0_ROLE", "springfield");
        let args = Args::parse_from(["ring0"]);
        std::env::remove_var("RING0_ROLE");

        let config = load_config(&args).unwrap();
        assert_eq!(config.peer_id, PeerId::from("springfield"));
        assert_eq!(config.role(), Role::Branch);
    }

    #[test]
    fn test_invalid_interval_rejected() {
        let args = Args::parse_from(["ring0", "--peer-id", "gotham", "--interval-secs", "0"]);
        assert!(load_config(&args).is_err());
    }
}
