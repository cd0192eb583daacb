// # ddnsd - DDNS Daemon
//
// Thin integration layer: parse flags/environment, install logging, wire
// the provider registry, IP resolver and polling loop together, and map
// the outcome to an exit code. All DDNS logic lives in ddns-core.
//
// ## Configuration
//
// Every flag falls back to an environment variable:
//
// - `--provider` / `PROVIDER`: Provider name (arvan)
// - `--key` / `API_KEY`: Provider API key
// - `--domain` / `DOMAIN`: Managed domain
// - `--records` / `RECORDS`: Comma-separated record names
// - `-4` / `-6` or `IP_VERSION=4|6`: Address family (default IPv4)
// - `--interval` / `INTERVAL`: Seconds between checks (default 600)
// - `--timeout` / `TIMEOUT`: Per-request timeout in seconds (default 30)
// - `--log-level` / `DDNS_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export PROVIDER=arvan
// export API_KEY=your_key
// export DOMAIN=example.com
// export RECORDS=home,vpn
//
// ddnsd --interval 300
// ```

use clap::Parser;
use ddns_core::config::{DdnsConfig, EngineConfig, ProviderConfig};
use ddns_core::engine::{EngineEvent, PollingLoop, UpdateCoordinator};
use ddns_core::{Error, IpVersion, ProviderRegistry};
use ddns_ip_http::HttpIpResolver;
use std::process::ExitCode;
use tokio::sync::oneshot;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration error or unknown domain
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error, or the domain is not in the account
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl DdnsExitCode {
    fn for_error(err: &Error) -> Self {
        if err.is_fatal() {
            Self::ConfigError
        } else {
            Self::RuntimeError
        }
    }
}

/// Command line interface
#[derive(Parser, Debug)]
#[command(name = "ddnsd")]
#[command(about = "Keep DNS records pointed at this host's public IP address")]
#[command(version)]
struct Cli {
    /// DNS provider name
    #[arg(long, env = "PROVIDER")]
    provider: String,

    /// Provider API key
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    key: String,

    /// Managed domain, e.g. example.com
    #[arg(long, env = "DOMAIN")]
    domain: String,

    /// Record names under the domain, comma separated
    #[arg(long, env = "RECORDS", value_delimiter = ',', required = true)]
    records: Vec<String>,

    /// Track the IPv4 address
    #[arg(short = '4', long, conflicts_with = "ipv6")]
    ipv4: bool,

    /// Track the IPv6 address
    #[arg(short = '6', long)]
    ipv6: bool,

    /// Address family when neither -4 nor -6 is given (4 or 6)
    #[arg(long, env = "IP_VERSION")]
    ip_version: Option<u8>,

    /// Seconds between checks
    #[arg(long, env = "INTERVAL", default_value_t = 600)]
    interval: u64,

    /// Per-request timeout in seconds
    #[arg(long, env = "TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Log level
    #[arg(long, env = "DDNS_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Cli {
    /// Address family chosen on the command line, if any
    fn ip_version(&self) -> ddns_core::Result<Option<IpVersion>> {
        if self.ipv4 {
            return Ok(Some(IpVersion::V4));
        }
        if self.ipv6 {
            return Ok(Some(IpVersion::V6));
        }
        self.ip_version.map(IpVersion::from_number).transpose()
    }

    /// Build and validate the run configuration
    fn to_config(&self) -> ddns_core::Result<DdnsConfig> {
        let records = self
            .records
            .iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();

        let mut config = DdnsConfig::new(
            ProviderConfig::from_name(self.provider.trim(), self.key.as_str()),
            self.domain.trim(),
            records,
        );
        config.ip_version = Some(self.ip_version()?.unwrap_or(IpVersion::V4));
        config.engine = EngineConfig {
            interval_secs: self.interval,
            request_timeout_secs: self.timeout,
            ..EngineConfig::default()
        };

        config.validate()?;
        Ok(config)
    }
}

fn parse_log_level(raw: &str) -> ddns_core::Result<Level> {
    match raw.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(Error::config(format!(
            "DDNS_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            raw
        ))),
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version land here too
            let _ = e.print();
            return if e.use_stderr() {
                DdnsExitCode::ConfigError
            } else {
                DdnsExitCode::CleanShutdown
            }
            .into();
        }
    };

    let config = match cli.to_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let log_level = match parse_log_level(&cli.log_level) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting ddnsd daemon");
    info!(
        "Configuration loaded: provider {}, {} record(s) under {}",
        config.provider.type_name(),
        config.records.len(),
        config.domain
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match run_daemon(config).await {
            Ok(()) => DdnsExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {}", e);
                DdnsExitCode::for_error(&e)
            }
        }
    });

    result.into()
}

fn build_registry() -> ProviderRegistry {
    #[allow(unused_mut)]
    let mut registry = ProviderRegistry::new();

    #[cfg(feature = "arvan")]
    ddns_provider_arvan::register(&mut registry);

    registry
}

/// Run the daemon until a shutdown signal or a fatal startup error
async fn run_daemon(config: DdnsConfig) -> ddns_core::Result<()> {
    let registry = build_registry();
    debug!("Registered providers: {}", registry.list_providers().join(", "));

    let timeout = config.engine.request_timeout();
    let provider = registry.create_provider(&config.provider, timeout)?;
    let resolver = HttpIpResolver::new(timeout)?;

    let coordinator = UpdateCoordinator::new(provider, Box::new(resolver), &config)?;
    let (mut polling, mut events) = PollingLoop::new(coordinator, config.engine.clone())?;

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            log_event(&event);
        }
    });

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => {
                info!("Received shutdown signal: {}", signal);
                let _ = shutdown_tx.send(());
            }
            Err(e) => {
                // A dropped sender would stop the loop
                error!("Shutdown handling unavailable: {}", e);
                let _keep = shutdown_tx;
                std::future::pending::<()>().await;
            }
        }
    });

    polling.run_with_shutdown(Some(shutdown_rx)).await?;

    info!("Shutting down daemon");
    Ok(())
}

fn log_event(event: &EngineEvent) {
    debug!(?event, "engine event");
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> anyhow::Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> anyhow::Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        let mut argv = vec!["ddnsd"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv)
    }

    const REQUIRED: &[&str] = &[
        "--provider",
        "arvan",
        "--key",
        " secret \n",
        "--domain",
        "example.com",
        "--records",
        "home, vpn",
    ];

    fn with_required<'a>(extra: &[&'a str]) -> Vec<&'a str> {
        let mut args: Vec<&'a str> = REQUIRED.to_vec();
        args.extend_from_slice(extra);
        args
    }

    #[test]
    fn test_defaults() {
        let cli = parse(REQUIRED).unwrap();
        let config = cli.to_config().unwrap();

        assert_eq!(config.domain, "example.com");
        assert_eq!(config.records, vec!["home".to_string(), "vpn".to_string()]);
        assert_eq!(config.ip_version, Some(IpVersion::V4));
        assert_eq!(config.engine.interval_secs, 600);
        assert_eq!(config.engine.request_timeout_secs, 30);
        assert_eq!(config.provider.type_name(), "arvan");
        assert_eq!(parse_log_level(&cli.log_level).unwrap(), Level::INFO);
    }

    #[test]
    fn test_ipv6_flag() {
        let cli = parse(&with_required(&["-6", "--interval", "5"])).unwrap();
        let config = cli.to_config().unwrap();

        assert_eq!(config.ip_version, Some(IpVersion::V6));
        assert_eq!(config.engine.interval_secs, 5);
    }

    #[test]
    fn test_ip_family_flags_conflict() {
        assert!(parse(&with_required(&["-4", "-6"])).is_err());
    }

    #[test]
    fn test_numeric_ip_version() {
        let cli = parse(&with_required(&["--ip-version", "6"])).unwrap();
        assert_eq!(cli.to_config().unwrap().ip_version, Some(IpVersion::V6));

        let cli = parse(&with_required(&["--ip-version", "5"])).unwrap();
        let err = cli.to_config().unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(DdnsExitCode::for_error(&err), DdnsExitCode::ConfigError);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let cli = parse(&with_required(&["--interval", "0"])).unwrap();
        assert!(matches!(cli.to_config(), Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_log_level() {
        assert!(parse_log_level("verbose").is_err());
        assert_eq!(parse_log_level("WARN").unwrap(), Level::WARN);
    }

    #[test]
    fn test_unknown_provider_fails_at_creation() {
        let cli = parse(&[
            "--provider",
            "route53",
            "--key",
            "k",
            "--domain",
            "example.com",
            "--records",
            "home",
        ])
        .unwrap();
        let config = cli.to_config().unwrap();

        let err = build_registry()
            .create_provider(&config.provider, config.engine.request_timeout())
            .err()
            .unwrap();
        assert!(err.to_string().contains("Unknown provider type: route53"));
        assert_eq!(DdnsExitCode::for_error(&err), DdnsExitCode::ConfigError);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            DdnsExitCode::for_error(&Error::domain_not_found("example.com")),
            DdnsExitCode::ConfigError
        );
        assert_eq!(
            DdnsExitCode::for_error(&Error::http(401, "Unauthenticated")),
            DdnsExitCode::RuntimeError
        );
    }

    #[cfg(feature = "arvan")]
    #[test]
    fn test_arvan_registered() {
        assert!(build_registry().has_provider("arvan"));
    }
}
