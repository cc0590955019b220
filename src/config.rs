//! Command line arguments and validated deployment settings

use std::fmt;
use std::time::Duration;

use clap::Parser;
use tracing::warn;

use flowsync_client::HttpClientConfig;
use flowsync_core::{ImportParams, PollSettings};
use flowsync_interfaces::Position;
use flowsync_monitoring::MonitoringConfig;

use crate::error::{CliError, CliResult};

/// Import or upgrade a process group from a flow registry.
///
/// When a process group called NAME exists anywhere in the flow it is moved
/// to VERSION. Otherwise it is imported from the registry, which needs
/// --bucket and --flow.
#[derive(Parser, Debug, Clone)]
#[command(name = "flowsync", version, about, long_about)]
pub struct Cli {
    /// Process group name (must be unique)
    #[arg(value_name = "PROCESS_GROUP_NAME")]
    pub name: String,

    /// Registry version to deploy
    #[arg(
        id = "target_version",
        value_name = "VERSION",
        value_parser = clap::value_parser!(i64).range(1..)
    )]
    pub version: i64,

    /// Flow-management API endpoint (https://nifi:8443/nifi-api)
    #[arg(long = "nifi-api", env = "FLOWSYNC_NIFI_API")]
    pub nifi_api: String,

    /// Registry API endpoint (https://nifi:18080/nifi-registry-api)
    #[arg(long = "registry-api", env = "FLOWSYNC_REGISTRY_API")]
    pub registry_api: String,

    /// Username for both APIs
    #[arg(long, env = "FLOWSYNC_USERNAME")]
    pub username: Option<String>,

    /// Password for both APIs
    #[arg(long, env = "FLOWSYNC_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Use anonymous access for the flow-management API
    #[arg(long = "insecure-nifi", env = "FLOWSYNC_INSECURE_NIFI")]
    pub insecure_nifi: bool,

    /// Use anonymous access for the registry API
    #[arg(long = "insecure-registry", env = "FLOWSYNC_INSECURE_REGISTRY")]
    pub insecure_registry: bool,

    /// Disable TLS certificate verification
    #[arg(long = "no-verify-tls", env = "FLOWSYNC_NO_VERIFY_TLS")]
    pub no_verify_tls: bool,

    /// Registry bucket name (needed when the process group does not exist)
    #[arg(short, long, env = "FLOWSYNC_BUCKET")]
    pub bucket: Option<String>,

    /// Registry flow name (needed when the process group does not exist)
    #[arg(short, long, env = "FLOWSYNC_FLOW")]
    pub flow: Option<String>,

    /// Parent process group name to import into
    #[arg(short, long, env = "FLOWSYNC_PARENT")]
    pub parent: Option<String>,

    /// Registry client name (needed when more than one is configured)
    #[arg(short, long, env = "FLOWSYNC_REGISTRY")]
    pub registry: Option<String>,

    /// Position X,Y of an imported group instead of the computed one
    #[arg(
        long,
        env = "FLOWSYNC_POSITION",
        value_name = "X,Y",
        value_parser = parse_position,
        allow_hyphen_values = true
    )]
    pub position: Option<Position>,

    /// Seconds to wait for a version change to finish
    #[arg(long, default_value_t = 30, env = "FLOWSYNC_TIMEOUT")]
    pub timeout: u64,

    /// Milliseconds between two status reads of a version change
    #[arg(long = "poll-interval-ms", env = "FLOWSYNC_POLL_INTERVAL_MS", default_value_t = 50)]
    pub poll_interval_ms: u64,

    /// Seconds before a single HTTP request is abandoned
    #[arg(long = "http-timeout", env = "FLOWSYNC_HTTP_TIMEOUT", default_value_t = 30)]
    pub http_timeout: u64,

    /// Log filter used when RUST_LOG is not set
    #[arg(long = "log-filter", env = "FLOWSYNC_LOG", default_value = "info")]
    pub log_filter: String,

    /// Write logs as JSON lines
    #[arg(long = "json-logs", env = "FLOWSYNC_JSON_LOGS")]
    pub json_logs: bool,
}

impl Cli {
    /// Logging settings
    pub fn monitoring_config(&self) -> MonitoringConfig {
        MonitoringConfig::new(&self.log_filter, self.json_logs)
    }
}

fn parse_position(value: &str) -> Result<Position, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got {:?}", value))?;
    let coordinate = |part: &str| {
        part.trim()
            .parse::<i64>()
            .map_err(|e| format!("invalid coordinate {:?}: {}", part, e))
    };
    Ok(Position::new(coordinate(x)?, coordinate(y)?))
}

/// Username and password shared by both APIs
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Validated settings of one run
#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// Target process group name
    pub name: String,
    /// Target version
    pub version: i64,
    /// Flow-management API connection
    pub nifi: HttpClientConfig,
    /// Registry API connection
    pub registry: HttpClientConfig,
    /// Present unless both APIs are anonymous
    pub credentials: Option<Credentials>,
    /// Names used when importing
    pub import: ImportParams,
    /// Version change polling
    pub poll: PollSettings,
}

impl DeployConfig {
    /// Validates the arguments.
    ///
    /// Username and password are both required unless both APIs use
    /// anonymous access.
    pub fn from_cli(cli: Cli) -> CliResult<Self> {
        let credentials = match (non_empty(cli.username), non_empty(cli.password)) {
            (Some(username), Some(password)) => Some(Credentials { username, password }),
            _ if cli.insecure_nifi && cli.insecure_registry => None,
            _ => {
                return Err(CliError::Config(
                    "Username and password must be provided unless both --insecure-nifi and --insecure-registry are set"
                        .to_string(),
                ))
            }
        };

        if cli.poll_interval_ms == 0 {
            return Err(CliError::Config(
                "--poll-interval-ms must be greater than zero".to_string(),
            ));
        }

        if cli.no_verify_tls {
            warn!("TLS certificate verification is disabled");
        }
        let access = [
            ("flow-management", cli.insecure_nifi),
            ("registry", cli.insecure_registry),
        ];
        for (api, anonymous) in access {
            if anonymous {
                warn!(api, "Using anonymous access");
            }
        }

        let http = |base_url: String, anonymous: bool| HttpClientConfig {
            timeout_secs: cli.http_timeout,
            ..HttpClientConfig::new(base_url)
                .anonymous(anonymous)
                .verify_tls(!cli.no_verify_tls)
        };

        Ok(Self {
            nifi: http(cli.nifi_api, cli.insecure_nifi),
            registry: http(cli.registry_api, cli.insecure_registry),
            name: cli.name,
            version: cli.version,
            credentials,
            import: ImportParams {
                bucket: cli.bucket,
                flow: cli.flow,
                parent: cli.parent,
                registry: cli.registry,
                position: cli.position,
            },
            poll: PollSettings::new(
                Duration::from_secs(cli.timeout),
                Duration::from_millis(cli.poll_interval_ms),
            ),
        })
    }

    /// Credentials for an API that is not anonymous
    pub fn credentials(&self) -> CliResult<&Credentials> {
        self.credentials
            .as_ref()
            .ok_or_else(|| CliError::Config("Username and password must be provided".to_string()))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    fn parse(extra: &[&str]) -> Cli {
        let mut args: Vec<&str> = vec![
            "flowsync",
            "nested 123456",
            "2",
            "--nifi-api",
            "https://localhost:8443/nifi-api",
            "--registry-api",
            "http://localhost:18080/nifi-registry-api",
        ];
        args.extend_from_slice(extra);
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_full_command_line() {
        let cli = parse(&[
            "--no-verify-tls",
            "--insecure-registry",
            "--username",
            "admin",
            "--password",
            "supersecret1",
            "--bucket",
            "docker local test",
            "--flow",
            "test flow",
            "--registry",
            "docker local",
            "--parent",
            "test group",
        ]);
        let config = DeployConfig::from_cli(cli).unwrap();

        assert_eq!(config.name, "nested 123456");
        assert_eq!(config.version, 2);
        assert!(!config.nifi.anonymous);
        assert!(config.registry.anonymous);
        assert!(!config.nifi.verify_tls);
        assert_eq!(config.credentials().unwrap().username, "admin");
        assert_eq!(
            config.import,
            ImportParams {
                bucket: Some("docker local test".to_string()),
                flow: Some("test flow".to_string()),
                parent: Some("test group".to_string()),
                registry: Some("docker local".to_string()),
                position: None,
            }
        );
        assert_eq!(config.poll, PollSettings::default());
    }

    #[test]
    fn test_short_flags_and_position() {
        let cli = parse(&[
            "--insecure-nifi",
            "--insecure-registry",
            "-b",
            "bucket",
            "-f",
            "flow",
            "-p",
            "parent",
            "-r",
            "registry",
            "--position",
            "-120,40",
        ]);
        let config = DeployConfig::from_cli(cli).unwrap();
        assert_eq!(config.import.bucket.as_deref(), Some("bucket"));
        assert_eq!(config.import.position, Some(Position::new(-120, 40)));
        assert!(config.credentials.is_none());
    }

    #[test]
    fn test_credentials_required_unless_both_anonymous() {
        for extra in [
            vec![],
            vec!["--insecure-nifi"],
            vec!["--insecure-registry", "--username", "admin"],
            vec!["--username", "admin", "--password", ""],
        ] {
            let err = DeployConfig::from_cli(parse(&extra)).unwrap_err();
            assert!(err.is_config(), "unexpected {:?}", err);
        }
    }

    #[test]
    fn test_timeouts() {
        let cli = parse(&[
            "--insecure-nifi",
            "--insecure-registry",
            "--timeout",
            "5",
            "--poll-interval-ms",
            "200",
            "--http-timeout",
            "3",
        ]);
        let config = DeployConfig::from_cli(cli).unwrap();
        assert_eq!(
            config.poll,
            PollSettings::new(Duration::from_secs(5), Duration::from_millis(200))
        );
        assert_eq!(config.nifi.timeout_secs, 3);

        let zero = parse(&["--insecure-nifi", "--insecure-registry", "--poll-interval-ms", "0"]);
        assert!(DeployConfig::from_cli(zero).unwrap_err().is_config());
    }

    #[test]
    fn test_rejects_bad_arguments() {
        let base = [
            "flowsync",
            "--nifi-api",
            "https://nifi",
            "--registry-api",
            "https://registry",
        ];
        let with = |extra: &[&str]| {
            let mut args: Vec<&str> = base.to_vec();
            args.extend_from_slice(extra);
            Cli::try_parse_from(args)
        };

        assert!(with(&["name", "0"]).is_err());
        assert!(with(&["name", "two"]).is_err());
        assert!(with(&["name", "2", "--position", "12"]).is_err());
        assert!(with(&["name", "2", "--position", "1,y"]).is_err());
    }

    #[test]
    fn test_command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version_flag_and_version_argument_coexist() {
        let err = Cli::try_parse_from(["flowsync", "--version"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);

        assert_eq!(parse(&[]).version, 2);
    }

    #[test]
    fn test_flags_fall_back_to_environment() {
        // No other test reads this flag
        std::env::set_var("FLOWSYNC_JSON_LOGS", "true");
        let cli = parse(&[]);
        std::env::remove_var("FLOWSYNC_JSON_LOGS");

        assert!(cli.monitoring_config().json);
    }

    #[test]
    fn test_parse_position() {
        assert_eq!(parse_position("530, 2"), Ok(Position::new(530, 2)));
        assert!(parse_position("530").is_err());
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials {
            username: "admin".to_string(),
            password: "supersecret1".to_string(),
        };
        assert!(!format!("{:?}", creds).contains("supersecret1"));
    }
}
