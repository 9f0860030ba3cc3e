//! Server configuration.
//!
//! Every setting resolves with precedence **flag > environment > default**
//! and remembers where its value came from so startup can log it. Environment
//! lookups go through a caller-supplied closure; the binary loads the `.env`
//! file with [`load_env_file`] and then resolves against `std::env`.

use std::fmt;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use figma_client::{FigmaAuth, StorageConfig};
use figma_sdk::OutputFormat;
use secrecy::SecretString;
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 3333;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_ENV_FILE: &str = ".env";

const STORAGE_REQUIRED: [&str; 4] = [
    "AWS_REGION",
    "S3_BUCKET_NAME",
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
];

/// Command-line flags.
#[derive(Debug, Default, Parser)]
#[command(
    name = "figma-mcp",
    version,
    about = "MCP server exposing simplified Figma design data and image export"
)]
pub struct Cli {
    /// Figma personal access token
    #[arg(long)]
    pub figma_api_key: Option<String>,

    /// Figma OAuth access token
    #[arg(long)]
    pub figma_oauth_token: Option<String>,

    /// Port for the streamable HTTP transport
    #[arg(long)]
    pub port: Option<u16>,

    /// Interface for the streamable HTTP transport
    #[arg(long)]
    pub host: Option<String>,

    /// Shorthand for --format json
    #[arg(long, conflicts_with = "format")]
    pub json: bool,

    /// Tool output format (yaml or json)
    #[arg(long)]
    pub format: Option<OutputFormat>,

    /// Do not register the download_figma_images tool
    #[arg(long)]
    pub skip_image_downloads: bool,

    /// Path of the .env file to load
    #[arg(long)]
    pub env: Option<PathBuf>,

    /// Serve over stdin/stdout instead of HTTP
    #[arg(long)]
    pub stdio: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Cli,
    Env,
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => write!(f, "cli"),
            Self::Env => write!(f, "env"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// A resolved value and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sourced<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> Sourced<T> {
    fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Stdio,
    Http,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

#[derive(Debug)]
pub struct ServerConfig {
    pub auth: Sourced<FigmaAuth>,
    pub port: Sourced<u16>,
    pub host: Sourced<String>,
    pub output_format: Sourced<OutputFormat>,
    pub skip_image_downloads: Sourced<bool>,
    pub transport: Sourced<Transport>,
    /// `None` when the storage variables are absent; only the image tool cares.
    pub storage: Option<StorageConfig>,
    /// The `.env` file that was loaded, if any.
    pub env_file: Option<PathBuf>,
}

impl ServerConfig {
    /// Resolve settings from flags and an environment lookup.
    pub fn resolve<F>(cli: &Cli, env: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let auth = resolve_auth(cli, &lookup)?;

        let port = match (cli.port, lookup("PORT")) {
            (Some(port), _) => Sourced::new(port, ConfigSource::Cli),
            (None, Some(raw)) => Sourced::new(
                raw.parse::<u16>()
                    .with_context(|| format!("PORT must be a port number, got '{raw}'"))?,
                ConfigSource::Env,
            ),
            (None, None) => Sourced::new(DEFAULT_PORT, ConfigSource::Default),
        };

        let host = match (&cli.host, lookup("HOST")) {
            (Some(host), _) => Sourced::new(host.clone(), ConfigSource::Cli),
            (None, Some(host)) => Sourced::new(host, ConfigSource::Env),
            (None, None) => Sourced::new(DEFAULT_HOST.to_string(), ConfigSource::Default),
        };

        let output_format = if cli.json {
            Sourced::new(OutputFormat::Json, ConfigSource::Cli)
        } else if let Some(format) = cli.format {
            Sourced::new(format, ConfigSource::Cli)
        } else if let Some(raw) = lookup("OUTPUT_FORMAT") {
            let format = raw
                .parse::<OutputFormat>()
                .map_err(|e| anyhow::anyhow!("OUTPUT_FORMAT: {e}"))?;
            Sourced::new(format, ConfigSource::Env)
        } else {
            Sourced::new(OutputFormat::default(), ConfigSource::Default)
        };

        let skip_image_downloads = if cli.skip_image_downloads {
            Sourced::new(true, ConfigSource::Cli)
        } else if let Some(raw) = lookup("SKIP_IMAGE_DOWNLOADS") {
            Sourced::new(parse_flag(&raw), ConfigSource::Env)
        } else {
            Sourced::new(false, ConfigSource::Default)
        };

        let transport = if cli.stdio {
            Sourced::new(Transport::Stdio, ConfigSource::Cli)
        } else if let Some(raw) = lookup("MCP_TRANSPORT") {
            let transport = match raw.to_ascii_lowercase().as_str() {
                "stdio" => Transport::Stdio,
                "http" => Transport::Http,
                other => bail!("MCP_TRANSPORT must be 'stdio' or 'http', got '{other}'"),
            };
            Sourced::new(transport, ConfigSource::Env)
        } else {
            Sourced::new(Transport::Http, ConfigSource::Default)
        };

        let storage = resolve_storage(&lookup)?;

        Ok(Self {
            auth,
            port,
            host,
            output_format,
            skip_image_downloads,
            transport,
            storage,
            env_file: None,
        })
    }

    /// Log the resolved configuration. Secrets are reported by kind only.
    pub fn log_summary(&self) {
        info!(
            auth = self.auth.value.kind(),
            auth_source = %self.auth.source,
            transport = %self.transport.value,
            transport_source = %self.transport.source,
            host = %self.host.value,
            port = self.port.value,
            output_format = %self.output_format.value,
            output_format_source = %self.output_format.source,
            skip_image_downloads = self.skip_image_downloads.value,
            storage_configured = self.storage.is_some(),
            env_file = %self
                .env_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            "Configuration resolved"
        );
        if let Some(storage) = &self.storage {
            info!(
                bucket = %storage.bucket,
                region = %storage.region,
                key_prefix = storage.key_prefix.as_deref().unwrap_or(""),
                "Object storage enabled"
            );
        }
    }
}

fn resolve_auth<F>(cli: &Cli, lookup: &F) -> anyhow::Result<Sourced<FigmaAuth>>
where
    F: Fn(&str) -> Option<String>,
{
    let pick = |flag: &Option<String>, key: &str| -> Option<(String, ConfigSource)> {
        flag.as_ref()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(|v| (v, ConfigSource::Cli))
            .or_else(|| lookup(key).map(|v| (v, ConfigSource::Env)))
    };
    let personal = pick(&cli.figma_api_key, "FIGMA_API_KEY");
    let oauth = pick(&cli.figma_oauth_token, "FIGMA_OAUTH_TOKEN");

    // An explicit flag beats an inherited variable; otherwise OAuth wins.
    let use_oauth = match (&personal, &oauth) {
        (_, None) => false,
        (None, Some(_)) => true,
        (Some((_, p)), Some((_, o))) => !(*p == ConfigSource::Cli && *o == ConfigSource::Env),
    };

    match (personal, oauth) {
        (_, Some((token, source))) if use_oauth => Ok(Sourced::new(
            FigmaAuth::OAuth(SecretString::from(token)),
            source,
        )),
        (Some((token, source)), _) => Ok(Sourced::new(
            FigmaAuth::PersonalToken(SecretString::from(token)),
            source,
        )),
        _ => bail!(
            "A Figma credential is required: pass --figma-api-key or --figma-oauth-token, \
             or set FIGMA_API_KEY / FIGMA_OAUTH_TOKEN"
        ),
    }
}

fn resolve_storage<F>(lookup: &F) -> anyhow::Result<Option<StorageConfig>>
where
    F: Fn(&str) -> Option<String>,
{
    let values: Vec<Option<String>> = STORAGE_REQUIRED.iter().map(|k| lookup(k)).collect();
    let missing: Vec<&str> = STORAGE_REQUIRED
        .iter()
        .zip(&values)
        .filter(|(_, v)| v.is_none())
        .map(|(k, _)| *k)
        .collect();

    if missing.len() == STORAGE_REQUIRED.len() {
        return Ok(None);
    }
    if !missing.is_empty() {
        warn!(
            missing = %missing.join(", "),
            "Object storage partially configured; image downloads will be unavailable"
        );
        return Ok(None);
    }

    let mut values = values.into_iter().flatten();
    let (Some(region), Some(bucket), Some(access_key_id), Some(secret_access_key)) =
        (values.next(), values.next(), values.next(), values.next())
    else {
        return Ok(None);
    };

    let public_base_url = lookup("S3_PUBLIC_URL_BASE")
        .map(|raw| {
            url::Url::parse(&raw)
                .with_context(|| format!("S3_PUBLIC_URL_BASE is not a valid URL: '{raw}'"))?;
            Ok::<_, anyhow::Error>(raw.trim_end_matches('/').to_string())
        })
        .transpose()?;

    Ok(Some(StorageConfig {
        region,
        bucket,
        access_key_id,
        secret_access_key: SecretString::from(secret_access_key),
        session_token: lookup("AWS_SESSION_TOKEN").map(SecretString::from),
        public_base_url,
        key_prefix: lookup("S3_KEY_PREFIX"),
    }))
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Load `--env` (or `./.env`) into the process environment, overriding
/// inherited variables. A missing default file is not an error; a missing
/// explicit one is.
pub fn load_env_file(cli: &Cli) -> anyhow::Result<Option<PathBuf>> {
    let (path, explicit) = match &cli.env {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from(DEFAULT_ENV_FILE), false),
    };
    if !path.exists() {
        if explicit {
            bail!("env file {} does not exist", path.display());
        }
        return Ok(None);
    }
    dotenvy::from_path_override(&path)
        .with_context(|| format!("failed to load env file {}", path.display()))?;
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn cli_with_key() -> Cli {
        Cli {
            figma_api_key: Some("figd_cli".to_string()),
            ..Cli::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::resolve(&cli_with_key(), env(&[])).unwrap();
        assert_eq!(config.port, Sourced::new(DEFAULT_PORT, ConfigSource::Default));
        assert_eq!(config.host.value, DEFAULT_HOST);
        assert_eq!(config.output_format.value, OutputFormat::Yaml);
        assert!(!config.skip_image_downloads.value);
        assert_eq!(config.transport.value, Transport::Http);
        assert!(config.storage.is_none());
        assert_eq!(config.auth.value.kind(), "personal_token");
        assert_eq!(config.auth.source, ConfigSource::Cli);
    }

    #[test]
    fn test_flag_beats_env() {
        let cli = Cli {
            port: Some(4000),
            format: Some(OutputFormat::Yaml),
            ..cli_with_key()
        };
        let config = ServerConfig::resolve(
            &cli,
            env(&[("PORT", "5000"), ("OUTPUT_FORMAT", "json"), ("HOST", "0.0.0.0")]),
        )
        .unwrap();
        assert_eq!(config.port, Sourced::new(4000, ConfigSource::Cli));
        assert_eq!(config.output_format.value, OutputFormat::Yaml);
        assert_eq!(config.host, Sourced::new("0.0.0.0".to_string(), ConfigSource::Env));
    }

    #[test]
    fn test_env_values() {
        let config = ServerConfig::resolve(
            &Cli::default(),
            env(&[
                ("FIGMA_API_KEY", "figd_env"),
                ("PORT", "8080"),
                ("OUTPUT_FORMAT", "json"),
                ("SKIP_IMAGE_DOWNLOADS", "true"),
                ("MCP_TRANSPORT", "stdio"),
            ]),
        )
        .unwrap();
        assert_eq!(config.auth.source, ConfigSource::Env);
        assert_eq!(config.port.value, 8080);
        assert_eq!(config.output_format.value, OutputFormat::Json);
        assert!(config.skip_image_downloads.value);
        assert_eq!(config.transport.value, Transport::Stdio);
    }

    #[test]
    fn test_json_flag() {
        let cli = Cli {
            json: true,
            ..cli_with_key()
        };
        let config = ServerConfig::resolve(&cli, env(&[])).unwrap();
        assert_eq!(config.output_format, Sourced::new(OutputFormat::Json, ConfigSource::Cli));
    }

    #[test]
    fn test_missing_credential_fails() {
        let err = ServerConfig::resolve(&Cli::default(), env(&[])).unwrap_err();
        assert!(err.to_string().contains("Figma credential"));
    }

    #[test]
    fn test_oauth_preferred_from_same_source() {
        let config = ServerConfig::resolve(
            &Cli::default(),
            env(&[("FIGMA_API_KEY", "figd"), ("FIGMA_OAUTH_TOKEN", "oauth")]),
        )
        .unwrap();
        assert_eq!(config.auth.value.kind(), "oauth");
    }

    #[test]
    fn test_cli_key_beats_env_oauth() {
        let config =
            ServerConfig::resolve(&cli_with_key(), env(&[("FIGMA_OAUTH_TOKEN", "oauth")])).unwrap();
        assert_eq!(config.auth.value.kind(), "personal_token");
    }

    #[test]
    fn test_invalid_port_fails() {
        assert!(ServerConfig::resolve(&cli_with_key(), env(&[("PORT", "http")])).is_err());
    }

    #[test]
    fn test_storage_resolved() {
        let config = ServerConfig::resolve(
            &cli_with_key(),
            env(&[
                ("AWS_REGION", "eu-west-1"),
                ("S3_BUCKET_NAME", "design-assets"),
                ("AWS_ACCESS_KEY_ID", "AKIAEXAMPLE"),
                ("AWS_SECRET_ACCESS_KEY", "secret"),
                ("S3_PUBLIC_URL_BASE", "https://cdn.example.com/"),
                ("S3_KEY_PREFIX", "figma"),
            ]),
        )
        .unwrap();
        let storage = config.storage.unwrap();
        assert_eq!(storage.bucket, "design-assets");
        assert_eq!(storage.region, "eu-west-1");
        assert_eq!(storage.public_base_url.as_deref(), Some("https://cdn.example.com"));
        assert_eq!(storage.key_prefix.as_deref(), Some("figma"));
        assert!(storage.session_token.is_none());
    }

    #[test]
    fn test_partial_storage_is_absent() {
        let config = ServerConfig::resolve(
            &cli_with_key(),
            env(&[("AWS_REGION", "eu-west-1"), ("S3_BUCKET_NAME", "design-assets")]),
        )
        .unwrap();
        assert!(config.storage.is_none());
    }

    #[test]
    fn test_invalid_public_url_fails() {
        let err = ServerConfig::resolve(
            &cli_with_key(),
            env(&[
                ("AWS_REGION", "eu-west-1"),
                ("S3_BUCKET_NAME", "design-assets"),
                ("AWS_ACCESS_KEY_ID", "AKIAEXAMPLE"),
                ("AWS_SECRET_ACCESS_KEY", "secret"),
                ("S3_PUBLIC_URL_BASE", "not a url"),
            ]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("S3_PUBLIC_URL_BASE"));
    }

    #[test]
    fn test_env_file_loading() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("figma.env");
        std::fs::write(&path, "FIGMA_MCP_TEST_ENV_FILE_VALUE=loaded\n").unwrap();
        let cli = Cli {
            env: Some(path.clone()),
            ..Cli::default()
        };
        assert_eq!(load_env_file(&cli).unwrap(), Some(path));
        assert_eq!(
            std::env::var("FIGMA_MCP_TEST_ENV_FILE_VALUE").as_deref(),
            Ok("loaded")
        );

        let missing = Cli {
            env: Some(dir.path().join("absent.env")),
            ..Cli::default()
        };
        assert!(load_env_file(&missing).is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "figma-mcp",
            "--figma-api-key",
            "figd",
            "--format",
            "json",
            "--stdio",
            "--skip-image-downloads",
        ])
        .unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert!(cli.stdio);
        assert!(cli.skip_image_downloads);
        assert!(Cli::try_parse_from(["figma-mcp", "--json", "--format", "yaml"]).is_err());
    }
}
