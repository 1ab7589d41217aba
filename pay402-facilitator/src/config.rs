//! Facilitator server configuration.
//!
//! Loads configuration from a TOML file with support for environment variable
//! expansion in string values. Variables use `$VAR` or `${VAR}` syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 8081
//! accepted_chains = ["8453", "$EXTRA_CHAIN"]
//! ```
//!
//! # Environment Variables
//!
//! - `HOST` - Override server bind address
//! - `PORT` - Override server port
//! - Any variable referenced by `$VAR` in the config file

use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Errors raised while loading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file exists but could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// Path of the configuration file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid TOML for [`FacilitatorConfig`].
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level facilitator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilitatorConfig {
    /// Server bind address (default: `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Server port (default: `8081`).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Chains whose payments are accepted; empty accepts every chain.
    #[serde(default)]
    pub accepted_chains: Vec<String>,
}

const fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

const fn default_port() -> u16 {
    8081
}

impl Default for FacilitatorConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            accepted_chains: Vec::new(),
        }
    }
}

impl FacilitatorConfig {
    /// Loads configuration from `path`, reading variables from the process
    /// environment.
    ///
    /// A missing file yields the defaults. `HOST` and `PORT` override the
    /// file values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = if path.exists() {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_owned(),
                source,
            })?
        } else {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            String::new()
        };
        Self::from_toml(&content, |name| std::env::var(name).ok())
    }

    /// Parses configuration from TOML text, resolving `$VAR` references and
    /// the `HOST`/`PORT` overrides through `lookup`.
    ///
    /// Override values that do not parse are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the expanded text is not a valid
    /// configuration.
    pub fn from_toml<L>(content: &str, lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let expanded = expand_vars(content, &lookup);
        let mut config: Self = toml::from_str(&expanded)?;

        if let Some(host) = lookup("HOST").and_then(|h| h.parse().ok()) {
            config.host = host;
        }
        if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
            config.port = port;
        }

        Ok(config)
    }
}

/// Expands `$VAR` and `${VAR}` patterns using `lookup`.
///
/// Unresolved variables are left as-is.
fn expand_vars<L>(input: &str, lookup: L) -> String
where
    L: Fn(&str) -> Option<String>,
{
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }

        let braced = chars.next_if_eq(&'{').is_some();
        let mut var_name = String::new();
        let mut closed = false;
        while let Some(&c) = chars.peek() {
            if braced {
                if c == '}' {
                    chars.next();
                    closed = true;
                    break;
                }
            } else if !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            var_name.push(c);
            chars.next();
        }

        match lookup(&var_name).filter(|_| !var_name.is_empty()) {
            Some(value) => result.push_str(&value),
            None => {
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&var_name);
                if closed {
                    result.push('}');
                }
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(name: &str) -> Option<String> {
        match name {
            "CHAIN" => Some("8453".to_owned()),
            "OTHER_CHAIN" => Some("137".to_owned()),
            _ => None,
        }
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn expands_plain_and_braced_variables() {
        assert_eq!(expand_vars("a=$CHAIN;b=${OTHER_CHAIN}!", env), "a=8453;b=137!");
    }

    #[test]
    fn leaves_unresolved_and_bare_dollars() {
        assert_eq!(expand_vars("$MISSING ${MISSING} $ ${", env), "$MISSING ${MISSING} $ ${");
        assert_eq!(expand_vars("cost: 5$", env), "cost: 5$");
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = FacilitatorConfig::from_toml("", no_env).unwrap();
        assert_eq!(config, FacilitatorConfig::default());
        assert_eq!(config.port, 8081);
        assert_eq!(config.host.to_string(), "0.0.0.0");
        assert!(config.accepted_chains.is_empty());
    }

    #[test]
    fn parses_file_with_expansion() {
        let toml = r#"
            host = "127.0.0.1"
            port = 9000
            accepted_chains = ["$CHAIN", "${OTHER_CHAIN}"]
        "#;
        let config = FacilitatorConfig::from_toml(toml, env).unwrap();
        assert_eq!(config.host.to_string(), "127.0.0.1");
        assert_eq!(config.port, 9000);
        assert_eq!(config.accepted_chains, ["8453", "137"]);
    }

    #[test]
    fn host_and_port_overrides_win() {
        let lookup = |name: &str| match name {
            "HOST" => Some("10.0.0.1".to_owned()),
            "PORT" => Some("not-a-port".to_owned()),
            _ => None,
        };
        let config = FacilitatorConfig::from_toml("port = 9000", lookup).unwrap();
        assert_eq!(config.host.to_string(), "10.0.0.1");
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let err = FacilitatorConfig::from_toml("port = \"high\"", no_env).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_uses_defaults() {
        let config =
            FacilitatorConfig::load_from(Path::new("/nonexistent/pay402/config.toml")).unwrap();
        assert_eq!(config.accepted_chains, Vec::<String>::new());
    }
}
