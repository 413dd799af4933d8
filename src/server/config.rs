//! Server configuration.

use crate::{DEFAULT_LOG_FILE, DEFAULT_PORT, DEFAULT_SYNC_INTERVAL_MS};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    // === Network ===
    /// Bind address
    pub bind: String,
    /// Port number
    pub port: u16,

    // === Persistence ===
    /// Working directory; the append log lives here
    pub dir: PathBuf,
    /// Enable the append log
    pub appendonly: bool,
    /// Append log filename
    pub appendfilename: String,
    /// How often the append log is flushed to disk
    pub sync_interval: Duration,

    // === Logging ===
    /// Log level
    pub loglevel: LogLevel,
    /// Log file path (`None` for stdout)
    pub logfile: Option<PathBuf>,
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Debug,
    Verbose,
    #[default]
    Notice,
    Warning,
}

impl LogLevel {
    /// Parse a level name as written in config files.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Some(Self::Debug),
            "verbose" => Some(Self::Verbose),
            "notice" => Some(Self::Notice),
            "warning" => Some(Self::Warning),
            _ => None,
        }
    }

    /// The `tracing` filter directive this level maps to.
    pub fn as_filter(self) -> &'static str {
        match self {
            Self::Debug => "trace",
            Self::Verbose => "debug",
            Self::Notice => "info",
            Self::Warning => "warn",
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            dir: PathBuf::from("."),
            appendonly: true,
            appendfilename: DEFAULT_LOG_FILE.to_string(),
            sync_interval: Duration::from_millis(DEFAULT_SYNC_INTERVAL_MS),
            loglevel: LogLevel::default(),
            logfile: None,
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bind address.
    pub fn bind(mut self, bind: impl Into<String>) -> Self {
        self.bind = bind.into();
        self
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the working directory.
    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    /// Enable or disable the append log.
    pub fn appendonly(mut self, enabled: bool) -> Self {
        self.appendonly = enabled;
        self
    }

    /// Set the append log sync interval.
    pub fn sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval;
        self
    }

    /// Set the log level.
    pub fn loglevel(mut self, level: LogLevel) -> Self {
        self.loglevel = level;
        self
    }

    /// Full path of the append log.
    pub fn aof_path(&self) -> PathBuf {
        self.dir.join(&self.appendfilename)
    }

    /// Load configuration from a file.
    ///
    /// The format is one directive per line:
    /// ```text
    /// # Comment
    /// directive value
    /// directive "value with spaces"
    /// ```
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from a string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (directive, value) = Self::parse_line(line).ok_or_else(|| ConfigError::Parse {
                line: line_num + 1,
                message: "Invalid directive format".to_string(),
            })?;

            config.apply_directive(&directive.to_lowercase(), value, line_num + 1)?;
        }

        Ok(config)
    }

    /// Parse a single config line into directive and value.
    fn parse_line(line: &str) -> Option<(&str, &str)> {
        let mut parts = line.splitn(2, |c: char| c.is_whitespace());
        let directive = parts.next()?.trim();
        let value = parts.next().map(|v| v.trim()).unwrap_or("");

        let value = if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
            &value[1..value.len() - 1]
        } else {
            value
        };

        Some((directive, value))
    }

    /// Apply a single directive to the config.
    fn apply_directive(&mut self, directive: &str, value: &str, line: usize) -> Result<(), ConfigError> {
        match directive {
            // Network
            "bind" => self.bind = value.to_string(),
            "port" => self.port = parse_number(value, line)?,

            // Persistence
            "dir" => self.dir = PathBuf::from(value),
            "appendonly" => self.appendonly = parse_bool(value, line)?,
            "appendfilename" => {
                if value.is_empty() {
                    return Err(ConfigError::Parse {
                        line,
                        message: "appendfilename cannot be empty".to_string(),
                    });
                }
                self.appendfilename = value.to_string();
            }
            "aof-sync-interval-ms" => {
                let ms: u64 = parse_number(value, line)?;
                if ms == 0 {
                    return Err(ConfigError::Parse {
                        line,
                        message: "aof-sync-interval-ms must be positive".to_string(),
                    });
                }
                self.sync_interval = Duration::from_millis(ms);
            }

            // Logging
            "loglevel" => {
                self.loglevel = LogLevel::from_name(value).ok_or_else(|| ConfigError::Parse {
                    line,
                    message: format!("Invalid log level: {value}"),
                })?;
            }
            "logfile" => {
                if value.is_empty() {
                    self.logfile = None;
                } else {
                    self.logfile = Some(PathBuf::from(value));
                }
            }

            // Unknown directive - ignore for forward compatibility
            _ => {
                tracing::warn!("Unknown config directive at line {}: {}", line, directive);
            }
        }

        Ok(())
    }
}

/// Configuration parsing error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading config file.
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Parse error in config file.
    #[error("Config error at line {line}: {message}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// What was wrong with it
        message: String,
    },
}

impl From<ConfigError> for crate::Error {
    fn from(e: ConfigError) -> Self {
        crate::Error::Config(e.to_string())
    }
}

// Helper functions for parsing

fn parse_bool(value: &str, line: usize) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "yes" | "true" | "1" => Ok(true),
        "no" | "false" | "0" => Ok(false),
        _ => Err(ConfigError::Parse {
            line,
            message: format!("Invalid boolean: {value}"),
        }),
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, line: usize) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Parse {
        line,
        message: format!("Invalid number: {value}"),
    })
}
