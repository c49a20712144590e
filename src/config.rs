use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use std::{env, fs};

use serde::Deserialize;

use crate::error::{Error, Result};

pub const MAX_POST_LENGTH: usize = 4096;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

#[derive(Deserialize, Default)]
pub struct Telegram {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub default_channel: String,
    pub api_url: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct Paths {
    /// Where the authored documents live
    #[serde(default)]
    pub vault_dir: PathBuf,
    #[serde(default)]
    pub scheduled_dir: PathBuf,
    /// Root for attachment paths, the vault when not set
    pub media_dir: Option<PathBuf>,
}

#[derive(Deserialize)]
pub struct Defaults {
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_max_length() -> usize {
    MAX_POST_LENGTH
}

fn default_sweep_interval_secs() -> u64 {
    DEFAULT_SWEEP_INTERVAL_SECS
}

#[derive(Deserialize)]
pub struct Log {
    pub level: LogLevel,
    pub log_to_console: bool,
    pub location: Option<PathBuf>,
}

#[derive(Deserialize, Copy, Clone, Debug, PartialEq)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Ok(LogLevel::Critical),
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(Error::Config(format!("Unknown log level '{}'", s))),
        }
    }
}

#[derive(Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: Telegram,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub defaults: Defaults,
    pub log: Option<Log>,
}

impl Config {
    pub fn media_dir(&self) -> &Path {
        self.paths.media_dir.as_deref().unwrap_or(&self.paths.vault_dir)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.defaults.sweep_interval_secs)
    }

    /// Overrides settings with the variables returned by `var`.
    /// Used with `std::env::var` at startup.
    pub fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = var("BOT_TOKEN") {
            self.telegram.bot_token = token;
        }
        if let Some(channel) = var("DEFAULT_CHANNEL") {
            self.telegram.default_channel = channel;
        }
        if let Some(dir) = var("OBSIDIAN_VAULT_PATH") {
            self.paths.vault_dir = parse_path(PathBuf::from(dir));
        }
        if let Some(dir) = var("SCHEDULED_POSTS_PATH") {
            self.paths.scheduled_dir = parse_path(PathBuf::from(dir));
        }
        if let Some(max_length) = var("MAX_LENGTH") {
            self.defaults.max_length = max_length.trim().parse()
                .map_err(|_| Error::Config(format!("MAX_LENGTH is not a number: {}", max_length)))?;
        }
        if let Some(level) = var("LOG_LEVEL") {
            let level = level.parse()?;
            match self.log {
                Some(ref mut log) => log.level = level,
                None => self.log = Some(Log { level, log_to_console: true, location: None }),
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            return Err(Error::Config("telegram.bot_token (BOT_TOKEN) is required".to_string()));
        }
        if self.telegram.default_channel.trim().is_empty() {
            return Err(Error::Config("telegram.default_channel (DEFAULT_CHANNEL) is required".to_string()));
        }
        if self.paths.vault_dir.as_os_str().is_empty() {
            return Err(Error::Config("paths.vault_dir (OBSIDIAN_VAULT_PATH) is required".to_string()));
        }
        if self.paths.scheduled_dir.as_os_str().is_empty() {
            return Err(Error::Config("paths.scheduled_dir (SCHEDULED_POSTS_PATH) is required".to_string()));
        }
        if !(1..=MAX_POST_LENGTH).contains(&self.defaults.max_length) {
            return Err(Error::Config(format!("defaults.max_length must be between 1 and {}, got {}",
                                             MAX_POST_LENGTH, self.defaults.max_length)));
        }
        if self.defaults.sweep_interval_secs == 0 {
            return Err(Error::Config("defaults.sweep_interval_secs must be greater than 0".to_string()));
        }
        Ok(())
    }

    fn expand_paths(&mut self) {
        self.paths = Paths {
            vault_dir: parse_path(self.paths.vault_dir.clone()),
            scheduled_dir: parse_path(self.paths.scheduled_dir.clone()),
            media_dir: self.paths.media_dir.clone().map(parse_path),
        };
        if let Some(ref mut log) = self.log {
            log.location = log.location.clone().map(parse_path);
        }
    }
}

fn parse_path(path: PathBuf) -> PathBuf {
    let Ok(rest) = path.strip_prefix("${exe_dir}") else {
        return path;
    };

    match env::current_exe().ok().as_deref().and_then(Path::parent) {
        Some(exe_dir) => exe_dir.join(rest),
        None => path,
    }
}

pub fn parse_config(cfg_content: &str) -> Result<Config> {
    let mut cfg = toml::from_str::<Config>(cfg_content)
        .map_err(|e| Error::Config(format!("Error parsing configuration file: {}", e)))?;
    cfg.expand_paths();
    Ok(cfg)
}

pub fn read_config(cfg_path: &Path) -> Result<Config> {
    let cfg_content = fs::read_to_string(cfg_path)
        .map_err(|e| Error::Config(format!("Error opening configuration file {}: {}", cfg_path.display(), e)))?;

    parse_config(&cfg_content)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const CONFIG: &str = r#"
[telegram]
bot_token = "123:abc"
default_channel = "@my_channel"

[paths]
vault_dir = "/home/me/vault"
scheduled_dir = "/home/me/scheduled"

[defaults]
max_length = 1000

[log]
level = "Debug"
log_to_console = true
"#;

    fn env_of(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_parse_config() {
        let cfg = parse_config(CONFIG).unwrap();
        assert_eq!(cfg.telegram.bot_token, "123:abc");
        assert_eq!(cfg.telegram.default_channel, "@my_channel");
        assert_eq!(cfg.telegram.api_url, None);
        assert_eq!(cfg.paths.vault_dir, PathBuf::from("/home/me/vault"));
        assert_eq!(cfg.media_dir(), Path::new("/home/me/vault"));
        assert_eq!(cfg.defaults.max_length, 1000);
        assert_eq!(cfg.sweep_interval(), Duration::from_secs(300));
        assert_eq!(cfg.log.as_ref().unwrap().level, LogLevel::Debug);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_media_dir_override() {
        let cfg = parse_config("[paths]\nvault_dir = \"/v\"\nmedia_dir = \"/m\"\n").unwrap();
        assert_eq!(cfg.media_dir(), Path::new("/m"));
    }

    #[test]
    fn test_env_overrides() {
        let mut cfg = parse_config(CONFIG).unwrap();
        cfg.apply_env(env_of(&[
            ("BOT_TOKEN", "999:zzz"),
            ("MAX_LENGTH", "4096"),
            ("LOG_LEVEL", "warning"),
            ("SCHEDULED_POSTS_PATH", "/tmp/scheduled"),
        ])).unwrap();

        assert_eq!(cfg.telegram.bot_token, "999:zzz");
        assert_eq!(cfg.telegram.default_channel, "@my_channel");
        assert_eq!(cfg.defaults.max_length, 4096);
        assert_eq!(cfg.paths.scheduled_dir, PathBuf::from("/tmp/scheduled"));
        assert_eq!(cfg.log.unwrap().level, LogLevel::Warn);
    }

    #[test]
    fn test_env_only_config() {
        let mut cfg = Config::default();
        assert!(cfg.validate().is_err());

        cfg.apply_env(env_of(&[
            ("BOT_TOKEN", "123:abc"),
            ("DEFAULT_CHANNEL", "@chan"),
            ("OBSIDIAN_VAULT_PATH", "/vault"),
            ("SCHEDULED_POSTS_PATH", "/scheduled"),
            ("LOG_LEVEL", "info"),
        ])).unwrap();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.defaults.max_length, MAX_POST_LENGTH);
        assert!(cfg.log.unwrap().log_to_console);
    }

    #[test]
    fn test_invalid_env() {
        let mut cfg = Config::default();
        assert!(cfg.apply_env(env_of(&[("MAX_LENGTH", "lots")])).is_err());
        assert!(cfg.apply_env(env_of(&[("LOG_LEVEL", "chatty")])).is_err());
    }

    #[test]
    fn test_validate_max_length() {
        let mut cfg = parse_config(CONFIG).unwrap();
        cfg.defaults.max_length = 0;
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
        cfg.defaults.max_length = 4097;
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
        cfg.defaults.max_length = 4096;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_required() {
        let mut cfg = parse_config(CONFIG).unwrap();
        cfg.telegram.default_channel = " ".to_string();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("DEFAULT_CHANNEL"));
    }

    #[test]
    fn test_exe_dir_paths() {
        let cfg = parse_config("[paths]\nvault_dir = \"${exe_dir}/vault\"\nscheduled_dir = \"relative\"\n").unwrap();
        let exe_dir = env::current_exe().unwrap().parent().unwrap().to_path_buf();
        assert_eq!(cfg.paths.vault_dir, exe_dir.join("vault"));
        assert_eq!(cfg.paths.scheduled_dir, PathBuf::from("relative"));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(parse_config("[telegram\n"), Err(Error::Config(_))));
    }
}
