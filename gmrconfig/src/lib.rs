//! # gmrnotify configuration
//!
//! Configuration management for the renderer notification shim:
//! - Loading configuration from a YAML file
//! - Merging with the embedded default configuration
//! - Environment variable overrides
//! - Typed getters and setters for the values the notifiers need
//! - Shared global instance
//!
//! ## Usage
//!
//! ```no_run
//! use gmrconfig::get_config;
//!
//! let config = get_config();
//!
//! let udn = config.get_device_udn("mediarenderer", "gmediarender")?;
//! let with_mpris = config.get_mpris_enabled()?;
//!
//! config.set_log_min_level("DEBUG".to_string())?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{anyhow, Result};
use dirs::home_dir;
use lazy_static::lazy_static;
use parking_lot::Mutex;
use serde_yaml::{Mapping, Value};
use std::{env, fmt, fs, path::Path, str::FromStr, sync::Arc};
use tracing::{info, warn};
use uuid::Uuid;

const DEFAULT_CONFIG: &str = include_str!("gmrnotify.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Failed to load gmrnotify configuration"));
}

const ENV_CONFIG_DIR: &str = "GMRNOTIFY_CONFIG";
const ENV_PREFIX: &str = "GMRNOTIFY_CONFIG__";
const CONFIG_DIR_NAME: &str = ".gmrnotify";

const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";
const DEFAULT_LOG_ENABLE_CONSOLE: bool = true;
const DEFAULT_MONITOR_ENABLED: bool = true;
const DEFAULT_MPRIS_ENABLED: bool = true;
const DEFAULT_MPRIS_IDENTITY: &str = "GmediaRender";

/// Generates a getter/setter pair for a boolean value with a default.
macro_rules! impl_bool_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<bool> {
            match self.get_value($path) {
                Ok(Value::Bool(b)) => Ok(b),
                _ => Ok($default),
            }
        }

        pub fn $setter(&self, value: bool) -> Result<()> {
            self.set_value($path, Value::Bool(value))
        }
    };
}

/// Message bus the notifiers connect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BusKind {
    #[default]
    System,
    Session,
}

impl BusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BusKind::System => "system",
            BusKind::Session => "session",
        }
    }
}

impl fmt::Display for BusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BusKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" => Ok(BusKind::System),
            "session" | "user" => Ok(BusKind::Session),
            other => Err(anyhow!("Unknown message bus '{}'", other)),
        }
    }
}

/// Configuration manager.
///
/// Values live in a YAML tree addressed by key paths such as
/// `&["dbus", "mpris", "enabled"]`. Every setter writes the file back.
#[derive(Debug)]
pub struct Config {
    config_dir: String,
    path: String,
    data: Mutex<Value>,
}

impl Clone for Config {
    fn clone(&self) -> Self {
        Self {
            config_dir: self.config_dir.clone(),
            path: self.path.clone(),
            data: Mutex::new(self.data.lock().clone()),
        }
    }
}

impl Config {
    /// Finds a config directory by trying different locations in order
    fn find_config_dir(directory: &str) -> String {
        if !directory.is_empty() {
            return directory.to_string();
        }

        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Trying to load config from env");
            return env_path;
        }

        if Path::new(CONFIG_DIR_NAME).exists() {
            return CONFIG_DIR_NAME.to_string();
        }

        if let Some(home) = home_dir() {
            let home_config = home.join(CONFIG_DIR_NAME);
            if home_config.exists() {
                return home_config.to_string_lossy().to_string();
            }
        }

        CONFIG_DIR_NAME.to_string()
    }

    /// Creates the directory if needed and checks it is readable and writable
    fn validate_config_dir(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        if !path.is_dir() {
            return Err(anyhow!("{} is not a directory", path.display()));
        }

        let test_file = path.join(".write_test");
        fs::write(&test_file, b"test")?;
        fs::remove_file(&test_file)?;

        fs::read_dir(path)?;

        Ok(())
    }

    /// Determines and validates the configuration directory
    ///
    /// The directory is searched in the following order:
    /// 1. The provided `directory` parameter if not empty
    /// 2. The `GMRNOTIFY_CONFIG` environment variable
    /// 3. `.gmrnotify` in the current directory
    /// 4. `.gmrnotify` in the user's home directory
    pub fn config_dir(directory: &str) -> Result<String> {
        let dir_path = Self::find_config_dir(directory);
        Self::validate_config_dir(Path::new(&dir_path))?;
        Ok(dir_path)
    }

    /// Loads the configuration from the specified directory
    ///
    /// This method:
    /// 1. Determines the configuration directory
    /// 2. Loads the default embedded configuration
    /// 3. Merges it with the external config.yaml file if present
    /// 4. Applies environment variable overrides
    /// 5. Saves the merged configuration
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::config_dir(directory)?;
        info!(config_dir = %config_dir, "Using config directory");

        let config_file_path = Path::new(&config_dir).join("config.yaml");
        let path = config_file_path.to_string_lossy().to_string();

        let mut default_value = Self::lower_keys_value(serde_yaml::from_str(DEFAULT_CONFIG)?);

        let yaml_data = if let Ok(data) = fs::read(&path) {
            info!(config_file = %path, "Loaded config file");
            data
        } else {
            info!(config_file = %path, "Config file not found, using default embedded config");
            DEFAULT_CONFIG.as_bytes().to_vec()
        };

        // Keys are compared case-insensitively, so lower them before merging
        let external_value = Self::lower_keys_value(serde_yaml::from_slice(&yaml_data)?);
        merge_yaml(&mut default_value, &external_value);
        let mut config_value = default_value;

        Self::apply_env_overrides(&mut config_value);

        let config = Config {
            config_dir,
            path,
            data: Mutex::new(config_value),
        };

        config.save()?;
        Ok(config)
    }

    pub fn directory(&self) -> &str {
        &self.config_dir
    }

    pub fn config_file(&self) -> &str {
        &self.path
    }

    /// Saves the current configuration to the config.yaml file
    pub fn save(&self) -> Result<()> {
        let yaml = serde_yaml::to_string(&*self.data.lock())?;
        fs::write(&self.path, yaml)?;
        Ok(())
    }

    /// Sets a configuration value at the specified path and saves it
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        {
            let mut data = self.data.lock();
            Self::set_value_internal(&mut data, path, value)?;
        }
        self.save()
    }

    fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
        if path.is_empty() {
            *data = value;
            return Ok(());
        }
        if let Value::Mapping(map) = data {
            let key_value = Value::String(path[0].to_lowercase());
            if path.len() == 1 {
                map.insert(key_value, value);
            } else {
                let entry = map
                    .entry(key_value)
                    .or_insert(Value::Mapping(Mapping::new()));
                Self::set_value_internal(entry, &path[1..], value)?;
            }
            Ok(())
        } else {
            Err(anyhow!("Current node is not a map"))
        }
    }

    /// Gets a configuration value at the specified path
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.data.lock();
        Self::get_value_internal(&data, path)
    }

    fn get_value_internal(data: &Value, path: &[&str]) -> Result<Value> {
        let mut current = data;
        for (i, key) in path.iter().enumerate() {
            if let Value::Mapping(map) = current {
                match map.get(&Value::String(key.to_lowercase())) {
                    Some(next) => current = next,
                    None => return Err(anyhow!("Path {} does not exist", path[..=i].join("."))),
                }
            } else {
                return Err(anyhow!("Path {} is not a map", path[..i].join(".")));
            }
        }
        Ok(current.clone())
    }

    fn apply_env_overrides(config: &mut Value) {
        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                let key_path = stripped.split("__").collect::<Vec<_>>();
                let yaml_value = Self::convert_env_value(&value);
                if let Err(e) = Self::set_value_internal(config, &key_path, yaml_value) {
                    warn!(env_var = %key, error = %e, "Ignoring config override");
                }
            }
        }
    }

    fn convert_env_value(value: &str) -> Value {
        serde_yaml::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.to_string()))
    }

    fn lower_keys_value(value: Value) -> Value {
        match value {
            Value::Mapping(map) => {
                let mut new_map = Mapping::new();
                for (k, v) in map {
                    let key = match k {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    new_map.insert(key, Self::lower_keys_value(v));
                }
                Value::Mapping(new_map)
            }
            Value::Sequence(seq) => {
                Value::Sequence(seq.into_iter().map(Self::lower_keys_value).collect())
            }
            _ => value,
        }
    }

    /// Gets the UDN (Unique Device Name) for a device, generating one if it doesn't exist
    ///
    /// The `uuid:` prefix is stripped, the D-Bus names and object paths are
    /// derived from the bare UUID.
    pub fn get_device_udn(&self, devtype: &str, name: &str) -> Result<String> {
        let path = &["devices", devtype, name, "udn"];
        match self.get_value(path) {
            Ok(Value::String(udn)) if !udn.trim().is_empty() => Ok(sanitize_udn(&udn)),
            _ => {
                let new_udn = Uuid::new_v4().to_string();
                info!(devtype, name, udn = %new_udn, "Generated device UDN");
                self.set_value(path, Value::String(new_udn.clone()))?;
                Ok(new_udn)
            }
        }
    }

    /// Sets the UDN (Unique Device Name) for a device
    pub fn set_device_udn(&self, devtype: &str, name: &str, udn: String) -> Result<()> {
        self.set_value(
            &["devices", devtype, name, "udn"],
            Value::String(sanitize_udn(&udn)),
        )
    }

    /// Gets the bus the notifiers attach to (`system` unless configured)
    pub fn get_dbus_bus(&self) -> Result<BusKind> {
        match self.get_value(&["dbus", "bus"]) {
            Ok(Value::String(s)) => s.parse(),
            _ => Ok(BusKind::default()),
        }
    }

    pub fn set_dbus_bus(&self, bus: BusKind) -> Result<()> {
        self.set_value(&["dbus", "bus"], Value::String(bus.as_str().to_string()))
    }

    impl_bool_config!(
        get_monitor_enabled,
        set_monitor_enabled,
        &["dbus", "monitor", "enabled"],
        DEFAULT_MONITOR_ENABLED
    );

    impl_bool_config!(
        get_mpris_enabled,
        set_mpris_enabled,
        &["dbus", "mpris", "enabled"],
        DEFAULT_MPRIS_ENABLED
    );

    /// Gets the MPRIS `Identity` shown by desktop media widgets
    pub fn get_mpris_identity(&self) -> Result<String> {
        match self.get_value(&["dbus", "mpris", "identity"]) {
            Ok(Value::String(s)) if !s.trim().is_empty() => Ok(s),
            _ => Ok(DEFAULT_MPRIS_IDENTITY.to_string()),
        }
    }

    pub fn set_mpris_identity(&self, identity: String) -> Result<()> {
        self.set_value(&["dbus", "mpris", "identity"], Value::String(identity))
    }

    impl_bool_config!(
        get_log_enable_console,
        set_log_enable_console,
        &["host", "logger", "enable_console"],
        DEFAULT_LOG_ENABLE_CONSOLE
    );

    /// Gets the minimum log level
    pub fn get_log_min_level(&self) -> Result<String> {
        match self.get_value(&["host", "logger", "min_level"]) {
            Ok(Value::String(s)) => Ok(s),
            _ => Ok(DEFAULT_LOG_MIN_LEVEL.to_string()),
        }
    }

    pub fn set_log_min_level(&self, level: String) -> Result<()> {
        self.set_value(&["host", "logger", "min_level"], Value::String(level))
    }
}

fn sanitize_udn(udn: &str) -> String {
    let udn = udn.trim();
    udn.strip_prefix("uuid:").unwrap_or(udn).to_string()
}

/// Returns the global configuration instance
///
/// Loaded on first access from the directory found by [`Config::config_dir`].
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

/// Merges external YAML configuration into default configuration
///
/// Mappings are merged key by key; scalars and sequences from `external`
/// replace the default, nulls are ignored.
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        // An empty file or an unset key keeps the default
        (_, Value::Null) => {}
        (d, e) => *d = e.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_yaml_keeps_defaults() {
        let mut default: Value = serde_yaml::from_str("a: {b: 1, c: 2}\nd: [1]").unwrap();
        let external: Value = serde_yaml::from_str("a: {c: 3}\nd: [4, 5]").unwrap();
        merge_yaml(&mut default, &external);

        let expected: Value = serde_yaml::from_str("a: {b: 1, c: 3}\nd: [4, 5]").unwrap();
        assert_eq!(default, expected);
    }

    #[test]
    fn test_merge_yaml_ignores_null() {
        let mut default: Value = serde_yaml::from_str("a: 1").unwrap();
        merge_yaml(&mut default, &Value::Null);
        assert_eq!(default, serde_yaml::from_str::<Value>("a: 1").unwrap());
    }

    #[test]
    fn test_lower_keys() {
        let value: Value = serde_yaml::from_str("DBus: {MPRIS: {Enabled: true}}").unwrap();
        let lowered = Config::lower_keys_value(value);
        let expected: Value = serde_yaml::from_str("dbus: {mpris: {enabled: true}}").unwrap();
        assert_eq!(lowered, expected);
    }

    #[test]
    fn test_bus_kind_parse() {
        assert_eq!("system".parse::<BusKind>().unwrap(), BusKind::System);
        assert_eq!(" Session ".parse::<BusKind>().unwrap(), BusKind::Session);
        assert!("tcp".parse::<BusKind>().is_err());
    }

    #[test]
    fn test_sanitize_udn() {
        assert_eq!(sanitize_udn(" uuid:1234-ab "), "1234-ab");
        assert_eq!(sanitize_udn("1234-ab"), "1234-ab");
    }

    #[test]
    fn test_embedded_default_parses() {
        let value: Value = serde_yaml::from_str(DEFAULT_CONFIG).unwrap();
        let bus = Config::get_value_internal(&value, &["dbus", "bus"]).unwrap();
        assert_eq!(bus, Value::String("system".to_string()));
    }
}
