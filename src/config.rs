use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::codec::DEFAULT_SHEET_NAME;
use crate::panel::MOBILE_BREAKPOINT;

// Constants
const DEFAULT_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 3000);
const DEFAULT_EXPORT_NAME: &str = "export.xlsx";
const DEFAULT_STATIC_DIR: &str = "static";

/// Server settings, each overridable from the environment.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// `DASHBOARD_ADDR`
    pub addr: SocketAddr,
    /// `DASHBOARD_BREAKPOINT`
    pub breakpoint: u32,
    /// `DASHBOARD_EXPORT_NAME`
    pub export_name: String,
    pub sheet_name: String,
    /// `DASHBOARD_STATIC_DIR`
    pub static_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            addr: SocketAddr::from(DEFAULT_ADDR),
            breakpoint: MOBILE_BREAKPOINT,
            export_name: DEFAULT_EXPORT_NAME.to_string(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup. Values that do not parse are
    /// ignored with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(addr) = lookup("DASHBOARD_ADDR") {
            match addr.parse() {
                Ok(addr) => config.addr = addr,
                Err(_) => log::warn!("ignoring invalid DASHBOARD_ADDR '{}'", addr),
            }
        }
        if let Some(width) = lookup("DASHBOARD_BREAKPOINT") {
            match width.parse() {
                Ok(width) => config.breakpoint = width,
                Err(_) => log::warn!("ignoring invalid DASHBOARD_BREAKPOINT '{}'", width),
            }
        }
        if let Some(name) = lookup("DASHBOARD_EXPORT_NAME").filter(|n| !n.trim().is_empty()) {
            config.export_name = name;
        }
        if let Some(dir) = lookup("DASHBOARD_STATIC_DIR") {
            config.static_dir = PathBuf::from(dir);
        }

        config
    }
}
