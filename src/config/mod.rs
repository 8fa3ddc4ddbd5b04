//! Runtime configuration sourced from the environment.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::core::ChainConfig;

pub static GLOBAL_CONFIG: Lazy<Config> = Lazy::new(Config::new);

static DEFAULT_DATA_DIR: &str = "./data";

const DATA_DIR_KEY: &str = "ASTRAL_DATA_DIR";
const DIFFICULTY_BITS_KEY: &str = "ASTRAL_DIFFICULTY_BITS";
const ENFORCE_GENESIS_POW_KEY: &str = "ASTRAL_ENFORCE_GENESIS_POW";

pub struct Config {
    inner: RwLock<HashMap<String, String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Config {
        let mut map = HashMap::new();
        map.insert(
            String::from(DATA_DIR_KEY),
            env::var(DATA_DIR_KEY).unwrap_or_else(|_| String::from(DEFAULT_DATA_DIR)),
        );
        if let Ok(bits) = env::var(DIFFICULTY_BITS_KEY) {
            map.insert(String::from(DIFFICULTY_BITS_KEY), bits);
        }
        if let Ok(flag) = env::var(ENFORCE_GENESIS_POW_KEY) {
            map.insert(String::from(ENFORCE_GENESIS_POW_KEY), flag);
        }

        Config {
            inner: RwLock::new(map),
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        let inner = self
            .inner
            .read()
            .expect("Failed to acquire read lock on config - this should never happen");
        PathBuf::from(
            inner
                .get(DATA_DIR_KEY)
                .expect("Data directory should always be present in config"),
        )
    }

    pub fn set_data_dir(&self, dir: String) {
        let mut inner = self
            .inner
            .write()
            .expect("Failed to acquire write lock on config - this should never happen");
        inner.insert(String::from(DATA_DIR_KEY), dir);
    }

    /// Configured difficulty; unset or unparseable values fall back to 0.
    pub fn difficulty_bits(&self) -> u32 {
        let inner = self
            .inner
            .read()
            .expect("Failed to acquire read lock on config - this should never happen");
        inner
            .get(DIFFICULTY_BITS_KEY)
            .and_then(|bits| bits.parse().ok())
            .unwrap_or(0)
    }

    pub fn set_difficulty_bits(&self, bits: u32) {
        let mut inner = self
            .inner
            .write()
            .expect("Failed to acquire write lock on config - this should never happen");
        inner.insert(String::from(DIFFICULTY_BITS_KEY), bits.to_string());
    }

    pub fn enforce_genesis_pow(&self) -> bool {
        let inner = self
            .inner
            .read()
            .expect("Failed to acquire read lock on config - this should never happen");
        matches!(
            inner.get(ENFORCE_GENESIS_POW_KEY).map(String::as_str),
            Some("1") | Some("true")
        )
    }

    pub fn set_enforce_genesis_pow(&self, enforce: bool) {
        let mut inner = self
            .inner
            .write()
            .expect("Failed to acquire write lock on config - this should never happen");
        inner.insert(String::from(ENFORCE_GENESIS_POW_KEY), enforce.to_string());
    }

    /// Chain validation settings derived from the current configuration.
    pub fn chain_config(&self) -> ChainConfig {
        ChainConfig {
            difficulty_bits: self.difficulty_bits(),
            enforce_genesis_pow: self.enforce_genesis_pow(),
        }
    }
}
