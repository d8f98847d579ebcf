//! Configuration loading and representation.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};

pub const DATA_DIR_VAR: &str = "BINSTOCK_DATA_DIR";
pub const LOCK_TIMEOUT_VAR: &str = "BINSTOCK_LOCK_TIMEOUT_MS";
pub const DELETE_POLICY_VAR: &str = "BINSTOCK_ITEM_DELETE_POLICY";

const ITEMS_FILE: &str = "items.json";
const BINS_FILE: &str = "bins.json";

/// What deleting an item does to bins that still track it.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum ItemDeletePolicy {
    /// Delete the item and leave ledger entries pointing at it.
    #[default]
    Orphan,
    /// Refuse with a conflict while any bin tracks the item.
    Block,
    /// Delete the item, then drop it from every ledger.
    Cascade,
}

impl FromStr for ItemDeletePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "orphan" => Ok(Self::Orphan),
            "block" => Ok(Self::Block),
            "cascade" => Ok(Self::Cascade),
            other => bail!("unknown item delete policy '{other}' (expected orphan, block or cascade)"),
        }
    }
}

/// Where the catalog keeps its collections and how it guards them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Directory holding `items.json` and `bins.json`.
    pub data_dir: PathBuf,
    /// Upper bound on waiting for a store lock; `None` waits indefinitely.
    pub lock_timeout: Option<Duration>,
    pub item_delete_policy: ItemDeletePolicy,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            lock_timeout: None,
            item_delete_policy: ItemDeletePolicy::default(),
        }
    }
}

impl CatalogConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Read overrides from the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(dir) = lookup(DATA_DIR_VAR).filter(|v| !v.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }

        if let Some(raw) = lookup(LOCK_TIMEOUT_VAR) {
            let millis: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{LOCK_TIMEOUT_VAR} must be a whole number of milliseconds, got '{raw}'"))?;
            config.lock_timeout = (millis > 0).then(|| Duration::from_millis(millis));
        }

        if let Some(raw) = lookup(DELETE_POLICY_VAR) {
            config.item_delete_policy = raw
                .parse()
                .with_context(|| format!("invalid {DELETE_POLICY_VAR}"))?;
        }

        Ok(config)
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = Some(lock_timeout);
        self
    }

    pub fn with_item_delete_policy(mut self, policy: ItemDeletePolicy) -> Self {
        self.item_delete_policy = policy;
        self
    }

    pub fn items_path(&self) -> PathBuf {
        self.data_dir.join(ITEMS_FILE)
    }

    pub fn bins_path(&self) -> PathBuf {
        self.data_dir.join(BINS_FILE)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = CatalogConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, CatalogConfig::default());
        assert_eq!(config.items_path(), PathBuf::from("data/items.json"));
        assert_eq!(config.bins_path(), PathBuf::from("data/bins.json"));
    }

    #[test]
    fn overrides_are_applied() {
        let config = CatalogConfig::from_lookup(lookup(&[
            (DATA_DIR_VAR, "/var/lib/binstock"),
            (LOCK_TIMEOUT_VAR, "250"),
            (DELETE_POLICY_VAR, "Cascade"),
        ]))
        .unwrap();

        assert_eq!(config.data_dir(), Path::new("/var/lib/binstock"));
        assert_eq!(config.lock_timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.item_delete_policy, ItemDeletePolicy::Cascade);
    }

    #[test]
    fn zero_timeout_means_unbounded() {
        let config = CatalogConfig::from_lookup(lookup(&[(LOCK_TIMEOUT_VAR, "0")])).unwrap();
        assert_eq!(config.lock_timeout, None);
    }

    #[test]
    fn bad_values_are_reported_with_the_variable_name() {
        let err = CatalogConfig::from_lookup(lookup(&[(LOCK_TIMEOUT_VAR, "soon")])).unwrap_err();
        assert!(err.to_string().contains(LOCK_TIMEOUT_VAR));

        let err = CatalogConfig::from_lookup(lookup(&[(DELETE_POLICY_VAR, "shred")])).unwrap_err();
        assert!(format!("{err:#}").contains("shred"));
    }
}
