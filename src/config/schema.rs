use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::scoring::RulesTable;

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub source: SourceConfig,

    #[serde(default)]
    pub cache: CacheSettings,

    /// Rules keyed by rules season; seasons without an entry use the built-in defaults
    #[serde(default)]
    pub rules: BTreeMap<u16, RulesTable>,
}

impl Config {
    pub fn rules_for(&self, season: u16) -> RulesTable {
        self.rules.get(&season).cloned().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    Directory,
    Remote,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,

    /// Root of the event data tree (directory source)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Base URL of the event data service (remote source)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Maximum concurrent event retrievals
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Directory,
            path: Some(PathBuf::from("data")),
            url: None,
            concurrency: default_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CacheSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// How long a cached response stays fresh, e.g. "24h", "30m"
    #[serde(default = "default_ttl")]
    pub ttl: String,
}

impl CacheSettings {
    pub fn ttl(&self) -> Result<Duration> {
        humantime::parse_duration(&self.ttl)
            .with_context(|| format!("cache.ttl: invalid duration '{}'", self.ttl))
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: default_ttl(),
        }
    }
}

fn default_concurrency() -> usize {
    8
}

fn default_true() -> bool {
    true
}

fn default_ttl() -> String {
    "24h".to_string()
}
