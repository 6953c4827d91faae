use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use crate::config::Config;
use crate::scoring::RulesTable;

const HEADER: &str = "\
# regional-pool configuration
#
# source.kind: directory reads <path>/<season>/events.json and <path>/<season>/<code>.json
#              remote fetches <url>/<season>/events and <url>/<season>/events/<code>
# cache.ttl:   how long remote responses stay fresh (e.g. 24h, 30m)
# rules:       rules per season; a season without an entry uses the built-in defaults
";

/// Default config as YAML, with the built-in rules written out under `season`.
pub fn default_config_yaml(season: u16) -> Result<String> {
    let mut rules = BTreeMap::new();
    rules.insert(season, RulesTable::default());
    let config = Config {
        rules,
        ..Config::default()
    };
    let body = serde_saphyr::to_string(&config).context("Failed to serialize default config")?;
    Ok(format!("{}\n{}", HEADER, body))
}

/// Write the default config to `path` atomically. An existing file is only
/// replaced when `force` is set.
pub fn run_init(path: &Path, season: u16, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite",
            path.display()
        );
    }

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create config directory at {}", dir.display()))?;
    }

    let yaml = default_config_yaml(season)?;

    // Open atomic write file
    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    file.write_all(yaml.as_bytes())
        .context("Failed to write config")?;

    // Commit the write atomically
    file.commit().context("Failed to save config")?;

    tracing::info!(path = %path.display(), "config written");
    Ok(())
}
