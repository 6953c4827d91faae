use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{listing_label, parse_json, record_label, EventSource};
use crate::error::SourceError;
use crate::event::{EventListing, EventRecord};

/// Reads provider JSON from a directory tree:
///
/// ```text
/// <root>/<season>/events.json     # [{"code": "AZVA", "week": 1}, ...]
/// <root>/<season>/<code>.json     # one EventRecord
/// ```
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn season_dir(&self, season: u16) -> PathBuf {
        self.root.join(season.to_string())
    }
}

async fn read(path: &Path, what: &str) -> Result<Vec<u8>, SourceError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| SourceError::Unavailable {
            what: what.to_string(),
            reason: format!("{}: {}", path.display(), e),
        })
}

#[async_trait]
impl EventSource for DirectorySource {
    async fn season_events(&self, season: u16) -> Result<Vec<EventListing>, SourceError> {
        let what = listing_label(season);
        let bytes = read(&self.season_dir(season).join("events.json"), &what).await?;
        parse_json(&bytes, &what)
    }

    async fn event_record(&self, season: u16, code: &str) -> Result<EventRecord, SourceError> {
        let what = record_label(season, code);
        let path = self.season_dir(season).join(format!("{}.json", code));
        let bytes = read(&path, &what).await?;
        parse_json(&bytes, &what)
    }
}
