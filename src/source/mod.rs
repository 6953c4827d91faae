pub mod cache;
pub mod directory;
pub mod remote;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::SourceError;
use crate::event::{EventListing, EventRecord};

pub use cache::{clear_cache, get_cache_path, ResponseCache};
pub use directory::DirectorySource;
pub use remote::RemoteSource;

/// Event data provider: lists a season's events and returns one record at a time.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn season_events(&self, season: u16) -> Result<Vec<EventListing>, SourceError>;

    async fn event_record(&self, season: u16, code: &str) -> Result<EventRecord, SourceError>;
}

fn parse_json<T: DeserializeOwned>(bytes: &[u8], what: &str) -> Result<T, SourceError> {
    serde_json::from_slice(bytes).map_err(|e| SourceError::Malformed {
        what: what.to_string(),
        reason: e.to_string(),
    })
}

fn listing_label(season: u16) -> String {
    format!("season {} event list", season)
}

fn record_label(season: u16, code: &str) -> String {
    format!("event {} ({})", code, season)
}
