use futures::stream::{FuturesUnordered, StreamExt};

use crate::error::{SeasonError, SourceError};
use crate::event::{EventKey, EventListing, EventRecord};
use crate::source::EventSource;

/// Records retrieved for a season plan, in processing order.
#[derive(Debug, Default)]
pub struct Fetched {
    pub records: Vec<EventRecord>,
    /// Listed events the provider could not deliver
    pub missing: Vec<EventKey>,
}

/// Retrieve every planned event with at most `concurrency` requests in flight.
///
/// Only I/O overlaps here; results are sorted back into processing order
/// before anything is scored. An unretrievable event is recorded as missing;
/// a malformed one, or one that does not match its listing, fails the fetch.
pub async fn fetch_records(
    source: &dyn EventSource,
    season: u16,
    plan: &[EventListing],
    concurrency: usize,
) -> Result<Fetched, SeasonError> {
    let mut futures = FuturesUnordered::new();
    let mut pending = plan.iter();
    let mut fetched = Fetched::default();

    // Fill initial batch
    for _ in 0..concurrency.max(1) {
        if let Some(listing) = pending.next() {
            futures.push(fetch_one(source, season, listing));
        }
    }

    // Process results and feed new requests
    while let Some((listing, result)) = futures.next().await {
        match result {
            Ok(record) => {
                check_matches_listing(listing, &record)?;
                fetched.records.push(record);
            }
            Err(e) if e.is_retrievable() => {
                tracing::warn!(
                    event = %listing.code,
                    week = listing.week,
                    error = %e,
                    "event unavailable"
                );
                fetched.missing.push(listing.key());
            }
            Err(e) => {
                return Err(SeasonError::MalformedEvent {
                    event: listing.code.clone(),
                    reason: e.to_string(),
                });
            }
        }

        if let Some(next) = pending.next() {
            futures.push(fetch_one(source, season, next));
        }
    }

    fetched.records.sort_by_key(|r| r.key());
    fetched.missing.sort();
    Ok(fetched)
}

async fn fetch_one<'a>(
    source: &dyn EventSource,
    season: u16,
    listing: &'a EventListing,
) -> (&'a EventListing, Result<EventRecord, SourceError>) {
    let result = source.event_record(season, &listing.code).await;
    (listing, result)
}

fn check_matches_listing(listing: &EventListing, record: &EventRecord) -> Result<(), SeasonError> {
    if record.code != listing.code || record.week != listing.week {
        return Err(SeasonError::MalformedEvent {
            event: listing.code.clone(),
            reason: format!(
                "record is {} week {}, listed as {} week {}",
                record.code, record.week, listing.code, listing.week
            ),
        });
    }
    Ok(())
}
