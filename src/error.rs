use thiserror::Error;

/// Per-team extraction failures. Both are recovered inside the event:
/// an incomplete record keeps the team with a zero qualification category,
/// an invalid rank drops the team from that event's scoring.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("team {team}: incomplete record, missing {field}")]
    IncompleteRecord { team: u32, field: &'static str },

    #[error("team {team}: rank {rank} outside 1..={field_size}")]
    InvalidRank { team: u32, rank: u32, field_size: u32 },
}

/// Failures reported by an event data provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The record could not be retrieved right now; retrying later may succeed.
    #[error("{what} unavailable: {reason}")]
    Unavailable { what: String, reason: String },

    /// The record was retrieved but does not describe a valid event.
    #[error("{what} malformed: {reason}")]
    Malformed { what: String, reason: String },
}

impl SourceError {
    pub fn is_retrievable(&self) -> bool {
        matches!(self, SourceError::Unavailable { .. })
    }
}

/// Fatal failures of a season build. Any of these aborts the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeasonError {
    #[error("invalid rules configuration:\n  - {}", .0.join("\n  - "))]
    InvalidRuleConfig(Vec<String>),

    #[error("event {event} was already ingested for season {season}")]
    DuplicateEvent { season: u16, event: String },

    #[error("event {event} (week {week}) arrived after {previous} (week {previous_week})")]
    EventOutOfOrder {
        event: String,
        week: u32,
        previous: String,
        previous_week: u32,
    },

    #[error("event {event} has malformed data: {reason}")]
    MalformedEvent { event: String, reason: String },

    #[error("event {event} could not be retrieved: {source}")]
    EventUnavailable {
        event: String,
        #[source]
        source: SourceError,
    },

    #[error("could not list events for season {season}: {source}")]
    Listing {
        season: u16,
        #[source]
        source: SourceError,
    },
}
