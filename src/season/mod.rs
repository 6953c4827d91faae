pub mod aggregator;
pub mod scored;

pub use aggregator::{SeasonAggregator, SeasonTeamRecord};
pub use scored::{score_event_record, ScoredEvent};
