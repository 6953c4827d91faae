pub mod extract;
pub mod types;

pub use extract::{
    best_three, extract_event, extract_team, ExcludedTeam, ExtractedEvent, RankFacts,
    RawEventFacts,
};
pub use types::{
    AllianceRole, AllianceSeat, EventKey, EventListing, EventRecord, PlayoffTier, RawTeamRecord,
};
