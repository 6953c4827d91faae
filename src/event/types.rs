use serde::{Deserialize, Serialize};
use std::fmt;

/// Role a team filled when alliances were selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AllianceRole {
    Captain,
    FirstPick,
    SecondPick,
    Backup,
}

/// Alliance seat: the 1-based alliance seed plus the role within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AllianceSeat {
    pub seed: u32,
    pub role: AllianceRole,
}

/// Deepest playoff round a team's alliance reached. Ordered from worst to best.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PlayoffTier {
    #[default]
    DidNotAdvance,
    Quarterfinal,
    Semifinal,
    Finalist,
    Winner,
}

impl PlayoffTier {
    pub const ALL: [PlayoffTier; 5] = [
        PlayoffTier::DidNotAdvance,
        PlayoffTier::Quarterfinal,
        PlayoffTier::Semifinal,
        PlayoffTier::Finalist,
        PlayoffTier::Winner,
    ];
}

/// One team's row in a normalized event record, as delivered by a data provider.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawTeamRecord {
    pub team: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub alliance: Option<AllianceSeat>,
    #[serde(default)]
    pub playoff: PlayoffTier,
    #[serde(default)]
    pub awards: Vec<String>,
    #[serde(default)]
    pub rookie: bool,
    /// Second season of competition
    #[serde(default)]
    pub second_year: bool,
    /// Scores of every match the team played and was not disqualified from
    #[serde(default)]
    pub match_scores: Vec<u32>,
    /// District code; teams from district programs are not eligible for the regional pool
    #[serde(default)]
    pub district: Option<String>,
}

/// A normalized event: everything the scorer needs, nothing it doesn't.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EventRecord {
    pub code: String,
    pub week: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub field_size: Option<u32>,
    pub teams: Vec<RawTeamRecord>,
}

impl EventRecord {
    pub fn key(&self) -> EventKey {
        EventKey::new(self.week, &self.code)
    }
}

/// Entry of a season's event listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EventListing {
    pub code: String,
    pub week: u32,
}

impl EventListing {
    pub fn key(&self) -> EventKey {
        EventKey::new(self.week, &self.code)
    }
}

/// Processing position of an event within a season: week first, then event code.
///
/// Field order matters: the derived `Ord` is the season's processing order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EventKey {
    pub week: u32,
    pub code: String,
}

impl EventKey {
    pub fn new(week: u32, code: &str) -> Self {
        Self {
            week,
            code: code.to_string(),
        }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (week {})", self.code, self.week)
    }
}
