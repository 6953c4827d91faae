use serde::{Serialize, Serializer};
use std::collections::BTreeSet;

use super::types::{AllianceSeat, EventRecord, PlayoffTier, RawTeamRecord};
use crate::error::{ExtractError, SeasonError};

/// Validated rank position within an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankFacts {
    pub rank: u32,
    pub field_size: u32,
}

/// Validated per-team facts for one event. Immutable once extracted.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEventFacts {
    pub team: u32,
    pub event: String,
    pub week: u32,
    /// `None` when rank or field size was missing from the record
    pub qualification: Option<RankFacts>,
    pub alliance: Option<AllianceSeat>,
    pub playoff: PlayoffTier,
    pub awards: Vec<String>,
    pub rookie: bool,
    pub second_year: bool,
    /// Three best match scores, highest first, padded with zeros
    pub best_match_scores: [u32; 3],
    pub district: Option<String>,
    pub warnings: Vec<String>,
}

/// A team dropped from an event's scoring, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedTeam {
    pub team: u32,
    #[serde(serialize_with = "serialize_reason")]
    pub reason: ExtractError,
}

fn serialize_reason<S: Serializer>(
    reason: &ExtractError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(reason)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedEvent {
    pub facts: Vec<RawEventFacts>,
    pub excluded: Vec<ExcludedTeam>,
}

/// Check rank and field size for one team.
pub fn rank_facts(
    team: u32,
    rank: Option<u32>,
    field_size: Option<u32>,
) -> Result<RankFacts, ExtractError> {
    let rank = rank.ok_or(ExtractError::IncompleteRecord {
        team,
        field: "rank",
    })?;
    let field_size = field_size.ok_or(ExtractError::IncompleteRecord {
        team,
        field: "field_size",
    })?;
    if rank < 1 || rank > field_size {
        return Err(ExtractError::InvalidRank {
            team,
            rank,
            field_size,
        });
    }
    Ok(RankFacts { rank, field_size })
}

/// Extract one team's facts.
///
/// A missing rank or field size is recovered here: the team keeps its other
/// categories and carries a warning. Only `InvalidRank` is returned as an error.
pub fn extract_team(
    event: &EventRecord,
    raw: &RawTeamRecord,
) -> Result<RawEventFacts, ExtractError> {
    let mut warnings = Vec::new();
    let qualification = match rank_facts(raw.team, raw.rank, event.field_size) {
        Ok(facts) => Some(facts),
        Err(e @ ExtractError::IncompleteRecord { .. }) => {
            warnings.push(format!("{}: {}; qualification points set to 0", event.code, e));
            None
        }
        Err(e) => return Err(e),
    };

    Ok(RawEventFacts {
        team: raw.team,
        event: event.code.clone(),
        week: event.week,
        qualification,
        alliance: raw.alliance,
        playoff: raw.playoff,
        awards: raw.awards.clone(),
        rookie: raw.rookie,
        second_year: raw.second_year,
        best_match_scores: best_three(&raw.match_scores),
        district: raw.district.clone(),
        warnings,
    })
}

/// Top three scores, highest first.
pub fn best_three(scores: &[u32]) -> [u32; 3] {
    let mut sorted = scores.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    let mut best = [0; 3];
    for (slot, score) in best.iter_mut().zip(sorted) {
        *slot = score;
    }
    best
}

/// Extract every team of an event.
///
/// Per-team problems never fail the event. A team listed twice does, since a
/// breakdown must exist at most once per (team, event).
pub fn extract_event(event: &EventRecord) -> Result<ExtractedEvent, SeasonError> {
    if event.field_size == Some(0) && event.teams.iter().any(|t| t.rank.is_some()) {
        tracing::warn!(event = %event.code, "field size is 0 but teams are ranked");
    }

    let mut seen = BTreeSet::new();
    let mut facts = Vec::with_capacity(event.teams.len());
    let mut excluded = Vec::new();

    for raw in &event.teams {
        if !seen.insert(raw.team) {
            return Err(SeasonError::MalformedEvent {
                event: event.code.clone(),
                reason: format!("team {} listed more than once", raw.team),
            });
        }
        match extract_team(event, raw) {
            Ok(team_facts) => {
                if !team_facts.warnings.is_empty() {
                    tracing::warn!(event = %event.code, team = raw.team, "incomplete team record");
                }
                facts.push(team_facts);
            }
            Err(reason) => {
                tracing::warn!(
                    event = %event.code,
                    team = raw.team,
                    %reason,
                    "team excluded from event"
                );
                excluded.push(ExcludedTeam {
                    team: raw.team,
                    reason,
                });
            }
        }
    }

    Ok(ExtractedEvent { facts, excluded })
}
