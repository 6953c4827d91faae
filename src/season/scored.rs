use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::SeasonError;
use crate::event::{extract_event, AllianceRole, EventKey, EventRecord, ExcludedTeam, PlayoffTier};
use crate::scoring::{score, PointBreakdown, RulesTable};

/// One event after scoring: a breakdown per scored team plus the teams that
/// had to be dropped.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredEvent {
    pub key: EventKey,
    pub name: Option<String>,
    pub breakdowns: BTreeMap<u32, PointBreakdown>,
    /// Awards received, keyed by team; only teams with at least one award
    pub awards: BTreeMap<u32, Vec<String>>,
    /// Seat each member of the winning alliance held
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub winners: BTreeMap<u32, AllianceRole>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub excluded: Vec<ExcludedTeam>,
}

impl ScoredEvent {
    pub fn code(&self) -> &str {
        &self.key.code
    }

    pub fn week(&self) -> u32 {
        self.key.week
    }

    /// Teams that received `award` at this event, lowest team number first.
    pub fn recipients<'a>(&'a self, award: &'a str) -> impl Iterator<Item = u32> + 'a {
        self.awards
            .iter()
            .filter(move |(_, awards)| awards.iter().any(|a| a == award))
            .map(|(team, _)| *team)
    }

    /// Winning alliance members seated at `through` or earlier (captain
    /// first), in seat order.
    pub fn winners_through(&self, through: AllianceRole) -> Vec<u32> {
        let mut seats: Vec<(AllianceRole, u32)> = self
            .winners
            .iter()
            .filter(|(_, role)| **role <= through)
            .map(|(team, role)| (*role, *team))
            .collect();
        seats.sort();
        seats.into_iter().map(|(_, team)| team).collect()
    }

    /// Breakdowns sorted by total descending, then team number.
    pub fn by_total(&self) -> Vec<&PointBreakdown> {
        let mut sorted: Vec<_> = self.breakdowns.values().collect();
        sorted.sort_by(|a, b| b.total().total_cmp(&a.total()).then(a.team().cmp(&b.team())));
        sorted
    }
}

/// Extract and score every team of one event record.
pub fn score_event_record(
    record: &EventRecord,
    rules: &RulesTable,
) -> Result<ScoredEvent, SeasonError> {
    let extracted = extract_event(record)?;
    let breakdowns = extracted
        .facts
        .iter()
        .map(|facts| (facts.team, score(facts, rules)))
        .collect();
    let awards = extracted
        .facts
        .iter()
        .filter(|facts| !facts.awards.is_empty())
        .map(|facts| (facts.team, facts.awards.clone()))
        .collect();
    let winners = extracted
        .facts
        .iter()
        .filter(|facts| facts.playoff == PlayoffTier::Winner)
        .filter_map(|facts| facts.alliance.map(|seat| (facts.team, seat.role)))
        .collect();

    Ok(ScoredEvent {
        key: record.key(),
        name: record.name.clone(),
        breakdowns,
        awards,
        winners,
        excluded: extracted.excluded,
    })
}
