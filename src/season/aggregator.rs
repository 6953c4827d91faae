use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::scored::{score_event_record, ScoredEvent};
use crate::error::SeasonError;
use crate::event::{EventKey, EventListing, EventRecord};
use crate::scoring::{PointBreakdown, RulesTable};

/// A team's season so far: one breakdown per event, in processing order.
#[derive(Debug, Clone, Serialize)]
pub struct SeasonTeamRecord {
    team: u32,
    name: Option<String>,
    district: Option<String>,
    entries: Vec<PointBreakdown>,
}

impl SeasonTeamRecord {
    fn new(team: u32) -> Self {
        Self {
            team,
            name: None,
            district: None,
            entries: Vec::new(),
        }
    }

    pub fn team(&self) -> u32 {
        self.team
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn district(&self) -> Option<&str> {
        self.district.as_deref()
    }

    pub fn entries(&self) -> &[PointBreakdown] {
        &self.entries
    }

    pub fn entries_through(&self, week: u32) -> impl Iterator<Item = &PointBreakdown> {
        self.entries.iter().filter(move |b| b.week() <= week)
    }

    /// Best single-event breakdown through `week`. Equal totals keep the
    /// earlier event.
    pub fn best_through(&self, week: u32) -> Option<&PointBreakdown> {
        self.entries_through(week).fold(None, |best: Option<&PointBreakdown>, b| match best {
            Some(current) if current.total() >= b.total() => Some(current),
            _ => Some(b),
        })
    }

    pub fn warnings_through(&self, week: u32) -> Vec<String> {
        self.entries_through(week)
            .flat_map(|b| b.warnings().iter().cloned())
            .collect()
    }
}

/// Collects scored events into per-team season records.
///
/// Events must arrive in processing order (week, then event code); the
/// allocator's tie-breaking depends on it.
pub struct SeasonAggregator<'r> {
    season: u16,
    rules: &'r RulesTable,
    ingested: BTreeSet<String>,
    events: Vec<ScoredEvent>,
    teams: BTreeMap<u32, SeasonTeamRecord>,
}

impl<'r> SeasonAggregator<'r> {
    pub fn new(season: u16, rules: &'r RulesTable) -> Self {
        Self {
            season,
            rules,
            ingested: BTreeSet::new(),
            events: Vec::new(),
            teams: BTreeMap::new(),
        }
    }

    /// Order a season listing for processing, keeping only weeks `1..=through_week`.
    ///
    /// Events past the target week are dropped here so they are never fetched
    /// or scored.
    pub fn plan(
        season: u16,
        listing: &[EventListing],
        through_week: u32,
    ) -> Result<Vec<EventListing>, SeasonError> {
        let mut seen = BTreeSet::new();
        for entry in listing {
            if !seen.insert(entry.code.as_str()) {
                return Err(SeasonError::DuplicateEvent {
                    season,
                    event: entry.code.clone(),
                });
            }
        }

        let mut planned: Vec<EventListing> = listing
            .iter()
            .filter(|e| e.week >= 1 && e.week <= through_week)
            .cloned()
            .collect();
        planned.sort_by_key(|e| e.key());
        Ok(planned)
    }

    pub fn season(&self) -> u16 {
        self.season
    }

    pub fn rules(&self) -> &'r RulesTable {
        self.rules
    }

    /// Score an event and append its breakdowns to the season records.
    pub fn ingest(&mut self, record: &EventRecord) -> Result<&ScoredEvent, SeasonError> {
        if self.ingested.contains(&record.code) {
            return Err(SeasonError::DuplicateEvent {
                season: self.season,
                event: record.code.clone(),
            });
        }
        if let Some(last) = self.events.last() {
            if record.key() < last.key {
                return Err(SeasonError::EventOutOfOrder {
                    event: record.code.clone(),
                    week: record.week,
                    previous: last.key.code.clone(),
                    previous_week: last.key.week,
                });
            }
        }

        let scored = score_event_record(record, self.rules)?;

        for raw in &record.teams {
            let Some(breakdown) = scored.breakdowns.get(&raw.team) else {
                continue;
            };
            let entry = self
                .teams
                .entry(raw.team)
                .or_insert_with(|| SeasonTeamRecord::new(raw.team));
            if raw.name.is_some() {
                entry.name = raw.name.clone();
            }
            if raw.district.is_some() {
                entry.district = raw.district.clone();
            }
            entry.entries.push(breakdown.clone());
        }

        tracing::debug!(
            event = %record.code,
            week = record.week,
            scored = scored.breakdowns.len(),
            excluded = scored.excluded.len(),
            "event ingested"
        );

        self.ingested.insert(record.code.clone());
        self.events.push(scored);
        let index = self.events.len() - 1;
        Ok(&self.events[index])
    }

    pub fn events(&self) -> &[ScoredEvent] {
        &self.events
    }

    pub fn events_in_week(&self, week: u32) -> impl Iterator<Item = &ScoredEvent> {
        self.events.iter().filter(move |e| e.week() == week)
    }

    pub fn last_key(&self) -> Option<&EventKey> {
        self.events.last().map(|e| &e.key)
    }

    pub fn team(&self, team: u32) -> Option<&SeasonTeamRecord> {
        self.teams.get(&team)
    }

    pub fn teams(&self) -> impl Iterator<Item = &SeasonTeamRecord> {
        self.teams.values()
    }
}
