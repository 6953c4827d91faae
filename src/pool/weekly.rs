use std::collections::BTreeSet;

use super::ranking::{is_eligible, rank, season_ranking};
use super::state::{AllocatorState, Qualification, QualificationReason};
use crate::scoring::{PointBreakdown, RulesTable, SlotFormula, WeeklyRules};
use crate::season::{ScoredEvent, SeasonAggregator};

/// Slot capacity of every week, index 0 being week 1.
pub fn weekly_capacities(weekly: &WeeklyRules) -> Vec<u32> {
    match (&weekly.slots, &weekly.derived_slots) {
        (Some(slots), _) => slots.clone(),
        (None, Some(formula)) => derive_capacities(formula),
        (None, None) => Vec::new(),
    }
}

/// Capacity of `week`; weeks past the configured list have none.
pub fn capacity_for(weekly: &WeeklyRules, week: u32) -> u32 {
    week.checked_sub(1)
        .and_then(|i| weekly_capacities(weekly).get(i as usize).copied())
        .unwrap_or(0)
}

fn derive_capacities(formula: &SlotFormula) -> Vec<u32> {
    let event_total: u32 = formula.events_per_week.iter().sum();
    if formula.total_team_count == 0 || event_total == 0 {
        return vec![0; formula.events_per_week.len()];
    }

    let open = f64::from(formula.championship_slots.saturating_sub(formula.prequalified_count));
    let regional_teams =
        f64::from(formula.total_team_count.saturating_sub(formula.district_team_count));
    let share = (open * regional_teams / f64::from(formula.total_team_count)).floor() as i64;
    let regional = (share + formula.regional_error).max(0) as f64;

    formula
        .events_per_week
        .iter()
        .enumerate()
        .map(|(i, events)| {
            let adjustment = formula.week_adjustments.get(i).copied().unwrap_or(0.0);
            (regional * f64::from(*events) / f64::from(event_total) + adjustment)
                .floor()
                .max(0.0) as u32
        })
        .collect()
}

/// Teams an event puts forward for auto-advance: award recipients first, in
/// configured award order, then winning alliance members by seat, then the
/// event's top finishers.
fn nominees(
    event: &ScoredEvent,
    season: &SeasonAggregator<'_>,
    rules: &RulesTable,
    weekly: &WeeklyRules,
) -> Vec<u32> {
    let eligible = |team: u32| season.team(team).is_some_and(|r| is_eligible(rules, r));

    let mut out: Vec<u32> = Vec::new();
    for award in &weekly.auto_advance_awards {
        out.extend(event.recipients(award).filter(|team| eligible(*team)));
    }
    if let Some(through) = weekly.auto_advance_winners {
        out.extend(
            event
                .winners_through(through)
                .into_iter()
                .filter(|team| eligible(*team)),
        );
    }
    let finishers = rank(
        event.breakdowns.values().filter(|b| eligible(b.team())),
        &rules.tie_break,
    );
    out.extend(
        finishers
            .iter()
            .take(weekly.auto_advance_per_event)
            .map(|b| b.team()),
    );
    out
}

/// Walks the season ranking, handing out the next team that is still
/// unqualified when asked.
struct FillQueue<'a> {
    ranked: Vec<&'a PointBreakdown>,
    cursor: usize,
}

impl<'a> FillQueue<'a> {
    fn next(&mut self, state: &AllocatorState) -> Option<&'a PointBreakdown> {
        while let Some(candidate) = self.ranked.get(self.cursor) {
            self.cursor += 1;
            if !state.is_qualified(candidate.team()) {
                return Some(*candidate);
            }
        }
        None
    }
}

/// Allocate one week's capacity once all of its events are ingested.
pub(super) fn close_week(
    state: &mut AllocatorState,
    season: &SeasonAggregator<'_>,
    rules: &RulesTable,
    weekly: &WeeklyRules,
    week: u32,
) {
    let carried = if weekly.carry_forward { state.take_carry() } else { 0 };
    let capacity = capacity_for(weekly, week) + carried;
    let mut remaining = capacity;

    let mut queue = FillQueue {
        ranked: season_ranking(season, rules, week, |team| state.is_qualified(team)),
        cursor: 0,
    };
    let mut nominated = BTreeSet::new();

    'events: for event in season.events_in_week(week) {
        for team in nominees(event, season, rules, weekly) {
            if remaining == 0 {
                break 'events;
            }
            if !nominated.insert(team) {
                continue;
            }

            if !state.is_qualified(team) {
                state.qualify(
                    team,
                    Qualification {
                        week,
                        reason: QualificationReason::AutoAdvance,
                        event: Some(event.code().to_string()),
                    },
                );
                remaining -= 1;
            } else if let Some(fill) = queue.next(state) {
                state.qualify(
                    fill.team(),
                    Qualification {
                        week,
                        reason: QualificationReason::SlotFill,
                        event: Some(fill.event().to_string()),
                    },
                );
                remaining -= 1;
            }
        }
    }

    while remaining > 0 {
        let Some(next) = queue.next(state) else {
            break;
        };
        state.qualify(
            next.team(),
            Qualification {
                week,
                reason: QualificationReason::AutoAdvance,
                event: Some(next.event().to_string()),
            },
        );
        remaining -= 1;
    }

    tracing::debug!(
        week,
        capacity,
        carried,
        allocated = capacity - remaining,
        "week closed"
    );
    state.close_week(week, remaining, weekly.carry_forward);
}
