use super::ranking::{is_eligible, rank};
use super::state::{AllocatorState, Qualification, QualificationReason};
use crate::scoring::{PerEventRules, RulesTable};
use crate::season::{ScoredEvent, SeasonAggregator};

/// Qualify up to `top_n` new teams from one event, backfilling past teams
/// that already hold a slot. Returns how many teams qualified.
pub(super) fn fold_event(
    state: &mut AllocatorState,
    season: &SeasonAggregator<'_>,
    rules: &RulesTable,
    per_event: &PerEventRules,
    event: &ScoredEvent,
) -> usize {
    let eligible = |team: u32| season.team(team).is_some_and(|r| is_eligible(rules, r));
    let ranked = rank(
        event.breakdowns.values().filter(|b| eligible(b.team())),
        &rules.tie_break,
    );

    let reach = match per_event.backfill_depth {
        Some(depth) => per_event.top_n.saturating_add(depth),
        None => usize::MAX,
    };

    let mut added = 0;
    for (position, breakdown) in ranked.iter().enumerate() {
        if added == per_event.top_n || position >= reach {
            break;
        }
        let reason = if position < per_event.top_n {
            QualificationReason::AutoAdvance
        } else {
            QualificationReason::Backfill
        };
        let qualified = state.qualify(
            breakdown.team(),
            Qualification {
                week: event.week(),
                reason,
                event: Some(event.code().to_string()),
            },
        );
        if qualified {
            added += 1;
        }
    }

    tracing::debug!(event = %event.code(), qualified = added, "event allocated");
    added
}
