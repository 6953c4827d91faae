use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Why a team holds a pool slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualificationReason {
    /// Qualified before the season started
    PreQualified,
    AutoAdvance,
    /// Took a weekly slot whose nominee was already qualified
    SlotFill,
    /// Promoted at an event past an already-qualified top finisher
    Backfill,
    /// Not qualified; listed to pad the requested pool size
    AtLarge,
}

impl QualificationReason {
    pub fn label(self) -> &'static str {
        match self {
            QualificationReason::PreQualified => "pre-qualified",
            QualificationReason::AutoAdvance => "auto-advance",
            QualificationReason::SlotFill => "slot-fill",
            QualificationReason::Backfill => "backfill",
            QualificationReason::AtLarge => "at-large",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qualification {
    /// Week the slot was secured; 0 for pre-qualified teams
    pub week: u32,
    pub reason: QualificationReason,
    /// Event that produced the slot, if any
    pub event: Option<String>,
}

/// Everything the allocator carries between weeks.
///
/// Owned by one season run. It can be taken out with
/// `PoolAllocator::into_state` and handed to `PoolAllocator::resume` to
/// continue with later weeks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatorState {
    qualified: BTreeMap<u32, Qualification>,
    /// Capacity left unused when each closed week finished
    unused: BTreeMap<u32, u32>,
    /// Unused capacity waiting for the next week when carry-forward is on
    carry: u32,
    last_week: u32,
}

impl AllocatorState {
    pub fn is_qualified(&self, team: u32) -> bool {
        self.qualified.contains_key(&team)
    }

    pub fn qualification(&self, team: u32) -> Option<&Qualification> {
        self.qualified.get(&team)
    }

    pub fn qualified(&self) -> impl Iterator<Item = (u32, &Qualification)> {
        self.qualified.iter().map(|(team, q)| (*team, q))
    }

    pub fn qualified_count(&self) -> usize {
        self.qualified.len()
    }

    /// Last week whose allocation is complete; 0 before the first week closes.
    pub fn last_week(&self) -> u32 {
        self.last_week
    }

    pub fn unused_capacity(&self, week: u32) -> Option<u32> {
        self.unused.get(&week).copied()
    }

    /// Teams that took a slot during `week`, excluding pre-qualified teams.
    pub fn allocated_in_week(&self, week: u32) -> usize {
        self.qualified
            .values()
            .filter(|q| q.week == week && q.reason != QualificationReason::PreQualified)
            .count()
    }

    /// Add a team to the qualified set. A team already in the set keeps its
    /// original qualification and `false` is returned.
    pub(crate) fn qualify(&mut self, team: u32, qualification: Qualification) -> bool {
        if self.qualified.contains_key(&team) {
            return false;
        }
        tracing::debug!(
            team,
            week = qualification.week,
            reason = qualification.reason.label(),
            "team qualified"
        );
        self.qualified.insert(team, qualification);
        true
    }

    pub(crate) fn take_carry(&mut self) -> u32 {
        std::mem::take(&mut self.carry)
    }

    pub(crate) fn close_week(&mut self, week: u32, unused: u32, carry_forward: bool) {
        self.unused.insert(week, unused);
        if carry_forward {
            self.carry = unused;
        }
        self.last_week = self.last_week.max(week);
    }
}
