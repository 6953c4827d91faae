use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::event::AllianceRole;

/// Which pool allocation rules a season runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegimeKind {
    /// Weekly auto-advance with slot fill
    Weekly,
    /// Top-N per event with backfill
    PerEvent,
}

/// Rules table for one rules season.
///
/// Injected into every scoring and allocation call; nothing reads rules from
/// global state. Example YAML:
/// ```yaml
/// qualification:
///   max: 22
///   curve: { kind: inverse_erf, alpha: 1.07, scale: 10, offset: 12 }
/// alliance_selection:
///   max: 16
///   captain: [16, 15, 14, 13, 12, 11, 10, 9]
///   first_pick: [16, 15, 14, 13, 12, 11, 10, 9]
///   second_pick: [1, 2, 3, 4, 5, 6, 7, 8]
/// playoff: { max: 30, quarterfinal: 7, semifinal: 13, finalist: 20, winner: 30 }
/// awards: { max: 60, default_value: 5, values: { "Rookie All Star Award": 8 } }
/// rookie: { bonus: 10, max: 10 }
/// pool:
///   regime: per_event
///   per_event: { top_n: 3 }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RulesTable {
    pub qualification: QualificationRules,
    pub alliance_selection: AllianceSelectionRules,
    pub playoff: PlayoffRules,
    pub awards: AwardRules,
    pub rookie: RookieRules,

    /// Applied once to the summed total, never per category
    #[serde(default)]
    pub rounding: Rounding,

    /// Tie-break chain after best score; team number ascending always closes the chain
    #[serde(default = "default_tie_break")]
    pub tie_break: Vec<TieBreakKey>,

    pub pool: PoolRules,

    /// Teams qualified before the season starts
    #[serde(default)]
    pub prequalified: Vec<u32>,

    /// Teams that will not accept a slot
    #[serde(default)]
    pub declined: Vec<u32>,

    #[serde(default = "default_true")]
    pub exclude_district_teams: bool,
}

impl RulesTable {
    pub fn regime(&self) -> RegimeKind {
        self.pool.regime
    }

    pub fn is_prequalified(&self, team: u32) -> bool {
        self.prequalified.contains(&team)
    }

    pub fn is_declined(&self, team: u32) -> bool {
        self.declined.contains(&team)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct QualificationRules {
    pub max: f64,
    pub curve: CurveConfig,
    /// Restrict the category to one regime; absent means it always counts
    #[serde(default)]
    pub only_in: Option<RegimeKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    /// `max * (N - R) / (N - 1)`
    Linear,
    /// `offset + scale * erfinv((N - 2R + 2) / (alpha * N)) / erfinv(1 / alpha)`
    InverseErf,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CurveConfig {
    pub kind: CurveKind,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default = "default_offset")]
    pub offset: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AllianceSelectionRules {
    pub max: f64,
    /// Points by alliance seed (index 0 is seed 1); seeds past the end earn 0
    pub captain: Vec<f64>,
    pub first_pick: Vec<f64>,
    pub second_pick: Vec<f64>,
    #[serde(default)]
    pub backup: f64,
    #[serde(default)]
    pub only_in: Option<RegimeKind>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PlayoffRules {
    pub max: f64,
    #[serde(default)]
    pub did_not_advance: f64,
    pub quarterfinal: f64,
    pub semifinal: f64,
    pub finalist: f64,
    pub winner: f64,
    #[serde(default)]
    pub only_in: Option<RegimeKind>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AwardRules {
    pub max: f64,
    /// Value of any award not listed in `values`
    #[serde(default)]
    pub default_value: f64,
    #[serde(default)]
    pub values: BTreeMap<String, f64>,
    #[serde(default)]
    pub only_in: Option<RegimeKind>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RookieRules {
    pub bonus: f64,
    /// Bonus in a team's second season
    #[serde(default)]
    pub second_year_bonus: f64,
    pub max: f64,
    #[serde(default)]
    pub only_in: Option<RegimeKind>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    #[default]
    Nearest,
    Ceil,
    Floor,
    None,
}

impl Rounding {
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Rounding::Nearest => value.round(),
            Rounding::Ceil => value.ceil(),
            Rounding::Floor => value.floor(),
            Rounding::None => value,
        }
    }
}

/// One link of the tie-break chain. Category keys compare the points of the
/// event that produced the team's ranking score, higher first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakKey {
    /// Week of the event that produced the score, earlier first
    EarliestWeek,
    Playoff,
    AllianceSelection,
    Qualification,
    Awards,
    /// Best three match scores at that event, compared highest first
    BestMatchScores,
    /// Team number, lower first
    TeamNumber,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PoolRules {
    pub regime: RegimeKind,
    #[serde(default)]
    pub weekly: Option<WeeklyRules>,
    #[serde(default)]
    pub per_event: Option<PerEventRules>,
}

/// Regime A: per-week slot capacities consumed by auto-advance and slot fill.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WeeklyRules {
    /// Explicit capacity per week (index 0 is week 1)
    #[serde(default)]
    pub slots: Option<Vec<u32>>,

    /// Capacities computed from season-wide counts
    #[serde(default)]
    pub derived_slots: Option<SlotFormula>,

    /// Top finishers of each event nominated for auto-advance
    #[serde(default = "default_one")]
    pub auto_advance_per_event: usize,

    /// Awards whose recipients are nominated for auto-advance
    #[serde(default)]
    pub auto_advance_awards: Vec<String>,

    /// Members of an event's winning alliance seated at this role or earlier
    /// (`first_pick` covers the captain and first pick) are nominated
    #[serde(default)]
    pub auto_advance_winners: Option<AllianceRole>,

    /// Roll capacity a week could not use into the next processed week
    #[serde(default)]
    pub carry_forward: bool,
}

/// Season-wide counts that weekly capacities are derived from.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SlotFormula {
    pub championship_slots: u32,
    pub prequalified_count: u32,
    pub total_team_count: u32,
    pub district_team_count: u32,
    #[serde(default)]
    pub regional_error: i64,
    pub events_per_week: Vec<u32>,
    #[serde(default)]
    pub week_adjustments: Vec<f64>,
}

/// Regime B: top-N per event with backfill.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PerEventRules {
    pub top_n: usize,
    /// How many ranks past `top_n` backfill may reach; absent is unbounded, 0 disables backfill
    #[serde(default)]
    pub backfill_depth: Option<usize>,
}

fn default_true() -> bool {
    true
}

fn default_one() -> usize {
    1
}

fn default_alpha() -> f64 {
    1.07
}

fn default_scale() -> f64 {
    10.0
}

fn default_offset() -> f64 {
    12.0
}

fn default_tie_break() -> Vec<TieBreakKey> {
    vec![
        TieBreakKey::EarliestWeek,
        TieBreakKey::Playoff,
        TieBreakKey::AllianceSelection,
        TieBreakKey::Qualification,
        TieBreakKey::BestMatchScores,
    ]
}

/// `17 - seed` for seeds 1..=8
fn seeded_descending() -> Vec<f64> {
    (1..=8).map(|seed| f64::from(17 - seed)).collect()
}

/// `seed` for seeds 1..=8
fn seeded_ascending() -> Vec<f64> {
    (1..=8).map(f64::from).collect()
}

impl Default for RulesTable {
    fn default() -> Self {
        let mut award_values = BTreeMap::new();
        award_values.insert("Regional FIRST Impact Award".to_string(), 45.0);
        award_values.insert("Regional Chairman's Award".to_string(), 45.0);
        award_values.insert("Regional Engineering Inspiration Award".to_string(), 28.0);
        award_values.insert("Rookie All Star Award".to_string(), 8.0);
        award_values.insert("Regional Winners".to_string(), 0.0);
        award_values.insert("Regional Finalists".to_string(), 0.0);

        Self {
            qualification: QualificationRules {
                max: 22.0,
                curve: CurveConfig {
                    kind: CurveKind::InverseErf,
                    alpha: default_alpha(),
                    scale: default_scale(),
                    offset: default_offset(),
                },
                only_in: None,
            },
            alliance_selection: AllianceSelectionRules {
                max: 16.0,
                captain: seeded_descending(),
                first_pick: seeded_descending(),
                second_pick: seeded_ascending(),
                backup: 0.0,
                only_in: None,
            },
            playoff: PlayoffRules {
                max: 30.0,
                did_not_advance: 0.0,
                quarterfinal: 7.0,
                semifinal: 13.0,
                finalist: 20.0,
                winner: 30.0,
                only_in: None,
            },
            awards: AwardRules {
                max: 60.0,
                default_value: 5.0,
                values: award_values,
                only_in: None,
            },
            rookie: RookieRules {
                bonus: 10.0,
                second_year_bonus: 5.0,
                max: 10.0,
                only_in: None,
            },
            rounding: Rounding::Nearest,
            tie_break: default_tie_break(),
            pool: PoolRules {
                regime: RegimeKind::PerEvent,
                weekly: Some(WeeklyRules {
                    slots: None,
                    derived_slots: Some(SlotFormula {
                        championship_slots: 600,
                        prequalified_count: 32,
                        total_team_count: 3522,
                        district_team_count: 1670,
                        regional_error: -6,
                        events_per_week: vec![18, 15, 14, 10, 12],
                        week_adjustments: vec![0.0; 5],
                    }),
                    auto_advance_per_event: 1,
                    auto_advance_awards: vec![
                        "Regional FIRST Impact Award".to_string(),
                        "Regional Chairman's Award".to_string(),
                        "Regional Engineering Inspiration Award".to_string(),
                    ],
                    auto_advance_winners: Some(AllianceRole::FirstPick),
                    carry_forward: false,
                }),
                per_event: Some(PerEventRules {
                    top_n: 3,
                    backfill_depth: None,
                }),
            },
            prequalified: Vec::new(),
            declined: Vec::new(),
            exclude_district_teams: true,
        }
    }
}
