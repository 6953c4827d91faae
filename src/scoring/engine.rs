use serde::Serialize;

use super::config::{RegimeKind, RulesTable};
use super::curve::qualification_points;
use crate::event::{AllianceRole, PlayoffTier, RawEventFacts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Qualification,
    AllianceSelection,
    Playoff,
    Awards,
    Rookie,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Qualification,
        Category::AllianceSelection,
        Category::Playoff,
        Category::Awards,
        Category::Rookie,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Qualification => "Qualification",
            Category::AllianceSelection => "Alliance Selection",
            Category::Playoff => "Playoff Advancement",
            Category::Awards => "Awards",
            Category::Rookie => "Rookie Bonus",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryPoints {
    pub category: Category,
    /// Always within [0, category max]
    pub points: f64,
    /// e.g. "rank 3 of 40", "2 awards, 53 capped at 45"
    pub description: String,
}

/// Points one team earned at one event.
///
/// Only `score` constructs a breakdown, and nothing mutates one afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointBreakdown {
    team: u32,
    event: String,
    week: u32,
    categories: Vec<CategoryPoints>,
    total: f64,
    best_match_scores: [u32; 3],
    warnings: Vec<String>,
}

impl PointBreakdown {
    pub fn team(&self) -> u32 {
        self.team
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn week(&self) -> u32 {
        self.week
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    /// Category contributions in `Category::ALL` order.
    pub fn categories(&self) -> &[CategoryPoints] {
        &self.categories
    }

    pub fn points(&self, category: Category) -> f64 {
        self.categories
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.points)
            .unwrap_or(0.0)
    }

    /// Sum of category points before the rounding rule is applied.
    pub fn category_sum(&self) -> f64 {
        self.categories.iter().map(|c| c.points).sum()
    }

    /// Three best match scores at the event, highest first.
    pub fn best_match_scores(&self) -> [u32; 3] {
        self.best_match_scores
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

/// Score one team's facts for one event.
///
/// Pure: identical facts and rules always produce an identical breakdown.
pub fn score(facts: &RawEventFacts, rules: &RulesTable) -> PointBreakdown {
    let regime = rules.regime();
    let categories = vec![
        qualification(facts, rules, regime),
        alliance_selection(facts, rules, regime),
        playoff(facts, rules, regime),
        awards(facts, rules, regime),
        rookie(facts, rules, regime),
    ];

    let sum: f64 = categories.iter().map(|c| c.points).sum();

    PointBreakdown {
        team: facts.team,
        event: facts.event.clone(),
        week: facts.week,
        categories,
        total: rules.rounding.apply(sum),
        best_match_scores: facts.best_match_scores,
        warnings: facts.warnings.clone(),
    }
}

fn participates(only_in: Option<RegimeKind>, active: RegimeKind) -> bool {
    only_in.map_or(true, |kind| kind == active)
}

fn bounded(points: f64, max: f64) -> f64 {
    points.clamp(0.0, max.max(0.0))
}

fn skipped(category: Category) -> CategoryPoints {
    CategoryPoints {
        category,
        points: 0.0,
        description: "not counted under active regime".to_string(),
    }
}

fn qualification(facts: &RawEventFacts, rules: &RulesTable, regime: RegimeKind) -> CategoryPoints {
    let cfg = &rules.qualification;
    if !participates(cfg.only_in, regime) {
        return skipped(Category::Qualification);
    }
    match facts.qualification {
        Some(rank) => CategoryPoints {
            category: Category::Qualification,
            points: qualification_points(&cfg.curve, cfg.max, rank),
            description: format!("rank {} of {}", rank.rank, rank.field_size),
        },
        None => CategoryPoints {
            category: Category::Qualification,
            points: 0.0,
            description: "rank unavailable".to_string(),
        },
    }
}

fn seeded(table: &[f64], seed: u32) -> f64 {
    seed.checked_sub(1)
        .and_then(|i| table.get(i as usize))
        .copied()
        .unwrap_or(0.0)
}

fn alliance_selection(
    facts: &RawEventFacts,
    rules: &RulesTable,
    regime: RegimeKind,
) -> CategoryPoints {
    let cfg = &rules.alliance_selection;
    if !participates(cfg.only_in, regime) {
        return skipped(Category::AllianceSelection);
    }
    let Some(seat) = facts.alliance else {
        return CategoryPoints {
            category: Category::AllianceSelection,
            points: 0.0,
            description: "not selected".to_string(),
        };
    };

    let (raw, role) = match seat.role {
        AllianceRole::Captain => (seeded(&cfg.captain, seat.seed), "captain"),
        AllianceRole::FirstPick => (seeded(&cfg.first_pick, seat.seed), "first pick"),
        AllianceRole::SecondPick => (seeded(&cfg.second_pick, seat.seed), "second pick"),
        AllianceRole::Backup => (cfg.backup, "backup"),
    };

    CategoryPoints {
        category: Category::AllianceSelection,
        points: bounded(raw, cfg.max),
        description: format!("alliance {} {}", seat.seed, role),
    }
}

fn playoff(facts: &RawEventFacts, rules: &RulesTable, regime: RegimeKind) -> CategoryPoints {
    let cfg = &rules.playoff;
    if !participates(cfg.only_in, regime) {
        return skipped(Category::Playoff);
    }
    let (raw, label) = match facts.playoff {
        PlayoffTier::DidNotAdvance => (cfg.did_not_advance, "did not advance"),
        PlayoffTier::Quarterfinal => (cfg.quarterfinal, "quarterfinal"),
        PlayoffTier::Semifinal => (cfg.semifinal, "semifinal"),
        PlayoffTier::Finalist => (cfg.finalist, "finalist"),
        PlayoffTier::Winner => (cfg.winner, "winner"),
    };

    CategoryPoints {
        category: Category::Playoff,
        points: bounded(raw, cfg.max),
        description: label.to_string(),
    }
}

fn awards(facts: &RawEventFacts, rules: &RulesTable, regime: RegimeKind) -> CategoryPoints {
    let cfg = &rules.awards;
    if !participates(cfg.only_in, regime) {
        return skipped(Category::Awards);
    }
    let raw: f64 = facts
        .awards
        .iter()
        .map(|award| cfg.values.get(award).copied().unwrap_or(cfg.default_value))
        .sum();
    let points = bounded(raw, cfg.max);

    let description = if points < raw {
        format!("{} awards, {} capped at {}", facts.awards.len(), raw, cfg.max)
    } else {
        format!("{} awards", facts.awards.len())
    };

    CategoryPoints {
        category: Category::Awards,
        points,
        description,
    }
}

fn rookie(facts: &RawEventFacts, rules: &RulesTable, regime: RegimeKind) -> CategoryPoints {
    let cfg = &rules.rookie;
    if !participates(cfg.only_in, regime) {
        return skipped(Category::Rookie);
    }
    let (raw, description) = if facts.rookie {
        (cfg.bonus, "rookie")
    } else if facts.second_year {
        (cfg.second_year_bonus, "second year")
    } else {
        (0.0, "veteran")
    };
    CategoryPoints {
        category: Category::Rookie,
        points: bounded(raw, cfg.max),
        description: description.to_string(),
    }
}
