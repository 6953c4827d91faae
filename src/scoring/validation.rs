use std::collections::HashSet;

use super::config::{CurveKind, RegimeKind, RulesTable, SlotFormula, WeeklyRules};

/// Validate a rules table before any scoring begins.
/// Returns all validation errors at once (not just the first).
pub fn validate_rules(rules: &RulesTable) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    check_max(&mut errors, "rules.qualification.max", rules.qualification.max);
    check_max(&mut errors, "rules.alliance_selection.max", rules.alliance_selection.max);
    check_max(&mut errors, "rules.playoff.max", rules.playoff.max);
    check_max(&mut errors, "rules.awards.max", rules.awards.max);
    check_max(&mut errors, "rules.rookie.max", rules.rookie.max);

    // Qualification curve
    let curve = &rules.qualification.curve;
    let params = [
        ("alpha", curve.alpha),
        ("scale", curve.scale),
        ("offset", curve.offset),
    ];
    for (name, value) in params {
        if !value.is_finite() {
            errors.push(format!(
                "rules.qualification.curve.{}: must be a finite number, got {}",
                name, value
            ));
        }
    }
    if curve.kind == CurveKind::InverseErf {
        if !(curve.alpha > 1.0) {
            errors.push(format!(
                "rules.qualification.curve.alpha: must be greater than 1, got {}",
                curve.alpha
            ));
        }
        if !(curve.scale > 0.0) {
            errors.push(format!(
                "rules.qualification.curve.scale: must be positive, got {}",
                curve.scale
            ));
        }
        let reach = curve.offset + curve.scale;
        let max = rules.qualification.max;
        if reach.is_finite() && max.is_finite() && reach < max {
            errors.push(format!(
                "rules.qualification.curve: offset + scale ({}) must reach max ({}) so rank 1 earns the maximum",
                reach, max
            ));
        }
    }

    // Alliance selection tables
    let alliance = &rules.alliance_selection;
    for (name, table) in [
        ("captain", &alliance.captain),
        ("first_pick", &alliance.first_pick),
        ("second_pick", &alliance.second_pick),
    ] {
        for (i, value) in table.iter().enumerate() {
            check_value(
                &mut errors,
                &format!("rules.alliance_selection.{}[{}]", name, i),
                *value,
                alliance.max,
            );
        }
    }
    check_value(&mut errors, "rules.alliance_selection.backup", alliance.backup, alliance.max);

    // Playoff values must rise with the tier reached
    let playoff = &rules.playoff;
    let tiers = [
        ("did_not_advance", playoff.did_not_advance),
        ("quarterfinal", playoff.quarterfinal),
        ("semifinal", playoff.semifinal),
        ("finalist", playoff.finalist),
        ("winner", playoff.winner),
    ];
    for (name, value) in &tiers {
        check_value(&mut errors, &format!("rules.playoff.{}", name), *value, playoff.max);
    }
    for pair in tiers.windows(2) {
        let (lower_name, lower) = pair[0];
        let (upper_name, upper) = pair[1];
        if upper < lower {
            errors.push(format!(
                "rules.playoff.{}: {} is below {} ({})",
                upper_name, upper, lower_name, lower
            ));
        }
    }

    // Awards
    check_non_negative(&mut errors, "rules.awards.default_value", rules.awards.default_value);
    for (award, value) in &rules.awards.values {
        check_non_negative(&mut errors, &format!("rules.awards.values['{}']", award), *value);
    }

    check_value(&mut errors, "rules.rookie.bonus", rules.rookie.bonus, rules.rookie.max);
    check_value(
        &mut errors,
        "rules.rookie.second_year_bonus",
        rules.rookie.second_year_bonus,
        rules.rookie.max,
    );

    // Tie-break chain
    let mut seen = HashSet::new();
    for key in &rules.tie_break {
        if !seen.insert(key) {
            errors.push(format!("rules.tie_break: {:?} listed more than once", key));
        }
    }

    // Pool regime
    match rules.pool.regime {
        RegimeKind::Weekly => match &rules.pool.weekly {
            Some(weekly) => validate_weekly(&mut errors, weekly),
            None => errors.push("rules.pool.weekly: required when regime is weekly".to_string()),
        },
        RegimeKind::PerEvent => match &rules.pool.per_event {
            Some(per_event) => {
                if per_event.top_n == 0 {
                    errors.push("rules.pool.per_event.top_n: must be at least 1".to_string());
                }
            }
            None => {
                errors.push("rules.pool.per_event: required when regime is per_event".to_string())
            }
        },
    }

    // Prequalified / declined overlap
    for team in &rules.prequalified {
        if rules.declined.contains(team) {
            errors.push(format!(
                "rules.declined: team {} is also listed as prequalified",
                team
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_max(errors: &mut Vec<String>, path: &str, max: f64) {
    if !max.is_finite() || max < 0.0 {
        errors.push(format!("{}: must be a non-negative number", path));
    }
}

/// Finite and non-negative; NaN would pass straight through `clamp`.
fn check_non_negative(errors: &mut Vec<String>, path: &str, value: f64) -> bool {
    if !value.is_finite() {
        errors.push(format!("{}: must be a finite number, got {}", path, value));
        false
    } else if value < 0.0 {
        errors.push(format!("{}: must be non-negative", path));
        false
    } else {
        true
    }
}

fn check_value(errors: &mut Vec<String>, path: &str, value: f64, max: f64) {
    if !check_non_negative(errors, path, value) {
        return;
    }
    if value > max {
        errors.push(format!("{}: {} exceeds category max {}", path, value, max));
    }
}

fn validate_weekly(errors: &mut Vec<String>, weekly: &WeeklyRules) {
    match (&weekly.slots, &weekly.derived_slots) {
        (Some(_), Some(_)) => errors.push(
            "rules.pool.weekly: set either slots or derived_slots, not both".to_string(),
        ),
        (None, None) => {
            errors.push("rules.pool.weekly: one of slots or derived_slots is required".to_string())
        }
        (Some(slots), None) => {
            if slots.is_empty() {
                errors.push("rules.pool.weekly.slots: must list at least one week".to_string());
            }
        }
        (None, Some(formula)) => validate_formula(errors, formula),
    }
}

fn validate_formula(errors: &mut Vec<String>, formula: &SlotFormula) {
    if formula.total_team_count == 0 {
        errors.push(
            "rules.pool.weekly.derived_slots.total_team_count: must be positive".to_string(),
        );
    }
    if formula.district_team_count > formula.total_team_count {
        errors.push(
            "rules.pool.weekly.derived_slots.district_team_count: exceeds total_team_count"
                .to_string(),
        );
    }
    if formula.prequalified_count > formula.championship_slots {
        errors.push(
            "rules.pool.weekly.derived_slots.prequalified_count: exceeds championship_slots"
                .to_string(),
        );
    }
    if formula.events_per_week.iter().sum::<u32>() == 0 {
        errors.push(
            "rules.pool.weekly.derived_slots.events_per_week: needs at least one event".to_string(),
        );
    }
    for (i, adjustment) in formula.week_adjustments.iter().enumerate() {
        if !adjustment.is_finite() {
            errors.push(format!(
                "rules.pool.weekly.derived_slots.week_adjustments[{}]: must be a finite number",
                i
            ));
        }
    }
    if formula.week_adjustments.len() > formula.events_per_week.len() {
        errors.push(
            "rules.pool.weekly.derived_slots.week_adjustments: longer than events_per_week"
                .to_string(),
        );
    }
}
