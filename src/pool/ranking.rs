use std::cmp::Ordering;

use crate::scoring::{Category, PointBreakdown, RulesTable, TieBreakKey};
use crate::season::{SeasonAggregator, SeasonTeamRecord};

/// Order two breakdowns for ranking: higher total first, then each key of the
/// tie-break chain, then team number so the order is total.
pub fn compare(a: &PointBreakdown, b: &PointBreakdown, chain: &[TieBreakKey]) -> Ordering {
    b.total()
        .total_cmp(&a.total())
        .then_with(|| {
            chain
                .iter()
                .fold(Ordering::Equal, |ord, key| ord.then_with(|| compare_key(a, b, *key)))
        })
        .then_with(|| a.team().cmp(&b.team()))
}

fn compare_key(a: &PointBreakdown, b: &PointBreakdown, key: TieBreakKey) -> Ordering {
    let higher = |category: Category| b.points(category).total_cmp(&a.points(category));
    match key {
        TieBreakKey::EarliestWeek => a.week().cmp(&b.week()),
        TieBreakKey::Playoff => higher(Category::Playoff),
        TieBreakKey::AllianceSelection => higher(Category::AllianceSelection),
        TieBreakKey::Qualification => higher(Category::Qualification),
        TieBreakKey::Awards => higher(Category::Awards),
        TieBreakKey::BestMatchScores => b.best_match_scores().cmp(&a.best_match_scores()),
        TieBreakKey::TeamNumber => a.team().cmp(&b.team()),
    }
}

/// Sort breakdowns into ranking order.
pub fn rank<'a, I>(breakdowns: I, chain: &[TieBreakKey]) -> Vec<&'a PointBreakdown>
where
    I: IntoIterator<Item = &'a PointBreakdown>,
{
    let mut ranked: Vec<_> = breakdowns.into_iter().collect();
    ranked.sort_by(|a, b| compare(a, b, chain));
    ranked
}

/// Whether a team may take a pool slot at all.
pub fn is_eligible(rules: &RulesTable, record: &SeasonTeamRecord) -> bool {
    if rules.is_declined(record.team()) {
        return false;
    }
    !(rules.exclude_district_teams && record.district().is_some())
}

/// Eligible teams ranked by best single-event score through `week`, skipping
/// any team `skip` returns true for.
pub fn season_ranking<'a>(
    season: &'a SeasonAggregator<'_>,
    rules: &RulesTable,
    week: u32,
    skip: impl Fn(u32) -> bool,
) -> Vec<&'a PointBreakdown> {
    let candidates = season
        .teams()
        .filter(|record| is_eligible(rules, record) && !skip(record.team()))
        .filter_map(|record| record.best_through(week));
    rank(candidates, &rules.tie_break)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{AllianceRole, AllianceSeat, PlayoffTier, RawEventFacts, RankFacts};
    use crate::scoring::score;

    fn breakdown(
        team: u32,
        week: u32,
        rank: u32,
        playoff: PlayoffTier,
        seed: Option<u32>,
    ) -> PointBreakdown {
        let facts = RawEventFacts {
            team,
            event: format!("W{}", week),
            week,
            qualification: Some(RankFacts { rank, field_size: 40 }),
            alliance: seed.map(|seed| AllianceSeat { seed, role: AllianceRole::Captain }),
            playoff,
            awards: vec![],
            rookie: false,
            second_year: false,
            best_match_scores: [0; 3],
            district: None,
            warnings: vec![],
        };
        score(&facts, &RulesTable::default())
    }

    fn with_matches(team: u32, best_match_scores: [u32; 3]) -> PointBreakdown {
        let facts = RawEventFacts {
            team,
            event: "W1".to_string(),
            week: 1,
            qualification: Some(RankFacts { rank: 3, field_size: 40 }),
            alliance: None,
            playoff: PlayoffTier::DidNotAdvance,
            awards: vec![],
            rookie: false,
            second_year: false,
            best_match_scores,
            district: None,
            warnings: vec![],
        };
        score(&facts, &RulesTable::default())
    }

    fn teams(ranked: &[&PointBreakdown]) -> Vec<u32> {
        ranked.iter().map(|b| b.team()).collect()
    }

    #[test]
    fn test_higher_total_first() {
        let a = breakdown(10, 1, 1, PlayoffTier::Winner, Some(1));
        let b = breakdown(20, 1, 5, PlayoffTier::DidNotAdvance, None);
        let ranked = rank([&b, &a], &RulesTable::default().tie_break);
        assert_eq!(teams(&ranked), vec![10, 20]);
    }

    #[test]
    fn test_earliest_week_breaks_tie() {
        let early = breakdown(30, 1, 1, PlayoffTier::DidNotAdvance, None);
        let late = breakdown(20, 2, 1, PlayoffTier::DidNotAdvance, None);
        assert_eq!(early.total(), late.total());

        let ranked = rank([&late, &early], &[TieBreakKey::EarliestWeek]);
        assert_eq!(teams(&ranked), vec![30, 20]);
    }

    #[test]
    fn test_best_match_scores_break_tie() {
        let strong = with_matches(30, [150, 120, 90]);
        let deep = with_matches(20, [150, 110, 110]);
        let weak = with_matches(10, [140, 140, 140]);

        let ranked = rank([&weak, &deep, &strong], &[TieBreakKey::BestMatchScores]);
        assert_eq!(teams(&ranked), vec![30, 20, 10]);

        // Default chain ends with match scores before team number
        let ranked = rank([&weak, &deep, &strong], &RulesTable::default().tie_break);
        assert_eq!(teams(&ranked), vec![30, 20, 10]);

        let ranked = rank([&weak, &deep, &strong], &[]);
        assert_eq!(teams(&ranked), vec![10, 20, 30]);
    }

    #[test]
    fn test_team_number_closes_chain() {
        let a = breakdown(30, 1, 1, PlayoffTier::DidNotAdvance, None);
        let b = breakdown(20, 1, 1, PlayoffTier::DidNotAdvance, None);
        let ranked = rank([&a, &b], &[]);
        assert_eq!(teams(&ranked), vec![20, 30]);
    }

    #[test]
    fn test_category_key_prefers_higher_points() {
        let playoff_heavy = breakdown(40, 1, 1, PlayoffTier::Quarterfinal, Some(8)); // 22 + 9 + 7
        let alliance_heavy = breakdown(30, 1, 1, PlayoffTier::DidNotAdvance, Some(1)); // 22 + 16
        assert_eq!(playoff_heavy.total(), alliance_heavy.total());

        let ranked = rank([&alliance_heavy, &playoff_heavy], &[TieBreakKey::Playoff]);
        assert_eq!(teams(&ranked), vec![40, 30]);

        let ranked = rank([&playoff_heavy, &alliance_heavy], &[TieBreakKey::AllianceSelection]);
        assert_eq!(teams(&ranked), vec![30, 40]);
    }

    #[test]
    fn test_ineligible_teams() {
        let rules = RulesTable {
            declined: vec![7],
            ..RulesTable::default()
        };
        let mut season = SeasonAggregator::new(2026, &rules);
        let record = crate::event::EventRecord {
            code: "AAA".to_string(),
            week: 1,
            name: None,
            field_size: Some(3),
            teams: vec![
                crate::event::RawTeamRecord {
                    team: 5,
                    name: None,
                    rank: Some(1),
                    alliance: None,
                    playoff: PlayoffTier::DidNotAdvance,
                    awards: vec![],
                    rookie: false,
                    second_year: false,
                    match_scores: vec![],
                    district: Some("FIM".to_string()),
                },
                crate::event::RawTeamRecord {
                    team: 7,
                    name: None,
                    rank: Some(2),
                    alliance: None,
                    playoff: PlayoffTier::DidNotAdvance,
                    awards: vec![],
                    rookie: false,
                    second_year: false,
                    match_scores: vec![],
                    district: None,
                },
                crate::event::RawTeamRecord {
                    team: 9,
                    name: None,
                    rank: Some(3),
                    alliance: None,
                    playoff: PlayoffTier::DidNotAdvance,
                    awards: vec![],
                    rookie: false,
                    second_year: false,
                    match_scores: vec![],
                    district: None,
                },
            ],
        };
        season.ingest(&record).unwrap();

        let ranked = season_ranking(&season, &rules, 1, |_| false);
        assert_eq!(teams(&ranked), vec![9]);

        let ranked = season_ranking(&season, &rules, 1, |team| team == 9);
        assert!(ranked.is_empty());
    }
}
