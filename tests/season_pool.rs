use std::path::Path;

use regional_pool::build::{build_season_pool, PoolRequest, Progress};
use regional_pool::error::SeasonError;
use regional_pool::event::{EventKey, EventListing, EventRecord, PlayoffTier, RawTeamRecord};
use regional_pool::pool::{Completeness, QualificationReason};
use regional_pool::scoring::{RegimeKind, RulesTable, WeeklyRules};
use regional_pool::source::DirectorySource;
use tempfile::TempDir;

fn row(team: u32, rank: u32) -> RawTeamRecord {
    RawTeamRecord {
        team,
        name: Some(format!("Team {}", team)),
        rank: Some(rank),
        alliance: None,
        playoff: PlayoffTier::DidNotAdvance,
        awards: vec![],
        rookie: false,
        second_year: false,
        match_scores: vec![],
        district: None,
    }
}

fn event(code: &str, week: u32, teams: &[u32]) -> EventRecord {
    EventRecord {
        code: code.to_string(),
        week,
        name: Some(format!("{} Regional", code)),
        field_size: Some(teams.len() as u32),
        teams: teams
            .iter()
            .enumerate()
            .map(|(i, t)| row(*t, i as u32 + 1))
            .collect(),
    }
}

fn season_events() -> Vec<EventRecord> {
    vec![
        event("AZVA", 1, &[101, 102, 103, 104, 105]),
        event("CASD", 1, &[201, 202, 203, 204, 205]),
        event("TXHO", 2, &[301, 101, 302, 303, 304]),
        event("NYRO", 3, &[401, 402, 403, 404, 201]),
    ]
}

fn write_season(root: &Path, season: u16, events: &[EventRecord], listed_only: &[(&str, u32)]) {
    let dir = root.join(season.to_string());
    std::fs::create_dir_all(&dir).unwrap();

    let mut listing: Vec<EventListing> = events
        .iter()
        .map(|e| EventListing {
            code: e.code.clone(),
            week: e.week,
        })
        .collect();
    listing.extend(listed_only.iter().map(|(code, week)| EventListing {
        code: code.to_string(),
        week: *week,
    }));
    std::fs::write(
        dir.join("events.json"),
        serde_json::to_string(&listing).unwrap(),
    )
    .unwrap();

    for e in events {
        std::fs::write(
            dir.join(format!("{}.json", e.code)),
            serde_json::to_string(e).unwrap(),
        )
        .unwrap();
    }
}

fn request(season: u16, through_week: Option<u32>) -> PoolRequest {
    PoolRequest {
        season,
        rules_season: season,
        through_week,
        top_n: None,
        concurrency: 2,
    }
}

#[tokio::test]
async fn test_full_season_is_complete_and_repeatable() {
    let dir = TempDir::new().unwrap();
    write_season(dir.path(), 2026, &season_events(), &[]);
    let source = DirectorySource::new(dir.path());
    let rules = RulesTable::default();

    let first = build_season_pool(&source, &request(2026, None), &rules, None)
        .await
        .unwrap();
    let second = build_season_pool(&source, &request(2026, None), &rules, None)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first.completeness, Completeness::Complete);
    assert_eq!(first.through_week, 3);
    assert_eq!(first.events_processed, 4);
    assert_eq!(first.regime, RegimeKind::PerEvent);

    // Three per event; 101 already held a slot at TXHO so 303 backfills

    assert_eq!(first.count(QualificationReason::AutoAdvance), 11);
    assert_eq!(first.count(QualificationReason::Backfill), 1);
    let teams: Vec<u32> = first.entries.iter().map(|e| e.team).collect();
    let mut unique = teams.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), teams.len());
}

#[tokio::test]
async fn test_progress_covers_every_processed_event() {
    let dir = TempDir::new().unwrap();
    write_season(dir.path(), 2026, &season_events(), &[]);
    let source = DirectorySource::new(dir.path());
    let rules = RulesTable::default();

    let mut seen: Vec<String> = Vec::new();
    let mut sink = |p: &Progress| seen.push(p.event.clone());
    let pool = build_season_pool(&source, &request(2026, None), &rules, Some(&mut sink))
        .await
        .unwrap();

    assert_eq!(seen, vec!["AZVA", "CASD", "TXHO", "NYRO"]);
    assert_eq!(pool.events_processed, seen.len());
}

#[tokio::test]
async fn test_through_week_bounds_the_season() {
    let dir = TempDir::new().unwrap();
    write_season(dir.path(), 2026, &season_events(), &[]);
    let source = DirectorySource::new(dir.path());
    let rules = RulesTable::default();

    let pool = build_season_pool(&source, &request(2026, Some(1)), &rules, None)
        .await
        .unwrap();

    assert_eq!(pool.through_week, 1);
    assert_eq!(pool.events_processed, 2);
    assert!(pool.entries.iter().all(|e| e.team < 300));
}

#[tokio::test]
async fn test_missing_event_file_gives_partial_season() {
    let dir = TempDir::new().unwrap();
    write_season(dir.path(), 2026, &season_events(), &[("WAAM", 3)]);
    let source = DirectorySource::new(dir.path());
    let rules = RulesTable::default();

    let pool = build_season_pool(&source, &request(2026, None), &rules, None)
        .await
        .unwrap();

    assert!(pool.is_partial());
    assert_eq!(
        pool.completeness,
        Completeness::Partial {
            missing: vec![EventKey::new(3, "WAAM")]
        }
    );
    assert_eq!(pool.events_processed, 4);
}

#[tokio::test]
async fn test_malformed_event_aborts() {
    let dir = TempDir::new().unwrap();
    write_season(dir.path(), 2026, &season_events(), &[]);
    std::fs::write(dir.path().join("2026").join("TXHO.json"), "{\"code\": ").unwrap();
    let source = DirectorySource::new(dir.path());
    let rules = RulesTable::default();

    let err = build_season_pool(&source, &request(2026, None), &rules, None)
        .await
        .unwrap_err();
    assert!(matches!(err, SeasonError::MalformedEvent { ref event, .. } if event == "TXHO"));
}

#[tokio::test]
async fn test_missing_listing_is_a_listing_error() {
    let dir = TempDir::new().unwrap();
    let source = DirectorySource::new(dir.path());
    let rules = RulesTable::default();

    let err = build_season_pool(&source, &request(2019, None), &rules, None)
        .await
        .unwrap_err();
    assert!(matches!(err, SeasonError::Listing { season: 2019, .. }));
}

#[tokio::test]
async fn test_rules_season_switches_regime() {
    let dir = TempDir::new().unwrap();
    write_season(dir.path(), 2026, &season_events(), &[]);
    let source = DirectorySource::new(dir.path());

    let mut weekly = RulesTable::default();
    weekly.pool.regime = RegimeKind::Weekly;
    weekly.pool.weekly = Some(WeeklyRules {
        slots: Some(vec![2, 2, 2]),
        derived_slots: None,
        auto_advance_per_event: 1,
        auto_advance_awards: vec![],
        auto_advance_winners: None,
        carry_forward: false,
    });

    let mut req = request(2026, None);
    req.rules_season = 2025;
    let pool = build_season_pool(&source, &req, &weekly, None).await.unwrap();

    assert_eq!(pool.season, 2026);
    assert_eq!(pool.rules_season, 2025);
    assert_eq!(pool.regime, RegimeKind::Weekly);
    for week in 1..=3 {
        let allocated = pool
            .entries
            .iter()
            .filter(|e| e.week == Some(week))
            .count();
        assert!(allocated <= 2, "week {} allocated {}", week, allocated);
    }
    assert_eq!(
        pool.count(QualificationReason::AutoAdvance) + pool.count(QualificationReason::SlotFill),
        6
    );
}

fn weekly_rules() -> RulesTable {
    let mut rules = RulesTable::default();
    rules.pool.regime = RegimeKind::Weekly;
    rules.pool.weekly = Some(WeeklyRules {
        slots: Some(vec![2, 2, 2]),
        derived_slots: None,
        auto_advance_per_event: 1,
        auto_advance_awards: vec![],
        auto_advance_winners: None,
        carry_forward: false,
    });
    rules
}

#[tokio::test]
async fn test_unavailable_final_week_matches_earlier_pool() {
    let complete = TempDir::new().unwrap();
    write_season(complete.path(), 2026, &season_events(), &[]);
    let complete = DirectorySource::new(complete.path());

    let without_week_3: Vec<EventRecord> = season_events()
        .into_iter()
        .filter(|e| e.week < 3)
        .collect();
    let partial = TempDir::new().unwrap();
    write_season(partial.path(), 2026, &without_week_3, &[("NYRO", 3)]);
    let partial = DirectorySource::new(partial.path());

    for rules in [RulesTable::default(), weekly_rules()] {
        let earlier = build_season_pool(&complete, &request(2026, Some(2)), &rules, None)
            .await
            .unwrap();
        let pool = build_season_pool(&partial, &request(2026, None), &rules, None)
            .await
            .unwrap();

        assert_eq!(pool.through_week, 3);
        assert_eq!(pool.events_processed, 3);
        assert_eq!(
            pool.completeness,
            Completeness::Partial {
                missing: vec![EventKey::new(3, "NYRO")]
            }
        );
        assert_eq!(earlier.completeness, Completeness::Complete);
        assert!(!pool.entries.is_empty());
        assert_eq!(pool.entries, earlier.entries);
    }
}

#[tokio::test]
async fn test_invalid_rules_rejected_before_fetching() {
    let dir = TempDir::new().unwrap();
    let source = DirectorySource::new(dir.path());
    let mut rules = RulesTable::default();
    rules.pool.per_event = None;

    let err = build_season_pool(&source, &request(2026, None), &rules, None)
        .await
        .unwrap_err();
    assert!(matches!(err, SeasonError::InvalidRuleConfig(_)));
}
