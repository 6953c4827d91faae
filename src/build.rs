use serde::Serialize;

use crate::error::SeasonError;
use crate::event::{EventKey, EventRecord};
use crate::fetch::fetch_records;
use crate::pool::{AllocatorState, Completeness, PoolAllocator, SeasonPool};
use crate::scoring::{validate_rules, RulesTable};
use crate::season::{score_event_record, ScoredEvent, SeasonAggregator};
use crate::source::EventSource;

/// Reported after each event is folded into the allocator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
    pub event: String,
}

/// Receives progress. Never affects what is computed.
pub trait ProgressSink {
    fn report(&mut self, progress: &Progress);
}

impl<F: FnMut(&Progress)> ProgressSink for F {
    fn report(&mut self, progress: &Progress) {
        self(progress)
    }
}

/// What `build_season_pool` should produce.
#[derive(Debug, Clone)]
pub struct PoolRequest {
    /// Season whose events are scored
    pub season: u16,
    /// Season whose rules apply; usually the same as `season`
    pub rules_season: u16,
    /// Last week of interest; later events are never fetched. `None` means
    /// the last week the season lists.
    pub through_week: Option<u32>,
    pub top_n: Option<usize>,
    /// Maximum concurrent event retrievals
    pub concurrency: usize,
}

/// Score a single event.
pub async fn score_event(
    source: &dyn EventSource,
    season: u16,
    code: &str,
    rules: &RulesTable,
) -> Result<ScoredEvent, SeasonError> {
    validate_rules(rules).map_err(SeasonError::InvalidRuleConfig)?;

    let record = source.event_record(season, code).await.map_err(|e| {
        if e.is_retrievable() {
            SeasonError::EventUnavailable {
                event: code.to_string(),
                source: e,
            }
        } else {
            SeasonError::MalformedEvent {
                event: code.to_string(),
                reason: e.to_string(),
            }
        }
    })?;
    score_event_record(&record, rules)
}

/// Fetch, score and allocate a season through `request.through_week`.
///
/// Unretrievable events make the result `Partial`; any other failure aborts.
pub async fn build_season_pool(
    source: &dyn EventSource,
    request: &PoolRequest,
    rules: &RulesTable,
    mut sink: Option<&mut dyn ProgressSink>,
) -> Result<SeasonPool, SeasonError> {
    validate_rules(rules).map_err(SeasonError::InvalidRuleConfig)?;

    let listing = source
        .season_events(request.season)
        .await
        .map_err(|source| SeasonError::Listing {
            season: request.season,
            source,
        })?;
    let through_week = request
        .through_week
        .unwrap_or_else(|| listing.iter().map(|e| e.week).max().unwrap_or(0));
    let plan = SeasonAggregator::plan(request.season, &listing, through_week)?;
    tracing::debug!(
        season = request.season,
        listed = listing.len(),
        planned = plan.len(),
        through_week,
        "season planned"
    );

    let fetched = fetch_records(source, request.season, &plan, request.concurrency).await?;

    let mut run = SeasonRun::new(request.season, rules, fetched.records, through_week)
        .with_missing(fetched.missing);
    for progress in &mut run {
        let progress = progress?;
        if let Some(sink) = sink.as_deref_mut() {
            sink.report(&progress);
        }
    }

    let pool = run.finish(request.rules_season, request.top_n);
    tracing::info!(
        season = pool.season,
        rules_season = pool.rules_season,
        through_week = pool.through_week,
        events = pool.events_processed,
        entries = pool.entries.len(),
        partial = pool.is_partial(),
        "season pool built"
    );
    Ok(pool)
}

/// A season fold driven one event at a time.
///
/// Each call to `next` ingests the next record, folds it into the allocator,
/// closes its week when it is the week's last event, and yields progress.
/// Stopping early and calling `finish` gives the pool as of the events
/// processed so far. After an error the run yields nothing more.
pub struct SeasonRun<'r> {
    aggregator: SeasonAggregator<'r>,
    allocator: PoolAllocator<'r>,
    pending: std::iter::Peekable<std::vec::IntoIter<EventRecord>>,
    total: usize,
    through_week: u32,
    missing: Vec<EventKey>,
    failed: bool,
}

impl<'r> SeasonRun<'r> {
    /// `records` must already be in processing order; out-of-order records fail the run.
    pub fn new(
        season: u16,
        rules: &'r RulesTable,
        records: Vec<EventRecord>,
        through_week: u32,
    ) -> Self {
        Self::resume(season, rules, records, through_week, AllocatorState::default())
    }

    /// Continue allocation from an earlier run's state. Every record is
    /// ingested again; weeks the state already closed are not re-allocated.
    pub fn resume(
        season: u16,
        rules: &'r RulesTable,
        records: Vec<EventRecord>,
        through_week: u32,
        state: AllocatorState,
    ) -> Self {
        let records: Vec<EventRecord> = records
            .into_iter()
            .filter(|r| r.week <= through_week)
            .collect();
        Self {
            aggregator: SeasonAggregator::new(season, rules),
            allocator: PoolAllocator::resume(rules, state),
            total: records.len(),
            pending: records.into_iter().peekable(),
            through_week,
            missing: Vec::new(),
            failed: false,
        }
    }

    pub fn with_missing(mut self, missing: Vec<EventKey>) -> Self {
        self.missing = missing;
        self
    }

    pub fn season(&self) -> &SeasonAggregator<'r> {
        &self.aggregator
    }

    pub fn allocator(&self) -> &PoolAllocator<'r> {
        &self.allocator
    }

    fn step(&mut self, record: EventRecord) -> Result<Progress, SeasonError> {
        let scored = self.aggregator.ingest(&record)?.clone();
        self.allocator.fold_event(&self.aggregator, &scored);

        let week_done = self
            .pending
            .peek()
            .map_or(true, |next| next.week != record.week);
        if week_done {
            self.allocator.close_week(&self.aggregator, record.week);
        }

        Ok(Progress {
            processed: self.aggregator.events().len(),
            total: self.total,
            event: record.code,
        })
    }

    /// Standings as of the events processed so far.
    pub fn finish(self, rules_season: u16, top_n: Option<usize>) -> SeasonPool {
        self.finish_with_state(rules_season, top_n).0
    }

    /// Like `finish`, also handing back the allocator state for a later resume.
    pub fn finish_with_state(
        self,
        rules_season: u16,
        top_n: Option<usize>,
    ) -> (SeasonPool, AllocatorState) {
        let entries = self.allocator.standings(&self.aggregator, self.through_week, top_n);
        let completeness = if self.missing.is_empty() {
            Completeness::Complete
        } else {
            Completeness::Partial {
                missing: self.missing,
            }
        };
        let pool = SeasonPool {
            season: self.aggregator.season(),
            rules_season,
            through_week: self.through_week,
            regime: self.aggregator.rules().regime(),
            events_processed: self.aggregator.events().len(),
            completeness,
            entries,
        };
        (pool, self.allocator.into_state())
    }
}

impl Iterator for SeasonRun<'_> {
    type Item = Result<Progress, SeasonError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let record = self.pending.next()?;
        let result = self.step(record);
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}
