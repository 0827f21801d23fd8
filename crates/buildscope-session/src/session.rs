//! Single-writer session tying filters, caches, selection and fetching
//! together.
//!
//! Every filter change bumps a generation counter. Work is split into plan,
//! execute and commit: plans capture the generation, execution needs no
//! access to the session, and a commit whose generation is no longer current
//! is dropped without touching the caches.

use buildscope_cache::{CacheEntry, DictionaryStore, StatCache, StoreOutcome};
use buildscope_core::config::EngineSettings;
use buildscope_core::error::{Error, Result};
use buildscope_core::filter::{FetchIntent, FilterState, ItemCategory};
use buildscope_core::traits::{FetchTransport, PreferenceStore};
use buildscope_core::types::PreferenceKey;
use buildscope_stats::taxonomy::parse_group_key;
use buildscope_stats::{reconstruct_groups, AggregateReport, BasetypeAggregate, GroupEntry, ProcessedDimension, ResolvedResult};
use buildscope_wire::WireDecoder;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::batch::{BatchFetcher, BatchOutcome, Fetched, ItemError, Job, Progress};
use crate::selection::{default_selection, SelectionMachine, SelectionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GenerationToken(u64);

impl GenerationToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
struct Generation {
    current: u64,
}

impl Generation {
    fn token(&self) -> GenerationToken {
        GenerationToken(self.current)
    }

    fn bump(&mut self) -> GenerationToken {
        self.current += 1;
        self.token()
    }

    fn check(&self, token: GenerationToken) -> Result<()> {
        if token.0 == self.current {
            Ok(())
        } else {
            Err(Error::StaleGeneration { planned: token.0, current: self.current })
        }
    }
}

#[derive(Debug)]
pub enum CommitOutcome<T> {
    Applied(T),
    /// Filters changed after planning; the work was discarded.
    Stale,
}

impl<T> CommitOutcome<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            CommitOutcome::Applied(v) => Some(v),
            CommitOutcome::Stale => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryView {
    pub state: FilterState,
    #[serde(skip)]
    pub result: Arc<ResolvedResult>,
    pub true_total: u64,
    pub dimensions: Vec<ProcessedDimension>,
    /// Attribute groups of the selected item's basetypes; reconstructed when
    /// a basetype filter is active.
    pub groups: Vec<GroupEntry>,
    pub insufficient: bool,
    pub from_cache: bool,
    pub dictionary_errors: Vec<ItemError>,
}

impl QueryView {
    /// Soft warning for results that were returned but not cached.
    pub fn warning(&self) -> Option<Error> {
        self.insufficient.then(|| Error::InsufficientData(self.state.signature()))
    }
}

#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub token: GenerationToken,
    pub state: FilterState,
    pub intent: FetchIntent,
}

#[derive(Debug)]
pub enum QueryStep {
    Ready(QueryView),
    Fetch(QueryPlan),
}

#[derive(Debug, Clone)]
pub struct AggregationPlan {
    pub token: GenerationToken,
    /// Active filters with the basetype axis cleared.
    pub base: FilterState,
    pub category: ItemCategory,
    pub requested: Vec<String>,
    pub skipped: Vec<String>,
    pub cached: Vec<(String, Arc<ResolvedResult>)>,
    pub jobs: Vec<Job>,
    pub hit: Option<Arc<BasetypeAggregate>>,
}

impl AggregationPlan {
    fn combination(&self) -> FilterState {
        let mut combo = self.base.clone();
        combo.basetypes = self.requested.iter().cloned().collect();
        combo
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateOutcome {
    pub category: ItemCategory,
    pub requested: Vec<String>,
    pub report: AggregateReport,
    pub groups: Vec<GroupEntry>,
    pub errors: Vec<ItemError>,
    pub dictionary_errors: Vec<ItemError>,
    pub skipped: Vec<String>,
    pub reused: usize,
    pub fetched: usize,
    pub from_cache: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionUpdate {
    pub members: Vec<String>,
    pub auto_applied: bool,
}

/// Run the fetch half of an aggregation plan without borrowing the session.
pub async fn execute_aggregation(
    fetcher: Arc<BatchFetcher>,
    plan: &AggregationPlan,
    concurrency: usize,
    on_progress: &mut (dyn FnMut(&Progress) + Send),
) -> BatchOutcome {
    if concurrency <= 1 {
        fetcher.fetch_sequential(plan.jobs.clone(), on_progress)
    } else {
        fetcher.fetch_concurrent(plan.jobs.clone(), concurrency, on_progress).await
    }
}

pub struct Session {
    settings: EngineSettings,
    state: FilterState,
    generation: Generation,
    cache: StatCache,
    fetcher: Arc<BatchFetcher>,
    preferences: Arc<dyn PreferenceStore>,
    selection: SelectionMachine,
    current: Option<QueryView>,
}

impl Session {
    pub fn new(
        snapshot_id: &str,
        settings: EngineSettings,
        transport: Arc<dyn FetchTransport>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Self {
        let fetcher = BatchFetcher::new(
            transport,
            WireDecoder::new(settings.max_message_bytes),
            Arc::new(DictionaryStore::new()),
            &settings.control_dimension,
        );
        Self {
            cache: StatCache::new(&settings),
            settings,
            state: FilterState::new(snapshot_id),
            generation: Generation::default(),
            fetcher: Arc::new(fetcher),
            preferences,
            selection: SelectionMachine::new(),
            current: None,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn generation(&self) -> GenerationToken {
        self.generation.token()
    }

    pub fn fetcher(&self) -> Arc<BatchFetcher> {
        Arc::clone(&self.fetcher)
    }

    pub fn cache(&self) -> &StatCache {
        &self.cache
    }

    pub fn current(&self) -> Option<&QueryView> {
        self.current.as_ref()
    }

    fn base_state(&self) -> FilterState {
        let mut base = self.state.clone();
        base.basetypes.clear();
        base
    }

    fn changed(&mut self) {
        let token = self.generation.bump();
        debug!(generation = token.value(), signature = %self.state.signature(), "filters changed");
    }

    // ---- filter mutations ----

    pub fn set_snapshot(&mut self, snapshot_id: &str) {
        self.state.snapshot_id = snapshot_id.to_string();
        self.selection.collapse();
        self.changed();
    }

    pub fn select_item(&mut self, item: &str) {
        self.state.select_item(item);
        self.selection.collapse();
        self.changed();
    }

    pub fn clear_items(&mut self) {
        self.state.clear_items();
        self.selection.collapse();
        self.changed();
    }

    pub fn set_skills<I, S>(&mut self, skills: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.set_skills(skills);
        self.changed();
    }

    pub fn set_modifiers<I, S>(&mut self, modifiers: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.set_modifiers(modifiers)?;
        self.changed();
        Ok(())
    }

    pub fn set_basetypes<I, S>(&mut self, basetypes: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.set_basetypes(basetypes)?;
        self.changed();
        Ok(())
    }

    // ---- single query ----

    fn view(
        &self,
        state: FilterState,
        result: Arc<ResolvedResult>,
        from_cache: bool,
        insufficient: bool,
        dictionary_errors: Vec<ItemError>,
    ) -> QueryView {
        let dimensions = result.process_all();
        let groups = match state.category() {
            Some(cat) if !state.basetypes.is_empty() => reconstruct_groups(cat, state.basetypes.iter().map(String::as_str)),
            Some(cat) => {
                let id = cat.basetype_dimension();
                dimensions.iter().find(|d| d.id == id).map(|d| d.groups().cloned().collect()).unwrap_or_default()
            }
            None => Vec::new(),
        };
        QueryView {
            state,
            true_total: result.true_total,
            result,
            dimensions,
            groups,
            insufficient,
            from_cache,
            dictionary_errors,
        }
    }

    /// Serve the current filters from cache, or describe the fetch needed.
    /// States with several basetypes are pooled by [`Session::aggregate`].
    pub fn plan_query(&mut self) -> Result<QueryStep> {
        let state = self.state.clone();
        let cached = match state.basetypes.len() {
            0 => match self.cache.get_combination(&state) {
                Some(CacheEntry::Raw(r)) => Some(Arc::clone(r)),
                _ => None,
            },
            1 => state.basetypes.iter().next().and_then(|bt| self.cache.get_single(&state, bt)),
            n => return Err(Error::Operation(format!("{n} basetypes selected; use aggregation for pooled results"))),
        };
        if let Some(result) = cached {
            let view = self.view(state, result, true, false, Vec::new());
            self.current = Some(view.clone());
            return Ok(QueryStep::Ready(view));
        }
        Ok(QueryStep::Fetch(QueryPlan { token: self.generation.token(), intent: state.fetch_intent(), state }))
    }

    pub fn commit_query(&mut self, plan: QueryPlan, fetched: Fetched) -> Result<CommitOutcome<QueryView>> {
        if let Err(e) = self.generation.check(plan.token) {
            debug!(error = %e, "discarding stale query");
            return Ok(CommitOutcome::Stale);
        }
        let (result, dictionary_errors) = fetched?;
        let result = Arc::new(result);
        let insufficient = match plan.state.basetypes.iter().next() {
            Some(bt) => {
                self.cache.put_single(&plan.state, bt, Arc::clone(&result));
                false
            }
            None => self.cache.put_combination(&plan.state, CacheEntry::Raw(Arc::clone(&result))) == StoreOutcome::Insufficient,
        };
        let view = self.view(plan.state, result, false, insufficient, dictionary_errors);
        self.current = Some(view.clone());
        Ok(CommitOutcome::Applied(view))
    }

    /// Plan, fetch and commit the current filters in one call.
    pub fn load(&mut self) -> Result<QueryView> {
        let plan = match self.plan_query()? {
            QueryStep::Ready(view) => return Ok(view),
            QueryStep::Fetch(plan) => plan,
        };
        let token = plan.token;
        let fetched = self.fetcher.fetch_resolved(&plan.intent);
        match self.commit_query(plan, fetched)? {
            CommitOutcome::Applied(view) => Ok(view),
            CommitOutcome::Stale => Err(Error::StaleGeneration { planned: token.value(), current: self.generation.token().value() }),
        }
    }

    // ---- aggregation ----

    /// Decide which basetypes to pool and which still need fetching.
    /// Blacklisted basetypes are skipped, duplicates dropped, and the list
    /// capped at `max_basetypes`.
    pub fn plan_aggregation(&self, basetypes: &[String]) -> Result<AggregationPlan> {
        let base = self.base_state();
        let category =
            base.category().ok_or_else(|| Error::Operation("aggregation needs exactly one rare item category".to_string()))?;
        let (skipped, allowed): (Vec<String>, Vec<String>) =
            basetypes.iter().cloned().partition(|b| self.settings.is_blacklisted(b));
        let mut requested: Vec<String> = Vec::new();
        for bt in allowed {
            if !requested.contains(&bt) {
                requested.push(bt);
            }
        }
        requested.truncate(self.settings.max_basetypes);
        if requested.is_empty() {
            return Err(Error::Operation("no basetypes left to aggregate".to_string()));
        }

        let mut plan = AggregationPlan {
            token: self.generation.token(),
            base,
            category,
            requested,
            skipped,
            cached: Vec::new(),
            jobs: Vec::new(),
            hit: None,
        };
        if let Some(CacheEntry::Aggregate(agg)) = self.cache.get_combination(&plan.combination()) {
            plan.hit = Some(Arc::clone(agg));
            return Ok(plan);
        }
        let partition = self.cache.partition(&plan.base, &plan.requested);
        plan.cached = partition.cached;
        plan.jobs = partition
            .uncached
            .into_iter()
            .map(|bt| Job { intent: plan.base.for_basetype(&bt).fetch_intent(), label: bt })
            .collect();
        info!(
            category = category.code(),
            requested = plan.requested.len(),
            reused = plan.cached.len(),
            to_fetch = plan.jobs.len(),
            skipped = plan.skipped.len(),
            "aggregation planned"
        );
        Ok(plan)
    }

    pub fn commit_aggregation(&mut self, plan: AggregationPlan, outcome: BatchOutcome) -> CommitOutcome<AggregateOutcome> {
        if let Err(e) = self.generation.check(plan.token) {
            debug!(error = %e, "discarding stale aggregation");
            return CommitOutcome::Stale;
        }
        let combination = plan.combination();
        if let Some(hit) = &plan.hit {
            return CommitOutcome::Applied(AggregateOutcome {
                category: plan.category,
                report: hit.finish(),
                groups: reconstruct_groups(plan.category, hit.basetypes()),
                errors: Vec::new(),
                dictionary_errors: Vec::new(),
                reused: plan.requested.len(),
                fetched: 0,
                from_cache: true,
                requested: plan.requested,
                skipped: plan.skipped,
            });
        }

        let mut aggregate = BasetypeAggregate::new();
        for (bt, result) in &plan.cached {
            aggregate.add(bt, result);
        }
        let fetched = outcome.results.len();
        for (bt, result) in outcome.results {
            let result = Arc::new(result);
            aggregate.add(&bt, &result);
            self.cache.put_single(&plan.base, &bt, result);
        }
        // A partial pool must not answer later requests for the full set.
        if outcome.errors.is_empty() {
            self.cache.put_combination(&combination, CacheEntry::Aggregate(Arc::new(aggregate.clone())));
        }
        info!(pooled = aggregate.pool_total(), fetched, failed = outcome.errors.len(), "aggregation committed");

        CommitOutcome::Applied(AggregateOutcome {
            category: plan.category,
            report: aggregate.finish(),
            groups: reconstruct_groups(plan.category, aggregate.basetypes()),
            errors: outcome.errors,
            dictionary_errors: outcome.dictionary_errors,
            reused: plan.cached.len(),
            fetched,
            from_cache: false,
            requested: plan.requested,
            skipped: plan.skipped,
        })
    }

    /// Sequential aggregation with progress after every completed fetch.
    pub fn aggregate(&mut self, basetypes: &[String], on_progress: &mut dyn FnMut(&Progress)) -> Result<AggregateOutcome> {
        let plan = self.plan_aggregation(basetypes)?;
        let token = plan.token;
        let outcome = self.fetcher.fetch_sequential(plan.jobs.clone(), on_progress);
        self.commit_aggregation(plan, outcome).applied().ok_or(Error::StaleGeneration {
            planned: token.value(),
            current: self.generation.token().value(),
        })
    }

    /// Aggregation using the configured fetch concurrency.
    pub async fn aggregate_async(
        &mut self,
        basetypes: &[String],
        on_progress: &mut (dyn FnMut(&Progress) + Send),
    ) -> Result<AggregateOutcome> {
        let plan = self.plan_aggregation(basetypes)?;
        let token = plan.token;
        let outcome = execute_aggregation(self.fetcher(), &plan, self.settings.fetch_concurrency, on_progress).await;
        self.commit_aggregation(plan, outcome).applied().ok_or(Error::StaleGeneration {
            planned: token.value(),
            current: self.generation.token().value(),
        })
    }

    // ---- selection ----

    pub fn selection(&self) -> &SelectionState {
        self.selection.state()
    }

    /// Open an attribute group of the selected item's category.
    pub fn expand_group(&mut self, group_key: &str) -> Result<()> {
        let selected = self
            .state
            .category()
            .ok_or_else(|| Error::Operation("attribute groups need exactly one selected item".to_string()))?;
        let (_, category) =
            parse_group_key(group_key).ok_or_else(|| Error::NotFound(format!("attribute group '{group_key}'")))?;
        if category != selected {
            return Err(Error::Operation(format!(
                "group '{group_key}' belongs to {}, selected item is {}",
                category.code(),
                selected.code()
            )));
        }
        self.selection.expand(group_key, &self.state.basetypes)
    }

    pub fn collapse_group(&mut self) {
        self.selection.collapse();
    }

    fn preference_key(&self, category: ItemCategory, group_key: &str) -> PreferenceKey {
        PreferenceKey {
            category: category.code().to_string(),
            group_key: group_key.to_string(),
            combo_key: self.state.combo_key(),
        }
    }

    /// Flip one member. When every pending member already has a cached
    /// single-basetype result the selection is applied right away.
    pub fn toggle_member(&mut self, member: &str) -> Result<SelectionUpdate> {
        let pending = self.selection.toggle(member)?.clone();
        let base = self.base_state();
        let all_cached = !pending.items.is_empty() && pending.items.iter().all(|b| self.cache.has_single(&base, b));
        if all_cached {
            debug!(group = %pending.group_key, "all pending members cached, applying");
            let members = self.apply_selection()?;
            return Ok(SelectionUpdate { members, auto_applied: true });
        }
        Ok(SelectionUpdate { members: pending.items.into_iter().collect(), auto_applied: false })
    }

    pub fn reset_selection(&mut self) -> Result<Vec<String>> {
        let preview = self
            .selection
            .expanded_group()
            .cloned()
            .ok_or_else(|| Error::Operation("no attribute group is expanded".to_string()))?;
        let key = self.preference_key(preview.category, &preview.group_key);
        let saved = self.preferences.get(&key).map_err(|e| Error::Operation(format!("reading preference: {e:#}")))?;
        let combo = self.state.combo_key();
        let observed = self
            .current
            .as_ref()
            .filter(|v| v.state.combo_key() == combo)
            .and_then(|v| v.groups.iter().find(|g| g.group_key == preview.group_key && !g.reconstructed));
        let defaults =
            default_selection(saved, observed, preview.category, preview.attribute, self.settings.default_selection_size);
        let pending = self.selection.reset_to_default(defaults)?;
        Ok(pending.items.iter().cloned().collect())
    }

    /// Persist the pending members as this combination's preference and make
    /// them the active basetype filter. Nothing changes unless the filter
    /// accepts the members and the preference is saved.
    pub fn apply_selection(&mut self) -> Result<Vec<String>> {
        let pending = self
            .selection
            .pending()
            .cloned()
            .ok_or_else(|| Error::Operation("nothing pending to apply".to_string()))?;
        let members: Vec<String> = pending.items.iter().cloned().collect();
        let mut next = self.state.clone();
        next.set_basetypes(members.clone())?;
        let key = self.preference_key(pending.category, &pending.group_key);
        self.preferences
            .set(&key, &members)
            .map_err(|e| Error::Operation(format!("saving preference: {e:#}")))?;
        self.selection.apply()?;
        self.state = next;
        self.changed();
        Ok(members)
    }

    pub fn cancel_selection(&mut self) {
        self.selection.cancel();
    }
}
