//! Fetching and resolving results, one at a time or as a bounded-concurrency
//! batch. A failed item is recorded and the batch moves on.

use buildscope_cache::DictionaryStore;
use buildscope_core::error::{Error, Result};
use buildscope_core::filter::FetchIntent;
use buildscope_core::traits::FetchTransport;
use buildscope_core::types::{Dictionary, SearchResult};
use buildscope_stats::ResolvedResult;
use buildscope_wire::WireDecoder;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    pub item: String,
    pub message: String,
}

impl ItemError {
    fn from_error(item: &str, err: &Error) -> Self {
        let message = match err {
            Error::Fetch { message, .. } => message.clone(),
            other => other.to_string(),
        };
        Self { item: item.to_string(), message }
    }
}

/// One labelled request of a batch.
#[derive(Debug, Clone)]
pub struct Job {
    pub label: String,
    pub intent: FetchIntent,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Successful results in request order.
    pub results: Vec<(String, ResolvedResult)>,
    pub errors: Vec<ItemError>,
    pub dictionary_errors: Vec<ItemError>,
}

pub type Fetched = Result<(ResolvedResult, Vec<ItemError>)>;

pub struct BatchFetcher {
    transport: Arc<dyn FetchTransport>,
    decoder: WireDecoder,
    dictionaries: Arc<DictionaryStore>,
    control_dimension: String,
}

impl BatchFetcher {
    pub fn new(
        transport: Arc<dyn FetchTransport>,
        decoder: WireDecoder,
        dictionaries: Arc<DictionaryStore>,
        control_dimension: &str,
    ) -> Self {
        Self { transport, decoder, dictionaries, control_dimension: control_dimension.to_string() }
    }

    pub fn dictionaries(&self) -> &DictionaryStore {
        &self.dictionaries
    }

    fn fetch_bytes(&self, intent: &FetchIntent) -> Result<Vec<u8>> {
        self.transport
            .fetch(intent)
            .map_err(|e| Error::Fetch { item: intent.label(), message: format!("{e:#}") })
    }

    fn fetch_dictionary(&self, hash: &str) -> anyhow::Result<Dictionary> {
        let bytes = self.fetch_bytes(&FetchIntent::Dictionary { hash: hash.to_string() })?;
        let mut dictionary = self.decoder.decode_dictionary(&bytes)?;
        dictionary.source = self.transport.source();
        Ok(dictionary)
    }

    /// Load every dictionary the result references, reusing live copies by
    /// hash. Failures leave the affected dimensions unresolved.
    pub fn load_dictionaries(&self, result: &SearchResult) -> (HashMap<String, Arc<Dictionary>>, Vec<ItemError>) {
        let mut loaded = HashMap::new();
        let mut errors = Vec::new();
        for dref in &result.dictionary_refs {
            match self.dictionaries.get_or_load(&dref.hash, || self.fetch_dictionary(&dref.hash)) {
                Ok(dict) => {
                    loaded.insert(dref.id.clone(), dict);
                }
                Err(e) => {
                    warn!(id = %dref.id, hash = %dref.hash, error = %e, "dictionary load failed");
                    let err = Error::DictionaryMissing(format!("{} (hash {}): {e:#}", dref.id, dref.hash));
                    errors.push(ItemError::from_error(&dref.id, &err));
                }
            }
        }
        (loaded, errors)
    }

    /// Fetch, decode and resolve one result.
    pub fn fetch_resolved(&self, intent: &FetchIntent) -> Fetched {
        let bytes = self.fetch_bytes(intent)?;
        let result = self.decoder.decode(&bytes)?;
        let (dictionaries, errors) = self.load_dictionaries(&result);
        debug!(request = %intent.label(), dictionaries = dictionaries.len(), "resolved result");
        Ok((ResolvedResult::new(result, dictionaries, &self.control_dimension), errors))
    }

    fn record(outcome: &mut BatchOutcome, label: String, fetched: Fetched) {
        match fetched {
            Ok((result, dict_errors)) => {
                outcome.dictionary_errors.extend(dict_errors);
                outcome.results.push((label, result));
            }
            Err(e) => {
                warn!(item = %label, error = %e, "fetch failed");
                outcome.errors.push(ItemError::from_error(&label, &e));
            }
        }
    }

    /// Fetch jobs in order, reporting progress after each completion.
    pub fn fetch_sequential(&self, jobs: Vec<Job>, on_progress: &mut dyn FnMut(&Progress)) -> BatchOutcome {
        let total = jobs.len();
        info!(total, "sequential batch started");
        let mut outcome = BatchOutcome::default();
        for (i, job) in jobs.into_iter().enumerate() {
            let fetched = self.fetch_resolved(&job.intent);
            on_progress(&Progress { current: i + 1, total, label: job.label.clone() });
            Self::record(&mut outcome, job.label, fetched);
        }
        info!(ok = outcome.results.len(), failed = outcome.errors.len(), "sequential batch finished");
        outcome
    }

    /// Fetch up to `concurrency` jobs at once on the blocking pool. Progress
    /// arrives in completion order; results are returned in request order.
    pub async fn fetch_concurrent(
        self: Arc<Self>,
        jobs: Vec<Job>,
        concurrency: usize,
        on_progress: &mut (dyn FnMut(&Progress) + Send),
    ) -> BatchOutcome {
        let total = jobs.len();
        info!(total, concurrency, "concurrent batch started");
        let mut stream = futures::stream::iter(jobs.into_iter().enumerate().map(|(idx, job)| {
            let fetcher = Arc::clone(&self);
            async move {
                let Job { label, intent } = job;
                let fetched = tokio::task::spawn_blocking(move || fetcher.fetch_resolved(&intent))
                    .await
                    .unwrap_or_else(|e| Err(Error::Operation(format!("fetch task failed: {e}"))));
                (idx, label, fetched)
            }
        }))
        .buffer_unordered(concurrency.max(1));

        let mut done = Vec::with_capacity(total);
        while let Some((idx, label, fetched)) = stream.next().await {
            on_progress(&Progress { current: done.len() + 1, total, label: label.clone() });
            done.push((idx, label, fetched));
        }
        done.sort_by_key(|(idx, _, _)| *idx);

        let mut outcome = BatchOutcome::default();
        for (_, label, fetched) in done {
            Self::record(&mut outcome, label, fetched);
        }
        info!(ok = outcome.results.len(), failed = outcome.errors.len(), "concurrent batch finished");
        outcome
    }
}
