#![deny(dead_code)]
#![deny(unused_variables)]

pub mod batch;
pub mod memory;
pub mod selection;
pub mod session;
pub mod store;

pub use batch::{BatchFetcher, BatchOutcome, Fetched, ItemError, Job, Progress};
pub use memory::{MemoryPreferenceStore, MemoryTransport};
pub use selection::{default_selection, PendingSelection, Preview, SelectionMachine, SelectionState};
pub use session::{
    execute_aggregation, AggregateOutcome, AggregationPlan, CommitOutcome, GenerationToken, QueryPlan, QueryStep,
    QueryView, Session, SelectionUpdate,
};
pub use store::{FsTransport, JsonPreferenceStore};
