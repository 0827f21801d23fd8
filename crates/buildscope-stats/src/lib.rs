#![deny(dead_code)]
#![deny(unused_variables)]

pub mod aggregate;
pub mod dimension;
pub mod resolve;
pub mod taxonomy;

pub use aggregate::{merge_calls, reconstruct_groups, AggregateReport, BasetypeAggregate, MergedResult};
pub use dimension::{process, process_dimension, Entry, GroupEntry, ProcessedDimension, Row};
pub use resolve::{resolve, ResolvedLabel, ResolvedResult};
pub use taxonomy::Attribute;
