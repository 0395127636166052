//! Aggregation pipeline: per-source container fan-out, merge, clip.

pub mod collect;
pub mod merge;
pub mod pipeline;

pub use pipeline::Aggregator;
