//! Identity resolution and deduplication engine
//!
//! Pure, synchronous components, leaves first:
//! normalizer → roster_index → fingerprinter → matcher → pipeline.
//! Nothing in here touches storage.

pub mod fingerprinter;
pub mod matcher;
pub mod normalizer;
pub mod pipeline;
pub mod roster_index;

pub use fingerprinter::fingerprint;
pub use matcher::{match_event, MatchOutcome};
pub use normalizer::normalize;
pub use pipeline::{ingest, IngestReport, IngestionPipeline};
pub use roster_index::{KeyKind, RosterIndex};
