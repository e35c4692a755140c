/// DiskMapper Core — scanning, aggregation, and lazy presentation model.
///
/// This crate contains all business logic with zero UI dependencies.
/// Front-ends drive a [`controller::ScanController`] and read the tree
/// through a [`materialize::Materializer`].
///
/// # Modules
///
/// - [`model`] — Arena-allocated entry tree and size formatting.
/// - [`aggregate`] — Incremental bottom-up size propagation.
/// - [`scanner`] — Background, cancellable directory walker.
/// - [`materialize`] — On-demand display levels with small-file bucketing.
/// - [`controller`] — Single-scan lifecycle and status reporting.
pub mod aggregate;
pub mod config;
pub mod controller;
pub mod error;
pub mod materialize;
pub mod model;
pub mod scanner;

pub use config::{MaterializeConfig, ScanConfig};
pub use controller::{ScanController, ScanOutcome};
pub use error::{ScanError, TreeError};
pub use materialize::{DisplayNode, Materializer};
pub use model::{Entry, EntryTree, NodeIndex};
pub use scanner::LiveTree;
