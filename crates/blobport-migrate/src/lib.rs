//! Migration engine.
//!
//! Three building blocks: [`MigrationLog`], the durable CSV record linking
//! each migrated blob to its new location; [`BatchPipeline`], the
//! bounded-concurrency fan-out every phase runs on; and [`Migrator`], which
//! wires them to the database and a sink for one phase invocation.
//!
//! Phases share no in-process state — dump, update, and removal communicate
//! only through the database and the log file, so each phase is independently
//! resumable by rerunning the binary.

pub mod log;
pub mod migrator;
pub mod pipeline;

pub use log::{LogError, MigrationLog};
pub use migrator::Migrator;
pub use pipeline::{BatchPipeline, BatchReport, Outcome};
