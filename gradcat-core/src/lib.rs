//! Migration orchestrator.
//!
//! The pipeline is I/O-agnostic at the seams: reads go through [`ports::RepoView`],
//! writes through [`ports::WritePort`], source-control and enhancement
//! collaborators through their own narrow port traits. Execution is
//! single-threaded and strictly sequential; each numbered step completes all
//! of its file I/O before the next begins.

pub mod adapters;
pub mod pipeline;
pub mod ports;
pub mod render;
pub mod settings;
pub mod state;
pub mod validate;

pub use pipeline::{run_migration, MigrationOutcome, ToolError};
pub use settings::MigrateSettings;
