pub mod aggregate;
pub mod clean;
pub mod config;
pub mod enrich;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod names;
pub mod pipeline;
pub mod reference;
pub mod report;
pub mod summary;
pub mod table;

pub use error::{PipelineError, Result};
pub use pipeline::{run, PipelineOutput, References};
