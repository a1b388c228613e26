// src/lib.rs

pub mod aggregate;
pub mod analysis;
pub mod config;
pub mod error;
pub mod join;
pub mod pipeline;
pub mod schema;
pub mod scrape;
pub mod store;
pub mod table;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use pipeline::{Pipeline, RunOutput};
pub use table::{Cell, Table};
