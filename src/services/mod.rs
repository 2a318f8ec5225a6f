//! BigQuery REST resource services.

mod datasets;
mod jobs;
mod tabledata;
mod tables;

pub use datasets::*;
pub use jobs::*;
pub use tabledata::*;
pub use tables::*;
