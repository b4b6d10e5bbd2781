pub mod aggregate;
pub mod cli;
pub mod date;
pub mod error;
pub mod github;
pub mod logging;
pub mod model;
pub mod query;
pub mod report;
pub mod store;
pub mod sync;
