pub mod exec;
pub mod output;

pub use exec::{activity, months, resolve_bounds, show};
pub use output::{output_activity_json, output_activity_ndjson, output_calendar, output_day, output_months};
