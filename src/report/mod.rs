//! Missing-data reporting: the audit driver and the sinks it reports through.

mod reporter;
mod sink;

pub use reporter::MissingDataReporter;
pub use sink::{CollectingSink, FindingSink, TracingSink};
