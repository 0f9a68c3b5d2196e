// Activity retrieval and processing.
// Cache-through event fetching plus the filter/sort/truncate pipeline.

pub mod pipeline;
pub mod service;

pub use pipeline::{ProcessOptions, SortKey, parse_from_date, parse_to_date, process};
pub use service::{ActivityService, DEFAULT_PAGE_SIZE};
