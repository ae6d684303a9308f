pub mod adapter;
pub mod resolver;
pub mod scheduler;

pub use adapter::{AdapterOptions, DEFAULT_DIAGNOSTIC_SOURCE, ParseAbort, ParseAdapter, ParseResult};
pub use resolver::{DiskResolver, PlaceholderResolver};
pub use scheduler::{DiagnosticsSink, ParseOptions, ParseOutcome, ParseScheduler};
