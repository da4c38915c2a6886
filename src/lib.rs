pub mod config;
pub mod error;
pub mod event;
pub mod json;
pub mod registry;
pub mod reporter;
pub mod series;
pub mod strategy;
pub mod transport;
pub mod value;
pub mod writer;

pub use error::{Error, Result};
pub use event::Event;
pub use registry::Metric;
pub use reporter::DatadogReporter;
pub use series::{MetricSample, SeriesEncoder};
pub use value::Value;
pub use writer::SingleFlushHttpWriter;
