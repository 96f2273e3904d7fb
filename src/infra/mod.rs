pub mod in_memory_sink;
pub mod ndjson_sink;
pub mod sqlite_sink;

pub use in_memory_sink::InMemorySink;
pub use ndjson_sink::NdjsonSink;
pub use sqlite_sink::SqliteSink;
