pub mod dispatcher;
pub mod query_context;

pub use dispatcher::{Dispatcher, FallbackPolicy};
pub use query_context::QueryContext;
