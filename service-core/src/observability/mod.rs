pub mod logging;
pub mod trace_context;

pub use logging::{init_tracing, TracingOptions};
pub use trace_context::{inject_trace_context, TracedClientExt, TracedRequest};
