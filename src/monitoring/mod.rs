/*!
 * Monitoring
 * Subscriber setup for the library's tracing events
 */

mod tracer;

pub use tracer::{init_tracing, TraceFormat, TRACE_JSON_ENV};
