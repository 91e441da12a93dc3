//! Trace export functionality
//!
//! Exports the reconstructed task timeline for external viewers.
//! Currently supports Chrome Trace Event Format for chrome://tracing and Perfetto.

pub mod chrome_trace;

pub use chrome_trace::ChromeTraceExporter;
