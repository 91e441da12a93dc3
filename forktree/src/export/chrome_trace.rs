//! Chrome Trace Event Format export
//!
//! Lays every task out as a complete ("X") slice on a timeline, one track per
//! pid, for viewing in Perfetto or `chrome://tracing`. Tasks that never
//! stopped run until the latest stop time seen in the trace.

use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;

use crate::domain::{ExportError, Pid};
use crate::model::TaskModel;
use crate::task::Task;

/// Chrome Trace Event format
/// Format reference: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU/preview
#[derive(Debug, Clone, Serialize)]
struct ChromeTraceEvent {
    /// Event name (process comm)
    name: String,
    /// Category for filtering/coloring
    cat: String,
    /// Phase: "X" = complete, "M" = metadata
    ph: String,
    /// Timestamp in microseconds
    ts: i64,
    /// Duration in microseconds (complete events only)
    #[serde(skip_serializing_if = "Option::is_none")]
    dur: Option<i64>,
    pid: i32,
    tid: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    args: Option<HashMap<String, JsonValue>>,
}

/// Chrome Trace Format container
#[derive(Debug, Serialize)]
struct ChromeTrace {
    #[serde(rename = "traceEvents")]
    trace_events: Vec<ChromeTraceEvent>,
    #[serde(rename = "displayTimeUnit")]
    display_time_unit: String,
}

/// Timeline exporter for a fully ingested [`TaskModel`]
pub struct ChromeTraceExporter<'a> {
    model: &'a TaskModel,
    include_kernel_threads: bool,
}

impl<'a> ChromeTraceExporter<'a> {
    #[must_use]
    pub fn new(model: &'a TaskModel) -> Self {
        Self { model, include_kernel_threads: true }
    }

    /// Keep or drop tasks created as kernel threads
    #[must_use]
    pub fn with_kernel_threads(mut self, include: bool) -> Self {
        self.include_kernel_threads = include;
        self
    }

    fn should_show(&self, task: &Task) -> bool {
        self.include_kernel_threads || !task.is_kernel_thread()
    }

    fn task_event(task: &Task, horizon: i64) -> ChromeTraceEvent {
        let start = task.start_time().as_micros();
        let dur = match task.duration() {
            Some(duration) => duration.as_micros(),
            None => horizon.saturating_sub(start).max(0),
        };

        let mut args = HashMap::new();
        args.insert("id".to_string(), serde_json::json!(task.id().0));
        if let Some(parent) = task.parent_id() {
            args.insert("parent_id".to_string(), serde_json::json!(parent.0));
        }
        if let Some(pre) = task.pre_exec_id() {
            args.insert("pre_exec_id".to_string(), serde_json::json!(pre.0));
        }
        if let Some(post) = task.post_exec_id() {
            args.insert("post_exec_id".to_string(), serde_json::json!(post.0));
        }
        args.insert("kernel_thread".to_string(), serde_json::json!(task.is_kernel_thread()));
        args.insert("living".to_string(), serde_json::json!(task.is_living()));

        ChromeTraceEvent {
            name: task.comm().to_string(),
            cat: task.kind().as_str().to_string(),
            ph: "X".to_string(),
            ts: start,
            dur: Some(dur),
            pid: task.pid().0,
            tid: task.pid().0,
            args: Some(args),
        }
    }

    fn build_events(&self) -> Vec<ChromeTraceEvent> {
        let horizon = self.model.max_stop_time().as_micros();

        let mut events = Vec::new();
        // Latest comm per pid names the process track
        let mut process_names: BTreeMap<Pid, &str> = BTreeMap::new();

        for task in self.model.tasks().iter().filter(|task| self.should_show(task)) {
            events.push(Self::task_event(task, horizon));
            process_names.insert(task.pid(), task.comm());
        }

        for (pid, comm) in process_names {
            let mut args = HashMap::new();
            args.insert("name".to_string(), serde_json::json!(comm));

            events.push(ChromeTraceEvent {
                name: "process_name".to_string(),
                cat: String::new(),
                ph: "M".to_string(),
                ts: 0,
                dur: None,
                pid: pid.0,
                tid: pid.0,
                args: Some(args),
            });
        }

        events
    }

    /// Number of events [`export`](Self::export) will write
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.build_events().len()
    }

    /// Export the trace to any writer (file, stdout, buffer, etc.)
    ///
    /// # Errors
    /// Returns [`ExportError`] if serialization or the writer fails.
    pub fn export<W: Write>(&self, mut writer: W) -> Result<(), ExportError> {
        let trace = ChromeTrace {
            trace_events: self.build_events(),
            display_time_unit: "ms".to_string(),
        };

        serde_json::to_writer_pretty(&mut writer, &trace)?;
        writer.flush()?;
        Ok(())
    }
}
