//! Trace parsing
//!
//! Turns kernel trace lines into [`TraceEvent`]s and feeds them to a
//! [`TaskModel`] in file order. Recognised line bodies:
//!
//! ```text
//! [    1.000000] FORK|570|VBoxService|=>|571|0
//! [    2.000000] EXEC|571|VBoxService|=|grep
//! [    3.000000] EXIT|571|grep
//! ```
//!
//! Anything else (other kernel messages, lines without a timestamp) is
//! skipped. So is an event line whose fields are missing or not numbers.

use log::{debug, info, warn};
use std::path::Path;

use crate::domain::{EventKind, IngestError, Pid, Timestamp};
use crate::model::TaskModel;

const FORK_PREFIX: &str = "FORK|";
const EXEC_PREFIX: &str = "EXEC|";
const EXIT_PREFIX: &str = "EXIT|";

/// A single parsed trace event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// `FORK|<ppid>|<comm>|=>|<pid>|<kthread>`
    Fork {
        time: Timestamp,
        parent_pid: Pid,
        /// Name the tracer attributes to the new task at fork time
        comm: String,
        child_pid: Pid,
        kernel_thread: bool,
    },
    /// `EXEC|<pid>|<old comm>|=|<new comm>`
    Exec { time: Timestamp, pid: Pid, old_comm: String, new_comm: String },
    /// `EXIT|<pid>|<comm>`
    Exit { time: Timestamp, pid: Pid, comm: String },
}

impl TraceEvent {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            TraceEvent::Fork { .. } => EventKind::Fork,
            TraceEvent::Exec { .. } => EventKind::Exec,
            TraceEvent::Exit { .. } => EventKind::Exit,
        }
    }

    #[must_use]
    pub fn time(&self) -> Timestamp {
        match self {
            TraceEvent::Fork { time, .. }
            | TraceEvent::Exec { time, .. }
            | TraceEvent::Exit { time, .. } => *time,
        }
    }
}

/// Outcome of classifying one line
#[derive(Debug, Clone, PartialEq, Eq)]
enum ParsedLine {
    Event(TraceEvent),
    /// Not a trace event at all
    Other,
    /// Event keyword present but the fields are unusable
    Malformed(EventKind),
}

/// Parse a single trace line.
///
/// Returns `None` for lines that are not well-formed fork/exec/exit events.
#[must_use]
pub fn parse_line(line: &str) -> Option<TraceEvent> {
    match classify_line(line) {
        ParsedLine::Event(event) => Some(event),
        ParsedLine::Other | ParsedLine::Malformed(_) => None,
    }
}

fn classify_line(line: &str) -> ParsedLine {
    let Some((time, body)) = split_timestamp(line) else {
        return ParsedLine::Other;
    };

    let (kind, parsed) = if body.starts_with(FORK_PREFIX) {
        (EventKind::Fork, parse_fork(time, body))
    } else if body.starts_with(EXEC_PREFIX) {
        (EventKind::Exec, parse_exec(time, body))
    } else if body.starts_with(EXIT_PREFIX) {
        (EventKind::Exit, parse_exit(time, body))
    } else {
        return ParsedLine::Other;
    };

    parsed.map_or(ParsedLine::Malformed(kind), ParsedLine::Event)
}

/// Split `[<seconds>] <body>` into a timestamp and the body.
fn split_timestamp(line: &str) -> Option<(Timestamp, &str)> {
    let open = line.find('[')?;
    let close = open + 1 + line[open + 1..].find(']')?;

    let seconds: f64 = line[open + 1..close].trim().parse().ok()?;
    if !seconds.is_finite() {
        return None;
    }

    Some((Timestamp::from_seconds(seconds), line[close + 1..].trim_start()))
}

fn parse_pid(field: &str) -> Option<Pid> {
    field.trim().parse().ok().map(Pid)
}

fn parse_fork(time: Timestamp, body: &str) -> Option<TraceEvent> {
    // FORK|570|VBoxService|=>|571|0
    let fields: Vec<&str> = body.split('|').collect();
    if fields.len() < 6 {
        return None;
    }

    let kthread: i32 = fields[5].trim().parse().ok()?;
    Some(TraceEvent::Fork {
        time,
        parent_pid: parse_pid(fields[1])?,
        comm: fields[2].to_string(),
        child_pid: parse_pid(fields[4])?,
        kernel_thread: kthread != 0,
    })
}

fn parse_exec(time: Timestamp, body: &str) -> Option<TraceEvent> {
    // EXEC|569|S35vboxadd-serv|=|grep
    let fields: Vec<&str> = body.split('|').collect();
    if fields.len() < 5 {
        return None;
    }

    Some(TraceEvent::Exec {
        time,
        pid: parse_pid(fields[1])?,
        old_comm: fields[2].to_string(),
        new_comm: fields[4].trim_end().to_string(),
    })
}

fn parse_exit(time: Timestamp, body: &str) -> Option<TraceEvent> {
    // EXIT|568|lsmod
    let fields: Vec<&str> = body.split('|').collect();
    if fields.len() < 3 {
        return None;
    }

    Some(TraceEvent::Exit {
        time,
        pid: parse_pid(fields[1])?,
        comm: fields[2].trim_end().to_string(),
    })
}

/// Counters collected during one ingestion pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Lines read
    pub lines: usize,
    /// Events applied to the model
    pub events: usize,
    /// Lines dropped because they were not (well-formed) events
    pub skipped: usize,
    /// Well-formed events the model ignored (forks of pid 0)
    pub ignored: usize,
}

/// Feeds a trace into a [`TaskModel`]
pub struct TraceParser<'a> {
    model: &'a mut TaskModel,
}

impl<'a> TraceParser<'a> {
    pub fn new(model: &'a mut TaskModel) -> Self {
        Self { model }
    }

    /// Reset the model and apply every event in `trace`, in order.
    ///
    /// # Errors
    /// [`IngestError::Inconsistent`] on the first event that references a pid
    /// the model doesn't know. The model keeps everything applied before it.
    pub fn parse(&mut self, trace: &str) -> Result<IngestStats, IngestError> {
        self.model.reset();

        let mut stats = IngestStats::default();
        for (index, line) in trace.lines().enumerate() {
            stats.lines += 1;
            let line_no = index + 1;

            let event = match classify_line(line) {
                ParsedLine::Event(event) => event,
                ParsedLine::Other => {
                    debug!("Skipping non-event line {line_no}");
                    stats.skipped += 1;
                    continue;
                }
                ParsedLine::Malformed(kind) => {
                    warn!("Skipping malformed {kind} event at line {line_no}: {line}");
                    stats.skipped += 1;
                    continue;
                }
            };

            let applied = self
                .model
                .apply(&event)
                .map_err(|source| IngestError::Inconsistent { line: line_no, source })?;

            if applied.is_some() {
                stats.events += 1;
            } else {
                debug!("Ignored {} event at line {line_no}", event.kind());
                stats.ignored += 1;
            }
        }

        info!(
            "Ingested {} events from {} lines ({} skipped, {} ignored), {} tasks",
            stats.events,
            stats.lines,
            stats.skipped,
            stats.ignored,
            self.model.task_count()
        );
        Ok(stats)
    }

    /// Read `path` and [`parse`](Self::parse) its contents. Bytes that are not
    /// valid UTF-8 are replaced with U+FFFD instead of failing the whole file.
    ///
    /// # Errors
    /// [`IngestError::Io`] if the file can't be read, otherwise as `parse`.
    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> Result<IngestStats, IngestError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|source| IngestError::Io { path: path.to_path_buf(), source })?;
        self.parse(&String::from_utf8_lossy(&bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ModelError, TaskId};

    #[test]
    fn test_parse_fork_line() {
        let event = parse_line("[    1.000000] FORK|570|VBoxService|=>|571|0").unwrap();
        assert_eq!(
            event,
            TraceEvent::Fork {
                time: Timestamp(1_000_000),
                parent_pid: Pid(570),
                comm: "VBoxService".to_string(),
                child_pid: Pid(571),
                kernel_thread: false,
            }
        );
    }

    #[test]
    fn test_parse_kernel_thread_flag() {
        let event = parse_line("[0.5] FORK|2|kthreadd|=>|40|1").unwrap();
        assert!(matches!(event, TraceEvent::Fork { kernel_thread: true, .. }));
        assert_eq!(event.time(), Timestamp(500_000));
    }

    #[test]
    fn test_parse_exec_line() {
        let event = parse_line("[2.000000] EXEC|571|VBoxService|=|grep").unwrap();
        assert_eq!(
            event,
            TraceEvent::Exec {
                time: Timestamp(2_000_000),
                pid: Pid(571),
                old_comm: "VBoxService".to_string(),
                new_comm: "grep".to_string(),
            }
        );
        assert_eq!(event.kind(), EventKind::Exec);
    }

    #[test]
    fn test_parse_exit_line() {
        let event = parse_line("[3.000000] EXIT|571|grep").unwrap();
        assert_eq!(
            event,
            TraceEvent::Exit { time: Timestamp(3_000_000), pid: Pid(571), comm: "grep".to_string() }
        );
    }

    #[test]
    fn test_timestamp_is_truncated_to_micros() {
        let event = parse_line("[12.3456789] EXIT|1|init").unwrap();
        assert_eq!(event.time(), Timestamp(12_345_678));
    }

    #[test]
    fn test_skips_lines_without_timestamp() {
        assert_eq!(parse_line("FORK|570|VBoxService|=>|571|0"), None);
        assert_eq!(parse_line("[] FORK|570|VBoxService|=>|571|0"), None);
        assert_eq!(parse_line("[abc] FORK|570|VBoxService|=>|571|0"), None);
        assert_eq!(parse_line(""), None);
    }

    #[test]
    fn test_skips_unknown_bodies() {
        assert_eq!(parse_line("[    0.000000] Linux version 5.4.0"), None);
        assert_eq!(parse_line("[1.0] fork|570|x|=>|571|0"), None);
    }

    #[test]
    fn test_malformed_event_fields() {
        assert_eq!(classify_line("[1.0] FORK|570|x|=>"), ParsedLine::Malformed(EventKind::Fork));
        assert_eq!(classify_line("[1.0] EXEC|abc|x|=|y"), ParsedLine::Malformed(EventKind::Exec));
        assert_eq!(classify_line("[1.0] EXIT|7"), ParsedLine::Malformed(EventKind::Exit));
        assert_eq!(parse_line("[1.0] FORK|570|x|=>|571|yes"), None);
    }

    #[test]
    fn test_parser_counts_lines() {
        let trace = "\
[    0.000000] Booting
[    1.000000] FORK|0|idle|=>|570|0
[    1.000000] FORK|0|idle|=>|0|1
[    1.000000] FORK|570|broken
[    2.000000] EXIT|570|idle
";
        let mut model = TaskModel::new();
        let stats = TraceParser::new(&mut model).parse(trace).unwrap();

        assert_eq!(stats, IngestStats { lines: 5, events: 2, skipped: 2, ignored: 1 });
        assert_eq!(model.task_count(), 2);
    }

    #[test]
    fn test_parser_reports_line_of_inconsistency() {
        let trace = "\
[1.0] FORK|0|idle|=>|570|0
[2.0] EXEC|999|ghost|=|ls
";
        let mut model = TaskModel::new();
        let err = TraceParser::new(&mut model).parse(trace).unwrap_err();

        match err {
            IngestError::Inconsistent { line, source } => {
                assert_eq!(line, 2);
                assert_eq!(source, ModelError::UnknownPid { pid: Pid(999), event: EventKind::Exec });
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(model.task_count(), 2);
    }

    #[test]
    fn test_parser_resets_model_first() {
        let mut model = TaskModel::new();
        model.record_fork(Pid(1), Pid(0), "init", Timestamp(1), false).unwrap();

        TraceParser::new(&mut model).parse("[1.0] FORK|0|idle|=>|42|0").unwrap();

        assert_eq!(model.task_count(), 2);
        assert_eq!(model.task(TaskId(1)).unwrap().pid(), Pid(42));
        assert!(model.pid_history(Pid(1)).is_empty());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut model = TaskModel::new();
        let err = TraceParser::new(&mut model).parse_file("/nonexistent/trace.log").unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/trace.log"));
    }

    #[test]
    fn test_invalid_utf8_line_does_not_abort_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[1.0] FORK|0|idle|=>|570|0\n").unwrap();
        file.write_all(b"[1.5] usb 1-1: product \xff\xfe\n").unwrap();
        file.write_all(b"[2.0] EXIT|570|idle\n").unwrap();
        file.flush().unwrap();

        let mut model = TaskModel::new();
        let stats = TraceParser::new(&mut model).parse_file(file.path()).unwrap();

        assert_eq!(stats.lines, 3);
        assert_eq!(stats.events, 2);
        assert_eq!(stats.skipped, 1);
        let task = model.task(TaskId(1)).unwrap();
        assert_eq!(task.pid(), Pid(570));
        assert_eq!(task.stop_time(), Some(Timestamp(2_000_000)));
    }
}
