//! Structured error types for forktree
//!
//! Using thiserror for automatic Display implementation and error chaining.

use super::types::{Pid, TaskId};
use std::path::PathBuf;
use thiserror::Error;

/// Kind of trace event, carried in errors for diagnosis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Fork,
    Exec,
    Exit,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EventKind::Fork => "FORK",
            EventKind::Exec => "EXEC",
            EventKind::Exit => "EXIT",
        };
        f.write_str(name)
    }
}

/// The trace contradicts the process tree built so far
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("{event} references {pid}, which no earlier FORK or EXEC established")]
    UnknownPid { pid: Pid, event: EventKind },

    #[error("{id} is out of range (model holds {count} tasks)")]
    TaskOutOfRange { id: TaskId, count: usize },
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to read trace file {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Inconsistent trace at line {line}: {source}")]
    Inconsistent {
        line: usize,
        #[source]
        source: ModelError,
    },
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_pid_display() {
        let err = ModelError::UnknownPid { pid: Pid(571), event: EventKind::Exec };
        assert_eq!(
            err.to_string(),
            "EXEC references PID:571, which no earlier FORK or EXEC established"
        );
    }

    #[test]
    fn test_inconsistent_carries_line() {
        let err = IngestError::Inconsistent {
            line: 42,
            source: ModelError::UnknownPid { pid: Pid(9), event: EventKind::Exit },
        };
        let msg = err.to_string();
        assert!(msg.contains("line 42"));
        assert!(msg.contains("EXIT"));
        assert!(msg.contains("PID:9"));
    }

    #[test]
    fn test_task_out_of_range_display() {
        let err = ModelError::TaskOutOfRange { id: TaskId(7), count: 3 };
        assert_eq!(err.to_string(), "Task#7 is out of range (model holds 3 tasks)");
    }
}
