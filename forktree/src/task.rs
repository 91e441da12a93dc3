//! Task records
//!
//! One `Task` is created per fork or exec seen in the trace. Records are
//! immutable after creation except for the fields that can only be known
//! later: stop time, the exec successor and the list of forked children.

use crate::domain::{Duration, Pid, TaskId, Timestamp};

/// How a task record came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Synthetic root, id 0, pid 0. Exists exactly once per model.
    Idle,
    /// Created by a fork. Inherits its program image from the parent.
    Fork,
    /// Created by an exec. Continues the same process with a new image.
    Exec,
}

impl TaskKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::Idle => "idle",
            TaskKind::Fork => "fork",
            TaskKind::Exec => "exec",
        }
    }
}

/// A single process image tenure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    kind: TaskKind,
    id: TaskId,
    pid: Pid,
    comm: String,
    start_time: Timestamp,
    /// `None` while the task is living or its end was not observed
    stop_time: Option<Timestamp>,
    /// Task whose fork created this one. This is a task id, not a pid.
    parent_id: Option<TaskId>,
    pre_exec_id: Option<TaskId>,
    post_exec_id: Option<TaskId>,
    children_id: Vec<TaskId>,
    kernel_thread: bool,
}

impl Task {
    pub(crate) fn new(
        kind: TaskKind,
        id: TaskId,
        pid: Pid,
        comm: impl Into<String>,
        start_time: Timestamp,
        kernel_thread: bool,
    ) -> Self {
        Self {
            kind,
            id,
            pid,
            comm: comm.into(),
            start_time,
            stop_time: None,
            parent_id: None,
            pre_exec_id: None,
            post_exec_id: None,
            children_id: Vec::new(),
            kernel_thread,
        }
    }

    #[must_use]
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    #[must_use]
    pub fn id(&self) -> TaskId {
        self.id
    }

    #[must_use]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    #[must_use]
    pub fn comm(&self) -> &str {
        &self.comm
    }

    #[must_use]
    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    #[must_use]
    pub fn stop_time(&self) -> Option<Timestamp> {
        self.stop_time
    }

    #[must_use]
    pub fn parent_id(&self) -> Option<TaskId> {
        self.parent_id
    }

    #[must_use]
    pub fn pre_exec_id(&self) -> Option<TaskId> {
        self.pre_exec_id
    }

    #[must_use]
    pub fn post_exec_id(&self) -> Option<TaskId> {
        self.post_exec_id
    }

    /// Tasks forked directly from this one, in creation order
    #[must_use]
    pub fn children_id(&self) -> &[TaskId] {
        &self.children_id
    }

    #[must_use]
    pub fn children_count(&self) -> usize {
        self.children_id.len()
    }

    #[must_use]
    pub fn is_kernel_thread(&self) -> bool {
        self.kernel_thread
    }

    /// `None` when the stop time is unknown
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        self.stop_time.map(|stop| stop.since(self.start_time))
    }

    #[must_use]
    pub fn is_living(&self) -> bool {
        self.stop_time.is_none()
    }

    pub(crate) fn set_stop_time(&mut self, stop_time: Timestamp) {
        self.stop_time = Some(stop_time);
    }

    pub(crate) fn set_parent_id(&mut self, parent_id: TaskId) {
        self.parent_id = Some(parent_id);
    }

    pub(crate) fn set_pre_exec_id(&mut self, pre_exec_id: TaskId) {
        self.pre_exec_id = Some(pre_exec_id);
    }

    pub(crate) fn set_post_exec_id(&mut self, post_exec_id: TaskId) {
        self.post_exec_id = Some(post_exec_id);
    }

    pub(crate) fn add_child(&mut self, id: TaskId) {
        self.children_id.push(id);
    }

    /// Short label used by the tree layout: `[pid] comm`, with a `(living)`
    /// suffix when the task has no known end.
    #[must_use]
    pub fn description(&self) -> String {
        let mut result = format!("[{}] {}", self.pid.0, self.comm);
        if self.is_living() {
            result.push_str("(living)");
        }
        result
    }

    /// Full record on one line. Absent links and stop times print as `-1`.
    #[must_use]
    pub fn dump(&self) -> String {
        fn id_or_none(id: Option<TaskId>) -> String {
            id.map_or_else(|| "-1".to_string(), |id| id.0.to_string())
        }

        let children =
            self.children_id.iter().map(|id| id.0.to_string()).collect::<Vec<_>>().join(", ");

        format!(
            "type: {}, id: {}, pid: {}, comm: {}, startTime: {}, stopTime: {}, \
             parentId: {}, preExecId: {}, postExecId: {}, children: ({children})",
            self.kind.as_str(),
            self.id.0,
            self.pid.0,
            self.comm,
            self.start_time.0,
            self.stop_time.map_or(-1, Timestamp::as_micros),
            id_or_none(self.parent_id),
            id_or_none(self.pre_exec_id),
            id_or_none(self.post_exec_id),
        )
    }
}
