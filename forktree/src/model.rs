//! # Process Tree Model
//!
//! Append-only store of [`Task`] records plus a pid → history index.
//!
//! ## PID reuse
//!
//! The kernel recycles PIDs, so a PID alone can't name a task. Every PID maps
//! to the ordered list of task ids that have held it, most recent last:
//!
//! ```text
//! pid 571 → [2, 3, 9]
//!            │  │  └── forked again after 571 exited (live)
//!            │  └───── exec'd `grep`
//!            └──────── first fork
//! ```
//!
//! Any event naming pid 571 resolves to the last entry. Exited tasks stay in
//! the list so the whole history remains available.
//!
//! ## Links
//!
//! Parent, child and exec-chain links are [`TaskId`] indices into the task
//! store, never references. Forks always point to older tasks and exec chains
//! only move forward in id order, so the graph is acyclic by construction.

use log::debug;
use std::collections::HashMap;

use crate::domain::{EventKind, ModelError, Pid, TaskId, Timestamp};
use crate::task::{Task, TaskKind};
use crate::trace_data::TraceEvent;

const IDLE_COMM: &str = "idle";

/// Process tree reconstructed from fork/exec/exit events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskModel {
    /// `tasks[i].id() == TaskId(i)` for every task
    tasks: Vec<Task>,
    pid_history: HashMap<Pid, Vec<TaskId>>,
}

impl Default for TaskModel {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskModel {
    /// Create a model holding only the idle root
    #[must_use]
    pub fn new() -> Self {
        let mut model = Self { tasks: Vec::new(), pid_history: HashMap::new() };
        model.add_idle_task();
        model
    }

    /// Drop every task and all pid history, then recreate the idle root.
    pub fn reset(&mut self) {
        self.tasks.clear();
        self.pid_history.clear();
        self.add_idle_task();
    }

    /// Record `parent_pid` forking `child_pid`.
    ///
    /// Returns `Ok(None)` when `child_pid` is 0: the idle root can't be
    /// recreated by a fork, so the event is ignored.
    ///
    /// # Errors
    /// [`ModelError::UnknownPid`] if `parent_pid` was never established.
    pub fn record_fork(
        &mut self,
        child_pid: Pid,
        parent_pid: Pid,
        comm: &str,
        time: Timestamp,
        kernel_thread: bool,
    ) -> Result<Option<TaskId>, ModelError> {
        if child_pid == Pid::IDLE {
            debug!("ignoring fork of idle task: parent={parent_pid} comm={comm} time={time}");
            return Ok(None);
        }

        let parent_id = self.live_id(parent_pid, EventKind::Fork)?;
        let id = self.next_id();

        let mut task = Task::new(TaskKind::Fork, id, child_pid, comm, time, kernel_thread);
        task.set_parent_id(parent_id);
        self.tasks.push(task);
        self.tasks[parent_id.index()].add_child(id);
        self.pid_history.entry(child_pid).or_default().push(id);

        Ok(Some(id))
    }

    /// Record `pid` replacing its program image with `comm`.
    ///
    /// The previous live task for `pid` stops at `time` and links forward to
    /// the new record.
    ///
    /// # Errors
    /// [`ModelError::UnknownPid`] if `pid` was never established.
    pub fn record_exec(
        &mut self,
        pid: Pid,
        comm: &str,
        time: Timestamp,
    ) -> Result<TaskId, ModelError> {
        let pre_exec_id = self.live_id(pid, EventKind::Exec)?;
        let id = self.next_id();

        let mut task = Task::new(TaskKind::Exec, id, pid, comm, time, false);
        task.set_pre_exec_id(pre_exec_id);
        self.tasks.push(task);
        self.pid_history.entry(pid).or_default().push(id);

        let previous = &mut self.tasks[pre_exec_id.index()];
        previous.set_post_exec_id(id);
        previous.set_stop_time(time);

        Ok(id)
    }

    /// Record `pid` exiting. The pid stays in the history index so later
    /// forks can reuse it without losing this record.
    ///
    /// # Errors
    /// [`ModelError::UnknownPid`] if `pid` was never established.
    pub fn record_exit(&mut self, pid: Pid, time: Timestamp) -> Result<TaskId, ModelError> {
        let id = self.live_id(pid, EventKind::Exit)?;
        self.tasks[id.index()].set_stop_time(time);
        Ok(id)
    }

    /// Apply one parsed trace event.
    ///
    /// Returns the task created or updated, `None` for an ignored fork.
    ///
    /// # Errors
    /// Propagates [`ModelError`] from the matching `record_*` call.
    pub fn apply(&mut self, event: &TraceEvent) -> Result<Option<TaskId>, ModelError> {
        match event {
            TraceEvent::Fork { time, parent_pid, comm, child_pid, kernel_thread } => {
                self.record_fork(*child_pid, *parent_pid, comm, *time, *kernel_thread)
            }
            TraceEvent::Exec { time, pid, new_comm, .. } => {
                self.record_exec(*pid, new_comm, *time).map(Some)
            }
            TraceEvent::Exit { time, pid, .. } => self.record_exit(*pid, *time).map(Some),
        }
    }

    /// # Errors
    /// [`ModelError::TaskOutOfRange`] if `id` is not below [`Self::task_count`].
    pub fn task(&self, id: TaskId) -> Result<&Task, ModelError> {
        self.tasks
            .get(id.index())
            .ok_or(ModelError::TaskOutOfRange { id, count: self.tasks.len() })
    }

    /// The idle root, always id 0
    #[must_use]
    pub fn root_task(&self) -> &Task {
        &self.tasks[TaskId::ROOT.index()]
    }

    #[must_use]
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// All tasks in id order
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Task currently representing `pid`, if any fork or exec established it
    #[must_use]
    pub fn live_task(&self, pid: Pid) -> Option<&Task> {
        self.pid_history
            .get(&pid)
            .and_then(|ids| ids.last())
            .map(|id| &self.tasks[id.index()])
    }

    /// Every task that has held `pid`, oldest first
    #[must_use]
    pub fn pid_history(&self, pid: Pid) -> &[TaskId] {
        self.pid_history.get(&pid).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Latest known stop time across all tasks, 0 when nothing has stopped
    #[must_use]
    pub fn max_stop_time(&self) -> Timestamp {
        self.tasks.iter().filter_map(Task::stop_time).max().unwrap_or_default()
    }

    /// One [`Task::dump`] line per task, in id order
    #[must_use]
    pub fn dump(&self) -> String {
        self.tasks.iter().map(|task| task.dump() + "\n").collect()
    }

    fn next_id(&self) -> TaskId {
        TaskId(self.tasks.len())
    }

    fn live_id(&self, pid: Pid, event: EventKind) -> Result<TaskId, ModelError> {
        self.pid_history
            .get(&pid)
            .and_then(|ids| ids.last().copied())
            .ok_or(ModelError::UnknownPid { pid, event })
    }

    fn add_idle_task(&mut self) {
        let id = self.next_id();
        self.tasks.push(Task::new(TaskKind::Idle, id, Pid::IDLE, IDLE_COMM, Timestamp(0), false));
        self.pid_history.entry(Pid::IDLE).or_default().push(id);
    }
}
