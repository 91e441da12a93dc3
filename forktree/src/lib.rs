//! # forktree - Process Trees from Kernel Fork/Exec/Exit Traces
//!
//! forktree rebuilds the process lifecycle tree of a system from a sequential
//! trace of fork, exec and exit events (for example a boot-time `dmesg` log
//! produced by an instrumented kernel) and renders it as an indented text
//! diagram.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Kernel trace (text)                        │
//! │   [1.000000] FORK|570|VBoxService|=>|571|0                      │
//! │   [2.000000] EXEC|571|VBoxService|=|grep                        │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ lines, in file order
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    forktree (This Crate)                        │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │  TraceParser │──▶│  TaskModel   │──▶│ TextLayouter │         │
//! │  │ (trace_data) │   │   (model)    │   │   (layout)   │         │
//! │  └──────────────┘   └──────┬───────┘   └──────────────┘         │
//! │                            │                                    │
//! │                            ▼                                    │
//! │                    ┌──────────────┐                             │
//! │                    │    Export    │                             │
//! │                    │  (timeline)  │                             │
//! │                    └──────────────┘                             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Data flows one way. Only the parser mutates the model; the layouter and
//! the exporter are read-only and run after ingestion has finished.
//!
//! ## Module Structure
//!
//! - [`trace_data`]: line parsing into [`trace_data::TraceEvent`]s and the
//!   ingestion pass that feeds them to the model
//! - [`model`]: append-only task store with a pid-reuse-aware history index
//! - [`task`]: the task record (one per fork or exec)
//! - [`layout`]: iterative depth-first text rendering of the tree
//! - [`export`]: Chrome Trace Event Format timeline (Perfetto, `chrome://tracing`)
//! - [`cli`]: command-line argument parsing
//! - [`domain`]: newtypes (`Pid`, `TaskId`, `Timestamp`) and error types
//!
//! ## Typical Usage
//!
//! ```
//! use forktree::layout::TextLayouter;
//! use forktree::model::TaskModel;
//! use forktree::trace_data::TraceParser;
//!
//! # fn example() -> Result<(), forktree::domain::IngestError> {
//! let trace = "\
//! [1.000000] FORK|0|idle|=>|570|0
//! [1.000000] FORK|570|VBoxService|=>|571|0
//! [2.000000] EXEC|571|VBoxService|=|grep
//! [3.000000] EXIT|571|grep
//! ";
//!
//! let mut model = TaskModel::new();
//! TraceParser::new(&mut model).parse(trace)?;
//!
//! let text = TextLayouter::new(&model).layout();
//! assert!(text.contains("[571] VBoxService -> [571] grep"));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Key Concepts
//!
//! - **Task**: one tenure of a program image. A fork creates a task, and so
//!   does every exec, so one OS process can span several tasks.
//! - **Exec chain**: the tasks of one process linked through
//!   `pre_exec_id`/`post_exec_id`.
//! - **PID reuse**: the kernel recycles pids; the model keeps every task that
//!   ever held a pid and resolves events to the most recent one.

pub mod cli;
pub mod domain;
pub mod export;
pub mod layout;
pub mod model;
pub mod task;
pub mod trace_data;
