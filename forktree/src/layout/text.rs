//! Text tree layout
//!
//! Renders the whole task forest under the idle root as an indented text
//! diagram. Each line introduces one forked child; the child's exec chain is
//! flattened onto the same line.
//!
//! ```text
//! [0] idle(living)
//!  \_ [1] init(living)
//!  |   \_ [12] sh -> [12] modprobe
//!  |   \_ [13] sh(living)
//!  \_ [2] kthreadd(living)
//! ```
//!
//! The walk is an explicit depth-first traversal over a stack of cursors, one
//! per ancestor that still has children left to draw. Columns come from the
//! length of the line already emitted, so nested branches always sit under
//! the task that introduced them.

use log::debug;

use crate::domain::TaskId;
use crate::model::TaskModel;

/// Marker introducing a forked child
pub const FORK_PREFIX: &str = " \\_ ";
/// Marker between consecutive images of one process
pub const EXEC_PREFIX: &str = " -> ";
/// Guide line for an ancestor with more children below
pub const PROCESSING_PREFIX: &str = " |  ";

/// Traversal state for one ancestor on the current path
#[derive(Debug, Clone, Copy)]
struct LayoutCursor {
    id: TaskId,
    /// Column where this task's children are drawn
    column: usize,
    next_child: usize,
}

impl LayoutCursor {
    fn new(id: TaskId, column: usize) -> Self {
        Self { id, column, next_child: 0 }
    }
}

/// Read-only text renderer over a fully ingested [`TaskModel`]
pub struct TextLayouter<'a> {
    model: &'a TaskModel,
}

impl<'a> TextLayouter<'a> {
    #[must_use]
    pub fn new(model: &'a TaskModel) -> Self {
        Self { model }
    }

    /// Lazily render one line at a time, root line first
    #[must_use]
    pub fn lines(&self) -> TreeLines<'a> {
        TreeLines { model: self.model, frontier: Vec::new(), started: false }
    }

    /// Render the whole tree, every line terminated by `\n`
    #[must_use]
    pub fn layout(&self) -> String {
        let mut result = String::new();
        for line in self.lines() {
            result.push_str(&line);
            result.push('\n');
        }
        result
    }
}

/// Iterator over rendered tree lines. Finite and not restartable; call
/// [`TextLayouter::lines`] again for a fresh walk.
pub struct TreeLines<'a> {
    model: &'a TaskModel,
    frontier: Vec<LayoutCursor>,
    started: bool,
}

impl TreeLines<'_> {
    fn root_line(&mut self) -> String {
        let root = self.model.root_task();
        if root.children_count() > 0 {
            self.frontier.push(LayoutCursor::new(root.id(), 0));
        } else {
            debug!("task tree holds only the idle task");
        }
        root.description()
    }

    fn branch_line(&mut self) -> Option<String> {
        let model = self.model;
        let (last, ancestors) = self.frontier.split_last_mut()?;

        let mut line = String::new();
        for cursor in ancestors.iter() {
            pad_to(&mut line, cursor.column);
            line.push_str(PROCESSING_PREFIX);
        }
        pad_to(&mut line, last.column);
        line.push_str(FORK_PREFIX);

        let parent = model.task(last.id).ok()?;
        let child = *parent.children_id().get(last.next_child)?;
        last.next_child += 1;
        if last.next_child >= parent.children_count() {
            self.frontier.pop();
        }

        let mut current = Some(child);
        while let Some(id) = current {
            let task = model.task(id).ok()?;
            if task.children_count() > 0 {
                self.frontier.push(LayoutCursor::new(id, line.chars().count()));
            }
            line.push_str(&task.description());

            current = task.post_exec_id();
            if current.is_some() {
                line.push_str(EXEC_PREFIX);
            }
        }

        Some(line)
    }
}

impl Iterator for TreeLines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if !self.started {
            self.started = true;
            return Some(self.root_line());
        }
        self.branch_line()
    }
}

/// Columns count chars, so multibyte names stay aligned
fn pad_to(line: &mut String, column: usize) {
    let width = line.chars().count();
    if column > width {
        line.extend(std::iter::repeat(' ').take(column - width));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Pid, Timestamp};

    fn ts(micros: i64) -> Timestamp {
        Timestamp(micros)
    }

    #[test]
    fn test_idle_only_model() {
        let model = TaskModel::new();
        assert_eq!(TextLayouter::new(&model).layout(), "[0] idle(living)\n");
    }

    #[test]
    fn test_single_chain_with_exec() {
        let mut model = TaskModel::new();
        model.record_fork(Pid(570), Pid(0), "idle", ts(1_000_000), false).unwrap();
        model.record_fork(Pid(571), Pid(570), "VBoxService", ts(1_000_000), false).unwrap();
        model.record_exec(Pid(571), "grep", ts(2_000_000)).unwrap();
        model.record_exit(Pid(571), ts(3_000_000)).unwrap();

        let expected = "\
[0] idle(living)
 \\_ [570] idle(living)
     \\_ [571] VBoxService -> [571] grep
";
        assert_eq!(TextLayouter::new(&model).layout(), expected);
    }

    #[test]
    fn test_continuation_guides_for_unfinished_ancestors() {
        let mut model = TaskModel::new();
        model.record_fork(Pid(1), Pid(0), "init", ts(1), false).unwrap();
        model.record_fork(Pid(12), Pid(1), "sh", ts(2), false).unwrap();
        model.record_exec(Pid(12), "modprobe", ts(3)).unwrap();
        model.record_exit(Pid(12), ts(4)).unwrap();
        model.record_fork(Pid(13), Pid(1), "sh", ts(5), false).unwrap();
        model.record_fork(Pid(2), Pid(0), "kthreadd", ts(6), true).unwrap();

        let expected = "\
[0] idle(living)
 \\_ [1] init(living)
 |   \\_ [12] sh -> [12] modprobe
 |   \\_ [13] sh(living)
 \\_ [2] kthreadd(living)
";
        assert_eq!(TextLayouter::new(&model).layout(), expected);
    }

    #[test]
    fn test_children_of_exec_successor_indent_under_it() {
        let mut model = TaskModel::new();
        model.record_fork(Pid(5), Pid(0), "sh", ts(1), false).unwrap();
        model.record_exec(Pid(5), "make", ts(2)).unwrap();
        model.record_fork(Pid(6), Pid(5), "make", ts(3), false).unwrap();

        let expected = format!(
            "[0] idle(living)\n \\_ [5] sh -> [5] make(living)\n{}\\_ [6] make(living)\n",
            " ".repeat(15)
        );
        assert_eq!(TextLayouter::new(&model).layout(), expected);
    }

    #[test]
    fn test_lines_iterator_matches_layout() {
        let mut model = TaskModel::new();
        model.record_fork(Pid(1), Pid(0), "init", ts(1), false).unwrap();
        model.record_fork(Pid(2), Pid(0), "kthreadd", ts(2), true).unwrap();

        let layouter = TextLayouter::new(&model);
        let lines: Vec<String> = layouter.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines.join("\n") + "\n", layouter.layout());
    }

    #[test]
    fn test_layout_is_repeatable() {
        let mut model = TaskModel::new();
        model.record_fork(Pid(1), Pid(0), "init", ts(1), false).unwrap();
        model.record_fork(Pid(3), Pid(1), "init", ts(2), false).unwrap();

        let layouter = TextLayouter::new(&model);
        assert_eq!(layouter.layout(), layouter.layout());
    }

    #[test]
    fn test_multibyte_comm_keeps_alignment() {
        let mut model = TaskModel::new();
        model.record_fork(Pid(5), Pid(0), "é", ts(1), false).unwrap();
        model.record_exec(Pid(5), "café", ts(2)).unwrap();
        model.record_fork(Pid(6), Pid(5), "café", ts(3), false).unwrap();

        let lines: Vec<String> = TextLayouter::new(&model).lines().collect();
        assert_eq!(lines[1], " \\_ [5] é -> [5] café(living)");
        assert_eq!(lines[2], format!("{}\\_ [6] café(living)", " ".repeat(13)));
    }
}
