//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers keep a kernel PID from being passed where a task
//! id is expected. PIDs get recycled by the kernel, task ids never do.

// Microsecond timestamps are converted to f64 seconds for display only
#![allow(clippy::cast_precision_loss)]

use std::fmt;

/// Process ID
///
/// The kernel's PID as it appears in the trace. Not unique over the
/// lifetime of a trace: the same value can belong to several tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pid(pub i32);

impl Pid {
    /// PID of the synthetic idle root
    pub const IDLE: Pid = Pid(0);
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PID:{}", self.0)
    }
}

impl From<i32> for Pid {
    fn from(pid: i32) -> Self {
        Pid(pid)
    }
}

impl From<Pid> for i32 {
    fn from(pid: Pid) -> Self {
        pid.0
    }
}

/// Task ID
///
/// Index of a task record in the model's task store. Assigned densely from 0
/// (the idle root) in creation order and stable for the model's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub usize);

impl TaskId {
    /// ID of the synthetic idle root
    pub const ROOT: TaskId = TaskId(0);

    /// Position in the task store
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task#{}", self.0)
    }
}

/// Timestamp in microseconds since boot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Build from the floating point seconds printed in a trace line.
    /// Sub-microsecond digits are truncated.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_seconds(seconds: f64) -> Self {
        Timestamp((seconds * 1_000_000.0) as i64)
    }

    /// Convert to seconds (f64)
    #[must_use]
    pub fn as_seconds(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    /// Raw microsecond value
    #[must_use]
    pub fn as_micros(self) -> i64 {
        self.0
    }

    /// Time elapsed from `earlier` to `self`
    #[must_use]
    pub fn since(self, earlier: Timestamp) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}s", self.as_seconds())
    }
}

/// Duration in microseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Duration(pub i64);

impl Duration {
    /// Convert to milliseconds (f64)
    #[must_use]
    pub fn as_millis(self) -> f64 {
        self.0 as f64 / 1_000.0
    }

    /// Convert to seconds (f64)
    #[must_use]
    pub fn as_seconds(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    /// Raw microsecond value
    #[must_use]
    pub fn as_micros(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.as_millis();
        if ms >= 1000.0 {
            write!(f, "{:.2}s", self.as_seconds())
        } else {
            write!(f, "{ms:.2}ms")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_conversion() {
        let pid = Pid::from(571);
        assert_eq!(pid.0, 571);
        let back: i32 = pid.into();
        assert_eq!(back, 571);
        assert_eq!(pid.to_string(), "PID:571");
    }

    #[test]
    fn test_task_id_display() {
        assert_eq!(TaskId(3).to_string(), "Task#3");
        assert_eq!(TaskId::ROOT.index(), 0);
    }

    #[test]
    fn test_timestamp_from_seconds_truncates() {
        assert_eq!(Timestamp::from_seconds(1.0), Timestamp(1_000_000));
        assert_eq!(Timestamp::from_seconds(0.000_001_9), Timestamp(1));
        assert_eq!(Timestamp::from_seconds(2.5).as_micros(), 2_500_000);
    }

    #[test]
    fn test_timestamp_since() {
        let start = Timestamp(2_000_000);
        let stop = Timestamp(3_500_000);
        assert_eq!(stop.since(start), Duration(1_500_000));
    }

    #[test]
    fn test_since_saturates_on_extreme_timestamps() {
        let start = Timestamp::from_seconds(-1e300);
        assert_eq!(start, Timestamp(i64::MIN));
        assert_eq!(Timestamp(i64::MAX).since(start), Duration(i64::MAX));
    }

    #[test]
    fn test_duration_display() {
        assert_eq!(Duration(5_000).to_string(), "5.00ms");
        assert_eq!(Duration(1_500_000).to_string(), "1.50s");
    }
}
