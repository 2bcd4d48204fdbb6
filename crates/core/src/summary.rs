//! Completion summary for the pie chart

use serde::Serialize;

use crate::task::Task;

/// Completed and pending counts over a task list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub completed: usize,
    pub pending: usize,
}

/// One slice of the completion chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSlice {
    pub label: &'static str,
    pub value: usize,
    pub color: &'static str,
}

impl Summary {
    pub fn of(tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|t| t.completed).count();
        Self {
            completed,
            pending: tasks.len() - completed,
        }
    }

    pub fn total(&self) -> usize {
        self.completed + self.pending
    }

    /// Chart data in display order: completed first, then pending
    pub fn slices(&self) -> [ChartSlice; 2] {
        [
            ChartSlice {
                label: "Completed",
                value: self.completed,
                color: "#4CAF50",
            },
            ChartSlice {
                label: "Pending",
                value: self.pending,
                color: "#FF5733",
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_summary() {
        let summary = Summary::of(&[]);
        assert_eq!(summary, Summary::default());
        assert_eq!(summary.total(), 0);
    }

    #[test]
    fn test_counts_add_up() {
        let tasks = vec![
            Task::new("1", "a").completed(),
            Task::new("2", "b"),
            Task::new("3", "c"),
        ];
        let summary = Summary::of(&tasks);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.pending, 2);
        assert_eq!(summary.total(), tasks.len());
    }

    #[test]
    fn test_slices() {
        let summary = Summary {
            completed: 3,
            pending: 1,
        };
        let [done, open] = summary.slices();
        assert_eq!((done.label, done.value, done.color), ("Completed", 3, "#4CAF50"));
        assert_eq!((open.label, open.value, open.color), ("Pending", 1, "#FF5733"));
    }
}
