//! Plain-text rendering of a dashboard snapshot

use std::fmt::Write;

use taskdash_core::controller::{Outcome, ViewState};
use taskdash_core::dashboard::Snapshot;
use taskdash_core::summary::Summary;

const BAR_WIDTH: usize = 20;

pub fn render(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    let Some(name) = &snapshot.display_name else {
        out.push_str("Not signed in. Use 'login <email> [password]'.");
        return out;
    };

    let _ = writeln!(out, "Task Manager");
    let _ = writeln!(out, "Welcome back, {}!", name);
    if let Some(cursor) = &snapshot.edit_cursor {
        let position = snapshot
            .tasks
            .iter()
            .position(|t| &t.id == cursor)
            .map(|i| (i + 1).to_string())
            .unwrap_or_else(|| "?".to_string());
        let _ = writeln!(out, "Editing task {}: {}", position, snapshot.input);
    }
    out.push('\n');

    match snapshot.view {
        ViewState::Loading => out.push_str("Loading tasks...\n"),
        ViewState::Empty => out.push_str("No tasks added yet.\n"),
        ViewState::Populated => {
            for (i, task) in snapshot.tasks.iter().enumerate() {
                if task.completed {
                    let _ = writeln!(out, "{:>3}. [x] ~{}~", i + 1, task.text);
                } else {
                    let _ = writeln!(out, "{:>3}. [ ] {}", i + 1, task.text);
                }
            }
        }
    }
    out.push('\n');
    out.push_str(&chart(&snapshot.summary));
    out
}

/// Text stand-in for the completion pie chart
pub fn chart(summary: &Summary) -> String {
    let total = summary.total();
    let mut out = String::new();
    for slice in summary.slices() {
        let filled = if total == 0 {
            0
        } else {
            (slice.value * BAR_WIDTH + total / 2) / total
        };
        let percent = if total == 0 {
            0
        } else {
            (slice.value * 100 + total / 2) / total
        };
        let _ = writeln!(
            out,
            "{:<10} {}{} {} ({}%)",
            slice.label,
            "#".repeat(filled),
            ".".repeat(BAR_WIDTH - filled),
            slice.value,
            percent
        );
    }
    out
}

/// Short feedback line for an action outcome
pub fn outcome_message(outcome: Outcome) -> Option<String> {
    match outcome {
        Outcome::Applied | Outcome::Ignored => None,
        Outcome::Failed => Some("That didn't work, see the log and try again.".to_string()),
        Outcome::Busy => Some("Still working on the previous action.".to_string()),
    }
}
