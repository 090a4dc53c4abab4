use std::path::{Path, PathBuf};

use anyhow::Error;
use directories::BaseDirs;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};

use crate::models::LeaseStatus;

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

/// Row color for an apartment based on how close its lease end is.
pub(crate) fn lease_style(status: LeaseStatus) -> Style {
    match status {
        LeaseStatus::Active => Style::default(),
        LeaseStatus::EndingSoon => Style::default().fg(Color::Yellow),
        LeaseStatus::Expired => Style::default().fg(Color::Red),
        LeaseStatus::Unknown => Style::default().add_modifier(Modifier::DIM),
    }
}

/// Expand a leading `~/` to the user's home directory.
pub(crate) fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(base_dirs) = BaseDirs::new() {
            return base_dirs.home_dir().join(rest);
        }
    }
    PathBuf::from(raw)
}

/// File name shown in the attachment list.
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Context};

    #[test]
    fn surface_error_prefers_the_root_cause() {
        let err: Error = Err::<(), _>(anyhow!("Building not found."))
            .context("failed to insert apartment")
            .unwrap_err();
        assert_eq!(surface_error(&err), "Building not found.");
    }

    #[test]
    fn expand_home_leaves_other_paths_alone() {
        assert_eq!(expand_home("/tmp/a.pdf"), PathBuf::from("/tmp/a.pdf"));
        assert_eq!(expand_home("notes/~/a"), PathBuf::from("notes/~/a"));
        if let Some(base_dirs) = BaseDirs::new() {
            assert_eq!(expand_home("~/a.pdf"), base_dirs.home_dir().join("a.pdf"));
        }
    }

    #[test]
    fn display_name_uses_the_file_name() {
        assert_eq!(display_name(Path::new("/tmp/docs/lease.pdf")), "lease.pdf");
    }
}
