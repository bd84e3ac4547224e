use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone, Utc};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::models::Postmortem;

const NO_ACTION_ITEMS: &str = "No action items.";

/// Render a postmortem as a markdown document, timestamps in local time
pub fn render_markdown(postmortem: &Postmortem) -> String {
    render_markdown_in(postmortem, &Local)
}

/// Render a postmortem as markdown with timestamps shown in `tz`
pub fn render_markdown_in<Tz>(postmortem: &Postmortem, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let generated = postmortem
        .created_at
        .with_timezone(tz)
        .format("%Y-%m-%d %H:%M:%S");

    let mut doc = String::new();
    let _ = writeln!(doc, "# Incident Postmortem\n");
    let _ = writeln!(doc, "**Generated**: {generated}");
    let _ = writeln!(doc, "**Postmortem ID**: {}", postmortem.id);
    if let Some(incident_id) = &postmortem.incident_id {
        let _ = writeln!(doc, "**Incident ID**: {incident_id}");
    }
    let _ = writeln!(doc, "\n---\n");

    section(&mut doc, "Summary", &postmortem.summary);
    section(&mut doc, "Timeline", &postmortem.timeline);
    section(&mut doc, "Root Cause", &postmortem.root_cause);
    section(&mut doc, "Impact", &postmortem.impact);
    section(&mut doc, "Action Items", &action_items(&postmortem.action_items));
    section(&mut doc, "Prevention", &postmortem.prevention);

    doc
}

fn section(doc: &mut String, heading: &str, body: &str) {
    let _ = writeln!(doc, "## {heading}\n\n{}\n", body.trim_end());
}

fn action_items(items: &[String]) -> String {
    if items.is_empty() {
        return NO_ACTION_ITEMS.to_string();
    }
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// File name of an exported postmortem: `postmortem-{id}-{unix_millis}.md`
pub fn export_filename(postmortem_id: &str, at: DateTime<Utc>) -> String {
    format!("postmortem-{}-{}.md", postmortem_id, at.timestamp_millis())
}

/// Write the markdown document into `target`.
///
/// A directory target gets a generated file name; any other path is used
/// as the file itself.
pub fn export(postmortem: &Postmortem, target: &Path) -> Result<PathBuf> {
    let path = if target.is_dir() {
        target.join(export_filename(&postmortem.id, Utc::now()))
    } else {
        target.to_path_buf()
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    std::fs::write(&path, render_markdown(postmortem))
        .with_context(|| format!("Failed to write postmortem to {}", path.display()))?;

    info!(postmortem_id = %postmortem.id, path = %path.display(), "postmortem exported");
    Ok(path)
}

/// First line of the summary, cut to `max_chars` for list views
pub fn summary_preview(postmortem: &Postmortem, max_chars: usize) -> String {
    let line = postmortem.summary.lines().next().unwrap_or_default().trim();
    if line.chars().count() <= max_chars {
        return line.to_string();
    }
    let cut: String = line.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn postmortem(action_items: Vec<&str>) -> Postmortem {
        Postmortem {
            id: "pm-7".to_string(),
            incident_id: Some("inc-3".to_string()),
            summary: "Checkout failed for 12 minutes.".to_string(),
            timeline: "10:00 deploy\n10:12 rollback".to_string(),
            impact: "5% of orders".to_string(),
            root_cause: "Null pointer in price service".to_string(),
            action_items: action_items.into_iter().map(String::from).collect(),
            prevention: "Add contract tests".to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 10, 15, 30).unwrap(),
        }
    }

    #[test]
    fn test_render_markdown_sections_in_order() {
        let doc = render_markdown_in(&postmortem(vec!["Add alert", "Fix null check"]), &Utc);

        assert!(doc.starts_with("# Incident Postmortem\n"));
        assert!(doc.contains("**Generated**: 2025-03-01 10:15:30"));
        assert!(doc.contains("**Postmortem ID**: pm-7"));
        assert!(doc.contains("**Incident ID**: inc-3"));
        assert!(doc.contains("## Action Items\n\n1. Add alert\n2. Fix null check\n"));

        let order = [
            "## Summary",
            "## Timeline",
            "## Root Cause",
            "## Impact",
            "## Action Items",
            "## Prevention",
        ];
        let positions: Vec<usize> = order.iter().map(|h| doc.find(h).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_render_markdown_without_action_items() {
        let doc = render_markdown_in(&postmortem(vec![]), &Utc);
        assert!(doc.contains("## Action Items\n\nNo action items.\n"));
    }

    #[test]
    fn test_export_filename() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 10, 15, 30).unwrap();
        assert_eq!(export_filename("pm-7", at), "postmortem-pm-7-1740824130000.md");
    }

    #[test]
    fn test_export_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = export(&postmortem(vec!["Add alert"]), dir.path()).unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("postmortem-pm-7-"));
        assert!(name.ends_with(".md"));

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("1. Add alert"));
    }

    #[test]
    fn test_export_to_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("reports").join("checkout.md");

        let path = export(&postmortem(vec![]), &target).unwrap();
        assert_eq!(path, target);
        assert!(std::fs::read_to_string(&path).unwrap().contains("No action items."));
    }

    #[test]
    fn test_summary_preview() {
        let pm = postmortem(vec![]);
        assert_eq!(summary_preview(&pm, 80), "Checkout failed for 12 minutes.");
        assert_eq!(summary_preview(&pm, 9), "Checkout…");
    }
}
