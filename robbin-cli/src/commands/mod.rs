pub mod drill;
pub mod feed;
pub mod generate;
pub mod incidents;
pub mod postmortems;
pub mod setup;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use robbin_common::models::Event;
use robbin_common::severity::{classify, SeverityPalette};
use std::fmt::Write as _;
use std::io::IsTerminal;

/// Colour badges only when stdout is a terminal
fn use_color() -> bool {
    std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

fn severity_badge(palette: &SeverityPalette, raw: &str) -> String {
    palette.badge(&classify(raw), use_color())
}

fn local_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Stack trace and metadata blocks of one event, empty when it has neither
fn event_attachments(event: &Event) -> Result<String> {
    let mut out = String::new();
    if let Some(trace) = event.stack_trace.as_deref() {
        let _ = write!(out, "\n--- {} stack trace ---\n{}\n", event.id, trace.trim_end());
    }
    if let Some(metadata) = event.metadata.as_ref().filter(|m| !m.is_empty()) {
        let pretty =
            serde_json::to_string_pretty(metadata).context("Failed to format event metadata")?;
        let _ = write!(out, "\n--- {} metadata ---\n{pretty}\n", event.id);
    }
    Ok(out)
}

/// Full view of one event, untruncated
fn event_details(event: &Event, palette: &SeverityPalette) -> Result<String> {
    let mut out = String::new();
    let _ = writeln!(out, "{}", event.title);
    let _ = writeln!(out, "  Event ID:    {}", event.id);
    let _ = writeln!(out, "  Severity:    {}", severity_badge(palette, &event.severity));
    let _ = writeln!(out, "  Source:      {}", event.source);
    let _ = writeln!(out, "  Environment: {}", event.environment().unwrap_or("-"));
    let _ = writeln!(out, "  Time:        {}", local_time(event.created_at));
    out.push_str(&event_attachments(event)?);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event() -> Event {
        Event {
            id: "evt-7".to_string(),
            source: "checkout-api".to_string(),
            title: "NullPointerException in CartService while computing totals".to_string(),
            stack_trace: Some("at CartService.total()\nat Router.dispatch()\n".to_string()),
            severity: "error".to_string(),
            metadata: Some(
                serde_json::json!({"region": "eu-west-1", "environment": "staging"})
                    .as_object()
                    .unwrap()
                    .clone(),
            ),
            environment: None,
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 10, 15, 30).unwrap(),
        }
    }

    #[test]
    fn test_event_details_show_everything() {
        let details = event_details(&event(), &SeverityPalette::default()).unwrap();

        assert!(details
            .starts_with("NullPointerException in CartService while computing totals\n"));
        assert!(details.contains("Event ID:    evt-7"));
        assert!(details.contains("Source:      checkout-api"));
        assert!(details.contains("Environment: staging"));
        assert!(details.contains(
            "--- evt-7 stack trace ---\nat CartService.total()\nat Router.dispatch()\n"
        ));
        assert!(details.contains("\"region\": \"eu-west-1\""));
    }

    #[test]
    fn test_attachments_empty_without_trace_or_metadata() {
        let mut bare = event();
        bare.stack_trace = None;
        bare.metadata = Some(serde_json::Map::new());
        assert_eq!(event_attachments(&bare).unwrap(), "");
    }
}
