use anyhow::{bail, Context, Result};
use chrono::Utc;
use robbin_common::calendar::normalize_local;
use robbin_common::feed::{
    EnvironmentFilter, LiveFeed, PollOutcome, RelativeWindow, SelectionChange, TimeRange,
};
use robbin_common::severity::{classify, SeverityFilter, SeverityPalette};
use robbin_common::{DashboardConfig, IncidentApi};
use std::sync::Arc;
use std::time::Duration;
use tabled::{Table, Tabled};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{event_details, local_time, severity_badge};

const TITLE_WIDTH: usize = 60;

pub struct FeedArgs {
    pub range: RelativeWindow,
    pub from: Option<String>,
    pub to: Option<String>,
    pub severity: SeverityFilter,
    pub environment: String,
    pub event: Option<String>,
    pub watch: bool,
}

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "Sel")]
    selected: &'static str,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Env")]
    environment: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Event ID")]
    id: String,
}

pub async fn execute(
    api: Arc<dyn IncidentApi>,
    config: &DashboardConfig,
    args: FeedArgs,
) -> Result<()> {
    let range = time_range(&args)?;
    let mut feed = LiveFeed::new(api, range);
    {
        let controller = feed.controller();
        let mut state = controller.lock().await;
        state.set_severity_filter(args.severity);
        state.set_environment_filter(EnvironmentFilter::parse(&args.environment));
    }

    if !args.watch {
        if feed.refresh().await == PollOutcome::Failed {
            bail!("Failed to fetch events from {}", config.api_base_url);
        }
        match args.event.as_deref() {
            Some(id) => {
                let controller = feed.controller();
                let state = controller.lock().await;
                let event = state
                    .store()
                    .get(id)
                    .with_context(|| format!("Event {id} is not in the current feed"))?;
                print!("{}", event_details(event, &config.severity_palette)?);
            }
            None => render(&feed, &config.severity_palette).await,
        }
        return Ok(());
    }

    watch(&mut feed, config).await
}

/// Custom bounds win over the relative window when either is given
fn time_range(args: &FeedArgs) -> Result<TimeRange> {
    if args.from.is_none() && args.to.is_none() {
        return Ok(TimeRange::Relative(args.range));
    }
    Ok(TimeRange::Custom {
        start: bound("--from", args.from.as_deref())?,
        end: bound("--to", args.to.as_deref())?,
    })
}

fn bound(flag: &str, raw: Option<&str>) -> Result<String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(String::new()),
        Some(raw) => normalize_local(raw).with_context(|| {
            format!("Invalid {flag} value '{raw}': expected YYYY-MM-DDTHH:MM[:SS]")
        }),
    }
}

async fn watch(feed: &mut LiveFeed, config: &DashboardConfig) -> Result<()> {
    println!(
        "Watching live feed every {}s. Commands: s <id> select/deselect, d <id> details, \
         p pause/resume, g generate incident, c clear selection, r refresh, q quit",
        config.feed_poll_interval.as_secs()
    );

    feed.mount(config.feed_poll_interval);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    // redraw shortly after each scheduled poll
    let first = tokio::time::Instant::now() + Duration::from_millis(500);
    let mut redraw = tokio::time::interval_at(first, config.feed_poll_interval);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = redraw.tick() => render(feed, &config.severity_palette).await,
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read command")? else {
                    break;
                };
                match handle_command(feed, &config.severity_palette, line.trim()).await {
                    Command::Quit => break,
                    Command::Redraw => render(feed, &config.severity_palette).await,
                    Command::Keep => {}
                }
            }
        }
    }

    feed.unmount().await;
    Ok(())
}

/// What the watch loop does after a stdin command
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Redraw,
    /// Leave the last output on screen
    Keep,
    Quit,
}

/// Apply one stdin command
async fn handle_command(feed: &LiveFeed, palette: &SeverityPalette, line: &str) -> Command {
    let (command, arg) = line
        .split_once(' ')
        .map_or((line, ""), |(c, a)| (c, a.trim()));
    let controller = feed.controller();

    match command {
        "" => {}
        "q" | "quit" => return Command::Quit,
        "d" | "show" => {
            let state = controller.lock().await;
            match state.store().get(arg).map(|e| event_details(e, palette)) {
                Some(Ok(details)) => println!("\n{details}"),
                Some(Err(e)) => eprintln!("✗ {e:#}"),
                None => println!("Unknown event '{arg}'"),
            }
            return Command::Keep;
        }
        "s" | "select" => match controller.lock().await.toggle_selection(arg) {
            SelectionChange::Added => println!("Selected {arg} (feed paused)"),
            SelectionChange::Removed => println!("Deselected {arg}"),
            SelectionChange::Rejected => {
                println!("Cannot select '{arg}': unknown or info-level event");
            }
        },
        "p" | "pause" => {
            if controller.lock().await.toggle_pause() {
                println!("Feed paused");
            } else {
                println!("Feed resumed");
            }
        }
        "c" | "clear" => {
            controller.lock().await.clear_selection();
            println!("Selection cleared");
        }
        "r" | "refresh" => match feed.refresh().await {
            PollOutcome::Skipped | PollOutcome::Discarded => println!("Feed is paused"),
            PollOutcome::Failed => println!("Refresh failed, showing previous data"),
            PollOutcome::Applied(_) => {}
        },
        "g" | "generate" => match feed.generate_incident().await {
            Ok(incident_id) => {
                println!("\n✓ Incident created successfully!");
                println!("  Incident ID: {incident_id}");
                println!("  Details:     robbin incidents show {incident_id}");
            }
            Err(e) => eprintln!("✗ {e}"),
        },
        other => println!("Unknown command: {other}"),
    }
    Command::Redraw
}

async fn render(feed: &LiveFeed, palette: &SeverityPalette) {
    let controller = feed.controller();
    let state = controller.lock().await;
    let visible = state.visible_events(Utc::now());

    println!(
        "\nLive feed • range {} • severity {} • environment {} • {} event(s){}",
        state.range(),
        state.severity_filter(),
        state.environment_filter(),
        visible.len(),
        if state.is_paused() { " • paused" } else { "" }
    );

    if visible.is_empty() {
        println!("No events in range");
        return;
    }

    let rows: Vec<EventRow> = visible
        .into_iter()
        .map(|event| {
            let selected = if state.selection().contains(&event.id) {
                "[x]"
            } else if classify(&event.severity).selectable {
                "[ ]"
            } else {
                ""
            };

            EventRow {
                selected,
                severity: severity_badge(palette, &event.severity),
                time: local_time(event.created_at),
                source: event.source.clone(),
                environment: event.environment().unwrap_or("-").to_string(),
                title: truncate(&event.title, TITLE_WIDTH),
                id: event.id.clone(),
            }
        })
        .collect();

    println!("{}", Table::new(rows));

    if !state.selection().is_empty() {
        let ids: Vec<&str> = state.selection().ids().collect();
        println!("Selected: {}", ids.join(", "));
    }
}

fn truncate(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() <= max {
        return line.to_string();
    }
    let cut: String = line.chars().take(max.saturating_sub(1)).collect();
    format!("{cut}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(from: Option<&str>, to: Option<&str>) -> FeedArgs {
        FeedArgs {
            range: RelativeWindow::SixHours,
            from: from.map(String::from),
            to: to.map(String::from),
            severity: SeverityFilter::All,
            environment: "all".to_string(),
            event: None,
            watch: false,
        }
    }

    #[test]
    fn test_relative_range_without_bounds() {
        assert_eq!(
            time_range(&args(None, None)).unwrap(),
            TimeRange::Relative(RelativeWindow::SixHours)
        );
    }

    #[test]
    fn test_custom_bounds_are_normalized() {
        let range = time_range(&args(Some("2025-01-05 14:03"), None)).unwrap();
        assert_eq!(
            range,
            TimeRange::Custom {
                start: "2025-01-05T14:03:00".to_string(),
                end: String::new(),
            }
        );
    }

    #[test]
    fn test_invalid_bound_is_rejected() {
        let err = time_range(&args(None, Some("tomorrow"))).unwrap_err();
        assert!(err.to_string().contains("--to"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a long title here", 7), "a long…");
        assert_eq!(truncate("first\nsecond", 20), "first");
    }
}
