use anyhow::{Context, Result};
use chrono::Utc;
use robbin_common::incidents::{format_relative, IncidentBoard, StatusFilter};
use robbin_common::poller::Poller;
use robbin_common::severity::SeverityPalette;
use robbin_common::{DashboardConfig, IncidentApi};
use std::sync::Arc;
use std::time::Instant;
use tabled::{Table, Tabled};
use tokio::sync::Mutex;

use super::{event_attachments, local_time, severity_badge};

#[derive(Tabled)]
struct IncidentRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "Incident ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Age")]
    age: String,
}

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Event ID")]
    id: String,
}

pub async fn list(
    api: Arc<dyn IncidentApi>,
    config: &DashboardConfig,
    status: StatusFilter,
    watch: bool,
) -> Result<()> {
    let mut board = IncidentBoard::new(status);

    if !watch {
        let incidents = api
            .list_incidents(None)
            .await
            .context("Failed to fetch incidents")?;
        let now = Instant::now();
        board.replace(incidents, now);
        render(&board, &config.severity_palette, now);
        return Ok(());
    }

    println!(
        "Watching incidents every {}s (Ctrl-C to stop)",
        config.list_poll_interval.as_secs()
    );

    let board = Arc::new(Mutex::new(board));
    let palette = config.severity_palette.clone();
    let poller = Poller::start("incidents", config.list_poll_interval, move |live| {
        let api = api.clone();
        let board = board.clone();
        let palette = palette.clone();
        async move {
            let result = api.list_incidents(None).await;
            if !live.is_live() {
                return;
            }
            let mut board = board.lock().await;
            let now = Instant::now();
            board.expire_highlights(now);
            board.apply_poll_result(result, now);
            render(&board, &palette, now);
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    poller.stop().await;

    Ok(())
}

fn render(board: &IncidentBoard, palette: &SeverityPalette, now: Instant) {
    let visible = board.visible();
    println!("\nIncidents • {}", board.count_label());

    if visible.is_empty() {
        println!("No incidents");
        return;
    }

    let wall_now = Utc::now();
    let rows: Vec<IncidentRow> = visible
        .into_iter()
        .map(|incident| IncidentRow {
            marker: if board.is_highlighted(&incident.id, now) {
                "NEW"
            } else {
                ""
            },
            id: incident.id.clone(),
            title: incident.title.clone(),
            severity: severity_badge(palette, &incident.severity),
            status: incident.status.clone(),
            age: format_relative(incident.created_at, wall_now),
        })
        .collect();

    println!("{}", Table::new(rows));
}

pub async fn show(api: &dyn IncidentApi, config: &DashboardConfig, incident_id: &str) -> Result<()> {
    let incident = api
        .get_incident(incident_id)
        .await
        .with_context(|| format!("Failed to fetch incident {incident_id}"))?;

    let palette = &config.severity_palette;
    println!("{}", incident.title);
    println!("  Incident ID: {}", incident.id);
    println!("  Severity:    {}", severity_badge(palette, &incident.severity));
    println!("  Status:      {}", incident.status);
    println!("  Created:     {}", local_time(incident.created_at));
    if let Some(summary) = incident.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        println!("\n{summary}");
    }

    if incident.events.is_empty() {
        println!("\nNo events attached");
    } else {
        let rows: Vec<EventRow> = incident
            .events
            .iter()
            .map(|event| EventRow {
                severity: severity_badge(palette, &event.severity),
                time: local_time(event.created_at),
                source: event.source.clone(),
                title: event.title.clone(),
                id: event.id.clone(),
            })
            .collect();
        println!("\n{}", Table::new(rows));

        for event in &incident.events {
            print!("{}", event_attachments(event)?);
        }
    }

    println!("\nGenerate a postmortem: robbin postmortems generate {}", incident.id);

    Ok(())
}
