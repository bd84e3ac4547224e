use anyhow::{Context, Result};
use robbin_common::postmortem::{export, render_markdown, summary_preview};
use robbin_common::IncidentApi;
use std::path::PathBuf;
use tabled::{Table, Tabled};

use super::local_time;

const PREVIEW_WIDTH: usize = 60;

#[derive(Tabled)]
struct PostmortemRow {
    #[tabled(rename = "Postmortem ID")]
    id: String,
    #[tabled(rename = "Incident ID")]
    incident_id: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Summary")]
    summary: String,
}

pub async fn list(api: &dyn IncidentApi) -> Result<()> {
    let mut postmortems = api
        .list_postmortems()
        .await
        .context("Failed to fetch postmortems")?;

    if postmortems.is_empty() {
        println!("No postmortems yet");
        return Ok(());
    }

    postmortems.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let rows: Vec<PostmortemRow> = postmortems
        .iter()
        .map(|pm| PostmortemRow {
            id: pm.id.clone(),
            incident_id: pm.incident_id.clone().unwrap_or_else(|| "-".to_string()),
            created: local_time(pm.created_at),
            summary: summary_preview(pm, PREVIEW_WIDTH),
        })
        .collect();

    let count = rows.len();
    println!("{}", Table::new(rows));
    println!("\nTotal: {count} postmortem(s)");

    Ok(())
}

pub async fn show(
    api: &dyn IncidentApi,
    postmortem_id: &str,
    markdown: bool,
    export_to: Option<PathBuf>,
) -> Result<()> {
    let postmortem = api
        .get_postmortem(postmortem_id)
        .await
        .with_context(|| format!("Failed to fetch postmortem {postmortem_id}"))?;

    if let Some(target) = export_to {
        let path = export(&postmortem, &target)?;
        println!("✓ Postmortem exported to {}", path.display());
        return Ok(());
    }

    if markdown {
        print!("{}", render_markdown(&postmortem));
        return Ok(());
    }

    println!("Postmortem {}", postmortem.id);
    if let Some(incident_id) = &postmortem.incident_id {
        println!("  Incident ID: {incident_id}");
    }
    println!("  Created:     {}", local_time(postmortem.created_at));

    for (heading, body) in [
        ("Summary", postmortem.summary.as_str()),
        ("Timeline", postmortem.timeline.as_str()),
        ("Root Cause", postmortem.root_cause.as_str()),
        ("Impact", postmortem.impact.as_str()),
    ] {
        println!("\n{heading}\n  {}", body.trim().replace('\n', "\n  "));
    }

    println!("\nAction Items");
    if postmortem.action_items.is_empty() {
        println!("  No action items.");
    }
    for (i, item) in postmortem.action_items.iter().enumerate() {
        println!("  {}. {item}", i + 1);
    }

    println!("\nPrevention\n  {}", postmortem.prevention.trim().replace('\n', "\n  "));

    Ok(())
}

pub async fn generate(api: &dyn IncidentApi, incident_id: &str) -> Result<()> {
    println!("Generating postmortem for incident {incident_id}...");

    let postmortem = api
        .generate_postmortem(incident_id)
        .await
        .with_context(|| format!("Failed to generate postmortem for incident {incident_id}"))?;

    println!("\n✓ Postmortem generated successfully!");
    println!("  Postmortem ID: {}", postmortem.id);
    println!("  View:          robbin postmortems show {}", postmortem.id);

    Ok(())
}
