use anyhow::{Context, Result};
use robbin_common::feed::{generate_incident, SelectionChange, SelectionSet};
use robbin_common::severity::classify;
use robbin_common::IncidentApi;

pub async fn execute(api: &dyn IncidentApi, event_ids: Vec<String>) -> Result<()> {
    let events = api
        .list_events()
        .await
        .context("Failed to fetch events")?;

    let mut selection = SelectionSet::new();
    for id in &event_ids {
        if selection.contains(id) {
            continue;
        }
        let Some(event) = events.iter().find(|e| e.id == *id) else {
            println!("  skipping {id}: not in the current feed");
            continue;
        };
        let classification = classify(&event.severity);
        if selection.toggle(id, classification.class) == SelectionChange::Rejected {
            println!("  skipping {id}: {} events cannot be grouped", classification.label);
        }
    }

    println!("Generating incident from {} event(s)...", selection.len());

    let incident_id = generate_incident(api, &mut selection, &events).await?;

    println!("\n✓ Incident created successfully!");
    println!("  Incident ID: {incident_id}");
    println!("  Details:     robbin incidents show {incident_id}");

    Ok(())
}
