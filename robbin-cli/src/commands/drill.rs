use anyhow::{Context, Result};
use robbin_common::api::Page;
use robbin_common::drill::{DrillReplay, PlaybackSpeed, ScoreBand};
use robbin_common::severity::SeverityPalette;
use robbin_common::{DashboardConfig, IncidentApi};
use tracing::warn;

use super::severity_badge;

pub async fn execute(
    api: &dyn IncidentApi,
    config: &DashboardConfig,
    speed: PlaybackSpeed,
) -> Result<()> {
    let latest = api
        .list_incidents(Some(Page::first(1)))
        .await
        .context("Failed to fetch incidents")?;

    let Some(listed) = latest.into_iter().next() else {
        println!("No incidents available for a drill");
        return Ok(());
    };

    // list responses usually omit member events
    let incident = if listed.events.is_empty() {
        match api.get_incident(&listed.id).await {
            Ok(detail) => detail,
            Err(e) => {
                warn!(incident_id = %listed.id, "Failed to load incident events: {}", e);
                listed
            }
        }
    } else {
        listed
    };

    let palette = &config.severity_palette;
    let mut drill = DrillReplay::new(incident);
    drill.set_speed(speed);

    println!(
        "Drill: {} • {} event(s) • {} speed (Ctrl-C to stop)\n",
        drill.incident().title,
        drill.timeline().len(),
        drill.speed()
    );
    print_step(&drill, palette);

    let finished = {
        let mut shown = drill.current_event_index();
        let play = drill.play_to_end(|replay| {
            let index = replay.current_event_index();
            if index != shown {
                shown = index;
                print_step(replay, palette);
            }
        });

        tokio::select! {
            () = play => true,
            _ = tokio::signal::ctrl_c() => false,
        }
    };

    if !finished {
        println!("\nDrill stopped at {}", drill.clock());
        return Ok(());
    }

    println!("\n✓ Drill complete ({})", drill.clock());
    if drill.show_score() {
        let score = drill.score();
        println!("\nResponse score");
        for (label, value) in [
            ("Detection time", score.detection_time),
            ("Response clarity", score.response_clarity),
            ("Postmortem quality", score.postmortem_quality),
            ("Overall", score.overall),
        ] {
            println!("  {label:<20} {value:>3}  {}", band_label(ScoreBand::of(value)));
        }
    }

    Ok(())
}

fn print_step(drill: &DrillReplay, palette: &SeverityPalette) {
    if let Some(event) = drill.current_event() {
        println!(
            "[{}] {} {} - {}",
            drill.clock(),
            severity_badge(palette, &event.severity),
            event.source,
            event.title
        );
    }
}

fn band_label(band: ScoreBand) -> &'static str {
    match band {
        ScoreBand::Good => "good",
        ScoreBand::Fair => "fair",
        ScoreBand::Poor => "needs work",
    }
}
