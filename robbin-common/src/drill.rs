//! Drill replay: step through a past incident on a scaled clock.
//!
//! Progress runs from 0 to 100 in ticks of [`TICK_INTERVAL`], each tick
//! advancing `speed * 0.5`. Reaching 100 stops playback and reveals the
//! score card.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::models::{Event, Incident};

pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Nominal length of a replay in seconds
pub const NOMINAL_DURATION_SECS: u32 = 100;

const PROGRESS_MAX: f64 = 100.0;
const STEP_PER_TICK: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackSpeed {
    Half,
    #[default]
    Normal,
    Double,
    Quadruple,
}

impl PlaybackSpeed {
    pub const ALL: [PlaybackSpeed; 4] = [
        PlaybackSpeed::Half,
        PlaybackSpeed::Normal,
        PlaybackSpeed::Double,
        PlaybackSpeed::Quadruple,
    ];

    pub fn factor(self) -> f64 {
        match self {
            PlaybackSpeed::Half => 0.5,
            PlaybackSpeed::Normal => 1.0,
            PlaybackSpeed::Double => 2.0,
            PlaybackSpeed::Quadruple => 4.0,
        }
    }
}

impl fmt::Display for PlaybackSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.factor())
    }
}

impl FromStr for PlaybackSpeed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_end_matches(['x', 'X']) {
            "0.5" | ".5" => Ok(PlaybackSpeed::Half),
            "1" | "1.0" => Ok(PlaybackSpeed::Normal),
            "2" | "2.0" => Ok(PlaybackSpeed::Double),
            "4" | "4.0" => Ok(PlaybackSpeed::Quadruple),
            other => Err(format!("unsupported speed: {other} (expected 0.5, 1, 2 or 4)")),
        }
    }
}

/// Score card shown once a replay finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrillScore {
    pub detection_time: u8,
    pub response_clarity: u8,
    pub postmortem_quality: u8,
    pub overall: u8,
}

impl Default for DrillScore {
    fn default() -> Self {
        Self {
            detection_time: 85,
            response_clarity: 72,
            postmortem_quality: 90,
            overall: 82,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Good,
    Fair,
    Poor,
}

impl ScoreBand {
    pub fn of(score: u8) -> Self {
        match score {
            80.. => ScoreBand::Good,
            60..=79 => ScoreBand::Fair,
            _ => ScoreBand::Poor,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DrillReplay {
    incident: Incident,
    timeline: Vec<Event>,
    progress: f64,
    speed: PlaybackSpeed,
    playing: bool,
    show_score: bool,
    score: DrillScore,
}

impl DrillReplay {
    /// Build a replay over the incident's events, oldest first.
    ///
    /// An incident listed without members replays as a single step built
    /// from the incident itself.
    pub fn new(incident: Incident) -> Self {
        let mut timeline = incident.events.clone();
        if timeline.is_empty() {
            timeline.push(Event {
                id: incident.id.clone(),
                source: String::new(),
                title: incident.title.clone(),
                stack_trace: None,
                severity: incident.severity.clone(),
                metadata: None,
                environment: None,
                created_at: incident.created_at,
            });
        }
        timeline.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        Self {
            incident,
            timeline,
            progress: 0.0,
            speed: PlaybackSpeed::default(),
            playing: false,
            show_score: false,
            score: DrillScore::default(),
        }
    }

    pub fn incident(&self) -> &Incident {
        &self.incident
    }

    pub fn timeline(&self) -> &[Event] {
        &self.timeline
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    pub fn set_speed(&mut self, speed: PlaybackSpeed) {
        self.speed = speed;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_finished(&self) -> bool {
        self.progress >= PROGRESS_MAX
    }

    pub fn show_score(&self) -> bool {
        self.show_score
    }

    pub fn score(&self) -> DrillScore {
        self.score
    }

    pub fn play(&mut self) {
        if !self.is_finished() {
            self.playing = true;
        }
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn toggle_play(&mut self) {
        if self.playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Advance one tick; returns true when this tick finished the replay
    pub fn tick(&mut self) -> bool {
        if !self.playing || self.is_finished() {
            return false;
        }

        let next = self.progress + self.speed.factor() * STEP_PER_TICK;
        if next >= PROGRESS_MAX {
            self.progress = PROGRESS_MAX;
            self.playing = false;
            self.show_score = true;
            debug!(incident_id = %self.incident.id, "drill finished");
            return true;
        }
        self.progress = next;
        false
    }

    /// Jump to a position, clamped into 0–100
    pub fn seek(&mut self, progress: f64) {
        self.progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, PROGRESS_MAX)
        };
    }

    pub fn reset(&mut self) {
        self.progress = 0.0;
        self.playing = false;
        self.show_score = false;
    }

    /// Index of the event under the playhead
    pub fn current_event_index(&self) -> usize {
        let n = self.timeline.len();
        let at = (self.progress / PROGRESS_MAX * n as f64).floor() as usize;
        at.min(n.saturating_sub(1))
    }

    pub fn current_event(&self) -> Option<&Event> {
        self.timeline.get(self.current_event_index())
    }

    /// Elapsed replay time in whole seconds
    pub fn elapsed_secs(&self) -> u32 {
        (self.progress / PROGRESS_MAX * f64::from(NOMINAL_DURATION_SECS)).floor() as u32
    }

    /// "elapsed / total" clock, e.g. "0:42 / 1:40"
    pub fn clock(&self) -> String {
        format!(
            "{} / {}",
            format_clock(self.elapsed_secs()),
            format_clock(NOMINAL_DURATION_SECS)
        )
    }

    /// Play to the end on a real timer, reporting after every tick
    pub async fn play_to_end<F>(&mut self, mut on_tick: F)
    where
        F: FnMut(&DrillReplay),
    {
        self.play();
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick of an interval completes immediately
        interval.tick().await;

        while self.playing {
            interval.tick().await;
            self.tick();
            on_tick(self);
        }
    }
}

/// Format whole seconds as `m:ss`
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
