use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Local date-time formats accepted for custom range bounds
const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Fixed relative windows offered by the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RelativeWindow {
    FifteenMinutes,
    #[default]
    OneHour,
    SixHours,
    TwentyFourHours,
    AllTime,
}

impl RelativeWindow {
    pub const ALL: &'static [Self] = &[
        Self::FifteenMinutes,
        Self::OneHour,
        Self::SixHours,
        Self::TwentyFourHours,
        Self::AllTime,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::FifteenMinutes => "15m",
            Self::OneHour => "1h",
            Self::SixHours => "6h",
            Self::TwentyFourHours => "24h",
            Self::AllTime => "all",
        }
    }

    /// Window length; `None` for all-time
    pub fn duration(self) -> Option<Duration> {
        match self {
            Self::FifteenMinutes => Some(Duration::minutes(15)),
            Self::OneHour => Some(Duration::hours(1)),
            Self::SixHours => Some(Duration::hours(6)),
            Self::TwentyFourHours => Some(Duration::hours(24)),
            Self::AllTime => None,
        }
    }
}

impl fmt::Display for RelativeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RelativeWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|w| w.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown time range '{s}' (expected 15m, 1h, 6h, 24h or all)"))
    }
}

/// Range of event timestamps the feed shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeRange {
    Relative(RelativeWindow),
    /// Local date-time strings; empty start is the epoch, empty end is now
    Custom { start: String, end: String },
}

impl Default for TimeRange {
    fn default() -> Self {
        TimeRange::Relative(RelativeWindow::default())
    }
}

impl TimeRange {
    /// Inclusion predicate evaluated in the machine's local time zone
    pub fn predicate(&self, now: DateTime<Utc>) -> RangePredicate {
        self.predicate_in(now, &Local)
    }

    /// Inclusion predicate with custom bounds read in `tz`
    pub fn predicate_in<Tz: TimeZone>(&self, now: DateTime<Utc>, tz: &Tz) -> RangePredicate {
        match self {
            TimeRange::Relative(window) => match window.duration() {
                Some(window) => RangePredicate::Within { now, window },
                None => RangePredicate::Always,
            },
            TimeRange::Custom { start, end } => {
                let start = if start.trim().is_empty() {
                    DateTime::<Utc>::from_timestamp(0, 0).unwrap_or(now)
                } else {
                    resolve_bound(start, tz).unwrap_or_else(|| {
                        debug!(bound = %start, "unparseable range start, using now");
                        now
                    })
                };
                let end = if end.trim().is_empty() {
                    now
                } else {
                    resolve_bound(end, tz).unwrap_or_else(|| {
                        debug!(bound = %end, "unparseable range end, using now");
                        now
                    })
                };
                RangePredicate::Between { start, end }
            }
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeRange::Relative(window) => write!(f, "last {window}"),
            TimeRange::Custom { start, end } => {
                let start = if start.is_empty() { "beginning" } else { start };
                let end = if end.is_empty() { "now" } else { end };
                write!(f, "{start} → {end}")
            }
        }
    }
}

/// Parse a locale-naive date-time string
pub fn parse_local_naive(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

fn resolve_bound<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let naive = parse_local_naive(raw)?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Resolved form of a [`TimeRange`] at a fixed "now"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePredicate {
    Always,
    Within {
        now: DateTime<Utc>,
        window: Duration,
    },
    Between {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl RangePredicate {
    pub fn includes(&self, t: DateTime<Utc>) -> bool {
        match *self {
            RangePredicate::Always => true,
            RangePredicate::Within { now, window } => now.signed_duration_since(t) <= window,
            RangePredicate::Between { start, end } => start <= t && t <= end,
        }
    }
}
