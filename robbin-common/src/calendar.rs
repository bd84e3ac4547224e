//! Date-time picker used to enter custom feed range bounds.
//!
//! The picker exposes one local date-time string (`YYYY-MM-DDTHH:MM:SS`)
//! and reports every edit through an `on_change` callback. The month shown
//! in the grid is tracked separately from the value, so browsing months
//! never touches the selection.

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, Timelike};
use std::fmt;

use crate::feed::range::parse_local_naive;

/// Canonical value format produced by the picker
pub const VALUE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Label shown on the trigger while no value is set
pub const EMPTY_LABEL: &str = "Select date & time";

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const GRID_CELLS: usize = 42;

/// Normalize any accepted local date-time input to [`VALUE_FORMAT`]
pub fn normalize_local(input: &str) -> Option<String> {
    parse_local_naive(input).map(|dt| dt.format(VALUE_FORMAT).to_string())
}

/// Read a picker value; empty or unparseable input reads as the current local time
fn read_value(value: &str) -> NaiveDateTime {
    parse_local_naive(value).unwrap_or_else(|| Local::now().naive_local())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned screen region, half-open on the right and bottom edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }
}

/// A widget that closes when the pointer goes down outside its regions
pub trait Dismissible {
    fn is_open(&self) -> bool;

    /// Regions that count as "inside" while open
    fn regions(&self) -> Vec<Rect>;

    fn dismiss(&mut self);
}

/// Root of the interaction tree.
///
/// Pointer events are captured once here and tested against every open
/// widget, instead of each widget listening on its own.
#[derive(Debug, Default)]
pub struct InteractionRoot;

impl InteractionRoot {
    /// Dispatch a pointer-down; returns how many widgets were dismissed
    pub fn pointer_down(&self, point: Point, widgets: &mut [&mut dyn Dismissible]) -> usize {
        let mut dismissed = 0;
        for widget in widgets.iter_mut() {
            if widget.is_open() && !widget.regions().iter().any(|r| r.contains(point)) {
                widget.dismiss();
                dismissed += 1;
            }
        }
        dismissed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerState {
    Closed,
    Open,
}

impl fmt::Display for PickerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PickerState::Closed => write!(f, "closed"),
            PickerState::Open => write!(f, "open"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeComponent {
    Hour,
    Minute,
    Second,
}

impl TimeComponent {
    fn max(self) -> u32 {
        match self {
            TimeComponent::Hour => 23,
            TimeComponent::Minute | TimeComponent::Second => 59,
        }
    }
}

/// One day in the month grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub in_view_month: bool,
}

type OnChange = Box<dyn FnMut(&str) + Send>;

pub struct DateTimePicker {
    value: String,
    state: PickerState,
    view_year: i32,
    view_month: u32,
    trigger: Rect,
    dropdown: Rect,
    on_change: OnChange,
}

impl DateTimePicker {
    pub fn new(value: impl Into<String>, on_change: impl FnMut(&str) + Send + 'static) -> Self {
        let value = value.into();
        let current = read_value(&value);
        Self {
            value,
            state: PickerState::Closed,
            view_year: current.year(),
            view_month: current.month(),
            trigger: Rect::default(),
            dropdown: Rect::default(),
            on_change: Box::new(on_change),
        }
    }

    /// Record where the trigger and dropdown were laid out
    pub fn set_layout(&mut self, trigger: Rect, dropdown: Rect) {
        self.trigger = trigger;
        self.dropdown = dropdown;
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn state(&self) -> PickerState {
        self.state
    }

    /// Viewed month as `(year, month)` with month in `1..=12`
    pub fn view_month(&self) -> (i32, u32) {
        (self.view_year, self.view_month)
    }

    /// Header of the month grid, e.g. "January 2025"
    pub fn view_month_label(&self) -> String {
        let name = MONTH_NAMES
            .get(self.view_month as usize - 1)
            .copied()
            .unwrap_or_default();
        format!("{} {}", name, self.view_year)
    }

    pub fn activate_trigger(&mut self) {
        match self.state {
            PickerState::Closed => {
                self.state = PickerState::Open;
                self.sync_view();
            }
            PickerState::Open => self.state = PickerState::Closed,
        }
    }

    pub fn close(&mut self) {
        self.state = PickerState::Closed;
    }

    /// Close when `point` is outside both the trigger and the dropdown
    pub fn pointer_down(&mut self, point: Point) -> bool {
        if self.state == PickerState::Open
            && !self.trigger.contains(point)
            && !self.dropdown.contains(point)
        {
            self.close();
            return true;
        }
        false
    }

    /// Replace the date portion of the value, keeping the time of day, and close
    pub fn select_day(&mut self, date: NaiveDate) {
        let current = read_value(&self.value);
        self.commit(date.and_time(current.time()));
        self.close();
    }

    /// Set one time component (clamped into range); the picker stays open
    pub fn set_time(&mut self, component: TimeComponent, value: u32) {
        let current = read_value(&self.value);
        let v = value.min(component.max());
        let updated = match component {
            TimeComponent::Hour => current.with_hour(v),
            TimeComponent::Minute => current.with_minute(v),
            TimeComponent::Second => current.with_second(v),
        };
        self.commit(updated.unwrap_or(current));
    }

    pub fn prev_month(&mut self) {
        if self.view_month == 1 {
            self.view_month = 12;
            self.view_year -= 1;
        } else {
            self.view_month -= 1;
        }
    }

    pub fn next_month(&mut self) {
        if self.view_month == 12 {
            self.view_month = 1;
            self.view_year += 1;
        } else {
            self.view_month += 1;
        }
    }

    /// Six weeks of days starting on the Sunday on or before the 1st
    pub fn month_grid(&self) -> Vec<DayCell> {
        let Some(first) = NaiveDate::from_ymd_opt(self.view_year, self.view_month, 1) else {
            return Vec::new();
        };
        let lead = i64::from(first.weekday().num_days_from_sunday());
        let start = first - Duration::days(lead);

        start
            .iter_days()
            .take(GRID_CELLS)
            .map(|date| DayCell {
                date,
                in_view_month: date.month() == self.view_month && date.year() == self.view_year,
            })
            .collect()
    }

    /// Trigger label, e.g. "Jan 5 2025 14:03:09"
    pub fn display_label(&self) -> String {
        if self.value.trim().is_empty() {
            return EMPTY_LABEL.to_string();
        }
        read_value(&self.value)
            .format("%b %-d %Y %H:%M:%S")
            .to_string()
    }

    fn commit(&mut self, value: NaiveDateTime) {
        self.value = value.format(VALUE_FORMAT).to_string();
        (self.on_change)(&self.value);
        if self.state == PickerState::Open {
            self.sync_view();
        }
    }

    fn sync_view(&mut self) {
        let current = read_value(&self.value);
        self.view_year = current.year();
        self.view_month = current.month();
    }
}

impl fmt::Debug for DateTimePicker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DateTimePicker")
            .field("value", &self.value)
            .field("state", &self.state)
            .field("view_year", &self.view_year)
            .field("view_month", &self.view_month)
            .finish_non_exhaustive()
    }
}

impl Dismissible for DateTimePicker {
    fn is_open(&self) -> bool {
        self.state == PickerState::Open
    }

    fn regions(&self) -> Vec<Rect> {
        vec![self.trigger, self.dropdown]
    }

    fn dismiss(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recording_picker(value: &str) -> (DateTimePicker, Arc<Mutex<Vec<String>>>) {
        let changes = Arc::new(Mutex::new(Vec::new()));
        let sink = changes.clone();
        let picker = DateTimePicker::new(value, move |v: &str| {
            sink.lock().unwrap().push(v.to_string());
        });
        (picker, changes)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_prev_month_rolls_over_year() {
        let (mut picker, changes) = recording_picker("2025-01-15T08:30:00");
        assert_eq!(picker.view_month_label(), "January 2025");

        picker.prev_month();
        assert_eq!(picker.view_month(), (2024, 12));
        assert_eq!(picker.view_month_label(), "December 2024");

        picker.next_month();
        assert_eq!(picker.view_month(), (2025, 1));

        // browsing never edits the value
        assert_eq!(picker.value(), "2025-01-15T08:30:00");
        assert!(changes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_select_day_preserves_time_and_closes() {
        let (mut picker, changes) = recording_picker("2025-01-15T14:03:09");
        picker.activate_trigger();
        assert_eq!(picker.state(), PickerState::Open);

        picker.select_day(date(2025, 2, 3));

        assert_eq!(picker.value(), "2025-02-03T14:03:09");
        assert_eq!(picker.state(), PickerState::Closed);
        assert_eq!(*changes.lock().unwrap(), vec!["2025-02-03T14:03:09"]);
    }

    #[test]
    fn test_set_time_stays_open_and_clamps() {
        let (mut picker, changes) = recording_picker("2025-01-15T14:03:09");
        picker.activate_trigger();

        picker.set_time(TimeComponent::Hour, 7);
        picker.set_time(TimeComponent::Minute, 75);
        picker.set_time(TimeComponent::Second, 0);

        assert_eq!(picker.state(), PickerState::Open);
        assert_eq!(picker.value(), "2025-01-15T07:59:00");
        assert_eq!(changes.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_trigger_toggles_and_resyncs_view() {
        let (mut picker, _) = recording_picker("2025-06-10T00:00:00");
        picker.next_month();
        picker.next_month();
        assert_eq!(picker.view_month(), (2025, 8));

        picker.activate_trigger();
        assert_eq!(picker.state(), PickerState::Open);
        assert_eq!(picker.view_month(), (2025, 6));

        picker.activate_trigger();
        assert_eq!(picker.state(), PickerState::Closed);
    }

    #[test]
    fn test_pointer_down_outside_closes() {
        let (mut picker, _) = recording_picker("2025-06-10T00:00:00");
        picker.set_layout(Rect::new(0, 0, 100, 20), Rect::new(0, 20, 280, 300));
        picker.activate_trigger();

        assert!(!picker.pointer_down(Point::new(50, 10)));
        assert!(!picker.pointer_down(Point::new(200, 100)));
        assert_eq!(picker.state(), PickerState::Open);

        assert!(picker.pointer_down(Point::new(500, 500)));
        assert_eq!(picker.state(), PickerState::Closed);
    }

    #[test]
    fn test_interaction_root_dismisses_open_widgets_only() {
        let (mut start, _) = recording_picker("2025-06-10T00:00:00");
        let (mut end, _) = recording_picker("2025-06-11T00:00:00");
        start.set_layout(Rect::new(0, 0, 100, 20), Rect::new(0, 20, 280, 300));
        end.set_layout(Rect::new(400, 0, 100, 20), Rect::new(400, 20, 280, 300));
        start.activate_trigger();

        let root = InteractionRoot;
        let dismissed = root.pointer_down(Point::new(450, 10), &mut [&mut start, &mut end]);

        assert_eq!(dismissed, 1);
        assert_eq!(start.state(), PickerState::Closed);
        assert_eq!(end.state(), PickerState::Closed);
    }

    #[test]
    fn test_month_grid_starts_on_sunday() {
        // 1 February 2025 is a Saturday
        let (picker, _) = recording_picker("2025-02-14T12:00:00");
        let grid = picker.month_grid();

        assert_eq!(grid.len(), 42);
        assert_eq!(grid[0].date, date(2025, 1, 26));
        assert!(!grid[0].in_view_month);
        assert_eq!(grid[6].date, date(2025, 2, 1));
        assert!(grid[6].in_view_month);
        assert_eq!(grid.iter().filter(|c| c.in_view_month).count(), 28);
        assert_eq!(grid[41].date, date(2025, 3, 8));
    }

    #[test]
    fn test_display_label() {
        let (picker, _) = recording_picker("2025-01-05T14:03:09");
        assert_eq!(picker.display_label(), "Jan 5 2025 14:03:09");

        let (empty, _) = recording_picker("");
        assert_eq!(empty.display_label(), EMPTY_LABEL);
    }

    #[test]
    fn test_unparseable_value_reads_as_now() {
        let (mut picker, _) = recording_picker("not a date");
        picker.select_day(date(2024, 12, 31));
        assert!(picker.value().starts_with("2024-12-31T"));
    }

    #[test]
    fn test_normalize_local() {
        assert_eq!(
            normalize_local("2025-01-05 14:03").as_deref(),
            Some("2025-01-05T14:03:00")
        );
        assert_eq!(
            normalize_local("2025-01-05T14:03:09").as_deref(),
            Some("2025-01-05T14:03:09")
        );
        assert_eq!(normalize_local("yesterday"), None);
    }
}
