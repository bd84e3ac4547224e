//! Severity normalisation.
//!
//! Servers report severity as a free-form string. Everything the dashboard
//! does with it goes through [`classify`], which folds the raw value into
//! one of three visual classes.

use std::fmt;
use std::str::FromStr;

/// Canonical severity after normalising the raw string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Critical,
    Warning,
    Info,
}

/// Visual class; critical folds into error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SeverityClass {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn class(self) -> SeverityClass {
        match self {
            Severity::Error | Severity::Critical => SeverityClass::Error,
            Severity::Warning => SeverityClass::Warning,
            Severity::Info => SeverityClass::Info,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Error => "Error",
            Severity::Critical => "Critical",
            Severity::Warning => "Warning",
            Severity::Info => "Info",
        }
    }
}

impl SeverityClass {
    pub fn as_str(self) -> &'static str {
        match self {
            SeverityClass::Error => "error",
            SeverityClass::Warning => "warning",
            SeverityClass::Info => "info",
        }
    }

    /// Only non-info events may be grouped into an incident
    pub fn is_selectable(self) -> bool {
        self != SeverityClass::Info
    }
}

impl fmt::Display for SeverityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of [`classify`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub severity: Severity,
    pub class: SeverityClass,
    pub label: &'static str,
    pub selectable: bool,
}

/// Normalise a raw severity string. Total: unknown values are info.
pub fn classify(raw: &str) -> Classification {
    let raw = raw.trim();
    let severity = if raw.eq_ignore_ascii_case("error") {
        Severity::Error
    } else if raw.eq_ignore_ascii_case("critical") {
        Severity::Critical
    } else if raw.eq_ignore_ascii_case("warning") {
        Severity::Warning
    } else {
        Severity::Info
    };

    let class = severity.class();
    Classification {
        severity,
        class,
        label: severity.label(),
        selectable: class.is_selectable(),
    }
}

/// How a severity class is drawn in the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityStyle {
    pub glyph: char,
    /// ANSI SGR colour code
    pub ansi: &'static str,
}

/// Read-only class → style table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityPalette {
    pub error: SeverityStyle,
    pub warning: SeverityStyle,
    pub info: SeverityStyle,
}

impl SeverityPalette {
    pub fn style(&self, class: SeverityClass) -> SeverityStyle {
        match class {
            SeverityClass::Error => self.error,
            SeverityClass::Warning => self.warning,
            SeverityClass::Info => self.info,
        }
    }

    /// Render a classification as a coloured badge such as `✖ Critical`
    pub fn badge(&self, classification: &Classification, color: bool) -> String {
        let style = self.style(classification.class);
        if color {
            format!(
                "\x1b[{}m{} {}\x1b[0m",
                style.ansi, style.glyph, classification.label
            )
        } else {
            format!("{} {}", style.glyph, classification.label)
        }
    }
}

impl Default for SeverityPalette {
    fn default() -> Self {
        Self {
            error: SeverityStyle {
                glyph: '✖',
                ansi: "31",
            },
            warning: SeverityStyle {
                glyph: '▲',
                ansi: "33",
            },
            info: SeverityStyle {
                glyph: '●',
                ansi: "34",
            },
        }
    }
}

/// Severity filter offered by list views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeverityFilter {
    #[default]
    All,
    Only(SeverityClass),
}

impl SeverityFilter {
    /// Match on canonical class, so `error` also admits critical events
    pub fn matches(self, raw_severity: &str) -> bool {
        match self {
            SeverityFilter::All => true,
            SeverityFilter::Only(class) => classify(raw_severity).class == class,
        }
    }
}

impl FromStr for SeverityFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "error" => Ok(Self::Only(SeverityClass::Error)),
            "warning" => Ok(Self::Only(SeverityClass::Warning)),
            "info" => Ok(Self::Only(SeverityClass::Info)),
            other => Err(format!(
                "unknown severity filter '{other}' (expected all, error, warning or info)"
            )),
        }
    }
}

impl fmt::Display for SeverityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeverityFilter::All => f.write_str("all"),
            SeverityFilter::Only(class) => write!(f, "{class}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_values() {
        let error = classify("Error");
        assert_eq!(error.class, SeverityClass::Error);
        assert_eq!(error.label, "Error");
        assert!(error.selectable);

        let warning = classify("WARNING");
        assert_eq!(warning.class, SeverityClass::Warning);
        assert!(warning.selectable);

        let info = classify("info");
        assert_eq!(info.class, SeverityClass::Info);
        assert!(!info.selectable);
    }

    #[test]
    fn test_critical_folds_into_error_class() {
        let critical = classify("CRITICAL");
        assert_eq!(critical.severity, Severity::Critical);
        assert_eq!(critical.class, SeverityClass::Error);
        assert_eq!(critical.label, "Critical");
        // selectability follows the class, and the class is error
        assert!(critical.selectable);
    }

    #[test]
    fn test_unknown_is_info() {
        for raw in ["banana", "", "  ", "fatal", "debug"] {
            let c = classify(raw);
            assert_eq!(c.class, SeverityClass::Info, "raw={raw:?}");
            assert_eq!(c.label, "Info");
            assert!(!c.selectable);
        }
    }

    #[test]
    fn test_filter_matches_canonical_class() {
        let errors: SeverityFilter = "error".parse().unwrap();
        assert!(errors.matches("critical"));
        assert!(errors.matches("ERROR"));
        assert!(!errors.matches("warning"));

        let info: SeverityFilter = "Info".parse().unwrap();
        assert!(info.matches("banana"));

        assert!(SeverityFilter::All.matches("anything"));
        assert!("fatal".parse::<SeverityFilter>().is_err());
    }

    #[test]
    fn test_palette_critical_shares_error_style() {
        let palette = SeverityPalette::default();
        let critical = classify("critical");
        let error = classify("error");
        assert_eq!(palette.style(critical.class), palette.style(error.class));
        assert_eq!(palette.badge(&critical, false), "✖ Critical");
    }
}
