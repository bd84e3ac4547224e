use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A single reported occurrence as returned by `GET /api/events`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Opaque identifier, unique within one fetched batch
    pub id: String,
    /// Originating service name
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: String,
    /// Human-readable message
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub stack_trace: Option<String>,
    /// Free-form severity string (see [`crate::severity::classify`])
    #[serde(default, deserialize_with = "null_as_default")]
    pub severity: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
    /// Deployment environment, when the backend reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Environment of the event, falling back to `metadata.environment`.
    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref().or_else(|| {
            self.metadata
                .as_ref()
                .and_then(|m| m.get("environment"))
                .and_then(serde_json::Value::as_str)
        })
    }
}

/// Incident record (`title/status/events[]` schema)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub severity: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub summary: Option<String>,
    /// Member events; list responses may omit them
    #[serde(default)]
    pub events: Vec<Event>,
}

impl Incident {
    pub fn is_resolved(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case("resolved")
    }
}

/// Retrospective document generated for an incident
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Postmortem {
    pub id: String,
    #[serde(default)]
    pub incident_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub timeline: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub impact: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub root_cause: String,
    /// Normalised to one entry per non-blank item
    #[serde(default, deserialize_with = "deserialize_action_items")]
    pub action_items: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub prevention: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Request body of `POST /api/incidents/from-events`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateIncidentRequest {
    pub event_ids: Vec<String>,
}

/// Response of `POST /api/incidents/from-events`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedIncident {
    pub id: String,
}

/// Parse a server timestamp.
///
/// Accepts RFC 3339 instants and offset-less ISO-8601 date-times, the
/// latter read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

/// Missing keys and explicit `null` both become the default value
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawActionItems {
    List(Vec<String>),
    Text(String),
}

fn deserialize_action_items<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawActionItems>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawActionItems::List(items)) => items,
        Some(RawActionItems::Text(text)) => text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_event_from_server_json() {
        let event: Event = serde_json::from_value(json!({
            "id": "evt-1",
            "source": "checkout-api",
            "title": "NullPointerException in CartService",
            "stack_trace": "at CartService.total()\nat Router.dispatch()",
            "severity": "ERROR",
            "metadata": {"environment": "staging", "region": "eu-west-1"},
            "created_at": "2025-03-01T10:15:30Z"
        }))
        .unwrap();

        assert_eq!(event.id, "evt-1");
        assert_eq!(event.source, "checkout-api");
        assert_eq!(
            event.created_at,
            Utc.with_ymd_and_hms(2025, 3, 1, 10, 15, 30).unwrap()
        );
        assert_eq!(event.environment(), Some("staging"));
    }

    #[test]
    fn test_null_strings_do_not_fail_the_batch() {
        let events: Vec<Event> = serde_json::from_value(json!([
            {
                "id": "a",
                "source": "checkout-api",
                "title": "Timeout",
                "severity": "error",
                "created_at": "2025-03-01T10:15:30Z"
            },
            {
                "id": "b",
                "source": null,
                "title": null,
                "severity": null,
                "metadata": null,
                "created_at": "2025-03-01T10:16:30Z"
            }
        ]))
        .unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[1].severity, "");
        assert_eq!(events[1].source, "");
        assert!(!crate::severity::classify(&events[1].severity).selectable);

        let incident: Incident = serde_json::from_value(json!({
            "id": "inc-1",
            "title": null,
            "severity": null,
            "status": null,
            "created_at": "2025-03-01T10:15:30Z"
        }))
        .unwrap();
        assert_eq!(incident.title, "");
        assert!(!incident.is_resolved());

        let pm: Postmortem = serde_json::from_value(json!({
            "id": "pm-1",
            "summary": "s",
            "timeline": null,
            "prevention": null,
            "created_at": "2025-03-01T10:15:30Z"
        }))
        .unwrap();
        assert_eq!(pm.summary, "s");
        assert_eq!(pm.prevention, "");
    }

    #[test]
    fn test_naive_timestamp_is_utc() {
        let parsed = parse_timestamp("2025-03-01T10:15:30.123456").unwrap();
        assert_eq!(parsed.timestamp(), 1_740_824_130);

        let whole = parse_timestamp("2025-03-01T10:15:30").unwrap();
        assert_eq!(whole.timestamp(), 1_740_824_130);

        let offset = parse_timestamp("2025-03-01T12:15:30+02:00").unwrap();
        assert_eq!(offset, whole);

        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_event_with_bad_timestamp_is_rejected() {
        let result: Result<Event, _> = serde_json::from_value(json!({
            "id": "evt-1",
            "severity": "info",
            "created_at": "not a date"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_incident_list_entry_without_events() {
        let incident: Incident = serde_json::from_value(json!({
            "id": "inc-9",
            "title": "Checkout failures",
            "severity": "critical",
            "status": "Resolved",
            "created_at": "2025-03-01T10:15:30Z"
        }))
        .unwrap();
        assert!(incident.events.is_empty());
        assert!(incident.is_resolved());
    }

    #[test]
    fn test_postmortem_action_items_shapes() {
        let base = json!({
            "id": "pm-1",
            "summary": "s",
            "created_at": "2025-03-01T10:15:30Z"
        });

        let mut as_list = base.clone();
        as_list["action_items"] = json!(["Add alerting", "Write runbook"]);
        let pm: Postmortem = serde_json::from_value(as_list).unwrap();
        assert_eq!(pm.action_items, vec!["Add alerting", "Write runbook"]);

        let mut as_text = base.clone();
        as_text["action_items"] = json!("Add alerting\n\n  \nWrite runbook\n");
        let pm: Postmortem = serde_json::from_value(as_text).unwrap();
        assert_eq!(pm.action_items, vec!["Add alerting", "Write runbook"]);

        let mut as_null = base.clone();
        as_null["action_items"] = serde_json::Value::Null;
        let pm: Postmortem = serde_json::from_value(as_null).unwrap();
        assert!(pm.action_items.is_empty());

        let pm: Postmortem = serde_json::from_value(base).unwrap();
        assert!(pm.action_items.is_empty());
    }
}
