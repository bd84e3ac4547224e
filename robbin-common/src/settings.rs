use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Prefix of every live API key
pub const API_KEY_PREFIX: &str = "rb_live_";

/// Generate a fresh API key: the live prefix followed by 32 hex characters
pub fn generate_api_key() -> String {
    format!("{API_KEY_PREFIX}{}", Uuid::new_v4().simple())
}

/// Shorten a key for display, keeping the prefix and the last four characters
pub fn mask_api_key(key: &str) -> String {
    let Some(secret) = key.strip_prefix(API_KEY_PREFIX) else {
        return "*".repeat(key.chars().count().min(8));
    };
    let tail: String = secret
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("{API_KEY_PREFIX}…{tail}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Production,
    Staging,
    Development,
}

impl Environment {
    pub const ALL: [Environment; 3] = [
        Environment::Production,
        Environment::Staging,
        Environment::Development,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Staging => "staging",
            Environment::Development => "development",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "staging" => Ok(Environment::Staging),
            "development" | "dev" => Ok(Environment::Development),
            other => {
                let known = Self::ALL.map(Environment::as_str);
                Err(format!(
                    "unknown environment: {other} (expected one of {})",
                    known.join(", ")
                ))
            }
        }
    }
}

/// How long the backend keeps raw events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetentionPeriod {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl RetentionPeriod {
    pub const ALL: [RetentionPeriod; 4] = [
        RetentionPeriod::Week,
        RetentionPeriod::Month,
        RetentionPeriod::Quarter,
        RetentionPeriod::Year,
    ];

    pub fn days(self) -> u32 {
        match self {
            RetentionPeriod::Week => 7,
            RetentionPeriod::Month => 30,
            RetentionPeriod::Quarter => 90,
            RetentionPeriod::Year => 365,
        }
    }

    pub fn from_days(days: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.days() == days)
    }

    pub fn label(self) -> &'static str {
        match self {
            RetentionPeriod::Week => "7 days",
            RetentionPeriod::Month => "30 days",
            RetentionPeriod::Quarter => "90 days",
            RetentionPeriod::Year => "1 year",
        }
    }
}

impl FromStr for RetentionPeriod {
    type Err = String;

    /// Accepts a day count such as `30` or `30d`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        raw.trim_end_matches(['d', 'D'])
            .parse::<u32>()
            .ok()
            .and_then(Self::from_days)
            .ok_or_else(|| {
                let known = Self::ALL.map(|p| p.days().to_string());
                format!("unsupported retention: {raw} (expected {} days)", known.join(", "))
            })
    }
}

/// Inputs of the first-project setup flow
#[derive(Debug, Clone)]
pub struct ProjectSetup {
    pub project_name: String,
    pub environment: Environment,
    pub api_key: String,
}

impl ProjectSetup {
    pub fn new(project_name: impl Into<String>, environment: Environment) -> Self {
        Self {
            project_name: project_name.into(),
            environment,
            api_key: generate_api_key(),
        }
    }

    /// A project needs a name before it can be created
    pub fn can_create(&self) -> bool {
        !self.project_name.trim().is_empty()
    }

    /// SDK install and initialisation snippet for the selected environment
    pub fn sdk_snippet(&self) -> String {
        format!(
            r"// Install Robbin SDK
npm install @robbin/node

// Initialize in your app
import {{ Robbin }} from '@robbin/node';

const robbin = new Robbin({{
  apiKey: '{key}',
  environment: '{env}'
}});

// Send an event
try {{
  // Your code here
}} catch (error) {{
  robbin.captureError(error, {{
    context: {{
      user: req.user?.id,
      endpoint: req.path
    }}
  }});
}}",
            key = self.api_key,
            env = self.environment,
        )
    }
}
