//! Aggregate statistics endpoints and how their JSON is flattened for display.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatsSeries {
    Sleep,
    Caffeine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsPeriod {
    Weekly,
    Monthly,
    FourWeeks,
    FourMonths,
}

impl StatsSeries {
    pub const ALL: [StatsSeries; 2] = [StatsSeries::Sleep, StatsSeries::Caffeine];

    /// Endpoint path; the backend spells the sleep and caffeine variants
    /// differently.
    pub fn path(self, period: StatsPeriod) -> &'static str {
        match (self, period) {
            (StatsSeries::Sleep, StatsPeriod::Weekly) => "/api/sleepTime/weekly",
            (StatsSeries::Sleep, StatsPeriod::Monthly) => "/api/sleepTime/monthly",
            (StatsSeries::Sleep, StatsPeriod::FourWeeks) => "/api/sleepTime/fourWeek",
            (StatsSeries::Sleep, StatsPeriod::FourMonths) => "/api/sleepTime/fourMonth",
            (StatsSeries::Caffeine, StatsPeriod::Weekly) => "/caffeine/weekly",
            (StatsSeries::Caffeine, StatsPeriod::Monthly) => "/caffeine/monthly",
            (StatsSeries::Caffeine, StatsPeriod::FourWeeks) => "/caffeine/fourWeeks",
            (StatsSeries::Caffeine, StatsPeriod::FourMonths) => "/caffeine/fourMonths",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatsSeries::Sleep => "Sleep",
            StatsSeries::Caffeine => "Caffeine",
        }
    }
}

impl StatsPeriod {
    pub const ALL: [StatsPeriod; 4] = [
        StatsPeriod::Weekly,
        StatsPeriod::Monthly,
        StatsPeriod::FourWeeks,
        StatsPeriod::FourMonths,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StatsPeriod::Weekly => "Weekly",
            StatsPeriod::Monthly => "Monthly",
            StatsPeriod::FourWeeks => "4 weeks",
            StatsPeriod::FourMonths => "4 months",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        let idx = Self::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for StatsSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StatsSeries {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sleep" => Ok(StatsSeries::Sleep),
            "caffeine" => Ok(StatsSeries::Caffeine),
            other => Err(format!("Unknown stats series: {}", other)),
        }
    }
}

impl FromStr for StatsPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" | "week" => Ok(StatsPeriod::Weekly),
            "monthly" | "month" => Ok(StatsPeriod::Monthly),
            "four-weeks" | "fourweeks" | "4w" => Ok(StatsPeriod::FourWeeks),
            "four-months" | "fourmonths" | "4m" => Ok(StatsPeriod::FourMonths),
            other => Err(format!("Unknown stats period: {}", other)),
        }
    }
}

/// Flatten a JSON body into `path: value` lines, depth first.
pub fn flatten_json(value: &serde_json::Value) -> Vec<String> {
    let mut lines = Vec::new();
    flatten_into(value, String::new(), &mut lines);
    lines
}

fn flatten_into(value: &serde_json::Value, prefix: String, out: &mut Vec<String>) {
    use serde_json::Value;
    match value {
        Value::Object(map) => {
            if map.is_empty() && !prefix.is_empty() {
                out.push(format!("{}: {{}}", prefix));
            }
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_into(child, path, out);
            }
        }
        Value::Array(items) => {
            if items.is_empty() {
                out.push(format!("{}: []", display_prefix(&prefix)));
            }
            for (i, child) in items.iter().enumerate() {
                flatten_into(child, format!("{}[{}]", prefix, i), out);
            }
        }
        Value::String(s) => out.push(format!("{}: {}", display_prefix(&prefix), s)),
        other => out.push(format!("{}: {}", display_prefix(&prefix), other)),
    }
}

fn display_prefix(prefix: &str) -> &str {
    if prefix.is_empty() { "value" } else { prefix }
}
