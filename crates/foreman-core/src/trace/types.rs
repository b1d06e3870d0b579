//! Trace record types

use crate::error::ForemanError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Severity tag of a trace record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TraceLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl TraceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for TraceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TraceLevel {
    type Err = ForemanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TRACE" => Ok(Self::Trace),
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARN" | "WARNING" => Ok(Self::Warn),
            "ERROR" => Ok(Self::Error),
            other => Err(ForemanError::invalid_field(
                "level",
                format!("Unknown trace level '{}'", other),
            )),
        }
    }
}

/// One top-level invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub start_time: DateTime<Utc>,
}

/// A run together with how many trace records it currently holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub start_time: DateTime<Utc>,
    pub record_count: u64,
}

/// One entry in the execution log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub record_id: Uuid,
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub level: TraceLevel,
    pub message: String,
    pub unit_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
}

impl TraceRecord {
    /// New record stamped with a fresh id and the current time
    pub fn new(
        run_id: impl Into<String>,
        unit_name: impl Into<String>,
        level: TraceLevel,
        message: impl Into<String>,
        parent_id: Option<Uuid>,
    ) -> Self {
        Self {
            record_id: Uuid::new_v4(),
            run_id: run_id.into(),
            timestamp: Utc::now(),
            level,
            message: message.into(),
            unit_name: unit_name.into(),
            parent_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_round_trip_through_str() {
        for level in [
            TraceLevel::Trace,
            TraceLevel::Debug,
            TraceLevel::Info,
            TraceLevel::Warn,
            TraceLevel::Error,
        ] {
            assert_eq!(level.as_str().parse::<TraceLevel>().unwrap(), level);
        }
        assert_eq!("warning".parse::<TraceLevel>().unwrap(), TraceLevel::Warn);
        assert!("loud".parse::<TraceLevel>().is_err());
    }

    #[test]
    fn test_record_ids_are_unique() {
        let a = TraceRecord::new("run", "unit", TraceLevel::Info, "a", None);
        let b = TraceRecord::new("run", "unit", TraceLevel::Info, "b", None);
        assert_ne!(a.record_id, b.record_id);
    }

    #[test]
    fn test_record_serializes_level_uppercase() {
        let record = TraceRecord::new("run", "unit", TraceLevel::Debug, "hello", None);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["level"], "DEBUG");
        assert!(json.get("parent_id").is_none());
    }
}
