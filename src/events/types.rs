use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::constants::{HIGH_FRICTION_COUNTRIES, SEVERITY_GUIDELINES};
use crate::error::{CoreError, CoreResult, parse_date};

pub const MIN_SEVERITY: u8 = 1;
pub const MAX_SEVERITY: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Sanctions,
    CapitalControl,
    BankingCrisis,
    Regulatory,
    Other,
}

impl EventType {
    pub const ALL: [EventType; 5] = [
        EventType::Sanctions,
        EventType::CapitalControl,
        EventType::BankingCrisis,
        EventType::Regulatory,
        EventType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Sanctions => "sanctions",
            EventType::CapitalControl => "capital_control",
            EventType::BankingCrisis => "banking_crisis",
            EventType::Regulatory => "regulatory",
            EventType::Other => "other",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            EventType::Sanctions => "International sanctions, SWIFT removal, asset freezes",
            EventType::CapitalControl => "Forex restrictions, withdrawal limits, currency devaluation",
            EventType::BankingCrisis => "Bank runs, deposit restrictions, banking sector stress",
            EventType::Regulatory => "Crypto bans, KYC enforcement, exchange crackdowns",
            EventType::Other => "Exchange collapses, depegs, protocol failures",
        }
    }

    /// Severity band events of this kind usually fall in
    pub fn typical_severity(&self) -> RangeInclusive<u8> {
        match self {
            EventType::Sanctions => 7..=10,
            EventType::CapitalControl => 5..=9,
            EventType::BankingCrisis => 6..=9,
            EventType::Regulatory => 4..=8,
            EventType::Other => 5..=9,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = CoreError;

    /// Accepts snake_case names as well as the labels used in the seed data
    /// ("Capital Controls", "Banking", "Market")
    fn from_str(s: &str) -> CoreResult<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "sanctions" | "sanction" => Ok(EventType::Sanctions),
            "capitalcontrol" | "capitalcontrols" => Ok(EventType::CapitalControl),
            "bankingcrisis" | "banking" => Ok(EventType::BankingCrisis),
            "regulatory" => Ok(EventType::Regulatory),
            "other" | "market" => Ok(EventType::Other),
            _ => Err(CoreError::validation(format!("unknown event type '{}'", s))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyEvent {
    pub id: u64,
    pub date: NaiveDate,
    pub country: String,
    pub event_type: EventType,
    pub severity: u8,
    pub description: String,
}

impl PolicyEvent {
    /// One-line label, e.g. `2022-02-24 - Russia - Russia-Ukraine war sanctions begin`
    pub fn label(&self) -> String {
        let short: String = self.description.chars().take(50).collect();
        format!("{} - {} - {}", self.date.format("%Y-%m-%d"), self.country, short)
    }

    pub fn is_high_friction(&self) -> bool {
        is_high_friction_country(&self.country)
    }
}

/// Countries with a history of capital controls, sanctions or banking stress
pub fn is_high_friction_country(country: &str) -> bool {
    let country = country.trim();
    HIGH_FRICTION_COUNTRIES.iter().any(|c| c.eq_ignore_ascii_case(country))
}

/// An event as submitted, before validation and id assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPolicyEvent {
    pub date: String,
    pub country: String,
    pub event_type: EventType,
    pub severity: i64,
    pub description: String,
}

impl NewPolicyEvent {
    pub fn new(
        date: impl Into<String>,
        country: impl Into<String>,
        event_type: EventType,
        severity: i64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            country: country.into(),
            event_type,
            severity,
            description: description.into(),
        }
    }

    pub(crate) fn into_event(self, id: u64) -> CoreResult<PolicyEvent> {
        let date = parse_date(&self.date)?;
        let severity = validate_severity(self.severity)?;
        let country = self.country.trim().to_string();
        if country.is_empty() {
            return Err(CoreError::validation("country must not be empty"));
        }
        Ok(PolicyEvent {
            id,
            date,
            country,
            event_type: self.event_type,
            severity,
            description: self.description.trim().to_string(),
        })
    }
}

fn validate_severity(raw: i64) -> CoreResult<u8> {
    if raw < i64::from(MIN_SEVERITY) || raw > i64::from(MAX_SEVERITY) {
        return Err(CoreError::validation(format!(
            "severity {} outside {}..={}",
            raw, MIN_SEVERITY, MAX_SEVERITY
        )));
    }
    Ok(raw as u8)
}

/// Guideline text for a severity score
pub fn severity_guideline(severity: u8) -> Option<&'static str> {
    if (MIN_SEVERITY..=MAX_SEVERITY).contains(&severity) {
        Some(SEVERITY_GUIDELINES[usize::from(severity - 1)])
    } else {
        None
    }
}

/// Optional criteria, all of which must hold
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    pub country: Option<String>,
    pub event_type: Option<EventType>,
    pub min_severity: Option<u8>,
}

impl EventFilter {
    pub fn matches(&self, event: &PolicyEvent) -> bool {
        if let Some(country) = &self.country {
            if !event.country.eq_ignore_ascii_case(country.trim()) {
                return false;
            }
        }
        if let Some(event_type) = self.event_type {
            if event.event_type != event_type {
                return false;
            }
        }
        if let Some(min) = self.min_severity {
            if event.severity < min {
                return false;
            }
        }
        true
    }
}
