use serde::Serialize;

use super::labels::{alert_cause, alert_effect};
use crate::gtfs_rt::{Alert, EntitySelector, TimeRange, TranslatedString};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivePeriod {
    pub start: Option<u64>,
    pub end: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InformedEntity {
    pub agency_id: Option<String>,
    pub route_id: Option<String>,
    pub route_type: Option<i32>,
    pub stop_id: Option<String>,
    pub trip_id: Option<String>,
    pub direction_id: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalizedText {
    pub text: String,
    pub language: Option<String>,
}

/// A service alert as published, with cause and effect rendered as names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertStatus {
    pub entity_id: String,
    pub active_periods: Vec<ActivePeriod>,
    pub informed_entities: Vec<InformedEntity>,
    pub cause: String,
    pub effect: String,
    pub header_text: Vec<LocalizedText>,
    pub description_text: Vec<LocalizedText>,
    pub url: Vec<LocalizedText>,
}

impl From<&TimeRange> for ActivePeriod {
    fn from(range: &TimeRange) -> Self {
        ActivePeriod {
            start: range.start,
            end: range.end,
        }
    }
}

impl From<&EntitySelector> for InformedEntity {
    fn from(selector: &EntitySelector) -> Self {
        InformedEntity {
            agency_id: selector.agency_id.clone(),
            route_id: selector.route_id.clone(),
            route_type: selector.route_type,
            stop_id: selector.stop_id.clone(),
            trip_id: selector.trip.as_ref().and_then(|t| t.trip_id.clone()),
            direction_id: selector.direction_id,
        }
    }
}

fn translations(text: Option<&TranslatedString>) -> Vec<LocalizedText> {
    text.map(|t| {
        t.translation
            .iter()
            .map(|tr| LocalizedText {
                text: tr.text.clone(),
                language: tr.language.clone(),
            })
            .collect()
    })
    .unwrap_or_default()
}

pub fn fuse_alert(entity_id: &str, alert: &Alert) -> AlertStatus {
    AlertStatus {
        entity_id: entity_id.to_string(),
        active_periods: alert.active_period.iter().map(ActivePeriod::from).collect(),
        informed_entities: alert
            .informed_entity
            .iter()
            .map(InformedEntity::from)
            .collect(),
        cause: alert_cause(alert.cause).to_string(),
        effect: alert_effect(alert.effect).to_string(),
        header_text: translations(alert.header_text.as_ref()),
        description_text: translations(alert.description_text.as_ref()),
        url: translations(alert.url.as_ref()),
    }
}
