//! Data models for CR310 datalogger readings.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::ranges::Channel;

/// Tag stamped on every stored reading to identify the equipment family.
pub const SOURCE_TAG: &str = "CR310";

/// `chrono` format for the fixed `YYYY-MM-DD HH:MM:SS` reading timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a reading timestamp in the exact zero-padded `YYYY-MM-DD HH:MM:SS` form.
///
/// `chrono` alone accepts unpadded fields such as `2025-1-5`, which would break
/// lexicographic range filters, so the shape is checked byte by byte first.
/// A leap second (`:60`) is refused so one instant has exactly one key.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    // ---
    let shape_ok = s.len() == 19
        && s.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            10 => b == b' ',
            13 | 16 => b == b':',
            _ => b.is_ascii_digit(),
        });

    if !shape_ok {
        return None;
    }
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .ok()
        .filter(|dt| dt.nanosecond() < 1_000_000_000)
}

/// Required top-level fields, in the order they are reported when missing.
pub fn required_fields() -> impl Iterator<Item = &'static str> {
    std::iter::once("equipo")
        .chain(Channel::ALL.into_iter().map(Channel::name))
        .chain(std::iter::once("timestamp"))
}

// ---

/// Structurally valid CR310 reading.
///
/// Deserialized only after the structural validator has confirmed that every
/// required field is present with the right JSON type. Channels are `Option`
/// because an explicit JSON `null` is structurally acceptable; the normalizer
/// rejects it. Any field not declared here lands in `extra` rather than
/// failing the parse.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCr310Reading {
    // ---
    pub equipo: String,
    #[serde(rename = "SO2_ppb")]
    pub so2_ppb: Option<f64>,
    #[serde(rename = "H2S_ppb")]
    pub h2s_ppb: Option<f64>,
    #[serde(rename = "Reaction_Temp")]
    pub reaction_temp: Option<f64>,
    #[serde(rename = "IZS_Temp")]
    pub izs_temp: Option<f64>,
    #[serde(rename = "PMT_Temp")]
    pub pmt_temp: Option<f64>,
    #[serde(rename = "SampleFlow")]
    pub sample_flow: Option<f64>,
    #[serde(rename = "Pressure")]
    pub pressure: Option<f64>,
    #[serde(rename = "UVLampIntensity")]
    pub uv_lamp_intensity: Option<f64>,
    #[serde(rename = "Box_Temp")]
    pub box_temp: Option<f64>,
    #[serde(rename = "HVPS_V")]
    pub hvps_v: Option<f64>,
    #[serde(rename = "Conv_Temp")]
    pub conv_temp: Option<f64>,
    #[serde(rename = "Ozone_flow")]
    pub ozone_flow: Option<f64>,
    pub timestamp: String,

    /// Unknown fields, tolerated and logged.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RawCr310Reading {
    // ---
    pub fn channel(&self, channel: Channel) -> Option<f64> {
        match channel {
            Channel::So2Ppb => self.so2_ppb,
            Channel::H2sPpb => self.h2s_ppb,
            Channel::ReactionTemp => self.reaction_temp,
            Channel::IzsTemp => self.izs_temp,
            Channel::PmtTemp => self.pmt_temp,
            Channel::SampleFlow => self.sample_flow,
            Channel::Pressure => self.pressure,
            Channel::UvLampIntensity => self.uv_lamp_intensity,
            Channel::BoxTemp => self.box_temp,
            Channel::HvpsV => self.hvps_v,
            Channel::ConvTemp => self.conv_temp,
            Channel::OzoneFlow => self.ozone_flow,
        }
    }

    /// Equipment identifier as it will be stored: trimmed and upper-cased.
    pub fn equipo_key(&self) -> String {
        self.equipo.trim().to_uppercase()
    }
}

/// Normalized reading, the only shape that is ever persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CanonicalReading {
    // ---
    pub id: Uuid,
    pub equipo: String,
    #[serde(rename = "SO2_ppb")]
    pub so2_ppb: f64,
    #[serde(rename = "H2S_ppb")]
    pub h2s_ppb: f64,
    #[serde(rename = "Reaction_Temp")]
    pub reaction_temp: f64,
    #[serde(rename = "IZS_Temp")]
    pub izs_temp: f64,
    #[serde(rename = "PMT_Temp")]
    pub pmt_temp: f64,
    #[serde(rename = "SampleFlow")]
    pub sample_flow: f64,
    #[serde(rename = "Pressure")]
    pub pressure: f64,
    #[serde(rename = "UVLampIntensity")]
    pub uv_lamp_intensity: f64,
    #[serde(rename = "Box_Temp")]
    pub box_temp: f64,
    #[serde(rename = "HVPS_V")]
    pub hvps_v: f64,
    #[serde(rename = "Conv_Temp")]
    pub conv_temp: f64,
    #[serde(rename = "Ozone_flow")]
    pub ozone_flow: f64,

    /// Original `YYYY-MM-DD HH:MM:SS` string, used for exact match and range filters.
    #[sqlx(rename = "reading_timestamp")]
    pub timestamp: String,

    /// Parsed form of `timestamp`.
    #[sqlx(rename = "reading_time")]
    pub timestamp_dt: NaiveDateTime,

    pub created_at: DateTime<Utc>,
    pub source: String,
}

impl CanonicalReading {
    // ---
    pub fn channel(&self, channel: Channel) -> f64 {
        match channel {
            Channel::So2Ppb => self.so2_ppb,
            Channel::H2sPpb => self.h2s_ppb,
            Channel::ReactionTemp => self.reaction_temp,
            Channel::IzsTemp => self.izs_temp,
            Channel::PmtTemp => self.pmt_temp,
            Channel::SampleFlow => self.sample_flow,
            Channel::Pressure => self.pressure,
            Channel::UvLampIntensity => self.uv_lamp_intensity,
            Channel::BoxTemp => self.box_temp,
            Channel::HvpsV => self.hvps_v,
            Channel::ConvTemp => self.conv_temp,
            Channel::OzoneFlow => self.ozone_flow,
        }
    }
}

// ---

/// Standard API response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    // ---
    pub success: bool,
    pub message: String,
    pub code: u16,
    pub timestamp: Option<DateTime<Utc>>,
}

impl ApiResponse {
    // ---
    pub fn new(success: bool, message: impl Into<String>, code: u16) -> Self {
        Self {
            success,
            message: message.into(),
            code,
            timestamp: Some(Utc::now()),
        }
    }
}

/// Response for a page of readings
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadingsListResponse {
    // ---
    pub success: bool,
    pub message: String,
    pub count: usize,
    pub total: i64,
    pub data: Vec<CanonicalReading>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Body returned with every 4xx/5xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}
