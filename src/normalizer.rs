//! Normalization of validated readings into their canonical stored form.

use chrono::Utc;
use tracing::{error, warn};
use uuid::Uuid;

use crate::error::{ReadingError, ReadingResult};
use crate::models::{parse_timestamp, CanonicalReading, RawCr310Reading, SOURCE_TAG};
use crate::ranges::Channel;
use crate::validator::ensure_consistent_temperatures;

/// Round to two decimal places, ties away from zero.
///
/// Operates on the binary value scaled by 100: `0.125` (exact in binary)
/// becomes `0.13`, whereas `2.675` (stored as `2.67499...`) becomes `2.67`.
pub fn round_2dp(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Turn a semantically valid reading into a [`CanonicalReading`].
///
/// Does not trust upstream validation: the timestamp is parsed again, any
/// null channel aborts the whole reading, and the temperature plausibility
/// check is repeated on the rounded values.
pub fn normalize(raw: &RawCr310Reading) -> ReadingResult<CanonicalReading> {
    // ---
    let equipo = raw.equipo_key();

    let timestamp_dt = parse_timestamp(&raw.timestamp).ok_or_else(|| {
        error!("Invalid timestamp format: {}", raw.timestamp);
        ReadingError::InvalidTimestamp(raw.timestamp.clone())
    })?;

    let value = |channel: Channel| -> ReadingResult<f64> {
        let Some(v) = raw.channel(channel) else {
            warn!("Null value detected for {}, skipping reading", channel);
            return Err(ReadingError::NullValue(channel.name()));
        };
        if !v.is_finite() {
            return Err(ReadingError::InvalidFormat(format!(
                "Field '{channel}' must be a finite number"
            )));
        }
        Ok(round_2dp(v))
    };

    let reading = CanonicalReading {
        id: Uuid::new_v4(),
        equipo,
        so2_ppb: value(Channel::So2Ppb)?,
        h2s_ppb: value(Channel::H2sPpb)?,
        reaction_temp: value(Channel::ReactionTemp)?,
        izs_temp: value(Channel::IzsTemp)?,
        pmt_temp: value(Channel::PmtTemp)?,
        sample_flow: value(Channel::SampleFlow)?,
        pressure: value(Channel::Pressure)?,
        uv_lamp_intensity: value(Channel::UvLampIntensity)?,
        box_temp: value(Channel::BoxTemp)?,
        hvps_v: value(Channel::HvpsV)?,
        conv_temp: value(Channel::ConvTemp)?,
        ozone_flow: value(Channel::OzoneFlow)?,
        timestamp: raw.timestamp.clone(),
        timestamp_dt,
        created_at: Utc::now(),
        source: SOURCE_TAG.to_string(),
    };

    ensure_consistent_temperatures(
        Channel::TEMPERATURES
            .into_iter()
            .map(|c| reading.channel(c)),
    )?;

    Ok(reading)
}
