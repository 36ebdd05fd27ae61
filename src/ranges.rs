//! Static range table for CR310 measurement channels.
//!
//! Every numeric channel a CR310 datalogger reports has an inclusive
//! `[min, max]` bound. The table is compiled in and never mutated; the
//! validators and the normalizer read it through [`Channel`].

use std::fmt;

/// Maximum allowed spread (max - min) between the temperature-like channels
/// of a single reading.
pub const MAX_TEMPERATURE_SPREAD: f64 = 30.0;

/// Inclusive bound for one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    // ---
    pub min: f64,
    pub max: f64,
}

impl Range {
    // ---
    const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// A named numeric measurement reported by the datalogger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    So2Ppb,
    H2sPpb,
    ReactionTemp,
    IzsTemp,
    PmtTemp,
    SampleFlow,
    Pressure,
    UvLampIntensity,
    BoxTemp,
    HvpsV,
    ConvTemp,
    OzoneFlow,
}

impl Channel {
    // ---
    /// All channels, in the order they are reported and listed in messages.
    pub const ALL: [Channel; 12] = [
        Channel::So2Ppb,
        Channel::H2sPpb,
        Channel::ReactionTemp,
        Channel::IzsTemp,
        Channel::PmtTemp,
        Channel::SampleFlow,
        Channel::Pressure,
        Channel::UvLampIntensity,
        Channel::BoxTemp,
        Channel::HvpsV,
        Channel::ConvTemp,
        Channel::OzoneFlow,
    ];

    /// Channels that take part in the cross-field temperature plausibility check.
    pub const TEMPERATURES: [Channel; 5] = [
        Channel::ReactionTemp,
        Channel::IzsTemp,
        Channel::PmtTemp,
        Channel::BoxTemp,
        Channel::ConvTemp,
    ];

    /// Wire name of the channel as it appears in JSON payloads.
    pub const fn name(self) -> &'static str {
        match self {
            Channel::So2Ppb => "SO2_ppb",
            Channel::H2sPpb => "H2S_ppb",
            Channel::ReactionTemp => "Reaction_Temp",
            Channel::IzsTemp => "IZS_Temp",
            Channel::PmtTemp => "PMT_Temp",
            Channel::SampleFlow => "SampleFlow",
            Channel::Pressure => "Pressure",
            Channel::UvLampIntensity => "UVLampIntensity",
            Channel::BoxTemp => "Box_Temp",
            Channel::HvpsV => "HVPS_V",
            Channel::ConvTemp => "Conv_Temp",
            Channel::OzoneFlow => "Ozone_flow",
        }
    }

    /// Valid inclusive range for the channel.
    pub const fn range(self) -> Range {
        match self {
            Channel::So2Ppb => Range::new(0.0, 10000.0),
            Channel::H2sPpb => Range::new(0.0, 1000.0),
            Channel::ReactionTemp
            | Channel::IzsTemp
            | Channel::PmtTemp
            | Channel::BoxTemp
            | Channel::ConvTemp => Range::new(20.0, 60.0),
            Channel::SampleFlow => Range::new(0.0, 1000.0),
            Channel::Pressure => Range::new(0.0, 100.0),
            Channel::UvLampIntensity => Range::new(0.0, 1000.0),
            Channel::HvpsV => Range::new(0.0, 1000.0),
            Channel::OzoneFlow => Range::new(0.0, 1000.0),
        }
    }

    /// Look up a channel by its wire name.
    pub fn from_name(name: &str) -> Option<Channel> {
        Channel::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Spread (max - min) of the given temperature values.
///
/// Returns `None` when fewer than two values are present, since there is
/// nothing to compare.
pub fn temperature_spread<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    // ---
    let mut count = 0usize;
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;

    for v in values {
        count += 1;
        lo = lo.min(v);
        hi = hi.max(v);
    }

    (count >= 2).then(|| hi - lo)
}
