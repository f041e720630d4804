use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PipelineError, Result};

/// Ordinal heat-island severity, hottest first. The five names and their
/// overlay colors are fixed product vocabulary; clusters are mapped onto
/// them by temperature rank each run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SeverityLabel {
    #[serde(rename = "High UHI")]
    High,
    #[serde(rename = "Moderate-High UHI")]
    ModerateHigh,
    #[serde(rename = "Moderate UHI")]
    Moderate,
    #[serde(rename = "Low-Moderate UHI")]
    LowModerate,
    #[serde(rename = "Low UHI")]
    Low,
}

impl SeverityLabel {
    pub const ALL: [SeverityLabel; 5] = [
        SeverityLabel::High,
        SeverityLabel::ModerateHigh,
        SeverityLabel::Moderate,
        SeverityLabel::LowModerate,
        SeverityLabel::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityLabel::High => "High UHI",
            SeverityLabel::ModerateHigh => "Moderate-High UHI",
            SeverityLabel::Moderate => "Moderate UHI",
            SeverityLabel::LowModerate => "Low-Moderate UHI",
            SeverityLabel::Low => "Low UHI",
        }
    }

    /// Overlay color for this label, shared by every rendering surface.
    pub fn color(&self) -> &'static str {
        match self {
            SeverityLabel::High => "yellow",
            SeverityLabel::ModerateHigh => "red",
            SeverityLabel::Moderate => "orange",
            SeverityLabel::LowModerate => "lightblue",
            SeverityLabel::Low => "blue",
        }
    }

    /// Position in the vocabulary, 0 = hottest.
    pub fn vocabulary_index(&self) -> usize {
        *self as usize
    }

    /// Label for the cluster ranked `rank` (0 = highest mean temperature)
    /// out of `count` clusters. For five clusters this is the identity; for
    /// fewer, ranks spread across the vocabulary so the hottest cluster is
    /// always High and the coldest always Low.
    pub fn from_rank(rank: usize, count: usize) -> Result<Self> {
        if count == 0 || rank >= count {
            return Err(PipelineError::Clustering(format!(
                "rank {} out of range for {} clusters",
                rank, count
            )));
        }

        if count == 1 {
            return Ok(SeverityLabel::High);
        }

        let index = ((rank * 4) as f64 / (count - 1) as f64).round() as usize;
        Ok(Self::ALL[index.min(4)])
    }
}

impl fmt::Display for SeverityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeverityLabel {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "High UHI" => Ok(SeverityLabel::High),
            "Moderate-High UHI" => Ok(SeverityLabel::ModerateHigh),
            "Moderate UHI" => Ok(SeverityLabel::Moderate),
            "Low-Moderate UHI" => Ok(SeverityLabel::LowModerate),
            "Low UHI" => Ok(SeverityLabel::Low),
            other => Err(PipelineError::InvalidFormat(format!(
                "Unknown severity label: '{}'",
                other
            ))),
        }
    }
}
