//! Signal vocabulary shared by the pipeline, the engine and the reports.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => f.write_str("long"),
            Side::Short => f.write_str("short"),
        }
    }
}

/// Directional trend classification from MACD momentum and RSI level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tide {
    Long,
    Short,
    #[default]
    Neutral,
}

impl Tide {
    /// The side this tide points to, if any.
    pub fn side(&self) -> Option<Side> {
        match self {
            Tide::Long => Some(Side::Long),
            Tide::Short => Some(Side::Short),
            Tide::Neutral => None,
        }
    }

    pub fn is_directional(&self) -> bool {
        !matches!(self, Tide::Neutral)
    }
}

impl fmt::Display for Tide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tide::Long => f.write_str("long"),
            Tide::Short => f.write_str("short"),
            Tide::Neutral => f.write_str("none"),
        }
    }
}

/// Tide classification for one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TideSignal {
    pub symbol: String,
    pub tide: Tide,
}

/// Direction of a fast/slow moving-average cross.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossoverDirection {
    Bullish,
    Bearish,
}

impl CrossoverDirection {
    /// Side a trade taken on this cross would have.
    pub fn side(&self) -> Side {
        match self {
            CrossoverDirection::Bullish => Side::Long,
            CrossoverDirection::Bearish => Side::Short,
        }
    }
}

impl fmt::Display for CrossoverDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrossoverDirection::Bullish => f.write_str("bullish"),
            CrossoverDirection::Bearish => f.write_str("bearish"),
        }
    }
}

/// A cross detected on the latest bar of a symbol's series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossoverEvent {
    pub symbol: String,
    pub direction: CrossoverDirection,
}

/// Confirmation filters that can gate a tide.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// Close on the tide's side of the Bollinger mid-band
    Bollinger,
    /// Volume above a multiple of its rolling average
    VolumeSpike,
    /// Close beyond the prior rolling high/low (trend-line breakout)
    Breakout,
    /// Close on the tide's side of the trend EMA
    TrendEma,
    /// RSI on the tide's side of the zone level
    RsiZone,
}

impl FilterKind {
    pub fn all() -> &'static [FilterKind] {
        &[
            FilterKind::Bollinger,
            FilterKind::VolumeSpike,
            FilterKind::Breakout,
            FilterKind::TrendEma,
            FilterKind::RsiZone,
        ]
    }

    /// Short label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            FilterKind::Bollinger => "BB",
            FilterKind::VolumeSpike => "Volume",
            FilterKind::Breakout => "TLBO",
            FilterKind::TrendEma => "EMA",
            FilterKind::RsiZone => "RSI-Zone",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of running the tide pipeline on one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FilterResult {
    pub symbol: String,
    pub tide: Tide,
    /// Filters that were switched on for this evaluation
    pub enabled: BTreeSet<FilterKind>,
    /// Enabled filters that held for the tide's direction
    pub passed: BTreeSet<FilterKind>,
}

impl FilterResult {
    /// A directional tide with every enabled filter passing.
    pub fn confirmed(&self) -> bool {
        self.tide.is_directional() && self.enabled.is_subset(&self.passed)
    }

    /// The confirmed side, if any.
    pub fn confirmed_side(&self) -> Option<Side> {
        if self.confirmed() {
            self.tide.side()
        } else {
            None
        }
    }

    /// The tide classification this result was built from.
    pub fn tide_signal(&self) -> TideSignal {
        TideSignal {
            symbol: self.symbol.clone(),
            tide: self.tide,
        }
    }

    pub fn passed(&self, kind: FilterKind) -> bool {
        self.passed.contains(&kind)
    }
}
