//! Hysteresis valve policy.
//!
//! Two thresholds bound a dead zone so the valve does not chatter while the
//! reading hovers near a single trigger point:
//!
//! ```text
//!   OFF ──(m beyond dry)──▶ ON
//!    ▲                      │
//!    └───(m beyond wet)─────┘
//! ```
//!
//! "Beyond" depends on the sensor [`Polarity`]. With the default
//! `HighIsDry`, the valve opens when `m > dry` and closes when `m < wet`.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Valve position
// ---------------------------------------------------------------------------

/// Position of the irrigation valve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ValvePosition {
    #[serde(rename = "ON")]
    On,
    #[default]
    #[serde(rename = "OFF")]
    Off,
}

impl ValvePosition {
    /// Token used in telemetry and in the journal.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }

    /// Device command that drives the valve to this position.
    pub const fn command(self) -> &'static str {
        match self {
            Self::On => "VALVULA ON",
            Self::Off => "VALVULA OFF",
        }
    }
}

impl fmt::Display for ValvePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-sensitive: only `ON` and `OFF` are accepted.
impl FromStr for ValvePosition {
    type Err = UnknownValveToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ON" => Ok(Self::On),
            "OFF" => Ok(Self::Off),
            _ => Err(UnknownValveToken),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("valve token must be ON or OFF")]
pub struct UnknownValveToken;

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// How raw sensor values map to soil dryness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Polarity {
    /// Higher raw value = drier soil (resistive sensors on most ADCs).
    #[default]
    HighIsDry,
    /// Higher raw value = wetter soil (capacitive sensors, some seesaw boards).
    HighIsWet,
}

/// Validated threshold pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    dry: u32,
    wet: u32,
    polarity: Polarity,
}

impl Thresholds {
    /// Build a threshold pair, rejecting an ordering that leaves no dead zone.
    pub fn new(dry: u32, wet: u32, polarity: Polarity) -> Result<Self, ConfigError> {
        let ordered = match polarity {
            Polarity::HighIsDry => wet < dry,
            Polarity::HighIsWet => dry < wet,
        };
        if !ordered {
            return Err(ConfigError::Validation(format!(
                "thresholds dry={dry} wet={wet} are inconsistent with polarity {polarity:?}"
            )));
        }
        Ok(Self { dry, wet, polarity })
    }

    pub fn dry(&self) -> u32 {
        self.dry
    }

    pub fn wet(&self) -> u32 {
        self.wet
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Reading is past the dry threshold: the valve should open.
    pub fn is_dry(&self, moisture: u32) -> bool {
        match self.polarity {
            Polarity::HighIsDry => moisture > self.dry,
            Polarity::HighIsWet => moisture < self.dry,
        }
    }

    /// Reading is past the wet threshold: the valve should close.
    pub fn is_wet(&self, moisture: u32) -> bool {
        match self.polarity {
            Polarity::HighIsDry => moisture < self.wet,
            Polarity::HighIsWet => moisture > self.wet,
        }
    }

    /// Reading lies inside the closed dead zone between the thresholds.
    pub fn in_dead_band(&self, moisture: u32) -> bool {
        !self.is_dry(moisture) && !self.is_wet(moisture)
    }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// What the policy concluded about one reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyEvent {
    /// No transition.
    Normal,
    /// OFF → ON, soil too dry.
    Activated,
    /// ON → OFF, soil wet enough.
    Deactivated,
}

impl PolicyEvent {
    pub const fn description(self) -> &'static str {
        match self {
            Self::Normal => "reading normal",
            Self::Activated => "valve activated, soil dry",
            Self::Deactivated => "valve deactivated, soil wet",
        }
    }
}

/// Output of [`evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Valve position after the decision.
    pub state: ValvePosition,
    pub event: PolicyEvent,
    pub transitioned: bool,
}

/// Pure hysteresis decision for one reading.
pub fn evaluate(current: ValvePosition, moisture: u32, thresholds: &Thresholds) -> Decision {
    let (state, event) = match current {
        ValvePosition::Off if thresholds.is_dry(moisture) => {
            (ValvePosition::On, PolicyEvent::Activated)
        }
        ValvePosition::On if thresholds.is_wet(moisture) => {
            (ValvePosition::Off, PolicyEvent::Deactivated)
        }
        _ => (current, PolicyEvent::Normal),
    };
    Decision {
        state,
        event,
        transitioned: state != current,
    }
}

// ---------------------------------------------------------------------------
// ValveState
// ---------------------------------------------------------------------------

/// Controller-owned valve state.
///
/// This is the single source of truth for the valve position; whatever the
/// device reports in telemetry is informational only.
#[derive(Debug, Clone)]
pub struct ValveState {
    current: ValvePosition,
    thresholds: Thresholds,
}

impl ValveState {
    /// Starts with the valve `OFF`.
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            current: ValvePosition::Off,
            thresholds,
        }
    }

    pub fn current(&self) -> ValvePosition {
        self.current
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Evaluate a reading without committing the result.
    pub fn decide(&self, moisture: u32) -> Decision {
        evaluate(self.current, moisture, &self.thresholds)
    }

    /// Commit a decision once its actuation succeeded.
    pub fn apply(&mut self, decision: &Decision) {
        self.current = decision.state;
    }

    /// Manual override: set the position regardless of the thresholds.
    pub fn force(&mut self, position: ValvePosition) {
        self.current = position;
    }
}
