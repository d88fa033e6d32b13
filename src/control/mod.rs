//! Control policy: the decision layer between telemetry and actuation.

pub mod hysteresis;

pub use hysteresis::{
    Decision, Polarity, PolicyEvent, Thresholds, ValvePosition, ValveState, evaluate,
};
