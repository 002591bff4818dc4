//! Steps, phases and the three-phase sequence value

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single recorded action: click at `(x, y)`, then wait `delay_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    #[serde(deserialize_with = "coordinate")]
    pub x: i32,
    #[serde(deserialize_with = "coordinate")]
    pub y: i32,
    #[serde(rename = "interval")]
    pub delay_ms: u64,
}

impl Step {
    pub fn new(x: i32, y: i32, delay_ms: u64) -> Self {
        Self { x, y, delay_ms }
    }
}

/// Integer or float pixel coordinate, rounded to the nearest pixel.
fn coordinate<'de, D>(deserializer: D) -> std::result::Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?.round();
    if !value.is_finite() || value < f64::from(i32::MIN) || value > f64::from(i32::MAX) {
        return Err(serde::de::Error::custom(format!(
            "coordinate {} out of range",
            value
        )));
    }
    Ok(value as i32)
}

/// Ordered playback stage. PRE and MAIN honor cancellation, POST never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "pre")]
    Pre,
    #[serde(rename = "clicks")]
    Main,
    #[serde(rename = "post")]
    Post,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Pre, Phase::Main, Phase::Post];

    pub fn name(self) -> &'static str {
        match self {
            Phase::Pre => "pre",
            Phase::Main => "main",
            Phase::Post => "post",
        }
    }

    pub fn is_cancellable(self) -> bool {
        !matches!(self, Phase::Post)
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Phase::Pre => 0,
            Phase::Main => 1,
            Phase::Post => 2,
        }
    }

    pub(crate) fn from_index(i: u8) -> Phase {
        match i {
            0 => Phase::Pre,
            2 => Phase::Post,
            _ => Phase::Main,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePhaseError(String);

impl fmt::Display for ParsePhaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown phase '{}' (expected pre, main or post)", self.0)
    }
}

impl std::error::Error for ParsePhaseError {}

impl FromStr for Phase {
    type Err = ParsePhaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pre" => Ok(Phase::Pre),
            "main" | "clicks" => Ok(Phase::Main),
            "post" => Ok(Phase::Post),
            _ => Err(ParsePhaseError(s.to_string())),
        }
    }
}

/// All three phases' steps. Every phase is always present, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequences {
    phases: [Vec<Step>; 3],
}

impl Sequences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_phases(pre: Vec<Step>, main: Vec<Step>, post: Vec<Step>) -> Self {
        Self {
            phases: [pre, main, post],
        }
    }

    pub fn phase(&self, phase: Phase) -> &[Step] {
        &self.phases[phase.index()]
    }

    pub fn phase_mut(&mut self, phase: Phase) -> &mut Vec<Step> {
        &mut self.phases[phase.index()]
    }

    pub fn total_steps(&self) -> usize {
        self.phases.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_steps() == 0
    }
}
