//! Remote processing modes and the commands that toggle them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// A remote processing pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    #[default]
    Detection,
    #[serde(rename = "facerecognition")]
    FaceRecognition,
}

impl ProcessingMode {
    pub const ALL: [ProcessingMode; 2] = [ProcessingMode::Detection, ProcessingMode::FaceRecognition];

    /// Path segment under `{api}/process/`.
    pub fn endpoint(&self) -> &'static str {
        match self {
            ProcessingMode::Detection => "detection",
            ProcessingMode::FaceRecognition => "facerecognition",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProcessingMode::Detection => "Detection",
            ProcessingMode::FaceRecognition => "Face Recognition",
        }
    }

    /// The mode that is not `self`.
    pub fn other(&self) -> ProcessingMode {
        match self {
            ProcessingMode::Detection => ProcessingMode::FaceRecognition,
            ProcessingMode::FaceRecognition => ProcessingMode::Detection,
        }
    }
}

impl FromStr for ProcessingMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "detection" => Ok(ProcessingMode::Detection),
            "facerecognition" => Ok(ProcessingMode::FaceRecognition),
            _ => Err(ParseError::Mode(s.to_string())),
        }
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeAction {
    On,
    Off,
}

/// Body of `POST {api}/process/{mode}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessCommand {
    pub action: ModeAction,
    pub drone_id: String,
}

impl ProcessCommand {
    pub fn on(drone_id: impl Into<String>) -> Self {
        Self {
            action: ModeAction::On,
            drone_id: drone_id.into(),
        }
    }

    pub fn off(drone_id: impl Into<String>) -> Self {
        Self {
            action: ModeAction::Off,
            drone_id: drone_id.into(),
        }
    }
}

/// What the dashboard believes is running remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActiveMode {
    Detection,
    FaceRecognition,
    AllOff,
}

impl ActiveMode {
    pub fn label(&self) -> &'static str {
        match self {
            ActiveMode::Detection => "Detection",
            ActiveMode::FaceRecognition => "Face Recognition",
            ActiveMode::AllOff => "All Modes Off",
        }
    }
}

/// Last confirmed mode plus the all-off flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeState {
    pub mode: ProcessingMode,
    pub all_off: bool,
}

impl ModeState {
    /// Record a confirmed switch to `mode`.
    pub fn switched_to(&mut self, mode: ProcessingMode) {
        self.mode = mode;
        self.all_off = false;
    }

    /// Record a confirmed all-off. The last mode is kept for display.
    pub fn turned_off(&mut self) {
        self.all_off = true;
    }

    pub fn active(&self) -> ActiveMode {
        match (self.all_off, self.mode) {
            (true, _) => ActiveMode::AllOff,
            (false, ProcessingMode::Detection) => ActiveMode::Detection,
            (false, ProcessingMode::FaceRecognition) => ActiveMode::FaceRecognition,
        }
    }
}

/// How `switch_mode` treats the mode that was running before.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModeSwitchPolicy {
    /// Only send "on" for the target; the backend is trusted to keep modes
    /// exclusive.
    #[default]
    ActivateOnly,
    /// Also send "off" for the other mode, and require both to succeed.
    Exclusive,
}

impl FromStr for ModeSwitchPolicy {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "activate-only" | "activate_only" | "activate" => Ok(ModeSwitchPolicy::ActivateOnly),
            "exclusive" => Ok(ModeSwitchPolicy::Exclusive),
            _ => Err(ParseError::ModePolicy(s.to_string())),
        }
    }
}

impl ModeSwitchPolicy {
    /// Commands needed to move from `state` to `target`, in send order.
    pub fn plan(
        &self,
        state: &ModeState,
        target: ProcessingMode,
    ) -> Vec<(ProcessingMode, ModeAction)> {
        let mut steps = vec![(target, ModeAction::On)];
        if *self == ModeSwitchPolicy::Exclusive && !state.all_off {
            steps.push((target.other(), ModeAction::Off));
        }
        steps
    }
}
