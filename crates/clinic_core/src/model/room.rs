//! Consultation and procedure rooms.

use crate::model::validation::{require_text, ValidationResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type RoomId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    #[default]
    Consultation,
    Procedure,
    Imaging,
    Laboratory,
}

impl RoomKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Consultation => "consultation",
            Self::Procedure => "procedure",
            Self::Imaging => "imaging",
            Self::Laboratory => "laboratory",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "consultation" => Some(Self::Consultation),
            "procedure" => Some(Self::Procedure),
            "imaging" => Some(Self::Imaging),
            "laboratory" => Some(Self::Laboratory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub uuid: RoomId,
    /// Human-facing room code, unique case-insensitively.
    pub code: String,
    pub floor: Option<i64>,
    pub kind: RoomKind,
}

impl Room {
    pub fn new(code: impl Into<String>, kind: RoomKind) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            code: code.into(),
            floor: None,
            kind,
        }
    }

    pub fn validate(&self) -> ValidationResult {
        require_text("code", &self.code)
    }
}
