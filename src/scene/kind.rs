//! Layer kinds of a scene.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StudioError;
use crate::history::LayerId;

/// The compositing slots a scene generates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// The isolated main subject, on a transparent background.
    Object,
    /// The environment without the subject.
    Background,
    /// Lighting, glow and atmosphere effects only.
    Light,
    /// The whole scene rendered as one image.
    Combo,
    /// Free-form prompt supplied by the user.
    Custom,
}

impl LayerKind {
    /// Kinds produced by a full scene generation, in generation order.
    pub const SCENE: [LayerKind; 4] = [
        LayerKind::Object,
        LayerKind::Background,
        LayerKind::Light,
        LayerKind::Combo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Background => "background",
            Self::Light => "light",
            Self::Combo => "combo",
            Self::Custom => "custom",
        }
    }

    /// Default layer id for this kind.
    pub fn layer_id(&self) -> LayerId {
        LayerId::from(self.as_str())
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayerKind {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "object" | "subject" => Ok(Self::Object),
            "background" | "bg" => Ok(Self::Background),
            "light" | "lighting" => Ok(Self::Light),
            "combo" | "combined" => Ok(Self::Combo),
            "custom" => Ok(Self::Custom),
            _ => Err(StudioError::UnknownLayerKind {
                kind: s.to_string(),
            }),
        }
    }
}
