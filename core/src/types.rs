use serde::{Deserialize, Serialize};

pub type ActorId = String;

/// An actor as declared by the host before a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorDecl {
    pub id: ActorId,
    pub name: String,
    #[serde(default)]
    pub image_ref: String,
}

impl ActorDecl {
    pub fn new(id: impl Into<String>, name: impl Into<String>, image_ref: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image_ref: image_ref.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Background {
    pub image_ref: String,
    #[serde(default)]
    pub name: String,
}

/// Stage-centered coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// What an actor is currently saying or thinking
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "lowercase")]
pub enum Speech {
    #[default]
    None,
    Say(String),
    Think(String),
}

/// Mutable visual state of one on-stage actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorState {
    pub id: ActorId,
    pub name: String,
    pub image_ref: String,
    pub position: Position,
    /// Degrees, 0 = forward/north. Never wrapped.
    pub heading: f64,
    pub scale: f64,
    pub visible: bool,
    pub speech: Speech,
}

impl ActorState {
    /// Fresh state for a declared actor: centered, facing north, visible, silent
    pub fn from_decl(decl: &ActorDecl) -> Self {
        Self {
            id: decl.id.clone(),
            name: decl.name.clone(),
            image_ref: decl.image_ref.clone(),
            position: Position::default(),
            heading: 0.0,
            scale: 1.0,
            visible: true,
            speech: Speech::None,
        }
    }

    pub fn apply(&mut self, patch: ActorPatch) {
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(heading) = patch.heading {
            self.heading = heading;
        }
        if let Some(scale) = patch.scale {
            self.scale = scale;
        }
        if let Some(visible) = patch.visible {
            self.visible = visible;
        }
        if let Some(speech) = patch.speech {
            self.speech = speech;
        }
    }
}

/// Partial actor state, merged field by field by `ActorState::apply`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActorPatch {
    pub position: Option<Position>,
    pub heading: Option<f64>,
    pub scale: Option<f64>,
    pub visible: Option<bool>,
    pub speech: Option<Speech>,
}

impl ActorPatch {
    pub fn position(position: Position) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    pub fn heading(heading: f64) -> Self {
        Self {
            heading: Some(heading),
            ..Self::default()
        }
    }

    pub fn visible(visible: bool) -> Self {
        Self {
            visible: Some(visible),
            ..Self::default()
        }
    }

    pub fn speech(speech: Speech) -> Self {
        Self {
            speech: Some(speech),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
