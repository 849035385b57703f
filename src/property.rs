use std::fmt;
use std::str::FromStr;

use bevy::log::warn;
use bevy::reflect::Reflect;
use serde::{Deserialize, Serialize};

use crate::error::LerpError;

/// A transform property that can be interpolated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, Reflect)]
#[serde(rename_all = "lowercase")]
pub enum LerpProperty {
    Position,
    /// Euler angles in degrees, interpolated as a quaternion.
    Rotation,
    Scale,
}

impl LerpProperty {
    pub const ALL: [LerpProperty; 3] = [Self::Position, Self::Rotation, Self::Scale];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Rotation => "rotation",
            Self::Scale => "scale",
        }
    }
}

impl fmt::Display for LerpProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LerpProperty {
    type Err = LerpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "position" => Ok(Self::Position),
            "rotation" => Ok(Self::Rotation),
            "scale" => Ok(Self::Scale),
            other => Err(LerpError::UnknownProperty(other.to_string())),
        }
    }
}

/// The set of properties an entity interpolates.
///
/// Defaults to all three.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, Reflect)]
pub struct LerpProperties {
    position: bool,
    rotation: bool,
    scale: bool,
}

impl Default for LerpProperties {
    fn default() -> Self {
        Self::all()
    }
}

impl LerpProperties {
    pub fn all() -> Self {
        Self {
            position: true,
            rotation: true,
            scale: true,
        }
    }

    pub fn none() -> Self {
        Self {
            position: false,
            rotation: false,
            scale: false,
        }
    }

    pub fn only(property: LerpProperty) -> Self {
        let mut properties = Self::none();
        properties.insert(property);
        properties
    }

    /// Builds a set from property names, skipping names that are not
    /// `position`, `rotation` or `scale`.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut properties = Self::none();
        for name in names {
            match name.parse::<LerpProperty>() {
                Ok(property) => properties.insert(property),
                Err(err) => warn!("ignoring lerp property: {err}"),
            }
        }
        properties
    }

    fn flag_mut(&mut self, property: LerpProperty) -> &mut bool {
        match property {
            LerpProperty::Position => &mut self.position,
            LerpProperty::Rotation => &mut self.rotation,
            LerpProperty::Scale => &mut self.scale,
        }
    }

    pub fn insert(&mut self, property: LerpProperty) {
        *self.flag_mut(property) = true;
    }

    pub fn remove(&mut self, property: LerpProperty) {
        *self.flag_mut(property) = false;
    }

    pub fn contains(&self, property: LerpProperty) -> bool {
        match property {
            LerpProperty::Position => self.position,
            LerpProperty::Rotation => self.rotation,
            LerpProperty::Scale => self.scale,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.position || self.rotation || self.scale)
    }

    /// Iterates the contained properties in position, rotation, scale order.
    pub fn iter(&self) -> impl Iterator<Item = LerpProperty> + '_ {
        LerpProperty::ALL
            .into_iter()
            .filter(move |property| self.contains(*property))
    }
}

impl FromIterator<LerpProperty> for LerpProperties {
    fn from_iter<I: IntoIterator<Item = LerpProperty>>(iter: I) -> Self {
        let mut properties = Self::none();
        for property in iter {
            properties.insert(property);
        }
        properties
    }
}
