//! Attribute names and raw attribute maps.
//!
//! The host delivers the full attribute map of a component on every change.
//! Names are matched against a closed set ([`AttrName`]); values arrive as
//! loosely typed [`AttrValue`]s and are typed by the schema.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::errors::Result;
use crate::resources::options::TextureOption;

// ============================================================================
// Raw Values
// ============================================================================

/// A value as the host supplies it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl AttrValue {
    /// Short description used in error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<f32> for AttrValue {
    fn from(value: f32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// The full attribute map delivered by the host on each update.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct AttributeMap(BTreeMap<String, AttrValue>);

impl AttributeMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a map from a JSON object such as `{"map": "a.png", "wrapS": "RepeatWrapping"}`.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<AttrValue> {
        self.0.remove(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<AttrValue>> FromIterator<(K, V)> for AttributeMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// ============================================================================
// Attribute Names
// ============================================================================

macro_rules! named_enum {
    ($(#[$meta:meta])* $name:ident { $( $variant:ident => $text:literal ),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $( $variant, )*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[ $( $name::$variant, )* ];

            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $text, )*
                }
            }

            #[must_use]
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $( $text => Some($name::$variant), )*
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

named_enum! {
    /// A texture binding point on the material.
    MapSlot {
        Map => "map",
        LightMap => "lightMap",
        AoMap => "aoMap",
        EmissiveMap => "emissiveMap",
        BumpMap => "bumpMap",
        NormalMap => "normalMap",
        SpecularMap => "specularMap",
        AlphaMap => "alphaMap",
        DisplacementMap => "displacementMap",
        EnvMap => "envMap",
    }
}

named_enum! {
    /// A material attribute applied directly, without loading anything.
    ScalarAttr {
        Color => "color",
        DisplacementScale => "displacementScale",
        DisplacementBias => "displacementBias",
        Fog => "fog",
        Shading => "shading",
        Wireframe => "wireframe",
        WireframeLinewidth => "wireframeLinewidth",
        WireframeLinecap => "wireframeLinecap",
        WireframeLinejoin => "wireframeLinejoin",
        VertexColors => "vertexColors",
        Skinning => "skinning",
        MorphTargets => "morphTargets",
        MorphNormals => "morphNormals",
    }
}

/// Every attribute the schema recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttrName {
    Slot(MapSlot),
    Scalar(ScalarAttr),
    TextureOption(TextureOption),
}

impl AttrName {
    /// The name as it appears in attribute maps.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slot(s) => s.as_str(),
            Self::Scalar(s) => s.as_str(),
            Self::TextureOption(o) => o.schema_name(),
        }
    }

    /// Matches a host-facing attribute name. Option aliases are not accepted
    /// here; they only apply to per-element option payloads.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        MapSlot::from_name(name)
            .map(Self::Slot)
            .or_else(|| ScalarAttr::from_name(name).map(Self::Scalar))
            .or_else(|| {
                TextureOption::ALL
                    .iter()
                    .copied()
                    .find(|o| o.schema_name() == name)
                    .map(Self::TextureOption)
            })
    }

    #[must_use]
    pub fn all() -> impl Iterator<Item = AttrName> {
        MapSlot::ALL
            .iter()
            .copied()
            .map(Self::Slot)
            .chain(ScalarAttr::ALL.iter().copied().map(Self::Scalar))
            .chain(TextureOption::ALL.iter().copied().map(Self::TextureOption))
    }
}

impl fmt::Display for AttrName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<MapSlot> for AttrName {
    fn from(slot: MapSlot) -> Self {
        Self::Slot(slot)
    }
}

impl From<ScalarAttr> for AttrName {
    fn from(attr: ScalarAttr) -> Self {
        Self::Scalar(attr)
    }
}

impl From<TextureOption> for AttrName {
    fn from(option: TextureOption) -> Self {
        Self::TextureOption(option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for name in AttrName::all() {
            assert_eq!(AttrName::from_name(name.as_str()), Some(name));
        }
    }

    #[test]
    fn tex_type_is_the_schema_name_of_the_type_option() {
        assert_eq!(
            AttrName::from_name("texType"),
            Some(AttrName::TextureOption(TextureOption::Type))
        );
        assert_eq!(AttrName::from_name("type"), None);
    }

    #[test]
    fn json_map_parses_mixed_values() {
        let map = AttributeMap::from_json(
            r#"{"map": "a.png", "fog": false, "anisotropy": 4, "envMap": null}"#,
        )
        .unwrap();
        assert_eq!(map.get("map"), Some(&AttrValue::Text("a.png".into())));
        assert_eq!(map.get("fog"), Some(&AttrValue::Bool(false)));
        assert_eq!(map.get("anisotropy"), Some(&AttrValue::Number(4.0)));
        assert_eq!(map.get("envMap"), Some(&AttrValue::Null));
    }
}
