//! Attribute Schema
//!
//! Declares every attribute the material component recognises: its default,
//! the value kind it is parsed into, and an optional enumeration of legal
//! values. The schema is validated once when it is built and is immutable
//! afterwards; it never holds per-load state.
//!
//! [`AttributeSchema::resolve`] types a raw [`AttributeMap`]. Values the schema
//! rejects are replaced by their default and reported as
//! [`OptionParseError`]s, so one bad attribute never blocks the others.

use glam::Vec4;
use rustc_hash::FxHashMap;

use crate::errors::{OptionParseError, SchemaError};
use crate::resources::attributes::{AttrName, AttrValue, AttributeMap, MapSlot, ScalarAttr};
use crate::resources::constants::{Constant, ConstantKind};
use crate::resources::options::TextureOption;

// ============================================================================
// Typed Values
// ============================================================================

/// How an attribute's raw value is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Number,
    /// `#RGB`, `#RRGGBB`, or a packed `0xRRGGBB` number.
    Color,
    Text,
    /// A texture source string; null means "no texture".
    Source,
    Constant(ConstantKind),
}

/// A schema-typed attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Number(f32),
    Color(Vec4),
    Text(String),
    Source(Option<String>),
    Constant(Constant),
}

impl Value {
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f32> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_constant(&self) -> Option<Constant> {
        match self {
            Self::Constant(c) => Some(*c),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_source(&self) -> Option<&str> {
        match self {
            Self::Source(s) => s.as_deref(),
            _ => None,
        }
    }
}

/// Parses `#RGB`, `#RRGGBB` (with or without `#`) into an opaque linear-space-agnostic RGBA color.
#[must_use]
pub fn parse_color(text: &str) -> Option<Vec4> {
    let hex = text.trim().strip_prefix('#').unwrap_or(text.trim());
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return None,
    };
    let packed = u32::from_str_radix(&expanded, 16).ok()?;
    Some(unpack_color(packed))
}

/// Unpacks a `0xRRGGBB` integer into an opaque RGBA color.
#[must_use]
pub fn unpack_color(packed: u32) -> Vec4 {
    let channel = |shift: u32| ((packed >> shift) & 0xFF) as f32 / 255.0;
    Vec4::new(channel(16), channel(8), channel(0), 1.0)
}

impl ValueKind {
    /// Parses a raw value into this kind, checking `one_of` when present.
    pub fn coerce(
        self,
        attribute: AttrName,
        raw: &AttrValue,
        one_of: Option<&'static [&'static str]>,
    ) -> Result<Value, OptionParseError> {
        let mismatch = || OptionParseError::TypeMismatch {
            attribute,
            expected: self,
            found: raw.describe(),
        };

        if let (Some(allowed), AttrValue::Text(text)) = (one_of, raw) {
            if !allowed.contains(&text.trim()) {
                return Err(OptionParseError::NotAllowed {
                    attribute,
                    value: text.clone(),
                    allowed,
                });
            }
        }

        match (self, raw) {
            (Self::Bool, AttrValue::Bool(b)) => Ok(Value::Bool(*b)),
            (Self::Bool, AttrValue::Text(t)) => match t.trim() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(mismatch()),
            },
            (Self::Number, AttrValue::Number(n)) => Some(*n as f32)
                .filter(|n| n.is_finite())
                .map(Value::Number)
                .ok_or_else(mismatch),
            (Self::Number, AttrValue::Text(t)) => t
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|n| n.is_finite())
                .map(Value::Number)
                .ok_or_else(mismatch),
            (Self::Color, AttrValue::Text(t)) => {
                parse_color(t).map(Value::Color).ok_or_else(|| OptionParseError::InvalidColor {
                    attribute,
                    value: t.clone(),
                })
            }
            (Self::Color, AttrValue::Number(n)) if *n >= 0.0 && *n <= f64::from(0x00FF_FFFF) => {
                Ok(Value::Color(unpack_color(*n as u32)))
            }
            (Self::Text, AttrValue::Text(t)) => Ok(Value::Text(t.clone())),
            (Self::Source, AttrValue::Null) => Ok(Value::Source(None)),
            // Blank text is still a request; only null clears.
            (Self::Source, AttrValue::Text(t)) => Ok(Value::Source(Some(t.trim().to_string()))),
            (Self::Constant(kind), AttrValue::Text(t)) => Constant::from_name_of_kind(t.trim(), kind)
                .map(Value::Constant)
                .ok_or_else(|| OptionParseError::UnknownConstant {
                    attribute,
                    value: t.clone(),
                }),
            _ => Err(mismatch()),
        }
    }
}

// ============================================================================
// Schema Declaration
// ============================================================================

/// One declared attribute.
#[derive(Debug, Clone)]
pub struct AttributeSpec {
    pub name: AttrName,
    pub kind: ValueKind,
    /// Default in host form; parsed and checked when the schema is built.
    pub default: AttrValue,
    pub one_of: Option<&'static [&'static str]>,
}

impl AttributeSpec {
    #[must_use]
    pub fn new(name: impl Into<AttrName>, kind: ValueKind, default: impl Into<AttrValue>) -> Self {
        Self {
            name: name.into(),
            kind,
            default: default.into(),
            one_of: None,
        }
    }

    #[must_use]
    pub fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.one_of = Some(allowed);
        self
    }
}

#[derive(Debug, Clone)]
struct CompiledSpec {
    spec: AttributeSpec,
    default: Value,
}

/// Immutable, validated set of attribute declarations.
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    specs: FxHashMap<AttrName, CompiledSpec>,
}

const WRAPPING: &[&str] = &["ClampToEdgeWrapping", "RepeatWrapping", "MirroredRepeatWrapping"];

impl AttributeSchema {
    /// Builds a schema, validating every default and enumeration.
    pub fn new(specs: impl IntoIterator<Item = AttributeSpec>) -> Result<Self, SchemaError> {
        let mut compiled = FxHashMap::default();

        for spec in specs {
            let attribute = spec.name.as_str();

            if let (Some(allowed), ValueKind::Constant(kind)) = (spec.one_of, spec.kind) {
                if let Some(bad) = allowed
                    .iter()
                    .find(|name| Constant::from_name_of_kind(name, kind).is_none())
                {
                    return Err(SchemaError {
                        attribute,
                        reason: format!("enumeration entry `{bad}` is not a {kind:?} constant"),
                    });
                }
            }

            let default = spec
                .kind
                .coerce(spec.name, &spec.default, spec.one_of)
                .map_err(|e| SchemaError {
                    attribute,
                    reason: format!("invalid default: {e}"),
                })?;

            if compiled
                .insert(spec.name, CompiledSpec { spec, default })
                .is_some()
            {
                return Err(SchemaError {
                    attribute,
                    reason: "declared twice".to_string(),
                });
            }
        }

        Ok(Self { specs: compiled })
    }

    /// The schema of the Phong material component.
    pub fn phong() -> Result<Self, SchemaError> {
        use ValueKind as K;

        let mut specs: Vec<AttributeSpec> = MapSlot::ALL
            .iter()
            .map(|&slot| AttributeSpec::new(slot, K::Source, AttrValue::Null))
            .collect();

        specs.extend([
            AttributeSpec::new(ScalarAttr::Color, K::Color, "#FFF"),
            AttributeSpec::new(ScalarAttr::DisplacementScale, K::Number, 1.0),
            AttributeSpec::new(ScalarAttr::DisplacementBias, K::Number, 0.0),
            AttributeSpec::new(ScalarAttr::Fog, K::Bool, true),
            AttributeSpec::new(
                ScalarAttr::Shading,
                K::Constant(ConstantKind::Shading),
                "SmoothShading",
            ),
            AttributeSpec::new(ScalarAttr::Wireframe, K::Bool, false),
            AttributeSpec::new(ScalarAttr::WireframeLinewidth, K::Number, 1.0),
            AttributeSpec::new(ScalarAttr::WireframeLinecap, K::Text, "round")
                .one_of(&["butt", "round", "square"]),
            AttributeSpec::new(ScalarAttr::WireframeLinejoin, K::Text, "round")
                .one_of(&["round", "bevel", "miter"]),
            AttributeSpec::new(
                ScalarAttr::VertexColors,
                K::Constant(ConstantKind::VertexColors),
                "NoColors",
            ),
            AttributeSpec::new(ScalarAttr::Skinning, K::Bool, false),
            AttributeSpec::new(ScalarAttr::MorphTargets, K::Bool, false),
            AttributeSpec::new(ScalarAttr::MorphNormals, K::Bool, false),
        ]);

        specs.extend([
            AttributeSpec::new(
                TextureOption::Mapping,
                K::Constant(ConstantKind::Mapping),
                "UVMapping",
            )
            .one_of(&[
                "UVMapping",
                "CubeReflectionMapping",
                "CubeRefractionMapping",
                "SphericalReflectionMapping",
            ]),
            AttributeSpec::new(
                TextureOption::WrapS,
                K::Constant(ConstantKind::Wrapping),
                "ClampToEdgeWrapping",
            )
            .one_of(WRAPPING),
            AttributeSpec::new(
                TextureOption::WrapT,
                K::Constant(ConstantKind::Wrapping),
                "ClampToEdgeWrapping",
            )
            .one_of(WRAPPING),
            AttributeSpec::new(
                TextureOption::MagFilter,
                K::Constant(ConstantKind::Filter),
                "LinearFilter",
            )
            .one_of(&["LinearFilter", "NearestFilter"]),
            AttributeSpec::new(
                TextureOption::MinFilter,
                K::Constant(ConstantKind::Filter),
                "LinearMipMapLinearFilter",
            )
            .one_of(&[
                "LinearMipMapLinearFilter",
                "NearestFilter",
                "NearestMipMapNearestFilter",
                "NearestMipMapLinearFilter",
                "LinearFilter",
                "LinearMipMapNearestFilter",
            ]),
            AttributeSpec::new(
                TextureOption::Format,
                K::Constant(ConstantKind::PixelFormat),
                "RGBAFormat",
            )
            .one_of(&[
                "RGBAFormat",
                "AlphaFormat",
                "RGBFormat",
                "LuminanceFormat",
                "LuminanceAlphaFormat",
                "RGB_S3TC_DXT1_Format",
                "RGBA_S3TC_DXT1_Format",
                "RGBA_S3TC_DXT3_Format",
                "RGBA_S3TC_DXT5_Format",
            ]),
            AttributeSpec::new(
                TextureOption::Type,
                K::Constant(ConstantKind::TexelType),
                "UnsignedByteType",
            )
            .one_of(&[
                "UnsignedByteType",
                "ByteType",
                "ShortType",
                "UnsignedShortType",
                "UnsignedIntType",
                "UnsignedShort4444Type",
                "UnsignedShort5551Type",
                "UnsignedShort565Type",
            ]),
            AttributeSpec::new(TextureOption::Anisotropy, K::Number, 1.0),
            AttributeSpec::new(TextureOption::GenerateMipmaps, K::Bool, true),
            AttributeSpec::new(TextureOption::FlipY, K::Bool, true),
            AttributeSpec::new(TextureOption::PremultiplyAlpha, K::Bool, false),
        ]);

        Self::new(specs)
    }

    #[must_use]
    pub fn spec(&self, name: AttrName) -> Option<&AttributeSpec> {
        self.specs.get(&name).map(|c| &c.spec)
    }

    /// The parsed default of an attribute.
    #[must_use]
    pub fn default_value(&self, name: AttrName) -> Option<&Value> {
        self.specs.get(&name).map(|c| &c.default)
    }

    /// Parses one raw value against the attribute's declaration.
    pub fn parse(&self, name: AttrName, raw: &AttrValue) -> Option<Result<Value, OptionParseError>> {
        let compiled = self.specs.get(&name)?;
        Some(compiled.spec.kind.coerce(name, raw, compiled.spec.one_of))
    }

    /// Types a full attribute map. Missing attributes take their default;
    /// rejected ones take their default and are reported.
    #[must_use]
    pub fn resolve(&self, raw: &AttributeMap) -> ResolvedAttributes {
        let mut values = FxHashMap::default();
        let mut rejected = Vec::new();

        for (key, _) in raw.iter() {
            if AttrName::from_name(key).is_none_or(|name| !self.specs.contains_key(&name)) {
                log::debug!("Ignoring unknown attribute `{key}`");
            }
        }

        for (name, compiled) in &self.specs {
            let value = match raw.get(name.as_str()) {
                None => compiled.default.clone(),
                Some(value) => match compiled.spec.kind.coerce(*name, value, compiled.spec.one_of) {
                    Ok(v) => v,
                    Err(e) => {
                        rejected.push(e);
                        compiled.default.clone()
                    }
                },
            };
            values.insert(*name, value);
        }

        // Stable report order regardless of hash iteration.
        rejected.sort_by_key(OptionParseError::attribute);

        ResolvedAttributes { values, rejected }
    }
}

// ============================================================================
// Resolved Attributes
// ============================================================================

/// A fully typed attribute map produced by [`AttributeSchema::resolve`].
#[derive(Debug, Clone, Default)]
pub struct ResolvedAttributes {
    values: FxHashMap<AttrName, Value>,
    rejected: Vec<OptionParseError>,
}

impl ResolvedAttributes {
    #[must_use]
    pub fn get(&self, name: impl Into<AttrName>) -> Option<&Value> {
        self.values.get(&name.into())
    }

    /// The requested source of a texture slot, if any.
    #[must_use]
    pub fn source(&self, slot: MapSlot) -> Option<&str> {
        self.get(slot).and_then(Value::as_source)
    }

    /// Values the schema refused, in attribute order.
    #[must_use]
    pub fn rejected(&self) -> &[OptionParseError] {
        &self.rejected
    }

    pub fn iter(&self) -> impl Iterator<Item = (AttrName, &Value)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }
}
