//! Texture options and their merging.
//!
//! Options are slot-independent sampling/upload parameters (wrapping,
//! filtering, mip generation...). Each load receives its own immutable
//! [`OptionSet`], merged from three layers in increasing precedence:
//!
//! 1. schema defaults
//! 2. the values the host supplied in the attribute map
//! 3. overrides read off a referenced scene element
//!
//! Option names are normalised in exactly one place, [`TextureOption::from_name`],
//! through [`OPTION_ALIASES`].

use std::collections::BTreeMap;
use std::fmt;

use crate::resources::attributes::{AttrName, AttrValue};
use crate::resources::constants::{Constant, ConstantKind};
use crate::resources::schema::{AttributeSchema, ResolvedAttributes, Value};

/// A texture option key, named after the resource field it sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureOption {
    Mapping,
    WrapS,
    WrapT,
    MagFilter,
    MinFilter,
    Format,
    Type,
    Anisotropy,
    GenerateMipmaps,
    FlipY,
    PremultiplyAlpha,
}

/// Alternative spellings accepted for option names, mapped to their key.
///
/// `texType` is how the schema exposes the resource's `type` field, since
/// `type` is too generic a name for a material attribute.
pub const OPTION_ALIASES: &[(&str, TextureOption)] = &[
    ("texType", TextureOption::Type),
    ("wrap-s", TextureOption::WrapS),
    ("wrap-t", TextureOption::WrapT),
    ("mag-filter", TextureOption::MagFilter),
    ("min-filter", TextureOption::MinFilter),
    ("generate-mipmaps", TextureOption::GenerateMipmaps),
    ("flip-y", TextureOption::FlipY),
    ("premultiply-alpha", TextureOption::PremultiplyAlpha),
];

impl TextureOption {
    pub const ALL: &'static [TextureOption] = &[
        Self::Mapping,
        Self::WrapS,
        Self::WrapT,
        Self::MagFilter,
        Self::MinFilter,
        Self::Format,
        Self::Type,
        Self::Anisotropy,
        Self::GenerateMipmaps,
        Self::FlipY,
        Self::PremultiplyAlpha,
    ];

    /// The resource field this option sets.
    #[must_use]
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Mapping => "mapping",
            Self::WrapS => "wrapS",
            Self::WrapT => "wrapT",
            Self::MagFilter => "magFilter",
            Self::MinFilter => "minFilter",
            Self::Format => "format",
            Self::Type => "type",
            Self::Anisotropy => "anisotropy",
            Self::GenerateMipmaps => "generateMipmaps",
            Self::FlipY => "flipY",
            Self::PremultiplyAlpha => "premultiplyAlpha",
        }
    }

    /// The attribute name the schema declares for this option.
    #[must_use]
    pub fn schema_name(self) -> &'static str {
        match self {
            Self::Type => "texType",
            other => other.field_name(),
        }
    }

    /// Resolves a field name or any alias.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|o| o.field_name() == name)
            .or_else(|| {
                OPTION_ALIASES
                    .iter()
                    .find(|(alias, _)| *alias == name)
                    .map(|(_, option)| *option)
            })
    }
}

impl fmt::Display for TextureOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

// ============================================================================
// OptionFragment
// ============================================================================

/// A partial set of option values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionFragment(BTreeMap<TextureOption, Value>);

impl OptionFragment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, option: TextureOption, value: Value) {
        self.0.insert(option, value);
    }

    #[must_use]
    pub fn with(mut self, option: TextureOption, value: Value) -> Self {
        self.insert(option, value);
        self
    }

    #[must_use]
    pub fn get(&self, option: TextureOption) -> Option<&Value> {
        self.0.get(&option)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TextureOption, &Value)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }

    /// The option values of a resolved attribute map.
    #[must_use]
    pub fn from_attributes(attributes: &ResolvedAttributes) -> Self {
        Self(
            attributes
                .iter()
                .filter_map(|(name, value)| match name {
                    AttrName::TextureOption(option) => Some((option, value.clone())),
                    _ => None,
                })
                .collect(),
        )
    }

    /// Parses a style string like `wrapS: RepeatWrapping; flipY: false`.
    ///
    /// Entries with unknown keys or values the schema refuses are skipped;
    /// a malformed payload yields an empty fragment rather than an error.
    #[must_use]
    pub fn parse_style(style: &str, schema: &AttributeSchema) -> Self {
        let mut fragment = Self::new();

        for declaration in style.split(';') {
            let declaration = declaration.trim();
            if declaration.is_empty() {
                continue;
            }
            let Some((key, value)) = declaration.split_once(':') else {
                log::debug!("Skipping malformed option declaration `{declaration}`");
                continue;
            };
            let Some(option) = TextureOption::from_name(key) else {
                log::debug!("Skipping unknown texture option `{}`", key.trim());
                continue;
            };
            let raw = AttrValue::Text(value.trim().to_string());
            match schema.parse(option.into(), &raw) {
                Some(Ok(value)) => fragment.insert(option, value),
                Some(Err(e)) => log::debug!("Skipping texture option override: {e}"),
                None => log::debug!("Texture option `{option}` is not declared by the schema"),
            }
        }

        fragment
    }
}

// ============================================================================
// OptionSet
// ============================================================================

/// The complete, immutable options applied to one loaded texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptionSet {
    pub mapping: Constant,
    pub wrap_s: Constant,
    pub wrap_t: Constant,
    pub mag_filter: Constant,
    pub min_filter: Constant,
    pub format: Constant,
    pub texel_type: Constant,
    pub anisotropy: u16,
    pub generate_mipmaps: bool,
    pub flip_y: bool,
    pub premultiply_alpha: bool,
}

impl Default for OptionSet {
    fn default() -> Self {
        Self {
            mapping: Constant::UvMapping,
            wrap_s: Constant::ClampToEdgeWrapping,
            wrap_t: Constant::ClampToEdgeWrapping,
            mag_filter: Constant::LinearFilter,
            min_filter: Constant::LinearMipMapLinearFilter,
            format: Constant::RgbaFormat,
            texel_type: Constant::UnsignedByteType,
            anisotropy: 1,
            generate_mipmaps: true,
            flip_y: true,
            premultiply_alpha: false,
        }
    }
}

impl OptionSet {
    /// Option defaults as declared by a schema.
    #[must_use]
    pub fn from_schema(schema: &AttributeSchema) -> Self {
        let mut set = Self::default();
        for &option in TextureOption::ALL {
            if let Some(value) = schema.default_value(option.into()) {
                set.set(option, value);
            }
        }
        set
    }

    /// Layers `globals` then `element` over `defaults`.
    #[must_use]
    pub fn merge(defaults: &OptionSet, globals: &OptionFragment, element: &OptionFragment) -> Self {
        let mut set = *defaults;
        set.apply(globals);
        set.apply(element);
        set
    }

    pub fn apply(&mut self, fragment: &OptionFragment) {
        for (option, value) in fragment.iter() {
            if !self.set(option, value) {
                log::debug!("Ignoring {value:?} for texture option `{option}`: wrong type");
            }
        }
    }

    /// Sets a single option; returns `false` when the value has the wrong type.
    pub fn set(&mut self, option: TextureOption, value: &Value) -> bool {
        let constant = |kind: ConstantKind| value.as_constant().filter(|c| c.kind() == kind);

        match option {
            TextureOption::Mapping => assign(&mut self.mapping, constant(ConstantKind::Mapping)),
            TextureOption::WrapS => assign(&mut self.wrap_s, constant(ConstantKind::Wrapping)),
            TextureOption::WrapT => assign(&mut self.wrap_t, constant(ConstantKind::Wrapping)),
            TextureOption::MagFilter => assign(&mut self.mag_filter, constant(ConstantKind::Filter)),
            TextureOption::MinFilter => assign(&mut self.min_filter, constant(ConstantKind::Filter)),
            TextureOption::Format => assign(&mut self.format, constant(ConstantKind::PixelFormat)),
            TextureOption::Type => assign(&mut self.texel_type, constant(ConstantKind::TexelType)),
            TextureOption::Anisotropy => assign(
                &mut self.anisotropy,
                value.as_number().map(|n| n.clamp(1.0, f32::from(u16::MAX)) as u16),
            ),
            TextureOption::GenerateMipmaps => assign(&mut self.generate_mipmaps, value.as_bool()),
            TextureOption::FlipY => assign(&mut self.flip_y, value.as_bool()),
            TextureOption::PremultiplyAlpha => assign(&mut self.premultiply_alpha, value.as_bool()),
        }
    }

    /// Reads a single option back as a typed value.
    #[must_use]
    pub fn get(&self, option: TextureOption) -> Value {
        match option {
            TextureOption::Mapping => Value::Constant(self.mapping),
            TextureOption::WrapS => Value::Constant(self.wrap_s),
            TextureOption::WrapT => Value::Constant(self.wrap_t),
            TextureOption::MagFilter => Value::Constant(self.mag_filter),
            TextureOption::MinFilter => Value::Constant(self.min_filter),
            TextureOption::Format => Value::Constant(self.format),
            TextureOption::Type => Value::Constant(self.texel_type),
            TextureOption::Anisotropy => Value::Number(f32::from(self.anisotropy)),
            TextureOption::GenerateMipmaps => Value::Bool(self.generate_mipmaps),
            TextureOption::FlipY => Value::Bool(self.flip_y),
            TextureOption::PremultiplyAlpha => Value::Bool(self.premultiply_alpha),
        }
    }
}

fn assign<T>(field: &mut T, value: Option<T>) -> bool {
    match value {
        Some(v) => {
            *field = v;
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::attributes::AttributeMap;

    fn schema() -> AttributeSchema {
        AttributeSchema::phong().unwrap()
    }

    #[test]
    fn aliases_resolve_to_the_same_key() {
        assert_eq!(TextureOption::from_name("texType"), Some(TextureOption::Type));
        assert_eq!(TextureOption::from_name("type"), Some(TextureOption::Type));
        assert_eq!(TextureOption::from_name(" wrap-s "), Some(TextureOption::WrapS));
        assert_eq!(TextureOption::from_name("wrapU"), None);
    }

    #[test]
    fn schema_defaults_match_builtin_defaults() {
        assert_eq!(OptionSet::from_schema(&schema()), OptionSet::default());
    }

    #[test]
    fn precedence_is_defaults_globals_element() {
        let globals = OptionFragment::new()
            .with(TextureOption::WrapS, Value::Constant(Constant::RepeatWrapping))
            .with(TextureOption::FlipY, Value::Bool(false));
        let element = OptionFragment::new()
            .with(TextureOption::WrapS, Value::Constant(Constant::MirroredRepeatWrapping));

        let set = OptionSet::merge(&OptionSet::default(), &globals, &element);
        assert_eq!(set.wrap_s, Constant::MirroredRepeatWrapping);
        assert!(!set.flip_y);
        assert_eq!(set.wrap_t, Constant::ClampToEdgeWrapping);
    }

    #[test]
    fn merging_twice_is_idempotent() {
        let globals = OptionFragment::new().with(TextureOption::Anisotropy, Value::Number(4.0));
        let element = OptionFragment::new()
            .with(TextureOption::MagFilter, Value::Constant(Constant::NearestFilter));

        let once = OptionSet::merge(&OptionSet::default(), &globals, &element);
        let twice = OptionSet::merge(&once, &globals, &element);
        assert_eq!(once, twice);
        assert_eq!(once, OptionSet::merge(&OptionSet::default(), &globals, &element));
    }

    #[test]
    fn wrong_kind_is_ignored() {
        let fragment = OptionFragment::new()
            .with(TextureOption::WrapS, Value::Constant(Constant::LinearFilter));
        let set = OptionSet::merge(&OptionSet::default(), &fragment, &OptionFragment::new());
        assert_eq!(set.wrap_s, Constant::ClampToEdgeWrapping);
    }

    #[test]
    fn style_parsing_uses_aliases_and_skips_garbage() {
        let fragment = OptionFragment::parse_style(
            "texType: FloatType; wrap-t: RepeatWrapping; bogus; color: red; flipY: maybe",
            &schema(),
        );
        // FloatType is a real constant but not in the schema's enumeration.
        assert_eq!(fragment.get(TextureOption::Type), None);
        assert_eq!(
            fragment.get(TextureOption::WrapT),
            Some(&Value::Constant(Constant::RepeatWrapping))
        );
        assert_eq!(fragment.len(), 1);
    }

    #[test]
    fn malformed_style_yields_empty_fragment() {
        assert!(OptionFragment::parse_style(":::;;", &schema()).is_empty());
        assert!(OptionFragment::parse_style("", &schema()).is_empty());
    }

    #[test]
    fn globals_come_from_resolved_attributes() {
        let raw = AttributeMap::new().with("texType", "ShortType").with("map", "a.png");
        let fragment = OptionFragment::from_attributes(&schema().resolve(&raw));
        assert_eq!(fragment.len(), TextureOption::ALL.len());
        assert_eq!(
            fragment.get(TextureOption::Type),
            Some(&Value::Constant(Constant::ShortType))
        );
    }

    #[test]
    fn get_reads_back_what_set_wrote() {
        let mut set = OptionSet::default();
        assert!(set.set(TextureOption::Anisotropy, &Value::Number(16.0)));
        assert_eq!(set.get(TextureOption::Anisotropy), Value::Number(16.0));
        assert!(!set.set(TextureOption::FlipY, &Value::Number(1.0)));
    }
}
