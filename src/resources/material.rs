//! Material Record
//!
//! The mutable record the renderer reads every frame: one field per scalar
//! attribute, one texture field per [`MapSlot`], and a dirty flag.
//!
//! Two writers touch it, each on its own fields:
//! - [`MaterialRecord::apply_scalar`] for scalar attributes
//! - [`MaterialRecord::bind_texture`] (the binder) for texture slots
//!
//! Both only mark the record dirty when something actually changed. Clearing
//! the flag is the renderer's job ([`MaterialRecord::take_dirty`]).

use std::sync::Arc;

use glam::{Vec3, Vec4};
use parking_lot::RwLock;

use crate::resources::attributes::{MapSlot, ScalarAttr};
use crate::resources::constants::Constant;
use crate::resources::schema::{Value, unpack_color};
use crate::resources::texture::Texture;
use crate::resources::version_tracker::ChangeTracker;

/// A material record shared between the binding engine and the renderer.
pub type SharedMaterial = Arc<RwLock<MaterialRecord>>;

/// One optional texture per slot.
#[derive(Debug, Clone, Default)]
pub struct MaterialTextures {
    pub map: Option<Arc<Texture>>,
    pub light_map: Option<Arc<Texture>>,
    pub ao_map: Option<Arc<Texture>>,
    pub emissive_map: Option<Arc<Texture>>,
    pub bump_map: Option<Arc<Texture>>,
    pub normal_map: Option<Arc<Texture>>,
    pub specular_map: Option<Arc<Texture>>,
    pub alpha_map: Option<Arc<Texture>>,
    pub displacement_map: Option<Arc<Texture>>,
    pub env_map: Option<Arc<Texture>>,
}

impl MaterialTextures {
    #[must_use]
    pub fn get(&self, slot: MapSlot) -> Option<&Arc<Texture>> {
        self.field(slot).as_ref()
    }

    fn field(&self, slot: MapSlot) -> &Option<Arc<Texture>> {
        match slot {
            MapSlot::Map => &self.map,
            MapSlot::LightMap => &self.light_map,
            MapSlot::AoMap => &self.ao_map,
            MapSlot::EmissiveMap => &self.emissive_map,
            MapSlot::BumpMap => &self.bump_map,
            MapSlot::NormalMap => &self.normal_map,
            MapSlot::SpecularMap => &self.specular_map,
            MapSlot::AlphaMap => &self.alpha_map,
            MapSlot::DisplacementMap => &self.displacement_map,
            MapSlot::EnvMap => &self.env_map,
        }
    }

    fn field_mut(&mut self, slot: MapSlot) -> &mut Option<Arc<Texture>> {
        match slot {
            MapSlot::Map => &mut self.map,
            MapSlot::LightMap => &mut self.light_map,
            MapSlot::AoMap => &mut self.ao_map,
            MapSlot::EmissiveMap => &mut self.emissive_map,
            MapSlot::BumpMap => &mut self.bump_map,
            MapSlot::NormalMap => &mut self.normal_map,
            MapSlot::SpecularMap => &mut self.specular_map,
            MapSlot::AlphaMap => &mut self.alpha_map,
            MapSlot::DisplacementMap => &mut self.displacement_map,
            MapSlot::EnvMap => &mut self.env_map,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (MapSlot, &Arc<Texture>)> {
        MapSlot::ALL
            .iter()
            .filter_map(|&slot| self.get(slot).map(|t| (slot, t)))
    }
}

/// Phong material state as seen by the renderer.
#[derive(Debug)]
pub struct MaterialRecord {
    pub color: Vec4,
    pub specular: Vec3,
    pub shininess: f32,
    /// Lit materials receive scene lighting even though they are created
    /// outside the scene's own material pass.
    pub lights: bool,

    pub displacement_scale: f32,
    pub displacement_bias: f32,
    pub fog: bool,
    pub shading: Constant,
    pub wireframe: bool,
    pub wireframe_linewidth: f32,
    pub wireframe_linecap: String,
    pub wireframe_linejoin: String,
    pub vertex_colors: Constant,
    pub skinning: bool,
    pub morph_targets: bool,
    pub morph_normals: bool,

    textures: MaterialTextures,
    tracker: ChangeTracker,
}

impl Default for MaterialRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialRecord {
    #[must_use]
    pub fn new() -> Self {
        Self {
            color: unpack_color(0x0033ff),
            specular: unpack_color(0x555555).truncate(),
            shininess: 30.0,
            lights: true,

            displacement_scale: 1.0,
            displacement_bias: 0.0,
            fog: true,
            shading: Constant::SmoothShading,
            wireframe: false,
            wireframe_linewidth: 1.0,
            wireframe_linecap: "round".to_string(),
            wireframe_linejoin: "round".to_string(),
            vertex_colors: Constant::NoColors,
            skinning: false,
            morph_targets: false,
            morph_normals: false,

            textures: MaterialTextures::default(),
            tracker: ChangeTracker::new(),
        }
    }

    #[must_use]
    pub fn into_shared(self) -> SharedMaterial {
        Arc::new(RwLock::new(self))
    }

    // ------------------------------------------------------------------------
    // Binder
    // ------------------------------------------------------------------------

    /// Writes a texture into its slot and marks the record dirty.
    ///
    /// Binding the texture that is already bound (same `Arc`) is a no-op and
    /// returns `false`.
    pub fn bind_texture(&mut self, slot: MapSlot, texture: Option<Arc<Texture>>) -> bool {
        let field = self.textures.field_mut(slot);
        let unchanged = match (field.as_ref(), texture.as_ref()) {
            (Some(current), Some(new)) => Arc::ptr_eq(current, new),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return false;
        }
        *field = texture;
        self.tracker.changed();
        true
    }

    #[must_use]
    pub fn texture(&self, slot: MapSlot) -> Option<&Arc<Texture>> {
        self.textures.get(slot)
    }

    #[must_use]
    pub fn textures(&self) -> &MaterialTextures {
        &self.textures
    }

    /// Picks up new frames from element-backed textures. Returns `true` when
    /// any bound texture changed.
    pub fn refresh_element_textures(&mut self) -> bool {
        let mut changed = false;
        for (slot, texture) in self.textures.iter() {
            if texture.sync_element() {
                log::trace!("Element texture in `{slot}` has new content");
                changed = true;
            }
        }
        if changed {
            self.tracker.changed();
        }
        changed
    }

    // ------------------------------------------------------------------------
    // Scalars
    // ------------------------------------------------------------------------

    /// Applies a typed scalar value. Returns `true` if the field changed.
    pub fn apply_scalar(&mut self, attr: ScalarAttr, value: &Value) -> bool {
        let changed = match (attr, value) {
            (ScalarAttr::Color, Value::Color(c)) => update(&mut self.color, *c),
            (ScalarAttr::DisplacementScale, Value::Number(n)) => {
                update(&mut self.displacement_scale, *n)
            }
            (ScalarAttr::DisplacementBias, Value::Number(n)) => update(&mut self.displacement_bias, *n),
            (ScalarAttr::Fog, Value::Bool(b)) => update(&mut self.fog, *b),
            (ScalarAttr::Shading, Value::Constant(c)) => update(&mut self.shading, *c),
            (ScalarAttr::Wireframe, Value::Bool(b)) => update(&mut self.wireframe, *b),
            (ScalarAttr::WireframeLinewidth, Value::Number(n)) => {
                update(&mut self.wireframe_linewidth, *n)
            }
            (ScalarAttr::WireframeLinecap, Value::Text(t)) => update_text(&mut self.wireframe_linecap, t),
            (ScalarAttr::WireframeLinejoin, Value::Text(t)) => {
                update_text(&mut self.wireframe_linejoin, t)
            }
            (ScalarAttr::VertexColors, Value::Constant(c)) => update(&mut self.vertex_colors, *c),
            (ScalarAttr::Skinning, Value::Bool(b)) => update(&mut self.skinning, *b),
            (ScalarAttr::MorphTargets, Value::Bool(b)) => update(&mut self.morph_targets, *b),
            (ScalarAttr::MorphNormals, Value::Bool(b)) => update(&mut self.morph_normals, *b),
            (attr, value) => {
                log::debug!("Ignoring {value:?} for scalar `{attr}`: wrong type");
                false
            }
        };
        if changed {
            self.tracker.changed();
        }
        changed
    }

    // ------------------------------------------------------------------------
    // Dirty tracking
    // ------------------------------------------------------------------------

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.tracker.is_dirty()
    }

    /// Consumed by the renderer once it has picked up the changes.
    pub fn take_dirty(&mut self) -> bool {
        self.tracker.take_dirty()
    }

    /// Monotonic change counter.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.tracker.version()
    }
}

fn update<T: PartialEq>(field: &mut T, value: T) -> bool {
    if *field == value {
        return false;
    }
    *field = value;
    true
}

fn update_text(field: &mut String, value: &str) -> bool {
    if field == value {
        return false;
    }
    value.clone_into(field);
    true
}
