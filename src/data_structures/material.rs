//! Surface parameters of a mesh node.
//!
//! Only the scalar PBR factors are kept; textures belong to the render
//! surface and never change at runtime.

use anyhow::anyhow;

/// An RGB triple with components in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` or `#rgb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> anyhow::Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.is_ascii() {
            return Err(anyhow!("'{}' is not a hex colour", hex));
        }
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return Err(anyhow!("'{}' is not a hex colour", hex)),
        };
        let channel = |i: usize| -> anyhow::Result<f32> {
            let byte = u8::from_str_radix(&expanded[i..i + 2], 16)
                .map_err(|e| anyhow!("'{}' is not a hex colour: {}", hex, e))?;
            Ok(byte as f32 / 255.0)
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(&self) -> String {
        let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", byte(self.r), byte(self.g), byte(self.b))
    }

    /// sRGB (how colours are written in the page) to the linear space materials live in.
    pub fn to_linear(&self) -> Self {
        fn channel(c: f32) -> f32 {
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        Self::new(channel(self.r), channel(self.g), channel(self.b))
    }
}

impl From<[f32; 4]> for Rgb {
    fn from(rgba: [f32; 4]) -> Self {
        Self::new(rgba[0], rgba[1], rgba[2])
    }
}

/// Scalar material state of a mesh node, in linear colour space.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub base_color: Rgb,
    pub roughness: f32,
    pub metalness: f32,
    pub reflectivity: f32,
}

impl Default for Material {
    fn default() -> Self {
        // glTF default material
        Self {
            name: "default".to_string(),
            base_color: Rgb::WHITE,
            roughness: 1.0,
            metalness: 1.0,
            reflectivity: 0.5,
        }
    }
}

impl From<gltf::Material<'_>> for Material {
    fn from(material: gltf::Material<'_>) -> Self {
        let pbr = material.pbr_metallic_roughness();
        Self {
            name: material.name().unwrap_or("unnamed_material").to_string(),
            base_color: pbr.base_color_factor().into(),
            roughness: pbr.roughness_factor(),
            metalness: pbr.metallic_factor(),
            ..Default::default()
        }
    }
}
