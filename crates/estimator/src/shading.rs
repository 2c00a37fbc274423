//! Material-dependent shading data for the viewer.
//!
//! Produces plain numbers (colors, roughness, per-vertex gradients, camera
//! placement); drawing them is left to whatever renderer consumes them.

use glam::DVec3;
use shared::{ColorVariant, Finish};

use crate::bounds::Bounds;
use crate::error::{GeometryError, GeometryResult};
use crate::model::LoadedModel;

/// RGB channels in 0..=1, blended component-wise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    /// Parse `#rrggbb`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidColor` for anything else.
    pub fn from_hex(value: &str) -> GeometryResult<Self> {
        let invalid = || GeometryError::InvalidColor {
            value: value.to_string(),
        };
        let hex = value.strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map(|c| f32::from(c) / 255.0)
                .map_err(|_| invalid())
        };
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    #[must_use]
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        Rgb {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
        }
    }
}

/// PBR surface parameters for a finish.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceParams {
    pub roughness: f32,
    pub metalness: f32,
}

impl SurfaceParams {
    pub fn for_finish(finish: Finish) -> Self {
        match finish {
            Finish::Glossy => Self {
                roughness: 0.2,
                metalness: 1.0,
            },
            Finish::Satin => Self {
                roughness: 0.5,
                metalness: 0.05,
            },
            Finish::Matte => Self {
                roughness: 0.8,
                metalness: 0.0,
            },
        }
    }
}

/// Three-stop gradient: `t < 0.5` blends low→mid, otherwise mid→high.
pub fn gradient_color(t: f32, stops: [Rgb; 3]) -> Rgb {
    let [low, mid, high] = stops;
    if t < 0.5 {
        low.lerp(mid, t / 0.5)
    } else {
        mid.lerp(high, (t - 0.5) / 0.5)
    }
}

/// Vertex colors for one part of a scene.
#[derive(Debug, Clone, PartialEq)]
pub struct PartColors {
    pub name: String,
    /// r, g, b per vertex
    pub colors: Vec<f32>,
}

/// What the viewer needs to draw the current model.
#[derive(Debug, Clone, PartialEq)]
pub enum ShadingPlan {
    /// Single mesh in one opaque color.
    Solid { color: Rgb, surface: SurfaceParams },
    /// Scene parts with a bottom-to-top vertex gradient.
    Gradient {
        parts: Vec<PartColors>,
        surface: SurfaceParams,
        opacity: f32,
    },
}

/// Build the shading plan for `model` in `variant`.
///
/// # Errors
///
/// Returns `InvalidColor` if the variant carries a malformed color.
pub fn shade(model: &LoadedModel, variant: &ColorVariant) -> GeometryResult<ShadingPlan> {
    let surface = SurfaceParams::for_finish(variant.finish);
    match model {
        LoadedModel::Mesh(_) => Ok(ShadingPlan::Solid {
            color: Rgb::from_hex(&variant.color)?,
            surface,
        }),
        LoadedModel::Scene { root, .. } => {
            let [c1, c2, c3] = variant.colors();
            let stops = [Rgb::from_hex(c1)?, Rgb::from_hex(c2)?, Rgb::from_hex(c3)?];

            let meshes = root.world_meshes();

            // Gradient spans the parts' local Y, matching what the parts store.
            let mut min_y = f32::INFINITY;
            let mut max_y = f32::NEG_INFINITY;
            for (node, _) in &meshes {
                if let Some(mesh) = &node.mesh {
                    for y in mesh.positions().iter().skip(1).step_by(3) {
                        min_y = min_y.min(*y);
                        max_y = max_y.max(*y);
                    }
                }
            }
            let range = max_y - min_y;

            let parts = meshes
                .iter()
                .filter_map(|(node, _)| node.mesh.as_ref().map(|mesh| (node, mesh)))
                .map(|(node, mesh)| {
                    let colors = mesh
                        .positions()
                        .chunks_exact(3)
                        .flat_map(|v| {
                            let t = if range > 0.0 { (v[1] - min_y) / range } else { 0.0 };
                            let c = gradient_color(t, stops);
                            [c.r, c.g, c.b]
                        })
                        .collect();
                    PartColors {
                        name: node.name.clone(),
                        colors,
                    }
                })
                .collect();

            Ok(ShadingPlan::Gradient {
                parts,
                surface,
                opacity: variant.opacity,
            })
        }
    }
}

/// Camera placement that fits the whole model in view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFraming {
    pub eye: DVec3,
    pub target: DVec3,
}

impl CameraFraming {
    /// Look at the bounds center from the (+,+,+) diagonal at twice the
    /// largest dimension.
    pub fn from_bounds(bounds: &Bounds) -> Self {
        let center = bounds.center();
        let distance = bounds.max_dimension() * 2.0;
        Self {
            eye: center + DVec3::splat(distance * 0.7),
            target: center,
        }
    }
}
