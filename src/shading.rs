//! CPU reference of the layer fragment shading (mirrored by `fs_main` in `water.wgsl`).

use glam::{Vec2, Vec4};

use crate::params::{LayerStyle, ShadingConstants};

/// GLSL-style smoothstep; `edge0 > edge1` gives a falling curve.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Shade one fragment of a layer.
///
/// # Arguments
/// * `height` - Displaced height of the fragment
/// * `uv` - Surface texture coordinate
/// * `slope` - `|∂h/∂u| + |∂h/∂v|` at the fragment
///
/// # Returns
/// Straight (non-premultiplied) RGBA
pub fn shade(
    style: &LayerStyle,
    constants: &ShadingConstants,
    height: f32,
    uv: Vec2,
    slope: f32,
) -> Vec4 {
    let h = (height * constants.height_scale + constants.height_bias).clamp(0.0, 1.0);
    let h = h.powf(style.gamma);
    let mut color = style.color_low.lerp(style.color_high, h);

    let vignette = smoothstep(
        constants.vignette_outer,
        constants.vignette_inner,
        uv.distance(Vec2::splat(0.5)),
    );
    color *= constants.vignette_floor + (1.0 - constants.vignette_floor) * vignette;

    if let Some(fog) = &style.fog {
        color = fog.color.lerp(color, fog.mix.clamp(0.0, 1.0));
    }

    if style.foam_intensity > 0.0 {
        let foam = smoothstep(constants.foam_low, constants.foam_high, slope);
        color = color.lerp(constants.foam_color, foam * style.foam_intensity.clamp(0.0, 1.0));
    }

    color.extend(style.alpha())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::FogTint;
    use glam::Vec3;

    const CENTER: Vec2 = Vec2::new(0.5, 0.5);

    /// Black troughs, white crests, no fog
    fn gray_style() -> LayerStyle {
        LayerStyle {
            color_low: Vec3::ZERO,
            color_high: Vec3::ONE,
            fog: None,
            ..Default::default()
        }
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_smoothstep_edges() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert!(close(smoothstep(0.0, 1.0, 0.5), 0.5));
        // Falling curve
        assert_eq!(smoothstep(1.15, 0.25, 0.1), 1.0);
        assert_eq!(smoothstep(1.15, 0.25, 1.2), 0.0);
    }

    #[test]
    fn test_flat_center_is_mid_gray() {
        let color = shade(&gray_style(), &ShadingConstants::default(), 0.0, CENTER, 0.0);
        assert!(close(color.x, 0.5));
        assert!(close(color.w, 0.95));
    }

    #[test]
    fn test_height_saturates() {
        let constants = ShadingConstants::default();
        let crest = shade(&gray_style(), &constants, 5.0, CENTER, 0.0);
        let trough = shade(&gray_style(), &constants, -5.0, CENTER, 0.0);
        assert!(close(crest.x, 1.0));
        assert!(close(trough.x, 0.0));
    }

    #[test]
    fn test_gamma_darkens_midtones() {
        let constants = ShadingConstants::default();
        let curved = LayerStyle {
            gamma: 2.0,
            ..gray_style()
        };
        let color = shade(&curved, &constants, 0.0, CENTER, 0.0);
        assert!(close(color.x, 0.25));
    }

    #[test]
    fn test_vignette_floor_at_corner() {
        let constants = ShadingConstants::default();
        // Corner distance ≈ 0.707, partly inside the falloff
        let corner = shade(&gray_style(), &constants, 5.0, Vec2::ZERO, 0.0);
        assert!(corner.x < 1.0);
        assert!(corner.x > constants.vignette_floor);

        let far = shade(&gray_style(), &constants, 5.0, Vec2::new(-1.0, -1.0), 0.0);
        assert!(close(far.x, constants.vignette_floor));
    }

    #[test]
    fn test_fog_pulls_toward_fog_color() {
        let style = LayerStyle {
            fog: Some(FogTint {
                color: Vec3::ZERO,
                mix: 0.65,
            }),
            ..gray_style()
        };
        let color = shade(&style, &ShadingConstants::default(), 5.0, CENTER, 0.0);
        assert!(close(color.x, 0.65));
    }

    #[test]
    fn test_foam_only_on_steep_slopes() {
        let constants = ShadingConstants::default();
        let style = LayerStyle {
            foam_intensity: 1.0,
            ..gray_style()
        };
        let calm = shade(&style, &constants, -5.0, CENTER, constants.foam_low);
        let steep = shade(&style, &constants, -5.0, CENTER, constants.foam_high);
        assert!(close(calm.x, 0.0));
        assert!(close(steep.x, 1.0));
    }

    #[test]
    fn test_foam_disabled_ignores_slope() {
        let constants = ShadingConstants::default();
        let color = shade(&gray_style(), &constants, -5.0, CENTER, 100.0);
        assert!(close(color.x, 0.0));
    }
}
