//! Source-over alpha compositing for canvas pixels.
//!
//! Stroke opacity lives on a 0-255 additive scale and is allowed to
//! drift out of range (the schedule grows it without bound, and the
//! edge-emphasis rule doubles it). The clamp into valid coverage
//! happens here, at the blend boundary, and nowhere else.

use image::Rgba;

/// Composite an RGB source color over one RGBA canvas pixel.
///
/// `alpha` is interpreted on the 0-255 scale and normalized to a
/// [0, 1] coverage factor, clamping out-of-range values. Each channel
/// blends source-over: `out = src * a + dst * (1 - a)`. The canvas
/// starts opaque and every blend leaves it opaque, so the output
/// alpha channel is always full.
#[must_use = "returns the blended pixel"]
pub fn source_over(dst: Rgba<u8>, color: [u8; 3], alpha: f64) -> Rgba<u8> {
    let coverage = (alpha / 255.0).clamp(0.0, 1.0);
    if coverage <= 0.0 {
        return Rgba([dst[0], dst[1], dst[2], 255]);
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let channel = |src: u8, dst: u8| -> u8 {
        f64::from(src)
            .mul_add(coverage, f64::from(dst) * (1.0 - coverage))
            .round()
            .clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(color[0], dst[0]),
        channel(color[1], dst[1]),
        channel(color[2], dst[2]),
        255,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_alpha_leaves_color_unchanged() {
        let dst = Rgba([10, 20, 30, 255]);
        assert_eq!(source_over(dst, [200, 200, 200], 0.0), dst);
    }

    #[test]
    fn negative_alpha_clamps_to_noop() {
        let dst = Rgba([10, 20, 30, 255]);
        assert_eq!(source_over(dst, [200, 200, 200], -40.0), dst);
    }

    #[test]
    fn full_alpha_replaces_color() {
        let dst = Rgba([10, 20, 30, 255]);
        assert_eq!(
            source_over(dst, [200, 100, 50], 255.0),
            Rgba([200, 100, 50, 255])
        );
    }

    #[test]
    fn over_range_alpha_clamps_to_full_replace() {
        // The edge-emphasis rule doubles alpha without clamping; the
        // blend boundary must absorb that.
        let dst = Rgba([10, 20, 30, 255]);
        assert_eq!(
            source_over(dst, [255, 255, 255], 510.0),
            Rgba([255, 255, 255, 255])
        );
    }

    #[test]
    fn half_alpha_blends_midway() {
        let dst = Rgba([0, 0, 0, 255]);
        // 255 * (128/255) + 0 = 128 exactly.
        assert_eq!(
            source_over(dst, [255, 255, 255], 128.0),
            Rgba([128, 128, 128, 255])
        );
    }

    #[test]
    fn output_alpha_stays_opaque() {
        let dst = Rgba([0, 0, 0, 255]);
        let out = source_over(dst, [90, 90, 90], 17.3);
        assert_eq!(out[3], 255);
    }
}
