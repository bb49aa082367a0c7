//! Mapping from the fixed design canvas to the host framebuffer.

/// Uniform scale plus centering offset that makes the design canvas cover
/// the whole target. The overflowing axis is cropped equally on both sides.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Letterbox {
    /// Design pixels to target pixels.
    pub scale: f32,
    /// Target-space position of the design canvas origin.
    pub offset: [f32; 2],
}

impl Letterbox {
    /// The identity mapping.
    pub const IDENTITY: Letterbox = Letterbox {
        scale: 1.0,
        offset: [0.0, 0.0],
    };

    /// Cover-fit `design` into `target`.
    ///
    /// `design` must be non-zero on both axes. A zero-sized target yields a
    /// zero scale.
    #[must_use]
    pub fn cover([width, height]: [u32; 2], [design_w, design_h]: [u32; 2]) -> Self {
        // Framebuffer and design sizes are far below f32's exact integer range.
        #[expect(clippy::cast_precision_loss)]
        let (width, height, design_w, design_h) =
            (width as f32, height as f32, design_w as f32, design_h as f32);

        let scale = (width / design_w).max(height / design_h);
        Self {
            scale,
            offset: [
                (width - design_w * scale) / 2.0,
                (height - design_h * scale) / 2.0,
            ],
        }
    }

    /// Map a design-space point to target space.
    #[must_use]
    pub fn apply(&self, [x, y]: [f32; 2]) -> [f32; 2] {
        [self.offset[0] + x * self.scale, self.offset[1] + y * self.scale]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESIGN: [u32; 2] = [1920, 1080];

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-3 * expected.abs().max(1.0),
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn native_resolution_is_identity() {
        assert_eq!(Letterbox::cover(DESIGN, DESIGN), Letterbox::IDENTITY);
    }

    #[test]
    fn wide_target_crops_vertically() {
        let fit = Letterbox::cover([3840, 1080], DESIGN);
        assert_close(fit.scale, 2.0);
        assert_close(fit.offset[0], 0.0);
        assert_close(fit.offset[1], -540.0);
    }

    #[test]
    fn tall_target_crops_horizontally() {
        let fit = Letterbox::cover([1080, 1920], DESIGN);
        assert_close(fit.scale, 1920.0 / 1080.0);
        assert_close(fit.offset[1], 0.0);
        assert!(fit.offset[0] < 0.0);
    }

    #[test]
    fn scale_is_larger_axis_ratio_and_canvas_is_centered() {
        for width in [1, 640, 800, 1280, 1366, 1920, 2560, 3440, 7680] {
            for height in [1, 480, 600, 720, 768, 1080, 1440, 2160, 4320] {
                #[expect(clippy::cast_precision_loss)]
                let (w, h) = (width as f32, height as f32);
                let fit = Letterbox::cover([width, height], DESIGN);

                assert_close(fit.scale, (w / 1920.0).max(h / 1080.0));

                // The scaled canvas is symmetric around the target midpoint
                // on both axes, and covers the target.
                let [left, top] = fit.apply([0.0, 0.0]);
                let [right, bottom] = fit.apply([1920.0, 1080.0]);
                assert_close(f32::midpoint(left, right), w / 2.0);
                assert_close(f32::midpoint(top, bottom), h / 2.0);
                assert!(left <= 1e-2 && top <= 1e-2);
                assert!(right >= w - 1e-2 && bottom >= h - 1e-2);
            }
        }
    }

    #[test]
    fn zero_target_collapses() {
        let fit = Letterbox::cover([0, 0], DESIGN);
        assert_close(fit.scale, 0.0);
        assert_close(fit.offset[0], 0.0);
        assert_close(fit.offset[1], 0.0);
    }
}
