//! Sprite atlas manifests.
//!
//! A manifest names rectangular regions of one packed image:
//!
//! ```json
//! {
//!   "origin": "bottom_left",
//!   "sprites": {
//!     "BrandLogo_Acacia": { "x": 0, "y": 512, "width": 900, "height": 300 }
//!   }
//! }
//! ```
//!
//! Coordinates are pixels. `origin` defaults to `bottom_left`, the convention
//! of Unity-exported sheets, where `y` is measured up from the bottom edge.

use std::collections::HashMap;

use image::{imageops, RgbaImage};
use serde::Deserialize;

/// Errors from parsing a manifest or cropping one of its regions.
#[derive(thiserror::Error, Debug)]
pub enum AtlasError {
    /// The manifest is not valid JSON or does not match the expected shape.
    #[error("Manifest error: {0}")]
    Json(#[from] serde_json::Error),

    /// A region has a non-finite coordinate or a non-positive extent.
    #[error("Sprite `{name}` has a degenerate region {region:?}")]
    Degenerate {
        /// Sprite name.
        name: String,
        /// The offending region.
        region: SpriteRegion,
    },

    /// A region reaches outside the packed image.
    #[error("Sprite `{name}` region {region:?} exceeds the {width}x{height} atlas")]
    OutOfBounds {
        /// Sprite name.
        name: String,
        /// The offending region.
        region: SpriteRegion,
        /// Atlas image width.
        width: u32,
        /// Atlas image height.
        height: u32,
    },
}

/// Which corner region coordinates are measured from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RectOrigin {
    /// `y` grows upward from the bottom edge.
    #[default]
    BottomLeft,
    /// `y` grows downward from the top edge.
    TopLeft,
}

/// A sprite's rectangle inside the packed image.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct SpriteRegion {
    /// Left edge.
    pub x: f32,
    /// Bottom or top edge, depending on [`RectOrigin`].
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

/// A parsed manifest.
#[derive(Clone, Debug, Deserialize)]
pub struct SpriteAtlas {
    #[serde(default)]
    origin: RectOrigin,
    sprites: HashMap<String, SpriteRegion>,
}

/// A region resolved to whole pixels, top-left origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PixelRect {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl SpriteAtlas {
    /// Parse a JSON manifest.
    ///
    /// # Errors
    ///
    /// Returns [`AtlasError::Json`] if the bytes are not a valid manifest.
    pub fn from_json(bytes: &[u8]) -> Result<Self, AtlasError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Look up a sprite by name.
    #[must_use]
    pub fn sprite(&self, name: &str) -> Option<&SpriteRegion> {
        self.sprites.get(name)
    }

    /// All sprite names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sprites.keys().map(String::as_str)
    }

    /// Coordinate convention of this manifest.
    #[must_use]
    pub fn origin(&self) -> RectOrigin {
        self.origin
    }

    /// Copy the named region out of the packed image.
    ///
    /// # Errors
    ///
    /// Returns [`AtlasError::Degenerate`] or [`AtlasError::OutOfBounds`] if
    /// the region cannot be cut from `image`.
    pub fn crop(
        &self,
        image: &RgbaImage,
        name: &str,
        region: &SpriteRegion,
    ) -> Result<RgbaImage, AtlasError> {
        let rect = pixel_rect(name, region, self.origin, image.dimensions())?;
        Ok(imageops::crop_imm(image, rect.x, rect.y, rect.width, rect.height).to_image())
    }
}

/// Round a region to whole pixels and convert it to a top-left origin.
fn pixel_rect(
    name: &str,
    region: &SpriteRegion,
    origin: RectOrigin,
    (width, height): (u32, u32),
) -> Result<PixelRect, AtlasError> {
    let SpriteRegion {
        x,
        y,
        width: w,
        height: h,
    } = *region;

    let finite = [x, y, w, h].iter().all(|v| v.is_finite());
    if !finite || w.round() < 1.0 || h.round() < 1.0 {
        return Err(AtlasError::Degenerate {
            name: name.to_owned(),
            region: *region,
        });
    }

    // Atlas dimensions are far below 2^24, so the f64 round trip is exact.
    let left = f64::from(x).round();
    let w = f64::from(w).round();
    let h = f64::from(h).round();
    let top = match origin {
        RectOrigin::TopLeft => f64::from(y).round(),
        RectOrigin::BottomLeft => f64::from(height) - (f64::from(y).round() + h),
    };

    if left < 0.0 || top < 0.0 || left + w > f64::from(width) || top + h > f64::from(height) {
        return Err(AtlasError::OutOfBounds {
            name: name.to_owned(),
            region: *region,
            width,
            height,
        });
    }

    // All four values were bounds-checked against u32 image dimensions.
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let rect = PixelRect {
        x: left as u32,
        y: top as u32,
        width: w as u32,
        height: h as u32,
    };
    Ok(rect)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Rgba;

    fn region(x: f32, y: f32, width: f32, height: f32) -> SpriteRegion {
        SpriteRegion {
            x,
            y,
            width,
            height,
        }
    }

    #[test]
    fn parses_manifest_with_default_origin() {
        let atlas = SpriteAtlas::from_json(
            br#"{ "sprites": { "A": { "x": 1, "y": 2, "width": 3, "height": 4 } } }"#,
        )
        .unwrap();
        assert_eq!(atlas.origin(), RectOrigin::BottomLeft);
        assert_eq!(atlas.sprite("A"), Some(&region(1.0, 2.0, 3.0, 4.0)));
        assert!(atlas.sprite("B").is_none());
        assert_eq!(atlas.names().collect::<Vec<_>>(), ["A"]);
    }

    #[test]
    fn rejects_manifest_without_sprites() {
        let err = SpriteAtlas::from_json(br#"{ "origin": "top_left" }"#).unwrap_err();
        assert!(matches!(err, AtlasError::Json(_)));
    }

    #[test]
    fn bottom_left_regions_are_flipped() {
        let rect = pixel_rect(
            "A",
            &region(10.0, 20.0, 30.0, 40.0),
            RectOrigin::BottomLeft,
            (100, 100),
        )
        .unwrap();
        assert_eq!(
            rect,
            PixelRect {
                x: 10,
                y: 40,
                width: 30,
                height: 40
            }
        );
    }

    #[test]
    fn top_left_regions_pass_through() {
        let rect = pixel_rect(
            "A",
            &region(10.4, 20.6, 29.6, 40.2),
            RectOrigin::TopLeft,
            (100, 100),
        )
        .unwrap();
        assert_eq!(
            rect,
            PixelRect {
                x: 10,
                y: 21,
                width: 30,
                height: 40
            }
        );
    }

    #[test]
    fn out_of_bounds_and_degenerate_regions_fail() {
        let oob = pixel_rect(
            "A",
            &region(90.0, 0.0, 20.0, 10.0),
            RectOrigin::TopLeft,
            (100, 100),
        );
        assert!(matches!(oob, Err(AtlasError::OutOfBounds { .. })));

        let empty = pixel_rect(
            "A",
            &region(0.0, 0.0, 0.0, 10.0),
            RectOrigin::TopLeft,
            (100, 100),
        );
        assert!(matches!(empty, Err(AtlasError::Degenerate { .. })));

        let nan = pixel_rect(
            "A",
            &region(f32::NAN, 0.0, 5.0, 5.0),
            RectOrigin::TopLeft,
            (100, 100),
        );
        assert!(matches!(nan, Err(AtlasError::Degenerate { .. })));
    }

    #[test]
    fn crop_copies_the_right_pixels() {
        let mut image = RgbaImage::new(4, 4);
        // Mark the bottom-right 2x2 block.
        for y in 2..4 {
            for x in 2..4 {
                image.put_pixel(x, y, Rgba([255, 0, 0, 255]));
            }
        }
        let atlas = SpriteAtlas::from_json(
            br#"{ "sprites": { "corner": { "x": 2, "y": 0, "width": 2, "height": 2 } } }"#,
        )
        .unwrap();
        let sprite = atlas.sprite("corner").unwrap();
        let cropped = atlas.crop(&image, "corner", sprite).unwrap();
        assert_eq!(cropped.dimensions(), (2, 2));
        assert!(cropped.pixels().all(|p| *p == Rgba([255, 0, 0, 255])));
    }
}
