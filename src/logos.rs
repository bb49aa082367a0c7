//! Logo loading: decode the packed atlas once and keep the two cropped logos
//! for the life of the renderer.

use std::sync::Arc;

use image::RgbaImage;

use crate::{
    assets::AssetSource,
    atlas::{AtlasError, SpriteAtlas},
    config::{AtlasPolicy, SplashConfig},
};

/// Why the logos could not be loaded.
///
/// [`Unavailable`](Self::Unavailable) is the expected state while the asset
/// bundle is not registered yet. Every other variant means the bundle is
/// present but unusable.
#[derive(thiserror::Error, Debug)]
pub enum AssetError {
    /// A bundled file is missing.
    #[error("Asset not found: {path}")]
    Unavailable {
        /// The path that was looked up.
        path: String,
    },

    /// The packed image could not be decoded.
    #[error("Atlas image decode error: {0}")]
    Decode(#[from] image::ImageError),

    /// The manifest is malformed or one of its regions cannot be cropped.
    #[error(transparent)]
    Atlas(#[from] AtlasError),

    /// A logo sprite is absent and [`AtlasPolicy::Strict`] is in effect.
    #[error("Sprite `{name}` missing from atlas manifest")]
    MissingSprite {
        /// The configured sprite name.
        name: String,
    },
}

impl AssetError {
    /// `true` for the retry-quietly case of a missing bundled file.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// The two logo positions in the splash row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogoSlot {
    /// Left-hand logo.
    Brand,
    /// Right-hand logo.
    Company,
}

impl LogoSlot {
    /// Slots in left-to-right drawing order.
    pub const ALL: [LogoSlot; 2] = [LogoSlot::Brand, LogoSlot::Company];

    /// Dense index, for per-slot arrays.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            LogoSlot::Brand => 0,
            LogoSlot::Company => 1,
        }
    }
}

/// A decoded logo, cheap to clone.
#[derive(Clone, Debug)]
pub struct Logo {
    image: Arc<RgbaImage>,
}

impl Logo {
    /// Wrap a decoded image.
    #[must_use]
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    /// Pixel dimensions.
    #[must_use]
    pub fn size(&self) -> [u32; 2] {
        let (w, h) = self.image.dimensions();
        [w, h]
    }

    /// Straight-alpha RGBA8 pixels, row-major from the top.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Identity of the underlying pixel buffer, used to key GPU uploads.
    #[must_use]
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.image) as usize
    }

    /// Whether both handles share one decoded image.
    #[must_use]
    pub fn ptr_eq(&self, other: &Logo) -> bool {
        Arc::ptr_eq(&self.image, &other.image)
    }
}

/// Whichever logos were found in the atlas.
#[derive(Clone, Debug, Default)]
pub struct LogoSet {
    logos: [Option<Logo>; 2],
}

impl LogoSet {
    /// Logo in `slot`, if it was loaded.
    #[must_use]
    pub fn get(&self, slot: LogoSlot) -> Option<&Logo> {
        self.logos[slot.index()].as_ref()
    }

    /// Store or clear the logo in `slot`.
    pub fn set(&mut self, slot: LogoSlot, logo: Option<Logo>) {
        self.logos[slot.index()] = logo;
    }

    /// Number of loaded logos.
    #[must_use]
    pub fn len(&self) -> usize {
        self.logos.iter().flatten().count()
    }

    /// `true` when no logo is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Everything the layout depends on: per-slot presence and size.
    #[must_use]
    pub fn layout_key(&self) -> [Option<[u32; 2]>; 2] {
        [
            self.logos[0].as_ref().map(Logo::size),
            self.logos[1].as_ref().map(Logo::size),
        ]
    }
}

/// Read, decode and crop both logos in one pass.
///
/// # Errors
///
/// See [`AssetError`]. Under [`AtlasPolicy::Lenient`] a manifest that names
/// neither logo still succeeds with an empty [`LogoSet`].
pub fn load_logos(source: &dyn AssetSource, config: &SplashConfig) -> Result<LogoSet, AssetError> {
    let image_bytes = source
        .read(&config.atlas_image)
        .ok_or_else(|| AssetError::Unavailable {
            path: config.atlas_image.clone(),
        })?;
    let manifest_bytes = source
        .read(&config.atlas_manifest)
        .ok_or_else(|| AssetError::Unavailable {
            path: config.atlas_manifest.clone(),
        })?;

    let atlas = SpriteAtlas::from_json(&manifest_bytes)?;
    let packed = image::load_from_memory(&image_bytes)?.to_rgba8();

    let mut logos = LogoSet::default();
    for slot in LogoSlot::ALL {
        let name = config.sprite_name(slot);
        match atlas.sprite(name) {
            Some(region) => {
                let cropped = atlas.crop(&packed, name, region)?;
                logos.set(slot, Some(Logo::new(cropped)));
            }
            None if config.atlas_policy == AtlasPolicy::Strict => {
                return Err(AssetError::MissingSprite {
                    name: name.to_owned(),
                });
            }
            None => log::debug!("sprite `{name}` not in atlas, {slot:?} logo omitted"),
        }
    }

    Ok(logos)
}

/// Loads the logos at most once until [`reset`](Self::reset).
#[derive(Debug, Default)]
pub struct LogoLoader {
    logos: LogoSet,
    loaded: bool,
    attempts: u32,
    last_failure: Option<String>,
}

impl LogoLoader {
    /// A loader that has not tried anything yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the logos unless that already succeeded.
    ///
    /// Once loaded, further calls do no work and the same [`Logo`] handles
    /// stay in place. A failed attempt leaves the loader unloaded, so the
    /// next call tries again.
    ///
    /// # Errors
    ///
    /// Returns the [`AssetError`] of this attempt. The loader keeps no
    /// partial results from a failed attempt.
    pub fn ensure_loaded(
        &mut self,
        source: &dyn AssetSource,
        config: &SplashConfig,
    ) -> Result<&LogoSet, AssetError> {
        if self.loaded {
            return Ok(&self.logos);
        }

        self.attempts += 1;
        match load_logos(source, config) {
            Ok(logos) => {
                log::debug!("splash atlas loaded with {} logo(s)", logos.len());
                self.logos = logos;
                self.loaded = true;
                self.last_failure = None;
                Ok(&self.logos)
            }
            Err(err) => {
                let message = err.to_string();
                if err.is_unavailable() {
                    log::debug!("splash assets not available yet: {message}");
                } else if self.last_failure.as_deref() != Some(message.as_str()) {
                    log::warn!("failed to load splash logos: {message}");
                } else {
                    log::trace!("splash logo load failed again: {message}");
                }
                self.last_failure = Some(message);
                Err(err)
            }
        }
    }

    /// Whether a load has succeeded since construction or the last reset.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Number of load attempts made since construction or the last reset.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Loaded logos. Empty while not loaded.
    #[must_use]
    pub fn logos(&self) -> &LogoSet {
        &self.logos
    }

    /// Drop the cached logos and forget that loading happened.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::assets::StaticAssets;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    const MANIFEST: &str = r#"{
        "origin": "top_left",
        "sprites": {
            "BrandLogo_Acacia": { "x": 0, "y": 0, "width": 6, "height": 4 },
            "CompanyLogo_ReAER": { "x": 6, "y": 0, "width": 2, "height": 3 }
        }
    }"#;

    fn atlas_png() -> Vec<u8> {
        let image = RgbaImage::from_pixel(8, 4, Rgba([200, 100, 50, 255]));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    fn bundle(manifest: &str) -> StaticAssets {
        StaticAssets::new()
            .with("assets/SplashScreen.png", atlas_png())
            .with("assets/SplashScreen.json", manifest.as_bytes().to_vec())
    }

    #[test]
    fn loads_both_logos() {
        let logos = load_logos(&bundle(MANIFEST), &SplashConfig::default()).unwrap();
        assert_eq!(logos.len(), 2);
        assert_eq!(logos.get(LogoSlot::Brand).unwrap().size(), [6, 4]);
        assert_eq!(logos.get(LogoSlot::Company).unwrap().size(), [2, 3]);
        assert_eq!(logos.layout_key(), [Some([6, 4]), Some([2, 3])]);
    }

    #[test]
    fn missing_files_are_unavailable() {
        let only_image = StaticAssets::new().with("assets/SplashScreen.png", atlas_png());
        let err = load_logos(&only_image, &SplashConfig::default()).unwrap_err();
        assert!(err.is_unavailable());

        let err = load_logos(&StaticAssets::new(), &SplashConfig::default()).unwrap_err();
        assert!(
            matches!(err, AssetError::Unavailable { path } if path == "assets/SplashScreen.png")
        );
    }

    #[test]
    fn corrupt_image_is_a_decode_error() {
        let assets = StaticAssets::new()
            .with("assets/SplashScreen.png", &b"not a png"[..])
            .with("assets/SplashScreen.json", MANIFEST.as_bytes().to_vec());
        let err = load_logos(&assets, &SplashConfig::default()).unwrap_err();
        assert!(matches!(err, AssetError::Decode(_)));
    }

    const BRAND_ONLY: &str =
        r#"{ "sprites": { "BrandLogo_Acacia": { "x": 0, "y": 0, "width": 2, "height": 2 } } }"#;

    #[test]
    fn lenient_policy_accepts_partial_atlas() {
        let logos = load_logos(&bundle(BRAND_ONLY), &SplashConfig::default()).unwrap();
        assert!(logos.get(LogoSlot::Brand).is_some());
        assert!(logos.get(LogoSlot::Company).is_none());

        let logos = load_logos(&bundle(r#"{ "sprites": {} }"#), &SplashConfig::default()).unwrap();
        assert!(logos.is_empty());
    }

    #[test]
    fn strict_policy_rejects_partial_atlas() {
        let config = SplashConfig {
            atlas_policy: AtlasPolicy::Strict,
            ..SplashConfig::default()
        };
        let err = load_logos(&bundle(BRAND_ONLY), &config).unwrap_err();
        assert!(matches!(err, AssetError::MissingSprite { name } if name == "CompanyLogo_ReAER"));
    }

    #[test]
    fn loader_is_idempotent() {
        let assets = bundle(MANIFEST);
        let config = SplashConfig::default();
        let mut loader = LogoLoader::new();

        let first = loader.ensure_loaded(&assets, &config).unwrap().clone();
        let second = loader.ensure_loaded(&assets, &config).unwrap().clone();
        assert_eq!(loader.attempts(), 1);
        for slot in LogoSlot::ALL {
            assert!(first.get(slot).unwrap().ptr_eq(second.get(slot).unwrap()));
        }
    }

    #[test]
    fn loader_retries_until_assets_appear() {
        let config = SplashConfig::default();
        let mut loader = LogoLoader::new();

        assert!(loader.ensure_loaded(&StaticAssets::new(), &config).is_err());
        assert!(!loader.is_loaded());
        assert!(loader.logos().is_empty());

        loader.ensure_loaded(&bundle(MANIFEST), &config).unwrap();
        assert!(loader.is_loaded());
        assert_eq!(loader.attempts(), 2);
    }

    #[test]
    fn reset_forgets_loaded_logos() {
        let assets = bundle(MANIFEST);
        let config = SplashConfig::default();
        let mut loader = LogoLoader::new();

        let before = loader.ensure_loaded(&assets, &config).unwrap().clone();
        loader.reset();
        assert!(!loader.is_loaded());
        assert!(loader.logos().is_empty());

        let after = loader.ensure_loaded(&assets, &config).unwrap();
        let brand = LogoSlot::Brand;
        assert!(!before.get(brand).unwrap().ptr_eq(after.get(brand).unwrap()));
    }
}
