//! Splash configuration.
//!
//! Every field has a default matching the stock splash, so an empty TOML
//! document (or [`SplashConfig::default`]) yields a working setup.

use serde::Deserialize;

use crate::logos::LogoSlot;

/// Errors produced while loading a [`SplashConfig`].
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The document parsed but holds values the renderer cannot use.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// How strictly the sprite manifest must match the configured logo names.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtlasPolicy {
    /// Any subset of the two logos (including none) counts as loaded.
    #[default]
    Lenient,
    /// Both logos must be present, otherwise loading fails and is retried.
    Strict,
}

/// Static description of the splash: assets, layout constants, GPU options.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SplashConfig {
    /// Logical canvas size the layout is authored against.
    pub design_size: [u32; 2],
    /// Asset path of the packed atlas image.
    pub atlas_image: String,
    /// Asset path of the JSON sprite manifest.
    pub atlas_manifest: String,
    /// Sprite name of the left-hand logo.
    pub brand_sprite: String,
    /// Sprite name of the right-hand logo.
    pub company_sprite: String,
    /// Horizontal gap between the two logos, in design pixels.
    pub logo_gap: f32,
    /// Downward shift of the company logo, in design pixels.
    pub company_offset_y: f32,
    /// Straight-alpha RGBA colour filling the whole canvas.
    pub background: [f32; 4],
    /// See [`AtlasPolicy`].
    pub atlas_policy: AtlasPolicy,
    /// MSAA sample count of the off-screen surface. `0` draws straight into
    /// the host framebuffer.
    pub msaa_samples: u8,
}

impl Default for SplashConfig {
    fn default() -> Self {
        Self {
            design_size: [1920, 1080],
            atlas_image: "assets/SplashScreen.png".to_owned(),
            atlas_manifest: "assets/SplashScreen.json".to_owned(),
            brand_sprite: "BrandLogo_Acacia".to_owned(),
            company_sprite: "CompanyLogo_ReAER".to_owned(),
            logo_gap: 64.0,
            company_offset_y: 32.0,
            background: [0.0, 0.0, 0.0, 1.0],
            atlas_policy: AtlasPolicy::Lenient,
            msaa_samples: 4,
        }
    }
}

impl SplashConfig {
    /// Parse a TOML document, filling unspecified fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML and
    /// [`ConfigError::Invalid`] when the design size has a zero dimension.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values the renderer divides by or sizes GPU objects with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.design_size.contains(&0) {
            return Err(ConfigError::Invalid(format!(
                "design_size must be non-zero, got {:?}",
                self.design_size
            )));
        }
        if !self.logo_gap.is_finite() || !self.company_offset_y.is_finite() {
            return Err(ConfigError::Invalid(
                "logo_gap and company_offset_y must be finite".to_owned(),
            ));
        }
        Ok(())
    }

    /// Sprite name bound to a logo slot.
    #[must_use]
    pub fn sprite_name(&self, slot: LogoSlot) -> &str {
        match slot {
            LogoSlot::Brand => &self.brand_sprite,
            LogoSlot::Company => &self.company_sprite,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = SplashConfig::from_toml_str("").unwrap();
        assert_eq!(config, SplashConfig::default());
        assert_eq!(config.design_size, [1920, 1080]);
        assert_eq!(config.atlas_policy, AtlasPolicy::Lenient);
    }

    #[test]
    fn partial_document_overrides_named_fields() {
        let config = SplashConfig::from_toml_str(
            r#"
            atlas_policy = "strict"
            msaa_samples = 0
            brand_sprite = "Logo_A"
            "#,
        )
        .unwrap();
        assert_eq!(config.atlas_policy, AtlasPolicy::Strict);
        assert_eq!(config.msaa_samples, 0);
        assert_eq!(config.sprite_name(LogoSlot::Brand), "Logo_A");
        assert_eq!(config.sprite_name(LogoSlot::Company), "CompanyLogo_ReAER");
    }

    #[test]
    fn zero_design_dimension_is_rejected() {
        let err = SplashConfig::from_toml_str("design_size = [0, 1080]").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = SplashConfig::from_toml_str("design_size = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
