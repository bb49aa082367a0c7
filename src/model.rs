//! The GL-free half of a splash frame: assets, host-driven state, and the
//! retained scene.

use crate::{
    assets::AssetSource,
    config::{ConfigError, SplashConfig},
    logos::{LogoLoader, LogoSet},
    scene::{SceneGraph, SplashScene, SplashState},
};

/// Inputs to one frame's rasterization, borrowed from a [`SplashModel`].
#[derive(Clone, Copy, Debug)]
pub struct PreparedFrame<'a> {
    /// What to draw, in design coordinates.
    pub graph: &'a SceneGraph,
    /// Pixels for the graph's image nodes.
    pub logos: &'a LogoSet,
    /// The model's configuration.
    pub config: &'a SplashConfig,
}

/// Everything the splash caches besides GPU objects.
pub struct SplashModel {
    config: SplashConfig,
    assets: Box<dyn AssetSource>,
    loader: LogoLoader,
    state: SplashState,
    /// Created by the first [`prepare`](Self::prepare) after construction
    /// or reset.
    scene: Option<SplashScene>,
}

impl SplashModel {
    /// A model that has loaded nothing yet.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `config` fails
    /// [`SplashConfig::validate`].
    pub fn new(config: SplashConfig, assets: Box<dyn AssetSource>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            assets,
            loader: LogoLoader::new(),
            state: SplashState::default(),
            scene: None,
        })
    }

    /// Load assets if needed, apply the host values, and bring the scene up
    /// to date.
    ///
    /// Asset failures are logged by the loader and leave the logos out.
    pub fn prepare(&mut self, progress: f32, alpha: f32) -> PreparedFrame<'_> {
        let _ = self.loader.ensure_loaded(self.assets.as_ref(), &self.config);

        self.state.set_progress(progress);
        self.state.set_alpha(alpha);

        let scene = self
            .scene
            .get_or_insert_with(|| SplashScene::new(&self.config));
        scene.update(self.state, self.loader.logos());

        PreparedFrame {
            graph: scene.graph(),
            logos: self.loader.logos(),
            config: &self.config,
        }
    }

    /// Drop the scene and logos and return the host values to their
    /// initial `0` progress and `1` alpha.
    pub fn reset(&mut self) {
        self.scene = None;
        self.loader.reset();
        self.state = SplashState::default();
    }

    /// Current host-driven values.
    #[must_use]
    pub fn state(&self) -> SplashState {
        self.state
    }

    /// The retained scene, if one has been built since the last reset.
    #[must_use]
    pub fn scene(&self) -> Option<&SplashScene> {
        self.scene.as_ref()
    }

    /// The logo loader.
    #[must_use]
    pub fn loader(&self) -> &LogoLoader {
        &self.loader
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &SplashConfig {
        &self.config
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::assets::StaticAssets;

    fn empty_model() -> SplashModel {
        SplashModel::new(SplashConfig::default(), Box::new(StaticAssets::new())).unwrap()
    }

    #[test]
    fn missing_assets_give_black_background_only() {
        let mut model = empty_model();
        let frame = model.prepare(0.3, 0.8);
        assert!(frame.graph.nodes.is_empty());
        assert!(frame.logos.is_empty());
        let [r, g, b, a] = frame.graph.background;
        assert!(r.abs() + g.abs() + b.abs() < f32::EPSILON);
        assert!((a - 1.0).abs() < f32::EPSILON);
        assert!(!model.loader().is_loaded());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = SplashConfig {
            design_size: [0, 1080],
            ..SplashConfig::default()
        };
        let err = SplashModel::new(config, Box::new(StaticAssets::new())).err();
        assert!(matches!(err, Some(ConfigError::Invalid(_))));

        let config = SplashConfig {
            logo_gap: f32::INFINITY,
            ..SplashConfig::default()
        };
        assert!(SplashModel::new(config, Box::new(StaticAssets::new())).is_err());
    }

    #[test]
    fn unloaded_assets_are_retried_each_frame() {
        let mut model = empty_model();
        model.prepare(0.0, 1.0);
        model.prepare(0.1, 1.0);
        assert_eq!(model.loader().attempts(), 2);
    }

    #[test]
    fn state_updates_without_anything_to_draw_into() {
        // A minimized host still reports progress; the values must stick
        // even though no surface is drawn.
        let mut model = empty_model();
        model.prepare(0.6, 0.4);
        assert!((model.state().progress() - 0.6).abs() < f32::EPSILON);
        assert!((model.state().alpha() - 0.4).abs() < f32::EPSILON);
        assert!((model.scene().unwrap().graph().opacity - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut model = empty_model();
        model.prepare(0.75, 0.25);
        assert!(model.scene().is_some());

        model.reset();
        assert!(model.scene().is_none());
        assert!(model.state().progress().abs() < f32::EPSILON);
        assert!((model.state().alpha() - 1.0).abs() < f32::EPSILON);
        assert_eq!(model.loader().attempts(), 0);
    }
}
