//! The splash content: a black canvas with a centered row of two logos whose
//! opacity follows the host-driven fade.
//!
//! [`SplashScene`] keeps the last built [`SceneGraph`] and only rebuilds it
//! when something the layout reads has changed.

use crate::{
    config::SplashConfig,
    logos::{LogoSet, LogoSlot},
};

/// The two host-driven values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplashState {
    progress: f32,
    alpha: f32,
}

impl Default for SplashState {
    fn default() -> Self {
        Self {
            progress: 0.0,
            alpha: 1.0,
        }
    }
}

/// Clamp into `[0, 1]`; NaN falls back to `reset`.
fn unit(value: f32, reset: f32) -> f32 {
    if value.is_nan() {
        reset
    } else {
        value.clamp(0.0, 1.0)
    }
}

impl SplashState {
    /// Loading progress in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Logo group opacity in `[0, 1]`.
    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Set the loading progress, clamped to `[0, 1]`.
    pub fn set_progress(&mut self, progress: f32) {
        self.progress = unit(progress, Self::default().progress);
    }

    /// Set the logo opacity, clamped to `[0, 1]`.
    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = unit(alpha, Self::default().alpha);
    }
}

/// A logo placed on the design canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageNode {
    /// Which logo to draw.
    pub slot: LogoSlot,
    /// Top-left corner in design pixels.
    pub origin: [f32; 2],
    /// Drawn size in design pixels.
    pub size: [f32; 2],
}

/// Everything needed to draw one frame, in design coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneGraph {
    /// Full-canvas fill colour, straight alpha.
    pub background: [f32; 4],
    /// Opacity applied to the logo group.
    pub opacity: f32,
    /// Logos, left to right.
    pub nodes: Vec<ImageNode>,
}

/// Layout inputs, compared to decide whether the graph is stale.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Inputs {
    alpha: f32,
    logos: [Option<[u32; 2]>; 2],
}

/// Retained splash content.
#[derive(Debug)]
pub struct SplashScene {
    design: [f32; 2],
    gap: f32,
    company_offset_y: f32,
    background: [f32; 4],
    graph: SceneGraph,
    inputs: Option<Inputs>,
    rebuilds: u64,
}

impl SplashScene {
    /// An empty scene for `config`. The first [`update`](Self::update)
    /// always builds.
    #[must_use]
    pub fn new(config: &SplashConfig) -> Self {
        // Design sizes are small integers.
        #[expect(clippy::cast_precision_loss)]
        let design = [config.design_size[0] as f32, config.design_size[1] as f32];
        Self {
            design,
            gap: config.logo_gap,
            company_offset_y: config.company_offset_y,
            background: config.background,
            graph: SceneGraph {
                background: config.background,
                opacity: SplashState::default().alpha,
                nodes: Vec::new(),
            },
            inputs: None,
            rebuilds: 0,
        }
    }

    /// Bring the graph up to date. Returns `true` if it was rebuilt.
    ///
    /// Progress is not part of the visual, so a progress-only change never
    /// triggers a rebuild.
    pub fn update(&mut self, state: SplashState, logos: &LogoSet) -> bool {
        let inputs = Inputs {
            alpha: state.alpha(),
            logos: logos.layout_key(),
        };
        if self.inputs == Some(inputs) {
            return false;
        }

        self.graph = SceneGraph {
            background: self.background,
            opacity: inputs.alpha,
            nodes: self.layout(inputs.logos),
        };
        self.inputs = Some(inputs);
        self.rebuilds += 1;
        true
    }

    /// The current graph.
    #[must_use]
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// How many times the graph has been built.
    #[must_use]
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Place the present logos in a row centered on the canvas.
    ///
    /// Items are vertically centered within the row. The company logo's
    /// offset moves it after layout, so it does not grow the row.
    fn layout(&self, sizes: [Option<[u32; 2]>; 2]) -> Vec<ImageNode> {
        // Logo sizes are small integers.
        #[expect(clippy::cast_precision_loss)]
        let items: Vec<(LogoSlot, [f32; 2])> = LogoSlot::ALL
            .into_iter()
            .filter_map(|slot| {
                sizes[slot.index()].map(|[w, h]| (slot, [w as f32, h as f32]))
            })
            .collect();
        if items.is_empty() {
            return Vec::new();
        }

        let gaps = items.len().saturating_sub(1);
        #[expect(clippy::cast_precision_loss)]
        let row_width: f32 =
            items.iter().map(|(_, [w, _])| w).sum::<f32>() + self.gap * gaps as f32;
        let row_height = items.iter().map(|(_, [_, h])| *h).fold(0.0, f32::max);

        let mut x = (self.design[0] - row_width) / 2.0;
        let row_top = (self.design[1] - row_height) / 2.0;

        items
            .into_iter()
            .map(|(slot, [w, h])| {
                let shift = match slot {
                    LogoSlot::Brand => 0.0,
                    LogoSlot::Company => self.company_offset_y,
                };
                let node = ImageNode {
                    slot,
                    origin: [x, row_top + (row_height - h) / 2.0 + shift],
                    size: [w, h],
                };
                x += w + self.gap;
                node
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::logos::Logo;
    use image::RgbaImage;

    fn logos(brand: Option<(u32, u32)>, company: Option<(u32, u32)>) -> LogoSet {
        let mut set = LogoSet::default();
        set.set(LogoSlot::Brand, brand.map(|(w, h)| Logo::new(RgbaImage::new(w, h))));
        set.set(
            LogoSlot::Company,
            company.map(|(w, h)| Logo::new(RgbaImage::new(w, h))),
        );
        set
    }

    fn assert_pair_eq(actual: [f32; 2], expected: [f32; 2]) {
        assert!(
            (actual[0] - expected[0]).abs() < f32::EPSILON * 1024.0
                && (actual[1] - expected[1]).abs() < f32::EPSILON * 1024.0,
            "expected {expected:?}, got {actual:?}",
        );
    }

    #[test]
    fn state_is_clamped() {
        let mut state = SplashState::default();
        state.set_alpha(1.5);
        state.set_progress(-0.25);
        assert!((state.alpha() - 1.0).abs() < f32::EPSILON);
        assert!(state.progress().abs() < f32::EPSILON);

        state.set_alpha(f32::NAN);
        state.set_progress(f32::NAN);
        assert!((state.alpha() - 1.0).abs() < f32::EPSILON);
        assert!(state.progress().abs() < f32::EPSILON);
    }

    #[test]
    fn row_is_centered_with_gap_and_offset() {
        let mut scene = SplashScene::new(&SplashConfig::default());
        scene.update(SplashState::default(), &logos(Some((400, 200)), Some((300, 100))));

        let nodes = &scene.graph().nodes;
        assert_eq!(nodes.len(), 2);

        assert_eq!(nodes[0].slot, LogoSlot::Brand);
        assert_pair_eq(nodes[0].origin, [578.0, 440.0]);
        assert_pair_eq(nodes[0].size, [400.0, 200.0]);

        // 578 + 400 + 64; vertically centered in the 200px row, then +32.
        assert_eq!(nodes[1].slot, LogoSlot::Company);
        assert_pair_eq(nodes[1].origin, [1042.0, 522.0]);
        assert_pair_eq(nodes[1].size, [300.0, 100.0]);
    }

    #[test]
    fn single_logo_has_no_gap() {
        let mut scene = SplashScene::new(&SplashConfig::default());
        scene.update(SplashState::default(), &logos(None, Some((320, 120))));

        let nodes = &scene.graph().nodes;
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].slot, LogoSlot::Company);
        assert_pair_eq(nodes[0].origin, [800.0, 480.0 + 32.0]);
    }

    #[test]
    fn missing_logos_leave_only_background() {
        let mut scene = SplashScene::new(&SplashConfig::default());
        assert!(scene.update(SplashState::default(), &LogoSet::default()));

        let graph = scene.graph();
        assert!(graph.nodes.is_empty());
        let [r, g, b, a] = graph.background;
        assert_pair_eq([r, g], [0.0, 0.0]);
        assert_pair_eq([b, a], [0.0, 1.0]);
    }

    #[test]
    fn opacity_follows_alpha() {
        let mut scene = SplashScene::new(&SplashConfig::default());
        let set = logos(Some((10, 10)), Some((10, 10)));
        let mut state = SplashState::default();

        state.set_alpha(0.0);
        scene.update(state, &set);
        assert!(scene.graph().opacity.abs() < f32::EPSILON);

        state.set_alpha(1.0);
        scene.update(state, &set);
        assert!((scene.graph().opacity - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn rebuilds_only_on_relevant_change() {
        let mut scene = SplashScene::new(&SplashConfig::default());
        let set = logos(Some((10, 10)), None);
        let mut state = SplashState::default();

        assert!(scene.update(state, &set));
        assert!(!scene.update(state, &set));

        state.set_progress(0.5);
        assert!(!scene.update(state, &set));

        state.set_alpha(0.5);
        assert!(scene.update(state, &set));

        assert!(scene.update(state, &logos(Some((10, 10)), Some((5, 5)))));
        assert_eq!(scene.rebuilds(), 3);
    }
}
