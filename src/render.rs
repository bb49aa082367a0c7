//! The splash renderer: owns every cached resource and composites one frame
//! per call into the host's framebuffer.

use std::num::NonZeroU32;
use std::sync::Arc;

use crate::{
    assets::AssetSource,
    config::{ConfigError, SplashConfig},
    gl_state::{self, GlStateSnapshot},
    gpu::{DrawSurface, GlSurfaceFactory, RenderTarget},
    letterbox::Letterbox,
    logos::LogoSet,
    model::{PreparedFrame, SplashModel},
    scene::{SplashScene, SplashState},
    surface::{SurfaceKey, SurfaceSlot},
    tessellate,
    types::QuadMesh,
};
use glow::HasContext;

/// Failures that abort a frame.
///
/// Asset problems never show up here; they only remove logos from the
/// splash.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// A GL object (program, buffer, framebuffer, texture) could not be
    /// created.
    #[error("GL error: {0}")]
    Gl(String),
}

/// The host framebuffer to draw into this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HostFrame {
    /// Target framebuffer object; `None` is the default framebuffer.
    pub framebuffer: Option<glow::Framebuffer>,
    /// Current pixel size of that framebuffer.
    pub size: [u32; 2],
}

impl HostFrame {
    /// Build from a raw GL framebuffer name, where `0` is the default
    /// framebuffer.
    #[must_use]
    pub fn from_raw(framebuffer: u32, size: [u32; 2]) -> Self {
        Self {
            framebuffer: NonZeroU32::new(framebuffer).map(glow::NativeFramebuffer),
            size,
        }
    }

    /// Whether the framebuffer has no pixels, as for a minimized window.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.target().is_empty()
    }

    fn target(self) -> RenderTarget {
        RenderTarget {
            framebuffer: self.framebuffer,
            size: self.size,
        }
    }
}

/// Draws the startup splash over the host engine's frame.
///
/// The host creates one renderer, calls [`render`](Self::render) once per
/// frame while the splash is visible, and [`cleanup`](Self::cleanup) when it
/// is done. Every call must happen on the thread that owns the GL context.
///
/// # Example
///
/// ```no_run
/// # use splash_overlay_glow::{HostFrame, SplashConfig, SplashRenderer, StaticAssets};
/// # use std::sync::Arc;
/// # fn example(gl: Arc<glow::Context>, assets: StaticAssets, fbo: u32, fade: f32)
/// # -> Result<(), Box<dyn std::error::Error>> {
/// let mut splash = SplashRenderer::new(gl, SplashConfig::default(), Box::new(assets))?;
///
/// // Each frame, with the context current:
/// let frame = HostFrame::from_raw(fbo, [2560, 1440]);
/// unsafe { splash.render(frame, 0.4, fade) }?;
///
/// // Once the splash is gone:
/// unsafe { splash.cleanup() };
/// # Ok(())
/// # }
/// ```
pub struct SplashRenderer {
    gl: Arc<glow::Context>,
    /// Assets, host values and the retained scene.
    model: SplashModel,
    /// The unit rectangle every quad is drawn from.
    quad: QuadMesh,
    surface: SurfaceSlot<DrawSurface, RenderTarget>,
}

impl SplashRenderer {
    /// Create a renderer. No GL calls are made until the first
    /// [`render`](Self::render).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `config` fails
    /// [`SplashConfig::validate`].
    ///
    /// # Panics
    ///
    /// Panics if lyon fails to tessellate the unit rectangle, which would be
    /// a lyon bug.
    pub fn new(
        gl: Arc<glow::Context>,
        config: SplashConfig,
        assets: Box<dyn AssetSource>,
    ) -> Result<Self, ConfigError> {
        let model = SplashModel::new(config, assets)?;
        let quad = tessellate::unit_rectangle().expect("unit rectangle tessellation failed");
        Ok(Self {
            gl,
            model,
            quad,
            surface: SurfaceSlot::new(),
        })
    }

    /// Draw one splash frame into `frame`.
    ///
    /// `progress` and `alpha` are clamped to `[0, 1]`; `alpha` fades the
    /// logos. Missing or broken assets are logged and the splash is drawn
    /// without logos. Host GL state is restored before returning, also on
    /// error.
    ///
    /// Returns `Ok(true)` once the frame has been handled. A zero-sized
    /// framebuffer draws nothing.
    ///
    /// # Safety
    ///
    /// The GL context passed to [`new`](Self::new) must be current.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Gl`] if GPU objects cannot be created. The
    /// surface is left empty and is rebuilt on the next call.
    pub unsafe fn render(
        &mut self,
        frame: HostFrame,
        progress: f32,
        alpha: f32,
    ) -> Result<bool, RenderError> {
        let prepared = self.model.prepare(progress, alpha);

        if frame.is_empty() {
            log::trace!(
                "framebuffer is {}x{}, skipping splash frame",
                frame.size[0],
                frame.size[1]
            );
            return Ok(true);
        }

        let gl = &*self.gl;
        let snapshot = unsafe { GlStateSnapshot::capture(gl) };
        let result =
            unsafe { Self::composite(gl, &self.quad, &mut self.surface, &prepared, frame) };
        unsafe { snapshot.restore(gl) };

        result.map(|()| true)
    }

    /// Everything between saving and restoring host state.
    unsafe fn composite(
        gl: &glow::Context,
        quad: &QuadMesh,
        slot: &mut SurfaceSlot<DrawSurface, RenderTarget>,
        prepared: &PreparedFrame<'_>,
        frame: HostFrame,
    ) -> Result<(), RenderError> {
        let config = prepared.config;
        let mut factory = unsafe { GlSurfaceFactory::new(gl, quad, config.msaa_samples) };
        let Some(surface) = slot
            .ensure(&mut factory, frame.target())
            .map_err(RenderError::Gl)?
        else {
            return Ok(());
        };

        // Design sizes are small integers.
        #[expect(clippy::cast_precision_loss)]
        let design = [config.design_size[0] as f32, config.design_size[1] as f32];
        let view = Letterbox::cover(frame.size, config.design_size);

        unsafe {
            gl_state::reset_pixel_store(gl);
            gl.enable(glow::BLEND);
            gl.blend_equation(glow::FUNC_ADD);
            // Premultiplied alpha.
            gl.blend_func(glow::ONE, glow::ONE_MINUS_SRC_ALPHA);

            let drawn = surface
                .draw(gl, prepared.graph, prepared.logos, design, &view)
                .map_err(RenderError::Gl);
            surface.flush(gl);
            gl.disable(glow::BLEND);
            drawn
        }
    }

    /// Release every GPU resource and forget all cached state.
    ///
    /// The next [`render`](Self::render) starts from scratch: assets are
    /// reloaded, the scene and surface are rebuilt, and progress and alpha
    /// are back at `0` and `1`. Calling this when nothing was ever allocated,
    /// or twice in a row, is fine.
    ///
    /// # Safety
    ///
    /// The GL context passed to [`new`](Self::new) must be current.
    pub unsafe fn cleanup(&mut self) {
        let mut factory = unsafe {
            GlSurfaceFactory::new(&self.gl, &self.quad, self.model.config().msaa_samples)
        };
        self.surface.release(&mut factory);
        self.model.reset();
    }

    /// Current host-driven values.
    #[must_use]
    pub fn state(&self) -> SplashState {
        self.model.state()
    }

    /// The retained scene, if a frame has been rendered since construction
    /// or the last cleanup.
    #[must_use]
    pub fn scene(&self) -> Option<&SplashScene> {
        self.model.scene()
    }

    /// Whether the logo atlas has been loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.model.loader().is_loaded()
    }

    /// Loaded logos.
    #[must_use]
    pub fn logos(&self) -> &LogoSet {
        self.model.loader().logos()
    }

    /// Size of the live drawing surface, if any.
    #[must_use]
    pub fn surface_size(&self) -> Option<[u32; 2]> {
        self.surface.key().map(|target| target.size)
    }

    /// Number of drawing surfaces created so far.
    #[must_use]
    pub fn surface_generation(&self) -> u64 {
        self.surface.generation()
    }

    /// The configuration this renderer was built with.
    #[must_use]
    pub fn config(&self) -> &SplashConfig {
        self.model.config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_zero_is_the_default_framebuffer() {
        let frame = HostFrame::from_raw(0, [1920, 1080]);
        assert_eq!(frame.framebuffer, None);
        assert!(!frame.is_empty());

        let frame = HostFrame::from_raw(5, [1920, 1080]);
        assert_eq!(frame.framebuffer, NonZeroU32::new(5).map(glow::NativeFramebuffer));
    }

    #[test]
    fn minimized_window_is_empty() {
        assert!(HostFrame::from_raw(0, [0, 0]).is_empty());
        assert!(HostFrame::from_raw(3, [1920, 0]).is_empty());
        assert!(HostFrame::from_raw(3, [0, 1080]).is_empty());
    }

    #[test]
    fn target_distinguishes_framebuffer_handles() {
        let a = HostFrame::from_raw(3, [1280, 720]).target();
        let b = HostFrame::from_raw(4, [1280, 720]).target();
        assert_ne!(a, b);
        assert_eq!(a, HostFrame::from_raw(3, [1280, 720]).target());
        assert_eq!(a.size(), [1280, 720]);
    }
}
