//! A startup splash overlay drawn into a host engine's OpenGL framebuffer
//! via [glow].
//!
//! The splash is a black canvas with two logos side by side, faded in and
//! out by the host. The logos come from a packed sprite atlas (one image
//! plus a JSON manifest) bundled with the host. The host keeps the window,
//! the GL context and the render loop; this crate only draws when asked.
//!
//! # Features
//!
//! - **Design-resolution layout**: content is authored for a fixed canvas
//!   (1920×1080 by default) and cover-fit to any framebuffer size.
//! - **Retained scene**: the layout is rebuilt only when the fade value or
//!   the loaded logos change.
//! - **Soft asset failures**: missing or malformed atlas data leaves the
//!   splash black instead of failing the frame. See [`AssetError`] for the
//!   distinct causes and [`AtlasPolicy`] for how partial atlases count.
//! - **Host state hygiene**: GL state the splash touches is saved and
//!   restored around every frame, and pixel-unpack parameters are reset to
//!   GL defaults before textures are uploaded.
//! - **4× MSAA** by default, resolved into the host framebuffer.
//!
//! # Safety
//!
//! [`SplashRenderer::render`] and [`SplashRenderer::cleanup`] issue raw GL
//! calls and are `unsafe`: the renderer's context must be current, and calls
//! must come from the thread that owns it.
//!
//! [glow]: https://docs.rs/glow

mod assets;
mod atlas;
mod config;
mod letterbox;
mod logos;
mod model;
mod scene;
mod surface;

#[cfg(feature = "glow")]
mod gl_state;
#[cfg(feature = "glow")]
mod gpu;
#[cfg(feature = "glow")]
mod render;
#[cfg(feature = "glow")]
mod shaders;
#[cfg(feature = "glow")]
mod tessellate;
#[cfg(feature = "glow")]
mod types;

pub use assets::{AssetSource, DirAssets, StaticAssets};
pub use atlas::{AtlasError, RectOrigin, SpriteAtlas, SpriteRegion};
pub use config::{AtlasPolicy, ConfigError, SplashConfig};
pub use letterbox::Letterbox;
pub use logos::{load_logos, AssetError, Logo, LogoLoader, LogoSet, LogoSlot};
pub use model::{PreparedFrame, SplashModel};
pub use scene::{ImageNode, SceneGraph, SplashScene, SplashState};
pub use surface::{SurfaceFactory, SurfaceKey, SurfaceSlot};

#[cfg(feature = "glow")]
pub use gl_state::{reset_pixel_store, GlStateSnapshot, PixelUnpackState};
#[cfg(feature = "glow")]
pub use render::{HostFrame, RenderError, SplashRenderer};
