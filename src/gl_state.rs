//! Host GL state handling.
//!
//! The host engine leaves arbitrary state behind between its own draws. The
//! splash snapshots what it touches, resets pixel-unpack parameters to GL
//! defaults before uploading textures, and puts everything back afterwards.

use std::num::NonZeroU32;

use glow::HasContext;

/// Convert a binding query result back into a typed GL handle.
fn handle<T>(raw: i32, wrap: fn(NonZeroU32) -> T) -> Option<T> {
    u32::try_from(raw).ok().and_then(NonZeroU32::new).map(wrap)
}

/// Pixel-unpack parameters that affect `glTexImage2D` uploads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelUnpackState {
    /// `GL_PIXEL_UNPACK_BUFFER` binding.
    pub buffer: Option<glow::Buffer>,
    /// `GL_UNPACK_SWAP_BYTES`.
    pub swap_bytes: bool,
    /// `GL_UNPACK_LSB_FIRST`.
    pub lsb_first: bool,
    /// `GL_UNPACK_ROW_LENGTH`.
    pub row_length: i32,
    /// `GL_UNPACK_SKIP_ROWS`.
    pub skip_rows: i32,
    /// `GL_UNPACK_SKIP_PIXELS`.
    pub skip_pixels: i32,
    /// `GL_UNPACK_ALIGNMENT`.
    pub alignment: i32,
}

impl PixelUnpackState {
    /// The GL initial values.
    pub const DEFAULTS: PixelUnpackState = PixelUnpackState {
        buffer: None,
        swap_bytes: false,
        lsb_first: false,
        row_length: 0,
        skip_rows: 0,
        skip_pixels: 0,
        alignment: 4,
    };

    /// Read the current values.
    ///
    /// # Safety
    ///
    /// Requires a valid, current OpenGL context.
    pub unsafe fn capture(gl: &glow::Context) -> Self {
        unsafe {
            Self {
                buffer: handle(
                    gl.get_parameter_i32(glow::PIXEL_UNPACK_BUFFER_BINDING),
                    glow::NativeBuffer,
                ),
                swap_bytes: gl.get_parameter_i32(glow::UNPACK_SWAP_BYTES) != 0,
                lsb_first: gl.get_parameter_i32(glow::UNPACK_LSB_FIRST) != 0,
                row_length: gl.get_parameter_i32(glow::UNPACK_ROW_LENGTH),
                skip_rows: gl.get_parameter_i32(glow::UNPACK_SKIP_ROWS),
                skip_pixels: gl.get_parameter_i32(glow::UNPACK_SKIP_PIXELS),
                alignment: gl.get_parameter_i32(glow::UNPACK_ALIGNMENT),
            }
        }
    }

    /// Make these values current.
    ///
    /// # Safety
    ///
    /// Requires a valid, current OpenGL context.
    pub unsafe fn apply(&self, gl: &glow::Context) {
        unsafe {
            gl.bind_buffer(glow::PIXEL_UNPACK_BUFFER, self.buffer);
            gl.pixel_store_bool(glow::UNPACK_SWAP_BYTES, self.swap_bytes);
            gl.pixel_store_bool(glow::UNPACK_LSB_FIRST, self.lsb_first);
            gl.pixel_store_i32(glow::UNPACK_ROW_LENGTH, self.row_length);
            gl.pixel_store_i32(glow::UNPACK_SKIP_ROWS, self.skip_rows);
            gl.pixel_store_i32(glow::UNPACK_SKIP_PIXELS, self.skip_pixels);
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, self.alignment);
        }
    }
}

/// Reset pixel-unpack parameters to [`PixelUnpackState::DEFAULTS`].
///
/// # Safety
///
/// Requires a valid, current OpenGL context.
pub unsafe fn reset_pixel_store(gl: &glow::Context) {
    unsafe { PixelUnpackState::DEFAULTS.apply(gl) };
}

/// The only texture unit the splash binds textures on.
pub(crate) const SPLASH_TEXTURE_UNIT: u32 = glow::TEXTURE0;

/// Capabilities the splash disables or enables while drawing.
const CAPABILITIES: [u32; 5] = [
    glow::BLEND,
    glow::SCISSOR_TEST,
    glow::DEPTH_TEST,
    glow::STENCIL_TEST,
    glow::CULL_FACE,
];

/// Every piece of GL state the splash modifies.
#[derive(Clone, Debug)]
pub struct GlStateSnapshot {
    program: Option<glow::Program>,
    vertex_array: Option<glow::VertexArray>,
    array_buffer: Option<glow::Buffer>,
    active_texture: u32,
    texture_2d: Option<glow::Texture>,
    draw_framebuffer: Option<glow::Framebuffer>,
    read_framebuffer: Option<glow::Framebuffer>,
    renderbuffer: Option<glow::Renderbuffer>,
    viewport: [i32; 4],
    clear_color: [f32; 4],
    capabilities: [bool; CAPABILITIES.len()],
    blend_func: [u32; 4],
    blend_equation: [u32; 2],
    unpack: PixelUnpackState,
}

impl GlStateSnapshot {
    /// Record the current state.
    ///
    /// # Safety
    ///
    /// Requires a valid, current OpenGL context.
    #[expect(clippy::cast_sign_loss)] // GL enums are queried as i32
    pub unsafe fn capture(gl: &glow::Context) -> Self {
        unsafe {
            let active_texture = gl.get_parameter_i32(glow::ACTIVE_TEXTURE) as u32;
            gl.active_texture(SPLASH_TEXTURE_UNIT);
            let texture_2d = handle(
                gl.get_parameter_i32(glow::TEXTURE_BINDING_2D),
                glow::NativeTexture,
            );
            gl.active_texture(active_texture);

            let mut viewport = [0; 4];
            gl.get_parameter_i32_slice(glow::VIEWPORT, &mut viewport);
            let mut clear_color = [0.0; 4];
            gl.get_parameter_f32_slice(glow::COLOR_CLEAR_VALUE, &mut clear_color);

            Self {
                program: handle(gl.get_parameter_i32(glow::CURRENT_PROGRAM), glow::NativeProgram),
                vertex_array: handle(
                    gl.get_parameter_i32(glow::VERTEX_ARRAY_BINDING),
                    glow::NativeVertexArray,
                ),
                array_buffer: handle(
                    gl.get_parameter_i32(glow::ARRAY_BUFFER_BINDING),
                    glow::NativeBuffer,
                ),
                active_texture,
                texture_2d,
                draw_framebuffer: handle(
                    gl.get_parameter_i32(glow::DRAW_FRAMEBUFFER_BINDING),
                    glow::NativeFramebuffer,
                ),
                read_framebuffer: handle(
                    gl.get_parameter_i32(glow::READ_FRAMEBUFFER_BINDING),
                    glow::NativeFramebuffer,
                ),
                renderbuffer: handle(
                    gl.get_parameter_i32(glow::RENDERBUFFER_BINDING),
                    glow::NativeRenderbuffer,
                ),
                viewport,
                clear_color,
                capabilities: CAPABILITIES.map(|cap| gl.is_enabled(cap)),
                blend_func: [
                    gl.get_parameter_i32(glow::BLEND_SRC_RGB) as u32,
                    gl.get_parameter_i32(glow::BLEND_DST_RGB) as u32,
                    gl.get_parameter_i32(glow::BLEND_SRC_ALPHA) as u32,
                    gl.get_parameter_i32(glow::BLEND_DST_ALPHA) as u32,
                ],
                blend_equation: [
                    gl.get_parameter_i32(glow::BLEND_EQUATION_RGB) as u32,
                    gl.get_parameter_i32(glow::BLEND_EQUATION_ALPHA) as u32,
                ],
                unpack: PixelUnpackState::capture(gl),
            }
        }
    }

    /// Put the recorded state back.
    ///
    /// # Safety
    ///
    /// Requires the context the snapshot was captured from to be current.
    pub unsafe fn restore(&self, gl: &glow::Context) {
        unsafe {
            gl.use_program(self.program);
            gl.bind_vertex_array(self.vertex_array);
            gl.bind_buffer(glow::ARRAY_BUFFER, self.array_buffer);

            gl.active_texture(SPLASH_TEXTURE_UNIT);
            gl.bind_texture(glow::TEXTURE_2D, self.texture_2d);
            gl.active_texture(self.active_texture);

            gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, self.draw_framebuffer);
            gl.bind_framebuffer(glow::READ_FRAMEBUFFER, self.read_framebuffer);
            gl.bind_renderbuffer(glow::RENDERBUFFER, self.renderbuffer);

            let [x, y, w, h] = self.viewport;
            gl.viewport(x, y, w, h);
            let [r, g, b, a] = self.clear_color;
            gl.clear_color(r, g, b, a);

            for (cap, enabled) in CAPABILITIES.iter().zip(self.capabilities) {
                if enabled {
                    gl.enable(*cap);
                } else {
                    gl.disable(*cap);
                }
            }

            let [src_rgb, dst_rgb, src_alpha, dst_alpha] = self.blend_func;
            gl.blend_func_separate(src_rgb, dst_rgb, src_alpha, dst_alpha);
            let [mode_rgb, mode_alpha] = self.blend_equation;
            gl.blend_equation_separate(mode_rgb, mode_alpha);

            self.unpack.apply(gl);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpack_defaults_match_gl_initial_values() {
        let d = PixelUnpackState::DEFAULTS;
        assert_eq!(d.buffer, None);
        assert!(!d.swap_bytes && !d.lsb_first);
        assert_eq!([d.row_length, d.skip_rows, d.skip_pixels], [0, 0, 0]);
        assert_eq!(d.alignment, 4);
    }

    #[test]
    fn splash_texture_unit_is_the_saved_unit() {
        // Capture and restore save exactly one 2D binding; drawing must not
        // bind on any other unit.
        assert_eq!(SPLASH_TEXTURE_UNIT, glow::TEXTURE0);
        let source = include_str!("gpu.rs");
        assert!(!source.contains("active_texture(glow::TEXTURE"));
        assert!(source.contains("active_texture(SPLASH_TEXTURE_UNIT)"));
    }

    #[test]
    fn handle_rejects_zero_and_negative() {
        assert_eq!(handle(0, glow::NativeBuffer), None);
        assert_eq!(handle(-1, glow::NativeBuffer), None);
        assert_eq!(
            handle(7, glow::NativeBuffer),
            NonZeroU32::new(7).map(glow::NativeBuffer)
        );
    }
}
