//! GPU objects behind a [`DrawSurface`]: shader programs and logo textures
//! ([`GpuContext`]), the host framebuffer being drawn into
//! ([`RenderTarget`]), and the optional MSAA buffer the scene is rasterized
//! into first ([`Surface`]).
//!
//! All three are built and freed together by [`GlSurfaceFactory`].

use glow::{HasContext, PixelUnpackData};

use crate::{
    gl_state::SPLASH_TEXTURE_UNIT,
    letterbox::Letterbox,
    logos::{Logo, LogoSet, LogoSlot},
    scene::{ImageNode, SceneGraph},
    shaders,
    surface::{SurfaceFactory, SurfaceKey},
    types::{QuadMesh, Vertex},
};

/// GL internal format for RGBA8 textures, pre-cast to the `i32` that
/// `tex_image_2d` expects.
#[expect(clippy::cast_possible_wrap)]
const RGBA8_INTERNAL_FORMAT: i32 = glow::RGBA8 as i32;

/// Convert a `u32` to `i32` for GL API calls, saturating.
///
/// Viewport and image sizes never come near `i32::MAX`.
fn gl_size(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Uniforms of the shared quad vertex shader.
struct QuadUniforms {
    /// `u_scale` — node size.
    scale: glow::UniformLocation,
    /// `u_offset` — node position.
    offset: glow::UniformLocation,
    /// `u_view_scale` — letterbox scale.
    view_scale: glow::UniformLocation,
    /// `u_view_offset` — letterbox offset.
    view_offset: glow::UniformLocation,
    /// `u_resolution` — framebuffer size in pixels.
    resolution: glow::UniformLocation,
}

impl QuadUniforms {
    unsafe fn locate(gl: &glow::Context, program: glow::Program) -> Result<Self, String> {
        unsafe {
            Ok(Self {
                scale: shaders::uniform(gl, program, "u_scale")?,
                offset: shaders::uniform(gl, program, "u_offset")?,
                view_scale: shaders::uniform(gl, program, "u_view_scale")?,
                view_offset: shaders::uniform(gl, program, "u_view_offset")?,
                resolution: shaders::uniform(gl, program, "u_resolution")?,
            })
        }
    }

    /// Set the placement of one quad.
    unsafe fn set(
        &self,
        gl: &glow::Context,
        [x, y]: [f32; 2],
        [w, h]: [f32; 2],
        view: &Letterbox,
        resolution: [f32; 2],
    ) {
        unsafe {
            gl.uniform_2_f32(Some(&self.scale), w, h);
            gl.uniform_2_f32(Some(&self.offset), x, y);
            gl.uniform_1_f32(Some(&self.view_scale), view.scale);
            gl.uniform_2_f32(Some(&self.view_offset), view.offset[0], view.offset[1]);
            gl.uniform_2_f32(Some(&self.resolution), resolution[0], resolution[1]);
        }
    }
}

/// A logo texture and the image it was uploaded from.
struct CachedTexture {
    /// [`Logo::id`] of the source image.
    source: usize,
    texture: glow::Texture,
}

/// Shader programs, quad buffers, and uploaded logo textures.
pub struct GpuContext {
    solid_program: glow::Program,
    solid_quad: QuadUniforms,
    /// `u_color` of the solid program.
    solid_color: glow::UniformLocation,

    image_program: glow::Program,
    image_quad: QuadUniforms,
    /// `u_texture` of the image program (always unit 0).
    image_texture: glow::UniformLocation,
    /// `u_opacity` of the image program.
    image_opacity: glow::UniformLocation,

    vao: glow::VertexArray,
    vbo: glow::Buffer,
    ebo: glow::Buffer,
    index_count: i32,

    /// Per [`LogoSlot`], uploaded on first draw.
    textures: [Option<CachedTexture>; 2],
}

impl GpuContext {
    /// Compile programs and upload the quad mesh.
    ///
    /// # Safety
    ///
    /// Requires a valid, current OpenGL context.
    unsafe fn new(gl: &glow::Context, quad: &QuadMesh) -> Result<Self, String> {
        let solid_program = unsafe {
            shaders::compile_program(gl, shaders::QUAD_VERTEX_SRC, shaders::SOLID_FRAGMENT_SRC)?
        };
        let image_program = unsafe {
            shaders::compile_program(gl, shaders::QUAD_VERTEX_SRC, shaders::IMAGE_FRAGMENT_SRC)
        }
        .inspect_err(|_| unsafe { gl.delete_program(solid_program) })?;

        let built = unsafe { Self::assemble(gl, quad, solid_program, image_program) };
        if built.is_err() {
            unsafe {
                gl.delete_program(solid_program);
                gl.delete_program(image_program);
            }
        }
        built
    }

    /// Resolve uniforms and upload the quad for freshly linked programs.
    unsafe fn assemble(
        gl: &glow::Context,
        quad: &QuadMesh,
        solid_program: glow::Program,
        image_program: glow::Program,
    ) -> Result<Self, String> {
        unsafe {
            let solid_quad = QuadUniforms::locate(gl, solid_program)?;
            let solid_color = shaders::uniform(gl, solid_program, "u_color")?;
            let image_quad = QuadUniforms::locate(gl, image_program)?;
            let image_texture = shaders::uniform(gl, image_program, "u_texture")?;
            let image_opacity = shaders::uniform(gl, image_program, "u_opacity")?;
            let (vao, vbo, ebo) = Self::upload_quad(gl, quad)?;

            Ok(Self {
                solid_program,
                solid_quad,
                solid_color,
                image_program,
                image_quad,
                image_texture,
                image_opacity,
                vao,
                vbo,
                ebo,
                index_count: i32::try_from(quad.indices.len()).unwrap_or(i32::MAX),
                textures: [None, None],
            })
        }
    }

    /// Create a VAO with a single `vec2` position attribute and fill its
    /// buffers with the quad mesh.
    unsafe fn upload_quad(
        gl: &glow::Context,
        quad: &QuadMesh,
    ) -> Result<(glow::VertexArray, glow::Buffer, glow::Buffer), String> {
        unsafe {
            let vao = gl.create_vertex_array()?;
            let vbo = gl.create_buffer()?;
            let ebo = gl.create_buffer()?;

            gl.bind_vertex_array(Some(vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&quad.vertices),
                glow::STATIC_DRAW,
            );
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
            gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(&quad.indices),
                glow::STATIC_DRAW,
            );
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(
                0,
                2,
                glow::FLOAT,
                false,
                // Vertex is 8 bytes — well within i32 range.
                #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                {
                    std::mem::size_of::<Vertex>() as i32
                },
                0,
            );
            gl.bind_vertex_array(None);

            Ok((vao, vbo, ebo))
        }
    }

    /// Draw the quad mesh with whatever program and uniforms are current.
    unsafe fn draw_quad(&self, gl: &glow::Context) {
        unsafe {
            gl.bind_vertex_array(Some(self.vao));
            gl.draw_elements(glow::TRIANGLES, self.index_count, glow::UNSIGNED_INT, 0);
            gl.bind_vertex_array(None);
        }
    }

    /// Return the texture for `logo`, uploading it if this slot holds
    /// nothing or holds a different image.
    unsafe fn ensure_texture(
        &mut self,
        gl: &glow::Context,
        slot: LogoSlot,
        logo: &Logo,
    ) -> Result<glow::Texture, String> {
        let cached = &mut self.textures[slot.index()];
        if let Some(cached) = cached.as_ref().filter(|c| c.source == logo.id()) {
            return Ok(cached.texture);
        }
        if let Some(stale) = cached.take() {
            unsafe { gl.delete_texture(stale.texture) };
        }

        let [width, height] = logo.size();
        let texture = unsafe { gl.create_texture() }?;
        unsafe {
            gl.active_texture(SPLASH_TEXTURE_UNIT);
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                RGBA8_INTERNAL_FORMAT,
                gl_size(width),
                gl_size(height),
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                PixelUnpackData::Slice(Some(logo.pixels())),
            );
            set_default_tex_params(gl);
            gl.bind_texture(glow::TEXTURE_2D, None);
        }

        *cached = Some(CachedTexture {
            source: logo.id(),
            texture,
        });
        Ok(texture)
    }

    unsafe fn draw_background(
        &self,
        gl: &glow::Context,
        graph: &SceneGraph,
        design: [f32; 2],
        view: &Letterbox,
        resolution: [f32; 2],
    ) {
        let [r, g, b, a] = graph.background;
        unsafe {
            gl.use_program(Some(self.solid_program));
            self.solid_quad.set(gl, [0.0, 0.0], design, view, resolution);
            gl.uniform_4_f32(Some(&self.solid_color), r, g, b, a);
            self.draw_quad(gl);
        }
    }

    unsafe fn draw_image(
        &mut self,
        gl: &glow::Context,
        node: &ImageNode,
        logo: &Logo,
        opacity: f32,
        view: &Letterbox,
        resolution: [f32; 2],
    ) -> Result<(), String> {
        let texture = unsafe { self.ensure_texture(gl, node.slot, logo) }?;
        unsafe {
            gl.use_program(Some(self.image_program));
            self.image_quad.set(gl, node.origin, node.size, view, resolution);
            // Logos never overlap, so per-image opacity matches group opacity.
            gl.uniform_1_f32(Some(&self.image_opacity), opacity);
            gl.active_texture(SPLASH_TEXTURE_UNIT);
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.uniform_1_i32(Some(&self.image_texture), 0);
            self.draw_quad(gl);
            gl.bind_texture(glow::TEXTURE_2D, None);
        }
        Ok(())
    }

    unsafe fn destroy(self, gl: &glow::Context) {
        unsafe {
            gl.delete_program(self.solid_program);
            gl.delete_program(self.image_program);
            gl.delete_vertex_array(self.vao);
            gl.delete_buffer(self.vbo);
            gl.delete_buffer(self.ebo);
            for cached in self.textures.into_iter().flatten() {
                gl.delete_texture(cached.texture);
            }
        }
    }
}

/// Set default texture filtering and wrapping parameters.
unsafe fn set_default_tex_params(gl: &glow::Context) {
    // GL constant values are small enough that the cast is always safe.
    #[expect(clippy::cast_possible_wrap)]
    unsafe {
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
    }
}

/// The host framebuffer the splash ends up in.
///
/// Keys the surface slot: a new handle or a new size rebuilds the surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderTarget {
    /// Host framebuffer object; `None` is the default framebuffer.
    pub framebuffer: Option<glow::Framebuffer>,
    /// Pixel size the surface was built for.
    pub size: [u32; 2],
}

impl SurfaceKey for RenderTarget {
    fn size(&self) -> [u32; 2] {
        self.size
    }
}

/// Off-screen MSAA buffer, resolved into the [`RenderTarget`] on flush.
/// Without one the scene is drawn straight into the target.
pub struct Surface {
    msaa: Option<(glow::Framebuffer, glow::Renderbuffer)>,
}

impl Surface {
    unsafe fn new(gl: &glow::Context, size: [u32; 2], samples: u8) -> Result<Self, String> {
        if samples == 0 {
            return Ok(Self { msaa: None });
        }

        unsafe {
            let fbo = gl.create_framebuffer()?;
            let rbo = gl
                .create_renderbuffer()
                .inspect_err(|_| gl.delete_framebuffer(fbo))?;

            gl.bind_renderbuffer(glow::RENDERBUFFER, Some(rbo));
            gl.renderbuffer_storage_multisample(
                glow::RENDERBUFFER,
                i32::from(samples),
                glow::RGBA8,
                gl_size(size[0]),
                gl_size(size[1]),
            );
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));
            gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::RENDERBUFFER,
                Some(rbo),
            );
            let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            gl.bind_renderbuffer(glow::RENDERBUFFER, None);

            if status != glow::FRAMEBUFFER_COMPLETE {
                gl.delete_framebuffer(fbo);
                gl.delete_renderbuffer(rbo);
                return Err(format!("MSAA framebuffer incomplete: 0x{status:x}"));
            }

            Ok(Self {
                msaa: Some((fbo, rbo)),
            })
        }
    }

    unsafe fn destroy(self, gl: &glow::Context) {
        if let Some((fbo, rbo)) = self.msaa {
            unsafe {
                gl.delete_framebuffer(fbo);
                gl.delete_renderbuffer(rbo);
            }
        }
    }
}

/// Context, target and surface, owned as one unit.
pub struct DrawSurface {
    context: GpuContext,
    target: RenderTarget,
    surface: Surface,
}

impl DrawSurface {
    /// Rasterize `graph` under `view`.
    ///
    /// Nodes whose logo is absent from `logos` are skipped. The caller owns
    /// blending state and must [`flush`](Self::flush) afterwards.
    ///
    /// # Safety
    ///
    /// Requires the context this surface was created with to be current.
    ///
    /// # Errors
    ///
    /// Returns a GL error string if a logo texture cannot be created.
    pub unsafe fn draw(
        &mut self,
        gl: &glow::Context,
        graph: &SceneGraph,
        logos: &LogoSet,
        design: [f32; 2],
        view: &Letterbox,
    ) -> Result<(), String> {
        let [width, height] = self.target.size;
        // Precision loss is acceptable: viewport dimensions are small
        // relative to f32 mantissa range.
        #[expect(clippy::cast_precision_loss)]
        let resolution = [width as f32, height as f32];

        let draw_fbo = self
            .surface
            .msaa
            .map_or(self.target.framebuffer, |(fbo, _)| Some(fbo));

        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, draw_fbo);
            gl.viewport(0, 0, gl_size(width), gl_size(height));
            for cap in [
                glow::SCISSOR_TEST,
                glow::DEPTH_TEST,
                glow::STENCIL_TEST,
                glow::CULL_FACE,
            ] {
                gl.disable(cap);
            }
            if self.surface.msaa.is_some() {
                gl.clear_color(0.0, 0.0, 0.0, 0.0);
                gl.clear(glow::COLOR_BUFFER_BIT);
            }

            self.context
                .draw_background(gl, graph, design, view, resolution);
        }

        for node in &graph.nodes {
            if let Some(logo) = logos.get(node.slot) {
                unsafe {
                    self.context
                        .draw_image(gl, node, logo, graph.opacity, view, resolution)?;
                }
            }
        }
        Ok(())
    }

    /// Resolve the MSAA buffer into the target, if there is one, and submit
    /// the queued commands.
    ///
    /// # Safety
    ///
    /// Requires the context this surface was created with to be current.
    pub unsafe fn flush(&self, gl: &glow::Context) {
        let w = gl_size(self.target.size[0]);
        let h = gl_size(self.target.size[1]);
        unsafe {
            if let Some((fbo, _)) = self.surface.msaa {
                gl.bind_framebuffer(glow::READ_FRAMEBUFFER, Some(fbo));
                gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, self.target.framebuffer);
                gl.blit_framebuffer(
                    0,
                    0,
                    w,
                    h,
                    0,
                    0,
                    w,
                    h,
                    glow::COLOR_BUFFER_BIT,
                    glow::NEAREST,
                );
            }
            gl.flush();
        }
    }
}

/// Builds [`DrawSurface`]s for whichever [`RenderTarget`] the slot asks for.
pub struct GlSurfaceFactory<'a> {
    gl: &'a glow::Context,
    quad: &'a QuadMesh,
    samples: u8,
}

impl<'a> GlSurfaceFactory<'a> {
    /// A factory rasterizing with `samples` MSAA samples (`0` disables
    /// MSAA).
    ///
    /// # Safety
    ///
    /// `gl` must be current for as long as the factory is used.
    #[must_use]
    pub unsafe fn new(gl: &'a glow::Context, quad: &'a QuadMesh, samples: u8) -> Self {
        Self { gl, quad, samples }
    }
}

impl SurfaceFactory for GlSurfaceFactory<'_> {
    type Surface = DrawSurface;
    type Key = RenderTarget;
    type Error = String;

    fn create(&mut self, target: RenderTarget) -> Result<DrawSurface, String> {
        // SAFETY: `new` requires the context to be current.
        let context = unsafe { GpuContext::new(self.gl, self.quad) }?;
        let surface = match unsafe { Surface::new(self.gl, target.size, self.samples) } {
            Ok(surface) => surface,
            Err(err) => {
                unsafe { context.destroy(self.gl) };
                return Err(err);
            }
        };
        log::debug!(
            "created {}x{} splash surface ({} samples)",
            target.size[0],
            target.size[1],
            self.samples
        );
        Ok(DrawSurface {
            context,
            target,
            surface,
        })
    }

    fn release(&mut self, surface: DrawSurface) {
        let DrawSurface {
            context, surface, ..
        } = surface;
        // SAFETY: `new` requires the context to be current.
        unsafe {
            surface.destroy(self.gl);
            context.destroy(self.gl);
        }
    }
}
