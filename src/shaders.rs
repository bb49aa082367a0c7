//! GLSL shader sources and compilation helpers.
//!
//! All shaders target GLSL 1.40 (OpenGL 3.1), which is widely supported on
//! desktop platforms.

use glow::HasContext;

/// Vertex shader shared by both programs.
///
/// Places the unit rectangle on the design canvas, then maps the canvas onto
/// the framebuffer with the letterbox transform.
///
/// # Uniforms
///
/// | Name            | Type    | Description                                |
/// |-----------------|---------|--------------------------------------------|
/// | `u_scale`       | `vec2`  | Node size in design pixels                 |
/// | `u_offset`      | `vec2`  | Node position in design pixels             |
/// | `u_view_scale`  | `float` | Letterbox scale, design to framebuffer     |
/// | `u_view_offset` | `vec2`  | Letterbox offset in framebuffer pixels     |
/// | `u_resolution`  | `vec2`  | Framebuffer size in pixels                 |
pub const QUAD_VERTEX_SRC: &str = r"#version 140

in vec2 a_position;

uniform vec2 u_scale;
uniform vec2 u_offset;
uniform float u_view_scale;
uniform vec2 u_view_offset;
uniform vec2 u_resolution;

out vec2 v_uv;

void main() {
    v_uv = a_position;

    vec2 design = u_offset + u_scale * a_position;
    vec2 pixel = u_view_offset + u_view_scale * design;

    // Convert from [0, resolution] to [-1, 1] (flip Y for GL)
    vec2 ndc = (pixel / u_resolution) * 2.0 - 1.0;
    ndc.y = -ndc.y;

    gl_Position = vec4(ndc, 0.0, 1.0);
}
";

/// Fragment shader for solid fills. Output is premultiplied.
pub const SOLID_FRAGMENT_SRC: &str = r"#version 140

uniform vec4 u_color;

out vec4 frag_color;

void main() {
    frag_color = u_color;
    frag_color.rgb *= frag_color.a;
}
";

/// Fragment shader for logos.
///
/// Samples the bound texture, applies the group opacity, and premultiplies
/// the result by alpha.
///
/// # Uniforms
///
/// | Name        | Type        | Description                          |
/// |-------------|-------------|--------------------------------------|
/// | `u_texture` | `sampler2D` | Bound texture unit                   |
/// | `u_opacity` | `float`     | Opacity multiplier (1.0 = opaque)    |
pub const IMAGE_FRAGMENT_SRC: &str = r"#version 140

in vec2 v_uv;

uniform sampler2D u_texture;
uniform float u_opacity;

out vec4 frag_color;

void main() {
    frag_color = texture(u_texture, v_uv);
    frag_color.a *= u_opacity;
    // Premultiply alpha
    frag_color.rgb *= frag_color.a;
}
";

/// Compile a shader program from vertex and fragment source strings.
///
/// The compiled shader objects are detached and deleted after successful
/// linking, so only the program handle needs to be cleaned up by the caller.
///
/// # Safety
///
/// Requires a valid, current OpenGL context.
///
/// # Errors
///
/// Returns a descriptive error string if shader compilation or program
/// linking fails.
pub unsafe fn compile_program(
    gl: &glow::Context,
    vertex_src: &str,
    fragment_src: &str,
) -> Result<glow::Program, String> {
    let program = unsafe { gl.create_program() }?;

    let vs = match unsafe { compile_shader(gl, glow::VERTEX_SHADER, vertex_src) } {
        Ok(vs) => vs,
        Err(err) => {
            unsafe { gl.delete_program(program) };
            return Err(err);
        }
    };
    let fs = match unsafe { compile_shader(gl, glow::FRAGMENT_SHADER, fragment_src) } {
        Ok(fs) => fs,
        Err(err) => {
            unsafe {
                gl.delete_shader(vs);
                gl.delete_program(program);
            }
            return Err(err);
        }
    };

    unsafe {
        gl.attach_shader(program, vs);
        gl.attach_shader(program, fs);
        // The quad mesh feeds attribute 0.
        gl.bind_attrib_location(program, 0, "a_position");
        gl.link_program(program);

        if !gl.get_program_link_status(program) {
            let log = gl.get_program_info_log(program);
            gl.delete_program(program);
            gl.delete_shader(vs);
            gl.delete_shader(fs);
            return Err(format!("Program link error: {log}"));
        }

        gl.detach_shader(program, vs);
        gl.detach_shader(program, fs);
        gl.delete_shader(vs);
        gl.delete_shader(fs);
    }

    Ok(program)
}

/// Look up a uniform that the shader sources above are known to declare.
///
/// # Safety
///
/// Requires a valid, current OpenGL context.
///
/// # Errors
///
/// Returns an error string naming the uniform if the linker optimized it
/// away or it was misspelled.
pub unsafe fn uniform(
    gl: &glow::Context,
    program: glow::Program,
    name: &str,
) -> Result<glow::UniformLocation, String> {
    unsafe { gl.get_uniform_location(program, name) }
        .ok_or_else(|| format!("uniform `{name}` missing from shader program"))
}

/// Compile a single shader stage (vertex or fragment) from source.
///
/// # Safety
///
/// Requires a valid, current OpenGL context.
unsafe fn compile_shader(
    gl: &glow::Context,
    shader_type: u32,
    source: &str,
) -> Result<glow::Shader, String> {
    unsafe {
        let shader = gl.create_shader(shader_type)?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);

        if !gl.get_shader_compile_status(shader) {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            return Err(format!("Shader compile error: {log}"));
        }

        Ok(shader)
    }
}
