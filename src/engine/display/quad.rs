//! ### English
//! `FramePresenter` drawing the acquired texture on a full-viewport quad with `glow`.
//!
//! ### 中文
//! 使用 `glow` 把获取到的纹理绘制到铺满视口的四边形上的 `FramePresenter`。

use std::ffi::{CString, c_void};
use std::num::NonZeroU32;
use std::sync::Arc;

use glow::HasContext as _;

use crate::engine::error::{CaptureError, Result};
use crate::engine::frame::AcquiredFrame;

use super::FramePresenter;

const QUAD_VERTICES: [f32; 12] = [
    1.0, 1.0, 0.0, //
    -1.0, 1.0, 0.0, //
    -1.0, -1.0, 0.0, //
    1.0, -1.0, 0.0,
];

const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

const VERTEX_SHADER_BODY: &str = r#"
layout(location = 0) in vec3 position;
out vec2 vTexCoords;
void main() {
    gl_Position = vec4(position, 1.0);
    vTexCoords = position.xy * 0.5 + vec2(0.5);
}
"#;

const FRAGMENT_SHADER_BODY: &str = r#"
precision mediump float;
uniform sampler2D uTexture;
in vec2 vTexCoords;
out vec4 fragColor;
void main() {
    fragColor = texture(uTexture, vTexCoords);
}
"#;

/// ### English
/// Compiles and links a vertex/fragment program. Shaders are always released.
///
/// ### 中文
/// 编译并链接顶点/片元程序。shader 对象总会被释放。
unsafe fn compile_program(
    gl: &glow::Context,
    vertex_src: &str,
    fragment_src: &str,
) -> Result<glow::NativeProgram> {
    let vs = unsafe { gl.create_shader(glow::VERTEX_SHADER) }
        .map_err(|err| CaptureError::DisplaySetup(format!("create_shader(VS) failed: {err}")))?;
    unsafe {
        gl.shader_source(vs, vertex_src);
        gl.compile_shader(vs);
        if !gl.get_shader_compile_status(vs) {
            let log = gl.get_shader_info_log(vs);
            gl.delete_shader(vs);
            tracing::error!(%log, "vertex shader compilation failed");
            return Err(CaptureError::DisplaySetup(format!("vertex shader: {log}")));
        }
    }

    let fs = match unsafe { gl.create_shader(glow::FRAGMENT_SHADER) } {
        Ok(fs) => fs,
        Err(err) => {
            unsafe { gl.delete_shader(vs) };
            return Err(CaptureError::DisplaySetup(format!(
                "create_shader(FS) failed: {err}"
            )));
        }
    };
    unsafe {
        gl.shader_source(fs, fragment_src);
        gl.compile_shader(fs);
        if !gl.get_shader_compile_status(fs) {
            let log = gl.get_shader_info_log(fs);
            gl.delete_shader(vs);
            gl.delete_shader(fs);
            tracing::error!(%log, "fragment shader compilation failed");
            return Err(CaptureError::DisplaySetup(format!("fragment shader: {log}")));
        }
    }

    let program = match unsafe { gl.create_program() } {
        Ok(program) => program,
        Err(err) => {
            unsafe {
                gl.delete_shader(vs);
                gl.delete_shader(fs);
            }
            return Err(CaptureError::DisplaySetup(format!(
                "create_program failed: {err}"
            )));
        }
    };

    unsafe {
        gl.attach_shader(program, vs);
        gl.attach_shader(program, fs);
        gl.link_program(program);

        gl.detach_shader(program, vs);
        gl.detach_shader(program, fs);
        gl.delete_shader(vs);
        gl.delete_shader(fs);

        if !gl.get_program_link_status(program) {
            let log = gl.get_program_info_log(program);
            gl.delete_program(program);
            tracing::error!(%log, "quad program link failed");
            return Err(CaptureError::DisplaySetup(format!("link: {log}")));
        }
    }

    Ok(program)
}

/// ### English
/// Display-context quad renderer.
///
/// Must be created, used and dropped on the display thread with the display context current.
///
/// ### 中文
/// 显示上下文中的四边形渲染器。
///
/// 创建、使用与 drop 都必须在显示线程、显示上下文 current 时进行。
pub struct GlowQuadPresenter {
    gl: Arc<glow::Context>,
    program: glow::NativeProgram,
    vertex_array: glow::NativeVertexArray,
    vertex_buffer: glow::NativeBuffer,
    index_buffer: glow::NativeBuffer,
    texture_location: Option<glow::NativeUniformLocation>,
    placeholder_color: [f32; 4],
}

impl GlowQuadPresenter {
    /// ### English
    /// Loads the display context's GL functions through `loader` and builds the quad.
    ///
    /// # Safety
    /// The display context must be current and `loader` must resolve its entry points.
    ///
    /// ### 中文
    /// 通过 `loader` 加载显示上下文的 GL 函数并构建四边形。
    ///
    /// # Safety
    /// 显示上下文必须 current，且 `loader` 必须能解析其函数入口。
    pub unsafe fn load_with(
        mut loader: impl FnMut(&std::ffi::CStr) -> *const c_void,
        placeholder_color: [f32; 4],
    ) -> Result<Self> {
        let gl = unsafe {
            glow::Context::from_loader_function(|name| match CString::new(name) {
                Ok(name) => loader(name.as_c_str()),
                Err(_) => std::ptr::null(),
            })
        };
        unsafe { Self::new(Arc::new(gl), placeholder_color) }
    }

    /// ### English
    /// Builds the program and quad buffers on an already loaded context.
    ///
    /// # Safety
    /// `gl` must belong to the display context, which must be current.
    ///
    /// ### 中文
    /// 在已加载的上下文上构建程序与四边形缓冲。
    ///
    /// # Safety
    /// `gl` 必须属于显示上下文，且该上下文必须 current。
    pub unsafe fn new(gl: Arc<glow::Context>, placeholder_color: [f32; 4]) -> Result<Self> {
        let header = if gl.version().is_embedded {
            "#version 300 es\n"
        } else {
            "#version 330 core\n"
        };
        let vertex_src = format!("{header}{VERTEX_SHADER_BODY}");
        let fragment_src = format!("{header}{FRAGMENT_SHADER_BODY}");

        let program = unsafe { compile_program(&gl, &vertex_src, &fragment_src)? };

        let vertex_array = unsafe { gl.create_vertex_array() };
        let vertex_buffer = unsafe { gl.create_buffer() };
        let index_buffer = unsafe { gl.create_buffer() };
        let (vertex_array, vertex_buffer, index_buffer) =
            match (vertex_array, vertex_buffer, index_buffer) {
                (Ok(vertex_array), Ok(vertex_buffer), Ok(index_buffer)) => {
                    (vertex_array, vertex_buffer, index_buffer)
                }
                (vertex_array, vertex_buffer, index_buffer) => {
                    unsafe {
                        if let Ok(vertex_array) = vertex_array {
                            gl.delete_vertex_array(vertex_array);
                        }
                        for buffer in [vertex_buffer, index_buffer].into_iter().flatten() {
                            gl.delete_buffer(buffer);
                        }
                        gl.delete_program(program);
                    }
                    return Err(CaptureError::DisplaySetup(
                        "quad buffer creation failed".to_string(),
                    ));
                }
            };

        let texture_location;
        unsafe {
            gl.bind_vertex_array(Some(vertex_array));

            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vertex_buffer));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&QUAD_VERTICES),
                glow::STATIC_DRAW,
            );

            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(index_buffer));
            gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(&QUAD_INDICES),
                glow::STATIC_DRAW,
            );

            gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, 3 * size_of::<f32>() as i32, 0);
            gl.enable_vertex_attrib_array(0);

            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);

            texture_location = gl.get_uniform_location(program, "uTexture");
        }

        Ok(Self {
            gl,
            program,
            vertex_array,
            vertex_buffer,
            index_buffer,
            texture_location,
            placeholder_color,
        })
    }

    pub fn gl(&self) -> &Arc<glow::Context> {
        &self.gl
    }

    fn clear(&self) {
        let [r, g, b, a] = self.placeholder_color;
        unsafe {
            self.gl.clear_color(r, g, b, a);
            self.gl.clear(glow::COLOR_BUFFER_BIT);
        }
    }
}

impl FramePresenter for GlowQuadPresenter {
    fn draw_frame(&mut self, frame: &AcquiredFrame) -> u64 {
        let gl = &self.gl;

        if frame.producer_fence != 0 {
            let sync = glow::NativeFence(frame.producer_fence as usize as *mut _);
            unsafe {
                gl.wait_sync(sync, 0, glow::TIMEOUT_IGNORED);
                gl.delete_sync(sync);
            }
        }

        self.clear();
        let Some(texture) = NonZeroU32::new(frame.surface.texture()).map(glow::NativeTexture) else {
            return 0;
        };

        unsafe {
            gl.use_program(Some(self.program));
            gl.bind_vertex_array(Some(self.vertex_array));

            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.uniform_1_i32(self.texture_location.as_ref(), 0);

            gl.draw_elements(glow::TRIANGLES, QUAD_INDICES.len() as i32, glow::UNSIGNED_INT, 0);

            gl.bind_texture(glow::TEXTURE_2D, None);
            gl.bind_vertex_array(None);
            gl.use_program(None);
        }

        let Ok(sync) = (unsafe { gl.fence_sync(glow::SYNC_GPU_COMMANDS_COMPLETE, 0) }) else {
            return 0;
        };
        // Flushed so the decoder context can wait on it.
        unsafe { gl.flush() };
        sync.0 as usize as u64
    }

    fn draw_placeholder(&mut self) {
        self.clear();
    }

    fn delete_fence(&mut self, fence: u64) {
        if fence == 0 {
            return;
        }
        let sync = glow::NativeFence(fence as usize as *mut _);
        unsafe { self.gl.delete_sync(sync) };
    }
}

impl Drop for GlowQuadPresenter {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_buffer(self.index_buffer);
            self.gl.delete_buffer(self.vertex_buffer);
            self.gl.delete_vertex_array(self.vertex_array);
            self.gl.delete_program(self.program);
        }
    }
}
