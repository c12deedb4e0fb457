//! ### English
//! OpenGL `SurfaceDevice` backed by `gleam`, used on the decoder's shared context.
//!
//! ### 中文
//! 基于 `gleam` 的 OpenGL `SurfaceDevice`，在解码器的共享上下文上使用。

use std::ffi::c_void;
use std::rc::Rc;

use dpi::PhysicalSize;
use gleam::gl::{self, Gl};

use crate::engine::format::OutputFormat;

use super::{RenderTarget, SurfaceDevice};

/// ### English
/// Upper bound on errors drained per call (a lost context can report errors indefinitely).
///
/// ### 中文
/// 单次最多取出的错误数（上下文丢失时可能持续报错）。
const MAX_DRAINED_ERRORS: usize = 16;

fn gl_error_name(error: gl::GLenum) -> &'static str {
    match error {
        gl::INVALID_OPERATION => "GL_INVALID_OPERATION",
        gl::INVALID_ENUM => "GL_INVALID_ENUM",
        gl::INVALID_VALUE => "GL_INVALID_VALUE",
        gl::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        gl::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        _ => "unknown GL error",
    }
}

/// ### English
/// `SurfaceDevice` over a gleam GL function table.
///
/// ### 中文
/// 基于 gleam GL 函数表的 `SurfaceDevice`。
pub struct GleamSurfaceDevice {
    gl: Rc<dyn Gl>,
}

impl GleamSurfaceDevice {
    pub fn new(gl: Rc<dyn Gl>) -> Self {
        Self { gl }
    }

    /// ### English
    /// Loads the GL function table through `loader` (desktop GL first, GLES if `GL_VERSION`
    /// reports "OpenGL ES").
    ///
    /// # Safety
    /// The decoder's GL context must be current on the calling thread and `loader` must return
    /// valid entry points for it.
    ///
    /// ### 中文
    /// 通过 `loader` 加载 GL 函数表（先按桌面 GL 加载；若 `GL_VERSION` 为 "OpenGL ES" 则按 GLES 重新加载）。
    ///
    /// # Safety
    /// 调用线程上必须 current 解码器的 GL 上下文，且 `loader` 必须返回该上下文的有效入口。
    pub unsafe fn load_with(mut loader: impl FnMut(&str) -> *const c_void) -> Self {
        let gl = unsafe { gl::GlFns::load_with(&mut loader) };
        let version = gl.get_string(gl::VERSION);
        let gl = if version.starts_with("OpenGL ES") {
            unsafe { gl::GlesFns::load_with(&mut loader) }
        } else {
            gl
        };
        tracing::debug!(%version, "decoder GL functions loaded");
        Self { gl }
    }

    pub fn gl(&self) -> &Rc<dyn Gl> {
        &self.gl
    }
}

impl SurfaceDevice for GleamSurfaceDevice {
    fn create_target(&self, size: PhysicalSize<u32>, format: &OutputFormat) -> RenderTarget {
        let gl = &self.gl;

        let texture = gl.gen_textures(1)[0];
        gl.bind_texture(gl::TEXTURE_2D, texture);
        gl.tex_image_2d(
            gl::TEXTURE_2D,
            0,
            format.gl_format as gl::GLint,
            size.width as gl::GLsizei,
            size.height as gl::GLsizei,
            0,
            gl::RGBA,
            gl::UNSIGNED_BYTE,
            None,
        );
        gl.tex_parameter_i(
            gl::TEXTURE_2D,
            gl::TEXTURE_WRAP_S,
            gl::CLAMP_TO_EDGE as gl::GLint,
        );
        gl.tex_parameter_i(
            gl::TEXTURE_2D,
            gl::TEXTURE_WRAP_T,
            gl::CLAMP_TO_EDGE as gl::GLint,
        );
        gl.tex_parameter_i(
            gl::TEXTURE_2D,
            gl::TEXTURE_MIN_FILTER,
            gl::LINEAR as gl::GLint,
        );
        gl.tex_parameter_i(
            gl::TEXTURE_2D,
            gl::TEXTURE_MAG_FILTER,
            gl::LINEAR as gl::GLint,
        );

        let framebuffer = gl.gen_framebuffers(1)[0];
        gl.bind_framebuffer(gl::FRAMEBUFFER, framebuffer);
        gl.framebuffer_texture_2d(
            gl::FRAMEBUFFER,
            gl::COLOR_ATTACHMENT0,
            gl::TEXTURE_2D,
            texture,
            0,
        );
        gl.bind_texture(gl::TEXTURE_2D, 0);

        RenderTarget {
            texture,
            framebuffer,
        }
    }

    fn target_status(&self, target: &RenderTarget) -> u32 {
        self.gl.bind_framebuffer(gl::FRAMEBUFFER, target.framebuffer);
        self.gl.check_frame_buffer_status(gl::FRAMEBUFFER)
    }

    fn clear_target(&self, target: &RenderTarget) {
        self.gl.bind_framebuffer(gl::FRAMEBUFFER, target.framebuffer);
        self.gl.clear_color(0.0, 0.0, 0.0, 0.0);
        self.gl.clear(gl::COLOR_BUFFER_BIT);
    }

    fn delete_target(&self, target: &RenderTarget) {
        self.gl.delete_framebuffers(&[target.framebuffer]);
        self.gl.delete_textures(&[target.texture]);
    }

    fn bind_draw_target(&self, target: Option<&RenderTarget>) {
        let framebuffer = target.map_or(0, |target| target.framebuffer);
        self.gl.bind_framebuffer(gl::FRAMEBUFFER, framebuffer);
    }

    fn insert_fence(&self) -> u64 {
        let sync = self.gl.fence_sync(gl::SYNC_GPU_COMMANDS_COMPLETE, 0);
        if sync.is_null() {
            return 0;
        }
        self.gl.flush();
        sync as usize as u64
    }

    fn delete_fence(&self, fence: u64) {
        if fence == 0 {
            return;
        }
        self.gl.delete_sync(fence as usize as gl::GLsync);
    }

    fn wait_fence(&self, fence: u64) {
        if fence == 0 {
            return;
        }
        self.gl
            .wait_sync(fence as usize as gl::GLsync, 0, gl::TIMEOUT_IGNORED);
    }

    fn drain_errors(&self) -> usize {
        let mut count = 0;
        while count < MAX_DRAINED_ERRORS {
            let error = self.gl.get_error();
            if error == gl::NO_ERROR {
                break;
            }
            count += 1;
            tracing::warn!(
                code = error,
                name = gl_error_name(error),
                "GL error on decoder context"
            );
        }
        count
    }
}
