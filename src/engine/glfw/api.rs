//! ### English
//! Typed GLFW function table built from the embedder-provided addresses.
//!
//! ### 中文
//! 由宿主提供的地址构建的类型化 GLFW 函数表。

use std::ffi::{CStr, c_char, c_int, c_void};

use crate::engine::error::{CaptureError, Result};

use super::EmbedderGlfwApi;

#[repr(C)]
/// ### English
/// Opaque GLFW window type (`GLFWwindow`).
///
/// ### 中文
/// 不透明 GLFW window 类型（`GLFWwindow`）。
pub struct GLFWwindow {
    _private: [u8; 0],
}

#[repr(C)]
pub struct GLFWmonitor {
    _private: [u8; 0],
}

/// ### English
/// Raw window pointer type used by this crate.
///
/// ### 中文
/// 本 crate 使用的 window 裸指针类型。
pub type GlfwWindowPtr = *mut GLFWwindow;

type GLFWglproc = *const c_void;
type GlfwGetProcAddress = unsafe extern "C" fn(*const c_char) -> GLFWglproc;
type GlfwMakeContextCurrent = unsafe extern "C" fn(*mut GLFWwindow);
type GlfwGetCurrentContext = unsafe extern "C" fn() -> *mut GLFWwindow;
type GlfwDefaultWindowHints = unsafe extern "C" fn();
type GlfwWindowHint = unsafe extern "C" fn(c_int, c_int);
type GlfwGetWindowAttrib = unsafe extern "C" fn(*mut GLFWwindow, c_int) -> c_int;
type GlfwCreateWindow = unsafe extern "C" fn(
    c_int,
    c_int,
    *const c_char,
    *mut GLFWmonitor,
    *mut GLFWwindow,
) -> *mut GLFWwindow;
type GlfwDestroyWindow = unsafe extern "C" fn(*mut GLFWwindow);

/// ### English
/// Symbols needed to create an offscreen shared window (optional part of the table).
///
/// ### 中文
/// 创建离屏共享 window 所需的符号（函数表的可选部分）。
#[derive(Clone, Copy)]
struct WindowFns {
    default_window_hints: GlfwDefaultWindowHints,
    window_hint: GlfwWindowHint,
    get_window_attrib: GlfwGetWindowAttrib,
    create_window: GlfwCreateWindow,
    destroy_window: GlfwDestroyWindow,
}

#[derive(Clone, Copy)]
/// ### English
/// Loaded GLFW API (context control + proc loading, optionally window creation).
///
/// ### 中文
/// 已加载的 GLFW API（上下文控制 + 函数指针加载，可选 window 创建）。
pub struct GlfwApi {
    get_proc_address: GlfwGetProcAddress,
    make_context_current: GlfwMakeContextCurrent,
    get_current_context: GlfwGetCurrentContext,
    window: Option<WindowFns>,
}

fn required<T>(address: usize, name: &'static str) -> Result<T> {
    debug_assert_eq!(std::mem::size_of::<T>(), std::mem::size_of::<usize>());
    if address == 0 {
        return Err(CaptureError::InvalidGlfwApi(name));
    }
    Ok(unsafe { std::mem::transmute_copy::<usize, T>(&address) })
}

impl GlfwApi {
    /// ### English
    /// Validates and converts the embedder table.
    ///
    /// Context-control symbols are required. Window-creation symbols are all-or-nothing; when
    /// absent, `create_shared_offscreen_window` is unavailable.
    ///
    /// # Safety
    /// Every non-zero address must be the matching GLFW function from one GLFW instance.
    ///
    /// ### 中文
    /// 校验并转换宿主函数表。
    ///
    /// 上下文控制符号为必需。window 创建符号要么全部提供、要么全部为 0；缺失时
    /// `create_shared_offscreen_window` 不可用。
    ///
    /// # Safety
    /// 每个非 0 地址都必须是同一 GLFW 实例中对应的 GLFW 函数。
    pub unsafe fn from_embedder(api: &EmbedderGlfwApi) -> Result<Self> {
        let get_proc_address = required(api.glfw_get_proc_address, "glfwGetProcAddress is NULL")?;
        let make_context_current = required(
            api.glfw_make_context_current,
            "glfwMakeContextCurrent is NULL",
        )?;
        let get_current_context =
            required(api.glfw_get_current_context, "glfwGetCurrentContext is NULL")?;

        let window_addresses = [
            api.glfw_default_window_hints,
            api.glfw_window_hint,
            api.glfw_get_window_attrib,
            api.glfw_create_window,
            api.glfw_destroy_window,
        ];
        let window = if window_addresses.iter().all(|&address| address == 0) {
            None
        } else {
            Some(WindowFns {
                default_window_hints: required(
                    api.glfw_default_window_hints,
                    "glfwDefaultWindowHints is NULL",
                )?,
                window_hint: required(api.glfw_window_hint, "glfwWindowHint is NULL")?,
                get_window_attrib: required(
                    api.glfw_get_window_attrib,
                    "glfwGetWindowAttrib is NULL",
                )?,
                create_window: required(api.glfw_create_window, "glfwCreateWindow is NULL")?,
                destroy_window: required(api.glfw_destroy_window, "glfwDestroyWindow is NULL")?,
            })
        };

        Ok(Self {
            get_proc_address,
            make_context_current,
            get_current_context,
            window,
        })
    }

    /// ### English
    /// Makes `window` current on the calling thread (NULL releases the current context).
    ///
    /// ### 中文
    /// 将 `window` 设为调用线程的 current 上下文（NULL 表示释放）。
    #[inline]
    pub unsafe fn make_current(&self, window: GlfwWindowPtr) {
        unsafe { (self.make_context_current)(window) };
    }

    #[inline]
    pub unsafe fn current_context(&self) -> GlfwWindowPtr {
        unsafe { (self.get_current_context)() }
    }

    /// ### English
    /// Loads an OpenGL function pointer via GLFW for the calling thread's current context.
    ///
    /// ### 中文
    /// 通过 GLFW 为调用线程当前上下文加载 OpenGL 函数指针。
    #[inline]
    pub unsafe fn get_proc_address(&self, name: &CStr) -> *const c_void {
        unsafe { (self.get_proc_address)(name.as_ptr()) }
    }

    pub fn can_create_windows(&self) -> bool {
        self.window.is_some()
    }

    pub unsafe fn destroy_window(&self, window: GlfwWindowPtr) {
        if let Some(fns) = self.window {
            unsafe { (fns.destroy_window)(window) };
        }
    }

    /// ### English
    /// Creates an invisible, single-buffered offscreen window whose GL context shares objects
    /// with `share` and mirrors its client API, version and profile.
    ///
    /// Must be called on the thread GLFW requires for window creation (the main thread).
    ///
    /// ### 中文
    /// 创建一个不可见、单缓冲的离屏 window，其 GL 上下文与 `share` 共享对象，
    /// 并沿用其 client API、版本与 profile。
    ///
    /// 必须在 GLFW 要求的 window 创建线程（主线程）调用。
    pub unsafe fn create_shared_offscreen_window(&self, share: GlfwWindowPtr) -> Result<GlfwWindowPtr> {
        const GLFW_FALSE: c_int = 0;

        const GLFW_VISIBLE: c_int = 0x0002_0004;
        const GLFW_FOCUSED: c_int = 0x0002_0001;
        const GLFW_RESIZABLE: c_int = 0x0002_0003;
        const GLFW_DOUBLEBUFFER: c_int = 0x0002_1010;

        const GLFW_CLIENT_API: c_int = 0x0002_2001;
        const GLFW_CONTEXT_VERSION_MAJOR: c_int = 0x0002_2002;
        const GLFW_CONTEXT_VERSION_MINOR: c_int = 0x0002_2003;
        const GLFW_OPENGL_FORWARD_COMPAT: c_int = 0x0002_2006;
        const GLFW_OPENGL_PROFILE: c_int = 0x0002_2008;
        const GLFW_CONTEXT_CREATION_API: c_int = 0x0002_200B;

        let Some(fns) = self.window else {
            return Err(CaptureError::InvalidGlfwApi(
                "window creation symbols were not provided",
            ));
        };
        if share.is_null() {
            return Err(CaptureError::InvalidGlfwApi("display window is NULL"));
        }

        let attrib = |name| unsafe { (fns.get_window_attrib)(share, name) };
        let client_api = attrib(GLFW_CLIENT_API);
        let major = attrib(GLFW_CONTEXT_VERSION_MAJOR);
        let minor = attrib(GLFW_CONTEXT_VERSION_MINOR);
        let profile = attrib(GLFW_OPENGL_PROFILE);
        let forward_compat = attrib(GLFW_OPENGL_FORWARD_COMPAT);
        let creation_api = attrib(GLFW_CONTEXT_CREATION_API);

        unsafe {
            (fns.default_window_hints)();
            (fns.window_hint)(GLFW_VISIBLE, GLFW_FALSE);
            (fns.window_hint)(GLFW_FOCUSED, GLFW_FALSE);
            (fns.window_hint)(GLFW_RESIZABLE, GLFW_FALSE);
            (fns.window_hint)(GLFW_DOUBLEBUFFER, GLFW_FALSE);
            if client_api != 0 {
                (fns.window_hint)(GLFW_CLIENT_API, client_api);
            }
            if major > 0 {
                (fns.window_hint)(GLFW_CONTEXT_VERSION_MAJOR, major);
            }
            if minor > 0 {
                (fns.window_hint)(GLFW_CONTEXT_VERSION_MINOR, minor);
            }
            if profile != 0 {
                (fns.window_hint)(GLFW_OPENGL_PROFILE, profile);
            }
            (fns.window_hint)(GLFW_OPENGL_FORWARD_COMPAT, forward_compat);
            if creation_api != 0 {
                (fns.window_hint)(GLFW_CONTEXT_CREATION_API, creation_api);
            }
        }

        let title = c"vlc_gl_capture-decoder";
        let window =
            unsafe { (fns.create_window)(4, 4, title.as_ptr(), std::ptr::null_mut(), share) };
        unsafe { (fns.default_window_hints)() };

        if window.is_null() {
            return Err(CaptureError::InvalidGlfwApi(
                "glfwCreateWindow failed for the shared decoder context",
            ));
        }
        Ok(window)
    }
}
