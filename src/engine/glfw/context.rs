//! ### English
//! Decoder GL context backed by a GLFW window that shares objects with the display window.
//!
//! ### 中文
//! 由 GLFW window 承载的解码器 GL 上下文，与显示 window 共享对象。

use std::cell::Cell;
use std::ffi::{CStr, c_void};

use crate::engine::context::GpuContext;
use crate::engine::error::{CaptureError, Result};

use super::{GlfwApi, GlfwWindowPtr};

thread_local! {
    /// ### English
    /// Per-thread "current GLFW window" cache to avoid redundant `makeCurrent` calls.
    ///
    /// ### 中文
    /// 每线程缓存“当前 GLFW window”，避免重复 `makeCurrent` 调用。
    static CURRENT_GLFW_WINDOW: Cell<GlfwWindowPtr> =
        const { Cell::new(std::ptr::null_mut()) };
}

/// ### English
/// Decoder context: one GLFW window whose GL context is made current on the decoder thread.
///
/// The window is either supplied by the embedder (borrowed) or created here as an invisible
/// window sharing with the display window (owned, destroyed on drop). Creation and drop must
/// happen on the GLFW main thread.
///
/// ### 中文
/// 解码器上下文：一个 GLFW window，其 GL 上下文在解码线程上被设为 current。
///
/// window 由宿主提供（借用），或在此创建为与显示 window 共享的不可见 window（拥有，drop 时销毁）。
/// 创建与 drop 必须发生在 GLFW 主线程。
pub struct GlfwContext {
    glfw: GlfwApi,
    window: GlfwWindowPtr,
    owns_window: bool,
}

impl GlfwContext {
    /// ### English
    /// Uses an embedder-created window that already shares objects with the display window.
    ///
    /// ### 中文
    /// 使用宿主创建、且已与显示 window 共享对象的 window。
    pub fn borrowed(glfw: GlfwApi, window: GlfwWindowPtr) -> Result<Self> {
        if window.is_null() {
            return Err(CaptureError::InvalidGlfwApi("decoder window is NULL"));
        }
        Ok(Self {
            glfw,
            window,
            owns_window: false,
        })
    }

    /// ### English
    /// Creates an offscreen window sharing GL objects with `display_window`.
    ///
    /// # Safety
    /// `display_window` must be a live window of the GLFW instance behind `glfw`, and the call
    /// must happen on the GLFW main thread.
    ///
    /// ### 中文
    /// 创建与 `display_window` 共享 GL 对象的离屏 window。
    ///
    /// # Safety
    /// `display_window` 必须是 `glfw` 背后 GLFW 实例中的有效 window，且必须在 GLFW 主线程调用。
    pub unsafe fn create_shared(glfw: GlfwApi, display_window: GlfwWindowPtr) -> Result<Self> {
        let window = unsafe { glfw.create_shared_offscreen_window(display_window)? };
        tracing::debug!("created shared decoder GLFW window");
        Ok(Self {
            glfw,
            window,
            owns_window: true,
        })
    }

    pub fn window(&self) -> GlfwWindowPtr {
        self.window
    }

    /// ### English
    /// Makes `window` (or no context for NULL) current on the calling thread, keeping the
    /// per-thread cache in sync.
    ///
    /// # Safety
    /// `window` must be NULL or a live window of the same GLFW instance whose context is not
    /// current on another thread.
    ///
    /// ### 中文
    /// 在调用线程上使 `window` 的上下文 current（NULL 表示无上下文），并同步每线程缓存。
    ///
    /// # Safety
    /// `window` 必须为 NULL，或是同一 GLFW 实例中、其上下文未在其他线程 current 的有效 window。
    pub unsafe fn make_window_current(&self, window: GlfwWindowPtr) {
        CURRENT_GLFW_WINDOW.with(|current| {
            if current.get() == window {
                return;
            }

            unsafe {
                self.glfw.make_current(window);
            }
            current.set(window);
        });
    }
}

impl GpuContext for GlfwContext {
    fn make_current(&self, enter: bool) {
        let target = if enter {
            self.window
        } else {
            std::ptr::null_mut()
        };
        unsafe { self.make_window_current(target) };
    }

    fn is_expected_current(&self, enter: bool) -> bool {
        let actual = unsafe { self.glfw.current_context() };
        CURRENT_GLFW_WINDOW.with(|current| current.set(actual));
        if enter {
            actual == self.window
        } else {
            actual.is_null()
        }
    }

    fn proc_address(&self, name: &CStr) -> *const c_void {
        unsafe { self.glfw.get_proc_address(name) }
    }
}

impl Drop for GlfwContext {
    fn drop(&mut self) {
        if !self.owns_window {
            return;
        }

        unsafe {
            if self.glfw.current_context() == self.window {
                self.glfw.make_current(std::ptr::null_mut());
            }
            CURRENT_GLFW_WINDOW.with(|current| {
                if current.get() == self.window {
                    current.set(std::ptr::null_mut());
                }
            });
            self.glfw.destroy_window(self.window);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::c_char;

    use super::*;
    use crate::engine::glfw::EmbedderGlfwApi;

    thread_local! {
        static FAKE_CURRENT: Cell<usize> = const { Cell::new(0) };
        static FAKE_SWITCHES: Cell<usize> = const { Cell::new(0) };
    }

    unsafe extern "C" fn fake_get_proc_address(name: *const c_char) -> *const c_void {
        let name = unsafe { CStr::from_ptr(name) };
        if name.to_bytes().starts_with(b"gl") {
            0x1000 as *const c_void
        } else {
            std::ptr::null()
        }
    }

    unsafe extern "C" fn fake_make_context_current(window: GlfwWindowPtr) {
        FAKE_CURRENT.with(|current| current.set(window as usize));
        FAKE_SWITCHES.with(|switches| switches.set(switches.get() + 1));
    }

    unsafe extern "C" fn fake_get_current_context() -> GlfwWindowPtr {
        FAKE_CURRENT.with(|current| current.get()) as GlfwWindowPtr
    }

    fn fake_api() -> GlfwApi {
        let table = EmbedderGlfwApi {
            glfw_get_proc_address: fake_get_proc_address as usize,
            glfw_make_context_current: fake_make_context_current as usize,
            glfw_get_current_context: fake_get_current_context as usize,
            ..EmbedderGlfwApi::default()
        };
        unsafe { GlfwApi::from_embedder(&table) }.unwrap()
    }

    #[test]
    fn enter_and_leave_are_confirmed() {
        let window = 0x40 as GlfwWindowPtr;
        let context = GlfwContext::borrowed(fake_api(), window).unwrap();

        context.make_current(true);
        assert!(context.is_expected_current(true));
        context.make_current(false);
        assert!(context.is_expected_current(false));
    }

    #[test]
    fn repeated_enter_skips_redundant_switches() {
        let window = 0x80 as GlfwWindowPtr;
        let context = GlfwContext::borrowed(fake_api(), window).unwrap();
        let before = FAKE_SWITCHES.with(Cell::get);

        context.make_current(true);
        context.make_current(true);
        context.make_current(true);

        assert_eq!(FAKE_SWITCHES.with(Cell::get) - before, 1);
        context.make_current(false);
    }

    #[test]
    fn foreign_switch_is_detected() {
        let window = 0xC0 as GlfwWindowPtr;
        let context = GlfwContext::borrowed(fake_api(), window).unwrap();

        context.make_current(true);
        // Someone else on this thread grabbed another context.
        unsafe { fake_make_context_current(0x100 as GlfwWindowPtr) };
        assert!(!context.is_expected_current(true));

        // The cache was refreshed, so entering switches again.
        context.make_current(true);
        assert!(context.is_expected_current(true));
        context.make_current(false);
    }

    #[test]
    fn resolves_symbols_through_glfw() {
        let context = GlfwContext::borrowed(fake_api(), 0x40 as GlfwWindowPtr).unwrap();
        assert!(!context.proc_address(c"glBindTexture").is_null());
        assert!(context.proc_address(c"vkCreateInstance").is_null());
    }

    #[test]
    fn null_window_is_rejected() {
        assert!(matches!(
            GlfwContext::borrowed(fake_api(), std::ptr::null_mut()),
            Err(CaptureError::InvalidGlfwApi(_))
        ));
    }

    #[test]
    fn table_validation() {
        let missing = EmbedderGlfwApi {
            glfw_get_proc_address: fake_get_proc_address as usize,
            ..EmbedderGlfwApi::default()
        };
        assert!(unsafe { GlfwApi::from_embedder(&missing) }.is_err());

        let partial_window_group = EmbedderGlfwApi {
            glfw_get_proc_address: fake_get_proc_address as usize,
            glfw_make_context_current: fake_make_context_current as usize,
            glfw_get_current_context: fake_get_current_context as usize,
            glfw_create_window: 0x10,
            ..EmbedderGlfwApi::default()
        };
        assert!(unsafe { GlfwApi::from_embedder(&partial_window_group) }.is_err());

        let api = fake_api();
        assert!(!api.can_create_windows());
        assert!(unsafe { api.create_shared_offscreen_window(0x40 as GlfwWindowPtr) }.is_err());
    }
}
