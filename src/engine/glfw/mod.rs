//! ### English
//! GLFW integration driven by an embedder-provided function table.
//!
//! The crate never links GLFW itself: the host application (which already owns the GLFW
//! instance and the display window) passes the symbol addresses it uses.
//!
//! ### 中文
//! 基于宿主提供的函数表的 GLFW 集成。
//!
//! 本 crate 不直接链接 GLFW：宿主应用（已持有 GLFW 实例与显示 window）传入它所使用的符号地址。

mod api;
mod context;

pub use api::{GlfwApi, GlfwWindowPtr};
pub use context::GlfwContext;

#[repr(C)]
#[derive(Clone, Copy, Default)]
/// ### English
/// Function pointer table for GLFW symbols provided by the embedder.
///
/// All fields are raw addresses (`usize`). The first three are required; the window-creation
/// group is optional but must be provided in full when the decoder context should be created
/// by this crate.
///
/// ### 中文
/// 由宿主提供的 GLFW 符号函数指针表。
///
/// 所有字段都是原始地址（`usize`）。前三个为必需；window 创建相关的一组为可选，
/// 但若需要由本 crate 创建解码器上下文，则必须全部提供。
pub struct EmbedderGlfwApi {
    pub glfw_get_proc_address: usize,
    pub glfw_make_context_current: usize,
    pub glfw_get_current_context: usize,
    pub glfw_default_window_hints: usize,
    pub glfw_window_hint: usize,
    pub glfw_get_window_attrib: usize,
    pub glfw_create_window: usize,
    pub glfw_destroy_window: usize,
}
