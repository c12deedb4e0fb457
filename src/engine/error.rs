//! ### English
//! Error type shared by the capture engine.
//!
//! ### 中文
//! 捕获引擎共用的错误类型。

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// ### English
    /// A surface framebuffer failed the completeness check after its texture was attached.
    /// Fatal to the current decode session.
    ///
    /// ### 中文
    /// 绑定纹理后 surface 的 framebuffer 未通过完整性检查。对当前解码会话是致命错误。
    #[error("framebuffer of surface {index} is incomplete (status 0x{status:04X})")]
    IncompleteTarget { index: usize, status: u32 },

    /// ### English
    /// The platform did not confirm the expected GPU context after a switch.
    ///
    /// ### 中文
    /// 切换后平台未确认期望的 GPU 上下文已 current。
    #[error("decoder GL context switch failed (enter = {enter})")]
    ContextSwitchFailed { enter: bool },

    /// ### English
    /// A surface index outside `0..3` (invariant violation).
    ///
    /// ### 中文
    /// surface 索引超出 `0..3`（违反不变量）。
    #[error("surface index {index} is out of range")]
    IndexOutOfRange { index: usize },

    /// ### English
    /// A surface lookup while no batch is allocated.
    ///
    /// ### 中文
    /// 未分配任何批次时查找 surface。
    #[error("no surfaces are allocated")]
    NotAllocated,

    #[error("decoder negotiated an empty frame size {width}x{height}")]
    EmptyFrameSize { width: u32, height: u32 },

    #[error("invalid embedder GLFW API: {0}")]
    InvalidGlfwApi(&'static str),

    #[error("display setup failed: {0}")]
    DisplaySetup(String),
}

pub type Result<T> = std::result::Result<T, CaptureError>;
