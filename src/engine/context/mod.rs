//! ### English
//! Decoder-side GPU context control.
//!
//! The decoder owns a dedicated GL context that shares objects with the display context. The
//! bridge makes it current/non-current on the decoder's callback thread and resolves GL entry
//! points for it.
//!
//! ### 中文
//! 解码侧 GPU 上下文控制。
//!
//! 解码器持有一个与显示上下文共享对象的独立 GL 上下文。桥接器在解码回调线程上使其 current/非 current，
//! 并为其解析 GL 函数入口。

use std::ffi::{CStr, c_void};

use crate::engine::error::{CaptureError, Result};

/// ### English
/// Platform operations on the decoder's GL context.
///
/// ### 中文
/// 解码器 GL 上下文的平台操作。
pub trait GpuContext {
    /// ### English
    /// Makes the decoder context current on the calling thread (`enter`) or releases it.
    ///
    /// ### 中文
    /// 在调用线程上使解码器上下文 current（`enter`），或释放它。
    fn make_current(&self, enter: bool);

    /// ### English
    /// Whether the thread's current context is the expected one: the decoder context after
    /// entering, no context after leaving.
    ///
    /// ### 中文
    /// 调用线程当前上下文是否符合预期：进入后应为解码器上下文，离开后应无上下文。
    fn is_expected_current(&self, enter: bool) -> bool;

    fn proc_address(&self, name: &CStr) -> *const c_void;
}

/// ### English
/// Activates the decoder context on request of the decoder runtime.
///
/// `on_context_activate` takes `&mut self`: the decoder runtime serializes these calls, and the
/// borrow makes concurrent activation impossible.
///
/// ### 中文
/// 按解码器运行时的请求激活解码器上下文。
///
/// `on_context_activate` 以 `&mut self` 调用：解码器运行时保证这些调用串行，借用规则也杜绝了并发激活。
pub struct DecoderContextBridge<C: GpuContext> {
    context: C,
    /// ### English
    /// Whether the last successful activation entered the context.
    ///
    /// ### 中文
    /// 上一次成功的激活是否进入了上下文。
    current: bool,
}

impl<C: GpuContext> DecoderContextBridge<C> {
    pub fn new(context: C) -> Self {
        Self {
            context,
            current: false,
        }
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn is_current(&self) -> bool {
        self.current
    }

    /// ### English
    /// Makes the decoder context current (`true`) or relinquishes it (`false`), then confirms the
    /// platform reports the expected state. Idempotent.
    ///
    /// Must be called on the decoder's callback thread.
    ///
    /// ### 中文
    /// 使解码器上下文 current（`true`）或释放（`false`），并确认平台报告的状态符合预期。幂等。
    ///
    /// 必须在解码器回调线程调用。
    pub fn on_context_activate(&mut self, make_current: bool) -> Result<()> {
        self.context.make_current(make_current);
        if !self.context.is_expected_current(make_current) {
            tracing::error!(enter = make_current, "decoder GL context switch not confirmed");
            // A failed release may leave the context current.
            if make_current {
                self.current = false;
            }
            return Err(CaptureError::ContextSwitchFailed {
                enter: make_current,
            });
        }

        self.current = make_current;
        Ok(())
    }

    /// ### English
    /// Resolves a GL entry point for the decoder context. NULL means unavailable.
    ///
    /// ### 中文
    /// 为解码器上下文解析 GL 函数入口。NULL 表示不可用。
    pub fn resolve_proc_address(&self, name: &CStr) -> *const c_void {
        self.context.proc_address(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::ScriptedContext;

    #[test]
    fn activation_is_idempotent() {
        let context = ScriptedContext::default();
        let mut bridge = DecoderContextBridge::new(context.clone());

        bridge.on_context_activate(true).unwrap();
        bridge.on_context_activate(true).unwrap();
        assert!(bridge.is_current());
        assert!(context.is_current());

        bridge.on_context_activate(false).unwrap();
        bridge.on_context_activate(false).unwrap();
        assert!(!bridge.is_current());
        assert!(!context.is_current());
    }

    #[test]
    fn unconfirmed_switch_fails() {
        let context = ScriptedContext::default();
        context.refuse_switches(true);
        let mut bridge = DecoderContextBridge::new(context);

        assert_eq!(
            bridge.on_context_activate(true),
            Err(CaptureError::ContextSwitchFailed { enter: true })
        );
        assert!(!bridge.is_current());
    }

    #[test]
    fn failed_release_keeps_the_context_marked_current() {
        let context = ScriptedContext::default();
        let mut bridge = DecoderContextBridge::new(context.clone());
        bridge.on_context_activate(true).unwrap();

        context.refuse_switches(true);
        assert_eq!(
            bridge.on_context_activate(false),
            Err(CaptureError::ContextSwitchFailed { enter: false })
        );

        assert!(context.is_current());
        assert!(bridge.is_current());
    }

    #[test]
    fn resolves_through_the_platform() {
        let context = ScriptedContext::default();
        let bridge = DecoderContextBridge::new(context);

        assert!(!bridge.resolve_proc_address(c"glGenTextures").is_null());
        assert!(bridge.resolve_proc_address(c"glMissingExtension").is_null());
    }
}
