//! ### English
//! In-memory stand-ins for the GPU seams, used by unit tests.
//!
//! ### 中文
//! GPU 接口的内存替身，供单元测试使用。

use std::ffi::{CStr, c_void};
use std::sync::Arc;

use dpi::PhysicalSize;
use gleam::gl;
use parking_lot::Mutex;

use crate::engine::context::GpuContext;
use crate::engine::display::FramePresenter;
use crate::engine::format::OutputFormat;
use crate::engine::frame::AcquiredFrame;
use crate::engine::surface::{RenderTarget, SurfaceDevice};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceCall {
    Create(RenderTarget),
    Clear(RenderTarget),
    Delete(RenderTarget),
    Bind(Option<RenderTarget>),
    InsertFence(u64),
    WaitFence(u64),
    DeleteFence(u64),
}

#[derive(Default)]
struct DeviceLog {
    next_name: u32,
    created: usize,
    fail_at: Option<(usize, u32)>,
    failing: Vec<(RenderTarget, u32)>,
    next_fence: u64,
    live_targets: Vec<RenderTarget>,
    live_fences: Vec<u64>,
    calls: Vec<DeviceCall>,
}

/// ### English
/// `SurfaceDevice` that hands out fake GL names and records every call.
///
/// ### 中文
/// 分配假 GL 名称并记录每次调用的 `SurfaceDevice`。
#[derive(Clone, Default)]
pub struct RecordingDevice {
    log: Arc<Mutex<DeviceLog>>,
}

impl RecordingDevice {
    /// ### English
    /// The `nth` created target (1-based) reports `status` instead of complete.
    ///
    /// ### 中文
    /// 第 `nth` 个（从 1 开始）创建的目标报告 `status`，而不是完整。
    pub fn fail_status_for_creation(&self, nth: usize, status: u32) {
        self.log.lock().fail_at = Some((nth, status));
    }

    pub fn live_targets(&self) -> Vec<RenderTarget> {
        self.log.lock().live_targets.clone()
    }

    pub fn live_fences(&self) -> Vec<u64> {
        self.log.lock().live_fences.clone()
    }

    pub fn waited_fences(&self) -> Vec<u64> {
        self.log
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                DeviceCall::WaitFence(fence) => Some(*fence),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&DeviceCall) -> bool) -> usize {
        self.log.lock().calls.iter().filter(|call| predicate(call)).count()
    }

    pub fn last_bound(&self) -> Option<Option<RenderTarget>> {
        self.log.lock().calls.iter().rev().find_map(|call| match call {
            DeviceCall::Bind(target) => Some(*target),
            _ => None,
        })
    }
}

impl SurfaceDevice for RecordingDevice {
    fn create_target(&self, _size: PhysicalSize<u32>, _format: &OutputFormat) -> RenderTarget {
        let mut log = self.log.lock();
        log.created += 1;
        log.next_name += 2;
        let target = RenderTarget {
            texture: log.next_name - 1,
            framebuffer: log.next_name,
        };
        if let Some((nth, status)) = log.fail_at
            && nth == log.created
        {
            log.failing.push((target, status));
        }
        log.live_targets.push(target);
        log.calls.push(DeviceCall::Create(target));
        target
    }

    fn target_status(&self, target: &RenderTarget) -> u32 {
        self.log
            .lock()
            .failing
            .iter()
            .find(|(failing, _)| failing == target)
            .map_or(gl::FRAMEBUFFER_COMPLETE, |&(_, status)| status)
    }

    fn clear_target(&self, target: &RenderTarget) {
        self.log.lock().calls.push(DeviceCall::Clear(*target));
    }

    fn delete_target(&self, target: &RenderTarget) {
        let mut log = self.log.lock();
        log.live_targets.retain(|live| live != target);
        log.calls.push(DeviceCall::Delete(*target));
    }

    fn bind_draw_target(&self, target: Option<&RenderTarget>) {
        self.log.lock().calls.push(DeviceCall::Bind(target.copied()));
    }

    fn insert_fence(&self) -> u64 {
        let mut log = self.log.lock();
        log.next_fence += 1;
        let fence = 1000 + log.next_fence;
        log.live_fences.push(fence);
        log.calls.push(DeviceCall::InsertFence(fence));
        fence
    }

    fn delete_fence(&self, fence: u64) {
        let mut log = self.log.lock();
        log.live_fences.retain(|&live| live != fence);
        log.calls.push(DeviceCall::DeleteFence(fence));
    }

    fn wait_fence(&self, fence: u64) {
        self.log.lock().calls.push(DeviceCall::WaitFence(fence));
    }
}

const KNOWN_SYMBOLS: &[&[u8]] = &[b"glGenTextures", b"glBindFramebuffer", b"glFenceSync"];

#[derive(Default)]
struct ContextState {
    current: bool,
    refuse: bool,
    activations: Vec<bool>,
}

/// ### English
/// `GpuContext` whose switches can be refused on demand.
///
/// ### 中文
/// 可按需拒绝切换的 `GpuContext`。
#[derive(Clone, Default)]
pub struct ScriptedContext {
    state: Arc<Mutex<ContextState>>,
}

impl ScriptedContext {
    pub fn refuse_switches(&self, refuse: bool) {
        self.state.lock().refuse = refuse;
    }

    pub fn is_current(&self) -> bool {
        self.state.lock().current
    }

    pub fn activations(&self) -> Vec<bool> {
        self.state.lock().activations.clone()
    }

    pub fn clear_activations(&self) {
        self.state.lock().activations.clear();
    }
}

impl GpuContext for ScriptedContext {
    fn make_current(&self, enter: bool) {
        let mut state = self.state.lock();
        state.activations.push(enter);
        if !state.refuse {
            state.current = enter;
        }
    }

    fn is_expected_current(&self, enter: bool) -> bool {
        self.state.lock().current == enter
    }

    fn proc_address(&self, name: &CStr) -> *const c_void {
        if KNOWN_SYMBOLS.iter().any(|known| *known == name.to_bytes()) {
            0x1000 as *const c_void
        } else {
            std::ptr::null()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresentCall {
    Frame(AcquiredFrame),
    Placeholder,
}

#[derive(Default)]
struct PresenterLog {
    calls: Vec<PresentCall>,
    next_fence: u64,
    live_fences: Vec<u64>,
}

/// ### English
/// `FramePresenter` that records draws and returns a fresh consumer fence for each frame.
///
/// ### 中文
/// 记录绘制、并为每帧返回新 consumer fence 的 `FramePresenter`。
#[derive(Clone, Default)]
pub struct RecordingPresenter {
    log: Arc<Mutex<PresenterLog>>,
}

impl RecordingPresenter {
    pub fn calls(&self) -> Vec<PresentCall> {
        self.log.lock().calls.clone()
    }

    pub fn last(&self) -> Option<PresentCall> {
        self.log.lock().calls.last().copied()
    }

    /// ### English
    /// Consumer fences returned by `draw_frame` that the presenter has not deleted itself.
    ///
    /// ### 中文
    /// `draw_frame` 返回、且未被 presenter 自行删除的 consumer fence。
    pub fn live_fences(&self) -> Vec<u64> {
        self.log.lock().live_fences.clone()
    }
}

impl FramePresenter for RecordingPresenter {
    fn draw_frame(&mut self, frame: &AcquiredFrame) -> u64 {
        let mut log = self.log.lock();
        log.calls.push(PresentCall::Frame(*frame));
        log.next_fence += 1;
        let fence = 5000 + log.next_fence;
        log.live_fences.push(fence);
        fence
    }

    fn draw_placeholder(&mut self) {
        self.log.lock().calls.push(PresentCall::Placeholder);
    }

    fn delete_fence(&mut self, fence: u64) {
        self.log.lock().live_fences.retain(|&live| live != fence);
    }
}
