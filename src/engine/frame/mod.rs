//! ### English
//! Lock-protected triple-buffer rotation shared between the decoder callback thread (producer)
//! and the display thread (consumer).
//!
//! ### 中文
//! 解码回调线程（生产者）与显示线程（消费者）共享的加锁三缓冲轮换。

mod roles;
mod rotate;

use parking_lot::Mutex;

use crate::engine::surface::Surface;

pub use roles::RoleAssignment;

/// ### English
/// Fixed triple-buffer slot count.
///
/// ### 中文
/// 固定三缓冲槽位数量。
pub const TRIPLE_BUFFER_COUNT: usize = 3;

/// ### English
/// Fence handles indexed by surface slot (0 = no fence).
///
/// ### 中文
/// 按 surface 槽位索引的 fence 句柄（0 = 无 fence）。
pub type SlotFences = [u64; TRIPLE_BUFFER_COUNT];

/// ### English
/// Result of one display-side acquisition.
///
/// ### 中文
/// 一次显示侧获取的结果。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AcquiredFrame {
    /// ### English
    /// Surface now in the `present` role.
    ///
    /// ### 中文
    /// 当前处于 `present` 角色的 surface。
    pub surface: Surface,
    /// ### English
    /// Sequence number of the frame stored in `surface`; 0 if it was never written since the
    /// surfaces were installed.
    ///
    /// ### 中文
    /// `surface` 中帧的序号；自 surface 安装以来从未写入则为 0。
    pub sequence: u64,
    /// ### English
    /// Producer fence (`GLsync` cast to `u64`) to wait on before sampling, or 0.
    /// Ownership moves to the caller, which must delete it.
    ///
    /// ### 中文
    /// 采样前需要等待的生产者 fence（`GLsync` 转为 `u64`），无则为 0。
    /// 所有权转移给调用方，由调用方负责删除。
    pub producer_fence: u64,
    /// ### English
    /// Whether this call rotated a newly completed frame into `present`.
    ///
    /// ### 中文
    /// 本次调用是否把新完成的帧轮换到了 `present`。
    pub is_new: bool,
    /// ### English
    /// Generation of the surface batch `surface` belongs to.
    ///
    /// ### 中文
    /// `surface` 所属 surface 批次的代号。
    pub generation: u64,
}

impl AcquiredFrame {
    /// ### English
    /// The surface has not received a decoded frame yet.
    ///
    /// ### 中文
    /// 该 surface 尚未写入任何解码帧。
    pub fn is_empty(&self) -> bool {
        self.sequence == 0
    }
}

/// ### English
/// What `install`/`clear` took away from the decoder: the generation of the withdrawn batch and
/// every fence still attached to it. The decoder deletes the fences (waiting on the consumer ones
/// first) and keeps the batch's GL objects alive until `is_released(generation)`.
///
/// ### 中文
/// `install`/`clear` 撤回的内容：被撤回批次的代号以及仍挂在其上的所有 fence。
/// 解码侧删除这些 fence（consumer fence 需先等待），并在 `is_released(generation)` 之前保持该批次的 GL 对象存活。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Withdrawn {
    pub generation: u64,
    pub producer_fences: SlotFences,
    pub consumer_fences: SlotFences,
}

/// ### English
/// Fences `on_frame_ready` hands back to the decoder.
///
/// ### 中文
/// `on_frame_ready` 交还给解码侧的 fence。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Recycled {
    /// ### English
    /// Producer fence of a completed frame that was overtaken before being presented. Delete it.
    ///
    /// ### 中文
    /// 尚未呈现就被覆盖的已完成帧的生产者 fence。需删除。
    pub dropped_fence: u64,
    /// ### English
    /// Consumer fence the display left on the new `render` surface. Wait on it before writing,
    /// then delete it.
    ///
    /// ### 中文
    /// 显示侧留在新 `render` surface 上的 consumer fence。写入前需等待，之后删除。
    pub consumer_fence: u64,
}

struct SlotTable {
    roles: RoleAssignment,
    pending: bool,
    surfaces: Option<[Surface; TRIPLE_BUFFER_COUNT]>,
    sequences: [u64; TRIPLE_BUFFER_COUNT],
    fences: SlotFences,
    consumer_fences: SlotFences,
    next_sequence: u64,
    generation: u64,
    display_generation: u64,
    display_attached: bool,
}

impl SlotTable {
    fn reset(&mut self, surfaces: Option<[Surface; TRIPLE_BUFFER_COUNT]>) -> Withdrawn {
        let withdrawn = Withdrawn {
            generation: self.generation,
            producer_fences: std::mem::take(&mut self.fences),
            consumer_fences: std::mem::take(&mut self.consumer_fences),
        };
        self.generation += 1;
        self.roles = RoleAssignment::default();
        self.pending = false;
        self.surfaces = surfaces;
        self.sequences = [0; TRIPLE_BUFFER_COUNT];
        withdrawn
    }
}

/// ### English
/// Triple-buffer role rotator.
///
/// `render`/`swap`/`present` roles plus the pending flag live behind one mutex that is held only
/// for O(1) index swaps. The decoder never waits for the display to consume a frame, and the
/// display never samples a surface the decoder may write. Frames completed faster than the display
/// polls are coalesced: only the newest is presented.
///
/// The rotator holds a published snapshot of the batch `SurfaceSet` owns; roles index into it.
/// Every `install`/`clear` starts a new batch generation. A withdrawn batch stays alive until the
/// display has acquired under a newer generation (or detached), since it may still be drawing it.
///
/// Thread affinity: `install`, `clear`, `begin_render_target` and `on_frame_ready` must be called
/// on the decoder's GL context thread; `acquire_latest`, `release` and `release_idle` on the
/// display thread.
///
/// ### 中文
/// 三缓冲角色轮换器。
///
/// `render`/`swap`/`present` 角色与 pending 标记由同一个互斥锁保护，持锁期间只做 O(1) 的索引交换。
/// 解码器从不等待显示侧消费，显示侧也从不采样解码器可能写入的 surface。
/// 若解码速度快于显示轮询，中间帧会被合并：只呈现最新帧。
///
/// 轮换器持有 `SurfaceSet` 所拥有批次的已发布快照；角色即为其索引。
/// 每次 `install`/`clear` 都开始新的批次代号。被撤回的批次在显示侧以更新的代号获取（或解除关联）之前保持存活，
/// 因为显示侧可能仍在绘制它。
///
/// 线程约束：`install`、`clear`、`begin_render_target`、`on_frame_ready` 只能在解码器 GL 上下文线程调用；
/// `acquire_latest`、`release`、`release_idle` 只能在显示线程调用。
pub struct FrameSlotRotator {
    state: Mutex<SlotTable>,
}

impl Default for FrameSlotRotator {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSlotRotator {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotTable {
                roles: RoleAssignment::default(),
                pending: false,
                surfaces: None,
                sequences: [0; TRIPLE_BUFFER_COUNT],
                fences: [0; TRIPLE_BUFFER_COUNT],
                consumer_fences: [0; TRIPLE_BUFFER_COUNT],
                next_sequence: 0,
                generation: 1,
                display_generation: 0,
                display_attached: false,
            }),
        }
    }

    /// ### English
    /// Publishes a freshly configured surface batch and resets roles to
    /// `{render: 0, swap: 1, present: 2}` with no pending frame.
    ///
    /// Returns what was withdrawn from the previous batch.
    ///
    /// ### 中文
    /// 发布新配置的 surface 批次，并把角色重置为 `{render: 0, swap: 1, present: 2}`、无 pending 帧。
    ///
    /// 返回从旧批次撤回的内容。
    pub fn install(&self, surfaces: [Surface; TRIPLE_BUFFER_COUNT]) -> Withdrawn {
        self.state.lock().reset(Some(surfaces))
    }

    /// ### English
    /// Withdraws the surfaces (display falls back to "no frame").
    ///
    /// ### 中文
    /// 撤回 surface（显示侧回退为“无帧”）。
    pub fn clear(&self) -> Withdrawn {
        self.state.lock().reset(None)
    }

    pub fn is_installed(&self) -> bool {
        self.state.lock().surfaces.is_some()
    }

    /// ### English
    /// Generation of the currently published batch.
    ///
    /// ### 中文
    /// 当前已发布批次的代号。
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// ### English
    /// Whether the display can no longer touch surfaces of batch `generation`.
    ///
    /// ### 中文
    /// 显示侧是否已不可能再使用 `generation` 批次的 surface。
    pub fn is_released(&self, generation: u64) -> bool {
        let state = self.state.lock();
        !state.display_attached || state.display_generation > generation
    }

    /// ### English
    /// Registers the display. From now on withdrawn batches wait for its acknowledgement.
    ///
    /// ### 中文
    /// 注册显示侧。此后被撤回的批次需等待其确认。
    pub fn attach_display(&self) {
        let mut state = self.state.lock();
        state.display_attached = true;
        state.display_generation = state.generation;
    }

    pub fn is_display_attached(&self) -> bool {
        self.state.lock().display_attached
    }

    /// ### English
    /// Unregisters the display; every withdrawn batch counts as released.
    ///
    /// ### 中文
    /// 注销显示侧；所有被撤回的批次都视为已释放。
    pub fn detach_display(&self) {
        self.state.lock().display_attached = false;
    }

    /// ### English
    /// Returns the surface in the `render` role, i.e. the decoder's current draw target.
    ///
    /// ### 中文
    /// 返回处于 `render` 角色的 surface，即解码器当前的绘制目标。
    pub fn begin_render_target(&self) -> Option<Surface> {
        let state = self.state.lock();
        state
            .surfaces
            .as_ref()
            .map(|surfaces| surfaces[state.roles.render])
    }

    /// ### English
    /// Snapshot of the current role assignment.
    ///
    /// ### 中文
    /// 当前角色分配的快照。
    pub fn roles(&self) -> RoleAssignment {
        self.state.lock().roles
    }

    pub fn has_pending_frame(&self) -> bool {
        self.state.lock().pending
    }
}

#[cfg(test)]
mod tests;
