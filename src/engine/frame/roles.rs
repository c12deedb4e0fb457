//! ### English
//! Mapping of the three logical roles onto surface indices.
//!
//! ### 中文
//! 三个逻辑角色到 surface 索引的映射。

use super::TRIPLE_BUFFER_COUNT;

/// ### English
/// Which surface index currently plays each role.
///
/// - `render`: being written by the decoder.
/// - `swap`: most recently completed frame, not yet taken by the display.
/// - `present`: currently sampled by the display.
///
/// The three indices are always a permutation of `{0, 1, 2}`.
///
/// ### 中文
/// 每个角色当前对应的 surface 索引。
///
/// - `render`：解码器正在写入。
/// - `swap`：最近完成、尚未被显示侧取走的帧。
/// - `present`：显示侧正在采样。
///
/// 三个索引始终是 `{0, 1, 2}` 的一个排列。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoleAssignment {
    pub render: usize,
    pub swap: usize,
    pub present: usize,
}

impl Default for RoleAssignment {
    fn default() -> Self {
        Self {
            render: 0,
            swap: 1,
            present: 2,
        }
    }
}

impl RoleAssignment {
    pub fn is_permutation(&self) -> bool {
        let mut seen = [false; TRIPLE_BUFFER_COUNT];
        for index in [self.render, self.swap, self.present] {
            if index >= TRIPLE_BUFFER_COUNT || seen[index] {
                return false;
            }
            seen[index] = true;
        }
        true
    }

    /// ### English
    /// Decoder side: the written surface becomes `swap`, the old `swap` becomes `render`.
    ///
    /// ### 中文
    /// 解码侧：刚写完的 surface 变为 `swap`，旧 `swap` 变为 `render`。
    #[inline]
    pub(super) fn rotate_completed(&mut self) {
        std::mem::swap(&mut self.render, &mut self.swap);
    }

    /// ### English
    /// Display side: the latest completed surface becomes `present`.
    ///
    /// ### 中文
    /// 显示侧：最近完成的 surface 变为 `present`。
    #[inline]
    pub(super) fn rotate_presented(&mut self) {
        std::mem::swap(&mut self.present, &mut self.swap);
    }
}
