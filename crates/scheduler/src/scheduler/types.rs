use serde::Serialize;

/// Position of one lane within a launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LaneCtx {
    /// Group this lane belongs to.
    pub group: usize,
    /// Index within the group; also the lane of the output tile it writes.
    pub lane: usize,
    /// Lanes per group.
    pub tile_size: usize,
}

impl LaneCtx {
    /// Split a pool-wide lane index into (group, lane).
    pub fn from_global(index: usize, group_size: usize) -> Self {
        Self {
            group: index / group_size,
            lane: index % group_size,
            tile_size: group_size,
        }
    }

    /// Lane 0 claims tasks on behalf of its group.
    pub fn is_designated(&self) -> bool {
        self.lane == 0
    }
}
