//! Per-frame renderer statistics.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatType {
    DrawCalls,
    DrawTris,
    DrawPointSprites,
    DrawInstances,
    BuffersCreated,
    TexturesCreated,
    MaterialsCreated,
}

impl StatType {
    pub const COUNT: usize = 7;

    fn slot(self) -> usize {
        self as usize
    }
}

/// Counters for the frame in progress and the last completed frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    current: [u64; StatType::COUNT],
    previous: [u64; StatType::COUNT],
    frames: u64,
}

impl Stats {
    pub fn add(&mut self, stat: StatType, count: u64) {
        self.current[stat.slot()] += count;
    }

    /// Close the current frame.
    pub fn next_frame(&mut self) {
        self.previous = std::mem::take(&mut self.current);
        self.frames += 1;
    }

    pub fn current(&self, stat: StatType) -> u64 {
        self.current[stat.slot()]
    }

    pub fn previous(&self, stat: StatType) -> u64 {
        self.previous[stat.slot()]
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_frame_rolls_counters() {
        let mut stats = Stats::default();
        stats.add(StatType::DrawCalls, 3);
        stats.add(StatType::DrawTris, 12);
        stats.next_frame();
        assert_eq!(stats.previous(StatType::DrawCalls), 3);
        assert_eq!(stats.previous(StatType::DrawTris), 12);
        assert_eq!(stats.current(StatType::DrawCalls), 0);
        assert_eq!(stats.frames(), 1);
    }
}
