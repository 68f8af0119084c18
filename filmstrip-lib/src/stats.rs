use std::fmt;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub bytes: usize,
    pub frames: usize,
    /// Number of change records emitted for each frame, in order.
    pub changes: Vec<usize>,
}

impl Stats {
    pub fn total_changes(&self) -> usize {
        self.changes.iter().sum()
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} frame(s), {} change(s), {} byte(s)",
            self.frames,
            self.total_changes(),
            self.bytes
        )
    }
}
