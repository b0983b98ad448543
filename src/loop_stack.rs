/// Popped a loop start while no loop was open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("loop stack underflow: no open loop to close")]
pub struct StackUnderflow;

/// Program-cursor positions of the loop-enter op-codes that are currently open.
///
/// Its depth always equals the bracket nesting depth of the instruction being
/// executed.
#[derive(Debug, Default, Clone)]
pub struct LoopStack {
    starts: Vec<usize>,
}

impl LoopStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, position: usize) {
        self.starts.push(position);
    }

    pub fn pop(&mut self) -> Result<usize, StackUnderflow> {
        self.starts.pop().ok_or(StackUnderflow)
    }

    pub fn peek(&self) -> Option<usize> {
        self.starts.last().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.starts.len()
    }

    /// Drop every entry above `depth`.
    pub fn truncate(&mut self, depth: usize) {
        self.starts.truncate(depth);
    }
}
