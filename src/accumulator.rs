use crate::op::Op;

/// Builds the cleaned instruction stream from raw program bytes.
///
/// Two containers are kept side by side: the op-codes that were accepted,
/// and every byte that was received (comments and whitespace included) for
/// diagnostics. The program cursor counts accepted op-codes; it can be
/// rewound to replay a loop body, and while it trails the end of the stream
/// nothing is appended, so replayed instructions are never recorded twice.
#[derive(Debug, Default, Clone)]
pub struct InstructionAccumulator {
    instructions: Vec<u8>,
    raw: Vec<u8>,
    // raw offset of each accepted instruction, parallel to `instructions`
    raw_offsets: Vec<usize>,
    cursor: usize,
}

impl InstructionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `byte`, recording it when the cursor sits at the end of the
    /// stream. Returns the op-code if the byte is one.
    pub fn accept(&mut self, byte: u8) -> Option<Op> {
        let op = Op::from_byte(byte);

        if self.at_edge() {
            self.raw.push(byte);
            if op.is_some() {
                self.instructions.push(byte);
                self.raw_offsets.push(self.raw.len() - 1);
            }
        }

        if op.is_some() {
            self.cursor += 1;
        }
        op
    }

    /// True when the cursor is past every recorded instruction, i.e. the next
    /// accepted byte is fresh input rather than a replay.
    pub fn at_edge(&self) -> bool {
        self.cursor == self.instructions.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the cursor back to `position` so the instructions after it can
    /// be replayed.
    pub fn rewind(&mut self, position: usize) {
        debug_assert!(position <= self.instructions.len());
        self.cursor = position.min(self.instructions.len());
    }

    pub fn instructions(&self) -> &[u8] {
        &self.instructions
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Offset in the raw stream of the instruction at `index`.
    pub fn raw_offset(&self, index: usize) -> Option<usize> {
        self.raw_offsets.get(index).copied()
    }
}
