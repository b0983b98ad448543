use std::fmt;

/// One of the eight meaningful op-codes. Every other byte is noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    MoveForward,
    MoveBackward,
    Increment,
    Decrement,
    Output,
    Input,
    LoopEnter,
    LoopExit,
}

impl Op {
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            b'>' => Op::MoveForward,
            b'<' => Op::MoveBackward,
            b'+' => Op::Increment,
            b'-' => Op::Decrement,
            b'.' => Op::Output,
            b',' => Op::Input,
            b'[' => Op::LoopEnter,
            b']' => Op::LoopExit,
            _ => return None,
        })
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Op::MoveForward => b'>',
            Op::MoveBackward => b'<',
            Op::Increment => b'+',
            Op::Decrement => b'-',
            Op::Output => b'.',
            Op::Input => b',',
            Op::LoopEnter => b'[',
            Op::LoopExit => b']',
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_byte() as char)
    }
}

/// Keep only op-code characters.
pub fn ops_only(s: &str) -> String {
    s.bytes()
        .filter_map(Op::from_byte)
        .map(|op| op.as_byte() as char)
        .collect()
}
