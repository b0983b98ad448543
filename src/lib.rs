//! A streaming Brainfuck interpreter that replays loop bodies.
//!
//! Program bytes are executed as they arrive: each op-code is recorded and
//! dispatched immediately, and a loop-exit with a non-zero cell replays the
//! recorded loop body through the same routine until the cell reaches zero.
//!
//! Features and behaviors:
//! - Circular tape (default 30,000 cells): moving past either end wraps around.
//! - Cells saturate at 0 and 255 by default; wrapping arithmetic is configurable.
//! - Any byte outside `><+-.,[]` is ignored for execution and kept for error context.
//! - `,` reads one byte from the input source; on exhaustion the cell is left unchanged.
//! - `.` writes a record `pointer: <ptr>, string_value: <n>, byte_value: <char>`.
//! - A loop-exit with no open loop is an error reported with surrounding context.
//!
//! Quick start:
//!
//! ```
//! use replay_bf::{Config, Interpreter};
//!
//! let mut bf = Interpreter::new(&Config::default(), std::io::empty(), Vec::new()).unwrap();
//! bf.run_str("+++>++<[->+<] move cell 0 into cell 1").unwrap();
//! assert_eq!(&bf.tape().cells()[..2], &[0, 5]);
//! ```

pub mod accumulator;
pub mod cli_util;
pub mod commands;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod interpreter;
pub mod io;
pub mod loop_stack;
pub mod op;
pub mod repl;
pub mod tape;
mod theme;

pub use accumulator::InstructionAccumulator;
pub use config::{Config, ConfigError};
pub use diagnostics::{Diagnostic, validate};
pub use error::InterpreterError;
pub use interpreter::{Interpreter, StdioInterpreter};
pub use io::{ByteSource, SkipNewlines};
pub use loop_stack::{LoopStack, StackUnderflow};
pub use op::{Op, ops_only};
pub use tape::{CellArithmetic, DEFAULT_TAPE_SIZE, Tape};
