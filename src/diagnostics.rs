//! Positional error context and pre-flight loop checks.

use std::fmt;

use crate::accumulator::InstructionAccumulator;
use crate::error::InterpreterError;
use crate::loop_stack::LoopStack;
use crate::op::Op;

/// Raw bytes shown on each side of the failing instruction.
pub const CONTEXT_RADIUS: usize = 5;

pub const NO_OPENED_LOOP: &str = "no opened loop";
pub const EMPTY_LOOP_BODY: &str = "empty loop body";
pub const UNCLOSED_LOOP: &str = "unclosed loop";

/// A failure located in the program text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub reason: &'static str,
    /// Program cursor (accepted instructions so far) when the failure was detected.
    pub position: usize,
    /// Offset in the raw stream of the failing instruction.
    pub raw_offset: usize,
    /// Raw text around `raw_offset`.
    pub context: String,
    /// Char index of the failing instruction inside `context`.
    pub caret: usize,
}

impl Diagnostic {
    /// Build a diagnostic for the instruction that moved the cursor to `position`.
    pub fn at(accumulator: &InstructionAccumulator, position: usize, reason: &'static str) -> Self {
        let raw = accumulator.raw();
        let raw_offset = accumulator
            .raw_offset(position.saturating_sub(1))
            .unwrap_or_else(|| raw.len().saturating_sub(1));

        let start = raw_offset.saturating_sub(CONTEXT_RADIUS);
        let end = (raw_offset + CONTEXT_RADIUS + 1).min(raw.len());
        let start = start.min(end);

        let context = String::from_utf8_lossy(&raw[start..end]).into_owned();
        let caret = String::from_utf8_lossy(&raw[start..raw_offset.clamp(start, end)])
            .chars()
            .count();

        Self {
            reason,
            position,
            raw_offset,
            context,
            caret,
        }
    }

    /// Build a diagnostic at the accumulator's current cursor.
    pub fn here(accumulator: &InstructionAccumulator, reason: &'static str) -> Self {
        Self::at(accumulator, accumulator.cursor(), reason)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at instruction {} (near `{}`)",
            self.reason,
            self.position,
            self.context.escape_debug()
        )
    }
}

/// Whether any loop-enter is still waiting for its loop-exit.
pub fn has_open_loop(loops: &LoopStack) -> bool {
    !loops.is_empty()
}

/// Whether a captured loop (enter through exit, op-codes only) has nothing
/// between its brackets.
pub fn is_empty_loop_body(loop_ops: &[u8]) -> bool {
    loop_ops == b"[]"
}

pub fn no_opened_loop_check(
    accumulator: &InstructionAccumulator,
    loops: &LoopStack,
) -> Result<(), InterpreterError> {
    if has_open_loop(loops) {
        return Ok(());
    }
    Err(InterpreterError::UnbalancedLoop(Diagnostic::here(
        accumulator,
        NO_OPENED_LOOP,
    )))
}

pub fn empty_loop_check(
    loop_ops: &[u8],
    accumulator: &InstructionAccumulator,
) -> Result<(), InterpreterError> {
    if !is_empty_loop_body(loop_ops) {
        return Ok(());
    }
    Err(InterpreterError::EmptyLoopBody(Diagnostic::here(
        accumulator,
        EMPTY_LOOP_BODY,
    )))
}

/// Check a whole program without executing it.
///
/// Returns the first problem in stream order: a loop-exit with nothing open,
/// an empty loop body, or (once the text is exhausted) a loop-enter that was
/// never closed.
pub fn validate(program: &[u8]) -> Result<(), InterpreterError> {
    let mut accumulator = InstructionAccumulator::new();
    let mut loops = LoopStack::new();

    for &byte in program {
        match accumulator.accept(byte) {
            Some(Op::LoopEnter) => loops.push(accumulator.cursor() - 1),
            Some(Op::LoopExit) => {
                no_opened_loop_check(&accumulator, &loops)?;
                let start = loops.pop().map_err(|_| {
                    InterpreterError::UnbalancedLoop(Diagnostic::here(&accumulator, NO_OPENED_LOOP))
                })?;
                let end = accumulator.cursor();
                empty_loop_check(&accumulator.instructions()[start..end], &accumulator)?;
            }
            _ => {}
        }
    }

    if let Some(open) = loops.peek() {
        return Err(InterpreterError::UnclosedLoop(Diagnostic::at(
            &accumulator,
            open + 1,
            UNCLOSED_LOOP,
        )));
    }
    Ok(())
}
