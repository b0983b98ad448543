//! The execution engine.
//!
//! Program bytes are consumed one at a time. Each byte goes through the
//! [`InstructionAccumulator`] and, if it is an op-code, is dispatched against
//! the tape straight away; no pre-pass over the program is needed, so a
//! program can be streamed from any [`ByteSource`].
//!
//! Loops are executed by replay. When a loop-exit finds a non-zero cell, the
//! recorded op-codes between the matching loop-enter and the loop-exit are
//! fed through the same per-byte routine again, until the cell is zero.
//! Iterations repeat inside the loop-exit handler; only loops nested inside a
//! replayed body recurse, so call depth follows nesting depth.
//!
//! Because a loop's body is only known once it has streamed in, a loop-enter
//! never skips ahead: the body runs once and the condition is first checked at
//! the loop-exit.

use std::io::{self, IsTerminal, Read, Write};

use tracing::{debug, info, trace};

use crate::accumulator::InstructionAccumulator;
use crate::config::{Config, ConfigError};
use crate::diagnostics::{self, Diagnostic, NO_OPENED_LOOP, UNCLOSED_LOOP};
use crate::error::InterpreterError;
use crate::io::{ByteSource, SkipNewlines, write_cell_record};
use crate::loop_stack::LoopStack;
use crate::op::Op;
use crate::tape::Tape;

/// Interpreter wired to the process's stdin and stdout.
pub type StdioInterpreter = Interpreter<Box<dyn Read>, io::Stdout>;

/// A single program's execution state: tape, open loops, the recorded
/// instruction streams, and the injected input source and output sink.
pub struct Interpreter<I, O> {
    tape: Tape,
    loops: LoopStack,
    accumulator: InstructionAccumulator,
    input: I,
    output: O,
}

impl<I: ByteSource, O: Write> Interpreter<I, O> {
    /// Create an interpreter with a zeroed tape sized and configured by `config`.
    pub fn new(config: &Config, input: I, output: O) -> Result<Self, ConfigError> {
        let tape = Tape::new(config.tape_size, config.arithmetic)?;
        Ok(Self::with_tape(tape, input, output))
    }

    /// Create an interpreter around an existing tape.
    pub fn with_tape(tape: Tape, input: I, output: O) -> Self {
        Self {
            tape,
            loops: LoopStack::new(),
            accumulator: InstructionAccumulator::new(),
            input,
            output,
        }
    }

    /// Consume `program` until it is exhausted, executing each op-code as it
    /// arrives.
    ///
    /// Returns on the first fatal error; the tape is left as it was at that
    /// point. Loops still open when the program runs out are not an error
    /// here, see [`Interpreter::finish`].
    pub fn run<S: ByteSource>(&mut self, mut program: S) -> Result<(), InterpreterError> {
        loop {
            let next = program
                .next_byte()
                .map_err(|source| InterpreterError::InputReadFailure {
                    position: self.accumulator.cursor(),
                    source,
                })?;
            let Some(byte) = next else { break };
            self.feed(byte)?;
        }

        self.output
            .flush()
            .map_err(|source| InterpreterError::OutputWriteFailure {
                position: self.accumulator.cursor(),
                source,
            })?;

        info!(
            instructions = self.accumulator.instructions().len(),
            raw_bytes = self.accumulator.raw().len(),
            "program stream exhausted"
        );
        Ok(())
    }

    /// Run a complete program held in memory.
    pub fn run_str(&mut self, program: &str) -> Result<(), InterpreterError> {
        self.run(program.as_bytes())
    }

    /// Accept and execute a single program byte.
    pub fn feed(&mut self, byte: u8) -> Result<(), InterpreterError> {
        self.step(byte)
    }

    /// Report a loop-enter that is still waiting for its loop-exit.
    pub fn finish(&self) -> Result<(), InterpreterError> {
        match self.loops.peek() {
            Some(open) => Err(InterpreterError::UnclosedLoop(Diagnostic::at(
                &self.accumulator,
                open + 1,
                UNCLOSED_LOOP,
            ))),
            None => Ok(()),
        }
    }

    /// Forget the program and zero the tape. The input source and output
    /// sink are kept.
    pub fn reset(&mut self) {
        self.tape.reset();
        self.loops = LoopStack::new();
        self.accumulator = InstructionAccumulator::new();
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn loop_depth(&self) -> usize {
        self.loops.depth()
    }

    pub fn accumulator(&self) -> &InstructionAccumulator {
        &self.accumulator
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn into_output(self) -> O {
        self.output
    }

    fn step(&mut self, byte: u8) -> Result<(), InterpreterError> {
        let Some(op) = self.accumulator.accept(byte) else {
            return Ok(());
        };
        trace!(
            %op,
            ip = self.accumulator.cursor() - 1,
            ptr = self.tape.cursor(),
            cell = self.tape.current_value(),
            "dispatch"
        );

        match op {
            Op::MoveForward => self.tape.move_forward(),
            Op::MoveBackward => self.tape.move_backward(),
            Op::Increment => self.tape.increment(),
            Op::Decrement => self.tape.decrement(),
            Op::Output => self.output_cell()?,
            Op::Input => self.input_cell()?,
            Op::LoopEnter => self.loops.push(self.accumulator.cursor() - 1),
            Op::LoopExit => self.loop_exit()?,
        }
        Ok(())
    }

    fn output_cell(&mut self) -> Result<(), InterpreterError> {
        write_cell_record(&mut self.output, self.tape.cursor(), self.tape.current_value()).map_err(
            |source| InterpreterError::OutputWriteFailure {
                position: self.accumulator.cursor(),
                source,
            },
        )
    }

    fn input_cell(&mut self) -> Result<(), InterpreterError> {
        match self.input.next_byte() {
            Ok(Some(byte)) => self.tape.set_current_value(byte),
            // exhausted input leaves the cell alone
            Ok(None) => {}
            Err(source) => {
                return Err(InterpreterError::InputReadFailure {
                    position: self.accumulator.cursor(),
                    source,
                });
            }
        }
        Ok(())
    }

    fn loop_exit(&mut self) -> Result<(), InterpreterError> {
        diagnostics::no_opened_loop_check(&self.accumulator, &self.loops)?;
        let start = self.pop_loop()?;

        if self.tape.current_value() == 0 {
            return Ok(());
        }

        // `start` is the loop-enter, `end` is one past this loop-exit.
        let end = self.accumulator.cursor();
        let depth = self.loops.depth();
        let body = self.accumulator.instructions()[start + 1..end - 1].to_vec();

        match self.replay(start, &body) {
            Ok(iterations) => {
                debug!(start, end, iterations, depth, "loop finished");
                Ok(())
            }
            Err(err) => {
                // Leave the streams at their edge so later bytes are recorded
                // and the abandoned iteration holds no loop open.
                self.accumulator.rewind(self.accumulator.instructions().len());
                self.loops.truncate(depth);
                debug!(start, end, depth, "loop replay aborted");
                Err(err)
            }
        }
    }

    fn replay(&mut self, start: usize, body: &[u8]) -> Result<usize, InterpreterError> {
        let mut iterations: usize = 1;
        while self.tape.current_value() != 0 {
            self.accumulator.rewind(start);
            self.step(b'[')?;
            for &byte in body {
                self.step(byte)?;
            }
            // Close this iteration here rather than through `step`, which
            // would recurse once per iteration.
            self.accumulator.accept(b']');
            self.pop_loop()?;
            iterations += 1;
        }
        Ok(iterations)
    }

    fn pop_loop(&mut self) -> Result<usize, InterpreterError> {
        self.loops.pop().map_err(|_| {
            InterpreterError::UnbalancedLoop(Diagnostic::here(&self.accumulator, NO_OPENED_LOOP))
        })
    }
}

impl StdioInterpreter {
    /// Bind to stdin and stdout. `,` input skips newlines when configured to,
    /// or by default when stdin is a terminal.
    pub fn stdio(config: &Config) -> Result<Self, ConfigError> {
        let stdin = io::stdin();
        let skip_newlines = config.skip_newlines.unwrap_or_else(|| stdin.is_terminal());
        let input: Box<dyn Read> = if skip_newlines {
            Box::new(SkipNewlines::new(stdin))
        } else {
            Box::new(stdin)
        };
        Self::new(config, input, io::stdout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tape::CellArithmetic;
    use proptest::prelude::*;
    use std::io::Cursor;

    type TestInterpreter = Interpreter<Cursor<Vec<u8>>, Vec<u8>>;

    fn interpreter(size: usize, input: &[u8]) -> TestInterpreter {
        let config = Config {
            tape_size: size,
            ..Config::default()
        };
        Interpreter::new(&config, Cursor::new(input.to_vec()), Vec::new()).unwrap()
    }

    fn run(program: &str, input: &[u8]) -> (TestInterpreter, Result<(), InterpreterError>) {
        let mut bf = interpreter(16, input);
        let result = bf.run_str(program);
        (bf, result)
    }

    fn records(bf: &TestInterpreter) -> Vec<String> {
        String::from_utf8(bf.output().clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn values(bf: &TestInterpreter) -> Vec<u8> {
        records(bf)
            .iter()
            .map(|line| {
                let value = line
                    .split("string_value: ")
                    .nth(1)
                    .and_then(|rest| rest.split(',').next())
                    .unwrap();
                value.parse().unwrap()
            })
            .collect()
    }

    #[test]
    fn transfer_loop_moves_cell_zero_into_cell_one() {
        let (bf, result) = run("+++>++<[->+<]", b"");
        assert!(result.is_ok());
        assert_eq!(&bf.tape().cells()[..2], &[0, 5]);
        assert_eq!(bf.loop_depth(), 0);
    }

    #[test]
    fn input_then_output_prints_one_record() {
        let (bf, result) = run(",.", b"A");
        assert!(result.is_ok());
        assert_eq!(records(&bf), vec!["pointer: 0, string_value: 65, byte_value: A"]);
    }

    #[test]
    fn exhausted_input_leaves_cell_unchanged() {
        let (bf, result) = run("+++,", b"");
        assert!(result.is_ok());
        assert_eq!(bf.tape().current_value(), 3);
    }

    #[test]
    fn empty_loop_on_zero_cell_is_skipped() {
        let (bf, result) = run("[]", b"");
        assert!(result.is_ok());
        assert!(bf.tape().cells().iter().all(|&c| c == 0));
        assert_eq!(bf.tape().cursor(), 0);
    }

    #[test]
    fn loop_body_runs_once_per_unit_of_the_counter() {
        for k in 1..=7u8 {
            let program = format!("{}[-.]", "+".repeat(k as usize));
            let (bf, result) = run(&program, b"");
            assert!(result.is_ok());
            let expected: Vec<u8> = (0..k).rev().collect();
            assert_eq!(values(&bf), expected, "k = {k}");
        }
    }

    #[test]
    fn lone_loop_exit_is_unbalanced() {
        let (_, result) = run("]", b"");
        match result {
            Err(InterpreterError::UnbalancedLoop(d)) => {
                assert_eq!(d.position, 1);
                assert_eq!(d.reason, NO_OPENED_LOOP);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn unbalanced_exit_keeps_tape_state() {
        let (bf, result) = run("+>++ extra ]", b"");
        let err = result.unwrap_err();
        assert_eq!(err.position(), 5);
        assert_eq!(err.diagnostic().unwrap().context, "xtra ]");
        assert_eq!(&bf.tape().cells()[..2], &[1, 2]);
    }

    #[test]
    fn inner_loop_restarts_on_every_outer_iteration() {
        let (bf, result) = run("++[>+++[-.]<-]>>", b"");
        assert!(result.is_ok());
        assert_eq!(values(&bf), vec![2, 1, 0, 2, 1, 0]);
        assert_eq!(&bf.tape().cells()[..2], &[0, 0]);
        assert_eq!(bf.tape().cursor(), 2);
    }

    #[test]
    fn nested_counters_multiply() {
        let (bf, result) = run("++++[>+++[>++<-]<-]", b"");
        assert!(result.is_ok());
        assert_eq!(&bf.tape().cells()[..3], &[0, 0, 24]);
    }

    #[test]
    fn replay_records_each_instruction_once() {
        let (bf, result) = run("+++ [ - ] # done", b"");
        assert!(result.is_ok());
        assert_eq!(bf.accumulator().instructions(), b"+++[-]");
        assert_eq!(bf.accumulator().raw(), b"+++ [ - ] # done");
        assert!(bf.accumulator().at_edge());
    }

    #[test]
    fn loop_body_streams_once_before_its_exit_is_seen() {
        let (bf, result) = run("[>+<]", b"");
        assert!(result.is_ok());
        assert_eq!(&bf.tape().cells()[..2], &[0, 1]);
    }

    #[test]
    fn long_loops_do_not_deepen_the_stack() {
        let program = format!("{}[>+<-]", "+".repeat(255));
        let (bf, result) = run(&program, b"");
        assert!(result.is_ok());
        assert_eq!(bf.tape().cells()[1], 255);
    }

    #[test]
    fn cursor_wraps_during_execution() {
        let (bf, result) = run("<+", b"");
        assert!(result.is_ok());
        assert_eq!(bf.tape().cursor(), 15);
        assert_eq!(bf.tape().cells()[15], 1);
    }

    #[test]
    fn saturating_cells_by_default() {
        let (bf, result) = run("-", b"");
        assert!(result.is_ok());
        assert_eq!(bf.tape().current_value(), 0);
    }

    #[test]
    fn wrapping_cells_when_configured() {
        let config = Config {
            tape_size: 4,
            arithmetic: CellArithmetic::Wrapping,
            ..Config::default()
        };
        let mut bf = Interpreter::new(&config, Cursor::new(Vec::new()), Vec::new()).unwrap();
        bf.run_str("-").unwrap();
        assert_eq!(bf.tape().current_value(), 255);
    }

    #[test]
    fn zero_tape_size_is_a_config_error() {
        let config = Config {
            tape_size: 0,
            ..Config::default()
        };
        let result = Interpreter::new(&config, Cursor::new(Vec::new()), Vec::new());
        assert!(matches!(result, Err(ConfigError::ZeroTapeSize)));
    }

    #[test]
    fn feeding_bytes_keeps_state_between_calls() {
        let mut bf = interpreter(8, b"");
        for &b in b"++[" {
            bf.feed(b).unwrap();
        }
        assert_eq!(bf.loop_depth(), 1);
        assert!(matches!(bf.finish(), Err(InterpreterError::UnclosedLoop(_))));
        for &b in b"-]" {
            bf.feed(b).unwrap();
        }
        assert_eq!(bf.loop_depth(), 0);
        assert!(bf.finish().is_ok());
        assert_eq!(bf.tape().current_value(), 0);
    }

    #[test]
    fn reset_starts_a_fresh_program() {
        let mut bf = interpreter(4, b"");
        bf.run_str("+>++[").unwrap();
        bf.reset();
        assert_eq!(bf.loop_depth(), 0);
        assert!(bf.accumulator().instructions().is_empty());
        assert_eq!(bf.tape().cells(), &[0, 0, 0, 0]);
        bf.run_str("+.").unwrap();
        assert_eq!(records(&bf), vec!["pointer: 0, string_value: 1, byte_value: \u{1}"]);
    }

    struct BrokenReader;

    impl Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("device unplugged"))
        }
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn input_read_failure_aborts() {
        let mut bf = Interpreter::new(&Config::default(), BrokenReader, Vec::new()).unwrap();
        let err = bf.run_str("+,+").unwrap_err();
        assert!(matches!(err, InterpreterError::InputReadFailure { position: 2, .. }));
        assert_eq!(bf.tape().current_value(), 1);
    }

    #[test]
    fn program_read_failure_aborts() {
        let mut bf = interpreter(4, b"");
        let err = bf.run(BrokenReader).unwrap_err();
        assert!(matches!(err, InterpreterError::InputReadFailure { position: 0, .. }));
    }

    #[test]
    fn output_write_failure_aborts() {
        let mut bf = Interpreter::new(&Config::default(), Cursor::new(Vec::new()), BrokenWriter).unwrap();
        let err = bf.run_str("+.").unwrap_err();
        assert!(matches!(err, InterpreterError::OutputWriteFailure { position: 2, .. }));
    }

    /// Accepts one record, then fails every write that ends another.
    struct FailsOnSecondRecord {
        records: usize,
    }

    impl Write for FailsOnSecondRecord {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if buf.contains(&b'\n') {
                self.records += 1;
                if self.records >= 2 {
                    return Err(io::Error::from(io::ErrorKind::BrokenPipe));
                }
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failure_during_replay_leaves_stream_resumable() {
        let sink = FailsOnSecondRecord { records: 0 };
        let mut bf = Interpreter::new(&Config::default(), Cursor::new(Vec::new()), sink).unwrap();

        // first pass prints 3, the first replay fails on printing 2
        let err = bf.run_str("+++[.-]").unwrap_err();
        assert!(matches!(err, InterpreterError::OutputWriteFailure { position: 5, .. }));
        assert!(bf.accumulator().at_edge());
        assert_eq!(bf.loop_depth(), 0);
        assert!(bf.finish().is_ok());

        bf.run_str(">+++[-]").unwrap();
        assert_eq!(bf.accumulator().instructions(), b"+++[.-]>+++[-]");
        assert!(bf.accumulator().at_edge());
        assert!(bf.finish().is_ok());
        assert_eq!(bf.tape().cursor(), 1);
        assert_eq!(&bf.tape().cells()[..2], &[2, 0]);
    }

    #[test]
    fn failure_in_nested_replay_unwinds_every_level() {
        let sink = FailsOnSecondRecord { records: 0 };
        let mut bf = Interpreter::new(&Config::default(), Cursor::new(Vec::new()), sink).unwrap();

        // the inner loop prints once, the outer replay fails on its next print
        let err = bf.run_str("++[>+[.-]<-]").unwrap_err();
        assert!(matches!(err, InterpreterError::OutputWriteFailure { .. }));
        assert!(bf.accumulator().at_edge());
        assert_eq!(bf.loop_depth(), 0);

        bf.run_str("[").unwrap();
        assert_eq!(bf.loop_depth(), 1);
        assert!(matches!(bf.finish(), Err(InterpreterError::UnclosedLoop(_))));
    }

    const PROGRAMS: &[&str] = &[
        "+++>++<[->+<]",
        "++[>+++[-.]<-]>>",
        ",[.-]",
        "+++++[>++>+++<<-]>.>.<<<.",
    ];

    fn noise_byte() -> impl Strategy<Value = u8> {
        any::<u8>().prop_filter("not an op-code", |b| Op::from_byte(*b).is_none())
    }

    proptest! {
        #[test]
        fn noise_does_not_change_behaviour(
            which in 0..PROGRAMS.len(),
            noise in prop::collection::vec(prop::collection::vec(noise_byte(), 0..4), 32),
        ) {
            let clean = PROGRAMS[which];
            let mut noisy = Vec::new();
            for (i, &b) in clean.as_bytes().iter().enumerate() {
                noisy.extend_from_slice(&noise[i % noise.len()]);
                noisy.push(b);
            }

            let mut expected = interpreter(16, b"\x03");
            expected.run_str(clean).unwrap();
            let mut actual = interpreter(16, b"\x03");
            actual.run(noisy.as_slice()).unwrap();

            prop_assert_eq!(expected.tape().cells(), actual.tape().cells());
            prop_assert_eq!(expected.tape().cursor(), actual.tape().cursor());
            prop_assert_eq!(expected.output(), actual.output());
            prop_assert_eq!(expected.accumulator().instructions(), actual.accumulator().instructions());
        }
    }
}
