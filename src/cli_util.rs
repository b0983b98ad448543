use std::fs::File;
use std::io::{self, BufReader, IsTerminal, Read, Write};
use std::path::PathBuf;

use crate::InterpreterError;
use crate::theme;

/// Where a command takes its program text from.
#[derive(Debug, Clone)]
pub enum ProgramSource {
    /// Positional arguments, concatenated.
    Inline(String),
    File(PathBuf),
}

impl ProgramSource {
    /// Pick the source from `--file` or positional code. Exactly one must be given.
    pub fn from_args(file: Option<String>, code: Vec<String>) -> Result<Self, &'static str> {
        if code.iter().any(|part| looks_like_flag(part)) {
            return Err("options must come before the program code");
        }
        match (file, code.is_empty()) {
            (Some(_), false) => Err("cannot use positional code together with --file"),
            (Some(path), true) => Ok(ProgramSource::File(PathBuf::from(path))),
            (None, false) => Ok(ProgramSource::Inline(code.join(""))),
            (None, true) => Err("no program given"),
        }
    }

    /// Open the program as a byte stream. Files are read lazily.
    pub fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        match self {
            ProgramSource::Inline(code) => Ok(Box::new(code.as_bytes())),
            ProgramSource::File(path) => Ok(Box::new(BufReader::new(File::open(path)?))),
        }
    }

    pub fn read_all(&self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.open()?.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

/// Code parts are collected verbatim once the first one is seen, so a flag
/// written after the code would otherwise run as program noise.
fn looks_like_flag(part: &str) -> bool {
    const FLAGS: &[&str] = &["--file", "--tape-size", "--wrap", "--help", "-f", "-h"];
    FLAGS
        .iter()
        .any(|flag| part == *flag || part.strip_prefix(flag).is_some_and(|rest| rest.starts_with('=')))
}

/// Render an interpreter error: a header line, then for located errors the
/// surrounding program text with a caret under the failing byte.
/// If `program` is `Some("bf")`, the header is prefixed with "bf: ".
pub fn render_interpreter_error(program: Option<&str>, err: &InterpreterError) -> Vec<String> {
    let prefix_program = |msg: String| match program {
        Some(p) => format!("{p}: {msg}"),
        None => msg,
    };

    let Some(d) = err.diagnostic() else {
        return vec![prefix_program(err.to_string())];
    };
    let kind = match err {
        InterpreterError::UnbalancedLoop(_) => "Runtime error",
        _ => "Parse error",
    };

    // Keep the caret aligned: every context char must occupy one column.
    let context: String = d
        .context
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let mut underline = " ".repeat(d.caret);
    underline.push('^');

    vec![
        prefix_program(format!("{kind}: {} at instruction {}", d.reason, d.position)),
        format!("  {context}"),
        format!("  {underline}"),
    ]
}

/// Print an interpreter error to stderr, coloring the header when stderr is a terminal.
pub fn print_interpreter_error(program: Option<&str>, err: &InterpreterError) {
    let styled = io::stderr().is_terminal();
    for (i, line) in render_interpreter_error(program, err).into_iter().enumerate() {
        if i == 0 && styled {
            eprintln!("{}", theme::error_style().paint(line));
        } else {
            eprintln!("{line}");
        }
    }
    let _ = io::stderr().flush();
}

/// Print a non-fatal diagnostic, such as a loop left open at end of input.
pub fn print_warning(program: &str, err: &InterpreterError) {
    eprintln!("{program}: warning: {err}");
    let _ = io::stderr().flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, Interpreter};

    fn failing_run(code: &str) -> InterpreterError {
        let mut bf = Interpreter::new(&Config::default(), io::empty(), Vec::new()).unwrap();
        bf.run_str(code).unwrap_err()
    }

    #[test]
    fn caret_points_at_failing_bracket() {
        let err = failing_run("+\n+ ]");
        let lines = render_interpreter_error(Some("bf"), &err);
        assert_eq!(lines[0], "bf: Runtime error: no opened loop at instruction 3");
        assert_eq!(lines[1], "  + + ]");
        assert_eq!(lines[2], "      ^");
    }

    #[test]
    fn io_errors_have_a_single_line() {
        let err = InterpreterError::InputReadFailure {
            position: 4,
            source: io::Error::other("boom"),
        };
        let lines = render_interpreter_error(None, &err);
        assert_eq!(lines, vec!["I/O error at instruction 4: boom"]);
    }

    #[test]
    fn program_source_requires_exactly_one_input() {
        assert!(ProgramSource::from_args(None, vec![]).is_err());
        assert!(ProgramSource::from_args(Some("a.bf".into()), vec!["+".into()]).is_err());
        match ProgramSource::from_args(None, vec!["+".into(), "[-]".into()]) {
            Ok(ProgramSource::Inline(code)) => assert_eq!(code, "+[-]"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn flags_after_code_are_rejected() {
        assert!(ProgramSource::from_args(None, vec!["+".into(), "--wrap".into()]).is_err());
        assert!(ProgramSource::from_args(None, vec!["+".into(), "--tape-size=4".into()]).is_err());
        match ProgramSource::from_args(None, vec!["--".into(), "--.".into()]) {
            Ok(ProgramSource::Inline(code)) => assert_eq!(code, "----."),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn inline_source_reads_back() {
        let src = ProgramSource::Inline("+.".into());
        assert_eq!(src.read_all().unwrap(), b"+.");
    }
}
