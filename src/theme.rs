//! Terminal colors for op-code highlighting and error headers.

use nu_ansi_term::{Color, Style};

use crate::op::Op;

/// Catppuccin Mocha accents.
pub(crate) struct Mocha;

impl Mocha {
    pub const SURFACE2: Color = Color::Rgb(108, 112, 134);
    pub const RED: Color = Color::Rgb(243, 139, 168);
    pub const GREEN: Color = Color::Rgb(166, 227, 161);
    pub const YELLOW: Color = Color::Rgb(249, 226, 175);
    pub const MAUVE: Color = Color::Rgb(203, 166, 247);
    pub const PEACH: Color = Color::Rgb(250, 179, 135);
    pub const TEAL: Color = Color::Rgb(148, 226, 213);
    pub const SKY: Color = Color::Rgb(137, 220, 235);
}

/// Style for a byte of program text; `None` is noise.
//   > <   sky/teal      movement
//   + -   green/red     cell arithmetic
//   . ,   yellow/peach  I/O
//   [ ]   mauve         loops
pub(crate) fn op_style(op: Option<Op>) -> Style {
    let color = match op {
        Some(Op::MoveForward) => Mocha::SKY,
        Some(Op::MoveBackward) => Mocha::TEAL,
        Some(Op::Increment) => Mocha::GREEN,
        Some(Op::Decrement) => Mocha::RED,
        Some(Op::Output) => Mocha::YELLOW,
        Some(Op::Input) => Mocha::PEACH,
        Some(Op::LoopEnter) | Some(Op::LoopExit) => Mocha::MAUVE,
        None => return Style::new().fg(Mocha::SURFACE2),
    };
    Style::new().fg(color).bold()
}

pub(crate) fn error_style() -> Style {
    Style::new().fg(Mocha::RED).bold()
}
