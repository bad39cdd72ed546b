//! SVG path data bridge.
//!
//! Reads the absolute and relative forms of `M L H V C Q Z` with implicit
//! repeated commands, and writes a `Path` back as path data.

use crate::error::{BooleanError, Result};
use crate::geometry::limits;
use crate::model::{Path, PathCommand, Vec2};

struct Cursor<'a> {
    bytes: &'a [u8],
    i: usize,
}

impl<'a> Cursor<'a> {
    fn skip_ws(&mut self) {
        while self.i < self.bytes.len() {
            let c = self.bytes[self.i];
            if c == b' ' || c == b'\n' || c == b'\t' || c == b'\r' || c == b',' {
                self.i += 1;
            } else {
                break;
            }
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_ws();
        self.bytes.get(self.i).copied()
    }

    fn error(&self, message: &str) -> BooleanError {
        BooleanError::Svg { position: self.i, message: message.to_string() }
    }

    fn digits(&mut self) -> usize {
        let start = self.i;
        while self.i < self.bytes.len() && self.bytes[self.i].is_ascii_digit() {
            self.i += 1;
        }
        self.i - start
    }

    /// One number: sign, digits, optional fraction and exponent. A second
    /// sign or decimal point starts the next number, so `1-2` and `.5.5`
    /// read as two values.
    fn number(&mut self) -> Result<f64> {
        self.skip_ws();
        let start = self.i;
        if matches!(self.bytes.get(self.i), Some(b'+' | b'-')) {
            self.i += 1;
        }
        let mut count = self.digits();
        if self.bytes.get(self.i) == Some(&b'.') {
            self.i += 1;
            count += self.digits();
        }
        if count == 0 {
            self.i = start;
            return Err(self.error("expected a number"));
        }
        if matches!(self.bytes.get(self.i), Some(b'e' | b'E')) {
            self.i += 1;
            if matches!(self.bytes.get(self.i), Some(b'+' | b'-')) {
                self.i += 1;
            }
            if self.digits() == 0 {
                return Err(self.error("exponent has no digits"));
            }
        }
        let text = std::str::from_utf8(&self.bytes[start..self.i]).map_err(|_| self.error("invalid number"))?;
        let value = text.parse::<f64>().map_err(|_| self.error("invalid number"))?;
        if !limits::in_coord_bounds(value) {
            self.i = start;
            return Err(self.error("coordinate out of range"));
        }
        Ok(value)
    }

    fn point(&mut self, origin: Vec2) -> Result<Vec2> {
        let x = self.number()?;
        let y = self.number()?;
        let p = Vec2::new(origin.x + x, origin.y + y);
        if !limits::in_coord_bounds(p.x) || !limits::in_coord_bounds(p.y) {
            return Err(self.error("coordinate out of range"));
        }
        Ok(p)
    }
}

fn is_command(c: u8) -> bool {
    matches!(c, b'M' | b'm' | b'L' | b'l' | b'H' | b'h' | b'V' | b'v' | b'C' | b'c' | b'Q' | b'q' | b'Z' | b'z')
}

/// Parse SVG path data into a `Path` (non-zero fill, the SVG default).
pub fn path_from_svg(d: &str) -> Result<Path> {
    if d.len() > limits::MAX_SVG_TOKENS {
        return Err(BooleanError::Svg { position: limits::MAX_SVG_TOKENS, message: "path data is too long".into() });
    }
    let mut c = Cursor { bytes: d.as_bytes(), i: 0 };
    let mut path = Path::new();
    let mut cur = Vec2::default();
    let mut start = cur;
    let mut last: Option<u8> = None;
    let mut open = false;

    while let Some(b) = c.peek() {
        let cmd = if b.is_ascii_alphabetic() {
            if !is_command(b) {
                return Err(c.error("unsupported command"));
            }
            c.i += 1;
            b
        } else {
            match last {
                Some(prev) => prev,
                None => return Err(c.error("expected a command")),
            }
        };
        if path.commands.is_empty() && !matches!(cmd, b'M' | b'm') {
            return Err(c.error("path data must start with a moveto"));
        }
        if path.commands.len() >= limits::MAX_PATH_COMMANDS {
            return Err(BooleanError::TooManyCommands { limit: limits::MAX_PATH_COMMANDS });
        }
        let origin = if cmd.is_ascii_lowercase() { cur } else { Vec2::default() };

        // Drawing straight after a close starts again from the closed point
        if !open && !matches!(cmd, b'M' | b'm' | b'Z' | b'z') {
            path.move_to(start.x, start.y);
            open = true;
        }

        match cmd {
            b'M' | b'm' => {
                cur = c.point(origin)?;
                start = cur;
                path.move_to(cur.x, cur.y);
                open = true;
                // Further pairs are implicit linetos
                last = Some(if cmd == b'm' { b'l' } else { b'L' });
                continue;
            }
            b'L' | b'l' => {
                cur = c.point(origin)?;
                path.line_to(cur.x, cur.y);
            }
            b'H' | b'h' => {
                let x = c.number()? + origin.x;
                if !limits::in_coord_bounds(x) {
                    return Err(c.error("coordinate out of range"));
                }
                cur = Vec2::new(x, cur.y);
                path.line_to(cur.x, cur.y);
            }
            b'V' | b'v' => {
                let y = c.number()? + origin.y;
                if !limits::in_coord_bounds(y) {
                    return Err(c.error("coordinate out of range"));
                }
                cur = Vec2::new(cur.x, y);
                path.line_to(cur.x, cur.y);
            }
            b'C' | b'c' => {
                let c1 = c.point(origin)?;
                let c2 = c.point(origin)?;
                cur = c.point(origin)?;
                path.cubic_to(c1.x, c1.y, c2.x, c2.y, cur.x, cur.y);
            }
            b'Q' | b'q' => {
                let ctrl = c.point(origin)?;
                cur = c.point(origin)?;
                path.quad_to(ctrl.x, ctrl.y, cur.x, cur.y);
            }
            _ => {
                path.close();
                cur = start;
                open = false;
                last = None;
                continue;
            }
        }
        last = Some(cmd);
    }
    Ok(path)
}

/// Format a `Path` as SVG path data with absolute commands.
pub fn path_to_svg(path: &Path) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(path.commands.len());
    for cmd in &path.commands {
        parts.push(match *cmd {
            PathCommand::MoveTo { to } => format!("M {} {}", to.x, to.y),
            PathCommand::LineTo { to } => format!("L {} {}", to.x, to.y),
            PathCommand::QuadTo { ctrl, to } => format!("Q {} {} {} {}", ctrl.x, ctrl.y, to.x, to.y),
            PathCommand::CubicTo { ctrl1, ctrl2, to } => format!(
                "C {} {} {} {} {} {}",
                ctrl1.x, ctrl1.y, ctrl2.x, ctrl2.y, to.x, to.y
            ),
            PathCommand::Close => "Z".to_string(),
        });
    }
    parts.join(" ")
}
