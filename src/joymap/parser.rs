//! Line parser for `.vjm` files.
//!
//! Each line is `keyword argument...`. The parser walks one line at a time with a
//! byte cursor; every error records the 1-based column of the character where
//! parsing stopped.

use super::{Joymap, JoymapEntry, JoymapError, JoymapVersion, SUPPORTED_MAJOR};
use crate::calibration::Direction;
use crate::event::{Cardinal, InputRef};
use crate::mapping::{KeyPosition, Mapping, PotAxis};
use tracing::warn;

pub(super) const COMMENT: char = '#';

type Result<T> = std::result::Result<T, JoymapError>;

pub(super) struct Parser<'a> {
    file: &'a str,
    lineno: usize,
    line: &'a str,
    pos: usize,
    joymap: Joymap,
}

impl<'a> Parser<'a> {
    pub(super) fn new(file: &'a str) -> Self {
        Self {
            file,
            lineno: 0,
            line: "",
            pos: 0,
            joymap: Joymap::default(),
        }
    }

    pub(super) fn parse(mut self, source: &'a str) -> Result<Joymap> {
        for (index, line) in source.lines().enumerate() {
            self.lineno = index + 1;
            self.line = line;
            self.pos = 0;
            self.parse_line()?;
        }
        Ok(self.joymap)
    }

    fn error(&self, column: usize, message: impl Into<String>) -> JoymapError {
        JoymapError::Parse {
            file: self.file.to_string(),
            line: self.lineno,
            column,
            message: message.into(),
        }
    }

    /// 1-based column of the cursor.
    fn column(&self) -> usize {
        self.line[..self.pos].chars().count() + 1
    }

    fn rest(&self) -> &'a str {
        &self.line[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn at_end(&self) -> bool {
        self.pos >= self.line.len()
    }

    /// Next run of non-whitespace characters, with its starting column.
    fn word(&mut self, what: &str) -> Result<(&'a str, usize)> {
        self.skip_whitespace();
        let column = self.column();
        let rest = self.rest();
        let len = rest.find(char::is_whitespace).unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error(column, format!("expected {what}")));
        }
        self.pos += len;
        Ok((&rest[..len], column))
    }

    fn expect_end(&mut self) -> Result<()> {
        self.skip_whitespace();
        if self.at_end() {
            Ok(())
        } else {
            Err(self.error(self.column(), "unexpected trailing text"))
        }
    }

    fn parse_line(&mut self) -> Result<()> {
        self.skip_whitespace();
        if self.at_end() || self.rest().starts_with(COMMENT) {
            return Ok(());
        }

        let (keyword, column) = self.word("keyword")?;
        if !is_well_formed_keyword(keyword) {
            return Err(self.error(column, format!("malformed keyword `{keyword}`")));
        }

        match keyword {
            "vjm-version" => {
                let version = self.version()?;
                self.expect_end()?;
                self.joymap.version = Some(version);
            }
            "device-name" => {
                let name = self.string()?;
                self.expect_end()?;
                self.joymap.device_name = Some(name);
            }
            "device-vendor" => {
                let id = self.u16_arg("vendor id")?;
                self.expect_end()?;
                self.joymap.device_vendor = Some(id);
            }
            "device-product" => {
                let id = self.u16_arg("product id")?;
                self.expect_end()?;
                self.joymap.device_product = Some(id);
            }
            "device-version" => {
                let id = self.u16_arg("version")?;
                self.expect_end()?;
                self.joymap.device_version = Some(id);
            }
            "pin" => {
                let input = self.input()?;
                let pin = self.u16_arg("pin")?;
                self.finish_entry(input, Mapping::Pin(pin))?;
            }
            "pot" => {
                let input = self.input()?;
                let (word, column) = self.word("pot axis")?;
                let axis = match word {
                    "x" => PotAxis::X,
                    "y" => PotAxis::Y,
                    _ => return Err(self.error(column, format!("unknown pot axis `{word}`"))),
                };
                self.finish_entry(input, Mapping::Pot(axis))?;
            }
            "key" => {
                let input = self.input()?;
                let row = self.integer("row", 0, i32::MAX as i64)? as i32;
                let column = self.integer("column", 0, i32::MAX as i64)? as i32;
                self.skip_whitespace();
                let flags = if self.at_end() {
                    0
                } else {
                    self.integer("flags", 0, u32::MAX as i64)? as u32
                };
                self.finish_entry(input, Mapping::Key(KeyPosition { row, column, flags }))?;
            }
            "action" => {
                let input = self.input()?;
                let name = self.string()?;
                self.finish_entry(input, Mapping::UiAction(name))?;
            }
            "activate" => {
                let input = self.input()?;
                self.finish_entry(input, Mapping::UiActivate)?;
            }
            other => {
                warn!(
                    file = self.file,
                    line = self.lineno,
                    "ignoring unknown keyword `{other}`"
                );
            }
        }
        Ok(())
    }

    fn finish_entry(&mut self, input: InputRef, mapping: Mapping) -> Result<()> {
        self.expect_end()?;
        self.joymap.entries.push(JoymapEntry {
            input,
            mapping,
            line: self.lineno,
        });
        Ok(())
    }

    fn version(&mut self) -> Result<JoymapVersion> {
        let (word, column) = self.word("version `major.minor`")?;
        let parsed = word.split_once('.').and_then(|(major, minor)| {
            let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
            if !digits(major) || !digits(minor) {
                return None;
            }
            Some(JoymapVersion {
                major: major.parse().ok()?,
                minor: minor.parse().ok()?,
            })
        });
        let version = parsed.ok_or_else(|| {
            self.error(column, format!("invalid version `{word}`, expected major.minor"))
        })?;
        if version.major != SUPPORTED_MAJOR {
            return Err(self.error(
                column,
                format!("unsupported joymap version {version}, expected {SUPPORTED_MAJOR}.x"),
            ));
        }
        Ok(version)
    }

    fn integer(&mut self, what: &str, min: i64, max: i64) -> Result<i64> {
        let (word, column) = self.word(what)?;
        let value = parse_integer(word)
            .ok_or_else(|| self.error(column, format!("invalid {what} `{word}`")))?;
        if value < min || value > max {
            return Err(self.error(
                column,
                format!("{what} {word} out of range {min}..={max}"),
            ));
        }
        Ok(value)
    }

    fn u16_arg(&mut self, what: &str) -> Result<u16> {
        Ok(self.integer(what, 0, u16::MAX as i64)? as u16)
    }

    /// Quoted string. A backslash takes the next character literally.
    fn string(&mut self) -> Result<String> {
        self.skip_whitespace();
        let column = self.column();
        let mut chars = self.rest().char_indices();
        match chars.next() {
            Some((_, '"')) => {}
            _ => return Err(self.error(column, "expected quoted string")),
        }

        let mut out = String::new();
        while let Some((offset, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, escaped)) => out.push(escaped),
                    None => break,
                },
                '"' => {
                    self.pos += offset + 1;
                    return Ok(out);
                }
                _ => out.push(c),
            }
        }

        self.pos = self.line.len();
        Err(self.error(self.column(), "missing closing quote"))
    }

    fn input(&mut self) -> Result<InputRef> {
        let (kind, column) = self.word("input kind (axis, button or hat)")?;
        match kind {
            "axis" => {
                let code = self.u16_arg("axis code")?;
                let (word, column) = self.word("axis direction")?;
                let direction = match word {
                    "negative" => Direction::Negative,
                    "positive" => Direction::Positive,
                    _ => {
                        return Err(self.error(
                            column,
                            format!("expected `negative` or `positive`, got `{word}`"),
                        ))
                    }
                };
                Ok(InputRef::Axis { code, direction })
            }
            "button" => {
                let code = self.u16_arg("button code")?;
                Ok(InputRef::Button { code })
            }
            "hat" => {
                let index = self.u16_arg("hat index")?;
                let (word, column) = self.word("hat direction")?;
                let direction = Cardinal::from_word(word).ok_or_else(|| {
                    self.error(column, format!("unknown hat direction `{word}`"))
                })?;
                Ok(InputRef::Hat { index, direction })
            }
            _ => Err(self.error(column, format!("unknown input kind `{kind}`"))),
        }
    }
}

/// Letters, digits and `-`, starting with a letter.
fn is_well_formed_keyword(word: &str) -> bool {
    let mut bytes = word.bytes();
    matches!(bytes.next(), Some(b) if b.is_ascii_alphabetic())
        && bytes.all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

/// Signed integer with optional `0x`, `0b` or leading-`0` octal prefix.
pub(super) fn parse_integer(text: &str) -> Option<i64> {
    let (negative, digits) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let (radix, body) = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        (16, hex)
    } else if let Some(bin) = digits
        .strip_prefix("0b")
        .or_else(|| digits.strip_prefix("0B"))
    {
        (2, bin)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };
    if body.is_empty() || body.starts_with(['+', '-']) {
        return None;
    }
    let value = i64::from_str_radix(body, radix).ok()?;
    Some(if negative { -value } else { value })
}
