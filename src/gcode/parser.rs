// src/gcode/parser.rs - Line-oriented G-code tokenizer
use std::ops::Range;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct GCodeSpan {
    pub range: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} (line {line}, at {span:?})")]
pub struct GCodeError {
    pub message: String,
    pub line: usize,
    pub span: GCodeSpan,
}

/// A letter/number pair such as `X12.5`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Word {
    pub letter: char,
    pub value: f64,
}

/// One non-empty line of G-code, comments removed.
#[derive(Debug, Clone, PartialEq)]
pub struct GCodeLine {
    pub words: Vec<Word>,
    /// 1-based line number in the source.
    pub line: usize,
    pub span: GCodeSpan,
}

impl GCodeLine {
    /// Value of the first word with this letter.
    pub fn get(&self, letter: char) -> Option<f64> {
        self.words.iter().find(|w| w.letter == letter).map(|w| w.value)
    }

    pub fn has(&self, letter: char) -> bool {
        self.words.iter().any(|w| w.letter == letter)
    }

    /// The first `G` or `M` word, as `('G', 1)` etc. A negative or
    /// fractional code (`G-1`, `G1.5`) is not a command.
    pub fn command(&self) -> Option<(char, u32)> {
        let word = self.words.iter().find(|w| w.letter == 'G' || w.letter == 'M')?;
        let value = word.value;
        if value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
            return None;
        }
        Some((word.letter, value as u32))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GCodeParserConfig {
    /// Accept `;` line comments and `( ... )` inline comments.
    pub enable_comments: bool,
}

impl Default for GCodeParserConfig {
    fn default() -> Self {
        Self { enable_comments: true }
    }
}

pub struct GCodeParser<'a> {
    input: &'a str,
    config: GCodeParserConfig,
    pos: usize,
    line: usize,
}

impl<'a> GCodeParser<'a> {
    pub fn new(input: &'a str, config: GCodeParserConfig) -> Self {
        Self {
            input,
            config,
            pos: 0,
            line: 0,
        }
    }

    /// Next line carrying at least one word. Blank and comment-only lines
    /// are skipped.
    pub fn next_command(&mut self) -> Option<Result<GCodeLine, GCodeError>> {
        while self.pos < self.input.len() {
            let start = self.pos;
            let end = self.input[start..]
                .find('\n')
                .map(|i| start + i)
                .unwrap_or(self.input.len());
            self.pos = if end < self.input.len() { end + 1 } else { end };
            self.line += 1;

            match self.parse_line(start, &self.input[start..end]) {
                Ok(line) if line.words.is_empty() => continue,
                result => return Some(result),
            }
        }
        None
    }

    fn error(&self, message: String, range: Range<usize>) -> GCodeError {
        GCodeError {
            message,
            line: self.line,
            span: GCodeSpan { range },
        }
    }

    fn parse_line(&self, offset: usize, text: &str) -> Result<GCodeLine, GCodeError> {
        let mut words = Vec::new();
        let bytes = text.as_bytes();
        let mut i = 0;

        while i < bytes.len() {
            let c = bytes[i] as char;
            if c.is_ascii_whitespace() {
                i += 1;
                continue;
            }
            if self.config.enable_comments && c == ';' {
                break;
            }
            if self.config.enable_comments && c == '(' {
                match text[i..].find(')') {
                    Some(close) => {
                        i += close + 1;
                        continue;
                    }
                    None => {
                        return Err(self.error(
                            "unterminated comment".to_string(),
                            offset + i..offset + text.len(),
                        ));
                    }
                }
            }
            if !c.is_ascii_alphabetic() {
                return Err(self.error(format!("unexpected character '{c}'"), offset + i..offset + i + 1));
            }

            let letter = c.to_ascii_uppercase();
            let word_start = i;
            i += 1;
            while i < bytes.len() && bytes[i] == b' ' {
                i += 1;
            }
            let value_start = i;
            while i < bytes.len() && matches!(bytes[i], b'0'..=b'9' | b'.' | b'-' | b'+') {
                i += 1;
            }
            let raw = &text[value_start..i];
            let value = raw.parse::<f64>().map_err(|_| {
                self.error(
                    format!("invalid number '{raw}' for word {letter}"),
                    offset + word_start..offset + i,
                )
            })?;
            words.push(Word { letter, value });
        }

        Ok(GCodeLine {
            words,
            line: self.line,
            span: GCodeSpan {
                range: offset..offset + text.len(),
            },
        })
    }
}

impl Iterator for GCodeParser<'_> {
    type Item = Result<GCodeLine, GCodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_command()
    }
}
