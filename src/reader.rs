//! Logical line reader
//!
//! Turns raw input into trimmed, comment-free logical lines. Brace shorthand
//! is split so that every `{` and `}` reaches the engine on a line of its
//! own.

use std::collections::VecDeque;
use std::fmt;
use std::io::{self, BufRead};

/// Configuration for [`LineReader`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Join physical lines ending in `\`
    pub line_continuation: bool,
    /// Strip `/* ... */` comments, possibly spanning lines
    pub block_comments: bool,
    /// Split `keyword args {` and trailing or leading `}` into separate lines
    pub split_braces: bool,
    /// Logical lines longer than this (in bytes) are skipped
    pub max_line_length: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            line_continuation: true,
            block_comments: true,
            split_braces: true,
            max_line_length: 64 * 1024,
        }
    }
}

impl ReaderConfig {
    /// Creates a reader configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables `\` line continuation
    pub fn with_line_continuation(mut self, enabled: bool) -> Self {
        self.line_continuation = enabled;
        self
    }

    /// Enables or disables `/* ... */` comment stripping
    pub fn with_block_comments(mut self, enabled: bool) -> Self {
        self.block_comments = enabled;
        self
    }

    /// Enables or disables splitting of brace shorthand
    pub fn with_split_braces(mut self, enabled: bool) -> Self {
        self.split_braces = enabled;
        self
    }

    /// Sets the logical line length above which lines are skipped
    pub fn with_max_line_length(mut self, length: usize) -> Self {
        self.max_line_length = length;
        self
    }
}

/// One non-empty logical line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    pub text: String,
    /// First physical line the text came from (1-based)
    pub line: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    InvalidUtf8,
    TooLong { length: usize, max: usize },
    /// Input ended inside a `/*` comment; the rest of the input was dropped
    UnterminatedComment { last_line: u64 },
}

/// A line the reader dropped instead of returning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedLine {
    pub line: u64,
    pub reason: SkipReason,
}

impl fmt::Display for SkippedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            SkipReason::InvalidUtf8 => write!(f, "line {} is not valid UTF-8, skipped", self.line),
            SkipReason::TooLong { length, max } => write!(
                f,
                "line {} is {} bytes long (limit {}), skipped",
                self.line, length, max
            ),
            SkipReason::UnterminatedComment { last_line } => write!(
                f,
                "comment opened on line {} is never closed, lines up to {} skipped",
                self.line, last_line
            ),
        }
    }
}

/// Streaming logical line reader over any [`BufRead`]
pub struct LineReader<R> {
    inner: R,
    config: ReaderConfig,
    physical: u64,
    in_block_comment: bool,
    comment_start: u64,
    pending: VecDeque<LogicalLine>,
    skipped: Vec<SkippedLine>,
    buffer: Vec<u8>,
}

impl<R: BufRead> LineReader<R> {
    /// Creates a reader with the default configuration
    pub fn new(inner: R) -> Self {
        Self::with_config(inner, ReaderConfig::default())
    }

    /// Creates a reader with a custom configuration
    pub fn with_config(inner: R, config: ReaderConfig) -> Self {
        Self {
            inner,
            config,
            physical: 0,
            in_block_comment: false,
            comment_start: 0,
            pending: VecDeque::new(),
            skipped: Vec::new(),
            buffer: Vec::new(),
        }
    }

    /// Number of physical lines consumed so far
    pub fn physical_lines(&self) -> u64 {
        self.physical
    }

    /// Returns and clears the lines skipped since the last call
    pub fn drain_skipped(&mut self) -> impl Iterator<Item = SkippedLine> + '_ {
        self.skipped.drain(..)
    }

    /// Next non-empty logical line, or `None` at end of input
    pub fn next_line(&mut self) -> io::Result<Option<LogicalLine>> {
        loop {
            if let Some(line) = self.pending.pop_front() {
                return Ok(Some(line));
            }

            let Some((line, text)) = self.read_logical()? else {
                return Ok(None);
            };

            if text.is_empty() {
                continue;
            }

            if text.len() > self.config.max_line_length {
                let skipped = SkippedLine {
                    line,
                    reason: SkipReason::TooLong {
                        length: text.len(),
                        max: self.config.max_line_length,
                    },
                };
                log::warn!("{}", skipped);
                self.skipped.push(skipped);
                continue;
            }

            if self.config.split_braces {
                self.split(&text, line);
            } else {
                self.pending.push_back(LogicalLine { text, line });
            }
        }
    }

    /// Reads physical lines up to the end of one logical line; `None` at end
    /// of input
    fn read_logical(&mut self) -> io::Result<Option<(u64, String)>> {
        let mut joined = String::new();
        let mut start = None;

        loop {
            self.buffer.clear();
            if self.inner.read_until(b'\n', &mut self.buffer)? == 0 {
                self.end_of_input();
                return Ok(start.map(|line| (line, joined.trim().to_string())));
            }
            self.physical += 1;

            while matches!(self.buffer.last(), Some(b'\n' | b'\r')) {
                self.buffer.pop();
            }

            let raw = match std::str::from_utf8(&self.buffer) {
                Ok(raw) => raw.to_owned(),
                Err(_) => {
                    let skipped = SkippedLine {
                        line: self.physical,
                        reason: SkipReason::InvalidUtf8,
                    };
                    log::warn!("{}", skipped);
                    self.skipped.push(skipped);
                    continue;
                }
            };

            let stripped = self.strip_comments(&raw);
            let trimmed = stripped.trim();
            start.get_or_insert(self.physical);

            if self.config.line_continuation {
                if let Some(head) = trimmed.strip_suffix('\\') {
                    joined.push_str(head.trim_end());
                    joined.push(' ');
                    continue;
                }
            }

            joined.push_str(trimmed);
            return Ok(start.map(|line| (line, joined.trim().to_string())));
        }
    }

    /// Records a block comment still open when the input runs out
    fn end_of_input(&mut self) {
        if !std::mem::take(&mut self.in_block_comment) {
            return;
        }
        let skipped = SkippedLine {
            line: self.comment_start,
            reason: SkipReason::UnterminatedComment {
                last_line: self.physical,
            },
        };
        log::warn!("{}", skipped);
        self.skipped.push(skipped);
    }

    fn strip_comments(&mut self, line: &str) -> String {
        let mut out = String::with_capacity(line.len());
        let mut chars = line.chars().peekable();
        let mut in_quote = false;

        while let Some(c) = chars.next() {
            if self.in_block_comment {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    self.in_block_comment = false;
                    out.push(' ');
                }
                continue;
            }

            if in_quote {
                in_quote = c != '"';
                out.push(c);
                continue;
            }

            match c {
                '"' => {
                    in_quote = true;
                    out.push(c);
                }
                '/' if chars.peek() == Some(&'/') => break,
                '/' if self.config.block_comments && chars.peek() == Some(&'*') => {
                    chars.next();
                    self.in_block_comment = true;
                    self.comment_start = self.physical;
                }
                _ => out.push(c),
            }
        }

        out
    }

    fn split(&mut self, text: &str, line: u64) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        if text.len() > 1 {
            if let Some(rest) = text.strip_prefix(['{', '}']) {
                self.push(&text[..1], line);
                self.split(rest, line);
                return;
            }
            if let Some(head) = text.strip_suffix(['{', '}']) {
                self.split(head, line);
                self.push(&text[text.len() - 1..], line);
                return;
            }
        }

        self.push(text, line);
    }

    fn push(&mut self, text: &str, line: u64) {
        self.pending.push_back(LogicalLine {
            text: text.to_string(),
            line,
        });
    }
}

impl<R: BufRead> Iterator for LineReader<R> {
    type Item = io::Result<LogicalLine>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(input: &str) -> Vec<(u64, String)> {
        LineReader::new(input.as_bytes())
            .map(|line| {
                let line = line.unwrap();
                (line.line, line.text)
            })
            .collect()
    }

    fn texts(input: &str) -> Vec<String> {
        lines(input).into_iter().map(|(_, text)| text).collect()
    }

    #[test]
    fn test_trims_and_drops_empty_lines() {
        assert_eq!(
            lines("  width 10  \r\n\n\t\nheight 20\n"),
            vec![(1, "width 10".to_string()), (4, "height 20".to_string())]
        );
    }

    #[test]
    fn test_strips_line_comments_outside_quotes() {
        assert_eq!(
            texts("name \"a // b\" // trailing\n// whole line\nvalue 1"),
            ["name \"a // b\"", "value 1"]
        );
    }

    #[test]
    fn test_strips_block_comments_across_lines() {
        assert_eq!(
            lines("a /* one */ 1\nb /* start\nstill comment\nend */ 2\nc 3"),
            vec![
                (1, "a   1".to_string()),
                (2, "b".to_string()),
                (4, "2".to_string()),
                (5, "c 3".to_string()),
            ]
        );
    }

    #[test]
    fn test_unterminated_block_comment_is_reported() {
        let mut reader = LineReader::new("value 1\n/* oops\nvalue 2\nvalue 3\n".as_bytes());

        assert_eq!(reader.next_line().unwrap().unwrap().text, "value 1");
        assert!(reader.next_line().unwrap().is_none());

        let skipped: Vec<_> = reader.drain_skipped().collect();
        assert_eq!(
            skipped,
            [SkippedLine {
                line: 2,
                reason: SkipReason::UnterminatedComment { last_line: 4 }
            }]
        );
        assert!(skipped[0].to_string().contains("never closed"));

        assert!(reader.next_line().unwrap().is_none());
        assert_eq!(reader.drain_skipped().count(), 0);
    }

    #[test]
    fn test_block_comments_can_be_disabled() {
        let config = ReaderConfig::new().with_block_comments(false);
        let reader = LineReader::with_config("a /* b */".as_bytes(), config);
        let texts: Vec<_> = reader.map(|line| line.unwrap().text).collect();
        assert_eq!(texts, ["a /* b */"]);
    }

    #[test]
    fn test_joins_continuation_lines() {
        assert_eq!(
            lines("position 1 \\\n  2 \\\n 3\nnext"),
            vec![(1, "position 1 2 3".to_string()), (4, "next".to_string())]
        );
    }

    #[test]
    fn test_continuation_at_end_of_input() {
        assert_eq!(lines("value 1 \\"), vec![(1, "value 1".to_string())]);
    }

    #[test]
    fn test_splits_brace_shorthand() {
        assert_eq!(
            texts("sampler \"Foo\" {\nmin_filter linear }\n}scene {}"),
            [
                "sampler \"Foo\"",
                "{",
                "min_filter linear",
                "}",
                "}",
                "scene",
                "{",
                "}"
            ]
        );
    }

    #[test]
    fn test_split_lines_share_line_number() {
        assert_eq!(
            lines("\nscene {"),
            vec![(2, "scene".to_string()), (2, "{".to_string())]
        );
    }

    #[test]
    fn test_brace_splitting_can_be_disabled() {
        let config = ReaderConfig::new().with_split_braces(false);
        let reader = LineReader::with_config("scene {".as_bytes(), config);
        let texts: Vec<_> = reader.map(|line| line.unwrap().text).collect();
        assert_eq!(texts, ["scene {"]);
    }

    #[test]
    fn test_skips_invalid_utf8() {
        let input: &[u8] = b"first 1\nbad \xff\xfe\nthird 3\n";
        let mut reader = LineReader::new(input);

        assert_eq!(reader.next_line().unwrap().unwrap().text, "first 1");
        let third = reader.next_line().unwrap().unwrap();
        assert_eq!((third.line, third.text.as_str()), (3, "third 3"));

        let skipped: Vec<_> = reader.drain_skipped().collect();
        assert_eq!(
            skipped,
            [SkippedLine {
                line: 2,
                reason: SkipReason::InvalidUtf8
            }]
        );
        assert!(reader.next_line().unwrap().is_none());
        assert_eq!(reader.physical_lines(), 3);
    }

    #[test]
    fn test_skips_overlong_lines() {
        let config = ReaderConfig::new().with_max_line_length(8);
        let mut reader = LineReader::with_config("short\nmuch too long line\nok".as_bytes(), config);

        assert_eq!(reader.next_line().unwrap().unwrap().text, "short");
        assert_eq!(reader.next_line().unwrap().unwrap().text, "ok");
        let skipped: Vec<_> = reader.drain_skipped().collect();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].line, 2);
        assert!(skipped[0].to_string().contains("limit 8"));
    }
}
