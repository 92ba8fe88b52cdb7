//! Low-level byte-by-byte parser for ASCII/UTF-8 text.
//!
//! This module provides [ByteParser] for reading tree text with support for
//! peeking, consuming, comment skipping and quote-aware label parsing. It is
//! the foundation of the Newick reader.

use crate::parser::parsing_error::ParsingError;
use std::fs;
use std::io;
use std::path::Path;

/// Characters silently dropped from unquoted labels.
const IGNORED_LABEL_BYTES: &[u8] = b"\"'\t\n\r";

// =#========================================================================#=
// BYTE PARSER
// =#========================================================================#=
/// A byte-by-byte cursor over in-memory text.
///
/// [ByteParser] owns its input and tracks a single position. Trees produced by
/// phylogenetic tools are at most a few megabytes, so the whole input is held in
/// memory.
///
/// # Features
/// - Peek and consume single bytes
/// - Whitespace and `[...]` comment skipping
/// - Quote-aware label parsing (single or double quotes, doubled to escape)
/// - Context extraction for error reporting
///
/// # Example
/// ```
/// use taxwick::parser::ByteParser;
///
/// let mut parser = ByteParser::for_str("  [comment] (A,B);");
/// parser.skip_comment_and_whitespace().unwrap();
/// assert!(parser.consume_if(b'('));
/// assert_eq!(parser.parse_label(b",);").unwrap(), "A");
/// ```
#[derive(Debug, Clone)]
pub struct ByteParser {
    bytes: Vec<u8>,
    position: usize,
}

impl ByteParser {
    // =#====================================================================#=
    // New (pub)
    // =#====================================================================#=

    /// Creates a new `ByteParser` from a byte slice by copying it into a Vec.
    ///
    /// # Arguments
    /// * `input` - The byte slice to parse
    pub fn from_bytes(input: &[u8]) -> Self {
        Self {
            bytes: input.to_vec(),
            position: 0,
        }
    }

    /// Creates a new `ByteParser` from a string by copying it into a Vec.
    ///
    /// # Arguments
    /// * `input` - The string to parse
    pub fn for_str(input: &str) -> Self {
        Self::from_bytes(input.as_bytes())
    }

    /// Creates a new `ByteParser` over the full content of a file.
    ///
    /// # Errors
    /// Returns the underlying [io::Error] if the file cannot be read.
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Ok(Self {
            bytes: fs::read(path)?,
            position: 0,
        })
    }

    // =#====================================================================#=
    // Peek and consume (pub)
    // =#====================================================================#=

    /// Peeks at the current byte without consuming it.
    ///
    /// # Returns
    /// * `Some(u8)` - The current byte if available
    /// * `None` - If at end of data (EOF)
    #[inline(always)]
    pub fn peek(&self) -> Option<u8> {
        self.bytes.get(self.position).copied()
    }

    /// Gets the current byte and advances the position (consumes it).
    #[inline(always)]
    pub fn next_byte(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.position += 1;
        Some(b)
    }

    /// Checks if the current byte equals `ch`.
    pub fn peek_is(&self, ch: u8) -> bool {
        self.peek() == Some(ch)
    }

    /// Consumes the current byte if it equals `ch`.
    ///
    /// # Returns
    /// `true` if the byte was matched and consumed, `false` otherwise
    pub fn consume_if(&mut self, ch: u8) -> bool {
        if self.peek_is(ch) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    /// Consumes bytes up to and including `target`.
    ///
    /// # Returns
    /// `true` if the target was found, `false` if EOF was reached first
    pub fn consume_through(&mut self, target: u8) -> bool {
        while let Some(b) = self.next_byte() {
            if b == target {
                return true;
            }
        }
        false
    }

    /// Skips (consumes) all consecutive ASCII whitespace.
    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.position += 1;
            } else {
                break;
            }
        }
    }

    /// Skips (consumes) a comment enclosed in square brackets `[...]` if present.
    ///
    /// # Returns
    /// * `Ok(true)` - A comment was found and consumed
    /// * `Ok(false)` - No comment at current position
    ///
    /// # Errors
    /// Returns an error if a comment starts with `[` but doesn't have a closing `]`.
    pub fn skip_comment(&mut self) -> Result<bool, ParsingError> {
        if self.consume_if(b'[') {
            if !self.consume_through(b']') {
                return Err(ParsingError::unclosed_comment(self));
            }
            return Ok(true);
        }
        Ok(false)
    }

    /// Skips (consumes) all consecutive whitespace and comments.
    ///
    /// # Errors
    /// Returns an error if an unclosed comment is encountered.
    pub fn skip_comment_and_whitespace(&mut self) -> Result<(), ParsingError> {
        self.skip_whitespace();
        while self.skip_comment()? {
            self.skip_whitespace();
        }
        Ok(())
    }

    // =#====================================================================#=
    // Labels and numbers (pub)
    // =#====================================================================#=

    /// Parses a label (quoted or unquoted) ending at any of `delimiters`.
    ///
    /// A label starting with `'` or `"` is read as quoted label. Otherwise the
    /// label runs until a delimiter; quote, tab and newline characters inside it
    /// are dropped. Surrounding whitespace is trimmed, inner spaces are kept.
    ///
    /// # Errors
    /// Returns an error if a quoted label is not closed.
    pub fn parse_label(&mut self, delimiters: &[u8]) -> Result<String, ParsingError> {
        self.skip_comment_and_whitespace()?;

        match self.peek() {
            Some(quote @ (b'\'' | b'"')) => self.parse_quoted_label(quote),
            _ => Ok(self.parse_unquoted_label(delimiters)),
        }
    }

    /// Parses a label enclosed in `quote`, where a doubled quote is an escaped
    /// quote (`'Wilson''s'` becomes `Wilson's`).
    fn parse_quoted_label(&mut self, quote: u8) -> Result<String, ParsingError> {
        self.position += 1;
        let mut label = Vec::new();
        loop {
            match self.next_byte() {
                None => return Err(ParsingError::unclosed_quote(self)),
                Some(b) if b == quote => {
                    if self.consume_if(quote) {
                        label.push(quote);
                    } else {
                        break;
                    }
                }
                Some(b) => label.push(b),
            }
        }
        Ok(String::from_utf8_lossy(&label).trim().to_string())
    }

    fn parse_unquoted_label(&mut self, delimiters: &[u8]) -> String {
        let mut label = Vec::new();
        while let Some(b) = self.peek() {
            if delimiters.contains(&b) {
                break;
            }
            if !IGNORED_LABEL_BYTES.contains(&b) {
                label.push(b);
            }
            self.position += 1;
        }
        String::from_utf8_lossy(&label).trim().to_string()
    }

    /// Reads the longest run of characters that can be part of a float
    /// (digits, `.`, `-`, `+`, `e`, `E`) without interpreting it.
    pub fn take_number_token(&mut self) -> String {
        let start = self.position;
        while let Some(b) = self.peek() {
            if b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E') {
                self.position += 1;
            } else {
                break;
            }
        }
        String::from_utf8_lossy(&self.bytes[start..self.position]).into_owned()
    }

    // =#====================================================================#=
    // Position and context (pub)
    // =#====================================================================#=

    /// Returns whether the end of data (EOF) has been reached.
    pub fn is_eof(&self) -> bool {
        self.position >= self.bytes.len()
    }

    /// Returns the current byte offset in the input.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns a string from up to `k` bytes from the current position for error context.
    ///
    /// Invalid UTF-8 sequences are replaced with the Unicode replacement character.
    pub fn get_context_as_string(&self, k: usize) -> String {
        let start = self.position.min(self.bytes.len());
        let end = (start + k).min(self.bytes.len());
        String::from_utf8_lossy(&self.bytes[start..end]).into_owned()
    }
}
