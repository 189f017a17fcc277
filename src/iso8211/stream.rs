//! Byte-level stream primitives for the ISO 8211 codec.
//!
//! `StreamReader` is a cursor over a borrowed byte slice; `StreamWriter`
//! accumulates an owned buffer. Between them they cover every encoding the
//! format uses: fixed and terminator-delimited text, text-digit integers,
//! big-endian two's-complement binary integers, and byte-order-reversed raw
//! blobs (coordinate and identifier storage is little-endian on disk).

use byteorder::{BigEndian, ByteOrder};
use encoding_rs::WINDOWS_1252;

use crate::error::{Result, S57Error};

/// Terminates a field's byte payload and the directory.
pub const FIELD_TERMINATOR: u8 = 0x1E;

/// Terminates a variable-length subfield or descriptor section.
pub const UNIT_TERMINATOR: u8 = 0x1F;

/// Decode payload bytes as text.
///
/// Windows-1252 maps every byte to exactly one char, so decoding and
/// re-encoding a payload is lossless whatever it contains.
pub fn decode_text(bytes: &[u8]) -> String {
    let (text, _, _) = WINDOWS_1252.decode(bytes);
    text.into_owned()
}

/// Encode text back to payload bytes.
pub fn encode_text(text: &str) -> Result<Vec<u8>> {
    let (bytes, _, had_errors) = WINDOWS_1252.encode(text);
    if had_errors {
        return Err(S57Error::Encoding(format!(
            "text {:?} is not representable in the payload character set",
            text
        )));
    }
    Ok(bytes.into_owned())
}

// ---------------------------------------------------------------------------
// StreamReader
// ---------------------------------------------------------------------------

/// Forward-only cursor over a byte slice.
#[derive(Debug)]
pub struct StreamReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> StreamReader<'a> {
    /// Create a reader over `data` positioned at its start.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current cursor position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Whether the cursor has consumed every byte.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Next byte without advancing, if any remain.
    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// Read exactly `n` bytes, advancing the cursor.
    pub fn read_fixed(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(S57Error::TruncatedData {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read up to (excluding) the next `terminator`, advancing past it.
    pub fn read_until(&mut self, terminator: u8) -> Result<&'a [u8]> {
        match self.data[self.pos..].iter().position(|&b| b == terminator) {
            Some(offset) => {
                let slice = &self.data[self.pos..self.pos + offset];
                self.pos += offset + 1;
                Ok(slice)
            }
            None => Err(S57Error::MissingTerminator { terminator }),
        }
    }

    /// Like [`read_until`](Self::read_until), but a missing terminator
    /// consumes the rest of the input instead of failing.
    ///
    /// Used for the last unbounded subfield of a field body, which is
    /// closed by the field terminator the caller has already stripped.
    pub fn read_until_or_end(&mut self, terminator: u8) -> &'a [u8] {
        match self.data[self.pos..].iter().position(|&b| b == terminator) {
            Some(offset) => {
                let slice = &self.data[self.pos..self.pos + offset];
                self.pos += offset + 1;
                slice
            }
            None => {
                let slice = &self.data[self.pos..];
                self.pos = self.data.len();
                slice
            }
        }
    }

    /// Read `n` bytes as text.
    pub fn read_str(&mut self, n: usize) -> Result<String> {
        Ok(decode_text(self.read_fixed(n)?))
    }

    /// Read text up to the next `terminator`.
    pub fn read_str_until(&mut self, terminator: u8) -> Result<String> {
        Ok(decode_text(self.read_until(terminator)?))
    }

    /// Read `n` bytes of ASCII digits as an integer.
    pub fn read_int(&mut self, n: usize) -> Result<i64> {
        parse_int(&self.read_str(n)?)
    }

    /// Read a big-endian unsigned binary integer of `width` bytes.
    pub fn read_binary_uint(&mut self, width: usize) -> Result<u64> {
        check_binary_width(width)?;
        let bytes = self.read_fixed(width)?;
        Ok(BigEndian::read_uint(bytes, width))
    }

    /// Read a big-endian two's-complement signed integer of `width` bytes.
    pub fn read_binary_int(&mut self, width: usize) -> Result<i64> {
        check_binary_width(width)?;
        let bytes = self.read_fixed(width)?;
        Ok(BigEndian::read_int(bytes, width))
    }

    /// Read `width` little-endian-stored bytes, returning the logical
    /// (reversed) byte order.
    pub fn read_reversed(&mut self, width: usize) -> Result<Vec<u8>> {
        let mut bytes = self.read_fixed(width)?.to_vec();
        bytes.reverse();
        Ok(bytes)
    }
}

// ---------------------------------------------------------------------------
// StreamWriter
// ---------------------------------------------------------------------------

/// Append-only byte buffer mirroring the reader's codecs.
#[derive(Debug, Default)]
pub struct StreamWriter {
    buffer: Vec<u8>,
}

impl StreamWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Consume the writer, yielding its buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Append a single byte.
    pub fn write_byte(&mut self, byte: u8) {
        self.buffer.push(byte);
    }

    /// Append raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Append text.
    pub fn write_str(&mut self, text: &str) -> Result<()> {
        let bytes = encode_text(text)?;
        self.buffer.extend_from_slice(&bytes);
        Ok(())
    }

    /// Append an integer as ASCII digits, zero-padded to `width` when given.
    pub fn write_int(&mut self, value: i64, width: Option<usize>) -> Result<()> {
        let text = match width {
            Some(w) => format!("{:0w$}", value, w = w),
            None => value.to_string(),
        };
        if let Some(w) = width {
            if text.len() > w {
                return Err(S57Error::InvalidNumber(format!(
                    "{} does not fit in {} digits",
                    value, w
                )));
            }
        }
        self.write_str(&text)
    }

    /// Append a big-endian unsigned binary integer of `width` bytes.
    pub fn write_binary_uint(&mut self, value: u64, width: usize) -> Result<()> {
        check_binary_width(width)?;
        if width < 8 && value >= 1u64 << (8 * width) {
            return Err(S57Error::InvalidNumber(format!(
                "{} does not fit in {} binary bytes",
                value, width
            )));
        }
        let mut bytes = [0u8; 8];
        BigEndian::write_uint(&mut bytes[..width], value, width);
        self.buffer.extend_from_slice(&bytes[..width]);
        Ok(())
    }

    /// Append a big-endian two's-complement signed integer of `width` bytes.
    pub fn write_binary_int(&mut self, value: i64, width: usize) -> Result<()> {
        check_binary_width(width)?;
        if width < 8 {
            let bound = 1i64 << (8 * width - 1);
            if value >= bound || value < -bound {
                return Err(S57Error::InvalidNumber(format!(
                    "{} does not fit in {} signed binary bytes",
                    value, width
                )));
            }
        }
        let mut bytes = [0u8; 8];
        BigEndian::write_int(&mut bytes[..width], value, width);
        self.buffer.extend_from_slice(&bytes[..width]);
        Ok(())
    }

    /// Append logical bytes in reversed (little-endian storage) order.
    pub fn write_reversed(&mut self, logical: &[u8]) {
        self.buffer.extend(logical.iter().rev());
    }
}

/// Validate that `body` ends with the field terminator and return the bytes
/// before it.
pub fn strip_field_terminator(body: &[u8]) -> Result<&[u8]> {
    match body.split_last() {
        Some((&FIELD_TERMINATOR, rest)) => Ok(rest),
        _ => Err(S57Error::MissingTerminator {
            terminator: FIELD_TERMINATOR,
        }),
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn check_binary_width(width: usize) -> Result<()> {
    if width == 0 || width > 8 {
        return Err(S57Error::UnsupportedFormatCode(format!(
            "binary width {} (supported: 1..=8 bytes)",
            width
        )));
    }
    Ok(())
}

/// Parse ASCII digits (with optional sign, surrounding blanks tolerated)
/// as an integer.
pub fn parse_int(text: &str) -> Result<i64> {
    let trimmed = text.trim();
    trimmed
        .parse::<i64>()
        .map_err(|_| S57Error::InvalidNumber(text.to_string()))
}
