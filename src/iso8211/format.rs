//! Subfield formats and decoded values.
//!
//! A descriptor's format list (e.g. `2A(2),I(10),b24,B(40)`) assigns every
//! subfield one `FieldFormat`. The format is the single authority on how a
//! value moves between bytes and [`Value`]: one exhaustive decode match, one
//! exhaustive encode match, nothing dispatched by letter at run time.

use nom::{
    branch::alt,
    character::complete::{char, digit1, one_of},
    combinator::{all_consuming, map, map_res, opt},
    multi::separated_list1,
    sequence::{delimited, pair, preceded},
    IResult,
};

use crate::error::{Result, S57Error};
use crate::iso8211::stream::{
    decode_text, parse_int, StreamReader, StreamWriter, UNIT_TERMINATOR,
};

// ---------------------------------------------------------------------------
// FieldFormat
// ---------------------------------------------------------------------------

/// Wire format of one subfield.
///
/// `None` lengths mark unbounded variants that run to the next unit
/// terminator (or to the end of the field body for the final subfield).
/// Binary widths are in bytes; the raw-bytes width counts the stored
/// little-endian blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldFormat {
    /// `A` / `A(n)`: character data.
    Text(Option<usize>),
    /// `I` / `I(n)`: integer written as ASCII digits.
    Integer(Option<usize>),
    /// `R` / `R(n)`: decimal written as ASCII text.
    Decimal(Option<usize>),
    /// `b2w`: signed big-endian two's-complement, `w` bytes.
    SignedBinary(usize),
    /// `b1w`: unsigned big-endian, `w` bytes.
    UnsignedBinary(usize),
    /// `B(bits)`: opaque bytes stored little-endian, reversed on decode.
    RawBytes(usize),
}

impl FieldFormat {
    /// Whether values of this format run to a terminator rather than a
    /// fixed width.
    pub fn is_unbounded(&self) -> bool {
        matches!(self, Self::Text(None) | Self::Integer(None) | Self::Decimal(None))
    }

    /// The format token this variant collapses back to.
    pub fn to_code(&self) -> String {
        match self {
            Self::Text(None) => "A".to_string(),
            Self::Text(Some(n)) => format!("A({})", n),
            Self::Integer(None) => "I".to_string(),
            Self::Integer(Some(n)) => format!("I({})", n),
            Self::Decimal(None) => "R".to_string(),
            Self::Decimal(Some(n)) => format!("R({})", n),
            Self::SignedBinary(w) => format!("b2{}", w),
            Self::UnsignedBinary(w) => format!("b1{}", w),
            Self::RawBytes(w) => format!("B({})", w * 8),
        }
    }

    /// Decode one value from a field body.
    ///
    /// The caller has already stripped the body's field terminator, so
    /// unbounded variants stop at a unit terminator or the end of the body.
    pub fn decode(&self, reader: &mut StreamReader<'_>) -> Result<Value> {
        match self {
            Self::Text(Some(n)) => Ok(Value::Text(reader.read_str(*n)?)),
            Self::Text(None) => Ok(Value::Text(decode_text(
                reader.read_until_or_end(UNIT_TERMINATOR),
            ))),
            Self::Integer(Some(n)) => Ok(Value::Integer(reader.read_int(*n)?)),
            Self::Integer(None) => {
                let text = decode_text(reader.read_until_or_end(UNIT_TERMINATOR));
                Ok(Value::Integer(parse_int(&text)?))
            }
            Self::Decimal(Some(n)) => Ok(Value::Decimal(Decimal::parse(reader.read_str(*n)?)?)),
            Self::Decimal(None) => {
                let text = decode_text(reader.read_until_or_end(UNIT_TERMINATOR));
                Ok(Value::Decimal(Decimal::parse(text)?))
            }
            Self::SignedBinary(w) => Ok(Value::Integer(reader.read_binary_int(*w)?)),
            Self::UnsignedBinary(w) => {
                let value = reader.read_binary_uint(*w)?;
                let value = i64::try_from(value)
                    .map_err(|_| S57Error::InvalidNumber(value.to_string()))?;
                Ok(Value::Integer(value))
            }
            Self::RawBytes(w) => Ok(Value::Bytes(reader.read_reversed(*w)?)),
        }
    }

    /// Encode one value into a field body.
    ///
    /// Unbounded variants append their unit terminator; the field encoder
    /// replaces the final one with the field terminator.
    pub fn encode(&self, value: &Value, writer: &mut StreamWriter) -> Result<()> {
        match (self, value) {
            (Self::Text(Some(n)), Value::Text(text)) => {
                let mut bytes = crate::iso8211::stream::encode_text(text)?;
                if bytes.len() > *n {
                    return Err(S57Error::StructuralMismatch(format!(
                        "text {:?} longer than fixed width {}",
                        text, n
                    )));
                }
                bytes.resize(*n, b' ');
                writer.write_bytes(&bytes);
                Ok(())
            }
            (Self::Text(None), Value::Text(text)) => {
                writer.write_str(text)?;
                writer.write_byte(UNIT_TERMINATOR);
                Ok(())
            }
            (Self::Integer(Some(n)), Value::Integer(v)) => writer.write_int(*v, Some(*n)),
            (Self::Integer(None), Value::Integer(v)) => {
                writer.write_int(*v, None)?;
                writer.write_byte(UNIT_TERMINATOR);
                Ok(())
            }
            (Self::Decimal(Some(n)), Value::Decimal(d)) => {
                if d.text().len() > *n {
                    return Err(S57Error::InvalidNumber(format!(
                        "{:?} longer than fixed width {}",
                        d.text(),
                        n
                    )));
                }
                let padded = format!("{:0>width$}", d.text(), width = *n);
                writer.write_str(&padded)
            }
            (Self::Decimal(None), Value::Decimal(d)) => {
                writer.write_str(d.text())?;
                writer.write_byte(UNIT_TERMINATOR);
                Ok(())
            }
            (Self::SignedBinary(w), Value::Integer(v)) => writer.write_binary_int(*v, *w),
            (Self::UnsignedBinary(w), Value::Integer(v)) => {
                let value = u64::try_from(*v)
                    .map_err(|_| S57Error::InvalidNumber(v.to_string()))?;
                writer.write_binary_uint(value, *w)
            }
            (Self::RawBytes(w), Value::Bytes(bytes)) => {
                if bytes.len() != *w {
                    return Err(S57Error::StructuralMismatch(format!(
                        "raw value of {} bytes in a {}-byte format",
                        bytes.len(),
                        w
                    )));
                }
                writer.write_reversed(bytes);
                Ok(())
            }
            (format, value) => Err(S57Error::StructuralMismatch(format!(
                "value {:?} does not match format {}",
                value,
                format.to_code()
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Format list grammar
// ---------------------------------------------------------------------------

fn paren_count(input: &str) -> IResult<&str, usize> {
    delimited(char('('), map_res(digit1, str::parse::<usize>), char(')'))(input)
}

fn character_format(input: &str) -> IResult<&str, FieldFormat> {
    let (input, letter) = one_of("AIR")(input)?;
    let (input, length) = opt(paren_count)(input)?;
    let format = match letter {
        'A' => FieldFormat::Text(length),
        'I' => FieldFormat::Integer(length),
        _ => FieldFormat::Decimal(length),
    };
    Ok((input, format))
}

fn binary_format(input: &str) -> IResult<&str, FieldFormat> {
    map_res(
        preceded(char('b'), pair(one_of("12"), digit1)),
        |(subtype, digits): (char, &str)| {
            let width: usize = digits.parse().map_err(|_| "bad width")?;
            if width == 0 || width > 8 {
                return Err("binary width out of range");
            }
            Ok(match subtype {
                '1' => FieldFormat::UnsignedBinary(width),
                _ => FieldFormat::SignedBinary(width),
            })
        },
    )(input)
}

fn bitstring_format(input: &str) -> IResult<&str, FieldFormat> {
    map_res(preceded(char('B'), paren_count), |bits| {
        if bits == 0 || bits % 8 != 0 {
            return Err("bit width must be a positive multiple of 8");
        }
        Ok(FieldFormat::RawBytes(bits / 8))
    })(input)
}

fn format_token(input: &str) -> IResult<&str, (usize, FieldFormat)> {
    map(
        pair(
            opt(map_res(digit1, str::parse::<usize>)),
            alt((character_format, binary_format, bitstring_format)),
        ),
        |(count, format)| (count.unwrap_or(1), format),
    )(input)
}

/// Parse a comma-separated format list, expanding repeat counts.
///
/// `"3A,I"` becomes `[Text, Text, Text, Integer]`.
pub fn parse_format_list(input: &str) -> Result<Vec<FieldFormat>> {
    let tokens = all_consuming(separated_list1(char(','), format_token))(input)
        .map_err(|_| bad_format_code(input))?
        .1;
    let mut formats = Vec::new();
    for (count, format) in tokens {
        if count == 0 {
            return Err(bad_format_code(input));
        }
        for _ in 0..count {
            formats.push(format.clone());
        }
    }
    Ok(formats)
}

fn bad_format_code(input: &str) -> S57Error {
    S57Error::UnsupportedFormatCode(input.to_string())
}

/// Collapse a format list back to its token form.
///
/// Consecutive identical formats regain their repeat count, so
/// `[Text, Text, Text, Integer]` becomes `"3A,I"`, the inverse of
/// [`parse_format_list`].
pub fn collapse_format_list(formats: &[FieldFormat]) -> String {
    let mut tokens: Vec<String> = Vec::new();
    let mut iter = formats.iter().peekable();
    while let Some(format) = iter.next() {
        let mut count = 1;
        while iter.peek() == Some(&format) {
            iter.next();
            count += 1;
        }
        if count == 1 {
            tokens.push(format.to_code());
        } else {
            tokens.push(format!("{}{}", count, format.to_code()));
        }
    }
    tokens.join(",")
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// One decoded subfield value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Character data, stored verbatim (fixed-width padding included).
    Text(String),
    /// An integer from either the text-digit or binary codecs.
    Integer(i64),
    /// A decimal that remembers its source text.
    Decimal(Decimal),
    /// Logical (already byte-reversed) raw bytes.
    Bytes(Vec<u8>),
}

impl Value {
    /// Text content, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Integer content, if this is an integer value.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric content of integer or decimal values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Decimal(d) => Some(d.value()),
            _ => None,
        }
    }

    /// Raw byte content, if this is a bytes value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// Decimal value that keeps its exact source text.
///
/// `R` fields re-encode from the text, not from the parsed number, so a
/// payload like `42.50` survives a round trip that a binary float would
/// reformat.
#[derive(Debug, Clone, PartialEq)]
pub struct Decimal {
    text: String,
    value: f64,
}

impl Decimal {
    /// Parse decimal text, keeping it verbatim.
    pub fn parse(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let value = text
            .trim()
            .parse::<f64>()
            .map_err(|_| S57Error::InvalidNumber(text.clone()))?;
        Ok(Self { text, value })
    }

    /// Build a decimal from a number, formatting it minimally.
    pub fn from_value(value: f64) -> Self {
        Self {
            text: value.to_string(),
            value,
        }
    }

    /// The exact source text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The parsed numeric value.
    pub fn value(&self) -> f64 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(token: &str) -> FieldFormat {
        let formats = parse_format_list(token).unwrap();
        assert_eq!(formats.len(), 1);
        formats.into_iter().next().unwrap()
    }

    #[test]
    fn test_parse_character_formats() {
        assert_eq!(parse_one("A"), FieldFormat::Text(None));
        assert_eq!(parse_one("A(5)"), FieldFormat::Text(Some(5)));
        assert_eq!(parse_one("I(10)"), FieldFormat::Integer(Some(10)));
        assert_eq!(parse_one("R(12)"), FieldFormat::Decimal(Some(12)));
    }

    #[test]
    fn test_parse_binary_formats() {
        assert_eq!(parse_one("b11"), FieldFormat::UnsignedBinary(1));
        assert_eq!(parse_one("b24"), FieldFormat::SignedBinary(4));
        assert_eq!(parse_one("B(40)"), FieldFormat::RawBytes(5));
    }

    #[test]
    fn test_parse_repeat_counts_expand() {
        let formats = parse_format_list("3A,I").unwrap();
        assert_eq!(
            formats,
            vec![
                FieldFormat::Text(None),
                FieldFormat::Text(None),
                FieldFormat::Text(None),
                FieldFormat::Integer(None),
            ]
        );
    }

    #[test]
    fn test_parse_mixed_list() {
        let formats = parse_format_list("A(2),I(10),4R(12),2b14").unwrap();
        assert_eq!(formats.len(), 7);
        assert_eq!(formats[2], FieldFormat::Decimal(Some(12)));
        assert_eq!(formats[6], FieldFormat::UnsignedBinary(4));
    }

    #[test]
    fn test_parse_rejects_unknown_letter() {
        assert!(matches!(
            parse_format_list("A,X(3)"),
            Err(S57Error::UnsupportedFormatCode(_))
        ));
    }

    #[test]
    fn test_parse_rejects_bad_bit_width() {
        assert!(parse_format_list("B(12)").is_err());
        assert!(parse_format_list("b19").is_err());
    }

    #[test]
    fn test_collapse_is_inverse_of_parse() {
        let formats = parse_format_list("3A,I").unwrap();
        assert_eq!(collapse_format_list(&formats), "3A,I");

        let formats = parse_format_list("2b11,b14,A(2)").unwrap();
        assert_eq!(collapse_format_list(&formats), "2b11,b14,A(2)");
    }

    #[test]
    fn test_collapse_groups_only_adjacent() {
        let formats = vec![
            FieldFormat::Text(None),
            FieldFormat::Integer(None),
            FieldFormat::Text(None),
        ];
        assert_eq!(collapse_format_list(&formats), "A,I,A");
    }

    #[test]
    fn test_decode_fixed_text_keeps_padding() {
        let mut reader = StreamReader::new(b"AB   ");
        let value = FieldFormat::Text(Some(5)).decode(&mut reader).unwrap();
        assert_eq!(value, Value::Text("AB   ".to_string()));
    }

    #[test]
    fn test_decode_unbounded_text_stops_at_unit_terminator() {
        let mut reader = StreamReader::new(b"HELLO\x1fNEXT");
        let value = FieldFormat::Text(None).decode(&mut reader).unwrap();
        assert_eq!(value, Value::Text("HELLO".to_string()));
        assert_eq!(reader.remaining(), 4);
    }

    #[test]
    fn test_decode_signed_binary() {
        let mut reader = StreamReader::new(&[0xFF]);
        let value = FieldFormat::SignedBinary(1).decode(&mut reader).unwrap();
        assert_eq!(value, Value::Integer(-1));
    }

    #[test]
    fn test_decode_raw_bytes_reverses() {
        let mut reader = StreamReader::new(&[0x01, 0x02, 0x03, 0x04, 0x78]);
        let value = FieldFormat::RawBytes(5).decode(&mut reader).unwrap();
        assert_eq!(value, Value::Bytes(vec![0x78, 0x04, 0x03, 0x02, 0x01]));
    }

    #[test]
    fn test_encode_decode_round_trip_per_format() {
        let cases: Vec<(FieldFormat, Value)> = vec![
            (FieldFormat::Text(Some(5)), Value::Text("HELLO".into())),
            (FieldFormat::Text(None), Value::Text("open".into())),
            (FieldFormat::Integer(Some(5)), Value::Integer(42)),
            (FieldFormat::Integer(None), Value::Integer(-7)),
            (
                FieldFormat::Decimal(None),
                Value::Decimal(Decimal::parse("42.50").unwrap()),
            ),
            (FieldFormat::SignedBinary(2), Value::Integer(-300)),
            (FieldFormat::UnsignedBinary(4), Value::Integer(70000)),
            (FieldFormat::RawBytes(3), Value::Bytes(vec![9, 8, 7])),
        ];
        for (format, value) in cases {
            let mut writer = StreamWriter::new();
            format.encode(&value, &mut writer).unwrap();
            let bytes = writer.into_bytes();
            let mut reader = StreamReader::new(&bytes);
            assert_eq!(format.decode(&mut reader).unwrap(), value, "{:?}", format);
        }
    }

    #[test]
    fn test_encode_shape_mismatch() {
        let mut writer = StreamWriter::new();
        let err = FieldFormat::Integer(Some(3))
            .encode(&Value::Text("x".into()), &mut writer)
            .unwrap_err();
        assert!(matches!(err, S57Error::StructuralMismatch(_)));
    }

    #[test]
    fn test_decimal_preserves_text() {
        let d = Decimal::parse("42.50").unwrap();
        assert_eq!(d.text(), "42.50");
        assert_eq!(d.value(), 42.5);
    }
}
