//! NUMERIC/DECIMAL binary codec.
//!
//! PostgreSQL NUMERIC binary format:
//! - 2 bytes: ndigits (number of base-10000 digits)
//! - 2 bytes: weight (position of first digit relative to decimal point)
//! - 2 bytes: sign (0=pos, 0x4000=neg, 0xC000=NaN, 0xD000=+Inf, 0xF000=-Inf)
//! - 2 bytes: dscale (number of decimal digits after decimal point)
//! - ndigits * 2 bytes: digits (each 0-9999)
//!
//! Values are rendered to a plain decimal string first, then the integer
//! digits are grouped by four from the right and the fractional digits by
//! four from the left. A short trailing fractional group is written at face
//! value (`.567` becomes the digit `567`, not `5670`); existing consumers
//! depend on this layout.

use bytes::{BufMut, BytesMut};
use nom::{
    character::complete::{char, digit0, digit1, one_of},
    combinator::{all_consuming, opt},
    sequence::preceded,
    IResult,
};

use super::put_framed;
use crate::config::ColumnType;
use crate::error::{EncodeError, EncodeResult};
use crate::protocol::format::{
    NUMERIC_DEC_DIGITS, NUMERIC_HEADER_LEN, NUMERIC_NAN, NUMERIC_NEG, NUMERIC_NINF, NUMERIC_PINF,
    NUMERIC_POS,
};

/// A decimal literal split into sign, integer digits and fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalParts<'a> {
    pub negative: bool,
    pub int_digits: &'a str,
    pub frac_digits: &'a str,
}

/// Parse `[+-]?digits[.digits]`.
fn decimal_literal(input: &str) -> IResult<&str, DecimalParts<'_>> {
    let (input, sign) = opt(one_of("+-"))(input)?;
    let (input, int_digits) = digit1(input)?;
    let (input, frac_digits) = opt(preceded(char('.'), digit0))(input)?;
    Ok((
        input,
        DecimalParts {
            negative: sign == Some('-'),
            int_digits,
            frac_digits: frac_digits.unwrap_or(""),
        },
    ))
}

/// Parse a complete decimal literal (surrounding whitespace allowed).
pub fn parse_decimal(text: &str) -> Option<DecimalParts<'_>> {
    all_consuming(decimal_literal)(text.trim())
        .ok()
        .map(|(_, parts)| parts)
}

/// NBASE digits with their weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NbaseDigits {
    pub digits: Vec<u16>,
    pub weight: usize,
}

fn group_value(chunk: &[u8]) -> u16 {
    chunk
        .iter()
        .fold(0u16, |acc, d| acc * 10 + u16::from(d - b'0'))
}

/// Group decimal digits into base-10000 digits.
pub fn nbase_digits(int_digits: &str, frac_digits: &str) -> NbaseDigits {
    let int_bytes = int_digits.as_bytes();
    let frac_bytes = frac_digits.as_bytes();

    let mut digits = Vec::with_capacity(
        int_bytes.len().div_ceil(NUMERIC_DEC_DIGITS) + frac_bytes.len().div_ceil(NUMERIC_DEC_DIGITS),
    );

    // Integer part: the leftmost group takes the remainder
    let head = int_bytes.len() % NUMERIC_DEC_DIGITS;
    if head > 0 {
        digits.push(group_value(&int_bytes[..head]));
    }
    for chunk in int_bytes[head..].chunks(NUMERIC_DEC_DIGITS) {
        digits.push(group_value(chunk));
    }
    let int_groups = digits.len();

    // Fractional part: face value, no zero padding of the last group
    for chunk in frac_bytes.chunks(NUMERIC_DEC_DIGITS) {
        digits.push(group_value(chunk));
    }

    NbaseDigits {
        digits,
        weight: int_groups.saturating_sub(1),
    }
}

fn header_word(value: usize, what: &'static str) -> EncodeResult<i16> {
    i16::try_from(value).map_err(|_| EncodeError::OutOfRange {
        value: value as i128,
        target: what,
    })
}

/// Write a NUMERIC field from decimal parts.
pub fn encode_numeric_parts(buf: &mut BytesMut, parts: &DecimalParts<'_>) -> EncodeResult<()> {
    let NbaseDigits { digits, weight } = nbase_digits(parts.int_digits, parts.frac_digits);
    let ndigits = header_word(digits.len(), "numeric ndigits")?;
    let weight = header_word(weight, "numeric weight")?;
    let dscale = header_word(parts.frac_digits.len(), "numeric dscale")?;
    let sign = if parts.negative { NUMERIC_NEG } else { NUMERIC_POS };

    put_framed(buf, |buf| {
        buf.put_i16(ndigits);
        buf.put_i16(weight);
        buf.put_u16(sign);
        buf.put_i16(dscale);
        for digit in &digits {
            buf.put_u16(*digit);
        }
        Ok(())
    })?;
    Ok(())
}

/// NaN and infinities: sign word only, no digits.
fn encode_numeric_special(buf: &mut BytesMut, sign: u16) {
    buf.put_i32(NUMERIC_HEADER_LEN as i32);
    buf.put_i16(0);
    buf.put_i16(0);
    buf.put_u16(sign);
    buf.put_i16(0);
}

/// NUMERIC from a float, via its shortest round-trip decimal rendering.
pub fn encode_numeric_f64(buf: &mut BytesMut, value: f64) -> EncodeResult<()> {
    if value.is_nan() {
        encode_numeric_special(buf, NUMERIC_NAN);
        return Ok(());
    }
    if value.is_infinite() {
        let sign = if value > 0.0 { NUMERIC_PINF } else { NUMERIC_NINF };
        encode_numeric_special(buf, sign);
        return Ok(());
    }

    // f64 Display never uses exponent notation; 5.0 renders as "5" (dscale 0)
    let rendered = value.abs().to_string();
    let mut parts = parse_decimal(&rendered)
        .ok_or_else(|| EncodeError::unsupported("float", Some(ColumnType::Decimal)))?;
    parts.negative = value < 0.0;
    encode_numeric_parts(buf, &parts)
}

/// NUMERIC from an integer (dscale 0).
pub fn encode_numeric_i64(buf: &mut BytesMut, value: i64) -> EncodeResult<()> {
    let mut tmp = itoa::Buffer::new();
    let parts = DecimalParts {
        negative: value < 0,
        int_digits: tmp.format(value.unsigned_abs()),
        frac_digits: "",
    };
    encode_numeric_parts(buf, &parts)
}

/// NUMERIC from decimal text such as `-12.50`.
pub fn encode_numeric_text(buf: &mut BytesMut, text: &str) -> EncodeResult<()> {
    let parts =
        parse_decimal(text).ok_or_else(|| EncodeError::invalid_text(ColumnType::Decimal, text))?;
    encode_numeric_parts(buf, &parts)
}
