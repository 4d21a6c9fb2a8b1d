//! Leaf parsers for header values that arrive as complete buffers.

use nom::{bytes::complete::tag, character::complete::digit0, combinator::opt, sequence::pair, IResult};

/// Parses a Content-Length value: an optional leading minus and a run of
/// decimal digits. Parsing stops at the first non-digit; a value that does
/// not start with a digit yields 0, which the caller treats as an absent
/// body length.
pub fn parse_content_length(input: &[u8]) -> i64 {
    let parsed: IResult<&[u8], (Option<&[u8]>, &[u8])> = pair(opt(tag("-")), digit0)(input);
    match parsed {
        Ok((_, (sign, digits))) => {
            let magnitude = digits.iter().fold(0i64, |acc, &d| {
                acc.saturating_mul(10).saturating_add(i64::from(d - b'0'))
            });
            if sign.is_some() {
                -magnitude
            } else {
                magnitude
            }
        }
        Err(_) => 0,
    }
}

// Tests

#[test]
fn content_length_plain() {
    assert_eq!(7, parse_content_length(b"7"));
    assert_eq!(134, parse_content_length(b"134"));
    assert_eq!(0, parse_content_length(b"0"));
}

#[test]
fn content_length_stops_at_first_non_digit() {
    assert_eq!(12, parse_content_length(b"12ab"));
    assert_eq!(0, parse_content_length(b"abc"));
    assert_eq!(0, parse_content_length(b""));
    assert_eq!(0, parse_content_length(b" 5"));
}

#[test]
fn content_length_negative() {
    assert_eq!(-5, parse_content_length(b"-5"));
}

#[test]
fn content_length_saturates() {
    assert_eq!(
        i64::MAX,
        parse_content_length(b"99999999999999999999999999999999")
    );
}
