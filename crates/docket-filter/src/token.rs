//! Lexer for the filter language.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use docket_core::Value;

use crate::error::{FilterError, Result};

/// A lexical token plus its character offset in the input.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub position: usize,
    pub token: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Not,
    In,
    Contains,
    /// A literal value: bool, null, number, string or temporal.
    Literal(Value),
    /// A column reference.
    Ident(String),
}

/// Splits the filter text into tokens.
///
/// Keywords (`AND`, `OR`, `NOT`, `IN`, `CONTAINS`, `TRUE`, `FALSE`, `NULL`)
/// are case-insensitive. Unquoted temporal literals are recognised here so
/// the parser only ever sees typed values.
pub(crate) fn tokenize(input: &str) -> Result<Vec<Spanned>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        let start = pos;
        match c {
            c if c.is_whitespace() => {
                pos += 1;
            }
            '(' => {
                tokens.push(Spanned { position: start, token: Token::LParen });
                pos += 1;
            }
            ')' => {
                tokens.push(Spanned { position: start, token: Token::RParen });
                pos += 1;
            }
            '[' => {
                tokens.push(Spanned { position: start, token: Token::LBracket });
                pos += 1;
            }
            ']' => {
                tokens.push(Spanned { position: start, token: Token::RBracket });
                pos += 1;
            }
            ',' => {
                tokens.push(Spanned { position: start, token: Token::Comma });
                pos += 1;
            }
            '=' => {
                if chars.get(pos + 1) == Some(&'=') {
                    tokens.push(Spanned { position: start, token: Token::Eq });
                    pos += 2;
                } else {
                    return Err(FilterError::parse(start, "expected '=='"));
                }
            }
            '!' => {
                if chars.get(pos + 1) == Some(&'=') {
                    tokens.push(Spanned { position: start, token: Token::Ne });
                    pos += 2;
                } else {
                    return Err(FilterError::parse(start, "expected '!='"));
                }
            }
            '<' => {
                if chars.get(pos + 1) == Some(&'=') {
                    tokens.push(Spanned { position: start, token: Token::Le });
                    pos += 2;
                } else {
                    tokens.push(Spanned { position: start, token: Token::Lt });
                    pos += 1;
                }
            }
            '>' => {
                if chars.get(pos + 1) == Some(&'=') {
                    tokens.push(Spanned { position: start, token: Token::Ge });
                    pos += 2;
                } else {
                    tokens.push(Spanned { position: start, token: Token::Gt });
                    pos += 1;
                }
            }
            '"' => {
                let (s, next) = scan_string(&chars, pos)?;
                tokens.push(Spanned { position: start, token: Token::Literal(Value::String(s)) });
                pos = next;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = pos;
                while end < chars.len()
                    && (chars[end].is_ascii_alphanumeric() || chars[end] == '_')
                {
                    end += 1;
                }
                let word: String = chars[pos..end].iter().collect();
                tokens.push(Spanned { position: start, token: classify_word(word) });
                pos = end;
            }
            c if c.is_ascii_digit()
                || ((c == '+' || c == '-')
                    && chars.get(pos + 1).is_some_and(char::is_ascii_digit)) =>
            {
                let mut end = pos + 1;
                while end < chars.len() && is_number_char(chars[end]) {
                    end += 1;
                }
                let blob: String = chars[pos..end].iter().collect();
                let value = classify_number(&blob)
                    .ok_or_else(|| FilterError::parse(start, format!("invalid literal: {blob}")))?;
                tokens.push(Spanned { position: start, token: Token::Literal(value) });
                pos = end;
            }
            other => {
                return Err(FilterError::parse(start, format!("unexpected character {other:?}")));
            }
        }
    }

    Ok(tokens)
}

/// Characters that may continue a numeric or temporal literal.
fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '.' | ':' | '-' | '+' | 'T' | 'e' | 'E')
}

fn scan_string(chars: &[char], open: usize) -> Result<(String, usize)> {
    let mut out = String::new();
    let mut pos = open + 1;
    while pos < chars.len() {
        match chars[pos] {
            '"' => return Ok((out, pos + 1)),
            '\\' if chars.get(pos + 1) == Some(&'"') => {
                out.push('"');
                pos += 2;
            }
            c => {
                out.push(c);
                pos += 1;
            }
        }
    }
    Err(FilterError::parse(open, "unterminated string literal"))
}

fn classify_word(word: String) -> Token {
    if word.eq_ignore_ascii_case("and") {
        Token::And
    } else if word.eq_ignore_ascii_case("or") {
        Token::Or
    } else if word.eq_ignore_ascii_case("not") {
        Token::Not
    } else if word.eq_ignore_ascii_case("in") {
        Token::In
    } else if word.eq_ignore_ascii_case("contains") {
        Token::Contains
    } else if word.eq_ignore_ascii_case("true") {
        Token::Literal(Value::Boolean(true))
    } else if word.eq_ignore_ascii_case("false") {
        Token::Literal(Value::Boolean(false))
    } else if word.eq_ignore_ascii_case("null") {
        Token::Literal(Value::Null)
    } else {
        Token::Ident(word)
    }
}

/// Classifies a digit-led blob as integer, temporal or float.
fn classify_number(blob: &str) -> Option<Value> {
    if let Ok(i) = blob.parse::<i64>() {
        return Some(Value::Integer(i));
    }
    if let Some((date, time)) = blob.split_once('T') {
        let date = try_parse_date(date)?;
        let time = parse_time(time)?;
        return Some(Value::DateTime(NaiveDateTime::new(date, time)));
    }
    if blob.contains(':') {
        return parse_time(blob).map(Value::Time);
    }
    if let Some(date) = try_parse_date(blob) {
        return Some(Value::Date(date));
    }
    blob.parse::<f64>().ok().map(Value::Float)
}

fn try_parse_date(s: &str) -> Option<NaiveDate> {
    let mut parts = s.split('-');
    let (y, m, d) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() || y.len() != 4 {
        return None;
    }
    parse_date_parts(y, m, d)
}

fn parse_date_parts(y: &str, m: &str, d: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(
        y.parse().ok()?,
        m.parse().ok()?,
        d.parse().ok()?,
    )
}

/// Parses `H:M`, `H:M:S` or `H:M:S.ffffff`.
///
/// Fractional seconds are right-zero-padded to six digits, so `.789` means
/// 789000 microseconds. This mirrors the behavior callers have depended on
/// historically and is part of the language contract.
fn parse_time(s: &str) -> Option<NaiveTime> {
    let mut parts = s.split(':');
    let hour: u32 = parts.next()?.parse().ok()?;
    let minute: u32 = parts.next()?.parse().ok()?;
    let (second, micros) = match parts.next() {
        None => (0, 0),
        Some(sec) => {
            if parts.next().is_some() {
                return None;
            }
            match sec.split_once('.') {
                None => (sec.parse().ok()?, 0),
                Some((whole, frac)) => {
                    if frac.is_empty() || frac.len() > 6 || !frac.bytes().all(|b| b.is_ascii_digit())
                    {
                        return None;
                    }
                    let padded = format!("{frac:0<6}");
                    (whole.parse().ok()?, padded.parse().ok()?)
                }
            }
        }
    };
    NaiveTime::from_hms_micro_opt(hour, minute, second, micros)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn single_literal(input: &str) -> Value {
        let tokens = tokenize(input).unwrap();
        assert_eq!(tokens.len(), 1, "expected one token for {input:?}");
        match &tokens[0].token {
            Token::Literal(v) => v.clone(),
            other => panic!("expected literal for {input:?}, got {other:?}"),
        }
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(single_literal("True"), Value::Boolean(true));
        assert_eq!(single_literal("TRUE"), Value::Boolean(true));
        assert_eq!(single_literal("false"), Value::Boolean(false));
        assert_eq!(single_literal("Null"), Value::Null);
        let tokens = tokenize("a In b oR c").unwrap();
        assert!(matches!(tokens[1].token, Token::In));
        assert!(matches!(tokens[3].token, Token::Or));
    }

    #[test]
    fn numbers() {
        assert_eq!(single_literal("0"), Value::Integer(0));
        assert_eq!(
            single_literal("123456789101112"),
            Value::Integer(123_456_789_101_112)
        );
        assert_eq!(single_literal("-45"), Value::Integer(-45));
        assert_eq!(single_literal("-46.8"), Value::Float(-46.8));
        assert_eq!(
            single_literal("1.5654353456363e-15"),
            Value::Float(1.565_435_345_636_3e-15)
        );
    }

    #[test]
    fn strings() {
        assert_eq!(single_literal(r#""""#), Value::from(""));
        assert_eq!(single_literal(r#""2018-05-25""#), Value::from("2018-05-25"));
        assert_eq!(single_literal("\"a\n b\n  c\""), Value::from("a\n b\n  c"));
        assert_eq!(single_literal(r#""\"""#), Value::from("\""));
    }

    #[test]
    fn dates() {
        assert_eq!(
            single_literal("2018-05-25"),
            Value::Date(NaiveDate::from_ymd_opt(2018, 5, 25).unwrap())
        );
        assert_eq!(
            single_literal("2018-5-25"),
            Value::Date(NaiveDate::from_ymd_opt(2018, 5, 25).unwrap())
        );
    }

    #[test]
    fn times_pad_fractional_seconds_to_the_right() {
        assert_eq!(
            single_literal("12:54"),
            Value::Time(NaiveTime::from_hms_opt(12, 54, 0).unwrap())
        );
        assert_eq!(
            single_literal("02:4:9"),
            Value::Time(NaiveTime::from_hms_opt(2, 4, 9).unwrap())
        );
        assert_eq!(
            single_literal("12:34:56.789"),
            Value::Time(NaiveTime::from_hms_micro_opt(12, 34, 56, 789_000).unwrap())
        );
        assert_eq!(
            single_literal("12:34:56.000789"),
            Value::Time(NaiveTime::from_hms_micro_opt(12, 34, 56, 789).unwrap())
        );
    }

    #[test]
    fn datetimes() {
        assert_eq!(
            single_literal("2018-05-25T12:34:56.000789"),
            Value::DateTime(
                NaiveDate::from_ymd_opt(2018, 5, 25)
                    .unwrap()
                    .and_hms_micro_opt(12, 34, 56, 789)
                    .unwrap()
            )
        );
        assert_eq!(
            single_literal("2018-5-25T12:34"),
            Value::DateTime(
                NaiveDate::from_ymd_opt(2018, 5, 25)
                    .unwrap()
                    .and_hms_opt(12, 34, 0)
                    .unwrap()
            )
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(tokenize("12:99").is_err());
        assert!(tokenize("2018-13-01x").is_err());
        assert!(tokenize("\"unterminated").is_err());
        assert!(tokenize("a = b").is_err());
        assert!(tokenize("a ! b").is_err());
        assert!(tokenize("#").is_err());
    }
}
