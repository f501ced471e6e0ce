//! Tokenizing SIC/XE operand fields.
//!
//! The line tokenizer ([`crate::parse`]) splits a source line into its label, opcode, and
//! operand columns. This module handles the operand column, breaking it into [`Token`]s
//! which the parser then assembles into typed operands.
//!
//! The module's key data structure is the [`Token`] enum,
//! which lists all of the tokens that can appear in an operand field.

use std::num::IntErrorKind;

use logos::{Lexer, Logos};

/// A unit of information in an operand field.
#[derive(Debug, Logos, PartialEq, Eq)]
#[logos(skip r"[ \t]+", error = LexErr)]
pub enum Token {
    // These regexes also match tokens that are technically invalid
    // (e.g., 23trst matches as a number). The callbacks reject them.

    /// An unsigned decimal value (e.g., `9`, `4096`)
    #[regex(r"\d\w*", lex_unsigned_dec)]
    Unsigned(u32),

    /// A signed decimal value (e.g., `-9`)
    #[regex(r"-\w*", lex_signed_dec)]
    Signed(i32),

    /// An identifier.
    ///
    /// This can refer to either a symbol (e.g., `BUFFER`, `RETADR`)
    /// or a register (e.g., `A`, `X`, `SW`).
    ///
    /// Identifiers keep their case, since symbols are case-sensitive.
    #[regex(r"[A-Za-z_]\w*", |lx| lx.slice().to_string())]
    Ident(String),

    /// A character constant (e.g., `C'EOF'`), holding its ASCII bytes.
    #[regex(r"[Cc]'", lex_char_literal)]
    CharLit(Vec<u8>),

    /// A hex constant (e.g., `X'F1'`), holding its decoded bytes.
    #[regex(r"[Xx]'", lex_hex_literal)]
    HexLit(Vec<u8>),

    /// `#`, the immediate addressing prefix
    #[token("#")]
    Hash,

    /// `@`, the indirect addressing prefix
    #[token("@")]
    At,

    /// A comma, which separates operands (and the `,X` index suffix)
    #[token(",")]
    Comma,
}

/// Any errors raised in attempting to tokenize an operand field.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
pub enum LexErr {
    /// Unsigned numeric literal cannot fit within the range of a u32
    DoesNotFitU32,
    /// Signed numeric literal cannot fit within the range of an i32
    DoesNotFitI32,
    /// Address literal cannot fit within the range of a u16
    DoesNotFitU16,
    /// Numeric literal could not be parsed because it has invalid digits
    InvalidNumeric,
    /// Numeric literal has no digits in it (it's just `-`)
    InvalidDecEmpty,
    /// Hex constant (`X'..'`) has invalid hex digits
    InvalidHex,
    /// Int parsing failed but the reason why is unknown
    UnknownIntErr,
    /// Character or hex constant is missing its closing quote.
    UnclosedLiteral,
    /// Character or hex constant has nothing between its quotes.
    EmptyLiteral,
    /// Character constant contains a non-ASCII character.
    NonAsciiChar,
    /// A symbol was used which is not allowed in an operand field
    #[default]
    InvalidSymbol
}
impl std::fmt::Display for LexErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexErr::DoesNotFitU32   => f.write_str("numeric token does not fit 32-bit unsigned integer"),
            LexErr::DoesNotFitI32   => f.write_str("numeric token does not fit 32-bit signed integer"),
            LexErr::DoesNotFitU16   => f.write_str("address does not fit 16-bit unsigned integer"),
            LexErr::InvalidNumeric  => f.write_str("invalid numeric literal"),
            LexErr::InvalidDecEmpty => f.write_str("invalid decimal literal"),
            LexErr::InvalidHex      => f.write_str("invalid hex constant"),
            LexErr::UnknownIntErr   => f.write_str("could not parse integer"),
            LexErr::UnclosedLiteral => f.write_str("unclosed constant"),
            LexErr::EmptyLiteral    => f.write_str("empty constant"),
            LexErr::NonAsciiChar    => f.write_str("character constant is not ASCII"),
            LexErr::InvalidSymbol   => f.write_str("unrecognized symbol"),
        }
    }
}
impl std::error::Error for LexErr {}
impl crate::err::Error for LexErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self {
            LexErr::DoesNotFitU32   => Some(format!("the range for a 32-bit unsigned integer is [{}, {}]", u32::MIN, u32::MAX).into()),
            LexErr::DoesNotFitI32   => Some(format!("the range for a 32-bit signed integer is [{}, {}]", i32::MIN, i32::MAX).into()),
            LexErr::DoesNotFitU16   => Some("addresses are limited to [0, FFFF]".into()),
            LexErr::InvalidNumeric  => Some("a numeric literal only consists of digits 0-9 (or 0-F for hex)".into()),
            LexErr::InvalidDecEmpty => Some("there should be digits (0-9) here".into()),
            LexErr::InvalidHex      => Some("a hex constant consists of 0-9, A-F".into()),
            LexErr::UnknownIntErr   => None,
            LexErr::UnclosedLiteral => Some("add a ' to the end of the constant".into()),
            LexErr::EmptyLiteral    => Some("a constant must contain at least one character or hex digit".into()),
            LexErr::NonAsciiChar    => Some("character constants are encoded as ASCII".into()),
            LexErr::InvalidSymbol   => Some("this char does not occur in any token of a SIC/XE operand".into()),
        }
    }
}

/// Helper that converts an int error kind to its corresponding LexErr, based on the provided inputs.
fn convert_int_error(
    e: &IntErrorKind,
    empty_err: LexErr,
    overflow_err: LexErr,
    src: &str
) -> LexErr {
    match e {
        IntErrorKind::Empty        => empty_err,
        IntErrorKind::InvalidDigit if src == "-" => empty_err,
        IntErrorKind::InvalidDigit => LexErr::InvalidNumeric,
        IntErrorKind::PosOverflow  => overflow_err,
        IntErrorKind::NegOverflow  => overflow_err,
        _ => LexErr::UnknownIntErr,
    }
}
fn lex_unsigned_dec(lx: &Lexer<'_, Token>) -> Result<u32, LexErr> {
    let string = lx.slice();
    string.parse::<u32>()
        .map_err(|e| convert_int_error(e.kind(), LexErr::InvalidDecEmpty, LexErr::DoesNotFitU32, string))
}
fn lex_signed_dec(lx: &Lexer<'_, Token>) -> Result<i32, LexErr> {
    let string = lx.slice();
    string.parse::<i32>()
        .map_err(|e| convert_int_error(e.kind(), LexErr::InvalidDecEmpty, LexErr::DoesNotFitI32, string))
}

/// Parses an address (such as the `START` operand) in the given radix.
///
/// Addresses are unsigned, so a leading `+` or `-` is rejected.
pub(crate) fn parse_address(src: &str, radix: u32) -> Result<u16, LexErr> {
    if src.starts_with(['+', '-']) {
        return Err(LexErr::InvalidNumeric);
    }
    u16::from_str_radix(src, radix)
        .map_err(|e| convert_int_error(e.kind(), LexErr::InvalidDecEmpty, LexErr::DoesNotFitU16, src))
}

/// Consumes the rest of a quoted constant (up to and including the closing quote),
/// returning the text between the quotes.
fn lex_quoted<'s>(lx: &mut Lexer<'s, Token>) -> Result<&'s str, LexErr> {
    let rem = lx.remainder();
    match rem.find('\'') {
        Some(0) => {
            lx.bump(1);
            Err(LexErr::EmptyLiteral)
        },
        Some(len) => {
            lx.bump(len + 1);
            Ok(&rem[..len])
        },
        None => {
            lx.bump(rem.len());
            Err(LexErr::UnclosedLiteral)
        }
    }
}
fn lex_char_literal(lx: &mut Lexer<'_, Token>) -> Result<Vec<u8>, LexErr> {
    let text = lex_quoted(lx)?;
    match text.is_ascii() {
        true  => Ok(text.as_bytes().to_vec()),
        false => Err(LexErr::NonAsciiChar),
    }
}
fn lex_hex_literal(lx: &mut Lexer<'_, Token>) -> Result<Vec<u8>, LexErr> {
    let text = lex_quoted(lx)?;
    if !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(LexErr::InvalidHex);
    }

    // An odd number of digits is padded with a leading 0 nibble.
    let padded = match text.len() % 2 {
        0 => text.to_string(),
        _ => format!("0{text}"),
    };
    padded.as_bytes()
        .chunks(2)
        .map(|pair| {
            std::str::from_utf8(pair).ok()
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .ok_or(LexErr::InvalidHex)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use logos::Logos;

    use crate::err::LexErr;
    use crate::parse::lex::Token;

    fn ident(s: &str) -> Token {
        Token::Ident(s.to_string())
    }

    #[test]
    fn test_numeric_success() {
        let mut tokens = Token::lexer("0 123 4096 1048575");
        assert_eq!(tokens.next(), Some(Ok(Token::Unsigned(0))));
        assert_eq!(tokens.next(), Some(Ok(Token::Unsigned(123))));
        assert_eq!(tokens.next(), Some(Ok(Token::Unsigned(4096))));
        assert_eq!(tokens.next(), Some(Ok(Token::Unsigned(1048575))));
        assert_eq!(tokens.next(), None);

        let mut tokens = Token::lexer("-1 -8388608");
        assert_eq!(tokens.next(), Some(Ok(Token::Signed(-1))));
        assert_eq!(tokens.next(), Some(Ok(Token::Signed(-8388608))));
        assert_eq!(tokens.next(), None);
    }

    #[test]
    fn test_numeric_invalid() {
        assert_eq!(Token::lexer("3Q").next(), Some(Err(LexErr::InvalidNumeric)));
        assert_eq!(Token::lexer("-").next(), Some(Err(LexErr::InvalidDecEmpty)));
        assert_eq!(Token::lexer("4294967296").next(), Some(Err(LexErr::DoesNotFitU32)));
        assert_eq!(Token::lexer("-2147483649").next(), Some(Err(LexErr::DoesNotFitI32)));
    }

    #[test]
    fn test_address() {
        use super::parse_address;

        assert_eq!(parse_address("1000", 16), Ok(0x1000));
        assert_eq!(parse_address("4b0", 16), Ok(0x4B0));
        assert_eq!(parse_address("1000", 10), Ok(1000));
        assert_eq!(parse_address("FFFF", 16), Ok(0xFFFF));
        assert_eq!(parse_address("10000", 16), Err(LexErr::DoesNotFitU16));
        assert_eq!(parse_address("4B0", 10), Err(LexErr::InvalidNumeric));
        assert_eq!(parse_address("", 16), Err(LexErr::InvalidDecEmpty));
        assert_eq!(parse_address("+100", 16), Err(LexErr::InvalidNumeric));
        assert_eq!(parse_address("-100", 10), Err(LexErr::InvalidNumeric));
        assert_eq!(parse_address("+", 16), Err(LexErr::InvalidNumeric));
    }

    #[test]
    fn test_memory_operands() {
        let tokens: Result<Vec<_>, _> = Token::lexer("BUFFER,X").collect();
        assert_eq!(tokens, Ok(vec![ident("BUFFER"), Token::Comma, ident("X")]));

        let tokens: Result<Vec<_>, _> = Token::lexer("#LENGTH").collect();
        assert_eq!(tokens, Ok(vec![Token::Hash, ident("LENGTH")]));

        let tokens: Result<Vec<_>, _> = Token::lexer("@RETADR").collect();
        assert_eq!(tokens, Ok(vec![Token::At, ident("RETADR")]));

        let tokens: Result<Vec<_>, _> = Token::lexer("#4096").collect();
        assert_eq!(tokens, Ok(vec![Token::Hash, Token::Unsigned(4096)]));

        let tokens: Result<Vec<_>, _> = Token::lexer("A,S").collect();
        assert_eq!(tokens, Ok(vec![ident("A"), Token::Comma, ident("S")]));
    }

    #[test]
    fn test_char_literal() {
        let mut tokens = Token::lexer("C'EOF'");
        assert_eq!(tokens.next(), Some(Ok(Token::CharLit(b"EOF".to_vec()))));
        assert_eq!(tokens.next(), None);

        // spaces are part of the constant
        let mut tokens = Token::lexer("c'A B'");
        assert_eq!(tokens.next(), Some(Ok(Token::CharLit(b"A B".to_vec()))));
        assert_eq!(tokens.next(), None);

        assert_eq!(Token::lexer("C'EOF").next(), Some(Err(LexErr::UnclosedLiteral)));
        assert_eq!(Token::lexer("C''").next(), Some(Err(LexErr::EmptyLiteral)));
        assert_eq!(Token::lexer("C'é'").next(), Some(Err(LexErr::NonAsciiChar)));

        // identifiers beginning with C are still identifiers
        assert_eq!(Token::lexer("CLOOP").next(), Some(Ok(ident("CLOOP"))));
    }

    #[test]
    fn test_hex_literal() {
        let mut tokens = Token::lexer("X'F1' x'05' X'ABCDEF'");
        assert_eq!(tokens.next(), Some(Ok(Token::HexLit(vec![0xF1]))));
        assert_eq!(tokens.next(), Some(Ok(Token::HexLit(vec![0x05]))));
        assert_eq!(tokens.next(), Some(Ok(Token::HexLit(vec![0xAB, 0xCD, 0xEF]))));
        assert_eq!(tokens.next(), None);

        // odd digit counts are left-padded
        assert_eq!(Token::lexer("X'F'").next(), Some(Ok(Token::HexLit(vec![0x0F]))));
        assert_eq!(Token::lexer("X'ABC'").next(), Some(Ok(Token::HexLit(vec![0x0A, 0xBC]))));

        assert_eq!(Token::lexer("X'FG'").next(), Some(Err(LexErr::InvalidHex)));
        assert_eq!(Token::lexer("X'F1").next(), Some(Err(LexErr::UnclosedLiteral)));
        assert_eq!(Token::lexer("X''").next(), Some(Err(LexErr::EmptyLiteral)));

        assert_eq!(Token::lexer("XLOOP").next(), Some(Ok(ident("XLOOP"))));
    }

    #[test]
    fn test_invalid_symbol() {
        for c in ["$", "%", "&", "*", "(", ")", "+", "=", "[", "]", ";", "\"", "'"] {
            assert_eq!(
                Token::lexer(c).next(),
                Some(Err(LexErr::InvalidSymbol)),
                "Expected {c:?} to be an invalid symbol"
            );
        }
    }
}
