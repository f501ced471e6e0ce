//! Parsing SIC/XE assembly source.
//!
//! Parsing happens in two steps:
//! 1. [`tokenize_line`] splits a physical source line into its label, opcode, and operand
//!     columns (a [`RawStmt`]), or recognizes it as a comment or blank line.
//! 2. [`parse_stmt`] looks the opcode up in the [`catalog`] and converts the operand
//!     column into a typed [`Stmt`], using the [`lex`] module to tokenize it.
//!
//! Column conventions:
//! - A line whose first non-blank character is `.` is a comment.
//! - A non-blank first column starts a label.
//! - The operand is the next whitespace-delimited field after the opcode,
//!     except for character constants (`C'A B'`), which may contain spaces.
//!     Anything after the operand is a comment.
//!
//! [`catalog`]: crate::catalog

pub mod lex;

use logos::Logos;

use crate::asm::{AsmConfig, AsmErrKind, Dialect};
use crate::ast::{AddrMode, Directive, Instr, MemOperand, Nibble, Operand, Reg, Stmt, Target};
use crate::catalog::{classify, DirectiveKind, Format, InstrInfo, Mnemonic, OpKind};
use lex::Token;

/// The amount line numbers increase by for each physical line.
pub const LINE_STEP: usize = 5;
/// The maximum length of a symbol name.
pub const MAX_LABEL_LEN: usize = 6;

/// Numbers the physical lines of a source string.
///
/// Line numbers start at [`LINE_STEP`] and increase by [`LINE_STEP`] for every line
/// (including comment and blank lines).
///
/// ```
/// use sicxe_asm::parse::numbered_lines;
///
/// let lines: Vec<_> = numbered_lines("A\n\nB").collect();
/// assert_eq!(lines, [(5, "A"), (10, ""), (15, "B")]);
/// ```
pub fn numbered_lines(src: &str) -> impl Iterator<Item=(usize, &str)> + '_ {
    src.lines()
        .enumerate()
        .map(|(i, line)| ((i + 1) * LINE_STEP, line))
}

/// A source line, split into columns.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum LineKind {
    /// An empty (or whitespace-only) line.
    Blank,
    /// A comment line, kept verbatim.
    Comment(String),
    /// A statement.
    Stmt(RawStmt),
}

/// The raw text columns of a statement.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RawStmt {
    /// The label column, if present.
    pub label: Option<String>,
    /// The opcode column, including any `+` prefix.
    pub opcode: String,
    /// The operand column, if present.
    pub operand: Option<String>,
}
impl RawStmt {
    /// Whether the opcode carries the format 4 `+` prefix.
    pub fn is_extended(&self) -> bool {
        self.opcode.starts_with('+')
    }
    /// The opcode with any `+` prefix removed.
    pub fn mnemonic(&self) -> &str {
        self.opcode.strip_prefix('+').unwrap_or(&self.opcode)
    }
}

/// Splits off the next whitespace-delimited field.
fn next_field(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() { return None; }

    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    Some(s.split_at(end))
}
fn operand_field(s: &str) -> Option<&str> {
    let s = s.trim_start();
    let is_char_lit = s.get(..2).is_some_and(|p| p.eq_ignore_ascii_case("C'"));
    if is_char_lit {
        if let Some(close) = s[2..].find('\'') {
            return Some(&s[..close + 3]);
        }
    }
    next_field(s).map(|(field, _)| field)
}

/// Splits one source line into its columns.
///
/// # Example
/// ```
/// use sicxe_asm::parse::{tokenize_line, LineKind, RawStmt};
///
/// let Ok(LineKind::Stmt(stmt)) = tokenize_line("FIRST  +JSUB  RDREC   read record") else {
///     panic!("line should be a statement");
/// };
/// assert_eq!(stmt.label.as_deref(), Some("FIRST"));
/// assert!(stmt.is_extended());
/// assert_eq!(stmt.mnemonic(), "JSUB");
/// assert_eq!(stmt.operand.as_deref(), Some("RDREC"));
/// ```
pub fn tokenize_line(line: &str) -> Result<LineKind, AsmErrKind> {
    let line = line.trim_end();
    if line.is_empty() {
        return Ok(LineKind::Blank);
    }
    if line.trim_start().starts_with('.') {
        return Ok(LineKind::Comment(line.to_string()));
    }

    let has_label = !line.starts_with(char::is_whitespace);
    let (first, rest) = next_field(line).ok_or(AsmErrKind::MalformedStatement)?;
    let (label, opcode, rest) = match has_label {
        true => {
            let (opcode, rest) = next_field(rest).ok_or(AsmErrKind::MalformedStatement)?;
            (Some(first), opcode, rest)
        },
        false => (None, first, rest),
    };

    Ok(LineKind::Stmt(RawStmt {
        label: label.map(str::to_string),
        opcode: opcode.to_string(),
        operand: operand_field(rest).map(str::to_string),
    }))
}

/// Checks a label is a valid symbol name.
///
/// A symbol starts with a letter, consists of letters and digits,
/// and is at most [`MAX_LABEL_LEN`] characters long.
pub fn validate_label(label: &str) -> Result<(), AsmErrKind> {
    let mut chars = label.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric())
        && label.len() <= MAX_LABEL_LEN;

    match valid {
        true  => Ok(()),
        false => Err(AsmErrKind::InvalidLabel(label.to_string())),
    }
}

fn lex_operand(text: &str) -> Result<Vec<Token>, AsmErrKind> {
    Token::lexer(text)
        .collect::<Result<Vec<_>, _>>()
        .map_err(AsmErrKind::Lex)
}

/// Parses the opcode and operand columns of a statement into a typed [`Stmt`].
///
/// The opcode is first checked against the directive table, then against the operation table.
///
/// # Example
/// ```
/// use sicxe_asm::asm::AsmConfig;
/// use sicxe_asm::ast::{Directive, Stmt};
/// use sicxe_asm::parse::{parse_stmt, RawStmt};
///
/// let raw = RawStmt { label: None, opcode: "RESW".into(), operand: Some("4096".into()) };
/// let stmt = parse_stmt(&raw, &AsmConfig::default()).unwrap();
/// assert_eq!(stmt, Stmt::Directive(Directive::Resw(4096)));
/// ```
pub fn parse_stmt(raw: &RawStmt, config: &AsmConfig) -> Result<Stmt, AsmErrKind> {
    let sic = config.dialect == Dialect::Sic;
    let operand = raw.operand.as_deref();

    match classify(raw.mnemonic()) {
        Some(OpKind::Directive(kind)) => {
            if raw.is_extended() {
                return Err(AsmErrKind::InvalidFormat(raw.opcode.clone()));
            }
            if sic && kind.is_xe_only() {
                return Err(AsmErrKind::SicXeOnly(raw.opcode.clone()));
            }
            parse_directive(kind, operand, config).map(Stmt::Directive)
        },
        Some(OpKind::Instr(info)) => {
            let extended = raw.is_extended();
            if sic && (extended || !info.sic) {
                return Err(AsmErrKind::SicXeOnly(raw.opcode.clone()));
            }
            if extended && info.format != Format::ThreeFour {
                return Err(AsmErrKind::InvalidFormat(raw.opcode.clone()));
            }

            let operand = parse_instr_operand(info, operand, config.dialect)?;
            Ok(Stmt::Instr(Instr { info, extended, operand }))
        },
        None => Err(AsmErrKind::UnknownOpcode(raw.opcode.clone())),
    }
}

/// Parses the operand of `END` or `BASE`.
///
/// Symbols start with a letter. Anything starting with a digit is an address, read in the
/// same radix as the `START` operand (so hex addresses starting with a letter need a leading `0`).
fn parse_target(text: Option<&str>, config: &AsmConfig) -> Result<Target, AsmErrKind> {
    const EXPECTED: &str = "a symbol or address";

    let text = text.ok_or(AsmErrKind::InvalidOperand(EXPECTED))?;
    if text.starts_with(|c: char| c.is_ascii_digit()) {
        return lex::parse_address(text, config.start_radix.value())
            .map(|addr| Target::Number(i64::from(addr)))
            .map_err(AsmErrKind::Lex);
    }
    match lex_operand(text)?.as_slice() {
        [Token::Ident(s)] => Ok(Target::Symbol(s.clone())),
        _ => Err(AsmErrKind::InvalidOperand(EXPECTED)),
    }
}

fn parse_directive(kind: DirectiveKind, operand: Option<&str>, config: &AsmConfig) -> Result<Directive, AsmErrKind> {
    match kind {
        DirectiveKind::Start => {
            let text = operand.ok_or(AsmErrKind::InvalidOperand("a starting address"))?;
            lex::parse_address(text, config.start_radix.value())
                .map(Directive::Start)
                .map_err(AsmErrKind::Lex)
        },
        DirectiveKind::End => match operand {
            Some(text) => parse_target(Some(text), config).map(|t| Directive::End(Some(t))),
            None => Ok(Directive::End(None)),
        },
        DirectiveKind::Byte => {
            let text = operand.ok_or(AsmErrKind::InvalidByteOperand)?;
            let marked = text.get(..2)
                .is_some_and(|p| p.eq_ignore_ascii_case("C'") || p.eq_ignore_ascii_case("X'"));
            if !marked {
                return Err(AsmErrKind::InvalidByteOperand);
            }
            match lex_operand(text)?.as_slice() {
                [Token::CharLit(b) | Token::HexLit(b)] => Ok(Directive::Byte(b.clone())),
                _ => Err(AsmErrKind::InvalidByteOperand),
            }
        },
        DirectiveKind::Word => {
            const EXPECTED: &str = "an integer between -8388608 and 16777215";

            let text = operand.ok_or(AsmErrKind::InvalidOperand(EXPECTED))?;
            let value = match lex_operand(text)?.as_slice() {
                [Token::Unsigned(n)] => i64::from(*n),
                [Token::Signed(n)]   => i64::from(*n),
                _ => return Err(AsmErrKind::InvalidOperand(EXPECTED)),
            };
            match value {
                -0x80_0000..=0xFF_FFFF => i32::try_from(value)
                    .map(Directive::Word)
                    .map_err(|_| AsmErrKind::InvalidOperand(EXPECTED)),
                _ => Err(AsmErrKind::InvalidOperand(EXPECTED)),
            }
        },
        DirectiveKind::Resb | DirectiveKind::Resw => {
            const EXPECTED: &str = "a non-negative decimal count";

            let text = operand.ok_or(AsmErrKind::InvalidOperand(EXPECTED))?;
            let tokens = lex_operand(text)?;
            let [Token::Unsigned(n)] = tokens.as_slice() else {
                return Err(AsmErrKind::InvalidOperand(EXPECTED));
            };
            match kind {
                DirectiveKind::Resb => Ok(Directive::Resb(*n)),
                _ => Ok(Directive::Resw(*n)),
            }
        },
        DirectiveKind::Base => parse_target(operand, config).map(Directive::Base),
        DirectiveKind::Nobase => Ok(Directive::Nobase),
    }
}

fn parse_reg(name: &str) -> Result<Reg, AsmErrKind> {
    name.parse()
        .map_err(|_| AsmErrKind::InvalidOperand("a register (A, X, L, B, S, T, F, PC, SW)"))
}

fn parse_instr_operand(info: InstrInfo, operand: Option<&str>, dialect: Dialect) -> Result<Operand, AsmErrKind> {
    match (info.format, info.operands) {
        (Format::One, _) | (_, 0) => Ok(Operand::None),
        (Format::Two, _) => parse_reg_operand(info, operand),
        (Format::ThreeFour, _) => {
            let text = operand.ok_or(AsmErrKind::InvalidOperand("a memory operand"))?;
            parse_mem_operand(text, dialect).map(Operand::Memory)
        }
    }
}

fn parse_reg_operand(info: InstrInfo, operand: Option<&str>) -> Result<Operand, AsmErrKind> {
    const SVC: &str = "an interrupt number between 0 and 15";
    const SHIFT: &str = "a register and a shift count between 1 and 16";

    let expected = match info.mnemonic {
        Mnemonic::SVC => SVC,
        Mnemonic::SHIFTL | Mnemonic::SHIFTR => SHIFT,
        _ if info.operands == 1 => "a register",
        _ => "two registers",
    };
    let text = operand.ok_or(AsmErrKind::InvalidOperand(expected))?;

    match (info.mnemonic, lex_operand(text)?.as_slice()) {
        (Mnemonic::SVC, [Token::Unsigned(n)]) => Nibble::new(*n)
            .map(Operand::Count)
            .map_err(|_| AsmErrKind::InvalidOperand(SVC)),
        (Mnemonic::SHIFTL | Mnemonic::SHIFTR, [Token::Ident(r), Token::Comma, Token::Unsigned(n)]) => {
            let reg = parse_reg(r)?;
            match u8::try_from(*n) {
                Ok(n @ 1..=16) => Ok(Operand::RegCount(reg, n)),
                _ => Err(AsmErrKind::InvalidOperand(SHIFT)),
            }
        },
        (Mnemonic::SVC | Mnemonic::SHIFTL | Mnemonic::SHIFTR, _) => Err(AsmErrKind::InvalidOperand(expected)),
        (_, [Token::Ident(r)]) if info.operands == 1 => parse_reg(r).map(Operand::Reg),
        (_, [Token::Ident(r1), Token::Comma, Token::Ident(r2)]) if info.operands == 2 => {
            Ok(Operand::RegPair(parse_reg(r1)?, parse_reg(r2)?))
        },
        _ => Err(AsmErrKind::InvalidOperand(expected)),
    }
}

fn parse_mem_operand(text: &str, dialect: Dialect) -> Result<MemOperand, AsmErrKind> {
    let tokens = lex_operand(text)?;

    let (mode, rest) = match tokens.split_first() {
        Some((Token::Hash, rest)) => (AddrMode::Immediate, rest),
        Some((Token::At, rest))   => (AddrMode::Indirect, rest),
        _ => (AddrMode::Simple, &tokens[..]),
    };
    let (target, rest) = match rest.split_first() {
        Some((Token::Ident(s), rest))    => (Target::Symbol(s.clone()), rest),
        Some((Token::Unsigned(n), rest)) => (Target::Number(i64::from(*n)), rest),
        Some((Token::Signed(n), rest))   => (Target::Number(i64::from(*n)), rest),
        _ => return Err(AsmErrKind::InvalidOperand("a symbol or number")),
    };
    let indexed = match rest {
        [] => false,
        [Token::Comma, Token::Ident(x)] if x.eq_ignore_ascii_case("X") => true,
        _ => return Err(AsmErrKind::InvalidOperand("a single operand, optionally indexed with ,X")),
    };

    if indexed && mode != AddrMode::Simple {
        return Err(AsmErrKind::InvalidOperand("simple addressing when indexing with ,X"));
    }
    if dialect == Dialect::Sic && mode != AddrMode::Simple {
        return Err(AsmErrKind::SicXeOnly(text.to_string()));
    }

    Ok(MemOperand { mode, target, indexed })
}
