//! Assembling SIC/XE source into a listing and an object program.
//!
//! Assembly happens in two passes:
//! 1. [`Intermediate::new`] (pass 1) walks the source, assigns every statement its address,
//!     and builds the [`SymbolTable`].
//! 2. [`codegen::generate`] (pass 2) encodes each statement using the finished symbol table,
//!     producing the [`Listing`] and the [`ObjectProgram`].
//!
//! [`assemble`] runs both passes. Pass 2 never starts until pass 1 has completed,
//! so every forward reference is resolvable by the time it is encoded.
//!
//! [`Listing`]: listing::Listing
//! [`ObjectProgram`]: encoding::ObjectProgram

pub mod codegen;
pub mod encoding;
pub mod listing;

use indexmap::map::Entry;
use indexmap::IndexMap;
use tracing::{event, Level};

use crate::ast::{Directive, Instr, Operand, Stmt, Target};
use crate::err::{LexErr, Location, Pass};
use crate::parse::{numbered_lines, parse_stmt, tokenize_line, validate_label, LineKind};

use encoding::ObjectProgram;
use listing::Listing;

/// One past the last addressable byte.
const MEM_END: u32 = 0x10000;

/// Assembles SIC/XE source code.
///
/// This runs both assembler passes, stopping at the first error.
///
/// # Example
/// ```
/// use sicxe_asm::asm::{assemble, AsmConfig};
///
/// let src = "
/// COPY   START  1000
/// FIRST  LDA    ALPHA
///        STA    BETA
/// ALPHA  WORD   5
/// BETA   RESW   1
///        END    FIRST
/// ";
/// let asm = assemble(src, &AsmConfig::default()).unwrap();
/// assert_eq!(asm.symbols.lookup("ALPHA"), Some(0x1006));
/// assert_eq!(asm.object.to_string(), "\
/// HCOPY  00100000000C
/// T001000090320030F2003000005
/// E001000
/// ");
/// ```
pub fn assemble(src: &str, config: &AsmConfig) -> Result<Assembly, AsmErr> {
    let ir = Intermediate::new(src, config)?;
    codegen::generate(ir, config)
}

/// The outputs of a successful assembly.
#[derive(Debug, Clone)]
pub struct Assembly {
    /// The symbol table, in definition order.
    pub symbols: SymbolTable,
    /// The program listing.
    pub listing: Listing,
    /// The object program (H/T/E records).
    pub object: ObjectProgram,
}

/// The instruction set the assembler targets.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
pub enum Dialect {
    /// SIC/XE: formats 1 through 4 and all addressing modes.
    #[default]
    SicXe,
    /// Plain SIC: 3-byte instructions with a 15-bit address and an index bit.
    Sic,
}

/// The radix an address is written in.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
pub enum Radix {
    /// Base 16.
    #[default]
    Hex,
    /// Base 10.
    Decimal,
}
impl Radix {
    /// The numeric base of this radix.
    pub fn value(self) -> u32 {
        match self {
            Radix::Hex     => 16,
            Radix::Decimal => 10,
        }
    }
}

/// Configuration flags for [`assemble`].
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct AsmConfig {
    /// The instruction set to assemble for.
    ///
    /// By default, this is [`Dialect::SicXe`].
    pub dialect: Dialect,

    /// The radix addresses are written in
    /// (the `START` operand and numeric `END` and `BASE` operands).
    ///
    /// By default, this is [`Radix::Hex`].
    pub start_radix: Radix,
}
impl Default for AsmConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::SicXe,
            start_radix: Radix::Hex,
        }
    }
}

/// Kinds of errors that can occur from assembling given assembly code.
///
/// See [`AsmErr`] for this error type with location information included.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum AsmErrKind {
    /// A line has a label but no opcode (pass 1).
    MalformedStatement,
    /// A symbol was defined more than once (pass 1).
    DuplicateSymbol(String),
    /// An opcode is neither a directive nor an instruction (pass 1).
    UnknownOpcode(String),
    /// An opcode cannot be encoded in the requested format, such as `+` on a format 2 instruction (pass 1).
    InvalidFormat(String),
    /// A `BYTE` operand is not a `C'..'` or `X'..'` constant (pass 1).
    InvalidByteOperand,
    /// An operand references a symbol that is never defined (pass 2).
    UndefinedSymbol(String),
    /// An immediate value does not fit its field (pass 2).
    ImmediateOutOfRange(i64),
    /// An address cannot be reached by any addressing mode (pass 2).
    AddressingRange(String),
    /// The first statement is not `START` (pass 1).
    MissingStart,
    /// `START` appears after the first statement (pass 1).
    MisplacedStart,
    /// A label is not a valid symbol name (pass 1).
    InvalidLabel(String),
    /// An operand has the wrong shape for its opcode (pass 1).
    InvalidOperand(&'static str),
    /// An operand could not be tokenized (pass 1).
    Lex(LexErr),
    /// The location counter passed the end of memory (pass 1).
    LocationOverflow,
    /// SIC/XE syntax was used while assembling plain SIC (pass 1).
    SicXeOnly(String),
}
impl std::fmt::Display for AsmErrKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedStatement     => f.write_str("malformed statement"),
            Self::DuplicateSymbol(s)     => write!(f, "duplicate symbol '{s}'"),
            Self::UnknownOpcode(s)       => write!(f, "unknown opcode '{s}'"),
            Self::InvalidFormat(s)       => write!(f, "invalid instruction format for '{s}'"),
            Self::InvalidByteOperand     => f.write_str("invalid BYTE operand"),
            Self::UndefinedSymbol(s)     => write!(f, "undefined symbol '{s}'"),
            Self::ImmediateOutOfRange(n) => write!(f, "immediate value {n} is out of range"),
            Self::AddressingRange(s)     => write!(f, "address of '{s}' is out of range"),
            Self::MissingStart           => f.write_str("program does not begin with START"),
            Self::MisplacedStart         => f.write_str("START must be the first statement"),
            Self::InvalidLabel(s)        => write!(f, "invalid label '{s}'"),
            Self::InvalidOperand(exp)    => write!(f, "invalid operand, expected {exp}"),
            Self::Lex(e)                 => e.fmt(f),
            Self::LocationOverflow       => f.write_str("program runs past the end of memory"),
            Self::SicXeOnly(s)           => write!(f, "'{s}' is only available in SIC/XE"),
        }
    }
}

/// Error from assembling given assembly code.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct AsmErr {
    /// The kind of error.
    pub kind: AsmErrKind,
    /// The pass and line the error was detected at.
    pub loc: Location,
}
impl AsmErr {
    /// Creates a new [`AsmErr`].
    pub fn new(kind: AsmErrKind, pass: Pass, line: usize) -> Self {
        AsmErr { kind, loc: Location { pass, line } }
    }
}
impl std::fmt::Display for AsmErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.kind.fmt(f)
    }
}
impl std::error::Error for AsmErr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            AsmErrKind::Lex(e) => Some(e),
            _ => None
        }
    }
}
impl crate::err::Error for AsmErr {
    fn location(&self) -> Option<Location> {
        Some(self.loc)
    }

    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match &self.kind {
            AsmErrKind::MalformedStatement     => Some("a line starting in the first column needs a label followed by an opcode".into()),
            AsmErrKind::DuplicateSymbol(_)     => Some("symbols must be unique within a program, try renaming one of the labels".into()),
            AsmErrKind::UnknownOpcode(_)       => Some("check the spelling, or indent the line if the first field is not meant to be a label".into()),
            AsmErrKind::InvalidFormat(_)       => Some("only format 3 instructions can be extended to format 4 with +".into()),
            AsmErrKind::InvalidByteOperand     => Some("BYTE takes a character constant (C'EOF') or a hex constant (X'F1')".into()),
            AsmErrKind::UndefinedSymbol(_)     => Some("define this symbol as a label somewhere in the program".into()),
            AsmErrKind::ImmediateOutOfRange(_) => Some("format 3 immediates are limited to [0, 4095], format 4 (+) immediates to [0, 1048575]".into()),
            AsmErrKind::AddressingRange(_)     => Some("try a BASE directive near this instruction, or use format 4 (+)".into()),
            AsmErrKind::MissingStart           => Some("begin the program with a statement like `PROG START 0`".into()),
            AsmErrKind::MisplacedStart         => Some("a program can only have one START, at its beginning".into()),
            AsmErrKind::InvalidLabel(_)        => Some(format!("symbols start with a letter, consist of letters and digits, and are at most {} characters", crate::parse::MAX_LABEL_LEN).into()),
            AsmErrKind::InvalidOperand(_)      => None,
            AsmErrKind::Lex(e)                 => crate::err::Error::help(e),
            AsmErrKind::LocationOverflow       => Some("the program (including RESB/RESW reservations) must fit below address 10000".into()),
            AsmErrKind::SicXeOnly(_)           => Some("remove the SIC/XE syntax, or assemble without --sic".into()),
        }
    }
}

/// The symbol table.
///
/// This maps each label defined in a program to its address.
/// Symbols are case-sensitive, unique, and iterate in the order they were defined.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct SymbolTable {
    symbols: IndexMap<String, u16>,
}
impl SymbolTable {
    /// Creates an empty symbol table.
    pub fn new() -> Self {
        Default::default()
    }

    /// Defines a new symbol, failing if it is already defined.
    pub fn define(&mut self, name: &str, addr: u16) -> Result<(), AsmErrKind> {
        match self.symbols.entry(name.to_string()) {
            Entry::Occupied(e) => Err(AsmErrKind::DuplicateSymbol(e.key().clone())),
            Entry::Vacant(e) => {
                e.insert(addr);
                Ok(())
            }
        }
    }

    /// Gets the address of a given symbol (if it exists).
    ///
    /// ## Example
    /// ```
    /// use sicxe_asm::asm::SymbolTable;
    ///
    /// let mut sym = SymbolTable::new();
    /// sym.define("LOOP", 0x1003).unwrap();
    /// assert_eq!(sym.lookup("LOOP"), Some(0x1003));
    /// assert_eq!(sym.lookup("loop"), None);
    /// ```
    pub fn lookup(&self, name: &str) -> Option<u16> {
        self.symbols.get(name).copied()
    }

    /// Iterates over every symbol and its address, in definition order.
    pub fn iter(&self) -> impl Iterator<Item=(&str, u16)> + '_ {
        self.symbols.iter().map(|(name, &addr)| (name.as_str(), addr))
    }

    /// The number of symbols in the table.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether the table has no symbols.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// A statement with its address resolved by pass 1.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ResolvedStmt {
    /// The line number.
    pub line: usize,
    /// The location counter at the start of this statement.
    ///
    /// This is at most `FFFF` for any statement with a label or object code.
    /// Only a trailing statement that occupies no memory (such as `END`) can sit at `10000`.
    pub addr: u32,
    /// The location counter at the start of the next statement.
    pub next: u32,
    /// The label column as written.
    pub label: Option<String>,
    /// The opcode column as written (including any `+`).
    pub opcode: String,
    /// The operand column as written (`None` for statements that take no operand).
    pub operand: Option<String>,
    /// The parsed statement.
    pub stmt: Stmt,
}

/// A line of pass 1's output.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum IrLine {
    /// A comment line, passed through verbatim.
    Comment {
        /// The line number.
        line: usize,
        /// The text of the comment line.
        text: String,
    },
    /// A statement.
    Stmt(ResolvedStmt),
}

/// The result of pass 1: every statement with its address, plus the complete symbol table.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Intermediate {
    /// The program name (the label of `START`).
    pub name: String,
    /// The starting address (the operand of `START`).
    pub start: u16,
    /// The location counter after the last statement (at most `10000`).
    pub end: u32,
    /// The symbol table.
    pub symbols: SymbolTable,
    /// Every comment and statement up to (and including) `END`.
    pub lines: Vec<IrLine>,
    length: u16,
}

impl Intermediate {
    /// Performs the first assembler pass.
    ///
    /// This computes the address of every statement and defines every label in the symbol table.
    /// Statements after `END` are not processed.
    ///
    /// ## Example
    /// ```
    /// use sicxe_asm::asm::{AsmConfig, Intermediate};
    ///
    /// let src = "
    /// PROG   START  0
    /// LOOP   +JSUB  RDREC
    ///        CLEAR  X
    /// BUF    RESB   4096
    /// ";
    /// let ir = Intermediate::new(src, &AsmConfig::default()).unwrap();
    /// assert_eq!(ir.symbols.lookup("PROG"), Some(0x0000));
    /// assert_eq!(ir.symbols.lookup("LOOP"), Some(0x0000));
    /// assert_eq!(ir.symbols.lookup("BUF"), Some(0x0006));
    /// assert_eq!(ir.length(), 0x1006);
    /// ```
    pub fn new(src: &str, config: &AsmConfig) -> Result<Self, AsmErr> {
        struct Cursor {
            // The current location counter.
            // This can reach MEM_END once the last byte of memory is used.
            lc: u32,
        }
        impl Cursor {
            /// The address of the current statement,
            /// failing if it starts past the end of memory.
            fn addr(&self) -> Result<u16, AsmErrKind> {
                u16::try_from(self.lc).map_err(|_| AsmErrKind::LocationOverflow)
            }

            /// Attempts to shift the LC forward by n bytes,
            /// failing if that would pass the end of memory.
            fn shift(&mut self, n: u32) -> Result<(), AsmErrKind> {
                let new_lc = self.lc.checked_add(n)
                    .filter(|&lc| lc <= MEM_END)
                    .ok_or(AsmErrKind::LocationOverflow)?;

                self.lc = new_lc;
                Ok(())
            }
        }

        let mut cursor: Option<Cursor> = None;
        let mut name = String::new();
        let mut start = 0;
        let mut symbols = SymbolTable::new();
        let mut lines = vec![];
        let mut last_line = 0;
        let mut ended = false;

        for (line_no, text) in numbered_lines(src) {
            let err = |kind| AsmErr::new(kind, Pass::One, line_no);
            last_line = line_no;

            let raw = match tokenize_line(text).map_err(err)? {
                LineKind::Blank => continue,
                LineKind::Comment(text) => {
                    lines.push(IrLine::Comment { line: line_no, text });
                    continue;
                },
                LineKind::Stmt(raw) => raw,
            };
            if let Some(label) = &raw.label {
                validate_label(label).map_err(err)?;
            }
            let stmt = parse_stmt(&raw, config).map_err(err)?;

            // START opens the program. Nothing can come before it.
            if let Stmt::Directive(Directive::Start(addr)) = stmt {
                if cursor.is_some() {
                    return Err(err(AsmErrKind::MisplacedStart));
                }
                name = raw.label.clone().unwrap_or_default();
                start = addr;
                cursor.replace(Cursor { lc: u32::from(addr) });
                event!(Level::DEBUG, "program {name:?} starts at {addr:04X}");
            }
            let Some(cur) = cursor.as_mut() else {
                return Err(err(AsmErrKind::MissingStart));
            };

            if let Some(label) = &raw.label {
                let addr = cur.addr().map_err(err)?;
                symbols.define(label, addr).map_err(err)?;
                event!(Level::DEBUG, "line {line_no}: defined {label} = {addr:04X}");
            }

            // Anything after the opcode of a statement without operands is a comment.
            let (stmt, operand) = match stmt {
                stmt @ (Stmt::Instr(Instr { operand: Operand::None, .. }) | Stmt::Directive(Directive::Nobase)) => {
                    if let Some(comment) = &raw.operand {
                        event!(Level::DEBUG, "line {line_no}: {} takes no operand, treating {comment:?} as a comment", raw.opcode);
                    }
                    (stmt, None)
                },
                // The END operand is optional, so a word naming no symbol starts a comment.
                // Every symbol is defined by now, since nothing after END is assembled.
                Stmt::Directive(Directive::End(Some(Target::Symbol(s)))) if symbols.lookup(&s).is_none() => {
                    event!(Level::DEBUG, "line {line_no}: {s:?} is not a symbol, treating it as a comment on END");
                    (Stmt::Directive(Directive::End(None)), None)
                },
                stmt => (stmt, raw.operand),
            };

            let addr = cur.lc;
            let len = stmt.byte_len().ok_or_else(|| err(AsmErrKind::LocationOverflow))?;
            if len > 0 {
                cur.addr().map_err(err)?;
            }
            cur.shift(len).map_err(err)?;

            let is_end = matches!(stmt, Stmt::Directive(Directive::End(_)));
            lines.push(IrLine::Stmt(ResolvedStmt {
                line: line_no,
                addr,
                next: cur.lc,
                label: raw.label,
                opcode: raw.opcode,
                operand,
                stmt,
            }));

            if is_end {
                ended = true;
                break;
            }
        }

        let Some(cur) = cursor else {
            return Err(AsmErr::new(AsmErrKind::MissingStart, Pass::One, last_line));
        };
        if !ended {
            event!(Level::WARN, "program has no END statement, assuming one after line {last_line}");
        }

        let length = u16::try_from(cur.lc - u32::from(start))
            .map_err(|_| AsmErr::new(AsmErrKind::LocationOverflow, Pass::One, last_line))?;

        Ok(Intermediate { name, start, end: cur.lc, symbols, lines, length })
    }

    /// The program length (final location counter minus the starting address).
    pub fn length(&self) -> u16 {
        self.length
    }

    /// Iterates over the statements (skipping comments).
    pub fn stmts(&self) -> impl Iterator<Item=&ResolvedStmt> + '_ {
        self.lines.iter().filter_map(|l| match l {
            IrLine::Stmt(s) => Some(s),
            IrLine::Comment { .. } => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::err::{LexErr, Pass};

    use super::*;

    fn assemble_src(src: &str) -> Result<Assembly, AsmErr> {
        assemble(src, &AsmConfig::default())
    }
    fn first_pass(src: &str) -> Result<Intermediate, AsmErr> {
        Intermediate::new(src, &AsmConfig::default())
    }
    fn assert_asm_fail<T: std::fmt::Debug>(r: Result<T, AsmErr>, kind: AsmErrKind, pass: Pass, line: usize) {
        let err = r.unwrap_err();
        assert_eq!(err.kind, kind);
        assert_eq!(err.loc, Location { pass, line });
    }

    const COPY_SMALL: &str = "\
COPY   START  1000
FIRST  LDA    ALPHA
       STA    BETA
ALPHA  WORD   5
BETA   RESW   1
       END    FIRST
";

    #[test]
    fn test_sym_basic() {
        let ir = first_pass(COPY_SMALL).unwrap();
        assert_eq!(ir.name, "COPY");
        assert_eq!(ir.start, 0x1000);
        assert_eq!(ir.end, 0x100C);
        assert_eq!(ir.length(), 0x000C);

        let syms: Vec<_> = ir.symbols.iter().collect();
        assert_eq!(syms, [("COPY", 0x1000), ("FIRST", 0x1000), ("ALPHA", 0x1006), ("BETA", 0x1009)]);
    }

    #[test]
    fn test_locctr_monotonic() {
        let src = "\
PROG   START  4B0
. header comment
       LDA    #3
       CLEAR  X
       FIX
       +LDT   #4096
       BYTE   C'EOF'
       BYTE   X'F1'
       BYTE   X'ABC'
       WORD   -1
       RESB   10
       RESW   2
       BASE   PROG
       NOBASE
       END
";
        let ir = first_pass(src).unwrap();
        let addrs: Vec<_> = ir.stmts().map(|s| s.addr).collect();
        assert_eq!(addrs, [
            0x4B0, // START
            0x4B0, // LDA
            0x4B3, // CLEAR
            0x4B5, // FIX
            0x4B6, // +LDT
            0x4BA, // C'EOF'
            0x4BD, // X'F1'
            0x4BE, // X'ABC'
            0x4C0, // WORD
            0x4C3, // RESB
            0x4CD, // RESW
            0x4D3, // BASE
            0x4D3, // NOBASE
            0x4D3, // END
        ]);
        assert!(addrs.windows(2).all(|w| w[0] <= w[1]));
        assert!(ir.stmts().all(|s| s.addr <= s.next));
        assert_eq!(ir.stmts().nth(1).map(|s| s.next), Some(0x4B3));
    }

    #[test]
    fn test_line_numbers() {
        let src = "\
. comment
PROG   START  0

       RSUB
       END
";
        let ir = first_pass(src).unwrap();
        assert_eq!(ir.lines[0], IrLine::Comment { line: 5, text: ". comment".to_string() });
        let lines: Vec<_> = ir.stmts().map(|s| s.line).collect();
        assert_eq!(lines, [10, 20, 25]);
    }

    #[test]
    fn test_duplicate_symbol() {
        let src = "\
PROG   START  0
ALPHA  WORD   1
BETA   WORD   2
ALPHA  WORD   3
       END
";
        assert_asm_fail(first_pass(src), AsmErrKind::DuplicateSymbol("ALPHA".into()), Pass::One, 20);

        // case-sensitive
        let src = "\
PROG   START  0
ALPHA  WORD   1
alpha  WORD   3
       END
";
        assert!(first_pass(src).is_ok());

        // START's label is a symbol too
        let src = "\
PROG   START  0
PROG   WORD   1
       END
";
        assert_asm_fail(first_pass(src), AsmErrKind::DuplicateSymbol("PROG".into()), Pass::One, 10);
    }

    #[test]
    fn test_start_errors() {
        let src = "\
. comment is fine
       LDA    ALPHA
PROG   START  0
";
        assert_asm_fail(first_pass(src), AsmErrKind::MissingStart, Pass::One, 10);

        let src = "\
PROG   START  0
       RSUB
PROG2  START  100
";
        assert_asm_fail(first_pass(src), AsmErrKind::MisplacedStart, Pass::One, 15);

        assert_asm_fail(first_pass(""), AsmErrKind::MissingStart, Pass::One, 0);
        assert_asm_fail(first_pass(". only\n\n"), AsmErrKind::MissingStart, Pass::One, 10);
    }

    #[test]
    fn test_pass1_errors() {
        let src = "PROG START 0\n MOVE A,X\n END";
        assert_asm_fail(first_pass(src), AsmErrKind::UnknownOpcode("MOVE".into()), Pass::One, 10);

        let src = "PROG START 0\n+CLEAR X\n END";
        // a first-column + is a label, and labels can't contain +
        assert_asm_fail(first_pass(src), AsmErrKind::InvalidLabel("+CLEAR".into()), Pass::One, 10);

        let src = "PROG START 0\n +CLEAR X\n END";
        assert_asm_fail(first_pass(src), AsmErrKind::InvalidFormat("+CLEAR".into()), Pass::One, 10);

        let src = "PROG START 0\nBUF BYTE 'EOF'\n END";
        assert_asm_fail(first_pass(src), AsmErrKind::InvalidByteOperand, Pass::One, 10);

        let src = "PROG START 0\nLONELY\n END";
        assert_asm_fail(first_pass(src), AsmErrKind::MalformedStatement, Pass::One, 10);

        let src = "PROG START 0\nLONGNAME WORD 1\n END";
        assert_asm_fail(first_pass(src), AsmErrKind::InvalidLabel("LONGNAME".into()), Pass::One, 10);

        let src = "PROG START 0\n BYTE X'1G'\n END";
        assert_asm_fail(first_pass(src), AsmErrKind::Lex(LexErr::InvalidHex), Pass::One, 10);
    }

    #[test]
    fn test_location_overflow() {
        // using the last byte of memory is fine
        let src = "PROG START FFF0\n RESB 16\n END";
        let ir = first_pass(src).unwrap();
        assert_eq!(ir.end, 0x10000);
        assert_eq!(ir.length(), 0x10);
        assert_eq!(ir.stmts().last().map(|s| s.addr), Some(0x10000));

        let src = "PROG START FFF0\n RESB 15\n END";
        assert_eq!(first_pass(src).map(|ir| ir.end), Ok(0xFFFF));

        let asm = assemble_src("PROG START FFFD\n RSUB\n END").unwrap();
        assert_eq!(asm.object.length, 3);
        assert_eq!(asm.object.to_string(), "HPROG  00FFFD000003\nT00FFFD034F0000\nE00FFFD\n");

        // but nothing can start past it
        let src = "PROG START FFF0\n RESB 17\n END";
        assert_asm_fail(first_pass(src), AsmErrKind::LocationOverflow, Pass::One, 10);

        let src = "PROG START FFFD\n RSUB\n WORD 1\n END";
        assert_asm_fail(first_pass(src), AsmErrKind::LocationOverflow, Pass::One, 15);

        let src = "PROG START FFFD\n RSUB\nTAIL RESB 0\n END";
        assert_asm_fail(first_pass(src), AsmErrKind::LocationOverflow, Pass::One, 15);

        let src = "PROG START 0\n RESW 30000\n END";
        assert_asm_fail(first_pass(src), AsmErrKind::LocationOverflow, Pass::One, 10);

        // all of memory is one byte too long for the header's length field
        let src = "PROG START 0\n RESB 65536\n END";
        assert_asm_fail(first_pass(src), AsmErrKind::LocationOverflow, Pass::One, 15);
    }

    #[test]
    fn test_end_handling() {
        // statements after END are ignored
        let src = "\
PROG   START  0
       RSUB
       END
       THIS   IS GARBAGE
";
        let ir = first_pass(src).unwrap();
        assert_eq!(ir.stmts().count(), 3);

        // END is optional
        let src = "\
PROG   START  0
       RSUB
";
        let ir = first_pass(src).unwrap();
        assert_eq!(ir.stmts().count(), 2);
        assert_eq!(ir.length(), 3);

        // a comment after a bare END is not an entry point
        let src = "\
PROG   START  1000
FIRST  RSUB
       END    end of program
";
        let ir = first_pass(src).unwrap();
        let end = ir.stmts().last().unwrap();
        assert_eq!(end.stmt, Stmt::Directive(Directive::End(None)));
        assert_eq!(end.operand, None);
        assert_eq!(assemble_src(src).map(|a| a.object.entry), Ok(0x1000));

        // but a defined symbol is
        let src = "\
PROG   START  1000
       RSUB
FIRST  RSUB
       END    FIRST  end of program
";
        assert_eq!(assemble_src(src).map(|a| a.object.entry), Ok(0x1003));

        // and so is an address, read in the same radix as START
        let src = "\
PROG   START  1000
FIRST  RSUB
       END    1000
";
        let asm = assemble_src(src).unwrap();
        assert!(asm.object.to_string().ends_with("\nE001000\n"));

        let config = AsmConfig { start_radix: Radix::Decimal, ..Default::default() };
        let asm = assemble(src, &config).unwrap();
        assert_eq!(asm.object.start, 1000);
        assert_eq!(asm.object.entry, 1000);
    }

    #[test]
    fn test_decimal_start() {
        let config = AsmConfig { start_radix: Radix::Decimal, ..Default::default() };
        let ir = Intermediate::new(COPY_SMALL, &config).unwrap();
        assert_eq!(ir.start, 1000);
        assert_eq!(ir.symbols.lookup("BETA"), Some(1009));
    }

    #[test]
    fn test_assemble_small() {
        let asm = assemble_src(COPY_SMALL).unwrap();
        assert_eq!(asm.symbols.len(), 4);
        assert_eq!(asm.object.start, 0x1000);
        assert_eq!(asm.object.length, 0x000C);
        assert_eq!(asm.object.entry, 0x1000);
        assert_eq!(asm.object.text.len(), 1);
        assert_eq!(asm.object.text[0].addr, 0x1000);
        assert_eq!(asm.object.text[0].bytes, [0x03, 0x20, 0x03, 0x0F, 0x20, 0x03, 0x00, 0x00, 0x05]);
    }

    #[test]
    fn test_err_source() {
        use std::error::Error;

        let err = AsmErr::new(AsmErrKind::Lex(LexErr::InvalidHex), Pass::One, 10);
        assert!(err.source().is_some());
        let err = AsmErr::new(AsmErrKind::MissingStart, Pass::One, 10);
        assert!(err.source().is_none());
    }
}
