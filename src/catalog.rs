//! The operation table and directive table.
//!
//! This module is the static catalog consulted by both assembler passes:
//! - [`Mnemonic`] (and its [`InstrInfo`] entry) lists every machine instruction,
//!     with its encoding format, opcode byte, and number of operands.
//! - [`DirectiveKind`] lists every assembler directive.
//! - [`classify`] decides whether an opcode field names a directive or an instruction.
//!
//! Lookups are case-insensitive. The `+` prefix used for format 4 is *not* part of a mnemonic
//! and must be stripped by the caller before looking it up.

/// The encoding format of an instruction, as listed in the operation table.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Format {
    /// Format 1: the opcode byte alone.
    One,
    /// Format 2: the opcode byte followed by two register nibbles.
    Two,
    /// Format 3: opcode, `nixbpe` flags, and a 12-bit displacement.
    ///
    /// A `+` prefix on the mnemonic promotes an occurrence to format 4
    /// (20-bit address field).
    ThreeFour,
}
impl Format {
    /// The number of bytes one occurrence of an instruction of this format occupies.
    ///
    /// `extended` is whether the occurrence is `+`-prefixed.
    /// It only has an effect on [`Format::ThreeFour`].
    pub fn byte_len(self, extended: bool) -> u16 {
        match (self, extended) {
            (Format::One, _) => 1,
            (Format::Two, _) => 2,
            (Format::ThreeFour, false) => 3,
            (Format::ThreeFour, true)  => 4,
        }
    }
}
impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::One       => f.write_str("1"),
            Format::Two       => f.write_str("2"),
            Format::ThreeFour => f.write_str("3/4"),
        }
    }
}

/// An operation table entry.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct InstrInfo {
    /// The mnemonic this entry describes.
    pub mnemonic: Mnemonic,
    /// The encoding format.
    pub format: Format,
    /// The opcode byte.
    ///
    /// For format 3/4 instructions, the low two bits are always zero
    /// (they are replaced by the `n` and `i` flags).
    pub opcode: u8,
    /// The number of operands this instruction expects (0, 1, or 2).
    pub operands: u8,
    /// Whether this instruction exists in the plain SIC instruction set.
    pub sic: bool,
}

/// The error returned when a string is not in the operation table or the directive table.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct UnknownMnemonic;
impl std::fmt::Display for UnknownMnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("unknown mnemonic")
    }
}
impl std::error::Error for UnknownMnemonic {}

macro_rules! optab {
    ($($mn:ident: $fmt:ident, $op:literal, $n:literal, $sic:literal;)+) => {
        /// A machine instruction mnemonic.
        ///
        /// Each mnemonic has an associated [`InstrInfo`], accessible with [`Mnemonic::info`].
        ///
        /// Parsing a mnemonic from a string is case-insensitive.
        #[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
        pub enum Mnemonic {
            $(
                #[allow(missing_docs)]
                $mn
            ),+
        }

        impl Mnemonic {
            /// Every mnemonic in the operation table, in alphabetical order.
            pub const ALL: &'static [Mnemonic] = &[$(Mnemonic::$mn),+];

            /// Gets the operation table entry of this mnemonic.
            pub fn info(self) -> InstrInfo {
                match self {
                    $(
                        Mnemonic::$mn => InstrInfo {
                            mnemonic: self,
                            format: Format::$fmt,
                            opcode: $op,
                            operands: $n,
                            sic: $sic
                        }
                    ),+
                }
            }
        }

        impl std::str::FromStr for Mnemonic {
            type Err = UnknownMnemonic;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match &*s.to_uppercase() {
                    $(stringify!($mn) => Ok(Self::$mn)),+,
                    _ => Err(UnknownMnemonic)
                }
            }
        }

        impl std::fmt::Display for Mnemonic {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$mn => f.write_str(stringify!($mn))),+
                }
            }
        }
    };
}

optab! {
    ADD:    ThreeFour, 0x18, 1, true;
    ADDF:   ThreeFour, 0x58, 1, false;
    ADDR:   Two,       0x90, 2, false;
    AND:    ThreeFour, 0x40, 1, true;
    CLEAR:  Two,       0xB4, 1, false;
    COMP:   ThreeFour, 0x28, 1, true;
    COMPF:  ThreeFour, 0x88, 1, false;
    COMPR:  Two,       0xA0, 2, false;
    DIV:    ThreeFour, 0x24, 1, true;
    DIVF:   ThreeFour, 0x64, 1, false;
    DIVR:   Two,       0x9C, 2, false;
    FIX:    One,       0xC4, 0, false;
    FLOAT:  One,       0xC0, 0, false;
    HIO:    One,       0xF4, 0, false;
    J:      ThreeFour, 0x3C, 1, true;
    JEQ:    ThreeFour, 0x30, 1, true;
    JGT:    ThreeFour, 0x34, 1, true;
    JLT:    ThreeFour, 0x38, 1, true;
    JSUB:   ThreeFour, 0x48, 1, true;
    LDA:    ThreeFour, 0x00, 1, true;
    LDB:    ThreeFour, 0x68, 1, false;
    LDCH:   ThreeFour, 0x50, 1, true;
    LDF:    ThreeFour, 0x70, 1, false;
    LDL:    ThreeFour, 0x08, 1, true;
    LDS:    ThreeFour, 0x6C, 1, false;
    LDT:    ThreeFour, 0x74, 1, false;
    LDX:    ThreeFour, 0x04, 1, true;
    LPS:    ThreeFour, 0xD0, 1, false;
    MUL:    ThreeFour, 0x20, 1, true;
    MULF:   ThreeFour, 0x60, 1, false;
    MULR:   Two,       0x98, 2, false;
    NORM:   One,       0xC8, 0, false;
    OR:     ThreeFour, 0x44, 1, true;
    RD:     ThreeFour, 0xD8, 1, true;
    RMO:    Two,       0xAC, 2, false;
    RSUB:   ThreeFour, 0x4C, 0, true;
    SHIFTL: Two,       0xA4, 2, false;
    SHIFTR: Two,       0xA8, 2, false;
    SIO:    One,       0xF0, 0, false;
    SSK:    ThreeFour, 0xEC, 1, false;
    STA:    ThreeFour, 0x0C, 1, true;
    STB:    ThreeFour, 0x78, 1, false;
    STCH:   ThreeFour, 0x54, 1, true;
    STF:    ThreeFour, 0x80, 1, false;
    STI:    ThreeFour, 0xD4, 1, false;
    STL:    ThreeFour, 0x14, 1, true;
    STS:    ThreeFour, 0x7C, 1, false;
    STSW:   ThreeFour, 0xE8, 1, true;
    STT:    ThreeFour, 0x84, 1, false;
    STX:    ThreeFour, 0x10, 1, true;
    SUB:    ThreeFour, 0x1C, 1, true;
    SUBF:   ThreeFour, 0x5C, 1, false;
    SUBR:   Two,       0x94, 2, false;
    SVC:    Two,       0xB0, 1, false;
    TD:     ThreeFour, 0xE0, 1, true;
    TIO:    One,       0xF8, 0, false;
    TIX:    ThreeFour, 0x2C, 1, true;
    TIXR:   Two,       0xB8, 1, false;
    WD:     ThreeFour, 0xDC, 1, true;
}

/// An assembler directive.
///
/// Directives are instructions to the assembler itself.
/// Only `BYTE` and `WORD` produce object code.
///
/// Parsing a directive from a string is case-insensitive.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum DirectiveKind {
    /// `START`: names the program and sets its starting address.
    Start,
    /// `END`: ends the program and optionally names the first executable instruction.
    End,
    /// `BYTE`: a character (`C'..'`) or hex (`X'..'`) constant.
    Byte,
    /// `WORD`: a one-word (3-byte) integer constant.
    Word,
    /// `RESB`: reserves a number of bytes.
    Resb,
    /// `RESW`: reserves a number of words.
    Resw,
    /// `BASE`: informs the assembler of the base register's contents.
    Base,
    /// `NOBASE`: informs the assembler the base register can no longer be used.
    Nobase,
}
impl DirectiveKind {
    /// Whether this directive only exists in SIC/XE.
    pub fn is_xe_only(self) -> bool {
        matches!(self, DirectiveKind::Base | DirectiveKind::Nobase)
    }
}
impl std::str::FromStr for DirectiveKind {
    type Err = UnknownMnemonic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match &*s.to_uppercase() {
            "START"  => Ok(Self::Start),
            "END"    => Ok(Self::End),
            "BYTE"   => Ok(Self::Byte),
            "WORD"   => Ok(Self::Word),
            "RESB"   => Ok(Self::Resb),
            "RESW"   => Ok(Self::Resw),
            "BASE"   => Ok(Self::Base),
            "NOBASE" => Ok(Self::Nobase),
            _ => Err(UnknownMnemonic)
        }
    }
}
impl std::fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start  => f.write_str("START"),
            Self::End    => f.write_str("END"),
            Self::Byte   => f.write_str("BYTE"),
            Self::Word   => f.write_str("WORD"),
            Self::Resb   => f.write_str("RESB"),
            Self::Resw   => f.write_str("RESW"),
            Self::Base   => f.write_str("BASE"),
            Self::Nobase => f.write_str("NOBASE"),
        }
    }
}

/// The result of looking up an opcode field in the catalog.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum OpKind {
    /// The opcode field names a directive.
    Directive(DirectiveKind),
    /// The opcode field names a machine instruction.
    Instr(InstrInfo),
}

/// Classifies a (`+`-stripped) opcode field.
///
/// Directives are checked first, then the operation table.
/// If the name is in neither table, this returns `None`.
///
/// # Example
/// ```
/// use sicxe_asm::catalog::{classify, DirectiveKind, Format, OpKind};
///
/// assert_eq!(classify("resw"), Some(OpKind::Directive(DirectiveKind::Resw)));
///
/// let Some(OpKind::Instr(info)) = classify("LDA") else { panic!("LDA should be an instruction") };
/// assert_eq!(info.opcode, 0x00);
/// assert_eq!(info.format, Format::ThreeFour);
///
/// assert_eq!(classify("MOV"), None);
/// ```
pub fn classify(name: &str) -> Option<OpKind> {
    if let Ok(d) = name.parse() {
        return Some(OpKind::Directive(d));
    }
    name.parse::<Mnemonic>()
        .ok()
        .map(|m| OpKind::Instr(m.info()))
}
