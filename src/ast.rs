//! Components relating to typed SIC/XE statements.
//!
//! The line tokenizer produces raw text columns; the parser converts them into the types
//! of this module, which both assembler passes consume:
//! - [`Stmt`] (a directive or an instruction, with its operand resolved into a typed shape),
//! - [`Operand`] and [`MemOperand`] (the operand syntax of instructions),
//! - [`Reg`] (a SIC/XE register),
//! - and [`Offset`] (a bit-width-checked field value).

use std::fmt::Write as _;

use offset_base::OffsetBacking;

use crate::catalog::InstrInfo;

/// A SIC/XE register.
///
/// Each register has a 4-bit number used in format 2 instructions
/// (accessible with [`Reg::reg_no`]).
///
/// Parsing a register from a string is case-insensitive.
///
/// ## Examples
///
/// ```text
/// CLEAR X
///       ~
/// COMPR A,S
///       ~ ~
/// TIXR T
///      ~
/// ```
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Reg {
    /// Accumulator
    A,
    /// Index register
    X,
    /// Linkage register
    L,
    /// Base register
    B,
    /// General working register
    S,
    /// General working register
    T,
    /// Floating-point accumulator
    F,
    /// Program counter
    PC,
    /// Status word
    SW,
}
impl Reg {
    /// Gets the register number of this [`Reg`].
    pub fn reg_no(self) -> u8 {
        match self {
            Reg::A  => 0,
            Reg::X  => 1,
            Reg::L  => 2,
            Reg::B  => 3,
            Reg::S  => 4,
            Reg::T  => 5,
            Reg::F  => 6,
            Reg::PC => 8,
            Reg::SW => 9,
        }
    }
}
impl std::str::FromStr for Reg {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match &*s.to_uppercase() {
            "A"  => Ok(Reg::A),
            "X"  => Ok(Reg::X),
            "L"  => Ok(Reg::L),
            "B"  => Ok(Reg::B),
            "S"  => Ok(Reg::S),
            "T"  => Ok(Reg::T),
            "F"  => Ok(Reg::F),
            "PC" => Ok(Reg::PC),
            "SW" => Ok(Reg::SW),
            _ => Err(())
        }
    }
}
impl std::fmt::Display for Reg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// A signed 12-bit PC-relative displacement.
pub type PcDisp = Offset<i32, 12>;
/// An unsigned 12-bit field (base-relative displacement, or a format 3 immediate/address).
pub type Disp12 = Offset<u32, 12>;
/// An unsigned 20-bit field (format 4 address or immediate).
pub type Addr20 = Offset<u32, 20>;
/// An unsigned 15-bit field (plain SIC direct address).
pub type Addr15 = Offset<u32, 15>;
/// An unsigned 4-bit field (format 2 `SVC` interrupt number).
pub type Nibble = Offset<u32, 4>;

/// A value representing a field of an encoded instruction.
///
/// The `OFF` type represents the backing type of this value.
/// The signedness of this type is dependent on the signedness of the `OFF` type:
/// - `Offset<i32, _>`: signed (two's complement) field
/// - `Offset<u32, _>`: unsigned field
///
/// `N` indicates the maximum bit size of this field.
///
/// ## Examples
///
/// - `Offset<i32, 12>` is a PC-relative displacement. See [`PcDisp`].
/// - `Offset<u32, 20>` is the address field of a format 4 instruction. See [`Addr20`].
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct Offset<OFF, const N: u32>(OFF);

impl<OFF: std::fmt::Display, const N: u32> std::fmt::Display for Offset<OFF, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_char('#')?;
        self.0.fmt(f)
    }
}

/// The errors that can result from calling [`Offset::new`].
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum OffsetNewErr {
    /// The provided value cannot fit an unsigned integer of the given bitsize.
    CannotFitUnsigned(u32),
    /// The provided value cannot fit a signed integer of the given bitsize.
    CannotFitSigned(u32)
}

impl std::fmt::Display for OffsetNewErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OffsetNewErr::CannotFitUnsigned(n) => write!(f, "value is too big for unsigned {n}-bit integer"),
            OffsetNewErr::CannotFitSigned(n) => write!(f, "value is too big for signed {n}-bit integer"),
        }
    }
}
impl std::error::Error for OffsetNewErr {}

mod offset_base {
    use super::OffsetNewErr;

    /// Any type that could store a value for [`Offset`].
    ///
    /// [`Offset`]: super::Offset
    pub trait OffsetBacking: Copy + Eq {
        /// How many bits are contained within this backing.
        const BITS: u32;

        /// Truncates the given value to the provided `bit_size`,
        /// extending it back out according to the backing's signedness.
        fn truncate(self, bit_size: u32) -> Self;

        /// Reinterprets the low bits of this value as an unsigned field.
        fn to_bits(self, bit_size: u32) -> u32;

        /// The error to raise if a given value doesn't match
        /// its provided value when truncated to a given `bit_size`.
        fn does_not_fit_error(bit_size: u32) -> OffsetNewErr;
    }

    macro_rules! impl_offset_backing_for_ints {
        ($($Int:ty: $Err:ident),*) => {
            $(
                impl OffsetBacking for $Int {
                    const BITS: u32 = Self::BITS;

                    fn truncate(self, bit_size: u32) -> Self {
                        (self << (Self::BITS - bit_size)) >> (Self::BITS - bit_size)
                    }

                    fn to_bits(self, bit_size: u32) -> u32 {
                        (self as u32) & (u32::MAX >> (u32::BITS - bit_size))
                    }

                    fn does_not_fit_error(bit_size: u32) -> OffsetNewErr {
                        OffsetNewErr::$Err(bit_size)
                    }
                }
            )*
        }
    }
    impl_offset_backing_for_ints! {
        u32: CannotFitUnsigned,
        i32: CannotFitSigned
    }
}

impl<OFF: OffsetBacking, const N: u32> Offset<OFF, N> {
    /// Creates a new field value.
    /// This must fit within `N` bits of the representation, otherwise an error is raised.
    ///
    /// # Examples
    ///
    /// ```
    /// # use sicxe_asm::ast::Offset;
    /// #
    /// // Signed:
    /// assert!(Offset::<i32, 12>::new(-2048).is_ok());
    /// assert!(Offset::<i32, 12>::new(2047).is_ok());
    /// assert!(Offset::<i32, 12>::new(2048).is_err());
    ///
    /// // Unsigned:
    /// assert!(Offset::<u32, 12>::new(4095).is_ok());
    /// assert!(Offset::<u32, 12>::new(4096).is_err());
    /// ```
    ///
    /// # Panics
    ///
    /// This will panic if `N` is larger than the backing (e.g., for backing `u32`, larger than 32).
    ///
    /// ```should_panic
    /// # use sicxe_asm::ast::Offset;
    /// #
    /// let oh_no = Offset::<i32, 33>::new(18);
    /// ```
    pub fn new(n: OFF) -> Result<Self, OffsetNewErr> {
        assert!(N <= OFF::BITS, "bit size {N} exceeds size of backing ({})", OFF::BITS);
        match n == n.truncate(N) {
            true  => Ok(Offset(n)),
            false => Err(OFF::does_not_fit_error(N)),
        }
    }

    /// Gets the value of the field.
    pub fn get(&self) -> OFF {
        self.0
    }

    /// Gets the raw `N`-bit encoding of this field
    /// (two's complement, for signed backings).
    ///
    /// ```
    /// # use sicxe_asm::ast::Offset;
    /// #
    /// let disp = Offset::<i32, 12>::new(-6).unwrap();
    /// assert_eq!(disp.bits(), 0xFFA);
    /// ```
    pub fn bits(&self) -> u32 {
        self.0.to_bits(N)
    }
}

/// The target of a memory operand: either a numeric value or a symbol to resolve.
///
/// ## Examples
/// ```text
/// LDA ALPHA
///     ~~~~~
/// LDT #4096
///      ~~~~
/// ```
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum Target {
    #[allow(missing_docs)]
    Number(i64),
    #[allow(missing_docs)]
    Symbol(String),
}
impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Number(n) => n.fmt(f),
            Target::Symbol(s) => s.fmt(f),
        }
    }
}

/// How a format 3/4 memory operand is addressed (set through the `n` and `i` flags).
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum AddrMode {
    /// No prefix (`n = 1`, `i = 1`).
    Simple,
    /// `#` prefix (`n = 0`, `i = 1`).
    Immediate,
    /// `@` prefix (`n = 1`, `i = 0`).
    Indirect,
}

/// A memory operand of a format 3/4 (or plain SIC) instruction.
///
/// ```text
/// STCH BUFFER,X
///      ~~~~~~~~
/// J    @RETADR
///      ~~~~~~~
/// ```
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct MemOperand {
    /// The addressing mode.
    pub mode: AddrMode,
    /// The value or symbol addressed.
    pub target: Target,
    /// Whether the operand is indexed (`,X`).
    pub indexed: bool,
}
impl std::fmt::Display for MemOperand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.mode {
            AddrMode::Simple    => {},
            AddrMode::Immediate => f.write_char('#')?,
            AddrMode::Indirect  => f.write_char('@')?,
        }
        self.target.fmt(f)?;
        if self.indexed {
            f.write_str(",X")?;
        }
        Ok(())
    }
}

/// The typed operand of an instruction.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum Operand {
    /// No operand (format 1 instructions, `RSUB`).
    None,
    /// A memory operand (format 3/4 instructions).
    Memory(MemOperand),
    /// A single register (`CLEAR`, `TIXR`).
    Reg(Reg),
    /// Two registers (`ADDR`, `COMPR`, `RMO`, ...).
    RegPair(Reg, Reg),
    /// A register and a shift count in `1..=16` (`SHIFTL`, `SHIFTR`).
    RegCount(Reg, u8),
    /// A 4-bit number (`SVC`).
    Count(Nibble),
}

/// An instruction, ready to be encoded.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct Instr {
    /// The operation table entry of the mnemonic.
    pub info: InstrInfo,
    /// Whether this occurrence was `+`-prefixed (format 4).
    pub extended: bool,
    /// The operand.
    pub operand: Operand,
}
impl Instr {
    /// The number of bytes this instruction occupies.
    pub fn byte_len(&self) -> u16 {
        self.info.format.byte_len(self.extended)
    }
}

/// An assembler directive with its parsed operand.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum Directive {
    /// `START addr`
    Start(u16),
    /// `END [first]`
    End(Option<Target>),
    /// `BYTE C'..'` or `BYTE X'..'`, holding the constant's bytes
    Byte(Vec<u8>),
    /// `WORD n`
    Word(i32),
    /// `RESB n`
    Resb(u32),
    /// `RESW n`
    Resw(u32),
    /// `BASE target`
    Base(Target),
    /// `NOBASE`
    Nobase,
}
impl Directive {
    /// How many bytes the location counter advances over this directive.
    ///
    /// This is `None` if the size does not fit a 32-bit integer.
    pub fn byte_len(&self) -> Option<u32> {
        match self {
            Directive::Start(_)  => Some(0),
            Directive::End(_)    => Some(0),
            Directive::Byte(b)   => u32::try_from(b.len()).ok(),
            Directive::Word(_)   => Some(3),
            Directive::Resb(n)   => Some(*n),
            Directive::Resw(n)   => n.checked_mul(3),
            Directive::Base(_)   => Some(0),
            Directive::Nobase    => Some(0),
        }
    }
}

/// A parsed, non-comment statement.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum Stmt {
    #[allow(missing_docs)]
    Directive(Directive),
    #[allow(missing_docs)]
    Instr(Instr),
}
impl Stmt {
    /// How many bytes the location counter advances over this statement.
    pub fn byte_len(&self) -> Option<u32> {
        match self {
            Stmt::Directive(d) => d.byte_len(),
            Stmt::Instr(i)     => Some(u32::from(i.byte_len())),
        }
    }
}
