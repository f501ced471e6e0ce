//! Pass 2: encoding statements into object code.
//!
//! [`generate`] replays the statements resolved by pass 1, encodes each one with an [`Encoder`],
//! and collects the results into the listing and the object program.
//!
//! SIC/XE format 3 and 4 instructions are laid out as follows:
//! ```text
//! format 3:  opcode(6) n i x b p e  disp(12)
//! format 4:  opcode(6) n i x b p e  addr(20)
//! ```
//! Plain SIC instructions use the full opcode byte, an index bit, and a 15-bit address.

use tracing::{event, Level};

use crate::ast::{Addr15, Addr20, AddrMode, Directive, Disp12, Instr, MemOperand, Operand, PcDisp, Stmt, Target};
use crate::catalog::Format;
use crate::err::Pass;

use super::encoding::{ObjectProgram, TextRecordBuilder};
use super::listing::{Listing, Row};
use super::{AsmConfig, AsmErr, AsmErrKind, Assembly, Dialect, Intermediate, IrLine, SymbolTable};

const FLAG_N: u32 = 0b100000;
const FLAG_I: u32 = 0b010000;
const FLAG_X: u32 = 0b001000;
const FLAG_B: u32 = 0b000100;
const FLAG_P: u32 = 0b000010;
const FLAG_E: u32 = 0b000001;

/// Splits the low `len` bytes of a word into big-endian order.
fn word_bytes(word: u32, len: usize) -> Vec<u8> {
    word.to_be_bytes()[4 - len..].to_vec()
}

/// Encodes single statements into object code.
///
/// The encoder holds the state pass 2 needs: the (complete, read-only) symbol table
/// and the base register state set by `BASE` and `NOBASE`.
#[derive(Debug)]
pub struct Encoder<'a> {
    symbols: &'a SymbolTable,
    dialect: Dialect,
    base: Option<u16>,
}
impl<'a> Encoder<'a> {
    /// Creates a new encoder with no base register set.
    pub fn new(symbols: &'a SymbolTable, dialect: Dialect) -> Self {
        Encoder { symbols, dialect, base: None }
    }

    /// The address the base register holds, if base-relative addressing is available.
    pub fn base(&self) -> Option<u16> {
        self.base
    }

    fn lookup(&self, name: &str) -> Result<u16, AsmErrKind> {
        self.symbols.lookup(name)
            .ok_or_else(|| AsmErrKind::UndefinedSymbol(name.to_string()))
    }

    /// Computes the value of a target (resolving it, if it is a symbol).
    pub fn resolve(&self, target: &Target) -> Result<i64, AsmErrKind> {
        match target {
            Target::Number(n) => Ok(*n),
            Target::Symbol(s) => self.lookup(s).map(i64::from),
        }
    }

    fn resolve_addr(&self, target: &Target) -> Result<u16, AsmErrKind> {
        u16::try_from(self.resolve(target)?)
            .map_err(|_| AsmErrKind::AddressingRange(target.to_string()))
    }

    /// Encodes a statement.
    ///
    /// `next` is the address of the statement after this one (the value of PC during execution).
    ///
    /// This returns the statement's object code, which is empty for directives that produce no code.
    /// `BASE` and `NOBASE` update the encoder's base register state.
    pub fn encode(&mut self, stmt: &Stmt, next: u32) -> Result<Vec<u8>, AsmErrKind> {
        match stmt {
            Stmt::Directive(Directive::Base(target)) => {
                let addr = self.resolve_addr(target)?;
                event!(Level::DEBUG, "base register set to {addr:04X}");
                self.base = Some(addr);
                Ok(vec![])
            },
            Stmt::Directive(Directive::Nobase) => {
                event!(Level::DEBUG, "base register released");
                self.base = None;
                Ok(vec![])
            },
            Stmt::Directive(Directive::Byte(bytes)) => Ok(bytes.clone()),
            Stmt::Directive(Directive::Word(n)) => Ok(word_bytes(*n as u32, 3)),
            Stmt::Directive(Directive::Start(_) | Directive::End(_) | Directive::Resb(_) | Directive::Resw(_)) => Ok(vec![]),

            Stmt::Instr(instr) => match (self.dialect, instr.info.format) {
                (Dialect::Sic, _) => self.encode_sic(instr),
                (Dialect::SicXe, Format::One) => Ok(vec![instr.info.opcode]),
                (Dialect::SicXe, Format::Two) => encode_registers(instr),
                (Dialect::SicXe, Format::ThreeFour) => self.encode_memory(instr, next),
            }
        }
    }

    fn encode_memory(&self, instr: &Instr, next: u32) -> Result<Vec<u8>, AsmErrKind> {
        let op = u32::from(instr.info.opcode & 0xFC);
        let mem = match &instr.operand {
            Operand::Memory(mem) => mem,
            // No operand: simple addressing with an empty address field (e.g., RSUB).
            Operand::None => return Ok(match instr.extended {
                false => word_bytes(op << 16 | (FLAG_N | FLAG_I) << 12, 3),
                true  => word_bytes(op << 24 | (FLAG_N | FLAG_I | FLAG_E) << 20, 4),
            }),
            _ => return Err(AsmErrKind::InvalidFormat(instr.info.mnemonic.to_string())),
        };

        let mut flags = match mem.mode {
            AddrMode::Simple    => FLAG_N | FLAG_I,
            AddrMode::Immediate => FLAG_I,
            AddrMode::Indirect  => FLAG_N,
        };
        if mem.indexed {
            flags |= FLAG_X;
        }

        if instr.extended {
            let addr = match (&mem.target, mem.mode) {
                (Target::Number(n), AddrMode::Immediate) => u32::try_from(*n).ok()
                    .and_then(|v| Addr20::new(v).ok())
                    .ok_or(AsmErrKind::ImmediateOutOfRange(*n))?,
                (target, _) => u32::try_from(self.resolve(target)?).ok()
                    .and_then(|v| Addr20::new(v).ok())
                    .ok_or_else(|| AsmErrKind::AddressingRange(target.to_string()))?,
            };
            return Ok(word_bytes(op << 24 | (flags | FLAG_E) << 20 | addr.bits(), 4));
        }

        let field = match &mem.target {
            // Numbers are encoded directly, without PC or base relative addressing.
            Target::Number(n) => {
                let err = match mem.mode {
                    AddrMode::Immediate => AsmErrKind::ImmediateOutOfRange(*n),
                    _ => AsmErrKind::AddressingRange(n.to_string()),
                };
                u32::try_from(*n).ok()
                    .and_then(|v| Disp12::new(v).ok())
                    .ok_or(err)?
                    .bits()
            },
            Target::Symbol(s) => {
                let (disp_flag, disp) = self.displacement(s, next)?;
                flags |= disp_flag;
                disp
            },
        };

        Ok(word_bytes(op << 16 | flags << 12 | field, 3))
    }

    /// Computes the displacement to a symbol, trying PC-relative and then base-relative addressing.
    ///
    /// This returns the flag for the addressing mode used and the 12-bit displacement field.
    fn displacement(&self, symbol: &str, next: u32) -> Result<(u32, u32), AsmErrKind> {
        let addr = self.lookup(symbol)?;

        let pc_disp = i32::try_from(i64::from(addr) - i64::from(next)).ok()
            .and_then(|d| PcDisp::new(d).ok());
        if let Some(disp) = pc_disp {
            return Ok((FLAG_P, disp.bits()));
        }

        let base_disp = self.base
            .and_then(|base| addr.checked_sub(base))
            .and_then(|d| Disp12::new(u32::from(d)).ok());
        match base_disp {
            Some(disp) => {
                event!(Level::DEBUG, "{symbol} ({addr:04X}) is out of PC range of {next:04X}, using base-relative addressing");
                Ok((FLAG_B, disp.bits()))
            },
            None => Err(AsmErrKind::AddressingRange(symbol.to_string())),
        }
    }

    fn encode_sic(&self, instr: &Instr) -> Result<Vec<u8>, AsmErrKind> {
        let op = u32::from(instr.info.opcode);
        let (x, addr) = match &instr.operand {
            Operand::None => (0, 0),
            Operand::Memory(MemOperand { mode: AddrMode::Simple, target, indexed }) => {
                let addr = u32::try_from(self.resolve(target)?).ok()
                    .and_then(|v| Addr15::new(v).ok())
                    .ok_or_else(|| AsmErrKind::AddressingRange(target.to_string()))?;
                (u32::from(*indexed) << 15, addr.bits())
            },
            _ => return Err(AsmErrKind::InvalidFormat(instr.info.mnemonic.to_string())),
        };

        Ok(word_bytes(op << 16 | x | addr, 3))
    }
}

fn encode_registers(instr: &Instr) -> Result<Vec<u8>, AsmErrKind> {
    let (r1, r2) = match &instr.operand {
        Operand::Reg(r)          => (r.reg_no(), 0),
        Operand::RegPair(r1, r2) => (r1.reg_no(), r2.reg_no()),
        Operand::RegCount(r, n)  => (r.reg_no(), n.saturating_sub(1)),
        Operand::Count(n)        => (n.bits() as u8, 0),
        Operand::None | Operand::Memory(_) => return Err(AsmErrKind::InvalidFormat(instr.info.mnemonic.to_string())),
    };

    Ok(vec![instr.info.opcode, r1 << 4 | r2])
}

/// Performs the second assembler pass.
///
/// Every statement resolved by pass 1 is encoded in order. Its object code is written into
/// the listing and packed into text records; `RESB` and `RESW` end the current text record.
///
/// The entry point of the object program is the `END` operand if one is given,
/// and the starting address otherwise.
pub fn generate(ir: Intermediate, config: &AsmConfig) -> Result<Assembly, AsmErr> {
    let mut encoder = Encoder::new(&ir.symbols, config.dialect);
    let mut records = TextRecordBuilder::new();
    let mut rows = Vec::with_capacity(ir.lines.len());
    let mut entry = ir.start;

    for line in &ir.lines {
        let stmt = match line {
            IrLine::Stmt(stmt) => stmt,
            IrLine::Comment { line, text } => {
                rows.push(Row::Comment { line: *line, text: text.clone() });
                continue;
            }
        };
        let err = |kind| AsmErr::new(kind, Pass::Two, stmt.line);

        let code = encoder.encode(&stmt.stmt, stmt.next).map_err(err)?;
        match &stmt.stmt {
            Stmt::Directive(Directive::Resb(_) | Directive::Resw(_)) => records.flush(),
            Stmt::Directive(Directive::End(Some(target))) => {
                entry = encoder.resolve_addr(target).map_err(err)?;
            },
            _ if code.is_empty() => {},
            _ => {
                // Pass 1 only lets statements without object code start at 10000.
                let addr = u16::try_from(stmt.addr).map_err(|_| err(AsmErrKind::LocationOverflow))?;
                records.push(addr, &code);
            },
        }

        rows.push(Row::Stmt {
            line: stmt.line,
            addr: stmt.addr,
            label: stmt.label.clone(),
            opcode: stmt.opcode.clone(),
            operand: stmt.operand.clone(),
            code,
        });
    }

    let length = ir.length();
    let text = records.finish();
    event!(Level::DEBUG, "generated {} text records, entry point {entry:04X}", text.len());

    let object = ObjectProgram { name: ir.name, start: ir.start, length, text, entry };
    let listing = Listing::new(rows, ir.symbols.clone());
    Ok(Assembly { symbols: ir.symbols, listing, object })
}
