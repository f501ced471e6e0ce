//! The program listing.
//!
//! A listing shows every source statement alongside its address and generated object code,
//! followed by the symbol table. Columns are tab-separated:
//! ```text
//! LINE    LOCCTR  LABEL   OPCODE  OPERAND OBJ_CODE
//! 5       1000    COPY    START   1000
//! 10      1000    FIRST   LDA     ALPHA   032003
//! ...
//!
//! SYMBOL  ADDRESS
//! COPY    1000
//! ...
//! ```

use super::encoding::hex;
use super::SymbolTable;

/// A row of the listing.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Row {
    /// A comment line, kept verbatim.
    Comment {
        /// The line number.
        line: usize,
        /// The text of the comment line.
        text: String,
    },
    /// An assembled statement.
    Stmt {
        /// The line number.
        line: usize,
        /// The address of the statement.
        addr: u32,
        /// The label column.
        label: Option<String>,
        /// The opcode column.
        opcode: String,
        /// The operand column.
        operand: Option<String>,
        /// The generated object code (empty if the statement generates none).
        code: Vec<u8>,
    },
}
impl Row {
    /// The line number of this row.
    pub fn line(&self) -> usize {
        match *self {
            Row::Comment { line, .. } => line,
            Row::Stmt { line, .. } => line,
        }
    }

    /// The object code listed on this row.
    pub fn code(&self) -> &[u8] {
        match self {
            Row::Comment { .. } => &[],
            Row::Stmt { code, .. } => code,
        }
    }
}
impl std::fmt::Display for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Row::Comment { line, text } => write!(f, "{line}\t{text}"),
            Row::Stmt { line, addr, label, opcode, operand, code } => {
                write!(f, "{line}\t{addr:04X}\t{}\t{opcode}\t{}",
                    label.as_deref().unwrap_or(""),
                    operand.as_deref().unwrap_or("")
                )?;
                if !code.is_empty() {
                    write!(f, "\t{}", hex(code))?;
                }
                Ok(())
            }
        }
    }
}

/// A program listing.
///
/// This is rendered through its [`Display`] implementation.
///
/// [`Display`]: std::fmt::Display
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Listing {
    rows: Vec<Row>,
    symbols: SymbolTable,
}
impl Listing {
    /// Creates a listing from its rows and the program's symbol table.
    pub fn new(rows: Vec<Row>, symbols: SymbolTable) -> Self {
        Listing { rows, symbols }
    }

    /// The rows of the listing, in source order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// The symbol table printed at the end of the listing.
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }
}
impl std::fmt::Display for Listing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "LINE\tLOCCTR\tLABEL\tOPCODE\tOPERAND\tOBJ_CODE")?;
        for row in &self.rows {
            writeln!(f, "{row}")?;
        }

        writeln!(f)?;
        writeln!(f, "SYMBOL\tADDRESS")?;
        for (name, addr) in self.symbols.iter() {
            writeln!(f, "{name}\t{addr:04X}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::asm::{assemble, AsmConfig};

    use super::Row;

    #[test]
    fn test_listing() {
        let src = "\
. small program
COPY   START  1000
FIRST  LDA    ALPHA
       STA    BETA

ALPHA  WORD   5
BETA   RESW   1
       END    FIRST
";
        let asm = assemble(src, &AsmConfig::default()).unwrap();
        assert_eq!(asm.listing.to_string(), "\
LINE\tLOCCTR\tLABEL\tOPCODE\tOPERAND\tOBJ_CODE
5\t. small program
10\t1000\tCOPY\tSTART\t1000
15\t1000\tFIRST\tLDA\tALPHA\t032003
20\t1003\t\tSTA\tBETA\t0F2003
30\t1006\tALPHA\tWORD\t5\t000005
35\t1009\tBETA\tRESW\t1
40\t100C\t\tEND\tFIRST

SYMBOL\tADDRESS
COPY\t1000
FIRST\t1000
ALPHA\t1006
BETA\t1009
");
    }

    #[test]
    fn test_rows() {
        let src = "\
PROG   START  0
       +JSUB  SUB
       RSUB
SUB    CLEAR  X
       END
";
        let asm = assemble(src, &AsmConfig::default()).unwrap();
        let rows = asm.listing.rows();
        assert_eq!(rows.iter().map(Row::line).collect::<Vec<_>>(), [5, 10, 15, 20, 25]);
        assert_eq!(rows[1].code(), [0x4B, 0x10, 0x00, 0x07]);
        assert_eq!(rows[1].to_string(), "10\t0000\t\t+JSUB\tSUB\t4B100007");
        assert_eq!(rows[3].to_string(), "20\t0007\tSUB\tCLEAR\tX\tB410");
        assert_eq!(asm.listing.symbols().lookup("SUB"), Some(0x0007));
    }
}
