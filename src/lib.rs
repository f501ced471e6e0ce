//! A two-pass SIC/XE assembler.
//!
//! This crate translates SIC/XE (or plain SIC) assembly source into a symbol table,
//! a program listing, and an object program made of H/T/E records.
//!
//! # Usage
//!
//! Source code is assembled with [`asm::assemble`]:
//! ```
//! use sicxe_asm::asm::{assemble, AsmConfig};
//!
//! let code = "
//! PROG   START  0
//! FIRST  LDA    #3
//!        STA    RESULT
//!        RSUB
//! RESULT RESW   1
//!        END    FIRST
//! ";
//! let asm = assemble(code, &AsmConfig::default()).unwrap();
//!
//! assert_eq!(asm.symbols.lookup("RESULT"), Some(0x0009));
//! assert_eq!(asm.object.to_string(), "\
//! HPROG  00000000000C
//! T000000090100030F20034F0000
//! E000000
//! ");
//! // The listing is rendered with Display:
//! println!("{}", asm.listing);
//! ```
//!
//! Errors carry the pass and line they were detected at,
//! and can be rendered for a user with [`err::Report`]:
//! ```
//! use sicxe_asm::asm::{assemble, AsmConfig};
//! use sicxe_asm::err::Report;
//!
//! let err = assemble("PROG START 0\n LDA MISSING\n END", &AsmConfig::default()).unwrap_err();
//! assert_eq!(Report::new(&err).to_string(), "Error: Pass 2, Line 10: undefined symbol 'MISSING'");
//! ```
#![warn(missing_docs)]

pub mod catalog;
pub mod parse;
pub mod ast;
pub mod asm;
pub mod err;
