//! Error interface for this crate.
//!
//! Every error this crate produces implements [`Error`], which extends
//! [`std::error::Error`] with an optional help message and the location
//! (assembler pass and source line) the error was detected at.
//!
//! [`Report`] renders such an error in the assembler's diagnostic format:
//! ```text
//! Error: Pass 1, Line 15: duplicate symbol 'ALPHA'
//! ```

use std::borrow::Cow;

pub use crate::asm::{AsmErr, AsmErrKind};
pub use crate::parse::lex::LexErr;

/// The assembler pass an error was detected in.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Pass {
    /// Pass 1: tokenizing, location counter resolution, and symbol definition.
    One,
    /// Pass 2: code generation.
    Two,
}
impl std::fmt::Display for Pass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pass::One => f.write_str("1"),
            Pass::Two => f.write_str("2"),
        }
    }
}

/// Where an error was detected.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct Location {
    /// The pass that detected the error.
    pub pass: Pass,
    /// The (stepped) line number of the offending statement.
    pub line: usize,
}
impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Pass {}, Line {}", self.pass, self.line)
    }
}

/// Unified error interface for all errors in this crate.
pub trait Error: std::error::Error {
    /// The location this error was detected at, if known.
    fn location(&self) -> Option<Location> {
        None
    }

    /// A clear help message to help a user correct the error, if there is one.
    fn help(&self) -> Option<Cow<str>>;
}

/// Renders an [`Error`] for display to a user.
///
/// The normal format (`{}`) prints a single line.
/// The alternate format (`{:#}`) additionally prints the help message on its own line, if any.
///
/// ```
/// use sicxe_asm::asm::{assemble, AsmConfig};
/// use sicxe_asm::err::Report;
///
/// let src = "COPY START 1000\nA WORD 1\nA WORD 2\n END";
/// let err = assemble(src, &AsmConfig::default()).unwrap_err();
/// assert_eq!(Report::new(&err).to_string(), "Error: Pass 1, Line 15: duplicate symbol 'A'");
/// ```
pub struct Report<'e, E: ?Sized>(&'e E);
impl<'e, E: Error + ?Sized> Report<'e, E> {
    /// Creates a new report for an error.
    pub fn new(err: &'e E) -> Self {
        Report(err)
    }
}
impl<E: Error + ?Sized> std::fmt::Display for Report<'_, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Error: ")?;
        if let Some(loc) = self.0.location() {
            write!(f, "{loc}: ")?;
        }
        write!(f, "{}", self.0)?;

        if f.alternate() {
            if let Some(help) = self.0.help() {
                write!(f, "\n  help: {help}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Error as _, Location, Pass, Report};
    use crate::asm::{AsmErr, AsmErrKind};

    #[test]
    fn test_report() {
        let err = AsmErr::new(AsmErrKind::UndefinedSymbol("BUFFER".into()), Pass::Two, 40);
        assert_eq!(err.location(), Some(Location { pass: Pass::Two, line: 40 }));
        assert_eq!(
            Report::new(&err).to_string(),
            "Error: Pass 2, Line 40: undefined symbol 'BUFFER'"
        );
        assert_eq!(
            format!("{:#}", Report::new(&err)),
            "Error: Pass 2, Line 40: undefined symbol 'BUFFER'\n  help: define this symbol as a label somewhere in the program"
        );
    }

    #[test]
    fn test_report_without_location() {
        let err = crate::err::LexErr::UnclosedLiteral;
        assert_eq!(Report::new(&err).to_string(), "Error: unclosed constant");
    }
}
