//! Converts Theft assembly code into a flat ROM image
//!
//! Assembly happens in strictly linear phases: the sources are parsed into a
//! tree of expressions (one branch per file), the size of the output image is
//! precomputed, labels are resolved to byte offsets, symbols are textually
//! expanded, and finally every expression is translated into its bytes.
//!
//! Comments start with a semicolon (`;`) and continue to the end of the line,
//! may start both at the beginning or at the end of a line. Comments are fully
//! ignored by the assembler.
//!
//! Instruction and directive mnemonics are case-insensitive. Parameters are
//! separated by whitespace; a trailing comma on a parameter is allowed.
//! Labels are defined with a colon at the end and may share a line with the
//! statement they mark:
//!
//! ```ignore
//! .text
//! start: ld a, $#0000   ; load the value 0 into the accumulator
//! loop:
//!     inc a, $#0001
//!     cmp $#000at
//!     bne loop          ; count up to decimal 10
//! done:
//!     brn done
//! ```
//!
//! The assembler supports the following instructions (`reg` is one of the
//! registers `a c d e f g h`, `val` is a `$`-prefixed address or `$#`-prefixed
//! immediate value, a character literal like `'X'`, or a label name):
//! - LD reg, val: load a value into a register
//! - ST reg, val: store a register to memory
//! - BRN val: branch
//! - BEQ val: branch if equal
//! - BNE val: branch if not equal
//! - CMP val: compare against the accumulator
//! - CAL val: call a subroutine
//! - RTS: return from a subroutine
//! - RTI: return from an interrupt
//! - INT: raise an interrupt
//! - DIN: disable interrupts
//! - EIN: enable interrupts
//! - OR reg, val / AND reg, val: bitwise operations
//! - INC reg, val / DEC reg, val: increment / decrement
//! - ADD reg, val / SUB reg, val: arithmetic
//! - SHR reg, val / SHL reg, val: shifts
//! - NOP: do nothing
//!
//! Numeric operands are hexadecimal by default; a trailing `t` marks a decimal
//! literal and a trailing `b` a binary one (`$#00FFt` is decimal 255).
//!
//! The assembler supports the following directives:
//! - .inc path: parse another source file and append its expressions
//! - .byte value: emit a single byte
//! - .bytes n value...: emit n bytes, taking values from the remaining
//!   parameters and padding with zeroes
//! - .padding n, .nullpadding n: emit n zero bytes
//! - .text: subsequent lines are code
//! - .symbols: subsequent lines define symbols (`name body...`), which are
//!   substituted for matching parameter tokens before translation
//!
//! Directive counts accept `0x`-prefixed hex and `0`-prefixed octal numbers.

pub mod directives;
pub mod emitter;
pub mod instructions;
pub mod lexer;
pub mod parser;
pub mod passes;
pub mod translator;
pub mod tree;

use std::fmt;
use std::path::PathBuf;

use colored::Colorize;

use crate::assembler::lexer::TokenSpan;
use crate::assembler::tree::SyntaxTree;

/// Assemble a source file (and everything it includes) into a ROM image
pub fn assemble_from_file(path: &str, search_dirs: &[PathBuf]) -> Result<Vec<u8>, Error> {
    let mut tree = SyntaxTree::new();
    parser::parse_file(path, search_dirs, &mut tree)?;
    assemble_tree(&mut tree)
}

/// Assemble source code from a string into a ROM image
///
/// Included files are resolved against the working directory.
pub fn assemble(source: &str) -> Result<Vec<u8>, Error> {
    let mut tree = SyntaxTree::new();
    parser::parse_source(source, "<source>", &[], &mut tree)?;
    assemble_tree(&mut tree)
}

/// Run the translation phases over an already parsed tree
pub fn assemble_tree(tree: &mut SyntaxTree) -> Result<Vec<u8>, Error> {
    let labels = passes::resolve_labels(tree)?;
    passes::expand_symbols(tree);
    emitter::emit_tree(tree, &labels)
}

/// An error that can occur during the assembly process
#[derive(Debug)]
pub enum Error {
    /// A mnemonic that is not in the instruction table
    InvalidInstruction {
        mnemonic: String,
        span: TokenSpan,
        file: String,
        line_number: usize,
        line: String,
    },
    /// A parameter that was semantically rejected
    InvalidParameter {
        parameter: String,
        span: TokenSpan,
        file: String,
        line_number: usize,
        line: String,
    },
    /// An instruction with the wrong number of parameters
    InvalidParameterCount {
        instruction: String,
        found: usize,
        expected: usize,
        extra_parameter_spans: Vec<TokenSpan>,
        file: String,
        line_number: usize,
        line: String,
    },
    /// A data directive lacking a required parameter
    MissingParameter {
        directive: String,
        file: String,
        line_number: usize,
        line: String,
    },
    /// An unknown directive mnemonic
    InvalidDirective {
        directive: String,
        span: TokenSpan,
        file: String,
        line_number: usize,
        line: String,
    },
    /// A directive that requires a parameter but was given none
    DirectiveMissingParameter {
        directive: String,
        file: String,
        line_number: usize,
        line: String,
    },
    /// A quoted string still open at the end of its line
    StringNotClosed {
        file: String,
        line_number: usize,
        line: String,
    },
    /// A parameter whose form is recognized but malformed,
    /// e.g. a character literal that is not exactly `'X'`
    InvalidParameterFormat {
        parameter: String,
        span: TokenSpan,
        file: String,
        line_number: usize,
        line: String,
    },
    /// A parameter that is neither a register, value, character
    /// literal nor a known label
    InvalidType {
        parameter: String,
        span: TokenSpan,
        file: String,
        line_number: usize,
        line: String,
    },
    /// A single-character parameter that names no register and no label
    InvalidRegister {
        register: String,
        span: TokenSpan,
        file: String,
        line_number: usize,
        line: String,
    },
    /// A symbol defined twice
    DuplicateSymbol {
        name: String,
        file: String,
        line_number: usize,
        line: String,
    },
    /// An error in a file pulled in with the include directive
    Include {
        path: String,
        error: Box<Error>,
        file: String,
        line_number: usize,
        line: String,
    },
    /// A source file could not be opened or read
    Read { path: String, message: String },
    /// The emitted byte count diverged from the precomputed size
    SizeMismatch { expected: usize, written: usize },
}

impl std::error::Error for Error {}

fn underline_spans(line: &str, spans: &[TokenSpan]) -> String {
    let mut underline = vec![' '; line.len()];
    for span in spans {
        for i in span.start()..span.end() {
            if i < underline.len() {
                underline[i] = '^';
            }
        }
    }
    underline.into_iter().collect()
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (message, context, underlined_spans): (String, _, Vec<TokenSpan>) = match self {
            Error::InvalidInstruction { mnemonic, span, file, line_number, line } => (
                format!("invalid instruction \"{}\"", mnemonic),
                Some((file, line_number, line)), vec![*span],
            ),
            Error::InvalidParameter { parameter, span, file, line_number, line } => (
                format!("invalid parameter \"{}\"", parameter),
                Some((file, line_number, line)), vec![*span],
            ),
            Error::InvalidParameterCount {
                instruction, found, expected, extra_parameter_spans, file, line_number, line,
            } => (
                format!(
                    "invalid parameter count for \"{}\": found {}, expected {}",
                    instruction, found, expected
                ),
                Some((file, line_number, line)), extra_parameter_spans.clone(),
            ),
            Error::MissingParameter { directive, file, line_number, line } => (
                format!("missing parameter for directive \".{}\"", directive),
                Some((file, line_number, line)), vec![],
            ),
            Error::InvalidDirective { directive, span, file, line_number, line } => (
                format!("invalid directive \".{}\"", directive),
                Some((file, line_number, line)), vec![*span],
            ),
            Error::DirectiveMissingParameter { directive, file, line_number, line } => (
                format!("directive \".{}\" requires a parameter", directive),
                Some((file, line_number, line)), vec![],
            ),
            Error::StringNotClosed { file, line_number, line } => (
                "string is not closed at end of line".to_string(),
                Some((file, line_number, line)), vec![],
            ),
            Error::InvalidParameterFormat { parameter, span, file, line_number, line } => (
                format!("invalid format for parameter \"{}\"", parameter),
                Some((file, line_number, line)), vec![*span],
            ),
            Error::InvalidType { parameter, span, file, line_number, line } => (
                format!("invalid parameter type \"{}\"", parameter),
                Some((file, line_number, line)), vec![*span],
            ),
            Error::InvalidRegister { register, span, file, line_number, line } => (
                format!("invalid register \"{}\"", register),
                Some((file, line_number, line)), vec![*span],
            ),
            Error::DuplicateSymbol { name, file, line_number, line } => (
                format!("duplicate symbol \"{}\"", name),
                Some((file, line_number, line)), vec![],
            ),
            Error::Include { path, error, file, line_number, .. } => {
                writeln!(f, "in \"{}\", included from {}:{}:", path, file, line_number)?;
                return write!(f, "{}", error);
            }
            Error::Read { path, message } => (
                format!("failed to open \"{}\": {}", path, message),
                None, vec![],
            ),
            Error::SizeMismatch { expected, written } => (
                format!(
                    "internal error: emitted {} bytes where {} were precomputed",
                    written, expected
                ),
                None, vec![],
            ),
        };

        writeln!(f, "{}", message)?;
        if let Some((file, line_number, line)) = context {
            let location = format!("{}:{}", file, line_number);
            write!(f, "{}\t{}", location, line)?;
            if !underlined_spans.is_empty() {
                writeln!(f)?;
                let padding = " ".repeat(location.len());
                write!(
                    f,
                    "{}\t{}",
                    padding,
                    underline_spans(line, &underlined_spans).green()
                )?;
            }
        }
        Ok(())
    }
}
