//! An assembler for the Theft fantasy CPU, featuring:
//! - a line-oriented two-pass assembler
//! - multi-file sources through include directives
//! - text-substitution symbols
//! - flat ROM image output

pub mod assembler;
pub mod logging;
