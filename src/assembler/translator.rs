//! Encodes instruction parameters into their operand bytes
//!
//! The translator fills a work buffer whose byte 0 already holds the raw
//! opcode. Addresses and values land big-endian in bytes 1 and 2; the
//! immediate flag (bit 7) and the register selector (bits 4 to 6) go into
//! the byte named by the instruction's [Modifier]. The low four bits of the
//! opcode byte are never touched.

use crate::assembler::instructions::{InstructionDescriptor, Modifier};
use crate::assembler::lexer::{CHAR_BINARY_POSTFIX, CHAR_DECIMAL_POSTFIX};
use crate::assembler::passes::LabelMap;
use crate::assembler::tree::Expression;
use crate::assembler::Error;

const CHAR_LITERAL_DELIMITER: u8 = b'\'';
const VALUE_PREFIX: char = '$';
const IMMEDIATE_PREFIX: char = '#';
const IMMEDIATE_FLAG: u8 = 0x80;
const REGISTER_SHIFT: u32 = 4;

/// Map a register name to its 3-bit id
fn register_id(register: char) -> Option<u8> {
    match register.to_ascii_lowercase() {
        'a' => Some(0),
        'c' => Some(1),
        'd' => Some(2),
        'e' => Some(3),
        'f' => Some(4),
        'g' => Some(5),
        'h' => Some(6),
        _ => None,
    }
}

/// Translate one parameter of an instruction into the work buffer
pub fn translate_parameter(
    descriptor: &InstructionDescriptor,
    expression: &Expression,
    index: usize,
    work: &mut [u8],
    labels: &LabelMap,
    file: &str,
) -> Result<(), Error> {
    let text = expression.parameters()[index].text.as_str();

    if text.as_bytes().first() == Some(&CHAR_LITERAL_DELIMITER) {
        return translate_char_literal(expression, index, work, file);
    }

    if let Some(rest) = text.strip_prefix(VALUE_PREFIX) {
        return translate_value(descriptor, expression, index, work, file, rest);
    }

    let mut chars = text.chars();
    if let (Some(register), None) = (chars.next(), chars.next()) {
        if let Some(id) = register_id(register) {
            apply_register(descriptor, work, id);
            return Ok(());
        }
        if let Some(&position) = labels.get(text) {
            write_address(work, position);
            return Ok(());
        }
        return Err(expression.invalid_register(index, file));
    }

    if let Some(&position) = labels.get(text) {
        write_address(work, position);
        return Ok(());
    }

    Err(expression.invalid_type(index, file))
}

/// A character literal is exactly `'X'`; its ASCII byte goes to byte 1
fn translate_char_literal(
    expression: &Expression,
    index: usize,
    work: &mut [u8],
    file: &str,
) -> Result<(), Error> {
    let bytes = expression.parameters()[index].text.as_bytes();
    if bytes.len() != 3 || bytes[2] != CHAR_LITERAL_DELIMITER {
        return Err(expression.invalid_parameter_format(index, file));
    }
    work[1] = bytes[1];
    Ok(())
}

/// Addresses and immediate values: `$` starts an address, `$#` an immediate
/// value. Numbers are hexadecimal unless a trailing `t` (decimal) or `b`
/// (binary) says otherwise.
fn translate_value(
    descriptor: &InstructionDescriptor,
    expression: &Expression,
    index: usize,
    work: &mut [u8],
    file: &str,
    rest: &str,
) -> Result<(), Error> {
    let (numeric, immediate) = match rest.strip_prefix(IMMEDIATE_PREFIX) {
        Some(numeric) => (numeric, true),
        None => (rest, false),
    };

    let value = parse_numeric(numeric)
        .ok_or_else(|| expression.invalid_parameter_format(index, file))?;

    write_address(work, value as usize);

    if immediate {
        match descriptor.modifier {
            Modifier::Opcode => work[0] |= IMMEDIATE_FLAG,
            Modifier::Extension => work[3] |= IMMEDIATE_FLAG,
            Modifier::None => {}
        }
    }
    Ok(())
}

/// Parse a 16-bit number, defaulting to hexadecimal. A trailing `t` marks a
/// decimal literal and a trailing `b` a binary one; digits that do not fit
/// the postfix base are re-read as hexadecimal.
fn parse_numeric(numeric: &str) -> Option<u16> {
    let (digits, radix) = if let Some(digits) = numeric.strip_suffix(CHAR_DECIMAL_POSTFIX) {
        (digits, 10)
    } else if let Some(digits) = numeric.strip_suffix(CHAR_BINARY_POSTFIX) {
        (digits, 2)
    } else {
        (numeric, 16)
    };
    u16::from_str_radix(digits, radix)
        .or_else(|_| u16::from_str_radix(digits, 16))
        .ok()
}

fn write_address(work: &mut [u8], position: usize) {
    work[1] = ((position >> 8) & 0xff) as u8;
    work[2] = (position & 0xff) as u8;
}

fn apply_register(descriptor: &InstructionDescriptor, work: &mut [u8], id: u8) {
    match descriptor.modifier {
        Modifier::Opcode => work[0] |= id << REGISTER_SHIFT,
        Modifier::Extension => work[3] |= id << REGISTER_SHIFT,
        Modifier::None => {}
    }
}
