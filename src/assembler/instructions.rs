//! The instruction set of the Theft CPU
//!
//! Every mnemonic maps to one descriptor carrying the opcode byte, the
//! encoded length and the required parameter count. The `modifier` field
//! names the byte of the encoded instruction that receives the immediate
//! flag (bit 7) and the register selector (bits 4 to 6); the translator
//! consults it instead of hardcoding per-opcode byte positions.
//!
//! The three branch mnemonics deliberately share opcode byte 0x02; the
//! processor distinguishes them by condition bits outside the low byte.

/// Which byte of an encoded instruction carries mode and register bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    /// The instruction takes no mode or register bits
    None,
    /// Bits are packed into the opcode byte itself (byte 0)
    Opcode,
    /// Bits are packed into the trailing extension byte (byte 3)
    Extension,
}

/// Static description of one instruction mnemonic
#[derive(Debug, Clone, Copy)]
pub struct InstructionDescriptor {
    pub mnemonic: &'static str,
    pub opcode: u8,
    pub size: usize,
    pub param_count: usize,
    pub modifier: Modifier,
}

pub const INSTRUCTIONS: [InstructionDescriptor; 21] = [
    InstructionDescriptor { mnemonic: "ld", opcode: 0x00, size: 3, param_count: 2, modifier: Modifier::Opcode },
    InstructionDescriptor { mnemonic: "st", opcode: 0x01, size: 3, param_count: 2, modifier: Modifier::None },
    InstructionDescriptor { mnemonic: "brn", opcode: 0x02, size: 3, param_count: 1, modifier: Modifier::None },
    InstructionDescriptor { mnemonic: "beq", opcode: 0x02, size: 3, param_count: 1, modifier: Modifier::None },
    InstructionDescriptor { mnemonic: "bne", opcode: 0x02, size: 3, param_count: 1, modifier: Modifier::None },
    InstructionDescriptor { mnemonic: "cmp", opcode: 0x03, size: 3, param_count: 1, modifier: Modifier::Opcode },
    InstructionDescriptor { mnemonic: "cal", opcode: 0x04, size: 3, param_count: 1, modifier: Modifier::None },
    InstructionDescriptor { mnemonic: "rts", opcode: 0x05, size: 1, param_count: 0, modifier: Modifier::None },
    InstructionDescriptor { mnemonic: "rti", opcode: 0x06, size: 1, param_count: 0, modifier: Modifier::None },
    InstructionDescriptor { mnemonic: "int", opcode: 0x07, size: 1, param_count: 0, modifier: Modifier::None },
    InstructionDescriptor { mnemonic: "din", opcode: 0x08, size: 1, param_count: 0, modifier: Modifier::None },
    InstructionDescriptor { mnemonic: "ein", opcode: 0x09, size: 1, param_count: 0, modifier: Modifier::None },
    InstructionDescriptor { mnemonic: "or", opcode: 0x0a, size: 4, param_count: 2, modifier: Modifier::Extension },
    InstructionDescriptor { mnemonic: "and", opcode: 0x0b, size: 4, param_count: 2, modifier: Modifier::Extension },
    InstructionDescriptor { mnemonic: "inc", opcode: 0x0c, size: 4, param_count: 2, modifier: Modifier::Extension },
    InstructionDescriptor { mnemonic: "dec", opcode: 0x0d, size: 4, param_count: 2, modifier: Modifier::Extension },
    InstructionDescriptor { mnemonic: "add", opcode: 0x0e, size: 4, param_count: 2, modifier: Modifier::Extension },
    InstructionDescriptor { mnemonic: "sub", opcode: 0x0f, size: 4, param_count: 2, modifier: Modifier::Extension },
    InstructionDescriptor { mnemonic: "shr", opcode: 0x19, size: 4, param_count: 2, modifier: Modifier::Extension },
    InstructionDescriptor { mnemonic: "shl", opcode: 0x29, size: 4, param_count: 2, modifier: Modifier::Extension },
    InstructionDescriptor { mnemonic: "nop", opcode: 0x39, size: 1, param_count: 0, modifier: Modifier::None },
];

/// Look up the descriptor for a mnemonic, case-insensitively
pub fn lookup(mnemonic: &str) -> Option<&'static InstructionDescriptor> {
    let lower = mnemonic.to_lowercase();
    INSTRUCTIONS.iter().find(|descriptor| descriptor.mnemonic == lower)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(lookup("nop").unwrap().opcode, 0x39);
        assert_eq!(lookup("NOP").unwrap().opcode, 0x39);
        assert_eq!(lookup("Shl").unwrap().opcode, 0x29);
    }

    #[test]
    fn unknown_mnemonics_are_rejected() {
        assert!(lookup("mov").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn branch_mnemonics_share_their_opcode_byte() {
        assert_eq!(lookup("brn").unwrap().opcode, 0x02);
        assert_eq!(lookup("beq").unwrap().opcode, 0x02);
        assert_eq!(lookup("bne").unwrap().opcode, 0x02);
    }

    #[test]
    fn register_instructions_use_the_extension_byte() {
        for mnemonic in ["or", "and", "inc", "dec", "add", "sub", "shr", "shl"] {
            let descriptor = lookup(mnemonic).unwrap();
            assert_eq!(descriptor.modifier, Modifier::Extension);
            assert_eq!(descriptor.size, 4);
        }
    }

    #[test]
    fn load_and_compare_modify_their_opcode_byte() {
        assert_eq!(lookup("ld").unwrap().modifier, Modifier::Opcode);
        assert_eq!(lookup("cmp").unwrap().modifier, Modifier::Opcode);
    }
}
