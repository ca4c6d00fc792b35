//! Walks the tree in order and writes the output image

use crate::assembler::directives;
use crate::assembler::instructions;
use crate::assembler::passes::{self, LabelMap};
use crate::assembler::translator;
use crate::assembler::tree::{Expression, ExpressionKind, SyntaxTree};
use crate::assembler::Error;
use crate::logging;

/// Translate the whole tree into its ROM image
///
/// The image buffer is preallocated from the precomputed size; every
/// expression appends its bytes at the running write index. The index
/// reaching exactly the end of the buffer is the emitter's closing
/// invariant.
pub fn emit_tree(tree: &SyntaxTree, labels: &LabelMap) -> Result<Vec<u8>, Error> {
    let total = passes::precompute_size(tree)?;
    logging::info(format!("precomputed size: {:#x} bytes", total));

    let mut image = vec![0x00; total];
    let mut index = 0;

    for branch in &tree.branches {
        for expression in &branch.expressions {
            let bytes = match expression.kind() {
                ExpressionKind::Label { .. } => continue,
                ExpressionKind::Directive { directive } => {
                    directives::directive_bytes(expression, *directive, &branch.file)?
                }
                ExpressionKind::Instruction { mnemonic } => {
                    encode_instruction(expression, mnemonic, labels, &branch.file)?
                }
            };

            if index + bytes.len() > image.len() {
                return Err(Error::SizeMismatch {
                    expected: total,
                    written: index + bytes.len(),
                });
            }
            image[index..index + bytes.len()].copy_from_slice(&bytes);
            index += bytes.len();
        }
    }

    if index != total {
        return Err(Error::SizeMismatch { expected: total, written: index });
    }
    Ok(image)
}

/// Encode one instruction expression into its work buffer
fn encode_instruction(
    expression: &Expression,
    mnemonic: &str,
    labels: &LabelMap,
    file: &str,
) -> Result<Vec<u8>, Error> {
    let descriptor = instructions::lookup(mnemonic)
        .ok_or_else(|| expression.invalid_instruction(file))?;

    if expression.parameters().len() != descriptor.param_count {
        return Err(expression.invalid_parameter_count(descriptor.param_count, file));
    }

    let mut work = vec![0x00; descriptor.size];
    work[0] = descriptor.opcode;
    for index in 0..expression.parameters().len() {
        translator::translate_parameter(descriptor, expression, index, &mut work, labels, file)?;
    }
    Ok(work)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::parser;
    use crate::assembler::passes::resolve_labels;

    fn emit(source: &str) -> Result<Vec<u8>, Error> {
        let mut tree = SyntaxTree::new();
        parser::parse_source(source, "<test>", &[], &mut tree)?;
        let labels = resolve_labels(&mut tree)?;
        emit_tree(&tree, &labels)
    }

    #[test]
    fn instructions_and_data_interleave_in_source_order() {
        let image = emit("nop\n.byte 0x41\nld c, $#0002\n.nullpadding 2\n").unwrap();
        assert_eq!(image, vec![0x39, 0x41, 0x90, 0x00, 0x02, 0x00, 0x00]);
    }

    #[test]
    fn labels_and_section_directives_emit_no_bytes() {
        let image = emit(".text\nstart:\nnop\nend:\n").unwrap();
        assert_eq!(image, vec![0x39]);
    }

    #[test]
    fn wrong_parameter_count_aborts_emission() {
        let result = emit("ld a\n");
        assert!(matches!(
            result,
            Err(Error::InvalidParameterCount { found: 1, expected: 2, .. })
        ));
    }

    #[test]
    fn unknown_mnemonics_abort_emission() {
        let result = emit("jmp $0000\n");
        assert!(matches!(result, Err(Error::InvalidInstruction { .. })));
    }

    #[test]
    fn branch_targets_resolve_across_data_directives() {
        let image = emit(".bytes 2 0xaa 0xbb\nentry: nop\nbrn entry\n").unwrap();
        assert_eq!(image, vec![0xaa, 0xbb, 0x39, 0x02, 0x00, 0x02]);
    }
}
