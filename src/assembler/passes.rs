//! The translation passes between parsing and emission
//!
//! Size precomputation and label resolution walk the tree in emission order
//! and share one size function, so the offsets handed to labels always match
//! the bytes the emitter later writes.

use std::collections::HashMap;

use crate::assembler::directives;
use crate::assembler::instructions;
use crate::assembler::tree::{Expression, ExpressionKind, Parameter, SyntaxTree};
use crate::assembler::Error;

/// Resolved label offsets by name
pub type LabelMap = HashMap<String, usize>;

/// The number of output bytes one expression stands for
///
/// Unknown instruction mnemonics count as zero here; they are reported with
/// their line context when the emitter tries to encode them.
pub fn expression_size(expression: &Expression, file: &str) -> Result<usize, Error> {
    match expression.kind() {
        ExpressionKind::Label { .. } => Ok(0),
        ExpressionKind::Directive { directive } => {
            directives::directive_size(expression, *directive, file)
        }
        ExpressionKind::Instruction { mnemonic } => Ok(instructions::lookup(mnemonic)
            .map(|descriptor| descriptor.size)
            .unwrap_or(0)),
    }
}

/// Sum the output size of the whole tree
pub fn precompute_size(tree: &SyntaxTree) -> Result<usize, Error> {
    let mut total = 0;
    for branch in &tree.branches {
        for expression in &branch.expressions {
            total += expression_size(expression, &branch.file)?;
        }
    }
    Ok(total)
}

/// Assign every label its byte offset in the output image
///
/// Returns the offsets by name for the translator; when a label is defined
/// more than once, the definition encountered last wins.
pub fn resolve_labels(tree: &mut SyntaxTree) -> Result<LabelMap, Error> {
    let mut labels = LabelMap::new();
    let mut offset = 0;

    for branch in &mut tree.branches {
        let file = branch.file.clone();
        for expression in &mut branch.expressions {
            if let Some(name) = expression.label_name().map(str::to_owned) {
                expression.set_label_position(offset);
                labels.insert(name, offset);
            } else {
                offset += expression_size(expression, &file)?;
            }
        }
    }

    Ok(labels)
}

/// Replace parameter tokens that exactly match a symbol name with the
/// symbol's body
///
/// Expansion is done once per token; bodies of several tokens are split on
/// whitespace and spliced into the parameter list in place.
pub fn expand_symbols(tree: &mut SyntaxTree) {
    let SyntaxTree { branches, symbols, .. } = tree;
    if symbols.is_empty() {
        return;
    }

    for branch in branches {
        for expression in &mut branch.expressions {
            let expandable = match expression.kind() {
                ExpressionKind::Instruction { .. } => true,
                ExpressionKind::Directive { directive } => directive.carries_data(),
                ExpressionKind::Label { .. } => false,
            };
            if !expandable {
                continue;
            }

            let parameters = expression.parameters_mut();
            let previous = std::mem::take(parameters);
            for parameter in previous {
                match symbols.get(&parameter.text) {
                    Some(body) => {
                        for piece in body.split_whitespace() {
                            parameters.push(Parameter {
                                text: piece.to_string(),
                                span: parameter.span,
                            });
                        }
                    }
                    None => parameters.push(parameter),
                }
            }
        }
    }
}
