//! Turns source files into branches of the syntax tree
//!
//! Every file becomes one branch. A file's lines are parsed front to back;
//! its include directives are processed only after the whole branch is
//! built, so all expressions of a file stay together and included branches
//! are appended in the textual order of their include lines.

use std::fs;
use std::path::{Path, PathBuf};

use crate::assembler::directives::{self, Directive};
use crate::assembler::lexer::{self, CHAR_DIRECTIVE_PREFIX, CHAR_LABEL_POSTFIX};
use crate::assembler::tree::{Branch, Expression, ExpressionKind, Parameter, Section, SyntaxTree};
use crate::assembler::Error;
use crate::logging;

/// Parse the named file and everything it includes into the tree
pub fn parse_file(path: &str, search_dirs: &[PathBuf], tree: &mut SyntaxTree) -> Result<(), Error> {
    let resolved = resolve_path(path, search_dirs);
    let source = fs::read_to_string(&resolved).map_err(|err| Error::Read {
        path: path.to_string(),
        message: err.to_string(),
    })?;

    logging::info(format!("parsing \"{}\"", resolved.display()));
    parse_source(&source, path, search_dirs, tree)
}

/// Parse source text as a new branch of the tree, then process its includes
pub fn parse_source(
    source: &str,
    file: &str,
    search_dirs: &[PathBuf],
    tree: &mut SyntaxTree,
) -> Result<(), Error> {
    let branch_index = tree.branches.len();
    tree.branches.push(Branch {
        file: file.to_string(),
        expressions: Vec::new(),
    });

    for (index, line) in source.lines().enumerate() {
        parse_line(tree, branch_index, line, index + 1, file)?;
    }

    // Includes are deferred until the branch is complete, so a file's own
    // expressions always precede those of the files it includes.
    let mut includes = Vec::new();
    for expression in &tree.branches[branch_index].expressions {
        if !matches!(
            expression.kind(),
            ExpressionKind::Directive { directive: Directive::Include }
        ) {
            continue;
        }
        match expression.parameters().first() {
            Some(parameter) => includes.push((
                parameter.text.clone(),
                expression.line_number(),
                expression.line().to_string(),
            )),
            None => {
                return Err(Error::DirectiveMissingParameter {
                    directive: Directive::Include.name().to_string(),
                    file: file.to_string(),
                    line_number: expression.line_number(),
                    line: expression.line().to_string(),
                });
            }
        }
    }

    for (include_path, line_number, line) in includes {
        parse_file(&include_path, search_dirs, tree).map_err(|error| Error::Include {
            path: include_path,
            error: Box::new(error),
            file: file.to_string(),
            line_number,
            line,
        })?;
    }

    Ok(())
}

/// Classify one source line and append the resulting expressions
fn parse_line(
    tree: &mut SyntaxTree,
    branch_index: usize,
    line: &str,
    line_number: usize,
    file: &str,
) -> Result<(), Error> {
    let Some(tokens) = lexer::tokenize_line(line, line_number, file)? else {
        return Ok(());
    };

    let mut keyword = tokens.keyword;
    let mut keyword_span = tokens.keyword_span;
    let mut parameters = tokens.parameters;

    if tree.section == Section::Symbols && !keyword.starts_with(CHAR_DIRECTIVE_PREFIX) {
        let body = parameters
            .iter()
            .map(|parameter| parameter.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        if tree.symbols.contains_key(&keyword) {
            return Err(Error::DuplicateSymbol {
                name: keyword,
                file: file.to_string(),
                line_number,
                line: line.to_string(),
            });
        }
        tree.symbols.insert(keyword, body);
        return Ok(());
    }

    // A label may share its line with the statement it marks, so keep
    // classifying until the line's tokens are used up.
    loop {
        if let Some(name) = keyword.strip_prefix(CHAR_DIRECTIVE_PREFIX) {
            let directive = directives::lookup(name).ok_or_else(|| Error::InvalidDirective {
                directive: name.to_string(),
                span: keyword_span,
                file: file.to_string(),
                line_number,
                line: line.to_string(),
            })?;
            match directive {
                Directive::Text => tree.section = Section::Text,
                Directive::Symbols => tree.section = Section::Symbols,
                _ => {}
            }
            tree.branches[branch_index].expressions.push(Expression::new(
                ExpressionKind::Directive { directive },
                keyword_span,
                parameters,
                line_number,
                line,
            ));
            return Ok(());
        }

        if keyword.ends_with(CHAR_LABEL_POSTFIX) {
            let name = keyword.trim_end_matches(CHAR_LABEL_POSTFIX).to_string();
            tree.branches[branch_index].expressions.push(Expression::new(
                ExpressionKind::Label { name, position: None },
                keyword_span,
                Vec::new(),
                line_number,
                line,
            ));
            if parameters.is_empty() {
                return Ok(());
            }
            let Parameter { text, span } = parameters.remove(0);
            keyword = text;
            keyword_span = span;
            continue;
        }

        tree.branches[branch_index].expressions.push(Expression::new(
            ExpressionKind::Instruction { mnemonic: keyword },
            keyword_span,
            parameters,
            line_number,
            line,
        ));
        return Ok(());
    }
}

/// Find a source file, trying the path as given first and the search
/// directories afterwards
fn resolve_path(path: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let direct = PathBuf::from(path);
    if direct.is_file() {
        return direct;
    }
    for dir in search_dirs {
        let candidate = dir.join(Path::new(path));
        if candidate.is_file() {
            return candidate;
        }
    }
    direct
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> SyntaxTree {
        let mut tree = SyntaxTree::new();
        parse_source(source, "<test>", &[], &mut tree).unwrap();
        tree
    }

    fn kinds(tree: &SyntaxTree) -> Vec<&ExpressionKind> {
        tree.branches[0].expressions.iter().map(|e| e.kind()).collect()
    }

    #[test]
    fn classifies_directives_labels_and_instructions() {
        let tree = parse(".text\nstart:\nld a, $#0000\n");
        let kinds = kinds(&tree);
        assert!(matches!(kinds[0], ExpressionKind::Directive { directive: Directive::Text }));
        assert!(matches!(kinds[1], ExpressionKind::Label { .. }));
        assert!(matches!(kinds[2], ExpressionKind::Instruction { .. }));
    }

    #[test]
    fn label_keeps_its_line_statement() {
        let tree = parse("start: nop\n");
        let expressions = &tree.branches[0].expressions;
        assert_eq!(expressions.len(), 2);
        assert_eq!(expressions[0].label_name(), Some("start"));
        assert!(
            matches!(expressions[1].kind(), ExpressionKind::Instruction { mnemonic } if mnemonic == "nop")
        );
        assert_eq!(expressions[1].line_number(), 1);
    }

    #[test]
    fn unknown_mnemonics_parse_as_raw_instructions() {
        let tree = parse("frobnicate a, c\n");
        assert!(
            matches!(kinds(&tree)[0], ExpressionKind::Instruction { mnemonic } if mnemonic == "frobnicate")
        );
    }

    #[test]
    fn unknown_directives_are_rejected() {
        let mut tree = SyntaxTree::new();
        let result = parse_source(".org 100\n", "<test>", &[], &mut tree);
        assert!(matches!(result, Err(Error::InvalidDirective { .. })));
    }

    #[test]
    fn symbols_section_collects_definitions() {
        let tree = parse(".symbols\nZERO $#0000\nGREETING \"hi there\"\n.text\nnop\n");
        assert_eq!(tree.symbols.get("ZERO").map(String::as_str), Some("$#0000"));
        assert_eq!(tree.symbols.get("GREETING").map(String::as_str), Some("hi there"));
        // only the section directives and the nop are recorded as expressions
        assert_eq!(tree.branches[0].expressions.len(), 3);
    }

    #[test]
    fn multi_token_symbol_bodies_are_joined_with_spaces() {
        let tree = parse(".symbols\nCLEAR a $#0000\n");
        assert_eq!(tree.symbols.get("CLEAR").map(String::as_str), Some("a $#0000"));
    }

    #[test]
    fn duplicate_symbols_are_rejected() {
        let mut tree = SyntaxTree::new();
        let result = parse_source(".symbols\nX 1\nX 2\n", "<test>", &[], &mut tree);
        assert!(
            matches!(result, Err(Error::DuplicateSymbol { name, line_number: 3, .. }) if name == "X")
        );
    }

    #[test]
    fn missing_include_path_is_rejected() {
        let mut tree = SyntaxTree::new();
        let result = parse_source(".inc\n", "<test>", &[], &mut tree);
        assert!(matches!(result, Err(Error::DirectiveMissingParameter { .. })));
    }

    #[test]
    fn unreadable_include_reports_the_include_site() {
        let mut tree = SyntaxTree::new();
        let result = parse_source(".inc \"no/such/file.asm\"\n", "<test>", &[], &mut tree);
        match result {
            Err(Error::Include { path, error, line_number, .. }) => {
                assert_eq!(path, "no/such/file.asm");
                assert_eq!(line_number, 1);
                assert!(matches!(*error, Error::Read { .. }));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
