use std::path::PathBuf;

use theftasm::assembler::tree::SyntaxTree;
use theftasm::assembler::{self, parser, passes, Error};

fn search_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("tests/programs")]
}

/// Assemble a fixture program, asserting success.
fn assemble_program(name: &str) -> Vec<u8> {
    assembler::assemble_from_file(&format!("tests/programs/{}", name), &search_dirs())
        .unwrap_or_else(|e| panic!("failed to assemble {}: {}", name, e))
}

/// Parse a fixture program (with its includes) without translating it.
fn parse_program(name: &str) -> SyntaxTree {
    let mut tree = SyntaxTree::new();
    parser::parse_file(&format!("tests/programs/{}", name), &search_dirs(), &mut tree)
        .unwrap_or_else(|e| panic!("failed to parse {}: {}", name, e));
    tree
}

#[test]
fn counter_program_assembles_to_the_expected_image() {
    let image = assemble_program("main.asm");
    #[rustfmt::skip]
    let expected = vec![
        0x90, 0x00, 0x00,       // ld c, $#0000
        0x0c, 0x00, 0x01, 0x90, // inc c, $#0001
        0x83, 0x00, 0x0a,       // cmp $#000a
        0x02, 0x00, 0x03,       // bne loop
        0x04, 0x00, 0x13,       // cal double
        0x02, 0x00, 0x10,       // brn halt
        0x29, 0x00, 0x01, 0x80, // shl a, $#0001
        0x05,                   // rts
    ];
    assert_eq!(image, expected);
}

#[test]
fn included_branches_follow_the_including_file() {
    // the entry file's own expressions are emitted before the included ones
    let image = assemble_program("inc_entry.asm");
    assert_eq!(image, vec![0x39, 0x39, 0x39]);

    let tree = parse_program("inc_entry.asm");
    assert_eq!(tree.branches.len(), 2);
    assert_eq!(tree.branches[0].file, "tests/programs/inc_entry.asm");
    assert_eq!(tree.branches[1].file, "inc_child.asm");
}

#[test]
fn label_offsets_span_included_files() {
    let mut tree = parse_program("main.asm");
    let labels = passes::resolve_labels(&mut tree).unwrap();
    assert_eq!(labels.get("init"), Some(&0));
    assert_eq!(labels.get("loop"), Some(&3));
    assert_eq!(labels.get("halt"), Some(&16));
    assert_eq!(labels.get("double"), Some(&19));
}

#[test]
fn precomputed_size_matches_the_emitted_image() {
    let tree = parse_program("main.asm");
    let expected = passes::precompute_size(&tree).unwrap();
    assert_eq!(assemble_program("main.asm").len(), expected);
}

#[test]
fn symbols_are_shared_across_branches() {
    let tree = parse_program("main.asm");
    assert_eq!(tree.symbols.get("COUNTER").map(String::as_str), Some("c"));
    assert_eq!(tree.symbols.get("START").map(String::as_str), Some("$#0000"));
}

#[test]
fn missing_included_files_report_the_include_chain() {
    let result = assembler::assemble(".inc \"missing.asm\"\n");
    match result {
        Err(Error::Include { path, error, .. }) => {
            assert_eq!(path, "missing.asm");
            assert!(matches!(*error, Error::Read { .. }));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn missing_entry_files_report_the_system_error() {
    let result = assembler::assemble_from_file("tests/programs/missing.asm", &[]);
    assert!(matches!(result, Err(Error::Read { .. })));
}
