#![no_main]

use cobol_ast_json::error::ErrorCode;
use cobol_ast_json::{parser, serializer, tree};
use libfuzzer_sys::fuzz_target;

// Fuzz cobol_ast_json::serializer::generate on parsed COBOL sources.
fuzz_target!(|source: String| {
    let mut sources = tree::SourceDatabase::new();
    let Ok(tree) = parser::parse_inline(&mut sources, "input.cbl", source) else {
        return;
    };
    match serializer::generate(&tree, parser::RULE_NAMES) {
        Ok(json) => assert!(json.starts_with('{')),
        Err(err) => assert_eq!(err.code(), ErrorCode::DepthLimitExceeded),
    }
});
