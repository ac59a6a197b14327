// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Parse tree to JSON serializer.
//!
//! Every node of the tree becomes a JSON object tagged with a `type`
//! key:
//!
//! ```text
//! Terminal: { "type": "terminal", "text": <string>, "symbol": <integer> }
//! Rule:     { "type": "rule", "rule": <string>, "text": <string>, "children": [ <node>, ... ] }
//! ```
//!
//! The `children` key is left out for rule nodes without children.
//! Keys are emitted in the order shown above.

use codespan_reporting::diagnostic::Diagnostic;
use serde::Serialize;

use crate::error::ErrorCode;
use crate::tree::{FileId, ParseTree, RuleNames, SourceRange};

/// Maximum nesting depth accepted by [`Serializer::new`].
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Type of serialization errors.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("rule index {index} has no rule name")]
    RuleNameResolution { index: usize, loc: SourceRange },
    #[error("parse tree exceeds the maximum depth of {limit} nodes")]
    DepthLimitExceeded { limit: usize, loc: SourceRange },
    #[error("could not JSON serialize parse tree: {0}")]
    Json(#[from] serde_json::Error),
}

/// JSON view of a parse tree node.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Node<'t> {
    Terminal {
        text: &'t str,
        symbol: i32,
    },
    Rule {
        rule: &'t str,
        text: &'t str,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        children: Vec<Node<'t>>,
    },
}

/// Parse tree serializer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Serializer {
    max_depth: usize,
}

impl Default for Serializer {
    fn default() -> Serializer {
        Serializer { max_depth: DEFAULT_MAX_DEPTH }
    }
}

impl Serializer {
    pub fn new() -> Serializer {
        Serializer::default()
    }

    /// Limit the nesting depth of the serialized tree. The root node
    /// is at depth 1.
    pub fn with_max_depth(self, max_depth: usize) -> Serializer {
        Serializer { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Turn the parse tree into a JSON value.
    pub fn serialize<N: RuleNames + ?Sized>(
        &self,
        tree: &ParseTree,
        names: &N,
    ) -> Result<serde_json::Value, SerializeError> {
        let node = self.convert(tree, names, 1)?;
        Ok(serde_json::to_value(node)?)
    }

    /// Turn the parse tree into a pretty-printed JSON document.
    pub fn generate<N: RuleNames + ?Sized>(
        &self,
        tree: &ParseTree,
        names: &N,
    ) -> Result<String, SerializeError> {
        let node = self.convert(tree, names, 1)?;
        Ok(serde_json::to_string_pretty(&node)?)
    }

    fn convert<'t, N: RuleNames + ?Sized>(
        &self,
        tree: &'t ParseTree,
        names: &'t N,
        depth: usize,
    ) -> Result<Node<'t>, SerializeError> {
        if depth > self.max_depth {
            return Err(SerializeError::DepthLimitExceeded {
                limit: self.max_depth,
                loc: *tree.loc(),
            });
        }
        match tree {
            ParseTree::Terminal(terminal) => {
                Ok(Node::Terminal { text: &terminal.text, symbol: terminal.symbol })
            }
            ParseTree::Rule(rule) => {
                let name = names.rule_name(rule.rule_index).ok_or(
                    SerializeError::RuleNameResolution { index: rule.rule_index, loc: rule.loc },
                )?;
                let children = rule
                    .children
                    .iter()
                    .map(|child| self.convert(child, names, depth + 1))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Node::Rule { rule: name, text: &rule.text, children })
            }
        }
    }
}

impl SerializeError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SerializeError::RuleNameResolution { .. } => ErrorCode::RuleNameResolution,
            SerializeError::DepthLimitExceeded { .. } => ErrorCode::DepthLimitExceeded,
            SerializeError::Json(_) => ErrorCode::JsonEncoding,
        }
    }

    /// Location of the offending node, if any.
    pub fn loc(&self) -> Option<&SourceRange> {
        match self {
            SerializeError::RuleNameResolution { loc, .. }
            | SerializeError::DepthLimitExceeded { loc, .. } => Some(loc),
            SerializeError::Json(_) => None,
        }
    }

    pub fn diagnostic(&self) -> Diagnostic<FileId> {
        let diagnostic = Diagnostic::error().with_code(self.code()).with_message(self.to_string());
        match self.loc() {
            Some(loc) => diagnostic.with_labels(vec![loc.primary()]),
            None => diagnostic,
        }
    }
}

/// Turn the parse tree into a JSON value, using the default depth limit.
pub fn serialize<N: RuleNames + ?Sized>(
    tree: &ParseTree,
    names: &N,
) -> Result<serde_json::Value, SerializeError> {
    Serializer::new().serialize(tree, names)
}

/// Turn the parse tree into a pretty-printed JSON document, using the
/// default depth limit.
pub fn generate<N: RuleNames + ?Sized>(
    tree: &ParseTree,
    names: &N,
) -> Result<String, SerializeError> {
    Serializer::new().generate(tree, names)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tree::{RuleNode, TerminalNode};
    use googletest::prelude::{assert_that, eq};
    use serde_json::{json, Value};

    const NAMES: &[&str] = &["statement", "identifier", "paragraph"];

    fn terminal(text: &str, symbol: i32) -> ParseTree {
        TerminalNode::new(text, symbol).into()
    }

    fn rule(index: usize, text: &str, children: Vec<ParseTree>) -> ParseTree {
        RuleNode::new(index, text, children).into()
    }

    fn keys(value: &Value) -> Vec<&str> {
        value.as_object().unwrap().keys().map(String::as_str).collect()
    }

    /// Walk the JSON output alongside the tree and check that both
    /// have the same shape.
    fn assert_isomorphic(tree: &ParseTree, value: &Value) {
        assert_eq!(value["text"], json!(tree.text()));
        match tree {
            ParseTree::Terminal(terminal) => {
                assert_eq!(value["type"], json!("terminal"));
                assert_eq!(value["symbol"], json!(terminal.symbol));
            }
            ParseTree::Rule(rule) => {
                assert_eq!(value["type"], json!("rule"));
                assert_eq!(value["rule"], json!(NAMES[rule.rule_index]));
                let children = value.get("children").and_then(Value::as_array);
                let children = children.map(Vec::as_slice).unwrap_or_default();
                assert_eq!(children.len(), rule.children.len());
                for (child, value) in rule.children.iter().zip(children) {
                    assert_isomorphic(child, value);
                }
            }
        }
    }

    #[test]
    fn terminal_node() {
        let value = serialize(&terminal("MOVE", 42), NAMES).unwrap();
        assert_eq!(value, json!({"type": "terminal", "text": "MOVE", "symbol": 42}));
        assert_eq!(keys(&value), vec!["type", "text", "symbol"]);
    }

    #[test]
    fn rule_node_with_children() {
        let tree = rule(0, "MOVE A TO B", vec![terminal("MOVE", 42), terminal("A", 7)]);
        let value = serialize(&tree, NAMES).unwrap();
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"type":"rule","rule":"statement","text":"MOVE A TO B","children":[{"type":"terminal","text":"MOVE","symbol":42},{"type":"terminal","text":"A","symbol":7}]}"#
        );
        assert_eq!(keys(&value), vec!["type", "rule", "text", "children"]);
    }

    #[test]
    fn rule_node_without_children() {
        let value = serialize(&rule(2, "", vec![]), NAMES).unwrap();
        assert_eq!(value, json!({"type": "rule", "rule": "paragraph", "text": ""}));
        assert!(value.get("children").is_none());
    }

    #[test]
    fn sibling_order_is_preserved() {
        let tree = rule(
            0,
            "A B C",
            vec![
                terminal("A", 3),
                rule(1, "B", vec![terminal("B", 1)]),
                rule(2, "", vec![]),
                terminal("C", 2),
            ],
        );
        let value = serialize(&tree, NAMES).unwrap();
        assert_isomorphic(&tree, &value);
        let texts: Vec<_> = value["children"]
            .as_array()
            .unwrap()
            .iter()
            .map(|child| child["text"].as_str().unwrap())
            .collect();
        assert_eq!(texts, vec!["A", "B", "", "C"]);
    }

    #[test]
    fn serialization_is_deterministic() {
        let tree = rule(0, "X Y", vec![terminal("X", 1), rule(1, "Y", vec![terminal("Y", 1)])]);
        let first = generate(&tree, NAMES).unwrap();
        let second = generate(&tree, NAMES).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, serde_json::to_string_pretty(&serialize(&tree, NAMES).unwrap()).unwrap());
    }

    #[test]
    fn text_is_not_altered() {
        let text = "DISPLAY \"Hello,\tWorld!\" \u{e9}";
        let value = serialize(&terminal(text, 5), NAMES).unwrap();
        assert_eq!(value["text"], json!(text));
    }

    #[test]
    fn unresolved_rule_name() {
        let tree = rule(0, "A", vec![rule(9, "A", vec![terminal("A", 1)])]);
        let err = serialize(&tree, NAMES).unwrap_err();
        assert!(matches!(err, SerializeError::RuleNameResolution { index: 9, .. }));
        assert_that!(err.code(), eq(ErrorCode::RuleNameResolution));
        assert!(generate(&tree, NAMES).is_err());
    }

    #[test]
    fn terminal_without_text() {
        let tree = rule(0, "", vec![terminal("", 5)]);
        let value = serialize(&tree, NAMES).unwrap();
        assert_eq!(value["children"][0], json!({"type": "terminal", "text": "", "symbol": 5}));
        assert_eq!(keys(&value["children"][0]), vec!["type", "text", "symbol"]);
    }

    #[test]
    fn depth_limit() {
        let mut tree = terminal("X", 1);
        for _ in 0..9 {
            tree = rule(1, "X", vec![tree]);
        }
        assert_eq!(tree.depth(), 10);

        let serializer = Serializer::new().with_max_depth(10);
        assert!(serializer.serialize(&tree, NAMES).is_ok());

        let serializer = Serializer::new().with_max_depth(9);
        let err = serializer.serialize(&tree, NAMES).unwrap_err();
        assert!(matches!(err, SerializeError::DepthLimitExceeded { limit: 9, .. }));
    }

    #[test]
    fn default_configuration() {
        assert_that!(Serializer::new().max_depth(), eq(DEFAULT_MAX_DEPTH));
        assert_eq!(Serializer::default(), Serializer::new());
    }

    #[test]
    fn error_diagnostic() {
        let mut tree = RuleNode::new(7, "STOP RUN", vec![]);
        tree.loc.start.offset = 4;
        tree.loc.end.offset = 12;
        let err = serialize(&ParseTree::Rule(tree), NAMES).unwrap_err();
        let diagnostic = err.diagnostic();
        assert_eq!(diagnostic.code.as_deref(), Some("E4"));
        assert_eq!(diagnostic.message, "rule index 7 has no rule name");
        assert_eq!(diagnostic.labels.len(), 1);
        assert_eq!(diagnostic.labels[0].range, 4..12);
    }
}
