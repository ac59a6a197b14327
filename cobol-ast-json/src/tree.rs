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

//! Generic parse tree model.
//!
//! A parse tree is made of terminal nodes (matched tokens) and rule nodes
//! (matched grammar productions). Rule nodes only carry the index of their
//! production; the name is looked up in a [`RuleNames`] table owned by the
//! grammar that produced the tree.

use codespan_reporting::diagnostic;
use codespan_reporting::files;
use std::collections::HashMap;
use std::fmt;

/// File identifier.
/// References a source file in the source database.
pub type FileId = usize;

/// Source database.
/// Stores the source file contents for reference.
pub type SourceDatabase = files::SimpleFiles<String, String>;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceLocation {
    /// Byte offset into the file (counted from zero).
    pub offset: usize,
    /// Line number (counted from zero).
    pub line: usize,
    /// Column number (counted from zero)
    pub column: usize,
}

#[derive(Default, Copy, Clone, PartialEq, Eq)]
pub struct SourceRange {
    pub file: FileId,
    pub start: SourceLocation,
    pub end: SourceLocation,
}

/// Leaf of the parse tree: a single matched token.
#[derive(Debug, Clone)]
pub struct TerminalNode {
    pub loc: SourceRange,
    /// Exact matched token text.
    pub text: String,
    /// Grammar-defined token type.
    pub symbol: i32,
}

/// Internal node of the parse tree: a matched grammar production.
#[derive(Debug, Clone)]
pub struct RuleNode {
    pub loc: SourceRange,
    /// Index of the production in the grammar's rule name table.
    pub rule_index: usize,
    /// Source text matched by the production.
    pub text: String,
    /// Sub-nodes in match order.
    pub children: Vec<ParseTree>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseTree {
    Terminal(TerminalNode),
    Rule(RuleNode),
}

/// Lookup from a rule index to the declared rule name.
pub trait RuleNames {
    fn rule_name(&self, index: usize) -> Option<&str>;
}

impl<T: AsRef<str>> RuleNames for [T] {
    fn rule_name(&self, index: usize) -> Option<&str> {
        self.get(index).map(AsRef::as_ref)
    }
}

impl<T: AsRef<str>> RuleNames for Vec<T> {
    fn rule_name(&self, index: usize) -> Option<&str> {
        self.as_slice().rule_name(index)
    }
}

impl<T: AsRef<str>> RuleNames for HashMap<usize, T> {
    fn rule_name(&self, index: usize) -> Option<&str> {
        self.get(&index).map(AsRef::as_ref)
    }
}

impl SourceLocation {
    /// Construct a new source location.
    ///
    /// The `line_starts` indicates the byte offsets where new lines
    /// start in the file. The first element should thus be `0` since
    /// every file has at least one line starting at offset `0`.
    pub fn new(offset: usize, line_starts: &[usize]) -> SourceLocation {
        let mut loc = SourceLocation { offset, line: 0, column: offset };
        for (line, start) in line_starts.iter().enumerate() {
            if *start > offset {
                break;
            }
            loc = SourceLocation { offset, line, column: offset - start };
        }
        loc
    }
}

impl SourceRange {
    pub fn primary(&self) -> diagnostic::Label<FileId> {
        diagnostic::Label::primary(self.file, self.start.offset..self.end.offset)
    }
}

impl fmt::Debug for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceRange").finish_non_exhaustive()
    }
}

impl Eq for TerminalNode {}
impl PartialEq for TerminalNode {
    fn eq(&self, other: &Self) -> bool {
        // Implement structural equality, leave out loc.
        self.text == other.text && self.symbol == other.symbol
    }
}

impl Eq for RuleNode {}
impl PartialEq for RuleNode {
    fn eq(&self, other: &Self) -> bool {
        // Implement structural equality, leave out loc.
        self.rule_index == other.rule_index
            && self.text == other.text
            && self.children == other.children
    }
}

impl TerminalNode {
    pub fn new(text: impl Into<String>, symbol: i32) -> TerminalNode {
        TerminalNode { loc: SourceRange::default(), text: text.into(), symbol }
    }
}

impl RuleNode {
    pub fn new(rule_index: usize, text: impl Into<String>, children: Vec<ParseTree>) -> RuleNode {
        RuleNode { loc: SourceRange::default(), rule_index, text: text.into(), children }
    }
}

impl From<TerminalNode> for ParseTree {
    fn from(node: TerminalNode) -> Self {
        ParseTree::Terminal(node)
    }
}

impl From<RuleNode> for ParseTree {
    fn from(node: RuleNode) -> Self {
        ParseTree::Rule(node)
    }
}

impl ParseTree {
    pub fn loc(&self) -> &SourceRange {
        match self {
            ParseTree::Terminal(TerminalNode { loc, .. })
            | ParseTree::Rule(RuleNode { loc, .. }) => loc,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            ParseTree::Terminal(TerminalNode { text, .. })
            | ParseTree::Rule(RuleNode { text, .. }) => text,
        }
    }

    /// Return the sub-nodes of a rule node; terminals have none.
    pub fn children(&self) -> &[ParseTree] {
        match self {
            ParseTree::Terminal(_) => &[],
            ParseTree::Rule(RuleNode { children, .. }) => children,
        }
    }

    /// Return the rule index, if this is a rule node.
    pub fn rule_index(&self) -> Option<usize> {
        match self {
            ParseTree::Terminal(_) => None,
            ParseTree::Rule(RuleNode { rule_index, .. }) => Some(*rule_index),
        }
    }

    /// Collect the terminal nodes of the tree, left to right.
    pub fn terminals(&self) -> Vec<&TerminalNode> {
        let mut terminals = vec![];
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                ParseTree::Terminal(terminal) => terminals.push(terminal),
                ParseTree::Rule(rule) => stack.extend(rule.children.iter().rev()),
            }
        }
        terminals
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            stack.extend(node.children().iter().map(|child| (child, depth + 1)));
        }
        max_depth
    }
}
