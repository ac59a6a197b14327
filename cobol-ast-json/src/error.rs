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

//! Error codes and diagnostic rendering.

use codespan_reporting::diagnostic::Diagnostic;
use codespan_reporting::files;
use codespan_reporting::term;
use codespan_reporting::term::termcolor;
use std::fmt;

use crate::tree::{FileId, SourceDatabase};

/// List of unique errors reported as diagnostics.
#[repr(u16)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    FileRead = 1,
    GrammarParse = 2,
    MalformedTree = 3,
    RuleNameResolution = 4,
    DepthLimitExceeded = 5,
    JsonEncoding = 6,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "E{}", *self as u16)
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> Self {
        format!("{}", code)
    }
}

/// Render a diagnostic with the default terminal configuration.
pub fn emit(
    diagnostic: &Diagnostic<FileId>,
    sources: &SourceDatabase,
    writer: &mut dyn termcolor::WriteColor,
) -> Result<(), files::Error> {
    let config = term::Config::default();
    term::emit(writer, &config, sources, diagnostic)
}
