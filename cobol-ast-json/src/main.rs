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

//! COBOL parse tree exporter.

use argh::FromArgs;
use codespan_reporting::diagnostic::Diagnostic;
use codespan_reporting::term::termcolor;
use std::io::IsTerminal;

use cobol_ast_json::tree::{FileId, SourceDatabase};
use cobol_ast_json::{error, parser, serializer};

#[derive(FromArgs, Debug)]
/// Parse a COBOL program and print its parse tree as JSON.
struct Opt {
    #[argh(positional)]
    /// input COBOL source file.
    /// The JSON document is printed on stdout.
    input_file: String,
}

/// Print `diagnostic` on stderr. Diagnostics that cannot be rendered
/// against the source database are printed as plain messages.
fn report(sources: &SourceDatabase, diagnostic: &Diagnostic<FileId>) {
    let color = if std::io::stderr().is_terminal() {
        termcolor::ColorChoice::Auto
    } else {
        termcolor::ColorChoice::Never
    };
    let writer = termcolor::StandardStream::stderr(color);
    if error::emit(diagnostic, sources, &mut writer.lock()).is_err() {
        match &diagnostic.code {
            Some(code) => eprintln!("error[{}]: {}", code, diagnostic.message),
            None => eprintln!("error: {}", diagnostic.message),
        }
    }
}

fn export(input_file: &str) -> Result<(), String> {
    let mut sources = SourceDatabase::new();
    let tree = parser::parse_file(&mut sources, input_file).map_err(|err| {
        report(&sources, &err);
        String::from("Error while parsing input")
    })?;
    let json = serializer::generate(&tree, parser::RULE_NAMES).map_err(|err| {
        report(&sources, &err.diagnostic());
        String::from("Error while serializing the parse tree")
    })?;
    println!("{}", json);
    Ok(())
}

fn main() -> Result<(), String> {
    let opt: Opt = argh::from_env();
    export(&opt.input_file)
}
