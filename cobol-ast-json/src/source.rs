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

//! COBOL reference format handling.
//!
//! Fixed-format (card image) sources reserve columns 1-6 for sequence
//! numbers, column 7 for the indicator, and columns 73 onward for
//! identification. Only columns 8-72 carry program text. Normalization
//! blanks the reserved areas and comment lines, and in both formats the
//! inline comments introduced by `*>`. Every removed character is
//! replaced by spaces of the same byte length, so that offsets into the
//! normalized source are offsets into the original one.
//!
//! Continuation lines (indicator `-`) are not joined: the indicator is
//! blanked like any other, so a nonnumeric literal continued on the next
//! line is rejected by the parser.

/// Layout of a COBOL source file.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SourceFormat {
    Fixed,
    Free,
}

const INDICATOR_COLUMN: usize = 6;
const CODE_AREA_END: usize = 72;

impl SourceFormat {
    /// Guess the format from the layout of the source lines.
    ///
    /// The source is in fixed format when every non-blank line has a
    /// sequence area made of digits and spaces followed by a valid
    /// indicator.
    pub fn detect(source: &str) -> SourceFormat {
        let mut lines = source.lines().filter(|line| !line.trim().is_empty()).peekable();
        if lines.peek().is_some() && lines.all(is_fixed_line) {
            SourceFormat::Fixed
        } else {
            SourceFormat::Free
        }
    }
}

fn is_fixed_line(line: &str) -> bool {
    let mut chars = line.chars();
    let sequence_area_ok =
        chars.by_ref().take(INDICATOR_COLUMN).all(|c| c == ' ' || c.is_ascii_digit());
    sequence_area_ok && matches!(chars.next(), None | Some(' ' | '*' | '/' | '-'))
}

fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(content) = line.strip_suffix("\r\n") {
        (content, "\r\n")
    } else if let Some(content) = line.strip_suffix('\n') {
        (content, "\n")
    } else {
        (line, "")
    }
}

fn normalize_fixed_line(line: &str, output: &mut String) {
    let (content, ending) = split_line_ending(line);
    let comment = matches!(content.chars().nth(INDICATOR_COLUMN), Some('*' | '/'));
    for (column, c) in content.chars().enumerate() {
        if comment || column <= INDICATOR_COLUMN || column >= CODE_AREA_END {
            output.extend(std::iter::repeat(' ').take(c.len_utf8()));
        } else {
            output.push(c);
        }
    }
    output.push_str(ending);
}

/// Blank the `*>` comment ending `line`, if any. Comment markers inside
/// nonnumeric literals are left alone.
fn blank_inline_comment(line: &str, output: &mut String) {
    let (content, ending) = split_line_ending(line);
    let mut quote = None;
    let mut comment = None;
    for (index, c) in content.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => (),
            None if c == '"' || c == '\'' => quote = Some(c),
            None if content[index..].starts_with("*>") => {
                comment = Some(index);
                break;
            }
            None => (),
        }
    }
    match comment {
        Some(start) => {
            output.push_str(&content[..start]);
            output.extend(std::iter::repeat(' ').take(content.len() - start));
        }
        None => output.push_str(content),
    }
    output.push_str(ending);
}

/// Return the program text of `source`, with the same length and line
/// structure as the input.
pub fn normalize(source: &str, format: SourceFormat) -> String {
    let text = match format {
        SourceFormat::Free => source.to_owned(),
        SourceFormat::Fixed => {
            let mut output = String::with_capacity(source.len());
            for line in source.split_inclusive('\n') {
                normalize_fixed_line(line, &mut output);
            }
            output
        }
    };
    let mut output = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        blank_inline_comment(line, &mut output);
    }
    output
}

#[cfg(test)]
mod test {
    use super::*;

    const FIXED: &str = "\
000100 IDENTIFICATION DIVISION.                                         HELLO001
000200*This line is a comment.
000300 PROGRAM-ID. HELLO.
";

    #[test]
    fn detect_sequence_numbers() {
        assert_eq!(SourceFormat::detect(FIXED), SourceFormat::Fixed);
    }

    #[test]
    fn detect_indented_source() {
        let source = "       IDENTIFICATION DIVISION.\n\n       PROGRAM-ID. HELLO.\n";
        assert_eq!(SourceFormat::detect(source), SourceFormat::Fixed);
    }

    #[test]
    fn detect_free_format() {
        let source = "IDENTIFICATION DIVISION.\nPROGRAM-ID. HELLO.\n";
        assert_eq!(SourceFormat::detect(source), SourceFormat::Free);
        assert_eq!(SourceFormat::detect(""), SourceFormat::Free);
        assert_eq!(SourceFormat::detect("  \n\n"), SourceFormat::Free);
    }

    #[test]
    fn fixed_format_blanks_reserved_areas() {
        let normalized = normalize(FIXED, SourceFormat::Fixed);
        assert_eq!(normalized.len(), FIXED.len());
        assert_eq!(normalized.lines().count(), FIXED.lines().count());

        let lines: Vec<_> = normalized.lines().collect();
        assert_eq!(lines[0].trim(), "IDENTIFICATION DIVISION.");
        assert!(lines[0].starts_with("       IDENTIFICATION"));
        assert!(lines[1].trim().is_empty());
        assert_eq!(lines[2].trim(), "PROGRAM-ID. HELLO.");
    }

    #[test]
    fn fixed_format_keeps_byte_offsets() {
        let source = "000100 DISPLAY 'caf\u{e9}'.\r\n000200/\u{e9}\u{e9}\r\n";
        let normalized = normalize(source, SourceFormat::Fixed);
        assert_eq!(normalized.len(), source.len());
        assert_eq!(normalized.find("DISPLAY"), source.find("DISPLAY"));
        assert!(normalized.ends_with("\r\n"));
        assert!(!normalized.contains('/'));
    }

    #[test]
    fn free_format_keeps_program_text() {
        assert_eq!(normalize(FIXED, SourceFormat::Free), FIXED);
    }

    #[test]
    fn inline_comments_are_blanked() {
        let source = "DISPLAY *> secret note\r\n  \"HI *> THERE\" *> caf\u{e9}\n*>\n";
        let normalized = normalize(source, SourceFormat::Free);
        assert_eq!(normalized.len(), source.len());
        assert_eq!(
            normalized,
            "DISPLAY               \r\n  \"HI *> THERE\"         \n  \n"
        );
    }

    #[test]
    fn fixed_format_inline_comments_are_blanked() {
        let source = format!("000100     MOVE A TO B. *> copy{:41}SEQ00001\n", "");
        assert_eq!(source.find("SEQ"), Some(72));
        let normalized = normalize(&source, SourceFormat::Fixed);
        assert_eq!(normalized.len(), source.len());
        assert_eq!(normalized.trim(), "MOVE A TO B.");
    }

    #[test]
    fn continuation_indicator_is_blanked() {
        let source = "000100     DISPLAY \"PART ONE\n000200-    \"PART TWO\".\n";
        assert_eq!(SourceFormat::detect(source), SourceFormat::Fixed);
        let normalized = normalize(source, SourceFormat::Fixed);
        let lines: Vec<_> = normalized.lines().collect();
        assert_eq!(lines[1], "           \"PART TWO\".");
    }
}
