/*
 * preprocess.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! `[[NAME]]` / `[[NAME=default]]` macro substitution.
//!
//! The scanner makes one left-to-right pass over the input and never looks at
//! text it has already emitted. A placeholder is replaced when its name is
//! defined, or when it carries an inline default (possibly empty, as in
//! `[[NAME=]]`). Anything else is copied through one character at a time, so
//! brackets that are not placeholders survive unchanged.
//!
//! When a `[[` is not closed before the next bracket character, only its
//! first `[` is emitted. The second `[` is then examined again and can start
//! a later placeholder:
//!
//! ```text
//! [[[X]]  with X=1  ->  [1
//! ```

use crate::Defines;

const START: &str = "[[";
const END: &str = "]]";

/// The interior of a `[[...]]` span, split on its first `=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a> {
    pub name: &'a str,
    /// `None` when the interior has no `=`; `Some("")` for `[[NAME=]]`.
    pub default: Option<&'a str>,
}

impl<'a> Placeholder<'a> {
    pub fn parse(interior: &'a str) -> Self {
        match interior.split_once('=') {
            Some((name, default)) => Self {
                name,
                default: Some(default),
            },
            None => Self {
                name: interior,
                default: None,
            },
        }
    }

    /// Definitions take precedence over the inline default.
    pub fn resolve<'d>(&self, defines: &'d Defines) -> Option<&'d str>
    where
        'a: 'd,
    {
        defines.lookup(self.name).or(self.default)
    }
}

/// Substitute every resolvable placeholder in `text`.
pub fn preprocess(text: &str, defines: &Defines) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while !rest.is_empty() {
        if let Some((value, consumed)) = expand_at(rest, defines) {
            out.push_str(value);
            rest = &rest[consumed..];
            continue;
        }

        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }

    out
}

/// Try to expand a placeholder at the very start of `rest`.
///
/// Returns the replacement and the number of bytes it covers.
fn expand_at<'a>(rest: &'a str, defines: &'a Defines) -> Option<(&'a str, usize)> {
    if !rest.starts_with(START) {
        return None;
    }
    let close = START.len() + rest[START.len()..].find(['[', ']'])?;
    if !rest[close..].starts_with(END) {
        return None;
    }
    let placeholder = Placeholder::parse(&rest[START.len()..close]);
    let value = placeholder.resolve(defines)?;
    Some((value, close + END.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(text: &str, entries: &[&str]) -> String {
        let defines = Defines::from_entries(entries.iter().copied()).unwrap();
        preprocess(text, &defines)
    }

    #[test]
    fn test_placeholder_split() {
        assert_eq!(
            Placeholder::parse("X"),
            Placeholder {
                name: "X",
                default: None
            }
        );
        assert_eq!(
            Placeholder::parse("X="),
            Placeholder {
                name: "X",
                default: Some("")
            }
        );
        assert_eq!(
            Placeholder::parse("X=a=b"),
            Placeholder {
                name: "X",
                default: Some("a=b")
            }
        );
    }

    #[test]
    fn test_inline_default() {
        assert_eq!(run("A[[X=hi]]B", &[]), "AhiB");
    }

    #[test]
    fn test_definition_beats_default() {
        assert_eq!(run("A[[X=hi]]B", &["X=bye"]), "AbyeB");
        assert_eq!(run("A[[X]]B", &["X=bye"]), "AbyeB");
    }

    #[test]
    fn test_empty_definition_beats_default() {
        assert_eq!(run("A[[X=hi]]B", &["X="]), "AB");
    }

    #[test]
    fn test_explicit_empty_default() {
        assert_eq!(run("A[[X=]]B", &[]), "AB");
        assert_eq!(run("[[=]]", &[]), "");
    }

    #[test]
    fn test_unresolved_placeholder_is_literal() {
        assert_eq!(run("A[[X]]B", &[]), "A[[X]]B");
        assert_eq!(run("[[]]", &[]), "[[]]");
    }

    #[test]
    fn test_unclosed_start_marker_is_literal() {
        assert_eq!(run("A[[X", &[]), "A[[X");
        assert_eq!(run("[[", &[]), "[[");
        assert_eq!(run("[[[", &[]), "[[[");
    }

    #[test]
    fn test_stray_bracket_inside_is_literal() {
        assert_eq!(run("[[X]=1]]", &["X=v"]), "[[X]=1]]");
        assert_eq!(run("[[X[Y]]", &["X=v"]), "[[X[Y]]");
    }

    #[test]
    fn test_second_start_bracket_can_begin_a_later_placeholder() {
        // The first `[` is emitted alone; scanning resumes on the second one.
        assert_eq!(run("[[[X]]", &["X=1"]), "[1");
        assert_eq!(run("[[A[[X]]", &["X=1"]), "[[A1");
        assert_eq!(run("[[[X]]", &[]), "[[[X]]");
    }

    #[test]
    fn test_trailing_bracket_after_placeholder() {
        assert_eq!(run("[[X]]]", &["X=v"]), "v]");
    }

    #[test]
    fn test_substituted_text_is_not_rescanned() {
        assert_eq!(run("[[X]]", &["X=[[Y]]", "Y=no"]), "[[Y]]");
    }

    #[test]
    fn test_multiple_placeholders_and_yaml_flow_sequences() {
        let text = "Type: [[TYPE=SHT_PROGBITS]]\nFlags: [ SHF_ALLOC ]\nSize: [[SIZE]]\n";
        assert_eq!(
            run(text, &["SIZE=16"]),
            "Type: SHT_PROGBITS\nFlags: [ SHF_ALLOC ]\nSize: 16\n"
        );
    }

    #[test]
    fn test_non_ascii_text_passes_through() {
        assert_eq!(run("é[[X=ü]]ß[[", &[]), "éüß[[");
    }

    #[test]
    fn test_bracket_runs_terminate() {
        let text = "[".repeat(1000) + &"]".repeat(1000);
        assert_eq!(run(&text, &[]), text);
    }
}
