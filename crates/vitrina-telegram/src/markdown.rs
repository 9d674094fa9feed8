// SPDX-FileCopyrightText: 2026 Vitrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MarkdownV2 escaping for the Telegram Bot API.
//!
//! MarkdownV2 requires 18 special characters to be escaped outside of code
//! spans; characters inside inline code or fenced blocks must be left
//! alone. Escaping is best effort: if Telegram still rejects the result,
//! the transport re-sends the content as plain text.

const SPECIAL: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

#[derive(Clone, Copy, PartialEq)]
enum Span {
    Plain,
    InlineCode,
    FencedCode,
}

/// Escapes text for MarkdownV2, preserving code spans verbatim.
///
/// Unclosed code spans run to the end of the input.
pub fn escape_markdown_v2(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    let mut span = Span::Plain;
    let mut i = 0;

    while i < chars.len() {
        let fence = chars[i..].starts_with(&['`', '`', '`']);
        match span {
            Span::Plain => {
                if fence {
                    out.push_str("```");
                    span = Span::FencedCode;
                    i += 3;
                } else if chars[i] == '`' {
                    out.push('`');
                    span = Span::InlineCode;
                    i += 1;
                } else {
                    if SPECIAL.contains(&chars[i]) {
                        out.push('\\');
                    }
                    out.push(chars[i]);
                    i += 1;
                }
            }
            Span::InlineCode => {
                if chars[i] == '`' {
                    span = Span::Plain;
                }
                out.push(chars[i]);
                i += 1;
            }
            Span::FencedCode => {
                if fence {
                    out.push_str("```");
                    span = Span::Plain;
                    i += 3;
                } else {
                    out.push(chars[i]);
                    i += 1;
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(escape_markdown_v2("Hello world"), "Hello world");
        assert_eq!(escape_markdown_v2(""), "");
    }

    #[test]
    fn escapes_every_special_character() {
        let input = "_*[]()~>#+-=|{}.!";
        let expected = "\\_\\*\\[\\]\\(\\)\\~\\>\\#\\+\\-\\=\\|\\{\\}\\.\\!";
        assert_eq!(escape_markdown_v2(input), expected);
    }

    #[test]
    fn inline_code_is_preserved() {
        let result = escape_markdown_v2("Use `println!()` to print.");
        assert!(result.contains("`println!()`"));
        assert!(result.ends_with("\\."));
    }

    #[test]
    fn fenced_block_is_preserved() {
        let input = "Look:\n```\nlet x = a.b;\n```\nDone.";
        let result = escape_markdown_v2(input);
        assert!(result.contains("let x = a.b;"));
        assert!(result.ends_with("Done\\."));
    }

    #[test]
    fn unclosed_inline_code_runs_to_the_end() {
        let result = escape_markdown_v2("before `code.without end");
        assert!(result.starts_with("before "));
        assert!(result.ends_with("`code.without end"));
    }

    #[test]
    fn unclosed_fence_runs_to_the_end() {
        let result = escape_markdown_v2("```\nraw. stuff!");
        assert!(result.ends_with("raw. stuff!"));
    }

    #[test]
    fn emoji_and_cyrillic_are_untouched() {
        assert_eq!(escape_markdown_v2("🕐 Карточка"), "🕐 Карточка");
    }
}
