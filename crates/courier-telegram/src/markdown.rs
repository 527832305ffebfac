// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MarkdownV2 escaping and message splitting for the Telegram Bot API.
//!
//! Outside code spans every MarkdownV2 special character is escaped. Inside
//! inline code and fenced blocks only `\` needs escaping. A backtick run
//! that is never closed is escaped as literal text.

/// Telegram's hard limit on message length, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Characters that must be escaped in MarkdownV2 outside code.
const SPECIAL_CHARS: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    '\\',
];

/// Escapes model output for MarkdownV2 parse mode.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    let mut rest = text;

    while !rest.is_empty() {
        let fence = if rest.starts_with("```") {
            "```"
        } else if rest.starts_with('`') {
            "`"
        } else {
            let plain_end = rest.find('`').unwrap_or(rest.len());
            escape_plain(&rest[..plain_end], &mut out);
            rest = &rest[plain_end..];
            continue;
        };

        let body = &rest[fence.len()..];
        match body.find(fence) {
            Some(close) => {
                out.push_str(fence);
                escape_code(&body[..close], &mut out);
                out.push_str(fence);
                rest = &body[close + fence.len()..];
            }
            None => {
                escape_plain(fence, &mut out);
                rest = body;
            }
        }
    }

    out
}

fn escape_plain(segment: &str, out: &mut String) {
    for ch in segment.chars() {
        if SPECIAL_CHARS.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
}

fn escape_code(segment: &str, out: &mut String) {
    for ch in segment.chars() {
        if ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
}

/// Splits text into chunks of at most `limit` characters, preferring line
/// breaks, then spaces, as split points.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut rest = text.trim();

    while rest.chars().count() > limit {
        // Byte offset of the first character past the limit.
        let hard = rest
            .char_indices()
            .nth(limit)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let window = &rest[..hard];
        let cut = if rest[hard..].starts_with(char::is_whitespace) {
            hard
        } else {
            window
                .rfind('\n')
                .or_else(|| window.rfind(' '))
                .filter(|&i| i > 0)
                .unwrap_or(hard)
        };

        chunks.push(rest[..cut].trim_end().to_string());
        rest = rest[cut..].trim_start();
    }

    if !rest.is_empty() {
        chunks.push(rest.to_string());
    }
    chunks
}

/// Splits `text` into chunks whose MarkdownV2 form fits in `limit`
/// characters. Each raw chunk comes paired with its escaped form, so an
/// escape sequence never straddles two messages.
pub fn escaped_chunks(text: &str, limit: usize) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for chunk in split_message(text, limit) {
        push_escaped(chunk, limit, &mut out);
    }
    out
}

fn push_escaped(chunk: String, limit: usize, out: &mut Vec<(String, String)>) {
    let escaped = escape_markdown_v2(&chunk);
    let raw_len = chunk.chars().count();
    let escaped_len = escaped.chars().count();
    if escaped_len <= limit || raw_len <= 1 {
        out.push((chunk, escaped));
        return;
    }
    // Escaping at most doubles a chunk, so shrinking by the overshoot converges.
    let target = (raw_len * limit / escaped_len).clamp(1, raw_len - 1);
    for piece in split_message(&chunk, target) {
        push_escaped(piece, limit, out);
    }
}
