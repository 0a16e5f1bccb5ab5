//! Top-level keyword scanning
//!
//! Locates SQL keywords while skipping string literals, quoted identifiers,
//! comments and parenthesized sub-expressions.

/// A query split around its first top-level occurrence of a keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split<'a> {
    /// Text before the keyword
    pub head: &'a str,
    /// The keyword exactly as written
    pub keyword: &'a str,
    /// Text after the keyword
    pub rest: &'a str,
}

/// Split `sql` at the first top-level occurrence of `keyword` (case-insensitive)
pub fn split_at_keyword<'a>(sql: &'a str, keyword: &str) -> Option<Split<'a>> {
    let start = find_keyword(sql, keyword)?;
    let end = start + keyword.len();
    Some(Split {
        head: &sql[..start],
        keyword: &sql[start..end],
        rest: &sql[end..],
    })
}

/// Byte offset of the first top-level occurrence of `keyword`
pub fn find_keyword(sql: &str, keyword: &str) -> Option<usize> {
    let bytes = sql.as_bytes();
    let needle = keyword.as_bytes();
    if needle.is_empty() {
        return None;
    }

    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' | b'`' => i = skip_quoted(bytes, i),
            b'-' if bytes.get(i + 1) == Some(&b'-') => i = skip_line_comment(bytes, i),
            b'/' if bytes.get(i + 1) == Some(&b'*') => i = skip_block_comment(bytes, i),
            b'(' => {
                depth += 1;
                i += 1;
            }
            b')' => {
                depth = depth.saturating_sub(1);
                i += 1;
            }
            _ => {
                if depth == 0 && matches_word(bytes, i, needle) {
                    return Some(i);
                }
                i += 1;
            }
        }
    }
    None
}

/// Whether `keyword` appears at the top level of `sql`
pub fn has_keyword(sql: &str, keyword: &str) -> bool {
    find_keyword(sql, keyword).is_some()
}

/// Byte offset of the earliest top-level occurrence of any of `keywords`
pub fn find_any_keyword(sql: &str, keywords: &[&str]) -> Option<usize> {
    keywords.iter().filter_map(|k| find_keyword(sql, k)).min()
}

/// Number of `?` placeholders outside literals, quoted identifiers and comments
pub fn count_positional(sql: &str) -> usize {
    let bytes = sql.as_bytes();
    let mut count = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' | b'`' => i = skip_quoted(bytes, i),
            b'-' if bytes.get(i + 1) == Some(&b'-') => i = skip_line_comment(bytes, i),
            b'/' if bytes.get(i + 1) == Some(&b'*') => i = skip_block_comment(bytes, i),
            b'?' => {
                count += 1;
                i += 1;
            }
            _ => i += 1,
        }
    }
    count
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

fn matches_word(bytes: &[u8], at: usize, needle: &[u8]) -> bool {
    let end = at + needle.len();
    if end > bytes.len() || !bytes[at..end].eq_ignore_ascii_case(needle) {
        return false;
    }
    let before_ok = at == 0 || !is_word_byte(bytes[at - 1]);
    let after_ok = end == bytes.len() || !is_word_byte(bytes[end]);
    before_ok && after_ok
}

/// Index just past the closing quote; a doubled quote is an escaped quote
fn skip_quoted(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == b'\\' && quote == b'\'' {
            i += 2;
            continue;
        }
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

fn skip_line_comment(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |p| start + p + 1)
}

fn skip_block_comment(bytes: &[u8], start: usize) -> usize {
    bytes[start + 2..]
        .windows(2)
        .position(|w| w == b"*/")
        .map_or(bytes.len(), |p| start + 2 + p + 2)
}
