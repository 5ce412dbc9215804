//! Lexical helpers shared by the Java and JavaScript decoders.
//!
//! Both dialects receive collection arguments as source text, e.g.
//! `new int[]{1, 2}` or `[1, 'a', {k: 2}]`. These helpers split such text on
//! top-level separators while respecting quotes and bracket nesting.

use super::ConversionError;

/// Splits `input` on `separator` wherever it appears outside quotes and
/// brackets. Empty trailing segments (from a trailing separator) are dropped;
/// an empty or all-whitespace input yields no segments.
pub(crate) fn split_top_level(input: &str, separator: char) -> Result<Vec<&str>, ConversionError> {
    let mut parts = Vec::new();
    let mut depth: Vec<char> = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '(' => depth.push(')'),
            '[' => depth.push(']'),
            '{' => depth.push('}'),
            ')' | ']' | '}' => {
                if depth.pop() != Some(c) {
                    return Err(ConversionError::Unbalanced {
                        input: input.to_string(),
                    });
                }
            }
            c if c == separator && depth.is_empty() => {
                parts.push(input[start..i].trim());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }

    if quote.is_some() {
        return Err(ConversionError::UnterminatedString {
            input: input.to_string(),
        });
    }
    if !depth.is_empty() {
        return Err(ConversionError::Unbalanced {
            input: input.to_string(),
        });
    }

    let last = input[start..].trim();
    if !last.is_empty() {
        parts.push(last);
    }
    if parts.len() == 1 && parts[0].is_empty() {
        parts.clear();
    }
    Ok(parts)
}

/// Splits `input` at the first top-level occurrence of `separator`.
pub(crate) fn split_once_top_level(input: &str, separator: char) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in input.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            c if c == separator && depth == 0 => {
                return Some((input[..i].trim(), input[i + c.len_utf8()..].trim()));
            }
            _ => {}
        }
    }
    None
}

/// If `input` is a single quoted literal using one of `quotes`, returns its
/// unescaped contents.
pub(crate) fn unquote(input: &str, quotes: &[char]) -> Option<String> {
    let mut chars = input.chars();
    let open = chars.next()?;
    if !quotes.contains(&open) || input.len() < 2 || !input.ends_with(open) {
        return None;
    }
    let body = &input[open.len_utf8()..input.len() - open.len_utf8()];

    let mut out = String::with_capacity(body.len());
    let mut escaped = false;
    for c in body.chars() {
        if escaped {
            out.push(match c {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                other => other,
            });
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == open {
            // An unescaped quote inside means this is not one literal.
            return None;
        } else {
            out.push(c);
        }
    }
    if escaped {
        return None;
    }
    Some(out)
}

/// If the bracket opened at byte `open` closes at the very end of `input`,
/// returns the text between them.
pub(crate) fn enclosed_body(input: &str, open: usize) -> Option<&str> {
    let opener = input[open..].chars().next()?;
    let closer = match opener {
        '(' => ')',
        '[' => ']',
        '{' => '}',
        _ => return None,
    };
    if !input.ends_with(closer) {
        return None;
    }
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in input[open..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    let close = open + i;
                    return (close == input.len() - closer.len_utf8())
                        .then(|| &input[open + 1..close]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_outside_nesting_and_quotes() {
        let parts = split_top_level(r#"1, "a,b", [2, 3], {k: (4, 5)}"#, ',').unwrap();
        assert_eq!(parts, vec!["1", r#""a,b""#, "[2, 3]", "{k: (4, 5)}"]);
    }

    #[test]
    fn empty_input_has_no_parts() {
        assert!(split_top_level("   ", ',').unwrap().is_empty());
        assert_eq!(split_top_level("1, 2,", ',').unwrap(), vec!["1", "2"]);
    }

    #[test]
    fn reports_unbalanced_input() {
        assert!(split_top_level("[1, 2", ',').is_err());
        assert!(split_top_level("1, 'abc", ',').is_err());
        assert!(split_top_level("1]", ',').is_err());
    }

    #[test]
    fn split_once_respects_nesting() {
        assert_eq!(split_once_top_level("'a:b': {c: 1}", ':'), Some(("'a:b'", "{c: 1}")));
        assert_eq!(split_once_top_level("nothing", ':'), None);
    }

    #[test]
    fn unquotes_single_literals() {
        assert_eq!(unquote(r#""hello""#, &['"']), Some("hello".into()));
        assert_eq!(unquote(r#"'it\'s'"#, &['\'']), Some("it's".into()));
        assert_eq!(unquote(r#""a" + "b""#, &['"']), None);
        assert_eq!(unquote("plain", &['"', '\'']), None);
    }

    #[test]
    fn enclosed_body_requires_matching_close_at_end() {
        assert_eq!(enclosed_body("f(1, (2))", 1), Some("1, (2)"));
        assert_eq!(enclosed_body("f(1) + g(2)", 1), None);
        assert_eq!(enclosed_body("{}", 0), Some(""));
    }
}
