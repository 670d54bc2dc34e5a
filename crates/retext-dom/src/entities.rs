//! Entity handling for the lenient markup parser.
//!
//! Named HTML entities are converted to Unicode before XML parsing, since the
//! XML reader only knows the five predefined ones. Stray `<` and `&` that
//! cannot start markup are escaped so they survive as literal text.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// Named HTML entity.
static ENTITY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&([a-zA-Z][a-zA-Z0-9]*);").expect("invalid entity regex"));

/// Anything an `&` may legitimately start.
static REFERENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^&(?:[a-zA-Z][a-zA-Z0-9]*|#[0-9]+|#[xX][0-9a-fA-F]+);")
        .expect("invalid reference regex")
});

/// Convert named HTML entities to Unicode characters.
///
/// The XML entities (amp, lt, gt, quot, apos) and unknown names are left as
/// they are.
pub(crate) fn convert_html_entities(markup: &str) -> Cow<'_, str> {
    ENTITY_PATTERN.replace_all(markup, |caps: &regex::Captures| {
        entity_to_unicode(&caps[1]).map_or_else(|| caps[0].to_owned(), str::to_owned)
    })
}

/// Map HTML entity name to Unicode character.
fn entity_to_unicode(name: &str) -> Option<&'static str> {
    Some(match name {
        "nbsp" => "\u{00a0}",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "laquo" => "\u{00ab}",
        "raquo" => "\u{00bb}",
        "bull" => "\u{2022}",
        "middot" => "\u{00b7}",
        "hellip" => "\u{2026}",
        "rarr" => "\u{2192}",
        "larr" => "\u{2190}",
        "times" => "\u{00d7}",
        "divide" => "\u{00f7}",
        "plusmn" => "\u{00b1}",
        "deg" => "\u{00b0}",
        "copy" => "\u{00a9}",
        "reg" => "\u{00ae}",
        "trade" => "\u{2122}",
        "sect" => "\u{00a7}",
        "para" => "\u{00b6}",
        "euro" => "\u{20ac}",
        "pound" => "\u{00a3}",
        "yen" => "\u{00a5}",
        "cent" => "\u{00a2}",
        _ => return None,
    })
}

/// Escape `<` and `&` characters that do not start a tag or a reference.
///
/// `a < b` and `fish & chips` are valid in HTML text but rejected by an XML
/// reader.
pub(crate) fn escape_stray_markup(markup: &str) -> Cow<'_, str> {
    let needs_escape = markup.char_indices().any(|(index, ch)| is_stray(markup, index, ch));
    if !needs_escape {
        return Cow::Borrowed(markup);
    }

    let mut out = String::with_capacity(markup.len() + 16);
    for (index, ch) in markup.char_indices() {
        match ch {
            '<' if is_stray(markup, index, ch) => out.push_str("&lt;"),
            '&' if is_stray(markup, index, ch) => out.push_str("&amp;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

/// Map a byte offset in `escape_stray_markup(markup)` back into `markup`.
///
/// An offset inside an inserted escape maps to the character it replaced.
pub(crate) fn unescaped_offset(markup: &str, escaped_offset: usize) -> usize {
    let mut escaped = 0;
    for (index, ch) in markup.char_indices() {
        let width = match ch {
            '<' if is_stray(markup, index, ch) => "&lt;".len(),
            '&' if is_stray(markup, index, ch) => "&amp;".len(),
            _ => ch.len_utf8(),
        };
        if escaped + width > escaped_offset {
            return index;
        }
        escaped += width;
    }
    markup.len()
}

fn is_stray(markup: &str, index: usize, ch: char) -> bool {
    let rest = &markup[index..];
    match ch {
        '<' => !rest[1..]
            .chars()
            .next()
            .is_some_and(|next| next.is_ascii_alphabetic() || matches!(next, '/' | '!' | '?')),
        '&' => !REFERENCE_PATTERN.is_match(rest),
        _ => false,
    }
}

/// Decode an XML entity reference name to its character value.
pub(crate) fn decode_entity(entity: &str) -> String {
    match entity {
        "lt" => "<".to_owned(),
        "gt" => ">".to_owned(),
        "amp" => "&".to_owned(),
        "apos" => "'".to_owned(),
        "quot" => "\"".to_owned(),
        s if s.starts_with('#') => {
            let code = if s.starts_with("#x") || s.starts_with("#X") {
                u32::from_str_radix(&s[2..], 16).ok()
            } else {
                s[1..].parse::<u32>().ok()
            };
            code.and_then(char::from_u32)
                .map_or_else(|| format!("&{entity};"), |c| c.to_string())
        }
        // Unknown entity - keep it readable
        _ => format!("&{entity};"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_named_entities() {
        assert_eq!(
            convert_html_entities("a&nbsp;b&mdash;c"),
            "a\u{00a0}b\u{2014}c"
        );
    }

    #[test]
    fn test_xml_entities_preserved() {
        assert_eq!(convert_html_entities("&amp;&lt;&unknown;"), "&amp;&lt;&unknown;");
    }

    #[test]
    fn test_escape_stray_characters() {
        assert_eq!(escape_stray_markup("a < b & c"), "a &lt; b &amp; c");
        assert_eq!(escape_stray_markup("x<"), "x&lt;");
    }

    #[test]
    fn test_escape_leaves_markup_alone() {
        let markup = "<b>fish &amp; chips</b><!-- c --><br/>&#169;";
        assert!(matches!(escape_stray_markup(markup), Cow::Borrowed(_)));
    }

    #[test]
    fn test_decode_entity() {
        assert_eq!(decode_entity("amp"), "&");
        assert_eq!(decode_entity("#65"), "A");
        assert_eq!(decode_entity("#x41"), "A");
        assert_eq!(decode_entity("#xZZ"), "&#xZZ;");
        assert_eq!(decode_entity("bogus"), "&bogus;");
    }

    #[test]
    fn test_unescaped_offset() {
        let markup = "a & <b";
        let escaped = escape_stray_markup(markup);
        assert_eq!(escaped, "a &amp; <b");

        assert_eq!(unescaped_offset(markup, escaped.find("<b").unwrap()), 4);
        assert_eq!(unescaped_offset(markup, 3), 2);
        assert_eq!(unescaped_offset(markup, 0), 0);
        assert_eq!(unescaped_offset(markup, escaped.len()), markup.len());
    }
}
