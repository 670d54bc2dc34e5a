//! Replacement template expansion.
//!
//! Templates use the conventional regex-replace references:
//!
//! | reference    | expands to                                   |
//! |--------------|----------------------------------------------|
//! | `$$`         | a literal `$`                                |
//! | `$&`         | the whole match                              |
//! | `` $` ``     | the text before the match                    |
//! | `$'`         | the text after the match                     |
//! | `$n`, `$nn`  | capture group *n*, if the pattern has it     |
//! | `$<name>`    | named group, if the pattern has named groups |
//!
//! A reference that does not resolve is copied literally, so `"<b>$5</b>"`
//! against a pattern without groups produces `<b>$5</b>`. Groups that did not
//! take part in the match expand to nothing.

use regex::{Captures, Regex, Replacer};

use crate::filter::Replacement;

/// Substitute every match of `pattern` in `text`.
pub(crate) fn render(pattern: &Regex, replacement: &Replacement, text: &str) -> Option<String> {
    match replacement {
        Replacement::Template(template) => {
            let replacer = TemplateReplacer {
                template,
                haystack: text,
                named_groups: pattern.capture_names().flatten().next().is_some(),
            };
            Some(pattern.replace_all(text, replacer).into_owned())
        }
        Replacement::Function(f) => Some(
            pattern
                .replace_all(text, |caps: &Captures<'_>| f(caps))
                .into_owned(),
        ),
        Replacement::Unsupported(_) => None,
    }
}

struct TemplateReplacer<'t, 'h> {
    template: &'t str,
    haystack: &'h str,
    named_groups: bool,
}

impl Replacer for TemplateReplacer<'_, '_> {
    fn replace_append(&mut self, caps: &Captures<'_>, dst: &mut String) {
        let mut rest = self.template;
        while let Some(pos) = rest.find('$') {
            dst.push_str(&rest[..pos]);
            rest = &rest[pos..];
            let consumed = self.expand_reference(rest, caps, dst);
            rest = &rest[consumed..];
        }
        dst.push_str(rest);
    }
}

impl TemplateReplacer<'_, '_> {
    /// Expand the reference at the start of `input` (which begins with `$`).
    ///
    /// Returns the number of bytes consumed.
    fn expand_reference(&self, input: &str, caps: &Captures<'_>, dst: &mut String) -> usize {
        let Some(whole) = caps.get(0) else {
            dst.push('$');
            return 1;
        };
        let bytes = input.as_bytes();
        let group_count = caps.len() - 1;
        let push_group = |dst: &mut String, index: usize| {
            if let Some(group) = caps.get(index) {
                dst.push_str(group.as_str());
            }
        };

        match bytes.get(1) {
            Some(b'$') => {
                dst.push('$');
                2
            }
            Some(b'&') => {
                dst.push_str(whole.as_str());
                2
            }
            Some(b'`') => {
                dst.push_str(self.haystack.get(..whole.start()).unwrap_or_default());
                2
            }
            Some(b'\'') => {
                dst.push_str(self.haystack.get(whole.end()..).unwrap_or_default());
                2
            }
            Some(&first) if first.is_ascii_digit() => {
                let first = usize::from(first - b'0');
                let two_digit = bytes
                    .get(2)
                    .filter(|b| b.is_ascii_digit())
                    .map(|&second| first * 10 + usize::from(second - b'0'));
                match two_digit {
                    Some(index) if (1..=group_count).contains(&index) => {
                        push_group(dst, index);
                        3
                    }
                    _ if (1..=group_count).contains(&first) => {
                        push_group(dst, first);
                        2
                    }
                    _ => {
                        dst.push('$');
                        1
                    }
                }
            }
            Some(b'<') if self.named_groups => match input[2..].find('>') {
                Some(end) => {
                    if let Some(group) = caps.name(&input[2..2 + end]) {
                        dst.push_str(group.as_str());
                    }
                    end + 3
                }
                None => {
                    dst.push('$');
                    1
                }
            },
            _ => {
                dst.push('$');
                1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn template(pattern: &str, template: &str, text: &str) -> String {
        let regex = Regex::new(pattern).unwrap();
        render(&regex, &Replacement::from(template), text).unwrap()
    }

    #[test]
    fn test_plain_template_replaces_globally() {
        assert_eq!(template("cat", "dog", "cat and cat"), "dog and dog");
    }

    #[test]
    fn test_unresolved_group_reference_is_literal() {
        assert_eq!(template("PRICE", "<b>$5</b>", "PRICE today"), "<b>$5</b> today");
        assert_eq!(template("a", "$0", "a"), "$0");
    }

    #[test]
    fn test_dollar_escapes() {
        assert_eq!(template("x", "$$", "x"), "$");
        assert_eq!(template("x", "cost: $", "x"), "cost: $");
        assert_eq!(template("x", "$z", "x"), "$z");
    }

    #[test]
    fn test_whole_match_and_context() {
        assert_eq!(template("b", "[$&]", "abc"), "a[b]c");
        assert_eq!(template("b", "[$`]", "abc"), "a[a]c");
        assert_eq!(template("b", "[$']", "abc"), "a[c]c");
    }

    #[test]
    fn test_numbered_groups() {
        assert_eq!(template(r"(\w+) (\w+)", "$2 $1", "hello world"), "world hello");
        assert_eq!(template(r"(a)", "$10", "a"), "a0");
        assert_eq!(template(r"(a)", "$01", "a"), "a");
    }

    #[test]
    fn test_two_digit_group() {
        let pattern = "(a)(b)(c)(d)(e)(f)(g)(h)(i)(j)(k)";
        assert_eq!(template(pattern, "$11", "abcdefghijk"), "k");
    }

    #[test]
    fn test_non_participating_group_is_empty() {
        assert_eq!(template(r"a(x)?", "[$1]", "a"), "[]");
    }

    #[test]
    fn test_named_groups() {
        assert_eq!(
            template(r"(?<unit>\d+)kg", "$<unit> kilograms", "5kg"),
            "5 kilograms"
        );
        assert_eq!(template(r"(?<n>\d)", "$<missing>!", "1"), "!");
        assert_eq!(template(r"(?<n>\d)", "$<n", "1"), "$<n");
    }

    #[test]
    fn test_named_reference_without_named_groups_is_literal() {
        assert_eq!(template(r"(\d)", "$<n>", "1"), "$<n>");
    }

    #[test]
    fn test_function_replacement() {
        let regex = Regex::new(r"\d+").unwrap();
        let double = Replacement::function(|caps| {
            let n: u64 = caps[0].parse().unwrap_or_default();
            (n * 2).to_string()
        });

        assert_eq!(render(&regex, &double, "qty 3").unwrap(), "qty 6");
    }

    #[test]
    fn test_unsupported_replacement_renders_nothing() {
        let regex = Regex::new("a").unwrap();

        assert_eq!(render(&regex, &Replacement::Unsupported("1".to_owned()), "a"), None);
    }
}
