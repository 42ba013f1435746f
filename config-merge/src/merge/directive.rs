//! Merge directive parsing.
//!
//! A directive is the data of a `<?merge ...?>` processing instruction, e.g.
//!
//! ```text
//! <?merge appSettings, by="key", attr="value,description"?>
//! ```
//!
//! Only `key="value"` pairs are meaningful. Keys are matched without regard
//! to case, the first occurrence of a key wins, and anything else (bare
//! words, unknown keys, stray punctuation) is ignored.

use crate::node::XmlElement;

/// Key naming the attribute a counterpart is looked up by.
pub const BY_KEY: &str = "by";

/// Key naming the comma-separated attributes to copy.
pub const ATTR_KEY: &str = "attr";

/// Lexical tokens of the directive data.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Equals,
    Quoted(String),
}

/// Splits directive data into words, `=` and quoted strings.
///
/// A quote opens a string only right after `=`; anywhere else (an apostrophe
/// in the free-text label, say) it is a separator like every other character
/// that belongs to no token. An unterminated string ends tokenizing.
fn tokenize(data: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = data.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        match c {
            '=' => tokens.push(Token::Equals),
            '"' | '\'' if tokens.last() == Some(&Token::Equals) => {
                let body_start = start + c.len_utf8();
                match data[body_start..].find(c) {
                    Some(len) => {
                        tokens.push(Token::Quoted(data[body_start..body_start + len].to_string()));
                        let end = body_start + len;
                        while chars.next_if(|&(i, _)| i <= end).is_some() {}
                    }
                    None => break,
                }
            }
            c if is_word_char(c) => {
                let mut end = start + c.len_utf8();
                while let Some((i, next)) = chars.next_if(|&(_, n)| is_word_char(n)) {
                    end = i + next.len_utf8();
                }
                tokens.push(Token::Word(data[start..end].to_string()));
            }
            _ => {}
        }
    }

    tokens
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
}

/// Extracts every `key="value"` pair in order of appearance.
fn key_value_pairs(data: &str) -> Vec<(String, String)> {
    let tokens = tokenize(data);
    tokens
        .windows(3)
        .filter_map(|window| match window {
            [Token::Word(key), Token::Equals, Token::Quoted(value)] => {
                Some((key.clone(), value.clone()))
            }
            _ => None,
        })
        .collect()
}

/// The raw options carried by a directive, before they are applied to an element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveOptions {
    /// Attribute whose value identifies the counterpart, if keyed.
    pub by: Option<String>,
    /// Explicit list of attributes to copy, if given.
    pub attr: Option<Vec<String>>,
}

impl DirectiveOptions {
    /// Parses the data of a merge processing instruction.
    pub fn parse(data: &str) -> Self {
        let pairs = key_value_pairs(data);
        let lookup = |name: &str| {
            pairs
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.trim())
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        let by = lookup(BY_KEY);
        let attr = lookup(ATTR_KEY).map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        });

        DirectiveOptions {
            by,
            attr: attr.filter(|names| !names.is_empty()),
        }
    }
}

/// A directive bound to the mark element it precedes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeDirective {
    by: Option<String>,
    attrs: Vec<String>,
}

impl MergeDirective {
    /// Builds the directive for `element` from processing-instruction data.
    ///
    /// The attribute set is the explicit `attr` list restricted to names the
    /// element actually carries, or every attribute of the element when no
    /// list is given.
    pub fn for_element(element: &XmlElement, data: &str) -> Self {
        let options = DirectiveOptions::parse(data);
        let attrs = match options.attr {
            Some(names) => {
                let mut selected: Vec<String> = Vec::new();
                for name in names {
                    if element.attribute(&name).is_some() && !selected.contains(&name) {
                        selected.push(name);
                    }
                }
                selected
            }
            None => element.attribute_names(),
        };

        MergeDirective {
            by: options.by,
            attrs,
        }
    }

    /// Returns the key attribute, if the counterpart is looked up by value.
    pub fn by(&self) -> Option<&str> {
        self.by.as_deref()
    }

    /// Returns the attributes to copy from the counterpart.
    pub fn attrs(&self) -> &[String] {
        &self.attrs
    }
}
