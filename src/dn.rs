//! X.500 distinguished name assembly and attribute extraction.

use std::sync::OnceLock;

use regex::Regex;

/// Builds a distinguished name string from attribute/value pairs with
/// RFC 2253-style escaping applied to the values.
///
/// Components appear in exactly the order they were added; callers wanting the
/// conventional highest-level-first display order add the country first and
/// the common name last.
///
/// ```
/// use certforge::dn::DnBuilder;
///
/// let mut builder = DnBuilder::new();
/// builder.add("C", "CH");
/// builder.add("O", "Example Corp");
/// builder.add("CN", "Example Root CA");
/// assert_eq!(builder.build(), "C=CH,O=Example Corp,CN=Example Root CA");
/// ```
#[derive(Debug, Default)]
pub struct DnBuilder {
    buf: String,
}

impl DnBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one `attr=value` component, escaping the value.
    ///
    /// The characters `, + " \ < > ;` are always backslash-escaped. A space or
    /// `#` is escaped when it is the first character of the value, and a space
    /// is also escaped when it ends the value; internal spaces are copied
    /// verbatim.
    pub fn add(&mut self, attr: &str, value: &str) -> &mut Self {
        if !self.buf.is_empty() {
            self.buf.push(',');
        }
        self.buf.push_str(attr);
        self.buf.push('=');
        let start = self.buf.len();
        let mut pending_space = false;
        for c in value.chars() {
            if pending_space {
                self.buf.push(' ');
                pending_space = false;
            }
            match c {
                ' ' => {
                    if self.buf.len() == start {
                        self.buf.push('\\');
                    } else {
                        pending_space = true;
                        continue;
                    }
                }
                '#' => {
                    if self.buf.len() == start {
                        self.buf.push('\\');
                    }
                }
                ',' | '+' | '"' | '\\' | '<' | '>' | ';' => {
                    self.buf.push('\\');
                }
                _ => {}
            }
            self.buf.push(c);
        }
        if pending_space {
            // trailing space survives only in escaped form
            self.buf.push('\\');
            self.buf.push(' ');
        }
        self
    }

    pub fn build(self) -> String {
        self.buf
    }
}

fn rdn_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\s*([^\s,=]+)\s*=\s*([^,]*)\s*(?:,(.*))?$").unwrap())
}

/// Extracts the first common-name value from a distinguished name string.
///
/// Components are walked left to right; the attribute key match is
/// case-insensitive. Returns `None` when no `CN` component exists or the
/// string does not parse as a DN.
pub fn common_name(dn: &str) -> Option<String> {
    let mut rest = dn;
    loop {
        let captures = rdn_pattern().captures(rest)?;
        let key = captures.get(1)?.as_str();
        let value = captures.get(2).map(|m| m.as_str()).unwrap_or("");
        if key.eq_ignore_ascii_case("cn") {
            return Some(value.to_string());
        }
        match captures.get(3) {
            Some(m) => rest = m.as_str(),
            None => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components_keep_insertion_order() {
        let mut builder = DnBuilder::new();
        builder.add("C", "CH").add("O", "Acme").add("CN", "Acme CA");
        assert_eq!(builder.build(), "C=CH,O=Acme,CN=Acme CA");
    }

    #[test]
    fn specials_are_escaped() {
        let mut builder = DnBuilder::new();
        builder.add("CN", "a,b+c\"d\\e<f>g;h");
        assert_eq!(builder.build(), r#"CN=a\,b\+c\"d\\e\<f\>g\;h"#);
    }

    #[test]
    fn leading_space_and_hash_are_escaped() {
        let mut builder = DnBuilder::new();
        builder.add("CN", " padded");
        assert_eq!(builder.build(), r"CN=\ padded");

        let mut builder = DnBuilder::new();
        builder.add("CN", "#1");
        assert_eq!(builder.build(), r"CN=\#1");
    }

    #[test]
    fn internal_spaces_survive_verbatim() {
        let mut builder = DnBuilder::new();
        builder.add("CN", "John  Doe");
        assert_eq!(builder.build(), "CN=John  Doe");
    }

    #[test]
    fn trailing_space_is_escaped() {
        let mut builder = DnBuilder::new();
        builder.add("CN", "name ");
        assert_eq!(builder.build(), r"CN=name\ ");
    }

    #[test]
    fn common_name_roundtrip() {
        let mut builder = DnBuilder::new();
        builder.add("C", "CH").add("CN", "Jane Doe").add("O", "Acme");
        let dn = builder.build();
        assert_eq!(common_name(&dn).as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn common_name_keeps_an_escaped_trailing_space() {
        let mut builder = DnBuilder::new();
        builder.add("CN", "name ");
        assert_eq!(common_name(&builder.build()).as_deref(), Some(r"name\ "));
    }

    #[test]
    fn common_name_is_case_insensitive_and_first_wins() {
        assert_eq!(
            common_name("O=Acme, cn=first, CN=second").as_deref(),
            Some("first")
        );
        assert_eq!(common_name("O=Acme,OU=Unit"), None);
    }
}
