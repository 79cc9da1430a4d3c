//! Interpreter configuration.

pub const XP_NAMESPACE: &str = "http://www.ibm.com/xsp/core";
pub const XC_NAMESPACE: &str = "http://www.ibm.com/xsp/custom";
pub const XE_NAMESPACE: &str = "http://www.ibm.com/xsp/coreex";

/// Settings for `parse_content`'s fragment wrapping.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpreterConfig {
    /// Qualified name of the root element, e.g. `xp:view`.
    pub root_tag: String,
    /// `(prefix, uri)` pairs declared on a generated root element.
    pub namespaces: Vec<(String, String)>,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            root_tag: "xp:view".to_string(),
            namespaces: vec![
                ("xp".to_string(), XP_NAMESPACE.to_string()),
                ("xc".to_string(), XC_NAMESPACE.to_string()),
                ("xe".to_string(), XE_NAMESPACE.to_string()),
            ],
        }
    }
}

impl InterpreterConfig {
    /// Whether `content` already opens the root element.
    ///
    /// A plain substring search: `<xp:view` must be followed by whitespace,
    /// `>` or `/`, so `<xp:viewPanel` does not count.
    pub fn contains_root(&self, content: &str) -> bool {
        let opening = format!("<{}", self.root_tag);
        content.match_indices(&opening).any(|(at, _)| {
            content[at + opening.len()..]
                .chars()
                .next()
                .is_none_or(|c| c.is_whitespace() || c == '>' || c == '/')
        })
    }

    /// Wraps `content` in the root element with every configured namespace declared.
    pub fn wrap(&self, content: &str) -> String {
        let declarations: String = self
            .namespaces
            .iter()
            .map(|(prefix, uri)| format!(" xmlns:{}=\"{}\"", prefix, uri))
            .collect();
        format!(
            "<{tag}{declarations}>{content}</{tag}>",
            tag = self.root_tag,
            declarations = declarations,
            content = content
        )
    }
}
