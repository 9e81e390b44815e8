//! Element classification and labels

use super::snapshot::NodeSnapshot;
use crate::address::ElementAddress;
use phf::phf_set;
use std::fmt;

/// Structural or non-visual tags that never produce a record
pub static BLACKLISTED_TAGS: phf::Set<&'static str> = phf_set! {
    "html", "head", "meta", "link", "title", "base", "script", "style",
    "noscript", "template", "svg", "path", "g", "defs", "use", "iframe",
    "frame", "object", "embed", "param", "source", "track", "br", "wbr",
};

/// ARIA roles that make a generic element clickable
static CLICKABLE_ROLES: phf::Set<&'static str> = phf_set! {
    "button", "link", "menuitem", "tab", "checkbox", "radio", "option", "switch",
};

/// Whether a tag is skipped outright
pub fn is_blacklisted(tag: &str) -> bool {
    BLACKLISTED_TAGS.contains(tag.to_ascii_lowercase().as_str())
}

/// Semantic kind of an extracted element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Link,
    Button,
    Input,
    Select,
    Textarea,
    Img,
    Text,
}

impl ElementKind {
    /// Classify a node; explicit tags win over click handlers and roles
    pub fn classify(node: &NodeSnapshot) -> Self {
        match node.tag.to_ascii_lowercase().as_str() {
            "a" => ElementKind::Link,
            "input" => ElementKind::Input,
            "img" => ElementKind::Img,
            "button" => ElementKind::Button,
            "select" => ElementKind::Select,
            "textarea" => ElementKind::Textarea,
            _ if is_generic_clickable(node) => ElementKind::Button,
            _ => ElementKind::Text,
        }
    }

    /// Tag name used in the output format
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Link => "link",
            ElementKind::Button => "button",
            ElementKind::Input => "input",
            ElementKind::Select => "select",
            ElementKind::Textarea => "textarea",
            ElementKind::Img => "img",
            ElementKind::Text => "text",
        }
    }

    /// Interactive kinds are kept even without a label
    pub fn is_interactive(&self) -> bool {
        !matches!(self, ElementKind::Img | ElementKind::Text)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_generic_clickable(node: &NodeSnapshot) -> bool {
    node.has_click_handler
        || node
            .role
            .as_deref()
            .map(|role| CLICKABLE_ROLES.contains(role.trim().to_ascii_lowercase().as_str()))
            .unwrap_or(false)
}

/// Collapse every whitespace run to one space and trim
fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(collapse).filter(|v| !v.is_empty())
}

/// Builds space-separated `key='value'` tokens, skipping empty values
#[derive(Default)]
struct Tokens(Vec<String>);

impl Tokens {
    fn push(&mut self, key: &str, value: Option<&str>) {
        if let Some(value) = non_empty(value) {
            self.0.push(format!("{}='{}'", key, value.replace('\'', "\\'")));
        }
    }

    fn finish(self) -> String {
        self.0.join(" ")
    }
}

fn is_password(node: &NodeSnapshot) -> bool {
    node.input_type
        .as_deref()
        .map(|t| t.trim().eq_ignore_ascii_case("password"))
        .unwrap_or(false)
}

/// Render the kind-specific label for a node
pub fn label_for(kind: ElementKind, node: &NodeSnapshot) -> String {
    match kind {
        ElementKind::Link => {
            let text = non_empty(node.deep_text.as_deref())
                .or_else(|| non_empty(Some(node.own_text.as_str())));
            match (text, non_empty(node.href.as_deref())) {
                (Some(text), Some(href)) => format!("{} [{}]", text, href),
                (None, Some(href)) => format!("[{}]", href),
                (Some(text), None) => text,
                (None, None) => String::new(),
            }
        }
        ElementKind::Button => {
            let is_native = node.tag.eq_ignore_ascii_case("button");
            let own = non_empty(Some(node.own_text.as_str()));
            let deep = non_empty(node.deep_text.as_deref());
            let label = if is_native { deep.or(own) } else { own.or(deep) };
            label.unwrap_or_default()
        }
        ElementKind::Input => {
            let mut tokens = Tokens::default();
            tokens.push("type", node.input_type.as_deref());
            tokens.push("placeholder", node.placeholder.as_deref());
            if !is_password(node) {
                tokens.push("value", node.value.as_deref());
            }
            tokens.push("name", node.name.as_deref());
            tokens.finish()
        }
        ElementKind::Textarea => {
            let mut tokens = Tokens::default();
            tokens.push("placeholder", node.placeholder.as_deref());
            tokens.push("value", node.value.as_deref());
            tokens.push("name", node.name.as_deref());
            tokens.finish()
        }
        ElementKind::Select => {
            let options: Vec<String> = node
                .options
                .iter()
                .map(|o| collapse(o))
                .filter(|o| !o.is_empty())
                .collect();
            let options = options.join(", ");
            let mut tokens = Tokens::default();
            tokens.push("value", node.value.as_deref());
            tokens.push("name", node.name.as_deref());
            tokens.push("options", Some(options.as_str()));
            tokens.finish()
        }
        ElementKind::Img => {
            let mut tokens = Tokens::default();
            tokens.push("alt", node.alt.as_deref());
            tokens.push("src", node.src.as_deref());
            tokens.finish()
        }
        ElementKind::Text => collapse(&node.own_text),
    }
}

/// One retained element
#[derive(Debug, Clone, PartialEq)]
pub struct ElementRecord {
    pub index: usize,
    pub kind: ElementKind,
    pub label: String,
    pub address: ElementAddress,
}

impl ElementRecord {
    /// `<kind id=N>label</kind>`, or `<kind id=N/>` when the label is empty
    pub fn render(&self) -> String {
        if self.label.is_empty() {
            format!("<{} id={}/>", self.kind, self.index)
        } else {
            format!("<{} id={}>{}</{}>", self.kind, self.index, self.label, self.kind)
        }
    }
}
