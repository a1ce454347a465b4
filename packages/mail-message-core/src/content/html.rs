//! HTML fragment parsing and serialization for [`Document`].
//!
//! Tokenizing is done by html5ever, so character references and attribute
//! forms follow the HTML standard. Tree construction is simpler than a
//! browser's: end tags close the nearest matching open element, stray end
//! tags are ignored and nothing is implicitly inserted or reparented.
//! Untrusted markup goes through [`sanitize`] first.

use super::{Document, Element, NodeId, NodeKind};
use ammonia::Builder;
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use std::cell::RefCell;
use std::sync::LazyLock;

/// Elements that never have children or an end tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose text content is serialized without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "xmp", "iframe", "noembed", "noframes"];

const HIDDEN_STYLE: &str = "display: none;";

static SANITIZER: LazyLock<Builder<'static>> = LazyLock::new(|| {
    let mut b = Builder::default();
    // Links in message bodies keep whatever rel the author gave them.
    b.link_rel(None);
    b.add_generic_attributes(&["id", "class", "style", "title"]);
    // Quote markers and record links used by the message view.
    b.add_generic_attribute_prefixes(&["data-o-", "data-oe-"]);
    b
});

/// Sanitize untrusted HTML down to markup safe to parse and display.
pub fn sanitize(html: &str) -> String {
    SANITIZER.clean(html).to_string()
}

fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

impl Document {
    /// Parse an HTML fragment into a new document.
    pub fn parse_fragment(html: &str) -> Self {
        let builder = RefCell::new(FragmentBuilder::new());
        let tokenizer = Tokenizer::new(
            FragmentSink { builder: &builder },
            TokenizerOpts::default(),
        );
        let input = BufferQueue::default();
        input.push_back(StrTendril::from(html));
        let _ = tokenizer.feed(&input);
        tokenizer.end();
        drop(tokenizer);
        builder.into_inner().doc
    }

    /// Sanitize untrusted HTML, then parse it.
    pub fn parse_untrusted(html: &str) -> Self {
        Self::parse_fragment(&sanitize(html))
    }

    /// Serialize the whole document.
    pub fn to_html(&self) -> String {
        self.inner_html(self.root())
    }

    /// Serialize the children of a node.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_node(child, &mut out);
        }
        out
    }

    /// Serialize a node including itself.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            NodeKind::Fragment => {
                for &child in self.children(id) {
                    self.write_node(child, out);
                }
            }
            NodeKind::Text(text) => {
                let raw = self
                    .parent(id)
                    .and_then(|parent| self.element(parent))
                    .map(|parent| is_raw_text(&parent.tag))
                    .unwrap_or(false);
                if raw {
                    out.push_str(text);
                } else {
                    escape_into(text, false, out);
                }
            }
            NodeKind::Element(element) => {
                write_start_tag(element, out);
                if is_void(&element.tag) {
                    return;
                }
                for &child in self.children(id) {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(&element.tag);
                out.push('>');
            }
        }
    }
}

fn write_start_tag(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.tag);
    let mut wrote_style = false;
    for (name, value) in &element.attrs {
        if name == "style" && element.hidden {
            write_attr(name, &hidden_style(value), out);
            wrote_style = true;
        } else {
            write_attr(name, value, out);
        }
    }
    if element.hidden && !wrote_style {
        write_attr("style", HIDDEN_STYLE, out);
    }
    out.push('>');
}

fn hidden_style(existing: &str) -> String {
    let existing = existing.trim();
    if existing.is_empty() {
        HIDDEN_STYLE.to_string()
    } else if existing.ends_with(';') {
        format!("{existing} {HIDDEN_STYLE}")
    } else {
        format!("{existing}; {HIDDEN_STYLE}")
    }
}

fn write_attr(name: &str, value: &str, out: &mut String) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    escape_into(value, true, out);
    out.push('"');
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

/// Open-element stack over a [`Document`], fed by the tokenizer.
struct FragmentBuilder {
    doc: Document,
    stack: Vec<NodeId>,
}

impl FragmentBuilder {
    fn new() -> Self {
        Self {
            doc: Document::new(),
            stack: Vec::new(),
        }
    }

    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(self.doc.root())
    }

    fn start_tag(&mut self, tag: &Tag) -> TokenSinkResult<()> {
        let mut element = Element::new(&tag.name);
        for attr in &tag.attrs {
            element.set_attr(&attr.name.local, &attr.value);
        }
        let name = element.tag.clone();
        let parent = self.current();
        let node = self.doc.create_element(element);
        self.doc.append_child(parent, node);

        if let Some(kind) = raw_kind(&name) {
            self.stack.push(node);
            return TokenSinkResult::RawData(kind);
        }
        if !tag.self_closing && !is_void(&name) {
            self.stack.push(node);
        }
        TokenSinkResult::Continue
    }

    /// Pop the stack up to the nearest open element named `name`.
    /// End tags without a matching open element are ignored.
    fn end_tag(&mut self, name: &str) {
        let doc = &self.doc;
        let matching = self
            .stack
            .iter()
            .rposition(|&id| doc.element(id).is_some_and(|e| e.tag == name));
        if let Some(index) = matching {
            self.stack.truncate(index);
        }
    }

    /// Append text, merging with a preceding text sibling.
    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let parent = self.current();
        let last = self.doc.children(parent).last().copied();
        if let Some(last) = last {
            if let NodeKind::Text(existing) = &mut self.doc.nodes[last.0].kind {
                existing.push_str(text);
                return;
            }
        }
        let node = self.doc.create_text(text);
        self.doc.append_child(parent, node);
    }
}

struct FragmentSink<'a> {
    builder: &'a RefCell<FragmentBuilder>,
}

impl TokenSink for FragmentSink<'_> {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        let mut builder = self.builder.borrow_mut();
        match token {
            Token::TagToken(tag) => match tag.kind {
                TagKind::StartTag => return builder.start_tag(&tag),
                TagKind::EndTag => builder.end_tag(&tag.name),
            },
            Token::CharacterTokens(text) => builder.text(&text),
            Token::ParseError(error) => tracing::trace!("Tolerated HTML error: {}", error),
            // Doctypes, comments and NUL characters are dropped
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

/// Tokenizer state for the content of raw text elements.
fn raw_kind(tag: &str) -> Option<RawKind> {
    match tag {
        "script" => Some(RawKind::ScriptData),
        "style" | "xmp" | "iframe" | "noembed" | "noframes" => Some(RawKind::Rawtext),
        "textarea" | "title" => Some(RawKind::Rcdata),
        _ => None,
    }
}
