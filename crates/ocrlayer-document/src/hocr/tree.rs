// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// hOCR annotation tree: an owned element tree built from the XHTML source
// with `quick-xml`, keeping for every element its hOCR class, the geometry
// from its `title` attribute, its own text and its tail text.

use std::path::{Path, PathBuf};

use ocrlayer_core::error::{OcrLayerError, Result};
use ocrlayer_core::{NodeClass, Px, Rect};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, instrument, trace};

use super::title::parse_title;

/// One element of the hOCR document.
///
/// `text` is the text between the start tag and the first child, `tail` the
/// text between the end tag and the next sibling (the ElementTree model).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationNode {
    /// Local tag name (`div`, `span`, …).
    pub tag: String,
    /// Namespace prefix of the tag, if any.
    pub prefix: Option<String>,
    /// Whether the tag lives in the document's namespace.
    pub in_namespace: bool,
    /// hOCR class from the `class` attribute.
    pub class: NodeClass,
    /// Raw `title` attribute.
    pub title: Option<String>,
    /// `bbox` property of the title.
    pub bounding_box: Option<Rect<Px>>,
    /// `file` / `image` property of the title.
    pub file_ref: Option<PathBuf>,
    /// Own text before the first child.
    pub text: Option<String>,
    /// Text after the end tag, inside the parent.
    pub tail: Option<String>,
    pub children: Vec<AnnotationNode>,
}

impl AnnotationNode {
    /// Bounding box, or `(0,0,0,0)` when the title carries none.
    pub fn bbox_or_zero(&self) -> Rect<Px> {
        self.bounding_box.unwrap_or_default()
    }

    /// All descendants in document order (pre-order), excluding `self`.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }

    /// Descendants of the given class, in document order.
    pub fn descendants_of(&self, class: NodeClass) -> impl Iterator<Item = &AnnotationNode> {
        self.descendants()
            .filter(move |node| node.in_namespace && node.class == class)
    }

    /// Line, word, area and paragraph descendants, in document order.
    pub fn text_nodes(&self) -> impl Iterator<Item = &AnnotationNode> {
        self.descendants()
            .filter(|node| node.in_namespace && node.class.is_text_layer())
    }

    /// Elements of this subtree, `self` included, whose local tag is `tag`.
    pub fn elements_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a AnnotationNode> {
        std::iter::once(self)
            .chain(self.descendants())
            .filter(move |node| node.in_namespace && node.tag == tag)
    }

    /// Tight pixel rectangle around every `ocr_line` on this node, if any
    /// line carries a bounding box.
    pub fn line_extent(&self) -> Option<Rect<Px>> {
        self.descendants_of(NodeClass::Line)
            .filter_map(|line| line.bounding_box)
            .reduce(|acc, rect| acc.union(&rect))
    }

    /// Own text, every child's text (with tails), then own tail.
    pub fn recursive_text(&self) -> String {
        let mut out = self.inner_text();
        if let Some(tail) = &self.tail {
            out.push_str(tail);
        }
        out
    }

    /// Like [`recursive_text`](Self::recursive_text) without own tail.
    pub fn inner_text(&self) -> String {
        let mut out = String::new();
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.children {
            out.push_str(&child.recursive_text());
        }
        out
    }

    /// Ordered text fragments of this subtree: own text, then for each child
    /// its fragments followed by its tail.
    pub fn text_fragments(&self) -> Vec<&str> {
        let mut fragments = Vec::new();
        self.collect_fragments(&mut fragments);
        fragments
    }

    fn collect_fragments<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let Some(text) = &self.text {
            out.push(text);
        }
        for child in &self.children {
            child.collect_fragments(out);
            if let Some(tail) = &child.tail {
                out.push(tail);
            }
        }
    }
}

/// Pre-order iterator over a node's descendants.
pub struct Descendants<'a> {
    stack: Vec<&'a AnnotationNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a AnnotationNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// A parsed hOCR document.
#[derive(Debug, Clone)]
pub struct HocrDocument {
    root: AnnotationNode,
    /// URI declared on the root element (`xmlns` or `xmlns:prefix`).
    namespace: Option<String>,
    /// Directory of the file the document was read from.
    source_dir: Option<PathBuf>,
}

impl HocrDocument {
    /// Read and parse an hOCR file.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|err| OcrLayerError::open(path, err))?;
        let source = String::from_utf8(bytes).map_err(|err| {
            OcrLayerError::DocumentParse(format!("{} is not UTF-8: {err}", path.display()))
        })?;
        let mut document = Self::parse(&source)?;
        document.source_dir = path.parent().map(Path::to_path_buf);
        Ok(document)
    }

    /// Parse hOCR markup held in memory.
    pub fn parse(source: &str) -> Result<Self> {
        let (root, namespace) = TreeBuilder::default().build(source)?;
        let document = Self {
            root,
            namespace,
            source_dir: None,
        };
        debug!(
            root = %document.root.tag,
            namespace = document.namespace.as_deref().unwrap_or(""),
            pages = document.pages().len(),
            "hOCR document parsed"
        );
        Ok(document)
    }

    /// The document's root element.
    pub fn root(&self) -> &AnnotationNode {
        &self.root
    }

    /// Namespace URI declared on the root element, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Directory of the source file, used to resolve relative image refs.
    pub fn source_dir(&self) -> Option<&Path> {
        self.source_dir.as_deref()
    }

    /// Every `ocr_page` container in document order.
    pub fn pages(&self) -> Vec<&AnnotationNode> {
        std::iter::once(&self.root)
            .chain(self.root.descendants())
            .filter(|node| node.in_namespace && node.class == NodeClass::Page)
            .collect()
    }

    /// The `body` element, if the document has one.
    pub fn body(&self) -> Option<&AnnotationNode> {
        self.root.elements_named("body").next()
    }

    /// Textual content of the body, or an empty string without one.
    pub fn body_text(&self) -> String {
        self.body().map(AnnotationNode::inner_text).unwrap_or_default()
    }
}

// -- Tree construction --------------------------------------------------------

#[derive(Default)]
struct TreeBuilder {
    stack: Vec<AnnotationNode>,
    root: Option<AnnotationNode>,
    /// `Some(prefix)` once the root element has been seen.
    root_prefix: Option<Option<String>>,
    namespace: Option<String>,
}

impl TreeBuilder {
    fn build(mut self, source: &str) -> Result<(AnnotationNode, Option<String>)> {
        let mut reader = Reader::from_str(source);

        loop {
            let event = reader.read_event().map_err(|err| {
                OcrLayerError::DocumentParse(format!(
                    "at byte {}: {}",
                    reader.buffer_position(),
                    err
                ))
            })?;
            match event {
                Event::Start(start) => {
                    let node = self.open_element(&start)?;
                    self.stack.push(node);
                }
                Event::Empty(start) => {
                    let node = self.open_element(&start)?;
                    self.close_element(node)?;
                }
                Event::End(_) => {
                    let node = self.stack.pop().ok_or_else(|| {
                        OcrLayerError::DocumentParse("unexpected closing tag".into())
                    })?;
                    self.close_element(node)?;
                }
                Event::Text(text) => {
                    let value = text
                        .unescape_with(resolve_entity)
                        .map_err(|err| OcrLayerError::DocumentParse(err.to_string()))?;
                    self.append_text(&value)?;
                }
                Event::CData(data) => {
                    let value = String::from_utf8_lossy(&data.into_inner()).into_owned();
                    self.append_text(&value)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = self.stack.last() {
            return Err(OcrLayerError::DocumentParse(format!(
                "unclosed element <{}> at end of document",
                open.tag
            )));
        }
        let root = self
            .root
            .ok_or_else(|| OcrLayerError::DocumentParse("document has no root element".into()))?;
        Ok((root, self.namespace))
    }

    fn open_element(&mut self, start: &BytesStart<'_>) -> Result<AnnotationNode> {
        let name = start.name();
        let tag = String::from_utf8_lossy(name.local_name().as_ref()).into_owned();
        let prefix = name
            .prefix()
            .map(|p| String::from_utf8_lossy(p.as_ref()).into_owned());

        let is_root = self.root_prefix.is_none();
        if is_root {
            self.root_prefix = Some(prefix.clone());
        }
        let in_namespace = self.root_prefix.as_ref() == Some(&prefix);

        let mut node = AnnotationNode {
            tag,
            prefix,
            in_namespace,
            ..AnnotationNode::default()
        };

        for attribute in start.attributes() {
            let attribute =
                attribute.map_err(|err| OcrLayerError::DocumentParse(err.to_string()))?;
            let value = attribute
                .unescape_value_with(resolve_entity)
                .map_err(|err| OcrLayerError::DocumentParse(err.to_string()))?;
            match attribute.key.as_ref() {
                b"class" => node.class = NodeClass::from_class_attr(&value),
                b"title" => node.title = Some(value.into_owned()),
                key if is_root && (key == b"xmlns" || key.starts_with(b"xmlns:")) => {
                    let declared_prefix = key.strip_prefix(b"xmlns:");
                    let matches_root = match (&node.prefix, declared_prefix) {
                        (None, None) => true,
                        (Some(p), Some(d)) => p.as_bytes() == d,
                        _ => false,
                    };
                    if matches_root {
                        self.namespace = Some(value.into_owned());
                    }
                }
                _ => {}
            }
        }

        if let Some(title) = &node.title {
            let parsed = parse_title(title);
            node.bounding_box = parsed.bbox;
            node.file_ref = parsed.file;
            trace!(tag = %node.tag, class = %node.class, title, "element title parsed");
        }

        Ok(node)
    }

    fn close_element(&mut self, node: AnnotationNode) -> Result<()> {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(node);
            return Ok(());
        }
        if self.root.is_some() {
            return Err(OcrLayerError::DocumentParse(
                "more than one root element".into(),
            ));
        }
        self.root = Some(node);
        Ok(())
    }

    fn append_text(&mut self, value: &str) -> Result<()> {
        let Some(parent) = self.stack.last_mut() else {
            if value.trim().is_empty() {
                return Ok(());
            }
            return Err(OcrLayerError::DocumentParse(format!(
                "text outside the root element: {:?}",
                value.trim()
            )));
        };
        let slot = match parent.children.last_mut() {
            Some(previous) => &mut previous.tail,
            None => &mut parent.text,
        };
        slot.get_or_insert_with(String::new).push_str(value);
        Ok(())
    }
}

/// XML predefined entities plus the HTML entities hOCR producers emit.
fn resolve_entity(name: &str) -> Option<&'static str> {
    let value = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        "shy" => "\u{ad}",
        "ensp" => "\u{2002}",
        "emsp" => "\u{2003}",
        "thinsp" => "\u{2009}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "sbquo" => "\u{201a}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "bdquo" => "\u{201e}",
        "laquo" => "\u{ab}",
        "raquo" => "\u{bb}",
        "hellip" => "\u{2026}",
        "bull" => "\u{2022}",
        "middot" => "\u{b7}",
        "copy" => "\u{a9}",
        "reg" => "\u{ae}",
        "trade" => "\u{2122}",
        "deg" => "\u{b0}",
        "para" => "\u{b6}",
        "sect" => "\u{a7}",
        "euro" => "\u{20ac}",
        "pound" => "\u{a3}",
        "times" => "\u{d7}",
        "divide" => "\u{f7}",
        _ => return None,
    };
    Some(value)
}
