//! Seam between the engine and the web view hosting each document.
//!
//! The embedding implements these traits over its real DOM. All geometry is in
//! viewport (client) coordinates unless stated otherwise; the engine converts to
//! document-scroll coordinates itself.

use core::fmt;

use crate::geometry::{Point, Rect, Size};

/// Opaque handle to an element inside a surface's document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeRef(pub u64);

/// Stacking and hit-testing state of a surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Presentation {
    pub z_index: i32,
    pub opacity: f32,
    /// Whether the surface receives pointer events.
    pub interactive: bool,
}

impl Presentation {
    pub fn visible() -> Self {
        Self {
            z_index: 2,
            opacity: 1.0,
            interactive: true,
        }
    }

    pub fn hidden() -> Self {
        Self {
            z_index: 1,
            opacity: 0.0,
            interactive: false,
        }
    }
}

/// An `<img>` or SVG `<image>` element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImageElement {
    pub rect: Rect,
    pub classes: Vec<String>,
    pub alt: Option<String>,
    pub title: Option<String>,
    /// `currentSrc`, `src` or `xlink:href`, as written (may be relative).
    pub src: String,
}

impl ImageElement {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// An `<a href>` element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinkElement {
    /// Raw `href` attribute.
    pub href: String,
    pub title: Option<String>,
    /// `epub:type` attribute.
    pub epub_type: Option<String>,
    /// One rect per line box the link wraps across.
    pub client_rects: Vec<Rect>,
}

/// A legacy-style inline annotation (`span.notes`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnnotationElement {
    pub inner_html: String,
    pub client_rects: Vec<Rect>,
}

/// One style rule of a stylesheet, reduced to its declarations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleRule {
    pub declarations: Vec<Declaration>,
}

impl StyleRule {
    pub fn get(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.name == name)
    }

    /// Non-empty value of `name`.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name)
            .map(|d| d.value.trim())
            .filter(|value| !value.is_empty())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub value: String,
    /// `important` or empty.
    pub priority: String,
}

impl Declaration {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            priority: String::new(),
        }
    }
}

/// Stylesheet whose rules cannot be read (cross-origin).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StylesheetAccessError {
    pub sheet_index: usize,
    pub reason: Box<str>,
}

impl fmt::Display for StylesheetAccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "access to stylesheet {} blocked: {}",
            self.sheet_index, self.reason
        )
    }
}

impl std::error::Error for StylesheetAccessError {}

/// A document that accepts theme styling (each frame document and the shell).
pub trait StyleTarget {
    /// Set an inline custom property on the root element.
    fn set_root_property(&mut self, name: &str, value: &str);
    fn set_body_class(&mut self, class: &str, enabled: bool);
    fn has_style_block(&self, id: &str) -> bool;
    /// Append a `<style id=..>` block to the head.
    fn insert_style_block(&mut self, id: &str, css: &str);
    /// Replace the contents of an existing block; `false` when absent.
    fn replace_style_block(&mut self, id: &str, css: &str) -> bool;
}

/// One of the three identity-stable document surfaces.
pub trait RenderSurface: StyleTarget {
    /// Current document URL, `None` for a blank surface.
    fn source(&self) -> Option<String>;
    /// Navigate to `url`; completion is reported with `ReaderEngine::document_loaded`.
    fn set_source(&mut self, url: &str);
    /// Whether a content document is present.
    fn is_loaded(&self) -> bool;

    /// Full scroll extent of the document body.
    fn scroll_extent(&self) -> Size;
    fn scroll_position(&self) -> Point;
    fn scroll_to(&mut self, offset: Point);
    /// Body bounding rect in viewport coordinates.
    fn body_rect(&self) -> Rect;
    fn set_presentation(&mut self, presentation: Presentation);

    fn images(&self) -> Vec<ImageElement>;
    fn links(&self) -> Vec<LinkElement>;
    fn annotation_spans(&self) -> Vec<AnnotationElement>;

    fn element_by_id(&self, id: &str) -> Option<NodeRef>;
    /// First element whose `name` attribute equals `name`.
    fn element_by_name(&self, name: &str) -> Option<NodeRef>;
    fn text_content(&self, node: NodeRef) -> String;
    fn next_element_sibling(&self, node: NodeRef) -> Option<NodeRef>;
    /// Nearest inclusive ancestor whose tag is one of `tags`.
    fn closest(&self, node: NodeRef, tags: &[&str]) -> Option<NodeRef>;
    fn outer_html(&self, node: NodeRef) -> String;
    fn client_rects(&self, node: NodeRef) -> Vec<Rect>;
    fn bounding_rect(&self, node: NodeRef) -> Rect;

    fn stylesheet_count(&self) -> usize;
    fn stylesheet_rules(&self, sheet: usize) -> Result<Vec<StyleRule>, StylesheetAccessError>;
    fn set_rule_property(
        &mut self,
        sheet: usize,
        rule: usize,
        name: &str,
        value: &str,
        priority: &str,
    );
}
