#![allow(dead_code)]

use std::collections::BTreeMap;

use epub_pager::{
    AnnotationElement, ImageElement, LinkElement, NodeRef, Point, Presentation, Rect,
    RenderSurface, Size, StyleRule, StyleTarget, StylesheetAccessError,
};

/// Blank chapter surface: a scroll extent, optional links, no element tree.
#[derive(Clone, Debug, Default)]
pub struct PageSurface {
    pub source: Option<String>,
    pub extent: Size,
    pub scroll: Point,
    pub links: Vec<LinkElement>,
    pub blocks: BTreeMap<String, String>,
}

impl PageSurface {
    pub fn with_extent(width: f64, height: f64) -> Self {
        Self {
            extent: Size::new(width, height),
            ..Self::default()
        }
    }
}

impl StyleTarget for PageSurface {
    fn set_root_property(&mut self, _name: &str, _value: &str) {}

    fn set_body_class(&mut self, _class: &str, _enabled: bool) {}

    fn has_style_block(&self, id: &str) -> bool {
        self.blocks.contains_key(id)
    }

    fn insert_style_block(&mut self, id: &str, css: &str) {
        self.blocks.insert(id.to_string(), css.to_string());
    }

    fn replace_style_block(&mut self, id: &str, css: &str) -> bool {
        self.blocks
            .insert(id.to_string(), css.to_string())
            .is_some()
    }
}

impl RenderSurface for PageSurface {
    fn source(&self) -> Option<String> {
        self.source.clone()
    }

    fn set_source(&mut self, url: &str) {
        self.source = Some(url.to_string());
    }

    fn is_loaded(&self) -> bool {
        self.source.is_some()
    }

    fn scroll_extent(&self) -> Size {
        self.extent
    }

    fn scroll_position(&self) -> Point {
        self.scroll
    }

    fn scroll_to(&mut self, offset: Point) {
        self.scroll = offset;
    }

    fn body_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.extent.width, self.extent.height)
    }

    fn set_presentation(&mut self, _presentation: Presentation) {}

    fn images(&self) -> Vec<ImageElement> {
        Vec::new()
    }

    fn links(&self) -> Vec<LinkElement> {
        self.links
            .iter()
            .map(|link| LinkElement {
                client_rects: link
                    .client_rects
                    .iter()
                    .map(|rect| rect.translate(-self.scroll.x, -self.scroll.y))
                    .collect(),
                ..link.clone()
            })
            .collect()
    }

    fn annotation_spans(&self) -> Vec<AnnotationElement> {
        Vec::new()
    }

    fn element_by_id(&self, _id: &str) -> Option<NodeRef> {
        None
    }

    fn element_by_name(&self, _name: &str) -> Option<NodeRef> {
        None
    }

    fn text_content(&self, _node: NodeRef) -> String {
        String::new()
    }

    fn next_element_sibling(&self, _node: NodeRef) -> Option<NodeRef> {
        None
    }

    fn closest(&self, _node: NodeRef, _tags: &[&str]) -> Option<NodeRef> {
        None
    }

    fn outer_html(&self, _node: NodeRef) -> String {
        String::new()
    }

    fn client_rects(&self, _node: NodeRef) -> Vec<Rect> {
        Vec::new()
    }

    fn bounding_rect(&self, _node: NodeRef) -> Rect {
        Rect::default()
    }

    fn stylesheet_count(&self) -> usize {
        0
    }

    fn stylesheet_rules(&self, _sheet: usize) -> Result<Vec<StyleRule>, StylesheetAccessError> {
        Ok(Vec::new())
    }

    fn set_rule_property(
        &mut self,
        _sheet: usize,
        _rule: usize,
        _name: &str,
        _value: &str,
        _priority: &str,
    ) {
    }
}
