use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use epub_pager::{
    AnnotationElement, HostEvent, ImageElement, LinkElement, NodeRef, Point, Presentation,
    ReaderConfig, ReaderEngine, ReadingDirection, Rect, RenderSurface, Size, Slot, StyleRule,
    StyleTarget, StylesheetAccessError, SurfaceId,
};

pub const VIEW_WIDTH: f64 = 400.0;
pub const VIEW_HEIGHT: f64 = 600.0;

/// Scroll extent of a horizontal document with `pages` pages at 400 px.
pub fn horizontal_extent(pages: usize) -> Size {
    Size::new(pages as f64 * 528.0 - 128.0, VIEW_HEIGHT)
}

/// Style side effects recorded by the fakes.
#[derive(Clone, Debug, Default)]
pub struct StyleState {
    pub root_properties: BTreeMap<String, String>,
    pub body_classes: BTreeSet<String>,
    pub style_blocks: BTreeMap<String, String>,
    pub inserted_blocks: Vec<String>,
}

impl StyleTarget for StyleState {
    fn set_root_property(&mut self, name: &str, value: &str) {
        self.root_properties
            .insert(name.to_string(), value.to_string());
    }

    fn set_body_class(&mut self, class: &str, enabled: bool) {
        if enabled {
            self.body_classes.insert(class.to_string());
        } else {
            self.body_classes.remove(class);
        }
    }

    fn has_style_block(&self, id: &str) -> bool {
        self.style_blocks.contains_key(id)
    }

    fn insert_style_block(&mut self, id: &str, css: &str) {
        self.inserted_blocks.push(id.to_string());
        self.style_blocks.insert(id.to_string(), css.to_string());
    }

    fn replace_style_block(&mut self, id: &str, css: &str) -> bool {
        match self.style_blocks.get_mut(id) {
            Some(block) => {
                *block = css.to_string();
                true
            }
            None => false,
        }
    }
}

/// Outer document; the test keeps a handle to inspect what the engine set.
#[derive(Clone, Debug, Default)]
pub struct FakeShell {
    pub state: Rc<RefCell<StyleState>>,
}

impl StyleTarget for FakeShell {
    fn set_root_property(&mut self, name: &str, value: &str) {
        self.state.borrow_mut().set_root_property(name, value);
    }

    fn set_body_class(&mut self, class: &str, enabled: bool) {
        self.state.borrow_mut().set_body_class(class, enabled);
    }

    fn has_style_block(&self, id: &str) -> bool {
        self.state.borrow().has_style_block(id)
    }

    fn insert_style_block(&mut self, id: &str, css: &str) {
        self.state.borrow_mut().insert_style_block(id, css);
    }

    fn replace_style_block(&mut self, id: &str, css: &str) -> bool {
        self.state.borrow_mut().replace_style_block(id, css)
    }
}

/// Element of the fake DOM. Rects are in document-scroll coordinates.
#[derive(Clone, Debug, Default)]
pub struct FakeElement {
    pub tag: String,
    pub id: Option<String>,
    pub name: Option<String>,
    pub text: String,
    pub html: String,
    pub rects: Vec<Rect>,
    pub parent: Option<usize>,
    pub next_sibling: Option<usize>,
}

impl FakeElement {
    pub fn new(tag: &str, html: &str) -> Self {
        Self {
            tag: tag.to_string(),
            html: html.to_string(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn at(mut self, rect: Rect) -> Self {
        self.rects.push(rect);
        self
    }
}

/// In-memory document surface. Element rects are stored in document
/// coordinates and reported in viewport coordinates relative to `scroll`.
#[derive(Clone, Debug, Default)]
pub struct FakeSurface {
    pub source: Option<String>,
    pub loaded: bool,
    pub extent: Size,
    pub scroll: Point,
    pub presentation: Option<Presentation>,
    pub style: StyleState,
    pub images: Vec<ImageElement>,
    pub links: Vec<LinkElement>,
    pub annotations: Vec<AnnotationElement>,
    pub elements: Vec<FakeElement>,
    pub stylesheets: Vec<Result<Vec<StyleRule>, StylesheetAccessError>>,
    pub rule_updates: Vec<(usize, usize, String, String, String)>,
    pub navigations: Vec<String>,
}

impl FakeSurface {
    pub fn with_extent(extent: Size) -> Self {
        Self {
            extent,
            ..Self::default()
        }
    }

    pub fn add_element(&mut self, element: FakeElement) -> NodeRef {
        self.elements.push(element);
        NodeRef((self.elements.len() - 1) as u64)
    }

    fn element(&self, node: NodeRef) -> Option<&FakeElement> {
        self.elements.get(node.0 as usize)
    }

    fn to_viewport(&self, rect: Rect) -> Rect {
        rect.translate(-self.scroll.x, -self.scroll.y)
    }

    fn find(&self, mut matches: impl FnMut(&FakeElement) -> bool) -> Option<NodeRef> {
        self.elements
            .iter()
            .position(|element| matches(element))
            .map(|index| NodeRef(index as u64))
    }
}

impl StyleTarget for FakeSurface {
    fn set_root_property(&mut self, name: &str, value: &str) {
        self.style.set_root_property(name, value);
    }

    fn set_body_class(&mut self, class: &str, enabled: bool) {
        self.style.set_body_class(class, enabled);
    }

    fn has_style_block(&self, id: &str) -> bool {
        self.style.has_style_block(id)
    }

    fn insert_style_block(&mut self, id: &str, css: &str) {
        self.style.insert_style_block(id, css);
    }

    fn replace_style_block(&mut self, id: &str, css: &str) -> bool {
        self.style.replace_style_block(id, css)
    }
}

impl RenderSurface for FakeSurface {
    fn source(&self) -> Option<String> {
        self.source.clone()
    }

    fn set_source(&mut self, url: &str) {
        self.navigations.push(url.to_string());
        self.source = Some(url.to_string());
        self.loaded = true;
    }

    fn is_loaded(&self) -> bool {
        self.loaded
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

    fn set_presentation(&mut self, presentation: Presentation) {
        self.presentation = Some(presentation);
    }

    fn images(&self) -> Vec<ImageElement> {
        self.images
            .iter()
            .map(|image| ImageElement {
                rect: self.to_viewport(image.rect),
                ..image.clone()
            })
            .collect()
    }

    fn links(&self) -> Vec<LinkElement> {
        self.links
            .iter()
            .map(|link| LinkElement {
                client_rects: link
                    .client_rects
                    .iter()
                    .map(|rect| self.to_viewport(*rect))
                    .collect(),
                ..link.clone()
            })
            .collect()
    }

    fn annotation_spans(&self) -> Vec<AnnotationElement> {
        self.annotations
            .iter()
            .map(|note| AnnotationElement {
                client_rects: note
                    .client_rects
                    .iter()
                    .map(|rect| self.to_viewport(*rect))
                    .collect(),
                ..note.clone()
            })
            .collect()
    }

    fn element_by_id(&self, id: &str) -> Option<NodeRef> {
        self.find(|element| element.id.as_deref() == Some(id))
    }

    fn element_by_name(&self, name: &str) -> Option<NodeRef> {
        self.find(|element| element.name.as_deref() == Some(name))
    }

    fn text_content(&self, node: NodeRef) -> String {
        self.element(node)
            .map(|element| element.text.clone())
            .unwrap_or_default()
    }

    fn next_element_sibling(&self, node: NodeRef) -> Option<NodeRef> {
        self.element(node)?
            .next_sibling
            .map(|index| NodeRef(index as u64))
    }

    fn closest(&self, node: NodeRef, tags: &[&str]) -> Option<NodeRef> {
        let mut current = Some(node.0 as usize);
        while let Some(index) = current {
            let element = self.elements.get(index)?;
            if tags.contains(&element.tag.as_str()) {
                return Some(NodeRef(index as u64));
            }
            current = element.parent;
        }
        None
    }

    fn outer_html(&self, node: NodeRef) -> String {
        self.element(node)
            .map(|element| element.html.clone())
            .unwrap_or_default()
    }

    fn client_rects(&self, node: NodeRef) -> Vec<Rect> {
        self.element(node)
            .map(|element| {
                element
                    .rects
                    .iter()
                    .map(|rect| self.to_viewport(*rect))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn bounding_rect(&self, node: NodeRef) -> Rect {
        self.client_rects(node)
            .first()
            .copied()
            .unwrap_or_default()
    }

    fn stylesheet_count(&self) -> usize {
        self.stylesheets.len()
    }

    fn stylesheet_rules(&self, sheet: usize) -> Result<Vec<StyleRule>, StylesheetAccessError> {
        self.stylesheets
            .get(sheet)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn set_rule_property(
        &mut self,
        sheet: usize,
        rule: usize,
        name: &str,
        value: &str,
        priority: &str,
    ) {
        self.rule_updates.push((
            sheet,
            rule,
            name.to_string(),
            value.to_string(),
            priority.to_string(),
        ));
    }
}

pub type TestEngine = ReaderEngine<FakeSurface, Vec<HostEvent>>;

/// Engine at 400x600 with three blank surfaces and a shell.
pub fn engine_with(direction: ReadingDirection) -> (TestEngine, FakeShell) {
    let mut engine = ReaderEngine::new(Vec::new());
    for id in SurfaceId::ALL {
        engine.attach_surface(id, FakeSurface::default());
    }
    let shell = FakeShell::default();
    engine.attach_shell(Box::new(shell.clone()));
    engine.init(ReaderConfig::for_viewport(VIEW_WIDTH, VIEW_HEIGHT, direction));
    (engine, shell)
}

pub fn engine() -> TestEngine {
    engine_with(ReadingDirection::Horizontal).0
}

pub fn surface_mut(engine: &mut TestEngine, slot: Slot) -> &mut FakeSurface {
    let id = engine.ring().surface(slot);
    match engine.surface_mut(id) {
        Some(surface) => surface,
        None => panic!("no surface bound for {slot}"),
    }
}

pub fn surface(engine: &TestEngine, slot: Slot) -> &FakeSurface {
    match engine.surface_for(slot) {
        Some(surface) => surface,
        None => panic!("no surface bound for {slot}"),
    }
}

/// Load `url` into `slot`, size it to `extent`, and run it to `Ready`.
pub fn load_ready(engine: &mut TestEngine, slot: Slot, url: &str, extent: Size, anchors: &[&str]) {
    let anchors = anchors.iter().map(|anchor| anchor.to_string()).collect();
    engine.load_frame(slot, url, anchors);
    surface_mut(engine, slot).extent = extent;
    let id = engine.ring().surface(slot);
    engine.document_loaded(id);
    engine.resources_settled(id);
    engine.on_animation_frame();
}

/// Run queued frames until none are left.
pub fn drain_frames(engine: &mut TestEngine) {
    for _ in 0..8 {
        if !engine.has_pending_frame() {
            return;
        }
        engine.on_animation_frame();
    }
}

pub fn take_events(engine: &mut TestEngine) -> Vec<HostEvent> {
    std::mem::take(engine.sink_mut())
}
