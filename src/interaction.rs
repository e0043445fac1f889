//! Interactive regions of the current document and tap resolution.
//!
//! The map is scanned from the live document on every rebuild and stored in
//! document-scroll coordinates so it stays valid while the reader pages
//! through the document.

use quick_xml::escape::escape;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::geometry::{Point, Rect};
use crate::quadtree::{Bounded, QuadTree};
use crate::surface::{NodeRef, RenderSurface};

/// Elements smaller than this in either dimension are treated as decorative.
pub const MIN_REGION_EXTENT_PX: f64 = 5.0;
/// Half-width of the square searched around a tap.
pub const HIT_RADIUS_PX: f64 = 20.0;

const DUOKAN_FOOTNOTE_CLASS: &str = "duokan-footnote";
const NOTEREF_TYPE: &str = "noteref";
const FOOTNOTE_CONTAINER_TAGS: [&str; 5] = ["li", "aside", "section", "div", "p"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    Image,
    Link,
    Footnote,
}

/// One tappable rectangle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InteractionRegion {
    pub kind: RegionKind,
    /// Document-scroll coordinates.
    pub rect: Rect,
    /// Absolute URL for images and links, HTML markup for footnotes.
    pub payload: String,
}

impl InteractionRegion {
    pub fn new(kind: RegionKind, rect: Rect, payload: impl Into<String>) -> Self {
        Self {
            kind,
            rect,
            payload: payload.into(),
        }
    }
}

impl Bounded for InteractionRegion {
    fn bounds(&self) -> Rect {
        self.rect
    }
}

/// Spatial index of the current document's interactive regions.
pub type InteractionIndex = QuadTree<InteractionRegion>;

/// Scans a surface into an [`InteractionIndex`].
pub struct InteractionMapBuilder<'a, S: ?Sized> {
    surface: &'a S,
    base: Option<Url>,
    scroll: Point,
    body: Rect,
}

impl<'a, S: RenderSurface + ?Sized> InteractionMapBuilder<'a, S> {
    /// Snapshot of `surface` with relative URLs resolved against `document_url`.
    pub fn new(surface: &'a S, document_url: Option<&str>) -> Self {
        let base = document_url.and_then(|raw| match Url::parse(raw) {
            Ok(url) => Some(url),
            Err(err) => {
                log::warn!("document url {raw:?} is not absolute: {err}");
                None
            }
        });
        Self {
            surface,
            base,
            scroll: surface.scroll_position(),
            body: surface.body_rect(),
        }
    }

    /// Build a fresh index over the full scroll extent of `surface`.
    pub fn build(surface: &'a S, document_url: Option<&str>) -> InteractionIndex {
        Self::new(surface, document_url).into_index()
    }

    pub fn into_index(self) -> InteractionIndex {
        let extent = self.surface.scroll_extent();
        let boundary = Rect::new(0.0, 0.0, extent.width.max(1.0), extent.height.max(1.0));
        let mut index = QuadTree::with_default_capacity(boundary);

        self.scan_images(&mut index);
        self.scan_links(&mut index);
        self.scan_annotations(&mut index);

        log::debug!("interaction map built with {} regions", index.len());
        index
    }

    fn scan_images(&self, index: &mut InteractionIndex) {
        for image in self.surface.images() {
            if !is_hit_sized(&image.rect) {
                continue;
            }
            let rect = self.to_document(image.rect);

            if image.has_class(DUOKAN_FOOTNOTE_CLASS) {
                let text = non_empty(image.alt.as_deref())
                    .or_else(|| non_empty(image.title.as_deref()))
                    .unwrap_or_default();
                if text.trim().is_empty() {
                    continue;
                }
                let html = wrap_text("duokan-footnote-content", text);
                index.insert(InteractionRegion::new(RegionKind::Footnote, rect, html));
                continue;
            }

            let src = self.absolute_url(&image.src);
            index.insert(InteractionRegion::new(RegionKind::Image, rect, src));
        }
    }

    fn scan_links(&self, index: &mut InteractionIndex) {
        for link in self.surface.links() {
            let href = link.href.trim();
            let (kind, payload) = match link.title.as_deref() {
                Some(title) if href.is_empty() || href == "#" => (
                    RegionKind::Footnote,
                    wrap_text("footnote-content", title),
                ),
                _ if link.epub_type.as_deref() == Some(NOTEREF_TYPE) => {
                    let html = target_id(href)
                        .map(|id| self.footnote_html(&id))
                        .unwrap_or_default();
                    (RegionKind::Footnote, html)
                }
                _ => (RegionKind::Link, self.absolute_url(href)),
            };

            if kind == RegionKind::Footnote && payload.trim().is_empty() {
                continue;
            }

            for rect in link.client_rects.iter().filter(|rect| is_hit_sized(rect)) {
                let region = InteractionRegion::new(kind, self.to_document(*rect), payload.clone());
                index.insert(region);
            }
        }
    }

    fn scan_annotations(&self, index: &mut InteractionIndex) {
        for note in self.surface.annotation_spans() {
            let html = format!(
                "<div class=\"aozora-footnote-content\">{}</div>",
                note.inner_html
            );
            for rect in note.client_rects.iter().filter(|rect| is_hit_sized(rect)) {
                let region = InteractionRegion::new(
                    RegionKind::Footnote,
                    self.to_document(*rect),
                    html.clone(),
                );
                index.insert(region);
            }
        }
    }

    /// Outer HTML of the element best representing footnote `id`.
    fn footnote_html(&self, id: &str) -> String {
        let id = id.trim_start_matches('#');
        if id.is_empty() {
            return String::new();
        }
        let Some(mut node) = self
            .surface
            .element_by_id(id)
            .or_else(|| self.surface.element_by_name(id))
        else {
            log::debug!("footnote target {id:?} not found");
            return String::new();
        };

        if self.surface.text_content(node).trim().is_empty() {
            if let Some(sibling) = self.surface.next_element_sibling(node) {
                node = sibling;
            }
        }
        let container: NodeRef = self
            .surface
            .closest(node, &FOOTNOTE_CONTAINER_TAGS)
            .unwrap_or(node);
        self.surface.outer_html(container)
    }

    fn to_document(&self, rect: Rect) -> Rect {
        rect.translate(self.scroll.x - self.body.x, self.scroll.y - self.body.y)
    }

    fn absolute_url(&self, raw: &str) -> String {
        let Some(base) = self.base.as_ref() else {
            return raw.to_string();
        };
        match base.join(raw) {
            Ok(url) => url.to_string(),
            Err(err) => {
                log::warn!("cannot resolve {raw:?} against {base}: {err}");
                raw.to_string()
            }
        }
    }
}

/// Percent-decoded fragment of `href`, `None` when it has no non-empty fragment.
pub fn target_id(href: &str) -> Option<String> {
    let (_, fragment) = href.split_once('#')?;
    if fragment.is_empty() {
        return None;
    }
    match urlencoding::decode(fragment) {
        Ok(decoded) => Some(decoded.into_owned()),
        Err(_) => Some(fragment.to_string()),
    }
}

fn is_hit_sized(rect: &Rect) -> bool {
    rect.width >= MIN_REGION_EXTENT_PX && rect.height >= MIN_REGION_EXTENT_PX
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

fn wrap_text(class: &str, text: &str) -> String {
    format!("<div class=\"{class}\">{}</div>", escape(text))
}

/// Region chosen by a hit test.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit<'a> {
    pub region: &'a InteractionRegion,
    /// `0` inside the region, else distance to its centre.
    pub distance: f64,
}

/// Nearest-region resolution over an [`InteractionIndex`].
pub struct HitTester;

impl HitTester {
    /// Closest region accepted by `predicate` within [`HIT_RADIUS_PX`] of
    /// `point` (document-scroll coordinates).
    ///
    /// Ties go to the region inserted last.
    pub fn resolve<'a, P>(
        index: &'a InteractionIndex,
        point: Point,
        mut predicate: P,
    ) -> Option<Hit<'a>>
    where
        P: FnMut(&InteractionRegion) -> bool,
    {
        let window = Rect::around(point, HIT_RADIUS_PX);
        let mut candidates = index.query_with_ids(&window);
        // Straddling regions come back once per quadrant.
        candidates.sort_by_key(|(id, _)| *id);
        candidates.dedup_by_key(|(id, _)| *id);

        let mut best: Option<Hit<'a>> = None;
        for (_, region) in candidates.into_iter().rev() {
            if !predicate(region) {
                continue;
            }
            let distance = if region.rect.contains(point) {
                0.0
            } else {
                region.rect.distance_to_center(point)
            };
            if best.map_or(true, |hit| distance < hit.distance) {
                best = Some(Hit { region, distance });
            }
        }
        best
    }

    /// Tap targets: footnotes and links.
    pub fn is_tap_target(region: &InteractionRegion) -> bool {
        matches!(region.kind, RegionKind::Footnote | RegionKind::Link)
    }

    /// Long-press targets: images.
    pub fn is_press_target(region: &InteractionRegion) -> bool {
        region.kind == RegionKind::Image
    }
}
