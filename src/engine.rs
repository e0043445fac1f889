//! Frame lifecycle and the host command surface.

use url::Url;

use crate::anchors::detect_active_anchors;
use crate::config::{ReaderConfig, Theme, ThemeUpdate, ViewportConfig};
use crate::event::{EventSink, HostEvent};
use crate::frames::{CycleDirection, FrameRing, LoadState, Slot, SurfaceId};
use crate::geometry::{Point, Rect};
use crate::interaction::{
    target_id, HitTester, InteractionIndex, InteractionMapBuilder, InteractionRegion, RegionKind,
};
use crate::pagination::{page_for_ratio, progress_ratio, PageGeometry};
use crate::scheduler::{
    FrameTask, Scheduler, TimerTask, RESIZE_DEBOUNCE_MS, RESOURCE_TIMEOUT_MS,
    THEME_REBUILD_DELAY_MS,
};
use crate::surface::{Presentation, RenderSurface, StyleTarget};
use crate::theme::{
    apply_css_variables, generate_variable_css, inject_document_styles, SHELL_VARIABLE_STYLE_ID,
    VARIABLE_STYLE_ID,
};

/// Pagination and interaction engine for one hosting document.
///
/// Owns three identity-stable surfaces, the role ring, the interaction index of
/// the current document and a cooperative task queue. Commands never fail: a
/// command aimed at a missing or unloaded surface is a no-op.
pub struct ReaderEngine<S, K> {
    surfaces: [Option<S>; 3],
    shell: Option<Box<dyn StyleTarget>>,
    viewport: ViewportConfig,
    theme: Theme,
    geometry: PageGeometry,
    ring: FrameRing,
    scheduler: Scheduler,
    /// Load generation waiting for resources, per surface.
    awaiting_resources: [Option<u64>; 3],
    index: Option<InteractionIndex>,
    sink: K,
    now_ms: u64,
    resize_armed: bool,
}

impl<S: RenderSurface, K: EventSink> ReaderEngine<S, K> {
    pub fn new(sink: K) -> Self {
        Self {
            surfaces: [None, None, None],
            shell: None,
            viewport: ViewportConfig::default(),
            theme: Theme::default(),
            geometry: PageGeometry::default(),
            ring: FrameRing::new(),
            scheduler: Scheduler::new(),
            awaiting_resources: [None; 3],
            index: None,
            sink,
            now_ms: 0,
            resize_armed: false,
        }
    }

    /// Bind `surface` to physical slot `id`, returning any surface it replaces.
    pub fn attach_surface(&mut self, id: SurfaceId, surface: S) -> Option<S> {
        self.surfaces[id.index()].replace(surface)
    }

    /// Bind the outer document that carries the shell variable block.
    pub fn attach_shell(&mut self, shell: Box<dyn StyleTarget>) {
        self.shell = Some(shell);
    }

    /// Apply viewport, direction, padding and theme; re-entrant.
    pub fn init(&mut self, config: ReaderConfig) {
        let (viewport, theme, geometry) = config.normalized();
        self.viewport = viewport;
        self.theme = theme;
        self.geometry = geometry;
        self.apply_shell_variables();
        self.resize_armed = true;
        log::debug!(
            "reader initialized: {}x{} {}",
            self.viewport.safe_width,
            self.viewport.safe_height,
            self.viewport.direction
        );
    }

    /// Drop pending work, per-document state and the interaction index.
    /// Attached surfaces stay bound.
    pub fn teardown(&mut self) {
        self.scheduler.clear();
        self.ring.reset();
        self.present_by_role();
        self.awaiting_resources = [None; 3];
        self.index = None;
        self.resize_armed = false;
        log::debug!("reader torn down");
    }

    pub fn surface(&self, id: SurfaceId) -> Option<&S> {
        self.surfaces[id.index()].as_ref()
    }

    pub fn surface_mut(&mut self, id: SurfaceId) -> Option<&mut S> {
        self.surfaces[id.index()].as_mut()
    }

    /// Surface currently playing `slot`.
    pub fn surface_for(&self, slot: Slot) -> Option<&S> {
        self.surface(self.ring.surface(slot))
    }

    pub fn ring(&self) -> &FrameRing {
        &self.ring
    }

    pub fn viewport(&self) -> &ViewportConfig {
        &self.viewport
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn interaction_index(&self) -> Option<&InteractionIndex> {
        self.index.as_ref()
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Whether animation-frame work is queued.
    pub fn has_pending_frame(&self) -> bool {
        self.scheduler.has_frame_work()
    }

    /// Start loading `url` into `slot` with the anchors to track for it.
    ///
    /// A URL naming the document already shown (same origin and path) only
    /// moves the fragment, which fires no load event, so the load handler runs
    /// immediately.
    pub fn load_frame(&mut self, slot: Slot, url: &str, anchors: Vec<String>) {
        let id = self.ring.surface(slot);
        let Some(surface) = self.surfaces[id.index()].as_mut() else {
            log::warn!("load_frame({slot}) ignored: no surface bound");
            return;
        };

        let same_document = surface
            .source()
            .is_some_and(|current| is_same_document(&current, url));
        let generation = self.ring.begin_load(slot, anchors);
        self.awaiting_resources[id.index()] = None;
        surface.set_source(url);
        log::debug!("loading {url} into {slot} ({id}, generation {generation})");

        if same_document {
            self.document_loaded(id);
        }
    }

    /// Load completion reported by the host for surface `id`.
    pub fn document_loaded(&mut self, id: SurfaceId) {
        let Some(generation) = self.ring.loading_generation(id) else {
            log::debug!("document_loaded({id}) ignored: no load in flight");
            return;
        };
        let Some(surface) = self.surfaces[id.index()].as_mut() else {
            return;
        };
        if !surface.is_loaded() {
            return;
        }

        inject_document_styles(surface, &self.viewport, &self.theme);
        self.awaiting_resources[id.index()] = Some(generation);
        self.scheduler.set_timer(
            TimerTask::ResourceTimeout {
                surface: id,
                generation,
            },
            self.now_ms,
            RESOURCE_TIMEOUT_MS,
        );
    }

    /// Images and fonts of surface `id` finished loading (or failed).
    pub fn resources_settled(&mut self, id: SurfaceId) {
        let Some(generation) = self.awaiting_resources[id.index()].take() else {
            return;
        };
        self.scheduler.cancel_timer(&TimerTask::ResourceTimeout {
            surface: id,
            generation,
        });
        self.scheduler.request_frame(FrameTask::Measure {
            surface: id,
            generation,
        });
    }

    /// Run work queued for this animation frame.
    pub fn on_animation_frame(&mut self) {
        for task in self.scheduler.take_frame() {
            self.run_frame_task(task);
        }
    }

    /// Advance the host clock and fire due timers. The clock never runs
    /// backwards.
    pub fn advance_clock(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
        for task in self.scheduler.take_due(self.now_ms) {
            self.run_timer(task);
        }
    }

    pub fn jump_to_page(&mut self, page_index: usize) {
        self.jump_to_page_for(Slot::Curr, page_index);
    }

    pub fn jump_to_page_for(&mut self, slot: Slot, page_index: usize) {
        let id = self.ring.surface(slot);
        let offset = self.geometry.scroll_offset(page_index, self.viewport.extent());
        let direction = self.viewport.direction;
        let Some(surface) = self.loaded_surface_mut(id) else {
            return;
        };
        surface.scroll_to(direction.scroll_point(offset));
        self.scheduler.request_frame(FrameTask::PageJumped {
            surface: id,
            index: page_index,
        });
    }

    pub fn jump_to_last_page_of(&mut self, slot: Slot) {
        let last = self.ring.page_count(slot).saturating_sub(1);
        self.jump_to_page_for(slot, last);
    }

    /// Jump to `ratio` of the current document, clamped to its last page.
    pub fn restore_scroll_position(&mut self, ratio: f64) {
        let page_index = page_for_ratio(ratio, self.ring.page_count(Slot::Curr));
        self.jump_to_page(page_index);
    }

    /// Rotate surface roles without reloading. Requires all three surfaces.
    pub fn cycle_frames(&mut self, direction: CycleDirection) {
        if self.surfaces.iter().any(Option::is_none) {
            log::warn!("cycle_frames ignored: surfaces missing");
            return;
        }
        self.ring.cycle(direction);
        let curr = self.ring.surface(Slot::Curr);
        self.present_by_role();
        // Regions of the old document are stale until the rebuild lands.
        self.index = None;
        self.scheduler.request_frame(FrameTask::RefreshAfterCycle);
        log::debug!("cycled {direction:?}: curr is now {curr}");
    }

    /// Apply a new viewport size and theme to the shell and every loaded
    /// document, keeping each document at its own reading progress.
    pub fn update_theme(&mut self, view_width: f64, view_height: f64, update: &ThemeUpdate) {
        let previous = self.viewport;
        self.viewport.resize(view_width, view_height);
        self.viewport.set_padding(update.padding);
        self.theme.apply_update(update);
        self.theme.variable_css = generate_variable_css(&self.viewport, &self.theme);
        self.apply_shell_variables();

        for id in SurfaceId::ALL {
            let Some(surface) = self.surfaces[id.index()].as_mut() else {
                continue;
            };
            if !surface.is_loaded() {
                continue;
            }
            apply_css_variables(surface, &self.viewport, &self.theme, VARIABLE_STYLE_ID);
            // A surface still loading is measured by its own load.
            if self.ring.load_state(id) != LoadState::Ready {
                continue;
            }
            let ratio = reading_progress(surface, &previous, &self.geometry);
            self.scheduler
                .request_frame(FrameTask::Reposition { surface: id, ratio });
        }

        self.scheduler.restart_timer(
            TimerTask::RebuildInteractionMap,
            self.now_ms,
            THEME_REBUILD_DELAY_MS,
        );
        log::debug!(
            "theme updated: {}x{} zoom {}",
            self.viewport.safe_width,
            self.viewport.safe_height,
            self.theme.zoom
        );
    }

    /// Tap at viewport coordinates: footnote or link if one is in reach, else a
    /// bare tap.
    pub fn check_tap_element_at(&mut self, x: f64, y: f64) {
        let event = match self.hit(x, y, HitTester::is_tap_target) {
            Some((RegionKind::Footnote, html, rect)) => HostEvent::FootnoteTap { html, rect },
            Some((RegionKind::Link, href, rect)) => HostEvent::LinkTap { href, rect },
            _ => HostEvent::Tap { x, y },
        };
        self.sink.send(event);
    }

    /// Long press at viewport coordinates: reports an image in reach, else
    /// nothing.
    pub fn check_element_at(&mut self, x: f64, y: f64) {
        if let Some((_, url, rect)) = self.hit(x, y, HitTester::is_press_target) {
            self.sink.send(HostEvent::ImageLongPress { url, rect });
        }
    }

    /// Echo `token` after two animation frames.
    pub fn wait_for_render(&mut self, token: impl Into<String>) {
        self.scheduler.request_frame(FrameTask::Rendered {
            token: token.into(),
            frames_left: 1,
        });
    }

    /// Window resize observed; the host hears about it after a quiet window.
    pub fn viewport_resized(&mut self) {
        if !self.resize_armed {
            return;
        }
        self.scheduler
            .restart_timer(TimerTask::ViewportResize, self.now_ms, RESIZE_DEBOUNCE_MS);
    }

    fn run_frame_task(&mut self, task: FrameTask) {
        match task {
            FrameTask::Measure {
                surface,
                generation,
            } => self.finish_load(surface, generation),
            FrameTask::Reposition { surface, ratio } => self.reposition(surface, ratio),
            FrameTask::RefreshAfterCycle => {
                for slot in [Slot::Curr, Slot::Prev, Slot::Next] {
                    self.refresh_page_state(slot);
                }
                self.detect_anchors(self.ring.surface(Slot::Curr));
                self.scheduler.request_frame(FrameTask::BuildInteractionMap);
            }
            FrameTask::PageJumped { surface, index } => {
                if self.ring.slot_of(surface) == Slot::Curr {
                    self.sink.send(HostEvent::PageChanged { index });
                }
                self.detect_anchors(surface);
            }
            FrameTask::DetectAnchors { surface } => self.detect_anchors(surface),
            FrameTask::BuildInteractionMap => self.rebuild_interaction_map(),
            FrameTask::Rendered { token, frames_left } => {
                if frames_left == 0 {
                    self.sink.send(HostEvent::Rendered { token });
                } else {
                    self.scheduler.request_frame(FrameTask::Rendered {
                        token,
                        frames_left: frames_left - 1,
                    });
                }
            }
        }
    }

    fn run_timer(&mut self, task: TimerTask) {
        match task {
            TimerTask::ResourceTimeout {
                surface,
                generation,
            } => {
                if self.awaiting_resources[surface.index()] != Some(generation) {
                    log::debug!("stale resource timeout for {surface} dropped");
                    return;
                }
                self.awaiting_resources[surface.index()] = None;
                log::warn!("resources on {surface} did not settle; measuring anyway");
                self.scheduler.request_frame(FrameTask::Measure {
                    surface,
                    generation,
                });
            }
            TimerTask::ViewportResize => self.sink.send(HostEvent::ViewportResize),
            TimerTask::RebuildInteractionMap => {
                self.scheduler.request_frame(FrameTask::BuildInteractionMap)
            }
        }
    }

    /// Measure a settled load, scroll to its fragment and mark it ready.
    fn finish_load(&mut self, id: SurfaceId, generation: u64) {
        if !self.ring.is_current(id, generation) {
            log::debug!("stale measurement for {id} (generation {generation}) dropped");
            return;
        }
        let viewport = self.viewport;
        let geometry = self.geometry;
        let Some(surface) = self.loaded_surface_mut(id) else {
            return;
        };

        let page_count = page_count_of(surface, &viewport, &geometry);
        let fragment = surface.source().as_deref().and_then(target_id);
        let page_index = match fragment {
            Some(anchor) => {
                let page_index = anchor_page_index(surface, &anchor, &viewport, &geometry);
                let offset = geometry.scroll_offset(page_index, viewport.extent());
                surface.scroll_to(viewport.direction.scroll_point(offset));
                page_index
            }
            None => 0,
        };

        self.ring.mark_ready(id, page_count);
        log::debug!("{id} ready: {page_count} pages, at page {page_index}");
        self.settle(id, page_count, page_index);
    }

    fn reposition(&mut self, id: SurfaceId, ratio: f64) {
        if self.ring.load_state(id) != LoadState::Ready {
            log::debug!("reposition of {id} dropped: document replaced");
            return;
        }
        let viewport = self.viewport;
        let geometry = self.geometry;
        let Some(surface) = self.loaded_surface_mut(id) else {
            return;
        };
        let page_count = page_count_of(surface, &viewport, &geometry);
        let page_index = page_for_ratio(ratio, page_count);
        let offset = geometry.scroll_offset(page_index, viewport.extent());
        surface.scroll_to(viewport.direction.scroll_point(offset));
        self.ring.set_page_count(id, page_count);
        self.settle(id, page_count, page_index);
    }

    /// Notify or pre-position a freshly measured surface by its live role.
    fn settle(&mut self, id: SurfaceId, page_count: usize, page_index: usize) {
        match self.ring.slot_of(id) {
            Slot::Curr => {
                self.sink.send(HostEvent::PageCountReady { count: page_count });
                self.sink.send(HostEvent::PageChanged { index: page_index });
                self.sink.send(HostEvent::RendererInitialized);
            }
            Slot::Prev => self.jump_to_last_page_of(Slot::Prev),
            Slot::Next => self.jump_to_page_for(Slot::Next, 0),
        }
        self.scheduler.request_frame(FrameTask::BuildInteractionMap);
        self.scheduler
            .request_frame(FrameTask::DetectAnchors { surface: id });
    }

    fn refresh_page_state(&mut self, slot: Slot) {
        let id = self.ring.surface(slot);
        let viewport = self.viewport;
        let geometry = self.geometry;
        let Some(surface) = self.loaded_surface_mut(id) else {
            return;
        };
        let page_count = page_count_of(surface, &viewport, &geometry);
        let scroll = viewport.direction.axis(surface.scroll_position());
        let page_index = geometry.page_index_at_offset(scroll, viewport.extent());
        self.ring.set_page_count(id, page_count);

        match slot {
            Slot::Curr => {
                self.sink.send(HostEvent::PageCountReady { count: page_count });
                self.sink.send(HostEvent::PageChanged { index: page_index });
            }
            Slot::Prev => self.jump_to_last_page_of(Slot::Prev),
            Slot::Next => self.jump_to_page_for(Slot::Next, 0),
        }
    }

    /// Report active anchors of `id` when it is the current document.
    fn detect_anchors(&mut self, id: SurfaceId) {
        if self.ring.slot_of(id) != Slot::Curr {
            return;
        }
        let Some(surface) = self.surfaces[id.index()].as_ref().filter(|s| s.is_loaded()) else {
            return;
        };
        let anchors = detect_active_anchors(
            self.ring.anchors_of(id),
            self.viewport.direction,
            surface.scroll_position(),
            |anchor| {
                surface
                    .element_by_id(anchor)
                    .map(|node| surface.bounding_rect(node))
            },
        );
        if !anchors.is_empty() {
            self.sink.send(HostEvent::ScrollAnchors { anchors });
        }
    }

    fn rebuild_interaction_map(&mut self) {
        let id = self.ring.surface(Slot::Curr);
        self.index = self.surfaces[id.index()]
            .as_ref()
            .filter(|surface| surface.is_loaded())
            .map(|surface| {
                let url = surface.source();
                InteractionMapBuilder::build(surface, url.as_deref())
            });
    }

    /// Resolve a viewport point against the current index; the region rect is
    /// returned in viewport coordinates.
    fn hit<P>(&self, x: f64, y: f64, predicate: P) -> Option<(RegionKind, String, Rect)>
    where
        P: FnMut(&InteractionRegion) -> bool,
    {
        let index = self.index.as_ref()?;
        let surface = self.surface_for(Slot::Curr).filter(|s| s.is_loaded())?;
        let scroll = surface.scroll_position();
        let padding = self.viewport.padding;
        let point = Point::new(x - padding.left + scroll.x, y - padding.top + scroll.y);

        let hit = HitTester::resolve(index, point, predicate)?;
        let rect = hit
            .region
            .rect
            .translate(padding.left - scroll.x, padding.top - scroll.y);
        Some((hit.region.kind, hit.region.payload.clone(), rect))
    }

    /// Show the surface playing `curr` and hide the other two.
    fn present_by_role(&mut self) {
        let curr = self.ring.surface(Slot::Curr);
        for id in SurfaceId::ALL {
            if let Some(surface) = self.surfaces[id.index()].as_mut() {
                surface.set_presentation(if id == curr {
                    Presentation::visible()
                } else {
                    Presentation::hidden()
                });
            }
        }
    }

    fn loaded_surface_mut(&mut self, id: SurfaceId) -> Option<&mut S> {
        self.surfaces[id.index()]
            .as_mut()
            .filter(|surface| surface.is_loaded())
    }

    fn apply_shell_variables(&mut self) {
        if let Some(shell) = self.shell.as_deref_mut() {
            apply_css_variables(shell, &self.viewport, &self.theme, SHELL_VARIABLE_STYLE_ID);
        }
    }
}

fn page_count_of<S: RenderSurface + ?Sized>(
    surface: &S,
    viewport: &ViewportConfig,
    geometry: &PageGeometry,
) -> usize {
    let content = viewport.direction.content_extent(surface.scroll_extent());
    geometry.page_count(content, viewport.extent())
}

/// Page holding anchor `id`, `0` when the element is missing.
fn anchor_page_index<S: RenderSurface + ?Sized>(
    surface: &S,
    id: &str,
    viewport: &ViewportConfig,
    geometry: &PageGeometry,
) -> usize {
    let Some(node) = surface.element_by_id(id) else {
        log::debug!("anchor {id:?} not found; using first page");
        return 0;
    };
    let rect = surface
        .client_rects(node)
        .first()
        .copied()
        .unwrap_or_else(|| surface.bounding_rect(node));
    let body = surface.body_rect();
    let direction = viewport.direction;
    let offset = direction.axis(Point::new(rect.x, rect.y))
        + direction.axis(surface.scroll_position())
        - direction.axis(Point::new(body.x, body.y));
    let extent = direction.extent(rect.width, rect.height);
    geometry.page_index_of_anchor(offset, extent, viewport.extent())
}

/// Progress ratio of a surface in the layout it currently has.
fn reading_progress<S: RenderSurface + ?Sized>(
    surface: &S,
    viewport: &ViewportConfig,
    geometry: &PageGeometry,
) -> f64 {
    let scroll = viewport.direction.axis(surface.scroll_position());
    let page_index = geometry.page_index_at_offset(scroll, viewport.extent());
    progress_ratio(page_index, page_count_of(surface, viewport, geometry))
}

/// Whether `next` names the document `current` already shows (same origin and
/// path), so that only the fragment differs.
fn is_same_document(current: &str, next: &str) -> bool {
    let (Ok(current), Ok(next)) = (Url::parse(current), Url::parse(next)) else {
        return false;
    };
    current.scheme() == next.scheme()
        && current.host_str() == next.host_str()
        && current.port_or_known_default() == next.port_or_known_default()
        && current.path() == next.path()
}
