//! Pagination and interaction engine for EPUB documents shown in a web view.
//!
//! Reflowable content is paged by scroll offset along the reading axis. Three
//! document surfaces are kept loaded (previous, current, next) and rotated as the
//! reader crosses document boundaries, so turning into an adjacent document never
//! waits on a load. Images, links and footnotes of the current document are kept
//! in a quadtree for tap and long-press resolution.
//!
//! The web view is reached through the [`RenderSurface`] and [`StyleTarget`]
//! traits; notifications leave through an [`EventSink`]. The engine is
//! single-threaded and does no work on its own: the host pumps animation frames
//! and a millisecond clock into it.

#![cfg_attr(
    not(test),
    deny(
        clippy::disallowed_methods,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

pub mod anchors;
pub mod config;
mod engine;
pub mod error;
pub mod event;
pub mod frames;
pub mod geometry;
pub mod interaction;
pub mod pagination;
pub mod quadtree;
pub mod scheduler;
pub mod surface;
pub mod theme;

pub use config::{Padding, ReaderConfig, Theme, ThemeUpdate, ViewportConfig};
pub use engine::ReaderEngine;
pub use error::EngineError;
pub use event::{EventSink, HostEvent};
pub use frames::{CycleDirection, FrameRing, LoadState, Slot, SurfaceId};
pub use geometry::{Point, Rect, Size};
pub use interaction::{HitTester, InteractionMapBuilder, InteractionRegion, RegionKind};
pub use pagination::{PageGeometry, ReadingDirection};
pub use quadtree::{Bounded, QuadTree};
pub use surface::{
    AnnotationElement, Declaration, ImageElement, LinkElement, NodeRef, Presentation,
    RenderSurface, StyleRule, StyleTarget, StylesheetAccessError,
};
