//! Outbound notifications from the engine to its host.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Fire-and-forget notification for the host application.
///
/// Rectangles are in viewport coordinates (padding included), ready to anchor a
/// popover.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum HostEvent {
    /// The viewport settled after a resize.
    ViewportResize,
    PageCountReady { count: usize },
    PageChanged { index: usize },
    RendererInitialized,
    ScrollAnchors { anchors: Vec<String> },
    FootnoteTap { html: String, rect: Rect },
    LinkTap { href: String, rect: Rect },
    ImageLongPress { url: String, rect: Rect },
    /// Tap that hit no interactive region.
    Tap { x: f64, y: f64 },
    Rendered { token: String },
}

impl HostEvent {
    /// Callback name registered by the host runtime.
    pub fn handler_name(&self) -> &'static str {
        match self {
            Self::ViewportResize => "onViewportResize",
            Self::PageCountReady { .. } => "onPageCountReady",
            Self::PageChanged { .. } => "onPageChanged",
            Self::RendererInitialized => "onRendererInitialized",
            Self::ScrollAnchors { .. } => "onScrollAnchors",
            Self::FootnoteTap { .. } => "onFootnoteTap",
            Self::LinkTap { .. } => "onLinkTap",
            Self::ImageLongPress { .. } => "onImageLongPress",
            Self::Tap { .. } => "onTap",
            Self::Rendered { .. } => "onRendered",
        }
    }
}

/// Receiver of engine notifications; the transport is up to the embedding.
pub trait EventSink {
    fn send(&mut self, event: HostEvent);
}

impl EventSink for Vec<HostEvent> {
    fn send(&mut self, event: HostEvent) {
        self.push(event);
    }
}

impl<F> EventSink for F
where
    F: FnMut(HostEvent),
{
    fn send(&mut self, event: HostEvent) {
        self(event)
    }
}
