//! JSON message bridge for `epub-pager`.
//!
//! Inbound messages are objects tagged by `"command"`:
//!
//! ```json
//! { "command": "loadFrame", "slot": "frame-curr", "url": "ch1.xhtml", "anchors": ["top"] }
//! ```
//!
//! Outbound events become `{ "handler": "onPageChanged", "args": [2] }`, the
//! positional shape the host runtime's callback handlers expect.

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

use core::fmt;
use std::io::Write;

use epub_pager::{
    CycleDirection, EngineError, EventSink, HostEvent, ReaderConfig, ReaderEngine, Rect,
    RenderSurface, Slot, SurfaceId, ThemeUpdate,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Every command name [`HostCommand`] understands.
pub const COMMANDS: &[&str] = &[
    "init",
    "loadFrame",
    "jumpToPage",
    "jumpToPageFor",
    "restoreScrollPosition",
    "cycleFrames",
    "updateTheme",
    "checkTapElementAt",
    "checkElementAt",
    "waitForRender",
    "documentLoaded",
    "resourcesSettled",
    "animationFrame",
    "advanceClock",
    "viewportResized",
];

/// Decoded inbound message.
///
/// Slots and cycle directions stay strings here so a bad value is reported as
/// an invalid argument rather than a decode failure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum HostCommand {
    Init {
        config: ReaderConfig,
    },
    #[serde(rename_all = "camelCase")]
    LoadFrame {
        slot: String,
        url: String,
        #[serde(default)]
        anchors: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    JumpToPage {
        page_index: usize,
    },
    #[serde(rename_all = "camelCase")]
    JumpToPageFor {
        slot: String,
        page_index: usize,
    },
    RestoreScrollPosition {
        ratio: f64,
    },
    CycleFrames {
        direction: String,
    },
    #[serde(rename_all = "camelCase")]
    UpdateTheme {
        view_width: f64,
        view_height: f64,
        #[serde(default)]
        theme: ThemeUpdate,
    },
    CheckTapElementAt {
        x: f64,
        y: f64,
    },
    CheckElementAt {
        x: f64,
        y: f64,
    },
    WaitForRender {
        token: String,
    },
    /// A surface fired its load event.
    DocumentLoaded {
        surface: usize,
    },
    /// Fonts and images of a surface finished loading.
    ResourcesSettled {
        surface: usize,
    },
    AnimationFrame,
    #[serde(rename_all = "camelCase")]
    AdvanceClock {
        now_ms: u64,
    },
    ViewportResized,
}

impl HostCommand {
    /// Decode one message, rejecting unknown command names before field
    /// validation.
    pub fn from_json(message: &str) -> Result<Self, BridgeError> {
        let value: Value = serde_json::from_str(message)?;
        let name = value
            .get("command")
            .and_then(Value::as_str)
            .ok_or(BridgeError::MissingCommand)?;
        if !COMMANDS.contains(&name) {
            return Err(BridgeError::UnknownCommand(name.into()));
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// Failure to turn a host message into an engine call.
#[derive(Debug)]
pub enum BridgeError {
    Json(serde_json::Error),
    MissingCommand,
    UnknownCommand(Box<str>),
    InvalidArgument(EngineError),
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(err) => write!(f, "malformed message: {}", err),
            Self::MissingCommand => f.write_str("message has no command field"),
            Self::UnknownCommand(name) => write!(f, "unknown command: {:?}", name),
            Self::InvalidArgument(err) => write!(f, "invalid argument: {}", err),
        }
    }
}

impl std::error::Error for BridgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::InvalidArgument(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<EngineError> for BridgeError {
    fn from(err: EngineError) -> Self {
        Self::InvalidArgument(err)
    }
}

/// Apply a decoded command to the engine.
pub fn dispatch<S, K>(
    engine: &mut ReaderEngine<S, K>,
    command: HostCommand,
) -> Result<(), BridgeError>
where
    S: RenderSurface,
    K: EventSink,
{
    match command {
        HostCommand::Init { config } => engine.init(config),
        HostCommand::LoadFrame { slot, url, anchors } => {
            engine.load_frame(slot.parse::<Slot>()?, &url, anchors)
        }
        HostCommand::JumpToPage { page_index } => engine.jump_to_page(page_index),
        HostCommand::JumpToPageFor { slot, page_index } => {
            engine.jump_to_page_for(slot.parse::<Slot>()?, page_index)
        }
        HostCommand::RestoreScrollPosition { ratio } => engine.restore_scroll_position(ratio),
        HostCommand::CycleFrames { direction } => {
            engine.cycle_frames(direction.parse::<CycleDirection>()?)
        }
        HostCommand::UpdateTheme {
            view_width,
            view_height,
            theme,
        } => engine.update_theme(view_width, view_height, &theme),
        HostCommand::CheckTapElementAt { x, y } => engine.check_tap_element_at(x, y),
        HostCommand::CheckElementAt { x, y } => engine.check_element_at(x, y),
        HostCommand::WaitForRender { token } => engine.wait_for_render(token),
        HostCommand::DocumentLoaded { surface } => {
            engine.document_loaded(SurfaceId::new(surface)?)
        }
        HostCommand::ResourcesSettled { surface } => {
            engine.resources_settled(SurfaceId::new(surface)?)
        }
        HostCommand::AnimationFrame => engine.on_animation_frame(),
        HostCommand::AdvanceClock { now_ms } => engine.advance_clock(now_ms),
        HostCommand::ViewportResized => engine.viewport_resized(),
    }
    Ok(())
}

/// Decode and apply one JSON message.
pub fn dispatch_json<S, K>(
    engine: &mut ReaderEngine<S, K>,
    message: &str,
) -> Result<(), BridgeError>
where
    S: RenderSurface,
    K: EventSink,
{
    let command = HostCommand::from_json(message)?;
    log::debug!("bridge: dispatching {:?}", command);
    dispatch(engine, command)
}

/// Outbound callback invocation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HostMessage {
    pub handler: String,
    pub args: Vec<Value>,
}

impl From<&HostEvent> for HostMessage {
    fn from(event: &HostEvent) -> Self {
        let args = match event {
            HostEvent::ViewportResize | HostEvent::RendererInitialized => Vec::new(),
            HostEvent::PageCountReady { count } => vec![json!(count)],
            HostEvent::PageChanged { index } => vec![json!(index)],
            HostEvent::ScrollAnchors { anchors } => vec![json!(anchors)],
            HostEvent::FootnoteTap { html, rect } => rect_args(html, rect),
            HostEvent::LinkTap { href, rect } => rect_args(href, rect),
            HostEvent::ImageLongPress { url, rect } => rect_args(url, rect),
            HostEvent::Tap { x, y } => vec![json!(x), json!(y)],
            HostEvent::Rendered { token } => vec![json!(token)],
        };
        Self {
            handler: event.handler_name().to_string(),
            args,
        }
    }
}

fn rect_args(payload: &str, rect: &Rect) -> Vec<Value> {
    vec![
        json!(payload),
        json!(rect.x),
        json!(rect.y),
        json!(rect.width),
        json!(rect.height),
    ]
}

/// Event sink writing one [`HostMessage`] per line.
#[derive(Debug)]
pub struct JsonEventSink<W> {
    writer: W,
}

impl<W: Write> JsonEventSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventSink for JsonEventSink<W> {
    fn send(&mut self, event: HostEvent) {
        let message = HostMessage::from(&event);
        let written = serde_json::to_writer(&mut self.writer, &message)
            .map_err(std::io::Error::from)
            .and_then(|()| self.writer.write_all(b"\n"));
        if let Err(err) = written {
            // Events are fire-and-forget; a dead host pipe only loses them.
            log::warn!("bridge: dropping {} event: {}", message.handler, err);
        }
    }
}
