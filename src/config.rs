//! Host-facing configuration payloads and their normalized engine forms.
//!
//! Every payload struct deserializes with per-field defaults, so a host may omit
//! any field. Values are validated once, at the boundary, by the `normalized`
//! constructors.

use serde::{Deserialize, Serialize};

use crate::pagination::{PageGeometry, ReadingDirection};

/// Viewport insets in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Padding {
    pub top: f64,
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Padding {
    fn normalized(self) -> Self {
        Self {
            top: finite_or(self.top, 0.0),
            left: finite_or(self.left, 0.0),
            right: finite_or(self.right, 0.0),
            bottom: finite_or(self.bottom, 0.0),
        }
    }
}

/// Colour scheme and stylesheet payload applied to every loaded document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Theme {
    /// Text zoom factor exposed as `--lumina-zoom`.
    pub zoom: f64,
    /// Column / scroll-snap rules injected as `injected-pagination-style`.
    pub pagination_css: String,
    /// Custom-property block injected as `injected-variable-style`.
    pub variable_css: String,
    pub surface_color: String,
    pub on_surface_color: String,
    pub primary_color: String,
    pub primary_container_color: String,
    pub on_surface_variant_color: String,
    pub outline_variant_color: String,
    pub surface_container_color: String,
    pub surface_container_high_color: String,
    /// Force theme text colour over publisher CSS.
    pub should_override_text_color: bool,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pagination_css: String::new(),
            variable_css: String::new(),
            surface_color: "#FFFFFF".to_string(),
            on_surface_color: "#000000".to_string(),
            primary_color: "#000000".to_string(),
            primary_container_color: "#000000".to_string(),
            on_surface_variant_color: "#000000".to_string(),
            outline_variant_color: "#000000".to_string(),
            surface_container_color: "#000000".to_string(),
            surface_container_high_color: "#000000".to_string(),
            should_override_text_color: true,
        }
    }
}

impl Theme {
    fn normalized(mut self) -> Self {
        self.zoom = normalize_zoom(self.zoom);
        self
    }

    /// Apply a theme update in place. Stylesheet payloads are preserved; the
    /// caller regenerates `variable_css` afterwards.
    pub fn apply_update(&mut self, update: &ThemeUpdate) {
        self.zoom = normalize_zoom(update.zoom);
        self.should_override_text_color = update.should_override_text_color;
        self.primary_color = match update.override_primary_color.as_deref() {
            Some(color) if !color.trim().is_empty() => color.to_string(),
            _ => update.primary_color.clone(),
        };
        self.primary_container_color = update.primary_container_color.clone();
        self.surface_color = update.surface_color.clone();
        self.on_surface_color = update.on_surface_color.clone();
        self.on_surface_variant_color = update.on_surface_variant_color.clone();
        self.outline_variant_color = update.outline_variant_color.clone();
        self.surface_container_color = update.surface_container_color.clone();
        self.surface_container_high_color = update.surface_container_high_color.clone();
    }
}

/// Payload of `updateTheme`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThemeUpdate {
    pub zoom: f64,
    pub padding: Padding,
    pub should_override_text_color: bool,
    /// User-chosen accent; wins over `primary_color` when non-empty.
    pub override_primary_color: Option<String>,
    pub primary_color: String,
    pub primary_container_color: String,
    pub surface_color: String,
    pub on_surface_color: String,
    pub on_surface_variant_color: String,
    pub outline_variant_color: String,
    pub surface_container_color: String,
    pub surface_container_high_color: String,
}

impl Default for ThemeUpdate {
    fn default() -> Self {
        let theme = Theme::default();
        Self {
            zoom: theme.zoom,
            padding: Padding::default(),
            should_override_text_color: theme.should_override_text_color,
            override_primary_color: None,
            primary_color: theme.primary_color,
            primary_container_color: theme.primary_container_color,
            surface_color: theme.surface_color,
            on_surface_color: theme.on_surface_color,
            on_surface_variant_color: theme.on_surface_variant_color,
            outline_variant_color: theme.outline_variant_color,
            surface_container_color: theme.surface_container_color,
            surface_container_high_color: theme.surface_container_high_color,
        }
    }
}

/// Payload of `init`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReaderConfig {
    pub safe_width: f64,
    pub safe_height: f64,
    pub direction: ReadingDirection,
    pub padding: Padding,
    pub theme: Theme,
    /// Pagination constants; only needed for non-default stylesheets.
    pub geometry: PageGeometry,
}

impl ReaderConfig {
    /// Convenience for a viewport size with default theme and padding.
    pub fn for_viewport(width: f64, height: f64, direction: ReadingDirection) -> Self {
        Self {
            safe_width: width,
            safe_height: height,
            direction,
            ..Self::default()
        }
    }

    /// Split into validated engine state.
    pub fn normalized(self) -> (ViewportConfig, Theme, PageGeometry) {
        let viewport = ViewportConfig {
            safe_width: floor_px(self.safe_width),
            safe_height: floor_px(self.safe_height),
            direction: self.direction,
            padding: self.padding.normalized(),
        };
        (viewport, self.theme.normalized(), self.geometry)
    }
}

/// Validated viewport state read by all pagination math.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewportConfig {
    pub safe_width: u32,
    pub safe_height: u32,
    pub direction: ReadingDirection,
    pub padding: Padding,
}

impl ViewportConfig {
    /// Viewport extent along the reading axis.
    pub fn extent(&self) -> f64 {
        self.direction
            .extent(f64::from(self.safe_width), f64::from(self.safe_height))
    }

    pub fn is_vertical(&self) -> bool {
        self.direction.is_vertical()
    }

    /// Replace the viewport size, flooring to whole pixels.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.safe_width = floor_px(width);
        self.safe_height = floor_px(height);
    }

    pub fn set_padding(&mut self, padding: Padding) {
        self.padding = padding.normalized();
    }
}

/// Floor to a whole, non-negative pixel count.
pub fn floor_px(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    value.floor().min(f64::from(u32::MAX)) as u32
}

fn normalize_zoom(zoom: f64) -> f64 {
    if zoom.is_finite() {
        zoom.max(0.0)
    } else {
        1.0
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}
