//! Page math for column-paginated (horizontal) and scroll-snapped (vertical)
//! documents.
//!
//! The presentation stylesheet lays pages out with a fixed gap between them, so
//! every formula here works in units of `viewport + gap`.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::geometry::{Point, Size};

/// Gap between consecutive pages, matching the pagination stylesheet.
pub const PAGE_GAP_PX: f64 = 128.0;
/// An anchor counts as "on" the page where about its first fifth appears.
pub const ANCHOR_BIAS_DIVISOR: f64 = 5.0;
pub const ANCHOR_BIAS_PX: f64 = 1.0;

/// Reading direction of the paginated document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "DirectionRepr", into = "u8")]
pub enum ReadingDirection {
    /// Pages advance left-to-right via `scrollLeft`.
    #[default]
    Horizontal,
    /// Pages advance top-to-bottom via `scrollTop`.
    Vertical,
}

impl ReadingDirection {
    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Vertical)
    }

    /// Viewport extent along the reading axis.
    pub fn extent(self, width: f64, height: f64) -> f64 {
        match self {
            Self::Horizontal => width,
            Self::Vertical => height,
        }
    }

    /// Content extent along the reading axis.
    pub fn content_extent(self, size: Size) -> f64 {
        self.extent(size.width, size.height)
    }

    /// Component of `point` along the reading axis.
    pub fn axis(self, point: Point) -> f64 {
        match self {
            Self::Horizontal => point.x,
            Self::Vertical => point.y,
        }
    }

    /// Scroll position that places `offset` on the reading axis.
    pub fn scroll_point(self, offset: f64) -> Point {
        match self {
            Self::Horizontal => Point::new(offset, 0.0),
            Self::Vertical => Point::new(0.0, offset),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        }
    }
}

impl fmt::Display for ReadingDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadingDirection {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "0" | "horizontal" => Ok(Self::Horizontal),
            "1" | "vertical" => Ok(Self::Vertical),
            _ => Err(EngineError::UnknownDirection(value.into())),
        }
    }
}

impl TryFrom<u8> for ReadingDirection {
    type Error = EngineError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Horizontal),
            1 => Ok(Self::Vertical),
            other => Err(EngineError::UnknownDirection(other.to_string().into())),
        }
    }
}

impl From<ReadingDirection> for u8 {
    fn from(direction: ReadingDirection) -> Self {
        match direction {
            ReadingDirection::Horizontal => 0,
            ReadingDirection::Vertical => 1,
        }
    }
}

/// Host payloads carry the direction either as the legacy numeric code or by name.
#[derive(Deserialize)]
#[serde(untagged)]
enum DirectionRepr {
    Code(u8),
    Name(String),
}

impl TryFrom<DirectionRepr> for ReadingDirection {
    type Error = EngineError;

    fn try_from(repr: DirectionRepr) -> Result<Self, Self::Error> {
        match repr {
            DirectionRepr::Code(code) => Self::try_from(code),
            DirectionRepr::Name(name) => name.parse(),
        }
    }
}

/// Tuned constants coupling page math to the pagination stylesheet.
///
/// Changing any of them without changing the stylesheet desynchronizes page
/// boundaries from the column layout.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageGeometry {
    pub page_gap: f64,
    pub anchor_bias_divisor: f64,
    pub anchor_bias_px: f64,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            page_gap: PAGE_GAP_PX,
            anchor_bias_divisor: ANCHOR_BIAS_DIVISOR,
            anchor_bias_px: ANCHOR_BIAS_PX,
        }
    }
}

impl PageGeometry {
    fn stride(&self, viewport: f64) -> f64 {
        sanitize(viewport) + self.page_gap
    }

    /// Number of pages for a document whose scroll extent is `content`.
    pub fn page_count(&self, content: f64, viewport: f64) -> usize {
        let stride = self.stride(viewport);
        if stride <= 0.0 {
            return 0;
        }
        to_index(((sanitize(content) + self.page_gap) / stride).round())
    }

    /// Scroll offset of the leading edge of page `page_index`.
    pub fn scroll_offset(&self, page_index: usize, viewport: f64) -> f64 {
        let page = page_index as f64;
        page * sanitize(viewport) + page * self.page_gap
    }

    /// Page holding an anchor element at `element_offset` (document-scroll
    /// coordinates) whose extent on the reading axis is `element_extent`.
    pub fn page_index_of_anchor(
        &self,
        element_offset: f64,
        element_extent: f64,
        viewport: f64,
    ) -> usize {
        let stride = self.stride(viewport);
        if stride <= 0.0 {
            return 0;
        }
        let divisor = if self.anchor_bias_divisor > 0.0 {
            self.anchor_bias_divisor
        } else {
            ANCHOR_BIAS_DIVISOR
        };
        let biased = sanitize_signed(element_offset)
            + sanitize(element_extent) / divisor
            + self.anchor_bias_px
            + self.page_gap;
        to_index((biased / stride).floor())
    }

    /// Page shown at scroll position `scroll`.
    pub fn page_index_at_offset(&self, scroll: f64, viewport: f64) -> usize {
        let stride = self.stride(viewport);
        if stride <= 0.0 {
            return 0;
        }
        to_index(((sanitize(scroll) + self.page_gap) / stride).round())
    }
}

/// Progress ratio of `page_index` within `page_count` pages.
pub fn progress_ratio(page_index: usize, page_count: usize) -> f64 {
    if page_count == 0 {
        return 0.0;
    }
    page_index as f64 / page_count as f64
}

/// Page for a progress `ratio` in `[0, 1]`, clamped to the last page.
pub fn page_for_ratio(ratio: f64, page_count: usize) -> usize {
    if page_count == 0 {
        return 0;
    }
    let ratio = if ratio.is_finite() {
        ratio.clamp(0.0, 1.0)
    } else {
        0.0
    };
    to_index((ratio * page_count as f64).round()).min(page_count - 1)
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

fn sanitize_signed(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn to_index(value: f64) -> usize {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    value as usize
}
