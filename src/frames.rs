//! Triple-buffered frame ring.
//!
//! Three physical surfaces stay alive for the whole session. Turning past a
//! document boundary reassigns which surface plays `prev`, `curr` and `next`
//! instead of reloading anything; per-document state (anchors, page count, load
//! state) is keyed by surface so it moves with its document automatically.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Sentinel anchor meaning "start of the document".
pub const TOP_ANCHOR: &str = "top";

/// Role a surface currently plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Prev,
    Curr,
    Next,
}

impl Slot {
    pub const ALL: [Slot; 3] = [Slot::Prev, Slot::Curr, Slot::Next];

    fn index(self) -> usize {
        match self {
            Self::Prev => 0,
            Self::Curr => 1,
            Self::Next => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prev => "prev",
            Self::Curr => "curr",
            Self::Next => "next",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Slot {
    type Err = EngineError;

    /// Accepts `prev`/`curr`/`next`, optionally prefixed with `frame-`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let name = value.strip_prefix("frame-").unwrap_or(value);
        match name {
            "prev" => Ok(Self::Prev),
            "curr" => Ok(Self::Curr),
            "next" => Ok(Self::Next),
            _ => Err(EngineError::UnknownSlot(value.into())),
        }
    }
}

/// Direction of a frame cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleDirection {
    Next,
    Prev,
}

impl FromStr for CycleDirection {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "next" => Ok(Self::Next),
            "prev" => Ok(Self::Prev),
            _ => Err(EngineError::UnknownCycleDirection(value.into())),
        }
    }
}

/// Index of a physical surface (`0..3`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SurfaceId(u8);

impl SurfaceId {
    pub const ALL: [SurfaceId; 3] = [SurfaceId(0), SurfaceId(1), SurfaceId(2)];

    pub fn new(index: usize) -> Result<Self, EngineError> {
        match u8::try_from(index) {
            Ok(raw) if index < 3 => Ok(Self(raw)),
            _ => Err(EngineError::SurfaceOutOfRange(index)),
        }
    }

    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface-{}", self.0)
    }
}

/// Load lifecycle of one surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Empty,
    /// Waiting for load completion, resources, and measurement.
    Loading { generation: u64 },
    Ready,
}

#[derive(Clone, Debug, Default)]
struct SurfaceState {
    anchors: Vec<String>,
    page_count: usize,
    load: LoadState,
}

/// Role assignment plus per-surface document state.
#[derive(Clone, Debug)]
pub struct FrameRing {
    // Indexed by `Slot::index`.
    roles: [SurfaceId; 3],
    states: [SurfaceState; 3],
    next_generation: u64,
}

impl Default for FrameRing {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameRing {
    /// Surface 0 plays `prev`, 1 plays `curr`, 2 plays `next`.
    pub fn new() -> Self {
        Self {
            roles: SurfaceId::ALL,
            states: Default::default(),
            next_generation: 1,
        }
    }

    pub fn surface(&self, slot: Slot) -> SurfaceId {
        self.roles[slot.index()]
    }

    pub fn slot_of(&self, surface: SurfaceId) -> Slot {
        Slot::ALL
            .into_iter()
            .find(|slot| self.surface(*slot) == surface)
            .unwrap_or(Slot::Curr)
    }

    pub fn anchors(&self, slot: Slot) -> &[String] {
        &self.state(self.surface(slot)).anchors
    }

    pub fn anchors_of(&self, surface: SurfaceId) -> &[String] {
        &self.state(surface).anchors
    }

    pub fn page_count(&self, slot: Slot) -> usize {
        self.state(self.surface(slot)).page_count
    }

    pub fn page_count_of(&self, surface: SurfaceId) -> usize {
        self.state(surface).page_count
    }

    pub fn set_page_count(&mut self, surface: SurfaceId, page_count: usize) {
        self.state_mut(surface).page_count = page_count;
    }

    pub fn load_state(&self, surface: SurfaceId) -> LoadState {
        self.state(surface).load
    }

    /// Record `anchors` for the document about to load into `slot` and enter
    /// `Loading`. The returned generation supersedes any in-flight load.
    pub fn begin_load(&mut self, slot: Slot, anchors: Vec<String>) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        let surface = self.surface(slot);
        let state = self.state_mut(surface);
        state.anchors = anchors;
        state.load = LoadState::Loading { generation };
        generation
    }

    /// Generation of the load in flight on `surface`, if any.
    pub fn loading_generation(&self, surface: SurfaceId) -> Option<u64> {
        match self.state(surface).load {
            LoadState::Loading { generation } => Some(generation),
            _ => None,
        }
    }

    /// Whether `generation` is still the live load of `surface`.
    pub fn is_current(&self, surface: SurfaceId, generation: u64) -> bool {
        self.loading_generation(surface) == Some(generation)
    }

    pub fn mark_ready(&mut self, surface: SurfaceId, page_count: usize) {
        let state = self.state_mut(surface);
        state.page_count = page_count;
        state.load = LoadState::Ready;
    }

    /// Forget every document; roles return to their initial assignment.
    pub fn reset(&mut self) {
        let next_generation = self.next_generation;
        *self = Self::new();
        self.next_generation = next_generation;
    }

    /// Rotate roles. `Next`: prev←curr, curr←next, next←old prev. `Prev` is the
    /// inverse.
    pub fn cycle(&mut self, direction: CycleDirection) {
        let [prev, curr, next] = self.roles;
        self.roles = match direction {
            CycleDirection::Next => [curr, next, prev],
            CycleDirection::Prev => [next, prev, curr],
        };
    }

    fn state(&self, surface: SurfaceId) -> &SurfaceState {
        &self.states[surface.index()]
    }

    fn state_mut(&mut self, surface: SurfaceId) -> &mut SurfaceState {
        &mut self.states[surface.index()]
    }
}
