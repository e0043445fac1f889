//! Cooperative work queue driven by the host's frame and clock pumps.
//!
//! Nothing here runs on its own: the host calls
//! [`ReaderEngine::on_animation_frame`](crate::ReaderEngine::on_animation_frame)
//! once per display frame and
//! [`ReaderEngine::advance_clock`](crate::ReaderEngine::advance_clock) with a
//! monotonic millisecond clock. Tasks carry surface ids and load generations
//! rather than references, so a handler firing after its document was replaced
//! re-reads live state and can drop itself.

use core::mem;

use crate::frames::SurfaceId;

/// Upper bound on waiting for images and fonts before measuring anyway.
pub const RESOURCE_TIMEOUT_MS: u64 = 3000;
/// Quiet window after the last resize before the host is notified.
pub const RESIZE_DEBOUNCE_MS: u64 = 120;
/// Delay before the interaction map is rebuilt after a theme change.
pub const THEME_REBUILD_DELAY_MS: u64 = 220;

/// Work deferred to the next animation frame.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameTask {
    /// Layout settled after load: measure, position and notify.
    Measure { surface: SurfaceId, generation: u64 },
    /// Re-measure after a theme change and restore `ratio` of progress.
    Reposition { surface: SurfaceId, ratio: f64 },
    /// Re-measure all three surfaces after a role rotation.
    RefreshAfterCycle,
    /// Page jump landed: notify (curr only) and detect anchors.
    PageJumped { surface: SurfaceId, index: usize },
    DetectAnchors { surface: SurfaceId },
    BuildInteractionMap,
    /// Echo `token` once `frames_left` more frames have passed.
    Rendered { token: String, frames_left: u8 },
}

/// Work due at a clock time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimerTask {
    ResourceTimeout { surface: SurfaceId, generation: u64 },
    ViewportResize,
    RebuildInteractionMap,
}

#[derive(Clone, Debug)]
struct Timer {
    due_ms: u64,
    task: TimerTask,
}

#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    frame: Vec<FrameTask>,
    timers: Vec<Timer>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` for the next animation frame. Interaction-map rebuilds
    /// coalesce into one per frame.
    pub fn request_frame(&mut self, task: FrameTask) {
        if task == FrameTask::BuildInteractionMap && self.frame.contains(&task) {
            return;
        }
        self.frame.push(task);
    }

    /// Everything queued for this frame. Tasks queued while these run land in
    /// the following frame.
    pub fn take_frame(&mut self) -> Vec<FrameTask> {
        mem::take(&mut self.frame)
    }

    pub fn set_timer(&mut self, task: TimerTask, now_ms: u64, delay_ms: u64) {
        self.timers.push(Timer {
            due_ms: now_ms.saturating_add(delay_ms),
            task,
        });
    }

    /// Like [`Scheduler::set_timer`], cancelling any pending timer for the same
    /// task first.
    pub fn restart_timer(&mut self, task: TimerTask, now_ms: u64, delay_ms: u64) {
        self.cancel_timer(&task);
        self.set_timer(task, now_ms, delay_ms);
    }

    pub fn cancel_timer(&mut self, task: &TimerTask) {
        self.timers.retain(|timer| timer.task != *task);
    }

    /// Remove and return timers due at `now_ms`, earliest first; timers due at
    /// the same time keep their scheduling order.
    pub fn take_due(&mut self, now_ms: u64) -> Vec<TimerTask> {
        let (mut due, pending): (Vec<_>, Vec<_>) = mem::take(&mut self.timers)
            .into_iter()
            .partition(|timer| timer.due_ms <= now_ms);
        self.timers = pending;
        due.sort_by_key(|timer| timer.due_ms);
        due.into_iter().map(|timer| timer.task).collect()
    }

    pub fn has_frame_work(&self) -> bool {
        !self.frame.is_empty()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Drop every queued task and timer.
    pub fn clear(&mut self) {
        self.frame.clear();
        self.timers.clear();
    }
}
