//! Viewport-gated preview loading
//!
//! Each rendered asset slot moves `Offscreen -> Pending -> Ready | Failed`.
//! Entering the viewport starts work; leaving it abandons work that is not
//! worth keeping. Video slots release their media source on leave.

use crate::asset_cache::AssetCache;
use crate::config::ViewerConfig;
use crate::error::AppError;
use crate::model::{AssetPayload, EntryKind};
use crate::thumbnail::StillEncoder;
use async_trait::async_trait;
use image::RgbaImage;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Identifier chosen by the presentation layer for a rendered slot
pub type SlotId = u64;

/// Visibility notifications driven by the presentation layer
pub trait ViewportSink {
    fn on_enter_view(&self, slot: SlotId);
    fn on_leave_view(&self, slot: SlotId);
}

/// Video dimensions reported once metadata has loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
}

/// Rendering surface able to decode a video source and grab a frame
#[async_trait]
pub trait VideoSurface: Send + Sync {
    /// Attach `source` to the slot's decoder and wait for its metadata
    async fn load_metadata(&self, slot: SlotId, source: &AssetPayload) -> Result<VideoMetadata, AppError>;

    /// Snapshot the current frame
    async fn capture_frame(&self, slot: SlotId) -> Result<RgbaImage, AppError>;

    /// Detach the slot's media source, releasing decoder memory
    fn detach(&self, slot: SlotId);
}

/// What a ready slot displays
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    Image(AssetPayload),
    /// Downscaled JPEG still shown in place of the video stream
    VideoStill(AssetPayload),
}

impl Preview {
    pub fn payload(&self) -> &AssetPayload {
        match self {
            Preview::Image(p) | Preview::VideoStill(p) => p,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState {
    Offscreen,
    Pending,
    Ready(Preview),
    /// Rendered as a placeholder glyph; only [`VisibilityController::retry`] leaves it
    Failed(AppError),
}

impl SlotState {
    pub fn name(&self) -> &'static str {
        match self {
            SlotState::Offscreen => "offscreen",
            SlotState::Pending => "pending",
            SlotState::Ready(_) => "ready",
            SlotState::Failed(_) => "failed",
        }
    }
}

/// A slot state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotEvent {
    pub slot: SlotId,
    pub state: SlotState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotKind {
    Image,
    Video,
}

struct Slot {
    key: String,
    kind: SlotKind,
    state: SlotState,
    visible: bool,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

struct VisibilityInner {
    cache: AssetCache,
    surface: Arc<dyn VideoSurface>,
    encoder: StillEncoder,
    settle_delay: Duration,
    slots: Mutex<HashMap<SlotId, Slot>>,
    events: mpsc::UnboundedSender<SlotEvent>,
}

impl VisibilityInner {
    fn emit(&self, slot: SlotId, state: SlotState) {
        tracing::debug!("Slot {} -> {}", slot, state.name());
        // The receiver is optional for hosts that poll `state`
        let _ = self.events.send(SlotEvent { slot, state });
    }

    fn start(self: &Arc<Self>, id: SlotId, slot: &mut Slot) {
        slot.generation += 1;
        slot.state = SlotState::Pending;

        let generation = slot.generation;
        let key = slot.key.clone();
        let kind = slot.kind;
        let inner = Arc::clone(self);

        slot.task = Some(tokio::spawn(async move {
            let result = match kind {
                SlotKind::Image => inner.cache.get(&key).await.map(Preview::Image),
                SlotKind::Video => inner.capture_still(id, &key).await.map(Preview::VideoStill),
            };
            inner.settle(id, generation, result);
        }));

        self.emit(id, SlotState::Pending);
    }

    async fn capture_still(&self, id: SlotId, key: &str) -> Result<AssetPayload, AppError> {
        let source = self.cache.get(key).await?;
        let metadata = self.surface.load_metadata(id, &source).await?;
        if metadata.width == 0 || metadata.height == 0 {
            return Err(AppError::Decode(format!("no video frames in {}", key)));
        }

        // The first frame is often blank right after metadata arrives
        tokio::time::sleep(self.settle_delay).await;

        let frame = self.surface.capture_frame(id).await?;
        let still = self.encoder.encode(&frame)?;
        self.surface.detach(id);
        Ok(still)
    }

    fn settle(&self, id: SlotId, generation: u64, result: Result<Preview, AppError>) {
        let mut slots = self.slots.lock();
        let Some(slot) = slots.get_mut(&id) else {
            return;
        };
        if slot.generation != generation || slot.state != SlotState::Pending {
            return;
        }

        slot.task = None;
        slot.state = match result {
            Ok(preview) => SlotState::Ready(preview),
            Err(e) => {
                tracing::warn!("Preview failed for {}: {}", slot.key, e);
                if slot.kind == SlotKind::Video {
                    self.surface.detach(id);
                }
                SlotState::Failed(e)
            }
        };
        self.emit(id, slot.state.clone());
    }

    /// Abort the slot's consuming task; the cache fetch itself keeps running
    fn cancel(&self, id: SlotId, slot: &mut Slot) {
        if let Some(task) = slot.task.take() {
            task.abort();
        }
        if slot.kind == SlotKind::Video && slot.state == SlotState::Pending {
            self.surface.detach(id);
        }
    }
}

/// Tracks slot visibility and drives preview loading
#[derive(Clone)]
pub struct VisibilityController {
    inner: Arc<VisibilityInner>,
}

impl VisibilityController {
    /// Create a controller and the receiver of its slot events
    pub fn new(
        cache: AssetCache,
        surface: Arc<dyn VideoSurface>,
        viewer: &ViewerConfig,
    ) -> (Self, mpsc::UnboundedReceiver<SlotEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let controller = Self {
            inner: Arc::new(VisibilityInner {
                cache,
                surface,
                encoder: StillEncoder::from_config(viewer),
                settle_delay: Duration::from_millis(viewer.settle_delay_ms),
                slots: Mutex::new(HashMap::new()),
                events: tx,
            }),
        };
        (controller, rx)
    }

    /// Register a slot rendering the asset at `key`; folders are rejected
    ///
    /// Re-registering a slot resets it to `Offscreen`.
    pub fn register(&self, slot: SlotId, key: impl Into<String>, kind: EntryKind) -> bool {
        let kind = match kind {
            EntryKind::Image => SlotKind::Image,
            EntryKind::Video => SlotKind::Video,
            EntryKind::Folder => return false,
        };

        let mut slots = self.inner.slots.lock();
        if let Some(mut old) = slots.remove(&slot) {
            self.inner.cancel(slot, &mut old);
        }
        slots.insert(
            slot,
            Slot {
                key: key.into(),
                kind,
                state: SlotState::Offscreen,
                visible: false,
                generation: 0,
                task: None,
            },
        );
        true
    }

    pub fn unregister(&self, slot: SlotId) {
        if let Some(mut old) = self.inner.slots.lock().remove(&slot) {
            self.inner.cancel(slot, &mut old);
        }
    }

    /// Drop every slot, e.g. when the folder view is rebuilt
    pub fn clear(&self) {
        let mut slots = self.inner.slots.lock();
        for (id, mut slot) in slots.drain() {
            self.inner.cancel(id, &mut slot);
        }
    }

    pub fn state(&self, slot: SlotId) -> Option<SlotState> {
        self.inner.slots.lock().get(&slot).map(|s| s.state.clone())
    }

    pub fn is_visible(&self, slot: SlotId) -> bool {
        self.inner.slots.lock().get(&slot).is_some_and(|s| s.visible)
    }

    /// Slot ids with their states, ordered by id
    pub fn snapshot(&self) -> Vec<(SlotId, SlotState)> {
        let mut states: Vec<_> = self
            .inner
            .slots
            .lock()
            .iter()
            .map(|(id, s)| (*id, s.state.clone()))
            .collect();
        states.sort_by_key(|(id, _)| *id);
        states
    }

    /// Leave `Failed`; loading restarts at once if the slot is visible
    pub fn retry(&self, id: SlotId) -> bool {
        let mut slots = self.inner.slots.lock();
        let Some(slot) = slots.get_mut(&id) else {
            return false;
        };
        if !matches!(slot.state, SlotState::Failed(_)) {
            return false;
        }

        if slot.visible {
            self.inner.start(id, slot);
        } else {
            slot.state = SlotState::Offscreen;
            self.inner.emit(id, SlotState::Offscreen);
        }
        true
    }

    /// Record a failure found while rendering, e.g. an undecodable image
    pub fn mark_failed(&self, id: SlotId, error: AppError) {
        let mut slots = self.inner.slots.lock();
        let Some(slot) = slots.get_mut(&id) else {
            return;
        };
        self.inner.cancel(id, slot);
        tracing::warn!("Slot {} marked failed: {}", id, error);
        slot.state = SlotState::Failed(error);
        self.inner.emit(id, slot.state.clone());
    }
}

impl ViewportSink for VisibilityController {
    fn on_enter_view(&self, id: SlotId) {
        let mut slots = self.inner.slots.lock();
        let Some(slot) = slots.get_mut(&id) else {
            return;
        };
        slot.visible = true;
        if slot.state == SlotState::Offscreen {
            self.inner.start(id, slot);
        }
    }

    fn on_leave_view(&self, id: SlotId) {
        let mut slots = self.inner.slots.lock();
        let Some(slot) = slots.get_mut(&id) else {
            return;
        };
        slot.visible = false;

        let reset = match (slot.kind, &slot.state) {
            (SlotKind::Video, SlotState::Pending | SlotState::Ready(_)) => true,
            (SlotKind::Image, SlotState::Pending) => true,
            _ => false,
        };
        if reset {
            self.inner.cancel(id, slot);
            slot.state = SlotState::Offscreen;
            self.inner.emit(id, SlotState::Offscreen);
        }
    }
}
