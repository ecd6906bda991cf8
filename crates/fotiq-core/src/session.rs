//! Editing session: commands, history, and frame scheduling for one image.

use crate::config::EngineConfig;
use crate::error::Result;
use crate::frame::FrameSlot;
use crate::history::EditHistory;
use crate::image::{LinearImage, PixelData};
use crate::scopes::histogram::HistogramData;
use crate::transform::params::{AdjustmentState, EditCommand};
use crate::transform::render::RenderBackend;
use crate::transform::uniforms::OutputMode;

/// Applies edit commands and keeps the undo history. Single writer, no locks.
#[derive(Debug, Clone)]
pub struct EditSession {
    config: EngineConfig,
    history: EditHistory,
}

impl EditSession {
    pub fn new(config: EngineConfig) -> Self {
        let config = config.sanitized();
        Self {
            history: EditHistory::new(AdjustmentState::default(), config.history_limit),
            config,
        }
    }

    /// Resume from a saved state. The state becomes the only history entry.
    pub fn with_state(config: EngineConfig, state: AdjustmentState) -> Self {
        let mut session = Self::new(config);
        let state = state.sanitized(session.config.masks_per_kind);
        session.history.reset(state);
        session
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn current(&self) -> &AdjustmentState {
        self.history.current()
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    /// Apply `command` to the current state. Commands that change nothing,
    /// such as a mask add at capacity, are not recorded.
    ///
    /// Returns `true` when a new history entry was pushed.
    pub fn apply(&mut self, command: &EditCommand) -> bool {
        let next = self.current().apply(command, &self.config);
        if &next == self.current() {
            return false;
        }
        self.history.push(next);
        true
    }

    /// Shorthand for [`EditCommand::SetValue`].
    pub fn set_value(&mut self, key: &str, value: f32) -> bool {
        self.apply(&EditCommand::SetValue {
            key: key.to_string(),
            value,
        })
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo().is_some()
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo().is_some()
    }

    /// Discard all history and return to the default state.
    pub fn reset(&mut self) {
        self.history.reset(AdjustmentState::default());
    }

    /// The state shown while comparing against the unedited image.
    pub fn compare_state(&self) -> AdjustmentState {
        AdjustmentState::default()
    }
}

/// Owns a session, a render backend, and the pending-frame slot.
///
/// Edits only queue a frame; [`Engine::render_pending`] renders the newest
/// queued state once, so bursts of edits cost one render.
pub struct Engine<B: RenderBackend> {
    session: EditSession,
    backend: B,
    slot: FrameSlot,
    comparing: bool,
}

impl<B: RenderBackend> Engine<B> {
    pub fn new(backend: B, config: EngineConfig) -> Self {
        Self {
            session: EditSession::new(config),
            backend,
            slot: FrameSlot::new(),
            comparing: false,
        }
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Load a new source image and start a fresh history.
    pub fn load_image(&mut self, image: LinearImage) -> Result<()> {
        self.backend.load_image(image)?;
        self.session.reset();
        self.request_frame();
        Ok(())
    }

    /// Decode an interleaved 8-bit or float buffer and load it.
    pub fn load_pixels(&mut self, data: PixelData<'_>, width: u32, height: u32) -> Result<()> {
        self.load_image(LinearImage::from_interleaved(data, width, height)?)
    }

    pub fn apply(&mut self, command: &EditCommand) -> bool {
        let changed = self.session.apply(command);
        if changed {
            self.request_frame();
        }
        changed
    }

    pub fn undo(&mut self) -> bool {
        let moved = self.session.undo();
        if moved {
            self.request_frame();
        }
        moved
    }

    pub fn redo(&mut self) -> bool {
        let moved = self.session.redo();
        if moved {
            self.request_frame();
        }
        moved
    }

    pub fn reset(&mut self) {
        self.session.reset();
        self.request_frame();
    }

    /// Toggle showing the unedited image.
    pub fn set_comparing(&mut self, comparing: bool) {
        self.comparing = comparing;
        self.request_frame();
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.backend.set_output_mode(mode);
        self.request_frame();
    }

    fn request_frame(&self) {
        let state = if self.comparing {
            self.session.compare_state()
        } else {
            self.session.current().clone()
        };
        self.slot.submit(state);
    }

    /// Render the newest queued state, if any.
    pub fn render_pending(&mut self) -> Result<Option<LinearImage>> {
        let Some((_, state)) = self.slot.take() else {
            return Ok(None);
        };
        self.backend.render(&state).map(Some)
    }

    /// Offscreen render of the current state at any size. The pending slot,
    /// the displayed frame and its histogram are left as they are.
    pub fn export(&mut self, width: u32, height: u32) -> Result<LinearImage> {
        let state = self.session.current().clone();
        self.backend.render_scaled(&state, width, height)
    }

    pub fn histogram(&self) -> Result<HistogramData> {
        self.backend.histogram()
    }
}
