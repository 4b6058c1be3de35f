use crate::core::savestate::StateError;

/// Describes a single input button that a machine accepts.
pub struct InputButton {
    /// Machine-defined button identifier, passed to `set_input()`.
    pub id: u8,
    /// Human-readable name for display/configuration (e.g., "A", "Pause").
    pub name: &'static str,
}

/// Host-provided audio output. The machine pushes interleaved 16-bit stereo
/// whenever its internal sample buffer fills and at end of frame.
/// Back-pressure is the host's problem; `play` must accept synchronously.
pub trait AudioSink {
    fn play(&mut self, samples: &[i16], sample_rate: u32);
}

/// Machine-agnostic interface for emulated systems.
///
/// The frontend is a pure rendering/input shell that does not know about
/// specific hardware (timers, sprite engines, palette formats, serial
/// EEPROMs); everything it needs goes through this trait.
pub trait Machine {
    /// Native display resolution as (width, height) in pixels,
    /// after any rotation the machine applies.
    fn display_size(&self) -> (u32, u32);

    /// Run one frame of emulation (advance the clock by one frame's worth of cycles).
    fn run_frame(&mut self);

    /// Render the current video state into an RGB24 pixel buffer.
    ///
    /// The buffer must be at least `width * height * 3` bytes (from
    /// `display_size()`). Pixels are stored left-to-right, top-to-bottom,
    /// 3 bytes per pixel (R, G, B). The machine is responsible for converting
    /// its internal video representation into this standard format.
    fn render_frame(&self, buffer: &mut [u8]);

    /// Handle an input event. `button` is a machine-defined ID from `input_map()`.
    /// `pressed` is true for key-down, false for key-up. Each call latches the
    /// button state so that `run_frame()` sees the accumulated input.
    fn set_input(&mut self, button: u8, pressed: bool);

    /// Get the list of input buttons this machine accepts.
    fn input_map(&self) -> &[InputButton];

    /// Reset the machine to its initial power-on state.
    fn reset(&mut self);

    /// Battery-backed storage image to persist, if any and if modified.
    fn save_nvram(&self) -> Option<Vec<u8>>;

    /// Restore a previously persisted battery image.
    fn load_nvram(&mut self, data: &[u8]);

    /// Serialize the complete machine state (ROM contents excluded).
    fn save_state(&self) -> Vec<u8>;

    /// Restore a state previously produced by `save_state`. On error the
    /// machine is left unchanged.
    fn load_state(&mut self, data: &[u8]) -> Result<(), StateError>;

    /// Output sample rate in Hz, or 0 if the machine has no audio.
    fn audio_sample_rate(&self) -> u32;

    /// Take whatever audio has accumulated since the last call
    /// (interleaved 16-bit stereo).
    fn drain_audio(&mut self) -> Vec<i16>;
}
