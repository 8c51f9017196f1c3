/*!
 * Knobs that change how the codec treats bounds and short frames
 */

/// Codec configuration. The default reproduces the documented behaviour: floating signal
/// bounds are never checked and frames shorter than the message are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodecConfig {
    /// Check declared `minimum`/`maximum` of floating signals like integer ones.
    pub enforce_float_bounds: bool,
    /// Decode frames whose DLC is below the message's DLC, reading missing bytes as zero.
    pub allow_short_frames: bool,
}

impl CodecConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_float_bounds(mut self, enforce: bool) -> Self {
        self.enforce_float_bounds = enforce;
        self
    }

    pub fn with_short_frames(mut self, allow: bool) -> Self {
        self.allow_short_frames = allow;
        self
    }
}
