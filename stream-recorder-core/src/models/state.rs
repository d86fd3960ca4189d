/// Session state machine.
///
/// State transitions:
/// ```text
/// idle → recording → idle
/// idle → playing   → idle
/// ```
///
/// Recording and Playing are mutually exclusive; there is no direct
/// transition between them. A start request while the session is busy
/// is a no-op, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recording,
    Playing,
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Attempt the Idle → Recording transition. Returns `false` (and
    /// leaves the state untouched) unless the session is idle.
    pub fn try_begin_recording(&mut self) -> bool {
        if self.is_idle() {
            *self = Self::Recording;
            true
        } else {
            false
        }
    }

    /// Attempt the Idle → Playing transition.
    pub fn try_begin_playback(&mut self) -> bool {
        if self.is_idle() {
            *self = Self::Playing;
            true
        } else {
            false
        }
    }

    /// Loop completion, any outcome. Always lands on Idle.
    pub fn finish(&mut self) {
        *self = Self::Idle;
    }
}
