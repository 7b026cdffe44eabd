use log::debug;
use std::time::{Duration, Instant};

/// Guards local typing against external value pushes.
///
/// Every local edit opens (or extends) a typing window that closes after a
/// quiet period. While it is open, values pushed by the owning form are
/// dropped; once it has closed, a push that differs from the current value
/// wins.
#[derive(Debug, Clone)]
pub struct SelectionSync {
    quiet_period: Duration,
    typing_until: Option<Instant>,
}

impl SelectionSync {
    pub const fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            typing_until: None,
        }
    }

    pub fn note_local_edit(&mut self, now: Instant) {
        self.typing_until = Some(now + self.quiet_period);
    }

    /// Deadline of the open typing window, if any.
    pub const fn typing_deadline(&self) -> Option<Instant> {
        self.typing_until
    }

    pub fn is_typing(&mut self, now: Instant) -> bool {
        match self.typing_until {
            Some(deadline) if now < deadline => true,
            Some(_) => {
                self.typing_until = None;
                false
            }
            None => false,
        }
    }

    /// Returns the value to apply, or `None` if the push must be ignored.
    pub fn reconcile_external(
        &mut self,
        incoming: &str,
        current: &str,
        now: Instant,
    ) -> Option<String> {
        if self.is_typing(now) {
            debug!("ignoring external value push while typing");
            return None;
        }
        (incoming != current).then(|| incoming.to_string())
    }

    /// Forget the typing window (teardown or committed selection).
    pub fn reset(&mut self) {
        self.typing_until = None;
    }
}
