use address_protocol::SessionToken;
use getrandom::getrandom;
use log::{debug, warn};
use std::time::{SystemTime, UNIX_EPOCH};

/// Owns the single live place-lookup session token.
#[derive(Debug)]
pub struct SessionTokenManager {
    current: SessionToken,
    issued: u64,
}

impl SessionTokenManager {
    pub fn new() -> Self {
        let mut manager = Self {
            current: SessionToken::new(String::new()),
            issued: 0,
        };
        manager.current = manager.generate();
        manager
    }

    pub fn current(&self) -> &SessionToken {
        &self.current
    }

    /// Tokens handed out so far, including the initial one.
    pub const fn issued(&self) -> u64 {
        self.issued
    }

    /// Replace the current token with a fresh one.
    pub fn rotate(&mut self) -> &SessionToken {
        self.current = self.generate();
        debug!("rotated place session token (#{})", self.issued);
        &self.current
    }

    fn generate(&mut self) -> SessionToken {
        self.issued += 1;
        let mut bytes = [0u8; 16];
        match getrandom(&mut bytes) {
            Ok(()) => SessionToken::new(hex(&bytes)),
            Err(err) => {
                warn!("OS randomness unavailable for session token: {err}");
                let nanos = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_nanos())
                    .unwrap_or_default();
                SessionToken::new(format!("{nanos:032x}-{:x}", self.issued))
            }
        }
    }
}

impl Default for SessionTokenManager {
    fn default() -> Self {
        Self::new()
    }
}

fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}
