//! The resolution state machine.
//!
//! ```text
//!            keystroke                 timer (len >= min)
//!   Idle ─────────────> Debouncing ─────────────────────> Loading
//!    ^  <─────────────      │ ^                              │
//!    │  timer (len < min)   │ └──────── keystroke ───────────┤
//!    │                      │                                v
//!    └──── select/dismiss ──┴──── ShowingResults / ShowingNone
//! ```
//!
//! Time is passed in explicitly and lookups are returned as requests, so the
//! whole machine runs without a runtime. [`crate::AddressResolver`] drives it
//! on tokio.

use crate::classifier::PostcodeShapeClassifier;
use crate::config::ResolverConfig;
use crate::session::SessionTokenManager;
use crate::{ResolverError, Result};
use address_protocol::{Candidate, SessionToken};
use log::debug;
use serde::Serialize;
use std::time::Instant;

/// Causality token attached to every dispatched lookup.
pub type Generation = u64;

/// Externally visible phase of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Debouncing,
    Loading,
    ShowingResults,
    ShowingNone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Debouncing { deadline: Instant },
    Loading { generation: Generation },
    ShowingResults,
    ShowingNone,
}

impl State {
    const fn phase(self) -> Phase {
        match self {
            Self::Idle => Phase::Idle,
            Self::Debouncing { .. } => Phase::Debouncing,
            Self::Loading { .. } => Phase::Loading,
            Self::ShowingResults => Phase::ShowingResults,
            Self::ShowingNone => Phase::ShowingNone,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStage {
    Postcode,
    Place,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupKind {
    Postcode { postcode: String },
    Place { text: String, session: SessionToken },
}

/// A lookup the driver must perform on the controller's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    pub generation: Generation,
    pub kind: LookupKind,
}

impl LookupRequest {
    pub const fn stage(&self) -> LookupStage {
        match self.kind {
            LookupKind::Postcode { .. } => LookupStage::Postcode,
            LookupKind::Place { .. } => LookupStage::Place,
        }
    }
}

/// Completed lookup handed back to the controller.
#[derive(Debug, Clone)]
pub struct LookupResponse {
    pub generation: Generation,
    pub stage: LookupStage,
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// The response replaced the visible candidates.
    Applied,
    /// Postcode lookup came back empty; the place lookup must run next.
    FollowUp(LookupRequest),
    /// Superseded or retired; nothing changed.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissReason {
    OutsideClick,
    Blur,
    Escape,
}

#[derive(Debug, Clone)]
struct InFlight {
    generation: Generation,
    stage: LookupStage,
    query: String,
}

pub struct ResolutionController {
    config: ResolverConfig,
    sessions: SessionTokenManager,
    state: State,
    value: String,
    candidates: Vec<Candidate>,
    highlighted: Option<usize>,
    generation: Generation,
    retired_through: Generation,
    in_flight: Option<InFlight>,
}

impl ResolutionController {
    pub fn new(config: ResolverConfig) -> Self {
        Self::with_sessions(config, SessionTokenManager::new())
    }

    pub fn with_sessions(config: ResolverConfig, sessions: SessionTokenManager) -> Self {
        Self {
            config,
            sessions,
            state: State::Idle,
            value: String::new(),
            candidates: Vec::new(),
            highlighted: None,
            generation: 0,
            retired_through: 0,
            in_flight: None,
        }
    }

    pub const fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub const fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    /// Latest dispatched generation (0 before the first lookup).
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    pub fn session_token(&self) -> &SessionToken {
        self.sessions.current()
    }

    /// The panel is showing while there is something to pick from.
    pub fn is_open(&self) -> bool {
        !self.candidates.is_empty()
    }

    pub const fn debounce_deadline(&self) -> Option<Instant> {
        match self.state {
            State::Debouncing { deadline } => Some(deadline),
            _ => None,
        }
    }

    /// Local edit: store the text and (re)start the debounce timer.
    pub fn keystroke(&mut self, text: impl Into<String>, now: Instant) {
        self.value = text.into();
        self.state = State::Debouncing {
            deadline: now + self.config.debounce(),
        };
    }

    /// Fire the debounce timer if it is due.
    ///
    /// Returns the lookup to dispatch, if the current text is worth one.
    pub fn fire_debounce(&mut self, now: Instant) -> Option<LookupRequest> {
        let State::Debouncing { deadline } = self.state else {
            return None;
        };
        if now < deadline {
            return None;
        }

        let query = self.value.trim().to_string();
        if query.chars().count() < self.config.min_query_chars {
            debug!("query {query:?} below minimum length; clearing candidates");
            self.retire_in_flight();
            self.clear_candidates();
            self.state = State::Idle;
            return None;
        }

        self.generation += 1;
        let generation = self.generation;
        self.state = State::Loading { generation };

        let request = if PostcodeShapeClassifier::is_postcode(&query) {
            LookupRequest {
                generation,
                kind: LookupKind::Postcode {
                    postcode: PostcodeShapeClassifier::normalize(&query),
                },
            }
        } else {
            self.place_request(generation, &query)
        };
        debug!(
            "dispatching generation {generation} ({:?}) for {query:?}",
            request.stage()
        );
        self.in_flight = Some(InFlight {
            generation,
            stage: request.stage(),
            query,
        });
        Some(request)
    }

    fn place_request(&self, generation: Generation, query: &str) -> LookupRequest {
        LookupRequest {
            generation,
            kind: LookupKind::Place {
                text: query.to_string(),
                session: self.sessions.current().clone(),
            },
        }
    }

    /// Reconcile a completed lookup with the current state.
    pub fn apply_response(&mut self, response: LookupResponse) -> ResponseOutcome {
        let LookupResponse {
            generation,
            stage,
            candidates,
        } = response;

        let current = match &self.in_flight {
            Some(in_flight)
                if in_flight.generation == generation
                    && in_flight.stage == stage
                    && generation == self.generation
                    && generation > self.retired_through =>
            {
                in_flight.clone()
            }
            _ => {
                debug!(
                    "discarding stale {stage:?} response for generation {generation} (latest {})",
                    self.generation
                );
                return ResponseOutcome::Discarded;
            }
        };

        let loading = matches!(self.state, State::Loading { generation: g } if g == generation);

        if stage == LookupStage::Postcode && candidates.is_empty() {
            if !loading {
                // Typing resumed; the next dispatch supersedes the fallback.
                self.in_flight = None;
                return ResponseOutcome::Discarded;
            }
            debug!(
                "no postcode match for {:?}; falling back to place search",
                current.query
            );
            let follow_up = self.place_request(generation, &current.query);
            self.in_flight = Some(InFlight {
                stage: LookupStage::Place,
                ..current
            });
            return ResponseOutcome::FollowUp(follow_up);
        }

        self.in_flight = None;
        let has_results = !candidates.is_empty();
        self.candidates = candidates;
        self.highlighted = None;
        if loading {
            self.state = if has_results {
                State::ShowingResults
            } else {
                State::ShowingNone
            };
        }
        ResponseOutcome::Applied
    }

    /// Commit the candidate at `index`; returns the committed value.
    pub fn select(&mut self, index: usize) -> Result<String> {
        let candidate = self
            .candidates
            .get(index)
            .ok_or(ResolverError::NoSuchCandidate {
                index,
                len: self.candidates.len(),
            })?;
        let committed = candidate.description().to_string();
        self.value.clone_from(&committed);
        self.retire_in_flight();
        self.clear_candidates();
        self.state = State::Idle;
        self.sessions.rotate();
        Ok(committed)
    }

    pub fn select_highlighted(&mut self) -> Result<String> {
        let index = self.highlighted.ok_or(ResolverError::NothingHighlighted)?;
        self.select(index)
    }

    /// Close the panel without touching the value or the session.
    pub fn dismiss(&mut self, reason: DismissReason) {
        if self.state != State::Idle || self.is_open() {
            debug!("dismissed ({reason:?})");
        }
        self.dismiss_quietly();
    }

    /// Replace the value from outside (form reset / prefill) without a lookup.
    pub fn set_external_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.dismiss_quietly();
    }

    fn dismiss_quietly(&mut self) {
        self.retire_in_flight();
        self.clear_candidates();
        self.state = State::Idle;
    }

    pub fn highlight_next(&mut self) -> Option<usize> {
        let len = self.candidates.len();
        if len == 0 {
            return None;
        }
        let next = self.highlighted.map_or(0, |idx| (idx + 1) % len);
        self.highlighted = Some(next);
        self.highlighted
    }

    pub fn highlight_previous(&mut self) -> Option<usize> {
        let len = self.candidates.len();
        if len == 0 {
            return None;
        }
        let previous = self
            .highlighted
            .map_or(len - 1, |idx| (idx + len - 1) % len);
        self.highlighted = Some(previous);
        self.highlighted
    }

    fn retire_in_flight(&mut self) {
        self.retired_through = self.generation;
        self.in_flight = None;
    }

    fn clear_candidates(&mut self) {
        self.candidates.clear();
        self.highlighted = None;
    }
}
