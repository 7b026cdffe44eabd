use crate::controller::{
    DismissReason, Generation, LookupKind, LookupRequest, LookupResponse, Phase,
    ResolutionController, ResponseOutcome,
};
use crate::registry::{PanelId, PanelRegistration, PanelRegistry};
use crate::sync::SelectionSync;
use crate::viewport::{
    AnchorRect, LayoutEvent, ViewportPositioner, ViewportRect, ViewportTracker, WindowSize,
};
use crate::{ResolverConfig, ResolverError, Result};
use address_gateway::LookupGateway;
use address_protocol::Candidate;
use log::debug;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time;

/// Host callback receiving the literal field contents after every keystroke
/// and the committed value after every selection.
pub type OnChange = Arc<dyn Fn(&str) + Send + Sync>;

/// What the host renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolverSnapshot {
    pub phase: Phase,
    pub value: String,
    pub candidates: Vec<Candidate>,
    pub highlighted: Option<usize>,
    pub viewport: Option<ViewportRect>,
    pub generation: Generation,
}

impl ResolverSnapshot {
    fn initial() -> Self {
        Self {
            phase: Phase::Idle,
            value: String::new(),
            candidates: Vec::new(),
            highlighted: None,
            viewport: None,
            generation: 0,
        }
    }
}

#[derive(Default)]
pub struct ResolverOptions {
    pub on_change: Option<OnChange>,
    /// Defaults to [`PanelRegistry::global`].
    pub registry: Option<Arc<PanelRegistry>>,
}

#[derive(Debug, Clone, Copy)]
enum HighlightMove {
    Next,
    Previous,
}

enum ResolverCommand {
    Keystroke(String),
    Select {
        index: Option<usize>,
        reply: oneshot::Sender<Result<String>>,
    },
    Highlight(HighlightMove),
    Dismiss(DismissReason),
    Blur {
        focus_in_panel: bool,
    },
    PointerDown {
        x: f64,
        y: f64,
    },
    ExternalValue(String),
    Layout {
        event: LayoutEvent,
        anchor: AnchorRect,
        window: WindowSize,
    },
    Shutdown,
}

/// Handle to one running resolution loop.
///
/// Cloning is cheap; the loop shuts down when the last handle is dropped or
/// [`shutdown`](Self::shutdown) is called, taking its timers with it.
#[derive(Clone)]
pub struct AddressResolver {
    inner: Arc<AddressResolverInner>,
}

struct AddressResolverInner {
    command_tx: mpsc::Sender<ResolverCommand>,
    snapshot_rx: watch::Receiver<ResolverSnapshot>,
    panel_id: PanelId,
}

impl AddressResolver {
    pub fn start(gateway: LookupGateway, config: ResolverConfig) -> Result<Self> {
        Self::start_with(gateway, config, ResolverOptions::default())
    }

    pub fn start_with(
        gateway: LookupGateway,
        config: ResolverConfig,
        options: ResolverOptions,
    ) -> Result<Self> {
        config.validate().map_err(ResolverError::InvalidConfig)?;

        let (command_tx, command_rx) = mpsc::channel(64);
        let (snapshot_tx, snapshot_rx) = watch::channel(ResolverSnapshot::initial());
        let registry = options.registry.unwrap_or_else(PanelRegistry::global);
        let registration = registry.register();
        let panel_id = registration.id();

        let state = LoopState {
            controller: ResolutionController::new(config.clone()),
            sync: SelectionSync::new(config.typing_quiet_period()),
            tracker: ViewportTracker::new(ViewportPositioner::new(config.panel.clone())),
            layout: None,
            registration,
            on_change: options.on_change,
            snapshot_tx,
        };
        spawn_resolution_loop(Arc::new(gateway), state, command_rx);

        Ok(Self {
            inner: Arc::new(AddressResolverInner {
                command_tx,
                snapshot_rx,
                panel_id,
            }),
        })
    }

    async fn send(&self, command: ResolverCommand) -> Result<()> {
        self.inner
            .command_tx
            .send(command)
            .await
            .map_err(|_| ResolverError::Closed)
    }

    async fn select_with(&self, index: Option<usize>) -> Result<String> {
        let (reply, rx) = oneshot::channel();
        self.send(ResolverCommand::Select { index, reply }).await?;
        rx.await.map_err(|_| ResolverError::Closed)?
    }

    /// Local edit; `text` is the full field contents after the edit.
    pub async fn keystroke(&self, text: impl Into<String>) -> Result<()> {
        self.send(ResolverCommand::Keystroke(text.into())).await
    }

    pub async fn select(&self, index: usize) -> Result<String> {
        self.select_with(Some(index)).await
    }

    pub async fn select_highlighted(&self) -> Result<String> {
        self.select_with(None).await
    }

    pub async fn highlight_next(&self) -> Result<()> {
        self.send(ResolverCommand::Highlight(HighlightMove::Next))
            .await
    }

    pub async fn highlight_previous(&self) -> Result<()> {
        self.send(ResolverCommand::Highlight(HighlightMove::Previous))
            .await
    }

    pub async fn dismiss(&self, reason: DismissReason) -> Result<()> {
        self.send(ResolverCommand::Dismiss(reason)).await
    }

    /// Field lost focus. Focus moving into the panel (a candidate being
    /// clicked) keeps it open.
    pub async fn blur(&self, focus_in_panel: bool) -> Result<()> {
        self.send(ResolverCommand::Blur { focus_in_panel }).await
    }

    /// Pointer press anywhere in the window.
    pub async fn pointer_down(&self, x: f64, y: f64) -> Result<()> {
        self.send(ResolverCommand::PointerDown { x, y }).await
    }

    /// Value pushed by the owning form (reset, prefill, re-render).
    pub async fn push_external_value(&self, value: impl Into<String>) -> Result<()> {
        self.send(ResolverCommand::ExternalValue(value.into()))
            .await
    }

    /// Current anchor and window geometry (mount, or any re-measure).
    /// Treated as a resize while the panel is showing.
    pub async fn set_layout(&self, anchor: AnchorRect, window: WindowSize) -> Result<()> {
        self.send(ResolverCommand::Layout {
            event: LayoutEvent::Resize,
            anchor,
            window,
        })
        .await
    }

    pub async fn layout_event(
        &self,
        event: LayoutEvent,
        anchor: AnchorRect,
        window: WindowSize,
    ) -> Result<()> {
        self.send(ResolverCommand::Layout {
            event,
            anchor,
            window,
        })
        .await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(ResolverCommand::Shutdown).await
    }

    #[must_use]
    pub fn snapshot(&self) -> ResolverSnapshot {
        self.inner.snapshot_rx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ResolverSnapshot> {
        self.inner.snapshot_rx.clone()
    }

    #[must_use]
    pub fn panel_id(&self) -> PanelId {
        self.inner.panel_id
    }
}

impl Drop for AddressResolver {
    fn drop(&mut self) {
        if Arc::strong_count(&self.inner) == 1 {
            let _ = self.inner.command_tx.try_send(ResolverCommand::Shutdown);
        }
    }
}

struct LoopState {
    controller: ResolutionController,
    sync: SelectionSync,
    tracker: ViewportTracker,
    layout: Option<(AnchorRect, WindowSize)>,
    registration: PanelRegistration,
    on_change: Option<OnChange>,
    snapshot_tx: watch::Sender<ResolverSnapshot>,
}

impl LoopState {
    fn notify(&self, value: &str) {
        if let Some(on_change) = &self.on_change {
            on_change(value);
        }
    }

    /// Attach/detach layout tracking to match panel visibility, then publish.
    fn publish(&mut self) {
        let open = self.controller.is_open();
        if open && !self.tracker.is_attached() {
            match self.layout {
                Some((anchor, window)) => {
                    self.tracker.show(&anchor, &window);
                }
                None => debug!("panel opened before any layout was reported"),
            }
        } else if !open && self.tracker.is_attached() {
            self.tracker.hide();
        }
        self.registration.set_panel(self.tracker.rect());

        let snapshot = ResolverSnapshot {
            phase: self.controller.phase(),
            value: self.controller.value().to_string(),
            candidates: self.controller.candidates().to_vec(),
            highlighted: self.controller.highlighted(),
            viewport: self.tracker.rect(),
            generation: self.controller.generation(),
        };
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
    }

    fn dismiss(&mut self, reason: DismissReason) {
        self.controller.dismiss(reason);
    }

    fn handle_layout(&mut self, event: LayoutEvent, anchor: AnchorRect, window: WindowSize) {
        self.layout = Some((anchor, window));
        self.registration
            .set_anchor((!anchor.is_empty()).then_some(anchor));
        if self.tracker.is_attached() {
            self.tracker.on_layout(event, &anchor, &window);
        } else if self.controller.is_open() {
            self.tracker.show(&anchor, &window);
        }
    }
}

fn spawn_lookup(
    gateway: Arc<LookupGateway>,
    request: LookupRequest,
    done_tx: mpsc::Sender<LookupResponse>,
) {
    tokio::spawn(async move {
        let stage = request.stage();
        let candidates = match &request.kind {
            LookupKind::Postcode { postcode } => gateway.lookup_by_postcode(postcode).await,
            LookupKind::Place { text, session } => {
                gateway.lookup_by_place_text(text, session).await
            }
        };
        let _ = done_tx
            .send(LookupResponse {
                generation: request.generation,
                stage,
                candidates,
            })
            .await;
    });
}

fn spawn_resolution_loop(
    gateway: Arc<LookupGateway>,
    mut state: LoopState,
    mut command_rx: mpsc::Receiver<ResolverCommand>,
) {
    let (done_tx, mut done_rx) = mpsc::channel::<LookupResponse>(16);

    tokio::spawn(async move {
        loop {
            let next_deadline = state.controller.debounce_deadline();

            tokio::select! {
                cmd = command_rx.recv() => {
                    let Some(cmd) = cmd else { break };
                    let now = time::Instant::now().into_std();
                    match cmd {
                        ResolverCommand::Keystroke(text) => {
                            state.sync.note_local_edit(now);
                            state.notify(&text);
                            state.controller.keystroke(text, now);
                        }
                        ResolverCommand::Select { index, reply } => {
                            let result = match index {
                                Some(index) => state.controller.select(index),
                                None => state.controller.select_highlighted(),
                            };
                            if let Ok(value) = &result {
                                state.sync.reset();
                                state.notify(value);
                            }
                            let _ = reply.send(result);
                        }
                        ResolverCommand::Highlight(HighlightMove::Next) => {
                            state.controller.highlight_next();
                        }
                        ResolverCommand::Highlight(HighlightMove::Previous) => {
                            state.controller.highlight_previous();
                        }
                        ResolverCommand::Dismiss(reason) => state.dismiss(reason),
                        ResolverCommand::Blur { focus_in_panel } => {
                            if !focus_in_panel {
                                state.dismiss(DismissReason::Blur);
                            }
                        }
                        ResolverCommand::PointerDown { x, y } => {
                            let id = state.registration.id();
                            if state.registration.registry().outside(x, y).contains(&id) {
                                state.dismiss(DismissReason::OutsideClick);
                            }
                        }
                        ResolverCommand::ExternalValue(incoming) => {
                            if let Some(value) = state.sync.reconcile_external(
                                &incoming,
                                state.controller.value(),
                                now,
                            ) {
                                state.controller.set_external_value(value);
                            }
                        }
                        ResolverCommand::Layout { event, anchor, window } => {
                            state.handle_layout(event, anchor, window);
                        }
                        ResolverCommand::Shutdown => break,
                    }
                    state.publish();
                }
                Some(response) = done_rx.recv() => {
                    if let ResponseOutcome::FollowUp(request) = state.controller.apply_response(response) {
                        spawn_lookup(gateway.clone(), request, done_tx.clone());
                    }
                    state.publish();
                }
                () = async {
                    if let Some(deadline) = next_deadline {
                        time::sleep_until(time::Instant::from_std(deadline)).await;
                    }
                }, if next_deadline.is_some() => {
                    let now = time::Instant::now().into_std();
                    if let Some(request) = state.controller.fire_debounce(now) {
                        spawn_lookup(gateway.clone(), request, done_tx.clone());
                    }
                    state.publish();
                }
            }
        }
        debug!("resolution loop for panel {} stopped", state.registration.id());
    });
}
