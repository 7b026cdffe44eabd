use crate::viewport::{AnchorRect, ViewportRect};
use log::debug;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub type PanelId = u64;

static GLOBAL_REGISTRY: Lazy<Arc<PanelRegistry>> = Lazy::new(|| Arc::new(PanelRegistry::new()));

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct PanelRegion {
    anchor: Option<AnchorRect>,
    panel: Option<ViewportRect>,
}

impl PanelRegion {
    fn is_open(&self) -> bool {
        self.panel.is_some()
    }

    fn contains(&self, x: f64, y: f64) -> bool {
        self.panel.is_some_and(|rect| rect.contains(x, y))
            || self.anchor.is_some_and(|rect| rect.contains(x, y))
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    next_id: PanelId,
    panels: BTreeMap<PanelId, PanelRegion>,
}

/// Answers "was this pointer press inside any open result panel".
///
/// Every resolver instance registers once and keeps its regions current; the
/// registration deregisters itself when dropped.
#[derive(Debug, Default)]
pub struct PanelRegistry {
    state: Mutex<RegistryState>,
}

impl PanelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry shared by every instance that doesn't bring its own.
    pub fn global() -> Arc<Self> {
        GLOBAL_REGISTRY.clone()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(self: &Arc<Self>) -> PanelRegistration {
        let id = {
            let mut state = self.lock();
            state.next_id += 1;
            let id = state.next_id;
            state.panels.insert(id, PanelRegion::default());
            id
        };
        debug!("registered panel {id}");
        PanelRegistration {
            id,
            registry: Arc::clone(self),
        }
    }

    fn update(&self, id: PanelId, apply: impl FnOnce(&mut PanelRegion)) {
        if let Some(region) = self.lock().panels.get_mut(&id) {
            apply(region);
        }
    }

    fn deregister(&self, id: PanelId) {
        self.lock().panels.remove(&id);
        debug!("deregistered panel {id}");
    }

    pub fn len(&self) -> usize {
        self.lock().panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_open(&self, id: PanelId) -> bool {
        self.lock().panels.get(&id).is_some_and(PanelRegion::is_open)
    }

    /// Open panels the point falls outside of; these should be dismissed.
    /// A press on a panel's own anchor field counts as inside.
    pub fn outside(&self, x: f64, y: f64) -> Vec<PanelId> {
        self.lock()
            .panels
            .iter()
            .filter(|(_, region)| region.is_open() && !region.contains(x, y))
            .map(|(id, _)| *id)
            .collect()
    }
}

/// One instance's slot in a [`PanelRegistry`].
#[derive(Debug)]
pub struct PanelRegistration {
    id: PanelId,
    registry: Arc<PanelRegistry>,
}

impl PanelRegistration {
    pub const fn id(&self) -> PanelId {
        self.id
    }

    pub fn set_anchor(&self, anchor: Option<AnchorRect>) {
        self.registry.update(self.id, |region| region.anchor = anchor);
    }

    pub fn set_panel(&self, panel: Option<ViewportRect>) {
        self.registry.update(self.id, |region| region.panel = panel);
    }

    pub fn registry(&self) -> &Arc<PanelRegistry> {
        &self.registry
    }
}

impl Drop for PanelRegistration {
    fn drop(&mut self) {
        self.registry.deregister(self.id);
    }
}
