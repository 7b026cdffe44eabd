use address_gateway::{LookupGateway, PlaceProvider, PostcodeProvider, Result as ProviderResult};
use address_protocol::{
    PlacePrediction, PlacePredictionsResponse, PostcodeAddress, PostcodeLookupResponse,
    SessionToken,
};
use address_resolver::{
    AnchorRect, CandidateSource, DismissReason, LayoutEvent, Phase, PanelRegistry,
    AddressResolver, ResolverConfig, ResolverError, ResolverOptions, ResolverSnapshot,
    WindowSize,
};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep, timeout};

#[derive(Default)]
struct FakePostcodes {
    known: HashMap<String, Vec<PostcodeAddress>>,
    calls: Mutex<Vec<String>>,
}

impl FakePostcodes {
    fn with(postcode: &str, lines: &[&str]) -> Self {
        let addresses = lines
            .iter()
            .map(|line| PostcodeAddress {
                line_1: (*line).to_string(),
                line_2: None,
                town_or_city: Some("Peterlee".to_string()),
                county: None,
                postcode: postcode.to_string(),
                full_address: None,
            })
            .collect();
        let mut known = HashMap::new();
        known.insert(postcode.to_string(), addresses);
        Self {
            known,
            calls: Mutex::default(),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PostcodeProvider for FakePostcodes {
    async fn addresses(&self, postcode: &str) -> ProviderResult<PostcodeLookupResponse> {
        self.calls.lock().unwrap().push(postcode.to_string());
        Ok(PostcodeLookupResponse {
            postcode: postcode.to_string(),
            addresses: self.known.get(postcode).cloned().unwrap_or_default(),
        })
    }
}

/// Answers every input with "<input> Road" and "<input> Street".
#[derive(Default)]
struct FakePlaces {
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<(String, SessionToken)>>,
}

impl FakePlaces {
    fn delayed(input: &str, delay: Duration) -> Self {
        let mut delays = HashMap::new();
        delays.insert(input.to_string(), delay);
        Self {
            delays,
            calls: Mutex::default(),
        }
    }

    fn calls(&self) -> Vec<(String, SessionToken)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlaceProvider for FakePlaces {
    async fn predictions(
        &self,
        input: &str,
        session: &SessionToken,
    ) -> ProviderResult<PlacePredictionsResponse> {
        self.calls
            .lock()
            .unwrap()
            .push((input.to_string(), session.clone()));
        if let Some(delay) = self.delays.get(input) {
            sleep(*delay).await;
        }
        let predictions = ["Road", "Street"]
            .iter()
            .map(|suffix| PlacePrediction {
                description: format!("{input} {suffix}"),
                main_text: None,
                secondary_text: None,
            })
            .collect();
        Ok(PlacePredictionsResponse {
            predictions,
            error: None,
        })
    }
}

struct Harness {
    resolver: AddressResolver,
    updates: watch::Receiver<ResolverSnapshot>,
    postcodes: Arc<FakePostcodes>,
    places: Arc<FakePlaces>,
    registry: Arc<PanelRegistry>,
    changes: Arc<Mutex<Vec<String>>>,
}

impl Harness {
    fn start(postcodes: FakePostcodes, places: FakePlaces) -> Self {
        Self::start_in(postcodes, places, Arc::new(PanelRegistry::new()))
    }

    fn start_in(
        postcodes: FakePostcodes,
        places: FakePlaces,
        registry: Arc<PanelRegistry>,
    ) -> Self {
        let postcodes = Arc::new(postcodes);
        let places = Arc::new(places);
        let gateway = LookupGateway::new(postcodes.clone(), places.clone());
        let changes = Arc::new(Mutex::new(Vec::new()));
        let sink = changes.clone();
        let options = ResolverOptions {
            on_change: Some(Arc::new(move |value: &str| {
                sink.lock().unwrap().push(value.to_string());
            })),
            registry: Some(registry.clone()),
        };
        let resolver = AddressResolver::start_with(gateway, ResolverConfig::default(), options)
            .expect("start resolver");
        let updates = resolver.subscribe();
        Self {
            resolver,
            updates,
            postcodes,
            places,
            registry,
            changes,
        }
    }

    async fn wait_for(&mut self, what: impl Fn(&ResolverSnapshot) -> bool) -> ResolverSnapshot {
        timeout(Duration::from_secs(10), self.updates.wait_for(|s| what(s)))
            .await
            .expect("timed out waiting for resolver state")
            .expect("resolver loop stopped")
            .clone()
    }

    async fn wait_for_results(&mut self, first: &str) -> ResolverSnapshot {
        self.wait_for(|s| {
            s.candidates
                .first()
                .is_some_and(|candidate| candidate.description() == first)
        })
        .await
    }

    fn changes(&self) -> Vec<String> {
        self.changes.lock().unwrap().clone()
    }
}

fn descriptions(snapshot: &ResolverSnapshot) -> Vec<&str> {
    snapshot
        .candidates
        .iter()
        .map(|candidate| candidate.description())
        .collect()
}

/// Let the loop drain its queue and any timers up to `ms` ahead.
async fn settle(ms: u64) {
    sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn keystroke_burst_dispatches_one_lookup() {
    let mut h = Harness::start(FakePostcodes::default(), FakePlaces::default());

    for text in ["Du", "Dur", "Durh", "Durham"] {
        h.resolver.keystroke(text).await.unwrap();
        settle(100).await;
    }
    let snapshot = h.wait_for_results("Durham Road").await;

    assert_eq!(snapshot.phase, Phase::ShowingResults);
    let inputs: Vec<String> = h.places.calls().into_iter().map(|(text, _)| text).collect();
    assert_eq!(inputs, vec!["Durham".to_string()]);
    assert!(h.postcodes.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn short_input_never_reaches_a_provider() {
    let mut h = Harness::start(FakePostcodes::default(), FakePlaces::default());

    h.resolver.keystroke("D").await.unwrap();
    settle(1_000).await;
    h.resolver.keystroke("  a ").await.unwrap();
    settle(1_000).await;

    let snapshot = h.wait_for(|s| s.phase == Phase::Idle).await;
    assert!(snapshot.candidates.is_empty());
    assert_eq!(snapshot.generation, 0);
    assert!(h.places.calls().is_empty());
    assert!(h.postcodes.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn shrinking_below_minimum_clears_results() {
    let mut h = Harness::start(FakePostcodes::default(), FakePlaces::default());

    h.resolver.keystroke("Leeds").await.unwrap();
    h.wait_for_results("Leeds Road").await;

    h.resolver.keystroke("L").await.unwrap();
    let snapshot = h.wait_for(|s| s.phase == Phase::Idle).await;
    assert!(snapshot.candidates.is_empty());
    assert_eq!(h.places.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn postcode_hits_are_exclusive() {
    let mut h = Harness::start(
        FakePostcodes::with("SR85AB", &["1 Acre Rigg Road", "2 Acre Rigg Road"]),
        FakePlaces::default(),
    );

    h.resolver.keystroke("sr8 5ab").await.unwrap();
    let snapshot = h
        .wait_for_results("1 Acre Rigg Road, Peterlee, SR85AB")
        .await;

    assert_eq!(
        descriptions(&snapshot),
        vec![
            "1 Acre Rigg Road, Peterlee, SR85AB",
            "2 Acre Rigg Road, Peterlee, SR85AB"
        ]
    );
    assert!(snapshot
        .candidates
        .iter()
        .all(|candidate| candidate.source() == CandidateSource::Postcode && candidate.is_postcode()));
    assert_eq!(h.postcodes.calls(), vec!["SR85AB".to_string()]);
    assert!(h.places.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn unknown_postcode_falls_back_to_place_search() {
    let mut h = Harness::start(FakePostcodes::default(), FakePlaces::default());

    h.resolver.keystroke("DH1 1AA").await.unwrap();
    let snapshot = h.wait_for_results("DH1 1AA Road").await;

    assert_eq!(snapshot.phase, Phase::ShowingResults);
    assert!(snapshot
        .candidates
        .iter()
        .all(|candidate| candidate.source() == CandidateSource::Place));
    assert_eq!(h.postcodes.calls(), vec!["DH11AA".to_string()]);
    let inputs: Vec<String> = h.places.calls().into_iter().map(|(text, _)| text).collect();
    assert_eq!(inputs, vec!["DH1 1AA".to_string()]);
    // Both stages belong to the same dispatch.
    assert_eq!(snapshot.generation, 1);
}

#[tokio::test(start_paused = true)]
async fn stale_response_never_overwrites_newer_results() {
    let mut h = Harness::start(
        FakePostcodes::default(),
        FakePlaces::delayed("Durham", Duration::from_secs(2)),
    );

    h.resolver.keystroke("Durham").await.unwrap();
    settle(400).await;
    h.resolver.keystroke("Durham Station").await.unwrap();
    let snapshot = h.wait_for_results("Durham Station Road").await;
    assert_eq!(snapshot.generation, 2);

    // The slow first lookup lands after the second one.
    settle(3_000).await;
    let snapshot = h.resolver.snapshot();
    assert_eq!(
        descriptions(&snapshot),
        vec!["Durham Station Road", "Durham Station Street"]
    );
    assert_eq!(snapshot.phase, Phase::ShowingResults);
    assert_eq!(h.places.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn late_response_after_dismiss_stays_hidden() {
    let mut h = Harness::start(
        FakePostcodes::default(),
        FakePlaces::delayed("Newcastle", Duration::from_secs(1)),
    );

    h.resolver.keystroke("Newcastle").await.unwrap();
    h.wait_for(|s| s.phase == Phase::Loading).await;
    h.resolver.dismiss(DismissReason::Escape).await.unwrap();
    settle(2_000).await;

    let snapshot = h.resolver.snapshot();
    assert_eq!(snapshot.phase, Phase::Idle);
    assert!(snapshot.candidates.is_empty());
    assert_eq!(snapshot.value, "Newcastle");
}

#[tokio::test(start_paused = true)]
async fn selection_commits_value_and_rotates_session() {
    let mut h = Harness::start(FakePostcodes::default(), FakePlaces::default());

    h.resolver.keystroke("Durham").await.unwrap();
    h.wait_for_results("Durham Road").await;
    h.resolver.keystroke("Durham St").await.unwrap();
    h.wait_for_results("Durham St Road").await;

    let committed = h.resolver.select(1).await.unwrap();
    assert_eq!(committed, "Durham St Street");
    let snapshot = h.wait_for(|s| s.phase == Phase::Idle).await;
    assert_eq!(snapshot.value, "Durham St Street");
    assert!(snapshot.candidates.is_empty());

    h.resolver.keystroke("York").await.unwrap();
    h.wait_for_results("York Road").await;

    let calls = h.places.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].1, calls[1].1);
    assert_ne!(calls[1].1, calls[2].1);
}

#[tokio::test(start_paused = true)]
async fn on_change_sees_keystrokes_then_selection() {
    let mut h = Harness::start(FakePostcodes::default(), FakePlaces::default());

    h.resolver.keystroke("Yo").await.unwrap();
    h.resolver.keystroke("Yor").await.unwrap();
    h.wait_for_results("Yor Road").await;
    h.resolver.select(0).await.unwrap();

    assert_eq!(
        h.changes(),
        vec!["Yo".to_string(), "Yor".to_string(), "Yor Road".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn selecting_a_missing_candidate_is_an_error() {
    let h = Harness::start(FakePostcodes::default(), FakePlaces::default());

    let err = h.resolver.select(3).await.unwrap_err();
    assert_eq!(err, ResolverError::NoSuchCandidate { index: 3, len: 0 });
    let err = h.resolver.select_highlighted().await.unwrap_err();
    assert_eq!(err, ResolverError::NothingHighlighted);
    assert!(h.changes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn keyboard_highlight_selects_the_highlighted_row() {
    let mut h = Harness::start(FakePostcodes::default(), FakePlaces::default());

    h.resolver.keystroke("Bath").await.unwrap();
    h.wait_for_results("Bath Road").await;

    h.resolver.highlight_next().await.unwrap();
    h.resolver.highlight_next().await.unwrap();
    let snapshot = h.wait_for(|s| s.highlighted == Some(1)).await;
    assert_eq!(snapshot.phase, Phase::ShowingResults);

    h.resolver.highlight_next().await.unwrap();
    h.wait_for(|s| s.highlighted == Some(0)).await;
    h.resolver.highlight_previous().await.unwrap();
    h.wait_for(|s| s.highlighted == Some(1)).await;

    assert_eq!(h.resolver.select_highlighted().await.unwrap(), "Bath Street");
}

#[tokio::test(start_paused = true)]
async fn external_push_is_ignored_while_typing() {
    let mut h = Harness::start(FakePostcodes::default(), FakePlaces::default());

    h.resolver.keystroke("Durham").await.unwrap();
    settle(100).await;
    h.resolver.push_external_value("").await.unwrap();
    let snapshot = h.wait_for_results("Durham Road").await;
    assert_eq!(snapshot.value, "Durham");

    settle(600).await;
    h.resolver.push_external_value("").await.unwrap();
    let snapshot = h.wait_for(|s| s.value.is_empty()).await;
    assert_eq!(snapshot.phase, Phase::Idle);
    assert!(snapshot.candidates.is_empty());
    assert_eq!(h.places.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn panel_follows_the_anchor_while_open() {
    let mut h = Harness::start(FakePostcodes::default(), FakePlaces::default());
    let window = WindowSize {
        width: 1024.0,
        height: 768.0,
    };

    h.resolver
        .set_layout(AnchorRect::new(20.0, 20.0, 300.0, 30.0), window)
        .await
        .unwrap();
    h.resolver.keystroke("Leeds").await.unwrap();
    let snapshot = h.wait_for_results("Leeds Road").await;

    let rect = snapshot.viewport.expect("panel placed");
    assert_eq!((rect.left, rect.top, rect.width), (20.0, 54.0, 380.0));
    assert!(h.registry.is_open(h.resolver.panel_id()));

    h.resolver
        .layout_event(
            LayoutEvent::Scroll,
            AnchorRect::new(20.0, -80.0, 300.0, 30.0),
            window,
        )
        .await
        .unwrap();
    let snapshot = h
        .wait_for(|s| s.viewport.is_some_and(|rect| rect.top == -46.0))
        .await;
    assert_eq!(snapshot.phase, Phase::ShowingResults);
}

#[tokio::test(start_paused = true)]
async fn outside_press_dismisses_inside_press_does_not() {
    let mut h = Harness::start(FakePostcodes::default(), FakePlaces::default());
    h.resolver
        .set_layout(
            AnchorRect::new(20.0, 20.0, 300.0, 30.0),
            WindowSize {
                width: 1024.0,
                height: 768.0,
            },
        )
        .await
        .unwrap();
    h.resolver.keystroke("Leeds").await.unwrap();
    h.wait_for_results("Leeds Road").await;

    // Inside the panel, then inside the field itself.
    h.resolver.pointer_down(100.0, 100.0).await.unwrap();
    h.resolver.pointer_down(30.0, 30.0).await.unwrap();
    settle(10).await;
    assert_eq!(h.resolver.snapshot().phase, Phase::ShowingResults);

    h.resolver.pointer_down(900.0, 700.0).await.unwrap();
    let snapshot = h.wait_for(|s| s.phase == Phase::Idle).await;
    assert!(snapshot.viewport.is_none());
    assert_eq!(snapshot.value, "Leeds");
    assert!(!h.registry.is_open(h.resolver.panel_id()));
}

#[tokio::test(start_paused = true)]
async fn shared_registry_dismisses_only_the_panel_that_was_missed() {
    let registry = Arc::new(PanelRegistry::new());
    let window = WindowSize {
        width: 1024.0,
        height: 768.0,
    };
    let mut top = Harness::start_in(
        FakePostcodes::default(),
        FakePlaces::default(),
        registry.clone(),
    );
    let mut bottom = Harness::start_in(
        FakePostcodes::default(),
        FakePlaces::default(),
        registry.clone(),
    );
    assert_eq!(registry.len(), 2);

    top.resolver
        .set_layout(AnchorRect::new(20.0, 20.0, 300.0, 30.0), window)
        .await
        .unwrap();
    bottom
        .resolver
        .set_layout(AnchorRect::new(20.0, 500.0, 300.0, 30.0), window)
        .await
        .unwrap();
    top.resolver.keystroke("Leeds").await.unwrap();
    bottom.resolver.keystroke("York").await.unwrap();
    top.wait_for_results("Leeds Road").await;
    bottom.wait_for_results("York Road").await;
    assert_eq!(registry.outside(100.0, 100.0), vec![bottom.resolver.panel_id()]);

    // The host forwards one press to every instance.
    top.resolver.pointer_down(100.0, 100.0).await.unwrap();
    bottom.resolver.pointer_down(100.0, 100.0).await.unwrap();
    bottom.wait_for(|s| s.phase == Phase::Idle).await;
    settle(10).await;

    assert_eq!(top.resolver.snapshot().phase, Phase::ShowingResults);
    assert!(registry.is_open(top.resolver.panel_id()));
    assert!(!registry.is_open(bottom.resolver.panel_id()));
}

#[tokio::test(start_paused = true)]
async fn blur_into_the_panel_keeps_it_open() {
    let mut h = Harness::start(FakePostcodes::default(), FakePlaces::default());

    h.resolver.keystroke("Hull").await.unwrap();
    h.wait_for_results("Hull Road").await;

    h.resolver.blur(true).await.unwrap();
    settle(10).await;
    assert_eq!(h.resolver.snapshot().phase, Phase::ShowingResults);

    h.resolver.blur(false).await.unwrap();
    let snapshot = h.wait_for(|s| s.phase == Phase::Idle).await;
    assert!(snapshot.candidates.is_empty());
}

#[tokio::test(start_paused = true)]
async fn shutdown_deregisters_and_closes_the_handle() {
    let h = Harness::start(FakePostcodes::default(), FakePlaces::default());
    assert_eq!(h.registry.len(), 1);

    h.resolver.shutdown().await.unwrap();
    settle(10).await;

    assert!(h.registry.is_empty());
    assert_eq!(
        h.resolver.keystroke("late").await,
        Err(ResolverError::Closed)
    );
}

#[tokio::test]
async fn invalid_config_is_rejected_at_start() {
    let gateway = LookupGateway::new(
        Arc::new(FakePostcodes::default()),
        Arc::new(FakePlaces::default()),
    );
    let config = ResolverConfig {
        min_query_chars: 0,
        ..ResolverConfig::default()
    };

    let err = AddressResolver::start(gateway, config).err();
    assert!(matches!(err, Some(ResolverError::InvalidConfig(_))));
}
