use address_gateway::LookupGateway;
use address_protocol::Candidate;
use address_resolver::{
    LookupKind, LookupRequest, LookupResponse, Phase, ResolutionController, ResolverConfig,
    ResponseOutcome,
};
use log::debug;
use std::time::Instant;

/// One-shot resolution: same classification, fallback and limits as the
/// interactive field, minus the debounce wait.
pub async fn resolve_once(
    gateway: &LookupGateway,
    config: &ResolverConfig,
    text: &str,
) -> (Phase, Vec<Candidate>) {
    let mut controller = ResolutionController::new(config.clone());
    let now = Instant::now();
    controller.keystroke(text, now);

    let mut next = controller.fire_debounce(now + config.debounce());
    while let Some(request) = next.take() {
        let response = perform(gateway, request).await;
        match controller.apply_response(response) {
            ResponseOutcome::FollowUp(follow_up) => next = Some(follow_up),
            ResponseOutcome::Applied => {}
            ResponseOutcome::Discarded => debug!("one-shot response discarded"),
        }
    }

    (controller.phase(), controller.candidates().to_vec())
}

async fn perform(gateway: &LookupGateway, request: LookupRequest) -> LookupResponse {
    let stage = request.stage();
    let candidates = match &request.kind {
        LookupKind::Postcode { postcode } => gateway.lookup_by_postcode(postcode).await,
        LookupKind::Place { text, session } => gateway.lookup_by_place_text(text, session).await,
    };
    LookupResponse {
        generation: request.generation,
        stage,
        candidates,
    }
}
