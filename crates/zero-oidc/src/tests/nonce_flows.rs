//! Nonce strategies exercised through the full challenge/callback round trip.

use super::helpers::*;
use crate::*;
use std::sync::Arc;

fn cache_backed(cache: Arc<InMemoryNonceCache>) -> OidcHandler {
    create_test_handler(
        create_test_options()
            .response_type("id_token")
            .nonce_cache(cache),
    )
}

async fn login_params(handler: &OidcHandler) -> (HttpExchange, String, String) {
    let (challenge, request) = run_challenge(handler, Challenge::default()).await;
    let id_token = mint_id_token(&id_token_claims(request.nonce(), None));
    (challenge, request.state().unwrap().to_string(), id_token)
}

#[tokio::test]
async fn test_cache_nonce_accepted_once() {
    let cache = Arc::new(InMemoryNonceCache::new());
    let handler = cache_backed(cache.clone());

    let (challenge, state, id_token) = login_params(&handler).await;
    assert_eq!(cache.len(), 1);
    assert!(challenge.response.cookies.is_empty());

    let params = [("state", state.as_str()), ("id_token", id_token.as_str())];

    let mut first = HttpExchange::new(callback_request(&params, None));
    let result = handler.authenticate(&mut first).await.unwrap();
    assert!(result.as_ticket().is_some());
    assert!(cache.is_empty());

    let mut replay = HttpExchange::new(callback_request(&params, None));
    let result = handler.authenticate(&mut replay).await;
    assert!(matches!(result, Err(OidcError::ProtocolViolation(_))));
}

#[tokio::test]
async fn test_cache_nonce_concurrent_callbacks() {
    let handler = cache_backed(Arc::new(InMemoryNonceCache::new()));

    let (_, state, id_token) = login_params(&handler).await;
    let params = [("state", state.as_str()), ("id_token", id_token.as_str())];

    let mut a = HttpExchange::new(callback_request(&params, None));
    let mut b = HttpExchange::new(callback_request(&params, None));
    let (ra, rb) = tokio::join!(handler.authenticate(&mut a), handler.authenticate(&mut b));

    let tickets = [ra, rb]
        .into_iter()
        .filter(|r| matches!(r, Ok(AuthenticationResult::Ticket(_))))
        .count();
    assert_eq!(tickets, 1);
}

#[tokio::test]
async fn test_cookie_nonce_accepted_once() {
    let handler = create_test_handler(create_test_options().response_type("id_token"));

    let (challenge, state, id_token) = login_params(&handler).await;
    let params = [("state", state.as_str()), ("id_token", id_token.as_str())];

    let mut first = HttpExchange::new(callback_request(&params, Some(&challenge.response)));
    let result = handler.authenticate(&mut first).await.unwrap();
    assert!(result.as_ticket().is_some());

    // Browser honours the removal cookie
    let mut replay = HttpExchange::new(callback_request(&params, Some(&first.response)));
    let result = handler.authenticate(&mut replay).await;
    assert!(matches!(result, Err(OidcError::ProtocolViolation(_))));
}

#[tokio::test]
async fn test_cookie_nonce_from_other_browser_rejected() {
    let handler = create_test_handler(create_test_options().response_type("id_token"));

    let (_, state, id_token) = login_params(&handler).await;
    let (other_browser, _, _) = login_params(&handler).await;
    let params = [("state", state.as_str()), ("id_token", id_token.as_str())];

    let mut exchange = HttpExchange::new(callback_request(&params, Some(&other_browser.response)));
    let result = handler.authenticate(&mut exchange).await;
    assert!(matches!(result, Err(OidcError::ProtocolViolation(_))));
}

#[tokio::test]
async fn test_nonce_not_required_tolerates_unknown_nonce() {
    let handler = create_test_handler(
        create_test_options()
            .response_type("id_token")
            .protocol_validator(Arc::new(DefaultProtocolValidator {
                require_nonce: false,
                ..Default::default()
            })),
    );

    let (_, request) = run_challenge(&handler, Challenge::default()).await;
    let id_token = mint_id_token(&id_token_claims(Some("someone-elses-nonce"), None));
    let params = [
        ("state", request.state().unwrap()),
        ("id_token", id_token.as_str()),
    ];

    let mut exchange = HttpExchange::new(callback_request(&params, None));
    let result = handler.authenticate(&mut exchange).await.unwrap();
    assert!(result.as_ticket().is_some());
}
