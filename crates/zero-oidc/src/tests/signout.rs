//! Sign-out flow tests.

use super::helpers::*;
use crate::*;
use std::sync::Arc;

async fn sign_out(
    handler: &OidcHandler,
    properties: Option<&AuthenticationProperties>,
) -> (HttpExchange, Result<()>) {
    let mut exchange = HttpExchange::new(page_request("/logout"));
    let result = handler.sign_out(&mut exchange, properties).await;
    (exchange, result)
}

fn logout_message(exchange: &HttpExchange) -> ProtocolMessage {
    let location = exchange.response.location.as_deref().unwrap();
    let query = location.split_once('?').map(|(_, q)| q).unwrap_or_default();
    ProtocolMessage::from_query(query)
}

#[tokio::test]
async fn test_sign_out_uses_configured_post_logout_uri() {
    let handler = create_test_handler(
        create_test_options().post_logout_redirect_uri("https://app.example.com/signed-out"),
    );

    let (exchange, result) = sign_out(&handler, None).await;
    result.unwrap();

    let location = exchange.response.location.as_deref().unwrap();
    assert!(location.starts_with(END_SESSION_ENDPOINT));
    assert_eq!(
        logout_message(&exchange).post_logout_redirect_uri(),
        Some("https://app.example.com/signed-out")
    );
}

#[tokio::test]
async fn test_sign_out_properties_override() {
    let handler = create_test_handler(
        create_test_options().post_logout_redirect_uri("https://app.example.com/signed-out"),
    );
    let properties = AuthenticationProperties::with_redirect_uri("https://app.example.com/bye");

    let (exchange, result) = sign_out(&handler, Some(&properties)).await;
    result.unwrap();

    assert_eq!(
        logout_message(&exchange).post_logout_redirect_uri(),
        Some("https://app.example.com/bye")
    );
}

#[tokio::test]
async fn test_sign_out_without_post_logout_uri() {
    let handler = create_test_handler(create_test_options());

    let (exchange, result) = sign_out(&handler, None).await;
    result.unwrap();

    assert_eq!(exchange.response.location.as_deref(), Some(END_SESSION_ENDPOINT));
}

#[tokio::test]
async fn test_sign_out_without_configuration() {
    let handler = create_test_handler(
        create_test_options().configuration_manager(Arc::new(UnavailableConfigurationManager)),
    );

    let (exchange, result) = sign_out(&handler, None).await;
    result.unwrap();
    assert_eq!(exchange.response.location.as_deref(), Some(""));

    let strict = create_test_handler(
        create_test_options()
            .configuration_manager(Arc::new(UnavailableConfigurationManager))
            .reject_malformed_redirects(true),
    );
    let (exchange, result) = sign_out(&strict, None).await;
    assert!(matches!(result, Err(OidcError::MalformedRedirectUrl(_))));
    assert!(exchange.response.location.is_none());
}

#[tokio::test]
async fn test_sign_out_redirect_hook() {
    let log = new_event_log();
    let mut notifications = RecordingNotifications::new(log.clone());
    notifications.redirect = HookOutcome::Handled(());
    let handler = create_test_handler(create_test_options().notifications(Arc::new(notifications)));

    let (exchange, result) = sign_out(&handler, None).await;
    result.unwrap();

    assert!(exchange.response.location.is_none());
    assert_eq!(events(&log), vec!["redirect:Logout"]);
}
