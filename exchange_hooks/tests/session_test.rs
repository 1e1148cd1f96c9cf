use exchange_hooks::*;

fn exchange() -> RequestContext {
    RequestContext::new("/login")
}

#[test]
fn same_site_mode_is_written_when_configured() {
    let mut config = SessionCookieConfig::new();
    config.set_same_site_mode(Some(SameSiteMode::Strict));
    let mut exchange = exchange();

    config.set_session_id(&mut exchange, "abc123");

    let cookies = exchange.response_cookies();
    assert_eq!(cookies.len(), 1);
    assert_eq!(cookies[0].name(), "JSESSIONID");
    assert_eq!(cookies[0].value(), "abc123");
    assert_eq!(cookies[0].same_site_mode(), Some(SameSiteMode::Strict));
    assert!(cookies[0].to_string().contains("; SameSite=Strict"));
}

#[test]
fn same_site_mode_is_omitted_when_absent() {
    let config = SessionCookieConfig::new();
    let mut exchange = exchange();

    config.set_session_id(&mut exchange, "abc123");

    let cookie = &exchange.response_cookies()[0];
    assert_eq!(cookie.same_site_mode(), None);
    assert!(!cookie.to_string().contains("SameSite"));
}

#[test]
fn positive_max_age_is_written() {
    let mut config = SessionCookieConfig::new();
    config.set_max_age(1800);
    let mut exchange = exchange();

    config.set_session_id(&mut exchange, "id");

    assert_eq!(exchange.response_cookies()[0].max_age(), Some(1800));
}

#[test]
fn zero_or_negative_max_age_is_omitted() {
    for max_age in &[0, -1, -3600] {
        let mut config = SessionCookieConfig::new();
        config.set_max_age(*max_age);
        let mut exchange = exchange();

        config.set_session_id(&mut exchange, "id");

        let cookie = &exchange.response_cookies()[0];
        assert_eq!(cookie.max_age(), None);
        assert!(!cookie.to_string().contains("Max-Age"));
    }
}

#[test]
fn configured_attributes_are_copied() {
    let mut config = SessionCookieConfig::new();
    config
        .set_cookie_name("sid")
        .set_path("/app")
        .set_domain(Some("example.com".to_owned()))
        .set_secure(true)
        .set_http_only(false)
        .set_discard(true)
        .set_comment(Some("session id".to_owned()))
        .set_same_site_mode_str("lax")
        .unwrap();
    let mut exchange = exchange();

    config.set_session_id(&mut exchange, "xyz");

    let cookie = &exchange.response_cookies()[0];
    assert_eq!(cookie.name(), "sid");
    assert_eq!(cookie.path(), Some("/app"));
    assert_eq!(cookie.domain(), Some("example.com"));
    assert!(cookie.is_secure());
    assert!(!cookie.is_http_only());
    assert!(cookie.is_discard());
    assert_eq!(cookie.comment(), Some("session id"));
    assert_eq!(
        cookie.to_string(),
        "sid=xyz; Path=/app; Domain=example.com; Secure; SameSite=Lax; \
         Comment=\"session id\"; Discard"
    );
}

#[test]
fn setting_twice_keeps_one_cookie() {
    let config = SessionCookieConfig::new();
    let mut exchange = exchange();

    config.set_session_id(&mut exchange, "first");
    config.set_session_id(&mut exchange, "second");

    let cookies = exchange.response_cookies();
    assert_eq!(cookies.len(), 1);
    assert_eq!(cookies[0].value(), "second");
}

#[test]
fn finds_session_id_in_request_cookies() {
    let config = SessionCookieConfig::new();
    let with_cookie = exchange().with_cookie_header("theme=dark; JSESSIONID=abc");
    let without_cookie = exchange().with_cookie_header("theme=dark");

    assert_eq!(config.find_session_id(&with_cookie), Some("abc".to_owned()));
    assert_eq!(
        config.session_cookie_source(&with_cookie),
        SessionCookieSource::Cookie
    );
    assert_eq!(config.find_session_id(&without_cookie), None);
    assert_eq!(
        config.session_cookie_source(&without_cookie),
        SessionCookieSource::None
    );
}

#[test]
fn clear_session_expires_the_cookie() {
    let mut config = SessionCookieConfig::new();
    config
        .set_same_site_mode(Some(SameSiteMode::Lax))
        .set_max_age(600);
    let mut exchange = exchange();

    config.set_session_id(&mut exchange, "abc");
    config.clear_session(&mut exchange, "abc");

    let cookies = exchange.response_cookies();
    assert_eq!(cookies.len(), 1);
    assert_eq!(cookies[0].max_age(), Some(0));
    assert_eq!(
        cookies[0].to_string(),
        "JSESSIONID=abc; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly"
    );
}

#[test]
fn config_deserializes_from_json() {
    let config: SessionCookieConfig = serde_json::from_str(
        r#"{"cookie-name": "sid", "same-site-mode": "none", "secure": true, "max-age": 60}"#,
    )
    .unwrap();

    assert_eq!(config.cookie_name(), "sid");
    assert_eq!(config.same_site_mode(), Some(SameSiteMode::None));
    assert!(config.is_secure());
    assert_eq!(config.max_age(), 60);
    assert_eq!(config.path(), "/");
    assert!(config.is_http_only());

    let rejected = serde_json::from_str::<SessionCookieConfig>(r#"{"same-site-mode": "sometimes"}"#);
    assert!(rejected.is_err());
}

#[test]
fn config_same_site_mode_ignores_case() {
    let config: SessionCookieConfig =
        serde_json::from_str(r#"{"same-site-mode": "sTrIcT"}"#).unwrap();

    assert_eq!(config.same_site_mode(), Some(SameSiteMode::Strict));
    assert_eq!(
        SameSiteMode::parse("sTrIcT"),
        config.same_site_mode()
    );
}
