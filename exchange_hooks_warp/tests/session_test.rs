use exchange_hooks::context::RequestContext;
use exchange_hooks::cookie::SameSiteMode;
use exchange_hooks::session::SessionCookieConfig;
use exchange_hooks_warp::{session, with_response_cookies};
use std::sync::Arc;
use warp::http::header::SET_COOKIE;
use warp::Filter;

fn routes(
    config: SessionCookieConfig,
) -> impl Filter<Extract = (warp::reply::Response,), Error = warp::Rejection> + Clone {
    session(Arc::new(config)).map(|mut context: RequestContext, session_id: String| {
        with_response_cookies(session_id, &mut context)
    })
}

#[tokio::test]
async fn new_session_gets_a_same_site_cookie() {
    let mut config = SessionCookieConfig::new();
    config
        .set_same_site_mode(Some(SameSiteMode::Lax))
        .set_max_age(3600);

    let response = warp::test::request().path("/").reply(&routes(config)).await;

    let session_id = std::str::from_utf8(response.body()).unwrap().to_owned();
    let set_cookie: Vec<&str> = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap())
        .collect();
    assert_eq!(set_cookie.len(), 1);
    assert!(set_cookie[0].starts_with(&format!("JSESSIONID={}; Path=/; Max-Age=3600", session_id)));
    assert!(set_cookie[0].contains("; HttpOnly; SameSite=Lax"));
}

#[tokio::test]
async fn known_session_is_left_alone() {
    let response = warp::test::request()
        .path("/")
        .header("cookie", "JSESSIONID=existing")
        .reply(&routes(SessionCookieConfig::new()))
        .await;

    assert_eq!(response.body().as_ref(), b"existing");
    assert!(response.headers().get(SET_COOKIE).is_none());
}

#[tokio::test]
async fn cookie_without_same_site_mode() {
    let response = warp::test::request()
        .path("/")
        .reply(&routes(SessionCookieConfig::new()))
        .await;

    let set_cookie = response.headers()[SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.ends_with("; Path=/; HttpOnly"));
    assert!(!set_cookie.contains("SameSite"));
    assert!(!set_cookie.contains("Max-Age"));
}
