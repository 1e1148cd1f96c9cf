use crate::websocket::{serve_channel, WarpWebSocketChannel};
use exchange_hooks::context::RequestContext;
use exchange_hooks::listener::{ConnectionCallback, ReceiveListener};
use exchange_hooks::pool::{ByteBufferPool, DEFAULT_BUFFER_SIZE, DEFAULT_MAX_POOLED};
use exchange_hooks::session::{SessionConfig, SessionCookieConfig};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use uuid::Uuid;
use warp::http::header::{HeaderValue, COOKIE, SET_COOKIE};
use warp::http::HeaderMap;
use warp::path::FullPath;
use warp::reply::{Reply, Response};
use warp::ws::Ws;
use warp::{Filter, Rejection};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct WarpAdapterOptions {
    /// Size of each pooled receive buffer.
    pub buffer_size: usize,
    pub max_pooled_buffers: usize,
    pub max_message_size: Option<usize>,
}

impl Default for WarpAdapterOptions {
    fn default() -> Self {
        WarpAdapterOptions {
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_pooled_buffers: DEFAULT_MAX_POOLED,
            max_message_size: Some(1024 * 1024 * 16),
        }
    }
}

/// Accepts websocket upgrades and hands every resulting channel to `listener`.
///
/// Mount it under a path of your choosing:
///
/// ```no_run
/// # use exchange_hooks::listener::{ListenerConfig, WebSocketChannelListener};
/// # use exchange_hooks_warp::adapter_warp::{websocket, WarpAdapterOptions};
/// # use exchange_hooks_warp::websocket::WarpWebSocketChannel;
/// # use std::sync::Arc;
/// # use warp::Filter;
/// let listener = Arc::new(WebSocketChannelListener::<WarpWebSocketChannel>::new(
///     ListenerConfig::new(),
/// ));
/// let routes = warp::path("ws").and(websocket(listener, WarpAdapterOptions::default()));
/// ```
pub fn websocket<L>(
    listener: Arc<L>,
    options: WarpAdapterOptions,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone
where
    L: ConnectionCallback<WarpWebSocketChannel> + ReceiveListener<WarpWebSocketChannel>,
{
    let pool = ByteBufferPool::new(options.buffer_size, options.max_pooled_buffers);
    let max_message_size = options.max_message_size;
    warp::ws()
        .and(build_context())
        .and(with_shared(listener))
        .and(with_shared(pool))
        .map(
            move |ws: Ws, context: RequestContext, listener: Arc<L>, pool: Arc<ByteBufferPool>| {
                let ws = match max_message_size {
                    Some(size) => ws.max_message_size(size),
                    None => ws,
                };
                ws.on_upgrade(move |socket| serve_channel(socket, context, listener, pool))
            },
        )
}

/// Extracts the request context and the session id, assigning a new id
/// through `config` when the request carries none.
pub fn session(
    config: Arc<SessionCookieConfig>,
) -> impl Filter<Extract = (RequestContext, String), Error = Rejection> + Clone {
    build_context()
        .and(with_shared(config))
        .map(
            |mut context: RequestContext, config: Arc<SessionCookieConfig>| {
                let session_id = match config.find_session_id(&context) {
                    Some(session_id) => session_id,
                    None => {
                        let session_id = generate_session_id();
                        config.set_session_id(&mut context, &session_id);
                        session_id
                    }
                };
                (context, session_id)
            },
        )
        .untuple_one()
}

/// Writes the cookies collected on `context` as `Set-Cookie` headers.
pub fn with_response_cookies(reply: impl Reply, context: &mut RequestContext) -> Response {
    let mut response = reply.into_response();
    for cookie in context.take_response_cookies() {
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(_) => warn!("Dropping cookie {} with an invalid header value", cookie.name()),
        }
    }
    response
}

/// Generate a new session id.
/// Uses a v4 UUID in its simple form (32 hex digits).
pub fn generate_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn build_context() -> impl Filter<Extract = (RequestContext,), Error = Rejection> + Clone {
    warp::header::headers_cloned()
        .and(warp::path::full())
        .and(warp::query::<HashMap<String, String>>())
        .and(warp::addr::remote())
        .map(
            |headers: HeaderMap,
             path: FullPath,
             query: HashMap<String, String>,
             address: Option<SocketAddr>| {
                let mut context = headers
                    .get_all(COOKIE)
                    .iter()
                    .filter_map(|value| value.to_str().ok())
                    .fold(RequestContext::new(path.as_str()), |context, header| {
                        context.with_cookie_header(header)
                    });
                context.secure = headers
                    .get("x-forwarded-proto")
                    .and_then(|value| value.to_str().ok())
                    .map_or(false, |proto| proto.eq_ignore_ascii_case("https"));
                context.query = query;
                context.remote_address = address.map(|address| address.to_string());
                context.headers = headers_into_map(&headers);
                context
            },
        )
}

fn headers_into_map(headers: &HeaderMap) -> HashMap<String, String> {
    let mut map: HashMap<String, String> = HashMap::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            map.entry(name.as_str().to_owned())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_owned());
        }
    }
    map
}

fn with_shared<T>(
    value: Arc<T>,
) -> impl Filter<Extract = (Arc<T>,), Error = Infallible> + Clone
where
    T: ?Sized + Send + Sync + 'static,
{
    warp::any().map(move || value.clone())
}
