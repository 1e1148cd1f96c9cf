use exchange_hooks::channel::WebSocketChannel;
use exchange_hooks::context::RequestContext;
use exchange_hooks::listener::{ChannelEvent, ListenerConfig, WebSocketChannelListener};
use exchange_hooks::session::{SessionConfig, SessionCookieConfig};
use exchange_hooks_warp::{session, websocket, with_response_cookies, WarpAdapterOptions};
use exchange_hooks_warp::WarpWebSocketChannel;
use log::{info, warn};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::Filter;

#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct DemoConfig {
    address: SocketAddr,
    session: SessionCookieConfig,
    websocket: WarpAdapterOptions,
}

impl Default for DemoConfig {
    fn default() -> Self {
        DemoConfig {
            address: SocketAddr::from(([127, 0, 0, 1], 3000)),
            session: SessionCookieConfig::default(),
            websocket: WarpAdapterOptions::default(),
        }
    }
}

fn load_config() -> Result<DemoConfig, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => Ok(serde_json::from_reader(std::fs::File::open(path)?)?),
        None => Ok(DemoConfig::default()),
    }
}

fn echo_listener() -> WebSocketChannelListener<WarpWebSocketChannel> {
    WebSocketChannelListener::new(
        ListenerConfig::<WarpWebSocketChannel>::new()
            .on_connect(|event| {
                if let ChannelEvent::Connect { exchange, channel } = event {
                    info!("channel {} connected on {}", channel.id(), exchange);
                }
                Ok(())
            })
            .on_message(|event| match event {
                ChannelEvent::Text { channel, text } => Ok(channel.send_text(text)?),
                ChannelEvent::Binary { channel, data } => Ok(channel.send_binary(data)?),
                _ => Ok(()),
            })
            .on_close(|event| {
                if let ChannelEvent::Close {
                    channel,
                    code,
                    reason,
                } = event
                {
                    info!("channel {} closed with {} {:?}", channel.id(), code, reason);
                }
                Ok(())
            })
            .on_error(|event| {
                if let ChannelEvent::Error { channel, error } = event {
                    warn!("channel {} failed: {}", channel.id(), error);
                    channel.close();
                }
                Ok(())
            }),
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = load_config()?;
    let session_config = Arc::new(config.session);

    let hello = warp::path::end().and(session(session_config.clone())).map(
        |mut context: RequestContext, session_id: String| {
            let body = format!("hello, your session is {}", session_id);
            with_response_cookies(body, &mut context)
        },
    );

    let logout_config = session_config.clone();
    let logout = warp::path("logout").and(session(session_config)).map(
        move |mut context: RequestContext, session_id: String| {
            logout_config.clear_session(&mut context, &session_id);
            with_response_cookies("bye", &mut context)
        },
    );

    let ws = warp::path("ws").and(websocket(Arc::new(echo_listener()), config.websocket));

    let routes = ws.or(logout).or(hello);

    info!("listening on {}", config.address);
    tokio::select! {
        _ = warp::serve(routes).run(config.address) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down!");
        }
    }

    Ok(())
}
