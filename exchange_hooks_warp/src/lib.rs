#![forbid(unsafe_code)]
extern crate exchange_hooks;
extern crate serde;
extern crate warp;

pub mod adapter_warp;
pub mod websocket;

pub use adapter_warp::{
    build_context, session, websocket, with_response_cookies, WarpAdapterOptions,
};
pub use websocket::WarpWebSocketChannel;
