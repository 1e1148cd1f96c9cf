use bytes::Bytes;
use exchange_hooks::channel::{
    BufferedBinaryMessage, BufferedTextMessage, CloseMessage, WebSocketChannel,
};
use exchange_hooks::context::RequestContext;
use exchange_hooks::error::{CallbackResult, ChannelError};
use exchange_hooks::listener::{ConnectionCallback, ReceiveListener};
use exchange_hooks::pool::ByteBufferPool;
use futures::future::{AbortHandle, Abortable};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use log::{debug, trace, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use uuid::Uuid;
use warp::ws::{Message, WebSocket};

/// Handle to one upgraded warp websocket. Writes go through a queue that a
/// background task drains into the socket.
#[derive(Debug, Clone)]
pub struct WarpWebSocketChannel {
    id: Arc<str>,
    remote_address: Option<Arc<str>>,
    outbound: mpsc::UnboundedSender<Message>,
    open: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
}

impl WarpWebSocketChannel {
    fn new(
        remote_address: Option<String>,
        outbound: mpsc::UnboundedSender<Message>,
        shutdown: Arc<Notify>,
    ) -> Self {
        WarpWebSocketChannel {
            id: Uuid::new_v4().to_string().into(),
            remote_address: remote_address.map(Into::into),
            outbound,
            open: Arc::new(AtomicBool::new(true)),
            shutdown,
        }
    }

    pub fn remote_address(&self) -> Option<&str> {
        self.remote_address.as_deref()
    }

    fn enqueue(&self, message: Message) -> Result<(), ChannelError> {
        if !self.is_open() {
            return Err(ChannelError::Closed);
        }
        self.outbound
            .send(message)
            .map_err(|_| ChannelError::Closed)
    }

    fn mark_closed(&self) {
        self.open.store(false, Ordering::SeqCst);
    }
}

impl WebSocketChannel for WarpWebSocketChannel {
    fn id(&self) -> &str {
        &self.id
    }

    fn send_text(&self, text: String) -> Result<(), ChannelError> {
        self.enqueue(Message::text(text))
    }

    fn send_binary(&self, data: Bytes) -> Result<(), ChannelError> {
        self.enqueue(Message::binary(data.to_vec()))
    }

    fn send_close(&self, message: &CloseMessage) -> Result<(), ChannelError> {
        self.enqueue(Message::close_with(
            message.code(),
            message.reason().to_owned(),
        ))?;
        // Nothing may follow a close frame.
        self.mark_closed();
        Ok(())
    }

    fn close(&self) {
        self.mark_closed();
        self.shutdown.notify_one();
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

/// Drives one upgraded socket: announces it to `listener`, then feeds it every
/// full message until the peer goes away or the channel is closed locally.
pub(crate) async fn serve_channel<L>(
    socket: WebSocket,
    context: RequestContext,
    listener: Arc<L>,
    pool: Arc<ByteBufferPool>,
) where
    L: ConnectionCallback<WarpWebSocketChannel> + ReceiveListener<WarpWebSocketChannel>,
{
    let (websocket_sender, mut websocket_receiver) = socket.split();
    let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel();
    let shutdown = Arc::new(Notify::new());
    let channel = WarpWebSocketChannel::new(
        context.remote_address.clone(),
        outbound_sender,
        shutdown.clone(),
    );

    let (abort_handle, abort_registration) = AbortHandle::new_pair();
    tokio::spawn(Abortable::new(
        forward_outbound(outbound_receiver, websocket_sender, channel.id().to_owned()),
        abort_registration,
    ));

    debug!("Websocket channel {} opened on {}", channel.id(), context);
    log_failure(&channel, listener.on_connect(Arc::new(context), channel.clone()));

    loop {
        let next = tokio::select! {
            next = websocket_receiver.next() => next,
            _ = shutdown.notified() => break,
        };
        match next {
            Some(Ok(message)) => {
                log_failure(&channel, dispatch_message(&*listener, &channel, &pool, message));
            }
            Some(Err(err)) => {
                let error = ChannelError::Transport(err.to_string());
                log_failure(&channel, listener.on_error(&channel, error));
                break;
            }
            None => break,
        }
    }

    channel.mark_closed();
    abort_handle.abort();
    debug!("Websocket channel {} closed", channel.id());
}

fn dispatch_message<L>(
    listener: &L,
    channel: &WarpWebSocketChannel,
    pool: &Arc<ByteBufferPool>,
    message: Message,
) -> CallbackResult
where
    L: ReceiveListener<WarpWebSocketChannel>,
{
    if message.is_close() {
        let close = match message.close_frame() {
            Some((code, reason)) => CloseMessage::new(code, reason),
            None => CloseMessage::from_payload(&[]),
        };
        trace!("Close {} received on channel {}", close, channel.id());
        listener.on_close_message(close, channel)
    } else if message.is_binary() {
        let buffers = pool.fill(message.as_bytes());
        listener.on_full_binary_message(channel, BufferedBinaryMessage::new(buffers))
    } else if let Ok(text) = message.to_str() {
        listener.on_full_text_message(channel, BufferedTextMessage::new(text))
    } else {
        // Ping and pong frames are answered by the protocol layer.
        Ok(())
    }
}

fn log_failure(channel: &WarpWebSocketChannel, result: CallbackResult) {
    if let Err(err) = result {
        warn!("Websocket callback failed on channel {}: {}", channel.id(), err);
    }
}

async fn forward_outbound(
    mut outbound_receiver: mpsc::UnboundedReceiver<Message>,
    mut websocket_sender: SplitSink<WebSocket, Message>,
    channel_id: String,
) {
    while let Some(message) = outbound_receiver.recv().await {
        let is_close = message.is_close();
        if let Err(err) = websocket_sender.send(message).await {
            debug!("Failed to write to websocket channel {}: {}", channel_id, err);
            break;
        }
        if is_close {
            break;
        }
    }
}
