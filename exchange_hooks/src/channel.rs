use crate::error::ChannelError;
use crate::pool::{merge_buffers, Pooled, PooledBuffer};
use bytes::Bytes;
use std::fmt;

/// A handle to an open websocket. Cheap to clone; all clones talk to the same peer.
pub trait WebSocketChannel: 'static + Clone + Send + Sync + fmt::Debug {
    fn id(&self) -> &str;
    fn send_text(&self, text: String) -> Result<(), ChannelError>;
    fn send_binary(&self, data: Bytes) -> Result<(), ChannelError>;
    fn send_close(&self, message: &CloseMessage) -> Result<(), ChannelError>;
    /// Drops the connection without a close handshake.
    fn close(&self);
    fn is_open(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq)]
pub struct BufferedTextMessage {
    data: String,
}

impl BufferedTextMessage {
    pub fn new(data: impl Into<String>) -> Self {
        BufferedTextMessage { data: data.into() }
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn into_data(self) -> String {
        self.data
    }
}

/// A full binary message still held in pooled receive buffers.
pub struct BufferedBinaryMessage {
    data: Pooled<Vec<PooledBuffer>>,
}

impl BufferedBinaryMessage {
    pub fn new(data: Pooled<Vec<PooledBuffer>>) -> Self {
        BufferedBinaryMessage { data }
    }

    pub fn data(&self) -> &Pooled<Vec<PooledBuffer>> {
        &self.data
    }

    pub fn into_data(self) -> Pooled<Vec<PooledBuffer>> {
        self.data
    }

    /// Copies the payload out, then hands the pooled buffers back.
    pub fn into_bytes(self) -> Bytes {
        let pooled = self.data;
        let data = merge_buffers(pooled.resource());
        pooled.free();
        data
    }
}

impl fmt::Debug for BufferedBinaryMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferedBinaryMessage")
            .field("buffers", &self.data.resource().len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CloseMessage {
    code: u16,
    reason: String,
}

impl CloseMessage {
    pub const NORMAL_CLOSURE: u16 = 1000;
    pub const GOING_AWAY: u16 = 1001;
    pub const PROTOCOL_ERROR: u16 = 1002;
    pub const UNSUPPORTED_DATA: u16 = 1003;
    pub const NO_STATUS_RECEIVED: u16 = 1005;
    pub const ABNORMAL_CLOSURE: u16 = 1006;
    pub const INVALID_PAYLOAD: u16 = 1007;
    pub const POLICY_VIOLATION: u16 = 1008;
    pub const MESSAGE_TOO_BIG: u16 = 1009;
    pub const MISSING_EXTENSIONS: u16 = 1010;
    pub const UNEXPECTED_ERROR: u16 = 1011;

    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        CloseMessage {
            code,
            reason: reason.into(),
        }
    }

    /// Parses a close frame payload: a big-endian code followed by a UTF-8 reason.
    /// A payload without a code reads as `GOING_AWAY`.
    pub fn from_payload(payload: &[u8]) -> Self {
        if payload.len() < 2 {
            return CloseMessage::new(Self::GOING_AWAY, "");
        }
        let code = u16::from_be_bytes([payload[0], payload[1]]);
        let reason = String::from_utf8_lossy(&payload[2..]).into_owned();
        CloseMessage { code, reason }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn to_payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(2 + self.reason.len());
        payload.extend_from_slice(&self.code.to_be_bytes());
        payload.extend_from_slice(self.reason.as_bytes());
        payload
    }

    /// Codes a peer may legitimately put on the wire.
    pub fn is_valid(code: u16) -> bool {
        match code {
            1000..=1003 | 1007..=1011 => true,
            3000..=4999 => true,
            _ => false,
        }
    }
}

impl fmt::Display for CloseMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reason.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{} ({})", self.code, self.reason)
        }
    }
}
