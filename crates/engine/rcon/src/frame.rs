//! Wire framing.
//!
//! Each message is a length-prefixed frame: a little-endian 32-bit body
//! length, a 32-bit request id (echoed in the response for correlation), a
//! 32-bit message-type code, the UTF-8 payload, and two trailing NUL bytes.

use crate::error::{RconError, RconResult};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest payload the target accepts on a single outbound frame.
pub const MAX_OUTBOUND_PAYLOAD: usize = 1446;
/// Largest frame body we accept from the peer.
pub const MAX_INBOUND_BODY: usize = 4110;

/// Id + type + two trailing NULs.
const BODY_OVERHEAD: usize = 10;

/// One wire frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub id: i32,
    pub kind: i32,
    pub payload: String,
}

impl Frame {
    /// Authentication request carrying the shared secret.
    pub const LOGIN: i32 = 3;
    /// Command request (also echoed by servers as the auth response type).
    pub const COMMAND: i32 = 2;
    /// Command response.
    pub const RESPONSE: i32 = 0;

    pub fn login(id: i32, secret: &str) -> Self {
        Self {
            id,
            kind: Self::LOGIN,
            payload: secret.to_string(),
        }
    }

    pub fn command(id: i32, text: &str) -> Self {
        Self {
            id,
            kind: Self::COMMAND,
            payload: text.to_string(),
        }
    }

    /// Serializes the frame, length prefix included.
    pub fn encode(&self) -> Vec<u8> {
        let body_len = self.payload.len() + BODY_OVERHEAD;
        let mut buf = Vec::with_capacity(4 + body_len);
        buf.extend_from_slice(&(body_len as i32).to_le_bytes());
        buf.extend_from_slice(&self.id.to_le_bytes());
        buf.extend_from_slice(&self.kind.to_le_bytes());
        buf.extend_from_slice(self.payload.as_bytes());
        buf.extend_from_slice(&[0, 0]);
        buf
    }

    /// Parses a frame body (the bytes after the length prefix).
    pub fn decode(body: &[u8]) -> RconResult<Self> {
        if body.len() < BODY_OVERHEAD {
            return Err(RconError::Protocol(format!(
                "frame body too short: {} bytes",
                body.len()
            )));
        }
        let id = i32::from_le_bytes([body[0], body[1], body[2], body[3]]);
        let kind = i32::from_le_bytes([body[4], body[5], body[6], body[7]]);
        let payload = std::str::from_utf8(&body[8..body.len() - 2])
            .map_err(|e| RconError::Protocol(format!("payload is not UTF-8: {e}")))?
            .to_string();
        Ok(Self { id, kind, payload })
    }

    /// Writes the frame to the stream. Oversize payloads are rejected before
    /// any bytes hit the wire.
    pub async fn write_to<W: AsyncWrite + Unpin>(&self, writer: &mut W) -> RconResult<()> {
        if self.payload.len() > MAX_OUTBOUND_PAYLOAD {
            return Err(RconError::Protocol(format!(
                "payload of {} bytes exceeds the {MAX_OUTBOUND_PAYLOAD}-byte frame limit",
                self.payload.len()
            )));
        }
        writer.write_all(&self.encode()).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Reads one frame from the stream.
    pub async fn read_from<R: AsyncRead + Unpin>(reader: &mut R) -> RconResult<Self> {
        let mut len_bytes = [0u8; 4];
        reader.read_exact(&mut len_bytes).await?;
        let body_len = i32::from_le_bytes(len_bytes);
        if body_len < BODY_OVERHEAD as i32 || body_len > MAX_INBOUND_BODY as i32 {
            return Err(RconError::Protocol(format!(
                "invalid frame body length {body_len}"
            )));
        }
        let mut body = vec![0u8; body_len as usize];
        reader.read_exact(&mut body).await?;
        Self::decode(&body)
    }
}
