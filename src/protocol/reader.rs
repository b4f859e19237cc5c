use crate::error::Error;
use crate::protocol::request::SYNC;
use crate::protocol::response::{
    send_message_payload_len, Response, ResponseKind, SEND_MESSAGE_FLAGS_OFFSET,
};
use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Incremental frame decoder over a growing byte buffer.
///
/// The background loop owns its byte stream permanently, so it can afford
/// to buffer ahead; tokens must use [`read_response`] instead, which never
/// consumes bytes beyond a single frame.
#[derive(Debug, Default)]
pub struct FrameReader {
    buffer: BytesMut,
}

impl FrameReader {
    pub fn new() -> FrameReader {
        FrameReader {
            buffer: BytesMut::new(),
        }
    }

    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Tries to decode one frame matching `candidates`.
    ///
    /// Returns `Ok(None)` when more bytes are needed. Bytes that cannot
    /// start a candidate frame are discarded, which is the only tolerated
    /// re-synchronisation; a mismatched byte that is itself a sync byte is
    /// retried as a frame start.
    pub fn try_decode(
        &mut self,
        candidates: &[ResponseKind],
    ) -> Result<Option<Response>, Error> {
        loop {
            while !self.buffer.is_empty() && self.buffer[0] != SYNC {
                self.buffer.advance(1);
            }
            if self.buffer.len() < 2 {
                return Ok(None);
            }
            let code = self.buffer[1];
            let kind = match candidates.iter().find(|k| k.code() == code) {
                Some(kind) => *kind,
                None => {
                    self.buffer.advance(1);
                    if code != SYNC {
                        self.buffer.advance(1);
                    }
                    continue;
                }
            };
            let payload_len = match kind.fixed_payload_len() {
                Some(len) => len,
                None => {
                    let flags_index = 2 + SEND_MESSAGE_FLAGS_OFFSET;
                    if self.buffer.len() <= flags_index {
                        return Ok(None);
                    }
                    send_message_payload_len(self.buffer[flags_index])
                }
            };
            if self.buffer.len() < 2 + payload_len {
                return Ok(None);
            }
            self.buffer.advance(2);
            let payload = self.buffer.split_to(payload_len);
            return Response::parse(kind, &payload).map(Some);
        }
    }
}

/// Reads exactly one frame matching `candidates` from `reader`.
///
/// Hunts for the sync byte one byte at a time and then consumes exactly the
/// declared frame length, so no bytes beyond the frame are taken from the
/// source.
pub async fn read_response<R>(
    reader: &mut R,
    candidates: &[ResponseKind],
) -> Result<Response, Error>
where
    R: AsyncRead + Unpin,
{
    let mut have_sync = false;
    let kind = loop {
        let byte = reader.read_u8().await?;
        if !have_sync {
            have_sync = byte == SYNC;
            continue;
        }
        if let Some(kind) = candidates.iter().find(|k| k.code() == byte) {
            break *kind;
        }
        have_sync = byte == SYNC;
    };

    let mut payload;
    match kind.fixed_payload_len() {
        Some(len) => {
            payload = vec![0u8; len];
            reader.read_exact(&mut payload).await?;
        }
        None => {
            payload = vec![0u8; SEND_MESSAGE_FLAGS_OFFSET + 1];
            reader.read_exact(&mut payload).await?;
            let total = send_message_payload_len(payload[SEND_MESSAGE_FLAGS_OFFSET]);
            let start = payload.len();
            payload.resize(total, 0);
            reader.read_exact(&mut payload[start..]).await?;
        }
    }
    Response::parse(kind, &payload)
}
