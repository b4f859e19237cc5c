use crate::error::Error;
use crate::modem::dispatch::LinkShared;
use crate::modem::transport::BoxTransport;
use crate::protocol::reader::read_response;
use crate::protocol::request::Request;
use crate::protocol::response::{Response, ResponseKind};
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWriteExt, ReadBuf, WriteHalf};
use tokio::sync::{mpsc, oneshot, Mutex};

/// The right to one exclusive request/response conversation on the link.
///
/// While held, every byte the dispatcher reads from the transport is routed
/// here. Dropping the token releases the link; bytes still queued for it
/// are discarded and the background loop re-synchronises on the next sync
/// byte. A token must not outlive its conversation.
pub struct RequestToken {
    rx: mpsc::Receiver<Vec<u8>>,
    pending: Vec<u8>,
    offset: usize,
    writer: Arc<Mutex<WriteHalf<BoxTransport>>>,
    shared: Arc<LinkShared>,
    // Dropping this signals the dispatcher to return the byte stream to
    // the background loop.
    _release: oneshot::Sender<()>,
}

impl RequestToken {
    pub(crate) fn new(
        rx: mpsc::Receiver<Vec<u8>>,
        writer: Arc<Mutex<WriteHalf<BoxTransport>>>,
        shared: Arc<LinkShared>,
        release: oneshot::Sender<()>,
    ) -> RequestToken {
        RequestToken {
            rx,
            pending: Vec::new(),
            offset: 0,
            writer,
            shared,
            _release: release,
        }
    }

    /// Writes one encoded request to the transport.
    pub async fn send(&mut self, request: &Request) -> Result<(), Error> {
        let frame = request.encode();
        let mut writer = self.writer.lock().await;
        writer.write_all(&frame).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Reads the next frame matching `candidates`.
    pub async fn read(&mut self, candidates: &[ResponseKind]) -> Result<Response, Error> {
        read_response(self, candidates).await
    }
}

impl AsyncRead for RequestToken {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        loop {
            if this.offset < this.pending.len() {
                let n = buf.remaining().min(this.pending.len() - this.offset);
                buf.put_slice(&this.pending[this.offset..this.offset + n]);
                this.offset += n;
                return Poll::Ready(Ok(()));
            }
            match this.rx.poll_recv(cx) {
                Poll::Ready(Some(chunk)) => {
                    this.pending = chunk;
                    this.offset = 0;
                }
                Poll::Ready(None) => {
                    // The dispatcher is gone; the modem failed or was torn
                    // down while this conversation was live.
                    return Poll::Ready(if this.shared.is_failed() {
                        Err(io::Error::new(
                            io::ErrorKind::BrokenPipe,
                            "modem transport failed",
                        ))
                    } else {
                        Ok(())
                    });
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
