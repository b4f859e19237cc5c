use crate::error::Error;
use crate::modem::monitor::Monitor;
use crate::modem::token::RequestToken;
use crate::modem::transport::BoxTransport;
use crate::protocol::reader::FrameReader;
use crate::protocol::response::UNSOLICITED;
use log::{debug, error};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, ReadHalf, WriteHalf};
use tokio::sync::{mpsc, oneshot, Mutex};

/// State shared between the dispatcher task and token holders.
#[derive(Debug, Default)]
pub(crate) struct LinkShared {
    failed: AtomicBool,
}

impl LinkShared {
    pub(crate) fn is_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    fn set_failed(&self) {
        self.failed.store(true, Ordering::Release);
    }
}

/// A queued request for exclusive link access. Dropping the receiving end
/// of `ready` before activation withdraws the request.
pub(crate) struct TokenRequest {
    pub ready: oneshot::Sender<RequestToken>,
}

/// Capacity of the byte channel feeding an active token.
const ROUTE_CAPACITY: usize = 16;

/// Owns the transport read half: routes bytes either to the background
/// decoder (unsolicited frames, delivered to the monitor) or to the active
/// token, and serves queued token requests in FIFO order. One token at a
/// time; the next request activates only after the previous token dropped.
pub(crate) async fn dispatch_loop(
    mut reader: ReadHalf<BoxTransport>,
    writer: Arc<Mutex<WriteHalf<BoxTransport>>>,
    mut requests: mpsc::Receiver<TokenRequest>,
    monitor: Option<Arc<dyn Monitor>>,
    shared: Arc<LinkShared>,
) {
    let mut background = FrameReader::new();
    let mut active: Option<(mpsc::Sender<Vec<u8>>, oneshot::Receiver<()>)> = None;
    let mut buf = [0u8; 256];

    loop {
        tokio::select! {
            request = requests.recv(), if active.is_none() => {
                match request {
                    Some(request) => {
                        let (byte_tx, byte_rx) = mpsc::channel(ROUTE_CAPACITY);
                        let (release_tx, release_rx) = oneshot::channel();
                        let token = RequestToken::new(
                            byte_rx,
                            writer.clone(),
                            shared.clone(),
                            release_tx,
                        );
                        // A closed ready channel means the acquirer withdrew
                        // (deadline or cancellation); the token drops here
                        // and the byte stream stays with the background loop.
                        if request.ready.send(token).is_ok() {
                            active = Some((byte_tx, release_rx));
                        }
                    }
                    None => break,
                }
            }
            _ = async { let _ = (&mut active.as_mut().unwrap().1).await; }, if active.is_some() => {
                debug!("token released, resuming background decode");
                active = None;
            }
            read = reader.read(&mut buf) => {
                match read {
                    // EOF is normal teardown of the link.
                    Ok(0) => break,
                    Ok(n) => {
                        if let Some((byte_tx, _)) = &active {
                            // A closed channel means the token is mid-drop;
                            // the release branch cleans up on the next turn.
                            let _ = byte_tx.send(buf[..n].to_vec()).await;
                        } else if !background_decode(&mut background, &buf[..n], &monitor) {
                            shared.set_failed();
                            break;
                        }
                    }
                    Err(err) => {
                        error!("PLM transport read failed: {}", err);
                        shared.set_failed();
                        break;
                    }
                }
            }
        }
    }
}

/// Feeds bytes read while idle to the unsolicited-frame decoder. Command
/// failure is never fatal to the loop; any other decode error fails the
/// modem.
fn background_decode(
    background: &mut FrameReader,
    bytes: &[u8],
    monitor: &Option<Arc<dyn Monitor>>,
) -> bool {
    background.push(bytes);
    loop {
        match background.try_decode(UNSOLICITED) {
            Ok(Some(response)) => {
                if let Some(monitor) = monitor {
                    monitor.on_response(&response);
                }
            }
            Ok(None) => return true,
            Err(Error::CommandFailure) => continue,
            Err(err) => {
                error!("PLM background decode failed: {}", err);
                return false;
            }
        }
    }
}
