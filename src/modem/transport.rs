use crate::error::DynResult;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_serial::{DataBits, Parity, SerialStream, StopBits};

/// The opaque bidirectional byte channel the core drives.
pub trait Transport: AsyncRead + AsyncWrite + Send + Sync + Unpin {}

impl<T> Transport for T where T: AsyncRead + AsyncWrite + Send + Sync + Unpin {}

pub type BoxTransport = Box<dyn Transport>;

/// Opens a transport from a device specification: either a `tcp://host:port`
/// endpoint or a path to a local serial port (19200 baud, 8N1).
pub async fn open_device(device: &str) -> DynResult<BoxTransport> {
    if let Some(host) = device.strip_prefix("tcp://") {
        let stream = TcpStream::connect(host).await?;
        Ok(Box::new(stream))
    } else {
        let builder = tokio_serial::new(device, 19200)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One);
        let serial = SerialStream::open(&builder)?;
        Ok(Box::new(serial))
    }
}
