pub mod dispatch;
pub mod monitor;
pub mod plm;
pub mod token;
pub mod transport;

pub use monitor::Monitor;
pub use plm::PowerLineModem;
pub use token::RequestToken;
pub use transport::{open_device, BoxTransport, Transport};
