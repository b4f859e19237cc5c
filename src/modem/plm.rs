use crate::common::all_link::AllLinkRecord;
use crate::common::commands;
use crate::common::device_info::{ramp_rate_to_byte, DeviceInfo};
use crate::common::identity::Id;
use crate::common::im_info::IMInfo;
use crate::common::light_state::{byte_to_level, level_to_byte, Change, LightState};
use crate::common::user_data::UserData;
use crate::error::Error;
use crate::modem::dispatch::{dispatch_loop, LinkShared, TokenRequest};
use crate::modem::monitor::Monitor;
use crate::modem::token::RequestToken;
use crate::modem::transport::BoxTransport;
use crate::protocol::request::Request;
use crate::protocol::response::{Response, ResponseKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};

// Selector values for the extended set-device-info sub-operations,
// written at UserData[1] with the value bytes from UserData[2] on.
const SETTING_X10_ADDRESS: u8 = 0x04;
const SETTING_RAMP_RATE: u8 = 0x05;
const SETTING_ON_LEVEL: u8 = 0x06;
const SETTING_LED_BRIGHTNESS: u8 = 0x07;

/// Capacity of the token-request queue. Acquirers past it wait their turn
/// on the channel, which preserves FIFO order either way.
const REQUEST_QUEUE: usize = 16;

/// An Insteon PowerLine Modem attached through a bidirectional byte
/// channel.
///
/// Lifecycle is `new` → `start` → commands → `stop` → `close`. Starting
/// twice or issuing commands on a stopped instance is not defended
/// against. All commands take a deadline that bounds token acquisition
/// and every expected reply read.
pub struct PowerLineModem {
    reader: Option<ReadHalf<BoxTransport>>,
    writer: Arc<Mutex<WriteHalf<BoxTransport>>>,
    requests: Option<mpsc::Sender<TokenRequest>>,
    shared: Arc<LinkShared>,
    join: Option<JoinHandle<()>>,
}

impl PowerLineModem {
    pub fn new(transport: BoxTransport) -> PowerLineModem {
        let (reader, writer) = tokio::io::split(transport);
        PowerLineModem {
            reader: Some(reader),
            writer: Arc::new(Mutex::new(writer)),
            requests: None,
            shared: Arc::new(LinkShared::default()),
            join: None,
        }
    }

    /// Spawns the background dispatcher. Unsolicited frames decoded while
    /// no token is held go to `monitor`.
    pub fn start(&mut self, monitor: Option<Arc<dyn Monitor>>) {
        let reader = self.reader.take().expect("modem already started");
        let (tx, rx) = mpsc::channel(REQUEST_QUEUE);
        self.requests = Some(tx);
        self.join = Some(tokio::spawn(dispatch_loop(
            reader,
            self.writer.clone(),
            rx,
            monitor,
            self.shared.clone(),
        )));
    }

    /// Shuts the dispatcher down. Queued acquisitions are drained with a
    /// cancellation error.
    pub async fn stop(&mut self) {
        self.requests = None;
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }

    /// Stops the dispatcher and closes the transport.
    pub async fn close(&mut self) {
        self.stop().await;
        let _ = self.writer.lock().await.shutdown().await;
    }

    /// Acquires the link for one exclusive conversation.
    ///
    /// Requests are served in FIFO order. A deadline that expires before
    /// activation withdraws the request without perturbing other holders.
    pub async fn acquire(&self, deadline: Instant) -> Result<RequestToken, Error> {
        let requests = self.requests.as_ref().expect("modem not started");
        let (ready_tx, ready_rx) = oneshot::channel();
        let wait = async {
            requests
                .send(TokenRequest { ready: ready_tx })
                .await
                .map_err(|_| self.link_error())?;
            ready_rx.await.map_err(|_| self.link_error())
        };
        timeout_at(deadline, wait)
            .await
            .map_err(|_| Error::DeadlineExceeded)?
    }

    fn link_error(&self) -> Error {
        if self.shared.is_failed() {
            Error::TransportFailed("modem link failed".to_string())
        } else {
            Error::Cancelled
        }
    }

    /// Queries the modem's own identity and firmware.
    pub async fn get_im_info(&self, deadline: Instant) -> Result<IMInfo, Error> {
        let mut token = self.acquire(deadline).await?;
        token.send(&Request::GetIMInfo).await?;
        match read_reply(&mut token, deadline, &[ResponseKind::GetIMInfo]).await? {
            Response::GetIMInfo(info) => Ok(info),
            response => Err(unexpected(&response)),
        }
    }

    /// Makes a device beep.
    ///
    /// Some devices follow the echo with a bounce message; it is left for
    /// the background loop to discard.
    pub async fn beep(&self, deadline: Instant, id: Id) -> Result<(), Error> {
        let mut token = self.acquire(deadline).await?;
        token.send(&Request::standard(id, commands::BEEP)).await?;
        read_echo(&mut token, deadline).await?;
        Ok(())
    }

    /// Queries the current level of a lighting device.
    pub async fn get_device_state(
        &self,
        deadline: Instant,
        id: Id,
    ) -> Result<LightState, Error> {
        let mut token = self.acquire(deadline).await?;
        token
            .send(&Request::standard(id, commands::STATUS_REQUEST))
            .await?;
        read_echo(&mut token, deadline).await?;
        match read_reply(
            &mut token,
            deadline,
            &[ResponseKind::StandardMessageReceived],
        )
        .await?
        {
            Response::StandardMessageReceived(msg) => Ok(LightState {
                level: byte_to_level(msg.command.cmd2()),
                change: Change::Instant,
            }),
            response => Err(unexpected(&response)),
        }
    }

    /// Drives a lighting device to the given state.
    pub async fn set_device_state(
        &self,
        deadline: Instant,
        id: Id,
        state: LightState,
    ) -> Result<(), Error> {
        let command = state.command_bytes()?;
        let mut token = self.acquire(deadline).await?;
        token.send(&Request::standard(id, command)).await?;
        read_echo(&mut token, deadline).await?;
        Ok(())
    }

    /// Reads the configuration block of a device.
    pub async fn get_device_info(
        &self,
        deadline: Instant,
        id: Id,
    ) -> Result<DeviceInfo, Error> {
        let mut token = self.acquire(deadline).await?;
        token
            .send(&Request::extended(
                id,
                commands::GET_DEVICE_INFO,
                UserData::default(),
            ))
            .await?;
        read_echo(&mut token, deadline).await?;
        // The device acknowledges with a standard message before the
        // extended reply, but some firmware skips the ack. Accepting both
        // kinds here tolerates either sequence without losing sync.
        let reply = read_reply(
            &mut token,
            deadline,
            &[
                ResponseKind::StandardMessageReceived,
                ResponseKind::ExtendedMessageReceived,
            ],
        )
        .await?;
        let message = match reply {
            Response::ExtendedMessageReceived(message) => message,
            Response::StandardMessageReceived(_) => {
                match read_reply(
                    &mut token,
                    deadline,
                    &[ResponseKind::ExtendedMessageReceived],
                )
                .await?
                {
                    Response::ExtendedMessageReceived(message) => message,
                    response => return Err(unexpected(&response)),
                }
            }
            response => return Err(unexpected(&response)),
        };
        Ok(DeviceInfo::from_user_data(message.user_data))
    }

    /// Writes the full configuration block of a device, one field per
    /// sub-operation, under a single conversation.
    pub async fn set_device_info(
        &self,
        deadline: Instant,
        id: Id,
        info: &DeviceInfo,
    ) -> Result<(), Error> {
        let on_level = checked_level_byte(info.on_level, "on level")?;
        let led_brightness = checked_level_byte(info.led_brightness, "led brightness")?;
        let mut token = self.acquire(deadline).await?;
        write_setting(
            &mut token,
            deadline,
            id,
            SETTING_X10_ADDRESS,
            &[info.x10_house_code, info.x10_unit],
        )
        .await?;
        write_setting(
            &mut token,
            deadline,
            id,
            SETTING_RAMP_RATE,
            &[ramp_rate_to_byte(info.ramp_rate)],
        )
        .await?;
        write_setting(&mut token, deadline, id, SETTING_ON_LEVEL, &[on_level]).await?;
        write_setting(
            &mut token,
            deadline,
            id,
            SETTING_LED_BRIGHTNESS,
            &[led_brightness],
        )
        .await?;
        Ok(())
    }

    /// Sets the ramp rate of a device.
    pub async fn set_ramp_rate(
        &self,
        deadline: Instant,
        id: Id,
        ramp_rate: Duration,
    ) -> Result<(), Error> {
        let mut token = self.acquire(deadline).await?;
        write_setting(
            &mut token,
            deadline,
            id,
            SETTING_RAMP_RATE,
            &[ramp_rate_to_byte(ramp_rate)],
        )
        .await
    }

    /// Sets the on level of a device.
    pub async fn set_on_level(
        &self,
        deadline: Instant,
        id: Id,
        level: f64,
    ) -> Result<(), Error> {
        let byte = checked_level_byte(level, "on level")?;
        let mut token = self.acquire(deadline).await?;
        write_setting(&mut token, deadline, id, SETTING_ON_LEVEL, &[byte]).await
    }

    /// Sets the LED brightness of a device.
    pub async fn set_led_brightness(
        &self,
        deadline: Instant,
        id: Id,
        level: f64,
    ) -> Result<(), Error> {
        let byte = checked_level_byte(level, "led brightness")?;
        let mut token = self.acquire(deadline).await?;
        write_setting(&mut token, deadline, id, SETTING_LED_BRIGHTNESS, &[byte]).await
    }

    /// Sets the X10 address of a device.
    pub async fn set_x10_address(
        &self,
        deadline: Instant,
        id: Id,
        house_code: u8,
        unit: u8,
    ) -> Result<(), Error> {
        let mut token = self.acquire(deadline).await?;
        write_setting(
            &mut token,
            deadline,
            id,
            SETTING_X10_ADDRESS,
            &[house_code, unit],
        )
        .await
    }

    /// Enumerates the modem's all-link database, sorted by (group, id).
    ///
    /// The modem signals command failure on the first request when the
    /// database is empty and on the "next" request past the last record;
    /// both terminate the enumeration cleanly.
    pub async fn get_all_link_db(
        &self,
        deadline: Instant,
    ) -> Result<Vec<AllLinkRecord>, Error> {
        let mut token = self.acquire(deadline).await?;
        token.send(&Request::GetFirstAllLinkRecord).await?;
        match read_reply(
            &mut token,
            deadline,
            &[ResponseKind::GetFirstAllLinkRecord],
        )
        .await
        {
            Ok(_) => {}
            Err(Error::CommandFailure) => return Ok(Vec::new()),
            Err(err) => return Err(err),
        }

        let mut records = Vec::new();
        loop {
            match read_reply(&mut token, deadline, &[ResponseKind::AllLinkRecord]).await? {
                Response::AllLinkRecord(record) => records.push(record),
                response => return Err(unexpected(&response)),
            }
            token.send(&Request::GetNextAllLinkRecord).await?;
            match read_reply(&mut token, deadline, &[ResponseKind::GetNextAllLinkRecord]).await
            {
                Ok(_) => {}
                Err(Error::CommandFailure) => break,
                Err(err) => return Err(err),
            }
        }

        records.sort_by_key(AllLinkRecord::sort_key);
        Ok(records)
    }
}

async fn read_reply(
    token: &mut RequestToken,
    deadline: Instant,
    candidates: &[ResponseKind],
) -> Result<Response, Error> {
    timeout_at(deadline, token.read(candidates)).await?
}

/// Reads the modem's echo of a sent message.
async fn read_echo(token: &mut RequestToken, deadline: Instant) -> Result<(), Error> {
    match read_reply(token, deadline, &[ResponseKind::SendMessage]).await? {
        Response::SendMessage(_) => Ok(()),
        response => Err(unexpected(&response)),
    }
}

async fn write_setting(
    token: &mut RequestToken,
    deadline: Instant,
    id: Id,
    selector: u8,
    values: &[u8],
) -> Result<(), Error> {
    let mut user_data = UserData::default();
    user_data[1] = selector;
    for (i, value) in values.iter().enumerate() {
        user_data[2 + i] = *value;
    }
    token
        .send(&Request::extended(id, commands::SET_DEVICE_INFO, user_data))
        .await?;
    read_echo(token, deadline).await
}

fn checked_level_byte(level: f64, what: &str) -> Result<u8, Error> {
    if !(0.0..=1.0).contains(&level) {
        return Err(Error::InvalidArgument(format!(
            "{} {} out of range [0, 1]",
            what, level
        )));
    }
    Ok(level_to_byte(level))
}

fn unexpected(response: &Response) -> Error {
    Error::Decode(format!("unexpected response {:?}", response.kind()))
}
