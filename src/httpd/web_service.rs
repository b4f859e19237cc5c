use crate::common::device_info::DeviceInfo;
use crate::common::identity::Id;
use crate::common::light_state::LightState;
use crate::config::{Configuration, ConfigurationDevice};
use crate::error::{DynResult, Error};
use crate::modem::PowerLineModem;
use hyper::header;
use hyper::http::StatusCode;
use hyper::{Body, Method, Request, Response};
use log::error;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// JSON control surface over a PowerLine Modem.
///
/// `/plm/...` routes address devices by raw ID; `/api/...` routes resolve
/// configured aliases, applying updates to the primary device first and
/// then best-effort to each slave in declaration order.
pub struct WebService {
    modem: Arc<PowerLineModem>,
    configuration: Arc<Configuration>,
    command_timeout: Duration,
}

impl WebService {
    pub fn new(modem: Arc<PowerLineModem>, configuration: Arc<Configuration>) -> WebService {
        WebService {
            modem,
            configuration,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn command_timeout(mut self, timeout: Duration) -> WebService {
        self.command_timeout = timeout;
        self
    }

    fn deadline(&self) -> Instant {
        Instant::now() + self.command_timeout
    }

    pub async fn handle(&self, req: Request<Body>) -> DynResult<Response<Body>> {
        let path = req.uri().path().trim_matches('/').to_string();
        let segments: Vec<&str> = path.split('/').collect();

        match (req.method().clone(), segments.as_slice()) {
            (Method::GET, ["plm", "im-info"]) => {
                command_result(self.modem.get_im_info(self.deadline()).await)
            }
            (Method::GET, ["plm", "all-link-db"]) => {
                command_result(self.modem.get_all_link_db(self.deadline()).await)
            }
            (Method::GET, ["plm", "device", id, "state"]) => match parse_id(id) {
                Ok(id) => {
                    command_result(self.modem.get_device_state(self.deadline(), id).await)
                }
                Err(response) => Ok(response),
            },
            (Method::PUT, ["plm", "device", id, "state"]) => {
                let id = match parse_id(id) {
                    Ok(id) => id,
                    Err(response) => return Ok(response),
                };
                let state: LightState = match decode_body(req).await {
                    Ok(state) => state,
                    Err(response) => return Ok(response),
                };
                command_result(
                    self.modem
                        .set_device_state(self.deadline(), id, state)
                        .await
                        .map(|()| state),
                )
            }
            (Method::GET, ["plm", "device", id, "info"]) => match parse_id(id) {
                Ok(id) => command_result(self.modem.get_device_info(self.deadline(), id).await),
                Err(response) => Ok(response),
            },
            (Method::PUT, ["plm", "device", id, "info"]) => {
                let id = match parse_id(id) {
                    Ok(id) => id,
                    Err(response) => return Ok(response),
                };
                let info: DeviceInfo = match decode_body(req).await {
                    Ok(info) => info,
                    Err(response) => return Ok(response),
                };
                command_result(
                    self.modem
                        .set_device_info(self.deadline(), id, &info)
                        .await
                        .map(|()| info),
                )
            }
            (Method::POST, ["plm", "device", id, "beep"]) => {
                let id = match parse_id(id) {
                    Ok(id) => id,
                    Err(response) => return Ok(response),
                };
                match self.modem.beep(self.deadline(), id).await {
                    Ok(()) => empty_response(),
                    Err(err) => error_response(&err),
                }
            }
            (Method::GET, ["api", "device", name, "state"]) => {
                match self.lookup_device(name) {
                    Ok(device) => command_result(
                        self.modem
                            .get_device_state(self.deadline(), device.id)
                            .await,
                    ),
                    Err(response) => Ok(response),
                }
            }
            (Method::PUT, ["api", "device", name, "state"]) => {
                let device = match self.lookup_device(name) {
                    Ok(device) => device.clone(),
                    Err(response) => return Ok(response),
                };
                let state: LightState = match decode_body(req).await {
                    Ok(state) => state,
                    Err(response) => return Ok(response),
                };
                if let Err(err) = self
                    .modem
                    .set_device_state(self.deadline(), device.id, state)
                    .await
                {
                    return error_response(&err);
                }
                for slave in &device.slave_device_ids {
                    if let Err(err) = self
                        .modem
                        .set_device_state(self.deadline(), *slave, state)
                        .await
                    {
                        error!("failed to update state of slave device {}: {}", slave, err);
                    }
                }
                json_response(&state)
            }
            (Method::GET, ["api", "device", name, "info"]) => match self.lookup_device(name) {
                Ok(device) => command_result(
                    self.modem
                        .get_device_info(self.deadline(), device.id)
                        .await,
                ),
                Err(response) => Ok(response),
            },
            (Method::PUT, ["api", "device", name, "info"]) => {
                let device = match self.lookup_device(name) {
                    Ok(device) => device.clone(),
                    Err(response) => return Ok(response),
                };
                let info: DeviceInfo = match decode_body(req).await {
                    Ok(info) => info,
                    Err(response) => return Ok(response),
                };
                if let Err(err) = self
                    .modem
                    .set_device_info(self.deadline(), device.id, &info)
                    .await
                {
                    return error_response(&err);
                }
                for slave in &device.slave_device_ids {
                    if let Err(err) = self
                        .modem
                        .set_device_info(self.deadline(), *slave, &info)
                        .await
                    {
                        error!("failed to update info of slave device {}: {}", slave, err);
                    }
                }
                json_response(&info)
            }
            _ => text_response(StatusCode::NOT_FOUND, "no such resource"),
        }
    }

    fn lookup_device(&self, name: &str) -> Result<&ConfigurationDevice, Response<Body>> {
        self.configuration.lookup_device(name).ok_or_else(|| {
            plain(
                StatusCode::NOT_FOUND,
                format!("unknown device `{}`", name),
            )
        })
    }
}

fn parse_id(text: &str) -> Result<Id, Response<Body>> {
    text.parse()
        .map_err(|err: Error| plain(StatusCode::NOT_FOUND, err.to_string()))
}

/// Decodes a JSON request body. A missing or empty Content-Type counts as
/// JSON; anything other than `application/json` is rejected.
async fn decode_body<T: DeserializeOwned>(req: Request<Body>) -> Result<T, Response<Body>> {
    if let Some(value) = req.headers().get(header::CONTENT_TYPE) {
        let value = value
            .to_str()
            .map_err(|err| plain(StatusCode::BAD_REQUEST, err.to_string()))?;
        let mediatype = value.split(';').next().unwrap_or("").trim();
        if !mediatype.is_empty() && mediatype != "application/json" {
            return Err(plain(
                StatusCode::BAD_REQUEST,
                "expected body of type application/json".to_string(),
            ));
        }
    }
    let bytes = hyper::body::to_bytes(req.into_body())
        .await
        .map_err(|err| plain(StatusCode::BAD_REQUEST, err.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|err| plain(StatusCode::BAD_REQUEST, err.to_string()))
}

fn command_result<T: Serialize>(result: Result<T, Error>) -> DynResult<Response<Body>> {
    match result {
        Ok(value) => json_response(&value),
        Err(err) => error_response(&err),
    }
}

fn json_response<T: Serialize>(value: &T) -> DynResult<Response<Body>> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(value)?))
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
}

fn empty_response() -> DynResult<Response<Body>> {
    Response::builder()
        .status(StatusCode::OK)
        .body(Body::empty())
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
}

fn error_response(err: &Error) -> DynResult<Response<Body>> {
    let status = match err {
        Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    text_response(status, &err.to_string())
}

fn text_response(status: StatusCode, message: &str) -> DynResult<Response<Body>> {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(message.to_string()))
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
}

fn plain(status: StatusCode, message: String) -> Response<Body> {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(message))
        .unwrap_or_default()
}
