use clap::{Parser, Subcommand};
use futures::StreamExt;
use log::{error, info};
use std::net::IpAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_stream::wrappers::UnboundedReceiverStream;

use insteon::common::identity::Id;
use insteon::common::light_state::{Change, LightState};
use insteon::config::Configuration;
use insteon::error::DynResult;
use insteon::modem::{open_device, Monitor, PowerLineModem};
use insteon::protocol::response::Response;
use insteon_tools as insteon;

#[derive(Parser, Debug)]
#[command(about = "Control Insteon devices through a PowerLine Modem")]
struct CmdArgs {
    /// PLM device: a serial port path or a tcp://host:port endpoint
    #[arg(short = 'd', long, default_value = "/dev/ttyUSB0")]
    device: String,

    /// Per-command timeout in seconds
    #[arg(long, default_value_t = 5)]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show information about the PLM
    Info,
    /// List the all-link database
    Db,
    /// Get or set the state of a device
    State {
        id: Id,
        /// Target level in [0, 1]; omit to query the current state
        level: Option<f64>,
        /// Ramp to the new level instead of switching instantly
        #[arg(long)]
        ramp: bool,
    },
    /// Make a device beep
    Beep { id: Id },
    /// Print unsolicited device events
    Monitor,
    /// Serve the HTTP control surface
    Serve {
        /// Device alias configuration file
        #[arg(short = 'c', long)]
        config: Option<String>,
        /// Bind HTTP server to this address
        #[arg(long)]
        http_address: Option<IpAddr>,
        /// HTTP port
        #[arg(long, default_value_t = 8080)]
        http_port: u16,
    },
}

/// Hands decoded events off to a queue so the dispatcher never blocks on
/// terminal output.
struct ChannelMonitor {
    tx: mpsc::UnboundedSender<Response>,
}

impl Monitor for ChannelMonitor {
    fn on_response(&self, response: &Response) {
        let _ = self.tx.send(response.clone());
    }
}

fn print_event(response: &Response) {
    match response {
        Response::StandardMessageReceived(msg) => {
            println!("{} -> {}: {}", msg.from, msg.to, msg.command);
        }
        Response::ExtendedMessageReceived(msg) => {
            println!("{} -> {}: {} (extended)", msg.from, msg.to, msg.command);
        }
        other => println!("{:?}", other),
    }
}

async fn run(args: CmdArgs) -> DynResult<()> {
    let transport = open_device(&args.device).await?;
    let mut modem = PowerLineModem::new(transport);
    let timeout = Duration::from_secs(args.timeout);
    let deadline = || Instant::now() + timeout;

    match args.command {
        Command::Info => {
            modem.start(None);
            let info = modem.get_im_info(deadline()).await?;
            println!("{}", info);
        }
        Command::Db => {
            modem.start(None);
            for record in modem.get_all_link_db(deadline()).await? {
                println!(
                    "group {:3}  {}  flags {:02x}  data {:02x}{:02x}{:02x}",
                    record.group,
                    record.id,
                    record.flags,
                    record.link_data[0],
                    record.link_data[1],
                    record.link_data[2]
                );
            }
        }
        Command::State { id, level, ramp } => {
            modem.start(None);
            match level {
                Some(level) => {
                    let change = if ramp { Change::Ramp } else { Change::Instant };
                    let state = LightState { level, change };
                    modem.set_device_state(deadline(), id, state).await?;
                }
                None => {
                    let state = modem.get_device_state(deadline(), id).await?;
                    println!("{}", serde_json::to_string(&state)?);
                }
            }
        }
        Command::Beep { id } => {
            modem.start(None);
            modem.beep(deadline(), id).await?;
        }
        Command::Monitor => {
            let (tx, rx) = mpsc::unbounded_channel();
            modem.start(Some(Arc::new(ChannelMonitor { tx })));
            info!("monitoring, press ctrl-c to stop");
            let mut events = UnboundedReceiverStream::new(rx);
            loop {
                tokio::select! {
                    event = events.next() => match event {
                        Some(event) => print_event(&event),
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
        }
        Command::Serve {
            config,
            http_address,
            http_port,
        } => {
            let configuration = match config {
                Some(path) => Configuration::from_file(path)?,
                None => Configuration::default(),
            };
            modem.start(None);
            let service = insteon::httpd::WebService::new(
                Arc::new(modem),
                Arc::new(configuration),
            )
            .command_timeout(timeout);
            let (server, addr, port) =
                insteon::httpd::setup_server(service, http_address, http_port);
            info!("serving at http://{}:{}", addr, port);
            server.await?;
            return Ok(());
        }
    }

    modem.close().await;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let args = CmdArgs::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
