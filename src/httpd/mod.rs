pub mod server;
pub mod web_service;

pub use server::setup_server;
pub use web_service::WebService;
