use crate::protocol::response::Response;

/// Receives the frames the background loop decodes while no conversation
/// is active. The callback runs on the dispatcher task and must not block;
/// a monitor that needs to queue does so internally.
pub trait Monitor: Send + Sync {
    fn on_response(&self, response: &Response);
}
