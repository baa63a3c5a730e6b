/// The event hub's connection lifecycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EventHubState {
    Disconnected,
    Connecting,
    Connected,
    Shutdown,
}
