/// Status machine for a `FramedLink`, matching `csoconnection/conn_status.go`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The link is set up but has never connected.
    Prepare,
    /// A TCP connect is in flight.
    Connecting,
    /// The socket is open and usable.
    Connected,
    /// The socket has been closed, by us or by the peer.
    Disconnected,
}
