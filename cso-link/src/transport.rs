use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Mutex;

use crossbeam_channel::{Receiver, Sender};

use crate::error::LinkError;
use crate::status::Status;

/// Size of the little-endian length prefix in front of every frame.
pub const HEADER_SIZE: usize = 2;
/// Maximum body size a single frame may carry.
pub const BUFFER_SIZE: usize = 1204;

struct State {
    status: Status,
    socket: Option<TcpStream>,
}

/// A plain TCP connection carrying length-prefixed frames, matching
/// `csoconnection/conn_implement.go`'s `connectionImpl`.
///
/// `send_message` and `run_read_loop` both take a `&self` and lock
/// independently, satisfying spec.md §9's requirement that writes from a
/// caller thread and writes from a dispatcher's retry pump serialize
/// through the same guard (see `cso-session`'s connector, which never
/// calls `send_message` concurrently with itself but may call it while
/// `run_read_loop` is reading on another thread).
pub struct FramedLink {
    state: Mutex<State>,
    inbound_tx: Sender<Vec<u8>>,
    inbound_rx: Receiver<Vec<u8>>,
}

impl FramedLink {
    /// `NewConnection`: builds a link in `Status::Prepare` with a
    /// bounded inbound channel of `buffer_size` pending frames.
    pub fn new(buffer_size: usize) -> FramedLink {
        let (inbound_tx, inbound_rx) = crossbeam_channel::bounded(buffer_size);
        FramedLink {
            state: Mutex::new(State {
                status: Status::Prepare,
                socket: None,
            }),
            inbound_tx,
            inbound_rx,
        }
    }

    pub fn status(&self) -> Status {
        self.state.lock().expect("link mutex poisoned").status
    }

    /// A cloned receiver handle for the decoded inbound frame bodies.
    pub fn read_channel(&self) -> Receiver<Vec<u8>> {
        self.inbound_rx.clone()
    }

    /// `Connect`: dials `address`, closing any previously open socket first.
    pub fn connect(&self, address: &str) -> Result<(), LinkError> {
        let mut state = self.state.lock().expect("link mutex poisoned");
        if state.status != Status::Prepare {
            if let Some(socket) = state.socket.take() {
                let _ = socket.shutdown(std::net::Shutdown::Both);
            }
            state.status = Status::Prepare;
        }

        state.status = Status::Connecting;
        match TcpStream::connect(address) {
            Ok(socket) => {
                state.socket = Some(socket);
                state.status = Status::Connected;
                Ok(())
            }
            Err(e) => {
                state.status = Status::Prepare;
                Err(LinkError::Io(e))
            }
        }
    }

    /// `SendMessage`: prepends a 2-byte little-endian length to `data` and
    /// writes it in a loop until fully sent. Any write failure closes the
    /// socket and surfaces `LinkError`.
    pub fn send_message(&self, data: &[u8]) -> Result<(), LinkError> {
        let mut buffer = Vec::with_capacity(HEADER_SIZE + data.len());
        buffer.extend_from_slice(&(data.len() as u16).to_le_bytes());
        buffer.extend_from_slice(data);

        let mut state = self.state.lock().expect("link mutex poisoned");
        let socket = state.socket.as_mut().ok_or(LinkError::NotConnected)?;

        let result = socket.write_all(&buffer);
        if let Err(e) = result {
            state.socket = None;
            state.status = Status::Disconnected;
            return Err(LinkError::Io(e));
        }
        Ok(())
    }

    /// `LoopListen`: runs the streaming deframer until the socket closes or
    /// errors, publishing each decoded frame body to the inbound channel.
    /// Blocks the calling thread — spec.md's reconnect supervisor runs this
    /// on its own thread and restarts the whole connect sequence once it
    /// returns.
    pub fn run_read_loop(&self) -> Result<(), LinkError> {
        let mut read_handle = {
            let state = self.state.lock().expect("link mutex poisoned");
            state
                .socket
                .as_ref()
                .ok_or(LinkError::NotConnected)?
                .try_clone()?
        };

        let result = self.deframe_loop(&mut read_handle);
        let mut state = self.state.lock().expect("link mutex poisoned");
        state.socket = None;
        state.status = Status::Disconnected;
        result
    }

    fn deframe_loop(&self, socket: &mut TcpStream) -> Result<(), LinkError> {
        let mut recv_buffer = [0u8; BUFFER_SIZE];
        let mut header = [0u8; HEADER_SIZE];
        let mut body = [0u8; BUFFER_SIZE];
        let mut len_header = 0usize;
        let mut len_body = 0usize;
        let mut len_message = 0usize;

        loop {
            let len_buffer = socket.read(&mut recv_buffer)?;
            if len_buffer == 0 {
                return Ok(());
            }

            let mut pos_buffer = 0usize;
            while pos_buffer < len_buffer {
                if len_message == 0 {
                    let next_pos = (pos_buffer + (HEADER_SIZE - len_header)).min(len_buffer);
                    header[len_header..len_header + (next_pos - pos_buffer)]
                        .copy_from_slice(&recv_buffer[pos_buffer..next_pos]);
                    len_header += next_pos - pos_buffer;
                    pos_buffer = next_pos;
                    if len_header == HEADER_SIZE {
                        len_message = u16::from_le_bytes(header) as usize;
                        len_body = 0;
                    }
                    continue;
                }

                if len_message > BUFFER_SIZE {
                    len_header = 0;
                    len_message = 0;
                    continue;
                }

                let next_pos = (pos_buffer + (len_message - len_body)).min(len_buffer);
                body[len_body..len_body + (next_pos - pos_buffer)]
                    .copy_from_slice(&recv_buffer[pos_buffer..next_pos]);
                len_body += next_pos - pos_buffer;
                pos_buffer = next_pos;
                if len_body != len_message {
                    continue;
                }

                if self.inbound_tx.send(body[..len_body].to_vec()).is_err() {
                    return Ok(());
                }
                len_message = 0;
                len_header = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read as _;
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn connects_sends_and_receives_a_frame() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut header = [0u8; HEADER_SIZE];
            socket.read_exact(&mut header).unwrap();
            let len = u16::from_le_bytes(header) as usize;
            let mut body = vec![0u8; len];
            socket.read_exact(&mut body).unwrap();
            assert_eq!(body, b"hello hub");

            let reply = b"hello client";
            let mut framed = Vec::new();
            framed.extend_from_slice(&(reply.len() as u16).to_le_bytes());
            framed.extend_from_slice(reply);
            socket.write_all(&framed).unwrap();
        });

        let link = FramedLink::new(8);
        link.connect(&addr.to_string()).unwrap();
        assert_eq!(link.status(), Status::Connected);

        link.send_message(b"hello hub").unwrap();

        let rx = link.read_channel();
        let reader = thread::spawn(move || link.run_read_loop());

        let body = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(body, b"hello client");

        server.join().unwrap();
        let _ = reader.join();
    }

    #[test]
    fn send_without_connect_fails() {
        let link = FramedLink::new(4);
        assert!(matches!(link.send_message(b"x"), Err(LinkError::NotConnected)));
    }
}
