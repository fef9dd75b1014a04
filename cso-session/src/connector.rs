use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use cso_handshake::{Config, HandshakeClient};
use cso_link::FramedLink;
use cso_queue::{Counter, ItemQueue, RetryQueue};
use cso_wire::{MessageType, ReadyTicket};
use crossbeam_channel::{bounded, select, tick, Receiver, Sender};

use crate::error::SessionError;
use crate::parser::Parser;

/// Delay before retrying a failed handshake/connect, and the period between
/// unacknowledged activation attempts. Matches `connector_implement.go`'s
/// `delayTime = 3 * time.Second`.
const RECONNECT_DELAY: Duration = Duration::from_secs(3);
/// How often the dispatcher polls the retry queue for a due resend.
const DISPATCH_TICK: Duration = Duration::from_millis(100);

/// A user-supplied inbound handler: `(sender_or_group_name, payload) ->
/// Ok(())` to acknowledge, or `Err` to leave the message's dedup bit
/// cleared so the hub redelivers it.
pub type MessageCallback =
    dyn Fn(&str, &[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> + Send + Sync;

/// Owns the framed link, the retry queue, and the activation state machine
/// for one logical Cloud Socket connection, grounded on
/// `csoconnector/connector_implement.go`'s `connectorImpl`. `open` and
/// `listen` both run until the process shuts down; a caller spawns each on
/// its own thread.
pub struct Session {
    is_activated: AtomicBool,
    counter: Mutex<Option<Arc<Counter>>>,
    link: FramedLink,
    queue: RetryQueue,
    parser: Parser,
    handshake: HandshakeClient,
    config: Config,
    write_tx: Sender<ItemQueue>,
    write_rx: Receiver<ItemQueue>,
}

impl Session {
    /// `DefaultConnector`: `buffer_size` bounds both the inbound link
    /// channel and the retry queue's capacity.
    pub fn new(buffer_size: usize, config: Config) -> Session {
        let (write_tx, write_rx) = bounded(0);
        Session {
            is_activated: AtomicBool::new(false),
            counter: Mutex::new(None),
            link: FramedLink::new(buffer_size),
            queue: RetryQueue::new(buffer_size as i32),
            parser: Parser::new(),
            handshake: HandshakeClient::new(),
            config,
            write_tx,
            write_rx,
        }
    }

    pub fn is_activated(&self) -> bool {
        self.is_activated.load(Ordering::SeqCst)
    }

    /// `Open`: the reconnect supervisor. Handshakes, connects, starts the
    /// activation retry task, then blocks in the link's read loop until it
    /// exits — on any failure at any stage, waits `RECONNECT_DELAY` and
    /// starts over. Never returns; run it on a dedicated thread.
    pub fn open(self: &Arc<Self>) -> ! {
        loop {
            let ticket = match self.handshake.handshake(&self.config) {
                Ok(ticket) => ticket,
                Err(e) => {
                    log::warn!("handshake failed: {e}");
                    thread::sleep(RECONNECT_DELAY);
                    continue;
                }
            };

            self.parser.set_secret_key(ticket.server_secret_key);
            if let Err(e) = self.link.connect(&ticket.hub_address) {
                log::warn!("connect failed: {e}");
                thread::sleep(RECONNECT_DELAY);
                continue;
            }

            self.is_activated.store(false, Ordering::SeqCst);
            let disconnected = Arc::new(AtomicBool::new(false));
            {
                let session = Arc::clone(self);
                let disconnected = Arc::clone(&disconnected);
                let ticket_id = ticket.ticket_id;
                let ticket_bytes = ticket.ticket_bytes;
                thread::spawn(move || {
                    session.run_activation_retry(ticket_id, ticket_bytes, disconnected)
                });
            }

            if let Err(e) = self.link.run_read_loop() {
                log::warn!("read loop ended: {e}");
            }
            disconnected.store(true, Ordering::SeqCst);
            thread::sleep(RECONNECT_DELAY);
        }
    }

    /// `Listen`: the dispatcher loop. Merges the retry-queue timer, the
    /// outbound enqueue channel, and inbound frame bodies, same three-way
    /// `select` the original drives over goroutine channels. Never
    /// returns; run it on a dedicated thread.
    pub fn listen(self: &Arc<Self>, callback: impl Fn(&str, &[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> + Send + Sync + 'static) -> ! {
        let callback: Box<MessageCallback> = Box::new(callback);
        let ticker = tick(DISPATCH_TICK);
        let read_rx = self.link.read_channel();

        loop {
            select! {
                recv(ticker) -> _ => self.pump_retry_queue(),
                recv(self.write_rx) -> item => {
                    if let Ok(item) = item {
                        self.queue.push_message(item);
                    }
                },
                recv(read_rx) -> content => {
                    if let Ok(bytes) = content {
                        self.dispatch_inbound(&bytes, callback.as_ref());
                    }
                },
            }
        }
    }

    /// `SendMessage`: builds and writes a fire-and-forget or direct-response
    /// frame with no retry tracking (`MessageID = 0`).
    pub fn send_message(
        &self,
        recv_name: &str,
        content: &[u8],
        is_encrypted: bool,
        is_cached: bool,
    ) -> Result<(), SessionError> {
        self.require_activated()?;
        let bytes =
            self.parser
                .build_message(0, 0, recv_name, content, is_encrypted, is_cached, true, true, true)?;
        self.link.send_message(&bytes)?;
        Ok(())
    }

    /// `SendGroupMessage`: the group-recipient counterpart of `send_message`.
    pub fn send_group_message(
        &self,
        group_name: &str,
        content: &[u8],
        is_encrypted: bool,
        is_cached: bool,
    ) -> Result<(), SessionError> {
        self.require_activated()?;
        let bytes = self.parser.build_group_message(
            0, 0, group_name, content, is_encrypted, is_cached, true, true, true,
        )?;
        self.link.send_message(&bytes)?;
        Ok(())
    }

    /// `SendMessageAndRetry`: reserves a retry-queue slot, assigns the next
    /// write index, and hands the item to the dispatcher over the
    /// rendezvous channel. Fails synchronously if not activated or the
    /// queue is full.
    pub fn send_message_and_retry(
        &self,
        recv_name: &str,
        content: &[u8],
        is_encrypted: bool,
        number_retry: i32,
    ) -> Result<(), SessionError> {
        self.enqueue_retry(recv_name, content, is_encrypted, number_retry, false)
    }

    /// `SendGroupMessageAndRetry`: the group-recipient counterpart.
    pub fn send_group_message_and_retry(
        &self,
        group_name: &str,
        content: &[u8],
        is_encrypted: bool,
        number_retry: i32,
    ) -> Result<(), SessionError> {
        self.enqueue_retry(group_name, content, is_encrypted, number_retry, true)
    }

    fn enqueue_retry(
        &self,
        recv_name: &str,
        content: &[u8],
        is_encrypted: bool,
        number_retry: i32,
        is_group: bool,
    ) -> Result<(), SessionError> {
        self.require_activated()?;
        if !self.queue.take_index() {
            return Err(SessionError::QueueFull);
        }
        let counter = self.counter_handle().expect("activated session always has a counter");
        let item = ItemQueue {
            msg_id: counter.next_write_index(),
            msg_tag: 0,
            recv_name: recv_name.to_string(),
            content: content.to_vec(),
            is_encrypted,
            is_cached: false,
            is_first: true,
            is_last: true,
            is_request: true,
            is_group,
            number_retry: number_retry + 1,
            timestamp: 0,
        };
        self.write_tx
            .send(item)
            .map_err(|_| SessionError::QueueFull)?;
        Ok(())
    }

    fn require_activated(&self) -> Result<(), SessionError> {
        if !self.is_activated() {
            return Err(SessionError::NotActivated);
        }
        Ok(())
    }

    fn counter_handle(&self) -> Option<Arc<Counter>> {
        self.counter.lock().expect("counter lock poisoned").clone()
    }

    fn run_activation_retry(
        self: Arc<Self>,
        ticket_id: u32,
        ticket_bytes: [u8; 34],
        disconnected: Arc<AtomicBool>,
    ) {
        loop {
            if disconnected.load(Ordering::SeqCst) || self.is_activated() {
                break;
            }
            if let Err(e) = self.send_activation(ticket_id, &ticket_bytes) {
                log::warn!("activation attempt failed: {e}");
            }
            thread::sleep(RECONNECT_DELAY);
        }
    }

    fn send_activation(&self, ticket_id: u32, ticket_bytes: &[u8; 34]) -> Result<(), SessionError> {
        let bytes = self.parser.build_activate_message(ticket_id, ticket_bytes)?;
        self.link.send_message(&bytes)?;
        Ok(())
    }

    fn pump_retry_queue(&self) {
        let Some(item) = self.queue.next_message() else {
            return;
        };
        let built = if item.is_group {
            self.parser.build_group_message(
                item.msg_id,
                item.msg_tag,
                &item.recv_name,
                &item.content,
                item.is_encrypted,
                item.is_cached,
                item.is_first,
                item.is_last,
                item.is_request,
            )
        } else {
            self.parser.build_message(
                item.msg_id,
                item.msg_tag,
                &item.recv_name,
                &item.content,
                item.is_encrypted,
                item.is_cached,
                item.is_first,
                item.is_last,
                item.is_request,
            )
        };
        match built {
            Ok(bytes) => {
                if let Err(e) = self.link.send_message(&bytes) {
                    log::warn!("resend failed: {e}");
                }
            }
            Err(e) => log::warn!("could not rebuild retry item: {e}"),
        }
    }

    fn dispatch_inbound(&self, content: &[u8], callback: &MessageCallback) {
        let msg = match self.parser.parse_received_message(content) {
            Ok(msg) => msg,
            Err(e) => {
                log::warn!("dropping unparseable frame: {e}");
                return;
            }
        };

        match msg.message_type {
            MessageType::Activation => self.handle_activation(&msg.data),
            MessageType::Unknown => {}
            _ => {
                if !self.is_activated() {
                    return;
                }
                if msg.message_id == 0 {
                    if msg.is_request {
                        if let Err(e) = callback(&msg.name, &msg.data) {
                            log::warn!("callback failed for fire-and-forget message: {e}");
                        }
                    }
                    return;
                }
                if !msg.is_request {
                    self.queue.clear_message(msg.message_id);
                    return;
                }

                let counter = match self.counter_handle() {
                    Some(c) => c,
                    None => return,
                };
                if counter.mark_read_done(msg.message_tag) {
                    if let Err(e) = callback(&msg.name, &msg.data) {
                        log::warn!("callback rejected message, will redeliver: {e}");
                        counter.mark_read_unused(msg.message_tag);
                        return;
                    }
                }
                self.send_response(msg.message_id, msg.message_tag, &msg.name, msg.is_encrypted);
            }
        }
    }

    fn handle_activation(&self, data: &[u8]) {
        let ready = match ReadyTicket::parse(data) {
            Ok(ready) => ready,
            Err(e) => {
                log::warn!("malformed ready ticket: {e}");
                return;
            }
        };
        if !ready.is_ready {
            return;
        }
        {
            let mut counter = self.counter.lock().expect("counter lock poisoned");
            if counter.is_none() {
                *counter = Some(Arc::new(Counter::new(
                    ready.idx_write,
                    ready.idx_read,
                    ready.mask_read,
                )));
            }
        }
        self.is_activated.store(true, Ordering::SeqCst);
    }

    fn send_response(&self, msg_id: u64, msg_tag: u64, recv_name: &str, is_encrypted: bool) {
        let built = self
            .parser
            .build_message(msg_id, msg_tag, recv_name, &[], is_encrypted, false, true, true, false);
        match built {
            Ok(bytes) => {
                if let Err(e) = self.link.send_message(&bytes) {
                    log::warn!("sending response failed: {e}");
                }
            }
            Err(e) => log::warn!("building response failed: {e}"),
        }
    }
}
