//! Background feedback listener.
//!
//! Owns the inbound UDP socket. For every datagram: decode, classify,
//! fold into the [`FeedbackStore`], and fan out to any subscribers.
//! Pure reactive ingestion; the loop never waits on anything but the
//! socket. Bind failure is fatal to the caller, but once running no
//! datagram can take the loop down.

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use rosc::{OscMessage, OscPacket};

use crate::classify::{classify, Classified};
use crate::error::Result;
use crate::state::FeedbackStore;

/// Read timeout so the loop can observe the shutdown flag.
const READ_TIMEOUT: Duration = Duration::from_millis(50);

/// One classified feedback message, as delivered to subscribers.
#[derive(Debug, Clone)]
pub struct FeedbackEvent {
    /// Wire address as received.
    pub addr: String,
    /// Classification result (may be [`Classified::Unclassified`]).
    pub classified: Classified,
}

/// Handle to the running listener thread.
pub struct FeedbackListener {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    subscribers: Arc<Mutex<Vec<Sender<FeedbackEvent>>>>,
    local_addr: SocketAddr,
}

impl FeedbackListener {
    /// Bind the feedback socket and start the ingestion thread.
    pub fn bind<A: ToSocketAddrs>(addr: A, store: FeedbackStore) -> Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_read_timeout(Some(READ_TIMEOUT))?;
        let local_addr = socket.local_addr()?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let subscribers: Arc<Mutex<Vec<Sender<FeedbackEvent>>>> = Arc::new(Mutex::new(Vec::new()));

        let thread_shutdown = Arc::clone(&shutdown);
        let thread_subscribers = Arc::clone(&subscribers);
        let handle = thread::spawn(move || {
            run_loop(socket, store, thread_shutdown, thread_subscribers);
        });

        log::info!("[FEEDBACK] listening on {}", local_addr);
        Ok(Self {
            shutdown,
            handle: Some(handle),
            subscribers,
            local_addr,
        })
    }

    /// The bound address (useful when binding port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Subscribe to the classified event stream. Disconnected
    /// receivers are pruned on the next send.
    pub fn subscribe(&self) -> Receiver<FeedbackEvent> {
        let (tx, rx) = unbounded();
        self.subscribers
            .lock()
            .expect("subscriber list lock poisoned")
            .push(tx);
        rx
    }

    /// Stop the loop and join the thread.
    pub fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        log::info!("[FEEDBACK] listener stopped");
    }
}

impl Drop for FeedbackListener {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for FeedbackListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedbackListener")
            .field("local_addr", &self.local_addr)
            .finish_non_exhaustive()
    }
}

fn run_loop(
    socket: UdpSocket,
    store: FeedbackStore,
    shutdown: Arc<AtomicBool>,
    subscribers: Arc<Mutex<Vec<Sender<FeedbackEvent>>>>,
) {
    let mut buf = [0u8; 8192];
    while !shutdown.load(Ordering::Relaxed) {
        match socket.recv(&mut buf) {
            Ok(n) => match rosc::decoder::decode_udp(&buf[..n]) {
                Ok((_, packet)) => handle_packet(&packet, &store, &subscribers),
                Err(e) => log::debug!("[FEEDBACK] undecodable datagram ({} bytes): {}", n, e),
            },
            Err(ref e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(e) => {
                log::warn!("[FEEDBACK] socket error: {}", e);
                break;
            }
        }
    }
}

/// Bundles nest arbitrarily; messages are the leaves.
fn handle_packet(
    packet: &OscPacket,
    store: &FeedbackStore,
    subscribers: &Arc<Mutex<Vec<Sender<FeedbackEvent>>>>,
) {
    match packet {
        OscPacket::Message(msg) => handle_message(msg, store, subscribers),
        OscPacket::Bundle(bundle) => {
            for p in &bundle.content {
                handle_packet(p, store, subscribers);
            }
        }
    }
}

fn handle_message(
    msg: &OscMessage,
    store: &FeedbackStore,
    subscribers: &Arc<Mutex<Vec<Sender<FeedbackEvent>>>>,
) {
    let classified = classify(msg);
    if classified != Classified::Unclassified {
        store.apply(&classified);
    }

    let mut subs = subscribers.lock().expect("subscriber list lock poisoned");
    if !subs.is_empty() {
        let event = FeedbackEvent {
            addr: msg.addr.clone(),
            classified,
        };
        subs.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
