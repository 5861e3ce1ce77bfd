//! Generic stream client shared by the five market-data streams.
//!
//! A [`StreamClient<K>`] owns at most one WebSocket connection to the
//! endpoint of its [`StreamKind`]. The connection is created lazily by the
//! first [`connect`](StreamClient::connect) or
//! [`subscribe`](StreamClient::subscribe) and is driven by one background
//! task that:
//!
//! - opens the socket and resolves every pending `connect()`,
//! - sends a subscribe frame for each registered key once the socket is open,
//! - routes inbound text frames to the listeners of their key,
//! - reconnects after an unexpected close with a fixed delay, giving up after
//!   [`StreamConfig::max_reconnect_attempts`] consecutive failures.
//!
//! ```text
//!   subscribe / unsubscribe ──► Registry ──► outbound mpsc ──┐
//!                                  ▲                          ▼
//!   listeners ◄── K::route ◄── driver task ◄──────────── WebSocket
//! ```
//!
//! Clones share the connection. Dropping the last clone stops the driver.
//!
//! # Example
//!
//! ```no_run
//! use hana_feed::ws::{StreamClient, StreamConfig, SubscriptionKey, TradeStream};
//!
//! # #[tokio::main]
//! # async fn main() -> hana_feed::Result<()> {
//! let trades: StreamClient<TradeStream> =
//!     StreamClient::new("ws://localhost:8080/ws/trade", StreamConfig::default());
//!
//! let handle = trades.subscribe(SubscriptionKey::stock("005930"), |tick| {
//!     println!("{} @ {}", tick.stock_code, tick.current_price);
//! });
//! trades.connect().await?;
//!
//! // later
//! trades.unsubscribe(&SubscriptionKey::stock("005930"), Some(&handle));
//! trades.disconnect();
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{Notify, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::config::FeedConfig;
use crate::constants::stream::{MAX_RECONNECT_ATTEMPTS, RECONNECT_DELAY_MS};
use crate::error::{FeedError, Result};
use crate::ws::protocol::{Action, Routed, StreamKind, SubscriptionKey};
use crate::ws::registry::{Listener, Registry, listener};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WriterHalf = SplitSink<Socket, Message>;
type ReaderHalf = SplitStream<Socket>;

// ---------------------------------------------------------------------------
// Connection state
// ---------------------------------------------------------------------------

/// Lifecycle of the underlying socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
    /// `disconnect()` was called and the close frame is on its way.
    Closing,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
        })
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Reconnection settings for a [`StreamClient`].
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Consecutive failed reconnects before the client gives up.
    pub max_reconnect_attempts: u32,
    /// Fixed delay before each reconnect (milliseconds).
    pub reconnect_delay_ms: u64,
    /// Re-send subscribe frames for every registered key after a reconnect.
    /// With `false`, keys stay registered but are only re-sent when a
    /// consumer subscribes to them again.
    pub replay_on_reconnect: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_reconnect_attempts: MAX_RECONNECT_ATTEMPTS,
            reconnect_delay_ms: RECONNECT_DELAY_MS,
            replay_on_reconnect: true,
        }
    }
}

impl StreamConfig {
    /// Set the maximum reconnect attempts. Default: 5.
    pub fn max_reconnect_attempts(mut self, n: u32) -> Self {
        self.max_reconnect_attempts = n;
        self
    }

    /// Set the reconnect delay in milliseconds. Default: 3,000.
    pub fn reconnect_delay_ms(mut self, ms: u64) -> Self {
        self.reconnect_delay_ms = ms;
        self
    }

    /// Enable or disable subscription replay after reconnect. Default: true.
    pub fn replay_on_reconnect(mut self, enable: bool) -> Self {
        self.replay_on_reconnect = enable;
        self
    }
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

struct Driver {
    cancel: CancellationToken,
    _task: JoinHandle<()>,
}

struct Shared<P> {
    state: ConnectionState,
    registry: Registry<P>,
    /// Frames for the open socket; `None` unless `state == Open`.
    outbound: Option<mpsc::UnboundedSender<Message>>,
    waiters: Vec<oneshot::Sender<Result<()>>>,
    driver: Option<Driver>,
    reconnect_attempts: u32,
}

struct Inner<K: StreamKind> {
    url: String,
    config: StreamConfig,
    /// Parent of every driver token; cancelled when the last client drops.
    root: CancellationToken,
    shared: Mutex<Shared<K::Payload>>,
    /// Cuts a reconnect back-off short for a pending `connect()`.
    wake: Notify,
    _kind: PhantomData<fn() -> K>,
}

// ---------------------------------------------------------------------------
// StreamClient
// ---------------------------------------------------------------------------

/// One lazily connected, auto-reconnecting WebSocket stream.
///
/// See the [module docs](self) for the lifecycle.
pub struct StreamClient<K: StreamKind> {
    inner: Arc<Inner<K>>,
    _guard: Arc<DropGuard>,
}

impl<K: StreamKind> Clone for StreamClient<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _guard: Arc::clone(&self._guard),
        }
    }
}

impl<K: StreamKind> fmt::Debug for StreamClient<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.inner.lock();
        f.debug_struct("StreamClient")
            .field("stream", &K::NAME)
            .field("url", &self.inner.url)
            .field("state", &shared.state)
            .field("keys", &shared.registry.len())
            .finish()
    }
}

impl<K: StreamKind> StreamClient<K> {
    /// Create a client for a full WebSocket URL. Nothing connects until
    /// [`connect`](Self::connect) or [`subscribe`](Self::subscribe).
    pub fn new(url: impl Into<String>, config: StreamConfig) -> Self {
        let root = CancellationToken::new();
        let inner = Inner {
            url: url.into(),
            config,
            root: root.clone(),
            shared: Mutex::new(Shared {
                state: ConnectionState::Disconnected,
                registry: Registry::new(K::DISPATCH),
                outbound: None,
                waiters: Vec::new(),
                driver: None,
                reconnect_attempts: 0,
            }),
            wake: Notify::new(),
            _kind: PhantomData,
        };
        Self {
            inner: Arc::new(inner),
            _guard: Arc::new(root.drop_guard()),
        }
    }

    /// Create a client for this stream's endpoint under the configured
    /// WebSocket base URL.
    pub fn from_config(config: &FeedConfig, stream: StreamConfig) -> Result<Self> {
        Ok(Self::new(config.ws_url(K::PATH)?, stream))
    }

    /// Open the connection, or join the attempt already in flight.
    ///
    /// Resolves immediately when the socket is already open. Concurrent
    /// callers share one socket.
    ///
    /// # Errors
    ///
    /// [`FeedError::Connect`] when the attempt fails (the client keeps
    /// retrying in the background), [`FeedError::Disconnected`] when
    /// [`disconnect`](Self::disconnect) is called first.
    pub async fn connect(&self) -> Result<()> {
        let rx = {
            let mut shared = self.inner.lock();
            if shared.state == ConnectionState::Open {
                return Ok(());
            }
            let (tx, rx) = oneshot::channel();
            shared.waiters.push(tx);
            self.inner.ensure_driver(&mut shared, true);
            rx
        };
        rx.await.unwrap_or(Err(FeedError::Disconnected))
    }

    /// Register `f` for frames routed to `key` and return its handle.
    ///
    /// The subscribe frame goes out at once when the socket is open and the
    /// key is not already subscribed; otherwise the connection is started and
    /// the frame is sent once it opens.
    pub fn subscribe<F>(&self, key: SubscriptionKey, f: F) -> Listener<K::Payload>
    where
        F: Fn(&K::Payload) + Send + Sync + 'static,
    {
        let handle = listener(f);
        self.subscribe_listener(key, Arc::clone(&handle));
        handle
    }

    /// Register an existing listener handle under `key`. Registering the same
    /// handle twice is a no-op.
    pub fn subscribe_listener(&self, key: SubscriptionKey, listener: Listener<K::Payload>) {
        let mut guard = self.inner.lock();
        let shared = &mut *guard;
        shared.registry.insert(key.clone(), listener);

        if shared.state != ConnectionState::Open {
            shared.registry.mark_pending(&key);
            self.inner.ensure_driver(shared, false);
            return;
        }
        if !shared.registry.is_live(&key) {
            if let Some(tx) = &shared.outbound {
                send_control::<K>(tx, &key, Action::Subscribe);
            }
            shared.registry.mark_live(&key);
        }
    }

    /// Remove one listener (`Some`) or every listener (`None`) for `key`.
    ///
    /// An unsubscribe frame is sent only when the key loses its last listener
    /// and its subscription is live. Unknown keys are ignored.
    pub fn unsubscribe(&self, key: &SubscriptionKey, listener: Option<&Listener<K::Payload>>) {
        let mut guard = self.inner.lock();
        let shared = &mut *guard;
        let Some(was_live) = shared.registry.remove(key, listener) else {
            return;
        };
        if was_live && shared.state == ConnectionState::Open {
            if let Some(tx) = &shared.outbound {
                send_control::<K>(tx, key, Action::Unsubscribe);
            }
        }
    }

    /// Close the socket, stop reconnecting and drop every listener.
    ///
    /// Pending `connect()` calls fail with [`FeedError::Disconnected`].
    /// Frames still in flight are dropped.
    pub fn disconnect(&self) {
        let mut guard = self.inner.lock();
        let shared = &mut *guard;
        if let Some(driver) = shared.driver.take() {
            driver.cancel.cancel();
        }
        shared.state = if shared.state == ConnectionState::Open {
            ConnectionState::Closing
        } else {
            ConnectionState::Disconnected
        };
        shared.outbound = None;
        shared.reconnect_attempts = 0;
        shared.registry.drain();
        for waiter in shared.waiters.drain(..) {
            let _ = waiter.send(Err(FeedError::Disconnected));
        }
        tracing::info!(stream = K::NAME, "Stream disconnected");
    }

    /// Whether the socket is open.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.inner.lock().state
    }

    /// Number of keys with at least one listener.
    pub fn subscription_count(&self) -> usize {
        self.inner.lock().registry.len()
    }

    /// The endpoint URL.
    pub fn url(&self) -> &str {
        &self.inner.url
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

impl<K: StreamKind> Inner<K> {
    fn lock(&self) -> MutexGuard<'_, Shared<K::Payload>> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start the driver task if none is running. With `wake`, a driver
    /// waiting out a reconnect delay retries at once.
    fn ensure_driver(self: &Arc<Self>, shared: &mut Shared<K::Payload>, wake: bool) {
        if shared.driver.is_some() {
            if wake && shared.state == ConnectionState::Disconnected {
                // no stored permit: only a driver already in back-off wakes
                self.wake.notify_waiters();
            }
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(
                stream = K::NAME,
                "No Tokio runtime; connection deferred until connect()"
            );
            return;
        };

        let cancel = self.root.child_token();
        shared.state = ConnectionState::Connecting;
        shared.reconnect_attempts = 0;
        let task = handle.spawn(Arc::clone(self).run(cancel.clone()));
        shared.driver = Some(Driver {
            cancel,
            _task: task,
        });
    }

    /// Connect, pump, reconnect. Every state change happens under the lock
    /// and only while `cancel` is live, so a driver replaced by
    /// `disconnect()` never touches the next session.
    async fn run(self: Arc<Self>, cancel: CancellationToken) {
        loop {
            // registered before the state can turn Disconnected
            let woken = self.wake.notified();
            tokio::pin!(woken);
            {
                let mut shared = self.lock();
                if cancel.is_cancelled() {
                    return;
                }
                shared.state = ConnectionState::Connecting;
            }
            tracing::info!(stream = K::NAME, url = %self.url, "Connecting");

            let attempt = tokio::select! {
                _ = cancel.cancelled() => return,
                res = connect_async(self.url.as_str()) => res,
            };

            match attempt {
                Ok((socket, _resp)) => {
                    let (write, read) = socket.split();
                    let (tx, rx) = mpsc::unbounded_channel();
                    if !self.on_open(&cancel, tx) {
                        return;
                    }
                    tracing::info!(stream = K::NAME, "WebSocket connected");

                    if self.pump(&cancel, write, read, rx).await {
                        return;
                    }

                    let mut shared = self.lock();
                    if cancel.is_cancelled() {
                        return;
                    }
                    shared.outbound = None;
                    shared.registry.mark_all_stale();
                    shared.state = ConnectionState::Disconnected;
                }
                Err(e) => {
                    tracing::warn!(stream = K::NAME, error = %e, "Connection attempt failed");
                    let mut shared = self.lock();
                    if cancel.is_cancelled() {
                        return;
                    }
                    shared.state = ConnectionState::Disconnected;
                    let reason = e.to_string();
                    for waiter in shared.waiters.drain(..) {
                        let _ = waiter.send(Err(FeedError::Connect(reason.clone())));
                    }
                }
            }

            let Some(delay) = self.next_backoff(&cancel) else {
                return;
            };
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
                _ = &mut woken => {}
            }
        }
    }

    /// Mark the socket open, queue the subscribe frames it owes and resolve
    /// waiters. Returns `false` if the driver was cancelled meanwhile.
    fn on_open(&self, cancel: &CancellationToken, tx: mpsc::UnboundedSender<Message>) -> bool {
        let mut guard = self.lock();
        let shared = &mut *guard;
        if cancel.is_cancelled() {
            return false;
        }
        shared.state = ConnectionState::Open;
        shared.reconnect_attempts = 0;

        let keys = shared.registry.keys_to_send(self.config.replay_on_reconnect);
        for key in &keys {
            send_control::<K>(&tx, key, Action::Subscribe);
            shared.registry.mark_live(key);
        }
        if !keys.is_empty() {
            tracing::debug!(stream = K::NAME, count = keys.len(), "Subscribed pending keys");
        }

        shared.outbound = Some(tx);
        for waiter in shared.waiters.drain(..) {
            let _ = waiter.send(Ok(()));
        }
        true
    }

    /// Delay before the next attempt, or `None` when the client gives up.
    fn next_backoff(&self, cancel: &CancellationToken) -> Option<Duration> {
        let mut shared = self.lock();
        if cancel.is_cancelled() {
            return None;
        }
        if shared.reconnect_attempts >= self.config.max_reconnect_attempts {
            if shared.waiters.is_empty() {
                tracing::error!(
                    stream = K::NAME,
                    attempts = shared.reconnect_attempts,
                    "Reconnect attempts exhausted; giving up"
                );
                shared.driver = None;
                return None;
            }
            // a connect() arrived while the last attempt was failing
            shared.reconnect_attempts = 0;
        }
        shared.reconnect_attempts += 1;
        tracing::info!(
            stream = K::NAME,
            attempt = shared.reconnect_attempts,
            delay_ms = self.config.reconnect_delay_ms,
            "Reconnecting"
        );
        Some(Duration::from_millis(self.config.reconnect_delay_ms))
    }

    /// Shuttle frames until the socket closes. Returns `true` when stopped by
    /// cancellation.
    async fn pump(
        &self,
        cancel: &CancellationToken,
        mut write: WriterHalf,
        mut read: ReaderHalf,
        mut outbound: mpsc::UnboundedReceiver<Message>,
    ) -> bool {
        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    let _ = write.send(Message::Close(None)).await;
                    let mut shared = self.lock();
                    if shared.state == ConnectionState::Closing {
                        shared.state = ConnectionState::Disconnected;
                    }
                    return true;
                }
                Some(msg) = outbound.recv() => {
                    if let Err(e) = write.send(msg).await {
                        tracing::warn!(stream = K::NAME, error = %e, "WebSocket write failed");
                        return false;
                    }
                }
                frame = read.next() => match frame {
                    Some(Ok(Message::Text(text))) => self.dispatch(cancel, text.as_str()),
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!(stream = K::NAME, "WebSocket closed by server");
                        return false;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(stream = K::NAME, error = %e, "WebSocket error");
                        return false;
                    }
                    None => {
                        tracing::info!(stream = K::NAME, "WebSocket stream ended");
                        return false;
                    }
                },
            }
        }
    }

    /// Route one text frame and call the listeners of its key, unlocked.
    fn dispatch(&self, cancel: &CancellationToken, text: &str) {
        let (key, payload) = match K::route(text) {
            Ok(Routed::Data { key, payload }) => (key, payload),
            Ok(Routed::Control) => {
                tracing::debug!(stream = K::NAME, "Control acknowledgement");
                return;
            }
            Ok(Routed::Ignored) => {
                tracing::trace!(stream = K::NAME, frame = text, "Ignoring frame");
                return;
            }
            Err(e) => {
                tracing::trace!(stream = K::NAME, error = %e, "Dropping malformed frame");
                return;
            }
        };

        let listeners = {
            let shared = self.lock();
            if cancel.is_cancelled() {
                return;
            }
            shared.registry.listeners_for(&key)
        };
        for listener in &listeners {
            listener(&payload);
        }
    }
}

/// Queue a control frame for `key`. Gold keys have none.
fn send_control<K: StreamKind>(
    tx: &mpsc::UnboundedSender<Message>,
    key: &SubscriptionKey,
    action: Action,
) {
    let Some(frame) = key.control_frame(action) else {
        return;
    };
    match serde_json::to_string(&frame) {
        Ok(json) => {
            tracing::debug!(stream = K::NAME, %key, ?action, "Sending control frame");
            let _ = tx.send(Message::Text(json.into()));
        }
        Err(e) => {
            tracing::warn!(stream = K::NAME, %key, error = %e, "Failed to encode control frame");
        }
    }
}
