//! In-process WebSocket server standing in for the market-data backend.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{sleep, timeout};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Pushed through [`MockServer::push`], closes every open connection.
const KICK: &str = "__close__";

pub struct MockServer {
    /// `ws://127.0.0.1:<port>`; any path is accepted.
    pub base_url: String,
    accepts: Arc<AtomicUsize>,
    inbound: mpsc::UnboundedReceiver<String>,
    push: broadcast::Sender<String>,
}

impl MockServer {
    /// Server that completes the handshake and echoes nothing.
    pub async fn start() -> Self {
        Self::spawn(false).await
    }

    /// Server that drops every TCP connection before the handshake.
    pub async fn refusing() -> Self {
        Self::spawn(true).await
    }

    async fn spawn(refuse: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepts = Arc::new(AtomicUsize::new(0));
        let (in_tx, inbound) = mpsc::unbounded_channel();
        let (push, _) = broadcast::channel::<String>(64);

        let counter = Arc::clone(&accepts);
        let server_push = push.clone();
        tokio::spawn(async move {
            while let Ok((tcp, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                if refuse {
                    drop(tcp);
                    continue;
                }
                let in_tx = in_tx.clone();
                let mut frames = server_push.subscribe();
                tokio::spawn(async move {
                    let Ok(ws) = accept_async(tcp).await else {
                        return;
                    };
                    let (mut write, mut read) = ws.split();
                    loop {
                        tokio::select! {
                            msg = read.next() => match msg {
                                Some(Ok(Message::Text(text))) => {
                                    let _ = in_tx.send(text.as_str().to_owned());
                                }
                                Some(Ok(_)) => {}
                                _ => return,
                            },
                            frame = frames.recv() => match frame {
                                Ok(f) if f == KICK => {
                                    let _ = write.send(Message::Close(None)).await;
                                    return;
                                }
                                Ok(f) => {
                                    if write.send(Message::Text(f.into())).await.is_err() {
                                        return;
                                    }
                                }
                                Err(_) => return,
                            },
                        }
                    }
                });
            }
        });

        Self {
            base_url: format!("ws://{addr}"),
            accepts,
            inbound,
            push,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// TCP connections accepted so far.
    pub fn accepts(&self) -> usize {
        self.accepts.load(Ordering::SeqCst)
    }

    /// Send a text frame to every open connection.
    pub fn push(&self, frame: impl Into<String>) {
        let _ = self.push.send(frame.into());
    }

    /// Close every open connection from the server side.
    pub fn kick(&self) {
        self.push(KICK);
    }

    /// Next frame a client sent, as JSON.
    pub async fn next_frame(&mut self) -> Value {
        let text = timeout(Duration::from_secs(2), self.inbound.recv())
            .await
            .expect("no frame from client")
            .expect("server stopped");
        serde_json::from_str(&text).expect("client sent invalid JSON")
    }

    /// Assert the client sends nothing for a short while.
    pub async fn assert_silent(&mut self) {
        if let Ok(Some(text)) = timeout(Duration::from_millis(200), self.inbound.recv()).await {
            panic!("unexpected frame from client: {text}");
        }
    }
}

/// Poll `cond` until it holds, failing after two seconds.
pub async fn eventually(mut cond: impl FnMut() -> bool) {
    timeout(Duration::from_secs(2), async {
        while !cond() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

pub fn trade_frame(stock_code: &str, price: &str) -> String {
    serde_json::json!({
        "type": "trade",
        "data": {
            "stockCode": stock_code,
            "currentPrice": price,
            "priceChange": "500",
            "changeRate": "0.70"
        }
    })
    .to_string()
}
