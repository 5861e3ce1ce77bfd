//! Stream client behaviour against an in-process WebSocket server.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{MockServer, eventually, trade_frame};
use hana_feed::FeedError;
use hana_feed::types::stream::{GoldTradeTick, TradeTick};
use hana_feed::ws::{
    ConnectionState, GoldTradeStream, StreamClient, StreamConfig, SubscriptionKey, TradeStream,
};
use serde_json::json;

fn fast() -> StreamConfig {
    StreamConfig::default()
        .max_reconnect_attempts(2)
        .reconnect_delay_ms(20)
}

fn trade_client(server: &MockServer) -> StreamClient<TradeStream> {
    StreamClient::new(server.url("/ws/trade"), fast())
}

fn counter() -> (Arc<AtomicUsize>, impl Fn(&TradeTick) + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&count);
    (count, move |_: &TradeTick| {
        seen.fetch_add(1, Ordering::SeqCst);
    })
}

#[tokio::test]
async fn subscribe_before_connect_sends_one_frame() {
    let mut server = MockServer::start().await;
    let client = trade_client(&server);
    let key = SubscriptionKey::stock("005930");

    client.subscribe(key.clone(), |_| {});
    client.connect().await.unwrap();
    assert_eq!(
        server.next_frame().await,
        json!({"action": "subscribe", "stockCode": "005930"})
    );

    // second listener on a live key adds no frame
    client.subscribe(key, |_| {});
    server.assert_silent().await;
    assert_eq!(client.subscription_count(), 1);
}

#[tokio::test]
async fn concurrent_connects_share_one_socket() {
    let server = MockServer::start().await;
    let client = trade_client(&server);

    let (a, b, c) = tokio::join!(client.connect(), client.connect(), client.connect());
    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    assert!(client.is_connected());
    assert_eq!(server.accepts(), 1);

    client.connect().await.unwrap();
    assert_eq!(server.accepts(), 1);
}

#[tokio::test]
async fn fan_out_survives_partial_unsubscribe() {
    let mut server = MockServer::start().await;
    let client = trade_client(&server);
    let key = SubscriptionKey::stock("005930");

    let (count_a, on_a) = counter();
    let (count_b, on_b) = counter();
    let handle_a = client.subscribe(key.clone(), on_a);
    client.subscribe(key.clone(), on_b);
    client.connect().await.unwrap();
    server.next_frame().await;

    server.push(trade_frame("005930", "71200"));
    eventually(|| count_a.load(Ordering::SeqCst) == 1 && count_b.load(Ordering::SeqCst) == 1).await;

    client.unsubscribe(&key, Some(&handle_a));
    server.assert_silent().await;

    server.push(trade_frame("005930", "71300"));
    eventually(|| count_b.load(Ordering::SeqCst) == 2).await;
    assert_eq!(count_a.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn last_listener_leaving_sends_unsubscribe() {
    let mut server = MockServer::start().await;
    let client = trade_client(&server);
    let key = SubscriptionKey::stock("000660");

    let handle = client.subscribe(key.clone(), |_| {});
    client.connect().await.unwrap();
    server.next_frame().await;

    client.unsubscribe(&key, Some(&handle));
    assert_eq!(
        server.next_frame().await,
        json!({"action": "unsubscribe", "stockCode": "000660"})
    );
    assert_eq!(client.subscription_count(), 0);
}

#[tokio::test]
async fn frames_reach_only_their_key() {
    let mut server = MockServer::start().await;
    let client = trade_client(&server);

    let samsung = Arc::new(Mutex::new(Vec::new()));
    let hynix = Arc::new(AtomicUsize::new(0));
    {
        let samsung = Arc::clone(&samsung);
        client.subscribe(SubscriptionKey::stock("005930"), move |tick: &TradeTick| {
            samsung.lock().unwrap().push(tick.stock_code.clone());
        });
        let hynix = Arc::clone(&hynix);
        client.subscribe(SubscriptionKey::stock("000660"), move |_: &TradeTick| {
            hynix.fetch_add(1, Ordering::SeqCst);
        });
    }
    client.connect().await.unwrap();
    server.next_frame().await;
    server.next_frame().await;

    server.push(trade_frame("000660", "120000"));
    server.push(trade_frame("035720", "41000"));
    server.push(trade_frame("005930", "71200"));
    eventually(|| !samsung.lock().unwrap().is_empty()).await;

    assert_eq!(*samsung.lock().unwrap(), ["005930"]);
    assert_eq!(hynix.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn malformed_frames_are_dropped() {
    let mut server = MockServer::start().await;
    let client = trade_client(&server);
    let (count, on_tick) = counter();
    client.subscribe(SubscriptionKey::stock("005930"), on_tick);
    client.connect().await.unwrap();
    server.next_frame().await;

    server.push("not json");
    server.push(r#"{"type":"trade"}"#);
    server.push(r#"{"type":"trade","data":{"stockCode":5930}}"#);
    server.push(r#"{"type":"subscribe","stockCode":"005930"}"#);
    server.push(r#"{"type":"quote","data":{"stockCode":"005930"}}"#);
    server.push(trade_frame("005930", "71200"));

    eventually(|| count.load(Ordering::SeqCst) == 1).await;
    assert!(client.is_connected());
    assert_eq!(server.accepts(), 1);
}

#[tokio::test]
async fn gold_slot_belongs_to_the_last_subscriber() {
    let mut server = MockServer::start().await;
    let client: StreamClient<GoldTradeStream> =
        StreamClient::new(server.url("/ws/gold-trade"), fast());

    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));
    let first_handle = {
        let first = Arc::clone(&first);
        client.subscribe(SubscriptionKey::Gold, move |_: &GoldTradeTick| {
            first.fetch_add(1, Ordering::SeqCst);
        })
    };
    {
        let second = Arc::clone(&second);
        client.subscribe(SubscriptionKey::Gold, move |_: &GoldTradeTick| {
            second.fetch_add(1, Ordering::SeqCst);
        });
    }
    client.connect().await.unwrap();
    // gold streams push everything; no control frames
    server.assert_silent().await;

    // the displaced handle no longer owns the slot
    client.unsubscribe(&SubscriptionKey::Gold, Some(&first_handle));
    assert_eq!(client.subscription_count(), 1);

    server.push(
        json!({"productCode": "M04020000", "price": 131500.0, "changeAmount": 500.0, "changeRate": 0.38})
            .to_string(),
    );
    eventually(|| second.load(Ordering::SeqCst) == 1).await;
    assert_eq!(first.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_unsubscribe_sends_nothing() {
    let mut server = MockServer::start().await;
    let client = trade_client(&server);
    client.connect().await.unwrap();

    client.unsubscribe(&SubscriptionKey::stock("999999"), None);
    client.subscribe(SubscriptionKey::stock("005930"), |_| {});

    assert_eq!(
        server.next_frame().await,
        json!({"action": "subscribe", "stockCode": "005930"})
    );
}

#[tokio::test]
async fn subscriptions_are_replayed_after_server_close() {
    let mut server = MockServer::start().await;
    let client = trade_client(&server);
    let (count, on_tick) = counter();
    client.subscribe(SubscriptionKey::stock("005930"), on_tick);
    client.connect().await.unwrap();
    server.next_frame().await;

    server.kick();
    assert_eq!(
        server.next_frame().await,
        json!({"action": "subscribe", "stockCode": "005930"})
    );
    assert_eq!(server.accepts(), 2);

    server.push(trade_frame("005930", "71200"));
    eventually(|| count.load(Ordering::SeqCst) == 1).await;
}

#[tokio::test]
async fn reconnects_stop_after_the_configured_attempts() {
    let server = MockServer::refusing().await;
    let client = trade_client(&server);

    let err = client.connect().await.unwrap_err();
    assert!(matches!(err, FeedError::Connect(_)), "got {err:?}");

    // initial attempt plus two retries
    eventually(|| server.accepts() == 3).await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(server.accepts(), 3);
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn disconnect_drops_listeners_and_closes() {
    let mut server = MockServer::start().await;
    let client = trade_client(&server);
    client.subscribe(SubscriptionKey::stock("005930"), |_| {});
    client.connect().await.unwrap();
    server.next_frame().await;

    client.disconnect();
    assert_eq!(client.subscription_count(), 0);
    eventually(|| client.state() == ConnectionState::Disconnected).await;

    // a later connect opens a fresh socket with nothing to replay
    client.connect().await.unwrap();
    assert_eq!(server.accepts(), 2);
    server.assert_silent().await;
}

fn no_replay(delay_ms: u64) -> StreamConfig {
    StreamConfig::default()
        .max_reconnect_attempts(2)
        .reconnect_delay_ms(delay_ms)
        .replay_on_reconnect(false)
}

#[tokio::test]
async fn without_replay_stale_keys_stay_quiet() {
    let mut server = MockServer::start().await;
    let client: StreamClient<TradeStream> =
        StreamClient::new(server.url("/ws/trade"), no_replay(50));
    client.subscribe(SubscriptionKey::stock("005930"), |_| {});
    client.connect().await.unwrap();
    server.next_frame().await;

    server.kick();
    eventually(|| server.accepts() == 2 && client.is_connected()).await;
    server.assert_silent().await;
    assert_eq!(client.subscription_count(), 1);
}

#[tokio::test]
async fn without_replay_subscribing_while_down_is_sent_on_reopen() {
    let mut server = MockServer::start().await;
    let client: StreamClient<TradeStream> =
        StreamClient::new(server.url("/ws/trade"), no_replay(300));
    let key = SubscriptionKey::stock("005930");
    client.subscribe(key.clone(), |_| {});
    client.connect().await.unwrap();
    server.next_frame().await;

    server.kick();
    eventually(|| !client.is_connected()).await;
    let (count, on_tick) = counter();
    client.subscribe(key, on_tick);

    eventually(|| client.is_connected()).await;
    assert_eq!(
        server.next_frame().await,
        json!({"action": "subscribe", "stockCode": "005930"})
    );
    server.assert_silent().await;

    server.push(trade_frame("005930", "71200"));
    eventually(|| count.load(Ordering::SeqCst) == 1).await;
}

#[tokio::test]
async fn only_connect_cuts_the_reconnect_delay_short() {
    let mut server = MockServer::start().await;
    let client: StreamClient<TradeStream> = StreamClient::new(
        server.url("/ws/trade"),
        StreamConfig::default().reconnect_delay_ms(5_000),
    );
    client.subscribe(SubscriptionKey::stock("005930"), |_| {});
    client.connect().await.unwrap();
    server.next_frame().await;

    server.kick();
    eventually(|| !client.is_connected()).await;

    // a subscribe during back-off waits for the delay
    client.subscribe(SubscriptionKey::stock("000660"), |_| {});
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(server.accepts(), 1);

    tokio::time::timeout(Duration::from_secs(2), client.connect())
        .await
        .expect("connect should retry at once")
        .unwrap();
    assert_eq!(server.accepts(), 2);
}
