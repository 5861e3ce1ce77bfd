//! Binary to connect to the trade and quote streams and subscribe to one
//! domestic stock for inspecting live data.
//!
//! # Usage
//!
//! ```sh
//! export HANA_WS_BASE_URL="ws://localhost:8080"
//! export HANA_STOCK_CODE="005930"
//! cargo run --bin stream_check --features cli
//! ```

use std::env;
use std::time::Duration;

use hana_feed::FeedConfig;
use hana_feed::types::stream::{QuoteTick, TradeTick};
use hana_feed::ws::{StreamConfig, StreamPool, SubscriptionKey};
use tokio::sync::mpsc;
use tokio::time;

enum Event {
    Trade(TradeTick),
    Quote(QuoteTick),
}

#[tokio::main]
async fn main() -> hana_feed::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = FeedConfig::from_env()?;
    let stock_code = env::var("HANA_STOCK_CODE").unwrap_or_else(|_| "005930".to_owned());
    let streams = StreamPool::new(&config, StreamConfig::default())?;

    let (tx, mut rx) = mpsc::unbounded_channel();

    println!("Subscribing to trades and quotes for {stock_code}…");
    let key = SubscriptionKey::stock(stock_code.as_str());
    let trade_tx = tx.clone();
    streams.trade.subscribe(key.clone(), move |tick: &TradeTick| {
        let _ = trade_tx.send(Event::Trade(tick.clone()));
    });
    streams.quote.subscribe(key, move |tick: &QuoteTick| {
        let _ = tx.send(Event::Quote(tick.clone()));
    });

    streams.trade.connect().await?;
    streams.quote.connect().await?;

    println!("Listening for events for 10 seconds…");
    println!("(Note: data only arrives during market hours 09:00-15:30 KST)\n");

    let deadline = time::sleep(Duration::from_secs(10));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => {
                println!("\n10 seconds elapsed, disconnecting…");
                break;
            }
            event = rx.recv() => match event {
                Some(Event::Trade(t)) => println!(
                    "trade {} {} ({} {}%)",
                    t.stock_code, t.current_price, t.price_change, t.change_rate
                ),
                Some(Event::Quote(q)) => println!(
                    "quote {} best bid {:?} best ask {:?}",
                    q.stock_code,
                    q.bid_prices.first(),
                    q.ask_prices.first()
                ),
                None => break,
            }
        }
    }

    streams.disconnect_all();
    println!("Done.");

    Ok(())
}
