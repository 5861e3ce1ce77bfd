//! Live price ticks turned into [`PriceOverlay`]s.

use std::fmt;
use std::sync::Arc;

use crate::chart::model::PriceOverlay;
use crate::types::{ForeignDataType, Instrument};
use crate::types::stream::{ForeignTick, GoldTradeTick, TradeTick};
use crate::ws::client::StreamClient;
use crate::ws::pool::StreamPool;
use crate::ws::protocol::{
    ForeignStream, GoldTradeStream, StreamKind, SubscriptionKey, TradeStream,
};

/// A stream whose payloads carry a last price for some instrument.
pub trait PriceFeed: StreamKind {
    /// Subscription key for `instrument`, or `None` if this stream does not
    /// carry it.
    fn key_for(instrument: &Instrument) -> Option<SubscriptionKey>;

    /// Price fields from `payload` when it belongs to `instrument`.
    fn overlay(payload: &Self::Payload, instrument: &Instrument) -> Option<PriceOverlay>;
}

impl PriceFeed for TradeStream {
    fn key_for(instrument: &Instrument) -> Option<SubscriptionKey> {
        match instrument {
            Instrument::Domestic { stock_code } => Some(SubscriptionKey::stock(stock_code.as_str())),
            _ => None,
        }
    }

    fn overlay(tick: &TradeTick, instrument: &Instrument) -> Option<PriceOverlay> {
        if tick.stock_code != instrument.code() {
            return None;
        }
        Some(PriceOverlay {
            current_price: tick.price(),
            price_change: tick.change(),
            change_percent: non_blank(&tick.change_rate),
        })
    }
}

impl PriceFeed for ForeignStream {
    fn key_for(instrument: &Instrument) -> Option<SubscriptionKey> {
        match instrument {
            Instrument::Foreign {
                exchange_code,
                stock_code,
            } => Some(SubscriptionKey::foreign(
                exchange_code.as_str(),
                stock_code.as_str(),
                ForeignDataType::Trade,
            )),
            _ => None,
        }
    }

    fn overlay(tick: &ForeignTick, instrument: &Instrument) -> Option<PriceOverlay> {
        if tick.stock_code != instrument.code() {
            return None;
        }
        // "0" is sent when the rate is unknown
        let change_percent = non_blank(&tick.change_rate).filter(|r| r != "0");
        Some(PriceOverlay {
            current_price: tick.price(),
            price_change: None,
            change_percent,
        })
    }
}

impl PriceFeed for GoldTradeStream {
    fn key_for(instrument: &Instrument) -> Option<SubscriptionKey> {
        matches!(instrument, Instrument::Gold { .. }).then_some(SubscriptionKey::Gold)
    }

    fn overlay(tick: &GoldTradeTick, instrument: &Instrument) -> Option<PriceOverlay> {
        // the gold stream pushes every product
        if tick.product_code != instrument.code() {
            return None;
        }
        Some(PriceOverlay {
            current_price: Some(tick.price),
            price_change: Some(tick.change_amount),
            change_percent: Some(tick.change_rate.to_string()),
        })
    }
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_owned())
}

// ---------------------------------------------------------------------------
// Watch handle
// ---------------------------------------------------------------------------

/// A live-price subscription. Dropping it removes the listener.
pub struct PriceWatch {
    key: SubscriptionKey,
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl PriceWatch {
    /// Key the listener is registered under.
    pub fn key(&self) -> &SubscriptionKey {
        &self.key
    }
}

impl fmt::Debug for PriceWatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriceWatch").field("key", &self.key).finish()
    }
}

impl Drop for PriceWatch {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

fn watch<K: PriceFeed>(
    client: &StreamClient<K>,
    instrument: &Instrument,
    on_price: Arc<dyn Fn(PriceOverlay) + Send + Sync>,
) -> Option<PriceWatch> {
    let key = K::key_for(instrument)?;
    let target = instrument.clone();
    let handle = client.subscribe(key.clone(), move |payload: &K::Payload| {
        if let Some(overlay) = K::overlay(payload, &target).filter(|o| !o.is_empty()) {
            on_price(overlay);
        }
    });

    let client = client.clone();
    let release_key = key.clone();
    Some(PriceWatch {
        key,
        release: Some(Box::new(move || {
            client.unsubscribe(&release_key, Some(&handle));
        })),
    })
}

impl StreamPool {
    /// Subscribe to live prices for `instrument` on the matching trade
    /// stream. `on_price` runs on the stream's reader task.
    pub fn watch_price<F>(&self, instrument: &Instrument, on_price: F) -> Option<PriceWatch>
    where
        F: Fn(PriceOverlay) + Send + Sync + 'static,
    {
        let on_price: Arc<dyn Fn(PriceOverlay) + Send + Sync> = Arc::new(on_price);
        match instrument {
            Instrument::Domestic { .. } => watch(&self.trade, instrument, on_price),
            Instrument::Foreign { .. } => watch(&self.foreign, instrument, on_price),
            Instrument::Gold { .. } => watch(&self.gold_trade, instrument, on_price),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{GOLD_1KG, GOLD_100G};

    #[test]
    fn trade_ticks_for_other_codes_are_ignored() {
        let samsung = Instrument::domestic("005930");
        let tick = TradeTick {
            stock_code: "000660".into(),
            current_price: "120000".into(),
            ..Default::default()
        };
        assert!(TradeStream::overlay(&tick, &samsung).is_none());
    }

    #[test]
    fn foreign_zero_rate_is_not_applied() {
        let apple = Instrument::foreign("NAS", "AAPL");
        let tick = ForeignTick {
            stock_code: "AAPL".into(),
            current_price: "189.25".into(),
            change_rate: "0".into(),
            ..Default::default()
        };
        let overlay = ForeignStream::overlay(&tick, &apple).unwrap();
        assert_eq!(overlay.current_price, Some(189.25));
        assert_eq!(overlay.change_percent, None);
    }

    #[test]
    fn gold_overlay_filters_by_product() {
        let gold = Instrument::gold(GOLD_1KG);
        let tick = GoldTradeTick {
            product_code: GOLD_1KG.into(),
            price: 131_500.0,
            quantity: 1,
            change_amount: 500.0,
            change_rate: 0.38,
            volume: 10,
            timestamp: String::new(),
        };
        let overlay = GoldTradeStream::overlay(&tick, &gold).unwrap();
        assert_eq!(overlay.change_percent.as_deref(), Some("0.38"));

        let other = GoldTradeTick {
            product_code: GOLD_100G.into(),
            ..tick
        };
        assert!(GoldTradeStream::overlay(&other, &gold).is_none());
    }

    #[test]
    fn ticks_without_prices_carry_no_overlay() {
        let samsung = Instrument::domestic("005930");
        let tick = TradeTick {
            stock_code: "005930".into(),
            ..Default::default()
        };
        let overlay = TradeStream::overlay(&tick, &samsung).unwrap();
        assert!(overlay.is_empty());
    }

    #[test]
    fn keys_follow_the_instrument_market() {
        assert_eq!(
            TradeStream::key_for(&Instrument::domestic("005930")),
            Some(SubscriptionKey::stock("005930"))
        );
        assert_eq!(TradeStream::key_for(&Instrument::gold(GOLD_1KG)), None);
        assert_eq!(
            GoldTradeStream::key_for(&Instrument::gold(GOLD_100G)),
            Some(SubscriptionKey::Gold)
        );
    }
}
