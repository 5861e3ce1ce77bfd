//! Chart view model and the transforms that build it from REST snapshots.
//!
//! Every snapshot, whatever its market, becomes a [`ChartViewModel`] with
//! candles ordered oldest first. Live ticks only ever touch the three price
//! fields, through [`PriceOverlay`].

use chrono::{NaiveDate, NaiveTime};

use crate::types::PriceDirection;
use crate::types::chart::{
    ForeignIntradayChartResponse, ForeignPeriodChartResponse, GoldChartResponse,
    GoldCurrentPrice, IntradayChartResponse, PeriodChartResponse,
};

// ---------------------------------------------------------------------------
// View model
// ---------------------------------------------------------------------------

/// One OHLCV candle.
#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    /// `YYYY-MM-DD`.
    pub date: String,
    /// `HH:MM:SS` for intraday candles.
    pub time: Option<String>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Change versus the previous period (domestic period charts).
    pub change: Option<f64>,
    /// Domestic change-sign code (`1`..`5`).
    pub change_sign: Option<String>,
}

/// One volume bar, coloured by the direction of its candle.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeBar {
    /// `YYYY-MM-DD`, or `YYYY-MM-DD HH:MM` for intraday bars.
    pub date: String,
    pub volume: f64,
    pub price_change: f64,
    pub direction: PriceDirection,
}

impl VolumeBar {
    /// Bar colour.
    pub fn color(&self) -> &'static str {
        self.direction.color()
    }
}

/// Chart data for one instrument and period, ready to render.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartViewModel {
    pub code: String,
    pub name: String,
    pub current_price: f64,
    pub price_change: f64,
    /// Change rate as sent by the backend (e.g. `"1.25"`).
    pub change_percent: String,
    pub total_shares: f64,
    pub candles: Vec<Candle>,
    pub volumes: Vec<VolumeBar>,
}

/// Latest live price fields. `None` fields leave the snapshot value alone.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceOverlay {
    pub current_price: Option<f64>,
    pub price_change: Option<f64>,
    pub change_percent: Option<String>,
}

impl PriceOverlay {
    /// Take every field `newer` carries.
    pub fn merge(&mut self, newer: PriceOverlay) {
        if newer.current_price.is_some() {
            self.current_price = newer.current_price;
        }
        if newer.price_change.is_some() {
            self.price_change = newer.price_change;
        }
        if newer.change_percent.is_some() {
            self.change_percent = newer.change_percent;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.current_price.is_none() && self.price_change.is_none() && self.change_percent.is_none()
    }
}

impl ChartViewModel {
    /// Overwrite the price fields with the overlay. Candles and volumes are
    /// untouched. Returns whether anything changed.
    pub fn apply_overlay(&mut self, overlay: &PriceOverlay) -> bool {
        let mut changed = false;
        if let Some(price) = overlay.current_price {
            changed |= self.current_price != price;
            self.current_price = price;
        }
        if let Some(change) = overlay.price_change {
            changed |= self.price_change != change;
            self.price_change = change;
        }
        if let Some(percent) = &overlay.change_percent {
            changed |= &self.change_percent != percent;
            self.change_percent.clone_from(percent);
        }
        changed
    }

    // -----------------------------------------------------------------------
    // Domestic
    // -----------------------------------------------------------------------

    /// Build from a domestic intraday snapshot (rows arrive newest first).
    pub fn from_intraday(resp: &IntradayChartResponse) -> Self {
        let rows = resp.chart_data.iter().rev();
        let candles = rows
            .clone()
            .map(|item| Candle {
                date: dashed_date(&item.date),
                time: Some(colon_time(&item.time)),
                open: num(&item.open),
                high: num(&item.high),
                low: num(&item.low),
                close: num(&item.close),
                volume: num(&item.volume),
                change: None,
                change_sign: None,
            })
            .collect();
        let volumes = rows
            .map(|item| {
                let price_change = num(&item.close) - num(&item.open);
                VolumeBar {
                    date: format!("{} {}", dashed_date(&item.date), short_time(&item.time)),
                    volume: num(&item.volume),
                    price_change,
                    direction: PriceDirection::of_change(price_change),
                }
            })
            .collect();

        Self {
            code: resp.stock_code.clone(),
            name: resp.stock_name.clone(),
            current_price: num(&resp.current_price),
            price_change: num(&resp.change_price),
            change_percent: resp.change_rate.clone(),
            total_shares: num(&resp.total_shares),
            candles,
            volumes,
        }
    }

    /// Build from a domestic period snapshot (rows arrive newest first).
    pub fn from_period(resp: &PeriodChartResponse) -> Self {
        let rows = resp.chart_data.iter().rev();
        let candles = rows
            .clone()
            .map(|item| Candle {
                date: dashed_date(&item.date),
                time: None,
                open: num(&item.open),
                high: num(&item.high),
                low: num(&item.low),
                close: num(&item.close),
                volume: num(&item.volume),
                change: Some(num(&item.change_price)),
                change_sign: Some(item.change_sign.clone()),
            })
            .collect();
        let volumes = rows
            .map(|item| VolumeBar {
                date: dashed_date(&item.date),
                volume: num(&item.volume),
                price_change: num(&item.change_price),
                direction: PriceDirection::from_sign_code(&item.change_sign),
            })
            .collect();

        Self {
            code: resp.stock_code.clone(),
            name: resp.stock_name.clone(),
            current_price: num(&resp.current_price),
            price_change: num(&resp.change_price),
            change_percent: resp.change_rate.clone(),
            total_shares: num(&resp.total_shares),
            candles,
            volumes,
        }
    }

    // -----------------------------------------------------------------------
    // Foreign
    // -----------------------------------------------------------------------

    /// Build from a foreign minute snapshot (rows arrive newest first).
    /// The price summary comes from the two most recent candles.
    pub fn from_foreign_intraday(resp: &ForeignIntradayChartResponse, stock_code: &str) -> Self {
        let candles: Vec<Candle> = resp
            .chart_data
            .iter()
            .rev()
            .map(|item| Candle {
                date: dashed_date(&item.kymd),
                time: Some(colon_time(&item.khms)),
                open: num(&item.open),
                high: num(&item.high),
                low: num(&item.low),
                close: num(&item.last),
                volume: num(&item.evol),
                change: None,
                change_sign: None,
            })
            .collect();
        let volumes = candles
            .iter()
            .map(|c| VolumeBar {
                date: format!(
                    "{} {}",
                    c.date,
                    c.time
                        .as_deref()
                        .map(|t| t.get(..5).unwrap_or(t))
                        .unwrap_or_default()
                ),
                volume: c.volume,
                price_change: c.close - c.open,
                direction: PriceDirection::of_change(c.close - c.open),
            })
            .collect();
        Self::foreign(&resp.rsym, stock_code, candles, volumes)
    }

    /// Build from a foreign period snapshot (rows arrive newest first).
    pub fn from_foreign_period(resp: &ForeignPeriodChartResponse, stock_code: &str) -> Self {
        let candles: Vec<Candle> = resp
            .chart_data
            .iter()
            .rev()
            .map(|item| Candle {
                date: dashed_date(&item.xymd),
                time: None,
                open: num(&item.open),
                high: num(&item.high),
                low: num(&item.low),
                close: num(&item.clos),
                volume: num(&item.tvol),
                change: None,
                change_sign: None,
            })
            .collect();
        let volumes = candles
            .iter()
            .map(|c| VolumeBar {
                date: c.date.clone(),
                volume: c.volume,
                price_change: c.close - c.open,
                direction: PriceDirection::of_change(c.close - c.open),
            })
            .collect();
        Self::foreign(&resp.rsym, stock_code, candles, volumes)
    }

    fn foreign(rsym: &str, stock_code: &str, candles: Vec<Candle>, volumes: Vec<VolumeBar>) -> Self {
        let label = if rsym.is_empty() { stock_code } else { rsym };
        let (current_price, price_change, change_percent) = match candles.as_slice() {
            [.., prev, last] if prev.close != 0.0 => {
                let change = last.close - prev.close;
                (last.close, change, format!("{:.2}", change / prev.close * 100.0))
            }
            [.., last] => (last.close, 0.0, "0.00".to_owned()),
            [] => (0.0, 0.0, "0.00".to_owned()),
        };
        Self {
            code: label.to_owned(),
            name: label.to_owned(),
            current_price,
            price_change,
            change_percent,
            total_shares: 0.0,
            candles,
            volumes,
        }
    }

    // -----------------------------------------------------------------------
    // Gold
    // -----------------------------------------------------------------------

    /// Build from the gold current price plus a candle series (oldest first).
    pub fn from_gold(price: &GoldCurrentPrice, chart: &GoldChartResponse) -> Self {
        let candles: Vec<Candle> = chart
            .data
            .iter()
            .map(|c| {
                let (date, time) = split_timestamp(&c.timestamp);
                Candle {
                    date,
                    time,
                    open: c.open.unwrap_or_default(),
                    high: c.high.unwrap_or_default(),
                    low: c.low.unwrap_or_default(),
                    close: c.close.unwrap_or_default(),
                    volume: c.volume.unwrap_or_default() as f64,
                    change: None,
                    change_sign: None,
                }
            })
            .collect();
        let volumes = candles
            .iter()
            .map(|c| VolumeBar {
                date: c.date.clone(),
                volume: c.volume,
                price_change: c.close - c.open,
                direction: PriceDirection::of_change(c.close - c.open),
            })
            .collect();

        let name = if price.product_name.is_empty() {
            price.product_code.clone()
        } else {
            price.product_name.clone()
        };
        Self {
            code: price.product_code.clone(),
            name,
            current_price: price.current_price.unwrap_or_default(),
            price_change: price.change_amount.unwrap_or_default(),
            change_percent: format!("{:.2}", price.change_rate.unwrap_or_default()),
            total_shares: 0.0,
            candles,
            volumes,
        }
    }
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

/// Lenient number parse; blanks and garbage read as zero.
fn num(s: &str) -> f64 {
    s.trim().parse().unwrap_or(0.0)
}

/// `20250107` → `2025-01-07`. Unparseable input is returned as is.
fn dashed_date(s: &str) -> String {
    NaiveDate::parse_from_str(s, "%Y%m%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| s.to_owned())
}

/// `093000` → `09:30:00`. Unparseable input is returned as is.
fn colon_time(s: &str) -> String {
    NaiveTime::parse_from_str(s, "%H%M%S")
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|_| s.to_owned())
}

/// `093000` → `09:30`.
fn short_time(s: &str) -> String {
    NaiveTime::parse_from_str(s, "%H%M%S")
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|_| s.to_owned())
}

/// Split a gold timestamp (`YYYYMMDD`, `YYYYMMDDHHMM` or `YYYYMMDDHHMMSS`)
/// into a dashed date and an optional `HH:MM:SS` time.
fn split_timestamp(ts: &str) -> (String, Option<String>) {
    if ts.len() < 8 || !ts.is_char_boundary(8) {
        return (ts.to_owned(), None);
    }
    let (date, rest) = ts.split_at(8);
    let time = match rest.len() {
        4 => Some(colon_time(&format!("{rest}00"))),
        6 => Some(colon_time(rest)),
        _ => None,
    };
    (dashed_date(date), time)
}
