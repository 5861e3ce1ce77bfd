//! Chart snapshot responses for domestic, foreign and gold instruments.

use serde::Deserialize;

// ---------------------------------------------------------------------------
// Domestic intraday chart
// ---------------------------------------------------------------------------

/// Response of `GET /api/stock/intraday`. Rows are newest first.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntradayChartResponse {
    pub stock_code: String,
    pub stock_name: String,
    pub current_price: String,
    pub change_sign: String,
    pub change_price: String,
    pub change_rate: String,
    pub volume: String,
    pub trading_value: String,
    /// Listed share count.
    pub total_shares: String,
    pub chart_data: Vec<IntradayChartItem>,
    pub timestamp: String,
}

/// One intraday candle.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntradayChartItem {
    /// Business date (YYYYMMDD).
    pub date: String,
    /// Execution time (HHMMSS).
    pub time: String,
    pub close: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub volume: String,
    pub trading_value: String,
}

// ---------------------------------------------------------------------------
// Domestic period chart
// ---------------------------------------------------------------------------

/// Response of `GET /api/stock/period`. Rows are newest first.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PeriodChartResponse {
    pub stock_code: String,
    pub stock_name: String,
    pub current_price: String,
    pub change_sign: String,
    pub change_price: String,
    pub change_rate: String,
    pub volume: String,
    pub trading_value: String,
    pub total_shares: String,
    /// `D`, `W`, `M` or `Y`.
    pub period_type: String,
    pub chart_data: Vec<PeriodChartItem>,
    pub timestamp: String,
}

/// One daily/weekly/monthly/yearly candle.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PeriodChartItem {
    pub date: String,
    pub close: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub volume: String,
    pub trading_value: String,
    /// Sign of the change versus the previous period.
    pub change_sign: String,
    pub change_price: String,
}

// ---------------------------------------------------------------------------
// Foreign charts
// ---------------------------------------------------------------------------

/// Response of `GET /api/foreign-stock/intraday`. Rows are newest first.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForeignIntradayChartResponse {
    /// Real-time symbol (e.g. `DNASAAPL`).
    pub rsym: String,
    pub next: String,
    pub more: String,
    pub chart_data: Vec<ForeignIntradayItem>,
}

/// One foreign minute candle (Korean local date/time).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ForeignIntradayItem {
    pub kymd: String,
    pub khms: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub last: String,
    pub evol: String,
    pub eamt: String,
}

/// Response of `GET /api/foreign-stock/period`. Rows are newest first.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForeignPeriodChartResponse {
    pub rsym: String,
    pub chart_data: Vec<ForeignPeriodItem>,
}

/// One foreign period candle.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ForeignPeriodItem {
    pub xymd: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub clos: String,
    pub tvol: String,
    pub tamt: String,
}

// ---------------------------------------------------------------------------
// Gold
// ---------------------------------------------------------------------------

/// Response of `GET /api/gold/chart/{period}`. Rows are oldest first.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GoldChartResponse {
    pub interval: String,
    pub data: Vec<GoldCandle>,
}

/// One gold candle.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GoldCandle {
    /// `YYYYMMDD`, `YYYYMMDDHHMM` or `YYYYMMDDHHMMSS`.
    pub timestamp: String,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<i64>,
}

/// Response of `GET /api/gold/current-price`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoldCurrentPrice {
    pub product_code: String,
    pub product_name: String,
    pub current_price: Option<f64>,
    pub change_amount: Option<f64>,
    pub change_rate: Option<f64>,
    pub high_price: Option<f64>,
    pub low_price: Option<f64>,
    pub open_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub volume: Option<i64>,
    pub trade_amount: Option<i64>,
    pub timestamp: String,
}
