//! Chart snapshot endpoints for domestic, foreign and gold instruments.

use chrono::{Duration, Local, NaiveDate, NaiveTime};

use crate::client::RestClient;
use crate::constants::chart::{DAILY_LOOKBACK, INTRADAY_MINUTE_GAP, LONG_LOOKBACK, gold};
use crate::error::{FeedError, Result};
use crate::types::ChartPeriod;
use crate::types::chart::*;

// ---------------------------------------------------------------------------
// Date helpers
// ---------------------------------------------------------------------------

/// Format a date as `YYYYMMDD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Format a time as `HHMMSS`.
pub fn format_input_time(time: NaiveTime) -> String {
    time.format("%H%M%S").to_string()
}

/// Current local time as `HHMMSS`.
pub fn current_input_time() -> String {
    format_input_time(Local::now().time())
}

/// Calendar days covered by a domestic period chart: 30 days for daily
/// candles, 20 weeks / 20×30 days / 20×365 days for the longer periods.
/// `None` for minute charts, which use the intraday endpoint.
pub fn lookback_days(period: ChartPeriod) -> Option<i64> {
    match period {
        ChartPeriod::Minute => None,
        ChartPeriod::Day => Some(DAILY_LOOKBACK),
        ChartPeriod::Week => Some(LONG_LOOKBACK * 7),
        ChartPeriod::Month => Some(LONG_LOOKBACK * 30),
        ChartPeriod::Year => Some(LONG_LOOKBACK * 365),
    }
}

/// `(start, end)` dates for a period chart ending on `today`.
pub fn period_range(period: ChartPeriod, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let days = lookback_days(period)?;
    Some((today - Duration::days(days), today))
}

/// Gold candle count requested per period.
pub fn gold_count(period: ChartPeriod) -> u32 {
    match period {
        ChartPeriod::Minute => gold::MINUTE_COUNT,
        ChartPeriod::Week => gold::WEEK_COUNT,
        ChartPeriod::Month => gold::MONTH_COUNT,
        ChartPeriod::Day | ChartPeriod::Year => gold::DAY_COUNT,
    }
}

impl RestClient {
    // -----------------------------------------------------------------------
    // Domestic
    // -----------------------------------------------------------------------

    /// Intraday minute candles up to `input_time` (`HHMMSS`).
    ///
    /// **Endpoint:** `GET /api/stock/intraday`
    pub async fn intraday_chart(
        &self,
        stock_code: &str,
        input_time: &str,
    ) -> Result<IntradayChartResponse> {
        self.get(
            "/api/stock/intraday",
            &[("stockCode", stock_code), ("inputTime", input_time)],
        )
        .await
    }

    /// Intraday minute candles up to now.
    pub async fn current_intraday_chart(&self, stock_code: &str) -> Result<IntradayChartResponse> {
        let input_time = current_input_time();
        self.intraday_chart(stock_code, &input_time).await
    }

    /// Period candles between two dates.
    ///
    /// **Endpoint:** `GET /api/stock/period`
    pub async fn period_chart_between(
        &self,
        stock_code: &str,
        start: NaiveDate,
        end: NaiveDate,
        period: ChartPeriod,
    ) -> Result<PeriodChartResponse> {
        if period == ChartPeriod::Minute {
            return Err(FeedError::InvalidArgument(
                "minute candles come from the intraday endpoint".into(),
            ));
        }
        let (start, end) = (format_date(start), format_date(end));
        self.get(
            "/api/stock/period",
            &[
                ("stockCode", stock_code),
                ("startDate", start.as_str()),
                ("endDate", end.as_str()),
                ("periodCode", period.code()),
            ],
        )
        .await
    }

    /// Recent period candles using the default look-back for `period`.
    pub async fn period_chart(
        &self,
        stock_code: &str,
        period: ChartPeriod,
    ) -> Result<PeriodChartResponse> {
        let (start, end) = period_range(period, Local::now().date_naive()).ok_or_else(|| {
            FeedError::InvalidArgument("minute candles come from the intraday endpoint".into())
        })?;
        self.period_chart_between(stock_code, start, end, period)
            .await
    }

    // -----------------------------------------------------------------------
    // Foreign
    // -----------------------------------------------------------------------

    /// Foreign minute candles.
    ///
    /// **Endpoint:** `GET /api/foreign-stock/intraday`
    pub async fn foreign_intraday_chart(
        &self,
        exchange_code: &str,
        stock_code: &str,
        minute_gap: u32,
    ) -> Result<ForeignIntradayChartResponse> {
        let minute_gap = minute_gap.to_string();
        self.get(
            "/api/foreign-stock/intraday",
            &[
                ("exchangeCode", exchange_code),
                ("stockCode", stock_code),
                ("minuteGap", minute_gap.as_str()),
            ],
        )
        .await
    }

    /// Foreign period candles.
    ///
    /// **Endpoint:** `GET /api/foreign-stock/period`
    pub async fn foreign_period_chart(
        &self,
        exchange_code: &str,
        stock_code: &str,
        period: ChartPeriod,
    ) -> Result<ForeignPeriodChartResponse> {
        if period == ChartPeriod::Minute {
            return Err(FeedError::InvalidArgument(
                "minute candles come from the intraday endpoint".into(),
            ));
        }
        self.get(
            "/api/foreign-stock/period",
            &[
                ("exchangeCode", exchange_code),
                ("stockCode", stock_code),
                ("periodCode", period.code()),
            ],
        )
        .await
    }

    /// Foreign minute candles at the default 5-minute width.
    pub async fn foreign_intraday_chart_default(
        &self,
        exchange_code: &str,
        stock_code: &str,
    ) -> Result<ForeignIntradayChartResponse> {
        self.foreign_intraday_chart(exchange_code, stock_code, INTRADAY_MINUTE_GAP)
            .await
    }

    // -----------------------------------------------------------------------
    // Gold
    // -----------------------------------------------------------------------

    /// Current gold price.
    ///
    /// **Endpoint:** `GET /api/gold/current-price`
    pub async fn gold_current_price(&self, product_code: &str) -> Result<GoldCurrentPrice> {
        self.get("/api/gold/current-price", &[("productCode", product_code)])
            .await
    }

    /// Gold minute candles.
    ///
    /// **Endpoint:** `GET /api/gold/chart/minute`
    pub async fn gold_minute_chart(
        &self,
        product_code: &str,
        interval: u32,
        count: u32,
    ) -> Result<GoldChartResponse> {
        let (interval, count) = (interval.to_string(), count.to_string());
        self.get(
            "/api/gold/chart/minute",
            &[
                ("productCode", product_code),
                ("interval", interval.as_str()),
                ("count", count.as_str()),
            ],
        )
        .await
    }

    /// Gold day / week / month candles. `Year` falls back to `day`.
    ///
    /// **Endpoint:** `GET /api/gold/chart/{period}`
    pub async fn gold_period_chart(
        &self,
        product_code: &str,
        period: ChartPeriod,
        count: u32,
    ) -> Result<GoldChartResponse> {
        if period == ChartPeriod::Minute {
            return self
                .gold_minute_chart(product_code, INTRADAY_MINUTE_GAP, count)
                .await;
        }
        let path = format!("/api/gold/chart/{}", period.gold_segment());
        let count = count.to_string();
        self.get(
            &path,
            &[("productCode", product_code), ("count", count.as_str())],
        )
        .await
    }

    /// Gold candles for `period` with the default candle count.
    pub async fn gold_chart(
        &self,
        product_code: &str,
        period: ChartPeriod,
    ) -> Result<GoldChartResponse> {
        self.gold_period_chart(product_code, period, gold_count(period))
            .await
    }
}
