//! Shared enumerations used across stream clients and chart requests.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Instrument
// ---------------------------------------------------------------------------

/// An instrument a chart view can display.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Instrument {
    /// Domestic stock identified by its 6-digit code (e.g. `"005930"`).
    Domestic { stock_code: String },
    /// Foreign stock on an overseas exchange (`NAS`, `NYS`, `HKS`, `TSE`, ...).
    Foreign {
        exchange_code: String,
        stock_code: String,
    },
    /// Gold spot product (e.g. [`GOLD_1KG`](crate::constants::GOLD_1KG)).
    Gold { product_code: String },
}

impl Instrument {
    /// Domestic stock shorthand.
    pub fn domestic(stock_code: impl Into<String>) -> Self {
        Self::Domestic {
            stock_code: stock_code.into(),
        }
    }

    /// Foreign stock shorthand.
    pub fn foreign(exchange_code: impl Into<String>, stock_code: impl Into<String>) -> Self {
        Self::Foreign {
            exchange_code: exchange_code.into(),
            stock_code: stock_code.into(),
        }
    }

    /// Gold product shorthand.
    pub fn gold(product_code: impl Into<String>) -> Self {
        Self::Gold {
            product_code: product_code.into(),
        }
    }

    /// The instrument's own code (stock code or gold product code).
    pub fn code(&self) -> &str {
        match self {
            Self::Domestic { stock_code } | Self::Foreign { stock_code, .. } => stock_code,
            Self::Gold { product_code } => product_code,
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domestic { stock_code } => write!(f, "KRX:{stock_code}"),
            Self::Foreign {
                exchange_code,
                stock_code,
            } => write!(f, "{exchange_code}:{stock_code}"),
            Self::Gold { product_code } => write!(f, "GOLD:{product_code}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Chart period
// ---------------------------------------------------------------------------

/// Candle width selected in a chart view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChartPeriod {
    /// Intraday minute candles.
    Minute,
    /// Daily candles.
    #[default]
    Day,
    /// Weekly candles.
    Week,
    /// Monthly candles.
    Month,
    /// Yearly candles (not offered for gold).
    Year,
}

impl ChartPeriod {
    /// Map a period tab label (`분`, `일`, `주`, `월`, `년`) to a period.
    /// Unknown labels fall back to [`ChartPeriod::Day`].
    pub fn from_label(label: &str) -> Self {
        match label {
            "분" => Self::Minute,
            "일" => Self::Day,
            "주" => Self::Week,
            "월" => Self::Month,
            "년" => Self::Year,
            _ => Self::Day,
        }
    }

    /// API period code (`MIN`, `D`, `W`, `M`, `Y`).
    pub fn code(self) -> &'static str {
        match self {
            Self::Minute => "MIN",
            Self::Day => "D",
            Self::Week => "W",
            Self::Month => "M",
            Self::Year => "Y",
        }
    }

    /// Path segment used by the gold chart endpoints. Gold has no yearly
    /// chart; `Year` maps to `day`.
    pub fn gold_segment(self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Week => "week",
            Self::Month => "month",
            Self::Day | Self::Year => "day",
        }
    }
}

impl fmt::Display for ChartPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ---------------------------------------------------------------------------
// Foreign stream data type
// ---------------------------------------------------------------------------

/// Data carried by a foreign-stock subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForeignDataType {
    /// Real-time executions.
    Trade,
    /// Real-time best bid/ask.
    Quote,
}

impl ForeignDataType {
    /// Wire name (`"trade"` / `"quote"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trade => "trade",
            Self::Quote => "quote",
        }
    }

    /// Parse a wire name.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "trade" => Some(Self::Trade),
            "quote" => Some(Self::Quote),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Price direction
// ---------------------------------------------------------------------------

/// Direction of a price move, used to colour volume bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceDirection {
    Rise,
    Fall,
    Flat,
}

impl PriceDirection {
    /// Direction of a signed change.
    pub fn of_change(change: f64) -> Self {
        if change > 0.0 {
            Self::Rise
        } else if change < 0.0 {
            Self::Fall
        } else {
            Self::Flat
        }
    }

    /// Direction from a domestic change-sign code. Only `2` (rise) and `5`
    /// (fall) are coloured; limit moves and unknown codes are flat.
    pub fn from_sign_code(code: &str) -> Self {
        match code {
            "2" => Self::Rise,
            "5" => Self::Fall,
            _ => Self::Flat,
        }
    }

    /// Bar colour (red up, blue down, grey flat).
    pub fn color(self) -> &'static str {
        match self {
            Self::Rise => "#E84041",
            Self::Fall => "#1070E0",
            Self::Flat => "#888888",
        }
    }
}
