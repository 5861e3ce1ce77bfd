//! Where chart snapshots come from.

use std::future::Future;

use crate::chart::model::ChartViewModel;
use crate::client::RestClient;
use crate::error::Result;
use crate::types::{ChartPeriod, Instrument};

/// A provider of full chart snapshots.
///
/// [`RestClient`] is the production source; tests substitute their own.
pub trait SnapshotSource: Send + Sync + 'static {
    /// Fetch the current snapshot for `instrument` at `period`.
    fn fetch(
        &self,
        instrument: &Instrument,
        period: ChartPeriod,
    ) -> impl Future<Output = Result<ChartViewModel>> + Send;
}

impl SnapshotSource for RestClient {
    async fn fetch(&self, instrument: &Instrument, period: ChartPeriod) -> Result<ChartViewModel> {
        match instrument {
            Instrument::Domestic { stock_code } => match period {
                ChartPeriod::Minute => {
                    let resp = self.current_intraday_chart(stock_code).await?;
                    Ok(ChartViewModel::from_intraday(&resp))
                }
                _ => {
                    let resp = self.period_chart(stock_code, period).await?;
                    Ok(ChartViewModel::from_period(&resp))
                }
            },
            Instrument::Foreign {
                exchange_code,
                stock_code,
            } => match period {
                ChartPeriod::Minute => {
                    let resp = self
                        .foreign_intraday_chart_default(exchange_code, stock_code)
                        .await?;
                    Ok(ChartViewModel::from_foreign_intraday(&resp, stock_code))
                }
                _ => {
                    let resp = self
                        .foreign_period_chart(exchange_code, stock_code, period)
                        .await?;
                    Ok(ChartViewModel::from_foreign_period(&resp, stock_code))
                }
            },
            Instrument::Gold { product_code } => {
                let (price, chart) = tokio::try_join!(
                    self.gold_current_price(product_code),
                    self.gold_chart(product_code, period),
                )?;
                Ok(ChartViewModel::from_gold(&price, &chart))
            }
        }
    }
}
