//! Offline conversion export: query the retailer's events, reshape headers, write CSV.

use crate::error::ConversionError;
use crate::models::CoopWithRetailer;
use crate::store::quote_ident;
use crate::warehouse::{QueryParam, QueryTable, Warehouse, EVENTS_VIEW};
use serde_json::Value;

const CONVERSIONS_SQL: &str = include_str!("../../sql/get_google_ads_conversions.sql");

pub struct ConversionService<'a> {
    warehouse: &'a dyn Warehouse,
    config: &'a CoopWithRetailer,
}

impl<'a> ConversionService<'a> {
    pub fn new(warehouse: &'a dyn Warehouse, config: &'a CoopWithRetailer) -> Self {
        ConversionService { warehouse, config }
    }

    /// Conversions as CSV in the import format. Failures are logged and yield an empty string.
    pub async fn get_conversions(&self) -> String {
        match self.formatted_conversions().await.and_then(|t| to_csv(&t)) {
            Ok(csv) => csv,
            Err(error) => {
                tracing::error!(
                    coop = %self.config.coop.name,
                    retailer = %self.config.retailer.name,
                    %error,
                    "error getting the conversions"
                );
                String::new()
            }
        }
    }

    fn query(&self) -> (String, Vec<QueryParam>) {
        let events = format!(
            "{}.{}",
            quote_ident(&self.config.retailer.dataset_name()),
            quote_ident(EVENTS_VIEW)
        );
        let sql = CONVERSIONS_SQL.replace("{events_table}", &events);
        let coop = &self.config.coop;
        let retailer = &self.config.retailer;
        let params = vec![
            QueryParam::from(coop.conversion_name.as_str()),
            QueryParam::from(retailer.time_zone.as_str()),
            QueryParam::from(retailer.currency.as_str()),
            QueryParam::Json(Value::from(coop.utm_campaigns.clone())),
            QueryParam::from(coop.attribution_window_days.min(retailer.max_backfill_days)),
        ];
        (sql, params)
    }

    async fn formatted_conversions(&self) -> Result<QueryTable, ConversionError> {
        let (sql, params) = self.query();
        let mut table = self.warehouse.query(&sql, &params).await?;
        for c in table.columns.iter_mut() {
            *c = format_header(c);
        }
        Ok(table)
    }
}

/// Column names use underscores where the import format expects spaces.
pub fn format_header(column: &str) -> String {
    column.replace('_', " ")
}

fn cell_to_field(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Header row plus one record per row, comma separated.
pub fn to_csv(table: &QueryTable) -> Result<String, ConversionError> {
    let mut writer = csv::WriterBuilder::new().delimiter(b',').from_writer(Vec::new());
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(cell_to_field))?;
    }
    let bytes = writer.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}
