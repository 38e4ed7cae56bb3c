//! DuckDB-backed scan history.
//!
//! Stores every scan run with its aggregates, offer snapshots and deal
//! alerts, and serves rolling baselines from the stored per-scan medians.
//! Values are bound as text and cast in SQL; decimals are read back as text
//! so no precision is lost on the way out.

use duckdb::{types::ValueRef, Connection as DuckDbConnection};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::baseline::{rolling_median, BaselineProvider};
use crate::config::{default_history_path, PARSE_VERSION};
use crate::error::Result;
use crate::models::{DealCandidate, Offer, ScanKey, ScanReport};

/// Longest error text stored for a failed run.
pub const MAX_ERROR_LEN: usize = 65_000;

const SCHEMA: &str = "
CREATE SEQUENCE IF NOT EXISTS scan_run_seq START 1;
CREATE TABLE IF NOT EXISTS scan_run (
    id BIGINT PRIMARY KEY DEFAULT nextval('scan_run_seq'),
    ts TIMESTAMP NOT NULL DEFAULT current_timestamp,
    product_url VARCHAR NOT NULL,
    item VARCHAR NOT NULL,
    variant VARCHAR NOT NULL,
    country VARCHAR NOT NULL,
    foil BOOLEAN NOT NULL,
    ok BOOLEAN NOT NULL,
    http_status INTEGER,
    error VARCHAR,
    product_id VARCHAR,
    parse_version VARCHAR NOT NULL
);
CREATE TABLE IF NOT EXISTS scan_agg (
    scan_id BIGINT PRIMARY KEY,
    offer_count INTEGER NOT NULL,
    seller_count INTEGER NOT NULL,
    min_total DECIMAL(12,2),
    p10_total DECIMAL(12,2),
    p25_total DECIMAL(12,2),
    median_total DECIMAL(12,2),
    p75_total DECIMAL(12,2),
    p90_total DECIMAL(12,2),
    max_total DECIMAL(12,2),
    trimmed_mean_total DECIMAL(12,2),
    iqr_total DECIMAL(12,2),
    stdev_total DECIMAL(12,2),
    mean_total DECIMAL(12,2),
    mode_total DECIMAL(12,2),
    baseline DECIMAL(12,2)
);
CREATE TABLE IF NOT EXISTS offer_snapshot (
    scan_id BIGINT NOT NULL,
    position INTEGER NOT NULL,
    article_url VARCHAR,
    article_id VARCHAR,
    price_item DECIMAL(12,2) NOT NULL,
    shipping DECIMAL(12,2),
    total DECIMAL(12,2) NOT NULL,
    currency VARCHAR NOT NULL,
    quantity INTEGER,
    item_condition VARCHAR,
    language VARCHAR,
    is_foil BOOLEAN NOT NULL,
    seller_name VARCHAR,
    seller_id VARCHAR,
    seller_country VARCHAR,
    seller_rating DOUBLE,
    seller_sales BIGINT,
    flags_json VARCHAR,
    PRIMARY KEY (scan_id, position)
);
CREATE SEQUENCE IF NOT EXISTS deal_alert_seq START 1;
CREATE TABLE IF NOT EXISTS deal_alert (
    id BIGINT PRIMARY KEY DEFAULT nextval('deal_alert_seq'),
    ts TIMESTAMP NOT NULL DEFAULT current_timestamp,
    scan_id BIGINT NOT NULL,
    item VARCHAR NOT NULL,
    variant VARCHAR NOT NULL,
    country VARCHAR NOT NULL,
    foil BOOLEAN NOT NULL,
    article_id VARCHAR,
    article_url VARCHAR,
    total DECIMAL(12,2) NOT NULL,
    baseline DECIMAL(12,2) NOT NULL,
    discount_pct DECIMAL(10,4) NOT NULL,
    reason VARCHAR NOT NULL,
    seller_name VARCHAR,
    item_condition VARCHAR,
    meta_json VARCHAR
);
";

type Param = Option<String>;

fn text(value: impl ToString) -> Param {
    Some(value.to_string())
}

fn opt<T: ToString>(value: Option<T>) -> Param {
    value.map(|v| v.to_string())
}

// ---------------------------------------------------------------------------
// StoredDeal — Deal alert row (query result)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StoredDeal {
    pub id: i64,
    pub scan_id: i64,
    pub ts: String,
    pub item: String,
    pub variant: String,
    pub country: String,
    pub foil: bool,
    pub article_id: Option<String>,
    pub article_url: Option<String>,
    pub total: Decimal,
    pub baseline: Decimal,
    pub discount_pct: Decimal,
    pub reason: String,
    pub seller_name: Option<String>,
    pub condition: Option<String>,
}

// ---------------------------------------------------------------------------
// ScanHistory
// ---------------------------------------------------------------------------

/// Scan history stored in a DuckDB database.
pub struct ScanHistory {
    conn: DuckDbConnection,
}

impl ScanHistory {
    /// Open (or create) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let history = Self {
            conn: DuckDbConnection::open(path)?,
        };
        history.init_schema()?;
        tracing::debug!(path = %path.display(), "opened scan history");
        Ok(history)
    }

    /// Open a throwaway in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let history = Self {
            conn: DuckDbConnection::open_in_memory()?,
        };
        history.init_schema()?;
        Ok(history)
    }

    /// Open the database in the platform data directory.
    pub fn open_default() -> Result<Self> {
        Self::open(default_history_path())
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Access the underlying DuckDB connection for ad-hoc queries.
    pub fn raw(&self) -> &DuckDbConnection {
        &self.conn
    }

    // -- writes --------------------------------------------------------------

    /// Store a successful scan: run, aggregates, offers and deals, atomically.
    /// Returns the new scan id.
    pub fn record_report(
        &self,
        key: &ScanKey,
        url: &str,
        http_status: Option<u16>,
        report: &ScanReport,
    ) -> Result<i64> {
        let scan_id = self.in_transaction(|h| {
            let scan_id = h.insert_run(key, url, true, http_status, None, report.product_id.as_deref())?;
            h.insert_agg(scan_id, report)?;
            for offer in &report.offers {
                h.insert_offer(scan_id, offer)?;
            }
            for deal in &report.deals {
                h.insert_deal(scan_id, key, deal)?;
            }
            Ok(scan_id)
        })?;

        tracing::info!(
            scan_id,
            key = %key,
            offers = report.offers.len(),
            deals = report.deals.len(),
            "recorded scan"
        );
        Ok(scan_id)
    }

    /// Store a failed scan run. The error text is truncated.
    pub fn record_failure(
        &self,
        key: &ScanKey,
        url: &str,
        http_status: Option<u16>,
        error: &str,
    ) -> Result<i64> {
        let truncated: String = error.chars().take(MAX_ERROR_LEN).collect();
        let scan_id = self.insert_run(key, url, false, http_status, Some(&truncated), None)?;
        tracing::warn!(scan_id, key = %key, error, "recorded failed scan");
        Ok(scan_id)
    }

    fn in_transaction<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        self.conn.execute_batch("BEGIN TRANSACTION")?;
        match f(self) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.conn.execute_batch("ROLLBACK") {
                    tracing::warn!(error = %rollback, "rollback failed");
                }
                Err(e)
            }
        }
    }

    fn insert_run(
        &self,
        key: &ScanKey,
        url: &str,
        ok: bool,
        http_status: Option<u16>,
        error: Option<&str>,
        product_id: Option<&str>,
    ) -> Result<i64> {
        let params = [
            text(url),
            text(&key.item),
            text(&key.variant),
            text(&key.country),
            text(key.foil),
            text(ok),
            opt(http_status),
            opt(error),
            opt(product_id),
            text(PARSE_VERSION),
        ];
        let sql = "INSERT INTO scan_run \
             (product_url, item, variant, country, foil, ok, http_status, error, product_id, parse_version) \
             VALUES (?, ?, ?, ?, CAST(? AS BOOLEAN), CAST(? AS BOOLEAN), CAST(? AS INTEGER), ?, ?, ?) \
             RETURNING id";
        let mut stmt = self.conn.prepare(sql)?;
        let id = stmt.query_row(bind(&params).as_slice(), |row| row.get::<_, i64>(0))?;
        Ok(id)
    }

    fn insert_agg(&self, scan_id: i64, report: &ScanReport) -> Result<()> {
        let s = &report.stats;
        let params = [
            text(scan_id),
            text(s.offer_count),
            text(s.seller_count),
            opt(s.min),
            opt(s.p10),
            opt(s.p25),
            opt(s.median),
            opt(s.p75),
            opt(s.p90),
            opt(s.max),
            opt(s.trimmed_mean),
            opt(s.iqr),
            opt(s.stdev),
            opt(s.mean),
            opt(s.mode),
            opt(report.baseline),
        ];
        let money = "CAST(? AS DECIMAL(12,2))";
        let sql = format!(
            "INSERT INTO scan_agg VALUES (CAST(? AS BIGINT), CAST(? AS INTEGER), CAST(? AS INTEGER), {})",
            vec![money; 13].join(", ")
        );
        self.execute(&sql, &params)?;
        Ok(())
    }

    fn insert_offer(&self, scan_id: i64, offer: &Offer) -> Result<()> {
        let flags_json = if offer.flags().is_empty() {
            None
        } else {
            Some(serde_json::to_string(offer.flags())?)
        };
        let params = [
            text(scan_id),
            text(offer.position()),
            opt(offer.article_url()),
            opt(offer.article_id()),
            text(offer.price_item()),
            opt(offer.shipping()),
            text(offer.total()),
            text(offer.currency()),
            opt(offer.quantity()),
            opt(offer.condition().map(|c| c.code().to_string())),
            opt(offer.language()),
            text(offer.is_foil()),
            opt(offer.seller_name()),
            opt(offer.seller_id()),
            opt(offer.seller_country()),
            opt(offer.seller_rating()),
            opt(offer.seller_sales()),
            flags_json,
        ];
        self.execute(
            "INSERT INTO offer_snapshot VALUES (\
             CAST(? AS BIGINT), CAST(? AS INTEGER), ?, ?, \
             CAST(? AS DECIMAL(12,2)), CAST(? AS DECIMAL(12,2)), CAST(? AS DECIMAL(12,2)), \
             ?, CAST(? AS INTEGER), ?, ?, CAST(? AS BOOLEAN), ?, ?, ?, \
             CAST(? AS DOUBLE), CAST(? AS BIGINT), ?)",
            &params,
        )?;
        Ok(())
    }

    fn insert_deal(&self, scan_id: i64, key: &ScanKey, deal: &DealCandidate) -> Result<()> {
        let offer = &deal.offer;
        let meta = serde_json::json!({
            "sellerRating": offer.seller_rating(),
            "sellerSales": offer.seller_sales(),
            "quantity": offer.quantity(),
            "language": offer.language(),
        });
        let params = [
            text(scan_id),
            text(&key.item),
            text(&key.variant),
            text(&key.country),
            text(key.foil),
            opt(offer.article_id()),
            opt(offer.article_url()),
            text(deal.price()),
            text(deal.baseline),
            text(deal.discount_pct),
            text(&deal.reason),
            opt(offer.seller_name()),
            opt(offer.condition().map(|c| c.code().to_string())),
            text(meta),
        ];
        self.execute(
            "INSERT INTO deal_alert \
             (scan_id, item, variant, country, foil, article_id, article_url, total, baseline, \
              discount_pct, reason, seller_name, item_condition, meta_json) \
             VALUES (CAST(? AS BIGINT), ?, ?, ?, CAST(? AS BOOLEAN), ?, ?, \
             CAST(? AS DECIMAL(12,2)), CAST(? AS DECIMAL(12,2)), CAST(? AS DECIMAL(10,4)), ?, ?, ?, ?)",
            &params,
        )?;
        Ok(())
    }

    // -- reads ---------------------------------------------------------------

    /// Per-scan medians of the newest `window` successful runs for `key`,
    /// newest first.
    pub fn recent_medians(&self, key: &ScanKey, window: usize) -> Result<Vec<Decimal>> {
        #[derive(Deserialize)]
        struct Row {
            median: Decimal,
        }

        let sql = format!(
            "SELECT CAST(a.median_total AS VARCHAR) AS median \
             FROM scan_run r JOIN scan_agg a ON r.id = a.scan_id \
             WHERE r.item = ? AND r.variant = ? AND r.country = ? \
               AND r.foil = CAST(? AS BOOLEAN) AND r.ok AND a.median_total IS NOT NULL \
             ORDER BY r.id DESC LIMIT {}",
            window
        );
        let params = [
            text(&key.item),
            text(&key.variant),
            text(&key.country),
            text(key.foil),
        ];
        let rows: Vec<Row> = self.execute_into(&sql, &params)?;
        Ok(rows.into_iter().map(|r| r.median).collect())
    }

    /// Offers stored for one scan, in page order.
    pub fn stored_offers(&self, scan_id: i64) -> Result<Vec<Offer>> {
        let rows = self.query(
            "SELECT position, \
                CAST(price_item AS VARCHAR) AS \"priceItem\", \
                CAST(shipping AS VARCHAR) AS shipping, \
                currency, quantity, item_condition AS condition, language, \
                is_foil AS \"isFoil\", seller_name AS \"sellerName\", seller_id AS \"sellerId\", \
                seller_country AS \"sellerCountry\", seller_rating AS \"sellerRating\", \
                seller_sales AS \"sellerSales\", article_url AS \"articleUrl\", \
                article_id AS \"articleId\", flags_json AS flags \
             FROM offer_snapshot WHERE scan_id = CAST(? AS BIGINT) ORDER BY position",
            &[text(scan_id)],
        )?;

        let mut offers = Vec::with_capacity(rows.len());
        for mut row in rows {
            let flags = match row.remove("flags") {
                Some(serde_json::Value::String(raw)) => serde_json::from_str(&raw)?,
                _ => serde_json::Value::Array(Vec::new()),
            };
            row.insert("flags".to_string(), flags);
            let value = serde_json::Value::Object(row.into_iter().collect());
            offers.push(serde_json::from_value(value)?);
        }
        Ok(offers)
    }

    /// Most recent deal alerts, newest first.
    pub fn recent_deals(&self, limit: usize) -> Result<Vec<StoredDeal>> {
        let sql = format!(
            "SELECT id, scan_id, CAST(ts AS VARCHAR) AS ts, item, variant, country, foil, \
                article_id, article_url, CAST(total AS VARCHAR) AS total, \
                CAST(baseline AS VARCHAR) AS baseline, \
                CAST(discount_pct AS VARCHAR) AS discount_pct, reason, seller_name, \
                item_condition AS condition \
             FROM deal_alert ORDER BY id DESC LIMIT {}",
            limit
        );
        self.execute_into(&sql, &[])
    }

    /// Number of stored runs for `key`, successful or not.
    pub fn run_count(&self, key: &ScanKey) -> Result<i64> {
        let mut stmt = self.conn.prepare(
            "SELECT COUNT(*) FROM scan_run \
             WHERE item = ? AND variant = ? AND country = ? AND foil = CAST(? AS BOOLEAN)",
        )?;
        let params = [
            text(&key.item),
            text(&key.variant),
            text(&key.country),
            text(key.foil),
        ];
        let count = stmt.query_row(bind(&params).as_slice(), |row| row.get::<_, i64>(0))?;
        Ok(count)
    }

    // -- plumbing ------------------------------------------------------------

    fn execute(&self, sql: &str, params: &[Param]) -> Result<usize> {
        let mut stmt = self.conn.prepare(sql)?;
        Ok(stmt.execute(bind(params).as_slice())?)
    }

    /// Run a query and return each row as a column-name map.
    fn query(&self, sql: &str, params: &[Param]) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(bind(params).as_slice())?;

        // Column metadata is only available once the statement has run.
        let (column_names, column_count) = match rows.as_ref() {
            Some(executed) => (
                executed
                    .column_names()
                    .into_iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>(),
                executed.column_count(),
            ),
            None => return Ok(Vec::new()),
        };

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut map = HashMap::with_capacity(column_count);
            for (i, name) in column_names.iter().enumerate() {
                map.insert(name.clone(), convert_value_ref(row.get_ref(i)?));
            }
            out.push(map);
        }
        Ok(out)
    }

    fn execute_into<T: DeserializeOwned>(&self, sql: &str, params: &[Param]) -> Result<Vec<T>> {
        let rows = self.query(sql, params)?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let value = serde_json::Value::Object(row.into_iter().collect());
            results.push(serde_json::from_value(value)?);
        }
        Ok(results)
    }
}

impl BaselineProvider for ScanHistory {
    fn baseline(&self, key: &ScanKey, window: usize) -> Result<Option<Decimal>> {
        let mut medians = self.recent_medians(key, window)?;
        medians.reverse();
        Ok(rolling_median(&medians, window))
    }
}

fn bind(params: &[Param]) -> Vec<&dyn duckdb::ToSql> {
    params.iter().map(|p| p as &dyn duckdb::ToSql).collect()
}

/// Convert a DuckDB `ValueRef` to a `serde_json::Value`.
fn convert_value_ref(val: ValueRef<'_>) -> serde_json::Value {
    match val {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Boolean(b) => serde_json::Value::Bool(b),
        ValueRef::TinyInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::SmallInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::Int(n) => serde_json::Value::Number(n.into()),
        ValueRef::BigInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::HugeInt(n) => match i64::try_from(n) {
            Ok(i) => serde_json::Value::Number(i.into()),
            Err(_) => serde_json::Value::String(n.to_string()),
        },
        ValueRef::Double(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(bytes) => serde_json::Value::String(String::from_utf8_lossy(bytes).to_string()),
        _ => serde_json::Value::Null,
    }
}
