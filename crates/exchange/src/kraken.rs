use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use core_types::{Candle, ExchangeId, Interval, OrderSide, OrderType, Pair, TradeFill};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::auth::{sign_request, NonceGenerator};
use crate::error::ExchangeError;
use crate::types::{Balance, OrderAck, OrderBook, OrderStatus, OrderStatusKind, SubmitOrderRequest, Ticker};
use crate::Exchange;

const PUBLIC_BASE_URL: &str = "https://api.kraken.com";

/// Credentials for a single Kraken API key. The secret is the base64 string
/// Kraken issues, loaded from the environment rather than `config.toml` —
/// secrets never live in the static configuration file.
#[derive(Clone)]
pub struct KrakenCredentials {
    pub api_key: String,
    pub api_secret_base64: String,
}

impl KrakenCredentials {
    /// Reads `{PREFIX}_API_KEY` / `{PREFIX}_API_SECRET` from the process
    /// environment (populated from `.env` by `dotenvy` at startup).
    pub fn from_env(prefix: &str) -> Result<Self, ExchangeError> {
        let api_key = std::env::var(format!("{prefix}_API_KEY"))
            .map_err(|_| ExchangeError::Auth(format!("missing {prefix}_API_KEY")))?;
        let api_secret_base64 = std::env::var(format!("{prefix}_API_SECRET"))
            .map_err(|_| ExchangeError::Auth(format!("missing {prefix}_API_SECRET")))?;
        Ok(Self { api_key, api_secret_base64 })
    }
}

/// A Kraken REST client implementing the uniform `Exchange` capability set.
/// Used both as the hardcoded data exchange (public endpoints only, no
/// credentials required) and, when configured, as the trading exchange.
pub struct KrakenExchange {
    client: reqwest::Client,
    credentials: Option<KrakenCredentials>,
    nonce: NonceGenerator,
    taker_fee_pct: Decimal,
    maker_fee_pct: Decimal,
}

impl KrakenExchange {
    /// Public-data-only client: no credentials, used for the always-Kraken
    /// data role (§4.1).
    pub fn public(taker_fee_pct: Decimal, maker_fee_pct: Decimal) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials: None,
            nonce: NonceGenerator::new(),
            taker_fee_pct,
            maker_fee_pct,
        }
    }

    pub fn authenticated(credentials: KrakenCredentials, taker_fee_pct: Decimal, maker_fee_pct: Decimal) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials: Some(credentials),
            nonce: NonceGenerator::new(),
            taker_fee_pct,
            maker_fee_pct,
        }
    }

    fn require_credentials(&self) -> Result<&KrakenCredentials, ExchangeError> {
        self.credentials
            .as_ref()
            .ok_or_else(|| ExchangeError::Auth("no credentials configured for this role".to_string()))
    }

    async fn get_public<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ExchangeError> {
        let url = format!("{PUBLIC_BASE_URL}{path}");
        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if status.as_u16() == 429 {
            return Err(ExchangeError::RateLimit { retry_after_sec: 1 });
        }
        if !status.is_success() {
            return Err(ExchangeError::Transient(format!("HTTP {status}: {text}")));
        }
        parse_kraken_envelope(&text)
    }

    async fn post_private<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        mut params: BTreeMap<&'static str, String>,
    ) -> Result<T, ExchangeError> {
        let credentials = self.require_credentials()?;

        let now_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ExchangeError::Transient(e.to_string()))?
            .as_millis() as i64;
        let nonce = self.nonce.next(now_millis);
        params.insert("nonce", nonce.to_string());

        let post_data = serde_urlencoded::to_string(&params)
            .map_err(|e| ExchangeError::Deserialization(format!("failed to encode request body: {e}")))?;
        let signature = sign_request(&credentials.api_secret_base64, path, nonce, &post_data)?;

        let url = format!("{PUBLIC_BASE_URL}{path}");
        let response = self
            .client
            .post(&url)
            .header("API-Key", &credentials.api_key)
            .header("API-Sign", signature)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(post_data)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if status.as_u16() == 429 {
            return Err(ExchangeError::RateLimit { retry_after_sec: 2 });
        }
        if !status.is_success() {
            return Err(ExchangeError::Transient(format!("HTTP {status}: {text}")));
        }
        parse_kraken_envelope(&text)
    }
}

/// Kraken wraps every response in `{"error": [...], "result": {...}}`. A
/// non-empty `error` array is classified into the shared error taxonomy by
/// inspecting its well-known message prefixes.
fn parse_kraken_envelope<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T, ExchangeError> {
    #[derive(Deserialize)]
    struct Envelope {
        error: Vec<String>,
        result: Option<Value>,
    }

    let envelope: Envelope =
        serde_json::from_str(body).map_err(|e| ExchangeError::Deserialization(format!("{e}: {body}")))?;

    if let Some(first) = envelope.error.first() {
        return Err(classify_kraken_error(first));
    }

    let result = envelope
        .result
        .ok_or_else(|| ExchangeError::Deserialization("response carried no result field".to_string()))?;
    serde_json::from_value(result).map_err(|e| ExchangeError::Deserialization(e.to_string()))
}

fn classify_kraken_error(message: &str) -> ExchangeError {
    if message.contains("EAPI:Invalid key") || message.contains("EAPI:Invalid signature") {
        ExchangeError::Auth(message.to_string())
    } else if message.contains("EAPI:Invalid nonce") {
        ExchangeError::Nonce { attempt: 1 }
    } else if message.contains("EOrder:Insufficient funds") {
        ExchangeError::InsufficientFunds
    } else if message.contains("EService:Market in") || message.contains("EOrder:Market") {
        ExchangeError::MarketClosed
    } else if message.contains("EService:Unavailable") || message.contains("EGeneral:Temporary") {
        ExchangeError::Transient(message.to_string())
    } else if message.contains("EAPI:Rate limit") {
        ExchangeError::RateLimit { retry_after_sec: 3 }
    } else {
        ExchangeError::PermanentReject(message.to_string())
    }
}

fn interval_to_minutes(interval: Interval) -> i64 {
    interval.seconds() / 60
}

#[async_trait]
impl Exchange for KrakenExchange {
    fn id(&self) -> ExchangeId {
        ExchangeId::Kraken
    }

    fn taker_fee_pct(&self) -> Decimal {
        self.taker_fee_pct
    }

    fn maker_fee_pct(&self) -> Decimal {
        self.maker_fee_pct
    }

    async fn get_ticker(&self, pair: &Pair) -> Result<Ticker, ExchangeError> {
        let symbol = kraken_symbol(pair);
        let raw: BTreeMap<String, Value> = self.get_public("/0/public/Ticker", &[("pair", symbol.clone())]).await?;
        let entry = raw
            .get(&symbol)
            .or_else(|| raw.values().next())
            .ok_or_else(|| ExchangeError::Deserialization(format!("no ticker entry for {symbol}")))?;

        let bid = decimal_at(entry, "b")?;
        let ask = decimal_at(entry, "a")?;
        let last = decimal_at(entry, "c")?;
        Ok(Ticker { pair: pair.clone(), bid, ask, last })
    }

    async fn get_ohlc(&self, pair: &Pair, interval: Interval, limit: u32) -> Result<Vec<Candle>, ExchangeError> {
        let symbol = kraken_symbol(pair);
        let raw: BTreeMap<String, Value> = self
            .get_public(
                "/0/public/OHLC",
                &[("pair", symbol.clone()), ("interval", interval_to_minutes(interval).to_string())],
            )
            .await?;

        let rows = raw
            .get(&symbol)
            .or_else(|| raw.iter().find(|(k, _)| *k != "last").map(|(_, v)| v))
            .and_then(Value::as_array)
            .ok_or_else(|| ExchangeError::Deserialization(format!("no OHLC rows for {symbol}")))?;

        let mut candles: Vec<Candle> = rows
            .iter()
            .filter_map(|row| row.as_array())
            .map(|row| {
                let open_ts = Utc
                    .timestamp_opt(row[0].as_i64().unwrap_or_default(), 0)
                    .single()
                    .unwrap_or_else(Utc::now);
                Ok(Candle {
                    open_ts,
                    interval,
                    open: decimal_from_value(&row[1])?,
                    high: decimal_from_value(&row[2])?,
                    low: decimal_from_value(&row[3])?,
                    close: decimal_from_value(&row[4])?,
                    volume: decimal_from_value(&row[6])?,
                    is_closed: true,
                })
            })
            .collect::<Result<Vec<Candle>, ExchangeError>>()?;

        candles.sort_by_key(|c| c.open_ts);
        if candles.len() > limit as usize {
            let drop = candles.len() - limit as usize;
            candles.drain(0..drop);
        }
        Ok(candles)
    }

    async fn get_balance(&self) -> Result<Vec<Balance>, ExchangeError> {
        let raw: BTreeMap<String, String> = self.post_private("/0/private/Balance", BTreeMap::new()).await?;
        raw.into_iter()
            .map(|(asset, amount)| {
                let total = Decimal::from_str(&amount)
                    .map_err(|e| ExchangeError::Deserialization(format!("bad balance for {asset}: {e}")))?;
                Ok(Balance { asset, free: total, total })
            })
            .collect()
    }

    async fn get_order_book(&self, _pair: &Pair) -> Result<OrderBook, ExchangeError> {
        Err(ExchangeError::Unsupported("order book depth not wired up for Kraken".to_string()))
    }

    async fn submit_order(&self, request: SubmitOrderRequest) -> Result<OrderAck, ExchangeError> {
        let mut params: BTreeMap<&'static str, String> = BTreeMap::new();
        params.insert("pair", kraken_symbol(&request.pair));
        params.insert(
            "type",
            match request.side {
                OrderSide::Buy => "buy".to_string(),
                OrderSide::Sell => "sell".to_string(),
            },
        );
        params.insert(
            "ordertype",
            match request.order_type {
                OrderType::Market => "market".to_string(),
                OrderType::Limit => "limit".to_string(),
            },
        );
        params.insert("volume", request.amount.to_string());
        if let Some(price) = request.price {
            params.insert("price", price.to_string());
        }
        params.insert("userref", client_order_id_to_userref(&request.client_order_id).to_string());

        #[derive(Deserialize)]
        struct AddOrderResult {
            txid: Vec<String>,
        }
        let result: AddOrderResult = self.post_private("/0/private/AddOrder", params).await?;
        let order_id = result
            .txid
            .into_iter()
            .next()
            .ok_or_else(|| ExchangeError::Deserialization("AddOrder returned no txid".to_string()))?;

        Ok(OrderAck { order_id, client_order_id: request.client_order_id })
    }

    async fn get_order_status(&self, order_id: &str) -> Result<OrderStatus, ExchangeError> {
        let mut params = BTreeMap::new();
        params.insert("txid", order_id.to_string());

        #[derive(Deserialize)]
        struct QueryOrderEntry {
            status: String,
            vol_exec: String,
            price: String,
        }
        let raw: BTreeMap<String, QueryOrderEntry> = self.post_private("/0/private/QueryOrders", params).await?;
        let entry = raw
            .get(order_id)
            .ok_or_else(|| ExchangeError::Deserialization(format!("no such order {order_id}")))?;

        let status = match entry.status.as_str() {
            "open" | "pending" => OrderStatusKind::Open,
            "closed" if entry.vol_exec == "0" => OrderStatusKind::Canceled,
            "closed" => OrderStatusKind::Filled,
            "canceled" | "expired" => OrderStatusKind::Canceled,
            _ => OrderStatusKind::Rejected,
        };

        Ok(OrderStatus {
            order_id: order_id.to_string(),
            status,
            filled_qty: Decimal::from_str(&entry.vol_exec)
                .map_err(|e| ExchangeError::Deserialization(e.to_string()))?,
            average_price: Decimal::from_str(&entry.price).unwrap_or(Decimal::ZERO),
        })
    }

    async fn cancel_order(&self, order_id: &str) -> Result<(), ExchangeError> {
        let mut params = BTreeMap::new();
        params.insert("txid", order_id.to_string());
        let _: Value = self.post_private("/0/private/CancelOrder", params).await?;
        Ok(())
    }

    async fn list_fills(&self, since: DateTime<Utc>) -> Result<Vec<TradeFill>, ExchangeError> {
        let mut params = BTreeMap::new();
        params.insert("start", since.timestamp().to_string());

        #[derive(Deserialize)]
        struct TradesResult {
            trades: BTreeMap<String, RawTrade>,
        }
        #[derive(Deserialize)]
        struct RawTrade {
            pair: String,
            #[serde(rename = "type")]
            side: String,
            price: String,
            vol: String,
            cost: String,
            fee: String,
            time: f64,
            ordertxid: String,
        }

        let result: TradesResult = self.post_private("/0/private/TradesHistory", params).await?;
        result
            .trades
            .into_iter()
            .map(|(trade_id, raw)| {
                Ok(TradeFill {
                    fill_id: uuid::Uuid::new_v4(),
                    exchange: ExchangeId::Kraken,
                    pair: raw.pair,
                    side: if raw.side == "buy" { OrderSide::Buy } else { OrderSide::Sell },
                    price: Decimal::from_str(&raw.price).map_err(|e| ExchangeError::Deserialization(e.to_string()))?,
                    amount: Decimal::from_str(&raw.vol).map_err(|e| ExchangeError::Deserialization(e.to_string()))?,
                    cost: Decimal::from_str(&raw.cost).map_err(|e| ExchangeError::Deserialization(e.to_string()))?,
                    fee_eur: Decimal::from_str(&raw.fee).map_err(|e| ExchangeError::Deserialization(e.to_string()))?,
                    executed_at: Utc.timestamp_opt(raw.time as i64, 0).single().unwrap_or_else(Utc::now),
                    order_id: raw.ordertxid,
                    client_order_id: trade_id,
                    lot_id: None,
                })
            })
            .collect()
    }
}

fn kraken_symbol(pair: &Pair) -> String {
    format!("{}{}", pair.base, pair.quote)
}

fn decimal_at(entry: &Value, key: &str) -> Result<Decimal, ExchangeError> {
    entry
        .get(key)
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
        .and_then(Value::as_str)
        .ok_or_else(|| ExchangeError::Deserialization(format!("missing field {key}")))
        .and_then(|s| Decimal::from_str(s).map_err(|e| ExchangeError::Deserialization(e.to_string())))
}

fn decimal_from_value(value: &Value) -> Result<Decimal, ExchangeError> {
    match value {
        Value::String(s) => Decimal::from_str(s).map_err(|e| ExchangeError::Deserialization(e.to_string())),
        Value::Number(n) => Decimal::from_str(&n.to_string()).map_err(|e| ExchangeError::Deserialization(e.to_string())),
        _ => Err(ExchangeError::Deserialization("expected a numeric OHLC field".to_string())),
    }
}

/// Kraken's `userref` is a signed 32-bit integer, not a free-form string;
/// the client order id is hashed down to fit while staying deterministic
/// for retried submissions.
fn client_order_id_to_userref(client_order_id: &str) -> i32 {
    let mut hash: u32 = 2166136261;
    for byte in client_order_id.bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(16777619);
    }
    (hash & 0x7fff_ffff) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_order_id_hashes_deterministically() {
        let a = client_order_id_to_userref("BTC-USD-buy-1234");
        let b = client_order_id_to_userref("BTC-USD-buy-1234");
        assert_eq!(a, b);
        assert!(a >= 0);
    }

    #[test]
    fn classifies_insufficient_funds() {
        let err = classify_kraken_error("EOrder:Insufficient funds");
        assert!(matches!(err, ExchangeError::InsufficientFunds));
    }

    #[test]
    fn classifies_invalid_nonce_as_retryable() {
        let err = classify_kraken_error("EAPI:Invalid nonce");
        assert!(matches!(err, ExchangeError::Nonce { .. }));
    }
}
