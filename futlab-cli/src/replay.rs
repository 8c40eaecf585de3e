//! Replay driver: plays a JSON-lines event script through the portfolio.
//!
//! One event per line, tagged by `event`:
//!
//! ```text
//! {"event":"signal","trading_day":"2017-06-01","symbol":"rb1710","strategy":"trend","signal_type":"LONG","strength":3}
//! {"event":"fill","index":1,"price":3120.0}
//! {"event":"cancel","index":2}
//! {"event":"market","symbol":"rb1710","trading_day":"2017-06-01","open":3100,"high":3130,"low":3090,"close":3120,"volume":1000}
//! {"event":"settle","trading_day":"2017-06-01"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. A malformed line or a
//! rejected event is reported and the replay continues with the next line.

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use futlab_core::data::PriceProvider;
use futlab_core::domain::{
    Action, Bar, Direction, Fill, Order, OrderIndex, Signal, SignalType, StrategyId,
};
use futlab_core::ledger::PositionLedger;
use futlab_core::{Engine, Portfolio, PortfolioError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

// ── Events ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReplayEvent {
    Signal(SignalEvent),
    Fill(FillEvent),
    Cancel { index: OrderIndex },
    Market(Bar),
    Settle { trading_day: NaiveDate },
}

/// A signal as written in a script. `signal_type` stays a raw string so an
/// unknown value is rejected per event rather than failing the whole line.
#[derive(Debug, Clone, Deserialize)]
pub struct SignalEvent {
    pub trading_day: NaiveDate,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    pub symbol: String,
    pub strategy: StrategyId,
    pub signal_type: String,
    pub strength: f64,
}

/// An execution report. Fields the venue already knows from the submitted
/// order may be omitted; an order submitted before a restart must spell
/// them out.
#[derive(Debug, Clone, Deserialize)]
pub struct FillEvent {
    pub index: OrderIndex,
    #[serde(default)]
    pub quantity: Option<u64>,
    pub price: f64,
    #[serde(default)]
    pub commission: f64,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub action: Option<Action>,
    #[serde(default)]
    pub direction: Option<Direction>,
    #[serde(default)]
    pub trading_day: Option<NaiveDate>,
}

impl SignalEvent {
    fn to_signal(&self) -> Result<Signal, PortfolioError> {
        let signal_type: SignalType =
            self.signal_type
                .parse()
                .map_err(|_| PortfolioError::UnknownSignalType {
                    value: self.signal_type.clone(),
                    symbol: self.symbol.clone(),
                    strategy: self.strategy.clone(),
                })?;
        Ok(Signal::new(
            self.symbol.clone(),
            self.strategy.clone(),
            signal_type,
            self.strength,
        ))
    }
}

// ── Engine ───────────────────────────────────────────────────────────

/// The replay's stand-in for the hosting engine and execution venue.
pub struct ReplayEngine {
    trading_day: NaiveDate,
    timestamp: DateTime<Utc>,
    outbox: Vec<Order>,
    submitted: BTreeMap<OrderIndex, Order>,
}

impl ReplayEngine {
    pub fn new(trading_day: NaiveDate) -> Self {
        Self {
            trading_day,
            timestamp: start_of(trading_day),
            outbox: Vec::new(),
            submitted: BTreeMap::new(),
        }
    }

    fn advance(&mut self, trading_day: NaiveDate, timestamp: Option<DateTime<Utc>>) {
        self.trading_day = trading_day;
        self.timestamp = timestamp.unwrap_or_else(|| start_of(trading_day));
    }

    fn drain(&mut self) -> Vec<Order> {
        std::mem::take(&mut self.outbox)
    }

    /// Drop a submitted order once the portfolio no longer tracks it.
    fn release(&mut self, index: OrderIndex) {
        self.submitted.remove(&index);
    }

    /// Number of orders still held for fill defaulting.
    pub fn open_orders(&self) -> usize {
        self.submitted.len()
    }

    /// Build a fill, defaulting fields from the submitted order.
    fn fill_from(&self, event: &FillEvent) -> Result<Fill> {
        let order = self.submitted.get(&event.index);
        let missing = |field: &str| {
            anyhow!(
                "fill for {}: '{field}' is required for an order not submitted in this replay",
                event.index
            )
        };
        Ok(Fill {
            order_index: event.index,
            symbol: match (&event.symbol, order) {
                (Some(symbol), _) => symbol.clone(),
                (None, Some(order)) => order.symbol.clone(),
                (None, None) => return Err(missing("symbol")),
            },
            trading_day: event
                .trading_day
                .or(order.map(|o| o.trading_day))
                .unwrap_or(self.trading_day),
            timestamp: self.timestamp,
            action: event
                .action
                .or(order.map(|o| o.action))
                .ok_or_else(|| missing("action"))?,
            direction: event
                .direction
                .or(order.map(|o| o.direction))
                .ok_or_else(|| missing("direction"))?,
            quantity: event
                .quantity
                .or(order.map(|o| o.quantity))
                .ok_or_else(|| missing("quantity"))?,
            price: event.price,
            commission: event.commission,
        })
    }
}

fn start_of(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

impl Engine for ReplayEngine {
    fn trading_day(&self) -> NaiveDate {
        self.trading_day
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn submit(&mut self, order: Order) {
        self.submitted.insert(order.index, order.clone());
        self.outbox.push(order);
    }
}

// ── Driver ───────────────────────────────────────────────────────────

/// A line that could not be parsed or whose event was rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct EventError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplaySummary {
    pub events: usize,
    pub orders: usize,
    pub fills: usize,
    pub cancels: usize,
    pub bars: usize,
    pub settlements: usize,
    pub unpriced: usize,
    pub errors: Vec<EventError>,
}

/// Play every event in `script`, writing emitted orders and outcomes to `out`.
///
/// Only I/O failures on `script` or `out` abort the replay.
pub fn run_replay<L, P, R, W>(
    portfolio: &mut Portfolio<L, P>,
    engine: &mut ReplayEngine,
    script: R,
    out: &mut W,
) -> Result<ReplaySummary>
where
    L: PositionLedger,
    P: PriceProvider,
    R: BufRead,
    W: Write,
{
    let mut summary = ReplaySummary::default();

    for (i, line) in script.lines().enumerate() {
        let line_no = i + 1;
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        summary.events += 1;

        let event: ReplayEvent = match serde_json::from_str(trimmed) {
            Ok(event) => event,
            Err(e) => {
                report(&mut summary, out, line_no, format!("malformed event: {e}"))?;
                continue;
            }
        };

        if let Err(e) = play(portfolio, engine, &event, &mut summary, out) {
            report(&mut summary, out, line_no, format!("{e:#}"))?;
        }
    }

    tracing::info!(
        events = summary.events,
        orders = summary.orders,
        fills = summary.fills,
        errors = summary.errors.len(),
        "replay finished"
    );
    Ok(summary)
}

fn play<L, P, W>(
    portfolio: &mut Portfolio<L, P>,
    engine: &mut ReplayEngine,
    event: &ReplayEvent,
    summary: &mut ReplaySummary,
    out: &mut W,
) -> Result<()>
where
    L: PositionLedger,
    P: PriceProvider,
    W: Write,
{
    match event {
        ReplayEvent::Signal(signal_event) => {
            engine.advance(signal_event.trading_day, signal_event.timestamp);
            let signal = signal_event.to_signal()?;
            portfolio.on_signal(&signal, engine)?;
            for order in engine.drain() {
                writeln!(out, "order {order} [{}]", signal.strategy)?;
                summary.orders += 1;
            }
        }
        ReplayEvent::Fill(fill_event) => {
            let fill = engine.fill_from(fill_event)?;
            let strategy = portfolio.apply_fill(&fill)?;
            if portfolio.attribution().get(fill.order_index).is_none() {
                engine.release(fill.order_index);
            }
            writeln!(
                out,
                "fill {} {} {} @ {} [{strategy}]",
                fill.order_index, fill.symbol, fill.quantity, fill.price
            )?;
            summary.fills += 1;
        }
        ReplayEvent::Cancel { index } => {
            let strategy = portfolio.cancel_order(*index)?;
            engine.release(*index);
            writeln!(out, "cancel {index} [{strategy}]")?;
            summary.cancels += 1;
        }
        ReplayEvent::Market(bar) => {
            if !bar.is_sane() {
                return Err(anyhow!(
                    "bar for {} on {} fails OHLC sanity check",
                    bar.symbol,
                    bar.trading_day
                ));
            }
            engine.advance(bar.trading_day, None);
            portfolio.on_market_data(&bar.symbol, bar);
            summary.bars += 1;
        }
        ReplayEvent::Settle { trading_day } => {
            engine.advance(*trading_day, None);
            summary.settlements += 1;
            match portfolio.settle(*trading_day) {
                Ok(snapshot) => {
                    writeln!(out, "settle {trading_day}: {} priced", snapshot.len())?;
                    for (symbol, price) in &snapshot {
                        writeln!(out, "  {symbol} {price}")?;
                    }
                }
                Err(failures) => {
                    summary.unpriced += failures.failures.len();
                    writeln!(out, "settle {trading_day}: {failures}")?;
                    for failure in &failures.failures {
                        writeln!(out, "  {failure}")?;
                    }
                }
            }
        }
    }
    Ok(())
}

fn report<W: Write>(
    summary: &mut ReplaySummary,
    out: &mut W,
    line: usize,
    message: String,
) -> Result<()> {
    tracing::warn!(line, %message, "event rejected");
    writeln!(out, "error line {line}: {message}")?;
    summary.errors.push(EventError { line, message });
    Ok(())
}
