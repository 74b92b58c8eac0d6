//! Scan report: bucketed results and their renderings.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tide_core::error::{DataError, IndicatorError};
use tide_core::types::{CrossoverDirection, CrossoverEvent, FilterKind, FilterResult, Side, Tide};
use tide_risk::TradePlan;

const RULE_HEAVY: &str = "═══════════════════════════════════════════════════════════\n";
const RULE_LIGHT: &str = "───────────────────────────────────────────────────────────\n";

/// Signal categories a symbol can be listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    /// Long tide, confirmed or not
    Bullish,
    /// Short tide, confirmed or not
    Bearish,
    /// Long tide with every enabled filter passing
    BullishConfirmed,
    /// Short tide with every enabled filter passing
    BearishConfirmed,
    /// Confirmed long with the breakout filter enabled
    Breakout,
    /// Confirmed short with the breakout filter enabled
    Breakdown,
    CrossoverUp,
    CrossoverDown,
}

impl Bucket {
    pub fn all() -> &'static [Bucket] {
        &[
            Bucket::Bullish,
            Bucket::Bearish,
            Bucket::BullishConfirmed,
            Bucket::BearishConfirmed,
            Bucket::Breakout,
            Bucket::Breakdown,
            Bucket::CrossoverUp,
            Bucket::CrossoverDown,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Bucket::Bullish => "Tide Long",
            Bucket::Bearish => "Tide Short",
            Bucket::BullishConfirmed => "Bullish",
            Bucket::BearishConfirmed => "Bearish",
            Bucket::Breakout => "TLBO Breakout",
            Bucket::Breakdown => "TLBO Breakdown",
            Bucket::CrossoverUp => "Bullish Crossovers",
            Bucket::CrossoverDown => "Bearish Crossovers",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything the pipeline produced for one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolOutcome {
    pub symbol: String,
    pub filter: FilterResult,
    pub crossover: Option<CrossoverEvent>,
    pub plan: Option<TradePlan>,
}

impl SymbolOutcome {
    /// Buckets this outcome belongs to.
    pub fn buckets(&self) -> Vec<Bucket> {
        let mut buckets = Vec::new();

        match self.filter.tide {
            Tide::Long => buckets.push(Bucket::Bullish),
            Tide::Short => buckets.push(Bucket::Bearish),
            Tide::Neutral => {}
        }

        let breakout_enabled = self.filter.enabled.contains(&FilterKind::Breakout);
        match self.filter.confirmed_side() {
            Some(Side::Long) => {
                buckets.push(Bucket::BullishConfirmed);
                if breakout_enabled {
                    buckets.push(Bucket::Breakout);
                }
            }
            Some(Side::Short) => {
                buckets.push(Bucket::BearishConfirmed);
                if breakout_enabled {
                    buckets.push(Bucket::Breakdown);
                }
            }
            None => {}
        }

        match self.crossover.as_ref().map(|event| event.direction) {
            Some(CrossoverDirection::Bullish) => buckets.push(Bucket::CrossoverUp),
            Some(CrossoverDirection::Bearish) => buckets.push(Bucket::CrossoverDown),
            None => {}
        }

        buckets
    }
}

/// Why a symbol produced no outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    Unavailable { attempts: u32 },
    InsufficientHistory { required: usize, available: usize },
    Data { message: String },
    Indicator { message: String },
}

impl From<DataError> for SkipReason {
    fn from(e: DataError) -> Self {
        match e {
            DataError::Unavailable { attempts, .. } => SkipReason::Unavailable { attempts },
            DataError::InsufficientHistory {
                required,
                available,
            } => SkipReason::InsufficientHistory {
                required,
                available,
            },
            other => SkipReason::Data {
                message: other.to_string(),
            },
        }
    }
}

impl From<IndicatorError> for SkipReason {
    fn from(e: IndicatorError) -> Self {
        match e {
            IndicatorError::InsufficientData {
                required,
                available,
            } => SkipReason::InsufficientHistory {
                required,
                available,
            },
            other => SkipReason::Indicator {
                message: other.to_string(),
            },
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Unavailable { attempts } => {
                write!(f, "no data after {} attempts", attempts)
            }
            SkipReason::InsufficientHistory {
                required,
                available,
            } => write!(f, "insufficient history ({} of {} bars)", available, required),
            SkipReason::Data { message } => write!(f, "data error: {}", message),
            SkipReason::Indicator { message } => write!(f, "indicator error: {}", message),
        }
    }
}

/// Aggregate result of a scan.
///
/// Built by merging single-symbol reports. Every collection is keyed by
/// symbol, so the merge is insensitive to the order symbols finish in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScanReport {
    /// Confirmation filters that were switched on
    pub filters: BTreeSet<FilterKind>,
    pub buckets: BTreeMap<Bucket, BTreeSet<String>>,
    /// Trade plans for crossover symbols
    pub trade_plans: BTreeMap<String, TradePlan>,
    pub skipped: BTreeMap<String, SkipReason>,
    /// Watchlist entries processed, skipped ones included
    pub evaluated: usize,
}

impl ScanReport {
    pub fn new(filters: BTreeSet<FilterKind>) -> Self {
        Self {
            filters,
            ..Default::default()
        }
    }

    /// Report for a single watchlist entry.
    pub fn single(
        filters: BTreeSet<FilterKind>,
        symbol: &str,
        result: Result<SymbolOutcome, SkipReason>,
    ) -> Self {
        let mut report = Self::new(filters);
        match result {
            Ok(outcome) => report.record(outcome),
            Err(reason) => report.record_skip(symbol, reason),
        }
        report
    }

    pub fn record(&mut self, outcome: SymbolOutcome) {
        for bucket in outcome.buckets() {
            self.buckets
                .entry(bucket)
                .or_default()
                .insert(outcome.symbol.clone());
        }
        if let Some(plan) = outcome.plan {
            self.trade_plans.insert(outcome.symbol.clone(), plan);
        }
        self.evaluated += 1;
    }

    pub fn record_skip(&mut self, symbol: &str, reason: SkipReason) {
        self.skipped.insert(symbol.to_string(), reason);
        self.evaluated += 1;
    }

    /// Combine two reports. Associative and commutative.
    pub fn merge(mut self, other: ScanReport) -> ScanReport {
        self.filters.extend(other.filters);
        for (bucket, symbols) in other.buckets {
            self.buckets.entry(bucket).or_default().extend(symbols);
        }
        self.trade_plans.extend(other.trade_plans);
        self.skipped.extend(other.skipped);
        self.evaluated += other.evaluated;
        self
    }

    /// Symbols in `bucket`, sorted.
    pub fn symbols(&self, bucket: Bucket) -> Vec<&str> {
        self.buckets
            .get(&bucket)
            .map(|symbols| symbols.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, bucket: Bucket, symbol: &str) -> bool {
        self.buckets
            .get(&bucket)
            .is_some_and(|symbols| symbols.contains(symbol))
    }

    /// Whether any bucket has a symbol.
    pub fn has_signals(&self) -> bool {
        self.buckets.values().any(|symbols| !symbols.is_empty())
    }

    fn filters_line(&self) -> String {
        std::iter::once("Tide")
            .chain(self.filters.iter().map(|kind| kind.label()))
            .collect::<Vec<_>>()
            .join(" + ")
    }

    /// Plain-text table of the confirmed and crossover buckets.
    pub fn console_table(&self) -> String {
        let columns = [
            Bucket::BullishConfirmed,
            Bucket::BearishConfirmed,
            Bucket::Breakout,
            Bucket::Breakdown,
            Bucket::CrossoverUp,
            Bucket::CrossoverDown,
        ];
        let cells: Vec<Vec<&str>> = columns.iter().map(|b| self.symbols(*b)).collect();
        let widths: Vec<usize> = columns
            .iter()
            .zip(&cells)
            .map(|(bucket, symbols)| {
                symbols
                    .iter()
                    .map(|s| s.chars().count())
                    .chain(std::iter::once(bucket.label().len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        let rows = cells.iter().map(Vec::len).max().unwrap_or(0);

        let mut s = String::new();
        s.push_str("Daily Tide Scan Results:\n");
        s.push_str(&format!(" Applied Filters: {}\n\n", self.filters_line()));

        if rows == 0 {
            s.push_str("No signals.\n");
        } else {
            let header: Vec<String> = columns
                .iter()
                .zip(&widths)
                .map(|(bucket, w)| format!("{:<w$}", bucket.label(), w = *w))
                .collect();
            s.push_str(header.join(" | ").trim_end());
            s.push('\n');
            let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
            s.push_str(&rule.join("-+-"));
            s.push('\n');

            for row in 0..rows {
                let line: Vec<String> = cells
                    .iter()
                    .zip(&widths)
                    .map(|(symbols, w)| format!("{:<w$}", symbols.get(row).unwrap_or(&""), w = *w))
                    .collect();
                s.push_str(line.join(" | ").trim_end());
                s.push('\n');
            }
        }

        for plan in self.trade_plans.values() {
            s.push('\n');
            s.push_str(&trade_lines(plan, false));
            s.push('\n');
        }

        s
    }

    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let mut s = String::new();

        s.push_str(RULE_HEAVY);
        s.push_str("                        SCAN REPORT                         \n");
        s.push_str(RULE_HEAVY);
        s.push('\n');

        s.push_str("OVERVIEW\n");
        s.push_str(RULE_LIGHT);
        s.push_str(&format!("  Symbols Evaluated:   {}\n", self.evaluated));
        s.push_str(&format!("  Symbols Skipped:     {}\n", self.skipped.len()));
        s.push_str(&format!("  Filters:             {}\n", self.filters_line()));
        s.push('\n');

        s.push_str("SIGNALS\n");
        s.push_str(RULE_LIGHT);
        for bucket in Bucket::all() {
            let symbols = self.symbols(*bucket);
            let label = format!("{}:", bucket.label());
            if symbols.is_empty() {
                s.push_str(&format!("  {:<21}0\n", label));
            } else {
                s.push_str(&format!(
                    "  {:<21}{} ({})\n",
                    label,
                    symbols.len(),
                    symbols.join(", ")
                ));
            }
        }
        s.push('\n');

        if !self.trade_plans.is_empty() {
            s.push_str("TRADE PLANS\n");
            s.push_str(RULE_LIGHT);
            for plan in self.trade_plans.values() {
                let dp = plan.price_decimals();
                s.push_str(&format!(
                    "  {:<4} {:<14} Entry {:.*}  SL {:.*}  T1 {:.*}  T2 {:.*}\n",
                    action(plan.side),
                    plan.symbol,
                    dp,
                    plan.entry,
                    dp,
                    plan.stop_loss,
                    dp,
                    plan.target_1,
                    dp,
                    plan.target_2
                ));
            }
            s.push('\n');
        }

        if !self.skipped.is_empty() {
            s.push_str("SKIPPED\n");
            s.push_str(RULE_LIGHT);
            for (symbol, reason) in &self.skipped {
                s.push_str(&format!("  {}: {}\n", symbol, reason));
            }
            s.push('\n');
        }

        s.push_str(RULE_HEAVY);

        s
    }

    /// Notification message in Telegram HTML.
    ///
    /// `time_label` is shown in the title, e.g. "15:00".
    pub fn html_message(&self, time_label: &str) -> String {
        let mut sections = vec![format!(
            "📈 <b>Daily Tide Scan</b> ({})\nFilters: {}",
            escape_html(time_label),
            self.filters_line()
        )];

        let mut listed = vec![
            ("🌀", Bucket::BullishConfirmed),
            ("🌀", Bucket::BearishConfirmed),
        ];
        if self.filters.contains(&FilterKind::Breakout) {
            listed.push(("🚀", Bucket::Breakout));
            listed.push(("🔻", Bucket::Breakdown));
        }
        listed.push(("✅", Bucket::CrossoverUp));
        listed.push(("⚠️", Bucket::CrossoverDown));

        for (icon, bucket) in listed {
            let symbols = self.symbols(bucket);
            let body = if symbols.is_empty() {
                "None".to_string()
            } else {
                symbols
                    .iter()
                    .map(|s| escape_html(s))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            sections.push(format!("{} <b>{}</b>:\n{}", icon, bucket.label(), body));
        }

        sections.extend(self.trade_plans.values().map(|plan| trade_lines(plan, true)));

        sections.join("\n\n")
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn action(side: Side) -> &'static str {
    match side {
        Side::Long => "BUY",
        Side::Short => "SELL",
    }
}

/// The entry/stop/targets block for one plan.
pub fn trade_lines(plan: &TradePlan, html: bool) -> String {
    let icon = match plan.side {
        Side::Long => "📈",
        Side::Short => "📉",
    };
    let title = format!("{} {}", action(plan.side), plan.symbol);
    let title = if html {
        format!("<b>{}</b>", escape_html(&title))
    } else {
        title
    };

    let dp = plan.price_decimals();
    format!(
        "{} {}\nEntry: {:.*}\nSL: {:.*}\nT1 ({}R): {:.*}\nT2 ({}R): {:.*}\nRisk-Reward: 1:{}",
        icon,
        title,
        dp,
        plan.entry,
        dp,
        plan.stop_loss,
        plan.reward_multiple(plan.target_1),
        dp,
        plan.target_1,
        plan.reward_multiple(plan.target_2),
        dp,
        plan.target_2,
        plan.risk_reward.normalize()
    )
}

pub(crate) fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
