use chrono::{DateTime, Utc};
use log::warn;
use std::collections::HashMap;

use crate::models::{Currency, ExchangeRate};

/// Converts `amount` from one currency to another with a single scalar rate.
///
/// Never fails: a non-finite amount, an unusable rate or a rate for some
/// other pair all yield `0.0`.
pub fn convert(amount: f64, from: Currency, to: Currency, rate: &ExchangeRate) -> f64 {
    if !amount.is_finite() {
        return 0.0;
    }
    if from == to {
        return amount;
    }
    if !rate.is_usable() {
        warn!("Ignoring unusable {}->{} rate {}", rate.from, rate.to, rate.rate);
        return 0.0;
    }

    if rate.from == from && rate.to == to {
        amount * rate.rate
    } else if rate.from == to && rate.to == from {
        amount / rate.rate
    } else {
        warn!(
            "Rate {}->{} cannot convert {} to {}",
            rate.from, rate.to, from, to
        );
        0.0
    }
}

/// Point-in-time rates keyed by currency pair.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    base: Currency,
    rates: HashMap<(Currency, Currency), ExchangeRate>,
}

impl RateTable {
    pub fn new(base: Currency) -> Self {
        RateTable {
            base,
            rates: HashMap::new(),
        }
    }

    /// Hardcoded table used until the rate provider answers at least once.
    pub fn fallback(usd_inr: f64, fetched_at: DateTime<Utc>) -> Self {
        let mut table = RateTable::new(Currency::Usd);
        table.insert(ExchangeRate::new(Currency::Usd, Currency::Inr, usd_inr, fetched_at));
        table
    }

    pub fn insert(&mut self, rate: ExchangeRate) {
        if rate.from == rate.to || !rate.is_usable() {
            return;
        }
        self.rates.remove(&(rate.to, rate.from));
        self.rates.insert((rate.from, rate.to), rate);
    }

    /// Adds every rate of `other`, replacing older quotes for the same pair.
    pub fn merge(&mut self, other: RateTable) {
        for rate in other.rates.into_values() {
            self.insert(rate);
        }
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.rates.values().map(|r| r.fetched_at).max()
    }

    /// Stored quote usable for `from -> to`, in either direction.
    pub fn lookup(&self, from: Currency, to: Currency) -> Option<&ExchangeRate> {
        self.rates
            .get(&(from, to))
            .or_else(|| self.rates.get(&(to, from)))
    }

    pub fn convert(&self, amount: f64, from: Currency, to: Currency) -> f64 {
        if !amount.is_finite() {
            return 0.0;
        }
        if from == to {
            return amount;
        }
        if let Some(rate) = self.lookup(from, to) {
            return convert(amount, from, to, rate);
        }

        // Cross through the base currency.
        match (self.lookup(from, self.base), self.lookup(self.base, to)) {
            (Some(first), Some(second)) => {
                let in_base = convert(amount, from, self.base, first);
                convert(in_base, self.base, to, second)
            }
            _ => {
                warn!("No exchange rate for {} -> {}", from, to);
                0.0
            }
        }
    }

    /// Units of `to` per unit of `from`, when resolvable.
    pub fn effective_rate(&self, from: Currency, to: Currency) -> Option<f64> {
        if from == to {
            return Some(1.0);
        }
        let rate = self.convert(1.0, from, to);
        (rate > 0.0).then_some(rate)
    }
}
