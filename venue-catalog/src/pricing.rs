use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use venue_shared::{PricingConfig, PricingSnapshot};

/// Result of a price calculation. All amounts in cents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceBreakdown {
    pub base_price_cents: i64,
    pub guest_count: u32,
    pub seasonal_multiplier: f64,
    pub weekend_multiplier: f64,

    /// base price × guests, before multipliers
    pub subtotal_cents: i64,

    pub total_amount_cents: i64,

    /// Name of the seasonal window that matched, if any
    pub season_name: Option<String>,
}

impl PriceBreakdown {
    pub fn snapshot(&self) -> PricingSnapshot {
        PricingSnapshot {
            base_price_cents: self.base_price_cents,
            seasonal_multiplier: self.seasonal_multiplier,
            weekend_multiplier: self.weekend_multiplier,
            total_amount_cents: self.total_amount_cents,
            guest_count: self.guest_count,
        }
    }
}

/// Stateless per-guest pricing. Reads only the config snapshot it is given.
#[derive(Debug, Clone, Copy, Default)]
pub struct PricingCalculator;

impl PricingCalculator {
    pub fn new() -> Self {
        Self
    }

    pub fn calculate(&self, config: &PricingConfig, event_date: NaiveDate, guest_count: u32) -> PriceBreakdown {
        let (seasonal_multiplier, season_name) = match self.seasonal_rate(config, event_date) {
            Some((multiplier, name)) => (multiplier, Some(name.to_string())),
            None => (1.0, None),
        };
        let weekend_multiplier = self.weekend_multiplier(config, event_date);

        let subtotal_cents = config.base_price_cents * i64::from(guest_count);
        let total = subtotal_cents as f64 * seasonal_multiplier * weekend_multiplier;

        PriceBreakdown {
            base_price_cents: config.base_price_cents,
            guest_count,
            seasonal_multiplier,
            weekend_multiplier,
            subtotal_cents,
            // f64::round is half-away-from-zero, i.e. standard rounding to the cent
            total_amount_cents: total.round() as i64,
            season_name,
        }
    }

    /// First window containing `date` wins; overlaps are not resolved here.
    fn seasonal_rate<'a>(&self, config: &'a PricingConfig, date: NaiveDate) -> Option<(f64, &'a str)> {
        config
            .seasonal_rates
            .iter()
            .find(|rate| rate.contains(date))
            .map(|rate| (rate.multiplier, rate.name.as_str()))
    }

    fn weekend_multiplier(&self, config: &PricingConfig, date: NaiveDate) -> f64 {
        match date.weekday() {
            Weekday::Sat | Weekday::Sun => config.weekend_multiplier.unwrap_or(1.0),
            _ => 1.0,
        }
    }

    /// Pairs of seasonal window names whose date ranges intersect
    pub fn overlapping_windows(&self, config: &PricingConfig) -> Vec<(String, String)> {
        let rates = &config.seasonal_rates;
        let mut overlaps = Vec::new();
        for (i, a) in rates.iter().enumerate() {
            for b in &rates[i + 1..] {
                if a.overlaps(b) {
                    overlaps.push((a.name.clone(), b.name.clone()));
                }
            }
        }
        overlaps
    }
}
