use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bookable location, as served by the venue directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Venue {
    pub id: Uuid,
    pub name: String,
    pub capacity: u32,
    pub pricing: PricingConfig,
}

/// Owner-maintained pricing rules for a venue
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingConfig {
    /// Price per guest, in cents
    pub base_price_cents: i64,

    /// Ordered seasonal windows. First match wins.
    #[serde(default)]
    pub seasonal_rates: Vec<SeasonalRate>,

    /// Applied on Saturdays and Sundays
    #[serde(default)]
    pub weekend_multiplier: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeasonalRate {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub multiplier: f64,
}

impl SeasonalRate {
    /// Inclusive on both ends
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn overlaps(&self, other: &SeasonalRate) -> bool {
        self.start_date <= other.end_date && other.start_date <= self.end_date
    }
}
