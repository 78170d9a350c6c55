pub mod pricing;

pub use pricing::{PriceBreakdown, PricingCalculator};
