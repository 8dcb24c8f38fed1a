//! Storage pricing
//!
//! The storage pricing record travels with the gas schedule but is owned by
//! its own store. The governor only forwards it and decides whether the
//! change needs an immediate reconfiguration.

use serde::{Deserialize, Serialize};

/// One point on a pricing curve, both axes in basis points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub x: u64,
    pub y: u64,
}

/// Piecewise-linear curve mapping utilization to a per-unit price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingCurve {
    pub min_gas: u64,
    pub max_gas: u64,
    pub points: Vec<CurvePoint>,
}

impl PricingCurve {
    /// A curve that rises linearly from `min_gas` to `max_gas`
    pub fn linear(min_gas: u64, max_gas: u64) -> Self {
        Self {
            min_gas,
            max_gas,
            points: Vec::new(),
        }
    }
}

/// Pricing for one storage dimension (items or bytes)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsagePricing {
    pub target_usage: u64,
    pub read_curve: PricingCurve,
    pub create_curve: PricingCurve,
    pub write_curve: PricingCurve,
}

/// Storage pricing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoragePricing {
    pub item: UsagePricing,
    pub byte: UsagePricing,
}

impl Default for StoragePricing {
    fn default() -> Self {
        Self {
            item: UsagePricing {
                target_usage: 2_000_000_000,
                read_curve: PricingCurve::linear(300_000, 300_000 * 100),
                create_curve: PricingCurve::linear(300_000, 300_000 * 100),
                write_curve: PricingCurve::linear(300_000, 300_000 * 100),
            },
            byte: UsagePricing {
                target_usage: 1_000_000_000_000,
                read_curve: PricingCurve::linear(300, 300 * 100),
                create_curve: PricingCurve::linear(5_000, 5_000 * 100),
                write_curve: PricingCurve::linear(5_000, 5_000 * 100),
            },
        }
    }
}
