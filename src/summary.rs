use fieldx::fxstruct;
use serde::Serialize;

use crate::session::CartLine;

/// A pluggable discount evaluator. Several independently constructed rules
/// may be supplied at once; [`summarize`] averages their results. The
/// average is a domain rule, not an accident.
pub trait DiscountRule: Send + Sync {
    fn discount(&self, subtotal: f64) -> f64;
}

/// Order-size-tiered discount: nothing below 5000, 5% up to 20000, 10% up
/// to 50000, 15% above.
#[derive(Debug, Clone, Copy, Default)]
pub struct TieredDiscount;

impl DiscountRule for TieredDiscount {
    fn discount(&self, subtotal: f64) -> f64 {
        let percent = if subtotal > 50_000.0 {
            15.0
        }
        else if subtotal > 20_000.0 {
            10.0
        }
        else if subtotal >= 5_000.0 {
            5.0
        }
        else {
            0.0
        };

        subtotal * percent / 100.0
    }
}

/// Process-wide pricing configuration: tax rate and the delivery fee tiers.
/// Constructed once at startup and passed by reference into summary
/// computation.
#[fxstruct(no_new, default(off), builder(vis(pub), doc("Builder object of [`PricingRules`].")), get(copy))]
pub struct PricingRules {
    #[fieldx(default(0.18))]
    tax_rate: f64,

    /// Orders below this subtotal pay the small-order fee.
    #[fieldx(default(500.0))]
    small_order_cutoff: f64,

    /// Orders above this subtotal ship free.
    #[fieldx(default(2000.0))]
    free_delivery_cutoff: f64,

    #[fieldx(default(50.0))]
    small_order_fee: f64,

    #[fieldx(default(30.0))]
    standard_fee: f64,
}

impl PricingRules {
    pub fn delivery_fee(&self, subtotal: f64) -> f64 {
        if subtotal < self.small_order_cutoff() {
            self.small_order_fee()
        }
        else if subtotal <= self.free_delivery_cutoff() {
            self.standard_fee()
        }
        else {
            0.0
        }
    }
}

impl Default for PricingRules {
    fn default() -> Self {
        Self::builder().build().expect("PricingRules defaults")
    }
}

/// Derived aggregate of a cart; computed on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartSummary {
    pub subtotal:     f64,
    pub discount:     f64,
    pub tax:          f64,
    pub delivery_fee: f64,
    pub total:        f64,
}

/// Pure summary computation: no caching, no I/O, deterministic given its
/// inputs.
///
/// The discount is the mean of all supplied rules' results (zero when no
/// rules are supplied), and `total = subtotal - discount + tax +
/// delivery_fee` exactly.
pub fn summarize(items: &[CartLine], rules: &PricingRules, discounts: &[&dyn DiscountRule]) -> CartSummary {
    let subtotal: f64 = items.iter().map(|line| line.unit_price * line.quantity as f64).sum();

    let discount = if discounts.is_empty() {
        0.0
    }
    else {
        discounts.iter().map(|rule| rule.discount(subtotal)).sum::<f64>() / discounts.len() as f64
    };

    let tax = subtotal * rules.tax_rate();
    let delivery_fee = rules.delivery_fee(subtotal);

    CartSummary {
        subtotal,
        discount,
        tax,
        delivery_fee,
        total: subtotal - discount + tax + delivery_fee,
    }
}
