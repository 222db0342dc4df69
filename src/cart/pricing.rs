//! Totals computation and discount rules.
//!
//! | Figure     | Rule                                                    |
//! |------------|---------------------------------------------------------|
//! | `subtotal` | Σ price × quantity, rounded to cents                    |
//! | `tax`      | subtotal × tax rate, rounded to cents                   |
//! | `shipping` | flat fee when the cart has any line, otherwise zero     |
//! | `total`    | max(0, subtotal + tax + shipping − discount), rounded   |

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::types::{CartItem, Totals};

/// Error recorded when a non-empty code matches no rule.
pub const INVALID_DISCOUNT_MESSAGE: &str = "Invalid discount code";

/// Round to two decimal places, halves away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// How a discount code turns into an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// `value` is a flat amount off the total.
    Fixed,
    /// `value` is a percentage of the undiscounted subtotal.
    Percent,
}

/// A named code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountRule {
    pub code: String,
    pub kind: DiscountKind,
    pub value: Decimal,
}

impl DiscountRule {
    pub fn fixed(code: &str, amount: Decimal) -> Self {
        Self {
            code: code.to_string(),
            kind: DiscountKind::Fixed,
            value: amount,
        }
    }

    pub fn percent(code: &str, percent: Decimal) -> Self {
        Self {
            code: code.to_string(),
            kind: DiscountKind::Percent,
            value: percent,
        }
    }

    fn matches(&self, code: &str) -> bool {
        self.code.eq_ignore_ascii_case(code)
    }
}

/// The built-in codes: `SAVE10` takes 10 off, `HALFOFF` takes 50% of the subtotal.
pub fn default_discounts() -> Vec<DiscountRule> {
    vec![
        DiscountRule::fixed("SAVE10", Decimal::TEN),
        DiscountRule::percent("HALFOFF", Decimal::from(50)),
    ]
}

/// Result of evaluating a discount code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountOutcome {
    /// The trimmed code as entered.
    pub code: String,
    pub amount: Decimal,
    pub error: Option<String>,
}

/// Tax, shipping and discount settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingRules {
    pub tax_rate: Decimal,
    pub shipping_flat: Decimal,
    pub discounts: Vec<DiscountRule>,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(10, 2),
            shipping_flat: Decimal::new(500, 2),
            discounts: default_discounts(),
        }
    }
}

impl PricingRules {
    pub fn calc_totals(&self, items: &[CartItem], discount_amount: Decimal) -> Totals {
        let subtotal = round_money(items.iter().map(CartItem::line_total).sum());
        let tax = round_money(subtotal * self.tax_rate);
        let shipping = if items.is_empty() {
            Decimal::ZERO
        } else {
            self.shipping_flat
        };
        let total = round_money(subtotal + tax + shipping - discount_amount).max(Decimal::ZERO);

        Totals {
            subtotal,
            tax,
            shipping,
            total,
        }
    }

    /// Evaluate `code` against the rule table for the given items.
    ///
    /// An empty code clears the discount without an error.
    pub fn evaluate_discount(&self, code: &str, items: &[CartItem]) -> DiscountOutcome {
        let code = code.trim().to_string();
        if code.is_empty() {
            return DiscountOutcome {
                code,
                amount: Decimal::ZERO,
                error: None,
            };
        }

        match self.discounts.iter().find(|r| r.matches(&code)) {
            Some(rule) => {
                let amount = match rule.kind {
                    DiscountKind::Fixed => rule.value,
                    DiscountKind::Percent => {
                        let base = self.calc_totals(items, Decimal::ZERO).subtotal;
                        round_money(base * rule.value / Decimal::ONE_HUNDRED)
                    }
                };
                DiscountOutcome {
                    code,
                    amount,
                    error: None,
                }
            }
            None => DiscountOutcome {
                code,
                amount: Decimal::ZERO,
                error: Some(INVALID_DISCOUNT_MESSAGE.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn sample_items() -> Vec<CartItem> {
        vec![
            CartItem::new("a", "A", dec("10"), 2, "").unwrap(),
            CartItem::new("b", "B", dec("5"), 1, "").unwrap(),
        ]
    }

    #[test]
    fn test_totals_for_sample_cart() {
        let totals = PricingRules::default().calc_totals(&sample_items(), Decimal::ZERO);
        assert_eq!(totals.subtotal, dec("25.00"));
        assert_eq!(totals.tax, dec("2.50"));
        assert_eq!(totals.shipping, dec("5.00"));
        assert_eq!(totals.total, dec("32.50"));
    }

    #[test]
    fn test_empty_cart_has_no_shipping() {
        let totals = PricingRules::default().calc_totals(&[], Decimal::ZERO);
        assert_eq!(totals, Totals::default());
    }

    #[test]
    fn test_total_never_negative() {
        let items = vec![CartItem::new("a", "A", dec("1"), 1, "").unwrap()];
        let totals = PricingRules::default().calc_totals(&items, dec("100"));
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn test_tax_rounds_half_away_from_zero() {
        // 0.05 * 0.10 = 0.005 -> 0.01
        let items = vec![CartItem::new("a", "A", dec("0.05"), 1, "").unwrap()];
        let totals = PricingRules::default().calc_totals(&items, Decimal::ZERO);
        assert_eq!(totals.tax, dec("0.01"));
    }

    #[test]
    fn test_save10_is_case_insensitive_and_trimmed() {
        let outcome = PricingRules::default().evaluate_discount("  save10 ", &sample_items());
        assert_eq!(outcome.code, "save10");
        assert_eq!(outcome.amount, dec("10"));
        assert!(outcome.error.is_none());
    }

    #[test]
    fn test_halfoff_uses_undiscounted_subtotal() {
        let outcome = PricingRules::default().evaluate_discount("HalfOff", &sample_items());
        assert_eq!(outcome.amount, dec("12.50"));
    }

    #[test]
    fn test_unknown_code_sets_error() {
        let outcome = PricingRules::default().evaluate_discount("bogus", &sample_items());
        assert_eq!(outcome.amount, Decimal::ZERO);
        assert_eq!(outcome.error.as_deref(), Some(INVALID_DISCOUNT_MESSAGE));
    }

    #[test]
    fn test_blank_code_clears_without_error() {
        let outcome = PricingRules::default().evaluate_discount("   ", &sample_items());
        assert_eq!(outcome.code, "");
        assert_eq!(outcome.amount, Decimal::ZERO);
        assert!(outcome.error.is_none());
    }

    #[test]
    fn test_custom_rules_replace_defaults() {
        let rules = PricingRules {
            discounts: vec![DiscountRule::percent("QUARTER", dec("25"))],
            ..Default::default()
        };
        assert_eq!(
            rules.evaluate_discount("quarter", &sample_items()).amount,
            dec("6.25")
        );
        assert!(
            rules
                .evaluate_discount("SAVE10", &sample_items())
                .error
                .is_some()
        );
    }

    #[test]
    fn test_discount_rule_toml_shape() {
        let rule: DiscountRule = toml::from_str("code = \"SAVE5\"\nkind = \"fixed\"\nvalue = \"5\"").unwrap();
        assert_eq!(rule, DiscountRule::fixed("SAVE5", dec("5")));
    }
}
