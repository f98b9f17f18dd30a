//! Numeric precision of stored amounts
//!
//! Each constant mirrors a NUMERIC(precision, scale) column, so a value that
//! passes here is stored without rounding or overflow.

use rust_decimal::Decimal;

use crate::error::{BiddingError, BiddingResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precision {
    /// Digits after the decimal point
    pub scale: u32,
    /// Digits before the decimal point
    pub integer_digits: u32,
}

/// `biddings.estimated_value`, NUMERIC(15, 2)
pub const MONEY: Precision = Precision {
    scale: 2,
    integer_digits: 13,
};

/// `proposal_items.quantity`, NUMERIC(15, 4)
pub const QUANTITY: Precision = Precision {
    scale: 4,
    integer_digits: 11,
};

/// Item and proposal totals, NUMERIC(22, 6). Quantity times money never
/// needs more than six decimals.
pub const TOTAL: Precision = Precision {
    scale: 6,
    integer_digits: 16,
};

impl Precision {
    /// Validation error naming `field` when `value` does not fit
    pub fn ensure(&self, field: &str, value: Decimal) -> BiddingResult<()> {
        if value.normalize().scale() > self.scale {
            return Err(BiddingError::Validation(format!(
                "{field} allows at most {} decimal places",
                self.scale
            )));
        }
        let limit = Decimal::from(10u64.pow(self.integer_digits));
        if value.abs() >= limit {
            return Err(BiddingError::Validation(format!(
                "{field} must be below {limit}"
            )));
        }
        Ok(())
    }
}
