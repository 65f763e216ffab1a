use std::fmt;

use rust_decimal::Decimal;

use crate::decimal::Money;
use crate::loan::LoanTerms;

/// strategy distributing the service fee across installments
pub trait ServiceFeePolicy: Send + Sync + fmt::Debug {
    /// one fee component per period, `periods` long
    fn distribute(&self, terms: &LoanTerms, periods: u32) -> Vec<Money>;
}

/// fee rate x principal, split evenly; the last period takes the rounding
/// remainder, which can be negative when many periods round up
#[derive(Debug, Clone, Copy, Default)]
pub struct ProRatedFee;

impl ServiceFeePolicy for ProRatedFee {
    fn distribute(&self, terms: &LoanTerms, periods: u32) -> Vec<Money> {
        let total = terms.principal.as_decimal() * terms.service_fee_rate().as_decimal();
        spread_evenly(total, periods)
    }
}

/// the same amount charged on every installment
#[derive(Debug, Clone, Copy)]
pub struct FlatFee {
    per_period: Money,
}

impl FlatFee {
    pub fn new(per_period: Money) -> Self {
        Self { per_period }
    }
}

impl ServiceFeePolicy for FlatFee {
    fn distribute(&self, _terms: &LoanTerms, periods: u32) -> Vec<Money> {
        vec![self.per_period; periods as usize]
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoFee;

impl ServiceFeePolicy for NoFee {
    fn distribute(&self, _terms: &LoanTerms, periods: u32) -> Vec<Money> {
        vec![Money::ZERO; periods as usize]
    }
}

/// split `total` into `periods` cent amounts summing to `total` rounded once
pub(crate) fn spread_evenly(total: Decimal, periods: u32) -> Vec<Money> {
    if periods == 0 {
        return Vec::new();
    }

    let each = Money::from_decimal(total / Decimal::from(periods));
    let last = Money::from_decimal(total) - each * Decimal::from(periods - 1);

    let mut parts = vec![each; periods as usize - 1];
    parts.push(last);
    parts
}
