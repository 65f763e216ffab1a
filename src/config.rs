use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::schedule::{AmortizationCalculator, FlatFee, NoFee, ProRatedFee, ServiceFeePolicy};
use crate::types::TermUnit;

/// how a term length converts into bi-monthly periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PeriodConvention {
    /// term_length x 2 whatever the unit; what existing loans were booked with
    #[default]
    Uniform,
    /// two periods per month, twenty-four per year
    Calendar,
}

impl PeriodConvention {
    /// number of bi-monthly periods, `None` on overflow
    pub fn total_periods(&self, term_length: u32, unit: TermUnit) -> Option<u32> {
        match (self, unit) {
            (PeriodConvention::Uniform, _) | (PeriodConvention::Calendar, TermUnit::Months) => {
                term_length.checked_mul(2)
            }
            (PeriodConvention::Calendar, TermUnit::Years) => term_length.checked_mul(24),
        }
    }
}

/// service fee distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum ServiceFeeMode {
    /// fee rate x principal, spread evenly across periods
    #[default]
    ProRated,
    /// the same fixed amount every period
    FlatPerPeriod { amount: Money },
    None,
}

/// loan policy parameters supplied by the caller at call time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanPolicy {
    /// annual interest percent assigned when a loan doesn't carry its own
    pub default_interest_rate: Decimal,
    /// annual penalty percent on overdue amounts
    pub default_penalty_rate: Decimal,
    /// service fee percent of principal
    pub default_service_fee_rate: Decimal,
    /// days an installment may stay unpaid past its due date before default
    pub grace_period_days: u32,
    #[serde(default)]
    pub period_convention: PeriodConvention,
    #[serde(default)]
    pub service_fee_mode: ServiceFeeMode,
}

impl Default for LoanPolicy {
    fn default() -> Self {
        Self::regular()
    }
}

impl LoanPolicy {
    /// regular cooperative loan
    pub fn regular() -> Self {
        Self {
            default_interest_rate: dec!(12),
            default_penalty_rate: dec!(2),
            default_service_fee_rate: dec!(1),
            grace_period_days: 30,
            period_convention: PeriodConvention::Uniform,
            service_fee_mode: ServiceFeeMode::ProRated,
        }
    }

    /// emergency loan: lower rate, no service fee, shorter grace
    pub fn emergency() -> Self {
        Self {
            default_interest_rate: dec!(6),
            default_penalty_rate: dec!(2),
            default_service_fee_rate: Decimal::ZERO,
            grace_period_days: 15,
            period_convention: PeriodConvention::Uniform,
            service_fee_mode: ServiceFeeMode::None,
        }
    }

    /// parse and validate a policy from json
    pub fn from_json(json: &str) -> Result<Self> {
        let policy: LoanPolicy =
            serde_json::from_str(json).map_err(|e| LoanError::InvalidConfiguration {
                message: e.to_string(),
            })?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<()> {
        let rates = [
            ("default_interest_rate", self.default_interest_rate),
            ("default_penalty_rate", self.default_penalty_rate),
            ("default_service_fee_rate", self.default_service_fee_rate),
        ];
        for (name, value) in rates {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(LoanError::InvalidConfiguration {
                    message: format!("{} must not be negative, got {}", name, value),
                });
            }
        }

        if let ServiceFeeMode::FlatPerPeriod { amount } = &self.service_fee_mode {
            if amount.is_negative() {
                return Err(LoanError::InvalidConfiguration {
                    message: format!("flat service fee must not be negative, got {}", amount),
                });
            }
        }

        Ok(())
    }

    pub fn interest_rate(&self) -> Rate {
        Rate::from_percentage(self.default_interest_rate)
    }

    pub fn penalty_rate(&self) -> Rate {
        Rate::from_percentage(self.default_penalty_rate)
    }

    pub fn service_fee_rate(&self) -> Rate {
        Rate::from_percentage(self.default_service_fee_rate)
    }

    pub fn fee_policy(&self) -> Box<dyn ServiceFeePolicy> {
        match &self.service_fee_mode {
            ServiceFeeMode::ProRated => Box::new(ProRatedFee),
            ServiceFeeMode::FlatPerPeriod { amount } => Box::new(FlatFee::new(*amount)),
            ServiceFeeMode::None => Box::new(NoFee),
        }
    }

    /// calculator wired with this policy's period convention and fee strategy
    pub fn calculator(&self) -> AmortizationCalculator {
        AmortizationCalculator::with_fee_policy(self.fee_policy())
            .period_convention(self.period_convention)
    }
}
