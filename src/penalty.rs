use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::LoanPolicy;
use crate::decimal::{Money, Rate};
use crate::loan::Loan;
use crate::types::ControlNumber;

const DAYS_PER_YEAR: Decimal = dec!(365);

/// engine for quoting late-payment penalties.
///
/// Quotes only: nothing here touches the schedule or the balance, so a
/// penalty is something the caller decides to bill separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyEngine {
    /// days past due before penalties apply
    pub grace_period_days: u32,
    /// floor for any charged line
    pub minimum_penalty: Money,
}

impl PenaltyEngine {
    pub fn new(grace_period_days: u32) -> Self {
        Self {
            grace_period_days,
            minimum_penalty: Money::ZERO,
        }
    }

    pub fn from_policy(policy: &LoanPolicy) -> Self {
        Self::new(policy.grace_period_days)
    }

    pub fn with_minimum_penalty(mut self, minimum: Money) -> Self {
        self.minimum_penalty = minimum;
        self
    }

    /// simple daily penalty on an overdue amount, `annual_rate` over 365 days
    pub fn calculate_penalty(
        &self,
        overdue_amount: Money,
        days_overdue: u32,
        annual_rate: Rate,
    ) -> PenaltyCalculation {
        if days_overdue <= self.grace_period_days {
            return PenaltyCalculation {
                penalty_amount: Money::ZERO,
                days_charged: 0,
                overdue_base: overdue_amount,
                grace_applied: true,
            };
        }

        let days_charged = days_overdue - self.grace_period_days;
        let daily_rate = annual_rate.as_decimal() / DAYS_PER_YEAR;
        let penalty = overdue_amount.as_decimal() * daily_rate * Decimal::from(days_charged);

        PenaltyCalculation {
            penalty_amount: Money::from_decimal(penalty).max(self.minimum_penalty),
            days_charged,
            overdue_base: overdue_amount,
            grace_applied: false,
        }
    }

    /// penalty quote for every unpaid entry past the grace period
    pub fn assess(&self, loan: &Loan, as_of: NaiveDate) -> PenaltyAssessment {
        let rate = loan.terms().penalty_rate();

        let lines: Vec<PenaltyLine> = loan
            .schedule()
            .iter()
            .filter(|e| e.is_past_grace(as_of, self.grace_period_days))
            .map(|e| {
                let calc = self.calculate_penalty(e.remaining_due(), e.days_past_due(as_of), rate);
                PenaltyLine {
                    sequence_number: e.sequence_number,
                    due_date: e.due_date,
                    overdue_amount: calc.overdue_base,
                    days_charged: calc.days_charged,
                    penalty: calc.penalty_amount,
                }
            })
            .collect();

        PenaltyAssessment {
            control_number: loan.control_number(),
            as_of,
            penalty_rate: rate,
            total: lines.iter().map(|l| l.penalty).sum(),
            lines,
        }
    }
}

/// quote penalties on a loan with the given grace period
pub fn assess_penalty(loan: &Loan, as_of: NaiveDate, grace_period_days: u32) -> PenaltyAssessment {
    PenaltyEngine::new(grace_period_days).assess(loan, as_of)
}

/// penalty calculation result
#[derive(Debug, Clone, PartialEq)]
pub struct PenaltyCalculation {
    pub penalty_amount: Money,
    pub days_charged: u32,
    pub overdue_base: Money,
    pub grace_applied: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyLine {
    pub sequence_number: u32,
    pub due_date: NaiveDate,
    pub overdue_amount: Money,
    pub days_charged: u32,
    pub penalty: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyAssessment {
    pub control_number: ControlNumber,
    pub as_of: NaiveDate,
    pub penalty_rate: Rate,
    pub lines: Vec<PenaltyLine>,
    pub total: Money,
}

impl PenaltyAssessment {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
