use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::PeriodConvention;
use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::loan::LoanTerms;

use super::fees::{spread_evenly, ProRatedFee, ServiceFeePolicy};

/// bi-monthly periods in a year
pub const PERIODS_PER_YEAR: u32 = 24;

/// days between consecutive due dates
pub const PERIOD_LENGTH_DAYS: i64 = 15;

/// one installment of a computed schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentDescriptor {
    pub sequence_number: u32,
    pub due_date: NaiveDate,
    pub principal_component: Money,
    pub interest_component: Money,
    pub service_fee_component: Money,
    pub total_amount: Money,
    /// principal still owed after this installment
    pub running_balance: Money,
}

/// flat-installment calculator.
///
/// Interest is simple interest over the whole term,
/// `principal x (annual% / 100 / 24) x periods`, divided evenly across periods.
/// Principal is divided evenly with the final period absorbing the rounding
/// remainder, positive or negative, so the principal components always sum to
/// the principal exactly.
#[derive(Debug)]
pub struct AmortizationCalculator {
    fee_policy: Box<dyn ServiceFeePolicy>,
    convention: PeriodConvention,
}

impl Default for AmortizationCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl AmortizationCalculator {
    /// pro-rated service fee, uniform period convention
    pub fn new() -> Self {
        Self::with_fee_policy(Box::new(ProRatedFee))
    }

    pub fn with_fee_policy(fee_policy: Box<dyn ServiceFeePolicy>) -> Self {
        Self {
            fee_policy,
            convention: PeriodConvention::Uniform,
        }
    }

    pub fn period_convention(mut self, convention: PeriodConvention) -> Self {
        self.convention = convention;
        self
    }

    pub fn convention(&self) -> PeriodConvention {
        self.convention
    }

    pub fn total_periods(&self, terms: &LoanTerms) -> Result<u32> {
        match self.convention.total_periods(terms.term_length, terms.term_unit) {
            Some(n) if n > 0 => Ok(n),
            _ => Err(LoanError::InvalidTerms {
                message: format!(
                    "term of {} {:?} yields no usable period count",
                    terms.term_length, terms.term_unit
                ),
            }),
        }
    }

    /// compute the full ordered schedule
    pub fn compute_schedule(&self, terms: &LoanTerms) -> Result<Vec<InstallmentDescriptor>> {
        terms.validate()?;
        let periods = self.total_periods(terms)?;

        let interest_each = Money::from_decimal(total_interest(terms, periods) / Decimal::from(periods));
        let principal_parts = spread_evenly(terms.principal.as_decimal(), periods);
        let fee_parts = self.fee_policy.distribute(terms, periods);

        if fee_parts.len() != periods as usize {
            return Err(LoanError::InvalidConfiguration {
                message: format!(
                    "fee policy produced {} components for {} periods",
                    fee_parts.len(),
                    periods
                ),
            });
        }

        let mut installments = Vec::with_capacity(periods as usize);
        let mut balance = terms.principal;

        for (i, (principal_component, service_fee_component)) in
            principal_parts.into_iter().zip(fee_parts).enumerate()
        {
            let sequence_number = i as u32 + 1;
            balance -= principal_component;

            installments.push(InstallmentDescriptor {
                sequence_number,
                due_date: due_date(terms.origination_date, sequence_number)?,
                principal_component,
                interest_component: interest_each,
                service_fee_component,
                total_amount: principal_component + interest_each + service_fee_component,
                running_balance: balance,
            });
        }

        Ok(installments)
    }

    /// quoted installment: (principal + total interest) / periods
    pub fn installment_quote(&self, terms: &LoanTerms) -> Result<Money> {
        terms.validate()?;
        installment_quote_for(terms, self.total_periods(terms)?)
    }
}

/// compute a schedule with the default calculator
pub fn compute_schedule(terms: &LoanTerms) -> Result<Vec<InstallmentDescriptor>> {
    AmortizationCalculator::new().compute_schedule(terms)
}

/// quoted bi-monthly installment for a known period count; excludes service fees
pub fn installment_quote_for(terms: &LoanTerms, periods: u32) -> Result<Money> {
    if periods == 0 {
        return Err(LoanError::InvalidTerms {
            message: "period count must be positive".to_string(),
        });
    }
    let total_due = terms.principal.as_decimal() + total_interest(terms, periods);
    Ok(Money::from_decimal(total_due / Decimal::from(periods)))
}

/// full-precision simple interest over the term
fn total_interest(terms: &LoanTerms, periods: u32) -> Decimal {
    let period_rate = terms.interest_rate().per_period(PERIODS_PER_YEAR);
    terms.principal.as_decimal() * period_rate.as_decimal() * Decimal::from(periods)
}

fn due_date(origination: NaiveDate, sequence_number: u32) -> Result<NaiveDate> {
    origination
        .checked_add_signed(Duration::days(PERIOD_LENGTH_DAYS * i64::from(sequence_number)))
        .ok_or(LoanError::InvalidTerms {
            message: format!("due date of installment {} out of range", sequence_number),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::schedule::{FlatFee, NoFee};
    use crate::types::TermUnit;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn terms(principal: Money, rate: Decimal, length: u32, unit: TermUnit) -> LoanTerms {
        LoanTerms {
            principal,
            annual_interest_rate_percent: rate,
            term_length: length,
            term_unit: unit,
            service_fee_rate: Decimal::ZERO,
            penalty_rate: dec!(2),
            origination_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    #[test]
    fn test_flat_installments_at_one_point_two_percent() {
        // period rate 0.012 / 24 = 0.0005; interest 12000 x 0.0005 x 24 = 144
        let t = terms(Money::from_major(12_000), dec!(1.2), 12, TermUnit::Months);
        assert_eq!(t.interest_rate().per_period(PERIODS_PER_YEAR), Rate::from_decimal(dec!(0.0005)));

        let schedule = compute_schedule(&t).unwrap();
        assert_eq!(schedule.len(), 24);

        for installment in &schedule {
            assert_eq!(installment.principal_component, Money::from_major(500));
            assert_eq!(installment.interest_component, Money::from_major(6));
            assert_eq!(installment.total_amount, Money::from_major(506));
        }
        assert_eq!(
            schedule.iter().map(|i| i.interest_component).sum::<Money>(),
            Money::from_major(144)
        );
        assert_eq!(schedule.last().unwrap().running_balance, Money::ZERO);
    }

    #[test]
    fn test_twelve_percent_uses_period_rate_of_half_percent() {
        // 12% / 24 = 0.005 per period; 12000 x 0.005 x 24 = 1440
        let t = terms(Money::from_major(12_000), dec!(12), 12, TermUnit::Months);
        let schedule = compute_schedule(&t).unwrap();
        assert_eq!(schedule[0].interest_component, Money::from_major(60));
        assert_eq!(schedule[0].total_amount, Money::from_major(560));
        assert_eq!(
            AmortizationCalculator::new().installment_quote(&t).unwrap(),
            Money::from_major(560)
        );
    }

    #[test]
    fn test_one_year_uniform_is_two_periods() {
        let t = terms(Money::from_major(12_000), dec!(12), 1, TermUnit::Years);
        let schedule = compute_schedule(&t).unwrap();
        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule[0].principal_component, Money::from_major(6_000));
        // 12000 x 0.005 x 2 = 120 over 2 periods
        assert_eq!(schedule[0].interest_component, Money::from_major(60));
    }

    #[test]
    fn test_one_year_calendar_is_twenty_four_periods() {
        let t = terms(Money::from_major(12_000), dec!(1.2), 1, TermUnit::Years);
        let calc = AmortizationCalculator::new().period_convention(PeriodConvention::Calendar);
        let schedule = calc.compute_schedule(&t).unwrap();
        assert_eq!(schedule.len(), 24);
        assert_eq!(schedule[0].total_amount, Money::from_major(506));
    }

    #[test]
    fn test_last_principal_absorbs_remainder() {
        // 1000 / 6 = 166.666.. -> 166.67 x 5 + 166.65
        let t = terms(Money::from_major(1_000), Decimal::ZERO, 3, TermUnit::Months);
        let schedule = compute_schedule(&t).unwrap();
        assert_eq!(schedule.len(), 6);
        assert_eq!(schedule[0].principal_component, Money::from_minor(16_667));
        assert_eq!(schedule[5].principal_component, Money::from_minor(16_665));
        assert_eq!(schedule[4].running_balance, Money::from_minor(16_665));
        assert_eq!(schedule[5].running_balance, Money::ZERO);
    }

    #[test]
    fn test_due_dates_every_fifteen_days() {
        let t = terms(Money::from_major(1_000), dec!(5), 2, TermUnit::Months);
        let schedule = compute_schedule(&t).unwrap();
        let dates: Vec<_> = schedule.iter().map(|i| i.due_date).collect();
        assert_eq!(dates, vec![
            NaiveDate::from_ymd_opt(2024, 1, 16).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        ]);
    }

    #[test]
    fn test_service_fee_strategies() {
        let mut t = terms(Money::from_major(12_000), dec!(1.2), 12, TermUnit::Months);
        t.service_fee_rate = dec!(1);

        // 1% of 12000 = 120 over 24 = 5.00 each
        let pro_rated = compute_schedule(&t).unwrap();
        assert_eq!(pro_rated[0].service_fee_component, Money::from_major(5));
        assert_eq!(pro_rated[0].total_amount, Money::from_major(511));

        let flat = AmortizationCalculator::with_fee_policy(Box::new(FlatFee::new(Money::from_major(2))))
            .compute_schedule(&t)
            .unwrap();
        assert_eq!(flat[23].service_fee_component, Money::from_major(2));
        assert_eq!(flat[23].total_amount, Money::from_major(508));

        let none = AmortizationCalculator::with_fee_policy(Box::new(NoFee))
            .compute_schedule(&t)
            .unwrap();
        assert_eq!(none[0].total_amount, Money::from_major(506));
    }

    #[test]
    fn test_invalid_terms_rejected() {
        let zero = terms(Money::ZERO, dec!(12), 12, TermUnit::Months);
        assert!(matches!(compute_schedule(&zero), Err(LoanError::InvalidTerms { .. })));

        let no_term = terms(Money::from_major(100), dec!(12), 0, TermUnit::Months);
        assert!(matches!(compute_schedule(&no_term), Err(LoanError::InvalidTerms { .. })));

        let negative = terms(Money::from_major(100), dec!(-1), 12, TermUnit::Months);
        assert!(matches!(compute_schedule(&negative), Err(LoanError::InvalidTerms { .. })));
    }

    #[test]
    fn test_small_principal_keeps_negative_final_component() {
        // 100.00 over 240 periods: 0.42 x 239 = 100.38 leaves -0.38 for the last
        let t = terms(Money::from_major(100), dec!(12), 120, TermUnit::Months);
        let schedule = compute_schedule(&t).unwrap();

        assert_eq!(schedule.len(), 240);
        assert_eq!(schedule[0].principal_component, Money::from_minor(42));
        let last = schedule.last().unwrap();
        assert_eq!(last.principal_component, Money::from_minor(-38));
        assert_eq!(last.running_balance, Money::ZERO);
        // 100 x 0.005 interest keeps the installment itself positive
        assert_eq!(last.total_amount, Money::from_minor(12));

        let sum: Money = schedule.iter().map(|i| i.principal_component).sum();
        assert_eq!(sum, Money::from_major(100));
    }

    proptest! {
        #[test]
        fn prop_principal_components_sum_to_principal(
            cents in 100_000i64..100_000_000,
            rate_bps in 0i64..3_000,
            length in 1u32..=60,
            years in any::<bool>(),
        ) {
            let unit = if years { TermUnit::Years } else { TermUnit::Months };
            let principal = Money::from_minor(cents);
            let t = terms(principal, Decimal::new(rate_bps, 2), length, unit);

            let schedule = compute_schedule(&t).unwrap();
            let sum: Money = schedule.iter().map(|i| i.principal_component).sum();
            prop_assert_eq!(sum, principal);
            prop_assert_eq!(schedule.last().unwrap().running_balance, Money::ZERO);
        }

        #[test]
        fn prop_uniform_periods_are_twice_term_length(
            length in 1u32..=120,
            years in any::<bool>(),
        ) {
            let unit = if years { TermUnit::Years } else { TermUnit::Months };
            let t = terms(Money::from_major(50_000), dec!(10), length, unit);
            let schedule = compute_schedule(&t).unwrap();
            prop_assert_eq!(schedule.len() as u32, length * 2);
        }

        #[test]
        fn prop_installments_strictly_ordered(
            length in 1u32..=36,
        ) {
            let t = terms(Money::from_major(9_999), dec!(7.5), length, TermUnit::Months);
            let schedule = compute_schedule(&t).unwrap();
            for pair in schedule.windows(2) {
                prop_assert_eq!(pair[1].sequence_number, pair[0].sequence_number + 1);
                prop_assert!(pair[1].due_date > pair[0].due_date);
            }
        }
    }
}
