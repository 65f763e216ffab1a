use chrono::NaiveDate;
use hourglass_rs::{SafeTimeProvider, TimeSource};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::LoanPolicy;
use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::types::{ControlNumber, LoanType, TermUnit};

use super::{Loan, LoanTerms};

/// builder for loans; rates left unset fall back to the policy defaults
#[derive(Debug, Default)]
pub struct LoanBuilder {
    control_number: Option<ControlNumber>,
    account_number: Option<String>,
    loan_type: Option<LoanType>,
    purpose: Option<String>,
    take_home_pay: Option<Money>,
    principal: Option<Money>,
    interest_rate: Option<Decimal>,
    term: Option<(u32, TermUnit)>,
    service_fee_rate: Option<Decimal>,
    penalty_rate: Option<Decimal>,
    origination_date: Option<NaiveDate>,
    policy: Option<LoanPolicy>,
}

impl LoanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn control_number(mut self, control_number: ControlNumber) -> Self {
        self.control_number = Some(control_number);
        self
    }

    pub fn account_number(mut self, account: impl Into<String>) -> Self {
        self.account_number = Some(account.into());
        self
    }

    pub fn loan_type(mut self, loan_type: LoanType) -> Self {
        self.loan_type = Some(loan_type);
        self
    }

    pub fn purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    pub fn take_home_pay(mut self, pay: Money) -> Self {
        self.take_home_pay = Some(pay);
        self
    }

    pub fn principal(mut self, amount: Money) -> Self {
        self.principal = Some(amount);
        self
    }

    /// annual percent, e.g. `dec!(12)`
    pub fn interest_rate(mut self, percent: Decimal) -> Self {
        self.interest_rate = Some(percent);
        self
    }

    pub fn term(mut self, length: u32, unit: TermUnit) -> Self {
        self.term = Some((length, unit));
        self
    }

    pub fn term_months(self, months: u32) -> Self {
        self.term(months, TermUnit::Months)
    }

    pub fn term_years(self, years: u32) -> Self {
        self.term(years, TermUnit::Years)
    }

    pub fn service_fee_rate(mut self, percent: Decimal) -> Self {
        self.service_fee_rate = Some(percent);
        self
    }

    pub fn penalty_rate(mut self, percent: Decimal) -> Self {
        self.penalty_rate = Some(percent);
        self
    }

    pub fn origination_date(mut self, date: NaiveDate) -> Self {
        self.origination_date = Some(date);
        self
    }

    pub fn policy(mut self, policy: &LoanPolicy) -> Self {
        self.policy = Some(policy.clone());
        self
    }

    /// build with system time for a missing origination date
    pub fn build(self) -> Result<Loan> {
        let time = SafeTimeProvider::new(TimeSource::System);
        self.build_with_time(&time)
    }

    /// build with an explicit time provider
    pub fn build_with_time(self, time_provider: &SafeTimeProvider) -> Result<Loan> {
        let policy = self.policy.unwrap_or_default();
        policy.validate()?;

        let principal = self.principal.ok_or(LoanError::InvalidTerms {
            message: "principal required".to_string(),
        })?;

        let (term_length, term_unit) = self.term.ok_or(LoanError::InvalidTerms {
            message: "term required".to_string(),
        })?;

        let terms = LoanTerms {
            principal,
            annual_interest_rate_percent: self
                .interest_rate
                .unwrap_or(policy.default_interest_rate),
            term_length,
            term_unit,
            service_fee_rate: self
                .service_fee_rate
                .unwrap_or(policy.default_service_fee_rate),
            penalty_rate: self.penalty_rate.unwrap_or(policy.default_penalty_rate),
            origination_date: self
                .origination_date
                .unwrap_or_else(|| time_provider.now().date_naive()),
        };
        terms.validate()?;

        let account_number = self.account_number.unwrap_or_else(|| {
            format!("ACC-{}", Uuid::new_v4().to_string()[..8].to_uppercase())
        });

        let mut loan = Loan::new(
            self.control_number.unwrap_or_default(),
            account_number,
            terms,
        );
        loan.loan_type = self.loan_type.unwrap_or(LoanType::Regular);
        loan.purpose = self.purpose;
        loan.take_home_pay = self.take_home_pay;

        Ok(loan)
    }
}
