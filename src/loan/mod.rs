pub mod builder;
pub mod view;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::schedule::InstallmentDescriptor;
use crate::types::{ControlNumber, LoanStatus, LoanType, TermUnit};

pub use builder::LoanBuilder;
pub use view::{LoanView, ScheduleEntryView};

/// immutable repayment terms of a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    /// annual percent, e.g. 12 for 12%
    pub annual_interest_rate_percent: Decimal,
    pub term_length: u32,
    pub term_unit: TermUnit,
    /// percent of principal
    pub service_fee_rate: Decimal,
    /// annual percent charged on overdue amounts
    pub penalty_rate: Decimal,
    pub origination_date: NaiveDate,
}

impl LoanTerms {
    pub fn validate(&self) -> Result<()> {
        if !self.principal.is_positive() {
            return Err(LoanError::InvalidTerms {
                message: format!("principal must be positive, got {}", self.principal),
            });
        }

        if self.term_length == 0 {
            return Err(LoanError::InvalidTerms {
                message: "term length must be positive".to_string(),
            });
        }

        let rates = [
            ("interest rate", self.annual_interest_rate_percent),
            ("service fee rate", self.service_fee_rate),
            ("penalty rate", self.penalty_rate),
        ];
        for (name, value) in rates {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(LoanError::InvalidTerms {
                    message: format!("{} must not be negative, got {}", name, value),
                });
            }
        }

        Ok(())
    }

    pub fn interest_rate(&self) -> Rate {
        Rate::from_percentage(self.annual_interest_rate_percent)
    }

    pub fn service_fee_rate(&self) -> Rate {
        Rate::from_percentage(self.service_fee_rate)
    }

    pub fn penalty_rate(&self) -> Rate {
        Rate::from_percentage(self.penalty_rate)
    }
}

/// one persisted installment of a loan's schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub sequence_number: u32,
    pub due_date: NaiveDate,
    pub principal_component: Money,
    pub interest_component: Money,
    pub service_fee_component: Money,
    pub total_amount: Money,
    pub running_balance: Money,
    pub is_paid: bool,
    pub amount_paid: Money,
    pub paid_date: Option<NaiveDate>,
}

impl ScheduleEntry {
    pub fn from_descriptor(descriptor: &InstallmentDescriptor) -> Self {
        Self {
            sequence_number: descriptor.sequence_number,
            due_date: descriptor.due_date,
            principal_component: descriptor.principal_component,
            interest_component: descriptor.interest_component,
            service_fee_component: descriptor.service_fee_component,
            total_amount: descriptor.total_amount,
            running_balance: descriptor.running_balance,
            is_paid: false,
            amount_paid: Money::ZERO,
            paid_date: None,
        }
    }

    pub fn remaining_due(&self) -> Money {
        self.total_amount - self.amount_paid
    }

    /// days elapsed since the due date, zero when not yet due
    pub fn days_past_due(&self, as_of: NaiveDate) -> u32 {
        let days = (as_of - self.due_date).num_days();
        u32::try_from(days.max(0)).unwrap_or(u32::MAX)
    }

    /// unpaid and overdue by more than the grace period
    pub fn is_past_grace(&self, as_of: NaiveDate, grace_period_days: u32) -> bool {
        !self.is_paid && self.days_past_due(as_of) > grace_period_days
    }
}

/// loan aggregate: terms, status, cached balance and the owned schedule.
///
/// The balance is never trusted from storage: deserializing rebuilds it from
/// the schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredLoan")]
pub struct Loan {
    control_number: ControlNumber,
    pub account_number: String,
    pub loan_type: LoanType,
    pub purpose: Option<String>,
    pub take_home_pay: Option<Money>,
    terms: LoanTerms,
    status: LoanStatus,
    status_changed_on: NaiveDate,
    outstanding_balance: Money,
    schedule: Vec<ScheduleEntry>,
}

/// persisted shape of a loan; a stored `outstanding_balance` is ignored
#[derive(Deserialize)]
struct StoredLoan {
    control_number: ControlNumber,
    account_number: String,
    loan_type: LoanType,
    purpose: Option<String>,
    take_home_pay: Option<Money>,
    terms: LoanTerms,
    status: LoanStatus,
    status_changed_on: NaiveDate,
    schedule: Vec<ScheduleEntry>,
}

impl From<StoredLoan> for Loan {
    fn from(stored: StoredLoan) -> Self {
        let mut loan = Loan {
            control_number: stored.control_number,
            account_number: stored.account_number,
            loan_type: stored.loan_type,
            purpose: stored.purpose,
            take_home_pay: stored.take_home_pay,
            terms: stored.terms,
            status: stored.status,
            status_changed_on: stored.status_changed_on,
            outstanding_balance: Money::ZERO,
            schedule: stored.schedule,
        };
        loan.recompute_balance();
        loan
    }
}

impl Loan {
    /// create a pending loan with no schedule
    pub fn new(control_number: ControlNumber, account_number: String, terms: LoanTerms) -> Self {
        let status_changed_on = terms.origination_date;
        Self {
            control_number,
            account_number,
            loan_type: LoanType::Regular,
            purpose: None,
            take_home_pay: None,
            terms,
            status: LoanStatus::Pending,
            status_changed_on,
            outstanding_balance: Money::ZERO,
            schedule: Vec::new(),
        }
    }

    pub fn builder() -> LoanBuilder {
        LoanBuilder::new()
    }

    pub fn control_number(&self) -> ControlNumber {
        self.control_number
    }

    pub fn terms(&self) -> &LoanTerms {
        &self.terms
    }

    pub fn status(&self) -> LoanStatus {
        self.status
    }

    pub fn status_changed_on(&self) -> NaiveDate {
        self.status_changed_on
    }

    pub fn outstanding_balance(&self) -> Money {
        self.outstanding_balance
    }

    pub fn schedule(&self) -> &[ScheduleEntry] {
        &self.schedule
    }

    pub fn has_schedule(&self) -> bool {
        !self.schedule.is_empty()
    }

    /// loan date is the origination date
    pub fn loan_date(&self) -> NaiveDate {
        self.terms.origination_date
    }

    /// due date of the last installment
    pub fn maturity_date(&self) -> Option<NaiveDate> {
        self.schedule.last().map(|e| e.due_date)
    }

    /// earliest unpaid entry by sequence number
    pub fn next_unpaid(&self) -> Option<&ScheduleEntry> {
        self.schedule.iter().find(|e| !e.is_paid)
    }

    pub fn total_scheduled(&self) -> Money {
        self.schedule.iter().map(|e| e.total_amount).sum()
    }

    pub fn total_paid(&self) -> Money {
        self.schedule.iter().map(|e| e.amount_paid).sum()
    }

    pub fn is_fully_paid(&self) -> bool {
        self.has_schedule() && self.schedule.iter().all(|e| e.is_paid)
    }

    pub(crate) fn first_unpaid_index(&self) -> Option<usize> {
        self.schedule.iter().position(|e| !e.is_paid)
    }

    pub(crate) fn entry_mut(&mut self, index: usize) -> &mut ScheduleEntry {
        &mut self.schedule[index]
    }

    pub(crate) fn install_schedule(&mut self, entries: Vec<ScheduleEntry>) {
        self.schedule = entries;
        self.recompute_balance();
    }

    /// outstanding balance = sum of (total - paid) over every entry
    pub(crate) fn recompute_balance(&mut self) -> Money {
        self.outstanding_balance = self.schedule.iter().map(|e| e.remaining_due()).sum();
        self.outstanding_balance
    }

    pub(crate) fn set_status(&mut self, status: LoanStatus, on: NaiveDate) {
        self.status = status;
        self.status_changed_on = on;
    }

    /// get json representation of current state
    pub fn to_json_pretty(&self) -> String {
        let view = LoanView::from_loan(self);
        serde_json::to_string_pretty(&view).unwrap_or_else(|e| format!("JSON error: {}", e))
    }
}
