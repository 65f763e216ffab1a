/// serialization support for loans
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::PeriodConvention;
use crate::decimal::Money;
use crate::schedule::installment_quote_for;
use crate::types::{ControlNumber, LoanStatus, LoanType, TermUnit};

use super::{Loan, ScheduleEntry};

/// serializable view of a loan and its payment schedule
#[derive(Debug, Serialize, Deserialize)]
pub struct LoanView {
    pub control_number: ControlNumber,
    pub account_number: String,
    pub loan_amount: Money,
    pub loan_type: LoanType,
    pub interest_rate: Decimal,
    pub loan_period: u32,
    pub loan_period_unit: TermUnit,
    pub loan_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub status: LoanStatus,
    pub take_home_pay: Option<Money>,
    pub service_fee: Decimal,
    pub penalty_rate: Decimal,
    pub purpose: Option<String>,
    /// quoted installment; the schedule amounts are authoritative
    pub bi_monthly_installment: Option<Money>,
    pub outstanding_balance: Money,
    pub payment_schedule: Vec<ScheduleEntryView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleEntryView {
    pub sequence_number: u32,
    pub principal_amount: Money,
    pub interest_amount: Money,
    pub service_fee_component: Money,
    pub payment_amount: Money,
    pub due_date: NaiveDate,
    pub balance: Money,
    pub is_paid: bool,
    pub amount_paid: Money,
    pub paid_date: Option<NaiveDate>,
}

impl From<&ScheduleEntry> for ScheduleEntryView {
    fn from(entry: &ScheduleEntry) -> Self {
        ScheduleEntryView {
            sequence_number: entry.sequence_number,
            principal_amount: entry.principal_component,
            interest_amount: entry.interest_component,
            service_fee_component: entry.service_fee_component,
            payment_amount: entry.total_amount,
            due_date: entry.due_date,
            balance: entry.running_balance,
            is_paid: entry.is_paid,
            amount_paid: entry.amount_paid,
            paid_date: entry.paid_date,
        }
    }
}

impl LoanView {
    pub fn from_loan(loan: &Loan) -> Self {
        let terms = loan.terms();

        // a generated schedule fixes the period count; otherwise quote the default convention
        let periods = if loan.has_schedule() {
            u32::try_from(loan.schedule().len()).ok()
        } else {
            PeriodConvention::default().total_periods(terms.term_length, terms.term_unit)
        };

        LoanView {
            control_number: loan.control_number(),
            account_number: loan.account_number.clone(),
            loan_amount: terms.principal,
            loan_type: loan.loan_type,
            interest_rate: terms.annual_interest_rate_percent,
            loan_period: terms.term_length,
            loan_period_unit: terms.term_unit,
            loan_date: loan.loan_date(),
            due_date: loan.maturity_date(),
            status: loan.status(),
            take_home_pay: loan.take_home_pay,
            service_fee: terms.service_fee_rate,
            penalty_rate: terms.penalty_rate,
            purpose: loan.purpose.clone(),
            bi_monthly_installment: periods.and_then(|n| installment_quote_for(terms, n).ok()),
            outstanding_balance: loan.outstanding_balance(),
            payment_schedule: loan.schedule().iter().map(ScheduleEntryView::from).collect(),
        }
    }
}
