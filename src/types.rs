use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::LoanError;

/// unique identifier assigned to a loan at creation; payments reference it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControlNumber(Uuid);

impl ControlNumber {
    /// issue a fresh control number
    pub fn new() -> Self {
        ControlNumber(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        ControlNumber(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ControlNumber {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ControlNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ControlNumber {
    type Err = LoanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(ControlNumber)
            .map_err(|_| LoanError::InvalidControlNumber {
                value: s.to_string(),
            })
    }
}

/// loan status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanStatus {
    /// created, no schedule applied to the balance yet
    Pending,
    /// schedule generated, balance outstanding
    Active,
    /// every schedule entry settled
    PaidInFull,
    /// an entry stayed unpaid past the grace period
    Defaulted,
    /// never activated
    Rejected,
}

impl LoanStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LoanStatus::PaidInFull | LoanStatus::Defaulted | LoanStatus::Rejected
        )
    }

    /// the single table of legal transitions
    pub fn can_transition_to(&self, next: LoanStatus) -> bool {
        matches!(
            (self, next),
            (LoanStatus::Pending, LoanStatus::Active)
                | (LoanStatus::Pending, LoanStatus::Rejected)
                | (LoanStatus::Active, LoanStatus::PaidInFull)
                | (LoanStatus::Active, LoanStatus::Defaulted)
        )
    }
}

/// unit the term length is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermUnit {
    Months,
    Years,
}

/// cooperative loan products
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanType {
    Regular,
    Emergency,
    Salary,
    Educational,
}

/// part of an installment a payment was applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AllocationComponent {
    ServiceFee,
    Interest,
    Principal,
}

/// payment application totals across all entries touched by one payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PaymentApplication {
    pub to_fees: Money,
    pub to_interest: Money,
    pub to_principal: Money,
    pub excess: Money,
}

impl PaymentApplication {
    pub fn total_applied(&self) -> Money {
        self.to_fees + self.to_interest + self.to_principal
    }

    pub(crate) fn add(&mut self, component: AllocationComponent, amount: Money) {
        match component {
            AllocationComponent::ServiceFee => self.to_fees += amount,
            AllocationComponent::Interest => self.to_interest += amount,
            AllocationComponent::Principal => self.to_principal += amount,
        }
    }
}
