use thiserror::Error;

use crate::decimal::Money;
use crate::types::{ControlNumber, LoanStatus};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoanError {
    #[error("invalid loan terms: {message}")]
    InvalidTerms {
        message: String,
    },

    #[error("schedule already exists for loan {control_number} ({entries} entries)")]
    ScheduleAlreadyExists {
        control_number: ControlNumber,
        entries: usize,
    },

    #[error("loan {control_number} is already on the book")]
    DuplicateControlNumber {
        control_number: ControlNumber,
    },

    #[error("no loan matches control number {control_number}")]
    UnknownLoan {
        control_number: ControlNumber,
    },

    #[error("invalid payment amount: {amount}")]
    InvalidPayment {
        amount: Money,
    },

    #[error("loan {control_number} is closed: current status is {status:?}")]
    LoanClosed {
        control_number: ControlNumber,
        status: LoanStatus,
    },

    #[error("loan {control_number} has no payment schedule yet")]
    ScheduleNotGenerated {
        control_number: ControlNumber,
    },

    #[error("invalid status transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: LoanStatus,
        to: LoanStatus,
    },

    #[error("invalid control number: {value}")]
    InvalidControlNumber {
        value: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },
}

impl LoanError {
    /// whether the submitter can correct the input and retry
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LoanError::UnknownLoan { .. }
                | LoanError::InvalidPayment { .. }
                | LoanError::LoanClosed { .. }
                | LoanError::InvalidControlNumber { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, LoanError>;
