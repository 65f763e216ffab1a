pub mod allocation;
pub mod reconciler;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::ControlNumber;

pub use allocation::{Allocation, AllocationResult, PaymentWaterfall};
pub use reconciler::{apply_payment, PaymentReconciler};

/// money received against a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub control_number: ControlNumber,
    pub amount: Money,
    pub received_date: NaiveDate,
    pub reference: String,
}

impl Payment {
    pub fn new(control_number: ControlNumber, amount: Money, received_date: NaiveDate) -> Self {
        Self {
            control_number,
            amount,
            received_date,
            reference: format!("payment-{}", Uuid::new_v4()),
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }
}
