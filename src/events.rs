use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::loan::ScheduleEntry;
use crate::types::{ControlNumber, LoanStatus, PaymentApplication};

/// mutations emitted by engine operations.
///
/// The engine never persists anything itself; callers drain these after each
/// operation and commit them in one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    ScheduleGenerated {
        control_number: ControlNumber,
        entries: Vec<ScheduleEntry>,
        outstanding_balance: Money,
    },
    PaymentReceived {
        control_number: ControlNumber,
        amount: Money,
        received_date: NaiveDate,
        reference: String,
        application: PaymentApplication,
    },
    ScheduleEntryUpdated {
        control_number: ControlNumber,
        sequence_number: u32,
        amount_paid: Money,
        is_paid: bool,
        paid_date: Option<NaiveDate>,
    },
    OverpaymentReported {
        control_number: ControlNumber,
        amount: Money,
        received_date: NaiveDate,
    },
    BalanceUpdated {
        control_number: ControlNumber,
        outstanding_balance: Money,
    },
    StatusChanged {
        control_number: ControlNumber,
        old_status: LoanStatus,
        new_status: LoanStatus,
        reason: String,
        date: NaiveDate,
    },
}

impl Event {
    pub fn control_number(&self) -> ControlNumber {
        match self {
            Event::ScheduleGenerated { control_number, .. }
            | Event::PaymentReceived { control_number, .. }
            | Event::ScheduleEntryUpdated { control_number, .. }
            | Event::OverpaymentReported { control_number, .. }
            | Event::BalanceUpdated { control_number, .. }
            | Event::StatusChanged { control_number, .. } => *control_number,
        }
    }
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
