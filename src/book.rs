use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::config::LoanPolicy;
use crate::errors::{LoanError, Result};
use crate::events::{Event, EventStore};
use crate::loan::{Loan, ScheduleEntry};
use crate::payments::{AllocationResult, Payment, PaymentReconciler};
use crate::penalty::{PenaltyAssessment, PenaltyEngine};
use crate::schedule::{self, AmortizationCalculator};
use crate::status;
use crate::types::{ControlNumber, LoanStatus};

/// lookup of loans by control number
pub trait LoanRepository: Send + Sync {
    fn insert(&self, loan: Loan) -> Result<()>;
    /// snapshot of the loan's current state
    fn get(&self, control_number: ControlNumber) -> Result<Loan>;
    fn contains(&self, control_number: ControlNumber) -> bool;
    fn control_numbers(&self) -> Vec<ControlNumber>;
}

/// value of an operation plus the mutations to persist with it
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub events: Vec<Event>,
}

impl<T> Outcome<T> {
    fn new(value: T, events: &mut EventStore) -> Self {
        Self {
            value,
            events: events.take_events(),
        }
    }
}

#[derive(Debug)]
struct LoanRecord {
    loan: Loan,
    payments: Vec<Payment>,
}

type Handle = Arc<Mutex<LoanRecord>>;

/// in-memory loan book.
///
/// Loans live behind one mutex each inside a read/write map, so operations on
/// the same loan serialize while different loans proceed in parallel. Every
/// mutating call hands back the events it produced; committing them is the
/// caller's job.
pub struct LoanBook {
    policy: LoanPolicy,
    calculator: AmortizationCalculator,
    reconciler: PaymentReconciler,
    loans: RwLock<HashMap<ControlNumber, Handle>>,
}

impl LoanBook {
    pub fn new(policy: LoanPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            calculator: policy.calculator(),
            reconciler: PaymentReconciler::new(&policy),
            policy,
            loans: RwLock::new(HashMap::new()),
        })
    }

    pub fn policy(&self) -> &LoanPolicy {
        &self.policy
    }

    pub fn len(&self) -> usize {
        self.loans.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.loans.read().is_empty()
    }

    /// add a pending loan and generate its schedule in one step.
    ///
    /// The loan is only put on the book once generation succeeded.
    pub fn originate(&self, mut loan: Loan) -> Result<Outcome<Vec<ScheduleEntry>>> {
        let control_number = loan.control_number();
        if self.contains(control_number) {
            return Err(LoanError::DuplicateControlNumber { control_number });
        }

        let mut events = EventStore::new();
        let entries = schedule::generate(&mut loan, &self.calculator, &mut events)?;
        self.insert(loan)?;

        Ok(Outcome::new(entries, &mut events))
    }

    /// generate the schedule of a loan already on the book
    pub fn generate(&self, control_number: ControlNumber) -> Result<Outcome<Vec<ScheduleEntry>>> {
        let handle = self.handle(control_number)?;
        let mut record = handle.lock();

        let mut events = EventStore::new();
        let entries = schedule::generate(&mut record.loan, &self.calculator, &mut events)?;
        Ok(Outcome::new(entries, &mut events))
    }

    /// reconcile a payment against the loan it names
    pub fn apply_payment(&self, payment: Payment) -> Result<Outcome<AllocationResult>> {
        let handle = self.handle(payment.control_number)?;
        let mut record = handle.lock();

        let mut events = EventStore::new();
        let result = self
            .reconciler
            .apply_payment(&mut record.loan, payment.clone(), &mut events)?;
        record.payments.push(payment);

        Ok(Outcome::new(result, &mut events))
    }

    pub fn reject(&self, control_number: ControlNumber, on: NaiveDate) -> Result<Outcome<()>> {
        let handle = self.handle(control_number)?;
        let mut record = handle.lock();

        let mut events = EventStore::new();
        status::reject(&mut record.loan, on, &mut events)?;
        Ok(Outcome::new((), &mut events))
    }

    /// default every active loan past its grace period as of today
    pub fn sweep_defaults(
        &self,
        time_provider: &SafeTimeProvider,
    ) -> Result<Outcome<Vec<(ControlNumber, LoanStatus)>>> {
        let as_of = time_provider.now().date_naive();
        let mut events = EventStore::new();
        let mut moved = Vec::new();

        for (control_number, handle) in self.handles() {
            let mut record = handle.lock();
            if let Some(next) = status::sweep(&mut record.loan, as_of, &self.policy, &mut events)? {
                moved.push((control_number, next));
            }
        }

        info!(%as_of, moved = moved.len(), "default sweep finished");
        Ok(Outcome::new(moved, &mut events))
    }

    pub fn assess_penalty(&self, control_number: ControlNumber, as_of: NaiveDate) -> Result<PenaltyAssessment> {
        let handle = self.handle(control_number)?;
        let record = handle.lock();
        Ok(PenaltyEngine::from_policy(&self.policy).assess(&record.loan, as_of))
    }

    /// every payment accepted for the loan, in arrival order
    pub fn payments(&self, control_number: ControlNumber) -> Result<Vec<Payment>> {
        let handle = self.handle(control_number)?;
        let record = handle.lock();
        Ok(record.payments.clone())
    }

    fn handle(&self, control_number: ControlNumber) -> Result<Handle> {
        self.loans
            .read()
            .get(&control_number)
            .cloned()
            .ok_or(LoanError::UnknownLoan { control_number })
    }

    fn handles(&self) -> Vec<(ControlNumber, Handle)> {
        let mut handles: Vec<_> = self
            .loans
            .read()
            .iter()
            .map(|(cn, h)| (*cn, Arc::clone(h)))
            .collect();
        handles.sort_by_key(|(cn, _)| *cn);
        handles
    }
}

impl LoanRepository for LoanBook {
    fn insert(&self, loan: Loan) -> Result<()> {
        let control_number = loan.control_number();
        let mut loans = self.loans.write();
        if loans.contains_key(&control_number) {
            return Err(LoanError::DuplicateControlNumber { control_number });
        }

        debug!(%control_number, status = ?loan.status(), "loan added to book");
        loans.insert(
            control_number,
            Arc::new(Mutex::new(LoanRecord {
                loan,
                payments: Vec::new(),
            })),
        );
        Ok(())
    }

    fn get(&self, control_number: ControlNumber) -> Result<Loan> {
        let handle = self.handle(control_number)?;
        let record = handle.lock();
        Ok(record.loan.clone())
    }

    fn contains(&self, control_number: ControlNumber) -> bool {
        self.loans.read().contains_key(&control_number)
    }

    fn control_numbers(&self) -> Vec<ControlNumber> {
        let mut numbers: Vec<_> = self.loans.read().keys().copied().collect();
        numbers.sort();
        numbers
    }
}
