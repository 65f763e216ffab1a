use tracing::{debug, info};

use crate::config::LoanPolicy;
use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::events::{Event, EventStore};
use crate::loan::Loan;
use crate::status;
use crate::types::PaymentApplication;

use super::{Allocation, AllocationResult, Payment, PaymentWaterfall};

/// applies received payments against a loan's schedule
#[derive(Debug, Clone)]
pub struct PaymentReconciler {
    waterfall: PaymentWaterfall,
    grace_period_days: u32,
}

impl PaymentReconciler {
    pub fn new(policy: &LoanPolicy) -> Self {
        Self {
            waterfall: PaymentWaterfall::standard(),
            grace_period_days: policy.grace_period_days,
        }
    }

    pub fn with_waterfall(mut self, waterfall: PaymentWaterfall) -> Self {
        self.waterfall = waterfall;
        self
    }

    /// apply one payment, oldest unpaid entry first.
    ///
    /// Each entry takes what it still owes; a fully covered entry is marked
    /// paid on the received date and the rest flows to the next one. Money
    /// left after the last entry is returned as overpayment, never applied.
    /// The status machine then runs as of the received date.
    pub fn apply_payment(
        &self,
        loan: &mut Loan,
        payment: Payment,
        events: &mut EventStore,
    ) -> Result<AllocationResult> {
        self.validate(loan, &payment)?;

        let control_number = loan.control_number();
        let mut remaining = payment.amount;
        let mut allocations = Vec::new();
        let mut application = PaymentApplication::default();
        let mut entry_updates = Vec::new();

        // entries with nothing left to pay settle at zero and never stop the walk
        while let Some(index) = loan.first_unpaid_index() {
            let entry = loan.entry_mut(index);
            let due = entry.remaining_due().max(Money::ZERO);
            if !remaining.is_positive() && due.is_positive() {
                break;
            }

            let applied = remaining.min(due);
            for (component, amount) in self.waterfall.split(entry, applied) {
                application.add(component, amount);
                allocations.push(Allocation {
                    sequence_number: entry.sequence_number,
                    component,
                    amount_applied: amount,
                });
            }

            entry.amount_paid += applied;
            if entry.amount_paid >= entry.total_amount {
                entry.is_paid = true;
                entry.paid_date = Some(payment.received_date);
            }
            remaining -= applied;

            debug!(
                %control_number,
                sequence_number = entry.sequence_number,
                %applied,
                is_paid = entry.is_paid,
                "applied payment to entry"
            );

            entry_updates.push(Event::ScheduleEntryUpdated {
                control_number,
                sequence_number: entry.sequence_number,
                amount_paid: entry.amount_paid,
                is_paid: entry.is_paid,
                paid_date: entry.paid_date,
            });
        }

        application.excess = remaining;
        let outstanding_balance = loan.recompute_balance();

        events.emit(Event::PaymentReceived {
            control_number,
            amount: payment.amount,
            received_date: payment.received_date,
            reference: payment.reference.clone(),
            application: application.clone(),
        });
        for update in entry_updates {
            events.emit(update);
        }
        if remaining.is_positive() {
            events.emit(Event::OverpaymentReported {
                control_number,
                amount: remaining,
                received_date: payment.received_date,
            });
        }
        events.emit(Event::BalanceUpdated {
            control_number,
            outstanding_balance,
        });

        let status_change =
            status::advance(loan, payment.received_date, self.grace_period_days, events)?;

        info!(
            %control_number,
            amount = %payment.amount,
            reference = %payment.reference,
            overpayment = %remaining,
            balance = %outstanding_balance,
            "payment reconciled"
        );

        Ok(AllocationResult {
            control_number,
            payment_amount: payment.amount,
            received_date: payment.received_date,
            allocations,
            application,
            overpayment: remaining,
            outstanding_balance,
            status: loan.status(),
            status_change,
        })
    }

    fn validate(&self, loan: &Loan, payment: &Payment) -> Result<()> {
        if payment.control_number != loan.control_number() {
            return Err(LoanError::UnknownLoan {
                control_number: payment.control_number,
            });
        }

        if loan.status().is_terminal() {
            return Err(LoanError::LoanClosed {
                control_number: loan.control_number(),
                status: loan.status(),
            });
        }

        if !loan.has_schedule() {
            return Err(LoanError::ScheduleNotGenerated {
                control_number: loan.control_number(),
            });
        }

        if !payment.amount.is_positive() {
            return Err(LoanError::InvalidPayment {
                amount: payment.amount,
            });
        }

        Ok(())
    }
}

/// apply a payment with the policy's grace period and the standard waterfall
pub fn apply_payment(
    loan: &mut Loan,
    payment: Payment,
    policy: &LoanPolicy,
    events: &mut EventStore,
) -> Result<AllocationResult> {
    PaymentReconciler::new(policy).apply_payment(loan, payment, events)
}
