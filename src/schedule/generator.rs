use tracing::{debug, info};

use crate::errors::{LoanError, Result};
use crate::events::{Event, EventStore};
use crate::loan::{Loan, ScheduleEntry};
use crate::status;
use crate::types::LoanStatus;

use super::AmortizationCalculator;

/// generate and attach the payment schedule of a pending loan.
///
/// Runs the calculator once, installs one unpaid entry per installment,
/// caches the outstanding balance and moves the loan Pending -> Active.
/// A loan that already carries entries is left untouched and fails with
/// `ScheduleAlreadyExists`; schedules are generated exactly once.
pub fn generate(
    loan: &mut Loan,
    calculator: &AmortizationCalculator,
    events: &mut EventStore,
) -> Result<Vec<ScheduleEntry>> {
    let control_number = loan.control_number();

    if loan.has_schedule() {
        return Err(LoanError::ScheduleAlreadyExists {
            control_number,
            entries: loan.schedule().len(),
        });
    }

    if loan.status().is_terminal() {
        return Err(LoanError::LoanClosed {
            control_number,
            status: loan.status(),
        });
    }

    if loan.status() != LoanStatus::Pending {
        return Err(LoanError::InvalidTransition {
            from: loan.status(),
            to: LoanStatus::Active,
        });
    }

    let installments = calculator.compute_schedule(loan.terms())?;
    debug!(
        %control_number,
        periods = installments.len(),
        convention = ?calculator.convention(),
        "computed installments"
    );

    let entries: Vec<ScheduleEntry> = installments.iter().map(ScheduleEntry::from_descriptor).collect();
    loan.install_schedule(entries.clone());

    events.emit(Event::ScheduleGenerated {
        control_number,
        entries: entries.clone(),
        outstanding_balance: loan.outstanding_balance(),
    });

    let activated_on = loan.terms().origination_date;
    status::transition(
        loan,
        LoanStatus::Active,
        activated_on,
        "payment schedule generated",
        events,
    )?;

    info!(
        %control_number,
        entries = entries.len(),
        balance = %loan.outstanding_balance(),
        "payment schedule generated"
    );

    Ok(entries)
}
