use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::config::LoanPolicy;
use crate::errors::{LoanError, Result};
use crate::events::{Event, EventStore};
use crate::loan::Loan;
use crate::types::LoanStatus;

/// status the loan should move to as of `as_of`, if any.
///
/// Only active loans move: to `PaidInFull` once every entry is settled,
/// otherwise to `Defaulted` when an unpaid entry is more than
/// `grace_period_days` past its due date.
pub fn check_transitions(loan: &Loan, as_of: NaiveDate, grace_period_days: u32) -> Option<LoanStatus> {
    if loan.status() != LoanStatus::Active {
        return None;
    }

    if loan.is_fully_paid() {
        return Some(LoanStatus::PaidInFull);
    }

    if loan
        .schedule()
        .iter()
        .any(|e| e.is_past_grace(as_of, grace_period_days))
    {
        return Some(LoanStatus::Defaulted);
    }

    None
}

/// move the loan to `next`, returning the previous status.
///
/// Pending -> Active -> PaidInFull | Defaulted, and Pending -> Rejected.
/// Every status change goes through here: the move is checked with
/// [`LoanStatus::can_transition_to`] and recorded as a `StatusChanged` event.
pub fn transition(
    loan: &mut Loan,
    next: LoanStatus,
    on: NaiveDate,
    reason: &str,
    events: &mut EventStore,
) -> Result<LoanStatus> {
    let current = loan.status();

    if current.is_terminal() {
        return Err(LoanError::LoanClosed {
            control_number: loan.control_number(),
            status: current,
        });
    }

    if !current.can_transition_to(next) {
        return Err(LoanError::InvalidTransition {
            from: current,
            to: next,
        });
    }

    loan.set_status(next, on);

    events.emit(Event::StatusChanged {
        control_number: loan.control_number(),
        old_status: current,
        new_status: next,
        reason: reason.to_string(),
        date: on,
    });

    if next == LoanStatus::Defaulted {
        warn!(control_number = %loan.control_number(), %reason, "loan defaulted");
    } else {
        info!(control_number = %loan.control_number(), from = ?current, to = ?next, "loan status changed");
    }

    Ok(current)
}

/// check and apply any due transition
pub fn advance(
    loan: &mut Loan,
    as_of: NaiveDate,
    grace_period_days: u32,
    events: &mut EventStore,
) -> Result<Option<LoanStatus>> {
    let Some(next) = check_transitions(loan, as_of, grace_period_days) else {
        return Ok(None);
    };

    let reason = match next {
        LoanStatus::PaidInFull => "final installment settled".to_string(),
        _ => {
            let worst = loan
                .schedule()
                .iter()
                .filter(|e| !e.is_paid)
                .map(|e| e.days_past_due(as_of))
                .max()
                .unwrap_or(0);
            format!("{} days past due, grace period {} days", worst, grace_period_days)
        }
    };

    transition(loan, next, as_of, &reason, events)?;
    Ok(Some(next))
}

/// explicit default sweep; terminal and pending loans are skipped
pub fn sweep(
    loan: &mut Loan,
    as_of: NaiveDate,
    policy: &LoanPolicy,
    events: &mut EventStore,
) -> Result<Option<LoanStatus>> {
    if loan.status() != LoanStatus::Active {
        return Ok(None);
    }
    let moved = advance(loan, as_of, policy.grace_period_days, events)?;
    debug!(control_number = %loan.control_number(), %as_of, ?moved, "default sweep");
    Ok(moved)
}

/// reject a pending loan
pub fn reject(loan: &mut Loan, on: NaiveDate, events: &mut EventStore) -> Result<()> {
    transition(loan, LoanStatus::Rejected, on, "loan rejected", events)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Money;
    use crate::payments::{apply_payment, Payment};
    use crate::schedule::{generate, AmortizationCalculator};
    use chrono::Duration;
    use rust_decimal::Decimal;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn grace(days: u32) -> LoanPolicy {
        LoanPolicy {
            grace_period_days: days,
            ..LoanPolicy::regular()
        }
    }

    fn active_loan(months: u32) -> Loan {
        let mut loan = Loan::builder()
            .principal(Money::from_major(1_000))
            .interest_rate(Decimal::ZERO)
            .service_fee_rate(Decimal::ZERO)
            .term_months(months)
            .origination_date(date(2024, 1, 1))
            .build()
            .unwrap();
        generate(&mut loan, &AmortizationCalculator::new(), &mut EventStore::new()).unwrap();
        loan
    }

    #[test]
    fn test_no_transition_while_current() {
        let loan = active_loan(1);
        // first due 2024-01-16
        assert_eq!(check_transitions(&loan, date(2024, 1, 16), 10), None);
        assert_eq!(check_transitions(&loan, date(2024, 1, 26), 10), None);
    }

    #[test]
    fn test_default_after_grace() {
        let loan = active_loan(1);
        assert_eq!(
            check_transitions(&loan, date(2024, 1, 27), 10),
            Some(LoanStatus::Defaulted)
        );
    }

    #[test]
    fn test_pending_and_terminal_loans_never_move() {
        let pending = Loan::builder()
            .principal(Money::from_major(1_000))
            .term_months(1)
            .origination_date(date(2024, 1, 1))
            .build()
            .unwrap();
        assert_eq!(check_transitions(&pending, date(2030, 1, 1), 0), None);

        let mut loan = active_loan(1);
        let mut events = EventStore::new();
        sweep(&mut loan, date(2024, 3, 1), &grace(0), &mut events).unwrap();
        assert_eq!(loan.status(), LoanStatus::Defaulted);
        assert_eq!(check_transitions(&loan, date(2030, 1, 1), 0), None);
        assert_eq!(sweep(&mut loan, date(2030, 1, 1), &grace(0), &mut events).unwrap(), None);
    }

    #[test]
    fn test_paid_in_full_wins_over_default() {
        let mut loan = active_loan(1);
        let policy = LoanPolicy::regular();
        let mut events = EventStore::new();

        // pay everything far past the grace period
        let late = loan.maturity_date().unwrap() + Duration::days(90);
        let payment = Payment::new(loan.control_number(), Money::from_major(1_000), late);
        let result = apply_payment(&mut loan, payment, &policy, &mut events).unwrap();

        assert_eq!(result.status_change, Some(LoanStatus::PaidInFull));
        assert_eq!(loan.status(), LoanStatus::PaidInFull);
    }

    #[test]
    fn test_transition_out_of_terminal_is_loan_closed() {
        let mut loan = active_loan(1);
        let mut events = EventStore::new();
        transition(&mut loan, LoanStatus::Defaulted, date(2024, 3, 1), "test", &mut events).unwrap();

        let err = transition(&mut loan, LoanStatus::Active, date(2024, 3, 2), "test", &mut events)
            .unwrap_err();
        assert!(matches!(err, LoanError::LoanClosed { status: LoanStatus::Defaulted, .. }));
    }

    #[test]
    fn test_illegal_transition_rejected() {
        let mut loan = active_loan(1);
        let err = reject(&mut loan, date(2024, 1, 2), &mut EventStore::new()).unwrap_err();
        assert_eq!(
            err,
            LoanError::InvalidTransition { from: LoanStatus::Active, to: LoanStatus::Rejected }
        );
        assert_eq!(loan.status(), LoanStatus::Active);
    }

    #[test]
    fn test_sweep_records_reason_and_date() {
        let mut loan = active_loan(2);
        let mut events = EventStore::new();

        let as_of = date(2024, 2, 20);
        assert_eq!(sweep(&mut loan, as_of, &grace(30), &mut events).unwrap(), Some(LoanStatus::Defaulted));
        assert_eq!(loan.status_changed_on(), as_of);

        match &events.events()[0] {
            Event::StatusChanged { new_status, reason, date, .. } => {
                assert_eq!(*new_status, LoanStatus::Defaulted);
                // first entry due 2024-01-16
                assert_eq!(reason, "35 days past due, grace period 30 days");
                assert_eq!(*date, as_of);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
