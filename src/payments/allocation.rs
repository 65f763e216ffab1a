use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::loan::ScheduleEntry;
use crate::types::{AllocationComponent, ControlNumber, LoanStatus, PaymentApplication};

/// order in which money is split across the components of one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentWaterfall {
    order: [AllocationComponent; 3],
}

impl PaymentWaterfall {
    /// standard waterfall: fees -> interest -> principal
    pub fn standard() -> Self {
        Self {
            order: [
                AllocationComponent::ServiceFee,
                AllocationComponent::Interest,
                AllocationComponent::Principal,
            ],
        }
    }

    /// interest-first waterfall for certain products
    pub fn interest_first() -> Self {
        Self {
            order: [
                AllocationComponent::Interest,
                AllocationComponent::ServiceFee,
                AllocationComponent::Principal,
            ],
        }
    }

    pub fn order(&self) -> &[AllocationComponent; 3] {
        &self.order
    }

    /// split `amount` across the entry's components.
    ///
    /// Money already paid on the entry is treated as having gone through the
    /// same order, so a second partial payment continues where the first
    /// stopped. `amount` must not exceed the entry's remaining due. A
    /// negative component (a rounding remainder on the last installment)
    /// owes nothing, so every line is non-negative.
    pub fn split(&self, entry: &ScheduleEntry, amount: Money) -> Vec<(AllocationComponent, Money)> {
        let mut already_paid = entry.amount_paid;
        let mut available = amount;
        let mut lines = Vec::new();

        for component in self.order {
            let mut owed = component_amount(entry, component).max(Money::ZERO);

            let covered = already_paid.min(owed);
            already_paid -= covered;
            owed -= covered;

            let applied = available.min(owed);
            if applied.is_positive() {
                lines.push((component, applied));
                available -= applied;
            }

            if available.is_zero() {
                break;
            }
        }

        lines
    }
}

impl Default for PaymentWaterfall {
    fn default() -> Self {
        Self::standard()
    }
}

fn component_amount(entry: &ScheduleEntry, component: AllocationComponent) -> Money {
    match component {
        AllocationComponent::ServiceFee => entry.service_fee_component,
        AllocationComponent::Interest => entry.interest_component,
        AllocationComponent::Principal => entry.principal_component,
    }
}

/// one slice of a payment applied to one entry component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub sequence_number: u32,
    pub component: AllocationComponent,
    pub amount_applied: Money,
}

/// outcome of reconciling one payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub control_number: ControlNumber,
    pub payment_amount: Money,
    pub received_date: NaiveDate,
    pub allocations: Vec<Allocation>,
    pub application: PaymentApplication,
    pub overpayment: Money,
    pub outstanding_balance: Money,
    pub status: LoanStatus,
    /// set when this payment moved the loan to a new status
    pub status_change: Option<LoanStatus>,
}

impl AllocationResult {
    pub fn total_applied(&self) -> Money {
        self.allocations.iter().map(|a| a.amount_applied).sum()
    }

    /// amount applied per entry, in sequence order
    pub fn applied_by_entry(&self) -> Vec<(u32, Money)> {
        let mut out: Vec<(u32, Money)> = Vec::new();
        for allocation in &self.allocations {
            match out.last_mut() {
                Some((seq, total)) if *seq == allocation.sequence_number => {
                    *total += allocation.amount_applied
                }
                _ => out.push((allocation.sequence_number, allocation.amount_applied)),
            }
        }
        out
    }

    pub fn has_overpayment(&self) -> bool {
        self.overpayment.is_positive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry() -> ScheduleEntry {
        ScheduleEntry {
            sequence_number: 1,
            due_date: NaiveDate::from_ymd_opt(2024, 1, 16).unwrap(),
            principal_component: Money::from_major(500),
            interest_component: Money::from_major(6),
            service_fee_component: Money::from_major(5),
            total_amount: Money::from_major(511),
            running_balance: Money::from_major(11_500),
            is_paid: false,
            amount_paid: Money::ZERO,
            paid_date: None,
        }
    }

    #[test]
    fn test_standard_waterfall() {
        let lines = PaymentWaterfall::standard().split(&entry(), Money::from_major(8));

        assert_eq!(
            lines,
            vec![
                (AllocationComponent::ServiceFee, Money::from_major(5)),
                (AllocationComponent::Interest, Money::from_major(3)),
            ]
        );
    }

    #[test]
    fn test_interest_first_waterfall() {
        let lines = PaymentWaterfall::interest_first().split(&entry(), Money::from_major(8));

        assert_eq!(
            lines,
            vec![
                (AllocationComponent::Interest, Money::from_major(6)),
                (AllocationComponent::ServiceFee, Money::from_major(2)),
            ]
        );
    }

    #[test]
    fn test_split_continues_after_partial_payment() {
        let mut e = entry();
        e.amount_paid = Money::from_major(8);

        let lines = PaymentWaterfall::standard().split(&e, e.remaining_due());
        assert_eq!(
            lines,
            vec![
                (AllocationComponent::Interest, Money::from_major(3)),
                (AllocationComponent::Principal, Money::from_major(500)),
            ]
        );
    }

    #[test]
    fn test_negative_component_owes_nothing() {
        // last installment of a pro-rated fee: -0.38 fee remainder
        let mut e = entry();
        e.service_fee_component = Money::from_minor(-38);
        e.total_amount = Money::from_str_exact("505.62").unwrap();

        let lines = PaymentWaterfall::standard().split(&e, e.remaining_due());
        assert_eq!(
            lines,
            vec![
                (AllocationComponent::Interest, Money::from_major(6)),
                (AllocationComponent::Principal, Money::from_str_exact("499.62").unwrap()),
            ]
        );
        assert!(lines.iter().all(|(_, amount)| !amount.is_negative()));

        // a partial payment first still leaves interest owed in full
        e.amount_paid = Money::from_major(4);
        let lines = PaymentWaterfall::standard().split(&e, Money::from_major(2));
        assert_eq!(lines, vec![(AllocationComponent::Interest, Money::from_major(2))]);
    }

    #[test]
    fn test_applied_by_entry_groups_components() {
        let result = AllocationResult {
            control_number: ControlNumber::new(),
            payment_amount: Money::from_major(20),
            received_date: NaiveDate::from_ymd_opt(2024, 1, 16).unwrap(),
            allocations: vec![
                Allocation { sequence_number: 1, component: AllocationComponent::Interest, amount_applied: Money::from_major(4) },
                Allocation { sequence_number: 1, component: AllocationComponent::Principal, amount_applied: Money::from_major(6) },
                Allocation { sequence_number: 2, component: AllocationComponent::ServiceFee, amount_applied: Money::from_major(10) },
            ],
            application: PaymentApplication::default(),
            overpayment: Money::ZERO,
            outstanding_balance: Money::ZERO,
            status: LoanStatus::Active,
            status_change: None,
        };

        assert_eq!(
            result.applied_by_entry(),
            vec![(1, Money::from_major(10)), (2, Money::from_major(10))]
        );
        assert_eq!(result.total_applied(), Money::from_major(20));
        assert!(!result.has_overpayment());
    }
}
