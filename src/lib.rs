pub mod book;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod loan;
pub mod payments;
pub mod penalty;
pub mod schedule;
pub mod status;
pub mod types;

// re-export key types
pub use book::{LoanBook, LoanRepository, Outcome};
pub use config::{LoanPolicy, PeriodConvention, ServiceFeeMode};
pub use decimal::{Money, Rate};
pub use errors::{LoanError, Result};
pub use events::{Event, EventStore};
pub use loan::{Loan, LoanBuilder, LoanTerms, LoanView, ScheduleEntry, ScheduleEntryView};
pub use payments::{
    apply_payment, Allocation, AllocationResult, Payment, PaymentReconciler, PaymentWaterfall,
};
pub use penalty::{assess_penalty, PenaltyAssessment, PenaltyEngine, PenaltyLine};
pub use schedule::{
    compute_schedule, generate, AmortizationCalculator, FlatFee, InstallmentDescriptor, NoFee,
    ProRatedFee, ServiceFeePolicy,
};
pub use status::check_transitions;
pub use types::{
    AllocationComponent, ControlNumber, LoanStatus, LoanType, PaymentApplication, TermUnit,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
