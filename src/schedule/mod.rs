pub mod calculator;
pub mod fees;
pub mod generator;

pub use calculator::{
    compute_schedule, installment_quote_for, AmortizationCalculator, InstallmentDescriptor,
    PERIODS_PER_YEAR, PERIOD_LENGTH_DAYS,
};
pub use fees::{FlatFee, NoFee, ProRatedFee, ServiceFeePolicy};
pub use generator::generate;
