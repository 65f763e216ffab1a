/// lifecycle - origination, payments, default sweep and penalty quote
use chrono::{Duration, TimeZone, Utc};
use coop_loan_engine::{
    Loan, LoanBook, LoanPolicy, LoanRepository, Money, Payment, SafeTimeProvider, TimeSource,
};
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== loan lifecycle ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();

    let book = LoanBook::new(LoanPolicy::regular())?;

    // 1. origination
    println!("1. origination");
    println!("--------------");
    let loan = Loan::builder()
        .account_number("ACC-0001")
        .principal(Money::from_major(12_000))
        .interest_rate(dec!(1.2))
        .term_months(12)
        .purpose("rice farm inputs")
        .policy(book.policy())
        .build_with_time(&time)?;
    let cn = loan.control_number();

    let outcome = book.originate(loan)?;
    println!("  control number: {}", cn);
    println!("  installments: {}", outcome.value.len());
    println!("  first due: {} for {}", outcome.value[0].due_date, outcome.value[0].total_amount);
    println!("  events to persist: {}", outcome.events.len());

    // 2. servicing
    println!("\n2. servicing");
    println!("------------");
    for _ in 0..3 {
        controller.advance(Duration::days(15));
        let today = time.now().date_naive();
        let paid = book.apply_payment(Payment::new(cn, Money::from_major(400), today))?;
        println!(
            "  {}: paid 400.00, entries touched {:?}, balance {}",
            today,
            paid.value.applied_by_entry(),
            paid.value.outstanding_balance
        );
    }

    // 3. missed payments
    println!("\n3. missed payments");
    println!("------------------");
    controller.advance(Duration::days(60));
    let today = time.now().date_naive();
    let quote = book.assess_penalty(cn, today)?;
    println!("  {}: {} overdue entries, penalty quote {}", today, quote.lines.len(), quote.total);

    let swept = book.sweep_defaults(&time)?;
    for (control_number, status) in &swept.value {
        println!("  {} -> {:?}", control_number, status);
    }

    // 4. final state
    println!("\n4. final state");
    println!("--------------");
    println!("{}", book.get(cn)?.to_json_pretty());

    Ok(())
}
