/// lifecycle - create, fund and repay a collateralized loan
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use p2p_lending_ledger::{
    AccountId, BlockClock, InMemoryLedger, LendingEngine, LoanTerms, Money, PaymentRail,
    SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== loan lifecycle ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    ));
    let clock = BlockClock::new(time, 600);

    let ledger = Arc::new(InMemoryLedger::new());
    let borrower = AccountId::new("wallet_1");
    let lender = AccountId::new("wallet_2");
    ledger.deposit(&borrower, Money::from_major(10_000))?;
    ledger.deposit(&lender, Money::from_major(10_000))?;

    let mut engine = LendingEngine::new(ledger.clone(), ledger.clone(), clock);

    // 1. borrower requests 1000 at 50 bps over 50000 blocks, locking 2500
    let id = engine.create(&borrower, LoanTerms::new(1_000u64, 50, 50_000, 2_500u64, 500))?;
    println!("1. created loan {} ({:?})", id, engine.loan(id)?.status);

    // 2. lender funds it
    engine.fund(&lender, id)?;
    println!("2. funded, due at height {:?}", engine.loan(id)?.due_at_height);
    println!("   borrower balance: {}", ledger.balance(&borrower));

    // 3. borrower settles principal plus interest
    let outstanding = engine.outstanding_amount(id)?;
    println!("3. outstanding: {}", outstanding);
    engine.repay(&borrower, id, Money::from_major(1_100))?;
    println!("   status: {:?}", engine.loan(id)?.status);
    println!("   borrower balance: {}", ledger.balance(&borrower));
    println!("   lender balance: {}", ledger.balance(&lender));

    println!("\n{}", engine.view(id)?.to_json_pretty()?);

    for event in engine.take_events() {
        println!("  event: {:?}", event);
    }

    Ok(())
}
