/// liquidation - eligibility checks for fresh, impaired and matured loans
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use p2p_lending_ledger::{
    AccountId, BlockClock, ChainClock, InMemoryLedger, LendingEngine, LoanTerms, Money, PaymentRail,
    SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== liquidation ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    ));
    let clock = BlockClock::new(time, 600);

    let ledger = Arc::new(InMemoryLedger::new());
    let borrower = AccountId::new("wallet_1");
    let lender = AccountId::new("wallet_2");
    let keeper = AccountId::new("deployer");
    ledger.deposit(&borrower, Money::from_major(10_000))?;
    ledger.deposit(&lender, Money::from_major(10_000))?;

    let mut engine = LendingEngine::new(ledger.clone(), ledger.clone(), clock);
    let terms = LoanTerms::new(1_000u64, 50, 50_000, 2_500u64, 500);

    // fresh, well collateralized loan
    let first = engine.create(&borrower, terms.clone())?;
    engine.fund(&lender, first)?;
    match engine.liquidate(&keeper, first) {
        Ok(()) => println!("unexpected liquidation"),
        Err(e) => println!("loan {}: error {} ({})", first, e.code(), e),
    }

    // collateral written down to the threshold
    let second = engine.create(&borrower, terms)?;
    engine.fund(&lender, second)?;
    ledger.mark_collateral(second, Money::from_major(50))?;
    println!(
        "loan {}: collateralization {} bps",
        second,
        engine.collateralization_bps(second)?
    );
    engine.liquidate(&keeper, second)?;
    println!("loan {}: {:?}", second, engine.loan(second)?.status);

    // first loan matures unpaid
    {
        let clock = engine.clock();
        clock.time().test_control().unwrap().advance(clock.span(50_001));
        println!("advanced to height {}", clock.height());
    }
    engine.default_loan(&lender, first)?;
    println!("loan {}: {:?}", first, engine.loan(first)?.status);
    println!("lender balance: {}", ledger.balance(&lender));

    Ok(())
}
