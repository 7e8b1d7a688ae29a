use std::sync::Arc;

use migration::{ Migrator, MigratorTrait };
use sea_orm::{ ConnectOptions, Database };

use trustme_ledger::db::LedgerRepository;
use trustme_ledger::enums::WithdrawalStatus;
use trustme_ledger::error::AppError;
use trustme_ledger::services::{ BalanceService, WithdrawalService };

struct TestLedger {
    repo: Arc<LedgerRepository>,
    balances: Arc<BalanceService>,
    withdrawals: Arc<WithdrawalService>,
}

/// Services wired to a fresh in-memory database. One pooled connection:
/// pooled sqlite `:memory:` connections do not share data, and a single
/// connection also makes the concurrency test deterministic.
async fn setup() -> TestLedger {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);
    let db = Database::connect(options).await.expect("connect to in-memory sqlite");
    Migrator::up(&db, None).await.expect("apply migrations");

    let repo = Arc::new(LedgerRepository::new(db));
    TestLedger {
        balances: Arc::new(BalanceService::new(repo.clone())),
        withdrawals: Arc::new(WithdrawalService::new(repo.clone())),
        repo,
    }
}

#[tokio::test]
async fn test_request_reserves_funds_immediately() {
    let ledger = setup().await;
    ledger.balances.deposit(42, Some("alice"), 10_000).await.unwrap();

    let (request, owner) = ledger.withdrawals
        .request(42, Some("alice"), 4_000, "TAddr99", "TRC20", "tg:42").await
        .unwrap();

    assert_eq!(request.status, "pending");
    assert_eq!(request.amount_cents, 4_000);
    assert_eq!(request.destination, "TAddr99");
    assert_eq!(request.network, "TRC20");
    assert_eq!(
        owner.balance_cents,
        6_000,
        "the amount is reserved the moment the request exists"
    );

    // The debit and the request commit together, with one audit entry.
    let audit = ledger.repo.all_audit().await.unwrap();
    let entry = audit.last().unwrap();
    assert_eq!(entry.action, "withdraw_request");
    assert_eq!(entry.actor, "tg:42");
    assert_eq!(entry.meta["amount_cents"], 4_000);
    assert_eq!(entry.meta["balance_before_cents"], 10_000);
    assert_eq!(entry.meta["balance_after_cents"], 6_000);
}

#[tokio::test]
async fn test_request_insufficient_writes_nothing() {
    let ledger = setup().await;
    ledger.balances.deposit(42, None, 1_000).await.unwrap();

    let result = ledger.withdrawals.request(42, None, 5_000, "TAddr99", "USDT", "tg:42").await;

    match result {
        Err(AppError::InsufficientFunds { requested_cents, available_cents }) => {
            assert_eq!(requested_cents, 5_000);
            assert_eq!(available_cents, 1_000);
        }
        other => panic!("expected InsufficientFunds, got {:?}", other),
    }

    assert_eq!(ledger.repo.get_user(42).await.unwrap().balance_cents, 1_000);
    assert!(
        ledger.repo.all_withdrawals().await.unwrap().is_empty(),
        "a rejected request must not leave a row behind"
    );
    assert_eq!(ledger.repo.all_audit().await.unwrap().len(), 1, "only the deposit is audited");
}

#[tokio::test]
async fn test_request_validation() {
    let ledger = setup().await;
    ledger.balances.deposit(42, None, 10_000).await.unwrap();

    assert!(matches!(
        ledger.withdrawals.request(42, None, 0, "TAddr99", "USDT", "tg:42").await,
        Err(AppError::InvalidInput(_))
    ));
    assert!(matches!(
        ledger.withdrawals.request(42, None, -100, "TAddr99", "USDT", "tg:42").await,
        Err(AppError::InvalidInput(_))
    ));
    assert!(matches!(
        ledger.withdrawals.request(42, None, 1_000, "   ", "USDT", "tg:42").await,
        Err(AppError::InvalidInput(_))
    ));

    let long_destination = "x".repeat(300);
    assert!(matches!(
        ledger.withdrawals.request(42, None, 1_000, &long_destination, "USDT", "tg:42").await,
        Err(AppError::InvalidInput(_))
    ));

    assert_eq!(
        ledger.repo.get_user(42).await.unwrap().balance_cents,
        10_000,
        "rejected requests never touch the balance"
    );
}

#[tokio::test]
async fn test_approve_flips_status_only() {
    let ledger = setup().await;
    ledger.balances.deposit(42, None, 10_000).await.unwrap();
    let (request, _) = ledger.withdrawals
        .request(42, None, 4_000, "TAddr99", "USDT", "tg:42").await
        .unwrap();

    let approved = ledger.withdrawals
        .approve(request.id, "tg:9000", Some("0xdeadbeef")).await
        .unwrap();

    assert_eq!(approved.status, "approved");
    assert_eq!(approved.decided_by.as_deref(), Some("tg:9000"));
    assert_eq!(approved.txid.as_deref(), Some("0xdeadbeef"));
    assert!(approved.decided_at.is_some());

    // The money already left the balance at request time.
    assert_eq!(ledger.repo.get_user(42).await.unwrap().balance_cents, 6_000);
}

#[tokio::test]
async fn test_deny_refunds_in_full() {
    let ledger = setup().await;
    ledger.balances.deposit(42, None, 10_000).await.unwrap();
    let (request, _) = ledger.withdrawals
        .request(42, None, 4_000, "TAddr99", "USDT", "tg:42").await
        .unwrap();

    let denied = ledger.withdrawals
        .deny(request.id, "tg:9000", Some("address flagged")).await
        .unwrap();

    assert_eq!(denied.status, "denied");
    assert_eq!(denied.note.as_deref(), Some("address flagged"));
    assert_eq!(
        ledger.repo.get_user(42).await.unwrap().balance_cents,
        10_000,
        "denial returns the reserved amount"
    );

    let audit = ledger.repo.all_audit().await.unwrap();
    let entry = audit.last().unwrap();
    assert_eq!(entry.action, "withdrawal_deny");
    assert_eq!(entry.meta["refunded"], true);
    assert_eq!(entry.meta["balance_before_cents"], 6_000);
    assert_eq!(entry.meta["balance_after_cents"], 10_000);
}

#[tokio::test]
async fn test_double_decide_is_rejected() {
    let ledger = setup().await;
    ledger.balances.deposit(42, None, 10_000).await.unwrap();
    let (request, _) = ledger.withdrawals
        .request(42, None, 4_000, "TAddr99", "USDT", "tg:42").await
        .unwrap();

    ledger.withdrawals.approve(request.id, "tg:9000", None).await.unwrap();

    // A second decision, in either direction, is rejected.
    assert!(matches!(
        ledger.withdrawals.approve(request.id, "tg:9000", None).await,
        Err(AppError::InvalidTransition { status: WithdrawalStatus::Approved, .. })
    ));
    assert!(matches!(
        ledger.withdrawals.deny(request.id, "tg:9001", None).await,
        Err(AppError::InvalidTransition { .. })
    ));

    // In particular the rejected denial must not refund.
    assert_eq!(ledger.repo.get_user(42).await.unwrap().balance_cents, 6_000);
    assert_eq!(ledger.withdrawals.get(request.id).await.unwrap().status, "approved");
}

#[tokio::test]
async fn test_concurrent_requests_one_wins() {
    let ledger = setup().await;
    ledger.balances.deposit(42, None, 10_000).await.unwrap();

    // Two requests race for a balance that covers only one of them.
    let first = {
        let withdrawals = ledger.withdrawals.clone();
        tokio::spawn(async move {
            withdrawals.request(42, None, 6_000, "TAddrA", "USDT", "tg:42").await
        })
    };
    let second = {
        let withdrawals = ledger.withdrawals.clone();
        tokio::spawn(async move {
            withdrawals.request(42, None, 6_000, "TAddrB", "USDT", "tg:42").await
        })
    };

    let outcomes = [first.await.unwrap(), second.await.unwrap()];
    let wins = outcomes
        .iter()
        .filter(|outcome| outcome.is_ok())
        .count();
    assert_eq!(wins, 1, "the balance covers exactly one of the two requests");

    let loss = outcomes
        .iter()
        .find(|outcome| outcome.is_err())
        .unwrap();
    assert!(matches!(loss, Err(AppError::InsufficientFunds { .. })));

    assert_eq!(ledger.repo.get_user(42).await.unwrap().balance_cents, 4_000);
    assert_eq!(ledger.repo.all_withdrawals().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_queue_is_fifo_with_requesters() {
    let ledger = setup().await;
    ledger.balances.deposit(1, Some("alice"), 10_000).await.unwrap();
    ledger.balances.deposit(2, Some("bob"), 10_000).await.unwrap();

    let (first, _) = ledger.withdrawals
        .request(1, None, 1_000, "TAddrA", "USDT", "tg:1").await
        .unwrap();
    let (second, _) = ledger.withdrawals
        .request(2, None, 2_000, "TAddrB", "USDT", "tg:2").await
        .unwrap();
    let (third, _) = ledger.withdrawals
        .request(1, None, 3_000, "TAddrC", "USDT", "tg:1").await
        .unwrap();

    // Arrival order, each joined with its requester.
    let queue = ledger.withdrawals.queue(10).await.unwrap();
    let ids: Vec<i64> = queue
        .iter()
        .map(|(row, _)| row.id)
        .collect();
    assert_eq!(ids, vec![first.id, second.id, third.id]);
    assert_eq!(queue[0].1.as_ref().unwrap().handle.as_deref(), Some("alice"));
    assert_eq!(queue[1].1.as_ref().unwrap().handle.as_deref(), Some("bob"));

    // Deciding the head shrinks the queue.
    ledger.withdrawals.approve(first.id, "tg:9000", None).await.unwrap();
    let queue = ledger.withdrawals.queue(10).await.unwrap();
    assert_eq!(queue.len(), 2);
    assert_eq!(queue[0].0.id, second.id);
}

#[tokio::test]
async fn test_history_newest_first() {
    let ledger = setup().await;
    ledger.balances.deposit(42, None, 10_000).await.unwrap();

    let (first, _) = ledger.withdrawals
        .request(42, None, 1_000, "TAddrA", "USDT", "tg:42").await
        .unwrap();
    let (second, _) = ledger.withdrawals
        .request(42, None, 2_000, "TAddrB", "USDT", "tg:42").await
        .unwrap();

    let history = ledger.withdrawals.history_for(42, 10).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, second.id, "latest request first");
    assert_eq!(history[1].id, first.id);
}

#[tokio::test]
async fn test_status_filter_lists() {
    let ledger = setup().await;
    ledger.balances.deposit(42, None, 10_000).await.unwrap();

    let (a, _) = ledger.withdrawals
        .request(42, None, 1_000, "TAddrA", "USDT", "tg:42").await
        .unwrap();
    let (b, _) = ledger.withdrawals
        .request(42, None, 2_000, "TAddrB", "USDT", "tg:42").await
        .unwrap();
    let (c, _) = ledger.withdrawals
        .request(42, None, 3_000, "TAddrC", "USDT", "tg:42").await
        .unwrap();

    ledger.withdrawals.approve(a.id, "tg:9000", None).await.unwrap();
    ledger.withdrawals.deny(b.id, "tg:9000", None).await.unwrap();

    let pending = ledger.withdrawals.list(Some(WithdrawalStatus::Pending), 10, 0).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, c.id);

    let denied = ledger.withdrawals.list(Some(WithdrawalStatus::Denied), 10, 0).await.unwrap();
    assert_eq!(denied.len(), 1);
    assert_eq!(denied[0].id, b.id);

    let all = ledger.withdrawals.list(None, 10, 0).await.unwrap();
    assert_eq!(all.len(), 3);
}
