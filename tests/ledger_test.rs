use std::sync::Arc;

use migration::{ Migrator, MigratorTrait };
use sea_orm::{ ConnectOptions, Database };

use trustme_ledger::db::LedgerRepository;
use trustme_ledger::enums::{ AuditAction, Role };
use trustme_ledger::error::AppError;

/// Fresh in-memory database with the full schema applied. The pool is
/// pinned to one connection: every pooled sqlite `:memory:` connection
/// would otherwise be its own empty database.
async fn fresh_repo() -> Arc<LedgerRepository> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);
    let db = Database::connect(options).await.expect("connect to in-memory sqlite");
    Migrator::up(&db, None).await.expect("apply migrations");
    Arc::new(LedgerRepository::new(db))
}

#[tokio::test]
async fn test_register_is_idempotent() {
    let repo = fresh_repo().await;

    let first = repo.upsert_user(42, Some("alice")).await.unwrap();
    assert_eq!(first.external_id, 42);
    assert_eq!(first.handle.as_deref(), Some("alice"));
    assert_eq!(first.role, "user");
    assert_eq!(first.balance_cents, 0);

    // Second contact with a different handle must not overwrite anything.
    repo.adjust_balance(first.id, 500, "tg:42", AuditAction::BalanceAdd).await.unwrap();
    let again = repo.upsert_user(42, Some("alice_renamed")).await.unwrap();

    assert_eq!(again.id, first.id);
    assert_eq!(again.handle.as_deref(), Some("alice"), "existing handle is kept");
    assert_eq!(again.balance_cents, 500, "existing balance is kept");
}

#[tokio::test]
async fn test_find_user_by_id_and_handle() {
    let repo = fresh_repo().await;
    repo.upsert_user(42, Some("alice")).await.unwrap();

    assert_eq!(repo.find_user("42").await.unwrap().external_id, 42);
    assert_eq!(repo.find_user("@alice").await.unwrap().external_id, 42);
    assert_eq!(repo.find_user(" @alice ").await.unwrap().external_id, 42);

    assert!(matches!(repo.find_user("99").await, Err(AppError::NotFound { .. })));
    assert!(matches!(repo.find_user("@nobody").await, Err(AppError::NotFound { .. })));
    // Neither a number nor an @handle.
    assert!(matches!(repo.find_user("alice").await, Err(AppError::InvalidInput(_))));
}

#[tokio::test]
async fn test_adjust_balance_writes_audit() {
    let repo = fresh_repo().await;
    let user = repo.upsert_user(42, None).await.unwrap();

    let updated = repo
        .adjust_balance(user.id, 2_500, "tg:42", AuditAction::BalanceAdd).await
        .unwrap();
    assert_eq!(updated.balance_cents, 2_500);

    let audit = repo.all_audit().await.unwrap();
    assert_eq!(audit.len(), 1, "one mutation, one audit entry");

    let entry = &audit[0];
    assert_eq!(entry.actor, "tg:42");
    assert_eq!(entry.action, "balance_add");
    assert_eq!(entry.entity_type, "user");
    assert_eq!(entry.entity_id, user.id);
    assert_eq!(entry.meta["before"]["balance_cents"], 0);
    assert_eq!(entry.meta["after"]["balance_cents"], 2_500);
    assert_eq!(entry.meta["amount_cents"], 2_500);
}

#[tokio::test]
async fn test_overdraft_rejected_and_untouched() {
    let repo = fresh_repo().await;
    let user = repo.upsert_user(42, None).await.unwrap();
    repo.adjust_balance(user.id, 1_000, "tg:42", AuditAction::BalanceAdd).await.unwrap();

    let result = repo.adjust_balance(user.id, -1_500, "tg:42", AuditAction::BalanceSub).await;

    match result {
        Err(AppError::InsufficientFunds { requested_cents, available_cents }) => {
            assert_eq!(requested_cents, 1_500);
            assert_eq!(available_cents, 1_000);
        }
        other => panic!("expected InsufficientFunds, got {:?}", other),
    }

    assert_eq!(
        repo.get_user(42).await.unwrap().balance_cents,
        1_000,
        "a failed debit must not change the balance"
    );
    assert_eq!(repo.all_audit().await.unwrap().len(), 1, "a failed debit must not be audited");
}

#[tokio::test]
async fn test_set_role_and_set_balance_audited() {
    let repo = fresh_repo().await;
    let user = repo.upsert_user(7, Some("bob")).await.unwrap();

    let promoted = repo.set_role(user.id, Role::Manager, "api:admin").await.unwrap();
    assert_eq!(promoted.role, "manager");

    let reset = repo.set_balance(user.id, 9_900, "api:admin").await.unwrap();
    assert_eq!(reset.balance_cents, 9_900);

    let audit = repo.all_audit().await.unwrap();
    assert_eq!(audit.len(), 2);

    assert_eq!(audit[0].action, "role_set");
    assert_eq!(audit[0].meta["before"]["role"], "user");
    assert_eq!(audit[0].meta["after"]["role"], "manager");

    assert_eq!(audit[1].action, "balance_set");
    assert_eq!(audit[1].meta["amount_cents"], 9_900);
}

#[tokio::test]
async fn test_audit_list_filters_and_order() {
    let repo = fresh_repo().await;
    let user = repo.upsert_user(42, None).await.unwrap();

    repo.adjust_balance(user.id, 1_000, "tg:42", AuditAction::BalanceAdd).await.unwrap();
    repo.adjust_balance(user.id, 500, "api:admin", AuditAction::BalanceAdd).await.unwrap();
    repo.set_balance(user.id, 0, "api:admin").await.unwrap();

    let newest_first = repo.list_audit(10, None, None).await.unwrap();
    assert_eq!(newest_first.len(), 3);
    assert!(
        newest_first.windows(2).all(|pair| pair[0].id > pair[1].id),
        "newest entries come first"
    );

    let by_actor = repo.list_audit(10, Some("api:admin"), None).await.unwrap();
    assert_eq!(by_actor.len(), 2);

    let by_action = repo.list_audit(10, None, Some(AuditAction::BalanceSet)).await.unwrap();
    assert_eq!(by_action.len(), 1);
    assert_eq!(by_action[0].actor, "api:admin");

    let capped = repo.list_audit(2, None, None).await.unwrap();
    assert_eq!(capped.len(), 2);
}

#[tokio::test]
async fn test_list_users_pagination() {
    let repo = fresh_repo().await;
    for external_id in 100..105 {
        repo.upsert_user(external_id, None).await.unwrap();
    }

    let page = repo.list_users(2, 2).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].external_id, 102);
    assert_eq!(page[1].external_id, 103);

    let tail = repo.list_users(10, 4).await.unwrap();
    assert_eq!(tail.len(), 1);
    assert_eq!(tail[0].external_id, 104);
}

#[tokio::test]
async fn test_balance_overflow_is_rejected() {
    let repo = fresh_repo().await;
    let user = repo.upsert_user(42, None).await.unwrap();
    repo.set_balance(user.id, i64::MAX, "api:admin").await.unwrap();

    let result = repo.adjust_balance(user.id, 1, "api:admin", AuditAction::BalanceAdd).await;
    assert!(matches!(result, Err(AppError::InvalidInput(_))));
    assert_eq!(repo.get_user(42).await.unwrap().balance_cents, i64::MAX);
}
