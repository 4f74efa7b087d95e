//! 存储层集成测试：流水、审核入账、提现扣款与退款

mod common;

use common::{approve_kyc, create_task, earn, register, setup, survey_request};
use rewardhub::errors::RewardHubError;
use rewardhub::services::WithdrawalRequest;
use rewardhub::storage::{
    NewTransaction, NewWithdrawal, SurveyStatus, TaskFilter, TaskPatch, TransactionKind,
    UserPatch, WithdrawalMethod, WithdrawalStatus, reference,
};

fn credit(user_id: i64, amount: i64, reference: &str) -> NewTransaction {
    NewTransaction {
        user_id,
        kind: TransactionKind::Credit,
        amount,
        description: "test credit".to_string(),
        reference: reference.to_string(),
    }
}

#[tokio::test]
async fn test_balance_is_credits_minus_debits() {
    let env = setup().await;
    let user = register(&env, "ledger@example.com").await;

    env.storage
        .insert_transaction(credit(user.id, 700, "test:1"))
        .await
        .unwrap();
    env.storage
        .insert_transaction(credit(user.id, 300, "test:2"))
        .await
        .unwrap();
    env.storage
        .insert_transaction(NewTransaction {
            kind: TransactionKind::Debit,
            ..credit(user.id, 250, "test:3")
        })
        .await
        .unwrap();

    let totals = env.storage.wallet_totals(Some(user.id)).await.unwrap();
    assert_eq!(totals.credited, 1000);
    assert_eq!(totals.debited, 250);
    assert_eq!(env.storage.balance_of(user.id).await.unwrap(), 750);

    // 其他用户不受影响
    let other = register(&env, "other@example.com").await;
    assert_eq!(env.storage.balance_of(other.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_duplicate_reference_is_conflict() {
    let env = setup().await;
    let user = register(&env, "dup@example.com").await;

    env.storage
        .insert_transaction(credit(user.id, 100, "survey:42"))
        .await
        .unwrap();
    let err = env
        .storage
        .insert_transaction(credit(user.id, 100, "survey:42"))
        .await
        .unwrap_err();
    assert!(matches!(err, RewardHubError::Conflict(_)), "got {:?}", err);
    assert_eq!(env.storage.balance_of(user.id).await.unwrap(), 100);
}

#[tokio::test]
async fn test_non_positive_amount_rejected() {
    let env = setup().await;
    let user = register(&env, "zero@example.com").await;

    let err = env
        .storage
        .insert_transaction(credit(user.id, 0, "test:zero"))
        .await
        .unwrap_err();
    assert!(matches!(err, RewardHubError::Validation(_)));
}

#[tokio::test]
async fn test_survey_approval_credits_exactly_once() {
    let env = setup().await;
    let user = register(&env, "approve@example.com").await;
    let task = create_task(&env, 450).await;
    let survey = env
        .state
        .surveys
        .submit(user.id, task.id, survey_request(2))
        .await
        .unwrap();

    let approved = env
        .storage
        .approve_survey_and_credit(survey.id, "admin")
        .await
        .unwrap();
    assert_eq!(approved.status, SurveyStatus::Approved);
    assert_eq!(approved.reward_amount, Some(450));
    assert_eq!(approved.reviewed_by.as_deref(), Some("admin"));

    let err = env
        .storage
        .approve_survey_and_credit(survey.id, "admin")
        .await
        .unwrap_err();
    assert!(matches!(err, RewardHubError::InvalidState(_)), "got {:?}", err);

    let (txs, total) = env
        .storage
        .list_transactions(Some(user.id), 1, 20)
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(txs[0].reference, reference::survey_reward(survey.id));
    assert_eq!(env.storage.balance_of(user.id).await.unwrap(), 450);
}

#[tokio::test]
async fn test_rejected_survey_cannot_be_approved() {
    let env = setup().await;
    let user = register(&env, "rejected@example.com").await;
    let task = create_task(&env, 100).await;
    let survey = env
        .state
        .surveys
        .submit(user.id, task.id, survey_request(2))
        .await
        .unwrap();

    env.storage
        .reject_survey(survey.id, "admin", "Blurry photos")
        .await
        .unwrap();
    let err = env
        .storage
        .approve_survey_and_credit(survey.id, "admin")
        .await
        .unwrap_err();
    assert!(matches!(err, RewardHubError::InvalidState(_)));
    assert_eq!(env.storage.balance_of(user.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_withdrawal_debit_and_refund() {
    let env = setup().await;
    let user = register(&env, "withdraw@example.com").await;
    earn(&env, user.id, 5000).await;

    let withdrawal = env
        .storage
        .create_withdrawal_with_debit(NewWithdrawal {
            user_id: user.id,
            amount: 3000,
            method: WithdrawalMethod::Paypal,
            account_details: "payee@example.com".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(withdrawal.status, WithdrawalStatus::Pending);
    assert_eq!(env.storage.balance_of(user.id).await.unwrap(), 2000);
    assert_eq!(
        env.storage
            .pending_withdrawal_total(Some(user.id))
            .await
            .unwrap(),
        3000
    );

    let rejected = env
        .storage
        .reject_withdrawal_and_refund(withdrawal.id, "Account mismatch")
        .await
        .unwrap();
    assert_eq!(rejected.status, WithdrawalStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("Account mismatch"));
    assert_eq!(env.storage.balance_of(user.id).await.unwrap(), 5000);
    assert_eq!(
        env.storage
            .pending_withdrawal_total(Some(user.id))
            .await
            .unwrap(),
        0
    );

    let err = env
        .storage
        .reject_withdrawal_and_refund(withdrawal.id, "again")
        .await
        .unwrap_err();
    assert!(matches!(err, RewardHubError::InvalidState(_)));
    assert_eq!(env.storage.balance_of(user.id).await.unwrap(), 5000);
}

#[tokio::test]
async fn test_withdrawal_over_balance_is_rejected() {
    let env = setup().await;
    let user = register(&env, "poor@example.com").await;
    earn(&env, user.id, 1500).await;

    let err = env
        .storage
        .create_withdrawal_with_debit(NewWithdrawal {
            user_id: user.id,
            amount: 1501,
            method: WithdrawalMethod::BankTransfer,
            account_details: "IBAN DE00 1234".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RewardHubError::InsufficientBalance(_)));

    let (withdrawals, total) = env
        .storage
        .list_withdrawals(Default::default(), 1, 20)
        .await
        .unwrap();
    assert!(withdrawals.is_empty());
    assert_eq!(total, 0);
}

#[tokio::test]
async fn test_paid_withdrawal_is_final() {
    let env = setup().await;
    let user = register(&env, "paid@example.com").await;
    earn(&env, user.id, 2000).await;

    let withdrawal = env
        .storage
        .create_withdrawal_with_debit(NewWithdrawal {
            user_id: user.id,
            amount: 2000,
            method: WithdrawalMethod::Upi,
            account_details: "user@upi".to_string(),
        })
        .await
        .unwrap();

    let paid = env
        .storage
        .mark_withdrawal_paid(withdrawal.id, Some("PAY-001".to_string()))
        .await
        .unwrap();
    assert_eq!(paid.status, WithdrawalStatus::Paid);
    assert_eq!(paid.payout_reference.as_deref(), Some("PAY-001"));

    let err = env
        .storage
        .reject_withdrawal_and_refund(withdrawal.id, "too late")
        .await
        .unwrap_err();
    assert!(matches!(err, RewardHubError::InvalidState(_)));
    assert_eq!(env.storage.balance_of(user.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_debit_adjustment_cannot_overdraw() {
    let env = setup().await;
    let user = register(&env, "adjust@example.com").await;

    let err = env
        .storage
        .insert_adjustment(NewTransaction {
            kind: TransactionKind::Debit,
            ..credit(user.id, 10, &reference::adjustment())
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RewardHubError::InsufficientBalance(_)));

    env.storage
        .insert_adjustment(credit(user.id, 80, &reference::adjustment()))
        .await
        .unwrap();
    env.storage
        .insert_adjustment(NewTransaction {
            kind: TransactionKind::Debit,
            ..credit(user.id, 30, &reference::adjustment())
        })
        .await
        .unwrap();
    assert_eq!(env.storage.balance_of(user.id).await.unwrap(), 50);
}

#[tokio::test]
async fn test_stream_all_transactions_pages_by_id() {
    let env = setup().await;
    let user = register(&env, "stream@example.com").await;
    for i in 0..5 {
        env.storage
            .insert_transaction(credit(user.id, 10 + i, &format!("test:{}", i)))
            .await
            .unwrap();
    }

    let first = env.storage.stream_all_transactions(0, 2).await.unwrap();
    assert_eq!(first.len(), 2);
    let second = env
        .storage
        .stream_all_transactions(first[1].id, 2)
        .await
        .unwrap();
    assert_eq!(second.len(), 2);
    assert!(second[0].id > first[1].id);
    let third = env
        .storage
        .stream_all_transactions(second[1].id, 2)
        .await
        .unwrap();
    assert_eq!(third.len(), 1);
    assert!(
        env.storage
            .stream_all_transactions(third[0].id, 2)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_admin_stats_counts() {
    let env = setup().await;
    let alice = register(&env, "alice@example.com").await;
    let bob = register(&env, "bob@example.com").await;

    earn(&env, alice.id, 700).await;
    let task = create_task(&env, 300).await;
    env.state
        .surveys
        .submit(bob.id, task.id, survey_request(2))
        .await
        .unwrap();

    let stats = env.storage.admin_stats().await.unwrap();
    assert_eq!(stats.users, 2);
    assert_eq!(stats.active_tasks, 2);
    assert_eq!(stats.pending_surveys, 1);
    assert_eq!(stats.approved_surveys, 1);
    assert_eq!(stats.pending_kyc, 0);
    assert_eq!(stats.pending_withdrawals, 0);
    assert_eq!(stats.total_credited, 700);
    assert_eq!(stats.total_withdrawn, 0);
}

#[tokio::test]
async fn test_admin_stats_exclude_refunds() {
    let env = setup().await;
    let user = register(&env, "refund@example.com").await;
    earn(&env, user.id, 700).await;
    earn(&env, user.id, 500).await;

    let rejected = env
        .storage
        .create_withdrawal_with_debit(NewWithdrawal {
            user_id: user.id,
            amount: 400,
            method: WithdrawalMethod::Paypal,
            account_details: "payee@example.com".to_string(),
        })
        .await
        .unwrap();
    env.storage
        .reject_withdrawal_and_refund(rejected.id, "Wrong account")
        .await
        .unwrap();
    let paid = env
        .storage
        .create_withdrawal_with_debit(NewWithdrawal {
            user_id: user.id,
            amount: 300,
            method: WithdrawalMethod::Paypal,
            account_details: "payee@example.com".to_string(),
        })
        .await
        .unwrap();
    env.storage
        .mark_withdrawal_paid(paid.id, None)
        .await
        .unwrap();

    let totals = env.storage.wallet_totals(Some(user.id)).await.unwrap();
    assert_eq!(totals.balance(), 900);
    assert_eq!(totals.refunded, 400);
    assert_eq!(totals.earned(), 1200);
    assert_eq!(totals.withdrawn(), 300);

    let stats = env.storage.admin_stats().await.unwrap();
    assert_eq!(stats.total_credited, 1200);
    assert_eq!(stats.total_withdrawn, 300);
}

#[tokio::test]
async fn test_search_counts_follow_updates() {
    let env = setup().await;
    let task = create_task(&env, 100).await;
    let user = register(&env, "rename@example.com").await;

    let zebra = || TaskFilter {
        search: Some("Zebra".to_string()),
        ..Default::default()
    };
    let (_, total) = env.storage.list_tasks(zebra(), 1, 20).await.unwrap();
    assert_eq!(total, 0);
    let (_, total) = env
        .storage
        .list_users(1, 20, Some("Zed".to_string()))
        .await
        .unwrap();
    assert_eq!(total, 0);

    env.storage
        .update_task(
            task.id,
            TaskPatch {
                title: Some("Zebra cafe".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    env.storage
        .update_user(
            user.id,
            UserPatch {
                display_name: Some("Zed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let (tasks, total) = env.storage.list_tasks(zebra(), 1, 20).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(total, 1);
    let (users, total) = env
        .storage
        .list_users(1, 20, Some("Zed".to_string()))
        .await
        .unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(total, 1);
}

// ============ 并发 ============

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_approvals_credit_once() {
    let env = setup().await;
    let user = register(&env, "parallel@example.com").await;
    let task = create_task(&env, 300).await;
    let survey = env
        .state
        .surveys
        .submit(user.id, task.id, survey_request(2))
        .await
        .unwrap();
    let survey_id = survey.id;

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let storage = env.storage.clone();
            tokio::spawn(async move {
                storage
                    .approve_survey_and_credit(survey_id, &format!("admin-{}", i))
                    .await
            })
        })
        .collect();

    let mut approved = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => approved += 1,
            Err(RewardHubError::InvalidState(_)) | Err(RewardHubError::Conflict(_)) => {}
            Err(e) => panic!("unexpected error: {:?}", e),
        }
    }
    assert_eq!(approved, 1);

    let (txs, total) = env
        .storage
        .list_transactions(Some(user.id), 1, 20)
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(txs[0].amount, 300);
    assert_eq!(env.storage.balance_of(user.id).await.unwrap(), 300);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_withdrawals_from_many_users() {
    let env = setup().await;
    let mut users = Vec::new();
    for i in 0..12 {
        let user = register(&env, &format!("payout{}@example.com", i)).await;
        approve_kyc(&env, user.id).await;
        earn(&env, user.id, 5000).await;
        users.push(user.id);
    }

    let handles: Vec<_> = users
        .iter()
        .map(|&user_id| {
            let state = env.state.clone();
            tokio::spawn(async move {
                state
                    .wallet
                    .request_withdrawal(
                        user_id,
                        WithdrawalRequest {
                            amount: 2000,
                            method: WithdrawalMethod::Paypal,
                            account_details: "payee@example.com".to_string(),
                        },
                    )
                    .await
            })
        })
        .collect();

    let mut failures = Vec::new();
    for handle in handles {
        if let Err(e) = handle.await.unwrap() {
            failures.push(format!("{:?}", e));
        }
    }
    assert!(failures.is_empty(), "failures: {:?}", failures);

    for user_id in users {
        assert_eq!(env.storage.balance_of(user_id).await.unwrap(), 3000);
    }
    assert_eq!(env.storage.pending_withdrawal_total(None).await.unwrap(), 24000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_withdrawals_cannot_overdraw() {
    let env = setup().await;
    let user = register(&env, "greedy@example.com").await;
    earn(&env, user.id, 5000).await;

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let storage = env.storage.clone();
            let user_id = user.id;
            tokio::spawn(async move {
                storage
                    .create_withdrawal_with_debit(NewWithdrawal {
                        user_id,
                        amount: 2000,
                        method: WithdrawalMethod::Paypal,
                        account_details: "payee@example.com".to_string(),
                    })
                    .await
            })
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(RewardHubError::InsufficientBalance(_)) => {}
            Err(e) => panic!("unexpected error: {:?}", e),
        }
    }
    assert_eq!(accepted, 2);
    assert_eq!(env.storage.balance_of(user.id).await.unwrap(), 1000);
}
