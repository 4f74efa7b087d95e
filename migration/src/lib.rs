pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20251101_000001_users_and_tasks;
mod m20251101_000002_surveys;
mod m20251101_000003_wallet_transactions;
mod m20251101_000004_kyc_and_withdrawals;
mod m20251120_000001_password_reset;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251101_000001_users_and_tasks::Migration),
            Box::new(m20251101_000002_surveys::Migration),
            Box::new(m20251101_000003_wallet_transactions::Migration),
            Box::new(m20251101_000004_kyc_and_withdrawals::Migration),
            Box::new(m20251120_000001_password_reset::Migration),
        ]
    }
}
