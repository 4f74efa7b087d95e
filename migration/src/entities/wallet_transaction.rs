//! Append-only wallet ledger entry

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "wallet_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    /// "credit" or "debit"
    pub kind: String,
    /// Always positive, in minor currency units
    pub amount: i64,
    pub description: String,
    /// Idempotency key, e.g. `survey:42`
    #[sea_orm(unique)]
    pub reference: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
