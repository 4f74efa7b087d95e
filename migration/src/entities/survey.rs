//! Survey / review submission, one per (task, user)

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "surveys")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub task_id: i64,
    pub user_id: i64,
    pub rating: i32,
    #[sea_orm(column_type = "Text")]
    pub review_text: String,
    /// JSON array of uploaded image URLs
    #[sea_orm(column_type = "Text")]
    pub image_urls: String,
    /// JSON object of question -> answer
    #[sea_orm(column_type = "Text")]
    pub responses: String,
    pub status: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub rejection_reason: Option<String>,
    /// Amount actually credited on approval
    pub reward_amount: Option<i64>,
    pub submitted_at: DateTimeUtc,
    pub reviewed_at: Option<DateTimeUtc>,
    pub reviewed_by: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
