//! 问卷/评价提交表
//!
//! 每个用户对同一个任务只能提交一次，由 (task_id, user_id) 唯一索引保证。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Surveys::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Surveys::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Surveys::TaskId).big_integer().not_null())
                    .col(ColumnDef::new(Surveys::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Surveys::Rating).integer().not_null())
                    .col(ColumnDef::new(Surveys::ReviewText).text().not_null())
                    .col(
                        ColumnDef::new(Surveys::ImageUrls)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(Surveys::Responses)
                            .text()
                            .not_null()
                            .default("{}"),
                    )
                    .col(
                        ColumnDef::new(Surveys::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Surveys::RejectionReason).text().null())
                    .col(ColumnDef::new(Surveys::RewardAmount).big_integer().null())
                    .col(
                        ColumnDef::new(Surveys::SubmittedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Surveys::ReviewedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Surveys::ReviewedBy).string_len(64).null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_surveys_task")
                            .from(Surveys::Table, Surveys::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_surveys_user")
                            .from(Surveys::Table, Surveys::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_surveys_task_user")
                    .table(Surveys::Table)
                    .col(Surveys::TaskId)
                    .col(Surveys::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 审核队列按状态 + 时间查询
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_surveys_status_submitted")
                    .table(Surveys::Table)
                    .col(Surveys::Status)
                    .col(Surveys::SubmittedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_surveys_user")
                    .table(Surveys::Table)
                    .col(Surveys::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_surveys_user").to_owned())
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_surveys_status_submitted")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(Index::drop().name("uq_surveys_task_user").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Surveys::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Surveys {
    #[sea_orm(iden = "surveys")]
    Table,
    Id,
    TaskId,
    UserId,
    Rating,
    ReviewText,
    ImageUrls,
    Responses,
    Status,
    RejectionReason,
    RewardAmount,
    SubmittedAt,
    ReviewedAt,
    ReviewedBy,
}

#[derive(DeriveIden)]
enum Tasks {
    #[sea_orm(iden = "tasks")]
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    #[sea_orm(iden = "users")]
    Table,
    Id,
}
