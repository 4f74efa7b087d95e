use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // KYC 信息表（每个用户一条）
        manager
            .create_table(
                Table::create()
                    .table(KycInfo::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(KycInfo::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(KycInfo::UserId).big_integer().not_null())
                    .col(ColumnDef::new(KycInfo::FullName).string_len(120).not_null())
                    .col(ColumnDef::new(KycInfo::DateOfBirth).date().not_null())
                    .col(
                        ColumnDef::new(KycInfo::DocumentType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(KycInfo::DocumentNumber)
                            .string_len(40)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(KycInfo::DocumentUrls)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(ColumnDef::new(KycInfo::Address).text().null())
                    .col(
                        ColumnDef::new(KycInfo::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(KycInfo::RejectionReason).text().null())
                    .col(
                        ColumnDef::new(KycInfo::SubmittedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(KycInfo::ReviewedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_kyc_user")
                            .from(KycInfo::Table, KycInfo::UserId)
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
                    .name("uq_kyc_user")
                    .table(KycInfo::Table)
                    .col(KycInfo::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_kyc_status")
                    .table(KycInfo::Table)
                    .col(KycInfo::Status)
                    .to_owned(),
            )
            .await?;

        // 提现申请表
        manager
            .create_table(
                Table::create()
                    .table(Withdrawals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Withdrawals::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Withdrawals::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Withdrawals::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Withdrawals::Method).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Withdrawals::AccountDetails)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Withdrawals::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Withdrawals::RejectionReason).text().null())
                    .col(
                        ColumnDef::new(Withdrawals::PayoutReference)
                            .string_len(128)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Withdrawals::RequestedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Withdrawals::ProcessedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_withdrawals_user")
                            .from(Withdrawals::Table, Withdrawals::UserId)
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
                    .name("idx_withdrawals_status_requested")
                    .table(Withdrawals::Table)
                    .col(Withdrawals::Status)
                    .col(Withdrawals::RequestedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_withdrawals_user")
                    .table(Withdrawals::Table)
                    .col(Withdrawals::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_withdrawals_user").to_owned())
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_withdrawals_status_requested")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Withdrawals::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_kyc_status").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("uq_kyc_user").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(KycInfo::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum KycInfo {
    #[sea_orm(iden = "kyc_info")]
    Table,
    Id,
    UserId,
    FullName,
    DateOfBirth,
    DocumentType,
    DocumentNumber,
    DocumentUrls,
    Address,
    Status,
    RejectionReason,
    SubmittedAt,
    ReviewedAt,
}

#[derive(DeriveIden)]
enum Withdrawals {
    #[sea_orm(iden = "withdrawals")]
    Table,
    Id,
    UserId,
    Amount,
    Method,
    AccountDetails,
    Status,
    RejectionReason,
    PayoutReference,
    RequestedAt,
    ProcessedAt,
}

#[derive(DeriveIden)]
enum Users {
    #[sea_orm(iden = "users")]
    Table,
    Id,
}
