use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(Withdrawal::Table)
                .if_not_exists()
                .col(
                    ColumnDef::new(Withdrawal::Id)
                        .big_integer()
                        .not_null()
                        .auto_increment()
                        .primary_key()
                )
                .col(ColumnDef::new(Withdrawal::UserId).big_integer().not_null())
                .col(ColumnDef::new(Withdrawal::AmountCents).big_integer().not_null())
                .col(ColumnDef::new(Withdrawal::Destination).string().not_null())
                .col(ColumnDef::new(Withdrawal::Network).string_len(32).not_null())
                .col(ColumnDef::new(Withdrawal::Status).string_len(20).not_null().default("pending"))
                .col(
                    ColumnDef::new(Withdrawal::RequestedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp())
                )
                .col(ColumnDef::new(Withdrawal::DecidedAt).timestamp_with_time_zone().null())
                .col(ColumnDef::new(Withdrawal::DecidedBy).string().null())
                .col(ColumnDef::new(Withdrawal::Txid).string().null())
                .col(ColumnDef::new(Withdrawal::Note).string().null())
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_withdrawals_user")
                        .from(Withdrawal::Table, Withdrawal::UserId)
                        .to(User::Table, User::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                )
                .to_owned()
        ).await?;

        // Pending queue scans filter on status and sort on requested_at
        manager.create_index(
            Index::create()
                .name("idx_withdrawals_user_id")
                .table(Withdrawal::Table)
                .col(Withdrawal::UserId)
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .name("idx_withdrawals_status")
                .table(Withdrawal::Table)
                .col(Withdrawal::Status)
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .name("idx_withdrawals_requested_at")
                .table(Withdrawal::Table)
                .col(Withdrawal::RequestedAt)
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Withdrawal::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Withdrawal {
    #[sea_orm(iden = "withdrawals")]
    Table,
    Id,
    UserId,
    AmountCents,
    Destination,
    Network,
    Status,
    RequestedAt,
    DecidedAt,
    DecidedBy,
    Txid,
    Note,
}

#[derive(DeriveIden)]
enum User {
    #[sea_orm(iden = "users")]
    Table,
    Id,
}
