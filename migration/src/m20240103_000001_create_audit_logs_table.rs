use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(AuditLog::Table)
                .if_not_exists()
                .col(
                    ColumnDef::new(AuditLog::Id)
                        .big_integer()
                        .not_null()
                        .auto_increment()
                        .primary_key()
                )
                .col(ColumnDef::new(AuditLog::Actor).string().not_null())
                .col(ColumnDef::new(AuditLog::Action).string_len(32).not_null())
                .col(ColumnDef::new(AuditLog::EntityType).string_len(20).not_null())
                .col(ColumnDef::new(AuditLog::EntityId).big_integer().not_null())
                .col(ColumnDef::new(AuditLog::Meta).json().not_null())
                .col(
                    ColumnDef::new(AuditLog::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp())
                )
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .name("idx_audit_logs_actor")
                .table(AuditLog::Table)
                .col(AuditLog::Actor)
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .name("idx_audit_logs_created_at")
                .table(AuditLog::Table)
                .col(AuditLog::CreatedAt)
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(AuditLog::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum AuditLog {
    #[sea_orm(iden = "audit_logs")]
    Table,
    Id,
    Actor,
    Action,
    EntityType,
    EntityId,
    Meta,
    CreatedAt,
}
