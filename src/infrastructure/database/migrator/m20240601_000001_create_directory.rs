//! Create reference tables
//!
//! Branches, customers, customer types and the rate table. They are owned by
//! external CRUD screens and pricing; the engine only reads them.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Branches::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Branches::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Branches::Name).string().not_null())
                    .col(
                        ColumnDef::new(Branches::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Customers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Customers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Customers::Name).string().not_null())
                    .col(ColumnDef::new(Customers::Mobile).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_customers_mobile")
                    .table(Customers::Table)
                    .col(Customers::Mobile)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CustomerTypes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CustomerTypes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CustomerTypes::Name).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RateRows::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RateRows::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RateRows::BranchId).integer().not_null())
                    .col(ColumnDef::new(RateRows::CustomerTypeId).integer().not_null())
                    .col(ColumnDef::new(RateRows::DurationMinutes).integer().not_null())
                    // Minor units
                    .col(ColumnDef::new(RateRows::Price).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rate_rows_branch")
                            .from(RateRows::Table, RateRows::BranchId)
                            .to(Branches::Table, Branches::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rate_rows_customer_type")
                            .from(RateRows::Table, RateRows::CustomerTypeId)
                            .to(CustomerTypes::Table, CustomerTypes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_rate_rows_branch_type")
                    .table(RateRows::Table)
                    .col(RateRows::BranchId)
                    .col(RateRows::CustomerTypeId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RateRows::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CustomerTypes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Customers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Branches::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Branches {
    Table,
    Id,
    Name,
    IsActive,
}

#[derive(Iden)]
pub enum Customers {
    Table,
    Id,
    Name,
    Mobile,
}

#[derive(Iden)]
pub enum CustomerTypes {
    Table,
    Id,
    Name,
}

#[derive(Iden)]
pub enum RateRows {
    Table,
    Id,
    BranchId,
    CustomerTypeId,
    DurationMinutes,
    Price,
}
