//! Create reservations, their customer-type counts and payment records

use sea_orm_migration::prelude::*;

use super::m20240601_000001_create_directory::{Branches, Customers, RateRows};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reservations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reservations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Reservations::BranchId).integer().not_null())
                    .col(ColumnDef::new(Reservations::CustomerId).integer().not_null())
                    .col(
                        ColumnDef::new(Reservations::Status)
                            .string()
                            .not_null()
                            .default("PENDING_PAYMENT"),
                    )
                    .col(
                        ColumnDef::new(Reservations::PaymentStatus)
                            .string()
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(ColumnDef::new(Reservations::TotalPrice).big_integer().not_null())
                    .col(
                        ColumnDef::new(Reservations::CreatedDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservations_branch")
                            .from(Reservations::Table, Reservations::BranchId)
                            .to(Branches::Table, Branches::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservations_customer")
                            .from(Reservations::Table, Reservations::CustomerId)
                            .to(Customers::Table, Customers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reservations_customer")
                    .table(Reservations::Table)
                    .col(Reservations::CustomerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reservations_status")
                    .table(Reservations::Table)
                    .col(Reservations::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReservationCustomerCounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReservationCustomerCounts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReservationCustomerCounts::ReservationId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReservationCustomerCounts::CustomerTypeId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReservationCustomerCounts::RateRowId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReservationCustomerCounts::Count)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReservationCustomerCounts::UnitPrice)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReservationCustomerCounts::DurationMinutes)
                            .integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_customer_counts_reservation")
                            .from(
                                ReservationCustomerCounts::Table,
                                ReservationCustomerCounts::ReservationId,
                            )
                            .to(Reservations::Table, Reservations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_customer_counts_rate_row")
                            .from(
                                ReservationCustomerCounts::Table,
                                ReservationCustomerCounts::RateRowId,
                            )
                            .to(RateRows::Table, RateRows::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReservationPayments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReservationPayments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReservationPayments::ReservationId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReservationPayments::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReservationPayments::Method).string().not_null())
                    .col(ColumnDef::new(ReservationPayments::Status).string().not_null())
                    .col(
                        ColumnDef::new(ReservationPayments::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_reservation")
                            .from(ReservationPayments::Table, ReservationPayments::ReservationId)
                            .to(Reservations::Table, Reservations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReservationPayments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ReservationCustomerCounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Reservations::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Reservations {
    Table,
    Id,
    BranchId,
    CustomerId,
    Status,
    PaymentStatus,
    TotalPrice,
    CreatedDate,
}

#[derive(Iden)]
pub enum ReservationCustomerCounts {
    Table,
    Id,
    ReservationId,
    CustomerTypeId,
    RateRowId,
    Count,
    UnitPrice,
    DurationMinutes,
}

#[derive(Iden)]
pub enum ReservationPayments {
    Table,
    Id,
    ReservationId,
    Amount,
    Method,
    Status,
    RecordedAt,
}
