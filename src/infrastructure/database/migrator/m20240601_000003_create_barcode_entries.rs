//! Create barcode entries with their extra-time ledger and outside tracker
//!
//! `barcode_entries.version` is bumped by every guarded write so concurrent
//! writers across processes serialise on the row.

use sea_orm_migration::prelude::*;

use super::m20240601_000001_create_directory::RateRows;
use super::m20240601_000002_create_reservations::Reservations;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BarcodeEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BarcodeEntries::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BarcodeEntries::ReservationId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BarcodeEntries::BarcodeNumber)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BarcodeEntries::CustomerTypeId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BarcodeEntries::InitialMinutes)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BarcodeEntries::Status)
                            .string()
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(
                        ColumnDef::new(BarcodeEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BarcodeEntries::CompletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(BarcodeEntries::Version)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_barcode_entries_reservation")
                            .from(BarcodeEntries::Table, BarcodeEntries::ReservationId)
                            .to(Reservations::Table, Reservations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_barcode_entries_number")
                    .table(BarcodeEntries::Table)
                    .col(BarcodeEntries::BarcodeNumber)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_barcode_entries_reservation")
                    .table(BarcodeEntries::Table)
                    .col(BarcodeEntries::ReservationId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ExtraTimeCharges::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExtraTimeCharges::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ExtraTimeCharges::BarcodeId).integer().not_null())
                    .col(ColumnDef::new(ExtraTimeCharges::RateRowId).integer().not_null())
                    .col(
                        ColumnDef::new(ExtraTimeCharges::AdditionalMinutes)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExtraTimeCharges::BilledMinutes)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExtraTimeCharges::UnitPrice)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExtraTimeCharges::Quantity).integer().not_null())
                    .col(
                        ColumnDef::new(ExtraTimeCharges::ComputedTotal)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExtraTimeCharges::AppliedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_extra_time_barcode")
                            .from(ExtraTimeCharges::Table, ExtraTimeCharges::BarcodeId)
                            .to(BarcodeEntries::Table, BarcodeEntries::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_extra_time_rate_row")
                            .from(ExtraTimeCharges::Table, ExtraTimeCharges::RateRowId)
                            .to(RateRows::Table, RateRows::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OutsideTrackEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OutsideTrackEntries::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(OutsideTrackEntries::BarcodeId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OutsideTrackEntries::OutAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(OutsideTrackEntries::InAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_outside_track_barcode")
                            .from(OutsideTrackEntries::Table, OutsideTrackEntries::BarcodeId)
                            .to(BarcodeEntries::Table, BarcodeEntries::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_outside_track_barcode")
                    .table(OutsideTrackEntries::Table)
                    .col(OutsideTrackEntries::BarcodeId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OutsideTrackEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExtraTimeCharges::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BarcodeEntries::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum BarcodeEntries {
    Table,
    Id,
    ReservationId,
    BarcodeNumber,
    CustomerTypeId,
    InitialMinutes,
    Status,
    CreatedAt,
    CompletedAt,
    Version,
}

#[derive(Iden)]
pub enum ExtraTimeCharges {
    Table,
    Id,
    BarcodeId,
    RateRowId,
    AdditionalMinutes,
    BilledMinutes,
    UnitPrice,
    Quantity,
    ComputedTotal,
    AppliedAt,
}

#[derive(Iden)]
pub enum OutsideTrackEntries {
    Table,
    Id,
    BarcodeId,
    OutAt,
    InAt,
}
