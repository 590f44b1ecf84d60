use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PlanningSearches::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PlanningSearches::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PlanningSearches::FilterKey)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PlanningSearches::FilterType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PlanningSearches::ResultsJson)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PlanningSearches::CreatedAt)
                            .string()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Not unique: every search appends a new snapshot for its key.
        manager
            .create_index(
                Index::create()
                    .name("idx_planning_searches_key_created")
                    .table(PlanningSearches::Table)
                    .col(PlanningSearches::FilterKey)
                    .col(PlanningSearches::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PlanningSearches::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PlanningSearches {
    Table,
    Id,
    FilterKey,
    FilterType,
    ResultsJson,
    CreatedAt,
}
