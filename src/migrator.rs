use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_customers_table::Migration),
            Box::new(m20240101_000002_create_users_table::Migration),
            Box::new(m20240101_000003_create_products_table::Migration),
            Box::new(m20240101_000004_create_warranty_registrations_table::Migration),
            Box::new(m20240101_000005_create_repair_orders_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_customers_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_customers_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Customers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Customers::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Customers::Name).string().not_null())
                        .col(ColumnDef::new(Customers::Phone).string().not_null())
                        .col(ColumnDef::new(Customers::Email).string().not_null())
                        .col(ColumnDef::new(Customers::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Customers::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            // Phone is the unique lookup key; this index arbitrates
            // concurrent resolve-or-create races.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_customers_phone")
                        .table(Customers::Table)
                        .col(Customers::Phone)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Customers::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Customers {
        Table,
        Id,
        Name,
        Phone,
        Email,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_users_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Users::FirstName).string().not_null())
                        .col(ColumnDef::new(Users::LastName).string().not_null())
                        .col(ColumnDef::new(Users::Username).string().not_null())
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(
                            ColumnDef::new(Users::Role)
                                .string_len(32)
                                .not_null()
                                .default("Technician"),
                        )
                        .col(
                            ColumnDef::new(Users::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Users::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_users_username")
                        .table(Users::Table)
                        .col(Users::Username)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_users_role")
                        .table(Users::Table)
                        .col(Users::Role)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Users {
        Table,
        Id,
        FirstName,
        LastName,
        Username,
        PasswordHash,
        Role,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_products_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::Sku).string().not_null())
                        .col(ColumnDef::new(Products::Category).string().not_null())
                        .col(
                            ColumnDef::new(Products::Price)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::QuantityInStock)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::ReorderLevel)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Products::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Products::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_sku")
                        .table(Products::Table)
                        .col(Products::Sku)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_category")
                        .table(Products::Table)
                        .col(Products::Category)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Products {
        Table,
        Id,
        Name,
        Sku,
        Category,
        Price,
        QuantityInStock,
        ReorderLevel,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000004_create_warranty_registrations_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_warranty_registrations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(WarrantyRegistrations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WarrantyRegistrations::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarrantyRegistrations::SerialNumber)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarrantyRegistrations::ProductName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarrantyRegistrations::Category)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarrantyRegistrations::CustomerName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarrantyRegistrations::CustomerPhone)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarrantyRegistrations::CustomerEmail)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarrantyRegistrations::PurchaseDate)
                                .date()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarrantyRegistrations::WarrantyMonths)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarrantyRegistrations::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarrantyRegistrations::UpdatedAt)
                                .timestamp()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_warranty_registrations_serial_number")
                        .table(WarrantyRegistrations::Table)
                        .col(WarrantyRegistrations::SerialNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(
                    Table::drop()
                        .table(WarrantyRegistrations::Table)
                        .to_owned(),
                )
                .await
        }
    }

    #[derive(Iden)]
    enum WarrantyRegistrations {
        Table,
        Id,
        SerialNumber,
        ProductName,
        Category,
        CustomerName,
        CustomerPhone,
        CustomerEmail,
        PurchaseDate,
        WarrantyMonths,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000005_create_repair_orders_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_repair_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(RepairOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RepairOrders::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RepairOrders::TicketNumber)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(RepairOrders::CustomerId).uuid().not_null())
                        .col(
                            ColumnDef::new(RepairOrders::CustomerName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RepairOrders::CustomerPhone)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RepairOrders::CustomerEmail)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(RepairOrders::DeviceType).string().not_null())
                        .col(
                            ColumnDef::new(RepairOrders::DeviceModel)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(RepairOrders::SerialNumber).string().null())
                        .col(
                            ColumnDef::new(RepairOrders::UnderWarranty)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(RepairOrders::ReportedIssue).text().not_null())
                        .col(ColumnDef::new(RepairOrders::TechnicianId).uuid().not_null())
                        .col(ColumnDef::new(RepairOrders::Status).string().not_null())
                        .col(
                            ColumnDef::new(RepairOrders::EstimatedCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(RepairOrders::AdvancePayment)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(RepairOrders::ExtraExpenses)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(RepairOrders::DateReceived).date().not_null())
                        .col(ColumnDef::new(RepairOrders::Deadline).date().not_null())
                        .col(ColumnDef::new(RepairOrders::Notes).text().null())
                        .col(ColumnDef::new(RepairOrders::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(RepairOrders::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            // Useful indexes
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_repair_orders_ticket_number")
                        .table(RepairOrders::Table)
                        .col(RepairOrders::TicketNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_repair_orders_customer_id")
                        .table(RepairOrders::Table)
                        .col(RepairOrders::CustomerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_repair_orders_status")
                        .table(RepairOrders::Table)
                        .col(RepairOrders::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_repair_orders_technician_id")
                        .table(RepairOrders::Table)
                        .col(RepairOrders::TechnicianId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(RepairOrders::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum RepairOrders {
        Table,
        Id,
        TicketNumber,
        CustomerId,
        CustomerName,
        CustomerPhone,
        CustomerEmail,
        DeviceType,
        DeviceModel,
        SerialNumber,
        UnderWarranty,
        ReportedIssue,
        TechnicianId,
        Status,
        EstimatedCost,
        AdvancePayment,
        ExtraExpenses,
        DateReceived,
        Deadline,
        Notes,
        CreatedAt,
        UpdatedAt,
    }
}
