use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_customers_table::Migration),
            Box::new(m20240101_000002_create_products_table::Migration),
            Box::new(m20240101_000003_create_shops_table::Migration),
            Box::new(m20240101_000004_create_promo_events_table::Migration),
            Box::new(m20240101_000005_create_provinces_table::Migration),
            Box::new(m20240101_000006_create_districts_table::Migration),
            Box::new(m20240101_000007_create_orders_table::Migration),
            Box::new(m20240101_000008_create_order_items_table::Migration),
            Box::new(m20240101_000009_create_admin_users_table::Migration),
            Box::new(m20240101_000010_create_error_logs_table::Migration),
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
            // Create customers table aligned with entities::customer Model.
            // phone_number is the natural key used by the order-creation upsert;
            // the unique index makes a concurrent first-order race surface as a
            // conflict instead of a duplicate row.
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
                        .col(
                            ColumnDef::new(Customers::PhoneNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Customers::FullName).string().not_null())
                        .col(ColumnDef::new(Customers::DateOfBirth).date().not_null())
                        .col(ColumnDef::new(Customers::Gender).string().not_null())
                        .col(ColumnDef::new(Customers::Province).string().not_null())
                        .col(ColumnDef::new(Customers::District).string().not_null())
                        .col(ColumnDef::new(Customers::Village).string().not_null())
                        .col(
                            ColumnDef::new(Customers::AcceptTerms)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Customers::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Customers::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Customers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Customers {
        Table,
        Id,
        PhoneNumber,
        FullName,
        DateOfBirth,
        Gender,
        Province,
        District,
        Village,
        AcceptTerms,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_products_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_products_table"
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
                        .col(
                            ColumnDef::new(Products::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(
                            ColumnDef::new(Products::ProductPrice)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::CrateQtyPerProduct)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(Products::PromotionFreeQty)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::CratePrice)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Products::Images).string().null())
                        .col(ColumnDef::new(Products::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Products::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Products {
        Table,
        Id,
        Name,
        ProductPrice,
        CrateQtyPerProduct,
        PromotionFreeQty,
        CratePrice,
        Images,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_shops_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_shops_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Shops::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Shops::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Shops::Code).string().not_null().unique_key())
                        .col(ColumnDef::new(Shops::Name).string().not_null())
                        .col(ColumnDef::new(Shops::OwnerName).string().not_null())
                        .col(ColumnDef::new(Shops::OwnerPhone).string().not_null())
                        .col(ColumnDef::new(Shops::Province).string().not_null())
                        .col(ColumnDef::new(Shops::District).string().not_null())
                        .col(ColumnDef::new(Shops::Village).string().not_null())
                        .col(ColumnDef::new(Shops::ActivatedAt).timestamp().null())
                        .col(ColumnDef::new(Shops::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Shops::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Shops::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Shops {
        Table,
        Id,
        Code,
        Name,
        OwnerName,
        OwnerPhone,
        Province,
        District,
        Village,
        ActivatedAt,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000004_create_promo_events_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_promo_events_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PromoEvents::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PromoEvents::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PromoEvents::Name).string().not_null())
                        .col(
                            ColumnDef::new(PromoEvents::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(PromoEvents::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PromoEvents::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PromoEvents::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum PromoEvents {
        Table,
        Id,
        Name,
        Active,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000005_create_provinces_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_provinces_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Provinces::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Provinces::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Provinces::Code)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Provinces::Name).string().not_null())
                        .col(
                            ColumnDef::new(Provinces::Deleted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Provinces::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Provinces {
        Table,
        Id,
        Code,
        Name,
        Deleted,
    }
}

mod m20240101_000006_create_districts_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_districts_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Districts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Districts::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Districts::ProvinceId).integer().not_null())
                        .col(ColumnDef::new(Districts::Name).string().not_null())
                        .col(
                            ColumnDef::new(Districts::Deleted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_districts_province_id")
                                .from(Districts::Table, Districts::ProvinceId)
                                .to(Provinces::Table, Provinces::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_districts_province_id")
                        .table(Districts::Table)
                        .col(Districts::ProvinceId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Districts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Districts {
        Table,
        Id,
        ProvinceId,
        Name,
        Deleted,
    }

    #[derive(DeriveIden)]
    enum Provinces {
        Table,
        Id,
    }
}

mod m20240101_000007_create_orders_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000007_create_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create orders table aligned with entities::order Model
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Orders::OrderCode)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Orders::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Orders::ShopId).integer().not_null())
                        .col(ColumnDef::new(Orders::EventId).integer().not_null())
                        .col(
                            ColumnDef::new(Orders::CrateFeeTotal)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::Subtotal)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::GrandTotal)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Orders::Status).string().not_null())
                        .col(ColumnDef::new(Orders::Remark).string().null())
                        .col(ColumnDef::new(Orders::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Orders::UpdatedAt).timestamp().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_customer_id")
                                .from(Orders::Table, Orders::CustomerId)
                                .to(Customers::Table, Customers::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_shop_id")
                                .from(Orders::Table, Orders::ShopId)
                                .to(Shops::Table, Shops::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_event_id")
                                .from(Orders::Table, Orders::EventId)
                                .to(PromoEvents::Table, PromoEvents::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_customer_id")
                        .table(Orders::Table)
                        .col(Orders::CustomerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_status")
                        .table(Orders::Table)
                        .col(Orders::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Orders {
        Table,
        Id,
        OrderCode,
        CustomerId,
        ShopId,
        EventId,
        CrateFeeTotal,
        Subtotal,
        GrandTotal,
        Status,
        Remark,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Customers {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Shops {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum PromoEvents {
        Table,
        Id,
    }
}

mod m20240101_000008_create_order_items_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000008_create_order_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create order_items table aligned with entities::order_item Model
            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::ProductId).integer().not_null())
                        .col(ColumnDef::new(OrderItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(OrderItems::CrateQtyPerProduct)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderItems::PromotionFreeQty)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderItems::PricePerItem)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::CratePrice).decimal().not_null())
                        .col(ColumnDef::new(OrderItems::LineTotal).decimal().not_null())
                        .col(
                            ColumnDef::new(OrderItems::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_order_id")
                                .from(OrderItems::Table, OrderItems::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_product_id")
                                .from(OrderItems::Table, OrderItems::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_items_order_id")
                        .table(OrderItems::Table)
                        .col(OrderItems::OrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum OrderItems {
        Table,
        Id,
        OrderId,
        ProductId,
        Quantity,
        CrateQtyPerProduct,
        PromotionFreeQty,
        PricePerItem,
        CratePrice,
        LineTotal,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Orders {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Products {
        Table,
        Id,
    }
}

mod m20240101_000009_create_admin_users_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000009_create_admin_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(AdminUsers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(AdminUsers::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(AdminUsers::Email)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(AdminUsers::PasswordHash).string().not_null())
                        .col(ColumnDef::new(AdminUsers::FullName).string().not_null())
                        .col(ColumnDef::new(AdminUsers::PhoneNumber).string().not_null())
                        .col(ColumnDef::new(AdminUsers::DateOfBirth).date().not_null())
                        .col(ColumnDef::new(AdminUsers::Status).string().not_null())
                        .col(ColumnDef::new(AdminUsers::Role).string().not_null())
                        .col(
                            ColumnDef::new(AdminUsers::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(AdminUsers::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(AdminUsers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum AdminUsers {
        Table,
        Id,
        Email,
        PasswordHash,
        FullName,
        PhoneNumber,
        DateOfBirth,
        Status,
        Role,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000010_create_error_logs_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000010_create_error_logs_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ErrorLogs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ErrorLogs::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ErrorLogs::Endpoint).string().not_null())
                        .col(ColumnDef::new(ErrorLogs::RequestBody).text().not_null())
                        .col(ColumnDef::new(ErrorLogs::ErrorMessage).text().not_null())
                        .col(ColumnDef::new(ErrorLogs::OccurredAt).timestamp().not_null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ErrorLogs::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ErrorLogs {
        Table,
        Id,
        Endpoint,
        RequestBody,
        ErrorMessage,
        OccurredAt,
    }
}
