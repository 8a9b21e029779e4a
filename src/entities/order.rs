use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A customer's purchase request for one shop and promotional event.
///
/// Invariant: `grand_total == crate_fee_total + subtotal`, each the sum of
/// the corresponding per-line values captured at creation time.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    #[validate(length(
        min = 1,
        max = 32,
        message = "Order code must be between 1 and 32 characters"
    ))]
    pub order_code: String,

    pub customer_id: Uuid,
    pub shop_id: i32,
    pub event_id: i32,
    pub crate_fee_total: Decimal,
    pub subtotal: Decimal,
    pub grand_total: Decimal,
    pub status: String,
    pub remark: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
    #[sea_orm(
        belongs_to = "super::shop::Entity",
        from = "Column::ShopId",
        to = "super::shop::Column::Id"
    )]
    Shop,
    #[sea_orm(
        belongs_to = "super::promo_event::Entity",
        from = "Column::EventId",
        to = "super::promo_event::Column::Id"
    )]
    PromoEvent,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::shop::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shop.def()
    }
}

impl Related<super::promo_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PromoEvent.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
