use crate::{
    entities::customer::Entity as CustomerEntity,
    entities::order::{self, ActiveModel as OrderActiveModel, Entity as OrderEntity},
    entities::order_item::{self, Entity as OrderItemEntity},
    entities::product::{self, Entity as ProductEntity},
    entities::shop::Entity as ShopEntity,
    errors::ServiceError,
    events::{Event, EventSender},
    services::customers::{self, CustomerProfile},
};
use chrono::{DateTime, NaiveDate, Utc};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Status stamped on every freshly created order.
pub const STATUS_PENDING: &str = "PENDING";

/// Customer gender, a fixed enumeration on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, strum::Display)]
pub enum Gender {
    #[serde(rename = "MALE")]
    #[strum(serialize = "MALE")]
    Male,
    #[serde(rename = "FEMALE")]
    #[strum(serialize = "FEMALE")]
    Female,
    #[serde(rename = "LGBTQA+")]
    #[strum(serialize = "LGBTQA+")]
    Lgbtqa,
}

/// Request/Response types for the order service
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    #[validate]
    pub user: CustomerPayload,
    #[validate]
    pub order_details: Vec<OrderLineRequest>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CustomerPayload {
    pub shop_id: i32,
    pub event_id: i32,
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[validate(length(min = 1, message = "Phone number is required"))]
    pub phone_number: String,
    /// Date of birth; must parse as a calendar date
    pub dob: String,
    pub gender: Gender,
    pub province: String,
    pub district: String,
    pub village: String,
    pub accept_terms: bool,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderLineRequest {
    pub product_id: i32,
    #[validate(range(min = 1, message = "Quantity must be a positive integer"))]
    pub order_detail_qty: i32,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ApproveOrderRequest {
    #[serde(rename = "orderStatus")]
    #[validate(length(min = 1, max = 32, message = "Order status is required"))]
    pub order_status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
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

/// Flattened order view for the public summary page.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderSummaryResponse {
    pub id: Uuid,
    pub order_code: String,
    pub created_at: DateTime<Utc>,
    pub shop_name: String,
    pub shop_code: String,
    pub shop_phone: String,
    pub crate_fee_total: Decimal,
    pub subtotal: Decimal,
    pub grand_total: Decimal,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_province: String,
    pub customer_district: String,
    pub customer_village: String,
    pub order_details: Vec<OrderSummaryLine>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderSummaryLine {
    pub id: Uuid,
    pub product_id: i32,
    pub product_name: String,
    pub quantity: i32,
    /// Free units granted for this line: promotion_free_qty × quantity,
    /// computed from the snapshot taken at order time
    pub total_promotion_qty: i32,
    pub product_price: Decimal,
    pub line_total: Decimal,
    pub images: Option<String>,
}

/// Per-line crate fee and subtotal from a product snapshot.
///
/// crate fee = (crate_qty_per_product + promotion_free_qty) × qty × crate_price
/// subtotal  = qty × product_price
pub fn line_amounts(product: &product::Model, quantity: i32) -> (Decimal, Decimal) {
    let qty = Decimal::from(quantity);
    let crate_fee = Decimal::from(product.crate_qty_per_product + product.promotion_free_qty)
        * qty
        * product.crate_price;
    let subtotal = qty * product.product_price;
    (crate_fee, subtotal)
}

/// Parse the submitted date of birth, accepting a plain date or a full
/// RFC 3339 timestamp.
fn parse_dob(raw: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| ServiceError::ValidationError("dob: Invalid date format".to_string()))
}

fn generate_order_code() -> String {
    let suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(char::from)
        .collect::<String>()
        .to_ascii_uppercase();
    format!("ORD-{}", suffix)
}

/// Service for the order lifecycle: creation, approval and summary lookup.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderService {
    /// Creates a new order service instance
    pub fn new(db_pool: Arc<DatabaseConnection>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates an order atomically: upsert the customer by phone number,
    /// compute totals from the product catalog, then persist the order and
    /// one line item per requested product. Any failure rolls the whole
    /// transaction back; no partial writes survive.
    #[instrument(skip(self, request), fields(phone = %request.user.phone_number, shop_id = request.user.shop_id))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;
        if request.order_details.is_empty() {
            return Err(ServiceError::ValidationError(
                "order_details: At least one order line is required".to_string(),
            ));
        }
        let date_of_birth = parse_dob(&request.user.dob)?;

        let db = &*self.db_pool;
        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let order_code = generate_order_code();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order creation");
            ServiceError::from(e)
        })?;

        let profile = CustomerProfile {
            phone_number: request.user.phone_number.clone(),
            full_name: request.user.full_name.clone(),
            date_of_birth,
            gender: request.user.gender.to_string(),
            province: request.user.province.clone(),
            district: request.user.district.clone(),
            village: request.user.village.clone(),
            accept_terms: request.user.accept_terms,
        };
        let (customer, customer_created) = customers::upsert_by_phone(&txn, &profile).await?;

        // Resolve every product up front; a missing product aborts the
        // whole submission.
        let mut lines: Vec<(product::Model, i32)> = Vec::with_capacity(request.order_details.len());
        for detail in &request.order_details {
            let product = ProductEntity::find_by_id(detail.product_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "Product with ID {} not found",
                        detail.product_id
                    ))
                })?;
            lines.push((product, detail.order_detail_qty));
        }

        let mut crate_fee_total = Decimal::ZERO;
        let mut subtotal = Decimal::ZERO;
        for (product, quantity) in &lines {
            let (line_crate_fee, line_subtotal) = line_amounts(product, *quantity);
            crate_fee_total += line_crate_fee;
            subtotal += line_subtotal;
        }
        let grand_total = crate_fee_total + subtotal;

        let order_model = OrderActiveModel {
            id: Set(order_id),
            order_code: Set(order_code),
            customer_id: Set(customer.id),
            shop_id: Set(request.user.shop_id),
            event_id: Set(request.user.event_id),
            crate_fee_total: Set(crate_fee_total),
            subtotal: Set(subtotal),
            grand_total: Set(grand_total),
            status: Set(STATUS_PENDING.to_string()),
            remark: Set(None),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to create order in database");
            ServiceError::from(e)
        })?;

        for (product, quantity) in &lines {
            let (_, line_subtotal) = line_amounts(product, *quantity);
            order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(product.id),
                quantity: Set(*quantity),
                crate_qty_per_product: Set(product.crate_qty_per_product),
                promotion_free_qty: Set(product.promotion_free_qty),
                price_per_item: Set(product.product_price),
                crate_price: Set(product.crate_price),
                line_total: Set(line_subtotal),
                created_at: Set(now),
            }
            .insert(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, product_id = product.id, "Failed to create order line item");
                ServiceError::from(e)
            })?;
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit order creation transaction");
            ServiceError::from(e)
        })?;

        info!(order_id = %order_id, customer_id = %customer.id, "Order created successfully");

        if let Some(event_sender) = &self.event_sender {
            let customer_event = if customer_created {
                Event::CustomerCreated(customer.id)
            } else {
                Event::CustomerUpdated(customer.id)
            };
            if let Err(e) = event_sender.send(customer_event).await {
                warn!(error = %e, customer_id = %customer.id, "Failed to send customer event");
            }
            if let Err(e) = event_sender.send(Event::OrderCreated(order_id)).await {
                warn!(error = %e, order_id = %order_id, "Failed to send order created event");
            }
        }

        Ok(model_to_response(order_model))
    }

    /// Single-field status transition: set the order's status and record the
    /// acting administrator's name as the remark. No transition constraints
    /// are enforced.
    #[instrument(skip(self, request), fields(order_id = %order_id, new_status = %request.order_status))]
    pub async fn approve_order(
        &self,
        order_id: Uuid,
        request: ApproveOrderRequest,
        approver: Option<String>,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let now = Utc::now();

        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                warn!(order_id = %order_id, "Order not found for approval");
                ServiceError::NotFound("Order not found".to_string())
            })?;

        let old_status = order.status.clone();

        let mut active: OrderActiveModel = order.into();
        active.status = Set(request.order_status.clone());
        active.remark = Set(approver);
        active.updated_at = Set(Some(now));

        let updated = active.update(db).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to update order status");
            ServiceError::from(e)
        })?;

        info!(order_id = %order_id, old_status = %old_status, new_status = %request.order_status, "Order status updated");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::OrderStatusChanged {
                    order_id,
                    old_status,
                    new_status: request.order_status.clone(),
                })
                .await
            {
                warn!(error = %e, order_id = %order_id, "Failed to send order status changed event");
            }
        }

        Ok(model_to_response(updated))
    }

    /// Public order summary keyed by order code: order totals plus the shop,
    /// customer and line items (with product names joined back in).
    #[instrument(skip(self))]
    pub async fn get_order_summary(
        &self,
        order_code: &str,
    ) -> Result<OrderSummaryResponse, ServiceError> {
        let db = &*self.db_pool;

        let order = OrderEntity::find()
            .filter(order::Column::OrderCode.eq(order_code))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        let shop = ShopEntity::find_by_id(order.shop_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Shop not found".to_string()))?;

        let customer = CustomerEntity::find_by_id(order.customer_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Customer not found".to_string()))?;

        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .order_by_asc(order_item::Column::CreatedAt)
            .find_also_related(ProductEntity)
            .all(db)
            .await?;

        let order_details = items
            .into_iter()
            .map(|(item, product)| {
                let (product_name, images) = product
                    .map(|p| (p.name, p.images))
                    .unwrap_or_else(|| (item.product_id.to_string(), None));
                OrderSummaryLine {
                    id: item.id,
                    product_id: item.product_id,
                    product_name,
                    quantity: item.quantity,
                    total_promotion_qty: item.promotion_free_qty * item.quantity,
                    product_price: item.price_per_item,
                    line_total: item.line_total,
                    images,
                }
            })
            .collect();

        Ok(OrderSummaryResponse {
            id: order.id,
            order_code: order.order_code,
            created_at: order.created_at,
            shop_name: shop.name,
            shop_code: shop.code,
            shop_phone: shop.owner_phone,
            crate_fee_total: order.crate_fee_total,
            subtotal: order.subtotal,
            grand_total: order.grand_total,
            customer_name: customer.full_name,
            customer_phone: customer.phone_number,
            customer_province: customer.province,
            customer_district: customer.district,
            customer_village: customer.village,
            order_details,
        })
    }
}

/// Converts an order model to response format
fn model_to_response(model: order::Model) -> OrderResponse {
    OrderResponse {
        id: model.id,
        order_code: model.order_code,
        customer_id: model.customer_id,
        shop_id: model.shop_id,
        event_id: model.event_id,
        crate_fee_total: model.crate_fee_total,
        subtotal: model.subtotal,
        grand_total: model.grand_total,
        status: model.status,
        remark: model.remark,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_product(
        price: Decimal,
        crate_qty: i32,
        free_qty: i32,
        crate_price: Decimal,
    ) -> product::Model {
        product::Model {
            id: 1,
            name: "Crate of lager".to_string(),
            product_price: price,
            crate_qty_per_product: crate_qty,
            promotion_free_qty: free_qty,
            crate_price,
            images: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn line_amounts_match_documented_example() {
        // price 10000, crate qty 1, free qty 0, crate price 500, qty 2
        // -> subtotal 20000, crate fee (1+0)*2*500 = 1000
        let product = sample_product(dec!(10000), 1, 0, dec!(500));
        let (crate_fee, subtotal) = line_amounts(&product, 2);
        assert_eq!(crate_fee, dec!(1000));
        assert_eq!(subtotal, dec!(20000));
        assert_eq!(crate_fee + subtotal, dec!(21000));
    }

    #[test]
    fn line_amounts_include_promotion_free_qty_in_crate_fee() {
        let product = sample_product(dec!(85000), 2, 1, dec!(15000));
        let (crate_fee, subtotal) = line_amounts(&product, 3);
        // (2 + 1) * 3 * 15000
        assert_eq!(crate_fee, dec!(135000));
        assert_eq!(subtotal, dec!(255000));
    }

    #[test]
    fn parse_dob_accepts_date_and_rfc3339() {
        assert_eq!(
            parse_dob("1995-06-15").unwrap(),
            NaiveDate::from_ymd_opt(1995, 6, 15).unwrap()
        );
        assert_eq!(
            parse_dob("1995-06-15T00:00:00Z").unwrap(),
            NaiveDate::from_ymd_opt(1995, 6, 15).unwrap()
        );
        assert!(parse_dob("not-a-date").is_err());
        assert!(parse_dob("1995-13-40").is_err());
    }

    #[test]
    fn order_code_shape() {
        let code = generate_order_code();
        assert!(code.starts_with("ORD-"));
        assert_eq!(code.len(), 14);
        assert!(code[4..]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn gender_serializes_to_wire_values() {
        assert_eq!(serde_json::to_string(&Gender::Male).unwrap(), "\"MALE\"");
        assert_eq!(
            serde_json::to_string(&Gender::Lgbtqa).unwrap(),
            "\"LGBTQA+\""
        );
        let parsed: Gender = serde_json::from_str("\"FEMALE\"").unwrap();
        assert_eq!(parsed, Gender::Female);
        assert!(serde_json::from_str::<Gender>("\"OTHER\"").is_err());
    }

    fn sample_payload() -> CustomerPayload {
        CustomerPayload {
            shop_id: 1,
            event_id: 1,
            full_name: "Khamla Vong".to_string(),
            phone_number: "02055512345".to_string(),
            dob: "1990-01-01".to_string(),
            gender: Gender::Female,
            province: "Vientiane".to_string(),
            district: "Chanthabouly".to_string(),
            village: "Ban Mixay".to_string(),
            accept_terms: true,
        }
    }

    #[test]
    fn create_order_request_validation() {
        // zero quantity is rejected
        let request = CreateOrderRequest {
            user: sample_payload(),
            order_details: vec![OrderLineRequest {
                product_id: 1,
                order_detail_qty: 0,
            }],
        };
        assert!(request.validate().is_err());

        // empty phone number is rejected
        let request = CreateOrderRequest {
            user: CustomerPayload {
                phone_number: String::new(),
                ..sample_payload()
            },
            order_details: vec![OrderLineRequest {
                product_id: 1,
                order_detail_qty: 1,
            }],
        };
        assert!(request.validate().is_err());
    }

    #[tokio::test]
    async fn create_order_rejects_empty_line_items_before_touching_the_store() {
        let service = OrderService::new(Arc::new(sea_orm::DatabaseConnection::Disconnected), None);
        let request = CreateOrderRequest {
            user: sample_payload(),
            order_details: vec![],
        };

        let err = service.create_order(request).await.unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[tokio::test]
    async fn create_order_rejects_unparseable_dob_before_touching_the_store() {
        let service = OrderService::new(Arc::new(sea_orm::DatabaseConnection::Disconnected), None);
        let request = CreateOrderRequest {
            user: CustomerPayload {
                dob: "yesterday".to_string(),
                ..sample_payload()
            },
            order_details: vec![OrderLineRequest {
                product_id: 1,
                order_detail_qty: 1,
            }],
        };

        let err = service.create_order(request).await.unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[test]
    fn model_to_response_conversion() {
        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let customer_id = Uuid::new_v4();

        let model = order::Model {
            id: order_id,
            order_code: "ORD-AB12CD34EF".to_string(),
            customer_id,
            shop_id: 7,
            event_id: 2,
            crate_fee_total: dec!(1000),
            subtotal: dec!(20000),
            grand_total: dec!(21000),
            status: STATUS_PENDING.to_string(),
            remark: None,
            created_at: now,
            updated_at: Some(now),
        };

        let response = model_to_response(model);
        assert_eq!(response.id, order_id);
        assert_eq!(response.customer_id, customer_id);
        assert_eq!(response.order_code, "ORD-AB12CD34EF");
        assert_eq!(response.grand_total, dec!(21000));
        assert_eq!(response.status, STATUS_PENDING);
    }
}
