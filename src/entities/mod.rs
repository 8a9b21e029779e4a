pub mod admin_user;
pub mod customer;
pub mod district;
pub mod error_log;
pub mod order;
pub mod order_item;
pub mod product;
pub mod promo_event;
pub mod province;
pub mod shop;
