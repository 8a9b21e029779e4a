use crate::{
    entities::district::{self, Entity as DistrictEntity},
    entities::product::{self, Entity as ProductEntity},
    entities::promo_event::{self, Entity as PromoEventEntity},
    entities::province::{self, Entity as ProvinceEntity},
    entities::shop::{self, Entity as ShopEntity},
    errors::ServiceError,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

/// Trimmed shop view used by the public shop listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShopSummary {
    pub id: i32,
    pub code: String,
    pub name: String,
}

/// Province with its districts, for the address picker.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProvinceWithDistricts {
    #[serde(flatten)]
    pub province: province::Model,
    pub districts: Vec<district::Model>,
}

/// Read-only lookups over the reference catalog: products, shops,
/// promotional events and the province/district address data.
#[derive(Clone)]
pub struct CatalogService {
    db_pool: Arc<DatabaseConnection>,
}

impl CatalogService {
    pub fn new(db_pool: Arc<DatabaseConnection>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<product::Model>, ServiceError> {
        Ok(ProductEntity::find().all(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: i32) -> Result<product::Model, ServiceError> {
        ProductEntity::find_by_id(product_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))
    }

    /// Active shops only; inactive shops never show up in the picker.
    #[instrument(skip(self))]
    pub async fn list_active_shops(&self) -> Result<Vec<ShopSummary>, ServiceError> {
        let shops = ShopEntity::find()
            .filter(shop::Column::ActivatedAt.is_not_null())
            .select_only()
            .column(shop::Column::Id)
            .column(shop::Column::Code)
            .column(shop::Column::Name)
            .into_tuple::<(i32, String, String)>()
            .all(&*self.db_pool)
            .await?;

        Ok(shops
            .into_iter()
            .map(|(id, code, name)| ShopSummary { id, code, name })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_shop(&self, shop_id: i32) -> Result<shop::Model, ServiceError> {
        ShopEntity::find_by_id(shop_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Shop not found".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn list_active_events(&self) -> Result<Vec<promo_event::Model>, ServiceError> {
        Ok(PromoEventEntity::find()
            .filter(promo_event::Column::Active.eq(true))
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn list_provinces(&self) -> Result<Vec<province::Model>, ServiceError> {
        Ok(ProvinceEntity::find()
            .filter(province::Column::Deleted.eq(false))
            .all(&*self.db_pool)
            .await?)
    }

    /// Province plus its districts, 404 when the province is unknown.
    #[instrument(skip(self))]
    pub async fn get_province_with_districts(
        &self,
        province_id: i32,
    ) -> Result<ProvinceWithDistricts, ServiceError> {
        let province = ProvinceEntity::find_by_id(province_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("District not found".to_string()))?;

        let districts = DistrictEntity::find()
            .filter(district::Column::ProvinceId.eq(province_id))
            .all(&*self.db_pool)
            .await?;

        Ok(ProvinceWithDistricts {
            province,
            districts,
        })
    }

    #[instrument(skip(self))]
    pub async fn list_districts(
        &self,
        province_id: i32,
    ) -> Result<Vec<district::Model>, ServiceError> {
        Ok(DistrictEntity::find()
            .filter(district::Column::ProvinceId.eq(province_id))
            .filter(district::Column::Deleted.eq(false))
            .all(&*self.db_pool)
            .await?)
    }
}
