use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::entities::customer::{self, Entity as CustomerEntity};
use crate::errors::ServiceError;

/// Profile fields written on every order submission.
#[derive(Debug, Clone)]
pub struct CustomerProfile {
    pub phone_number: String,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub province: String,
    pub district: String,
    pub village: String,
    pub accept_terms: bool,
}

/// Find-then-create-or-update keyed by phone number.
///
/// The phone number is a durable identity across repeat orders: an existing
/// row has its profile fields overwritten with the submitted values, a new
/// phone number gets a fresh row. Returns the resulting customer and whether
/// it was newly created. Runs on whatever connection it is handed, so the
/// order-creation transaction can include it.
pub async fn upsert_by_phone<C: ConnectionTrait>(
    conn: &C,
    profile: &CustomerProfile,
) -> Result<(customer::Model, bool), ServiceError> {
    let now = Utc::now();

    let existing = CustomerEntity::find()
        .filter(customer::Column::PhoneNumber.eq(profile.phone_number.clone()))
        .one(conn)
        .await?;

    if let Some(found) = existing {
        let mut active: customer::ActiveModel = found.into();
        active.full_name = Set(profile.full_name.clone());
        active.date_of_birth = Set(profile.date_of_birth);
        active.gender = Set(profile.gender.clone());
        active.province = Set(profile.province.clone());
        active.district = Set(profile.district.clone());
        active.village = Set(profile.village.clone());
        active.accept_terms = Set(profile.accept_terms);
        active.updated_at = Set(Some(now));

        let updated = active.update(conn).await?;
        return Ok((updated, false));
    }

    let created = customer::ActiveModel {
        id: Set(Uuid::new_v4()),
        phone_number: Set(profile.phone_number.clone()),
        full_name: Set(profile.full_name.clone()),
        date_of_birth: Set(profile.date_of_birth),
        gender: Set(profile.gender.clone()),
        province: Set(profile.province.clone()),
        district: Set(profile.district.clone()),
        village: Set(profile.village.clone()),
        accept_terms: Set(profile.accept_terms),
        created_at: Set(now),
        updated_at: Set(Some(now)),
    }
    .insert(conn)
    .await?;

    Ok((created, true))
}
