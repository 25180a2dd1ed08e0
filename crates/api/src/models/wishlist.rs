//! User-owned named collections of places.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{UserRef, place::TravelPlace};
use crate::{
    cache::Family,
    client::{ApiClient, ApiError},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wishlist {
    pub id: Uuid,
    pub owner: UserRef,
    pub name: String,
    #[serde(default)]
    pub places: Vec<TravelPlace>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateWishlist {
    pub name: String,
}

#[derive(Debug, Serialize)]
struct WishlistPlace {
    place_id: Uuid,
}

impl Wishlist {
    pub fn contains_place(&self, place_id: Uuid) -> bool {
        self.places.iter().any(|p| p.id == place_id)
    }

    /// Wishlists owned by the signed-in user.
    pub async fn list(api: &ApiClient) -> Result<Vec<Self>, ApiError> {
        api.get_cached(Family::Wishlists, "/place/wishlists", &[])
            .await
    }

    pub async fn find_by_id(api: &ApiClient, id: Uuid) -> Result<Option<Self>, ApiError> {
        match api
            .get_cached(Family::Wishlists, &format!("/place/wishlists/{id}"), &[])
            .await
        {
            Ok(wishlist) => Ok(Some(wishlist)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn create(api: &ApiClient, data: &CreateWishlist) -> Result<Self, ApiError> {
        let wishlist: Self = api.post("/place/wishlists", data).await?;
        api.invalidate(Family::Wishlists);
        Ok(wishlist)
    }

    pub async fn rename(api: &ApiClient, id: Uuid, name: &str) -> Result<Self, ApiError> {
        let wishlist: Self = api
            .put(
                &format!("/place/wishlists/{id}"),
                &CreateWishlist {
                    name: name.to_string(),
                },
            )
            .await?;
        api.invalidate(Family::Wishlists);
        Ok(wishlist)
    }

    pub async fn delete(api: &ApiClient, id: Uuid) -> Result<(), ApiError> {
        api.delete(&format!("/place/wishlists/{id}")).await?;
        api.invalidate(Family::Wishlists);
        Ok(())
    }

    pub async fn add_place(
        api: &ApiClient,
        wishlist_id: Uuid,
        place_id: Uuid,
    ) -> Result<Self, ApiError> {
        let wishlist: Self = api
            .post(
                &format!("/place/wishlists/{wishlist_id}/places"),
                &WishlistPlace { place_id },
            )
            .await?;
        api.invalidate(Family::Wishlists);
        Ok(wishlist)
    }

    pub async fn remove_place(
        api: &ApiClient,
        wishlist_id: Uuid,
        place_id: Uuid,
    ) -> Result<(), ApiError> {
        api.delete(&format!("/place/wishlists/{wishlist_id}/places/{place_id}"))
            .await?;
        api.invalidate(Family::Wishlists);
        Ok(())
    }
}
