//! Places and their hierarchical regions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Photo;
use crate::{
    cache::Family,
    client::{ApiClient, ApiError},
};

/// Hierarchical location. Narrower levels are optional; a region with only
/// a country set covers every place in that country.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub country: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
}

impl Region {
    /// Whether `place_region` falls inside this region. Every level set
    /// here must match; levels left unset match anything beneath them.
    pub fn covers(&self, place_region: &Region) -> bool {
        if self.country != place_region.country {
            return false;
        }
        let narrower = [
            (&self.state, &place_region.state),
            (&self.city, &place_region.city),
            (&self.district, &place_region.district),
        ];
        narrower
            .iter()
            .all(|(ours, theirs)| ours.is_none() || *ours == *theirs)
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.country)?;
        for level in [&self.state, &self.city, &self.district]
            .into_iter()
            .flatten()
        {
            write!(f, " / {level}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelPlace {
    pub id: Uuid,
    pub name: String,
    pub region: Region,
    pub photo: Option<Photo>,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub view_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePlace {
    pub name: String,
    pub region: Region,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<Photo>,
}

impl TravelPlace {
    pub async fn list(api: &ApiClient) -> Result<Vec<Self>, ApiError> {
        api.get_cached(Family::Places, "/place/places", &[]).await
    }

    /// Name search against the server's place index.
    pub async fn search(api: &ApiClient, query: &str) -> Result<Vec<Self>, ApiError> {
        api.get_cached(
            Family::Places,
            "/place/places",
            &[("q", query.to_string())],
        )
        .await
    }

    /// Region-scoped search used by wishlist and creation flows.
    pub async fn search_region(api: &ApiClient, region: &Region) -> Result<Vec<Self>, ApiError> {
        let mut query: Vec<(&str, String)> = vec![("country", region.country.clone())];
        if let Some(state) = &region.state {
            query.push(("state", state.clone()));
        }
        if let Some(city) = &region.city {
            query.push(("city", city.clone()));
        }
        if let Some(district) = &region.district {
            query.push(("district", district.clone()));
        }
        api.get_cached(Family::Places, "/place/regions/search", &query)
            .await
    }

    pub async fn find_by_id(api: &ApiClient, id: Uuid) -> Result<Option<Self>, ApiError> {
        match api
            .get_cached(Family::Places, &format!("/place/places/{id}"), &[])
            .await
        {
            Ok(place) => Ok(Some(place)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn create(api: &ApiClient, data: &CreatePlace) -> Result<Self, ApiError> {
        let place: Self = api.post("/place/places", data).await?;
        api.invalidate(Family::Places);
        Ok(place)
    }
}
