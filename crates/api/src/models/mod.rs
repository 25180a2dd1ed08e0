pub mod image;
pub mod place;
pub mod proposal;
pub mod request;
pub mod story;
pub mod theme_tag;
pub mod user;
pub mod wishlist;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimal user identity embedded in owned entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: Uuid,
    pub handle: String,
    pub display_name: String,
}

/// Minimal place identity embedded in requests, proposals and stories.
/// Carries the region when the server includes it; absent regions are
/// tolerated and treated as unknown by consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceRef {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub region: Option<place::Region>,
}

/// Stored photo reference as returned by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub url: String,
    pub filename: String,
}
