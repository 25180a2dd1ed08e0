//! Travel journal entries tied to a place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Photo, PlaceRef, UserRef};
use crate::{
    cache::Family,
    client::{ApiClient, ApiError},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryComment {
    pub id: Uuid,
    pub author: UserRef,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: Uuid,
    pub author: UserRef,
    pub place: PlaceRef,
    pub title: String,
    pub body: String,
    pub photo: Option<Photo>,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub view_count: u64,
    /// Whether the signed-in viewer has liked this story.
    #[serde(default)]
    pub liked: bool,
    #[serde(default)]
    pub comments: Vec<StoryComment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateStory {
    pub place_id: Uuid,
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<Photo>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateStory {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<Photo>,
}

#[derive(Debug, Serialize)]
struct NewComment<'a> {
    body: &'a str,
}

/// Like toggle result as reported by the server.
#[derive(Debug, Clone, Deserialize)]
pub struct LikeState {
    pub liked: bool,
    pub like_count: u64,
}

impl Story {
    pub async fn list(api: &ApiClient) -> Result<Vec<Self>, ApiError> {
        api.get_cached(Family::Stories, "/story/stories", &[]).await
    }

    pub async fn list_by_place(api: &ApiClient, place_id: Uuid) -> Result<Vec<Self>, ApiError> {
        api.get_cached(
            Family::Stories,
            "/story/stories",
            &[("place", place_id.to_string())],
        )
        .await
    }

    pub async fn find_by_id(api: &ApiClient, id: Uuid) -> Result<Option<Self>, ApiError> {
        match api
            .get_cached(Family::Stories, &format!("/story/stories/{id}"), &[])
            .await
        {
            Ok(story) => Ok(Some(story)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn create(api: &ApiClient, data: &CreateStory) -> Result<Self, ApiError> {
        let story: Self = api.post("/story/stories", data).await?;
        api.invalidate(Family::Stories);
        Ok(story)
    }

    pub async fn update(api: &ApiClient, id: Uuid, data: &UpdateStory) -> Result<Self, ApiError> {
        let story: Self = api.put(&format!("/story/stories/{id}"), data).await?;
        api.invalidate(Family::Stories);
        Ok(story)
    }

    pub async fn delete(api: &ApiClient, id: Uuid) -> Result<(), ApiError> {
        api.delete(&format!("/story/stories/{id}")).await?;
        api.invalidate(Family::Stories);
        Ok(())
    }

    /// Flip the viewer's like on this story.
    pub async fn toggle_like(api: &ApiClient, id: Uuid) -> Result<LikeState, ApiError> {
        let state: LikeState = api
            .post(&format!("/story/stories/{id}/like"), &serde_json::json!({}))
            .await?;
        api.invalidate(Family::Stories);
        Ok(state)
    }

    pub async fn add_comment(api: &ApiClient, id: Uuid, body: &str) -> Result<Self, ApiError> {
        let story: Self = api
            .post(
                &format!("/story/stories/{id}/comments"),
                &NewComment { body },
            )
            .await?;
        api.invalidate(Family::Stories);
        Ok(story)
    }

    /// Bump the server-side view counter. Fire-and-forget semantics at the
    /// call sites; failures are the caller's to ignore.
    pub async fn mark_viewed(api: &ApiClient, id: Uuid) -> Result<(), ApiError> {
        api.post_empty(&format!("/story/stories/{id}/view"), &serde_json::json!({}))
            .await?;
        api.invalidate(Family::Stories);
        Ok(())
    }
}
