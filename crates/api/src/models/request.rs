//! Travel requests: a traveler's solicitation for a custom itinerary,
//! with zero or more proposals attached by locals.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PlaceRef, UserRef, proposal::Proposal, theme_tag::ThemeTag};
use crate::{
    cache::Family,
    client::{ApiClient, ApiError},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelRequest {
    pub id: Uuid,
    pub requester: UserRef,
    pub place: PlaceRef,
    pub title: Option<String>,
    pub starts_on: NaiveDate,
    pub ends_on: Option<NaiveDate>,
    pub people_count: u32,
    pub wants_guide: bool,
    #[serde(default)]
    pub tags: Vec<ThemeTag>,
    pub experience: String,
    pub public_profile: bool,
    /// Present when the request was manufactured by the direct-proposal
    /// flow, naming the solicited proposal.
    pub root_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub proposals: Vec<Proposal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateTravelRequest {
    pub place_id: Uuid,
    pub title: Option<String>,
    pub starts_on: NaiveDate,
    pub ends_on: Option<NaiveDate>,
    pub people_count: u32,
    pub wants_guide: bool,
    pub tag_ids: Vec<Uuid>,
    pub experience: String,
    pub public_profile: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateTravelRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_on: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_on: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub people_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wants_guide: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_ids: Option<Vec<Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_profile: Option<bool>,
}

#[derive(Debug, Serialize)]
struct AcceptProposal {
    proposal_id: Uuid,
}

impl TravelRequest {
    pub fn has_proposals(&self) -> bool {
        !self.proposals.is_empty()
    }

    /// Proposals the traveler has accepted. The server enforces at most one
    /// per request; the client still iterates defensively.
    pub fn accepted_proposals(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.iter().filter(|p| p.accepted)
    }

    /// Whether `local_id` has already responded with a proposal.
    pub fn answered_by(&self, local_id: Uuid) -> bool {
        self.proposals.iter().any(|p| p.founder.id == local_id)
    }

    pub async fn list(api: &ApiClient) -> Result<Vec<Self>, ApiError> {
        api.get_cached(Family::Requests, "/document/requests", &[])
            .await
    }

    /// Requests authored by the signed-in traveler.
    pub async fn list_mine(api: &ApiClient) -> Result<Vec<Self>, ApiError> {
        api.get_cached(
            Family::Requests,
            "/document/requests",
            &[("mine", "true".to_string())],
        )
        .await
    }

    pub async fn find_by_id(api: &ApiClient, id: Uuid) -> Result<Option<Self>, ApiError> {
        match api
            .get_cached(Family::Requests, &format!("/document/requests/{id}"), &[])
            .await
        {
            Ok(request) => Ok(Some(request)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn create(api: &ApiClient, data: &CreateTravelRequest) -> Result<Self, ApiError> {
        let request: Self = api.post("/document/requests", data).await?;
        api.invalidate(Family::Requests);
        Ok(request)
    }

    pub async fn update(
        api: &ApiClient,
        id: Uuid,
        data: &UpdateTravelRequest,
    ) -> Result<Self, ApiError> {
        let request: Self = api.put(&format!("/document/requests/{id}"), data).await?;
        api.invalidate(Family::Requests);
        Ok(request)
    }

    pub async fn delete(api: &ApiClient, id: Uuid) -> Result<(), ApiError> {
        api.delete(&format!("/document/requests/{id}")).await?;
        api.invalidate(Family::Requests);
        Ok(())
    }

    /// Tie `proposal_id` to this request as the accepted one. On success the
    /// requests cache is invalidated; the next read shows the proposal with
    /// `accepted == true`. Never retried.
    pub async fn accept_proposal(
        api: &ApiClient,
        request_id: Uuid,
        proposal_id: Uuid,
    ) -> Result<(), ApiError> {
        api.post_empty(
            &format!("/document/requests/{request_id}/accept"),
            &AcceptProposal { proposal_id },
        )
        .await?;
        api.invalidate(Family::Requests);
        Ok(())
    }
}
