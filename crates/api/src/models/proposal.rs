//! Proposals ("roots"): itineraries authored by locals, either browsable
//! or attached to a traveler's request.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

use super::{Photo, PlaceRef, UserRef, theme_tag::ThemeTag};
use crate::{
    cache::Family,
    client::{ApiClient, ApiError},
};

/// Per-day itinerary, keyed by day number starting at 1. Gaps are tolerated
/// on read; the client never renumbers what the server sends.
pub type Schedule = BTreeMap<u32, Vec<ScheduleItem>>;

/// One time-blocked activity inside a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleItem {
    pub starts_at: NaiveTime,
    pub ends_at: NaiveTime,
    pub place_name: String,
    pub description: String,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PurchaseStatus {
    #[default]
    NotPurchased,
    Purchased,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: Uuid,
    pub founder: UserRef,
    pub place: PlaceRef,
    pub title: Option<String>,
    pub photo: Option<Photo>,
    #[serde(default)]
    pub schedule: Schedule,
    pub people_count: u32,
    pub wants_guide: bool,
    #[serde(default)]
    pub tags: Vec<ThemeTag>,
    pub experience: String,
    #[serde(default)]
    pub accepted: bool,
    #[serde(default)]
    pub purchase_status: PurchaseStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateProposal {
    pub place_id: Uuid,
    pub title: Option<String>,
    pub photo: Option<Photo>,
    pub schedule: Schedule,
    pub people_count: u32,
    pub wants_guide: bool,
    pub tag_ids: Vec<Uuid>,
    pub experience: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateProposal {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<Photo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub people_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wants_guide: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_ids: Option<Vec<Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
}

impl Proposal {
    /// Items for one day, in schedule order. Unknown days are empty.
    pub fn day(&self, day: u32) -> &[ScheduleItem] {
        self.schedule.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Day numbers present in the schedule, ascending.
    pub fn days(&self) -> impl Iterator<Item = u32> + '_ {
        self.schedule.keys().copied()
    }

    /// Bounding times of a day: first item's start and last item's end.
    /// `None` when the day has no items.
    pub fn day_bounds(&self, day: u32) -> Option<(NaiveTime, NaiveTime)> {
        let items = self.day(day);
        let first = items.first()?;
        let last = items.last()?;
        Some((first.starts_at, last.ends_at))
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.place.name)
    }

    pub async fn list(api: &ApiClient) -> Result<Vec<Self>, ApiError> {
        api.get_cached(Family::Proposals, "/document/roots", &[])
            .await
    }

    pub async fn list_by_founder(api: &ApiClient, founder_id: Uuid) -> Result<Vec<Self>, ApiError> {
        api.get_cached(
            Family::Proposals,
            "/document/roots",
            &[("founder", founder_id.to_string())],
        )
        .await
    }

    pub async fn find_by_id(api: &ApiClient, id: Uuid) -> Result<Option<Self>, ApiError> {
        match api
            .get_cached(Family::Proposals, &format!("/document/roots/{id}"), &[])
            .await
        {
            Ok(proposal) => Ok(Some(proposal)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn create(api: &ApiClient, data: &CreateProposal) -> Result<Self, ApiError> {
        let proposal: Self = api.post("/document/roots", data).await?;
        api.invalidate(Family::Proposals);
        Ok(proposal)
    }

    pub async fn update(api: &ApiClient, id: Uuid, data: &UpdateProposal) -> Result<Self, ApiError> {
        let proposal: Self = api.put(&format!("/document/roots/{id}"), data).await?;
        api.invalidate(Family::Proposals);
        Ok(proposal)
    }

    pub async fn delete(api: &ApiClient, id: Uuid) -> Result<(), ApiError> {
        api.delete(&format!("/document/roots/{id}")).await?;
        api.invalidate(Family::Proposals);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn item(start: &str, end: &str, place: &str) -> ScheduleItem {
        ScheduleItem {
            starts_at: start.parse().unwrap(),
            ends_at: end.parse().unwrap(),
            place_name: place.to_string(),
            description: String::new(),
        }
    }

    fn proposal_with_schedule(schedule: Schedule) -> Proposal {
        Proposal {
            id: Uuid::new_v4(),
            founder: UserRef {
                id: Uuid::new_v4(),
                handle: "mina".into(),
                display_name: "Mina".into(),
            },
            place: PlaceRef {
                id: Uuid::new_v4(),
                name: "Lisbon".into(),
                region: None,
            },
            title: Some("Old town on foot".into()),
            photo: None,
            schedule,
            people_count: 2,
            wants_guide: false,
            tags: vec![],
            experience: "Tiles and pastries".into(),
            accepted: false,
            purchase_status: PurchaseStatus::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn day_selection_returns_only_that_day() {
        let mut schedule = Schedule::new();
        schedule.insert(
            1,
            vec![
                item("09:00:00", "10:30:00", "Alfama"),
                item("11:00:00", "12:00:00", "Sé"),
                item("14:00:00", "16:00:00", "Belém"),
            ],
        );
        schedule.insert(2, vec![item("10:00:00", "13:00:00", "Sintra")]);
        let proposal = proposal_with_schedule(schedule);

        assert_eq!(proposal.day(2).len(), 1);
        assert_eq!(proposal.day(2)[0].place_name, "Sintra");
        assert_eq!(
            proposal.day_bounds(2),
            Some(("10:00:00".parse().unwrap(), "13:00:00".parse().unwrap()))
        );
    }

    #[test]
    fn day_bounds_span_first_start_to_last_end() {
        let mut schedule = Schedule::new();
        schedule.insert(
            1,
            vec![
                item("09:00:00", "10:30:00", "Alfama"),
                item("11:00:00", "12:00:00", "Sé"),
                item("14:00:00", "16:00:00", "Belém"),
            ],
        );
        let proposal = proposal_with_schedule(schedule);

        assert_eq!(
            proposal.day_bounds(1),
            Some(("09:00:00".parse().unwrap(), "16:00:00".parse().unwrap()))
        );
        assert_eq!(proposal.day_bounds(3), None);
    }

    #[test]
    fn schedule_deserializes_from_string_keyed_days() {
        let value = json!({
            "1": [{
                "starts_at": "09:00:00",
                "ends_at": "11:00:00",
                "place_name": "Market",
                "description": "Breakfast stalls"
            }],
            "3": []
        });
        let schedule: Schedule = serde_json::from_value(value).unwrap();

        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule[&1][0].place_name, "Market");
        assert!(schedule[&3].is_empty());
    }

    #[test]
    fn acceptance_and_purchase_default_when_absent() {
        let value = json!({
            "id": Uuid::new_v4(),
            "founder": {"id": Uuid::new_v4(), "handle": "jo", "display_name": "Jo"},
            "place": {"id": Uuid::new_v4(), "name": "Porto"},
            "title": null,
            "photo": null,
            "people_count": 4,
            "wants_guide": true,
            "experience": "River walks",
            "created_at": "2026-03-01T10:00:00Z",
            "updated_at": "2026-03-01T10:00:00Z"
        });
        let proposal: Proposal = serde_json::from_value(value).unwrap();

        assert!(!proposal.accepted);
        assert_eq!(proposal.purchase_status, PurchaseStatus::NotPurchased);
        assert!(proposal.schedule.is_empty());
        assert_eq!(proposal.display_title(), "Porto");
    }
}
