//! Creation form contracts for requests, proposals and stories.
//!
//! Each form validates locally before any network traffic, uploads a staged
//! photo strictly before submitting the entity (an upload failure aborts the
//! whole flow), and maps server rejections to a user-facing message through
//! the fixed field-priority order of the error body.

use api::{
    ApiClient, ApiError,
    models::{
        image::UploadedImage,
        place::{CreatePlace, Region, TravelPlace},
        proposal::{CreateProposal, Proposal, Schedule},
        request::{CreateTravelRequest, TravelRequest},
        story::{CreateStory, Story},
        theme_tag::TagSelection,
        Photo,
    },
};
use chrono::NaiveDate;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use super::tracker::LocalTracker;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("title is required")]
    MissingTitle,
    #[error("a place must be selected")]
    MissingPlace,
    #[error("party size must be at least 1")]
    PartySize,
    #[error("describe the experience")]
    MissingExperience,
    #[error("story body is required")]
    MissingBody,
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl FormError {
    /// Message suitable for showing to the user: validation messages as-is,
    /// server rejections through the field-priority extraction.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// Photo picked on this device, not yet uploaded.
#[derive(Debug, Clone)]
pub struct StagedPhoto {
    pub filename: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl StagedPhoto {
    async fn upload(&self, api: &ApiClient) -> Result<Photo, ApiError> {
        let image =
            UploadedImage::upload(api, &self.filename, &self.mime, self.bytes.clone()).await?;
        Ok(image.into())
    }
}

/// Place reference as resolved by the form: either picked from a server
/// search, or created inline with an optional photo.
#[derive(Debug, Clone)]
pub enum PlaceChoice {
    Existing(Uuid),
    New {
        name: String,
        region: Region,
        photo: Option<StagedPhoto>,
    },
}

impl PlaceChoice {
    /// Resolve to a place id, creating the place first when needed. The
    /// photo upload happens before the create call and aborts it on failure.
    async fn resolve(&self, api: &ApiClient) -> Result<Uuid, FormError> {
        match self {
            Self::Existing(id) => Ok(*id),
            Self::New {
                name,
                region,
                photo,
            } => {
                let uploaded = match photo {
                    Some(staged) => Some(staged.upload(api).await?),
                    None => None,
                };
                let place = TravelPlace::create(
                    api,
                    &CreatePlace {
                        name: name.clone(),
                        region: region.clone(),
                        photo: uploaded,
                    },
                )
                .await?;
                Ok(place.id)
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct RequestForm {
    pub title: String,
    pub place: Option<PlaceChoice>,
    pub starts_on: NaiveDate,
    pub ends_on: Option<NaiveDate>,
    pub people_count: u32,
    pub wants_guide: bool,
    pub tags: TagSelection,
    pub experience: String,
    pub public_profile: bool,
    /// Set by the direct-proposal flow: the proposal this request solicits
    /// a custom variant of.
    pub root_id: Option<Uuid>,
}

impl RequestForm {
    pub fn validate(&self) -> Result<(), FormError> {
        if self.title.trim().is_empty() {
            return Err(FormError::MissingTitle);
        }
        if self.place.is_none() {
            return Err(FormError::MissingPlace);
        }
        if self.people_count < 1 {
            return Err(FormError::PartySize);
        }
        if self.experience.trim().is_empty() {
            return Err(FormError::MissingExperience);
        }
        Ok(())
    }

    /// Validate, resolve the place, create the request. A request created
    /// through the direct-proposal flow is recorded in the local tracker so
    /// the waiting bucket can find it.
    pub async fn submit(
        &self,
        api: &ApiClient,
        tracker: &LocalTracker,
    ) -> Result<TravelRequest, FormError> {
        self.validate()?;
        let choice = self.place.as_ref().ok_or(FormError::MissingPlace)?;
        let place_id = choice.resolve(api).await?;

        let data = CreateTravelRequest {
            place_id,
            title: Some(self.title.trim().to_string()),
            starts_on: self.starts_on,
            ends_on: self.ends_on,
            people_count: self.people_count,
            wants_guide: self.wants_guide,
            tag_ids: self.tags.ids().to_vec(),
            experience: self.experience.trim().to_string(),
            public_profile: self.public_profile,
            root_id: self.root_id,
        };
        let request = TravelRequest::create(api, &data).await?;

        if request.root_id.is_some() {
            if let Err(e) = tracker.record_direct_request(request.id) {
                warn!(request_id = %request.id, "failed to track direct request: {e}");
            }
        }
        Ok(request)
    }
}

#[derive(Debug, Default)]
pub struct ProposalForm {
    pub title: String,
    pub place: Option<PlaceChoice>,
    pub photo: Option<StagedPhoto>,
    pub schedule: Schedule,
    pub people_count: u32,
    pub wants_guide: bool,
    pub tags: TagSelection,
    pub experience: String,
}

impl ProposalForm {
    pub fn validate(&self) -> Result<(), FormError> {
        if self.title.trim().is_empty() {
            return Err(FormError::MissingTitle);
        }
        if self.place.is_none() {
            return Err(FormError::MissingPlace);
        }
        if self.people_count < 1 {
            return Err(FormError::PartySize);
        }
        if self.experience.trim().is_empty() {
            return Err(FormError::MissingExperience);
        }
        Ok(())
    }

    /// Validate, upload the staged photo, resolve the place, create the
    /// proposal. The photo upload comes first; its failure means no entity
    /// is submitted at all.
    pub async fn submit(&self, api: &ApiClient) -> Result<Proposal, FormError> {
        self.validate()?;
        let photo = match &self.photo {
            Some(staged) => Some(staged.upload(api).await?),
            None => None,
        };
        let choice = self.place.as_ref().ok_or(FormError::MissingPlace)?;
        let place_id = choice.resolve(api).await?;

        let data = CreateProposal {
            place_id,
            title: Some(self.title.trim().to_string()),
            photo,
            schedule: self.schedule.clone(),
            people_count: self.people_count,
            wants_guide: self.wants_guide,
            tag_ids: self.tags.ids().to_vec(),
            experience: self.experience.trim().to_string(),
        };
        Ok(Proposal::create(api, &data).await?)
    }
}

#[derive(Debug, Default)]
pub struct StoryForm {
    pub place: Option<PlaceChoice>,
    pub title: String,
    pub body: String,
    pub photo: Option<StagedPhoto>,
}

impl StoryForm {
    pub fn validate(&self) -> Result<(), FormError> {
        if self.title.trim().is_empty() {
            return Err(FormError::MissingTitle);
        }
        if self.place.is_none() {
            return Err(FormError::MissingPlace);
        }
        if self.body.trim().is_empty() {
            return Err(FormError::MissingBody);
        }
        Ok(())
    }

    pub async fn submit(&self, api: &ApiClient) -> Result<Story, FormError> {
        self.validate()?;
        let photo = match &self.photo {
            Some(staged) => Some(staged.upload(api).await?),
            None => None,
        };
        let choice = self.place.as_ref().ok_or(FormError::MissingPlace)?;
        let place_id = choice.resolve(api).await?;

        let data = CreateStory {
            place_id,
            title: self.title.trim().to_string(),
            body: self.body.trim().to_string(),
            photo,
        };
        Ok(Story::create(api, &data).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request_form() -> RequestForm {
        RequestForm {
            title: "Spring food tour".into(),
            place: Some(PlaceChoice::Existing(Uuid::new_v4())),
            starts_on: "2026-04-10".parse().unwrap(),
            ends_on: None,
            people_count: 2,
            wants_guide: true,
            tags: TagSelection::new(),
            experience: "Street food and markets".into(),
            public_profile: false,
            root_id: None,
        }
    }

    #[test]
    fn valid_form_passes() {
        assert!(valid_request_form().validate().is_ok());
    }

    #[test]
    fn blank_title_is_rejected() {
        let mut form = valid_request_form();
        form.title = "   ".into();
        assert!(matches!(form.validate(), Err(FormError::MissingTitle)));
    }

    #[test]
    fn missing_place_is_rejected() {
        let mut form = valid_request_form();
        form.place = None;
        assert!(matches!(form.validate(), Err(FormError::MissingPlace)));
    }

    #[test]
    fn zero_people_is_rejected() {
        let mut form = valid_request_form();
        form.people_count = 0;
        assert!(matches!(form.validate(), Err(FormError::PartySize)));
    }

    #[test]
    fn blank_experience_is_rejected() {
        let mut form = valid_request_form();
        form.experience = String::new();
        assert!(matches!(form.validate(), Err(FormError::MissingExperience)));
    }

    #[test]
    fn proposal_form_requires_the_same_fields() {
        let form = ProposalForm {
            title: "Old town on foot".into(),
            place: Some(PlaceChoice::Existing(Uuid::new_v4())),
            photo: None,
            schedule: Schedule::new(),
            people_count: 0,
            wants_guide: false,
            tags: TagSelection::new(),
            experience: "Tiles and pastries".into(),
        };
        assert!(matches!(form.validate(), Err(FormError::PartySize)));
    }

    #[test]
    fn server_rejection_surfaces_the_field_message() {
        let api_error = ApiError::Http {
            status: 400,
            body: api::response::ErrorBody::from_raw(
                r#"{"experience": ["tell us a little more"], "detail": "bad request"}"#,
            ),
        };
        let form_error = FormError::from(api_error);
        assert_eq!(form_error.user_message(), "tell us a little more");
    }

    #[test]
    fn transport_failures_read_as_try_again() {
        let form_error = FormError::from(ApiError::Timeout);
        assert_eq!(
            form_error.user_message(),
            api::response::GENERIC_FAILURE
        );
    }
}
