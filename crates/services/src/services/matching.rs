//! Bucket derivation for the request/proposal matching workflow.
//!
//! Raw request and proposal collections come from the remote API; everything
//! here is pure derivation per viewer role. Nothing is mutated and nothing is
//! assumed beyond what the payloads carry: the server owns acceptance, so the
//! traveler buckets tolerate zero or many accepted proposals per request.

use api::models::{place::Region, proposal::Proposal, request::TravelRequest};
use uuid::Uuid;

use super::tracker::LocalTracker;

/// Action a traveler can take on a received entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceivedAction {
    OpenChat,
    Accept,
}

/// One row of the traveler's "proposals received" view: a request of theirs
/// with at least one proposal attached, summarized by the first proposal.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedEntry {
    pub request_id: Uuid,
    pub request_title: Option<String>,
    pub proposal_count: usize,
    pub proposal_id: Uuid,
    pub founder_display_name: String,
    pub proposal_title: Option<String>,
    /// Cleared once any proposal on the request is accepted; the entry then
    /// only links to chat.
    pub actionable: bool,
}

impl ReceivedEntry {
    pub fn actions(&self) -> &'static [ReceivedAction] {
        if self.actionable {
            &[ReceivedAction::OpenChat, ReceivedAction::Accept]
        } else {
            &[ReceivedAction::OpenChat]
        }
    }
}

/// One row of the traveler's "confirmed" view: an accepted proposal together
/// with the request it answers.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmedEntry {
    pub request_id: Uuid,
    pub request_title: Option<String>,
    pub proposal: Proposal,
}

/// Requests of the signed-in traveler that have proposals attached.
pub fn received(requests: &[TravelRequest]) -> Vec<ReceivedEntry> {
    requests
        .iter()
        .filter_map(|request| {
            let first = request.proposals.first()?;
            Some(ReceivedEntry {
                request_id: request.id,
                request_title: request.title.clone(),
                proposal_count: request.proposals.len(),
                proposal_id: first.id,
                founder_display_name: first.founder.display_name.clone(),
                proposal_title: first.title.clone(),
                actionable: request.accepted_proposals().next().is_none(),
            })
        })
        .collect()
}

/// Accepted proposals across the traveler's requests.
pub fn confirmed(requests: &[TravelRequest]) -> Vec<ConfirmedEntry> {
    requests
        .iter()
        .flat_map(|request| {
            request.accepted_proposals().map(|proposal| ConfirmedEntry {
                request_id: request.id,
                request_title: request.title.clone(),
                proposal: proposal.clone(),
            })
        })
        .collect()
}

/// Direct-solicitation requests still waiting for the local's response:
/// tracked on this device and without any proposal attached yet.
pub fn waiting<'a>(
    requests: &'a [TravelRequest],
    tracker: &LocalTracker,
) -> Vec<&'a TravelRequest> {
    requests
        .iter()
        .filter(|request| tracker.is_direct_request(request.id) && !request.has_proposals())
        .collect()
}

/// Requests a local has not yet responded to, narrowed to their operating
/// regions when any are configured. A request whose place region is unknown
/// is kept rather than guessed away.
pub fn recent_requests<'a>(
    requests: &'a [TravelRequest],
    local_id: Uuid,
    operating_regions: &[Region],
) -> Vec<&'a TravelRequest> {
    requests
        .iter()
        .filter(|request| !request.answered_by(local_id))
        .filter(|request| in_operating_regions(request, operating_regions))
        .collect()
}

/// Proposals authored by the signed-in local.
pub fn my_proposals(proposals: &[Proposal], local_id: Uuid) -> Vec<&Proposal> {
    proposals
        .iter()
        .filter(|proposal| proposal.founder.id == local_id)
        .collect()
}

fn in_operating_regions(request: &TravelRequest, operating_regions: &[Region]) -> bool {
    if operating_regions.is_empty() {
        return true;
    }
    match &request.place.region {
        Some(region) => operating_regions.iter().any(|r| r.covers(region)),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use api::models::{PlaceRef, UserRef, proposal::PurchaseStatus};
    use chrono::Utc;

    use super::*;

    fn user(name: &str) -> UserRef {
        UserRef {
            id: Uuid::new_v4(),
            handle: name.to_lowercase(),
            display_name: name.to_string(),
        }
    }

    fn place(name: &str, region: Option<Region>) -> PlaceRef {
        PlaceRef {
            id: Uuid::new_v4(),
            name: name.to_string(),
            region,
        }
    }

    fn proposal(founder: UserRef, title: &str, accepted: bool) -> Proposal {
        Proposal {
            id: Uuid::new_v4(),
            founder,
            place: place("Lisbon", None),
            title: Some(title.to_string()),
            photo: None,
            schedule: Default::default(),
            people_count: 2,
            wants_guide: false,
            tags: vec![],
            experience: String::new(),
            accepted,
            purchase_status: PurchaseStatus::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn request(title: &str, proposals: Vec<Proposal>) -> TravelRequest {
        TravelRequest {
            id: Uuid::new_v4(),
            requester: user("Ana"),
            place: place("Lisbon", None),
            title: Some(title.to_string()),
            starts_on: "2026-05-01".parse().unwrap(),
            ends_on: None,
            people_count: 2,
            wants_guide: true,
            tags: vec![],
            experience: "Food and fado".to_string(),
            public_profile: false,
            root_id: None,
            created_at: Utc::now(),
            proposals,
        }
    }

    fn kr_region(city: Option<&str>) -> Region {
        Region {
            country: "KR".into(),
            state: None,
            city: city.map(str::to_string),
            district: None,
        }
    }

    #[test]
    fn received_summarizes_the_first_proposal() {
        let mina = user("Mina");
        let jo = user("Jo");
        let requests = vec![
            request("no answers yet", vec![]),
            request(
                "three answers",
                vec![
                    proposal(mina.clone(), "Old town on foot", false),
                    proposal(jo.clone(), "Harbor day", false),
                    proposal(mina, "Night market", false),
                ],
            ),
        ];

        let entries = received(&requests);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].proposal_count, 3);
        assert_eq!(entries[0].founder_display_name, "Mina");
        assert_eq!(entries[0].proposal_title.as_deref(), Some("Old town on foot"));
        assert!(entries[0].actionable);
        assert_eq!(
            entries[0].actions(),
            &[ReceivedAction::OpenChat, ReceivedAction::Accept]
        );
    }

    #[test]
    fn acceptance_moves_a_proposal_from_received_to_confirmed() {
        let mina = user("Mina");
        let mut req = request("tour", vec![proposal(mina.clone(), "Old town", false)]);

        assert_eq!(confirmed(std::slice::from_ref(&req)).len(), 0);
        assert!(received(std::slice::from_ref(&req))[0].actionable);

        // The accept mutation resolved and the list was refetched.
        req.proposals[0].accepted = true;

        let conf = confirmed(std::slice::from_ref(&req));
        assert_eq!(conf.len(), 1);
        assert_eq!(conf[0].proposal.title.as_deref(), Some("Old town"));

        let entries = received(std::slice::from_ref(&req));
        assert!(!entries[0].actionable);
        assert_eq!(entries[0].actions(), &[ReceivedAction::OpenChat]);
    }

    #[test]
    fn confirmed_tolerates_many_accepted_proposals() {
        let requests = vec![request(
            "double booked",
            vec![
                proposal(user("Mina"), "A", true),
                proposal(user("Jo"), "B", true),
            ],
        )];

        assert_eq!(confirmed(&requests).len(), 2);
    }

    #[test]
    fn waiting_requires_tracking_and_zero_proposals() {
        let tracker = LocalTracker::in_memory();
        let empty_tracked = request("tracked, no answer", vec![]);
        let answered_tracked = request("tracked, answered", vec![proposal(user("Jo"), "A", false)]);
        let untracked = request("not tracked", vec![]);
        tracker.record_direct_request(empty_tracked.id).unwrap();
        tracker.record_direct_request(answered_tracked.id).unwrap();

        let requests = vec![empty_tracked.clone(), answered_tracked, untracked];
        let bucket = waiting(&requests, &tracker);

        assert_eq!(bucket.len(), 1);
        assert_eq!(bucket[0].id, empty_tracked.id);
    }

    #[test]
    fn recent_requests_skip_ones_the_local_answered() {
        let local = user("Mina");
        let answered = request("answered", vec![proposal(local.clone(), "A", false)]);
        let open = request("open", vec![proposal(user("Jo"), "B", false)]);
        let fresh = request("fresh", vec![]);

        let requests = vec![answered, open.clone(), fresh.clone()];
        let bucket = recent_requests(&requests, local.id, &[]);

        assert_eq!(bucket.len(), 2);
        assert!(bucket.iter().any(|r| r.id == open.id));
        assert!(bucket.iter().any(|r| r.id == fresh.id));
    }

    #[test]
    fn operating_regions_narrow_recent_requests() {
        let local = user("Mina");
        let mut seoul = request("seoul", vec![]);
        seoul.place = place("Seoul", Some(kr_region(Some("Seoul"))));
        let mut busan = request("busan", vec![]);
        busan.place = place("Busan", Some(kr_region(Some("Busan"))));
        let unknown = request("unknown region", vec![]);

        let requests = vec![seoul.clone(), busan, unknown.clone()];
        let bucket = recent_requests(&requests, local.id, &[kr_region(Some("Seoul"))]);

        assert_eq!(bucket.len(), 2);
        assert!(bucket.iter().any(|r| r.id == seoul.id));
        assert!(bucket.iter().any(|r| r.id == unknown.id));
    }

    #[test]
    fn my_proposals_filters_by_founder() {
        let mina = user("Mina");
        let proposals = vec![
            proposal(mina.clone(), "A", false),
            proposal(user("Jo"), "B", false),
            proposal(mina.clone(), "C", true),
        ];

        let mine = my_proposals(&proposals, mina.id);
        assert_eq!(mine.len(), 2);
    }
}
