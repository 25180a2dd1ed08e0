use std::time::Duration;

use anyhow::{Result, anyhow};
use api::{
    ApiClient,
    models::{
        proposal::Proposal,
        request::TravelRequest,
        story::Story,
        user::{Credentials, UserProfile},
        wishlist::Wishlist,
    },
};
use chrono::NaiveDate;
use dialoguer::Password;
use indicatif::{ProgressBar, ProgressStyle};
use services::services::{
    config::Config,
    forms::{PlaceChoice, RequestForm},
    matching,
    tracker::LocalTracker,
    watch::ReceivedWatch,
};
use uuid::Uuid;

/// Spinner shown while a call is in flight.
fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub async fn login(api: &ApiClient, handle: &str) -> Result<()> {
    let password = Password::new().with_prompt("Password").interact()?;
    let pb = spinner("signing in");
    let result = UserProfile::login(
        api,
        &Credentials {
            handle,
            password: &password,
        },
    )
    .await;
    pb.finish_and_clear();

    let user = result.map_err(|e| anyhow!(e.user_message()))?;
    println!("signed in as {} ({})", user.display_name, user.handle);
    Ok(())
}

pub async fn me(api: &ApiClient) -> Result<()> {
    let pb = spinner("loading profile");
    let result = UserProfile::me(api).await;
    pb.finish_and_clear();

    let user = result.map_err(|e| anyhow!(e.user_message()))?;
    println!("{} ({})", user.display_name, user.handle);
    if let Some(email) = &user.email {
        println!("email: {email}");
    }
    for region in &user.regions {
        println!("operating region: {region}");
    }
    Ok(())
}

pub fn logout(api: &ApiClient) -> Result<()> {
    UserProfile::logout(api).map_err(|e| anyhow!(e.user_message()))?;
    println!("signed out");
    Ok(())
}

pub async fn traveler_inbox(api: &ApiClient, tracker: &LocalTracker) -> Result<()> {
    let pb = spinner("loading your requests");
    let result = TravelRequest::list_mine(api).await;
    pb.finish_and_clear();
    let requests = result.map_err(|e| anyhow!(e.user_message()))?;

    let received = matching::received(&requests);
    println!("received ({}):", received.len());
    for entry in &received {
        println!(
            "  {}  {} proposal(s), first from {}: {}",
            entry.request_id,
            entry.proposal_count,
            entry.founder_display_name,
            entry.proposal_title.as_deref().unwrap_or("(untitled)"),
        );
    }

    let confirmed = matching::confirmed(&requests);
    println!("confirmed ({}):", confirmed.len());
    for entry in &confirmed {
        println!(
            "  {}  {} by {}",
            entry.request_id,
            entry.proposal.display_title(),
            entry.proposal.founder.display_name,
        );
    }

    let waiting = matching::waiting(&requests, tracker);
    println!("waiting ({}):", waiting.len());
    for request in &waiting {
        println!(
            "  {}  {}",
            request.id,
            request.title.as_deref().unwrap_or("(untitled)"),
        );
    }
    Ok(())
}

pub async fn local_inbox(api: &ApiClient, config: &Config) -> Result<()> {
    let pb = spinner("loading requests");
    let me = UserProfile::me(api).await.map_err(|e| anyhow!(e.user_message()))?;
    let requests = TravelRequest::list(api).await;
    pb.finish_and_clear();
    let requests = requests.map_err(|e| anyhow!(e.user_message()))?;

    // Configured regions win over profile regions; both empty shows all.
    let regions = if config.regions.is_empty() {
        me.regions.clone()
    } else {
        config.regions.clone()
    };

    let recent = matching::recent_requests(&requests, me.id, &regions);
    println!("recent requests ({}):", recent.len());
    for request in &recent {
        println!(
            "  {}  {} — {} ({} people, from {})",
            request.id,
            request.title.as_deref().unwrap_or("(untitled)"),
            request.place.name,
            request.people_count,
            request.starts_on,
        );
    }

    let pb = spinner("loading your proposals");
    let result = Proposal::list_by_founder(api, me.id).await;
    pb.finish_and_clear();
    let proposals = result.map_err(|e| anyhow!(e.user_message()))?;
    let mine = matching::my_proposals(&proposals, me.id);
    println!("my proposals ({}):", mine.len());
    for proposal in &mine {
        println!("  {}  {}", proposal.id, proposal.display_title());
    }
    Ok(())
}

pub async fn requests(api: &ApiClient) -> Result<()> {
    let pb = spinner("loading requests");
    let result = TravelRequest::list(api).await;
    pb.finish_and_clear();

    let requests = result.map_err(|e| anyhow!(e.user_message()))?;
    for request in &requests {
        println!(
            "{}  {} — {} ({} proposal(s))",
            request.id,
            request.title.as_deref().unwrap_or("(untitled)"),
            request.place.name,
            request.proposals.len(),
        );
    }
    Ok(())
}

pub async fn request_detail(api: &ApiClient, id: Uuid) -> Result<()> {
    let pb = spinner("loading request");
    let result = TravelRequest::find_by_id(api, id).await;
    pb.finish_and_clear();

    let Some(request) = result.map_err(|e| anyhow!(e.user_message()))? else {
        return Err(anyhow!("request {id} not found"));
    };
    println!(
        "{} — {} ({} people, {} to {})",
        request.title.as_deref().unwrap_or("(untitled)"),
        request.place.name,
        request.people_count,
        request.starts_on,
        request
            .ends_on
            .map(|d| d.to_string())
            .unwrap_or_else(|| "open end".to_string()),
    );
    println!("{}", request.experience);
    for proposal in &request.proposals {
        let marker = if proposal.accepted { " [accepted]" } else { "" };
        println!(
            "  proposal {}  {} by {}{marker}",
            proposal.id,
            proposal.display_title(),
            proposal.founder.display_name,
        );
        for day in proposal.days() {
            if let Some((from, to)) = proposal.day_bounds(day) {
                println!("    day {day}: {} stop(s), {from}–{to}", proposal.day(day).len());
            }
        }
    }
    Ok(())
}

pub struct NewRequestArgs {
    pub title: String,
    pub place_id: Uuid,
    pub starts_on: NaiveDate,
    pub ends_on: Option<NaiveDate>,
    pub people: u32,
    pub experience: String,
    pub guide: bool,
    pub public: bool,
    pub root_id: Option<Uuid>,
}

pub async fn new_request(
    api: &ApiClient,
    tracker: &LocalTracker,
    args: NewRequestArgs,
) -> Result<()> {
    let form = RequestForm {
        title: args.title,
        place: Some(PlaceChoice::Existing(args.place_id)),
        starts_on: args.starts_on,
        ends_on: args.ends_on,
        people_count: args.people,
        wants_guide: args.guide,
        tags: Default::default(),
        experience: args.experience,
        public_profile: args.public,
        root_id: args.root_id,
    };

    let pb = spinner("creating request");
    let result = form.submit(api, tracker).await;
    pb.finish_and_clear();

    let request = result.map_err(|e| anyhow!(e.user_message()))?;
    println!("created request {}", request.id);
    if request.root_id.is_some() {
        println!("tracked as a direct request; it shows under the waiting bucket");
    }
    Ok(())
}

pub async fn proposals(api: &ApiClient, mine: bool) -> Result<()> {
    let pb = spinner("loading proposals");
    let result = if mine {
        let me = UserProfile::me(api).await.map_err(|e| anyhow!(e.user_message()))?;
        Proposal::list_by_founder(api, me.id).await
    } else {
        Proposal::list(api).await
    };
    pb.finish_and_clear();

    let proposals = result.map_err(|e| anyhow!(e.user_message()))?;
    for proposal in &proposals {
        println!(
            "{}  {} by {} — {} day(s)",
            proposal.id,
            proposal.display_title(),
            proposal.founder.display_name,
            proposal.days().count(),
        );
    }
    Ok(())
}

pub async fn accept(api: &ApiClient, request_id: Uuid, proposal_id: Uuid) -> Result<()> {
    let pb = spinner("accepting proposal");
    let result = TravelRequest::accept_proposal(api, request_id, proposal_id).await;
    pb.finish_and_clear();

    result.map_err(|e| anyhow!(e.user_message()))?;
    println!("proposal accepted; it now shows under the confirmed bucket");
    Ok(())
}

pub async fn watch(api: &ApiClient, config: &Config) -> Result<()> {
    let watcher = ReceivedWatch::spawn(api.clone(), config.poll_interval());
    let mut rx = watcher.subscribe();
    println!("watching received proposals (ctrl-c to stop)");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = rx.borrow_and_update().clone();
                let entries = matching::received(&snapshot);
                println!("{} request(s) with proposals", entries.len());
                for entry in &entries {
                    println!(
                        "  {}  {} proposal(s), first from {}",
                        entry.request_id,
                        entry.proposal_count,
                        entry.founder_display_name,
                    );
                }
            }
        }
    }
    watcher.shutdown().await;
    Ok(())
}

pub async fn wishlists(api: &ApiClient) -> Result<()> {
    let pb = spinner("loading wishlists");
    let result = Wishlist::list(api).await;
    pb.finish_and_clear();

    let wishlists = result.map_err(|e| anyhow!(e.user_message()))?;
    for wishlist in &wishlists {
        println!("{}  {} ({} place(s))", wishlist.id, wishlist.name, wishlist.places.len());
    }
    Ok(())
}

pub async fn stories(api: &ApiClient) -> Result<()> {
    let pb = spinner("loading stories");
    let result = Story::list(api).await;
    pb.finish_and_clear();

    let stories = result.map_err(|e| anyhow!(e.user_message()))?;
    for story in &stories {
        println!(
            "{}  {} — {} ({} likes, {} views)",
            story.id, story.title, story.place.name, story.like_count, story.view_count,
        );
    }
    Ok(())
}
