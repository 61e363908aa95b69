//! Integration tests for proposals, itineraries, tours and onboarding data.
//!
//! - Versioned updates and lifecycle guards
//! - Itinerary replace renumbers days and keeps the ownership tree
//! - Cloning a proposal from a tour deep-copies the itinerary
//! - Destination prefix search and the onboarding latch flag

use sqlx::PgPool;
use kitasuro_core::itinerary::{Activity, Day, DestinationRef, Meals, Moment};
use kitasuro_core::pricing::{Extra, PricingRow};
use kitasuro_core::proposal::ProposalStatus;
use kitasuro_core::theme::ThemeId;
use kitasuro_core::tour_form::ValidatedTour;
use kitasuro_db::models::destination::CreateDestination;
use kitasuro_db::models::organization::{CreateOrganization, Organization, UpdateOrganization};
use kitasuro_db::models::proposal::{CreateProposal, Proposal, UpdateProposal};
use kitasuro_db::models::user::{CreateUser, User};
use kitasuro_db::repositories::{
    DestinationRepo, ItineraryRepo, OrganizationRepo, ProposalRepo, TourRepo, UserRepo,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed(pool: &PgPool) -> (Organization, User) {
    let org = OrganizationRepo::create(pool, &CreateOrganization::default())
        .await
        .unwrap();
    let user = UserRepo::create(
        pool,
        &CreateUser {
            organization_id: org.id,
            email: "Owner@Agency.test".into(),
            display_name: "Owner".into(),
            role: Some("admin".into()),
        },
    )
    .await
    .unwrap();
    (org, user)
}

async fn draft(pool: &PgPool, org: &Organization, user: &User) -> Proposal {
    ProposalRepo::create(
        pool,
        org.id,
        user.id,
        &CreateProposal {
            title: "Northern Circuit".into(),
            client_name: None,
            theme: Some(ThemeId::Journal),
        },
    )
    .await
    .unwrap()
}

fn day(n: i32, title: &str) -> Day {
    Day {
        day_number: n,
        title: title.into(),
        description: None,
        destination: None,
        accommodations: vec![],
        activities: vec![],
        meals: Meals::default(),
    }
}

// ---------------------------------------------------------------------------
// Proposals
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_defaults(pool: PgPool) {
    let (org, user) = seed(&pool).await;
    let proposal = draft(&pool, &org, &user).await;

    assert_eq!(proposal.status().unwrap(), ProposalStatus::Draft);
    assert_eq!(proposal.theme().unwrap(), ThemeId::Journal);
    assert_eq!(proposal.version, 1);
    assert!(proposal.shared_at.is_none());

    let found = ProposalRepo::find_by_share_token(&pool, proposal.share_token)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, proposal.id);
    assert_eq!(user.email, "owner@agency.test");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_stale_version_matches_nothing(pool: PgPool) {
    let (org, user) = seed(&pool).await;
    let proposal = draft(&pool, &org, &user).await;

    let update = |expected_version| UpdateProposal {
        expected_version,
        title: Some("Southern Circuit".into()),
        client_name: None,
        theme: None,
    };

    let updated = ProposalRepo::update(&pool, proposal.id, &update(1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.version, 2);
    assert_eq!(updated.title, "Southern Circuit");

    let stale = ProposalRepo::update(&pool, proposal.id, &update(1)).await.unwrap();
    assert!(stale.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_lifecycle_guards(pool: PgPool) {
    let (org, user) = seed(&pool).await;
    let proposal = draft(&pool, &org, &user).await;

    assert!(ProposalRepo::confirm(&pool, proposal.id, "Ada").await.unwrap().is_none());

    let shared = ProposalRepo::mark_shared(&pool, proposal.id, proposal.version)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(shared.status().unwrap(), ProposalStatus::Shared);
    assert!(shared.shared_at.is_some());

    let confirmed = ProposalRepo::confirm(&pool, proposal.id, " Ada Lovelace ")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(confirmed.status().unwrap(), ProposalStatus::Confirmed);
    assert_eq!(confirmed.confirmed_by_name.as_deref(), Some("Ada Lovelace"));

    let edit = UpdateProposal {
        expected_version: confirmed.version,
        title: Some("Too late".into()),
        client_name: None,
        theme: None,
    };
    assert!(ProposalRepo::update(&pool, proposal.id, &edit).await.unwrap().is_none());
    assert!(!ProposalRepo::delete_draft(&pool, org.id, proposal.id).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_proposals_are_scoped_to_organization(pool: PgPool) {
    let (org, user) = seed(&pool).await;
    let proposal = draft(&pool, &org, &user).await;
    let other = OrganizationRepo::create(&pool, &CreateOrganization::default())
        .await
        .unwrap();

    assert!(ProposalRepo::find_by_id(&pool, other.id, proposal.id)
        .await
        .unwrap()
        .is_none());
    assert!(ProposalRepo::list(&pool, other.id).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Itinerary
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_replace_itinerary_renumbers_and_round_trips(pool: PgPool) {
    let (org, user) = seed(&pool).await;
    let proposal = draft(&pool, &org, &user).await;
    let serengeti = DestinationRepo::create(
        &pool,
        org.id,
        &CreateDestination {
            name: "Serengeti".into(),
            kind: None,
        },
    )
    .await
    .unwrap();

    let mut first = day(9, "Arrival");
    first.meals.dinner = true;
    first.activities = vec![
        Activity {
            name: "Sundowner".into(),
            moment: Moment::Evening,
            is_optional: true,
            description: None,
        },
        Activity {
            name: "Airport pickup".into(),
            moment: Moment::Morning,
            is_optional: false,
            description: Some("Kilimanjaro airport".into()),
        },
    ];
    let mut second = day(9, "Game drive");
    second.destination = Some(DestinationRef {
        id: Some(serengeti.id),
        name: "ignored, resolved from the table".into(),
    });
    let mut third = day(4, "Walking safari");
    third.destination = Some(DestinationRef {
        id: None,
        name: "Ndutu".into(),
    });

    let rows = vec![PricingRow {
        traveler_type: "Adult".into(),
        unit_price: 1200.0,
        count: 2,
    }];
    let extras = vec![Extra {
        name: "Balloon".into(),
        price: 550.0,
        selected: true,
    }];

    let version = ItineraryRepo::replace(
        &pool,
        proposal.id,
        proposal.version,
        &[first, second, third],
        &rows,
        &extras,
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(version, proposal.version + 1);

    let reloaded = ProposalRepo::find_by_id(&pool, org.id, proposal.id)
        .await
        .unwrap()
        .unwrap();
    let data = ItineraryRepo::load(&pool, &reloaded).await.unwrap();

    let numbers: Vec<i32> = data.days.iter().map(|d| d.day_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(data.days[0].activities[0].name, "Sundowner");
    assert_eq!(data.days[0].activities[1].moment, Moment::Morning);
    assert!(data.days[0].meals.dinner);
    assert_eq!(data.days[1].destination.as_ref().unwrap().name, "Serengeti");
    assert_eq!(data.days[2].destination.as_ref().unwrap().name, "Ndutu");
    assert_eq!(data.total_price(), 2950.0);
    assert_eq!(data.title, "Northern Circuit");

    // Stale version is rejected and leaves the tree unchanged.
    let stale = ItineraryRepo::replace(&pool, proposal.id, proposal.version, &[], &[], &[])
        .await
        .unwrap();
    assert!(stale.is_none());
    assert_eq!(ItineraryRepo::load(&pool, &reloaded).await.unwrap().days.len(), 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deleting_draft_cascades_itinerary(pool: PgPool) {
    let (org, user) = seed(&pool).await;
    let proposal = draft(&pool, &org, &user).await;
    ItineraryRepo::replace(&pool, proposal.id, 1, &[day(1, "Only day")], &[], &[])
        .await
        .unwrap()
        .unwrap();

    assert!(ProposalRepo::delete_draft(&pool, org.id, proposal.id).await.unwrap());

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM proposal_days")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

// ---------------------------------------------------------------------------
// Tours, destinations, onboarding
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_clone_from_tour_deep_copies(pool: PgPool) {
    let (org, user) = seed(&pool).await;
    let mut safari = day(1, "Tarangire");
    safari.activities.push(Activity {
        name: "Game drive".into(),
        moment: Moment::FullDay,
        is_optional: false,
        description: None,
    });
    let tour = TourRepo::create(
        &pool,
        org.id,
        user.id,
        &ValidatedTour {
            name: "Tanzania Classic".into(),
            overview: "A week across the northern parks.".into(),
            price: 2400.0,
            tags: vec!["safari".into()],
            days: vec![safari, day(2, "Departure")],
        },
    )
    .await
    .unwrap();
    assert_eq!(TourRepo::count_for_organization(&pool, org.id).await.unwrap(), 1);

    let proposal = ProposalRepo::create_from_tour(
        &pool,
        user.id,
        &tour,
        "Tanzania for the Smiths",
        Some("The Smiths"),
        ThemeId::Classic,
    )
    .await
    .unwrap();
    assert_eq!(proposal.tour_id, Some(tour.id));

    let data = ItineraryRepo::load(&pool, &proposal).await.unwrap();
    assert_eq!(data.days.len(), 2);
    assert_eq!(data.days[0].activities[0].moment, Moment::FullDay);
    assert_eq!(data.pricing_rows.len(), 1);
    assert_eq!(data.total_price(), 2400.0);

    // The copy is independent of the template.
    assert!(TourRepo::delete(&pool, org.id, tour.id).await.unwrap());
    assert_eq!(ItineraryRepo::load(&pool, &proposal).await.unwrap().days.len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_destination_prefix_search(pool: PgPool) {
    let (org, _) = seed(&pool).await;
    for name in ["Serengeti", "Selous", "Tarangire", "100% Wild"] {
        DestinationRepo::create(
            &pool,
            org.id,
            &CreateDestination {
                name: name.into(),
                kind: None,
            },
        )
        .await
        .unwrap();
    }

    let hits = DestinationRepo::search(&pool, org.id, "se", 10).await.unwrap();
    let names: Vec<&str> = hits.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["Selous", "Serengeti"]);

    let literal = DestinationRepo::search(&pool, org.id, "100%", 10).await.unwrap();
    assert_eq!(literal.len(), 1);
    assert!(DestinationRepo::search(&pool, org.id, "%", 10).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_onboarding_flag_is_set_once(pool: PgPool) {
    let (org, _) = seed(&pool).await;
    assert!(!org.onboarding_completed);

    let updated = OrganizationRepo::update(
        &pool,
        org.id,
        &UpdateOrganization {
            name: Some("Savanna Trails".into()),
            notification_email: None,
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.name.as_deref(), Some("Savanna Trails"));

    assert!(OrganizationRepo::mark_onboarding_completed(&pool, org.id).await.unwrap());
    assert!(!OrganizationRepo::mark_onboarding_completed(&pool, org.id).await.unwrap());
}
