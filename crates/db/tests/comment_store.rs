//! Integration tests for the comment store.
//!
//! - Create/list round trip including sticky anchors
//! - Replies nested under their parent in creation order
//! - Resolve is idempotent and blocks further replies
//! - Status filter on list

use assert_matches::assert_matches;
use sqlx::PgPool;
use kitasuro_core::anchor::{Anchor, AnchorRef, AnchorRefKind, CommentAnchor, StickyAnchor};
use kitasuro_core::comment::{CommentFilter, CommentStatus};
use kitasuro_core::session::{CommentSession, ThreadRecord};
use kitasuro_db::models::comment::{CreateComment, CreateReply};
use kitasuro_db::models::organization::CreateOrganization;
use kitasuro_db::models::proposal::{CreateProposal, Proposal};
use kitasuro_db::models::user::CreateUser;
use kitasuro_db::repositories::{CommentRepo, OrganizationRepo, ProposalRepo, UserRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_proposal(pool: &PgPool) -> Proposal {
    let org = OrganizationRepo::create(pool, &CreateOrganization::default())
        .await
        .unwrap();
    let user = UserRepo::create(
        pool,
        &CreateUser {
            organization_id: org.id,
            email: "planner@agency.test".into(),
            display_name: "Planner".into(),
            role: None,
        },
    )
    .await
    .unwrap();
    ProposalRepo::create(
        pool,
        org.id,
        user.id,
        &CreateProposal {
            title: "Honeymoon in Zanzibar".into(),
            client_name: Some("The Okafors".into()),
            theme: None,
        },
    )
    .await
    .unwrap()
}

fn new_comment(author: &str, content: &str, anchor: CommentAnchor) -> CreateComment {
    CreateComment {
        author_name: author.into(),
        content: content.into(),
        anchor,
    }
}

fn reply(author: &str, content: &str) -> CreateReply {
    CreateReply {
        author_name: author.into(),
        content: content.into(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_returns_canonical_row(pool: PgPool) {
    let proposal = seed_proposal(&pool).await;

    let anchor = CommentAnchor {
        container: Anchor::Region {
            x: 10.0,
            y: 20.0,
            width: 30.0,
            height: 5.0,
        },
        sticky: Some(StickyAnchor {
            anchor_ref: AnchorRef {
                kind: AnchorRefKind::AnchorAttribute,
                value: "day-3-header".into(),
            },
            anchor: Anchor::Point { x: 50.0, y: 40.0 },
        }),
    };
    let comment = CommentRepo::create(
        &pool,
        proposal.id,
        &new_comment("  Ada ", " Can we add a balloon ride? ", anchor.clone()),
    )
    .await
    .unwrap();

    assert!(comment.id > 0);
    assert_eq!(comment.author_name, "Ada");
    assert_eq!(comment.content, "Can we add a balloon ride?");
    assert_eq!(comment.status, CommentStatus::Open);
    assert_eq!(comment.anchor, anchor);
    assert!(comment.resolved_at.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_comment_with_replies_lists_as_thread(pool: PgPool) {
    let proposal = seed_proposal(&pool).await;
    let comment = CommentRepo::create(
        &pool,
        proposal.id,
        &new_comment("Ada", "First thought", CommentAnchor::point(10.0, 20.0)),
    )
    .await
    .unwrap();

    CommentRepo::add_reply(&pool, comment.id, &reply("Planner", "Noted"))
        .await
        .unwrap()
        .expect("reply on open comment");
    CommentRepo::add_reply(&pool, comment.id, &reply("Ada", "Thanks"))
        .await
        .unwrap()
        .expect("second reply");

    let threads = CommentRepo::list_threads(&pool, proposal.id, CommentFilter::All)
        .await
        .unwrap();
    assert_eq!(threads.len(), 1);
    let thread = &threads[0];
    assert_eq!(thread.comment.anchor.container, Anchor::Point { x: 10.0, y: 20.0 });
    assert_eq!(thread.comment.status, CommentStatus::Open);
    let contents: Vec<&str> = thread.replies.iter().map(|r| r.content.as_str()).collect();
    assert_eq!(contents, vec!["Noted", "Thanks"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_resolve_is_idempotent(pool: PgPool) {
    let proposal = seed_proposal(&pool).await;
    let comment = CommentRepo::create(
        &pool,
        proposal.id,
        &new_comment("Ada", "Typo in day 2", CommentAnchor::point(1.0, 1.0)),
    )
    .await
    .unwrap();

    let first = CommentRepo::resolve(&pool, comment.id).await.unwrap().unwrap();
    let second = CommentRepo::resolve(&pool, comment.id).await.unwrap().unwrap();

    assert!(first.changed);
    assert!(!second.changed);
    assert_eq!(first.comment.status, CommentStatus::Resolved);
    assert_eq!(second.comment.status, CommentStatus::Resolved);
    assert_eq!(first.comment.resolved_at, second.comment.resolved_at);
    assert_matches!(CommentRepo::resolve(&pool, 999_999).await, Ok(None));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_resolves_flip_status_once(pool: PgPool) {
    let proposal = seed_proposal(&pool).await;
    let comment = CommentRepo::create(
        &pool,
        proposal.id,
        &new_comment("Ada", "Race me", CommentAnchor::point(3.0, 3.0)),
    )
    .await
    .unwrap();

    let (a, b) = tokio::join!(
        CommentRepo::resolve(&pool, comment.id),
        CommentRepo::resolve(&pool, comment.id),
    );
    let changed = [a.unwrap().unwrap(), b.unwrap().unwrap()]
        .iter()
        .filter(|r| r.changed)
        .count();
    assert_eq!(changed, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reply_on_resolved_comment_is_rejected(pool: PgPool) {
    let proposal = seed_proposal(&pool).await;
    let comment = CommentRepo::create(
        &pool,
        proposal.id,
        &new_comment("Ada", "Done?", CommentAnchor::point(5.0, 5.0)),
    )
    .await
    .unwrap();
    CommentRepo::resolve(&pool, comment.id).await.unwrap();

    let result = CommentRepo::add_reply(&pool, comment.id, &reply("Ada", "One more"))
        .await
        .unwrap();
    assert!(result.is_none());

    let missing = CommentRepo::add_reply(&pool, 999_999, &reply("Ada", "Hello"))
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_status_filter(pool: PgPool) {
    let proposal = seed_proposal(&pool).await;
    let open = CommentRepo::create(
        &pool,
        proposal.id,
        &new_comment("Ada", "Still open", CommentAnchor::point(1.0, 1.0)),
    )
    .await
    .unwrap();
    let done = CommentRepo::create(
        &pool,
        proposal.id,
        &new_comment("Ada", "Handled", CommentAnchor::point(2.0, 2.0)),
    )
    .await
    .unwrap();
    CommentRepo::resolve(&pool, done.id).await.unwrap();

    let open_threads = CommentRepo::list_threads(&pool, proposal.id, CommentFilter::Open)
        .await
        .unwrap();
    assert_eq!(open_threads.len(), 1);
    assert_eq!(open_threads[0].comment.id, open.id);

    let resolved = CommentRepo::list_threads(&pool, proposal.id, CommentFilter::Resolved)
        .await
        .unwrap();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].comment.id, done.id);

    assert_eq!(CommentRepo::count_open(&pool, proposal.id).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_session_applies_store_results(pool: PgPool) {
    let proposal = seed_proposal(&pool).await;
    let mut session = CommentSession::new(proposal.id);
    session.load(
        CommentRepo::list_threads(&pool, proposal.id, CommentFilter::All)
            .await
            .unwrap(),
    );
    assert!(session.threads().is_empty());

    let created = CommentRepo::create(
        &pool,
        proposal.id,
        &new_comment("Ada", "Pin me", CommentAnchor::point(40.0, 60.0)),
    )
    .await
    .unwrap();
    let thread = kitasuro_db::models::comment::CommentThread {
        comment: created,
        replies: vec![],
    };
    let id = session.apply_created(Ok(thread)).unwrap();

    let stored_reply = CommentRepo::add_reply(&pool, id, &reply("Planner", "Sure"))
        .await
        .unwrap()
        .unwrap();
    session.apply_reply(id, Ok(stored_reply)).unwrap();
    CommentRepo::resolve(&pool, id).await.unwrap();
    session.apply_resolved(id, Ok(())).unwrap();

    let reloaded = CommentRepo::list_threads(&pool, proposal.id, CommentFilter::All)
        .await
        .unwrap();
    assert_eq!(session.threads().len(), reloaded.len());
    assert_eq!(session.threads()[0].replies, reloaded[0].replies);
    assert_eq!(session.threads()[0].comment.status, reloaded[0].comment.status);
    assert_eq!(session.get(id).unwrap().status(), CommentStatus::Resolved);
    assert_eq!(session.open_threads().count(), 0);
}
