//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod comment_repo;
pub mod destination_repo;
pub mod itinerary_repo;
pub mod organization_repo;
pub mod proposal_repo;
pub mod tour_repo;
pub mod user_repo;

pub use comment_repo::CommentRepo;
pub use destination_repo::DestinationRepo;
pub use itinerary_repo::ItineraryRepo;
pub use organization_repo::OrganizationRepo;
pub use proposal_repo::ProposalRepo;
pub use tour_repo::TourRepo;
pub use user_repo::UserRepo;
