/// Social graph store: likes on posts and subscriptions between users.
///
/// Both relations share the same shape: a uniqueness-constrained pair table
/// toggled through an atomic insert-or-delete protocol. The unique
/// constraints in the schema, not application-side existence checks, are
/// what keeps concurrent duplicate toggles correct.
pub mod likes;
pub mod subscriptions;

pub use likes::LikeRepository;
pub use subscriptions::SubscriptionRepository;
