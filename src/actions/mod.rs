pub mod logout;
pub mod prune_expired;

pub use logout::LogoutAction;
pub use prune_expired::PruneExpiredSessionsAction;
