pub mod identity;
pub mod notifications;

pub use identity::{HttpIdentityProvider, IdentityProvider};
pub use notifications::{Notifier, PgNotifier};
