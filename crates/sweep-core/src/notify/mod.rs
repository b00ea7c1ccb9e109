pub mod backends;
pub mod errors;
pub mod notifier;
pub mod registry;
pub mod traits;
pub mod types;

pub use errors::DeliveryError;
pub use notifier::RegistryNotifier;
pub use registry::DeliveryRegistry;
pub use traits::{DeliveryBackend, Notifier};
pub use types::{DeliveryReceipt, NotificationMessage, NotificationRequest};
