pub mod registry;
pub mod webhook;

pub use registry::{PlanItClient, RegistryClient};
pub use webhook::{Notifier, WebhookNotifier};
