pub mod planning;

pub use planning::{Applicant, DeltaResult, PlanningEntity, SearchRecord, WebhookPayload};
