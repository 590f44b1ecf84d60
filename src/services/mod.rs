pub mod delta;
pub use delta::compute_delta;

pub mod planning_service;
pub mod planning_service_impl;
pub use planning_service::{PlanningService, SearchError, SearchFilter, SearchRequest};
pub use planning_service_impl::DefaultPlanningService;

pub mod retention;
pub use retention::{PruneSummary, prune_history};
