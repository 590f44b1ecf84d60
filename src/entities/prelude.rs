pub use super::planning_searches::Entity as PlanningSearches;
