pub mod prelude;

pub mod planning_searches;
