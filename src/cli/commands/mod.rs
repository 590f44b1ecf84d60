mod history;
mod prune;
mod search;

pub use history::cmd_history;
pub use prune::cmd_prune;
pub use search::cmd_search;
