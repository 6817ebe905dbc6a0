pub mod attendance;
pub mod certificates;
pub mod individual;
pub mod overall;
pub mod results;
