pub mod dispatch;
pub mod probe;
pub mod stats;
pub mod skills;
