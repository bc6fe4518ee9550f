pub mod activity;

pub use activity::{ActivityService, ActivitySource, ActivityType};
