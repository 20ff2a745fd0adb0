pub mod record;
pub mod store;

pub use record::{ResultRecord, ResultSource};
pub use store::ResultStore;
