pub mod error;
pub mod time;
pub mod types;

pub use error::{ErrorKind, QuestDropError, Result};
pub use time::{now_nanos, secs_to_nanos};
pub use types::{Identity, TransactionId};
