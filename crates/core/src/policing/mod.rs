//! Request policing.
//!
//! Tracks a rolling request score and a daily request count per provider and
//! refuses requests once either limit is reached. The same counters carry the
//! lifetime success/failure sample that ranking turns into provider trust.

mod clock;
mod police;
mod sqlite;
mod store;
mod types;

pub use clock::{Clock, SystemClock};
pub use police::RequestPolice;
pub use sqlite::SqliteQuotaStore;
pub use store::{InMemoryQuotaStore, QuotaStore};
pub use types::*;
