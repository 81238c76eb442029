pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod store;

pub use error::SchedulingError;
pub use services::{BookingService, CancellationPolicy, SlotService};
pub use store::{MemoryStore, PostgrestStore, SchedulingStore};
