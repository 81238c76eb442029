pub mod booking;
pub mod cancellation;
pub mod generator;
pub mod slots;

pub use booking::BookingService;
pub use cancellation::CancellationPolicy;
pub use slots::SlotService;
