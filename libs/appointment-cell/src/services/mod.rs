pub mod booking;
pub mod conflict;
pub mod lifecycle;
pub mod scheduling;

pub use booking::AppointmentBookingService;
pub use conflict::ConflictCheckService;
pub use lifecycle::AppointmentLifecycleService;
pub use scheduling::{SchedulingRules, SchedulingValidator};
