pub mod appointment_store;
pub mod availability_store;
pub mod directory;
pub mod engine;
pub mod expander;
pub mod lifecycle;

pub use appointment_store::AppointmentStore;
pub use availability_store::AvailabilityStore;
pub use directory::UserDirectory;
pub use engine::SchedulingEngine;
pub use expander::AvailabilityExpander;
pub use lifecycle::AppointmentLifecycle;
