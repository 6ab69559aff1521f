//! Database repositories module
//!
//! One repository per aggregate; every write that touches ticket inventory
//! lives in `registration`.

pub mod user;
pub mod event;
pub mod registration;
pub mod notification;

// Re-export repositories
pub use user::UserRepository;
pub use event::EventRepository;
pub use registration::RegistrationRepository;
pub use notification::NotificationRepository;
