//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod user;
pub mod event;
pub mod registration;
pub mod notification;

// Re-export commonly used models
pub use user::{
    User, UserRole, UserStatus, SubscriptionPlan, OrganizerProfile, ParticipantProfile,
    ParticipantPreferences, CreateUserRequest, UpdateUserRequest, SignupRequest, LoginRequest,
};
pub use event::{
    Event, EventCategory, EventStatus, EventVisibility, EventTiming, TicketType, Pricing,
    EventDetails, CreateEventRequest, UpdateEventRequest, TicketInput, EventListQuery,
};
pub use registration::{
    Registration, RegistrationStatus, PaymentStatus, RegistrationSummary, RegistrationCheck,
    CreateRegistrationRequest, NewRegistration, UpdateRegistrationStatusRequest,
};
pub use notification::{Notification, NotificationKind, CreateNotificationRequest, UnreadCount};
