//! # Aayra Core Library
//!
//! The study-reminder subsystem of Aayra: deciding when to nudge a student,
//! what to say, and how the nudge reaches them. Everything is usable from
//! the standalone CLI; a GUI would be a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Reminder Scheduler**: computes fire times from the weekday/time
//!   preference and keeps at most one armed reminder per dedupe tag. Like the
//!   countdown, it has no thread of its own; the caller asks for due ones
//! - **Notification Dispatcher**: permission handling and rendering over a
//!   platform seam
//! - **Delivery Worker**: a separate task that renders push payloads and
//!   routes clicks, talking to the app over channels only
//! - **Engagement Stats**: pure streak/progress/completion calculations that
//!   personalize reminder copy
//!
//! ## Key Components
//!
//! - [`ReminderScheduler`]: armed reminder set
//! - [`NotificationDispatcher`]: permission + display
//! - [`DeliveryWorker`]: background push handling
//! - [`EngagementStats`]: derived statistics
//! - [`ReminderService`]: wiring for one signed-in user
//! - [`Config`]: application configuration management

pub mod backend;
pub mod error;
pub mod events;
pub mod notify;
pub mod reminder;
pub mod service;
pub mod stats;
pub mod storage;
pub mod timer;
pub mod worker;

pub use backend::{Backend, NotificationEvent, NotificationEventType, RestBackend};
pub use error::{BackendError, ConfigError, CoreError, ValidationError};
pub use events::Event;
pub use notify::{DisplayOutcome, NotificationDispatcher, NotificationPayload, Permission};
pub use reminder::{
    ReminderHandle, ReminderPreference, ReminderScheduler, ScheduledReminder, StudyDay,
};
pub use service::ReminderService;
pub use stats::{CompletedSession, EngagementStats};
pub use storage::{Config, UserSession};
pub use timer::{Countdown, CountdownState, SessionKind};
pub use worker::{DeliveryWorker, WorkerState};
