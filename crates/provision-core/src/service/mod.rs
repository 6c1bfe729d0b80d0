//! Lifecycle control for the agent's operating system service.
//!
//! - [`types`] defines service status values and the poll policy.
//! - [`error`] captures control and timeout failures.
//! - [`controller`] implements the stop-wait-confirm and start-wait-confirm
//!   loops on top of a [`ServiceManager`].

mod controller;
mod error;
mod types;

pub use controller::ServiceController;
pub use error::{ServiceControlError, ServiceError};
pub use types::{PollPolicy, ServiceManager, ServiceStatus, TransitionTarget};
