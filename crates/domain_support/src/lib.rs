//! Support Domain
//!
//! Operational records around the members of a branch: complaints, staff
//! tasks, membership contracts and in-portal notifications.
//!
//! Status changes go through per-record transition tables that name the
//! least privileged role allowed to make each move.

pub mod workflow;
pub mod complaint;
pub mod task;
pub mod contract;
pub mod notification;
pub mod error;
pub mod ports;
pub mod service;

pub use workflow::{authorize_transition, Transition, Workflow};
pub use complaint::{Complaint, ComplaintStatus, NewComplaint, Priority};
pub use task::{NewTask, Task, TaskStatus};
pub use contract::{Contract, ContractStatus, NewContract};
pub use notification::{NewNotification, Notification};
pub use error::SupportError;
pub use ports::{
    stale_update, ComplaintQuery, ContractQuery, NotificationQuery, SupportPort, TaskQuery,
};
#[cfg(any(test, feature = "memory"))]
pub use ports::memory::MemorySupportPort;
pub use service::{StatusChange, SupportService};
