//! File-backed backend services.
//!
//! `FormsService` manages the template catalog; `AttendanceService` manages patients,
//! appointments and the medical records written by the editors.

pub mod attendance;
pub mod forms;
pub(crate) mod shared;

pub use attendance::{AttendanceService, NewAppointment};
pub use forms::FormsService;
