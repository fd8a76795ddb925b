//! # Clinica Core
//!
//! Core logic for the clinic attendance tool.
//!
//! This crate contains the document composition engine and the records backend it talks to:
//! - Template selection with specialty highlighting (`selection`, `matcher`)
//! - The per-template document store and its validation (`instances`)
//! - Composition of the `filled_forms` content slice (`composer`)
//! - The read-merge-write cycle for slice-owning editors (`reconcile`)
//! - Editor sessions for the attendance and the meal plan (`editor`)
//! - The collaborator seam with REST and in-process implementations (`client`, `http`, `local`)
//! - File-backed template, patient, appointment and record storage under `CLINIC_DATA_DIR`
//!
//! **No API concerns**: HTTP servers, authentication and request handling belong in `api-rest`
//! or `api-shared`.

pub mod client;
pub mod composer;
pub mod config;
pub mod constants;
pub mod editor;
pub mod error;
pub mod http;
pub mod instances;
pub mod local;
pub mod matcher;
pub mod models;
pub mod reconcile;
pub mod repositories;
pub mod selection;
pub mod session;

#[cfg(test)]
mod test_support;

pub use clinica_types::{NonEmptyText, TextError};
pub use clinica_uuid::{ItemIdGenerator, UuidService};

pub use client::{AttendanceGateway, TemplateCatalog};
pub use config::{primary_save_mode_from_env_value, CoreConfig, PrimarySaveMode};
pub use editor::{AttendanceEditor, EditorContext, MealPlanEditor};
pub use error::{ClinicError, ClinicResult};
pub use http::HttpClinicClient;
pub use instances::{DocumentInstance, DocumentInstances, HydrationReport};
pub use local::LocalClinic;
pub use reconcile::Reconciler;
pub use repositories::{AttendanceService, FormsService, NewAppointment};
pub use selection::{PickerEntry, TemplatePicker};
pub use session::{Role, Session, SessionStore, User};
