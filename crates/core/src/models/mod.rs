//! Domain models.
//!
//! Templates and their form schemas, the record content envelope and its slices, and the
//! patient/appointment/record entities exchanged with the records backend.

pub mod content;
pub mod meal_plan;
pub mod record;
pub mod schema;
pub mod template;

pub use content::{ContentEnvelope, ContentSlice, FilledForm, FilledForms};
pub use meal_plan::{Meal, MealItem, MealItemField, MealPlan};
pub use record::{
    Appointment, AppointmentStatus, AttendanceRecord, BaseForm, MedicalRecord, Patient,
    QueueEntry, RecordPayload,
};
pub use schema::{FieldType, FieldViolation, FormField, FormSchema, FormSection};
pub use template::{NewTemplate, Template, TemplateId, TemplateKind};
