//! Constants used throughout the clinic core crate.
//!
//! Storage directory names, content-envelope slice keys and environment defaults live here so
//! the backend, the clients and the binaries agree on them.

/// Default directory for clinic data storage when no explicit directory is configured.
pub const DEFAULT_CLINIC_DATA_DIR: &str = "clinic_data";

/// Directory name for form template storage.
pub const TEMPLATES_DIR_NAME: &str = "templates";

/// Directory name for patient storage.
pub const PATIENTS_DIR_NAME: &str = "patients";

/// Directory name for appointment storage.
pub const APPOINTMENTS_DIR_NAME: &str = "appointments";

/// Directory name for medical record storage (one file per appointment).
pub const RECORDS_DIR_NAME: &str = "records";

/// Content-envelope slice holding the dynamic documents.
pub const FILLED_FORMS_SLICE: &str = "filled_forms";

/// Content-envelope slice holding the nutrition meal plan.
pub const MEAL_PLAN_SLICE: &str = "mealPlan";

/// Specialty keyword that unlocks the meal-plan editor.
pub const NUTRITION_KEYWORD: &str = "nutri";

/// Maximum length of an identifier accepted from outside the core.
pub const MAX_ID_LEN: usize = 128;

/// Header naming the acting user's id on REST requests.
pub const ACTOR_ID_HEADER: &str = "x-user-id";

/// Header naming the acting user's role on REST requests.
pub const ACTOR_ROLE_HEADER: &str = "x-user-role";

/// Optional header carrying the acting user's specialty (UTF-8).
pub const ACTOR_SPECIALTY_HEADER: &str = "x-user-specialty";

/// Default base URL of the REST API used by remote clients.
pub const DEFAULT_API_URL: &str = "http://localhost:3000";
