//! Editor sessions over one appointment's record.
//!
//! - [`AttendanceEditor`]: the primary editor. Owns the base form and the `filled_forms` slice.
//! - [`MealPlanEditor`]: the nutrition editor. Owns the `mealPlan` slice and writes it through
//!   the reconciliation cycle.
//!
//! Both take `&mut self` for every state change, so one session never runs two saves at once.
//! Dropping a session drops any in-flight future with it; a late response cannot update a
//! session that no longer exists.

mod attendance;
mod meal_plan;

pub use attendance::AttendanceEditor;
pub use meal_plan::MealPlanEditor;

use crate::client::{AttendanceGateway, TemplateCatalog};
use crate::config::CoreConfig;
use crate::session::Session;
use std::sync::Arc;

/// Everything an editor session needs from its surroundings.
#[derive(Clone)]
pub struct EditorContext {
    pub cfg: Arc<CoreConfig>,
    pub session: Arc<Session>,
    pub catalog: Arc<dyn TemplateCatalog>,
    pub gateway: Arc<dyn AttendanceGateway>,
}

impl EditorContext {
    pub fn new(
        cfg: Arc<CoreConfig>,
        session: Arc<Session>,
        catalog: Arc<dyn TemplateCatalog>,
        gateway: Arc<dyn AttendanceGateway>,
    ) -> Self {
        Self {
            cfg,
            session,
            catalog,
            gateway,
        }
    }

    pub fn user_specialty(&self) -> Option<&str> {
        self.session.user.specialty()
    }
}
