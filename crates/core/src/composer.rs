//! Composition of the `filled_forms` slice from the selection and the instance store.

use crate::error::ClinicResult;
use crate::instances::DocumentInstances;
use crate::models::{ContentEnvelope, FilledForm, FilledForms, Template};
use chrono::{DateTime, Utc};

/// One entry per selected template, in selection order, all stamped with `now`.
///
/// Templates with no instance contribute an empty object. Instances of templates that are not
/// selected are ignored.
pub fn compose(
    selected: &[Template],
    instances: &DocumentInstances,
    now: DateTime<Utc>,
) -> FilledForms {
    FilledForms(
        selected
            .iter()
            .map(|template| FilledForm {
                template_id: template.id.clone(),
                title: template.title.clone(),
                data: instances.value_for(&template.id),
                filled_at: Some(now),
            })
            .collect(),
    )
}

/// The envelope submitted by the primary save: `filled_forms` and nothing else.
pub fn primary_content(filled_forms: &FilledForms) -> ClinicResult<ContentEnvelope> {
    ContentEnvelope::with_only(filled_forms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MealPlan, TemplateId};
    use chrono::TimeZone;
    use serde_json::json;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 10, 13, 45, 0).unwrap()
    }

    #[test]
    fn test_compose_follows_selection_order() {
        let selected = vec![Template::new("b", "Odontograma"), Template::new("a", "Anamnese")];
        let mut instances = DocumentInstances::new();
        instances.set_value(&selected[1], json!({"kcal": 1800})).unwrap();

        let forms = compose(&selected, &instances, at());

        let ids: Vec<&str> = forms.iter().map(|f| f.template_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(forms.0[0].data, json!({}));
        assert_eq!(forms.0[1].data, json!({"kcal": 1800}));
        assert_eq!(forms.0[1].title, "Anamnese");
        assert!(forms.iter().all(|f| f.filled_at == Some(at())));
    }

    #[test]
    fn test_unselected_instances_are_not_composed() {
        let a = Template::new("a", "Anamnese");
        let b = Template::new("b", "Odontograma");
        let mut instances = DocumentInstances::new();
        instances.set_value(&a, json!({"x": "1"})).unwrap();
        instances.set_value(&b, json!({"y": "2"})).unwrap();

        let forms = compose(&[b.clone()], &instances, at());

        assert_eq!(forms.len(), 1);
        assert_eq!(forms.0[0].template_id, b.id);
    }

    #[test]
    fn test_empty_selection_composes_empty_slice() {
        let forms = compose(&[], &DocumentInstances::new(), at());
        let content = primary_content(&forms).unwrap();
        assert_eq!(serde_json::to_value(&content).unwrap(), json!({"filled_forms": []}));
    }

    #[test]
    fn test_hydrate_then_compose_round_trips() {
        let catalog = vec![
            Template::new("a", "Anamnese"),
            Template::new("b", "Odontograma"),
            Template::new("c", "Receita"),
        ];
        let persisted = FilledForms(vec![
            FilledForm {
                template_id: TemplateId::from("c"),
                title: "Receita".into(),
                data: json!({"med": "dipirona"}),
                filled_at: Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
            },
            FilledForm {
                template_id: TemplateId::from("a"),
                title: "Anamnese".into(),
                data: json!({"queixa": "cefaleia"}),
                filled_at: Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
            },
        ]);

        let mut instances = DocumentInstances::new();
        let (selected, _) = instances.hydrate(&persisted, &catalog);
        let recomposed = compose(&selected, &instances, at());

        let before: Vec<_> = persisted.iter().map(|f| (&f.template_id, &f.data)).collect();
        let after: Vec<_> = recomposed.iter().map(|f| (&f.template_id, &f.data)).collect();
        assert_eq!(before, after);
        assert!(recomposed.iter().all(|f| f.filled_at == Some(at())));
    }

    #[test]
    fn test_primary_content_drops_sibling_slices() {
        let forms = FilledForms::default();
        let content = primary_content(&forms).unwrap();

        assert!(content.contains("filled_forms"));
        assert!(!content.contains(crate::constants::MEAL_PLAN_SLICE));
        assert!(content.slice::<MealPlan>().unwrap().is_none());
    }
}
