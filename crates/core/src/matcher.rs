//! Specialty matching for catalog highlighting.
//!
//! Matching is a loose, case-insensitive substring test: a template is *recommended* when the
//! user's specialty contains any of the template's keywords. It only flags templates; it never
//! filters the catalog.

use crate::constants::NUTRITION_KEYWORD;
use crate::models::Template;

/// Returns true iff `user_specialty`, lower-cased, contains one of the template's keywords.
///
/// Always false when the user has no specialty.
pub fn is_recommended(user_specialty: Option<&str>, template: &Template) -> bool {
    let Some(specialty) = user_specialty else {
        return false;
    };
    let specialty = specialty.to_lowercase();
    template
        .specialties
        .iter()
        .any(|keyword| specialty.contains(keyword.as_str()))
}

/// True when the user's specialty unlocks the meal-plan editor.
pub fn offers_meal_plan(user_specialty: Option<&str>) -> bool {
    user_specialty.is_some_and(|s| s.to_lowercase().contains(NUTRITION_KEYWORD))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(keywords: &[&str]) -> Template {
        Template::new("t", "Template").with_specialties(keywords.iter().copied())
    }

    #[test]
    fn test_absent_specialty_never_matches() {
        assert!(!is_recommended(None, &tagged(&["nutri"])));
    }

    #[test]
    fn test_substring_match_is_case_insensitive() {
        let template = tagged(&["nutri"]);
        assert!(is_recommended(Some("Nutricionista"), &template));
        assert!(is_recommended(Some("nutricionista clínica"), &template));
        assert!(!is_recommended(Some("Dentista"), &template));
    }

    #[test]
    fn test_any_keyword_is_enough() {
        let template = tagged(&["dental", "odonto"]);
        assert!(is_recommended(Some("Odontologia"), &template));
    }

    #[test]
    fn test_template_without_keywords_is_never_recommended() {
        assert!(!is_recommended(Some("Clínico Geral"), &tagged(&[])));
    }

    #[test]
    fn test_keywords_are_not_lowercased() {
        // Keywords are stored lower-case; an upper-case keyword cannot match a lowered specialty.
        assert!(!is_recommended(Some("Nutricionista"), &tagged(&["Nutri"])));
    }

    #[test]
    fn test_matches_iff_some_keyword_is_substring() {
        let specialties = ["Nutricionista", "PSICOLOGIA", "fisioterapeuta", "", "Médico"];
        let catalogs: [&[&str]; 5] = [
            &["nutri"],
            &["psico", "dental"],
            &["fisio"],
            &["med", "médico"],
            &[],
        ];

        for specialty in specialties {
            for keywords in catalogs {
                let expected = keywords
                    .iter()
                    .any(|k| specialty.to_lowercase().contains(k));
                assert_eq!(
                    is_recommended(Some(specialty), &tagged(keywords)),
                    expected,
                    "specialty {specialty:?} keywords {keywords:?}"
                );
            }
        }
    }

    #[test]
    fn test_meal_plan_offered_to_nutrition_only() {
        assert!(offers_meal_plan(Some("Nutricionista")));
        assert!(!offers_meal_plan(Some("Psicóloga")));
        assert!(!offers_meal_plan(None));
    }
}
