//! Safe placeholder values per predicted type

use crate::models::{Parameter, TypeLabel};

/// Benign value consistent with `label`, used as the parameter's baseline.
pub fn baseline_value(param: &Parameter, label: TypeLabel) -> String {
    match label {
        TypeLabel::Int => "1".to_string(),
        TypeLabel::Float => "1.23".to_string(),
        TypeLabel::Bool => "true".to_string(),
        TypeLabel::Uuid => uuid::Uuid::nil().to_string(),
        TypeLabel::Email => "test@example.com".to_string(),
        TypeLabel::String => "test".to_string(),
        TypeLabel::Enum => param
            .options()
            .and_then(|o| o.first())
            .cloned()
            .unwrap_or_else(|| "option1".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_placeholders() {
        let p = Parameter::default();
        assert_eq!(baseline_value(&p, TypeLabel::Int), "1");
        assert_eq!(baseline_value(&p, TypeLabel::Float), "1.23");
        assert_eq!(baseline_value(&p, TypeLabel::Bool), "true");
        assert_eq!(
            baseline_value(&p, TypeLabel::Uuid),
            "00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(baseline_value(&p, TypeLabel::Email), "test@example.com");
        assert_eq!(baseline_value(&p, TypeLabel::String), "test");
    }

    #[test]
    fn test_enum_uses_first_option() {
        let p = Parameter::new("role", "").with_options(vec!["admin".into(), "user".into()]);
        assert_eq!(baseline_value(&p, TypeLabel::Enum), "admin");
        assert_eq!(baseline_value(&Parameter::default(), TypeLabel::Enum), "option1");
    }
}
