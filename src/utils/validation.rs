use validator::{ValidationErrors, ValidationErrorsKind};

use crate::error::AppError;

/// Reduces validator output to the first failing field in `order`, so forms
/// report one message at a time in a stable order.
///
/// Struct-level (schema) errors come after every listed field.
pub fn first_violation(errors: &ValidationErrors, order: &[&str]) -> AppError {
    let all = errors.errors();
    let message = order
        .iter()
        .filter_map(|field| all.get(*field))
        .chain(all.get("__all__"))
        .chain(all.values())
        .find_map(|kind| match kind {
            ValidationErrorsKind::Field(errs) => errs.first().map(|err| {
                err.message
                    .as_ref()
                    .map(|msg| msg.to_string())
                    .unwrap_or_else(|| err.code.to_string())
            }),
            _ => None,
        })
        .unwrap_or_else(|| errors.to_string());

    AppError::ValidationError(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::account::RegisterRequest;
    use validator::Validate;

    fn request(name: &str, email: &str, password: &str, class_level: i64) -> RegisterRequest {
        RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            class_level,
            role: None,
        }
    }

    fn first(req: RegisterRequest) -> String {
        let errors = req.validate().unwrap_err();
        first_violation(&errors, &RegisterRequest::CHECK_ORDER)
            .message()
            .to_string()
    }

    #[test]
    fn reports_violations_in_form_order() {
        assert_eq!(first(request("", "bad", "123", 0)), "Name is required");
        assert_eq!(first(request("Al", "bad", "123", 0)), "Invalid email format");
        assert_eq!(
            first(request("Al", "al@x.io", "123", 0)),
            "Password must be at least 6 characters"
        );
        assert_eq!(
            first(request("Al", "al@x.io", "123456", 11)),
            "Please select a valid class (1-10)"
        );
        assert!(request("Al", "al@x.io", "123456", 10).validate().is_ok());
    }

    #[test]
    fn renamed_fields_are_found_in_order() {
        let errors = request("Al", "al@x.io", "123456", 0).validate().unwrap_err();
        assert!(errors.errors().contains_key("class"));
        assert!(RegisterRequest::CHECK_ORDER.contains(&"class"));
    }
}
