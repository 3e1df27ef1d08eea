use crate::schema::{Validator, ValidatorRequest, ValidatorResponse};
use crate::types::{Diagnostic, Dynamic};

/// Accepts only strings from a fixed set of values
pub struct StringOneOf {
    values: Vec<String>,
    ignore_case: bool,
}

impl StringOneOf {
    pub fn create(values: &[&str]) -> Box<dyn Validator> {
        Box::new(Self {
            values: values.iter().map(|v| v.to_string()).collect(),
            ignore_case: false,
        })
    }

    pub fn create_ignore_case(values: &[&str]) -> Box<dyn Validator> {
        Box::new(Self {
            values: values.iter().map(|v| v.to_string()).collect(),
            ignore_case: true,
        })
    }

    fn matches(&self, candidate: &str) -> bool {
        self.values.iter().any(|v| {
            if self.ignore_case {
                v.eq_ignore_ascii_case(candidate)
            } else {
                v == candidate
            }
        })
    }
}

impl Validator for StringOneOf {
    fn description(&self) -> String {
        format!("value must be one of: {}", self.values.join(", "))
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut diagnostics = Vec::new();

        if let Dynamic::String(s) = &request.config_value.value {
            if !self.matches(s) {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid attribute value",
                        format!(
                            "Attribute {} value must be one of: {}, got: \"{}\"",
                            request.path,
                            self.values.join(", "),
                            s
                        ),
                    )
                    .with_attribute(request.path),
                );
            }
        }

        ValidatorResponse { diagnostics }
    }
}

/// Rejects empty strings
pub struct StringNotEmpty;

impl StringNotEmpty {
    pub fn create() -> Box<dyn Validator> {
        Box::new(Self)
    }
}

impl Validator for StringNotEmpty {
    fn description(&self) -> String {
        "string must not be empty".to_string()
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut diagnostics = Vec::new();

        if let Dynamic::String(s) = &request.config_value.value {
            if s.is_empty() {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid attribute value",
                        format!("Attribute {} must not be empty", request.path),
                    )
                    .with_attribute(request.path),
                );
            }
        }

        ValidatorResponse { diagnostics }
    }
}
