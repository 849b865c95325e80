//! Contact form payloads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

pub const REQUIRED_MESSAGE: &str = "All fields are required.";
pub const EMAIL_MESSAGE: &str = "Please enter a valid email address.";
pub const TOO_SHORT_MESSAGE: &str = "Message must be at least 10 characters long.";
pub const TOO_LONG_MESSAGE: &str = "Message must be less than 2000 characters.";
pub const THANK_YOU_MESSAGE: &str =
    "Thank you for your message! We will respond within 24 hours.";

/// Wire value and label of every inquiry type offered by the form.
pub const INQUIRY_TYPES: &[(&str, &str)] = &[
    ("technical_support", "Technical Support - JPG to PDF Issues"),
    ("feature_request", "Feature Request"),
    ("bug_report", "Bug Report"),
    ("privacy_question", "Privacy Question"),
    ("business_inquiry", "Business Inquiry"),
    ("feedback", "General Feedback"),
    ("other", "Other"),
];

/// Urlencoded body of `POST /contact/submit/`. Missing fields deserialize
/// as empty strings so they are reported as required, not as a 422.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ContactForm {
    #[serde(default)]
    pub inquiry_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    #[validate(
        email(message = "Please enter a valid email address."),
        custom(function = "dotted_domain")
    )]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    #[validate(custom(function = "message_length"))]
    pub message: String,
}

impl ContactForm {
    /// First problem with the form, in the order the user should fix them.
    pub fn check(&self) -> Result<(), &'static str> {
        let fields = [
            &self.inquiry_type,
            &self.name,
            &self.email,
            &self.subject,
            &self.message,
        ];
        if fields.iter().any(|f| f.is_empty()) {
            return Err(REQUIRED_MESSAGE);
        }

        let Err(errors) = self.validate() else {
            return Ok(());
        };
        let by_field = errors.field_errors();
        if by_field.contains_key("email") {
            return Err(EMAIL_MESSAGE);
        }
        let too_long = by_field
            .get("message")
            .is_some_and(|errs| errs.iter().any(|e| e.code == "too_long"));
        if too_long {
            Err(TOO_LONG_MESSAGE)
        } else {
            Err(TOO_SHORT_MESSAGE)
        }
    }

    /// Human label for the inquiry type; unknown values read as "Other".
    pub fn inquiry_label(&self) -> &'static str {
        INQUIRY_TYPES
            .iter()
            .find(|(value, _)| *value == self.inquiry_type)
            .map_or("Other", |(_, label)| *label)
    }
}

/// The domain must contain a dot, so `sam@localhost` is rejected.
fn dotted_domain(email: &str) -> Result<(), ValidationError> {
    let dotted = email.rsplit_once('@').is_some_and(|(_, domain)| {
        domain
            .split_once('.')
            .is_some_and(|(head, tail)| !head.is_empty() && !tail.is_empty())
    });
    if dotted {
        Ok(())
    } else {
        Err(ValidationError::new("dotted_domain"))
    }
}

fn message_length(message: &str) -> Result<(), ValidationError> {
    let len = message.chars().count();
    if len < 10 {
        return Err(ValidationError::new("too_short"));
    }
    if len > 2000 {
        return Err(ValidationError::new("too_long"));
    }
    Ok(())
}

/// Response body for an accepted contact message.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
}
