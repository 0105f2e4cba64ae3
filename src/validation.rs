use lazy_static::lazy_static;
use regex::Regex;
use validator::{ValidateUrl, ValidationError};

lazy_static! {
    /// Uppercase letters, digits and hyphens, e.g. "TSHIRT-RED-XL".
    pub static ref SKU_REGEX: Regex = Regex::new(r"^[A-Z0-9-]+$").unwrap();
}

pub fn validate_image_urls(images: &Vec<String>) -> Result<(), ValidationError> {
    if images.iter().all(|url| url.validate_url()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("url");
        err.message = Some("Images must be valid URLs".into());
        Err(err)
    }
}

/// Trims and uppercases a SKU the way it is stored.
pub fn normalize_sku(sku: &str) -> String {
    sku.trim().to_uppercase()
}

/// Trims an optional text field, treating blank input as absent.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
