use validator::ValidationError;

/// Rejects names that are empty or whitespace-only. The length validator on
/// the payload only catches the empty string; "   " must fail too.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut error = ValidationError::new("name_required");
        error.message = Some("Name is required".into());
        return Err(error);
    }
    Ok(())
}
