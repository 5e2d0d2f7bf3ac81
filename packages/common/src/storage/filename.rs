use super::error::StorageError;

/// Extension of an uploaded filename: everything after the last `.`.
///
/// A name without any `.` is returned whole, so `"photo"` yields `"photo"`.
pub fn extension_of(original_filename: &str) -> &str {
    original_filename
        .rsplit('.')
        .next()
        .unwrap_or(original_filename)
}

/// Canonical stored filename for a car image: `car_<id>.<ext>`.
pub fn car_image_filename(car_id: i32, original_filename: &str) -> Result<String, StorageError> {
    let filename = format!("car_{car_id}.{}", extension_of(original_filename));
    validate_flat_filename(&filename)?;
    Ok(filename)
}

/// Validates a flat filename (no directory components allowed).
pub fn validate_flat_filename(filename: &str) -> Result<&str, StorageError> {
    let invalid = |reason: &str| StorageError::InvalidFilename(format!("{filename:?}: {reason}"));

    if filename.trim().is_empty() {
        return Err(invalid("empty"));
    }
    if filename.contains('\0') || filename.chars().any(|c| c.is_ascii_control()) {
        return Err(invalid("control characters are not allowed"));
    }
    if filename.contains('/') || filename.contains('\\') {
        return Err(invalid("path separators are not allowed"));
    }
    if filename.contains("..") {
        return Err(invalid("'..' is not allowed"));
    }
    if filename.starts_with('.') {
        return Err(invalid("hidden files are not allowed"));
    }

    Ok(filename)
}

/// Strip the final extension from a file or path segment, if there is one.
pub fn strip_extension(segment: &str) -> &str {
    match segment.rfind('.') {
        Some(0) | None => segment,
        Some(idx) => &segment[..idx],
    }
}
