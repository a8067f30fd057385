use uuid::Uuid;

/// Random 128-bit hex name for uploads that were not given one.
pub fn random_filename() -> String {
    Uuid::new_v4().simple().to_string()
}

/// The multipart field needs a non-empty file name; it carries no meaning for
/// content addressing.
pub fn resolve_filename(filename: Option<&str>) -> String {
    match filename {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => random_filename(),
    }
}
