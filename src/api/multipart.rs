//! Multipart form collection
//!
//! Registration and listing forms mix text fields with file parts. The whole
//! stream is buffered up front so every field can be validated before any
//! byte reaches storage or the database.

use axum::extract::Multipart;
use std::collections::HashMap;

use crate::error::{ApiError, ApiResult};

/// One buffered file part
#[derive(Debug, Clone)]
pub struct FormFile {
    /// Form field the file arrived under
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A fully buffered multipart submission
#[derive(Debug, Default)]
pub struct CollectedForm {
    fields: HashMap<String, String>,
    files: Vec<FormFile>,
}

impl CollectedForm {
    /// Drain the multipart stream, enforcing the total submission size cap.
    pub async fn read(mut multipart: Multipart, max_total_bytes: usize) -> ApiResult<Self> {
        let mut form = Self::default();
        let mut total_bytes = 0usize;

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            ApiError::bad_request(format!("Malformed multipart request: {}", e))
        })? {
            let name = match field.name() {
                Some(name) => name.to_string(),
                None => continue,
            };

            if let Some(file_name) = field.file_name().map(str::to_string) {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::bad_request(format!("Failed to read file '{}': {}", name, e))
                })?;

                total_bytes += bytes.len();
                if total_bytes > max_total_bytes {
                    return Err(ApiError::bad_request(format!(
                        "Upload exceeds the {} MB submission limit",
                        max_total_bytes / (1024 * 1024)
                    )));
                }

                form.files.push(FormFile {
                    field: name,
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            } else {
                let value = field.text().await.map_err(|e| {
                    ApiError::bad_request(format!("Failed to read field '{}': {}", name, e))
                })?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Required text field, trimmed; empty counts as missing
    pub fn require(&self, name: &str) -> ApiResult<String> {
        self.text(name)
            .ok_or_else(|| ApiError::bad_request(format!("Missing required field '{}'", name)))
    }

    /// Optional text field, trimmed; empty reads as absent
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// All files submitted under a field name, in arrival order
    pub fn files(&self, field: &str) -> Vec<&FormFile> {
        self.files.iter().filter(|f| f.field == field).collect()
    }

    /// Exactly one file under a field name
    pub fn file(&self, field: &str) -> ApiResult<&FormFile> {
        let mut matches = self.files.iter().filter(|f| f.field == field);
        let file = matches
            .next()
            .ok_or_else(|| ApiError::bad_request(format!("Missing required file '{}'", field)))?;
        if matches.next().is_some() {
            return Err(ApiError::bad_request(format!(
                "Expected a single file for '{}'",
                field
            )));
        }
        Ok(file)
    }
}

/// Reject empty files and unexpected content types before anything is stored
pub fn validate_file(file: &FormFile, allowed_prefixes: &[&str]) -> ApiResult<()> {
    if file.bytes.is_empty() {
        return Err(ApiError::bad_request(format!(
            "File '{}' is empty",
            file.file_name
        )));
    }
    if !allowed_prefixes
        .iter()
        .any(|prefix| file.content_type.starts_with(prefix))
    {
        return Err(ApiError::bad_request(format!(
            "Unsupported file type '{}' for '{}'",
            file.content_type, file.file_name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_with(fields: &[(&str, &str)], files: Vec<FormFile>) -> CollectedForm {
        CollectedForm {
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            files,
        }
    }

    fn image(field: &str, name: &str) -> FormFile {
        FormFile {
            field: field.to_string(),
            file_name: name.to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![1, 2, 3],
        }
    }

    #[test]
    fn text_fields_are_trimmed_and_blank_reads_as_absent() {
        let form = form_with(&[("city", "  Pune  "), ("state", "   ")], vec![]);
        assert_eq!(form.text("city").as_deref(), Some("Pune"));
        assert_eq!(form.text("state"), None);
        assert!(form.require("state").is_err());
        assert!(form.require("missing").is_err());
    }

    #[test]
    fn single_file_lookup_rejects_duplicates() {
        let form = form_with(
            &[],
            vec![image("profile_photo", "a.jpg"), image("profile_photo", "b.jpg")],
        );
        assert!(form.file("profile_photo").is_err());

        let form = form_with(&[], vec![image("profile_photo", "a.jpg")]);
        assert_eq!(form.file("profile_photo").unwrap().file_name, "a.jpg");
    }

    #[test]
    fn files_preserve_arrival_order() {
        let form = form_with(
            &[],
            vec![
                image("images", "one.jpg"),
                image("documents", "deed.pdf"),
                image("images", "two.jpg"),
            ],
        );
        let names: Vec<_> = form.files("images").iter().map(|f| &f.file_name).collect();
        assert_eq!(names, ["one.jpg", "two.jpg"]);
    }

    #[test]
    fn file_validation_checks_emptiness_and_type() {
        let mut file = image("images", "a.jpg");
        assert!(validate_file(&file, &["image/"]).is_ok());
        assert!(validate_file(&file, &["application/pdf"]).is_err());
        file.bytes.clear();
        assert!(validate_file(&file, &["image/"]).is_err());
    }
}
