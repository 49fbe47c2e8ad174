use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{AppError, FieldError};

const TITLE_MAX_LEN: usize = 255;

/// Represents the status of a task.
/// Corresponds to the `todo_status` SQL enum. Any status may move to any other status.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(type_name = "todo_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Task is yet to be started.
    #[default]
    Pending,
    /// Task is currently being worked on.
    InProgress,
    /// Task is done.
    Completed,
    /// Task was abandoned.
    Cancelled,
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    /// Owning identity. Never changes after creation.
    pub creator_id: Uuid,
    /// Opaque encoded image (typically a base64 data URL), stored as given.
    pub image: Option<String>,
    pub end_datetime: Option<DateTime<Utc>>,
    /// Business creation time, stamped when the task is created through the API.
    pub create_datetime: DateTime<Utc>,
    /// Timestamp of when the record was inserted.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last write to the record.
    pub updated_at: DateTime<Utc>,
}

/// A task ready to be inserted; the store fills in the record timestamps.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub creator_id: Uuid,
    pub image: Option<String>,
    pub end_datetime: Option<DateTime<Utc>>,
    pub create_datetime: DateTime<Utc>,
}

/// Payload of `POST /todos`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskInput {
    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    pub title: String,
    pub description: Option<String>,
    /// Defaults to `PENDING` when omitted.
    pub status: Option<TaskStatus>,
    pub image: Option<String>,
    #[validate(custom = "validate_end_datetime")]
    pub end_datetime: Option<String>,
}

/// Payload of `PATCH /todos/{id}`.
///
/// Nullable fields are tri-state: absent leaves the stored value alone,
/// `null` clears it, a value replaces it.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskInput {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    #[serde(default, deserialize_with = "present")]
    pub image: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub end_datetime: Option<Option<String>>,
}

/// Payload of `PATCH /todos/{id}/status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateStatusInput {
    pub status: TaskStatus,
}

// Marks a field that appeared in the payload, even as `null`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Parses the date-time formats accepted for `endDatetime`:
/// RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.fff]` read as UTC, or a bare date at UTC midnight.
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn validate_end_datetime(value: &str) -> Result<(), ValidationError> {
    match parse_datetime(value) {
        Some(_) => Ok(()),
        None => {
            let mut error = ValidationError::new("datetime");
            error.message = Some("must be a valid ISO 8601 date-time".into());
            Err(error)
        }
    }
}

fn parse_end_datetime(value: Option<&str>) -> Result<Option<DateTime<Utc>>, AppError> {
    match value {
        None => Ok(None),
        Some(raw) => parse_datetime(raw).map(Some).ok_or_else(|| {
            AppError::ValidationError(vec![FieldError {
                field: "endDatetime".to_string(),
                message: "must be a valid ISO 8601 date-time".to_string(),
            }])
        }),
    }
}

impl Validate for UpdateTaskInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(title) = &self.title {
            let len = title.chars().count();
            if len == 0 || len > TITLE_MAX_LEN {
                let mut error = ValidationError::new("length");
                error.message = Some("must be between 1 and 255 characters".into());
                errors.add("title", error);
            }
        }
        if let Some(Some(end_datetime)) = &self.end_datetime {
            if let Err(error) = validate_end_datetime(end_datetime) {
                errors.add("end_datetime", error);
            }
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl NewTask {
    /// Builds the record for a task created by `creator_id`.
    /// `status` defaults to `PENDING` and `endDatetime` is stored as a timestamp.
    pub fn from_input(input: CreateTaskInput, creator_id: Uuid) -> Result<Self, AppError> {
        let end_datetime = parse_end_datetime(input.end_datetime.as_deref())?;
        Ok(Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            status: input.status.unwrap_or_default(),
            creator_id,
            image: input.image,
            end_datetime,
            create_datetime: Utc::now(),
        })
    }
}

impl Task {
    /// Applies the fields present in `changes`, leaving every other field as it was.
    pub fn apply(&mut self, changes: UpdateTaskInput) -> Result<(), AppError> {
        if let Some(end_datetime) = changes.end_datetime {
            self.end_datetime = parse_end_datetime(end_datetime.as_deref())?;
        }
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(image) = changes.image {
            self.image = image;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample_task() -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            title: "buy milk".to_string(),
            description: Some("two litres".to_string()),
            status: TaskStatus::Pending,
            creator_id: Uuid::new_v4(),
            image: Some("data:image/png;base64,iVBORw0KGgo=".to_string()),
            end_datetime: parse_datetime("2024-12-31T23:59:59Z"),
            create_datetime: now,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_task_creation_defaults_to_pending() {
        let input: CreateTaskInput = serde_json::from_value(json!({ "title": "buy milk" })).unwrap();
        let creator = Uuid::new_v4();

        let task = NewTask::from_input(input, creator).unwrap();
        assert_eq!(task.title, "buy milk");
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.creator_id, creator);
        assert!(task.end_datetime.is_none());
    }

    #[test]
    fn test_task_creation_parses_end_datetime() {
        let input: CreateTaskInput = serde_json::from_value(json!({
            "title": "ship it",
            "status": "IN_PROGRESS",
            "endDatetime": "2024-12-31T23:59:59+02:00"
        }))
        .unwrap();

        let task = NewTask::from_input(input, Uuid::new_v4()).unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(
            task.end_datetime.unwrap().to_rfc3339(),
            "2024-12-31T21:59:59+00:00"
        );
    }

    #[test]
    fn test_task_validation() {
        let valid: CreateTaskInput = serde_json::from_value(json!({
            "title": "Valid Task",
            "endDatetime": "2024-12-31"
        }))
        .unwrap();
        assert!(valid.validate().is_ok());

        let empty_title: CreateTaskInput = serde_json::from_value(json!({ "title": "" })).unwrap();
        assert!(empty_title.validate().is_err());

        let long_title: CreateTaskInput =
            serde_json::from_value(json!({ "title": "a".repeat(256) })).unwrap();
        assert!(long_title.validate().is_err());

        let bad_date: CreateTaskInput = serde_json::from_value(json!({
            "title": "Valid Task",
            "endDatetime": "next tuesday"
        }))
        .unwrap();
        let errors = bad_date.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("end_datetime"));
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let result = serde_json::from_value::<CreateTaskInput>(json!({
            "title": "x",
            "status": "DONE"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_update_input_distinguishes_null_from_absent() {
        let input: UpdateTaskInput =
            serde_json::from_value(json!({ "description": null, "title": "renamed" })).unwrap();
        assert_eq!(input.description, Some(None));
        assert_eq!(input.image, None);
        assert_eq!(input.end_datetime, None);
        assert_eq!(input.title.as_deref(), Some("renamed"));
    }

    #[test]
    fn test_update_validation() {
        let ok: UpdateTaskInput = serde_json::from_value(json!({ "endDatetime": null })).unwrap();
        assert!(ok.validate().is_ok());

        let empty_title: UpdateTaskInput = serde_json::from_value(json!({ "title": "" })).unwrap();
        assert!(empty_title.validate().is_err());

        let bad_date: UpdateTaskInput =
            serde_json::from_value(json!({ "endDatetime": "31/12/2024" })).unwrap();
        assert!(bad_date.validate().is_err());
    }

    #[test]
    fn test_apply_only_touches_present_fields() {
        let original = sample_task();
        let mut task = original.clone();

        let changes: UpdateTaskInput =
            serde_json::from_value(json!({ "title": "buy oat milk" })).unwrap();
        task.apply(changes).unwrap();

        assert_eq!(task.title, "buy oat milk");
        assert_eq!(task.description, original.description);
        assert_eq!(task.image, original.image);
        assert_eq!(task.end_datetime, original.end_datetime);
        assert_eq!(task.status, original.status);
    }

    #[test]
    fn test_apply_clears_nullable_fields() {
        let mut task = sample_task();

        let changes: UpdateTaskInput = serde_json::from_value(json!({
            "description": null,
            "image": null,
            "endDatetime": null
        }))
        .unwrap();
        task.apply(changes).unwrap();

        assert_eq!(task.description, None);
        assert_eq!(task.image, None);
        assert_eq!(task.end_datetime, None);
        assert_eq!(task.title, "buy milk");
    }

    #[test]
    fn test_apply_rejects_bad_end_datetime_without_partial_writes() {
        let original = sample_task();
        let mut task = original.clone();

        let changes: UpdateTaskInput = serde_json::from_value(json!({
            "title": "changed",
            "endDatetime": "not a date"
        }))
        .unwrap();

        assert!(matches!(task.apply(changes), Err(AppError::ValidationError(_))));
        assert_eq!(task, original);
    }

    #[test]
    fn test_parse_datetime_formats() {
        assert!(parse_datetime("2024-12-31T23:59:59Z").is_some());
        assert!(parse_datetime("2024-12-31T23:59:59.123Z").is_some());
        assert!(parse_datetime("2024-12-31T23:59:59").is_some());
        assert_eq!(
            parse_datetime("2024-12-31").map(|d| d.to_rfc3339()),
            Some("2024-12-31T00:00:00+00:00".to_string())
        );
        assert!(parse_datetime("2024-13-01").is_none());
        assert!(parse_datetime("").is_none());
    }

    #[test]
    fn test_task_serializes_camel_case() {
        let json = serde_json::to_value(sample_task()).unwrap();
        for key in [
            "id",
            "title",
            "description",
            "status",
            "creatorId",
            "image",
            "endDatetime",
            "createDatetime",
            "createdAt",
            "updatedAt",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(json["status"], "PENDING");
    }
}
