//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entity::{discipline::Discipline, enrollment::Enrollment};

// ============================================================================
// Join / Stop
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub discipline_id: Option<String>,
    #[serde(default)]
    pub replace_active: bool,
    pub confirmation_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    pub success: bool,
    /// Only present (and true) for the idempotent case
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub already_joined: bool,
    pub message: String,
    pub enrollment_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub replaced_discipline_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopRequest {
    pub discipline_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopResponse {
    pub success: bool,
    pub message: String,
}

// ============================================================================
// Queries
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentDto {
    pub id: String,
    pub discipline_id: String,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discipline: Option<DisciplineDto>,
}

impl EnrollmentDto {
    pub fn new(enrollment: &Enrollment, discipline: Option<&Discipline>) -> Self {
        Self {
            id: enrollment.enrollment_id.to_string(),
            discipline_id: enrollment.discipline_id.to_string(),
            started_at: enrollment.started_at,
            discipline: discipline.map(DisciplineDto::from),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveEnrollmentResponse {
    pub enrollment: Option<EnrollmentDto>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisciplineDto {
    pub id: String,
    pub slug: String,
    pub title: Option<String>,
    pub short_desc: Option<String>,
    pub long_desc: Option<String>,
    pub length_days: Option<i32>,
    pub subscribers: i64,
    pub tag: Option<String>,
    pub img_url: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<&Discipline> for DisciplineDto {
    fn from(d: &Discipline) -> Self {
        Self {
            id: d.discipline_id.to_string(),
            slug: d.slug.as_str().to_string(),
            title: d.title.clone(),
            short_desc: d.short_desc.clone(),
            long_desc: d.long_desc.clone(),
            length_days: d.length_days,
            subscribers: d.subscribers,
            tag: d.tag.clone(),
            img_url: d.img_url.clone(),
            metadata: d.metadata.clone(),
            created_at: d.created_at,
        }
    }
}

// ============================================================================
// Cron
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpireSubscriptionsResponse {
    pub updated: usize,
    pub ids: Vec<String>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_request_defaults() {
        let req: JoinRequest = serde_json::from_str(r#"{"disciplineId":"x"}"#).unwrap();
        assert!(!req.replace_active);
        assert!(req.confirmation_token.is_none());
    }

    #[test]
    fn test_join_response_shapes() {
        let already = JoinResponse {
            success: true,
            already_joined: true,
            message: "Already joined".into(),
            enrollment_id: "e".into(),
            replaced_discipline_ids: vec![],
        };
        let json = serde_json::to_value(&already).unwrap();
        assert_eq!(json["alreadyJoined"], true);
        assert!(json.get("replacedDisciplineIds").is_none());

        let joined = JoinResponse {
            already_joined: false,
            replaced_discipline_ids: vec!["d".into()],
            ..already
        };
        let json = serde_json::to_value(&joined).unwrap();
        assert!(json.get("alreadyJoined").is_none());
        assert_eq!(json["replacedDisciplineIds"][0], "d");
    }
}
