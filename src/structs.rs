use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::collections::BTreeMap;

pub type Id = u64;

// Records as Canvas returns them. Only `id` and the display name/title are
// required; everything else is best-effort. Scores stay `Number` so `95` is
// written back as `95`, not `95.0`.

#[derive(Debug, Clone, Deserialize)]
pub struct RawCourse {
    pub id: Id,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub course_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAssignment {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub due_at: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub points_possible: Option<Number>,
    #[serde(default)]
    pub assignment_group_id: Option<Id>,
    #[serde(default)]
    pub submission: Option<RawSubmission>,
    #[serde(default)]
    pub locked_for_user: bool,
    #[serde(default)]
    pub can_submit: Option<bool>,
    #[serde(default)]
    pub submission_types: Vec<String>,
    #[serde(default)]
    pub lock_info: Option<LockInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSubmission {
    #[serde(default)]
    pub workflow_state: Option<String>,
    #[serde(default)]
    pub score: Option<Number>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAnnouncement {
    pub id: Id,
    pub title: String,
    #[serde(default)]
    pub posted_at: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub context_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlock_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_module: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manually_locked: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Course {
    pub id: Id,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    pub id: Id,
    pub name: String,
    pub course_id: Id,
    pub due_at: Option<String>,
    pub html_url: Option<String>,
    pub points_possible: Option<Number>,
    pub submission_status: String,
    pub assignment_group_id: Option<Id>,
    /// Only present once the submission has been graded with a score.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<Number>,
    pub locked_for_user: bool,
    pub can_submit: Option<bool>,
    pub submission_types: Vec<String>,
    pub lock_info: Option<LockInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Announcement {
    pub id: Id,
    pub title: String,
    pub posted_at: Option<String>,
    pub url: Option<String>,
    pub course_id: Id,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Entities {
    pub courses: BTreeMap<Id, Course>,
    pub assignments: BTreeMap<Id, Assignment>,
    pub announcements: BTreeMap<Id, Announcement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Views {
    pub upcoming_assignments: Vec<Id>,
    pub unsubmitted_assignments: Vec<Id>,
    pub assignments_by_course: BTreeMap<Id, Vec<Id>>,
    pub announcements_by_course: BTreeMap<Id, Vec<Id>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub report_generated_on: String,
    pub entities: Entities,
    pub views: Views,
}
