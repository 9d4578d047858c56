use crate::structs::{Announcement, Assignment, Id, RawAnnouncement, RawAssignment};

use chrono::{DateTime, Utc};
use log::warn;

pub const NOT_SUBMITTED: &str = "Not Submitted";

/// Where an assignment lands in the temporal views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeline {
    Submitted,
    Upcoming,
    Overdue,
    /// Unsubmitted but without a usable due date; in neither view.
    Undated,
}

/// `pending_review` -> `Pending Review`
pub fn status_label(workflow_state: &str) -> String {
    workflow_state
        .replace('_', " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

pub fn normalize_assignment(
    raw: RawAssignment,
    course_id: Id,
    now: DateTime<Utc>,
) -> (Assignment, Timeline) {
    let mut submission_status = NOT_SUBMITTED.to_owned();
    let mut grade = None;

    if let Some(submission) = &raw.submission {
        if let Some(state) = submission.workflow_state.as_deref() {
            if state != "unsubmitted" {
                submission_status = status_label(state);
                if state == "graded" {
                    grade = submission.score.clone();
                }
            }
        }
    }

    let timeline = if submission_status != NOT_SUBMITTED {
        Timeline::Submitted
    } else {
        match raw.due_at.as_deref() {
            None => Timeline::Undated,
            Some(due_at) => match parse_timestamp(due_at) {
                Some(due) if due > now => Timeline::Upcoming,
                Some(_) => Timeline::Overdue,
                None => {
                    warn!(
                        "assignment {} has unreadable due date {:?}; leaving it out of the upcoming/overdue views",
                        raw.id, due_at
                    );
                    Timeline::Undated
                }
            },
        }
    };

    let assignment = Assignment {
        id: raw.id,
        name: raw.name,
        course_id,
        due_at: raw.due_at,
        html_url: raw.html_url,
        points_possible: raw.points_possible,
        submission_status,
        assignment_group_id: raw.assignment_group_id,
        grade,
        locked_for_user: raw.locked_for_user,
        can_submit: raw.can_submit,
        submission_types: raw.submission_types,
        lock_info: raw.lock_info,
    };
    (assignment, timeline)
}

/// `course_4521` -> `Some(4521)`. Any other context type, or a malformed
/// code, yields `None`.
pub fn course_id_from_context(context_code: &str) -> Option<Id> {
    let (kind, id) = context_code.split_once('_')?;
    if kind != "course" {
        return None;
    }
    id.parse().ok()
}

/// `None` when the announcement does not belong to a course context.
pub fn normalize_announcement(raw: RawAnnouncement) -> Option<Announcement> {
    let course_id = raw.context_code.as_deref().and_then(course_id_from_context)?;
    Some(Announcement {
        id: raw.id,
        title: raw.title,
        posted_at: raw.posted_at,
        url: raw.url,
        course_id,
    })
}
