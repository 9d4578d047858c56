use crate::error::Result;
use crate::fetch::{CanvasApi, Transport};
use crate::normalize::{normalize_announcement, normalize_assignment, Timeline};
use crate::structs::{
    Course, Entities, Id, RawAnnouncement, RawAssignment, RawCourse, Report, Views,
};

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Accumulates entities and views for one run. Every id placed in a view
/// refers to an entity added through the same builder.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    entities: Entities,
    views: Views,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_course(&mut self, raw: &RawCourse) -> Id {
        let name = match (&raw.name, &raw.course_code) {
            (Some(name), _) if !name.trim().is_empty() => name.clone(),
            (_, Some(code)) if !code.trim().is_empty() => code.clone(),
            _ => format!("Course {}", raw.id),
        };
        self.entities
            .courses
            .insert(raw.id, Course { id: raw.id, name });
        self.views.assignments_by_course.entry(raw.id).or_default();
        self.views.announcements_by_course.entry(raw.id).or_default();
        raw.id
    }

    pub fn add_assignment(&mut self, raw: RawAssignment, course_id: Id, now: DateTime<Utc>) {
        let (assignment, timeline) = normalize_assignment(raw, course_id, now);
        let id = assignment.id;
        self.entities.assignments.insert(id, assignment);
        self.views
            .assignments_by_course
            .entry(course_id)
            .or_default()
            .push(id);
        match timeline {
            Timeline::Upcoming => self.views.upcoming_assignments.push(id),
            Timeline::Overdue => self.views.unsubmitted_assignments.push(id),
            Timeline::Submitted | Timeline::Undated => {}
        }
    }

    /// Returns false when the announcement was skipped.
    pub fn add_announcement(&mut self, raw: RawAnnouncement) -> bool {
        let id = raw.id;
        let context = raw.context_code.clone();
        let Some(announcement) = normalize_announcement(raw) else {
            warn!("skipping announcement {id}: context {context:?} is not a course");
            return false;
        };
        if !self.entities.courses.contains_key(&announcement.course_id) {
            warn!(
                "skipping announcement {id}: course {} is not a favorite",
                announcement.course_id
            );
            return false;
        }
        self.views
            .announcements_by_course
            .entry(announcement.course_id)
            .or_default()
            .push(id);
        self.entities.announcements.insert(id, announcement);
        true
    }

    pub fn finish(self, generated_on: DateTime<Utc>) -> Report {
        Report {
            report_generated_on: generated_on.to_rfc3339(),
            entities: self.entities,
            views: self.views,
        }
    }
}

/// Fetches favorites, their assignments and announcements, and normalizes
/// them. `now` is the single cutoff for the upcoming/overdue split.
pub async fn collect<C: Transport>(api: &CanvasApi<C>, now: DateTime<Utc>) -> Result<Report> {
    let courses = api.favorite_courses().await?;
    if courses.is_empty() {
        warn!("no favorite courses found; the report will be empty");
    }

    let mut builder = ReportBuilder::new();
    let mut course_ids = Vec::with_capacity(courses.len());

    for course in &courses {
        let course_id = builder.add_course(course);
        info!(
            "Processing course: {} (ID: {course_id})",
            builder.entities.courses[&course_id].name
        );
        for assignment in api.assignments(course_id).await? {
            builder.add_assignment(assignment, course_id, now);
        }
        course_ids.push(course_id);
    }

    info!("Fetching announcements for {} courses", course_ids.len());
    for announcement in api.announcements(&course_ids).await? {
        builder.add_announcement(announcement);
    }

    Ok(builder.finish(Utc::now()))
}

/// Serializes `report` next to `path` and renames it into place, so `path`
/// either keeps its previous contents or holds the complete new report.
pub fn write_report(report: &Report, path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(file.as_file_mut());
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
        report.serialize(&mut serializer)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
    file.persist(path).map_err(|err| err.error)?;
    Ok(())
}
