//! Domain models and their wire-shape decoding.
//!
//! Each resource comes in two layers: a `*Wire` struct that accepts
//! whatever the backend (or an older client shape) sends, with every
//! field optional, and the domain struct the rest of the crate works
//! with. Normalization is a total, pure mapping: aliases resolve by an
//! explicit precedence, absent booleans and numbers take defaults, and
//! feeding a serialized domain value back through the wire decode
//! produces an identical domain value.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// === Groups ===

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupWire {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub faculty: Option<String>,
    #[serde(default, alias = "year")]
    pub course_year: Option<u32>,
    #[serde(default)]
    pub leader_id: Option<i64>,
    #[serde(default)]
    pub contract_amount: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub students_count: Option<u32>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub faculty: String,
    pub course_year: u32,
    pub leader_id: Option<i64>,
    pub contract_amount: f64,
    pub description: Option<String>,
    pub students_count: u32,
    pub is_active: bool,
}

impl From<GroupWire> for Group {
    fn from(w: GroupWire) -> Self {
        Self {
            id: w.id,
            name: w.name.unwrap_or_default(),
            faculty: w.faculty.unwrap_or_default(),
            course_year: w.course_year.unwrap_or(1),
            leader_id: w.leader_id,
            contract_amount: w.contract_amount.unwrap_or(0.0),
            description: w.description,
            students_count: w.students_count.unwrap_or(0),
            is_active: w.is_active.unwrap_or(true),
        }
    }
}

// === Students ===

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentWire {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub contract_amount: Option<f64>,
    #[serde(default)]
    pub contract_paid: Option<f64>,
    #[serde(default)]
    pub is_leader: Option<bool>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Student {
    pub id: i64,
    pub student_id: String,
    pub name: String,
    pub group_id: Option<i64>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub birth_date: Option<String>,
    pub gender: Option<String>,
    pub contract_amount: f64,
    pub contract_paid: f64,
    pub is_leader: bool,
    pub is_active: bool,
}

impl From<StudentWire> for Student {
    fn from(w: StudentWire) -> Self {
        Self {
            id: w.id,
            student_id: w.student_id.unwrap_or_default(),
            // Older payloads carry the name as full_name; it wins when
            // both are present.
            name: w.full_name.or(w.name).unwrap_or_default(),
            group_id: w.group_id,
            phone: w.phone,
            email: w.email,
            birth_date: w.birth_date,
            gender: w.gender,
            contract_amount: w.contract_amount.unwrap_or(0.0),
            contract_paid: w.contract_paid.unwrap_or(0.0),
            is_leader: w.is_leader.unwrap_or(false),
            is_active: w.is_active.unwrap_or(true),
        }
    }
}

// === Attendance ===

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendanceRecordWire {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub student_id: Option<i64>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub lesson_number: Option<u32>,
    #[serde(default)]
    pub late_minutes: Option<u32>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttendanceRecord {
    pub id: i64,
    pub student_id: i64,
    pub date: String,
    pub status: String,
    pub subject: Option<String>,
    pub lesson_number: Option<u32>,
    pub late_minutes: u32,
    pub note: Option<String>,
}

impl From<AttendanceRecordWire> for AttendanceRecord {
    fn from(w: AttendanceRecordWire) -> Self {
        Self {
            id: w.id,
            student_id: w.student_id.unwrap_or(0),
            date: w.date.unwrap_or_default(),
            status: w.status.unwrap_or_else(|| "present".to_string()),
            subject: w.subject,
            lesson_number: w.lesson_number,
            late_minutes: w.late_minutes.unwrap_or(0),
            note: w.note,
        }
    }
}

// === Schedule ===

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleItemWire {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub day_of_week: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default, alias = "teacher")]
    pub teacher_name: Option<String>,
    #[serde(default)]
    pub lesson_number: Option<u32>,
    #[serde(default)]
    pub week_type: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleItem {
    pub id: i64,
    pub group_id: i64,
    pub subject: String,
    pub day_of_week: Option<String>,
    pub start_time: String,
    pub end_time: String,
    pub room: Option<String>,
    pub teacher_name: Option<String>,
    pub lesson_number: Option<u32>,
    pub week_type: String,
    pub is_active: bool,
}

impl From<ScheduleItemWire> for ScheduleItem {
    fn from(w: ScheduleItemWire) -> Self {
        Self {
            id: w.id,
            group_id: w.group_id.unwrap_or(0),
            subject: w.subject.unwrap_or_default(),
            day_of_week: w.day_of_week,
            start_time: w.start_time.unwrap_or_default(),
            end_time: w.end_time.unwrap_or_default(),
            room: w.room,
            teacher_name: w.teacher_name,
            lesson_number: w.lesson_number,
            week_type: w.week_type.unwrap_or_else(|| "every".to_string()),
            is_active: w.is_active.unwrap_or(true),
        }
    }
}

// === Notifications ===

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationWire {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default, alias = "read")]
    pub is_read: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: i64,
    pub user_id: Option<i64>,
    pub title: String,
    pub message: String,
    pub kind: String,
    pub priority: String,
    pub is_read: bool,
    pub created_at: Option<String>,
}

impl From<NotificationWire> for Notification {
    fn from(w: NotificationWire) -> Self {
        Self {
            id: w.id,
            user_id: w.user_id,
            title: w.title.unwrap_or_default(),
            message: w.message.unwrap_or_default(),
            kind: w.kind.unwrap_or_else(|| "info".to_string()),
            priority: w.priority.unwrap_or_else(|| "normal".to_string()),
            is_read: w.is_read.unwrap_or(false),
            created_at: w.created_at,
        }
    }
}

// === Reports ===

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportWire {
    #[serde(default)]
    pub id: i64,
    #[serde(default, alias = "name")]
    pub title: Option<String>,
    #[serde(default, alias = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub id: i64,
    pub title: String,
    pub kind: String,
    pub group_id: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: String,
    pub created_at: Option<String>,
}

impl From<ReportWire> for Report {
    fn from(w: ReportWire) -> Self {
        Self {
            id: w.id,
            title: w.title.unwrap_or_default(),
            kind: w.kind.unwrap_or_else(|| "attendance".to_string()),
            group_id: w.group_id,
            start_date: w.start_date,
            end_date: w.end_date,
            status: w.status.unwrap_or_else(|| "ready".to_string()),
            created_at: w.created_at,
        }
    }
}

// === Clubs ===

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClubWire {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub teacher: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub max_members: Option<u32>,
    #[serde(default)]
    pub members_count: Option<u32>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Club {
    pub id: i64,
    pub name: String,
    pub teacher: String,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub schedule: Option<String>,
    pub price: f64,
    pub room: Option<String>,
    pub category: String,
    pub max_members: u32,
    pub members_count: u32,
    pub is_active: bool,
}

impl From<ClubWire> for Club {
    fn from(w: ClubWire) -> Self {
        Self {
            id: w.id,
            name: w.name.unwrap_or_default(),
            teacher: w.teacher.unwrap_or_default(),
            phone: w.phone,
            description: w.description,
            schedule: w.schedule,
            price: w.price.unwrap_or(0.0),
            room: w.room,
            category: w.category.unwrap_or_else(|| "fan".to_string()),
            max_members: w.max_members.unwrap_or(30),
            members_count: w.members_count.unwrap_or(0),
            is_active: w.is_active.unwrap_or(true),
        }
    }
}

// === Subjects ===

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubjectWire {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub credits: Option<u32>,
    #[serde(default)]
    pub hours_per_week: Option<u32>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub code: Option<String>,
    pub description: Option<String>,
    pub credits: u32,
    pub hours_per_week: u32,
    pub is_active: bool,
}

impl From<SubjectWire> for Subject {
    fn from(w: SubjectWire) -> Self {
        Self {
            id: w.id,
            name: w.name.unwrap_or_default(),
            code: w.code,
            description: w.description,
            credits: w.credits.unwrap_or(0),
            hours_per_week: w.hours_per_week.unwrap_or(2),
            is_active: w.is_active.unwrap_or(true),
        }
    }
}

// === Directions ===

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectionWire {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration_years: Option<u32>,
    #[serde(default)]
    pub subject_ids: Vec<i64>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Direction {
    pub id: i64,
    pub name: String,
    pub code: Option<String>,
    pub description: Option<String>,
    pub duration_years: u32,
    pub subject_ids: Vec<i64>,
    pub is_active: bool,
}

impl From<DirectionWire> for Direction {
    fn from(w: DirectionWire) -> Self {
        Self {
            id: w.id,
            name: w.name.unwrap_or_default(),
            code: w.code,
            description: w.description,
            duration_years: w.duration_years.unwrap_or(4),
            subject_ids: w.subject_ids,
            is_active: w.is_active.unwrap_or(true),
        }
    }
}

// === Tournaments ===

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TournamentWire {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub registration_deadline: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub max_participants: Option<u32>,
    #[serde(default)]
    pub prize: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tournament {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub registration_deadline: Option<String>,
    pub location: Option<String>,
    pub max_participants: u32,
    pub prize: Option<String>,
    pub status: String,
    pub is_active: bool,
}

impl From<TournamentWire> for Tournament {
    fn from(w: TournamentWire) -> Self {
        Self {
            id: w.id,
            name: w.name.unwrap_or_default(),
            description: w.description,
            category: w.category.unwrap_or_else(|| "sport".to_string()),
            start_date: w.start_date,
            end_date: w.end_date,
            registration_deadline: w.registration_deadline,
            location: w.location,
            max_participants: w.max_participants.unwrap_or(100),
            prize: w.prize,
            status: w.status.unwrap_or_else(|| "upcoming".to_string()),
            is_active: w.is_active.unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TournamentRegistrationWire {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub tournament_id: Option<i64>,
    #[serde(default)]
    pub student_id: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub score: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TournamentRegistration {
    pub id: i64,
    pub tournament_id: i64,
    pub student_id: i64,
    pub status: String,
    pub position: Option<u32>,
    pub score: Option<i64>,
}

impl From<TournamentRegistrationWire> for TournamentRegistration {
    fn from(w: TournamentRegistrationWire) -> Self {
        Self {
            id: w.id,
            tournament_id: w.tournament_id.unwrap_or(0),
            student_id: w.student_id.unwrap_or(0),
            status: w.status.unwrap_or_else(|| "registered".to_string()),
            position: w.position,
            score: w.score,
        }
    }
}

// === Dashboard statistics ===

/// Dashboard counters; whatever extra the backend adds rides along in
/// `extra` instead of failing the decode.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardStats {
    #[serde(default)]
    pub total_students: u64,
    #[serde(default)]
    pub total_groups: u64,
    #[serde(default)]
    pub present_today: u64,
    #[serde(default)]
    pub absent_today: u64,
    #[serde(default, rename = "attendance_rate")]
    pub attendance_rate: f64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Decode one wire item leniently: a malformed element degrades to the
/// defaulted shape instead of failing the whole collection.
pub(crate) fn normalize_item<W, D>(value: Value) -> D
where
    W: for<'de> Deserialize<'de> + Default,
    D: From<W>,
{
    serde_json::from_value::<W>(value).unwrap_or_default().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn roundtrip<W, D>(domain: &D) -> D
    where
        W: for<'de> Deserialize<'de> + Default,
        D: From<W> + Serialize,
    {
        let value = serde_json::to_value(domain).unwrap();
        normalize_item::<W, D>(value)
    }

    #[test]
    fn student_name_precedence_and_defaults() {
        let s: Student = normalize_item::<StudentWire, _>(json!({
            "id": 5,
            "full_name": "Aziz Karimov",
            "name": "old alias",
            "group_id": 2
        }));
        assert_eq!(s.name, "Aziz Karimov");
        assert!(s.is_active);
        assert!(!s.is_leader);
        assert_eq!(s.contract_amount, 0.0);
    }

    #[test]
    fn student_normalization_is_idempotent() {
        let s: Student = normalize_item::<StudentWire, _>(json!({
            "id": 5,
            "student_id": "ST-2024-001",
            "full_name": "Aziz Karimov",
            "group_id": 2,
            "contract_amount": 12000000.0,
            "is_leader": true
        }));
        assert_eq!(roundtrip::<StudentWire, _>(&s), s);
    }

    #[test]
    fn group_aliases_and_idempotence() {
        let g: Group = normalize_item::<GroupWire, _>(json!({
            "id": 1, "name": "KI_25-04", "faculty": "CS", "year": 2
        }));
        assert_eq!(g.course_year, 2);
        assert!(g.is_active);
        assert_eq!(roundtrip::<GroupWire, _>(&g), g);
    }

    #[test]
    fn notification_read_alias() {
        let n: Notification = normalize_item::<NotificationWire, _>(json!({
            "id": 9, "title": "Exam", "message": "Tomorrow 9:00",
            "type": "warning", "read": true
        }));
        assert_eq!(n.kind, "warning");
        assert!(n.is_read);
        assert_eq!(roundtrip::<NotificationWire, _>(&n), n);
    }

    #[test]
    fn malformed_item_degrades_to_defaults() {
        let s: Student = normalize_item::<StudentWire, _>(json!("not an object"));
        assert_eq!(s.id, 0);
        assert!(s.is_active);
    }

    #[test]
    fn every_resource_roundtrips() {
        let club: Club = normalize_item::<ClubWire, _>(json!({"id": 1, "name": "Chess"}));
        assert_eq!(roundtrip::<ClubWire, _>(&club), club);

        let subject: Subject = normalize_item::<SubjectWire, _>(json!({"id": 2, "name": "Math"}));
        assert_eq!(roundtrip::<SubjectWire, _>(&subject), subject);

        let direction: Direction =
            normalize_item::<DirectionWire, _>(json!({"id": 3, "name": "SE"}));
        assert_eq!(roundtrip::<DirectionWire, _>(&direction), direction);

        let t: Tournament = normalize_item::<TournamentWire, _>(json!({"id": 4, "name": "Cup"}));
        assert_eq!(roundtrip::<TournamentWire, _>(&t), t);

        let r: TournamentRegistration = normalize_item::<TournamentRegistrationWire, _>(
            json!({"id": 5, "tournament_id": 4, "student_id": 1}),
        );
        assert_eq!(roundtrip::<TournamentRegistrationWire, _>(&r), r);

        let a: AttendanceRecord = normalize_item::<AttendanceRecordWire, _>(
            json!({"id": 6, "student_id": 1, "date": "2025-02-03", "status": "late"}),
        );
        assert_eq!(roundtrip::<AttendanceRecordWire, _>(&a), a);

        let item: ScheduleItem = normalize_item::<ScheduleItemWire, _>(
            json!({"id": 7, "group_id": 1, "subject": "Math", "teacher": "Karimova"}),
        );
        assert_eq!(item.teacher_name.as_deref(), Some("Karimova"));
        assert_eq!(roundtrip::<ScheduleItemWire, _>(&item), item);

        let report: Report = normalize_item::<ReportWire, _>(json!({"id": 8, "name": "Weekly"}));
        assert_eq!(report.title, "Weekly");
        assert_eq!(roundtrip::<ReportWire, _>(&report), report);
    }

    #[test]
    fn dashboard_stats_keeps_unknown_counters() {
        let stats: DashboardStats = serde_json::from_value(json!({
            "total_students": 310,
            "total_groups": 12,
            "library_loans": 44
        }))
        .unwrap();
        assert_eq!(stats.total_students, 310);
        assert_eq!(stats.extra["library_loans"], 44);
    }
}
