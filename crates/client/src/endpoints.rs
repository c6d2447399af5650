//! Thin typed wrappers over the request executor for the backend's
//! resource surface. Every wrapper returns the wire-level JSON value;
//! list envelopes are decoded by the caller, which also owns
//! normalization.

use crate::http::{ApiClient, QueryParams, RequestOptions};
use bytes::Bytes;
use common::ApiResult;
use serde_json::Value;

impl ApiClient {
    // === Groups ===

    pub async fn get_groups(&self, params: QueryParams) -> ApiResult<Value> {
        self.request_value("/groups", RequestOptions::get().with_query(params))
            .await
    }

    pub async fn get_group(&self, id: i64) -> ApiResult<Value> {
        self.request_value(&format!("/groups/{id}"), RequestOptions::get())
            .await
    }

    pub async fn create_group(&self, data: Value) -> ApiResult<Value> {
        self.request_value("/groups", RequestOptions::post().with_json(data))
            .await
    }

    pub async fn update_group(&self, id: i64, data: Value) -> ApiResult<Value> {
        self.request_value(&format!("/groups/{id}"), RequestOptions::put().with_json(data))
            .await
    }

    pub async fn delete_group(&self, id: i64) -> ApiResult<Value> {
        self.request_value(&format!("/groups/{id}"), RequestOptions::delete())
            .await
    }

    pub async fn toggle_group_status(&self, id: i64) -> ApiResult<Value> {
        self.request_value(&format!("/groups/{id}/toggle-status"), RequestOptions::patch())
            .await
    }

    /// The backend takes the leader as a query parameter, not a body.
    pub async fn assign_group_leader(&self, group_id: i64, student_id: i64) -> ApiResult<Value> {
        self.request_value(
            &format!("/groups/{group_id}/set-leader"),
            RequestOptions::post().with_query(QueryParams::new().set("leader_id", Some(student_id))),
        )
        .await
    }

    /// Calling set-leader without a leader clears the assignment.
    pub async fn remove_group_leader(&self, group_id: i64) -> ApiResult<Value> {
        self.request_value(&format!("/groups/{group_id}/set-leader"), RequestOptions::post())
            .await
    }

    pub async fn get_group_students(&self, group_id: i64) -> ApiResult<Value> {
        self.request_value(&format!("/groups/{group_id}/students"), RequestOptions::get())
            .await
    }

    // === Students ===

    pub async fn get_students(&self, params: QueryParams) -> ApiResult<Value> {
        self.request_value("/students", RequestOptions::get().with_query(params))
            .await
    }

    pub async fn get_student(&self, id: i64) -> ApiResult<Value> {
        self.request_value(&format!("/students/{id}"), RequestOptions::get())
            .await
    }

    pub async fn create_student(&self, data: Value) -> ApiResult<Value> {
        self.request_value("/students", RequestOptions::post().with_json(data))
            .await
    }

    pub async fn update_student(&self, id: i64, data: Value) -> ApiResult<Value> {
        self.request_value(&format!("/students/{id}"), RequestOptions::put().with_json(data))
            .await
    }

    pub async fn delete_student(&self, id: i64) -> ApiResult<Value> {
        self.request_value(&format!("/students/{id}"), RequestOptions::delete())
            .await
    }

    pub async fn update_student_contract(&self, id: i64, paid_amount: f64) -> ApiResult<Value> {
        self.request_value(
            &format!("/students/{id}/contract"),
            RequestOptions::patch().with_json(serde_json::json!({"paid_amount": paid_amount})),
        )
        .await
    }

    // === Schedule ===

    pub async fn get_schedules(&self, params: QueryParams) -> ApiResult<Value> {
        self.request_value("/schedule", RequestOptions::get().with_query(params))
            .await
    }

    pub async fn create_schedule(&self, data: Value) -> ApiResult<Value> {
        self.request_value("/schedule", RequestOptions::post().with_json(data))
            .await
    }

    pub async fn update_schedule(&self, id: i64, data: Value) -> ApiResult<Value> {
        self.request_value(&format!("/schedule/{id}"), RequestOptions::put().with_json(data))
            .await
    }

    pub async fn delete_schedule(&self, id: i64) -> ApiResult<Value> {
        self.request_value(&format!("/schedule/{id}"), RequestOptions::delete())
            .await
    }

    pub async fn get_schedule_by_group(&self, group_id: i64) -> ApiResult<Value> {
        self.request_value(&format!("/schedule/group/{group_id}/week"), RequestOptions::get())
            .await
    }

    pub async fn get_today_schedule(&self, group_id: Option<i64>) -> ApiResult<Value> {
        self.request_value(
            "/schedule/today",
            RequestOptions::get().with_query(QueryParams::new().set("group_id", group_id)),
        )
        .await
    }

    // === Attendance ===

    pub async fn get_attendance(&self, params: QueryParams) -> ApiResult<Value> {
        self.request_value("/attendance", RequestOptions::get().with_query(params))
            .await
    }

    pub async fn create_attendance(&self, data: Value) -> ApiResult<Value> {
        self.request_value("/attendance", RequestOptions::post().with_json(data))
            .await
    }

    pub async fn update_attendance(&self, id: i64, data: Value) -> ApiResult<Value> {
        self.request_value(&format!("/attendance/{id}"), RequestOptions::put().with_json(data))
            .await
    }

    pub async fn get_attendance_by_date(&self, date: &str, group_id: Option<i64>) -> ApiResult<Value> {
        self.request_value(
            &format!("/attendance/date/{date}"),
            RequestOptions::get().with_query(QueryParams::new().set("group_id", group_id)),
        )
        .await
    }

    pub async fn bulk_create_attendance(&self, records: Value) -> ApiResult<Value> {
        self.request_value("/attendance/batch", RequestOptions::post().with_json(records))
            .await
    }

    pub async fn get_attendance_statistics(
        &self,
        group_id: i64,
        start_date: &str,
        end_date: &str,
    ) -> ApiResult<Value> {
        self.request_value(
            &format!("/attendance/statistics/{group_id}"),
            RequestOptions::get().with_query(
                QueryParams::new()
                    .set("start_date", Some(start_date))
                    .set("end_date", Some(end_date)),
            ),
        )
        .await
    }

    // === Notifications ===

    pub async fn get_notifications(&self, params: QueryParams) -> ApiResult<Value> {
        self.request_value("/notifications", RequestOptions::get().with_query(params))
            .await
    }

    pub async fn create_notification(&self, data: Value) -> ApiResult<Value> {
        self.request_value("/notifications", RequestOptions::post().with_json(data))
            .await
    }

    pub async fn mark_notification_read(&self, id: i64) -> ApiResult<Value> {
        self.request_value(&format!("/notifications/{id}/read"), RequestOptions::post())
            .await
    }

    pub async fn mark_all_notifications_read(&self) -> ApiResult<Value> {
        self.request_value("/notifications/read-all", RequestOptions::post())
            .await
    }

    pub async fn delete_notification(&self, id: i64) -> ApiResult<Value> {
        self.request_value(&format!("/notifications/{id}"), RequestOptions::delete())
            .await
    }

    pub async fn get_unread_notification_count(&self) -> ApiResult<Value> {
        self.request_value("/notifications/unread-count", RequestOptions::get())
            .await
    }

    // === Reports ===

    pub async fn get_reports(&self, params: QueryParams) -> ApiResult<Value> {
        self.request_value("/reports", RequestOptions::get().with_query(params))
            .await
    }

    pub async fn create_report(&self, data: Value) -> ApiResult<Value> {
        self.request_value("/reports", RequestOptions::post().with_json(data))
            .await
    }

    pub async fn delete_report(&self, id: i64) -> ApiResult<Value> {
        self.request_value(&format!("/reports/{id}"), RequestOptions::delete())
            .await
    }

    pub async fn generate_report(
        &self,
        r#type: &str,
        group_id: i64,
        start_date: &str,
        end_date: &str,
    ) -> ApiResult<Value> {
        self.request_value(
            "/reports/generate",
            RequestOptions::post().with_json(serde_json::json!({
                "type": r#type,
                "group_id": group_id,
                "start_date": start_date,
                "end_date": end_date,
            })),
        )
        .await
    }

    // === Clubs ===

    pub async fn get_clubs(&self, params: QueryParams) -> ApiResult<Value> {
        self.request_value("/clubs", RequestOptions::get().with_query(params))
            .await
    }

    pub async fn create_club(&self, data: Value) -> ApiResult<Value> {
        self.request_value("/clubs", RequestOptions::post().with_json(data))
            .await
    }

    pub async fn update_club(&self, id: i64, data: Value) -> ApiResult<Value> {
        self.request_value(&format!("/clubs/{id}"), RequestOptions::put().with_json(data))
            .await
    }

    pub async fn delete_club(&self, id: i64) -> ApiResult<Value> {
        self.request_value(&format!("/clubs/{id}"), RequestOptions::delete())
            .await
    }

    pub async fn toggle_club_status(&self, id: i64) -> ApiResult<Value> {
        self.request_value(&format!("/clubs/{id}/toggle-status"), RequestOptions::patch())
            .await
    }

    // === Subjects ===

    pub async fn get_subjects(&self, params: QueryParams) -> ApiResult<Value> {
        self.request_value("/subjects", RequestOptions::get().with_query(params))
            .await
    }

    pub async fn create_subject(&self, data: Value) -> ApiResult<Value> {
        self.request_value("/subjects", RequestOptions::post().with_json(data))
            .await
    }

    pub async fn update_subject(&self, id: i64, data: Value) -> ApiResult<Value> {
        self.request_value(&format!("/subjects/{id}"), RequestOptions::put().with_json(data))
            .await
    }

    pub async fn delete_subject(&self, id: i64) -> ApiResult<Value> {
        self.request_value(&format!("/subjects/{id}"), RequestOptions::delete())
            .await
    }

    // === Directions ===

    pub async fn get_directions(&self, params: QueryParams) -> ApiResult<Value> {
        self.request_value("/directions", RequestOptions::get().with_query(params))
            .await
    }

    pub async fn create_direction(&self, data: Value) -> ApiResult<Value> {
        self.request_value("/directions", RequestOptions::post().with_json(data))
            .await
    }

    pub async fn update_direction(&self, id: i64, data: Value) -> ApiResult<Value> {
        self.request_value(&format!("/directions/{id}"), RequestOptions::put().with_json(data))
            .await
    }

    pub async fn delete_direction(&self, id: i64) -> ApiResult<Value> {
        self.request_value(&format!("/directions/{id}"), RequestOptions::delete())
            .await
    }

    pub async fn toggle_direction_status(&self, id: i64) -> ApiResult<Value> {
        self.request_value(&format!("/directions/{id}/toggle-status"), RequestOptions::patch())
            .await
    }

    pub async fn update_direction_subjects(
        &self,
        direction_id: i64,
        subject_ids: &[i64],
    ) -> ApiResult<Value> {
        self.request_value(
            &format!("/directions/{direction_id}/subjects"),
            RequestOptions::put().with_json(serde_json::json!({"subject_ids": subject_ids})),
        )
        .await
    }

    // === Tournaments ===

    pub async fn get_tournaments(&self, params: QueryParams) -> ApiResult<Value> {
        self.request_value("/tournaments", RequestOptions::get().with_query(params))
            .await
    }

    pub async fn create_tournament(&self, data: Value) -> ApiResult<Value> {
        self.request_value("/tournaments", RequestOptions::post().with_json(data))
            .await
    }

    pub async fn update_tournament(&self, id: i64, data: Value) -> ApiResult<Value> {
        self.request_value(&format!("/tournaments/{id}"), RequestOptions::put().with_json(data))
            .await
    }

    pub async fn delete_tournament(&self, id: i64) -> ApiResult<Value> {
        self.request_value(&format!("/tournaments/{id}"), RequestOptions::delete())
            .await
    }

    pub async fn toggle_tournament_status(&self, id: i64) -> ApiResult<Value> {
        self.request_value(&format!("/tournaments/{id}/toggle-status"), RequestOptions::patch())
            .await
    }

    pub async fn get_tournament_participants(&self, tournament_id: i64) -> ApiResult<Value> {
        self.request_value(
            &format!("/tournaments/{tournament_id}/participants"),
            RequestOptions::get(),
        )
        .await
    }

    pub async fn register_for_tournament(
        &self,
        tournament_id: i64,
        student_id: i64,
    ) -> ApiResult<Value> {
        self.request_value(
            &format!("/tournaments/{tournament_id}/register"),
            RequestOptions::post().with_json(serde_json::json!({"student_id": student_id})),
        )
        .await
    }

    pub async fn unregister_from_tournament(
        &self,
        tournament_id: i64,
        student_id: i64,
    ) -> ApiResult<Value> {
        self.request_value(
            &format!("/tournaments/{tournament_id}/unregister"),
            RequestOptions::post().with_json(serde_json::json!({"student_id": student_id})),
        )
        .await
    }

    pub async fn update_registration_status(
        &self,
        tournament_id: i64,
        registration_id: i64,
        status: &str,
    ) -> ApiResult<Value> {
        self.request_value(
            &format!("/tournaments/{tournament_id}/registrations/{registration_id}/status"),
            RequestOptions::patch().with_query(QueryParams::new().set("status", Some(status))),
        )
        .await
    }

    // === Statistics ===

    pub async fn get_dashboard_stats(&self) -> ApiResult<Value> {
        self.request_value("/statistics/dashboard", RequestOptions::get())
            .await
    }

    // === Excel ===

    /// Binary spreadsheet export; `kind` selects the backend exporter
    /// (`students`, `groups`, `attendance`, ...).
    pub async fn export_to_excel(&self, kind: &str, params: QueryParams) -> ApiResult<Bytes> {
        self.request_bytes(
            &format!("/excel/export/{kind}"),
            RequestOptions::get().with_query(params),
        )
        .await
    }

    /// Multipart spreadsheet import. The file is provided as a factory
    /// so the transparent 401 retry can rebuild the upload.
    pub async fn import_from_excel(
        &self,
        form: impl Fn() -> reqwest::multipart::Form + Send + Sync + 'static,
    ) -> ApiResult<Value> {
        self.request_value("/excel/import", RequestOptions::post().with_form(form))
            .await
    }
}
