//! In-memory normalized copy of every backend collection.
//!
//! Reads go through a TTL check: a fresh cache answers without touching
//! the network, a stale or forced read replaces the whole collection.
//! Writes call the backend first, then patch the local collection with
//! the confirmed item and drop the freshness stamp of the resource and
//! of everything denormalized against it.

use crate::cache::{CacheEntry, ResourceKind};
use crate::models::*;
use crate::page::ListResponse;
use client::{ApiClient, QueryParams};
use common::{ApiResult, Clock};
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Per-resource request state, mirrored for UI consumption.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceStatus {
    pub loading: bool,
    pub error: Option<String>,
}

struct Collections {
    groups: CacheEntry<Vec<Group>>,
    students: CacheEntry<Vec<Student>>,
    schedule: CacheEntry<Vec<ScheduleItem>>,
    attendance: CacheEntry<Vec<AttendanceRecord>>,
    notifications: CacheEntry<Vec<Notification>>,
    reports: CacheEntry<Vec<Report>>,
    clubs: CacheEntry<Vec<Club>>,
    subjects: CacheEntry<Vec<Subject>>,
    directions: CacheEntry<Vec<Direction>>,
    tournaments: CacheEntry<Vec<Tournament>>,
    stats: CacheEntry<DashboardStats>,
    unread_count: CacheEntry<u64>,
    status: HashMap<ResourceKind, ResourceStatus>,
}

impl Collections {
    fn new(config: &common::PollConfig) -> Self {
        let slow = config.slow_ttl();
        let fast = config.fast_ttl();
        Self {
            groups: CacheEntry::new(slow),
            students: CacheEntry::new(slow),
            schedule: CacheEntry::new(slow),
            attendance: CacheEntry::new(fast),
            notifications: CacheEntry::new(fast),
            reports: CacheEntry::new(slow),
            clubs: CacheEntry::new(slow),
            subjects: CacheEntry::new(slow),
            directions: CacheEntry::new(slow),
            tournaments: CacheEntry::new(slow),
            stats: CacheEntry::new(config.stats_ttl()),
            unread_count: CacheEntry::new(fast),
            status: HashMap::new(),
        }
    }

    fn status_mut(&mut self, kind: ResourceKind) -> &mut ResourceStatus {
        self.status.entry(kind).or_default()
    }

    fn invalidate(&mut self, kind: ResourceKind) {
        match kind {
            ResourceKind::Groups => self.groups.invalidate(),
            ResourceKind::Students => self.students.invalidate(),
            ResourceKind::Schedule => self.schedule.invalidate(),
            ResourceKind::Attendance => self.attendance.invalidate(),
            ResourceKind::Notifications => self.notifications.invalidate(),
            ResourceKind::Reports => self.reports.invalidate(),
            ResourceKind::Clubs => self.clubs.invalidate(),
            ResourceKind::Subjects => self.subjects.invalidate(),
            ResourceKind::Directions => self.directions.invalidate(),
            ResourceKind::Tournaments => self.tournaments.invalidate(),
            ResourceKind::Stats => self.stats.invalidate(),
            ResourceKind::UnreadCount => self.unread_count.invalidate(),
        }
    }
}

/// Decode a list response of either envelope shape and normalize every
/// item; a malformed element degrades to its defaulted form.
fn decode_collection<W, D>(value: Value) -> Vec<D>
where
    W: for<'de> Deserialize<'de> + Default,
    D: From<W>,
{
    let list: ListResponse<Value> =
        serde_json::from_value(value).unwrap_or(ListResponse::Bare(Vec::new()));
    list.into_items()
        .into_iter()
        .map(normalize_item::<W, D>)
        .collect()
}

#[derive(Clone)]
pub struct DataStore {
    api: Arc<ApiClient>,
    inner: Arc<RwLock<Collections>>,
}

impl DataStore {
    pub fn new(api: Arc<ApiClient>) -> Self {
        let inner = Collections::new(&api.config().poll);
        Self {
            api,
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    fn clock(&self) -> &Arc<dyn Clock> {
        self.api.tokens().clock()
    }

    fn now(&self) -> i64 {
        self.clock().now_millis()
    }

    pub fn status(&self, kind: ResourceKind) -> ResourceStatus {
        self.inner.read().status.get(&kind).cloned().unwrap_or_default()
    }

    fn invalidate_all(&self, kinds: &[ResourceKind]) {
        let mut inner = self.inner.write();
        for kind in kinds {
            inner.invalidate(*kind);
        }
    }

    /// Shared fetch path: serve the cached collection when fresh and not
    /// forced, otherwise hit the network and replace it wholesale. The
    /// lock is never held across the await.
    async fn fetch_list<W, D>(
        &self,
        kind: ResourceKind,
        force: bool,
        request: impl Future<Output = ApiResult<Value>>,
        entry: impl Fn(&mut Collections) -> &mut CacheEntry<Vec<D>>,
    ) -> ApiResult<Vec<D>>
    where
        W: for<'de> Deserialize<'de> + Default,
        D: From<W> + Clone,
    {
        if !force {
            let now = self.now();
            let mut inner = self.inner.write();
            let cached = entry(&mut inner);
            if cached.is_fresh(now) {
                if let Some(data) = cached.data() {
                    return Ok(data.clone());
                }
            }
        }

        self.inner.write().status_mut(kind).loading = true;
        match request.await {
            Ok(value) => {
                let items = decode_collection::<W, D>(value);
                debug!(?kind, count = items.len(), "collection replaced");
                let now = self.now();
                let mut inner = self.inner.write();
                entry(&mut inner).store(items.clone(), now);
                *inner.status_mut(kind) = ResourceStatus::default();
                Ok(items)
            }
            Err(e) => {
                let mut inner = self.inner.write();
                let status = inner.status_mut(kind);
                status.loading = false;
                status.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    // === Fetches ===

    pub async fn fetch_groups(&self, params: QueryParams, force: bool) -> ApiResult<Vec<Group>> {
        self.fetch_list::<GroupWire, _>(
            ResourceKind::Groups,
            force,
            self.api.get_groups(params),
            |c| &mut c.groups,
        )
        .await
    }

    pub async fn fetch_students(&self, params: QueryParams, force: bool) -> ApiResult<Vec<Student>> {
        self.fetch_list::<StudentWire, _>(
            ResourceKind::Students,
            force,
            self.api.get_students(params),
            |c| &mut c.students,
        )
        .await
    }

    pub async fn fetch_schedule(
        &self,
        params: QueryParams,
        force: bool,
    ) -> ApiResult<Vec<ScheduleItem>> {
        self.fetch_list::<ScheduleItemWire, _>(
            ResourceKind::Schedule,
            force,
            self.api.get_schedules(params),
            |c| &mut c.schedule,
        )
        .await
    }

    pub async fn fetch_attendance(
        &self,
        params: QueryParams,
        force: bool,
    ) -> ApiResult<Vec<AttendanceRecord>> {
        self.fetch_list::<AttendanceRecordWire, _>(
            ResourceKind::Attendance,
            force,
            self.api.get_attendance(params),
            |c| &mut c.attendance,
        )
        .await
    }

    pub async fn fetch_notifications(
        &self,
        params: QueryParams,
        force: bool,
    ) -> ApiResult<Vec<Notification>> {
        self.fetch_list::<NotificationWire, _>(
            ResourceKind::Notifications,
            force,
            self.api.get_notifications(params),
            |c| &mut c.notifications,
        )
        .await
    }

    pub async fn fetch_reports(&self, params: QueryParams, force: bool) -> ApiResult<Vec<Report>> {
        self.fetch_list::<ReportWire, _>(
            ResourceKind::Reports,
            force,
            self.api.get_reports(params),
            |c| &mut c.reports,
        )
        .await
    }

    pub async fn fetch_clubs(&self, params: QueryParams, force: bool) -> ApiResult<Vec<Club>> {
        self.fetch_list::<ClubWire, _>(
            ResourceKind::Clubs,
            force,
            self.api.get_clubs(params),
            |c| &mut c.clubs,
        )
        .await
    }

    pub async fn fetch_subjects(&self, params: QueryParams, force: bool) -> ApiResult<Vec<Subject>> {
        self.fetch_list::<SubjectWire, _>(
            ResourceKind::Subjects,
            force,
            self.api.get_subjects(params),
            |c| &mut c.subjects,
        )
        .await
    }

    pub async fn fetch_directions(
        &self,
        params: QueryParams,
        force: bool,
    ) -> ApiResult<Vec<Direction>> {
        self.fetch_list::<DirectionWire, _>(
            ResourceKind::Directions,
            force,
            self.api.get_directions(params),
            |c| &mut c.directions,
        )
        .await
    }

    pub async fn fetch_tournaments(
        &self,
        params: QueryParams,
        force: bool,
    ) -> ApiResult<Vec<Tournament>> {
        self.fetch_list::<TournamentWire, _>(
            ResourceKind::Tournaments,
            force,
            self.api.get_tournaments(params),
            |c| &mut c.tournaments,
        )
        .await
    }

    pub async fn fetch_statistics(&self, force: bool) -> ApiResult<DashboardStats> {
        if !force {
            let now = self.now();
            let inner = self.inner.read();
            if inner.stats.is_fresh(now) {
                if let Some(stats) = inner.stats.data() {
                    return Ok(stats.clone());
                }
            }
        }
        self.inner.write().status_mut(ResourceKind::Stats).loading = true;
        match self.api.get_dashboard_stats().await {
            Ok(value) => {
                let stats: DashboardStats = serde_json::from_value(value).unwrap_or_default();
                let now = self.now();
                let mut inner = self.inner.write();
                inner.stats.store(stats.clone(), now);
                *inner.status_mut(ResourceKind::Stats) = ResourceStatus::default();
                Ok(stats)
            }
            Err(e) => {
                let mut inner = self.inner.write();
                let status = inner.status_mut(ResourceKind::Stats);
                status.loading = false;
                status.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn fetch_unread_count(&self, force: bool) -> ApiResult<u64> {
        if !force {
            let now = self.now();
            let inner = self.inner.read();
            if inner.unread_count.is_fresh(now) {
                if let Some(count) = inner.unread_count.data() {
                    return Ok(*count);
                }
            }
        }
        self.inner
            .write()
            .status_mut(ResourceKind::UnreadCount)
            .loading = true;
        match self.api.get_unread_notification_count().await {
            Ok(value) => {
                // The endpoint has answered both as a bare number and as an
                // object over its lifetime.
                let count = value
                    .as_u64()
                    .or_else(|| value.get("count").and_then(Value::as_u64))
                    .or_else(|| value.get("unread_count").and_then(Value::as_u64))
                    .unwrap_or(0);
                let now = self.now();
                let mut inner = self.inner.write();
                inner.unread_count.store(count, now);
                *inner.status_mut(ResourceKind::UnreadCount) = ResourceStatus::default();
                Ok(count)
            }
            Err(e) => {
                let mut inner = self.inner.write();
                let status = inner.status_mut(ResourceKind::UnreadCount);
                status.loading = false;
                status.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Refetch one resource if its cache is stale; fresh caches answer
    /// locally. This is the poller's entry point.
    pub(crate) async fn refresh(&self, kind: ResourceKind) -> ApiResult<()> {
        match kind {
            ResourceKind::Groups => self.fetch_groups(QueryParams::new(), false).await.map(drop),
            ResourceKind::Students => {
                self.fetch_students(QueryParams::new(), false).await.map(drop)
            }
            ResourceKind::Schedule => {
                self.fetch_schedule(QueryParams::new(), false).await.map(drop)
            }
            ResourceKind::Attendance => {
                self.fetch_attendance(QueryParams::new(), false).await.map(drop)
            }
            ResourceKind::Notifications => {
                self.fetch_notifications(QueryParams::new(), false).await.map(drop)
            }
            ResourceKind::Reports => self.fetch_reports(QueryParams::new(), false).await.map(drop),
            ResourceKind::Clubs => self.fetch_clubs(QueryParams::new(), false).await.map(drop),
            ResourceKind::Subjects => {
                self.fetch_subjects(QueryParams::new(), false).await.map(drop)
            }
            ResourceKind::Directions => {
                self.fetch_directions(QueryParams::new(), false).await.map(drop)
            }
            ResourceKind::Tournaments => {
                self.fetch_tournaments(QueryParams::new(), false).await.map(drop)
            }
            ResourceKind::Stats => self.fetch_statistics(false).await.map(drop),
            ResourceKind::UnreadCount => self.fetch_unread_count(false).await.map(drop),
        }
    }

    // === Accessors (cloned snapshots) ===

    pub fn groups(&self) -> Vec<Group> {
        self.inner.read().groups.data().cloned().unwrap_or_default()
    }

    pub fn students(&self) -> Vec<Student> {
        self.inner.read().students.data().cloned().unwrap_or_default()
    }

    pub fn schedule(&self) -> Vec<ScheduleItem> {
        self.inner.read().schedule.data().cloned().unwrap_or_default()
    }

    pub fn attendance(&self) -> Vec<AttendanceRecord> {
        self.inner.read().attendance.data().cloned().unwrap_or_default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.inner.read().notifications.data().cloned().unwrap_or_default()
    }

    pub fn reports(&self) -> Vec<Report> {
        self.inner.read().reports.data().cloned().unwrap_or_default()
    }

    pub fn clubs(&self) -> Vec<Club> {
        self.inner.read().clubs.data().cloned().unwrap_or_default()
    }

    pub fn subjects(&self) -> Vec<Subject> {
        self.inner.read().subjects.data().cloned().unwrap_or_default()
    }

    pub fn directions(&self) -> Vec<Direction> {
        self.inner.read().directions.data().cloned().unwrap_or_default()
    }

    pub fn tournaments(&self) -> Vec<Tournament> {
        self.inner.read().tournaments.data().cloned().unwrap_or_default()
    }

    pub fn unread_count(&self) -> u64 {
        self.inner.read().unread_count.data().copied().unwrap_or(0)
    }

    // === Group writes ===

    pub async fn add_group(&self, data: Value) -> ApiResult<Group> {
        let created = self.api.create_group(data).await?;
        let group: Group = normalize_item::<GroupWire, _>(created);
        {
            let mut inner = self.inner.write();
            match inner.groups.data_mut() {
                Some(list) => list.push(group.clone()),
                None => {
                    let now = self.clock().now_millis();
                    inner.groups.store(vec![group.clone()], now);
                }
            }
        }
        self.invalidate_all(&[ResourceKind::Groups, ResourceKind::Stats]);
        Ok(group)
    }

    pub async fn update_group(&self, id: i64, updates: Value) -> ApiResult<Group> {
        let updated = self.api.update_group(id, updates).await?;
        let group: Group = normalize_item::<GroupWire, _>(updated);
        self.replace_group(&group);
        self.invalidate_all(&[ResourceKind::Groups, ResourceKind::Stats]);
        Ok(group)
    }

    pub async fn delete_group(&self, id: i64) -> ApiResult<()> {
        self.api.delete_group(id).await?;
        if let Some(list) = self.inner.write().groups.data_mut() {
            list.retain(|g| g.id != id);
        }
        self.invalidate_all(&[ResourceKind::Groups, ResourceKind::Stats]);
        Ok(())
    }

    pub async fn toggle_group_status(&self, id: i64) -> ApiResult<Group> {
        let updated = self.api.toggle_group_status(id).await?;
        let group: Group = normalize_item::<GroupWire, _>(updated);
        self.replace_group(&group);
        self.invalidate_all(&[ResourceKind::Groups, ResourceKind::Stats]);
        Ok(group)
    }

    /// Leader assignment touches both sides of the denormalized
    /// relationship, so both collections lose their stamp.
    pub async fn assign_group_leader(&self, group_id: i64, student_id: i64) -> ApiResult<()> {
        self.api.assign_group_leader(group_id, student_id).await?;
        {
            let mut inner = self.inner.write();
            if let Some(groups) = inner.groups.data_mut() {
                if let Some(group) = groups.iter_mut().find(|g| g.id == group_id) {
                    group.leader_id = Some(student_id);
                }
            }
            if let Some(students) = inner.students.data_mut() {
                for student in students.iter_mut() {
                    if student.group_id == Some(group_id) {
                        student.is_leader = student.id == student_id;
                    }
                }
            }
        }
        self.invalidate_all(&[ResourceKind::Groups, ResourceKind::Students]);
        Ok(())
    }

    pub async fn remove_group_leader(&self, group_id: i64) -> ApiResult<()> {
        self.api.remove_group_leader(group_id).await?;
        {
            let mut inner = self.inner.write();
            if let Some(groups) = inner.groups.data_mut() {
                if let Some(group) = groups.iter_mut().find(|g| g.id == group_id) {
                    group.leader_id = None;
                }
            }
            if let Some(students) = inner.students.data_mut() {
                for student in students.iter_mut() {
                    if student.group_id == Some(group_id) {
                        student.is_leader = false;
                    }
                }
            }
        }
        self.invalidate_all(&[ResourceKind::Groups, ResourceKind::Students]);
        Ok(())
    }

    fn replace_group(&self, group: &Group) {
        if let Some(list) = self.inner.write().groups.data_mut() {
            if let Some(slot) = list.iter_mut().find(|g| g.id == group.id) {
                *slot = group.clone();
            }
        }
    }

    // === Student writes ===

    pub async fn add_student(&self, data: Value) -> ApiResult<Student> {
        let created = self.api.create_student(data).await?;
        let student: Student = normalize_item::<StudentWire, _>(created);
        {
            let mut inner = self.inner.write();
            match inner.students.data_mut() {
                Some(list) => list.push(student.clone()),
                None => {
                    let now = self.clock().now_millis();
                    inner.students.store(vec![student.clone()], now);
                }
            }
        }
        // Group member counts are denormalized, so groups go stale too.
        self.invalidate_all(&[
            ResourceKind::Students,
            ResourceKind::Groups,
            ResourceKind::Stats,
        ]);
        Ok(student)
    }

    pub async fn update_student(&self, id: i64, updates: Value) -> ApiResult<Student> {
        let updated = self.api.update_student(id, updates).await?;
        let student: Student = normalize_item::<StudentWire, _>(updated);
        if let Some(list) = self.inner.write().students.data_mut() {
            if let Some(slot) = list.iter_mut().find(|s| s.id == student.id) {
                *slot = student.clone();
            }
        }
        self.invalidate_all(&[ResourceKind::Students, ResourceKind::Groups]);
        Ok(student)
    }

    pub async fn delete_student(&self, id: i64) -> ApiResult<()> {
        self.api.delete_student(id).await?;
        if let Some(list) = self.inner.write().students.data_mut() {
            list.retain(|s| s.id != id);
        }
        self.invalidate_all(&[
            ResourceKind::Students,
            ResourceKind::Groups,
            ResourceKind::Stats,
        ]);
        Ok(())
    }

    pub async fn update_student_contract(&self, id: i64, paid_amount: f64) -> ApiResult<Student> {
        let updated = self.api.update_student_contract(id, paid_amount).await?;
        let student: Student = normalize_item::<StudentWire, _>(updated);
        if let Some(list) = self.inner.write().students.data_mut() {
            if let Some(slot) = list.iter_mut().find(|s| s.id == student.id) {
                *slot = student.clone();
            }
        }
        self.invalidate_all(&[ResourceKind::Students]);
        Ok(student)
    }

    // === Schedule writes ===

    pub async fn add_schedule_item(&self, data: Value) -> ApiResult<ScheduleItem> {
        let created = self.api.create_schedule(data).await?;
        let item: ScheduleItem = normalize_item::<ScheduleItemWire, _>(created);
        {
            let mut inner = self.inner.write();
            match inner.schedule.data_mut() {
                Some(list) => list.push(item.clone()),
                None => {
                    let now = self.clock().now_millis();
                    inner.schedule.store(vec![item.clone()], now);
                }
            }
        }
        self.invalidate_all(&[ResourceKind::Schedule]);
        Ok(item)
    }

    pub async fn update_schedule_item(&self, id: i64, updates: Value) -> ApiResult<ScheduleItem> {
        let updated = self.api.update_schedule(id, updates).await?;
        let item: ScheduleItem = normalize_item::<ScheduleItemWire, _>(updated);
        if let Some(list) = self.inner.write().schedule.data_mut() {
            if let Some(slot) = list.iter_mut().find(|s| s.id == item.id) {
                *slot = item.clone();
            }
        }
        self.invalidate_all(&[ResourceKind::Schedule]);
        Ok(item)
    }

    pub async fn delete_schedule_item(&self, id: i64) -> ApiResult<()> {
        self.api.delete_schedule(id).await?;
        if let Some(list) = self.inner.write().schedule.data_mut() {
            list.retain(|s| s.id != id);
        }
        self.invalidate_all(&[ResourceKind::Schedule]);
        Ok(())
    }

    // === Attendance writes ===

    pub async fn add_attendance_record(&self, data: Value) -> ApiResult<AttendanceRecord> {
        let created = self.api.create_attendance(data).await?;
        let record: AttendanceRecord = normalize_item::<AttendanceRecordWire, _>(created);
        {
            let mut inner = self.inner.write();
            match inner.attendance.data_mut() {
                Some(list) => list.push(record.clone()),
                None => {
                    let now = self.clock().now_millis();
                    inner.attendance.store(vec![record.clone()], now);
                }
            }
        }
        self.invalidate_all(&[ResourceKind::Attendance, ResourceKind::Stats]);
        Ok(record)
    }

    pub async fn add_attendance_batch(&self, records: Value) -> ApiResult<Vec<AttendanceRecord>> {
        let created = self.api.bulk_create_attendance(records).await?;
        let items = decode_collection::<AttendanceRecordWire, AttendanceRecord>(created);
        if let Some(list) = self.inner.write().attendance.data_mut() {
            list.extend(items.iter().cloned());
        }
        self.invalidate_all(&[ResourceKind::Attendance, ResourceKind::Stats]);
        Ok(items)
    }

    pub async fn update_attendance_record(
        &self,
        id: i64,
        updates: Value,
    ) -> ApiResult<AttendanceRecord> {
        let updated = self.api.update_attendance(id, updates).await?;
        let record: AttendanceRecord = normalize_item::<AttendanceRecordWire, _>(updated);
        if let Some(list) = self.inner.write().attendance.data_mut() {
            if let Some(slot) = list.iter_mut().find(|a| a.id == record.id) {
                *slot = record.clone();
            }
        }
        self.invalidate_all(&[ResourceKind::Attendance, ResourceKind::Stats]);
        Ok(record)
    }

    // === Notification writes ===

    pub async fn add_notification(&self, data: Value) -> ApiResult<Notification> {
        let created = self.api.create_notification(data).await?;
        let notification: Notification = normalize_item::<NotificationWire, _>(created);
        {
            let mut inner = self.inner.write();
            match inner.notifications.data_mut() {
                Some(list) => list.push(notification.clone()),
                None => {
                    let now = self.clock().now_millis();
                    inner.notifications.store(vec![notification.clone()], now);
                }
            }
        }
        self.invalidate_all(&[ResourceKind::Notifications, ResourceKind::UnreadCount]);
        Ok(notification)
    }

    pub async fn mark_notification_read(&self, id: i64) -> ApiResult<()> {
        self.api.mark_notification_read(id).await?;
        if let Some(list) = self.inner.write().notifications.data_mut() {
            if let Some(n) = list.iter_mut().find(|n| n.id == id) {
                n.is_read = true;
            }
        }
        self.invalidate_all(&[ResourceKind::UnreadCount]);
        Ok(())
    }

    pub async fn mark_all_notifications_read(&self) -> ApiResult<()> {
        self.api.mark_all_notifications_read().await?;
        {
            let mut inner = self.inner.write();
            if let Some(list) = inner.notifications.data_mut() {
                for n in list.iter_mut() {
                    n.is_read = true;
                }
            }
            let now = self.clock().now_millis();
            inner.unread_count.store(0, now);
        }
        Ok(())
    }

    pub async fn delete_notification(&self, id: i64) -> ApiResult<()> {
        self.api.delete_notification(id).await?;
        if let Some(list) = self.inner.write().notifications.data_mut() {
            list.retain(|n| n.id != id);
        }
        self.invalidate_all(&[ResourceKind::Notifications, ResourceKind::UnreadCount]);
        Ok(())
    }

    // === Report writes ===

    pub async fn add_report(&self, data: Value) -> ApiResult<Report> {
        let created = self.api.create_report(data).await?;
        let report: Report = normalize_item::<ReportWire, _>(created);
        {
            let mut inner = self.inner.write();
            match inner.reports.data_mut() {
                Some(list) => list.push(report.clone()),
                None => {
                    let now = self.clock().now_millis();
                    inner.reports.store(vec![report.clone()], now);
                }
            }
        }
        self.invalidate_all(&[ResourceKind::Reports]);
        Ok(report)
    }

    pub async fn generate_report(
        &self,
        kind: &str,
        group_id: i64,
        start_date: &str,
        end_date: &str,
    ) -> ApiResult<Report> {
        let created = self
            .api
            .generate_report(kind, group_id, start_date, end_date)
            .await?;
        let report: Report = normalize_item::<ReportWire, _>(created);
        {
            let mut inner = self.inner.write();
            if let Some(list) = inner.reports.data_mut() {
                list.push(report.clone());
            }
        }
        self.invalidate_all(&[ResourceKind::Reports]);
        Ok(report)
    }

    pub async fn delete_report(&self, id: i64) -> ApiResult<()> {
        self.api.delete_report(id).await?;
        if let Some(list) = self.inner.write().reports.data_mut() {
            list.retain(|r| r.id != id);
        }
        self.invalidate_all(&[ResourceKind::Reports]);
        Ok(())
    }

    // === Club writes ===

    pub async fn add_club(&self, data: Value) -> ApiResult<Club> {
        let created = self.api.create_club(data).await?;
        let club: Club = normalize_item::<ClubWire, _>(created);
        {
            let mut inner = self.inner.write();
            match inner.clubs.data_mut() {
                Some(list) => list.push(club.clone()),
                None => {
                    let now = self.clock().now_millis();
                    inner.clubs.store(vec![club.clone()], now);
                }
            }
        }
        self.invalidate_all(&[ResourceKind::Clubs]);
        Ok(club)
    }

    pub async fn update_club(&self, id: i64, updates: Value) -> ApiResult<Club> {
        let updated = self.api.update_club(id, updates).await?;
        let club: Club = normalize_item::<ClubWire, _>(updated);
        if let Some(list) = self.inner.write().clubs.data_mut() {
            if let Some(slot) = list.iter_mut().find(|c| c.id == club.id) {
                *slot = club.clone();
            }
        }
        self.invalidate_all(&[ResourceKind::Clubs]);
        Ok(club)
    }

    pub async fn delete_club(&self, id: i64) -> ApiResult<()> {
        self.api.delete_club(id).await?;
        if let Some(list) = self.inner.write().clubs.data_mut() {
            list.retain(|c| c.id != id);
        }
        self.invalidate_all(&[ResourceKind::Clubs]);
        Ok(())
    }

    pub async fn toggle_club_status(&self, id: i64) -> ApiResult<Club> {
        let updated = self.api.toggle_club_status(id).await?;
        let club: Club = normalize_item::<ClubWire, _>(updated);
        if let Some(list) = self.inner.write().clubs.data_mut() {
            if let Some(slot) = list.iter_mut().find(|c| c.id == club.id) {
                *slot = club.clone();
            }
        }
        self.invalidate_all(&[ResourceKind::Clubs]);
        Ok(club)
    }

    // === Subject writes ===

    pub async fn add_subject(&self, data: Value) -> ApiResult<Subject> {
        let created = self.api.create_subject(data).await?;
        let subject: Subject = normalize_item::<SubjectWire, _>(created);
        {
            let mut inner = self.inner.write();
            match inner.subjects.data_mut() {
                Some(list) => list.push(subject.clone()),
                None => {
                    let now = self.clock().now_millis();
                    inner.subjects.store(vec![subject.clone()], now);
                }
            }
        }
        self.invalidate_all(&[ResourceKind::Subjects]);
        Ok(subject)
    }

    pub async fn update_subject(&self, id: i64, updates: Value) -> ApiResult<Subject> {
        let updated = self.api.update_subject(id, updates).await?;
        let subject: Subject = normalize_item::<SubjectWire, _>(updated);
        if let Some(list) = self.inner.write().subjects.data_mut() {
            if let Some(slot) = list.iter_mut().find(|s| s.id == subject.id) {
                *slot = subject.clone();
            }
        }
        self.invalidate_all(&[ResourceKind::Subjects]);
        Ok(subject)
    }

    pub async fn delete_subject(&self, id: i64) -> ApiResult<()> {
        self.api.delete_subject(id).await?;
        if let Some(list) = self.inner.write().subjects.data_mut() {
            list.retain(|s| s.id != id);
        }
        self.invalidate_all(&[ResourceKind::Subjects]);
        Ok(())
    }

    // === Direction writes ===

    pub async fn add_direction(&self, data: Value) -> ApiResult<Direction> {
        let created = self.api.create_direction(data).await?;
        let direction: Direction = normalize_item::<DirectionWire, _>(created);
        {
            let mut inner = self.inner.write();
            match inner.directions.data_mut() {
                Some(list) => list.push(direction.clone()),
                None => {
                    let now = self.clock().now_millis();
                    inner.directions.store(vec![direction.clone()], now);
                }
            }
        }
        self.invalidate_all(&[ResourceKind::Directions]);
        Ok(direction)
    }

    pub async fn update_direction(&self, id: i64, updates: Value) -> ApiResult<Direction> {
        let updated = self.api.update_direction(id, updates).await?;
        let direction: Direction = normalize_item::<DirectionWire, _>(updated);
        if let Some(list) = self.inner.write().directions.data_mut() {
            if let Some(slot) = list.iter_mut().find(|d| d.id == direction.id) {
                *slot = direction.clone();
            }
        }
        self.invalidate_all(&[ResourceKind::Directions]);
        Ok(direction)
    }

    pub async fn delete_direction(&self, id: i64) -> ApiResult<()> {
        self.api.delete_direction(id).await?;
        if let Some(list) = self.inner.write().directions.data_mut() {
            list.retain(|d| d.id != id);
        }
        self.invalidate_all(&[ResourceKind::Directions]);
        Ok(())
    }

    pub async fn toggle_direction_status(&self, id: i64) -> ApiResult<Direction> {
        let updated = self.api.toggle_direction_status(id).await?;
        let direction: Direction = normalize_item::<DirectionWire, _>(updated);
        if let Some(list) = self.inner.write().directions.data_mut() {
            if let Some(slot) = list.iter_mut().find(|d| d.id == direction.id) {
                *slot = direction.clone();
            }
        }
        self.invalidate_all(&[ResourceKind::Directions]);
        Ok(direction)
    }

    pub async fn update_direction_subjects(
        &self,
        direction_id: i64,
        subject_ids: &[i64],
    ) -> ApiResult<()> {
        self.api
            .update_direction_subjects(direction_id, subject_ids)
            .await?;
        if let Some(list) = self.inner.write().directions.data_mut() {
            if let Some(direction) = list.iter_mut().find(|d| d.id == direction_id) {
                direction.subject_ids = subject_ids.to_vec();
            }
        }
        self.invalidate_all(&[ResourceKind::Directions]);
        Ok(())
    }

    // === Tournament writes ===

    pub async fn add_tournament(&self, data: Value) -> ApiResult<Tournament> {
        let created = self.api.create_tournament(data).await?;
        let tournament: Tournament = normalize_item::<TournamentWire, _>(created);
        {
            let mut inner = self.inner.write();
            match inner.tournaments.data_mut() {
                Some(list) => list.push(tournament.clone()),
                None => {
                    let now = self.clock().now_millis();
                    inner.tournaments.store(vec![tournament.clone()], now);
                }
            }
        }
        self.invalidate_all(&[ResourceKind::Tournaments]);
        Ok(tournament)
    }

    pub async fn update_tournament(&self, id: i64, updates: Value) -> ApiResult<Tournament> {
        let updated = self.api.update_tournament(id, updates).await?;
        let tournament: Tournament = normalize_item::<TournamentWire, _>(updated);
        if let Some(list) = self.inner.write().tournaments.data_mut() {
            if let Some(slot) = list.iter_mut().find(|t| t.id == tournament.id) {
                *slot = tournament.clone();
            }
        }
        self.invalidate_all(&[ResourceKind::Tournaments]);
        Ok(tournament)
    }

    pub async fn delete_tournament(&self, id: i64) -> ApiResult<()> {
        self.api.delete_tournament(id).await?;
        if let Some(list) = self.inner.write().tournaments.data_mut() {
            list.retain(|t| t.id != id);
        }
        self.invalidate_all(&[ResourceKind::Tournaments]);
        Ok(())
    }

    pub async fn toggle_tournament_status(&self, id: i64) -> ApiResult<Tournament> {
        let updated = self.api.toggle_tournament_status(id).await?;
        let tournament: Tournament = normalize_item::<TournamentWire, _>(updated);
        if let Some(list) = self.inner.write().tournaments.data_mut() {
            if let Some(slot) = list.iter_mut().find(|t| t.id == tournament.id) {
                *slot = tournament.clone();
            }
        }
        self.invalidate_all(&[ResourceKind::Tournaments]);
        Ok(tournament)
    }

    pub async fn register_for_tournament(
        &self,
        tournament_id: i64,
        student_id: i64,
    ) -> ApiResult<TournamentRegistration> {
        let created = self
            .api
            .register_for_tournament(tournament_id, student_id)
            .await?;
        let registration: TournamentRegistration =
            normalize_item::<TournamentRegistrationWire, _>(created);
        self.invalidate_all(&[ResourceKind::Tournaments]);
        Ok(registration)
    }

    pub async fn unregister_from_tournament(
        &self,
        tournament_id: i64,
        student_id: i64,
    ) -> ApiResult<()> {
        self.api
            .unregister_from_tournament(tournament_id, student_id)
            .await?;
        self.invalidate_all(&[ResourceKind::Tournaments]);
        Ok(())
    }
}

impl std::fmt::Debug for DataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataStore").finish_non_exhaustive()
    }
}
