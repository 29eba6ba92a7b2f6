use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Duration, Utc};
use tracing::info;
use uuid::Uuid;

use super::domain::{
    KindCount, MonthCount, PriorityCount, Reclamation, ReclamationComment,
    ReclamationCommentDraft, ReclamationCommentId, ReclamationDetail, ReclamationDocument,
    ReclamationDocumentDraft, ReclamationDocumentId, ReclamationDraft, ReclamationFilter,
    ReclamationId, ReclamationListing, ReclamationStats, ReclamationStatus,
    ReclamationStatusChange, ReclamationTask, ReclamationTaskId, StatusCounts, TaskDraft,
    TaskStatus, TaskStatusChange,
};
use crate::catalog::domain::require_text;
use crate::clock::Clock;
use crate::error::DeliveryError;
use crate::shipments::ShipmentId;
use crate::store::{Database, Schema};
use crate::users::UserId;

const STATS_WINDOW_DAYS: i64 = 180;
const TOP_COUNT: usize = 5;

pub struct ReclamationService<'a> {
    db: &'a Database,
    clock: &'a dyn Clock,
}

impl<'a> ReclamationService<'a> {
    pub fn new(db: &'a Database, clock: &'a dyn Clock) -> Self {
        Self { db, clock }
    }

    pub fn create(
        &self,
        draft: ReclamationDraft,
        created_by: UserId,
    ) -> Result<ReclamationDetail, DeliveryError> {
        require_text("description", &draft.description)?;
        let now = self.clock.now();
        self.db.write(|schema| {
            schema.users.require(created_by.0)?;
            check_links(schema, &draft)?;
            let reference = next_reference(schema, now);
            let reclamation = schema.reclamations.insert_with(|id| Reclamation {
                id: ReclamationId(id),
                reference,
                client_id: draft.client_id,
                kind: draft.kind,
                description: draft.description.trim().to_string(),
                shipment_ids: dedup(&draft.shipment_ids),
                invoice_id: draft.invoice_id,
                status: ReclamationStatus::InProgress,
                priority: draft.priority,
                created_by,
                assigned_to: draft.assigned_to,
                resolution: String::new(),
                created_at: now,
                updated_at: now,
                resolved_at: None,
            });
            let id = reclamation.id;
            info!(
                reclamation_id = id.0,
                reference = %reclamation.reference,
                kind = ?reclamation.kind,
                "reclamation filed"
            );
            detail(schema, id)
        })
    }

    /// Replaces the editable fields; reference, author and status are kept.
    pub fn update(
        &self,
        id: ReclamationId,
        draft: ReclamationDraft,
    ) -> Result<ReclamationDetail, DeliveryError> {
        require_text("description", &draft.description)?;
        let now = self.clock.now();
        self.db.write(|schema| {
            schema.reclamations.require(id.0)?;
            check_links(schema, &draft)?;
            let reclamation = schema.reclamations.require_mut(id.0)?;
            reclamation.client_id = draft.client_id;
            reclamation.kind = draft.kind;
            reclamation.description = draft.description.trim().to_string();
            reclamation.shipment_ids = dedup(&draft.shipment_ids);
            reclamation.invoice_id = draft.invoice_id;
            reclamation.priority = draft.priority;
            reclamation.assigned_to = draft.assigned_to;
            reclamation.updated_at = now;
            detail(schema, id)
        })
    }

    pub fn update_status(
        &self,
        id: ReclamationId,
        change: ReclamationStatusChange,
    ) -> Result<ReclamationDetail, DeliveryError> {
        let now = self.clock.now();
        self.db.write(|schema| {
            let reclamation = schema.reclamations.require_mut(id.0)?;
            let previous = reclamation.status;
            reclamation.status = change.status;
            if change.status == ReclamationStatus::Resolved {
                reclamation.resolved_at.get_or_insert(now);
            }
            if let Some(resolution) = change.resolution {
                reclamation.resolution = resolution.trim().to_string();
            }
            reclamation.updated_at = now;
            info!(reclamation_id = id.0, from = ?previous, to = ?change.status, "reclamation status changed");
            detail(schema, id)
        })
    }

    pub fn add_comment(
        &self,
        id: ReclamationId,
        author: UserId,
        draft: ReclamationCommentDraft,
    ) -> Result<ReclamationComment, DeliveryError> {
        require_text("content", &draft.content)?;
        let now = self.clock.now();
        self.db.write(|schema| {
            schema.reclamations.require(id.0)?;
            let comment = schema
                .reclamation_comments
                .insert_with(|comment_id| ReclamationComment {
                    id: ReclamationCommentId(comment_id),
                    reclamation_id: id,
                    author,
                    content: draft.content.trim().to_string(),
                    is_internal: draft.is_internal,
                    created_at: now,
                })
                .clone();
            schema.reclamations.require_mut(id.0)?.updated_at = now;
            Ok(comment)
        })
    }

    pub fn add_document(
        &self,
        id: ReclamationId,
        uploaded_by: UserId,
        draft: ReclamationDocumentDraft,
    ) -> Result<ReclamationDocument, DeliveryError> {
        require_text("name", &draft.name)?;
        require_text("storage_key", &draft.storage_key)?;
        let now = self.clock.now();
        self.db.write(|schema| {
            schema.reclamations.require(id.0)?;
            let document = schema
                .reclamation_documents
                .insert_with(|document_id| ReclamationDocument {
                    id: ReclamationDocumentId(document_id),
                    reclamation_id: id,
                    name: draft.name.trim().to_string(),
                    storage_key: draft.storage_key.trim().to_string(),
                    uploaded_by,
                    uploaded_at: now,
                })
                .clone();
            Ok(document)
        })
    }

    pub fn add_task(
        &self,
        id: ReclamationId,
        draft: TaskDraft,
    ) -> Result<ReclamationTask, DeliveryError> {
        require_text("title", &draft.title)?;
        let now = self.clock.now();
        self.db.write(|schema| {
            schema.reclamations.require(id.0)?;
            if let Some(assignee) = draft.assigned_to {
                schema.users.require(assignee.0)?;
            }
            let task = schema
                .reclamation_tasks
                .insert_with(|task_id| ReclamationTask {
                    id: ReclamationTaskId(task_id),
                    reclamation_id: id,
                    title: draft.title.trim().to_string(),
                    description: draft.description.trim().to_string(),
                    assigned_to: draft.assigned_to,
                    status: TaskStatus::Todo,
                    due_date: draft.due_date,
                    created_at: now,
                    completed_at: None,
                })
                .clone();
            Ok(task)
        })
    }

    /// Marking a task done stamps `completed_at`; reopening it clears it.
    pub fn update_task_status(
        &self,
        task_id: ReclamationTaskId,
        change: TaskStatusChange,
    ) -> Result<ReclamationTask, DeliveryError> {
        let now = self.clock.now();
        self.db.write(|schema| {
            let task = schema.reclamation_tasks.require_mut(task_id.0)?;
            task.status = change.status;
            if change.status == TaskStatus::Done {
                task.completed_at.get_or_insert(now);
            } else {
                task.completed_at = None;
            }
            let task = task.clone();
            if let Some(reclamation) = schema.reclamations.get_mut(task.reclamation_id.0) {
                reclamation.updated_at = now;
            }
            Ok(task)
        })
    }

    pub fn get(&self, id: ReclamationId) -> Result<ReclamationDetail, DeliveryError> {
        self.db.read(|schema| detail(schema, id))
    }

    /// Newest first. The counts cover every reclamation.
    pub fn list(&self, filter: &ReclamationFilter) -> ReclamationListing {
        let needle = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|needle| !needle.is_empty())
            .map(str::to_lowercase);
        self.db.read(|schema| {
            let reclamations = schema
                .reclamations
                .values()
                .rev()
                .filter(|rec| filter.status.map_or(true, |status| rec.status == status))
                .filter(|rec| filter.kind.map_or(true, |kind| rec.kind == kind))
                .filter(|rec| filter.priority.map_or(true, |priority| rec.priority == priority))
                .filter(|rec| match &needle {
                    Some(needle) => {
                        rec.reference.to_lowercase().contains(needle)
                            || rec.description.to_lowercase().contains(needle)
                            || client_name(schema, rec).to_lowercase().contains(needle)
                    }
                    None => true,
                })
                .cloned()
                .collect();
            ReclamationListing {
                reclamations,
                stats: status_counts(schema),
            }
        })
    }

    pub fn stats(&self) -> ReclamationStats {
        let now = self.clock.now();
        self.db.read(|schema| stats(schema, now))
    }
}

fn check_links(schema: &Schema, draft: &ReclamationDraft) -> Result<(), DeliveryError> {
    schema.clients.require(draft.client_id.0)?;
    for shipment_id in &draft.shipment_ids {
        let shipment = schema.shipments.require(shipment_id.0)?;
        if shipment.client_id != draft.client_id {
            return Err(DeliveryError::validation(format!(
                "shipment {} does not belong to client {}",
                shipment.tracking_number, draft.client_id
            )));
        }
    }
    if let Some(invoice_id) = draft.invoice_id {
        let invoice = schema.invoices.require(invoice_id.0)?;
        if invoice.client_id != draft.client_id {
            return Err(DeliveryError::validation(format!(
                "invoice {invoice_id} does not belong to client {}",
                draft.client_id
            )));
        }
    }
    if let Some(assignee) = draft.assigned_to {
        schema.users.require(assignee.0)?;
    }
    Ok(())
}

fn dedup(ids: &[ShipmentId]) -> Vec<ShipmentId> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// `REC-<year>-<6 upper hex>`, unique among stored reclamations.
fn next_reference(schema: &Schema, now: DateTime<Utc>) -> String {
    loop {
        let hex = Uuid::new_v4().simple().to_string();
        let candidate = format!("REC-{}-{}", now.year(), hex[..6].to_uppercase());
        if !schema
            .reclamations
            .values()
            .any(|rec| rec.reference == candidate)
        {
            return candidate;
        }
    }
}

fn client_name<'s>(schema: &'s Schema, reclamation: &Reclamation) -> &'s str {
    schema
        .clients
        .get(reclamation.client_id.0)
        .map_or("", |client| client.name.as_str())
}

fn status_counts(schema: &Schema) -> StatusCounts {
    schema
        .reclamations
        .values()
        .fold(StatusCounts::default(), |mut counts, rec| {
            counts.total += 1;
            match rec.status {
                ReclamationStatus::InProgress => counts.in_progress += 1,
                ReclamationStatus::Resolved => counts.resolved += 1,
                ReclamationStatus::Cancelled => counts.cancelled += 1,
            }
            counts
        })
}

fn detail(schema: &Schema, id: ReclamationId) -> Result<ReclamationDetail, DeliveryError> {
    let reclamation = schema.reclamations.require(id.0)?.clone();
    let mut comments: Vec<_> = schema
        .reclamation_comments
        .values()
        .filter(|comment| comment.reclamation_id == id)
        .cloned()
        .collect();
    comments.sort_by_key(|comment| Reverse((comment.created_at, comment.id)));

    let mut tasks: Vec<_> = schema
        .reclamation_tasks
        .values()
        .filter(|task| task.reclamation_id == id)
        .cloned()
        .collect();
    // undated tasks last
    tasks.sort_by_key(|task| {
        (
            task.due_date.is_none(),
            task.due_date,
            Reverse((task.created_at, task.id)),
        )
    });

    Ok(ReclamationDetail {
        client_name: client_name(schema, &reclamation).to_string(),
        resolution_time_days: reclamation.resolution_time_days(),
        documents: schema
            .reclamation_documents
            .values()
            .filter(|document| document.reclamation_id == id)
            .cloned()
            .collect(),
        comments,
        tasks,
        reclamation,
    })
}

fn stats(schema: &Schema, now: DateTime<Utc>) -> ReclamationStats {
    let mut kinds = HashMap::new();
    let mut priorities = HashMap::new();
    let mut months = BTreeMap::new();
    let window_start = now - Duration::days(STATS_WINDOW_DAYS);
    let mut resolution_days = Vec::new();

    for rec in schema.reclamations.values() {
        *kinds.entry(rec.kind).or_insert(0usize) += 1;
        *priorities.entry(rec.priority).or_insert(0usize) += 1;
        if rec.created_at >= window_start {
            *months
                .entry(rec.created_at.format("%Y-%m").to_string())
                .or_insert(0usize) += 1;
        }
        if rec.status == ReclamationStatus::Resolved {
            if let Some(days) = rec.resolution_time_days() {
                resolution_days.push(days);
            }
        }
    }

    let mut by_kind: Vec<_> = kinds
        .into_iter()
        .map(|(kind, count)| KindCount { kind, count })
        .collect();
    by_kind.sort_by_key(|entry| (Reverse(entry.count), entry.kind));

    let mut by_priority: Vec<_> = priorities
        .into_iter()
        .map(|(priority, count)| PriorityCount { priority, count })
        .collect();
    by_priority.sort_by_key(|entry| (Reverse(entry.count), entry.priority));

    let average_resolution_days = (!resolution_days.is_empty()).then(|| {
        let mean = resolution_days.iter().sum::<i64>() as f64 / resolution_days.len() as f64;
        (mean * 10.0).round() / 10.0
    });

    let mut recent: Vec<_> = schema.reclamations.values().cloned().collect();
    recent.sort_by_key(|rec| Reverse((rec.created_at, rec.id)));
    recent.truncate(TOP_COUNT);

    ReclamationStats {
        counts: status_counts(schema),
        top_kinds: by_kind.iter().take(TOP_COUNT).cloned().collect(),
        by_kind,
        by_priority,
        by_month: months
            .into_iter()
            .map(|(month, count)| MonthCount { month, count })
            .collect(),
        average_resolution_days,
        recent,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};

    use super::*;
    use crate::catalog::{CatalogService, ClientDraft, ClientId};
    use crate::clock::FixedClock;
    use crate::reclamations::domain::{ReclamationKind, ReclamationPriority};
    use crate::users::{Role, UserDraft, UserService};

    struct Fixture {
        db: Database,
        clock: FixedClock,
        client: ClientId,
        agent: UserId,
    }

    fn fixture() -> Fixture {
        let db = Database::new();
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap());
        let client = CatalogService::new(&db, &clock)
            .create_client(ClientDraft {
                code: "C-100".to_string(),
                name: "Sahel Import".to_string(),
                phone: String::new(),
                email: "desk@sahel.example".to_string(),
                address: String::new(),
                client_type: String::new(),
            })
            .expect("client")
            .id;
        let agent = UserService::new(&db, &clock)
            .register(UserDraft {
                username: "nadia".to_string(),
                email: String::new(),
                role: Role::Agent,
            })
            .expect("agent")
            .id;
        Fixture {
            db,
            clock,
            client,
            agent,
        }
    }

    fn draft(client: ClientId, kind: ReclamationKind) -> ReclamationDraft {
        ReclamationDraft {
            client_id: client,
            kind,
            description: "Parcel arrived two days late".to_string(),
            shipment_ids: Vec::new(),
            invoice_id: None,
            priority: ReclamationPriority::Normal,
            assigned_to: None,
        }
    }

    #[test]
    fn reference_carries_year_and_hex_suffix() {
        let fx = fixture();
        let service = ReclamationService::new(&fx.db, &fx.clock);
        let rec = service
            .create(draft(fx.client, ReclamationKind::DeliveryDelay), fx.agent)
            .expect("create");
        assert!(rec.reclamation.reference.starts_with("REC-2025-"));
        assert_eq!(rec.reclamation.reference.len(), "REC-2025-".len() + 6);
        assert_eq!(rec.reclamation.status, ReclamationStatus::InProgress);
        assert_eq!(rec.client_name, "Sahel Import");
    }

    #[test]
    fn resolving_stamps_resolution_time_once() {
        let fx = fixture();
        let service = ReclamationService::new(&fx.db, &fx.clock);
        let id = service
            .create(draft(fx.client, ReclamationKind::LostParcel), fx.agent)
            .expect("create")
            .reclamation
            .id;

        fx.clock.advance(Duration::hours(60));
        let resolved = service
            .update_status(
                id,
                ReclamationStatusChange {
                    status: ReclamationStatus::Resolved,
                    resolution: Some("Parcel found and delivered".to_string()),
                },
            )
            .expect("resolve");
        assert_eq!(resolved.resolution_time_days, Some(2));

        fx.clock.advance(Duration::days(5));
        let again = service
            .update_status(
                id,
                ReclamationStatusChange {
                    status: ReclamationStatus::Resolved,
                    resolution: None,
                },
            )
            .expect("resolve again");
        assert_eq!(again.resolution_time_days, Some(2));
        assert_eq!(again.reclamation.resolution, "Parcel found and delivered");
    }

    #[test]
    fn tasks_are_ordered_by_due_date_with_undated_last() {
        let fx = fixture();
        let service = ReclamationService::new(&fx.db, &fx.clock);
        let id = service
            .create(draft(fx.client, ReclamationKind::DamagedParcel), fx.agent)
            .expect("create")
            .reclamation
            .id;
        let task = |title: &str, due: Option<NaiveDate>| TaskDraft {
            title: title.to_string(),
            description: String::new(),
            assigned_to: None,
            due_date: due,
        };
        service.add_task(id, task("call back", None)).expect("task");
        service
            .add_task(id, task("inspect", NaiveDate::from_ymd_opt(2025, 3, 20)))
            .expect("task");
        let photos = service
            .add_task(id, task("photos", NaiveDate::from_ymd_opt(2025, 3, 12)))
            .expect("task");

        let done = service
            .update_task_status(
                photos.id,
                TaskStatusChange {
                    status: TaskStatus::Done,
                },
            )
            .expect("done");
        assert!(done.completed_at.is_some());

        let titles: Vec<_> = service
            .get(id)
            .expect("detail")
            .tasks
            .into_iter()
            .map(|task| task.title)
            .collect();
        assert_eq!(titles, vec!["photos", "inspect", "call back"]);
    }

    #[test]
    fn search_matches_client_name_and_counts_cover_all_rows() {
        let fx = fixture();
        let service = ReclamationService::new(&fx.db, &fx.clock);
        service
            .create(draft(fx.client, ReclamationKind::BillingError), fx.agent)
            .expect("create");
        let second = service
            .create(draft(fx.client, ReclamationKind::Other), fx.agent)
            .expect("create");
        service
            .update_status(
                second.reclamation.id,
                ReclamationStatusChange {
                    status: ReclamationStatus::Cancelled,
                    resolution: None,
                },
            )
            .expect("cancel");

        let listing = service.list(&ReclamationFilter {
            status: Some(ReclamationStatus::InProgress),
            search: Some("sahel".to_string()),
            ..ReclamationFilter::default()
        });
        assert_eq!(listing.reclamations.len(), 1);
        assert_eq!(listing.stats.total, 2);
        assert_eq!(listing.stats.cancelled, 1);

        let none = service.list(&ReclamationFilter {
            search: Some("nobody".to_string()),
            ..ReclamationFilter::default()
        });
        assert!(none.reclamations.is_empty());
    }

    #[test]
    fn stats_rank_kinds_and_average_whole_days() {
        let fx = fixture();
        let service = ReclamationService::new(&fx.db, &fx.clock);
        let mut ids = Vec::new();
        for kind in [
            ReclamationKind::DeliveryDelay,
            ReclamationKind::DeliveryDelay,
            ReclamationKind::LostParcel,
        ] {
            ids.push(
                service
                    .create(draft(fx.client, kind), fx.agent)
                    .expect("create")
                    .reclamation
                    .id,
            );
        }
        let resolve = |id| {
            service
                .update_status(
                    id,
                    ReclamationStatusChange {
                        status: ReclamationStatus::Resolved,
                        resolution: None,
                    },
                )
                .expect("resolve");
        };
        fx.clock.advance(Duration::days(1));
        resolve(ids[0]);
        fx.clock.advance(Duration::days(1));
        resolve(ids[1]);

        let stats = service.stats();
        assert_eq!(stats.counts.total, 3);
        assert_eq!(
            stats.by_kind[0],
            KindCount {
                kind: ReclamationKind::DeliveryDelay,
                count: 2
            }
        );
        assert_eq!(stats.average_resolution_days, Some(1.5));
        assert_eq!(
            stats.by_month,
            vec![MonthCount {
                month: "2025-03".to_string(),
                count: 3
            }]
        );
        assert_eq!(stats.recent.len(), 3);
        assert_eq!(stats.recent[0].id, ids[2]);
    }

    #[test]
    fn linked_invoice_must_belong_to_client() {
        let fx = fixture();
        let service = ReclamationService::new(&fx.db, &fx.clock);
        let mut bad = draft(fx.client, ReclamationKind::BillingError);
        bad.invoice_id = Some(crate::billing::InvoiceId(7));
        assert!(matches!(
            service.create(bad, fx.agent),
            Err(DeliveryError::NotFound {
                entity: "invoice",
                id: 7
            })
        ));
    }
}
