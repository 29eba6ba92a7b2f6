use tracing::{info, warn};

use super::alerts::{AlertPublisher, IncidentAlert};
use super::domain::{
    CommentDraft, DocumentDraft, Incident, IncidentComment, IncidentCommentId, IncidentDetail,
    IncidentDocument, IncidentDocumentId, IncidentDraft, IncidentFilter, IncidentId,
    IncidentListing, IncidentStats, IncidentStatus, IncidentStatusChange,
};
use crate::catalog::domain::require_text;
use crate::clock::Clock;
use crate::error::DeliveryError;
use crate::store::{Database, Schema};
use crate::users::UserId;

pub struct IncidentService<'a> {
    db: &'a Database,
    clock: &'a dyn Clock,
    alerts: &'a dyn AlertPublisher,
}

impl<'a> IncidentService<'a> {
    pub fn new(db: &'a Database, clock: &'a dyn Clock, alerts: &'a dyn AlertPublisher) -> Self {
        Self { db, clock, alerts }
    }

    /// Records the incident. High and critical ones are pushed to the alert
    /// channel; a failed dispatch is logged and leaves `alert_sent` unset.
    pub fn create(
        &self,
        draft: IncidentDraft,
        reported_by: UserId,
    ) -> Result<IncidentDetail, DeliveryError> {
        require_text("description", &draft.description)?;
        if draft.shipment_id.is_none() && draft.tour_id.is_none() {
            return Err(DeliveryError::validation(
                "an incident must reference a shipment or a tour",
            ));
        }
        let now = self.clock.now();

        let (incident, tracking_number) = self.db.write(|schema| {
            let tracking_number = match draft.shipment_id {
                Some(id) => Some(schema.shipments.require(id.0)?.tracking_number.clone()),
                None => None,
            };
            if let Some(tour_id) = draft.tour_id {
                schema.tours.require(tour_id.0)?;
            }
            schema.users.require(reported_by.0)?;
            if let Some(assignee) = draft.assigned_to {
                schema.users.require(assignee.0)?;
            }
            let incident = schema
                .incidents
                .insert_with(|id| Incident {
                    id: IncidentId(id),
                    shipment_id: draft.shipment_id,
                    tour_id: draft.tour_id,
                    reported_by,
                    assigned_to: draft.assigned_to,
                    incident_type: draft.incident_type,
                    status: IncidentStatus::Open,
                    priority: draft.priority,
                    description: draft.description.trim().to_string(),
                    resolution: String::new(),
                    created_at: now,
                    updated_at: now,
                    resolved_at: None,
                    alert_sent: false,
                })
                .clone();
            info!(
                incident_id = incident.id.0,
                priority = ?incident.priority,
                kind = ?incident.incident_type,
                "incident reported"
            );
            Ok::<_, DeliveryError>((incident, tracking_number))
        })?;

        if incident.priority.raises_alert() {
            let alert = IncidentAlert::for_incident(&incident, tracking_number.as_deref());
            match self.alerts.publish(alert) {
                Ok(()) => {
                    self.db.write(|schema| {
                        if let Some(stored) = schema.incidents.get_mut(incident.id.0) {
                            stored.alert_sent = true;
                        }
                    });
                    info!(incident_id = incident.id.0, "incident alert dispatched");
                }
                Err(error) => {
                    warn!(incident_id = incident.id.0, %error, "incident alert dispatch failed");
                }
            }
        }
        self.get(incident.id)
    }

    pub fn update_status(
        &self,
        id: IncidentId,
        change: IncidentStatusChange,
    ) -> Result<IncidentDetail, DeliveryError> {
        let now = self.clock.now();
        self.db.write(|schema| {
            schema.incidents.require(id.0)?;
            if let Some(assignee) = change.assigned_to {
                schema.users.require(assignee.0)?;
            }
            let incident = schema.incidents.require_mut(id.0)?;
            let previous = incident.status;
            incident.status = change.status;
            if change.status == IncidentStatus::Resolved {
                incident.resolved_at.get_or_insert(now);
            } else {
                incident.resolved_at = None;
            }
            if let Some(resolution) = change.resolution {
                incident.resolution = resolution.trim().to_string();
            }
            if change.assigned_to.is_some() {
                incident.assigned_to = change.assigned_to;
            }
            incident.updated_at = now;
            info!(incident_id = id.0, from = ?previous, to = ?change.status, "incident status changed");
            detail(schema, id)
        })
    }

    pub fn add_comment(
        &self,
        id: IncidentId,
        author: UserId,
        draft: CommentDraft,
    ) -> Result<IncidentComment, DeliveryError> {
        require_text("content", &draft.content)?;
        let now = self.clock.now();
        self.db.write(|schema| {
            schema.incidents.require(id.0)?;
            let comment = schema
                .incident_comments
                .insert_with(|comment_id| IncidentComment {
                    id: IncidentCommentId(comment_id),
                    incident_id: id,
                    author,
                    content: draft.content.trim().to_string(),
                    created_at: now,
                })
                .clone();
            schema.incidents.require_mut(id.0)?.updated_at = now;
            Ok(comment)
        })
    }

    pub fn add_document(
        &self,
        id: IncidentId,
        draft: DocumentDraft,
    ) -> Result<IncidentDocument, DeliveryError> {
        require_text("file_name", &draft.file_name)?;
        require_text("storage_key", &draft.storage_key)?;
        let now = self.clock.now();
        self.db.write(|schema| {
            schema.incidents.require(id.0)?;
            let document = schema
                .incident_documents
                .insert_with(|document_id| IncidentDocument {
                    id: IncidentDocumentId(document_id),
                    incident_id: id,
                    file_name: draft.file_name.trim().to_string(),
                    storage_key: draft.storage_key.trim().to_string(),
                    description: draft.description.trim().to_string(),
                    uploaded_at: now,
                })
                .clone();
            Ok(document)
        })
    }

    pub fn get(&self, id: IncidentId) -> Result<IncidentDetail, DeliveryError> {
        self.db.read(|schema| detail(schema, id))
    }

    /// Newest first.
    pub fn list(&self, filter: &IncidentFilter) -> IncidentListing {
        self.db.read(|schema| {
            let incidents = schema
                .incidents
                .values()
                .rev()
                .filter(|incident| filter.status.map_or(true, |status| incident.status == status))
                .filter(|incident| {
                    filter
                        .incident_type
                        .map_or(true, |kind| incident.incident_type == kind)
                })
                .cloned()
                .collect();
            let stats =
                schema
                    .incidents
                    .values()
                    .fold(IncidentStats::default(), |mut stats, incident| {
                        match incident.status {
                            IncidentStatus::Open => stats.open += 1,
                            IncidentStatus::InProgress => stats.in_progress += 1,
                            IncidentStatus::Resolved => stats.resolved += 1,
                        }
                        stats
                    });
            IncidentListing { incidents, stats }
        })
    }
}

fn detail(schema: &Schema, id: IncidentId) -> Result<IncidentDetail, DeliveryError> {
    let incident = schema.incidents.require(id.0)?.clone();
    Ok(IncidentDetail {
        comments: schema
            .incident_comments
            .values()
            .filter(|comment| comment.incident_id == id)
            .cloned()
            .collect(),
        documents: schema
            .incident_documents
            .values()
            .filter(|document| document.incident_id == id)
            .cloned()
            .collect(),
        incident,
    })
}
