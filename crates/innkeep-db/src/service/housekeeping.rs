//! # Housekeeping Service
//!
//! Room status changes outside the check-in machine: the
//! Available↔Dirty↔Cleaning cycle plus Maintenance / OutOfOrder.
//! `Occupied` is owned by check-in/out and rejected here.

use serde_json::json;
use tracing::info;

use innkeep_core::room::{Room, RoomStatus};
use innkeep_core::{Actor, ActivityEvent, CoreError, Scope};

use crate::error::ServiceResult;
use crate::pool::Database;
use crate::repository::activity::ActivityLogRepository;
use crate::repository::room::RoomRepository;

/// Housekeeping-facing room status operations.
#[derive(Debug, Clone)]
pub struct HousekeepingService {
    db: Database,
}

impl HousekeepingService {
    pub fn new(db: Database) -> Self {
        HousekeepingService { db }
    }

    /// Validated status change with the reason recorded in the activity
    /// log.
    pub async fn set_status(
        &self,
        room_id: &str,
        new_status: RoomStatus,
        reason: Option<&str>,
        actor: &Actor,
    ) -> ServiceResult<Room> {
        actor.require(Scope::Housekeeping)?;

        let mut tx = self.db.pool().begin().await?;

        let mut room = RoomRepository::get_by_id_in(&mut *tx, room_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Room", room_id))?;

        if !room.status.can_transition_to(new_status) {
            return Err(
                CoreError::invalid_transition("Room", room_id, room.status, new_status).into(),
            );
        }

        RoomRepository::set_status_in(&mut *tx, room_id, new_status).await?;

        ActivityLogRepository::append_in(
            &mut *tx,
            &ActivityEvent::new(
                "room",
                room_id,
                "room_status_changed",
                json!({
                    "from": room.status,
                    "to": new_status,
                    "reason": reason,
                }),
                &actor.id,
            ),
        )
        .await?;

        tx.commit().await?;

        info!(room_id = %room_id, from = %room.status, to = %new_status, "room status changed");
        room.status = new_status;
        Ok(room)
    }
}
