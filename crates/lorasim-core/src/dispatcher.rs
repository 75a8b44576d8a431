// ── Selection-gated command dispatch ──
//
// Each batched command re-reads the registry, checks its gate, makes one
// remote call for the whole selection, and patches the registry only
// after the remote accepted the batch. Deletes are independent per-id
// calls followed by an authoritative refresh.

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::api::{ApiError, FleetApi};
use crate::command::{CommandResult, Confirm, DeleteOutcome, FleetCommand, GateState};
use crate::error::{CoreError, DeleteFailure};
use crate::model::{ActivationState, EntityId, UplinkState};
use crate::selection::Selection;
use crate::store::DataStore;

/// Issues fleet commands against the remote and reconciles the registry.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<DataStore>,
    api: Arc<dyn FleetApi>,
}

impl Dispatcher {
    pub fn new(store: Arc<DataStore>, api: Arc<dyn FleetApi>) -> Self {
        Self { store, api }
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.store
    }

    /// Gate predicates for `selection` against the current registry.
    pub fn gates(&self, selection: &Selection) -> GateState {
        GateState::evaluate(&self.store, selection)
    }

    // ── Batched commands ─────────────────────────────────────────────

    pub async fn start_devices(&self, selection: &Selection) -> Result<CommandResult, CoreError> {
        self.execute(FleetCommand::StartDevices, selection).await
    }

    pub async fn stop_devices(&self, selection: &Selection) -> Result<CommandResult, CoreError> {
        self.execute(FleetCommand::StopDevices, selection).await
    }

    pub async fn start_uplink(&self, selection: &Selection) -> Result<CommandResult, CoreError> {
        self.execute(FleetCommand::StartUplink, selection).await
    }

    pub async fn stop_uplink(&self, selection: &Selection) -> Result<CommandResult, CoreError> {
        self.execute(FleetCommand::StopUplink, selection).await
    }

    /// Run one batched command for every member of `selection`.
    ///
    /// Rejected selections fail with [`CoreError::Validation`] before any
    /// remote call. A failed remote call leaves the registry untouched.
    pub async fn execute(
        &self,
        command: FleetCommand,
        selection: &Selection,
    ) -> Result<CommandResult, CoreError> {
        let ids = selection.to_vec();

        if !command.gate(&self.store, selection) {
            debug!(%command, count = ids.len(), "selection rejected by gate");
            let reason = if ids.is_empty() {
                "no records selected"
            } else {
                command.requirement()
            };
            return Err(CoreError::Validation {
                action: command.verb().into(),
                count: ids.len(),
                reason: reason.into(),
            });
        }

        let outcome = match command {
            FleetCommand::StartDevices => {
                self.api.set_activation(&ids, ActivationState::Playing).await
            }
            FleetCommand::StopDevices => self.api.set_activation(&ids, ActivationState::Paused).await,
            FleetCommand::StartUplink => self.api.set_uplink(&ids, UplinkState::Running).await,
            FleetCommand::StopUplink => self.api.set_uplink(&ids, UplinkState::Stopped).await,
        };

        if let Err(source) = outcome {
            warn!(%command, count = ids.len(), error = %source, "batched command failed");
            return Err(CoreError::RemoteCall {
                action: command.verb().into(),
                count: ids.len(),
                source,
            });
        }

        let changed = self.store.upsert(&ids, &command.patch());
        info!(%command, count = ids.len(), changed, "batched command applied");

        Ok(CommandResult {
            command,
            ids,
            changed,
        })
    }

    // ── Deletes ──────────────────────────────────────────────────────

    /// Delete every selected device or gateway after `confirm` agrees.
    ///
    /// Each id is deleted with its own remote call; outcomes are
    /// independent. Deleted ids leave the registry immediately, then the
    /// registry is refreshed from the remote. If any deletion failed the
    /// result is [`CoreError::PartialDelete`] listing the failed ids.
    pub async fn delete_records<C>(
        &self,
        selection: &Selection,
        confirm: &C,
    ) -> Result<DeleteOutcome, CoreError>
    where
        C: Confirm + Sync + ?Sized,
    {
        let ids = selection.to_vec();
        if ids.is_empty() {
            return Err(CoreError::Validation {
                action: "delete".into(),
                count: 0,
                reason: "no records selected".into(),
            });
        }

        let prompt = format!(
            "Are you sure you want to delete {} selected record(s)?",
            ids.len()
        );
        if !confirm.confirm(&prompt) {
            debug!(count = ids.len(), "delete cancelled by operator");
            return Ok(DeleteOutcome::Cancelled);
        }

        let results = join_all(ids.iter().map(|id| async move {
            let outcome = self.delete_one(id).await;
            (id.clone(), outcome)
        }))
        .await;

        let mut deleted = Vec::new();
        let mut failed = Vec::new();
        for (id, outcome) in results {
            match outcome {
                Ok(()) => deleted.push(id),
                Err(reason) => {
                    warn!(id = %id, %reason, "delete failed");
                    failed.push(DeleteFailure { id, reason });
                }
            }
        }

        self.store.remove(&deleted);
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "refresh after delete failed, keeping local removals");
        }

        if failed.is_empty() {
            info!(count = deleted.len(), "records deleted");
            Ok(DeleteOutcome::Deleted { ids: deleted })
        } else {
            Err(CoreError::PartialDelete {
                total: ids.len(),
                failed,
            })
        }
    }

    async fn delete_one(&self, id: &EntityId) -> Result<(), String> {
        let result: Result<(), ApiError> = if self.store.device(id).is_some() {
            self.api.delete_device(id).await
        } else if self.store.gateway(id).is_some() {
            self.api.delete_gateway(id).await
        } else {
            return Err("not present in the registry".into());
        };
        result.map_err(|e| e.to_string())
    }

    // ── Refresh ──────────────────────────────────────────────────────

    /// Replace the registry with the remote's current listing.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let (devices, gateways) = tokio::join!(self.api.list_devices(), self.api.list_gateways());

        let (devices, gateways) = match (devices, gateways) {
            (Ok(d), Ok(g)) => (d, g),
            (Err(source), _) | (_, Err(source)) => {
                return Err(CoreError::RemoteCall {
                    action: "refresh".into(),
                    count: self.store.device_count() + self.store.gateway_count(),
                    source,
                });
            }
        };

        self.store.apply_refresh(devices, gateways);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::testing::{Call, FakeApi, device, gateway};
    use pretty_assertions::assert_eq;

    use ActivationState::{Paused, Playing};
    use UplinkState::{Running, Stopped};

    async fn setup(api: FakeApi) -> (Arc<FakeApi>, Dispatcher) {
        let api = Arc::new(api);
        let dispatcher = Dispatcher::new(
            Arc::new(DataStore::new()),
            Arc::clone(&api) as Arc<dyn FleetApi>,
        );
        dispatcher.refresh().await.unwrap();
        (api, dispatcher)
    }

    fn sel(ids: &[&str]) -> Selection {
        ids.iter().copied().map(EntityId::from).collect()
    }

    fn state_of(dispatcher: &Dispatcher, id: &str) -> (ActivationState, UplinkState) {
        let d = dispatcher.store().device(&EntityId::from(id)).unwrap();
        (d.activation, d.uplink)
    }

    #[tokio::test]
    async fn start_paused_selection_plays_every_member() {
        let (api, dispatcher) = setup(FakeApi::with_fleet(
            vec![device("D1", Paused, Stopped), device("D2", Paused, Stopped)],
            Vec::new(),
        ))
        .await;

        let result = dispatcher.start_devices(&sel(&["D1", "D2"])).await.unwrap();

        assert_eq!(result.changed, 2);
        assert_eq!(state_of(&dispatcher, "D1").0, Playing);
        assert_eq!(state_of(&dispatcher, "D2").0, Playing);
        assert_eq!(
            api.mutations(),
            vec![Call::SetActivation(
                vec![EntityId::from("D1"), EntityId::from("D2")],
                Playing
            )]
        );
    }

    #[tokio::test]
    async fn mixed_stop_is_rejected_without_remote_call() {
        let (api, dispatcher) = setup(FakeApi::with_fleet(
            vec![device("D1", Playing, Running), device("D2", Paused, Stopped)],
            Vec::new(),
        ))
        .await;
        let before = dispatcher.store().revision();

        let err = dispatcher.stop_devices(&sel(&["D1", "D2"])).await.unwrap_err();

        assert!(matches!(err, CoreError::Validation { count: 2, .. }), "{err:?}");
        assert!(api.mutations().is_empty());
        assert_eq!(dispatcher.store().revision(), before);
        assert_eq!(state_of(&dispatcher, "D1"), (Playing, Running));
    }

    #[tokio::test]
    async fn stop_on_paused_selection_is_rejected() {
        let (api, dispatcher) = setup(FakeApi::with_fleet(
            vec![device("D1", Paused, Stopped)],
            Vec::new(),
        ))
        .await;

        let err = dispatcher.stop_devices(&sel(&["D1"])).await.unwrap_err();

        assert!(matches!(err, CoreError::Validation { .. }));
        assert!(api.mutations().is_empty());
    }

    #[tokio::test]
    async fn stop_always_halts_uplink() {
        let (_api, dispatcher) = setup(FakeApi::with_fleet(
            vec![device("D1", Playing, Running), device("D2", Playing, Stopped)],
            Vec::new(),
        ))
        .await;

        dispatcher.stop_devices(&sel(&["D1", "D2"])).await.unwrap();

        for id in ["D1", "D2"] {
            assert_eq!(state_of(&dispatcher, id), (Paused, Stopped));
        }
    }

    #[tokio::test]
    async fn uplink_commands_follow_their_gates() {
        let (api, dispatcher) = setup(FakeApi::with_fleet(
            vec![device("D1", Playing, Stopped), device("D2", Paused, Stopped)],
            Vec::new(),
        ))
        .await;

        dispatcher.start_uplink(&sel(&["D1"])).await.unwrap();
        assert_eq!(state_of(&dispatcher, "D1"), (Playing, Running));

        let err = dispatcher.start_uplink(&sel(&["D2"])).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));

        dispatcher.stop_uplink(&sel(&["D1"])).await.unwrap();
        assert_eq!(state_of(&dispatcher, "D1"), (Playing, Stopped));
        assert_eq!(api.mutations().len(), 2);
    }

    #[tokio::test]
    async fn empty_selection_is_rejected() {
        let (api, dispatcher) = setup(FakeApi::new()).await;
        for command in FleetCommand::ALL {
            let err = dispatcher.execute(command, &Selection::new()).await.unwrap_err();
            assert!(matches!(err, CoreError::Validation { count: 0, .. }));
        }
        assert!(api.mutations().is_empty());
    }

    #[tokio::test]
    async fn remote_failure_leaves_registry_untouched() {
        let (api, dispatcher) = setup(FakeApi::with_fleet(
            vec![device("D1", Paused, Stopped), device("D2", Paused, Stopped)],
            Vec::new(),
        ))
        .await;
        api.fail_commands(502);
        let before = dispatcher.store().revision();

        let err = dispatcher.start_devices(&sel(&["D1", "D2"])).await.unwrap_err();

        assert!(matches!(err, CoreError::RemoteCall { count: 2, .. }));
        assert!(err.to_string().starts_with("Failed to start 2 record(s)"));
        assert_eq!(dispatcher.store().revision(), before);
        assert_eq!(state_of(&dispatcher, "D1").0, Paused);
    }

    #[tokio::test]
    async fn gate_reads_current_registry() {
        let (api, dispatcher) = setup(FakeApi::with_fleet(
            vec![device("D1", Paused, Stopped)],
            Vec::new(),
        ))
        .await;
        let selection = sel(&["D1"]);
        assert!(dispatcher.gates(&selection).can_start);

        api.set_remote_device(device("D1", Playing, Stopped));
        dispatcher.refresh().await.unwrap();

        assert!(!dispatcher.gates(&selection).can_start);
        assert!(dispatcher.gates(&selection).can_stop);
    }

    #[tokio::test]
    async fn declined_confirmation_sends_nothing() {
        let (api, dispatcher) = setup(FakeApi::with_fleet(
            vec![device("D1", Paused, Stopped)],
            Vec::new(),
        ))
        .await;
        let asked = Mutex::new(String::new());
        let decline = |prompt: &str| {
            *asked.lock().unwrap() = prompt.to_owned();
            false
        };

        let outcome = dispatcher.delete_records(&sel(&["D1"]), &decline).await.unwrap();

        assert_eq!(outcome, DeleteOutcome::Cancelled);
        assert_eq!(*asked.lock().unwrap(), "Are you sure you want to delete 1 selected record(s)?");
        assert!(api.mutations().is_empty());
        assert_eq!(dispatcher.store().device_count(), 1);
    }

    #[tokio::test]
    async fn delete_routes_by_record_kind() {
        let (api, dispatcher) = setup(FakeApi::with_fleet(
            vec![device("D1", Paused, Stopped), device("D2", Paused, Stopped)],
            vec![gateway("G1")],
        ))
        .await;

        let outcome = dispatcher
            .delete_records(&sel(&["D1", "G1"]), &|_: &str| true)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            DeleteOutcome::Deleted {
                ids: vec![EntityId::from("D1"), EntityId::from("G1")]
            }
        );
        let mutations = api.mutations();
        assert!(mutations.contains(&Call::DeleteDevice(EntityId::from("D1"))));
        assert!(mutations.contains(&Call::DeleteGateway(EntityId::from("G1"))));
        let ids: Vec<String> = dispatcher
            .store()
            .list()
            .iter()
            .map(|r| r.id().to_string())
            .collect();
        assert_eq!(ids, vec!["D2"]);
    }

    #[tokio::test]
    async fn partial_delete_reports_failed_subset() {
        let (api, dispatcher) = setup(FakeApi::with_fleet(
            vec![
                device("D1", Paused, Stopped),
                device("D2", Paused, Stopped),
                device("D3", Paused, Stopped),
            ],
            Vec::new(),
        ))
        .await;
        api.fail_delete("D2");

        let err = dispatcher
            .delete_records(&sel(&["D1", "D2", "D3"]), &|_: &str| true)
            .await
            .unwrap_err();

        match &err {
            CoreError::PartialDelete { total, failed } => {
                assert_eq!(*total, 3);
                assert_eq!(failed.len(), 1);
                assert_eq!(failed[0].id, EntityId::from("D2"));
            }
            other => panic!("expected PartialDelete, got {other:?}"),
        }
        assert_eq!(dispatcher.store().device_count(), 1);
        assert!(dispatcher.store().device(&EntityId::from("D2")).is_some());
    }

    #[tokio::test]
    async fn deleted_ids_leave_registry_even_if_refresh_fails() {
        let (api, dispatcher) = setup(FakeApi::with_fleet(
            vec![device("D1", Paused, Stopped), device("D2", Paused, Stopped)],
            Vec::new(),
        ))
        .await;
        api.fail_lists(503);

        dispatcher
            .delete_records(&sel(&["D1"]), &|_: &str| true)
            .await
            .unwrap();

        assert!(dispatcher.store().device(&EntityId::from("D1")).is_none());
        assert_eq!(dispatcher.store().device_count(), 1);
    }

    #[tokio::test]
    async fn unknown_ids_fail_delete_without_remote_call() {
        let (api, dispatcher) = setup(FakeApi::new()).await;

        let err = dispatcher
            .delete_records(&sel(&["ghost"]), &|_: &str| true)
            .await
            .unwrap_err();

        assert_eq!(err.failed_ids(), vec![EntityId::from("ghost")]);
        assert!(api.mutations().is_empty());
    }

    #[tokio::test]
    async fn refresh_failure_is_remote_call_error() {
        let (api, dispatcher) = setup(FakeApi::with_fleet(
            vec![device("D1", Paused, Stopped)],
            Vec::new(),
        ))
        .await;
        api.fail_lists(500);

        let err = dispatcher.refresh().await.unwrap_err();

        assert!(matches!(err, CoreError::RemoteCall { count: 1, .. }));
        assert_eq!(dispatcher.store().device_count(), 1);
    }
}
