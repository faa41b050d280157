use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::api::{LicenseAck, RemoteClient};
use crate::error::ApiError;
use crate::storage::{StateStorage, LICENSE_STATUS_STORAGE_NAME};
use crate::store::persist::Persister;

/// The persisted outcome flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseStatus {
    pub is_license_activated: bool,
    pub is_license_checked: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LicensePhase {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

/// Progress and messages of one license action
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LicenseAction {
    pub phase: LicensePhase,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LicenseState {
    pub status: LicenseStatus,
    pub activation: LicenseAction,
    pub check: LicenseAction,
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    Activate,
    Check,
}

impl Kind {
    fn action<'a>(&self, state: &'a mut LicenseState) -> &'a mut LicenseAction {
        match self {
            Kind::Activate => &mut state.activation,
            Kind::Check => &mut state.check,
        }
    }

    /// The outcome flag this action decides
    fn flag<'a>(&self, status: &'a mut LicenseStatus) -> &'a mut bool {
        match self {
            Kind::Activate => &mut status.is_license_activated,
            Kind::Check => &mut status.is_license_checked,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Kind::Activate => "activating",
            Kind::Check => "checking",
        }
    }
}

pub struct LicenseStore {
    state: watch::Sender<LicenseState>,
    persister: Persister,
    client: Arc<dyn RemoteClient>,
}

impl LicenseStore {
    /// Create the store and rehydrate the outcome flags from storage
    pub async fn open(storage: Arc<dyn StateStorage>, client: Arc<dyn RemoteClient>) -> Self {
        let (state, _) = watch::channel(LicenseState::default());
        let store = Self {
            state,
            persister: Persister::spawn(storage, LICENSE_STATUS_STORAGE_NAME),
            client,
        };

        if let Some(status) = store.persister.load::<LicenseStatus>().await {
            store.state.send_modify(|state| state.status = status);
        }

        store
    }

    pub fn state(&self) -> LicenseState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LicenseState> {
        self.state.subscribe()
    }

    pub fn is_activated(&self) -> bool {
        self.state.borrow().status.is_license_activated
    }

    pub async fn flush(&self) {
        self.persister.flush().await;
    }

    fn set(&self, action: &str, update: impl FnOnce(&mut LicenseState)) {
        self.state.send_modify(|state| {
            let mut next = state.clone();
            update(&mut next);

            if next.status != state.status {
                self.persister.persist(&next.status);
            }

            tracing::debug!(action, "license store");
            *state = next;
        });
    }

    pub async fn activate_license(&self, key: &str, cancel: &CancellationToken) {
        self.begin(Kind::Activate);
        let result = self.client.activate_license(key, cancel).await;
        self.settle(Kind::Activate, result);
    }

    pub async fn check_license_activation(&self, key: &str, cancel: &CancellationToken) {
        self.begin(Kind::Check);
        let result = self.client.check_license(key, cancel).await;
        self.settle(Kind::Check, result);
    }

    fn begin(&self, kind: Kind) {
        self.set(kind.name(), |state| {
            let action = kind.action(state);
            action.phase = LicensePhase::InFlight;
            action.error_message = None;
        });
    }

    fn settle(&self, kind: Kind, result: Result<LicenseAck, ApiError>) {
        match result {
            Ok(ack) => self.set(&format!("{}Success", kind.name()), |state| {
                *kind.flag(&mut state.status) = true;
                let action = kind.action(state);
                action.phase = LicensePhase::Succeeded;
                action.success_message = Some(ack.message);
            }),
            Err(e) if e.is_cancelled() => self.set(&format!("{}Cancelled", kind.name()), |state| {
                kind.action(state).phase = LicensePhase::Idle;
            }),
            Err(e) => self.set(&format!("{}Error", kind.name()), |state| {
                *kind.flag(&mut state.status) = false;
                let action = kind.action(state);
                action.phase = LicensePhase::Failed;
                action.error_message = Some(e.user_message());
            }),
        }
    }

    /// Clear the activation messages; outcome flags are kept
    pub fn clear_license_activation_state(&self) {
        self.set("clearActivateState", |state| {
            state.activation.success_message = None;
            state.activation.error_message = None;
        });
    }

    /// Clear the check messages; outcome flags are kept
    pub fn clear_license_check_state(&self) {
        self.set("clearCheckState", |state| {
            state.check.success_message = None;
            state.check.error_message = None;
        });
    }
}
