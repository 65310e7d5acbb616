//! Public facade over the robot controller HTTP API. One thin method per
//! robot action; each formats exactly one URL and funnels through a single
//! invoke-and-fetch helper. The client is a dumb conduit: it never
//! validates arguments against the capability table or enforces the
//! robot's state machine, sequencing correctness is the caller's job.

use std::path::Path;

use log::{info, warn};
use urlencoding::encode;

use crate::capability::{discovery, CapabilityStore, CapabilityTable};
use crate::error::ClientResult;
use crate::protocol::{ResponsePayload, Transceiver};

/// Synchronous client for one robot controller.
///
/// Construction is explicit and performs I/O: it ensures the capability
/// file exists, runs a discovery pass over a private transceiver, then
/// opens the long-lived request transceiver. Each action method returns
/// `Ok(None)` when the robot stayed silent for the full response window;
/// callers must check for it.
pub struct RobotClient {
    base_url: String,
    transceiver: Transceiver,
    store: CapabilityStore,
    table: CapabilityTable,
}

impl RobotClient {
    /// Connect to the controller at `base_url`, e.g.
    /// `http://10.0.34.12:8080`, using the capability file at
    /// `capability_path` (created as an empty skeleton when absent).
    pub fn connect_to(base_url: &str, capability_path: &Path) -> ClientResult<Self> {
        CapabilityStore::create_if_absent(capability_path)?;
        let store = CapabilityStore::open(capability_path)?;

        // Discovery gets its own transceiver/mailbox pair so its round
        // trips can never be confused with an application response.
        let discovery_link = Transceiver::open(base_url)?;
        let table = discovery::run(&store, &discovery_link);

        Ok(Self {
            base_url: base_url.to_string(),
            transceiver: Transceiver::open(base_url)?,
            store,
            table,
        })
    }

    /// Re-read the capability file and repeat the discovery pass,
    /// replacing the published table wholesale.
    pub fn rediscover(&mut self) -> ClientResult<()> {
        self.store.reload()?;
        let link = Transceiver::open(&self.base_url)?;
        self.table = discovery::run(&self.store, &link);
        Ok(())
    }

    /// The live capability table, read-only. Callers (e.g. a CLI) validate
    /// arguments against this before sending.
    pub fn capabilities(&self) -> &CapabilityTable {
        &self.table
    }

    pub fn store(&self) -> &CapabilityStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut CapabilityStore {
        &mut self.store
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ========================================================================
    // Robot actions
    // ========================================================================

    pub fn connect(&self, client_name: &str) -> ClientResult<Option<ResponsePayload>> {
        self.invoke(
            "connect",
            format!("/DoD/Connect?ClientName={}", encode(client_name)),
        )
    }

    pub fn disconnect(&self) -> ClientResult<Option<ResponsePayload>> {
        self.invoke("disconnect", "/DoD/Disconnect".to_string())
    }

    /// Query a read-only endpoint by name, e.g. "Status" or
    /// "PositionNames".
    pub fn get(&self, endpoint: &str) -> ClientResult<Option<ResponsePayload>> {
        self.invoke("get", format!("/DoD/get/{}", encode(endpoint)))
    }

    pub fn get_status(&self) -> ClientResult<Option<ResponsePayload>> {
        self.invoke("get_status", "/DoD/get/Status".to_string())
    }

    /// Move to a named position from the robot's position list.
    pub fn move_to(&self, position: &str) -> ClientResult<Option<ResponsePayload>> {
        self.invoke(
            "move",
            format!("/DoD/do/Move?PositionName={}", encode(position)),
        )
    }

    pub fn move_x(&self, position: f64) -> ClientResult<Option<ResponsePayload>> {
        self.invoke("move_x", format!("/DoD/do/MoveX?Position={}", position))
    }

    pub fn move_y(&self, position: f64) -> ClientResult<Option<ResponsePayload>> {
        self.invoke("move_y", format!("/DoD/do/MoveY?Position={}", position))
    }

    pub fn move_z(&self, position: f64) -> ClientResult<Option<ResponsePayload>> {
        self.invoke("move_z", format!("/DoD/do/MoveZ?Position={}", position))
    }

    pub fn execute_task(&self, task: &str) -> ClientResult<Option<ResponsePayload>> {
        self.invoke(
            "task",
            format!("/DoD/do/ExecuteTask?TaskName={}", encode(task)),
        )
    }

    pub fn set_nozzle_parameters(
        &self,
        voltage: f64,
        pulse_width: f64,
    ) -> ClientResult<Option<ResponsePayload>> {
        self.invoke(
            "set_nozzle_parameters",
            format!(
                "/DoD/do/SetNozzleParameters?Voltage={}&PulseWidth={}",
                voltage, pulse_width
            ),
        )
    }

    /// Acknowledge an open dialog. `reference` is the monotonically
    /// incrementing dialog number the robot reported (its `LastID`).
    pub fn close_dialog(&self, reference: i64) -> ClientResult<Option<ResponsePayload>> {
        self.invoke(
            "close_dialog",
            format!("/DoD/do/CloseDialog?DialogID={}", reference),
        )
    }

    pub fn reset_error(&self) -> ClientResult<Option<ResponsePayload>> {
        self.invoke("reset_error", "/DoD/do/ResetError".to_string())
    }

    /// The one place every action goes through: log the request, send it,
    /// wait for the reply, log the outcome.
    fn invoke(&self, action: &str, path: String) -> ClientResult<Option<ResponsePayload>> {
        info!("{}: GET {}", action, path);
        self.transceiver.send(&path)?;
        let reply = self.transceiver.get_response();
        match &reply {
            Some(payload) => info!(
                "{}: {} (error code {})",
                action,
                payload
                    .state()
                    .map_or_else(|| "?".to_string(), |s| s.to_string()),
                payload.error_code
            ),
            None => warn!(
                "{}: no response within {:?}",
                action,
                Transceiver::RESPONSE_TIMEOUT
            ),
        }
        Ok(reply)
    }
}
