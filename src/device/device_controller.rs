//! 设备启停控制
//! 每个设备的状态机: Idle -> Operating -> {Committed, RolledBack} -> Idle
//! - 同一设备操作进行中时，重复请求直接忽略，不会产生第二次网络请求
//! - 请求发出前先写入乐观状态，失败时恢复操作前的状态并提示一次错误
//! - 启动成功后在冷却时间内（默认 2000ms）禁止停止，避免与设备自身的启动延迟冲突
//! - 按钮可用性每次从缓存、操作集合、冷却集合实时计算，没有单独保存的 enabled 字段

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::status_cache::DeviceStatusCache;
use crate::common::error::{ClientError, ClientResult};
use crate::common::http::require_token;
use crate::entity::dto::device_dto::DeviceStatus;
use crate::entity::dto::event_dto::ClientEvent;
use crate::gateway::vendor_api::VendorApi;
use crate::store::session_store::SessionStore;
use crate::{debug, info, warn};

const LOG_TAG: &str = "device-controller";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAction {
    Start,
    Stop,
}

impl ControlAction {
    /// running flag the device should end up with
    pub fn target_running(&self) -> bool {
        matches!(self, ControlAction::Start)
    }
}

impl Display for ControlAction {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ControlAction::Start => write!(f, "start"),
            ControlAction::Stop => write!(f, "stop"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationPhase {
    Idle,
    Operating(ControlAction),
    Committed(ControlAction),
    RolledBack(ControlAction),
}

impl OperationPhase {
    pub fn can_transition(&self, next: OperationPhase) -> bool {
        use OperationPhase::*;
        match (*self, next) {
            (Idle, Operating(_)) => true,
            (Operating(a), Committed(b)) | (Operating(a), RolledBack(b)) => a == b,
            (Committed(_), Idle) | (RolledBack(_), Idle) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOutcome {
    /// server accepted the command, optimistic status kept as final
    Committed,
    /// same device already has a request in flight, nothing sent
    AlreadyOperating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceControls {
    pub start_enabled: bool,
    pub stop_enabled: bool,
}

/// start: online, not running, not operating
/// stop: online, running, not operating, not cooling down
pub fn evaluate_controls(status: Option<&DeviceStatus>, operating: bool, stop_cooling_down: bool) -> DeviceControls {
    let Some(status) = status else {
        return DeviceControls::default();
    };
    DeviceControls {
        start_enabled: status.online && !status.running && !operating,
        stop_enabled: status.online && status.running && !operating && !stop_cooling_down,
    }
}

#[derive(Default)]
struct ControlState {
    // Idle devices have no entry
    phases: HashMap<String, OperationPhase>,
    stop_disabled_until: HashMap<String, Instant>,
}

impl ControlState {
    fn phase(&self, device_id: &str) -> OperationPhase {
        self.phases.get(device_id).copied().unwrap_or(OperationPhase::Idle)
    }

    fn transition(&mut self, device_id: &str, next: OperationPhase) {
        let current = self.phase(device_id);
        if !current.can_transition(next) {
            warn!(LOG_TAG, "illegal transition for {}: {:?} -> {:?}, ignored", device_id, current, next);
            return;
        }
        trace_transition(device_id, current, next);
        match next {
            OperationPhase::Idle => {
                self.phases.remove(device_id);
            }
            other => {
                self.phases.insert(device_id.to_string(), other);
            }
        }
    }

    fn is_operating(&self, device_id: &str) -> bool {
        matches!(self.phase(device_id), OperationPhase::Operating(_))
    }

    fn is_stop_cooling_down(&mut self, device_id: &str, now: Instant) -> bool {
        match self.stop_disabled_until.get(device_id) {
            Some(deadline) if now < *deadline => true,
            Some(_) => {
                self.stop_disabled_until.remove(device_id);
                false
            }
            None => false,
        }
    }
}

fn trace_transition(device_id: &str, from: OperationPhase, to: OperationPhase) {
    crate::trace!(LOG_TAG, "{}: {:?} -> {:?}", device_id, from, to);
}

pub struct DeviceController {
    api: Arc<dyn VendorApi>,
    session: Arc<SessionStore>,
    cache: Arc<DeviceStatusCache>,
    state: Mutex<ControlState>,
    stop_cooldown: Duration,
    events: broadcast::Sender<ClientEvent>,
    cancel: CancellationToken,
}

impl DeviceController {
    pub fn new(
        api: Arc<dyn VendorApi>,
        session: Arc<SessionStore>,
        cache: Arc<DeviceStatusCache>,
        stop_cooldown: Duration,
        events: broadcast::Sender<ClientEvent>,
        cancel: CancellationToken,
    ) -> Self {
        DeviceController {
            api,
            session,
            cache,
            state: Mutex::new(ControlState::default()),
            stop_cooldown,
            events,
            cancel,
        }
    }

    pub async fn start(&self, device_id: &str) -> ClientResult<ControlOutcome> {
        self.operate(device_id, ControlAction::Start).await
    }

    /// never short-circuited by the cached state, the server decides
    pub async fn stop(&self, device_id: &str) -> ClientResult<ControlOutcome> {
        self.operate(device_id, ControlAction::Stop).await
    }

    pub fn phase(&self, device_id: &str) -> OperationPhase {
        self.state.lock().unwrap().phase(device_id)
    }

    pub fn is_operating(&self, device_id: &str) -> bool {
        self.state.lock().unwrap().is_operating(device_id)
    }

    pub fn is_stop_disabled(&self, device_id: &str) -> bool {
        self.state.lock().unwrap().is_stop_cooling_down(device_id, Instant::now())
    }

    /// recomputed on every call
    pub fn controls(&self, device_id: &str) -> DeviceControls {
        let status = self.cache.get(device_id);
        let mut state_guard = self.state.lock().unwrap();
        let operating = state_guard.is_operating(device_id);
        let cooling_down = state_guard.is_stop_cooling_down(device_id, Instant::now());
        evaluate_controls(status.as_ref(), operating, cooling_down)
    }

    async fn operate(&self, device_id: &str, action: ControlAction) -> ClientResult<ControlOutcome> {
        let token = self.session.token().await;
        let token = require_token(token.as_deref())?;
        if self.cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        {
            let mut state_guard = self.state.lock().unwrap();
            if state_guard.is_operating(device_id) {
                debug!(LOG_TAG, "{} {} ignored, operation already in flight", action, device_id);
                return Ok(ControlOutcome::AlreadyOperating);
            }
            state_guard.transition(device_id, OperationPhase::Operating(action));
        }
        let previous = self.cache.apply_optimistic(device_id, action.target_running());
        info!(LOG_TAG, "{} device {}", action, device_id);

        let result = tokio::select! {
            result = self.call_gateway(token, device_id, action) => result,
            _ = self.cancel.cancelled() => Err(ClientError::Cancelled),
        };

        match result {
            Ok(()) => {
                self.cache.commit(device_id);
                let mut state_guard = self.state.lock().unwrap();
                state_guard.transition(device_id, OperationPhase::Committed(action));
                if action == ControlAction::Start {
                    state_guard
                        .stop_disabled_until
                        .insert(device_id.to_string(), Instant::now() + self.stop_cooldown);
                }
                state_guard.transition(device_id, OperationPhase::Idle);
                info!(LOG_TAG, "{} device {} committed", action, device_id);
                Ok(ControlOutcome::Committed)
            }
            Err(e) => {
                self.state
                    .lock()
                    .unwrap()
                    .transition(device_id, OperationPhase::RolledBack(action));
                self.cache.restore(device_id, previous);
                self.state.lock().unwrap().transition(device_id, OperationPhase::Idle);

                if e == ClientError::Cancelled {
                    // owning scope is gone, nobody to show a message to
                    debug!(LOG_TAG, "{} device {} cancelled, rolled back", action, device_id);
                } else {
                    warn!(LOG_TAG, "{} device {} failed, rolled back: {}", action, device_id, e);
                    let _ = self.events.send(ClientEvent::OperationFailed {
                        device_id: device_id.to_string(),
                        action,
                        message: e.user_message(),
                    });
                }
                Err(e)
            }
        }
    }

    async fn call_gateway(&self, token: &str, device_id: &str, action: ControlAction) -> ClientResult<()> {
        match action {
            ControlAction::Start => self.api.start_device(Some(token), device_id).await,
            ControlAction::Stop => self.api.stop_device(Some(token), device_id).await,
        }
    }
}
