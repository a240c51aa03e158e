//! 设备状态缓存
//! - 设备 id 到最近一次已知状态 {running, online} 的映射
//! - 超过 ttl（默认 30 秒）、强制刷新或缓存为空时才会请求批量状态接口
//! - 同一批设备的并发刷新合并为一次请求
//! - 刷新失败不会清空已有数据
//! - 刷新开始之后写入的乐观状态不会被本次刷新结果覆盖
//! - 操作进行中（乐观状态尚未提交或回滚）的设备不接受刷新结果

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::common::error::ClientResult;
use crate::common::http::require_token;
use crate::entity::dto::device_dto::DeviceStatus;
use crate::entity::dto::event_dto::ClientEvent;
use crate::gateway::vendor_api::VendorApi;
use crate::store::session_store::SessionStore;
use crate::{debug, info, warn};

const LOG_TAG: &str = "status-cache";

type RefreshFuture = Shared<BoxFuture<'static, ClientResult<()>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// cache still fresh, no network call
    Skipped,
    Refreshed,
}

struct CachedEntry {
    status: DeviceStatus,
    // write sequence, compared against the sequence at refresh start
    version: u64,
    // optimistic value waiting for commit or rollback
    pending: bool,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CachedEntry>,
    last_refreshed_at: Option<Instant>,
    version: u64,
}

impl CacheState {
    fn write(&mut self, status: DeviceStatus, pending: bool) {
        self.version += 1;
        let version = self.version;
        self.entries.insert(status.device_id.clone(), CachedEntry { status, version, pending });
    }
}

pub struct DeviceStatusCache {
    api: Arc<dyn VendorApi>,
    session: Arc<SessionStore>,
    ttl: Duration,
    state: Arc<Mutex<CacheState>>,
    in_flight: Arc<Mutex<HashMap<Vec<String>, RefreshFuture>>>,
    events: broadcast::Sender<ClientEvent>,
}

impl DeviceStatusCache {
    pub fn new(
        api: Arc<dyn VendorApi>,
        session: Arc<SessionStore>,
        ttl: Duration,
        events: broadcast::Sender<ClientEvent>,
    ) -> Self {
        DeviceStatusCache {
            api,
            session,
            ttl,
            state: Arc::new(Mutex::new(CacheState::default())),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            events,
        }
    }

    pub fn get(&self, device_id: &str) -> Option<DeviceStatus> {
        let state_guard = self.state.lock().unwrap();
        state_guard.entries.get(device_id).map(|e| e.status.clone())
    }

    pub fn snapshot(&self) -> Vec<DeviceStatus> {
        let state_guard = self.state.lock().unwrap();
        let mut list: Vec<DeviceStatus> = state_guard.entries.values().map(|e| e.status.clone()).collect();
        list.sort_by(|a, b| a.device_id.cmp(&b.device_id));
        list
    }

    pub fn is_stale(&self) -> bool {
        let state_guard = self.state.lock().unwrap();
        if state_guard.entries.is_empty() {
            return true;
        }
        match state_guard.last_refreshed_at {
            Some(at) => at.elapsed() > self.ttl,
            None => true,
        }
    }

    /// refresh the batch when stale, empty or forced, otherwise no-op
    pub async fn refresh_if_stale(&self, device_ids: &[String], force: bool) -> ClientResult<RefreshOutcome> {
        if !force && !self.is_stale() {
            debug!(LOG_TAG, "status cache fresh, skip refresh");
            return Ok(RefreshOutcome::Skipped);
        }

        let key = batch_key(device_ids);
        let refresh = {
            let mut in_flight_guard = self.in_flight.lock().unwrap();
            match in_flight_guard.get(&key) {
                Some(running) => {
                    debug!(LOG_TAG, "refresh already in flight for {:?}, joining", key);
                    running.clone()
                }
                None => {
                    let fut = self.make_refresh(key.clone()).boxed().shared();
                    in_flight_guard.insert(key, fut.clone());
                    fut
                }
            }
        };
        refresh.await?;
        Ok(RefreshOutcome::Refreshed)
    }

    /// overwrite one entry right away, returns the previous status for rollback
    /// the entry ignores refresh results until `commit` or `restore`
    pub fn apply_optimistic(&self, device_id: &str, running: bool) -> Option<DeviceStatus> {
        let (previous, current) = {
            let mut state_guard = self.state.lock().unwrap();
            let previous = state_guard.entries.get(device_id).map(|e| e.status.clone());
            // only an online device can be operated, assume online when unknown
            let online = previous.as_ref().map(|s| s.online).unwrap_or(true);
            let current = DeviceStatus::new(device_id, running, online);
            state_guard.write(current.clone(), true);
            (previous, current)
        };
        debug!(LOG_TAG, "optimistic status for {}: running={}", device_id, running);
        self.emit(current);
        previous
    }

    /// keep the optimistic value as the confirmed one
    pub fn commit(&self, device_id: &str) {
        let mut state_guard = self.state.lock().unwrap();
        if let Some(entry) = state_guard.entries.get_mut(device_id) {
            entry.pending = false;
        }
    }

    /// put back a pre-operation snapshot, no snapshot means the entry is dropped
    pub fn restore(&self, device_id: &str, previous: Option<DeviceStatus>) {
        match previous {
            Some(status) => {
                self.state.lock().unwrap().write(status.clone(), false);
                self.emit(status);
            }
            None => {
                {
                    let mut state_guard = self.state.lock().unwrap();
                    state_guard.version += 1;
                    state_guard.entries.remove(device_id);
                }
                let _ = self.events.send(ClientEvent::DeviceStatusCleared(device_id.to_string()));
            }
        }
    }

    pub fn clear(&self) {
        let mut state_guard = self.state.lock().unwrap();
        state_guard.entries.clear();
        state_guard.last_refreshed_at = None;
    }

    fn emit(&self, status: DeviceStatus) {
        // no subscriber is fine
        let _ = self.events.send(ClientEvent::DeviceStatusChanged(status));
    }

    fn make_refresh(&self, key: Vec<String>) -> impl std::future::Future<Output = ClientResult<()>> + Send + 'static {
        let api = self.api.clone();
        let session = self.session.clone();
        let state = self.state.clone();
        let in_flight = self.in_flight.clone();
        let events = self.events.clone();
        async move {
            let result = fetch_and_apply(api, session, state, events, &key).await;
            in_flight.lock().unwrap().remove(&key);
            result
        }
    }
}

async fn fetch_and_apply(
    api: Arc<dyn VendorApi>,
    session: Arc<SessionStore>,
    state: Arc<Mutex<CacheState>>,
    events: broadcast::Sender<ClientEvent>,
    device_ids: &[String],
) -> ClientResult<()> {
    let token = session.token().await;
    let token = require_token(token.as_deref())?;
    let start_version = state.lock().unwrap().version;

    let statuses = match api.get_device_status(Some(token), device_ids).await {
        Ok(list) => list,
        Err(e) => {
            warn!(LOG_TAG, "status refresh failed, keep cached entries: {}", e);
            return Err(e);
        }
    };

    let changed = {
        let mut state_guard = state.lock().unwrap();
        let mut changed = Vec::new();
        for status in statuses {
            match state_guard.entries.get(&status.device_id) {
                // written after this refresh started, the newer local write wins
                Some(entry) if entry.version > start_version => continue,
                // server answer may predate the command in flight
                Some(entry) if entry.pending => continue,
                Some(entry) if entry.status == status => continue,
                _ => {}
            }
            state_guard.write(status.clone(), false);
            changed.push(status);
        }
        state_guard.last_refreshed_at = Some(Instant::now());
        changed
    };

    info!(LOG_TAG, "status refreshed for {} devices, {} changed", device_ids.len(), changed.len());
    for status in changed {
        let _ = events.send(ClientEvent::DeviceStatusChanged(status));
    }
    Ok(())
}

fn batch_key(device_ids: &[String]) -> Vec<String> {
    let mut key = device_ids.to_vec();
    key.sort();
    key.dedup();
    key
}
