//! 充值支付流程
//! - 线性流程，任一步失败立即结束，不做部分重试
//! - 只支持支付宝渠道 (type 21)，没有时返回 UnsupportedPayment
//! - 同一时间只允许一个支付流程
//! - 流程结束（成功、失败、取消、出错）后 current_order 一定被清空

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use super::payment_outcome::PaymentOutcome;
use super::payment_sdk::PaymentSdk;
use crate::common::error::{ClientError, ClientResult};
use crate::common::http::require_token;
use crate::entity::dto::event_dto::ClientEvent;
use crate::entity::dto::payment_dto::{PaymentChannelDto, PaymentChannelType};
use crate::entity::dto::wallet_dto::RechargeOrderDto;
use crate::gateway::vendor_api::VendorApi;
use crate::store::session_store::SessionStore;
use crate::{debug, error, info, warn};

const LOG_TAG: &str = "payment";

#[derive(Default)]
struct PaymentState {
    in_progress: bool,
    current_order: Option<RechargeOrderDto>,
}

// resets the flow state when the pay future ends or is dropped
struct FlowGuard<'a> {
    state: &'a Mutex<PaymentState>,
}

impl Drop for FlowGuard<'_> {
    fn drop(&mut self) {
        let mut state_guard = self.state.lock().unwrap();
        state_guard.in_progress = false;
        state_guard.current_order = None;
    }
}

/// alipay when present
pub fn select_channel(channels: &[PaymentChannelDto]) -> Option<PaymentChannelType> {
    channels
        .iter()
        .map(|c| c.kind())
        .find(|kind| *kind == PaymentChannelType::Alipay)
}

pub struct PaymentOrchestrator {
    api: Arc<dyn VendorApi>,
    session: Arc<SessionStore>,
    sdk: Arc<dyn PaymentSdk>,
    state: Mutex<PaymentState>,
    events: broadcast::Sender<ClientEvent>,
    cancel: CancellationToken,
}

impl PaymentOrchestrator {
    pub fn new(
        api: Arc<dyn VendorApi>,
        session: Arc<SessionStore>,
        sdk: Arc<dyn PaymentSdk>,
        events: broadcast::Sender<ClientEvent>,
        cancel: CancellationToken,
    ) -> Self {
        PaymentOrchestrator {
            api,
            session,
            sdk,
            state: Mutex::new(PaymentState::default()),
            events,
            cancel,
        }
    }

    /// order of the running flow, `None` when idle
    pub fn current_order(&self) -> Option<RechargeOrderDto> {
        self.state.lock().unwrap().current_order.clone()
    }

    pub fn is_in_progress(&self) -> bool {
        self.state.lock().unwrap().in_progress
    }

    /// recharge `quantity` of `product_id` and pay it
    /// errors before the sdk returns are reported as `Err`, sdk results always as `Ok(outcome)`
    pub async fn pay(&self, product_id: &str, quantity: u32) -> ClientResult<PaymentOutcome> {
        let token = self.session.token().await;
        let token = require_token(token.as_deref())?;
        if self.cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        {
            let mut state_guard = self.state.lock().unwrap();
            if state_guard.in_progress {
                warn!(LOG_TAG, "payment rejected, another flow is running");
                return Err(ClientError::PaymentInProgress);
            }
            state_guard.in_progress = true;
        }
        let _flow = FlowGuard { state: &self.state };

        // cancellable until the sdk is launched
        let prepared = tokio::select! {
            prepared = self.prepare(token, product_id, quantity) => prepared,
            _ = self.cancel.cancelled() => Err(ClientError::Cancelled),
        };
        let (order, order_string) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!(LOG_TAG, "payment flow aborted: {}", e);
                return Err(e);
            }
        };
        Ok(self.launch_sdk(order, order_string).await)
    }

    /// order and provider order string, ready for the sdk
    async fn prepare(&self, token: &str, product_id: &str, quantity: u32) -> ClientResult<(RechargeOrderDto, String)> {
        // 1. create order
        let order = self.api.create_recharge_order(Some(token), product_id, quantity).await?;
        info!(LOG_TAG, "order created: {}, amount: {}", order.id, order.amount);
        self.state.lock().unwrap().current_order = Some(order.clone());

        // 2. pick channel
        let channels = self.api.get_payment_channels(Some(token), &order.id).await?;
        let Some(channel) = select_channel(&channels) else {
            warn!(LOG_TAG, "no alipay channel for order {}, channels: {:?}", order.id, channels);
            return Err(ClientError::UnsupportedPayment);
        };

        // 3. provider order string
        let request = self.api.request_payment(Some(token), &order.id, channel.code()).await?;
        debug!(LOG_TAG, "payment string received for order {}", order.id);
        Ok((order, request.order_string))
    }

    /// sdk blocks until the user returns, the result is always awaited once launched
    async fn launch_sdk(&self, order: RechargeOrderDto, order_string: String) -> PaymentOutcome {
        let sdk = self.sdk.clone();
        let outcome = match tokio::task::spawn_blocking(move || sdk.pay(&order_string)).await {
            Ok(result_map) => {
                info!(LOG_TAG, "sdk result for order {}: {}, memo: {}", order.id, result_map.result_status, result_map.memo);
                PaymentOutcome::from_result_status(&result_map.result_status)
            }
            Err(e) => {
                // sdk crashed after the sheet was shown, the money may have moved
                error!(LOG_TAG, "payment sdk task failed for order {}: {}", order.id, e);
                PaymentOutcome::Unknown
            }
        };

        info!(LOG_TAG, "payment finished, order: {}, outcome: {:?}", order.id, outcome);
        let _ = self.events.send(ClientEvent::PaymentFinished {
            order_id: order.id.clone(),
            outcome,
        });
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::entity::dto::payment_dto::PaymentResultMap;
    use crate::gateway::fake_vendor_api::{logged_in_session, FakeVendorApi};
    use crate::store::kv_store::MemoryKvStore;

    struct ScriptedSdk {
        result_status: String,
        calls: AtomicUsize,
        last_order: Mutex<Option<String>>,
    }

    impl ScriptedSdk {
        fn new(result_status: &str) -> Arc<Self> {
            Arc::new(ScriptedSdk {
                result_status: result_status.to_string(),
                calls: AtomicUsize::new(0),
                last_order: Mutex::new(None),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl PaymentSdk for ScriptedSdk {
        fn pay(&self, order_string: &str) -> PaymentResultMap {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_order.lock().unwrap() = Some(order_string.to_string());
            PaymentResultMap {
                result_status: self.result_status.clone(),
                ..Default::default()
            }
        }
    }

    // user leaves the app while the payment sheet is open
    struct CancellingSdk {
        cancel: CancellationToken,
    }

    impl PaymentSdk for CancellingSdk {
        fn pay(&self, _order_string: &str) -> PaymentResultMap {
            self.cancel.cancel();
            PaymentResultMap {
                result_status: "9000".to_string(),
                ..Default::default()
            }
        }
    }

    struct PanickingSdk;

    impl PaymentSdk for PanickingSdk {
        fn pay(&self, _order_string: &str) -> PaymentResultMap {
            panic!("sdk crashed");
        }
    }

    struct Fixture {
        api: Arc<FakeVendorApi>,
        orchestrator: PaymentOrchestrator,
        events: broadcast::Receiver<ClientEvent>,
        cancel: CancellationToken,
    }

    async fn setup(sdk: Arc<dyn PaymentSdk>) -> Fixture {
        let api = FakeVendorApi::new();
        let (tx, events) = broadcast::channel(16);
        let cancel = CancellationToken::new();
        let orchestrator = PaymentOrchestrator::new(api.clone(), logged_in_session().await, sdk, tx, cancel.clone());
        Fixture { api, orchestrator, events, cancel }
    }

    #[tokio::test]
    async fn test_success() {
        let sdk = ScriptedSdk::new("9000");
        let mut f = setup(sdk.clone()).await;

        assert_eq!(f.orchestrator.pay("P1", 1).await.unwrap(), PaymentOutcome::Success);
        assert_eq!(sdk.last_order.lock().unwrap().as_deref(), Some("app_id=1&biz_content=x&sign=y"));
        assert_eq!(f.orchestrator.current_order(), None);
        assert!(!f.orchestrator.is_in_progress());
        assert_eq!(
            f.events.try_recv().unwrap(),
            ClientEvent::PaymentFinished { order_id: "O1".to_string(), outcome: PaymentOutcome::Success }
        );
    }

    #[tokio::test]
    async fn test_user_cancelled_clears_order() {
        let sdk = ScriptedSdk::new("6001");
        let f = setup(sdk.clone()).await;

        assert_eq!(f.orchestrator.pay("P1", 1).await.unwrap(), PaymentOutcome::UserCancelled);
        assert_eq!(f.orchestrator.current_order(), None);
        assert_eq!(sdk.calls(), 1);
        assert_eq!(f.api.calls("create_recharge_order"), 1);
        assert_eq!(f.api.calls("get_payment_channels"), 1);
        assert_eq!(f.api.calls("request_payment"), 1);
        // nothing after the sdk
        assert_eq!(f.api.calls("list_orders"), 0);
        assert_eq!(f.api.calls("get_wallet"), 0);
    }

    #[tokio::test]
    async fn test_pending_result_is_unknown() {
        let f = setup(ScriptedSdk::new("8000")).await;
        assert_eq!(f.orchestrator.pay("P1", 1).await.unwrap(), PaymentOutcome::Unknown);
    }

    #[tokio::test]
    async fn test_channels_failure_skips_sdk() {
        let sdk = ScriptedSdk::new("9000");
        let f = setup(sdk.clone()).await;
        *f.api.channels_result.lock().unwrap() = Err(ClientError::Http { code: 500 });

        assert_eq!(f.orchestrator.pay("P1", 1).await, Err(ClientError::Http { code: 500 }));
        assert_eq!(sdk.calls(), 0);
        assert_eq!(f.api.calls("request_payment"), 0);
        assert_eq!(f.orchestrator.current_order(), None);
        assert!(!f.orchestrator.is_in_progress());
    }

    #[tokio::test]
    async fn test_no_alipay_channel() {
        let sdk = ScriptedSdk::new("9000");
        let f = setup(sdk.clone()).await;
        *f.api.channels_result.lock().unwrap() = Ok(vec![PaymentChannelDto {
            channel_type: 41,
            name: "云闪付".to_string(),
        }]);

        assert_eq!(f.orchestrator.pay("P1", 1).await, Err(ClientError::UnsupportedPayment));
        assert_eq!(sdk.calls(), 0);
        assert_eq!(f.orchestrator.current_order(), None);
    }

    #[tokio::test]
    async fn test_second_pay_rejected_while_running() {
        let sdk = ScriptedSdk::new("9000");
        let f = setup(sdk.clone()).await;
        let gate = f.api.hold("request_payment");

        let (first, _) = tokio::join!(f.orchestrator.pay("P1", 1), async {
            while f.api.calls("request_payment") == 0 {
                tokio::task::yield_now().await;
            }
            assert_eq!(f.orchestrator.current_order().unwrap().id, "O1");
            assert_eq!(f.orchestrator.pay("P1", 1).await, Err(ClientError::PaymentInProgress));
            gate.notify_one();
        });

        assert_eq!(first.unwrap(), PaymentOutcome::Success);
        assert_eq!(f.api.calls("create_recharge_order"), 1);
        assert_eq!(sdk.calls(), 1);
    }

    #[tokio::test]
    async fn test_cancel_clears_order() {
        let sdk = ScriptedSdk::new("9000");
        let f = setup(sdk.clone()).await;
        let _gate = f.api.hold("get_payment_channels");

        let (result, _) = tokio::join!(f.orchestrator.pay("P1", 1), async {
            while f.api.calls("get_payment_channels") == 0 {
                tokio::task::yield_now().await;
            }
            f.cancel.cancel();
        });

        assert_eq!(result, Err(ClientError::Cancelled));
        assert_eq!(f.orchestrator.current_order(), None);
        assert!(!f.orchestrator.is_in_progress());
        assert_eq!(sdk.calls(), 0);
    }

    #[tokio::test]
    async fn test_cancel_after_sdk_launch_keeps_result() {
        let api = FakeVendorApi::new();
        let (tx, mut events) = broadcast::channel(16);
        let cancel = CancellationToken::new();
        let sdk = Arc::new(CancellingSdk { cancel: cancel.clone() });
        let orchestrator = PaymentOrchestrator::new(api, logged_in_session().await, sdk, tx, cancel.clone());

        assert_eq!(orchestrator.pay("P1", 1).await.unwrap(), PaymentOutcome::Success);
        assert!(cancel.is_cancelled());
        assert_eq!(orchestrator.current_order(), None);
        assert_eq!(
            events.try_recv().unwrap(),
            ClientEvent::PaymentFinished { order_id: "O1".to_string(), outcome: PaymentOutcome::Success }
        );
    }

    #[tokio::test]
    async fn test_sdk_panic_is_unknown() {
        let f = setup(Arc::new(PanickingSdk)).await;
        assert_eq!(f.orchestrator.pay("P1", 1).await.unwrap(), PaymentOutcome::Unknown);
        assert_eq!(f.orchestrator.current_order(), None);
    }

    #[tokio::test]
    async fn test_requires_session() {
        let api = FakeVendorApi::new();
        let (tx, _rx) = broadcast::channel(4);
        let session = Arc::new(SessionStore::new(Arc::new(MemoryKvStore::new())));
        let orchestrator = PaymentOrchestrator::new(api.clone(), session, ScriptedSdk::new("9000"), tx, CancellationToken::new());

        assert_eq!(orchestrator.pay("P1", 1).await, Err(ClientError::Unauthenticated));
        assert_eq!(api.calls("create_recharge_order"), 0);
    }

    #[test]
    fn test_select_channel() {
        let channels = vec![
            PaymentChannelDto { channel_type: 41, name: String::new() },
            PaymentChannelDto { channel_type: 21, name: String::new() },
        ];
        assert_eq!(select_channel(&channels), Some(PaymentChannelType::Alipay));
        assert_eq!(select_channel(&channels[..1]), None);
        assert_eq!(select_channel(&[]), None);
    }
}
