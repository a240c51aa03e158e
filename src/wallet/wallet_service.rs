use std::sync::Arc;

use crate::common::error::ClientResult;
use crate::entity::dto::wallet_dto::{RechargeOrderDto, RechargeProductDto, WalletDto};
use crate::gateway::vendor_api::VendorApi;
use crate::store::session_store::SessionStore;
use crate::debug;

const LOG_TAG: &str = "wallet-service";

/// balance shown to the user
/// the vendor may fill several balance fields, the first present and finite one wins:
/// ol_cash, total, balance, otherwise 0
pub fn display_balance(wallet: &WalletDto) -> f64 {
    [wallet.ol_cash, wallet.total, wallet.balance]
        .into_iter()
        .flatten()
        .find(|v| v.is_finite())
        .unwrap_or(0.0)
}

pub struct WalletService {
    api: Arc<dyn VendorApi>,
    session: Arc<SessionStore>,
}

impl WalletService {
    pub fn new(api: Arc<dyn VendorApi>, session: Arc<SessionStore>) -> Self {
        WalletService { api, session }
    }

    pub async fn wallet(&self) -> ClientResult<WalletDto> {
        let token = self.session.token().await;
        self.api.get_wallet(token.as_deref()).await
    }

    pub async fn balance(&self) -> ClientResult<f64> {
        let wallet = self.wallet().await?;
        let balance = display_balance(&wallet);
        debug!(LOG_TAG, "wallet {:?}, display balance: {}", wallet.id, balance);
        Ok(balance)
    }

    pub async fn recharge_products(&self) -> ClientResult<Vec<RechargeProductDto>> {
        let token = self.session.token().await;
        self.api.list_recharge_products(token.as_deref()).await
    }

    /// `page` starts from 1
    pub async fn order_history(&self, page: u32, size: u32) -> ClientResult<Vec<RechargeOrderDto>> {
        let token = self.session.token().await;
        self.api.list_orders(token.as_deref(), page.max(1), size).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::ClientError;
    use crate::gateway::fake_vendor_api::{logged_in_session, FakeVendorApi};
    use crate::store::kv_store::MemoryKvStore;

    fn wallet(ol_cash: Option<f64>, total: Option<f64>, balance: Option<f64>) -> WalletDto {
        WalletDto { id: None, ol_cash, total, balance }
    }

    #[test]
    fn test_display_balance_precedence() {
        assert_eq!(display_balance(&wallet(Some(12.5), Some(20.0), Some(30.0))), 12.5);
        assert_eq!(display_balance(&wallet(None, Some(20.0), Some(30.0))), 20.0);
        assert_eq!(display_balance(&wallet(None, None, Some(30.0))), 30.0);
        assert_eq!(display_balance(&wallet(Some(f64::NAN), None, Some(30.0))), 30.0);
        assert_eq!(display_balance(&wallet(None, None, None)), 0.0);
    }

    #[tokio::test]
    async fn test_balance() {
        let api = FakeVendorApi::new();
        *api.wallet_result.lock().unwrap() = Ok(wallet(None, Some(8.8), None));
        let service = WalletService::new(api, logged_in_session().await);
        assert_eq!(service.balance().await.unwrap(), 8.8);
    }

    #[tokio::test]
    async fn test_products_and_history() {
        let api = FakeVendorApi::new();
        let service = WalletService::new(api.clone(), logged_in_session().await);
        assert_eq!(service.recharge_products().await.unwrap()[0].id, "P1");
        assert_eq!(service.order_history(0, 20).await.unwrap()[0].id, "O1");
        assert_eq!(api.calls("list_orders"), 1);
    }

    #[tokio::test]
    async fn test_requires_session() {
        let api = FakeVendorApi::new();
        let session = Arc::new(SessionStore::new(Arc::new(MemoryKvStore::new())));
        let service = WalletService::new(api.clone(), session);
        assert_eq!(service.balance().await, Err(ClientError::Unauthenticated));
        assert_eq!(api.calls("get_wallet"), 0);
    }
}
