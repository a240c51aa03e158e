use crate::entity::dto::payment_dto::PaymentResultMap;

/// external payment sdk, e.g. the alipay app sdk
/// `pay` blocks until the user leaves the payment sheet, callers run it on a blocking worker
pub trait PaymentSdk: Send + Sync {
    fn pay(&self, order_string: &str) -> PaymentResultMap;
}
