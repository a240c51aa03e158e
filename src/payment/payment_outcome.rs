/// classified payment sdk result
/// `Unknown` is neither success nor failure, the order has to be checked later
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Success,
    Failed,
    UserCancelled,
    Unknown,
}

impl PaymentOutcome {
    /// resultStatus table of the alipay sdk
    pub fn from_result_status(result_status: &str) -> Self {
        match result_status.trim() {
            "9000" => PaymentOutcome::Success,
            // 8000 处理中，6004 结果未知
            "8000" | "6004" => PaymentOutcome::Unknown,
            "6001" => PaymentOutcome::UserCancelled,
            "4000" | "5000" | "6002" => PaymentOutcome::Failed,
            _ => PaymentOutcome::Unknown,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            PaymentOutcome::Success => "支付成功",
            PaymentOutcome::Failed => "支付失败",
            PaymentOutcome::UserCancelled => "已取消支付",
            PaymentOutcome::Unknown => "支付结果确认中，请稍后在订单记录中查看",
        }
    }
}
