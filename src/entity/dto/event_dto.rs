//! events pushed to the ui layer, each failure is delivered once

use super::device_dto::DeviceStatus;
use crate::device::device_controller::ControlAction;
use crate::payment::payment_outcome::PaymentOutcome;

#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// cached status changed: optimistic write, commit, rollback or refresh
    DeviceStatusChanged(DeviceStatus),
    /// entry dropped, e.g. rollback of a device that had no cached status
    DeviceStatusCleared(String),
    /// start/stop failed and was rolled back, `message` is ready for display
    OperationFailed {
        device_id: String,
        action: ControlAction,
        message: String,
    },
    PaymentFinished {
        order_id: String,
        outcome: PaymentOutcome,
    },
}
