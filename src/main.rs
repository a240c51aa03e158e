use std::error::Error;

use dotenv::dotenv;
use tokio::sync::broadcast::error::RecvError;

use vending_device_client::client::RentalClient;
use vending_device_client::common::logger::init_logger;
use vending_device_client::common::setting::Settings;
use vending_device_client::entity::dto::event_dto::ClientEvent;
use vending_device_client::{error, info, warn};

const LOG_TAG: &str = "main";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // 检查 env 文件
    dotenv().ok();

    // 加载 config，读取失败时使用默认配置
    let loaded = Settings::load();
    let settings = loaded.clone().unwrap_or_default();

    // 设置 logger
    init_logger(&settings.env.log_level);
    if let Err(e) = loaded {
        warn!(LOG_TAG, "config not loaded, use defaults: {}", e);
    }
    info!(LOG_TAG, "配置已加载，环境: {:?}", settings.env.env);
    log::debug!("配置: {:?}", settings);

    let client = RentalClient::open(settings).await?;
    let mut events = client.subscribe();

    // 已登录时监控名下设备状态
    let mut worker = None;
    if client.auth().is_logged_in().await {
        match client.devices().device_ids().await {
            Ok(ids) => worker = Some(client.spawn_status_refresh(ids)),
            Err(e) => error!(LOG_TAG, "cannot list devices: {}", e.user_message()),
        }
    } else {
        info!(LOG_TAG, "not logged in, nothing to monitor");
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!(LOG_TAG, "ctrl-c received");
                break;
            }
            event = events.recv() => match event {
                Ok(ClientEvent::DeviceStatusChanged(status)) => {
                    info!(LOG_TAG, "device {}: running={}, online={}", status.device_id, status.running, status.online);
                }
                Ok(ClientEvent::DeviceStatusCleared(device_id)) => {
                    info!(LOG_TAG, "device {}: status unknown", device_id);
                }
                Ok(ClientEvent::OperationFailed { device_id, action, message }) => {
                    warn!(LOG_TAG, "{} {} failed: {}", action, device_id, message);
                }
                Ok(ClientEvent::PaymentFinished { order_id, outcome }) => {
                    info!(LOG_TAG, "order {}: {}", order_id, outcome.message());
                }
                Err(RecvError::Lagged(n)) => warn!(LOG_TAG, "{} events dropped", n),
                Err(RecvError::Closed) => break,
            }
        }
    }

    client.shutdown();
    if let Some(worker) = worker {
        worker.await?;
    }
    Ok(())
}
