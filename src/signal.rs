use anyhow::{Context, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 註冊 Ctrl-C 處理器，收到信號時設定旗標
pub fn setup_shutdown_signal() -> Result<Arc<AtomicBool>> {
    let shutdown_signal = Arc::new(AtomicBool::new(false));
    let signal_clone = Arc::clone(&shutdown_signal);

    ctrlc::set_handler(move || {
        signal_clone.store(true, Ordering::SeqCst);
        eprintln!("\n收到中斷信號，正在停止擷取...");
    })
    .context("無法設定 Ctrl-C 處理器")?;

    Ok(shutdown_signal)
}

/// 取出並清除中斷請求
#[must_use]
pub fn take_shutdown_request(shutdown_signal: &AtomicBool) -> bool {
    shutdown_signal.swap(false, Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_shutdown_request_clears_flag() {
        let flag = AtomicBool::new(true);
        assert!(take_shutdown_request(&flag));
        assert!(!take_shutdown_request(&flag));
    }
}
