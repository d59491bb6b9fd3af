//! Demo runner: monitor focus changes with the native adapter and report
//! the tracked foreign window until the user presses Enter

use tracing::info;

use refocus::{FocusMonitor, MonitorConfig, TargetFilter, native_adapter};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let self_pid = std::process::id();
    let filter = TargetFilter::new(self_pid, "refocus");
    let monitor = FocusMonitor::new(native_adapter(), filter, MonitorConfig::default());

    monitor.start()?;
    info!(self_pid, "tracking focus changes, press Enter to exit");

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;

    monitor.stop()?;
    match monitor.last_foreign_window() {
        Some(last) => info!(pid = last.pid, title = %last.title, "last foreign window at exit"),
        None => info!("no foreign window observed"),
    }
    Ok(())
}
