#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

mod serial_panel;
mod ui;

use std::path::PathBuf;

use imu_monitor::{Config, IngestionPipeline};
use tokio::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = Config::load_or_default(config_path.as_deref())?;
    let pipeline = IngestionPipeline::from_config(&config)?;

    let rt = tokio::runtime::Runtime::new()?;
    let handle = rt.handle().clone();
    let _enter = handle.enter();

    std::thread::spawn(move || {
        rt.block_on(async {
            loop {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
        })
    });

    ui::init(pipeline, config, config_path)?;
    Ok(())
}
