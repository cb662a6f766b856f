#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    env_logger::init();
    log::info!("starting emberview");

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "emberview",
        options,
        Box::new(|cc| Ok(Box::new(emberview_ui::EmberApp::new(cc)))),
    )
    .map_err(|e| anyhow::anyhow!("eframe failed: {e}"))?;
    Ok(())
}

// The wasm build starts through the `start` entry point in lib.rs.
#[cfg(target_arch = "wasm32")]
fn main() {}
