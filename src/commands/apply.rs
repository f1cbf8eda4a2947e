//! `solpaper apply`: set the wallpaper for the current time once.

use anyhow::Result;

use crate::backend::{apply_image, create_backend};
use crate::common::utils::private_path;
use crate::io::instance;
use crate::schedule;
use crate::solpaper::Session;
use crate::time_source;

pub fn handle_apply_command(debug_enabled: bool) -> Result<()> {
    log_version!();

    let running = instance::get_running_instance();
    let session = Session::load()?;
    let mut backend = create_backend(&session.config, false)?;

    let now = time_source::now().with_timezone(&session.location.timezone());
    let result = schedule::resolve(
        &session.pack.model,
        &session.location,
        &now,
        session.calculator.as_ref(),
    )?;

    if debug_enabled {
        log_pipe!();
        log_debug!("Using {} backend", backend.backend_name());
    }
    apply_image(backend.as_mut(), &result.active_image)?;

    let name = session
        .pack
        .model
        .get(result.active_index)
        .map(|s| s.display_name())
        .unwrap_or_default();
    log_block_start!("Wallpaper set: {name}");
    log_indented!("{}", private_path(&result.active_image));
    log_indented!(
        "Next change at {}",
        result.next_change_at.format("%Y-%m-%d %H:%M:%S")
    );
    if let Some(info) = running {
        log_pipe!();
        log_info!("The running service (PID: {}) keeps managing the wallpaper", info.pid);
    }
    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("apply - Set the wallpaper once");
    log_block_start!("Usage: solpaper apply");
    log_block_start!("Description:");
    log_indented!("Resolves the active segment for the current time, applies its image");
    log_indented!("with the configured backend and exits. Useful from login scripts");
    log_indented!("when the service is not wanted.");
    log_end!();
}
