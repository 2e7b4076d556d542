//! Make command implementation.

use crate::bundler::{NsisMaker, SettingsBuilder, maker};
use crate::cli::{Args, Command, RuntimeConfig};
use crate::config::{load_config, with_certificate_password};
use crate::error::Result;
use path_absolutize::Absolutize;

/// Execute make command
pub(super) async fn execute_make(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    let Command::Make {
        dir,
        out_dir,
        name,
        app_version,
        arch,
        config: config_path,
        certificate_password,
        keep_temp,
    } = &args.command
    else {
        unreachable!("execute_make called with non-Make command");
    };

    let app_dir = dir.absolutize()?.into_owned();
    let make_dir = out_dir.absolutize()?.into_owned();

    let maker_config = match config_path {
        Some(path) => {
            config.verbose_println(&format!("Loading configuration from {}", path.display()));
            load_config(&path.absolutize()?)?
        }
        None => Default::default(),
    };
    let maker_config = with_certificate_password(maker_config, certificate_password.clone());

    if !maker::is_supported_on_current_platform() {
        config.warning_println("makensis was not found on PATH; the build relies on installer.makensis");
    }
    if maker_config.codesign.is_none() {
        config.verbose_println("No [codesign] configuration; the installer will not be signed");
    }

    let mut builder = SettingsBuilder::new()
        .app_dir(&app_dir)
        .make_dir(&make_dir)
        .app_name(name)
        .config(maker_config)
        .keep_temp(*keep_temp);
    if let Some(version) = app_version {
        builder = builder.app_version(version);
    }
    if let Some(arch) = arch {
        builder = builder.arch(*arch);
    }
    let settings = builder.build()?;

    let _ = config.output().progress(&format!(
        "Making {} installer for {} ({})",
        maker::NAME,
        settings.app_name(),
        settings.arch()
    ));

    let outputs = NsisMaker::new(settings).make().await?;

    config.success_println(&format!("Created {} file(s):", outputs.len()));
    for path in &outputs {
        config.indent(&path.display().to_string());
    }

    Ok(0)
}
