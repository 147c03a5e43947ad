use rooftop_engine::{
    ConfigurationError, DirectoryAssetSink, EmitSummary, MiniJinjaEngine, PluginError,
    RooftopPlugin, SharedContext,
};
use rooftop_logging::rooftop_info;

use crate::cli::Cli;
use crate::settings::{AppSettings, SettingsError};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Plugin(#[from] PluginError),
}

/// One full build pass: fetch phase, then emit phase into `cli.output`.
pub fn run(cli: &Cli) -> Result<EmitSummary, AppError> {
    let settings = AppSettings::load(&cli.config)?;
    rooftop_info!("loaded settings from {:?}", cli.config);

    let mut builder = settings.plugin.into_builder().project_root(&cli.root);
    if let Some(token) = &cli.api_token {
        builder = builder.api_token(token.clone());
    }
    let plugin = RooftopPlugin::new(builder.build()?)?;

    let mut shared = SharedContext::from(settings.locals);
    plugin.run_blocking(&mut shared)?;

    let engine = MiniJinjaEngine::new(&cli.root);
    let mut sink = DirectoryAssetSink::new(&cli.output);
    Ok(plugin.emit(&shared, &engine, &mut sink)?)
}
