use std::process::ExitCode;

use engine::{AppError, Application};
use tracing::{error, info};

use crate::layers::{BackgroundLayer, TrainLayer};
use crate::trains::TrainHandlerConfig;

use super::bootstrap::AppWiring;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    if let Err(err) = build_and_run(app) {
        error!(error = %err, "startup_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Background first so trains draw over it and see input before it.
fn build_and_run(app: AppWiring) -> Result<(), AppError> {
    let mut application = Application::new(app.config)?;
    application.push_layer_with(BackgroundLayer::build)?;
    let train_config = TrainHandlerConfig::for_assets(&application.paths().assets_dir);
    application.push_layer_with(|context| TrainLayer::build(context, train_config))?;
    info!(
        layers = ?application.layer_names(),
        textures = application.resources().texture_count(),
        "layers_ready"
    );
    application.run()
}
