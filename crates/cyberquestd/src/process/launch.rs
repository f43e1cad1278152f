//! Runs the session server from bootstrap to shutdown.

use std::sync::Arc;

use tracing::info;

use crate::StructuredHealthReporter;
use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::health::HealthReporter;
use crate::session::SessionConnectionHandler;
use crate::transport::SocketListener;

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Service dependencies required to construct the server runtime.
pub(crate) struct ServiceDeps<L> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
}

/// Collaborators required to run the server.
pub(crate) struct LaunchPlan<L, S> {
    pub(crate) services: ServiceDeps<L>,
    pub(crate) shutdown: S,
}

/// Runs the server with the production collaborators until a termination
/// signal arrives.
///
/// # Errors
///
/// Returns [`LaunchError`] when bootstrap, listening or signal handling fails.
pub fn run_server() -> Result<(), LaunchError> {
    let plan = LaunchPlan {
        services: ServiceDeps {
            loader: SystemConfigLoader,
            reporter: Arc::new(StructuredHealthReporter::new()),
        },
        shutdown: SystemShutdownSignal::new(),
    };
    run_server_with(plan)
}

/// Runs the server with injected collaborators.
pub(crate) fn run_server_with<L, S>(plan: LaunchPlan<L, S>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
{
    let LaunchPlan { services, shutdown } = plan;
    let ServiceDeps { loader, reporter } = services;

    let server = bootstrap_with(&loader, reporter.as_ref())?;
    let listener = SocketListener::bind(server.config().listen())?;
    let handler = Arc::new(SessionConnectionHandler::new(server.engine()));
    let listener_handle = listener.start(handler)?;
    info!(
        target: PROCESS_TARGET,
        listen = %server.config().listen(),
        "session server ready"
    );

    let waited = shutdown.wait();
    listener_handle.shutdown();
    listener_handle.join()?;
    waited?;
    info!(
        target: PROCESS_TARGET,
        "shutdown sequence completed"
    );
    Ok(())
}
