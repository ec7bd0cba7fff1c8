//! Bounded drain of the accept loop.

use std::time::Duration;

use tokio::task::JoinHandle;

use crate::lifecycle::LifecycleError;

/// Wait up to `grace` for a server task that has already been told to stop
/// accepting. On timeout the task is aborted and the drain is reported as a
/// failure.
///
/// Aborting drops the accept loop only. Connection tasks that axum already
/// spawned keep running until the process exits, so callers must treat
/// [`LifecycleError::DrainTimeout`] as fatal and terminate.
pub async fn drain(
    server: &mut JoinHandle<std::io::Result<()>>,
    grace: Duration,
) -> Result<(), LifecycleError> {
    match tokio::time::timeout(grace, &mut *server).await {
        Ok(Ok(Ok(()))) => Ok(()),
        Ok(Ok(Err(e))) => Err(LifecycleError::Serve(e)),
        Ok(Err(e)) => Err(LifecycleError::Join(e)),
        Err(_) => {
            server.abort();
            Err(LifecycleError::DrainTimeout(grace))
        }
    }
}
