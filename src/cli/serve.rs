//! Serve CLI command (HTTP shell).

use crate::Result;
use crate::config::SelfhealConfig;
#[cfg(not(feature = "http"))]
use crate::Error;
use crate::observability::ObservabilityHandle;

/// Default port for the HTTP shell.
pub const DEFAULT_PORT: u16 = 8501;

/// Serve command handler.
#[derive(Debug, Clone, Copy)]
pub struct ServeCommand {
    port: u16,
}

impl ServeCommand {
    /// Creates a new serve command on [`DEFAULT_PORT`].
    #[must_use]
    pub const fn new() -> Self {
        Self { port: DEFAULT_PORT }
    }

    /// Sets the listen port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Listen port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Runs the HTTP shell until shutdown.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FeatureNotEnabled`] when built without the
    /// `http` feature, or an error if the server cannot start.
    #[cfg(feature = "http")]
    pub fn execute(
        &self,
        config: SelfhealConfig,
        observability: ObservabilityHandle,
    ) -> Result<()> {
        crate::server::run(config, observability, self.port)
    }

    /// Runs the HTTP shell until shutdown.
    ///
    /// # Errors
    ///
    /// Always returns [`Error::FeatureNotEnabled`]: this build has no HTTP
    /// support.
    #[cfg(not(feature = "http"))]
    pub fn execute(
        &self,
        _config: SelfhealConfig,
        _observability: ObservabilityHandle,
    ) -> Result<()> {
        Err(Error::FeatureNotEnabled("http".to_string()))
    }
}

impl Default for ServeCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_command_port() {
        assert_eq!(ServeCommand::new().port(), DEFAULT_PORT);
        assert_eq!(ServeCommand::default().with_port(9000).port(), 9000);
    }

    #[cfg(not(feature = "http"))]
    #[test]
    fn test_serve_without_http_feature() {
        let result =
            ServeCommand::new().execute(SelfhealConfig::default(), ObservabilityHandle::default());
        assert!(matches!(result, Err(Error::FeatureNotEnabled(_))));
    }
}
