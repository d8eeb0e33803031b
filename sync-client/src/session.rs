//! Per-user session handed to every transport call.

/// Server location and credentials for one signed-in user.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// Base URL of the sync server.
    pub server_url: String,
    /// Bearer token.
    pub access_token: String,
    /// Stable identifier of this installation.
    pub device_id: String,
}

impl Session {
    /// Create a session.
    pub fn new(
        server_url: impl Into<String>,
        access_token: impl Into<String>,
        device_id: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            access_token: access_token.into(),
            device_id: device_id.into(),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("server_url", &self.server_url)
            .field(
                "access_token",
                &format!("[{} chars REDACTED]", self.access_token.len()),
            )
            .field("device_id", &self.device_id)
            .finish()
    }
}
