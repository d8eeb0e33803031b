//! Engine configuration.

use ampli_sync_core::PROTECTED_TABLE;

/// Configuration for [`SyncClient`](crate::SyncClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Tables whose change-capture triggers stay active during pull apply.
    pub audit_exempt_tables: Vec<String>,
    /// Drop and re-create triggers around each page (false for stores without triggers).
    pub toggle_triggers: bool,
    /// Progress units reported as done before the first table.
    pub progress_lead_in: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            audit_exempt_tables: vec![PROTECTED_TABLE.to_string()],
            toggle_triggers: true,
            progress_lead_in: 0,
        }
    }
}

impl SyncConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tables that keep their triggers.
    pub fn with_audit_exempt_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.audit_exempt_tables = tables.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable trigger toggling.
    pub fn with_trigger_toggling(mut self, enabled: bool) -> Self {
        self.toggle_triggers = enabled;
        self
    }

    /// Reserve leading progress units.
    pub fn with_progress_lead_in(mut self, units: u32) -> Self {
        self.progress_lead_in = units;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_protect_identity_table() {
        let config = SyncConfig::default();
        assert_eq!(config.audit_exempt_tables, vec!["mergeidentity"]);
        assert!(config.toggle_triggers);
        assert_eq!(config.progress_lead_in, 0);
    }

    #[test]
    fn config_builder_pattern() {
        let config = SyncConfig::new()
            .with_audit_exempt_tables(["mergeidentity", "audit_log"])
            .with_trigger_toggling(false)
            .with_progress_lead_in(3);

        assert_eq!(config.audit_exempt_tables.len(), 2);
        assert!(!config.toggle_triggers);
        assert_eq!(config.progress_lead_in, 3);
    }
}
