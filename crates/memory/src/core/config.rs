//! Configuration for arenas and the memory context

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::types::{arena, size::KB, size::MB};
use crate::error::{MemoryError, MemoryResult};

/// Sizing of a single arena
///
/// Sizes are rounded up to the page size when the arena is created.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ArenaConfig {
    /// Address space reserved up front; the arena can never grow past it
    pub reserve_size: usize,
    /// Bytes committed at creation
    pub initial_commit: usize,
    /// Bytes kept committed past the allocation by [`Arena::shrink`](crate::arena::Arena::shrink); 0 disables shrinking
    pub min_resident: usize,
    /// Name used in diagnostics
    pub name: Option<String>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::global()
    }
}

impl ArenaConfig {
    /// Arena with the given reservation and initial commit
    #[must_use]
    pub fn new(reserve_size: usize, initial_commit: usize) -> Self {
        Self {
            reserve_size,
            initial_commit,
            min_resident: 0,
            name: None,
        }
    }

    /// Sizing of the app, session and frame arenas (1 GiB / 1 MiB)
    #[must_use]
    pub fn global() -> Self {
        Self::new(arena::GLOBAL_RESERVE, arena::GLOBAL_COMMIT)
    }

    /// Sizing of a scratch arena (16 MiB / 1 MiB)
    #[must_use]
    pub fn scratch() -> Self {
        Self::new(arena::SCRATCH_RESERVE, arena::SCRATCH_COMMIT)
    }

    /// Keep at least `min_resident` bytes committed when shrinking
    #[must_use]
    pub fn with_min_resident(mut self, min_resident: usize) -> Self {
        self.min_resident = min_resident;
        self
    }

    /// Name the arena in diagnostics
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> MemoryResult<()> {
        if self.reserve_size == 0 {
            return Err(MemoryError::invalid_config("reserve_size must be greater than 0"));
        }
        if self.initial_commit > self.reserve_size {
            return Err(MemoryError::invalid_config(format!(
                "initial_commit ({}) exceeds reserve_size ({})",
                self.initial_commit, self.reserve_size
            )));
        }
        if self.min_resident > self.reserve_size {
            return Err(MemoryError::invalid_config(format!(
                "min_resident ({}) exceeds reserve_size ({})",
                self.min_resident, self.reserve_size
            )));
        }
        Ok(())
    }
}

/// Sizing of every arena owned by a [`MemoryContext`](crate::MemoryContext)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MemoryConfig {
    /// Application-lifetime arena
    pub app: ArenaConfig,
    /// Session arena, reset when a session ends
    pub session: ArenaConfig,
    /// Frame arena, reset every frame
    pub frame: ArenaConfig,
    /// Each of the two per-thread scratch arenas
    pub scratch: ArenaConfig,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            app: ArenaConfig::global().with_name("app"),
            session: ArenaConfig::global().with_name("session"),
            frame: ArenaConfig::global().with_name("frame"),
            scratch: ArenaConfig::scratch().with_name("scratch"),
        }
    }
}

impl MemoryConfig {
    /// Small reservations for tests and constrained targets
    #[must_use]
    pub fn low_memory() -> Self {
        Self {
            app: ArenaConfig::new(64 * MB, 64 * KB).with_name("app"),
            session: ArenaConfig::new(64 * MB, 64 * KB).with_name("session"),
            frame: ArenaConfig::new(16 * MB, 64 * KB).with_name("frame"),
            scratch: ArenaConfig::new(4 * MB, 64 * KB).with_name("scratch"),
        }
    }

    /// Validate every arena configuration
    pub fn validate(&self) -> MemoryResult<()> {
        for (label, config) in [
            ("app", &self.app),
            ("session", &self.session),
            ("frame", &self.frame),
            ("scratch", &self.scratch),
        ] {
            config.validate().map_err(|e| match e {
                MemoryError::InvalidConfig { reason } => {
                    MemoryError::invalid_config(format!("{label}: {reason}"))
                }
                other => other,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::size::GB;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_sizes() {
        let config = MemoryConfig::default();
        assert_eq!(config.app.reserve_size, GB);
        assert_eq!(config.frame.initial_commit, MB);
        assert_eq!(config.scratch.reserve_size, 16 * MB);
        assert_eq!(config.scratch.initial_commit, MB);
        assert_eq!(config.session.name.as_deref(), Some("session"));
        assert!(config.validate().is_ok());
        assert!(MemoryConfig::low_memory().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_sizes() {
        assert!(ArenaConfig::new(0, 0).validate().is_err());
        assert!(ArenaConfig::new(MB, 2 * MB).validate().is_err());
        assert!(
            ArenaConfig::new(MB, KB)
                .with_min_resident(2 * MB)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_validate_names_the_arena() {
        let mut config = MemoryConfig::low_memory();
        config.frame.initial_commit = config.frame.reserve_size + 1;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, MemoryError::InvalidConfig { ref reason } if reason.starts_with("frame:")));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_from_json() {
        let config: MemoryConfig =
            serde_json::from_str(r#"{"frame":{"reserve_size":8388608,"initial_commit":4096}}"#)
                .unwrap();
        assert_eq!(config.frame.reserve_size, 8 * MB);
        assert_eq!(config.frame.min_resident, 0);
        assert_eq!(config.app, ArenaConfig::global().with_name("app"));
    }
}
