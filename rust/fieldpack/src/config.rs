//! Backend selection.
//!
//! The capability flag deciding between local and delegated packing is read from the
//! environment at most once per process ([`PackingMode::detect`]). Packers never consult
//! it directly: they receive an immutable [`PackerConfig`] at construction.

use std::sync::{Arc, OnceLock};

use crate::{
    backend::{BackendFactory, PackBackend},
    local::LocalPacker,
};

/// Where packed bytes are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackingMode {
    /// Packing into a buffer owned by the packer.
    #[default]
    Local,
    /// Every operation is forwarded to a delegate backend.
    Delegate,
}

impl PackingMode {
    /// Environment variable holding the process-wide capability flag.
    pub const ENV_VAR: &'static str = "FIELDPACK_DELEGATE";

    /// Resolves the process-wide packing mode from [`Self::ENV_VAR`].
    ///
    /// The variable is read on the first call only; every later call, from any thread,
    /// returns the same value.
    pub fn detect() -> PackingMode {
        static MODE: OnceLock<PackingMode> = OnceLock::new();
        *MODE.get_or_init(|| {
            let value = std::env::var(Self::ENV_VAR).ok();
            let mode = Self::from_flag(value.as_deref());
            log::debug!("{}={value:?} resolves to {mode:?} packing", Self::ENV_VAR);
            mode
        })
    }

    /// Interprets a raw flag value. `1`, `true`, `yes` and `on` (any case) select
    /// delegation; anything else, including an absent flag, selects local packing.
    pub fn from_flag(value: Option<&str>) -> PackingMode {
        match value.map(str::trim) {
            Some(v)
                if ["1", "true", "yes", "on"]
                    .iter()
                    .any(|on| v.eq_ignore_ascii_case(on)) =>
            {
                PackingMode::Delegate
            }
            _ => PackingMode::Local,
        }
    }
}

/// Immutable packer configuration.
///
/// Holds a delegate factory exactly when the mode is [`PackingMode::Delegate`].
#[derive(Clone, Default)]
pub struct PackerConfig {
    delegate: Option<Arc<dyn BackendFactory>>,
}

impl PackerConfig {
    /// Pack into a locally owned buffer.
    pub fn local() -> PackerConfig {
        PackerConfig { delegate: None }
    }

    /// Forward every operation to backends created by `factory`.
    pub fn delegating(factory: Arc<dyn BackendFactory>) -> PackerConfig {
        PackerConfig {
            delegate: Some(factory),
        }
    }

    /// Combines a resolved mode with the delegate factory available to the caller.
    ///
    /// Delegation without a factory cannot be honoured and falls back to local packing.
    pub fn resolve(mode: PackingMode, factory: Option<Arc<dyn BackendFactory>>) -> PackerConfig {
        match (mode, factory) {
            (PackingMode::Delegate, Some(factory)) => PackerConfig::delegating(factory),
            (PackingMode::Delegate, None) => {
                log::warn!("delegated packing requested but no delegate backend is available");
                PackerConfig::local()
            }
            (PackingMode::Local, _) => PackerConfig::local(),
        }
    }

    /// [`resolve`](Self::resolve) using the process-wide [`PackingMode::detect`].
    pub fn from_env(factory: Option<Arc<dyn BackendFactory>>) -> PackerConfig {
        PackerConfig::resolve(PackingMode::detect(), factory)
    }

    pub fn mode(&self) -> PackingMode {
        if self.delegate.is_some() {
            PackingMode::Delegate
        } else {
            PackingMode::Local
        }
    }

    pub(crate) fn create_backend(&self, capacity: usize) -> Box<dyn PackBackend> {
        match &self.delegate {
            Some(factory) => factory.create(capacity),
            None => Box::new(LocalPacker::new(capacity)),
        }
    }
}

impl std::fmt::Debug for PackerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackerConfig")
            .field("mode", &self.mode())
            .finish()
    }
}
