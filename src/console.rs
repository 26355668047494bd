//! Progress output for verbose pools.
//!
//! The console is an observability collaborator only: it emits `tracing`
//! events under the `http_pool::console` target and is silent unless the
//! pool is verbose.

use std::fmt;

use tracing::info;

/// Styling hint attached to a console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Info,
    Comment,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Info => "info",
            Self::Comment => "comment",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Prints pool progress when enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct Console {
    enabled: bool,
}

impl Console {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Prints one line with a style hint.
    pub fn print(&self, message: &str, style: Style) {
        if self.enabled {
            info!(target: "http_pool::console", style = %style, "{message}");
        }
    }

    pub fn new_line(&self) {
        if self.enabled {
            info!(target: "http_pool::console", "");
        }
    }
}
