//! Configuration types.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::contact::WhatsAppLink;
use crate::dialogue::{Delays, StepGraph, script};
use crate::error::{ConfigError, Result};

/// Chat widget configuration.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Delay before a step's messages appear after a transition.
    pub reveal_delay: Duration,
    /// Delay before navigation shortcuts reach the host.
    pub navigation_delay: Duration,
    /// JSON step graph to load instead of the built-in script.
    pub graph_path: Option<PathBuf>,
    /// Refuse to start when the step graph has integrity issues.
    pub strict_graph: bool,
    /// Direct-contact link offered next to the chat.
    pub whatsapp: WhatsAppLink,
    /// Write logs to a daily rolling file in this directory instead of stderr.
    pub log_dir: Option<PathBuf>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        let delays = Delays::default();
        Self {
            reveal_delay: delays.reveal,
            navigation_delay: delays.navigation,
            graph_path: None,
            strict_graph: false,
            whatsapp: WhatsAppLink::default(),
            log_dir: None,
        }
    }
}

impl ChatConfig {
    /// Build configuration from `PORTFOLIO_CHAT_*` environment variables.
    ///
    /// Unset variables keep their defaults; unparsable ones are logged and
    /// ignored.
    pub fn from_env() -> Self {
        let reader = EnvReader {
            lookup: |key: &str| std::env::var(key).ok(),
            strict: false,
        };
        match Self::load(&reader) {
            Ok(config) => config,
            // Lenient reads never fail.
            Err(_) => Self::default(),
        }
    }

    /// Like [`from_env`](Self::from_env), but an unparsable value is an error.
    pub fn try_from_env() -> Result<Self> {
        Self::load(&EnvReader {
            lookup: |key: &str| std::env::var(key).ok(),
            strict: true,
        })
    }

    fn load<F>(env: &EnvReader<F>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let reveal_delay = env
            .parse::<u64>("PORTFOLIO_CHAT_REVEAL_DELAY_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.reveal_delay);

        let navigation_delay = env
            .parse::<u64>("PORTFOLIO_CHAT_NAVIGATION_DELAY_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.navigation_delay);

        let strict_graph = env
            .parse::<bool>("PORTFOLIO_CHAT_STRICT_GRAPH")?
            .unwrap_or(false);

        let mut whatsapp = defaults.whatsapp;
        if let Some(phone) = env.raw("PORTFOLIO_CHAT_WHATSAPP_PHONE") {
            whatsapp.phone = phone;
        }
        if let Some(message) = env.raw("PORTFOLIO_CHAT_WHATSAPP_MESSAGE") {
            whatsapp.message = message;
        }

        Ok(Self {
            reveal_delay,
            navigation_delay,
            graph_path: env.path("PORTFOLIO_CHAT_GRAPH_PATH"),
            strict_graph,
            whatsapp,
            log_dir: env.path("PORTFOLIO_CHAT_LOG_DIR"),
        })
    }

    /// Delays to pass to each interpreter transition.
    pub fn delays(&self) -> Delays {
        Delays {
            reveal: self.reveal_delay,
            navigation: self.navigation_delay,
        }
    }

    /// Load the configured step graph, or the built-in script.
    ///
    /// With `strict_graph` any integrity issue is an error; otherwise issues
    /// are logged and the graph is used as is.
    pub fn load_graph(&self) -> Result<StepGraph> {
        let graph = match &self.graph_path {
            Some(path) => StepGraph::from_file(path)?,
            None => script::builtin(),
        };
        if self.strict_graph {
            graph.ensure_valid()?;
        } else {
            graph.warn_issues();
        }
        Ok(graph)
    }
}

/// Reads configuration keys through `lookup`.
struct EnvReader<F> {
    lookup: F,
    /// Unparsable values are errors rather than warnings.
    strict: bool,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    fn raw(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
    }

    fn path(&self, key: &str) -> Option<PathBuf> {
        self.raw(key)
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
    }

    fn parse<T>(&self, key: &str) -> std::result::Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let Some(raw) = self.raw(key) else {
            return Ok(None);
        };
        match raw.trim().parse() {
            Ok(value) => Ok(Some(value)),
            Err(e) if self.strict => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{raw:?}: {e}"),
            }),
            Err(e) => {
                tracing::warn!(key, value = %raw, error = %e, "Ignoring unparsable configuration value");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;
    use crate::error::{Error, GraphError};

    fn load_from(pairs: &[(&str, &str)], strict: bool) -> Result<ChatConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ChatConfig::load(&EnvReader {
            lookup: move |key: &str| vars.get(key).cloned(),
            strict,
        })
    }

    #[test]
    fn defaults_match_widget_timings() {
        let config = ChatConfig::default();
        assert_eq!(config.reveal_delay, Duration::from_millis(500));
        assert_eq!(config.navigation_delay, Duration::from_millis(1000));
        assert!(config.navigation_delay > config.reveal_delay);
        assert!(config.graph_path.is_none());
        assert!(!config.strict_graph);
        assert_eq!(config.delays(), Delays::default());
    }

    #[test]
    fn from_env_reads_overrides() {
        // SAFETY: These keys are only touched by this test.
        unsafe {
            std::env::set_var("PORTFOLIO_CHAT_REVEAL_DELAY_MS", "50");
            std::env::set_var("PORTFOLIO_CHAT_NAVIGATION_DELAY_MS", "not-a-number");
            std::env::set_var("PORTFOLIO_CHAT_STRICT_GRAPH", "true");
        }
        let config = ChatConfig::from_env();
        assert_eq!(config.reveal_delay, Duration::from_millis(50));
        assert_eq!(config.navigation_delay, Duration::from_millis(1000));
        assert!(config.strict_graph);
        unsafe {
            std::env::remove_var("PORTFOLIO_CHAT_REVEAL_DELAY_MS");
            std::env::remove_var("PORTFOLIO_CHAT_NAVIGATION_DELAY_MS");
            std::env::remove_var("PORTFOLIO_CHAT_STRICT_GRAPH");
        }
    }

    #[test]
    fn strict_load_rejects_bad_values() {
        let err = load_from(&[("PORTFOLIO_CHAT_REVEAL_DELAY_MS", "soon")], true).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue { ref key, .. })
                if key == "PORTFOLIO_CHAT_REVEAL_DELAY_MS"
        ));

        let config = load_from(&[("PORTFOLIO_CHAT_REVEAL_DELAY_MS", "soon")], false).unwrap();
        assert_eq!(config.reveal_delay, Duration::from_millis(500));
    }

    #[test]
    fn blank_paths_are_unset() {
        let config = load_from(
            &[
                ("PORTFOLIO_CHAT_GRAPH_PATH", "  "),
                ("PORTFOLIO_CHAT_LOG_DIR", "/tmp/chat-logs"),
                ("PORTFOLIO_CHAT_WHATSAPP_PHONE", "+1 555 0100"),
            ],
            true,
        )
        .unwrap();
        assert!(config.graph_path.is_none());
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/chat-logs")));
        assert_eq!(config.whatsapp.phone, "+1 555 0100");
    }

    #[test]
    fn load_graph_defaults_to_builtin() {
        let graph = ChatConfig::default().load_graph().unwrap();
        assert_eq!(graph.entry().as_str(), script::ENTRY);
    }

    #[test]
    fn strict_graph_fails_on_issues() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"entry": "hello", "steps": [
                {{"id": "hello", "choices": [{{"label": "Pricing", "target": "contact-pricing"}}]}}
            ]}}"#
        )
        .unwrap();

        let mut config = ChatConfig {
            graph_path: Some(file.path().to_path_buf()),
            ..ChatConfig::default()
        };
        assert_eq!(config.load_graph().unwrap().len(), 1);

        config.strict_graph = true;
        assert!(matches!(
            config.load_graph(),
            Err(Error::Graph(GraphError::Invalid(issues))) if issues.len() == 1
        ));
    }
}
