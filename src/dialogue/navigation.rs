//! Navigation shortcuts. Page-level effects requested from the host.

use serde::{Deserialize, Serialize};

/// A page-level effect attached to a step.
///
/// Entering the step asks the host to scroll or change route after the
/// navigation delay. The interpreter never waits for the host to comply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NavigationShortcut {
    /// Smooth-scroll to an anchor on the current page.
    ScrollTo {
        anchor: String,
        #[serde(default)]
        close_widget: bool,
    },
    /// Load a sibling page.
    Route { path: String },
}

impl NavigationShortcut {
    pub fn scroll_and_close(anchor: impl Into<String>) -> Self {
        Self::ScrollTo {
            anchor: anchor.into(),
            close_widget: true,
        }
    }

    pub fn route(path: impl Into<String>) -> Self {
        Self::Route { path: path.into() }
    }

    /// The host effects this shortcut expands to, in delivery order.
    pub fn effects(&self) -> Vec<HostEffect> {
        match self {
            Self::ScrollTo {
                anchor,
                close_widget,
            } => {
                let mut effects = vec![HostEffect::ScrollTo {
                    anchor: anchor.clone(),
                }];
                if *close_widget {
                    effects.push(HostEffect::Close);
                }
                effects
            }
            Self::Route { path } => vec![HostEffect::Navigate { route: path.clone() }],
        }
    }
}

/// A fire-and-forget request to the surrounding page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEffect {
    ScrollTo { anchor: String },
    Navigate { route: String },
    Close,
    /// Open an external link in a new tab.
    OpenUrl { url: String },
    /// A short toast-style notice.
    Notify { text: String },
}

impl std::fmt::Display for HostEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ScrollTo { anchor } => write!(f, "scroll_to(#{anchor})"),
            Self::Navigate { route } => write!(f, "navigate({route})"),
            Self::Close => write!(f, "close"),
            Self::OpenUrl { url } => write!(f, "open_url({url})"),
            Self::Notify { text } => write!(f, "notify({text})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_and_close_expands_in_order() {
        let effects = NavigationShortcut::scroll_and_close("projects-section").effects();
        assert_eq!(
            effects,
            vec![
                HostEffect::ScrollTo {
                    anchor: "projects-section".into()
                },
                HostEffect::Close,
            ]
        );
    }

    #[test]
    fn route_does_not_close() {
        let effects = NavigationShortcut::route("/blog").effects();
        assert_eq!(effects, vec![HostEffect::Navigate { route: "/blog".into() }]);
    }

    #[test]
    fn shortcut_serde() {
        let json = r#"{"kind":"scroll_to","anchor":"skills-section"}"#;
        let shortcut: NavigationShortcut = serde_json::from_str(json).unwrap();
        assert_eq!(
            shortcut,
            NavigationShortcut::ScrollTo {
                anchor: "skills-section".into(),
                close_widget: false,
            }
        );
    }
}
