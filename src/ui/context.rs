//! Interactive vs CI detection

use std::io::IsTerminal;

/// Environment variables that mark a CI run
const CI_VARS: &[&str] = &[
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "BUILDKITE",
    "JENKINS_URL",
];

/// Decides whether output may use spinners and prompts
#[derive(Debug, Clone)]
pub struct UiContext {
    interactive: bool,
    /// Set by --yes
    auto_yes: bool,
}

impl UiContext {
    /// Detect the current environment
    pub fn detect() -> Self {
        Self {
            interactive: detect_interactive(),
            auto_yes: false,
        }
    }

    /// A context that never prompts or animates
    pub fn non_interactive() -> Self {
        Self {
            interactive: false,
            auto_yes: false,
        }
    }

    pub fn with_auto_yes(mut self, yes: bool) -> Self {
        self.auto_yes = yes;
        self
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn auto_yes(&self) -> bool {
        self.auto_yes
    }

    /// Whether spinners, bars and colors are appropriate
    pub fn use_fancy_output(&self) -> bool {
        self.interactive
    }
}

fn detect_interactive() -> bool {
    std::io::stdout().is_terminal()
        && std::io::stdin().is_terminal()
        && !CI_VARS.iter().any(|var| std::env::var_os(var).is_some())
}
