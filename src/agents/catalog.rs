//! Static agent metadata.
//!
//! Each agent owns one terminal in the multi-terminal workflow. The table
//! is fixed at compile time and never mutated.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AgentProfile {
    pub name: &'static str,
    pub terminal: u8,
    pub role: &'static str,
    pub description: &'static str,
    /// Lowercase keywords that route a task to this agent.
    pub triggers: &'static [&'static str],
}

/// Agent picked when no trigger matches.
pub const DEFAULT_AGENT: &str = "coordinator";

const AGENTS: &[AgentProfile] = &[
    AgentProfile {
        name: "coordinator",
        terminal: 1,
        role: "Planning and task breakdown",
        description: "Splits work into terminal-sized tasks, tracks progress and resolves conflicts between agents.",
        triggers: &["plan", "coordinate", "architecture", "roadmap", "breakdown"],
    },
    AgentProfile {
        name: "backend",
        terminal: 2,
        role: "Server and data layer",
        description: "Implements HTTP endpoints, persistence and integrations.",
        triggers: &["api", "endpoint", "server", "backend", "database", "schema", "migration"],
    },
    AgentProfile {
        name: "frontend",
        terminal: 3,
        role: "User interface",
        description: "Builds components, styling and client-side state; reviews screenshots.",
        triggers: &["frontend", "component", "react", "css", "layout", "screenshot", "styling"],
    },
    AgentProfile {
        name: "testing",
        terminal: 4,
        role: "Verification",
        description: "Writes and runs unit, integration and regression tests.",
        triggers: &["test", "bug", "regression", "coverage", "flaky"],
    },
    AgentProfile {
        name: "devops",
        terminal: 5,
        role: "Build and deployment",
        description: "Maintains containers, pipelines and deployment manifests.",
        triggers: &["deploy", "docker", "pipeline", "kubernetes", "infrastructure", "release"],
    },
    AgentProfile {
        name: "documentation",
        terminal: 6,
        role: "Docs and guides",
        description: "Keeps READMEs, guides and changelogs in step with the code.",
        triggers: &["docs", "readme", "documentation", "guide", "changelog"],
    },
];

/// Fixed order in which selected agents run.
pub const EXECUTION_ORDER: &[&str] = &[
    "coordinator",
    "backend",
    "frontend",
    "testing",
    "devops",
    "documentation",
];

/// Read-only view over the agent table.
#[derive(Debug, Clone, Copy, Default)]
pub struct AgentCatalog;

impl AgentCatalog {
    pub fn new() -> Self {
        Self
    }

    pub fn all(&self) -> &'static [AgentProfile] {
        AGENTS
    }

    /// Look up an agent by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&'static AgentProfile> {
        AGENTS.iter().find(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Position of `name` in [`EXECUTION_ORDER`]; unknown names sort last.
    pub fn execution_rank(&self, name: &str) -> usize {
        EXECUTION_ORDER
            .iter()
            .position(|n| *n == name)
            .unwrap_or(EXECUTION_ORDER.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_agent_has_a_rank_and_unique_terminal() {
        let catalog = AgentCatalog::new();
        let mut terminals: Vec<u8> = catalog.all().iter().map(|a| a.terminal).collect();
        terminals.sort();
        terminals.dedup();
        assert_eq!(terminals.len(), catalog.all().len());

        for agent in catalog.all() {
            assert!(catalog.execution_rank(agent.name) < EXECUTION_ORDER.len());
            assert!(agent.triggers.iter().all(|t| *t == t.to_lowercase()));
        }
    }

    #[test]
    fn lookup_ignores_case() {
        let catalog = AgentCatalog::new();
        assert_eq!(catalog.get("Frontend").map(|a| a.terminal), Some(3));
        assert!(catalog.get("designer").is_none());
        assert!(catalog.get(DEFAULT_AGENT).is_some());
    }
}
