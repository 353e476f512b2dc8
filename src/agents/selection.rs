//! Keyword routing of a task description to agents.
//!
//! A task selects every agent with at least one trigger appearing in the
//! lowercased text. The result is ordered by the fixed execution order.

use serde::Serialize;

use crate::agents::catalog::{AgentCatalog, AgentProfile, DEFAULT_AGENT};

#[derive(Debug, Clone, Serialize)]
pub struct SelectedAgent {
    #[serde(flatten)]
    pub agent: AgentProfile,
    pub matched: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Selection {
    pub agents: Vec<SelectedAgent>,
    pub execution_order: Vec<&'static str>,
    /// True when nothing matched and the default agent was used.
    pub fallback: bool,
}

pub fn select_agents(catalog: &AgentCatalog, task: &str) -> Selection {
    let text = task.to_lowercase();

    let mut agents: Vec<SelectedAgent> = catalog
        .all()
        .iter()
        .filter_map(|agent| {
            let matched: Vec<&'static str> = agent
                .triggers
                .iter()
                .copied()
                .filter(|t| text.contains(t))
                .collect();
            (!matched.is_empty()).then(|| SelectedAgent {
                agent: *agent,
                matched,
            })
        })
        .collect();

    let fallback = agents.is_empty();
    if fallback {
        if let Some(agent) = catalog.get(DEFAULT_AGENT) {
            agents.push(SelectedAgent {
                agent: *agent,
                matched: Vec::new(),
            });
        }
    }

    agents.sort_by_key(|s| catalog.execution_rank(s.agent.name));
    let execution_order = agents.iter().map(|s| s.agent.name).collect();

    Selection {
        agents,
        execution_order,
        fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_execution_table() {
        let catalog = AgentCatalog::new();
        let selection = select_agents(
            &catalog,
            "Write tests for the new React component and the API endpoint",
        );
        assert_eq!(selection.execution_order, vec!["backend", "frontend", "testing"]);
        assert!(!selection.fallback);

        let backend = &selection.agents[0];
        assert_eq!(backend.matched, vec!["api", "endpoint"]);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let selection = select_agents(&AgentCatalog::new(), "DEPLOY with DOCKER");
        assert_eq!(selection.execution_order, vec!["devops"]);
    }

    #[test]
    fn no_match_falls_back_to_coordinator() {
        let selection = select_agents(&AgentCatalog::new(), "make it nicer");
        assert!(selection.fallback);
        assert_eq!(selection.execution_order, vec![DEFAULT_AGENT]);
        assert!(selection.agents[0].matched.is_empty());
    }
}
