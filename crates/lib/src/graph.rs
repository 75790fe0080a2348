//! Rule graph of a loaded unit.
//!
//! Rules are kept in declaration order and indexed by name. Redeclaring a name
//! replaces the earlier rule in place. Producers are found by expanding every
//! rule's targets and comparing them with a concrete dependency path.
//!
//! [`RuleGraph::validate`] is run once per unit after loading and rejects
//! graphs the orchestrator cannot resolve deterministically: two rules
//! producing the same target, more than one default rule, or rules that
//! depend on each other in a cycle.

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::expand::{self, ExpandError};
use crate::rule::{Action, Rule};
use crate::vars::VariableStore;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
  #[error("target '{target}' is produced by both '{first}' and '{second}'")]
  DuplicateTarget {
    target: String,
    first: String,
    second: String,
  },

  #[error("more than one default rule: '{first}' and '{second}'")]
  MultipleDefaults { first: String, second: String },

  #[error("rule '{rule}': {source}")]
  Expand {
    rule: String,
    #[source]
    source: ExpandError,
  },

  #[error("dependency cycle: {}", chain.join(" -> "))]
  Cycle { chain: Vec<String> },
}

/// Serializable description of a rule, with expressions expanded where possible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleSummary {
  pub name: String,
  pub targets: Vec<String>,
  pub dependencies: Vec<String>,
  pub default: bool,
  pub action: &'static str,
}

#[derive(Debug, Clone, Default)]
pub struct RuleGraph {
  rules: Vec<Rule>,
  index: HashMap<String, usize>,
}

impl RuleGraph {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a rule. A rule with the same name is replaced and returned.
  pub fn add_rule(&mut self, rule: Rule) -> Option<Rule> {
    match self.index.get(&rule.name) {
      Some(&i) => {
        warn!(rule = %rule.name, "rule redeclared, replacing earlier declaration");
        Some(std::mem::replace(&mut self.rules[i], rule))
      }
      None => {
        self.index.insert(rule.name.clone(), self.rules.len());
        self.rules.push(rule);
        None
      }
    }
  }

  pub fn by_name(&self, name: &str) -> Option<&Rule> {
    self.index.get(name).map(|&i| &self.rules[i])
  }

  /// Rules in declaration order.
  pub fn rules(&self) -> &[Rule] {
    &self.rules
  }

  pub fn len(&self) -> usize {
    self.rules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rules.is_empty()
  }

  /// The first rule marked as default.
  pub fn default_rule(&self) -> Option<&Rule> {
    self.rules.iter().find(|r| r.is_default)
  }

  /// Find the rule whose expanded target equals `target`.
  ///
  /// Every target of every rule is expanded. When several rules match, the
  /// last one in declaration order wins; validated graphs never have more
  /// than one.
  pub fn find_producer(&self, target: &str, vars: &VariableStore) -> Result<Option<&Rule>, ExpandError> {
    let mut found = None;

    for rule in &self.rules {
      for expr in &rule.targets {
        if expand::evaluate(expr, vars)? == target {
          found = Some(rule);
        }
      }
    }

    if let Some(rule) = found {
      debug!(target = %target, rule = %rule.name, "found producer");
    }

    Ok(found)
  }

  /// Check the graph for ambiguous producers, multiple defaults and cycles.
  pub fn validate(&self, vars: &VariableStore) -> Result<(), GraphError> {
    let mut defaults = self.rules.iter().filter(|r| r.is_default);
    if let (Some(first), Some(second)) = (defaults.next(), defaults.next()) {
      return Err(GraphError::MultipleDefaults {
        first: first.name.clone(),
        second: second.name.clone(),
      });
    }

    // target -> index of producing rule
    let mut producers: HashMap<String, usize> = HashMap::new();
    for (i, rule) in self.rules.iter().enumerate() {
      for expr in &rule.targets {
        let target = expand::evaluate(expr, vars).map_err(|source| GraphError::Expand {
          rule: rule.name.clone(),
          source,
        })?;

        match producers.get(&target) {
          Some(&j) if j != i => {
            return Err(GraphError::DuplicateTarget {
              target,
              first: self.rules[j].name.clone(),
              second: rule.name.clone(),
            });
          }
          Some(_) => {}
          None => {
            producers.insert(target, i);
          }
        }
      }
    }

    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let nodes: Vec<NodeIndex> = (0..self.rules.len()).map(|i| graph.add_node(i)).collect();

    for (i, rule) in self.rules.iter().enumerate() {
      for expr in &rule.dependencies {
        // Dependencies that cannot be expanded yet are reported when the rule runs.
        let Ok(dependency) = expand::evaluate(expr, vars) else {
          continue;
        };
        if let Some(&producer) = producers.get(&dependency) {
          graph.add_edge(nodes[i], nodes[producer], ());
        }
      }
    }

    toposort(&graph, None).map_err(|cycle| {
      let start = cycle.node_id();
      let chain = cycle_path(&graph, start)
        .into_iter()
        .map(|n| self.rules[graph[n]].name.clone())
        .collect();
      GraphError::Cycle { chain }
    })?;

    Ok(())
  }

  /// Describe every rule in declaration order.
  pub fn summaries(&self, vars: &VariableStore) -> Vec<RuleSummary> {
    let expand_all = |exprs: &[String]| -> Vec<String> {
      exprs
        .iter()
        .map(|e| expand::evaluate(e, vars).unwrap_or_else(|_| e.clone()))
        .collect()
    };

    self
      .rules
      .iter()
      .map(|rule| RuleSummary {
        name: rule.name.clone(),
        targets: expand_all(&rule.targets),
        dependencies: expand_all(&rule.dependencies),
        default: rule.is_default,
        action: match rule.action {
          Action::None => "none",
          Action::Steps(_) => "steps",
          Action::Script(_) => "script",
        },
      })
      .collect()
  }
}

/// Walk from `start` until it is reached again, returning the nodes on the way.
fn cycle_path(graph: &DiGraph<usize, ()>, start: NodeIndex) -> Vec<NodeIndex> {
  fn walk(
    graph: &DiGraph<usize, ()>,
    current: NodeIndex,
    start: NodeIndex,
    path: &mut Vec<NodeIndex>,
    visited: &mut HashSet<NodeIndex>,
  ) -> bool {
    for next in graph.neighbors(current) {
      if next == start {
        path.push(next);
        return true;
      }
      if visited.insert(next) {
        path.push(next);
        if walk(graph, next, start, path, visited) {
          return true;
        }
        path.pop();
      }
    }
    false
  }

  let mut path = vec![start];
  let mut visited = HashSet::from([start]);
  walk(graph, start, start, &mut path, &mut visited);
  path
}
