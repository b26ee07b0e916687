//! Printing of computations.
//!
//! Two views are provided: an indented text listing for humans and a JSON
//! document in which every set and relation appears in its canonical
//! string form.

use crate::ir::computation::{AccessRelation, Computation, StatementRecord};
use serde::Serialize;

/// Pretty printer for computations.
pub struct PolyPrinter {
    /// Indentation level
    indent: usize,
    /// Output buffer
    buffer: String,
}

impl PolyPrinter {
    /// Create a new printer.
    pub fn new() -> Self {
        Self {
            indent: 0,
            buffer: String::new(),
        }
    }

    /// Get the output.
    pub fn output(&self) -> &str {
        &self.buffer
    }

    /// Take the output.
    pub fn take_output(self) -> String {
        self.buffer
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.buffer.push_str("  ");
        }
        self.buffer.push_str(text);
        self.buffer.push('\n');
    }

    fn print_relations(&mut self, title: &str, relations: &[AccessRelation]) {
        if relations.is_empty() {
            return;
        }
        self.line(title);
        self.indent += 1;
        for rel in relations {
            self.line(&format!("{}: {}", rel.space, rel));
        }
        self.indent -= 1;
    }

    /// Print one statement record.
    pub fn print_stmt(&mut self, stmt: &StatementRecord) {
        self.line(&format!("{}: {}", stmt.id, stmt.source));
        self.indent += 1;
        self.line(&format!("Iteration space: {}", stmt.iteration_space));
        self.line(&format!("Schedule: {}", stmt.execution_schedule));
        self.print_relations("Reads:", &stmt.reads);
        self.print_relations("Writes:", &stmt.writes);
        self.indent -= 1;
    }

    /// Print a whole computation.
    pub fn print_computation(&mut self, computation: &Computation) {
        self.line(&format!("Computation: {}", computation.name));
        let spaces: Vec<&str> = computation.data_spaces.iter().map(String::as_str).collect();
        self.line(&format!("Data spaces: {{{}}}", spaces.join(", ")));
        self.line(&format!("Statements ({}):", computation.num_stmts()));
        self.indent += 1;
        for stmt in &computation.statements {
            self.print_stmt(stmt);
        }
        self.indent -= 1;
    }
}

impl Default for PolyPrinter {
    fn default() -> Self {
        Self::new()
    }
}

/// Print a computation to a string.
pub fn print_computation(computation: &Computation) -> String {
    let mut printer = PolyPrinter::new();
    printer.print_computation(computation);
    printer.take_output()
}

/// Print several computations, separated by blank lines.
pub fn print_computations(computations: &[Computation]) -> String {
    computations
        .iter()
        .map(print_computation)
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Serialize)]
struct RelationView<'a> {
    space: &'a str,
    relation: String,
}

#[derive(Serialize)]
struct StatementView<'a> {
    id: String,
    source: &'a str,
    line: usize,
    iteration_space: String,
    execution_schedule: String,
    reads: Vec<RelationView<'a>>,
    writes: Vec<RelationView<'a>>,
}

#[derive(Serialize)]
struct ComputationView<'a> {
    name: &'a str,
    data_spaces: Vec<&'a str>,
    statements: Vec<StatementView<'a>>,
}

fn relation_views(relations: &[AccessRelation]) -> Vec<RelationView<'_>> {
    relations
        .iter()
        .map(|rel| RelationView { space: &rel.space, relation: rel.to_string() })
        .collect()
}

impl<'a> From<&'a Computation> for ComputationView<'a> {
    fn from(computation: &'a Computation) -> Self {
        Self {
            name: &computation.name,
            data_spaces: computation.data_spaces.iter().map(String::as_str).collect(),
            statements: computation
                .statements
                .iter()
                .map(|stmt| StatementView {
                    id: stmt.id.to_string(),
                    source: &stmt.source,
                    line: stmt.span.start_line,
                    iteration_space: stmt.iteration_space.to_string(),
                    execution_schedule: stmt.execution_schedule.to_string(),
                    reads: relation_views(&stmt.reads),
                    writes: relation_views(&stmt.writes),
                })
                .collect(),
        }
    }
}

/// Render computations as a JSON array, using the canonical strings.
pub fn computations_to_json(computations: &[Computation]) -> serde_json::Result<String> {
    let views: Vec<ComputationView<'_>> = computations.iter().map(ComputationView::from).collect();
    serde_json::to_string_pretty(&views)
}
