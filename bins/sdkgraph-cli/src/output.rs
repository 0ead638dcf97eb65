// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Rendering of a finished run.

use std::io::{self, Write};

use comfy_table::Table;
use serde::Serialize;

use sdkgraph_core::{BuildReport, ModuleGraph, PassSummary, SnapshotOutput};

/// One diagnostic, flattened for output.
#[derive(Debug, Serialize)]
pub struct DiagnosticOut {
    module: String,
    variant: String,
    property: Option<String>,
    message: String,
}

/// One outgoing edge.
#[derive(Debug, Serialize)]
pub struct EdgeOut {
    to: String,
    variant: String,
    tag: String,
}

/// Final state of one module.
#[derive(Debug, Serialize)]
pub struct ModuleOut {
    name: String,
    variant: String,
    module_type: String,
    containing_sdk: Option<String>,
    required_sdks: Vec<String>,
    failed: bool,
    deps: Vec<EdgeOut>,
}

/// Everything a run produced.
#[derive(Debug, Serialize)]
pub struct RunOutput<'a> {
    succeeded: bool,
    diagnostics: Vec<DiagnosticOut>,
    passes: &'a [PassSummary],
    snapshots: &'a [SnapshotOutput],
    modules: Vec<ModuleOut>,
}

impl<'a> RunOutput<'a> {
    /// Collects the report and the final graph.
    pub fn new(report: &'a BuildReport, graph: &ModuleGraph) -> Self {
        let diagnostics = report
            .diagnostics
            .iter()
            .map(|d| DiagnosticOut {
                module: d.module.clone(),
                variant: d.variant.to_string(),
                property: d.property.clone(),
                message: d.error.to_string(),
            })
            .collect();
        let modules = graph
            .iter_modules()
            .map(|(id, record)| {
                let aware = record.module().as_sdk_aware();
                ModuleOut {
                    name: record.name().to_owned(),
                    variant: record.variant().to_string(),
                    module_type: record.module().module_type().to_owned(),
                    containing_sdk: aware
                        .and_then(|a| a.containing_sdk())
                        .map(ToString::to_string),
                    required_sdks: aware
                        .map(|a| a.required_sdks().iter().map(ToString::to_string).collect())
                        .unwrap_or_default(),
                    failed: graph.is_failed(id),
                    deps: graph
                        .deps(id)
                        .iter()
                        .filter_map(|e| {
                            let target = graph.module(e.to)?;
                            Some(EdgeOut {
                                to: target.name().to_owned(),
                                variant: target.variant().to_string(),
                                tag: e.tag.to_string(),
                            })
                        })
                        .collect(),
                }
            })
            .collect();
        Self {
            succeeded: report.succeeded(),
            diagnostics,
            passes: &report.passes,
            snapshots: &report.snapshots,
            modules,
        }
    }

    /// Pretty JSON.
    pub fn write_json(&self, out: &mut impl Write) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *out, self)?;
        writeln!(out)
    }

    /// Human-readable tables.
    pub fn write_table(&self, out: &mut impl Write) -> io::Result<()> {
        let mut passes = Table::new();
        passes.set_header(["pass", "visited", "edges added", "rewired", "errors"]);
        for p in self.passes {
            passes.add_row([
                p.name.clone(),
                p.visited.to_string(),
                p.edges_added.to_string(),
                p.edges_rewired.to_string(),
                p.errors.to_string(),
            ]);
        }
        writeln!(out, "{passes}")?;

        let mut modules = Table::new();
        modules.set_header(["module", "variant", "sdk", "requires", "deps"]);
        for m in &self.modules {
            let deps: Vec<_> = m
                .deps
                .iter()
                .map(|e| format!("{} ({})", e.to, e.variant))
                .collect();
            let mut name = m.name.clone();
            if m.failed {
                name.push_str(" [failed]");
            }
            modules.add_row([
                name,
                m.variant.clone(),
                m.containing_sdk.clone().unwrap_or_default(),
                m.required_sdks.join(", "),
                deps.join("\n"),
            ]);
        }
        writeln!(out, "{modules}")?;

        for s in self.snapshots {
            writeln!(out, "snapshot {} ({}): {}", s.sdk, s.variant, s.path.display())?;
        }
        for d in &self.diagnostics {
            match &d.property {
                Some(p) => writeln!(out, "error: {} ({}): {p}: {}", d.module, d.variant, d.message)?,
                None => writeln!(out, "error: {} ({}): {}", d.module, d.variant, d.message)?,
            }
        }
        Ok(())
    }
}
