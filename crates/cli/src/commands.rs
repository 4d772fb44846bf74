//! Command implementations

use anyhow::{Context, Result, bail};
use blueprint_canvas::{CanvasSync, NodeData};
use blueprint_core::EngineError;
use blueprint_ir::serialization::{default_file_name, ensure_extension};
use blueprint_ir::{ProjectConfig, ProjectDocument, Validator, parse_document, save_document};
use blueprint_state::{CanvasMode, Density, EngineConfig, EntityFilter, Workspace};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

/// Load a document file into a fresh workspace
fn open_workspace(config: &EngineConfig, file: &Path) -> Result<Workspace> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("cannot read {}", file.display()))?;
    let mut workspace = Workspace::new(config.clone());
    workspace
        .import_json(&text)
        .with_context(|| format!("cannot import {}", file.display()))?;
    Ok(workspace)
}

pub fn new_project(
    config: &EngineConfig,
    name: &str,
    output: Option<PathBuf>,
    description: Option<String>,
    force: bool,
) -> Result<ExitCode> {
    if name.trim().is_empty() {
        bail!("project name cannot be empty");
    }
    let path = ensure_extension(output.unwrap_or_else(|| PathBuf::from(default_file_name(name))));
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let mut project = ProjectConfig::new(name);
    if let Some(description) = description {
        project = project.with_description(description);
    }
    let workspace = Workspace::with_project(config.clone(), project);
    save_document(&workspace.export(), &path)?;

    println!(
        "{} Created project '{}' at {}",
        "✓".green().bold(),
        name.cyan(),
        path.display()
    );
    Ok(ExitCode::SUCCESS)
}

pub fn validate(file: &Path) -> Result<ExitCode> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("cannot read {}", file.display()))?;

    let doc = match parse_document(&text) {
        Ok(doc) => doc,
        Err(EngineError::ImportRejected(violations)) => {
            println!(
                "{} {} has {} problem(s):",
                "✗".red().bold(),
                file.display(),
                violations.len()
            );
            for violation in &violations {
                println!("  {} {}", "-".red(), violation);
            }
            return Ok(ExitCode::FAILURE);
        }
        Err(err) => {
            println!("{} {}: {}", "✗".red().bold(), file.display(), err);
            return Ok(ExitCode::FAILURE);
        }
    };

    let result = Validator::with_default_rules().validate(&doc);
    for warning in &result.warnings {
        println!("  {} {}", "!".yellow(), warning);
    }

    let stats = doc.stats();
    println!(
        "{} {} is valid ({} entities, {} relations, {} services)",
        "✓".green().bold(),
        file.display(),
        stats.entities,
        stats.relations,
        stats.services
    );
    Ok(ExitCode::SUCCESS)
}

pub fn info(config: &EngineConfig, file: &Path) -> Result<ExitCode> {
    let workspace = open_workspace(config, file)?;
    let doc = workspace.view().to_document();
    print_info(&doc);
    Ok(ExitCode::SUCCESS)
}

fn print_info(doc: &ProjectDocument) {
    let project = &doc.project;
    println!("{} {}", project.name.bold(), format!("v{}", project.version).dimmed());
    if !project.description.is_empty() {
        println!("{}", project.description);
    }
    println!("package: {}", project.package_name);

    let stats = doc.stats();
    println!();
    println!(
        "{} entities, {} fields, {} relations, {} services, {} connections ({} unassigned)",
        stats.entities,
        stats.fields,
        stats.relations,
        stats.services,
        stats.connections,
        stats.unassigned_entities
    );

    if !doc.entities.is_empty() {
        println!();
        println!("{}", "Entities".underline());
        for entity in &doc.entities {
            let owner = doc
                .service_for_entity(entity.id)
                .map(|s| format!(" [{}]", s.name))
                .unwrap_or_default();
            println!(
                "  {} ({}) {} fields{}",
                entity.name.cyan(),
                entity.table_name,
                entity.fields.len(),
                owner.dimmed()
            );
        }
    }

    if !doc.relations.is_empty() {
        println!();
        println!("{}", "Relations".underline());
        for relation in &doc.relations {
            let name = |id| {
                doc.entity(id)
                    .map(|e| e.name.as_str())
                    .unwrap_or("?")
            };
            println!(
                "  {}.{} {} {}",
                name(relation.source_entity_id),
                relation.source_field_name,
                relation.relation_type.arrow_symbol(),
                name(relation.target_entity_id)
            );
        }
    }

    if !doc.services.is_empty() {
        println!();
        println!("{}", "Services".underline());
        for service in &doc.services {
            println!(
                "  {} {} :{}{} ({} entities)",
                "■".color(colored::Color::TrueColor {
                    r: hex_channel(&service.color, 1),
                    g: hex_channel(&service.color, 3),
                    b: hex_channel(&service.color, 5),
                }),
                service.name.cyan(),
                service.config.port,
                service.config.base_path,
                service.entity_ids.len()
            );
        }
    }

    if !doc.service_connections.is_empty() {
        println!();
        println!("{}", "Connections".underline());
        for connection in &doc.service_connections {
            let name = |id| {
                doc.service(id)
                    .map(|s| s.name.as_str())
                    .unwrap_or("?")
            };
            println!(
                "  {} -> {} ({})",
                name(connection.source_service_id),
                name(connection.target_service_id),
                connection.communication_type
            );
        }
    }
}

/// One channel of a `#rrggbb` color; 128 when unparsable
fn hex_channel(color: &str, start: usize) -> u8 {
    color
        .get(start..start + 2)
        .and_then(|h| u8::from_str_radix(h, 16).ok())
        .unwrap_or(128)
}

pub fn layout(
    config: &EngineConfig,
    file: &Path,
    density: Option<&str>,
    output: Option<PathBuf>,
) -> Result<ExitCode> {
    let mut workspace = open_workspace(config, file)?;
    if let Some(density) = density {
        let Some(density) = Density::parse(density) else {
            bail!("unknown density '{}'", density);
        };
        workspace.layout_mut().set_density(density);
    }
    workspace.apply_auto_layout();

    let target = output.unwrap_or_else(|| file.to_path_buf());
    save_document(&workspace.export(), &target)?;
    info!(path = %target.display(), "layout written");

    println!(
        "{} Laid out {} entities in {} services -> {}",
        "✓".green().bold(),
        workspace.entities().len(),
        workspace.services().len(),
        target.display()
    );
    Ok(ExitCode::SUCCESS)
}

pub fn canvas(
    config: &EngineConfig,
    file: &Path,
    mode: &str,
    filter: &str,
    json: bool,
) -> Result<ExitCode> {
    let workspace = open_workspace(config, file)?;

    let mode = match mode {
        "services" => CanvasMode::Services,
        _ => CanvasMode::Entities,
    };
    let filter = match filter {
        "all" => EntityFilter::All,
        "unassigned" => EntityFilter::Unassigned,
        name => match workspace.services().all().iter().find(|s| s.name == name) {
            Some(service) => EntityFilter::Service(service.id),
            None => bail!("no service named '{}'", name),
        },
    };
    {
        let mut layout = workspace.layout_mut();
        layout.set_mode(mode);
        layout.set_filter(filter);
    }

    let view = workspace.view();
    let mut canvas = CanvasSync::new();
    canvas.sync(&view);
    canvas.mark_measured(&view);

    if json {
        println!("{}", canvas.graph().to_json()?);
        return Ok(ExitCode::SUCCESS);
    }

    for node in canvas.nodes() {
        let indent = if node.parent_id.is_some() { "    " } else { "  " };
        match &node.data {
            NodeData::Service(data) => println!(
                "{}{} {} @ ({}, {}) {} entities",
                indent,
                "service".magenta(),
                data.name.bold(),
                node.position.x,
                node.position.y,
                data.entity_count
            ),
            NodeData::Entity(data) => println!(
                "{}{} {} @ ({}, {}) {} fields",
                indent,
                "entity".cyan(),
                data.name.bold(),
                node.position.x,
                node.position.y,
                data.fields.len()
            ),
        }
    }
    for edge in canvas.edges() {
        println!("  {} {} -> {} {}", "edge".dimmed(), edge.source, edge.target, edge.label);
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_channel() {
        assert_eq!(hex_channel("#6366f1", 1), 0x63);
        assert_eq!(hex_channel("#6366f1", 5), 0xf1);
        assert_eq!(hex_channel("red", 1), 128);
    }
}
