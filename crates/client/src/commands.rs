//! Command-line surface over a store session.

use std::rc::Rc;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use client_bootstrap::Session;
use runtime::{Engine, EntityHandle, Value};

#[derive(Debug, Parser)]
#[command(name = "snapstore", about = "Embedded object store over per-type snapshots")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show every registered type with its load state and instance count
    Status,
    /// List every instance of a type
    List { type_name: String },
    /// Create an instance from `field=value` pairs
    Add {
        type_name: String,
        fields: Vec<String>,
    },
    /// Delete the first instance matching `field=value` pairs
    Remove {
        type_name: String,
        filter: Vec<String>,
    },
    /// Evaluate a has-many relation on the first instance matching `field=value` pairs
    Children {
        type_name: String,
        relation: String,
        filter: Vec<String>,
    },
}

impl Command {
    pub fn run(&self, session: &mut Session) -> Result<()> {
        match self {
            Self::Status => status(session),
            Self::List { type_name } => {
                for handle in session.all(type_name)? {
                    println!("{}", handle.borrow());
                }
                Ok(())
            }
            Self::Add { type_name, fields } => {
                let fields = parse_pairs(fields)?;
                let handle = session.create(type_name, fields)?;
                if let Err(e) = link_placeholders(session, &handle) {
                    session.remove_handle(&handle)?;
                    return Err(e);
                }
                println!("added {}", handle.borrow());
                Ok(())
            }
            Self::Remove { type_name, filter } => {
                let target = first_match(session, type_name, filter)?;
                let removed = session.delete(&target)?;
                println!("removed {}", removed.borrow());
                Ok(())
            }
            Self::Children {
                type_name,
                relation,
                filter,
            } => {
                let owner = first_match(session, type_name, filter)?;
                for child in session.has_many(&owner, relation)? {
                    println!("{}", child.borrow());
                }
                Ok(())
            }
        }
    }
}

fn status(engine: &Engine) -> Result<()> {
    for name in engine.type_names() {
        let state = engine
            .load_state(name)
            .map(ToString::to_string)
            .unwrap_or_else(|| "unknown".to_string());
        println!("{:<16} {:<28} {}", name, state, engine.count(name)?);
    }
    for relation in engine.pending_relations() {
        println!(
            "pending relation {}.{} -> {}",
            relation.owner_type, relation.field, relation.target_type
        );
    }
    Ok(())
}

/// Parse `field=value` arguments.
pub fn parse_pairs(args: &[String]) -> Result<Vec<(String, Value)>> {
    args.iter()
        .map(|arg| -> Result<(String, Value)> {
            let (field, raw) = arg
                .split_once('=')
                .ok_or_else(|| anyhow!("expected field=value, got `{}`", arg))?;
            if field.is_empty() {
                bail!("empty field name in `{}`", arg);
            }
            Ok((field.to_string(), Value::parse_literal(raw)))
        })
        .collect()
}

fn first_match(engine: &Engine, type_name: &str, filter: &[String]) -> Result<EntityHandle> {
    let pairs = parse_pairs(filter)?;
    let predicate: Vec<(&str, Value)> = pairs
        .iter()
        .map(|(field, value)| (field.as_str(), value.clone()))
        .collect();

    engine
        .find_first(type_name, &predicate)?
        .with_context(|| format!("no {} matches {:?}", type_name, filter))
}

/// Belongs-to fields given on the command line name the target by one of its
/// field values (`campout=Lake` is looked up as the first `Campout` with any
/// field equal to `"Lake"`). Replace such scalars with links.
fn link_placeholders(engine: &mut Engine, handle: &EntityHandle) -> Result<()> {
    let type_name = handle.borrow().type_name().to_string();
    let relations = engine.entity_type(&type_name)?.belongs_to_relations().to_vec();

    let mut links = Vec::new();
    for relation in relations {
        let Some(value) = handle.borrow().get(relation.field()).cloned() else {
            continue;
        };
        if value.is_null() || matches!(value, Value::Link(_)) {
            continue;
        }
        let target_type = relation.resolved_related_type();
        let target = engine
            .all(&target_type)?
            .into_iter()
            .find(|candidate| candidate.borrow().fields().any(|(_, v)| *v == value))
            .with_context(|| format!("no {} has a field equal to {}", target_type, value))?;
        if Rc::ptr_eq(&target, handle) {
            bail!("{} cannot reference itself", type_name);
        }
        links.push((relation.field().to_string(), Value::link(&target)));
    }

    if !links.is_empty() {
        engine.update(handle, links)?;
    }
    Ok(())
}
