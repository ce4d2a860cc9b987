//! ---
//! tp_section: "05-operator-tooling"
//! tp_subsection: "binary"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Inspection CLI for operators working with protocol adaptables."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value as JsonValue;
use twinproto_adapter::SignalAdapterRegistry;
use twinproto_common::AdapterConfig;
use twinproto_model::{Acknowledgements, Adaptable, Signal, TopicDescriptor};

/// Print the parts of `raw`.
pub fn topic(raw: &str) -> Result<()> {
    print!("{}", describe_topic(raw)?);
    Ok(())
}

/// Round-trip every adaptable in `file` and fail when any line mismatches.
pub fn roundtrip(config: &AdapterConfig, file: &Path) -> Result<()> {
    let contents = fs::read_to_string(file)
        .with_context(|| format!("unable to read {}", file.display()))?;
    let registry = SignalAdapterRegistry::from_config(config);
    let report = roundtrip_report(&registry, &contents);
    for mismatch in &report.mismatches {
        println!("line {}: {}", mismatch.line, mismatch.reason);
    }
    println!(
        "{} adaptables checked, {} mismatches",
        report.checked,
        report.mismatches.len()
    );
    if !report.mismatches.is_empty() {
        bail!("{} adaptables did not round-trip", report.mismatches.len());
    }
    Ok(())
}

/// Print combined status and entity of the aggregate in `file`.
pub fn acks(config: &AdapterConfig, file: &Path) -> Result<()> {
    let contents = fs::read_to_string(file)
        .with_context(|| format!("unable to read {}", file.display()))?;
    let registry = SignalAdapterRegistry::from_config(config);
    print!("{}", describe_acks(&registry, &contents)?);
    Ok(())
}

fn describe_topic(raw: &str) -> Result<String> {
    let topic = TopicDescriptor::parse(raw).with_context(|| format!("invalid topic '{raw}'"))?;
    let mut out = String::new();
    writeln!(out, "namespace: {}", topic.namespace())?;
    writeln!(out, "entity:    {}", topic.entity_name())?;
    writeln!(out, "group:     {}", topic.group())?;
    writeln!(out, "channel:   {}", topic.channel())?;
    writeln!(out, "criterion: {}", topic.criterion())?;
    if let Some(action) = topic.action() {
        writeln!(out, "action:    {action}")?;
    }
    if let Some(action) = topic.search_action() {
        writeln!(out, "action:    {action}")?;
    }
    if let Some(subject) = topic.subject() {
        writeln!(out, "subject:   {subject}")?;
    }
    match topic.entity_id() {
        Some(id) => writeln!(out, "entity id: {id}")?,
        None => writeln!(out, "entity id: (placeholder)")?,
    }
    Ok(out)
}

#[derive(Debug, Default)]
struct RoundtripReport {
    checked: usize,
    mismatches: Vec<Mismatch>,
}

#[derive(Debug)]
struct Mismatch {
    line: usize,
    reason: String,
}

fn roundtrip_report(registry: &SignalAdapterRegistry, contents: &str) -> RoundtripReport {
    let mut report = RoundtripReport::default();
    for (index, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        report.checked += 1;
        if let Err(err) = roundtrip_line(registry, line) {
            report.mismatches.push(Mismatch {
                line: index + 1,
                reason: format!("{err:#}"),
            });
        }
    }
    report
}

fn roundtrip_line(registry: &SignalAdapterRegistry, line: &str) -> Result<()> {
    let json: JsonValue = serde_json::from_str(line).context("not valid JSON")?;
    let adaptable = Adaptable::from_json(&json)?;
    let signal = registry.from_adaptable(&adaptable)?;
    let rendered = registry.to_adaptable(&signal, adaptable.topic().channel())?;
    if rendered.topic() != adaptable.topic() {
        bail!(
            "topic changed from '{}' to '{}'",
            adaptable.topic(),
            rendered.topic()
        );
    }
    let back = registry.from_adaptable(&rendered)?;
    if back != signal {
        bail!("{} signal changed after translating back", signal.kind());
    }
    Ok(())
}

fn describe_acks(registry: &SignalAdapterRegistry, contents: &str) -> Result<String> {
    let json: JsonValue = serde_json::from_str(contents).context("not valid JSON")?;
    // Accept either the aggregate itself or an adaptable on an acks topic.
    let acks = if json.get("topic").is_some() {
        match registry.from_adaptable(&Adaptable::from_json(&json)?)? {
            Signal::Acknowledgements(acks) => acks,
            other => return Err(anyhow!("expected acknowledgements, got {}", other.kind())),
        }
    } else {
        Acknowledgements::from_json(&json)?
    };

    let mut out = String::new();
    writeln!(out, "entity id: {}", acks.entity_id())?;
    writeln!(out, "members:   {}", acks.len())?;
    writeln!(out, "status:    {}", acks.status())?;
    let missing: Vec<&str> = acks.missing_labels().iter().map(|label| label.as_str()).collect();
    if !missing.is_empty() {
        writeln!(out, "missing:   {}", missing.join(", "))?;
    }
    match acks.get_entity(registry.schema_version()) {
        Some(entity) => writeln!(out, "entity:\n{}", serde_json::to_string_pretty(&entity)?)?,
        None => writeln!(out, "entity:    (none)")?,
    }
    Ok(out)
}
