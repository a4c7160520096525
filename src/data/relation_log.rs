//! Plain-text relation log, one relation per line:
//!
//! ```text
//! source;target;name;height;weight;reverse_weight;decayable;source_type;target_type[;source_balance;target_balance]
//! ```
//!
//! Balances are only written for transfers. Blank lines and lines starting
//! with `#` are ignored when reading.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};

use crate::graph::{NodeType, Relation, RelationKind, RelationPolicy};

const SEPARATOR: &str = ";";

/// Render one relation as a log line (without the newline)
pub fn export_relation(relation: &Relation) -> String {
    let policy = relation.policy();
    let mut fields = vec![
        relation.source.clone(),
        relation.target.clone(),
        relation.name().to_string(),
        relation.height.to_string(),
        policy.weight.to_string(),
        policy.reverse_weight.to_string(),
        u8::from(policy.decayable).to_string(),
        policy.source_type.to_string(),
        policy.target_type.to_string(),
    ];

    if let RelationKind::Transfer {
        source_balance,
        target_balance,
        ..
    } = relation.kind
    {
        fields.push(source_balance.to_string());
        fields.push(target_balance.to_string());
    }

    fields.join(SEPARATOR)
}

pub fn write_relations<W: Write>(writer: W, relations: &[Relation]) -> Result<()> {
    let mut writer = BufWriter::new(writer);
    for relation in relations {
        writeln!(writer, "{}", export_relation(relation))?;
    }
    writer.flush()?;
    Ok(())
}

fn field<'a>(fields: &[&'a str], idx: usize, name: &str) -> Result<&'a str> {
    fields
        .get(idx)
        .copied()
        .ok_or_else(|| anyhow!("missing field '{}'", name))
}

fn number<T: std::str::FromStr>(fields: &[&str], idx: usize, name: &str) -> Result<T> {
    let raw = field(fields, idx, name)?;
    raw.trim()
        .parse()
        .map_err(|_| anyhow!("field '{}' is not a number: '{}'", name, raw))
}

fn node_type(fields: &[&str], idx: usize, name: &str) -> Result<NodeType> {
    field(fields, idx, name)?.trim().parse().map_err(|e: String| anyhow!(e))
}

/// Parse one log line
pub fn parse_line(line: &str) -> Result<Relation> {
    let fields: Vec<&str> = line.split(SEPARATOR).collect();
    if fields.len() != 9 && fields.len() != 11 {
        bail!("expected 9 or 11 fields, found {}", fields.len());
    }

    let decayable = match field(&fields, 6, "decayable")?.trim() {
        "1" | "true" => true,
        "0" | "false" => false,
        other => bail!("field 'decayable' is not a flag: '{}'", other),
    };

    let policy = RelationPolicy {
        weight: number(&fields, 4, "weight")?,
        reverse_weight: number(&fields, 5, "reverse_weight")?,
        decayable,
        source_type: node_type(&fields, 7, "source_type")?,
        target_type: node_type(&fields, 8, "target_type")?,
    };

    let balances = if fields.len() == 11 {
        (
            number(&fields, 9, "source_balance")?,
            number(&fields, 10, "target_balance")?,
        )
    } else {
        (0, 0)
    };

    let name = field(&fields, 2, "name")?.trim();
    Ok(Relation::new(
        RelationKind::from_parts(name, policy, balances),
        field(&fields, 0, "source")?,
        field(&fields, 1, "target")?,
        number(&fields, 3, "height")?,
    ))
}

pub fn read_relations<R: BufRead>(reader: R) -> Result<Vec<Relation>> {
    let mut relations = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let relation = parse_line(trimmed).with_context(|| format!("line {}", idx + 1))?;
        relations.push(relation);
    }

    Ok(relations)
}

pub fn load_file(path: &Path) -> Result<Vec<Relation>> {
    log::info!("Reading relation log: {}", path.display());
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let relations = read_relations(BufReader::new(file))?;
    log::info!("Loaded {} relations", relations.len());
    Ok(relations)
}
