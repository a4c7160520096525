//! Parquet file handling for relation data

use std::path::Path;

use anyhow::{anyhow, bail, Result};
use polars::prelude::*;

use crate::graph::{NodeType, Relation, RelationKind, RelationPolicy};

fn int_column(df: &DataFrame, name: &str) -> Result<Column> {
    Ok(df.column(name)?.cast(&DataType::Int64)?)
}

fn optional_int_column(df: &DataFrame, name: &str) -> Result<Option<Column>> {
    match df.column(name) {
        Ok(column) => Ok(Some(column.cast(&DataType::Int64)?)),
        Err(_) => Ok(None),
    }
}

/// Load relations from a parquet file with the columns `Source`, `Target`,
/// `Name`, `Height`, `Weight`, `ReverseWeight`, `SourceType`, `TargetType`
/// and optionally `Decayable`, `SourceBalance`, `TargetBalance`
pub fn load_relations(path: &str) -> Result<Vec<Relation>> {
    log::info!("Reading parquet file: {}", path);

    if !Path::new(path).exists() {
        return Err(anyhow!("File not found: {}", path));
    }

    let df = LazyFrame::scan_parquet(path, Default::default())?.collect()?;

    log::info!("File schema: {:?}", df.schema());
    log::info!("Loaded {} relation rows", df.height());

    relations_from_frame(&df)
}

/// Convert an in-memory frame with the relation columns
pub fn relations_from_frame(df: &DataFrame) -> Result<Vec<Relation>> {
    let source = df.column("Source")?.str()?;
    let target = df.column("Target")?.str()?;
    let name = df.column("Name")?.str()?;
    let source_type = df.column("SourceType")?.str()?;
    let target_type = df.column("TargetType")?.str()?;

    let height = int_column(df, "Height")?;
    let height = height.i64()?;
    let weight = int_column(df, "Weight")?;
    let weight = weight.i64()?;
    let reverse_weight = int_column(df, "ReverseWeight")?;
    let reverse_weight = reverse_weight.i64()?;

    let decayable = match df.column("Decayable") {
        Ok(column) => Some(column.bool()?),
        Err(_) => None,
    };
    let source_balance = optional_int_column(df, "SourceBalance")?;
    let source_balance = source_balance.as_ref().map(|c| c.i64()).transpose()?;
    let target_balance = optional_int_column(df, "TargetBalance")?;
    let target_balance = target_balance.as_ref().map(|c| c.i64()).transpose()?;

    let parse_type = |raw: Option<&str>, row: usize| -> Result<NodeType> {
        raw.unwrap_or_default()
            .parse()
            .map_err(|e: String| anyhow!("row {}: {}", row, e))
    };

    let mut relations = Vec::with_capacity(df.height());

    for i in 0..df.height() {
        let (Some(src), Some(dst), Some(kind)) = (source.get(i), target.get(i), name.get(i)) else {
            bail!("row {}: source, target and name are required", i);
        };
        let Some(h) = height.get(i).and_then(|h| u64::try_from(h).ok()) else {
            bail!("row {}: height must be a non-negative integer", i);
        };

        let policy = RelationPolicy {
            weight: weight.get(i).unwrap_or(0),
            reverse_weight: reverse_weight.get(i).unwrap_or(0),
            decayable: decayable.and_then(|c| c.get(i)).unwrap_or(true),
            source_type: parse_type(source_type.get(i), i)?,
            target_type: parse_type(target_type.get(i), i)?,
        };

        let balance = |column: Option<&Int64Chunked>| {
            column
                .and_then(|c| c.get(i))
                .map_or(0, |b| u64::try_from(b).unwrap_or(0))
        };
        let balances = (balance(source_balance), balance(target_balance));

        relations.push(Relation::new(
            RelationKind::from_parts(kind, policy, balances),
            src,
            dst,
            h,
        ));
    }

    Ok(relations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        df!(
            "Source" => &["a", "a", "b"],
            "Target" => &["b", "p", "a"],
            "Name" => &["TRANSFER", "UPVOTE", "BOOKMARK"],
            "Height" => &[10i64, 11, 12],
            "Weight" => &[500i64, 1, 4],
            "ReverseWeight" => &[-500i64, 0, 2],
            "SourceType" => &["ACCOUNT", "ACCOUNT", "ACCOUNT"],
            "TargetType" => &["ACCOUNT", "CONTENT", "ACCOUNT"],
            "SourceBalance" => &[70i64, 0, 0],
            "TargetBalance" => &[80i64, 0, 0]
        )
        .unwrap()
    }

    #[test]
    fn test_relations_from_frame() {
        let relations = relations_from_frame(&frame()).unwrap();

        assert_eq!(relations.len(), 3);
        assert_eq!(relations[0], Relation::transfer("a", "b", 500, 70, 80, 10));
        assert_eq!(relations[1], Relation::upvote("a", "p", 11));

        let custom = relations[2].policy();
        assert_eq!(relations[2].name(), "BOOKMARK");
        assert_eq!((custom.weight, custom.reverse_weight), (4, 2));
        assert!(custom.decayable);
    }

    #[test]
    fn test_load_from_parquet_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relations.parquet");

        let mut df = frame();
        let mut file = std::fs::File::create(&path).unwrap();
        ParquetWriter::new(&mut file).finish(&mut df).unwrap();

        let relations = load_relations(path.to_str().unwrap()).unwrap();
        assert_eq!(relations.len(), 3);
        assert_eq!(relations[1].target, "p");
    }

    #[test]
    fn test_missing_file() {
        assert!(load_relations("/nonexistent/relations.parquet").is_err());
    }
}
