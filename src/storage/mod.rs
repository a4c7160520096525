//! Results persistence module

pub mod snapshot;

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use itertools::Itertools;
use serde_json::{json, to_string_pretty};

use crate::calculator::Scores;
use crate::cluster::ClusteringSummary;

/// How many top-ranked nodes per type the summary lists
const TOP_NODES: usize = 10;

/// Save calculation results to the specified directory
pub fn save_results(
    scores: &Scores,
    clustering: Option<&ClusteringSummary>,
    handled_blocks: u64,
    output_dir: &str,
) -> Result<()> {
    log::info!("Saving scores of {} node types to {}", scores.len(), output_dir);

    // Ensure output directory exists
    fs::create_dir_all(output_dir)?;

    save_scores(scores, output_dir)?;
    save_summary(scores, clustering, handled_blocks, output_dir)?;

    log::info!("Results saved successfully");

    Ok(())
}

/// Save every score, grouped by node type
fn save_scores(scores: &Scores, output_dir: &str) -> Result<()> {
    let path = Path::new(output_dir).join("scores.json");
    let mut file = File::create(path)?;

    let by_type: serde_json::Map<String, serde_json::Value> = scores
        .iter()
        .map(|(node_type, by_id)| (node_type.to_string(), json!(by_id)))
        .collect();

    file.write_all(to_string_pretty(&by_type)?.as_bytes())?;

    Ok(())
}

/// Save summary information
fn save_summary(
    scores: &Scores,
    clustering: Option<&ClusteringSummary>,
    handled_blocks: u64,
    output_dir: &str,
) -> Result<()> {
    log::info!("Saving summary information");

    let path = Path::new(output_dir).join("summary.json");
    let mut file = File::create(path)?;

    let node_types: serde_json::Map<String, serde_json::Value> = scores
        .iter()
        .map(|(node_type, by_id)| {
            let top = by_id
                .iter()
                .sorted_by(|a, b| b.1.total_cmp(a.1).then_with(|| a.0.cmp(b.0)))
                .take(TOP_NODES)
                .map(|(id, score)| json!({ "id": id, "score": score }))
                .collect::<Vec<_>>();

            let stats = json!({
                "node_count": by_id.len(),
                "score_sum": by_id.values().sum::<f64>(),
                "top_nodes": top,
            });
            (node_type.to_string(), stats)
        })
        .collect();

    let cluster_stats = clustering.map(|summary| {
        json!({
            "cluster_count": summary.cluster_count,
            "core_count": summary.core_count,
            "hub_count": summary.hub_count,
            "outlier_count": summary.outlier_count,
            "largest_cluster_size": summary.clusters.first().map_or(0, |c| c.size),
            "avg_density": summary.clusters.iter().map(|c| c.density as f64).sum::<f64>() /
                           if summary.clusters.is_empty() { 1.0 } else { summary.clusters.len() as f64 },
        })
    });

    let summary = json!({
        "handled_blocks": handled_blocks,
        "node_count": scores.values().map(|by_id| by_id.len()).sum::<usize>(),
        "node_types": node_types,
        "cluster_stats": cluster_stats,
    });

    file.write_all(to_string_pretty(&summary)?.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeType;

    #[test]
    fn test_save_results_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out");
        let output = output.to_str().unwrap();

        let mut scores = Scores::new();
        let accounts = scores.entry(NodeType::Account).or_default();
        accounts.insert("a".to_string(), 0.25);
        accounts.insert("b".to_string(), 0.75);

        save_results(&scores, None, 3, output).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(Path::new(output).join("scores.json")).unwrap()).unwrap();
        assert_eq!(written["ACCOUNT"]["b"], json!(0.75));

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(Path::new(output).join("summary.json")).unwrap()).unwrap();
        assert_eq!(summary["handled_blocks"], json!(3));
        assert_eq!(summary["node_types"]["ACCOUNT"]["top_nodes"][0]["id"], json!("b"));
        assert!(summary["cluster_stats"].is_null());
    }
}
