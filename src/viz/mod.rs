//! Export of the structural clustering for external graph tools

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Result;

use crate::calculator::Clustering;
use crate::cluster::{ClusteringSummary, VertexStatus};

/// Write `clusters.graphml` and `cluster_stats.csv` into `output_dir`
pub fn export_clustering(clustering: &Clustering, summary: &ClusteringSummary, output_dir: &str) -> Result<()> {
    log::info!("Exporting {} clusters", summary.cluster_count);

    let viz_dir = Path::new(output_dir).join("clusters");
    fs::create_dir_all(&viz_dir)?;

    write_cluster_graphml(clustering, &viz_dir.join("clusters.graphml"))?;
    write_cluster_stats(summary, &viz_dir.join("cluster_stats.csv"))?;

    Ok(())
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn status_name(status: VertexStatus) -> &'static str {
    match status {
        VertexStatus::Member => "member",
        VertexStatus::Hub => "hub",
        VertexStatus::Outlier => "outlier",
    }
}

/// GraphML with one node per working id (label, type, cluster, status)
/// and one undirected edge per adjacency of the clustered graph
pub fn write_cluster_graphml(clustering: &Clustering, path: &Path) -> Result<()> {
    let Clustering {
        layout,
        graph,
        assignment,
    } = clustering;

    let mut file = BufWriter::new(File::create(path)?);

    // Write GraphML header
    writeln!(file, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
    writeln!(file, "<graphml xmlns=\"http://graphml.graphdrawing.org/xmlns\">")?;
    writeln!(file, "  <key id=\"label\" for=\"node\" attr.name=\"label\" attr.type=\"string\"/>")?;
    writeln!(file, "  <key id=\"type\" for=\"node\" attr.name=\"type\" attr.type=\"string\"/>")?;
    writeln!(file, "  <key id=\"cluster\" for=\"node\" attr.name=\"cluster\" attr.type=\"int\"/>")?;
    writeln!(file, "  <key id=\"status\" for=\"node\" attr.name=\"status\" attr.type=\"string\"/>")?;
    writeln!(file, "  <key id=\"core\" for=\"node\" attr.name=\"core\" attr.type=\"boolean\"/>")?;
    writeln!(file, "  <graph id=\"G\" edgedefault=\"undirected\">")?;

    for partition in layout.partitions() {
        for v in partition.range.clone() {
            writeln!(file, "    <node id=\"n{}\">", v)?;
            writeln!(file, "      <data key=\"label\">{}</data>", escape(layout.label(v)))?;
            writeln!(file, "      <data key=\"type\">{}</data>", partition.node_type)?;
            writeln!(file, "      <data key=\"cluster\">{}</data>", assignment.cluster_of(v))?;
            writeln!(file, "      <data key=\"status\">{}</data>", status_name(assignment.status(v)))?;
            writeln!(file, "      <data key=\"core\">{}</data>", assignment.is_core(v))?;
            writeln!(file, "    </node>")?;
        }
    }

    // Each undirected edge once
    let mut edge_id = 0;
    for v in 0..graph.node_count {
        for &u in graph.neighbours(v) {
            if (u as usize) > v {
                writeln!(file, "    <edge id=\"e{}\" source=\"n{}\" target=\"n{}\"/>", edge_id, v, u)?;
                edge_id += 1;
            }
        }
    }

    // Write GraphML footer
    writeln!(file, "  </graph>")?;
    writeln!(file, "</graphml>")?;
    file.flush()?;

    Ok(())
}

/// One CSV row per cluster grown from a core
pub fn write_cluster_stats(summary: &ClusteringSummary, path: &Path) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);

    writeln!(file, "cluster_id,size,density,central_nodes")?;
    for cluster in &summary.clusters {
        let central = cluster
            .central_nodes
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(file, "{},{},{:.6},{}", cluster.id, cluster.size, cluster.density, central)?;
    }
    file.flush()?;

    Ok(())
}
