//! Summaries of an exported link graph.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct RangeLine {
    pub node: String,
    pub kind: String,
    pub begin: usize,
    pub end: usize,
}

/// One line of a `tech:writegraph` export.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkLine {
    pub index: usize,
    #[serde(rename = "type")]
    pub link_type: String,
    #[serde(default)]
    pub aggregation: Option<String>,
    pub src: RangeLine,
    pub dst: Vec<RangeLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphSummary {
    pub links: usize,
    /// Link count per link type.
    pub by_type: BTreeMap<String, usize>,
    /// Link count per `source node -> target node` pair.
    pub by_nodes: BTreeMap<String, usize>,
    /// Entries whose `index` does not match their line position.
    pub out_of_order: usize,
}

pub fn load_links(path: &Path) -> Result<Vec<LinkLine>, Box<dyn std::error::Error>> {
    let reader = BufReader::new(File::open(path)?);
    let mut links = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        links.push(serde_json::from_str::<LinkLine>(&line)?);
    }
    Ok(links)
}

pub fn summarize(links: &[LinkLine]) -> GraphSummary {
    let mut summary = GraphSummary {
        links: links.len(),
        ..GraphSummary::default()
    };
    for (position, link) in links.iter().enumerate() {
        *summary.by_type.entry(link.link_type.clone()).or_insert(0) += 1;
        for dst in &link.dst {
            let key = format!("{} -> {}", link.src.node, dst.node);
            *summary.by_nodes.entry(key).or_insert(0) += 1;
        }
        if link.index != position {
            summary.out_of_order += 1;
        }
    }
    summary
}

pub fn print_summary_table(summary: &GraphSummary) {
    println!("links: {}", summary.links);
    println!("{:<32} {:>8}", "type", "count");
    for (link_type, count) in &summary.by_type {
        println!("{:<32} {:>8}", link_type, count);
    }
    println!("{:<32} {:>8}", "nodes", "count");
    for (nodes, count) in &summary.by_nodes {
        println!("{:<32} {:>8}", nodes, count);
    }
    if summary.out_of_order > 0 {
        println!("out of order entries: {}", summary.out_of_order);
    }
}
