/// Terminal and JSON output for a scanned tree.
///
/// Rendering goes through the core `Materializer`, so the printed tree is
/// exactly what an interactive front-end would show level by level: sorted
/// by size, largest first, with small files folded into one bucket.
use diskmapper_core::materialize::{sort_by_size, DisplayNode, Materializer};
use diskmapper_core::model::size::{format_count, format_size};
use diskmapper_core::scanner::progress::ScanStats;
use diskmapper_core::EntryTree;
use serde::Serialize;

/// Indentation per depth level.
const INDENT: &str = "  ";

/// Width of the relative-size bar, in cells.
const BAR_WIDTH: usize = 10;

/// Width of the right-aligned size column.
const SIZE_COLUMN: usize = 10;

/// Longest status line printed while a scan runs.
const STATUS_MAX_CHARS: usize = 100;

/// How the tree is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayConfig {
    /// Levels below the root to print.
    pub depth: usize,
    /// Print each entry's share of its parent as a bar.
    pub show_relative: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            depth: 2,
            show_relative: false,
        }
    }
}

/// One printed node, detached from the tree lock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedNode {
    pub name: String,
    /// Real path, or the small-files sentinel for the bucket.
    pub path: String,
    pub size: u64,
    pub is_dir: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub synthetic: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub unreadable: bool,
    /// Share of the parent's size (0.0–1.0).
    pub fraction: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RenderedNode>,
}

/// Materialize `node` and up to `depth` levels below it.
pub fn snapshot(
    tree: &EntryTree,
    materializer: &mut Materializer,
    node: &DisplayNode,
    depth: usize,
) -> RenderedNode {
    let children = if depth == 0 {
        Vec::new()
    } else {
        let mut level = materializer.children(tree, node).to_vec();
        sort_by_size(tree, &mut level);
        level
            .iter()
            .map(|child| snapshot(tree, materializer, child, depth - 1))
            .collect()
    };

    RenderedNode {
        name: node.name(tree).to_string(),
        path: node.path(tree).to_string_lossy().into_owned(),
        size: node.size(tree),
        is_dir: node.is_dir(tree),
        synthetic: node.is_synthetic(),
        unreadable: node.is_error(tree),
        fraction: node.fraction_of_parent(tree),
        children,
    }
}

/// Indented text listing, one node per line.
pub fn render_text(root: &RenderedNode, config: &DisplayConfig) -> String {
    let mut out = String::new();
    write_node(&mut out, root, 0, config);
    out
}

fn write_node(out: &mut String, node: &RenderedNode, level: usize, config: &DisplayConfig) {
    out.push_str(&format!(
        "{:>width$}  ",
        format_size(node.size),
        width = SIZE_COLUMN
    ));
    if config.show_relative {
        out.push_str(&size_bar(node.fraction));
        out.push_str("  ");
    }
    for _ in 0..level {
        out.push_str(INDENT);
    }
    out.push_str(&node.name);
    if node.is_dir && !node.name.ends_with('/') {
        out.push('/');
    }
    if node.unreadable {
        out.push_str("  [unreadable]");
    }
    out.push('\n');

    for child in &node.children {
        write_node(out, child, level + 1, config);
    }
}

/// Text bar for a 0.0–1.0 fraction, e.g. `[###       ]  27.5%`.
pub fn size_bar(fraction: f32) -> String {
    let fraction = fraction.clamp(0.0, 1.0);
    let filled = (fraction * BAR_WIDTH as f32).round() as usize;
    format!(
        "[{}{}] {:>5.1}%",
        "#".repeat(filled),
        " ".repeat(BAR_WIDTH - filled),
        fraction * 100.0
    )
}

/// One-line progress summary for stderr.
pub fn status_line(status: &str, stats: &ScanStats) -> String {
    let mut line = format!(
        "{} | {} files | {} dirs | {}",
        truncate_middle(status, STATUS_MAX_CHARS / 2),
        format_count(stats.files_found),
        format_count(stats.dirs_found),
        format_size(stats.total_size),
    );
    if stats.skipped > 0 {
        line.push_str(&format!(" | {} skipped", format_count(stats.skipped)));
    }
    line
}

/// Shorten `text` to at most `max_chars` by eliding its middle.
fn truncate_middle(text: &str, max_chars: usize) -> String {
    let len = text.chars().count();
    if len <= max_chars {
        return text.to_string();
    }
    let half = max_chars.saturating_sub(3) / 2;
    let head: String = text.chars().take(half).collect();
    let tail: String = text.chars().skip(len - half).collect();
    format!("{head}...{tail}")
}
