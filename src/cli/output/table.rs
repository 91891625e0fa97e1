//! Table output formatting for CLI commands
//!
//! Collections and retrieved sources rendered with comfy-table.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

use super::truncate;
use crate::domain::models::{CollectionInfo, SearchResult};

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<u16>,
}

impl TableFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    pub fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    pub fn format_collections(&self, collections: &[CollectionInfo]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["Collection", "Model", "Dim", "Entries", "Updated"]));

        for info in collections {
            let entries = if self.use_colors && info.is_empty() {
                Cell::new(info.entry_count).fg(Color::Yellow)
            } else {
                Cell::new(info.entry_count)
            };
            table.add_row(vec![
                Cell::new(&info.name),
                Cell::new(&info.embedding_model),
                Cell::new(info.dimension),
                entries,
                Cell::new(format_relative_time(&info.updated_at)),
            ]);
        }

        table.to_string()
    }

    /// Retrieved chunks, most similar first.
    pub fn format_sources(&self, sources: &[SearchResult]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["#", "Source", "Chunk", "Similarity", "Text"]));

        for (rank, source) in sources.iter().enumerate() {
            let similarity = format!("{:.3}", source.similarity());
            let similarity = if self.use_colors {
                Cell::new(similarity).fg(similarity_color(source.similarity()))
            } else {
                Cell::new(similarity)
            };
            table.add_row(vec![
                Cell::new(rank + 1),
                Cell::new(source.chunk.source_path()),
                Cell::new(source.chunk.sequence_index),
                similarity,
                Cell::new(truncate(&source.chunk.text.replace('\n', " "), 60)),
            ]);
        }

        table.to_string()
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(width);
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn header(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|t| Cell::new(t).add_attribute(Attribute::Bold))
        .collect()
}

fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }
    !matches!(env::var("TERM").as_deref(), Ok("dumb"))
}

fn similarity_color(similarity: f32) -> Color {
    if similarity >= 0.75 {
        Color::Green
    } else if similarity >= 0.5 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Format relative time (e.g., "2 hours ago")
fn format_relative_time(datetime: &chrono::DateTime<chrono::Utc>) -> String {
    let duration = chrono::Utc::now().signed_duration_since(*datetime);

    if duration.num_seconds() < 60 {
        "just now".to_string()
    } else if duration.num_minutes() < 60 {
        let mins = duration.num_minutes();
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if duration.num_hours() < 24 {
        let hours = duration.num_hours();
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if duration.num_days() < 30 {
        let days = duration.num_days();
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        datetime.format("%Y-%m-%d").to_string()
    }
}
