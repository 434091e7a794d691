use clap::{Parser, Subcommand};

use crate::models::{ColumnDescriptor, RecordPage};

#[derive(Parser, Debug)]
#[command(name = "posadmin")]
#[command(about = "Terminal admin console for a point-of-sale backend: categories, products, and the login they need")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Backend base URL, overriding POSADMIN_API_BACKEND
    #[arg(long, global = true)]
    pub backend: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Launch the interactive console (default)
    Tui,

    /// Log in and store the bearer token
    Login {
        /// Username
        #[arg(short, long)]
        name: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },

    /// Log out and remove the stored token
    Logout,

    /// Print one page of categories or products
    List {
        /// Entity to list (categories, products)
        entity: String,

        /// Page number
        #[arg(short, long, default_value = "1")]
        page: u32,
    },
}

impl Cli {
    /// The subcommand to run; no subcommand means the interactive console
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Tui)
    }
}

/// Render a record page as ` | `-separated lines: header, rule, rows, footer
pub fn format_page(page: &RecordPage, columns: &[ColumnDescriptor]) -> Vec<String> {
    let header = columns
        .iter()
        .map(|column| column.header.as_str())
        .collect::<Vec<_>>()
        .join(" | ");

    let mut lines = vec![header.clone(), "-".repeat(header.chars().count())];

    if page.records.is_empty() {
        lines.push("No data available".to_string());
    }
    for record in &page.records {
        lines.push(
            columns
                .iter()
                .map(|column| record.display(&column.key))
                .collect::<Vec<_>>()
                .join(" | "),
        );
    }

    lines.push(String::new());
    let mut footer = format!(
        "Page {} of {}",
        page.page.current_page, page.page.total_pages
    );
    if let Some(total) = page.total {
        footer.push_str(&format!(" ({} records)", total));
    }
    lines.push(footer);
    lines
}
