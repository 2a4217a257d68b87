//! Human-readable printing of what a module drew.

use console::style;
use sarovar_core::ports::{PanelEntry, RecordingMap, RecordingPanel};

use crate::progress::fraction_bar;

const BAR_WIDTH: usize = 20;

pub fn print_panel(panel: &RecordingPanel) {
    for entry in &panel.entries {
        match entry {
            PanelEntry::Heading { text } => println!("\n{}", style(text).bold().underlined()),
            PanelEntry::Metric { label, value, help } => {
                print!("  {}: {}", style(label).bold(), style(value).cyan());
                match help {
                    Some(help) => println!("  {}", style(format!("({})", help)).dim()),
                    None => println!(),
                }
            }
            PanelEntry::Caption { text } => println!("  {}", style(text).dim()),
            PanelEntry::Info { text } => println!("{} {}", style("ℹ").blue().bold(), text),
            PanelEntry::Warning { text } => println!("{} {}", style("⚠").yellow().bold(), text),
            PanelEntry::Error { text } => println!("{} {}", style("✗").red().bold(), text),
            PanelEntry::Progress { label, fraction } => {
                println!("  {:<12} {} {:>3.0}%", label, fraction_bar(*fraction, BAR_WIDTH), fraction * 100.0)
            }
            PanelEntry::Chart { title, points } => {
                println!("  {} ({} points)", style(title).bold(), points.len());
                for point in points {
                    println!("    {}  {:.4}", point.date, point.value);
                }
            }
            PanelEntry::Link { label, url } => println!("  {} {}", style(label).bold(), style(url).underlined()),
            PanelEntry::Download { label, file_name, content, .. } => {
                println!("  {} {} ({} bytes)", style(label).bold(), file_name, content.len())
            }
        }
    }
}

pub fn print_map(map: &RecordingMap) {
    if let Some(view) = &map.view {
        println!(
            "\n{} centered on {:.4}, {:.4}",
            style("Map").bold(),
            view.center[1],
            view.center[0]
        );
    }
    for layer in &map.layers {
        let visibility = if layer.visible { "" } else { " (hidden)" };
        println!("  {} {}{}", style("▪").green(), layer.name, style(visibility).dim());
    }
    for colorbar in &map.colorbars {
        let range = match (colorbar.vis.min, colorbar.vis.max) {
            (Some(min), Some(max)) => format!("{} to {}", min, max),
            _ => "categorical".to_string(),
        };
        println!("  {} {}: {}", style("◧").cyan(), colorbar.label, range);
    }
    if let Some(split) = &map.split {
        println!("  {} {} | {}", style("⇆").cyan(), split.left.name, split.right.name);
    }
}
