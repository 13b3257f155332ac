/// Diagnostic tool to verify snapshot → grouping → layout pipeline
use std::path::PathBuf;

use anyhow::Context;
use etfview_rs::feed::{QuoteSource, SnapshotFile};
use etfview_rs::layout::{LayoutConfig, OverviewStyle, Rect};
use etfview_rs::model::DIM_CATEGORY;
use etfview_rs::render::scene::label_font_size;
use etfview_rs::ui::frame::build_frame;
use etfview_rs::ui::navigation::{Command, NavigationState};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("etfview_rs=debug".parse()?),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let snapshot = args
        .next()
        .map(PathBuf::from)
        .context("usage: debug-layout <snapshot.json> [dimension]")?;
    let dimension = args.next().unwrap_or_else(|| DIM_CATEGORY.to_string());

    println!("=== DIAGNOSTIC: Snapshot → Layout Pipeline ===");
    println!("Snapshot: {}", snapshot.display());

    let data = SnapshotFile::new(&snapshot).fetch_quotes()?;
    println!("\n[1] Parsed {} quotes", data.len());

    let mut state = NavigationState::new(&dimension);
    state.apply(Command::Load(data));
    println!(
        "    Displayable: {} instruments, {} groups by '{}'",
        state.dataset().len(),
        state.groups().len(),
        dimension
    );

    println!("\n[2] Top 10 groups by weight:");
    for (i, group) in state.groups().iter().take(10).enumerate() {
        println!(
            "    [{}] '{}' - {} members, weight {:.3e}, avg change {:+.2}%",
            i,
            group.key,
            group.members.len(),
            group.total_weight,
            group.weighted_average_change
        );
    }

    let bounds = Rect::from_size(1920.0, 1080.0);
    for style in [OverviewStyle::Tiles, OverviewStyle::GroupedCells] {
        let config = LayoutConfig {
            overview_style: style,
            ..LayoutConfig::default()
        };
        let frame = build_frame(&state, bounds, &config);
        println!("\n[3] {:?} overview: {} tiles", style, frame.tiles.len());

        let mut sorted: Vec<_> = frame.tiles.iter().collect();
        sorted.sort_by(|a, b| b.rect.area().total_cmp(&a.rect.area()));
        println!("    Top 10 largest tiles by area:");
        for (i, tile) in sorted.iter().take(10).enumerate() {
            println!(
                "    [{}] '{}' depth={} - {:.1}x{:.1} ({:.0}px²) at ({:.1}, {:.1})",
                i,
                tile.label,
                tile.depth,
                tile.rect.width(),
                tile.rect.height(),
                tile.rect.area(),
                tile.rect.x0,
                tile.rect.y0
            );
        }

        // Leaves only: groups contain their members and would double count.
        let max_depth = frame.tiles.iter().map(|t| t.depth).max().unwrap_or(0);
        let leaves: Vec<_> = frame.tiles.iter().filter(|t| t.depth == max_depth).collect();
        let area_sum: f32 = leaves.iter().map(|t| t.rect.area()).sum();
        let mut overlaps = 0usize;
        for (i, a) in leaves.iter().enumerate() {
            for b in &leaves[i + 1..] {
                if a.rect.overlap_area(&b.rect) > 0.01 {
                    overlaps += 1;
                }
            }
        }
        let labeled = leaves
            .iter()
            .filter(|t| label_font_size(t.rect.width(), t.rect.height()).is_some())
            .count();

        println!("    Leaf area:      {:.0}px²", area_sum);
        println!("    Viewport area:  {:.0}px²", bounds.area());
        println!("    Coverage:       {:.1}%", area_sum / bounds.area() * 100.0);
        println!("    Overlaps:       {}", overlaps);
        println!("    Labeled leaves: {} of {}", labeled, leaves.len());
    }

    Ok(())
}
