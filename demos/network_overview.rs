//! Network overview walkthrough.
//!
//! Loads the bundled sample dataset, prints the top-N network with its
//! scale domain, then selects a donor and a pair the way a user would by
//! clicking, printing what each pass hands to the renderer.

use aidflow_engine::config::ExplorerConfig;
use aidflow_engine::controller::Explorer;
use aidflow_engine::core::record::Role;
use aidflow_engine::render::{ControlChange, Frame, RecordingRenderer, ViewEvent};
use aidflow_engine::selection::playback::ManualScheduler;
use aidflow_engine::views::layout::PieChart;
use aidflow_engine::views::network::Detail;
use aidflow_engine::views::ViewKind;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    println!("╔══════════════════════════════════════════╗");
    println!("║  aidflow-engine: Network Overview        ║");
    println!("╚══════════════════════════════════════════╝\n");

    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/sample_aid.csv");
    let (mut explorer, report) = Explorer::open(
        path,
        ExplorerConfig::default(),
        RecordingRenderer::new(),
        ManualScheduler::new(),
    )?;
    println!(
        "Loaded {} records ({} skipped)\n",
        report.kept,
        report.skipped()
    );

    // --- Static derivation ---
    println!("━━━ Top-N Network ━━━\n");
    let network = explorer.network();
    let domain = network.domain();
    println!(
        "  {} donors × {} recipients, {} edges",
        network.filter().donors.len(),
        network.filter().recipients.len(),
        network.edges().len()
    );
    println!("  Width domain: [{:.0}, {:.0}]", domain.lo(), domain.hi());
    for entry in network.legend() {
        println!(
            "  {:<7} {:>15.0} USD  width {:.2}px  {}",
            entry.label, entry.value, entry.width, entry.color
        );
    }
    println!();

    let donor = network
        .filter()
        .donors
        .names()
        .next()
        .unwrap_or_default()
        .to_string();

    // --- Select a donor ---
    println!("━━━ Click: {} ━━━\n", donor);
    explorer.handle(ViewEvent::node(donor.as_str(), Role::Donor))?;
    if let Some(Frame::Network(frame)) = explorer.renderer().last() {
        let visible = frame.edges.iter().filter(|e| e.visible).count();
        println!("  {} of {} edges visible", visible, frame.edges.len());
        match &frame.detail {
            Some(Detail::Bars { title, bars }) => {
                println!("  {}", title);
                for bar in bars.iter().take(5) {
                    println!("    {:<20} {:>15.0}", bar.name, bar.value);
                }
            }
            Some(Detail::NoData { message }) => println!("  {}", message),
            None => {}
        }
    }
    println!();

    // --- Purpose view ---
    println!("━━━ Purpose Breakdown ━━━\n");
    let switch = ViewEvent::ControlChanged(ControlChange::SwitchView {
        view: ViewKind::Purpose,
    });
    explorer.handle(switch)?;
    let pair = explorer
        .purpose()
        .edges()
        .first()
        .map(|e| (e.donor.clone(), e.recipient.clone()));
    if let Some((d, r)) = pair {
        explorer.handle(ViewEvent::edge(d, r))?;
    }
    if let Some(Frame::Purpose(frame)) = explorer.renderer().last() {
        for swatch in &frame.legend {
            println!("  {} {}", swatch.color, swatch.purpose);
        }
        match &frame.pair_pie {
            Some(PieChart::Slices { title, slices, .. }) => {
                println!("\n  {}", title);
                for slice in slices {
                    let label = if slice.labeled {
                        format!("{:.1}%", slice.share * 100.0)
                    } else {
                        String::new()
                    };
                    println!("    {:<45} {:>8}", slice.key, label);
                }
            }
            Some(PieChart::NoData { message }) => println!("  {}", message),
            None => {}
        }
    }

    Ok(())
}
