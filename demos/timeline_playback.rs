//! Timeline and year-playback walkthrough on synthetic flows.
//!
//! Shows the ranking list, locks a year for the breakdown donut, then
//! plays the year network through a manual scheduler, delivering each
//! tick by hand the way a host timer would.

use aidflow_engine::config::ExplorerConfig;
use aidflow_engine::controller::Explorer;
use aidflow_engine::render::{ControlChange, Frame, RecordingRenderer, ViewEvent};
use aidflow_engine::selection::playback::ManualScheduler;
use aidflow_engine::simulation::synthetic::{generate_flows, SyntheticConfig};
use aidflow_engine::views::layout::PieChart;
use aidflow_engine::views::ViewKind;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    println!("╔══════════════════════════════════════════╗");
    println!("║  aidflow-engine: Timeline & Playback     ║");
    println!("╚══════════════════════════════════════════╝\n");

    let flows = generate_flows(&SyntheticConfig {
        record_count: 3_000,
        first_year: 2000,
        last_year: 2008,
        seed: Some(2024),
        ..Default::default()
    });
    let mut explorer = Explorer::new(
        flows,
        ExplorerConfig::default(),
        RecordingRenderer::new(),
        ManualScheduler::new(),
    );

    // --- Timeline ---
    println!("━━━ Timeline ━━━\n");
    explorer.handle(ViewEvent::ControlChanged(ControlChange::SwitchView {
        view: ViewKind::Timeline,
    }))?;
    let year = explorer.timeline().years().get(4).copied().unwrap_or_default();
    explorer.handle(ViewEvent::YearClicked { year })?;

    if let Some(Frame::Timeline(frame)) = explorer.renderer().last() {
        println!("  {}", frame.list_label);
        for item in frame.items.iter().take(8) {
            let bar = "█".repeat((item.share_of_leader * 30.0).round() as usize);
            let rank = item.rank.map(|r| format!("#{}", r)).unwrap_or_default();
            println!("  {:>4} {:<14} {:<30} {:>14.0}", rank, item.name, bar, item.total);
        }
        match &frame.pie {
            Some(PieChart::Slices { title, total, slices }) => {
                println!("\n  {} ({:.0} USD)", title, total);
                for slice in slices.iter().filter(|s| s.labeled) {
                    println!("    {:<14} {:>5.1}%", slice.key, slice.share * 100.0);
                }
            }
            Some(PieChart::NoData { message }) => println!("\n  {}", message),
            None => {}
        }
    }
    println!();

    // --- Playback ---
    println!("━━━ Year Network Playback ━━━\n");
    explorer.handle(ViewEvent::ControlChanged(ControlChange::SwitchView {
        view: ViewKind::YearNetwork,
    }))?;
    explorer.handle(ViewEvent::ControlChanged(ControlChange::PlayToggled))?;
    println!(
        "  playing every {:?} from {:?}",
        explorer.playback().interval(),
        explorer.current_year()
    );

    while let Some(&task) = explorer.scheduler().active().first() {
        if !explorer.handle(ViewEvent::Tick { task })? {
            break;
        }
        if let Some(Frame::YearNetwork(frame)) = explorer.renderer().last() {
            let total: f64 = frame.edges.iter().map(|e| e.value).sum();
            println!(
                "  {}  {:>3} edges  {:>16.0} USD{}",
                frame.year,
                frame.edges.len(),
                total,
                if frame.playing { "" } else { "  (stopped)" }
            );
        }
    }

    Ok(())
}
