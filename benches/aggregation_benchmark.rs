use aidflow_engine::aggregate::ranking::{rank, refine_by_purpose, TopFilter};
use aidflow_engine::aggregate::rollup::pair_edges;
use aidflow_engine::config::ExplorerConfig;
use aidflow_engine::core::record::{FlowSet, Role};
use aidflow_engine::controller::Explorer;
use aidflow_engine::render::{JsonRenderer, ViewEvent};
use aidflow_engine::selection::playback::ManualScheduler;
use aidflow_engine::simulation::synthetic::{generate_flows, SyntheticConfig};
use aidflow_engine::views::network::NetworkView;
use aidflow_engine::views::timeline::TimelineView;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn flows(records: usize) -> FlowSet {
    let _ = env_logger::builder().is_test(true).try_init();
    generate_flows(&SyntheticConfig {
        donor_count: 60,
        recipient_count: 120,
        record_count: records,
        seed: Some(1),
        ..Default::default()
    })
}

fn bench_rank_10k(c: &mut Criterion) {
    let set = flows(10_000);
    c.bench_function("rank_donors_10k", |b| {
        b.iter(|| rank(black_box(&set), Role::Donor))
    });
}

fn bench_top_filter_edges_100k(c: &mut Criterion) {
    let set = flows(100_000);
    c.bench_function("top_filter_pair_edges_100k", |b| {
        b.iter(|| {
            let filter = TopFilter::from_totals(black_box(&set), 20, 10);
            pair_edges(&filter.apply(&set))
        })
    });
}

fn bench_purpose_refinement_100k(c: &mut Criterion) {
    let set = flows(100_000);
    c.bench_function("purpose_refinement_100k", |b| {
        b.iter(|| refine_by_purpose(black_box(&set), 20, 10, 5))
    });
}

fn bench_view_builds(c: &mut Criterion) {
    let set = flows(100_000);
    let config = ExplorerConfig::default();
    c.bench_function("network_view_build_100k", |b| {
        b.iter(|| NetworkView::build(black_box(&set), &config))
    });
    c.bench_function("timeline_view_build_100k", |b| {
        b.iter(|| TimelineView::build(black_box(&set), &config))
    });
}

fn bench_selection_pass(c: &mut Criterion) {
    let set = flows(100_000);
    let mut explorer = Explorer::new(
        set,
        ExplorerConfig::default(),
        JsonRenderer::new(std::io::sink()),
        ManualScheduler::new(),
    );
    let donor = explorer
        .network()
        .filter()
        .donors
        .names()
        .next()
        .unwrap_or_default()
        .to_string();
    c.bench_function("network_click_pass", |b| {
        b.iter(|| black_box(explorer.handle(ViewEvent::node(donor.as_str(), Role::Donor))))
    });
}

criterion_group!(
    benches,
    bench_rank_10k,
    bench_top_filter_edges_100k,
    bench_purpose_refinement_100k,
    bench_view_builds,
    bench_selection_pass
);
criterion_main!(benches);
