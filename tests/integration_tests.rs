use aidflow_engine::aggregate::ranking::{rank, refine_by_purpose, top_n, TopFilter};
use aidflow_engine::aggregate::rollup::{pair_edges, purpose_edges, edges_with_purposes};
use aidflow_engine::config::ExplorerConfig;
use aidflow_engine::controller::Explorer;
use aidflow_engine::core::loader::{load_str, LoadError};
use aidflow_engine::core::record::{FlowRecord, FlowSet, Role};
use aidflow_engine::graph::flow_graph::FlowGraph;
use aidflow_engine::render::{ControlChange, Frame, JsonRenderer, RecordingRenderer, ViewEvent};
use aidflow_engine::scale::domain::quantile_domain;
use aidflow_engine::scale::mapping::{ColorScale, WidthScale};
use aidflow_engine::selection::playback::{ManualScheduler, Scheduler};
use aidflow_engine::selection::state::{Neighborhood, Selection, SelectionModel};
use aidflow_engine::simulation::synthetic::{generate_flows, SyntheticConfig};
use aidflow_engine::views::network::Detail;
use aidflow_engine::views::layout::PieChart;
use aidflow_engine::views::ViewKind;
use approx::assert_relative_eq;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn three_flows() -> FlowSet {
    vec![
        FlowRecord::new("A", "X", 100.0, 2020),
        FlowRecord::new("A", "Y", 50.0, 2020),
        FlowRecord::new("B", "X", 200.0, 2020),
    ]
    .into_iter()
    .collect()
}

fn switch(view: ViewKind) -> ViewEvent {
    ViewEvent::ControlChanged(ControlChange::SwitchView { view })
}

/// Three flows → edges → neighborhood of donor A.
#[test]
fn three_flow_network_pipeline() {
    init_logging();
    let set = three_flows();

    let donors = rank(&set, Role::Donor);
    assert_eq!(donors[0].name, "B");
    assert_eq!(donors[1].total, 150.0);

    let mut edges: Vec<(String, String, f64)> = pair_edges(&set)
        .into_iter()
        .map(|e| (e.donor, e.recipient, e.value))
        .collect();
    edges.sort_by(|a, b| b.2.total_cmp(&a.2));
    assert_eq!(
        edges,
        vec![
            ("B".to_string(), "X".to_string(), 200.0),
            ("A".to_string(), "X".to_string(), 100.0),
            ("A".to_string(), "Y".to_string(), 50.0),
        ]
    );

    let all_edges = pair_edges(&set);
    let graph = FlowGraph::from_edges(&all_edges);
    let hood = Neighborhood::of(&Selection::entity("A", Role::Donor), &graph);
    let mut neighbors = hood.neighbors().to_vec();
    neighbors.sort();
    assert_eq!(neighbors, vec!["X".to_string(), "Y".to_string()]);

    for edge in &all_edges {
        let visible = hood.is_edge_visible(edge);
        assert_eq!(visible, edge.donor == "A", "edge {:?}", edge);
    }
    assert!(!hood.is_node_visible("B", Role::Donor));
    assert!(hood.is_node_visible("A", Role::Donor));
}

/// Values 1..=100 clamp at the 10th/90th percentiles.
#[test]
fn quantile_domain_clamps_outliers() {
    let values: Vec<f64> = (1..=100).map(f64::from).collect();
    let domain = quantile_domain(&values, 0.1, 0.9);
    assert_relative_eq!(domain.lo(), 10.9, epsilon = 1e-9);
    assert_relative_eq!(domain.hi(), 90.1, epsilon = 1e-9);

    let width = WidthScale::new(domain, (1.5, 5.0));
    assert_relative_eq!(width.width_of(1.0), 1.5, epsilon = 1e-9);
    assert_relative_eq!(width.width_of(domain.lo()), 1.5, epsilon = 1e-9);
    assert_relative_eq!(width.width_of(100.0), 5.0, epsilon = 1e-9);

    let color = ColorScale::new(domain, (0.35, 0.95));
    assert_relative_eq!(color.position(0.5), 0.35, epsilon = 1e-9);
    assert_relative_eq!(color.position(1e9), 0.95, epsilon = 1e-9);
    assert_eq!(color.color_of(100.0), color.color_of(domain.hi()));
}

#[test]
fn small_input_falls_back_to_extent() {
    let values = [5.0, 20.0, 80.0];
    let domain = quantile_domain(&values, 0.1, 0.9);
    assert_eq!((domain.lo(), domain.hi()), (5.0, 80.0));

    let single = quantile_domain(&[42.0], 0.1, 0.9);
    assert_eq!((single.lo(), single.hi()), (0.0, 1.0));
}

#[test]
fn loader_feeds_every_view() {
    init_logging();
    let csv = "\
donor,recipient,commitment_amount_usd_constant,year,coalesced_purpose_name
Japan,India,1000000,2001,Energy generation
Japan,India,500000,2002,Health
Germany,Kenya,250000,2002,Water supply
Germany,India,,2003,Health
France,Kenya,-4,2003,Health
France,Kenya,75000,2003.0,
";
    let (set, report) = load_str(csv).unwrap();
    assert_eq!(report.kept, 4);
    assert_eq!(report.missing_field, 1);
    assert_eq!(report.bad_amount, 1);
    assert_eq!(set.with_purpose().len(), 3);

    let mut recorder = RecordingRenderer::new();
    let mut explorer = Explorer::new(
        set,
        ExplorerConfig::default(),
        &mut recorder,
        ManualScheduler::new(),
    );
    for view in [
        ViewKind::Network,
        ViewKind::Purpose,
        ViewKind::Timeline,
        ViewKind::YearNetwork,
    ] {
        assert!(explorer.handle(switch(view)).unwrap());
    }
    drop(explorer);

    let kinds: Vec<ViewKind> = recorder.frames.iter().map(Frame::kind).collect();
    assert_eq!(
        kinds,
        vec![
            ViewKind::Network,
            ViewKind::Purpose,
            ViewKind::Timeline,
            ViewKind::YearNetwork
        ]
    );
}

#[test]
fn missing_column_is_shown_as_error() {
    init_logging();
    let err = load_str("donor,recipient,year\nA,X,2001\n").unwrap_err();
    assert!(matches!(err, LoadError::MissingColumn(ref c) if c == "commitment_amount_usd_constant"));

    let mut recorder = RecordingRenderer::new();
    let err = match Explorer::open(
        "does/not/exist.csv",
        ExplorerConfig::default(),
        &mut recorder,
        ManualScheduler::new(),
    ) {
        Ok(_) => panic!("a missing file must not open"),
        Err(e) => e,
    };
    assert!(matches!(err, LoadError::Open { .. }));
    assert_eq!(recorder.errors.len(), 1);
    assert!(recorder.frames.is_empty());
}

#[test]
fn network_detail_for_selected_entity() {
    let mut recorder = RecordingRenderer::new();
    let mut explorer = Explorer::new(
        three_flows(),
        ExplorerConfig::default(),
        &mut recorder,
        ManualScheduler::new(),
    );
    explorer.handle(ViewEvent::node("X", Role::Recipient)).unwrap();
    explorer.handle(ViewEvent::edge("A", "Y")).unwrap();
    drop(explorer);

    let Frame::Network(first) = &recorder.frames[0] else {
        panic!("expected a network frame");
    };
    match first.detail.as_ref().unwrap() {
        Detail::Bars { bars, .. } => {
            let names: Vec<&str> = bars.iter().map(|b| b.name.as_str()).collect();
            assert_eq!(names, vec!["B", "A"]);
        }
        other => panic!("unexpected detail {:?}", other),
    }
    let hidden: Vec<&str> = first
        .nodes
        .iter()
        .filter(|n| !n.visible)
        .map(|n| n.name.as_str())
        .collect();
    assert_eq!(hidden, vec!["Y"]);

    let Frame::Network(second) = &recorder.frames[1] else {
        panic!("expected a network frame");
    };
    assert_eq!(second.selection, Selection::pair("A", "Y"));
    assert!(second.detail.is_none());
    assert_eq!(second.edges.iter().filter(|e| e.visible).count(), 1);
}

#[test]
fn selection_toggle_sequences() {
    let mut model = SelectionModel::new();
    model.click_entity("X", Role::Recipient);
    model.click_entity("X", Role::Recipient);
    assert!(model.selection().is_none());

    model.click_entity("X", Role::Recipient);
    model.click_entity("Y", Role::Recipient);
    model.click_entity("Y", Role::Recipient);
    assert!(model.selection().is_none());

    model.click_entity("A", Role::Donor);
    model.click_pair("A", "X");
    assert_eq!(model.selection(), &Selection::pair("A", "X"));
}

#[test]
fn playback_runs_to_the_end_and_stops() {
    init_logging();
    let set: FlowSet = (2000..=2004)
        .map(|year| FlowRecord::new("A", "X", 10.0 * f64::from(year - 1999), year))
        .collect();
    let mut explorer = Explorer::new(
        set,
        ExplorerConfig::default(),
        RecordingRenderer::new(),
        ManualScheduler::new(),
    );
    explorer.handle(switch(ViewKind::YearNetwork)).unwrap();
    explorer
        .handle(ViewEvent::ControlChanged(ControlChange::PlayToggled))
        .unwrap();
    let task = explorer.playback().task().unwrap();
    assert!(explorer.scheduler().is_active(task));

    let mut seen = Vec::new();
    while let Some(&task) = explorer.scheduler().active().first() {
        assert!(explorer.handle(ViewEvent::Tick { task }).unwrap());
        seen.push(explorer.current_year().unwrap());
    }
    assert_eq!(seen, vec![2001, 2002, 2003, 2004]);
    assert!(!explorer.playback().is_playing());

    // No tick moves the year once stopped.
    assert!(!explorer.handle(ViewEvent::Tick { task }).unwrap());
    assert_eq!(explorer.current_year(), Some(2004));

    // Playing again from the last year rewinds.
    explorer
        .handle(ViewEvent::ControlChanged(ControlChange::PlayToggled))
        .unwrap();
    assert_eq!(explorer.current_year(), Some(2000));
    match explorer.renderer().last().unwrap() {
        Frame::YearNetwork(frame) => {
            assert!(frame.playing);
            assert_eq!(frame.year, 2000);
        }
        other => panic!("unexpected frame {:?}", other),
    }
}

#[test]
fn scrub_cancels_playback() {
    let mut scheduler = ManualScheduler::new();
    let mut explorer = Explorer::new(
        generate_flows(&SyntheticConfig {
            seed: Some(3),
            ..Default::default()
        }),
        ExplorerConfig::default(),
        RecordingRenderer::new(),
        &mut scheduler,
    );
    explorer.handle(switch(ViewKind::YearNetwork)).unwrap();
    explorer
        .handle(ViewEvent::ControlChanged(ControlChange::PlayToggled))
        .unwrap();
    let task = explorer.playback().task().unwrap();
    let target = explorer.playback().years()[3];

    explorer.handle(ViewEvent::YearScrubbed { year: target }).unwrap();
    assert!(!explorer.playback().is_playing());
    assert!(!explorer.handle(ViewEvent::Tick { task }).unwrap());
    assert_eq!(explorer.current_year(), Some(target));
    drop(explorer);
    assert!(scheduler.active().is_empty());
}

#[test]
fn timeline_hover_lock_and_leave() {
    let set: FlowSet = vec![
        FlowRecord::new("A", "X", 100.0, 2000),
        FlowRecord::new("A", "Y", 50.0, 2001),
        FlowRecord::new("B", "X", 200.0, 2001),
    ]
    .into_iter()
    .collect();
    let mut explorer = Explorer::new(
        set,
        ExplorerConfig::default(),
        RecordingRenderer::new(),
        ManualScheduler::new(),
    );
    explorer.handle(switch(ViewKind::Timeline)).unwrap();
    explorer.handle(ViewEvent::YearHovered { year: 2000 }).unwrap();
    explorer.handle(ViewEvent::PointerLeft).unwrap();

    let Some(Frame::Timeline(frame)) = explorer.renderer().last() else {
        panic!("expected a timeline frame");
    };
    assert_eq!(frame.cursor, None);
    // The breakdown keeps its last year after the pointer leaves.
    match frame.pie.as_ref().unwrap() {
        PieChart::Slices { title, .. } => assert_eq!(title, "2000 Breakdown"),
        other => panic!("unexpected pie {:?}", other),
    }

    explorer.handle(ViewEvent::YearClicked { year: 2001 }).unwrap();
    explorer.handle(ViewEvent::YearHovered { year: 2000 }).unwrap();
    let Some(Frame::Timeline(frame)) = explorer.renderer().last() else {
        panic!("expected a timeline frame");
    };
    assert_eq!(frame.cursor, Some(2001));

    // Focusing a donor narrows the matrix; switching mode resets to ALL.
    explorer.handle(ViewEvent::node("A", Role::Donor)).unwrap();
    let Some(Frame::Timeline(frame)) = explorer.renderer().last() else {
        panic!("expected a timeline frame");
    };
    assert_eq!(frame.focus.as_deref(), Some("A"));

    explorer
        .handle(ViewEvent::ControlChanged(ControlChange::RankingMode {
            role: Role::Recipient,
        }))
        .unwrap();
    let Some(Frame::Timeline(frame)) = explorer.renderer().last() else {
        panic!("expected a timeline frame");
    };
    assert_eq!(frame.focus, None);
    assert_eq!(frame.mode, Role::Recipient);
    assert!(frame.items[0].selected);
}

#[test]
fn timeline_entity_lock_holds_until_clicked_again() {
    init_logging();
    let mut explorer = Explorer::new(
        three_flows(),
        ExplorerConfig::default(),
        RecordingRenderer::new(),
        ManualScheduler::new(),
    );
    explorer.handle(switch(ViewKind::Timeline)).unwrap();

    explorer.handle(ViewEvent::node("A", Role::Donor)).unwrap();
    assert_eq!(
        explorer.selection().selection(),
        &Selection::LockedEntity {
            name: "A".to_string(),
            role: Role::Donor,
        }
    );

    // Hover is suppressed while the entity is locked.
    explorer.handle(ViewEvent::YearHovered { year: 2020 }).unwrap();
    assert!(explorer.selection().preview().is_none());
    let Some(Frame::Timeline(frame)) = explorer.renderer().last() else {
        panic!("expected a timeline frame");
    };
    assert_eq!(frame.cursor, None);
    assert_eq!(frame.focus.as_deref(), Some("A"));

    explorer.handle(ViewEvent::node("A", Role::Donor)).unwrap();
    assert!(explorer.selection().selection().is_none());
    let Some(Frame::Timeline(frame)) = explorer.renderer().last() else {
        panic!("expected a timeline frame");
    };
    assert_eq!(frame.focus, None);
}

#[test]
fn year_lock_breaks_down_the_focused_entity() {
    init_logging();
    let mut explorer = Explorer::new(
        three_flows(),
        ExplorerConfig::default(),
        RecordingRenderer::new(),
        ManualScheduler::new(),
    );
    explorer.handle(switch(ViewKind::Timeline)).unwrap();
    explorer.handle(ViewEvent::node("A", Role::Donor)).unwrap();
    explorer.handle(ViewEvent::YearClicked { year: 2020 }).unwrap();

    assert_eq!(explorer.selection().selection().locked_year(), Some(2020));
    let Some(Frame::Timeline(frame)) = explorer.renderer().last() else {
        panic!("expected a timeline frame");
    };
    assert_eq!(frame.focus.as_deref(), Some("A"));
    assert_eq!(frame.cursor, Some(2020));
    match frame.pie.as_ref().unwrap() {
        PieChart::Slices { total, slices, .. } => {
            assert_relative_eq!(*total, 150.0);
            let keys: Vec<&str> = slices.iter().map(|s| s.key.as_str()).collect();
            assert_eq!(keys, vec!["X", "Y"]);
        }
        other => panic!("unexpected pie {:?}", other),
    }
}

#[test]
fn purpose_refinement_on_synthetic_flows() {
    init_logging();
    let set = generate_flows(&SyntheticConfig {
        record_count: 2_000,
        seed: Some(11),
        ..Default::default()
    });
    let refinement = refine_by_purpose(&set, 20, 10, 5);
    assert!(refinement.purposes.len() <= 5);
    assert!(refinement
        .records
        .records()
        .iter()
        .all(|r| r.purpose().is_some_and(|p| refinement.purposes.contains(p))));

    let edges = edges_with_purposes(&purpose_edges(&refinement.records));
    for edge in &edges {
        assert_relative_eq!(edge.value, edge.purpose_total(), max_relative = 1e-12);
        for pair in edge.purposes.windows(2) {
            assert!(pair[0].value >= pair[1].value);
        }
    }
}

#[test]
fn top_filter_matches_rankings() {
    let set = generate_flows(&SyntheticConfig {
        seed: Some(5),
        ..Default::default()
    });
    let filter = TopFilter::from_totals(&set, 20, 10);
    let donors = top_n(&rank(&set, Role::Donor), 20);
    assert_eq!(filter.donors, donors);

    let kept = filter.apply(&set);
    assert!(kept.records().iter().all(|r| filter.admits(r)));
    assert!(kept.total_amount() <= set.total_amount());
}

#[test]
fn json_renderer_streams_frames() {
    let mut out = Vec::new();
    {
        let mut explorer = Explorer::new(
            three_flows(),
            ExplorerConfig::default(),
            JsonRenderer::new(&mut out),
            ManualScheduler::new(),
        );
        explorer.refresh().unwrap();
        explorer.handle(ViewEvent::node("A", Role::Donor)).unwrap();
    }
    let text = String::from_utf8(out).unwrap();
    let frames: Vec<serde_json::Value> = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1]["view"], "network");
    assert_eq!(frames[1]["selection"]["kind"], "entity");
    assert_eq!(frames[1]["selection"]["name"], "A");
}

#[test]
fn manual_scheduler_ignores_unknown_cancel() {
    let mut scheduler = ManualScheduler::new();
    let id = scheduler.schedule_every(std::time::Duration::from_millis(800));
    scheduler.cancel(id);
    scheduler.cancel(id);
    assert!(scheduler.active().is_empty());
}
