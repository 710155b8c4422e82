//! The explorer: sole owner of mutable view state.
//!
//! Every event runs one synchronous pass: update state, derive the frame
//! of the active view, hand it to the renderer. Nothing is cached between
//! passes except the per-dataset derivations held by the view binders.

use crate::config::ExplorerConfig;
use crate::core::loader::{load_path, LoadError, LoadReport};
use crate::core::record::{FlowSet, Role};
use crate::render::{ControlChange, Frame, RenderError, Renderer, ViewEvent};
use crate::selection::playback::{Playback, Scheduler};
use crate::selection::state::{Preview, SelectionModel};
use crate::views::network::NetworkView;
use crate::views::purpose::PurposeView;
use crate::views::timeline::TimelineView;
use crate::views::year_network::YearNetworkView;
use crate::views::ViewKind;
use log::{debug, info, warn};
use std::path::Path;

pub struct Explorer<R: Renderer, S: Scheduler> {
    config: ExplorerConfig,
    flows: FlowSet,
    view: ViewKind,
    selection: SelectionModel,
    mode: Role,
    /// Entity the timeline charts are narrowed to. Held apart from the
    /// selection so a year lock does not drop it.
    timeline_focus: Option<String>,
    normalize: bool,
    /// Last year shown in the timeline breakdown; kept after the pointer
    /// leaves the chart.
    pie_year: Option<i32>,
    pair_pick: Option<(String, String)>,
    country_pick: Option<(String, Role)>,
    playback: Playback,
    network: NetworkView,
    purpose: PurposeView,
    timeline: TimelineView,
    year_network: YearNetworkView,
    renderer: R,
    scheduler: S,
}

impl<R: Renderer, S: Scheduler> Explorer<R, S> {
    pub fn new(flows: FlowSet, config: ExplorerConfig, renderer: R, scheduler: S) -> Self {
        let network = NetworkView::build(&flows, &config);
        let purpose = PurposeView::build(&flows, &config);
        let timeline = TimelineView::build(&flows, &config);
        let year_network = YearNetworkView::build(&flows, &config);
        let playback = Playback::new(year_network.years().to_vec(), config.play_interval());
        info!(
            "explorer ready: {} records, {} network edges, {} years",
            flows.len(),
            network.edges().len(),
            year_network.years().len()
        );

        Self {
            config,
            flows,
            view: ViewKind::default(),
            selection: SelectionModel::new(),
            mode: Role::Donor,
            timeline_focus: None,
            normalize: false,
            pie_year: None,
            pair_pick: None,
            country_pick: None,
            playback,
            network,
            purpose,
            timeline,
            year_network,
            renderer,
            scheduler,
        }
    }

    /// Load the CSV at `path` and build an explorer over it. A load
    /// failure is shown through the renderer before it is returned.
    pub fn open(
        path: impl AsRef<Path>,
        config: ExplorerConfig,
        mut renderer: R,
        scheduler: S,
    ) -> Result<(Self, LoadReport), LoadError> {
        match load_path(path) {
            Ok((flows, report)) => Ok((Self::new(flows, config, renderer, scheduler), report)),
            Err(e) => {
                if let Err(render_err) = renderer.show_error(&e.to_string()) {
                    warn!("could not display load error: {}", render_err);
                }
                Err(e)
            }
        }
    }

    // --- Accessors ---

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn flows(&self) -> &FlowSet {
        &self.flows
    }

    pub fn view(&self) -> ViewKind {
        self.view
    }

    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    pub fn mode(&self) -> Role {
        self.mode
    }

    pub fn timeline_focus(&self) -> Option<&str> {
        self.timeline_focus.as_deref()
    }

    pub fn is_normalized(&self) -> bool {
        self.normalize
    }

    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    pub fn current_year(&self) -> Option<i32> {
        self.playback.current()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn network(&self) -> &NetworkView {
        &self.network
    }

    pub fn purpose(&self) -> &PurposeView {
        &self.purpose
    }

    pub fn timeline(&self) -> &TimelineView {
        &self.timeline
    }

    pub fn year_network(&self) -> &YearNetworkView {
        &self.year_network
    }

    /// Derive the frame of the active view from the current state.
    pub fn frame(&self) -> Frame {
        let selection = self.selection.selection();
        match self.view {
            ViewKind::Network => Frame::Network(self.network.frame(selection)),
            ViewKind::Purpose => Frame::Purpose(self.purpose.frame(
                selection,
                self.pair_pick
                    .as_ref()
                    .map(|(d, r)| (d.as_str(), r.as_str())),
                self.country_pick
                    .as_ref()
                    .map(|(name, role)| (name.as_str(), *role)),
            )),
            ViewKind::Timeline => Frame::Timeline(self.timeline.frame(
                self.mode,
                self.timeline_focus.as_deref(),
                self.normalize,
                self.selection.focus_year(),
                self.pie_year,
            )),
            ViewKind::YearNetwork => Frame::YearNetwork(self.year_network.frame(
                self.current_year().unwrap_or_default(),
                self.playback.is_playing(),
                selection,
            )),
        }
    }

    /// Render the current state without changing it.
    pub fn refresh(&mut self) -> Result<(), RenderError> {
        let frame = self.frame();
        self.renderer.render(&frame)
    }

    /// Apply one event and run a render pass. Returns `false` when the
    /// event was dropped without a pass (a stale playback tick).
    pub fn handle(&mut self, event: ViewEvent) -> Result<bool, RenderError> {
        debug!("{:?} event: {:?}", self.view, event);
        match event {
            ViewEvent::NodeClicked { name, role } => self.click_node(&name, role),
            ViewEvent::EdgeClicked { donor, recipient } => self.click_edge(&donor, &recipient),
            ViewEvent::YearScrubbed { year } => {
                if self.playback.scrub(year, &mut self.scheduler).is_none() {
                    warn!("year {} is outside the data range", year);
                }
            }
            ViewEvent::ControlChanged(change) => self.apply_control(change),
            ViewEvent::YearHovered { year } => {
                if !self.timeline.years().contains(&year) {
                    debug!("hover at {} is off the year axis", year);
                } else if self.selection.hover(Preview::Year { year }) {
                    self.pie_year = Some(year);
                }
            }
            ViewEvent::YearClicked { year } => {
                if self.timeline.years().contains(&year) {
                    self.selection.lock_year(year);
                    self.pie_year = Some(year);
                } else {
                    warn!("year {} is outside the data range", year);
                }
            }
            ViewEvent::PointerLeft => self.selection.clear_hover(),
            ViewEvent::Tick { task } => {
                if self.playback.tick(task, &mut self.scheduler).is_none() {
                    return Ok(false);
                }
            }
        }
        self.refresh()?;
        Ok(true)
    }

    fn click_node(&mut self, name: &str, role: Role) {
        match self.view {
            ViewKind::Network => {
                self.selection.click_entity(name, role);
            }
            ViewKind::Purpose => {
                if self.selection.click_entity(name, role) {
                    self.country_pick = Some((name.to_string(), role));
                }
            }
            ViewKind::Timeline => {
                self.mode = role;
                let locked = self.selection.lock_entity(name, role);
                self.timeline_focus = locked.then(|| name.to_string());
            }
            ViewKind::YearNetwork => self.selection.set_entity(name, role),
        }
    }

    fn click_edge(&mut self, donor: &str, recipient: &str) {
        match self.view {
            ViewKind::Network => {
                self.selection.click_pair(donor, recipient);
            }
            ViewKind::Purpose => {
                self.pair_pick = Some((donor.to_string(), recipient.to_string()));
            }
            ViewKind::YearNetwork => self.selection.set_pair(donor, recipient),
            ViewKind::Timeline => warn!("timeline has no edges; ignoring click"),
        }
    }

    fn apply_control(&mut self, change: ControlChange) {
        match change {
            ControlChange::RankingMode { role } => {
                self.mode = role;
                self.timeline_focus = None;
                self.selection.clear();
            }
            ControlChange::Normalize { on } => self.normalize = on,
            ControlChange::PlayToggled => {
                self.playback.toggle(&mut self.scheduler);
            }
            ControlChange::PairPicked { donor, recipient } => {
                self.pair_pick = Some((donor, recipient));
            }
            ControlChange::CountryPicked { name, role } => {
                self.country_pick = Some((name, role));
            }
            ControlChange::ShowAll => {
                self.timeline_focus = None;
                self.selection.clear();
            }
            ControlChange::SwitchView { view } => {
                self.playback.stop(&mut self.scheduler);
                self.selection.clear();
                self.timeline_focus = None;
                self.pie_year = None;
                self.view = view;
            }
        }
    }
}
