//! The boundary to whatever draws the frames, and the events it sends back.

use crate::core::record::Role;
use crate::selection::playback::TaskId;
use crate::views::network::NetworkFrame;
use crate::views::purpose::PurposeFrame;
use crate::views::timeline::TimelineFrame;
use crate::views::year_network::YearNetworkFrame;
use crate::views::ViewKind;
use serde::{Deserialize, Serialize};
use std::io::Write;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything one view needs to draw itself after a pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum Frame {
    Network(NetworkFrame),
    Purpose(PurposeFrame),
    Timeline(TimelineFrame),
    YearNetwork(YearNetworkFrame),
}

impl Frame {
    pub fn kind(&self) -> ViewKind {
        match self {
            Frame::Network(_) => ViewKind::Network,
            Frame::Purpose(_) => ViewKind::Purpose,
            Frame::Timeline(_) => ViewKind::Timeline,
            Frame::YearNetwork(_) => ViewKind::YearNetwork,
        }
    }
}

/// Receives one frame per recompute pass.
pub trait Renderer {
    fn render(&mut self, frame: &Frame) -> Result<(), RenderError>;

    /// Replace the view with a blocking error message.
    fn show_error(&mut self, message: &str) -> Result<(), RenderError>;
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    fn render(&mut self, frame: &Frame) -> Result<(), RenderError> {
        (**self).render(frame)
    }

    fn show_error(&mut self, message: &str) -> Result<(), RenderError> {
        (**self).show_error(message)
    }
}

/// Writes each frame as one line of JSON.
#[derive(Debug)]
pub struct JsonRenderer<W: Write> {
    out: W,
    pretty: bool,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, pretty: false }
    }

    pub fn pretty(out: W) -> Self {
        Self { out, pretty: true }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for JsonRenderer<W> {
    fn render(&mut self, frame: &Frame) -> Result<(), RenderError> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.out, frame)?;
        } else {
            serde_json::to_writer(&mut self.out, frame)?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    fn show_error(&mut self, message: &str) -> Result<(), RenderError> {
        serde_json::to_writer(&mut self.out, &serde_json::json!({ "error": message }))?;
        writeln!(self.out)?;
        Ok(())
    }
}

/// Keeps every frame and error in memory.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub frames: Vec<Frame>,
    pub errors: Vec<String>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&Frame> {
        self.frames.last()
    }
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, frame: &Frame) -> Result<(), RenderError> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn show_error(&mut self, message: &str) -> Result<(), RenderError> {
        self.errors.push(message.to_string());
        Ok(())
    }
}

/// A change made through one of the view's controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum ControlChange {
    /// List donors or recipients in the timeline.
    RankingMode { role: Role },
    /// Stack absolute amounts or shares.
    Normalize { on: bool },
    PlayToggled,
    PairPicked { donor: String, recipient: String },
    CountryPicked { name: String, role: Role },
    /// Back to the aggregate of everything.
    ShowAll,
    SwitchView { view: ViewKind },
}

/// Input delivered to an explorer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ViewEvent {
    NodeClicked { name: String, role: Role },
    EdgeClicked { donor: String, recipient: String },
    YearScrubbed { year: i32 },
    ControlChanged(ControlChange),
    YearHovered { year: i32 },
    YearClicked { year: i32 },
    PointerLeft,
    Tick { task: TaskId },
}

impl ViewEvent {
    pub fn node(name: impl Into<String>, role: Role) -> Self {
        ViewEvent::NodeClicked {
            name: name.into(),
            role,
        }
    }

    pub fn edge(donor: impl Into<String>, recipient: impl Into<String>) -> Self {
        ViewEvent::EdgeClicked {
            donor: donor.into(),
            recipient: recipient.into(),
        }
    }
}
