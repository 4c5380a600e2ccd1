//! Download engine for rutube.ru videos.
//!
//! ```text
//!  input ──► ResourceReference ──► RutubeApi ──► MasterPlaylist ──► QualityMap
//!                                                                      │ select
//!  output file ◄── SegmentDownloader (batches) ◄── SegmentList ◄───────┘
//! ```
//!
//! [`DownloadSession`] drives the whole flow and is the surface used by
//! command line and graphical front ends.

pub mod api;
pub mod config;
pub mod download;
pub mod error;
mod fetch;
pub mod playlist;
mod quality;
pub mod resource;
pub mod retry;
pub mod segment;
pub mod session;
pub mod util;
pub mod worker;

pub use config::SessionConfig;
pub use download::{InterruptHandle, ProgressCallback, SegmentDownloader};
pub use error::{RutubeError, RutubeResult};
pub use playlist::{MasterPlaylist, PlaylistReference, QualityMap};
pub use quality::Quality;
pub use resource::ResourceReference;
pub use retry::RetryConfig;
pub use segment::{Segment, SegmentList};
pub use session::{DownloadSession, SessionState, VideoInfo, VIDEO_FORMAT};
pub use worker::SessionWorker;

pub use m3u8_rs;
pub use reqwest;
