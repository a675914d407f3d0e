//! Dojo Service
//!
//! Backend for the Dojo video platform. Users upload videos, have an external
//! inference backend generate chapter markers for them, manage their library
//! and follow, like and discover each other's work.
//!
//! ## Features
//!
//! - **Upload orchestration**: file validation, per-owner object paths in
//!   S3-compatible storage, progress reporting
//! - **AI processing**: a guarded `pending -> processing -> completed | failed`
//!   state machine around the inference call, chapter persistence
//! - **Social aggregation**: follow/like edges, user stats and an activity
//!   feed merged from uploads, follows and likes of followed users
//! - **Discovery**: video and user search, trending and recent listings
//!
//! ## Architecture
//!
//! ```text
//!   HTTP API (axum, JSON + SSE)
//!        │
//!        ▼
//! ┌──────────────┐  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐
//! │ Upload       │  │ AI           │  │ Social       │  │ Identity /   │
//! │ Orchestrator │  │ Processor    │  │ Service      │  │ Discovery    │
//! └──────────────┘  └──────────────┘  └──────────────┘  └──────────────┘
//!        │            │     │    │          │                  │
//!        ▼            ▼     │    ▼          ▼                  ▼
//! ┌──────────────┐  ┌──────────────┐  ┌─────────────────────────────────┐
//! │ Object Store │  │ Inference    │  │ PgStore (users, videos,          │
//! │ (S3)         │  │ Backend      │  │ chapters, follows, likes)        │
//! └──────────────┘  └──────────────┘  └─────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod discovery;
pub mod error;
pub mod identity;
pub mod inference;
pub mod models;
pub mod object_store;
pub mod processing;
pub mod progress;
pub mod session;
pub mod social;
pub mod store;
pub mod timestamp;
pub mod upload;
pub mod videos;

pub use api::{AppState, AuthUser};
pub use config::Config;
pub use discovery::Discovery;
pub use error::{Error, Result};
pub use identity::{IdentityService, OAuthIdentity, SessionUser, SignedIn};
pub use inference::{HttpInferenceClient, InferenceBackend, ModelDescriptor};
pub use object_store::{Bucket, ObjectStore, S3ObjectStore, StoredObject};
pub use processing::{AiProcessor, ProcessRequest};
pub use progress::{ProgressEvent, ProgressSender, ProgressStage, ProgressStream};
pub use session::SessionKeys;
pub use social::{ActivityItem, ActivityKind, SocialService};
pub use store::{ChapterStore, PgStore, Readiness, SocialStore, UserStore, VideoStore};
pub use upload::{UploadFile, UploadOrchestrator};
pub use videos::VideoLibrary;
