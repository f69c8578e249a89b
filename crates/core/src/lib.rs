//! Core types for the video agent
//!
//! This crate provides foundational types used across all other crates:
//! - Conversation turns and the append-only conversation log
//! - Video frame storage and decoding

pub mod conversation;
pub mod frame;

pub use conversation::{ConversationLog, Turn, TurnRole};
pub use frame::{decode_frame, DecodedFrame, FrameCell, FrameError};
