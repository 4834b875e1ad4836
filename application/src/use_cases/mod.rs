//! Use cases
//!
//! Each use case orchestrates domain logic through the ports. The
//! deliberation round is the heavyweight path; chat is the lightweight
//! one, escalating to a full round when specialists disagree.

pub mod enforce_evidence;
pub mod roster;
pub mod route_agents;
pub mod run_chat;
pub mod run_deliberation;
