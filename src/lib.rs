//! Regional points scoring and season pool allocation.
//!
//! Events are scored per team ([`scoring`]), folded into season records in a
//! fixed week-then-code order ([`season`]), and allocated into the regional
//! pool under a weekly or per-event regime ([`pool`]). [`build`] drives a
//! whole season from an [`source::EventSource`].

pub mod build;
pub mod config;
pub mod error;
pub mod event;
pub mod fetch;
pub mod output;
pub mod pool;
pub mod scoring;
pub mod season;
pub mod source;
