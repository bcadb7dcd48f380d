//! Relays new entries from RSS/RDF/Atom feeds to webhooks.
//!
//! A run resolves a [`profile::FeedProfile`] per configured feed, fetches and
//! parses each feed, drops entries whose link is already in the
//! [`storage::SeenSet`], optionally translates the rest, posts them to every
//! destination, and records the link once delivery fully succeeded.
//! See [`pipeline::Pipeline`].

pub mod config;
pub mod feed;
pub mod notify;
pub mod pipeline;
pub mod profile;
pub mod storage;
pub mod translate;
pub mod util;
