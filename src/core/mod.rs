//! Core module for campaign records, calendar arithmetic and timeline layout.

pub mod calendar;
pub mod config;
pub mod controller;
pub mod error;
pub mod filter;
pub mod lane;
pub mod mapper;
pub mod range;
pub mod record;
pub mod segment;
pub mod store;
pub mod timeline;
