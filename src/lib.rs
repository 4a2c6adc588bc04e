//! Scraper for a single CIAN development (ЖК) page: development metadata
//! plus every flat currently offered, emitted as one JSON snapshot.

pub mod config;
pub mod models;
pub mod runner;
pub mod scrapers;
