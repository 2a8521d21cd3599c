//! Integration tests for the review harvester
//!
//! - `crawl_tests`: full orchestrator sessions against a scripted page agent
//! - `agent_tests`: the HTTP page agent against a wiremock server
//! - `export_tests`: CSV export and configuration files on disk

mod agent_tests;
mod crawl_tests;
mod export_tests;
