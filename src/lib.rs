//! Ledgr backend: QuickBooks-backed financial snapshots, AI sales insights and
//! audit deck exports for accounting-firm prospects.

pub mod activities;
pub mod benchmarks;
pub mod core;
pub mod export;
pub mod financials;
pub mod insights;
pub mod llm;
pub mod main_module;
pub mod prospects;
pub mod quickbooks;
pub mod reports;
pub mod transcripts;
