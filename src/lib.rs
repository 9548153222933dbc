//! SGPA calculation for the VTU 2022 grading scheme.
//!
//! The pure core is [`grading`], [`ledger`], [`compute`] and [`parser`].
//! [`session`] ties them together for one calculation, [`report`] renders
//! results, and [`extract`] talks to the transcript extraction service.

pub mod compute;
pub mod extract;
pub mod grading;
pub mod import;
pub mod ledger;
pub mod models;
pub mod parser;
pub mod presets;
pub mod report;
pub mod session;
