//! hybridtrader: Keltner/Bollinger breakout strategy for FX and gold, with a
//! multi-symbol backtester and a broker-driven live session.
//!
//! The engine and simulation live in [`domain`]; data, news, broker and report
//! seams are traits in [`ports`] with file-backed implementations in
//! [`adapters`]. [`cli`] wires them together.

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
