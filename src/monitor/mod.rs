// SPDX-License-Identifier: MPL-2.0

//! Monitor module organization

pub mod network;

pub use network::NetworkMonitor;
