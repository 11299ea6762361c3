// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Dance trainer: announces random moves of a dance style at a fixed
//! interval while background music loops.

pub mod audio;
pub mod config;
pub mod library;
pub mod session;
pub mod speech;
pub mod timing;
pub mod ui;
