// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! UI components for the dashboard.

pub mod canvas;
pub mod login;
pub mod pipeline;
pub mod projects;
pub mod properties;
pub mod toolbar;
