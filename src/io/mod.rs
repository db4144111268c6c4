// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O: object storage, annotation wire formats and image decoding.

pub mod media;
pub mod serialization;
pub mod storage;
