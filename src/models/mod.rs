// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data model for the editor.

pub mod asset;
pub mod caption;
pub mod project;
pub mod range;
pub mod source;
