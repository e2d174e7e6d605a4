// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding API Module
//!
//! `POST /get_txt_vec` and `POST /get_img_vec`.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::{img_vec_handler, txt_vec_handler};
pub use request::{ImgVecRequest, TextVecRequest};
pub use response::EmbedResponse;
