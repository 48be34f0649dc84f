// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! PDF rendering port
//!
//! The workflow decides where a document goes; the renderer only lays out the
//! content and writes the file at the path it is given.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::deal::Deal;
use crate::domain::lead::Lead;

/// Everything a template may print
#[derive(Debug, Clone)]
pub struct DocumentRenderData {
    pub lead: Lead,
    pub deal: Deal,
    pub generated_at: DateTime<Utc>,
    /// Absolute output path, parent directory already exists
    pub output_path: PathBuf,
}

#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render_contract(&self, data: &DocumentRenderData) -> Result<PathBuf, RenderError>;

    async fn render_invoice(&self, data: &DocumentRenderData) -> Result<PathBuf, RenderError>;
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF generation failed: {0}")]
    Generation(String),

    #[error("Failed to write PDF: {0}")]
    Io(#[from] std::io::Error),
}
