// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! PDF renderer backed by `printpdf`
//!
//! Single-page A4 documents using the builtin Helvetica faces. Text is limited
//! to printable ASCII; other characters are replaced before layout.
//! Rendering is blocking and runs on the tokio blocking pool.

use async_trait::async_trait;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::debug;

use crate::domain::pdf::{DocumentRenderData, PdfRenderer, RenderError};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const LEFT_MARGIN_MM: f32 = 20.0;
const LINE_SPACING_MM: f32 = 10.0;

/// Content of one rendered page
struct PageContent {
    title: &'static str,
    lines: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PrintPdfRenderer;

impl PrintPdfRenderer {
    pub fn new() -> Self {
        Self
    }

    async fn render(&self, content: PageContent, output_path: PathBuf) -> Result<PathBuf, RenderError> {
        tokio::task::spawn_blocking(move || write_pdf(&content, &output_path).map(|_| output_path))
            .await
            .map_err(|e| RenderError::Generation(format!("render task failed: {}", e)))?
    }
}

fn contract_content(data: &DocumentRenderData) -> PageContent {
    PageContent {
        title: "CONTRACT",
        lines: vec![
            format!("Contract number: {}", data.deal.id),
            format!("Client: {}", data.lead.title),
            format!("Amount: {} {}", data.deal.formatted_amount(), data.deal.currency),
            format!("Date: {}", data.generated_at.format("%d.%m.%Y")),
        ],
    }
}

fn invoice_content(data: &DocumentRenderData) -> PageContent {
    PageContent {
        title: "INVOICE",
        lines: vec![
            format!("Invoice number: {}", data.deal.id),
            format!("Client: {}", data.lead.title),
            format!("Amount due: {} {}", data.deal.formatted_amount(), data.deal.currency),
            format!("Issue date: {}", data.generated_at.format("%d.%m.%Y")),
        ],
    }
}

#[async_trait]
impl PdfRenderer for PrintPdfRenderer {
    async fn render_contract(&self, data: &DocumentRenderData) -> Result<PathBuf, RenderError> {
        debug!(deal_id = %data.deal.id, path = ?data.output_path, "Rendering contract");
        self.render(contract_content(data), data.output_path.clone()).await
    }

    async fn render_invoice(&self, data: &DocumentRenderData) -> Result<PathBuf, RenderError> {
        debug!(deal_id = %data.deal.id, path = ?data.output_path, "Rendering invoice");
        self.render(invoice_content(data), data.output_path.clone()).await
    }
}

fn write_pdf(content: &PageContent, output_path: &std::path::Path) -> Result<(), RenderError> {
    let (doc, page, layer) =
        PdfDocument::new(content.title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
    let layer = doc.get_page(page).get_layer(layer);

    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| RenderError::Generation(e.to_string()))?;
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| RenderError::Generation(e.to_string()))?;

    // Roughly centred: Helvetica Bold caps average ~0.7em
    let title_width_mm = content.title.len() as f32 * 16.0 * 0.7 * 0.3528;
    let title_x = ((PAGE_WIDTH_MM - title_width_mm) / 2.0).max(LEFT_MARGIN_MM);
    layer.use_text(content.title, 16.0, Mm(title_x), Mm(PAGE_HEIGHT_MM - 30.0), &bold);

    write_lines(&layer, &regular, &content.lines, PAGE_HEIGHT_MM - 55.0);

    let file = File::create(output_path)?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| RenderError::Generation(e.to_string()))?;
    Ok(())
}

fn write_lines(layer: &PdfLayerReference, font: &IndirectFontRef, lines: &[String], top_mm: f32) {
    for (i, line) in lines.iter().enumerate() {
        let y = top_mm - (i as f32) * (LINE_SPACING_MM + 5.0);
        layer.use_text(ascii_only(line), 12.0, Mm(LEFT_MARGIN_MM), Mm(y), font);
    }
}

fn ascii_only(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect()
}
