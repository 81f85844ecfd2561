//! # PDF 报表渲染
//!
//! 生成单文件 PDF 1.4：A4 纵向，内置 Helvetica 字体，明细表跨页时重复表头。

use std::fmt::Write as _;

use super::builder::{ReportPayload, ReportRow};
use crate::error::{DashboardError, Result};
use crate::types::Size;

/// 报表渲染器
pub trait ReportRenderer: Send + Sync {
    /// 响应的 `Content-Type`
    fn content_type(&self) -> &'static str;

    /// 将报表数据渲染为文件内容
    fn render(&self, payload: &ReportPayload) -> Result<Vec<u8>>;
}

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 40.0;
const ROW_HEIGHT: f32 = 18.0;
const FOOTER_Y: f32 = 24.0;

const TABLE_HEADERS: [&str; 6] = ["Time (PH)", "Size", "Color", "Quality", "Confidence", "Source"];
const COLUMN_WIDTHS: [f32; 6] = [130.0, 65.0, 65.0, 65.0, 80.0, 110.0];

#[derive(Debug, Clone, Copy)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    const fn resource(self) -> &'static str {
        match self {
            Self::Regular => "F1",
            Self::Bold => "F2",
        }
    }
}

/// PDF 渲染器
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfRenderer;

impl PdfRenderer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ReportRenderer for PdfRenderer {
    fn content_type(&self) -> &'static str {
        "application/pdf"
    }

    fn render(&self, payload: &ReportPayload) -> Result<Vec<u8>> {
        let pages = layout(payload);
        if pages.is_empty() {
            return Err(DashboardError::render("报表没有可输出的页面"));
        }
        Ok(serialize(&pages))
    }
}

/// 页面排版状态
struct Layout {
    pages: Vec<String>,
    current: String,
    y: f32,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: String::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    /// 剩余空间不足 `height` 时换页，返回是否换了页
    fn ensure(&mut self, height: f32) -> bool {
        if self.y - height >= MARGIN {
            return false;
        }
        self.pages.push(std::mem::take(&mut self.current));
        self.y = PAGE_HEIGHT - MARGIN;
        true
    }

    fn text(&mut self, x: f32, y: f32, size: f32, font: Font, text: &str) {
        let _ = writeln!(
            self.current,
            "BT /{} {size:.1} Tf {x:.2} {y:.2} Td ({}) Tj ET",
            font.resource(),
            escape(text)
        );
    }

    fn line(&mut self, text: &str, size: f32, font: Font) {
        let height = size + 6.0;
        self.ensure(height);
        self.y -= height;
        self.text(MARGIN, self.y, size, font, text);
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    fn cells(&mut self, cells: &[&str; 6], font: Font, header: bool) {
        let top = self.y;
        let bottom = top - ROW_HEIGHT;
        let width: f32 = COLUMN_WIDTHS.iter().sum();

        if header {
            // 深蓝底白字
            let _ = writeln!(
                self.current,
                "0 0 0.545 rg {MARGIN:.2} {bottom:.2} {width:.2} {ROW_HEIGHT:.2} re f 1 1 1 rg"
            );
        }

        let mut x = MARGIN;
        for (cell, column_width) in cells.iter().zip(COLUMN_WIDTHS) {
            let fitted = fit(cell, column_width - 8.0, 9.0);
            self.text(x + 4.0, bottom + 5.5, 9.0, font, &fitted);
            let _ = writeln!(
                self.current,
                "0.5 G 0.5 w {x:.2} {bottom:.2} {column_width:.2} {ROW_HEIGHT:.2} re S"
            );
            x += column_width;
        }

        if header {
            self.current.push_str("0 0 0 rg\n");
        }
        self.y = bottom;
    }

    fn table_header(&mut self) {
        self.cells(&TABLE_HEADERS, Font::Bold, true);
    }

    fn table_row(&mut self, row: &ReportRow) {
        if self.ensure(ROW_HEIGHT) {
            self.table_header();
        }
        self.cells(
            &[
                row.time.as_str(),
                row.size.as_str(),
                row.color.as_str(),
                row.quality.as_str(),
                row.confidence.as_str(),
                row.source.as_str(),
            ],
            Font::Regular,
            false,
        );
    }

    /// 收尾：写入页脚 `Page n of m`
    fn finish(mut self) -> Vec<String> {
        if !self.current.is_empty() {
            self.pages.push(self.current);
        }
        let count = self.pages.len();
        self.pages
            .into_iter()
            .enumerate()
            .map(|(index, mut page)| {
                let _ = writeln!(
                    page,
                    "BT /F1 8.0 Tf {:.2} {FOOTER_Y:.2} Td (Page {} of {count}) Tj ET",
                    PAGE_WIDTH - MARGIN - 60.0,
                    index + 1
                );
                page
            })
            .collect()
    }
}

/// 排版整份报表，返回每页的内容流
fn layout(payload: &ReportPayload) -> Vec<String> {
    let mut layout = Layout::new();
    let totals = &payload.totals;
    let offset = format!("UTC{:+}", payload.utc_offset_hours);

    layout.line(&payload.title, 18.0, Font::Bold);
    layout.gap(6.0);
    layout.line(
        &format!("Generated: {} ({offset})", payload.generated_at),
        10.0,
        Font::Regular,
    );
    layout.line(
        &format!("Window: since {} ({offset})", payload.window_start_local),
        10.0,
        Font::Regular,
    );
    layout.gap(8.0);

    layout.line(&format!("Total Eggs: {}", totals.total), 11.0, Font::Bold);
    layout.line(
        &format!("Good: {} | Bad: {}", totals.good, totals.bad),
        10.0,
        Font::Regular,
    );
    layout.line(
        &format!("White: {} | Brown: {}", totals.white, totals.brown),
        10.0,
        Font::Regular,
    );
    layout.line(
        &format!(
            "Small: {}, Medium: {}, Large: {}, XLarge: {}",
            totals.sizes.get(Size::Small),
            totals.sizes.get(Size::Medium),
            totals.sizes.get(Size::Large),
            totals.sizes.get(Size::Xlarge)
        ),
        10.0,
        Font::Regular,
    );
    layout.line(
        &format!(
            "Automated: {} | Manual: {} | Other: {}",
            payload.sources.automated, payload.sources.manual, payload.sources.other
        ),
        10.0,
        Font::Regular,
    );

    if !payload.summary.is_empty() {
        layout.gap(8.0);
        layout.line("Summary by size, color and quality", 11.0, Font::Bold);
        for row in &payload.summary {
            layout.line(
                &format!(
                    "{} / {} / {}: {}",
                    row.size.map_or("-", Size::as_str),
                    row.color.map_or("-", |color| color.as_str()),
                    row.quality.as_str(),
                    row.count
                ),
                9.0,
                Font::Regular,
            );
        }
    }

    layout.gap(8.0);
    let listing = &payload.listing;
    let caption = if listing.truncated {
        format!("Showing {} of {} records", listing.shown, listing.total)
    } else {
        format!("Records: {}", listing.total)
    };
    layout.line(&caption, 10.0, Font::Bold);
    layout.gap(4.0);

    layout.ensure(ROW_HEIGHT * 2.0);
    layout.table_header();
    for row in &listing.rows {
        layout.table_row(row);
    }

    layout.finish()
}

/// 组装 PDF 文件：目录、页树、两个字体、每页一个页面对象和内容流
fn serialize(pages: &[String]) -> Vec<u8> {
    const FIXED_OBJECTS: usize = 4;

    let page_ids: Vec<usize> = (0..pages.len())
        .map(|index| FIXED_OBJECTS + 1 + index * 2)
        .collect();
    let kids = page_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!("<< /Type /Pages /Kids [{kids}] /Count {} >>", pages.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];
    for (content, page_id) in pages.iter().zip(&page_ids) {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH:.0} {PAGE_HEIGHT:.0}] \
             /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
            page_id + 1
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{content}endstream",
            content.len()
        ));
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        let _ = write!(out, "{} 0 obj\n{body}\nendobj\n", index + 1);
    }

    let xref_offset = out.len();
    let _ = write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        let _ = write!(out, "{offset:010} 00000 n \n");
    }
    let _ = write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
        objects.len() + 1
    );
    out.into_bytes()
}

/// 转义 PDF 字符串字面量；非 ASCII 字符替换为 `?`
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' | '(' | ')' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            ch if ch.is_ascii() && !ch.is_ascii_control() => escaped.push(ch),
            _ => escaped.push('?'),
        }
    }
    escaped
}

/// 按近似字宽截断单元格文本
fn fit(text: &str, width: f32, size: f32) -> String {
    // Helvetica 平均字宽约为字号的一半
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let max_chars = (width / (size * 0.5)).floor().max(2.0) as usize;
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut fitted: String = text.chars().take(max_chars - 2).collect();
    fitted.push_str("..");
    fitted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportSettings;
    use crate::report::builder::build_report;
    use crate::statistics::ReportPeriod;
    use crate::testing::fixtures::{fixed_now, minute_series};

    fn render(count: usize) -> (Vec<u8>, String) {
        let records = minute_series(count);
        let payload = build_report(
            &records,
            ReportPeriod::Weekly,
            fixed_now(),
            &ReportSettings::default(),
        )
        .unwrap();
        let bytes = PdfRenderer::new().render(&payload).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        (bytes, text)
    }

    #[test]
    fn test_document_structure() {
        let (bytes, text) = render(5);
        assert!(bytes.starts_with(b"%PDF-1.4\n"));
        assert!(text.ends_with("%%EOF\n"));
        assert!(text.contains("(Weekly Egg Sorting Report) Tj"));
        assert!(text.contains("(Time \\(PH\\)) Tj"));
        assert!(text.contains("(Total Eggs: 5) Tj"));
        assert!(text.contains("(Page 1 of 1) Tj"));
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let (_, text) = render(3);
        let start: usize = text
            .rsplit("startxref\n")
            .next()
            .and_then(|tail| tail.lines().next())
            .unwrap()
            .parse()
            .unwrap();
        assert!(text[start..].starts_with("xref\n"));

        let entries: Vec<&str> = text[start..]
            .lines()
            .skip(3)
            .take_while(|line| line.ends_with(" n "))
            .collect();
        assert!(!entries.is_empty());
        for (index, entry) in entries.iter().enumerate() {
            let offset: usize = entry[..10].parse().unwrap();
            assert!(text[offset..].starts_with(&format!("{} 0 obj\n", index + 1)));
        }
    }

    #[test]
    fn test_stream_lengths_match_content() {
        let (_, text) = render(150);
        let mut streams = 0;
        for chunk in text.split("<< /Length ").skip(1) {
            let (length, rest) = chunk.split_once(" >>\nstream\n").unwrap();
            let length: usize = length.parse().unwrap();
            assert!(rest[length..].starts_with("endstream"));
            streams += 1;
        }
        assert_eq!(streams, text.matches("/Type /Page /").count());
    }

    #[test]
    fn test_long_listing_spans_pages_with_repeated_header() {
        let (_, text) = render(150);
        let page_objects = text.matches("/Type /Page /").count();
        assert!(page_objects > 1);
        assert!(text.contains(&format!("/Count {page_objects}")));
        assert_eq!(text.matches("(Time \\(PH\\)) Tj").count(), page_objects);
        assert!(text.contains("(Showing 100 of 150 records) Tj"));
    }

    #[test]
    fn test_escape_and_fit() {
        assert_eq!(escape("a(b)\\c"), "a\\(b\\)\\\\c");
        assert_eq!(escape("蛋"), "?");
        assert_eq!(fit("sequential-sorter-extra-long", 40.0, 9.0), "sequen..");
        assert_eq!(fit("manual", 100.0, 9.0), "manual");
    }
}
