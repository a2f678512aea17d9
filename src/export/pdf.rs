//! PDF reports built on the PDF base-14 fonts.

use chrono::Utc;
use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};

use crate::alert::Alert;
use crate::datetime::format_in_timezone;
use crate::insight::{Insight, Team};
use crate::{Result, RivalError};

const PAGE_WIDTH: f32 = 215.9;
const PAGE_HEIGHT: f32 = 279.4;
const MARGIN: f32 = 20.0;
const PT_TO_MM: f32 = 0.3528;
/// Average glyph width of Helvetica as a fraction of the font size.
const GLYPH_WIDTH: f32 = 0.5;

const TITLE_SIZE: f32 = 18.0;
const HEADING_SIZE: f32 = 13.0;
const BODY_SIZE: f32 = 10.0;
const SMALL_SIZE: f32 = 8.0;

const TITLE_LIMIT: usize = 40;
const GENERATED_FORMAT: &str = "%B %d, %Y at %H:%M";
const ROW_DATE_FORMAT: &str = "%Y-%m-%d";

fn pdf_error(e: impl std::fmt::Display) -> RivalError {
    RivalError::Export(format!("PDF export failed: {}", e))
}

/// Replace characters the base-14 fonts cannot encode.
fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2022}' | '\u{2013}' | '\u{2014}' => '-',
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201c}' | '\u{201d}' => '"',
            '\t' | '\n' | '\r' => ' ',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '?',
        })
        .collect()
}

/// Break `text` into lines of at most `width` characters at word boundaries.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word.to_string();
        while word.chars().count() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let head: String = word.chars().take(width).collect();
            word = word.chars().skip(width).collect();
            lines.push(head);
        }
        if current.is_empty() {
            current = word;
        } else if current.chars().count() + 1 + word.chars().count() <= width {
            current.push(' ');
            current.push_str(&word);
        } else {
            lines.push(std::mem::replace(&mut current, word));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Score level label used in the insight score table.
pub fn score_level(score: i64) -> &'static str {
    match score {
        s if s >= 70 => "High",
        s if s >= 40 => "Medium",
        s if s > 0 => "Low",
        _ => "N/A",
    }
}

fn shorten(text: &str, limit: usize) -> String {
    if text.chars().count() > limit {
        let head: String = text.chars().take(limit).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

/// Top-to-bottom text layout with page breaks.
struct PdfWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    /// Baseline of the next line, in millimetres from the page bottom.
    y: f32,
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(
            sanitize(title),
            Mm(PAGE_WIDTH),
            Mm(PAGE_HEIGHT),
            "Layer 1".to_string(),
        );
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_error)?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_HEIGHT - MARGIN,
        })
    }

    fn ensure_room(&mut self, height: f32) {
        if self.y - height < MARGIN {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT - MARGIN;
        }
    }

    fn text_at(&self, text: &str, size: f32, x: f32, bold: bool) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer
            .use_text(sanitize(text), size, Mm(MARGIN + x), Mm(self.y), font);
    }

    fn line(&mut self, text: &str, size: f32, bold: bool) {
        let height = size * PT_TO_MM * 1.4;
        self.ensure_room(height);
        self.y -= height;
        self.text_at(text, size, 0.0, bold);
    }

    fn paragraph(&mut self, text: &str, size: f32) {
        let usable = PAGE_WIDTH - 2.0 * MARGIN;
        let width = (usable / (size * PT_TO_MM * GLYPH_WIDTH)) as usize;
        for line in wrap(&sanitize(text), width.max(10)) {
            self.line(&line, size, false);
        }
    }

    /// One row of fixed-position columns. Offsets are millimetres from the left margin.
    fn row(&mut self, cells: &[(f32, &str)], size: f32, bold: bool) {
        let height = size * PT_TO_MM * 1.6;
        self.ensure_room(height);
        self.y -= height;
        for (x, text) in cells {
            self.text_at(text, size, *x, bold);
        }
    }

    fn gap(&mut self, mm: f32) {
        self.y -= mm;
    }

    fn title(&mut self, text: &str, timezone: &str) {
        self.line(text, TITLE_SIZE, true);
        self.line(
            &format!(
                "Generated: {}",
                format_in_timezone(&Utc::now(), timezone, GENERATED_FORMAT)
            ),
            SMALL_SIZE,
            false,
        );
        self.gap(6.0);
    }

    fn heading(&mut self, text: &str) {
        self.gap(3.0);
        self.line(text, HEADING_SIZE, true);
        self.gap(1.0);
    }

    fn bullets(&mut self, items: &[String]) {
        for item in items {
            self.paragraph(&format!("- {item}"), BODY_SIZE);
        }
    }

    fn finish(self) -> Result<Vec<u8>> {
        self.doc.save_to_bytes().map_err(pdf_error)
    }
}

/// Single-alert report.
pub fn alert_report(alert: &Alert, timezone: &str) -> Result<Vec<u8>> {
    let mut pdf = PdfWriter::new(&alert.title)?;
    pdf.title(&alert.title, timezone);

    let competitor = alert.competitor_name.as_deref().unwrap_or("Unknown");
    let detected = format_in_timezone(&alert.detected_at, timezone, GENERATED_FORMAT);
    let risk = match alert.risk_score {
        Some(score) => format!("{} ({score}/100)", alert.risk_level.as_str().to_uppercase()),
        None => alert.risk_level.as_str().to_uppercase(),
    };
    let facts = [
        ("Risk Level", risk),
        ("Signal Type", alert.signal_type.title()),
        ("Competitor", competitor.to_string()),
        ("Source", alert.source_url.clone().unwrap_or_else(|| "N/A".into())),
        ("Detected", detected),
    ];
    for (label, value) in &facts {
        let label = format!("{label}:");
        pdf.row(&[(0.0, label.as_str()), (35.0, value.as_str())], BODY_SIZE, false);
    }

    if let Some(ref summary) = alert.summary {
        pdf.heading("Summary");
        pdf.paragraph(summary, BODY_SIZE);
    }
    if let Some(ref relevance) = alert.relevance_explanation {
        pdf.heading("Relevance");
        pdf.paragraph(relevance, BODY_SIZE);
    }
    if !alert.recommended_actions.is_empty() {
        pdf.heading("Recommended Actions");
        let actions: Vec<String> = alert
            .recommended_actions
            .iter()
            .map(|a| format!("{} ({} - {})", a.action, a.priority, a.owner))
            .collect();
        pdf.bullets(&actions);
    }

    pdf.finish()
}

/// Single-insight report.
pub fn insight_report(insight: &Insight, timezone: &str) -> Result<Vec<u8>> {
    let mut pdf = PdfWriter::new(&insight.title)?;
    pdf.title(&insight.title, timezone);

    if let Some(ref summary) = insight.executive_summary {
        pdf.heading("Executive Summary");
        pdf.paragraph(summary, BODY_SIZE);
    }

    pdf.heading("Scores");
    pdf.row(&[(0.0, "Metric"), (50.0, "Score"), (80.0, "Level")], BODY_SIZE, true);
    let scores = [
        ("Impact", insight.impact_score),
        ("Urgency", insight.urgency_score),
        ("Confidence", insight.confidence_score),
    ];
    for (metric, score) in scores {
        let value = format!("{score}/100");
        pdf.row(
            &[(0.0, metric), (50.0, value.as_str()), (80.0, score_level(score))],
            BODY_SIZE,
            false,
        );
    }

    if insight.comparison_summary.is_some()
        || !insight.competitor_advantages.is_empty()
        || !insight.our_advantages.is_empty()
    {
        pdf.heading("Product Comparison");
        if let Some(ref comparison) = insight.comparison_summary {
            pdf.paragraph(comparison, BODY_SIZE);
        }
        if !insight.competitor_advantages.is_empty() {
            pdf.line("Competitor advantages:", BODY_SIZE, true);
            pdf.bullets(&insight.competitor_advantages);
        }
        if !insight.our_advantages.is_empty() {
            pdf.line("Our advantages:", BODY_SIZE, true);
            pdf.bullets(&insight.our_advantages);
        }
    }

    let teams = [
        ("Sales", Team::Sales),
        ("Marketing", Team::Marketing),
        ("Product", Team::Product),
        ("Engineering", Team::Engineering),
        ("Executive", Team::Executive),
    ];
    let populated: Vec<_> = teams
        .iter()
        .filter(|(_, team)| !insight.team_insights(*team).is_empty())
        .collect();
    if !populated.is_empty() {
        pdf.heading("Team Recommendations");
        for (label, team) in populated {
            pdf.line(label, BODY_SIZE, true);
            for (key, value) in insight.team_insights(*team) {
                let text = match value {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Array(items) => items
                        .iter()
                        .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                        .collect::<Vec<_>>()
                        .join("; "),
                    other => other.to_string(),
                };
                pdf.paragraph(&format!("- {}: {text}", key.replace('_', " ")), BODY_SIZE);
            }
        }
    }

    let horizons = [
        ("Immediate", &insight.immediate_actions),
        ("Short-term", &insight.short_term_actions),
        ("Long-term", &insight.long_term_actions),
    ];
    if horizons.iter().any(|(_, actions)| !actions.is_empty()) {
        pdf.heading("Action Items");
        for (label, actions) in horizons {
            if actions.is_empty() {
                continue;
            }
            pdf.line(label, BODY_SIZE, true);
            pdf.bullets(actions);
        }
    }

    pdf.finish()
}

/// Tabular summary of alerts over the last `days` days.
pub fn alerts_summary(alerts: &[Alert], days: i64, timezone: &str) -> Result<Vec<u8>> {
    let title = format!("Alerts Report - Last {days} Days");
    let mut pdf = PdfWriter::new(&title)?;
    pdf.title(&title, timezone);
    pdf.line(&format!("Total Alerts: {}", alerts.len()), BODY_SIZE, false);
    pdf.gap(4.0);

    let columns = [0.0, 10.0, 100.0, 125.0, 155.0];
    pdf.row(
        &[
            (columns[0], "#"),
            (columns[1], "Title"),
            (columns[2], "Risk"),
            (columns[3], "Type"),
            (columns[4], "Date"),
        ],
        SMALL_SIZE,
        true,
    );
    for (index, alert) in alerts.iter().enumerate() {
        let number = (index + 1).to_string();
        let title = shorten(&alert.title, TITLE_LIMIT);
        let date = format_in_timezone(&alert.detected_at, timezone, ROW_DATE_FORMAT);
        pdf.row(
            &[
                (columns[0], number.as_str()),
                (columns[1], title.as_str()),
                (columns[2], alert.risk_level.as_str()),
                (columns[3], alert.signal_type.as_str()),
                (columns[4], date.as_str()),
            ],
            SMALL_SIZE,
            false,
        );
    }

    pdf.finish()
}
