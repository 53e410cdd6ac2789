// Plan export to XLSX, CSV and PDF

use chrono::NaiveDate;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use serde::{Deserialize, Serialize};

use super::summary::BudgetSummary;
use super::table::{flatten, PlanRow};
use crate::enrichment::PlanTree;
use crate::models::fields::format_number;
use crate::models::PlanType;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("XLSX export failed: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("PDF export failed: {0}")]
    Pdf(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Amharic,
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "am" | "amharic" => Ok(Language::Amharic),
            other => Err(format!("unsupported language '{}'", other)),
        }
    }
}

const COLUMNS: [(&str, &str); 21] = [
    ("Strategic Objective", "ስትራቴጂክ ዓላማ"),
    ("Objective Weight", "የዓላማው ክብደት"),
    ("Strategic Initiative", "ስትራቴጂክ ተነሳሽነት"),
    ("Initiative Weight", "የተነሳሽነቱ ክብደት"),
    ("Type", "ዓይነት"),
    ("Performance Measure / Main Activity", "የአፈጻጸም መለኪያ / ዋና ተግባር"),
    ("Weight", "ክብደት"),
    ("Baseline", "መነሻ"),
    ("Q1 Target", "1ኛ ሩብ ዓመት"),
    ("Q2 Target", "2ኛ ሩብ ዓመት"),
    ("Six Month Target", "የ6 ወር ዒላማ"),
    ("Q3 Target", "3ኛ ሩብ ዓመት"),
    ("Q4 Target", "4ኛ ሩብ ዓመት"),
    ("Annual Target", "የዓመቱ ዒላማ"),
    ("Budget Required", "የሚያስፈልገው በጀት"),
    ("Government", "መንግስት"),
    ("Partners", "አጋሮች"),
    ("SDG", "ኤስዲጂ"),
    ("Other", "ሌሎች"),
    ("Total Available", "ጠቅላላ ያለ በጀት"),
    ("Gap", "ክፍተት"),
];

const HEADER_LABELS: [(&str, &str); 6] = [
    ("Organization", "ድርጅት"),
    ("Planner", "እቅድ አዘጋጅ"),
    ("From", "ከ"),
    ("To", "እስከ"),
    ("Plan Type", "የእቅድ ዓይነት"),
    ("Total", "ድምር"),
];

fn pick(pair: (&'static str, &'static str), language: Language) -> &'static str {
    match language {
        Language::English => pair.0,
        Language::Amharic => pair.1,
    }
}

pub fn column_labels(language: Language) -> Vec<&'static str> {
    COLUMNS.iter().map(|&c| pick(c, language)).collect()
}

/// Identifying block printed above the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportHeader {
    pub organization: String,
    pub planner: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub plan_type: PlanType,
}

impl ExportHeader {
    fn lines(&self, language: Language) -> Vec<(&'static str, String)> {
        vec![
            (pick(HEADER_LABELS[0], language), self.organization.clone()),
            (pick(HEADER_LABELS[1], language), self.planner.clone()),
            (pick(HEADER_LABELS[2], language), self.from_date.to_string()),
            (pick(HEADER_LABELS[3], language), self.to_date.to_string()),
            (pick(HEADER_LABELS[4], language), self.plan_type.to_string()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    fn render(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
        }
    }
}

fn row_cells(row: &PlanRow) -> Vec<Cell> {
    let mut cells = Vec::with_capacity(COLUMNS.len());
    for group in [&row.objective, &row.initiative] {
        match group {
            Some((name, weight)) => {
                cells.push(Cell::Text(name.clone()));
                cells.push(Cell::Number(*weight));
            }
            None => cells.extend([Cell::Empty, Cell::Empty]),
        }
    }

    match &row.item {
        Some(item) => {
            cells.push(Cell::Text(item.kind.label().to_string()));
            cells.push(Cell::Text(item.name.clone()));
            cells.push(Cell::Number(item.weight));
            cells.push(item.baseline.clone().map_or(Cell::Empty, Cell::Text));
            cells.extend(
                [item.q1, item.q2, item.six_month, item.q3, item.q4, item.annual].map(Cell::Number),
            );
            match item.budget {
                Some(b) => cells.extend(
                    [b.required, b.government, b.partners, b.sdg, b.other, b.available, b.gap]
                        .map(Cell::Number),
                ),
                None => cells.extend(std::iter::repeat(Cell::Empty).take(7)),
            }
        }
        None => cells.extend(std::iter::repeat(Cell::Empty).take(COLUMNS.len() - 4)),
    }
    cells
}

fn total_cells(summary: &BudgetSummary, language: Language) -> Vec<Cell> {
    let mut cells = vec![Cell::Text(pick(HEADER_LABELS[5], language).to_string())];
    cells.extend(std::iter::repeat(Cell::Empty).take(COLUMNS.len() - 8));
    cells.extend(
        [
            summary.total_required,
            summary.government,
            summary.partners,
            summary.sdg,
            summary.other,
            summary.total_available,
            summary.total_gap,
        ]
        .map(Cell::Number),
    );
    cells
}

/// Everything an export needs, computed once from the enriched tree.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanReport {
    pub header: ExportHeader,
    pub rows: Vec<PlanRow>,
    pub summary: BudgetSummary,
}

impl PlanReport {
    pub fn new(header: ExportHeader, tree: &PlanTree) -> Self {
        Self {
            header,
            rows: flatten(tree),
            summary: BudgetSummary::from_tree(tree),
        }
    }

    fn body(&self, language: Language) -> Vec<Vec<Cell>> {
        let mut body: Vec<Vec<Cell>> = self.rows.iter().map(row_cells).collect();
        body.push(total_cells(&self.summary, language));
        body
    }

    pub fn to_xlsx(&self, language: Language) -> Result<Vec<u8>, ExportError> {
        let mut workbook = Workbook::new();
        let mut worksheet = Worksheet::new();
        worksheet.set_name("Plan")?;
        let bold = Format::new().set_bold();

        let mut r = 0u32;
        for (label, value) in self.header.lines(language) {
            worksheet.write_string_with_format(r, 0, label, &bold)?;
            worksheet.write_string(r, 1, &value)?;
            r += 1;
        }
        r += 1;

        for (c, label) in column_labels(language).into_iter().enumerate() {
            worksheet.write_string_with_format(r, c as u16, label, &bold)?;
        }
        r += 1;

        for cells in self.body(language) {
            write_xlsx_row(&mut worksheet, r, &cells)?;
            r += 1;
        }

        workbook.push_worksheet(worksheet);
        Ok(workbook.save_to_buffer()?)
    }

    pub fn to_csv(&self, language: Language) -> Result<Vec<u8>, ExportError> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());

        for (label, value) in self.header.lines(language) {
            writer.write_record([label, value.as_str()])?;
        }
        writer.write_record(column_labels(language))?;
        for cells in self.body(language) {
            writer.write_record(cells.iter().map(Cell::render))?;
        }

        writer
            .into_inner()
            .map_err(|e| ExportError::Io(e.into_error()))
    }

    /// Landscape A4 text table. Builtin PDF fonts only cover Latin text, so
    /// labels are English and other scripts are replaced with '?'.
    pub fn to_pdf(&self) -> Result<Vec<u8>, ExportError> {
        let title = format!("{} - {}", self.header.organization, self.header.plan_type);
        let (doc, page, layer) =
            PdfDocument::new(latin(&title), Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1".to_string());
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ExportError::Pdf(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ExportError::Pdf(e.to_string()))?;

        let mut pen = Pen {
            layer: doc.get_page(page).get_layer(layer),
            y: PAGE_HEIGHT - MARGIN,
        };

        for (label, value) in self.header.lines(Language::English) {
            pen.text(&format!("{}: {}", label, value), 10.0, MARGIN, &bold);
            pen.y -= LINE_HEIGHT;
        }
        pen.y -= LINE_HEIGHT;

        let labels: Vec<String> = COLUMNS
            .iter()
            .filter_map(|&(en, _)| PDF_COLUMNS.contains(&en).then(|| en.to_string()))
            .collect();
        pen.row(&labels, &bold);

        for cells in self.body(Language::English) {
            if pen.y < MARGIN {
                let (next_page, next_layer) =
                    doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
                pen.layer = doc.get_page(next_page).get_layer(next_layer);
                pen.y = PAGE_HEIGHT - MARGIN;
                pen.row(&labels, &bold);
            }
            let rendered: Vec<String> = COLUMNS
                .iter()
                .zip(&cells)
                .filter(|((en, _), _)| PDF_COLUMNS.contains(en))
                .map(|(_, cell)| cell.render())
                .collect();
            pen.row(&rendered, &font);
        }

        drop(pen);
        doc.save_to_bytes()
            .map_err(|e| ExportError::Pdf(e.to_string()))
    }
}

fn write_xlsx_row(worksheet: &mut Worksheet, r: u32, cells: &[Cell]) -> Result<(), XlsxError> {
    for (c, cell) in cells.iter().enumerate() {
        match cell {
            Cell::Empty => {}
            Cell::Text(s) => {
                worksheet.write_string(r, c as u16, s)?;
            }
            Cell::Number(n) => {
                worksheet.write_number(r, c as u16, *n)?;
            }
        }
    }
    Ok(())
}

const PAGE_WIDTH: f32 = 297.0;
const PAGE_HEIGHT: f32 = 210.0;
const MARGIN: f32 = 12.0;
const LINE_HEIGHT: f32 = 5.0;

/// Columns that fit a landscape page.
const PDF_COLUMNS: [&str; 11] = [
    "Strategic Objective",
    "Strategic Initiative",
    "Performance Measure / Main Activity",
    "Weight",
    "Six Month Target",
    "Annual Target",
    "Budget Required",
    "Government",
    "Partners",
    "Total Available",
    "Gap",
];

struct Pen {
    layer: PdfLayerReference,
    y: f32,
}

impl Pen {
    fn text(&self, text: &str, size: f32, x: f32, font: &IndirectFontRef) {
        self.layer
            .use_text(latin(text), size, Mm(x), Mm(self.y), font);
    }

    fn row(&mut self, cells: &[String], font: &IndirectFontRef) {
        let width = (PAGE_WIDTH - 2.0 * MARGIN) / PDF_COLUMNS.len() as f32;
        for (i, cell) in cells.iter().enumerate() {
            let clipped: String = cell.chars().take(22).collect();
            self.text(&clipped, 6.5, MARGIN + width * i as f32, font);
        }
        self.y -= LINE_HEIGHT;
    }
}

fn latin(text: &str) -> String {
    text.chars()
        .map(|c| if (c as u32) < 0x100 { c } else { '?' })
        .collect()
}
