use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::compensation::{
    AllowanceDeduction, AllowanceDeductionRow, CompensationInput, EmployeeCompensation,
    ImportPreview, ImportRowError, ImportSummary,
};
use crate::services::hr_api::CompensationApi;
use crate::services::submission_guard::SubmissionGuard;

const IMPORT_COLUMNS: usize = 3;

pub struct CompensationService {
    api: Arc<dyn CompensationApi>,
    guard: SubmissionGuard,
}

impl CompensationService {
    pub fn new(api: Arc<dyn CompensationApi>, guard: SubmissionGuard) -> Self {
        Self { api, guard }
    }

    pub async fn list(&self) -> AppResult<Vec<EmployeeCompensation>> {
        self.api.list_compensations().await
    }

    pub async fn create(&self, input: CompensationInput) -> AppResult<Vec<EmployeeCompensation>> {
        validate_compensation(&input)?;
        self.guard
            .run("compensation.create", self.api.create_compensation(&input))
            .await?;
        info!(target: "app::compensation", employee_id = input.employee_id, "compensation created");
        self.list().await
    }

    pub async fn update(
        &self,
        id: i64,
        input: CompensationInput,
    ) -> AppResult<Vec<EmployeeCompensation>> {
        validate_compensation(&input)?;
        self.guard
            .run(
                format!("compensation.update.{id}"),
                self.api.update_compensation(id, &input),
            )
            .await?;
        info!(target: "app::compensation", id, "compensation updated");
        self.list().await
    }

    pub async fn delete(&self, id: i64) -> AppResult<Vec<EmployeeCompensation>> {
        self.guard
            .run(
                format!("compensation.delete.{id}"),
                self.api.delete_compensation(id),
            )
            .await?;
        info!(target: "app::compensation", id, "compensation deleted");
        self.list().await
    }

    pub async fn list_allowance_deductions(&self) -> AppResult<Vec<AllowanceDeduction>> {
        self.api.list_allowance_deductions().await
    }

    pub fn preview_import(&self, csv: &str) -> ImportPreview {
        parse_import(csv)
    }

    /// Uploads the file only when every row parses.
    pub async fn import(&self, csv: String) -> AppResult<ImportSummary> {
        let preview = parse_import(&csv);
        if !preview.is_valid() {
            warn!(
                target: "app::compensation",
                errors = preview.errors.len(),
                rows = preview.rows.len(),
                "import refused"
            );
            let message = if preview.errors.is_empty() {
                "The import file has no data rows".to_string()
            } else {
                format!("The import file has {} invalid row(s)", preview.errors.len())
            };
            return Err(AppError::validation_with_details(
                message,
                json!({ "rows": preview.errors }),
            ));
        }

        let rows = preview.rows.len();
        let summary = self
            .guard
            .run(
                "compensation.import",
                self.api.import_allowance_deductions(csv),
            )
            .await?;
        info!(
            target: "app::compensation",
            rows,
            imported = summary.imported,
            skipped = summary.skipped,
            "allowances and deductions imported"
        );
        Ok(summary)
    }
}

/// Parse `employee id, allowance/deduction id, amount` lines.
pub fn parse_import(csv: &str) -> ImportPreview {
    let mut preview = ImportPreview::default();
    let mut seen_data_line = false;

    for (index, raw_line) in csv.lines().enumerate() {
        let line = index + 1;
        let text = raw_line.trim().trim_start_matches('\u{feff}');
        if text.is_empty() {
            continue;
        }

        let cells = match split_cells(text) {
            Ok(cells) => cells,
            Err(message) => {
                seen_data_line = true;
                preview.errors.push(ImportRowError { line, message });
                continue;
            }
        };
        if !seen_data_line {
            seen_data_line = true;
            let amount_cell = cells.get(IMPORT_COLUMNS - 1).map(String::as_str).unwrap_or("");
            if cells.len() == IMPORT_COLUMNS && parse_amount(amount_cell).is_none() {
                preview.has_header = true;
                continue;
            }
        }

        match parse_row(line, &cells) {
            Ok(row) => preview.rows.push(row),
            Err(message) => preview.errors.push(ImportRowError { line, message }),
        }
    }

    preview
}

fn parse_row(line: usize, cells: &[String]) -> Result<AllowanceDeductionRow, String> {
    if cells.len() != IMPORT_COLUMNS {
        return Err(format!(
            "Expected {IMPORT_COLUMNS} columns but found {}",
            cells.len()
        ));
    }
    if cells[0].is_empty() {
        return Err("Employee id is missing".to_string());
    }
    if cells[1].is_empty() {
        return Err("Allowance/deduction id is missing".to_string());
    }

    let amount = parse_amount(&cells[2])
        .ok_or_else(|| format!("Amount \"{}\" is not a number", cells[2]))?;
    if amount < 0.0 {
        return Err("Amount must not be negative".to_string());
    }

    Ok(AllowanceDeductionRow {
        line,
        employee_id: cells[0].clone(),
        allowance_deduction_id: cells[1].clone(),
        amount,
    })
}

/// Split one record into trimmed cells. A cell may be wrapped in double
/// quotes, in which case commas are literal and `""` stands for one quote.
fn split_cells(text: &str) -> Result<Vec<String>, String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            ',' if !in_quotes => cells.push(std::mem::take(&mut current).trim().to_string()),
            other => current.push(other),
        }
    }

    if in_quotes {
        return Err("Quoted cell is not closed".to_string());
    }
    cells.push(current.trim().to_string());
    Ok(cells)
}

/// Plain decimals, or amounts grouped by thousands such as `1,500.25`.
fn parse_amount(cell: &str) -> Option<f64> {
    let (sign, body) = match cell.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", cell),
    };

    let normalized = if body.contains(',') {
        let (whole, fraction) = match body.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (body, None),
        };
        let mut groups = whole.split(',');
        let lead = groups.next()?;
        let is_digits = |part: &str| part.chars().all(|ch| ch.is_ascii_digit());
        if !(1..=3).contains(&lead.len()) || !is_digits(lead) {
            return None;
        }
        if !groups.all(|group| group.len() == 3 && is_digits(group)) {
            return None;
        }
        let digits = whole.replace(',', "");
        match fraction {
            Some(fraction) => format!("{sign}{digits}.{fraction}"),
            None => format!("{sign}{digits}"),
        }
    } else {
        cell.to_string()
    };

    normalized.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn validate_compensation(input: &CompensationInput) -> AppResult<()> {
    let mut fields = serde_json::Map::new();
    if input.employee_id <= 0 {
        fields.insert("employeeId".to_string(), json!(["Select an employee"]));
    }
    if !input.basic_salary.is_finite() || input.basic_salary < 0.0 {
        fields.insert(
            "basicSalary".to_string(),
            json!(["Basic salary must be a non-negative amount"]),
        );
    }
    for (index, line) in input.lines.iter().enumerate() {
        if !line.amount.is_finite() || line.amount < 0.0 {
            fields.insert(
                format!("lines.{index}.amount"),
                json!(["Amount must be a non-negative number"]),
            );
        }
    }

    if fields.is_empty() {
        Ok(())
    } else {
        Err(AppError::validation_with_details(
            "The compensation form has invalid fields",
            json!({ "fields": fields }),
        ))
    }
}
