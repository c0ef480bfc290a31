//! Presence sheet template engine.
//!
//! The template workbook is read with calamine and never modified on disk.
//! Anchor cells are located by their label text, the whole sheet is copied
//! into a fresh rust_xlsxwriter workbook and the reconciled values are
//! written over it, so every generation starts from the pristine layout.

use std::io::{Read, Seek};
use std::path::Path;

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use rust_xlsxwriter::Workbook;

use crate::error::AppError;
use crate::report::reconcile::{DaySlot, SHEET_DAY_ROWS};

const PROVIDER_LABEL: &str = "Prestataire";
const PERIOD_LABEL: &str = "Période objet de la facturation";
const DATE_HEADER: &str = "Date";
const TASK_HEADER: &str = "Tâches et livrables";
const TIME_HEADER: &str = "Temps";
const SUPERVISOR_LABEL: &str = "Responsable suivi de mission";

/// Cell coordinates of the labels the engine writes against.
///
/// Only the day-table header row is mandatory. The name/period/signature
/// labels are best-effort: a template missing one still renders, it just
/// loses that field.
///
/// "Prestataire" appears twice in the layout: once in the header block
/// (value goes beside it) and once in the signature block at the bottom
/// (name goes below it). The header one is the first match top-down; the
/// signature one is the match sharing a row with the supervisor label.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateAnchors {
    pub provider: Option<(u32, u16)>,
    pub period: Option<(u32, u16)>,
    pub header_row: u32,
    pub date_col: u16,
    pub task_col: u16,
    pub time_col: u16,
    pub signature: Option<(u32, u16)>,
    /// Day rows physically available under the header row, at most 31. A
    /// short template truncates the fill rather than failing.
    pub day_rows: u32,
}

pub struct PresenceTemplate {
    sheet_name: String,
    cells: Range<Data>,
    anchors: TemplateAnchors,
}

impl PresenceTemplate {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let workbook = open_workbook::<Xlsx<_>, _>(path).map_err(|e| {
            AppError::Template(format!("cannot open template {}: {e}", path.display()))
        })?;
        Self::from_workbook(workbook)
    }

    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self, AppError> {
        Self::from_workbook(Xlsx::new(reader)?)
    }

    fn from_workbook<R: Read + Seek>(mut workbook: Xlsx<R>) -> Result<Self, AppError> {
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| AppError::Template("template workbook has no sheets".to_string()))?;
        let cells = workbook.worksheet_range(&sheet_name)?;
        let anchors = locate_anchors(&cells)?;
        Ok(Self {
            sheet_name,
            cells,
            anchors,
        })
    }

    pub fn anchors(&self) -> &TemplateAnchors {
        &self.anchors
    }

    /// Produces the populated workbook as an in-memory xlsx file.
    pub fn render(
        &self,
        provider_name: &str,
        period_label: &str,
        slots: &[DaySlot],
    ) -> Result<Vec<u8>, AppError> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(&self.sheet_name)?;

        let (start_row, start_col) = self.cells.start().unwrap_or((0, 0));
        for (r, row) in self.cells.rows().enumerate() {
            let abs_row = start_row + r as u32;
            for (c, cell) in row.iter().enumerate() {
                let abs_col = start_col as u16 + c as u16;
                match cell {
                    Data::String(text) => {
                        sheet.write_string(abs_row, abs_col, text.as_str())?;
                    }
                    Data::Float(value) => {
                        sheet.write_number(abs_row, abs_col, *value)?;
                    }
                    Data::Int(value) => {
                        sheet.write_number(abs_row, abs_col, *value as f64)?;
                    }
                    Data::Bool(value) => {
                        sheet.write_boolean(abs_row, abs_col, *value)?;
                    }
                    Data::DateTime(value) => {
                        sheet.write_number(abs_row, abs_col, value.as_f64())?;
                    }
                    Data::DateTimeIso(text) | Data::DurationIso(text) => {
                        sheet.write_string(abs_row, abs_col, text.as_str())?;
                    }
                    Data::Empty | Data::Error(_) => {}
                }
            }
        }

        let anchors = &self.anchors;
        if let Some((row, col)) = anchors.provider {
            sheet.write_string(row, col + 1, provider_name)?;
        }
        if let Some((row, col)) = anchors.period {
            sheet.write_string(row, col + 1, period_label)?;
        }
        for slot in slots.iter().filter(|slot| !slot.is_blank()) {
            // Bounded by the sheet's physical rows, not the month's length.
            if slot.day > anchors.day_rows {
                continue;
            }
            let row = anchors.header_row + slot.day;
            sheet.write_string(row, anchors.date_col, slot.date_label.as_str())?;
            sheet.write_string(row, anchors.task_col, slot.task_text.as_str())?;
            sheet.write_string(row, anchors.time_col, slot.time_text.as_str())?;
        }
        if let Some((row, col)) = anchors.signature {
            sheet.write_string(row + 1, col, provider_name)?;
        }

        sheet.set_column_width(anchors.date_col, 22)?;
        sheet.set_column_width(anchors.task_col, 38)?;
        sheet.set_column_width(anchors.time_col, 16)?;

        workbook.save_to_buffer().map_err(AppError::from)
    }
}

fn locate_anchors(cells: &Range<Data>) -> Result<TemplateAnchors, AppError> {
    if cells.is_empty() {
        return Err(AppError::TemplateLayout(
            "template used range is empty".to_string(),
        ));
    }

    let (start_row, start_col) = cells.start().unwrap_or((0, 0));
    let mut provider = None;
    let mut period = None;
    let mut header: Option<(u32, u16, u16, u16)> = None;
    let mut signature = None;

    for (r, row) in cells.rows().enumerate() {
        let abs_row = start_row + r as u32;
        let mut date_col = None;
        let mut task_col = None;
        let mut time_col = None;
        let mut row_provider = None;
        let mut supervisor_row = false;
        for (c, cell) in row.iter().enumerate() {
            let Data::String(text) = cell else { continue };
            let abs_col = start_col as u16 + c as u16;
            match text.trim() {
                PROVIDER_LABEL => {
                    if provider.is_none() {
                        provider = Some((abs_row, abs_col));
                    }
                    row_provider = Some((abs_row, abs_col));
                }
                PERIOD_LABEL => {
                    if period.is_none() {
                        period = Some((abs_row, abs_col));
                    }
                }
                DATE_HEADER => date_col = Some(abs_col),
                TASK_HEADER => task_col = Some(abs_col),
                TIME_HEADER => time_col = Some(abs_col),
                SUPERVISOR_LABEL => supervisor_row = true,
                _ => {}
            }
        }
        if header.is_none() {
            if let (Some(date), Some(task), Some(time)) = (date_col, task_col, time_col) {
                header = Some((abs_row, date, task, time));
            }
        }
        if supervisor_row && signature.is_none() {
            signature = row_provider;
        }
    }

    // The day table is the one structure generation cannot do without; the
    // name, period and signature labels degrade to skipped writes.
    let (header_row, date_col, task_col, time_col) = header.ok_or_else(|| {
        AppError::TemplateLayout(format!(
            "no row carries the {DATE_HEADER:?} / {TASK_HEADER:?} / {TIME_HEADER:?} headers"
        ))
    })?;

    let last_row = start_row + cells.height() as u32 - 1;
    let day_rows = SHEET_DAY_ROWS.min(last_row.saturating_sub(header_row));

    Ok(TemplateAnchors {
        provider,
        period,
        header_row,
        date_col,
        task_col,
        time_col,
        signature,
        day_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
    use crate::report::calendar::Locale;
    use crate::report::reconcile::{month_grid, WEEKDAY_TASK, WEEKEND_TASK};
    use chrono::NaiveDate;
    use std::io::Cursor;

    fn template_buffer() -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Feuille de présence").unwrap();
        sheet.write_string(0, 0, "FEUILLE DE PRESENCE").unwrap();
        sheet.write_string(2, 0, "Prestataire").unwrap();
        sheet
            .write_string(3, 0, "Période objet de la facturation")
            .unwrap();
        sheet.write_string(5, 0, "Date").unwrap();
        sheet.write_string(5, 1, "Tâches et livrables").unwrap();
        sheet.write_string(5, 2, "Temps").unwrap();
        sheet.write_string(38, 0, "Prestataire").unwrap();
        sheet
            .write_string(38, 2, "Responsable suivi de mission")
            .unwrap();
        workbook.save_to_buffer().unwrap()
    }

    fn reopen(buffer: Vec<u8>) -> Range<Data> {
        let mut workbook = Xlsx::new(Cursor::new(buffer)).unwrap();
        let name = workbook.sheet_names().first().cloned().unwrap();
        workbook.worksheet_range(&name).unwrap()
    }

    fn cell_text(range: &Range<Data>, row: u32, col: u32) -> String {
        match range.get_value((row, col)) {
            Some(Data::String(text)) => text.clone(),
            _ => String::new(),
        }
    }

    fn february_attendance() -> Vec<AttendanceRecord> {
        vec![AttendanceRecord {
            id: 1,
            employee_id: 7,
            date: NaiveDate::from_ymd_opt(2026, 2, 10).unwrap(),
            check_in: NaiveDate::from_ymd_opt(2026, 2, 10)
                .unwrap()
                .and_hms_opt(6, 5, 0),
            check_out: NaiveDate::from_ymd_opt(2026, 2, 10)
                .unwrap()
                .and_hms_opt(14, 10, 0),
            status: AttendanceStatus::Present,
            work_hours: 8.08,
            overtime_hours: 0.08,
            notes: None,
            check_in_latitude: None,
            check_in_longitude: None,
            check_out_latitude: None,
            check_out_longitude: None,
        }]
    }

    fn february_planning() -> Vec<crate::model::planning::PlanningRecord> {
        vec![
            crate::model::planning::PlanningRecord {
                id: 1,
                employee_id: Some(7),
                employee_code: "EMP007".to_string(),
                employee_name: "Awa Diallo".to_string(),
                date: NaiveDate::from_ymd_opt(2026, 2, 10).unwrap(),
                shift: "Shift 1".to_string(),
                start_time: "06:00".to_string(),
                end_time: "14:00".to_string(),
                break_minutes: 0,
                batch_id: None,
                uploaded_by: None,
                notes: None,
            },
            crate::model::planning::PlanningRecord {
                id: 2,
                employee_id: Some(7),
                employee_code: "EMP007".to_string(),
                employee_name: "Awa Diallo".to_string(),
                date: NaiveDate::from_ymd_opt(2026, 2, 14).unwrap(),
                shift: "Shift 0".to_string(),
                start_time: "06:00".to_string(),
                end_time: "14:00".to_string(),
                break_minutes: 0,
                batch_id: None,
                uploaded_by: None,
                notes: None,
            },
        ]
    }

    #[test]
    fn anchors_are_located_by_label() {
        let template = PresenceTemplate::from_reader(Cursor::new(template_buffer())).unwrap();
        let anchors = template.anchors();
        assert_eq!(anchors.provider, Some((2, 0)));
        assert_eq!(anchors.period, Some((3, 0)));
        assert_eq!(anchors.header_row, 5);
        assert_eq!(anchors.date_col, 0);
        assert_eq!(anchors.task_col, 1);
        assert_eq!(anchors.time_col, 2);
        assert_eq!(anchors.signature, Some((38, 0)));
        assert_eq!(anchors.day_rows, 31);
    }

    #[test]
    fn rendered_sheet_carries_header_days_and_signature() {
        let template = PresenceTemplate::from_reader(Cursor::new(template_buffer())).unwrap();
        let slots = month_grid(
            2026,
            2,
            &february_attendance(),
            &february_planning(),
            &Locale::french(),
        );

        let buffer = template
            .render("Diallo Awa", "Février 2026", &slots)
            .unwrap();
        let range = reopen(buffer);

        // Template text survives the copy.
        assert_eq!(cell_text(&range, 0, 0), "FEUILLE DE PRESENCE");
        // Header values land beside their labels.
        assert_eq!(cell_text(&range, 2, 1), "Diallo Awa");
        assert_eq!(cell_text(&range, 3, 1), "Février 2026");
        // Day 10 sits 10 rows under the header row.
        assert_eq!(cell_text(&range, 15, 0), "10 du mois");
        assert_eq!(cell_text(&range, 15, 1), WEEKDAY_TASK);
        assert_eq!(cell_text(&range, 15, 2), "06:05 - 14:10");
        // Day 14 is a planned Saturday.
        assert_eq!(cell_text(&range, 19, 0), "14 du mois (Samedi)");
        assert_eq!(cell_text(&range, 19, 1), WEEKEND_TASK);
        assert_eq!(cell_text(&range, 19, 2), "");
        // Past February's end the rows stay blank.
        assert_eq!(cell_text(&range, 35, 0), "");
        // Signature name goes under the bottom "Prestataire".
        assert_eq!(cell_text(&range, 39, 0), "Diallo Awa");
    }

    #[test]
    fn missing_header_column_is_a_layout_error() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(2, 0, "Prestataire").unwrap();
        sheet
            .write_string(3, 0, "Période objet de la facturation")
            .unwrap();
        sheet.write_string(5, 0, "Date").unwrap();
        sheet.write_string(5, 1, "Tâches et livrables").unwrap();
        sheet.write_string(38, 0, "Prestataire").unwrap();
        sheet
            .write_string(38, 2, "Responsable suivi de mission")
            .unwrap();
        let buffer = workbook.save_to_buffer().unwrap();

        match PresenceTemplate::from_reader(Cursor::new(buffer)) {
            Err(AppError::TemplateLayout(message)) => assert!(message.contains("Temps")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("header row should be mandatory"),
        }
    }

    #[test]
    fn empty_template_is_a_layout_error() {
        let mut workbook = Workbook::new();
        workbook.add_worksheet();
        let buffer = workbook.save_to_buffer().unwrap();

        match PresenceTemplate::from_reader(Cursor::new(buffer)) {
            Err(AppError::TemplateLayout(message)) => assert!(message.contains("empty")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("an empty sheet should be rejected"),
        }
    }

    #[test]
    fn missing_name_and_period_labels_skip_those_writes() {
        // Only the day-table header row and some body below it.
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(5, 0, "Date").unwrap();
        sheet.write_string(5, 1, "Tâches et livrables").unwrap();
        sheet.write_string(5, 2, "Temps").unwrap();
        sheet.write_string(40, 0, "Signatures").unwrap();
        let buffer = workbook.save_to_buffer().unwrap();

        let template = PresenceTemplate::from_reader(Cursor::new(buffer)).unwrap();
        let anchors = template.anchors();
        assert_eq!(anchors.provider, None);
        assert_eq!(anchors.period, None);
        assert_eq!(anchors.signature, None);
        assert_eq!(anchors.day_rows, 31);

        let slots = month_grid(
            2026,
            2,
            &february_attendance(),
            &february_planning(),
            &Locale::french(),
        );
        let range = reopen(template.render("Diallo Awa", "Février 2026", &slots).unwrap());

        // The day table fills even though the header fields had nowhere to go.
        assert_eq!(cell_text(&range, 15, 0), "10 du mois");
        assert_eq!(cell_text(&range, 15, 2), "06:05 - 14:10");
        assert_eq!(cell_text(&range, 2, 1), "");
        assert_eq!(cell_text(&range, 3, 1), "");
    }

    #[test]
    fn short_template_truncates_the_day_fill() {
        // Used range ends 10 rows below the header, so only days 1..=10 fit.
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(2, 0, "Prestataire").unwrap();
        sheet
            .write_string(3, 0, "Période objet de la facturation")
            .unwrap();
        sheet.write_string(5, 0, "Date").unwrap();
        sheet.write_string(5, 1, "Tâches et livrables").unwrap();
        sheet.write_string(5, 2, "Temps").unwrap();
        sheet.write_string(15, 3, "fin").unwrap();
        let buffer = workbook.save_to_buffer().unwrap();

        let template = PresenceTemplate::from_reader(Cursor::new(buffer)).unwrap();
        assert_eq!(template.anchors().day_rows, 10);

        let slots = month_grid(
            2026,
            2,
            &february_attendance(),
            &february_planning(),
            &Locale::french(),
        );
        let range = reopen(template.render("Diallo Awa", "Février 2026", &slots).unwrap());

        // Day 10 is the last row written; day 11 falls off the sheet.
        assert_eq!(cell_text(&range, 15, 0), "10 du mois");
        assert_eq!(cell_text(&range, 16, 0), "");
        assert_eq!(cell_text(&range, 19, 0), "");
    }
}
