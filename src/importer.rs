use std::path::Path;

use sha2::{Digest, Sha256};

use crate::db::{Store, MEMBERS};
use crate::error::{FieldError, Result, TentlyError};
use crate::members::{self, MemberForm};
use crate::models::{Member, MemberStatus};

fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

// ---------------------------------------------------------------------------
// Source formats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceFormat {
    Csv,
    #[cfg(feature = "xlsx")]
    Xlsx,
}

impl SourceFormat {
    pub fn for_path(file_path: &Path) -> Result<Self> {
        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            #[cfg(feature = "xlsx")]
            "xlsx" | "xls" => Ok(Self::Xlsx),
            _ => Err(TentlyError::UnsupportedFormat(file_path.display().to_string())),
        }
    }

    /// Every row of the file as trimmed cell text, header row included.
    fn read_rows(&self, file_path: &Path) -> Result<Vec<Vec<String>>> {
        match self {
            Self::Csv => read_csv_rows(file_path),
            #[cfg(feature = "xlsx")]
            Self::Xlsx => read_xlsx_rows(file_path),
        }
    }
}

fn read_csv_rows(file_path: &Path) -> Result<Vec<Vec<String>>> {
    let file = std::fs::File::open(file_path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(|f| f.trim().to_string()).collect());
    }
    Ok(rows)
}

#[cfg(feature = "xlsx")]
fn read_xlsx_rows(file_path: &Path) -> Result<Vec<Vec<String>>> {
    use calamine::{Data, Reader};

    let mut workbook = calamine::open_workbook_auto(file_path)
        .map_err(|e| TentlyError::Other(format!("Failed to open workbook: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| TentlyError::Other("Workbook has no sheets".into()))?
        .map_err(|e| TentlyError::Other(format!("Failed to read sheet: {e}")))?;

    let cell_text = |cell: &Data| match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        _ => String::new(),
    };
    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

// ---------------------------------------------------------------------------
// Header mapping
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Columns {
    id: Option<usize>,
    first_name: Option<usize>,
    last_name: Option<usize>,
    email: Option<usize>,
    role: Option<usize>,
    phone: Option<usize>,
    status: Option<usize>,
}

impl Columns {
    fn from_header(header: &[String]) -> Result<Self> {
        let mut cols = Columns::default();
        for (i, name) in header.iter().enumerate() {
            let key: String = name
                .chars()
                .filter(|c| !matches!(c, ' ' | '_' | '-'))
                .collect::<String>()
                .to_lowercase();
            let slot = match key.as_str() {
                "id" => &mut cols.id,
                "firstname" => &mut cols.first_name,
                "lastname" => &mut cols.last_name,
                "email" => &mut cols.email,
                "role" => &mut cols.role,
                "phone" => &mut cols.phone,
                "status" => &mut cols.status,
                _ => continue,
            };
            slot.get_or_insert(i);
        }
        let missing: Vec<&str> = [
            ("first_name", cols.first_name),
            ("last_name", cols.last_name),
            ("email", cols.email),
            ("role", cols.role),
        ]
        .iter()
        .filter(|(_, idx)| idx.is_none())
        .map(|(name, _)| *name)
        .collect();
        if !missing.is_empty() {
            return Err(TentlyError::Other(format!(
                "Missing required column(s): {}",
                missing.join(", ")
            )));
        }
        Ok(cols)
    }

    fn cell(row: &[String], idx: Option<usize>) -> Option<String> {
        idx.and_then(|i| row.get(i))
            .filter(|v| !v.is_empty())
            .cloned()
    }

    fn form(&self, row: &[String]) -> std::result::Result<MemberForm, Vec<FieldError>> {
        let status = match Self::cell(row, self.status) {
            Some(raw) => Some(
                raw.parse::<MemberStatus>()
                    .map_err(|e| vec![FieldError::new("status", e.to_string())])?,
            ),
            None => None,
        };
        Ok(MemberForm {
            first_name: Self::cell(row, self.first_name),
            last_name: Self::cell(row, self.last_name),
            email: Self::cell(row, self.email),
            role: Self::cell(row, self.role),
            phone: Self::cell(row, self.phone),
            status,
            ..MemberForm::default()
        })
    }
}

// ---------------------------------------------------------------------------
// import_file
// ---------------------------------------------------------------------------

/// A row that failed validation. `line` is 1-based and counts the header.
#[derive(Debug)]
pub struct RejectedRow {
    pub line: usize,
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Default)]
pub struct ImportResult {
    pub imported: usize,
    /// Rows whose email already belongs to a member.
    pub skipped: usize,
    pub rejected: Vec<RejectedRow>,
}

pub fn import_file(store: &Store, file_path: &Path) -> Result<ImportResult> {
    let format = SourceFormat::for_path(file_path)?;
    let filename = file_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_string();

    let checksum = compute_checksum(file_path)?;
    if store.import_seen(&checksum)? {
        return Err(TentlyError::DuplicateImport(filename));
    }

    let rows = format.read_rows(file_path)?;
    let Some((header, body)) = rows.split_first() else {
        return Err(TentlyError::Other(format!("{filename} is empty")));
    };
    let columns = Columns::from_header(header)?;

    let mut members: Vec<Member> = members::list(store)?;
    let mut result = ImportResult::default();
    for (i, row) in body.iter().enumerate() {
        let line = i + 2;
        if row.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        let built = columns
            .form(row)
            .and_then(|form| members::build(&form, Columns::cell(row, columns.id).as_deref(), &members));
        match built {
            Ok(member) => {
                if members.iter().any(|m| m.email.eq_ignore_ascii_case(&member.email)) {
                    result.skipped += 1;
                    continue;
                }
                members.push(member);
                result.imported += 1;
            }
            Err(errors) => {
                tracing::debug!(line, "rejected import row");
                result.rejected.push(RejectedRow { line, errors });
            }
        }
    }

    store.put_json(MEMBERS, &members)?;
    store.record_import(&filename, result.imported, &checksum)?;
    tracing::info!(
        file = %filename,
        imported = result.imported,
        skipped = result.skipped,
        rejected = result.rejected.len(),
        "import finished"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_store;

    fn write_csv(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_import_members_csv() {
        let (dir, store) = test_store();
        let path = write_csv(
            dir.path(),
            "members.csv",
            "First Name,Last_Name,Email,Role,Status\n\
             Grace,Molero,grace@coop.ng,Treasurer,active\n\
             Bryan,Edwards,bryan@coop.ng,Secretary,\n",
        );
        let result = import_file(&store, &path).unwrap();
        assert_eq!(result.imported, 2);
        assert!(result.rejected.is_empty());

        let all = members::list(&store).unwrap();
        assert_eq!(all[0].status, MemberStatus::Active);
        assert_eq!(all[1].status, MemberStatus::New);
        assert_ne!(all[0].id, all[1].id);
        assert_eq!(store.import_count().unwrap(), 1);
    }

    #[test]
    fn test_invalid_rows_are_reported_and_skipped() {
        let (dir, store) = test_store();
        let path = write_csv(
            dir.path(),
            "members.csv",
            "firstname,lastname,email,role\n\
             Grace,Molero,grace@coop.ng,Treasurer\n\
             ,Edwards,bryan-at-coop,Secretary\n\
             ,,,\n",
        );
        let result = import_file(&store, &path).unwrap();
        assert_eq!(result.imported, 1);
        assert_eq!(result.rejected.len(), 1);
        assert_eq!(result.rejected[0].line, 3);
        let fields: Vec<&str> = result.rejected[0].errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["firstName", "email"]);
    }

    #[test]
    fn test_existing_email_is_skipped() {
        let (dir, store) = test_store();
        let first = write_csv(
            dir.path(),
            "a.csv",
            "first_name,last_name,email,role\nGrace,Molero,grace@coop.ng,Treasurer\n",
        );
        import_file(&store, &first).unwrap();
        let second = write_csv(
            dir.path(),
            "b.csv",
            "first_name,last_name,email,role\n\
             Grace,Molero,GRACE@coop.ng,Treasurer\n\
             Ada,Obi,ada@coop.ng,President\n",
        );
        let result = import_file(&store, &second).unwrap();
        assert_eq!(result.imported, 1);
        assert_eq!(result.skipped, 1);
    }

    #[test]
    fn test_same_file_twice_is_rejected() {
        let (dir, store) = test_store();
        let path = write_csv(
            dir.path(),
            "members.csv",
            "first_name,last_name,email,role\nGrace,Molero,grace@coop.ng,Treasurer\n",
        );
        import_file(&store, &path).unwrap();
        let err = import_file(&store, &path).unwrap_err();
        assert!(matches!(err, TentlyError::DuplicateImport(_)));
        assert_eq!(members::list(&store).unwrap().len(), 1);
    }

    #[test]
    fn test_supplied_id_is_kept() {
        let (dir, store) = test_store();
        let path = write_csv(
            dir.path(),
            "members.csv",
            "id,first_name,last_name,email,role\nSG0042,Grace,Molero,grace@coop.ng,Treasurer\n",
        );
        import_file(&store, &path).unwrap();
        assert!(members::get(&store, "SG0042").is_ok());
    }

    #[test]
    fn test_missing_columns() {
        let (dir, store) = test_store();
        let path = write_csv(dir.path(), "members.csv", "first_name,email\nGrace,grace@coop.ng\n");
        let err = import_file(&store, &path).unwrap_err();
        assert!(err.to_string().contains("last_name, role"));
    }

    #[test]
    fn test_unsupported_extension() {
        let (dir, store) = test_store();
        let path = write_csv(dir.path(), "members.txt", "whatever");
        assert!(matches!(
            import_file(&store, &path),
            Err(TentlyError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_bad_status_is_a_row_error() {
        let (dir, store) = test_store();
        let path = write_csv(
            dir.path(),
            "members.csv",
            "first_name,last_name,email,role,status\nGrace,Molero,grace@coop.ng,Treasurer,archived\n",
        );
        let result = import_file(&store, &path).unwrap();
        assert_eq!(result.imported, 0);
        assert_eq!(result.rejected[0].errors[0].field, "status");
    }
}
