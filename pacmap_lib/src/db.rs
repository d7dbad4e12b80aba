//! SQLite storage for the cleaned tables.

use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::types::{FromSql, Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, Transaction};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::codes::Coded;
use crate::names::ParsedName;
use crate::records::{
    Address, CandidateRecord, CleanTables, CommitteeRecord, ContributionRecord, ExpenditureRecord,
    TransferRecord,
};

const SCHEMA_VERSION: i32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("database schema version {found} is newer than supported version {supported}")]
    SchemaTooNew { found: i32, supported: i32 },
}

/// Row counts per stored table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub committees: i64,
    pub individuals: i64,
    pub expenditures: i64,
    pub candidates: i64,
    pub transfers: i64,
}

const COMMITTEE_COLUMNS: &str = "committee_id, committee_name, treasurer, \
    street1, street2, city, state, zip_primary, zip_secondary, \
    designation, designation_label, committee_type, committee_type_label, \
    party, party_label, frequency, frequency_label, category, category_label, \
    connection, candidate_id";

const INDIVIDUAL_COLUMNS: &str = "recipient_committee_id, \
    amendment_type, amendment_type_label, report_type, report_type_label, \
    election_type, election_type_label, image_number, \
    transaction_type, transaction_type_label, entity_type, entity_type_label, \
    raw_name, name_full, first_last, first_name, middle_name, last_name, \
    street1, street2, city, state, zip_primary, zip_secondary, \
    employer, occupation, transaction_date, amount, other_id, transaction_id, \
    report_id, memo_code, memo_text, recipient_name";

const CANDIDATE_COLUMNS: &str = "candidate_id, raw_name, \
    name_full, first_last, first_name, middle_name, last_name, \
    party, party_label, election_year, election_state, race, race_label, district, \
    incumbent_status, incumbent_status_label, statutory_status, statutory_status_label, \
    committee_id, street1, street2, city, state, zip_primary, zip_secondary, \
    committee_name";

const EXPENDITURE_COLUMNS: &str = "committee_id, amendment_type, amendment_type_label, \
    report_year, report_type, report_type_label, image_number, line_number, \
    form_type, schedule_type, raw_payee, \
    payee_name_full, payee_first_last, payee_first_name, payee_middle_name, payee_last_name, \
    street1, street2, city, state, zip_primary, zip_secondary, \
    transaction_date, amount, election_type, election_type_label, purpose, \
    category, category_label, category_description, memo_code, memo_text, \
    entity_type, entity_type_label, record_number, file_number, transaction_id, \
    back_reference, committee_name";

const TRANSFER_COLUMNS: &str = "recipient_committee_id, \
    amendment_type, amendment_type_label, report_type, report_type_label, \
    election_type, election_type_label, image_number, \
    transaction_type, transaction_type_label, entity_type, entity_type_label, \
    raw_sender, sender_name_full, sender_first_last, sender_first_name, \
    sender_middle_name, sender_last_name, \
    street1, street2, city, state, zip_primary, zip_secondary, \
    employer, occupation, transaction_date, amount, other_id, transaction_id, \
    file_number, memo_code, memo_text, committee_name, candidate_name, party";

pub struct Db {
    conn: Connection,
}

impl Db {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<(), DbError> {
        let version: i32 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;
        if version > SCHEMA_VERSION {
            return Err(DbError::SchemaTooNew {
                found: version,
                supported: SCHEMA_VERSION,
            });
        }

        let schema = include_str!("../../schema/sqlite.sql");
        self.conn.execute_batch(schema)?;

        if version < SCHEMA_VERSION {
            self.conn
                .pragma_update(None, "user_version", SCHEMA_VERSION)?;
        }
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<String>, DbError> {
        self.conn
            .query_row(
                "SELECT value FROM pipeline_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(DbError::from)
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO pipeline_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Store a serializable value (such as a run report) as JSON metadata.
    pub fn set_meta_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), DbError> {
        let json = serde_json::to_string(value)?;
        self.set_meta(key, &json)
    }

    /// Replace the contents of all five tables in one transaction.
    pub fn save_tables(&mut self, tables: &CleanTables) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        insert_all(&tx, "committees", COMMITTEE_COLUMNS, &tables.committees, committee_values)?;
        insert_all(&tx, "individuals", INDIVIDUAL_COLUMNS, &tables.individuals, individual_values)?;
        insert_all(&tx, "candidates", CANDIDATE_COLUMNS, &tables.candidates, candidate_values)?;
        insert_all(
            &tx,
            "expenditures",
            EXPENDITURE_COLUMNS,
            &tables.expenditures,
            expenditure_values,
        )?;
        insert_all(&tx, "transfers", TRANSFER_COLUMNS, &tables.transfers, transfer_values)?;
        tx.commit()?;

        tracing::info!("Saved {} rows to database", tables.total_rows());
        Ok(())
    }

    /// Read all five tables back in insertion order.
    pub fn load_tables(&self) -> Result<CleanTables, DbError> {
        Ok(CleanTables {
            committees: self.load_all("committees", COMMITTEE_COLUMNS, committee_from_row)?,
            individuals: self.load_all("individuals", INDIVIDUAL_COLUMNS, individual_from_row)?,
            expenditures: self.load_all(
                "expenditures",
                EXPENDITURE_COLUMNS,
                expenditure_from_row,
            )?,
            candidates: self.load_all("candidates", CANDIDATE_COLUMNS, candidate_from_row)?,
            transfers: self.load_all("transfers", TRANSFER_COLUMNS, transfer_from_row)?,
        })
    }

    pub fn table_counts(&self) -> Result<TableCounts, DbError> {
        Ok(TableCounts {
            committees: self.count("committees")?,
            individuals: self.count("individuals")?,
            expenditures: self.count("expenditures")?,
            candidates: self.count("candidates")?,
            transfers: self.count("transfers")?,
        })
    }

    fn count(&self, table: &str) -> Result<i64, DbError> {
        let sql = format!("SELECT COUNT(1) FROM {}", table);
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count)
    }

    fn load_all<T>(
        &self,
        table: &str,
        columns: &str,
        from_row: fn(&mut Columns<'_, '_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>, DbError> {
        let sql = format!("SELECT {} FROM {} ORDER BY row_id", columns, table);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| from_row(&mut Columns::new(row)))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }
}

fn insert_all<T>(
    tx: &Transaction<'_>,
    table: &str,
    columns: &str,
    rows: &[T],
    to_values: fn(&T) -> Values,
) -> Result<(), DbError> {
    tx.execute(&format!("DELETE FROM {}", table), [])?;

    let placeholders = (1..=columns.split(',').count())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("INSERT INTO {} ({}) VALUES ({})", table, columns, placeholders);
    let mut stmt = tx.prepare(&sql)?;
    for row in rows {
        stmt.execute(params_from_iter(to_values(row).0))?;
    }
    Ok(())
}

/// Positional SQL values for one row.
#[derive(Default)]
struct Values(Vec<Value>);

impl Values {
    fn text(&mut self, value: &str) -> &mut Self {
        self.0.push(Value::Text(value.to_string()));
        self
    }

    fn opt(&mut self, value: &Option<String>) -> &mut Self {
        self.0.push(match value {
            Some(v) => Value::Text(v.clone()),
            None => Value::Null,
        });
        self
    }

    fn int(&mut self, value: Option<i32>) -> &mut Self {
        self.0.push(match value {
            Some(v) => Value::Integer(i64::from(v)),
            None => Value::Null,
        });
        self
    }

    fn coded(&mut self, value: &Coded) -> &mut Self {
        self.opt(&value.code).opt(&value.label)
    }

    fn name(&mut self, name: &ParsedName) -> &mut Self {
        self.text(&name.name_full)
            .text(&name.first_last)
            .text(&name.first)
            .text(&name.middle)
            .text(&name.last)
    }

    fn address(&mut self, address: &Address) -> &mut Self {
        self.opt(&address.street1)
            .opt(&address.street2)
            .opt(&address.city)
            .opt(&address.state)
            .opt(&address.zip_primary)
            .opt(&address.zip_secondary)
    }

    fn date(&mut self, value: Option<NaiveDate>) -> &mut Self {
        self.opt(&value.map(|d| d.format("%Y-%m-%d").to_string()))
    }

    fn amount(&mut self, value: Decimal) -> &mut Self {
        self.text(&value.to_string())
    }
}

/// Sequential column reader over one result row.
struct Columns<'a, 'stmt> {
    row: &'a Row<'stmt>,
    idx: usize,
}

impl<'a, 'stmt> Columns<'a, 'stmt> {
    fn new(row: &'a Row<'stmt>) -> Self {
        Self { row, idx: 0 }
    }

    fn get<T: FromSql>(&mut self) -> rusqlite::Result<T> {
        let value = self.row.get(self.idx)?;
        self.idx += 1;
        Ok(value)
    }

    fn text(&mut self) -> rusqlite::Result<String> {
        self.get()
    }

    fn opt(&mut self) -> rusqlite::Result<Option<String>> {
        self.get()
    }

    fn int(&mut self) -> rusqlite::Result<Option<i32>> {
        self.get()
    }

    fn coded(&mut self) -> rusqlite::Result<Coded> {
        Ok(Coded {
            code: self.opt()?,
            label: self.opt()?,
        })
    }

    fn name(&mut self) -> rusqlite::Result<ParsedName> {
        Ok(ParsedName {
            name_full: self.text()?,
            first_last: self.text()?,
            first: self.text()?,
            middle: self.text()?,
            last: self.text()?,
        })
    }

    fn address(&mut self) -> rusqlite::Result<Address> {
        Ok(Address {
            street1: self.opt()?,
            street2: self.opt()?,
            city: self.opt()?,
            state: self.opt()?,
            zip_primary: self.opt()?,
            zip_secondary: self.opt()?,
        })
    }

    fn date(&mut self) -> rusqlite::Result<Option<NaiveDate>> {
        let idx = self.idx;
        match self.opt()? {
            Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .map(Some)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
            None => Ok(None),
        }
    }

    fn amount(&mut self) -> rusqlite::Result<Decimal> {
        let idx = self.idx;
        let raw = self.text()?;
        Decimal::from_str(&raw)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    }
}

fn committee_values(r: &CommitteeRecord) -> Values {
    let mut v = Values::default();
    v.text(&r.committee_id)
        .text(&r.committee_name)
        .opt(&r.treasurer)
        .address(&r.address)
        .coded(&r.designation)
        .coded(&r.committee_type)
        .coded(&r.party)
        .coded(&r.frequency)
        .coded(&r.category)
        .opt(&r.connection)
        .opt(&r.candidate_id);
    v
}

fn committee_from_row(c: &mut Columns<'_, '_>) -> rusqlite::Result<CommitteeRecord> {
    Ok(CommitteeRecord {
        committee_id: c.text()?,
        committee_name: c.text()?,
        treasurer: c.opt()?,
        address: c.address()?,
        designation: c.coded()?,
        committee_type: c.coded()?,
        party: c.coded()?,
        frequency: c.coded()?,
        category: c.coded()?,
        connection: c.opt()?,
        candidate_id: c.opt()?,
    })
}

fn individual_values(r: &ContributionRecord) -> Values {
    let mut v = Values::default();
    v.text(&r.recipient_committee_id)
        .coded(&r.amendment_type)
        .coded(&r.report_type)
        .coded(&r.election_type)
        .opt(&r.image_number)
        .coded(&r.transaction_type)
        .coded(&r.entity_type)
        .text(&r.raw_name)
        .name(&r.name)
        .address(&r.address)
        .opt(&r.employer)
        .opt(&r.occupation)
        .date(r.date)
        .amount(r.amount)
        .opt(&r.other_id)
        .opt(&r.transaction_id)
        .opt(&r.report_id)
        .opt(&r.memo_code)
        .opt(&r.memo_text)
        .opt(&r.recipient_name);
    v
}

fn individual_from_row(c: &mut Columns<'_, '_>) -> rusqlite::Result<ContributionRecord> {
    Ok(ContributionRecord {
        recipient_committee_id: c.text()?,
        amendment_type: c.coded()?,
        report_type: c.coded()?,
        election_type: c.coded()?,
        image_number: c.opt()?,
        transaction_type: c.coded()?,
        entity_type: c.coded()?,
        raw_name: c.text()?,
        name: c.name()?,
        address: c.address()?,
        employer: c.opt()?,
        occupation: c.opt()?,
        date: c.date()?,
        amount: c.amount()?,
        other_id: c.opt()?,
        transaction_id: c.opt()?,
        report_id: c.opt()?,
        memo_code: c.opt()?,
        memo_text: c.opt()?,
        recipient_name: c.opt()?,
    })
}

fn candidate_values(r: &CandidateRecord) -> Values {
    let mut v = Values::default();
    v.text(&r.candidate_id)
        .text(&r.raw_name)
        .name(&r.name)
        .coded(&r.party)
        .int(r.election_year)
        .opt(&r.election_state)
        .coded(&r.race)
        .opt(&r.district)
        .coded(&r.incumbent_status)
        .coded(&r.statutory_status)
        .opt(&r.committee_id)
        .address(&r.address)
        .opt(&r.committee_name);
    v
}

fn candidate_from_row(c: &mut Columns<'_, '_>) -> rusqlite::Result<CandidateRecord> {
    Ok(CandidateRecord {
        candidate_id: c.text()?,
        raw_name: c.text()?,
        name: c.name()?,
        party: c.coded()?,
        election_year: c.int()?,
        election_state: c.opt()?,
        race: c.coded()?,
        district: c.opt()?,
        incumbent_status: c.coded()?,
        statutory_status: c.coded()?,
        committee_id: c.opt()?,
        address: c.address()?,
        committee_name: c.opt()?,
    })
}

fn expenditure_values(r: &ExpenditureRecord) -> Values {
    let mut v = Values::default();
    v.text(&r.committee_id)
        .coded(&r.amendment_type)
        .int(r.report_year)
        .coded(&r.report_type)
        .opt(&r.image_number)
        .opt(&r.line_number)
        .opt(&r.form_type)
        .opt(&r.schedule_type)
        .text(&r.raw_payee)
        .name(&r.payee)
        .address(&r.address)
        .date(r.date)
        .amount(r.amount)
        .coded(&r.election_type)
        .opt(&r.purpose)
        .coded(&r.category)
        .opt(&r.category_description)
        .opt(&r.memo_code)
        .opt(&r.memo_text)
        .coded(&r.entity_type)
        .opt(&r.record_number)
        .opt(&r.file_number)
        .opt(&r.transaction_id)
        .opt(&r.back_reference)
        .opt(&r.committee_name);
    v
}

fn expenditure_from_row(c: &mut Columns<'_, '_>) -> rusqlite::Result<ExpenditureRecord> {
    Ok(ExpenditureRecord {
        committee_id: c.text()?,
        amendment_type: c.coded()?,
        report_year: c.int()?,
        report_type: c.coded()?,
        image_number: c.opt()?,
        line_number: c.opt()?,
        form_type: c.opt()?,
        schedule_type: c.opt()?,
        raw_payee: c.text()?,
        payee: c.name()?,
        address: c.address()?,
        date: c.date()?,
        amount: c.amount()?,
        election_type: c.coded()?,
        purpose: c.opt()?,
        category: c.coded()?,
        category_description: c.opt()?,
        memo_code: c.opt()?,
        memo_text: c.opt()?,
        entity_type: c.coded()?,
        record_number: c.opt()?,
        file_number: c.opt()?,
        transaction_id: c.opt()?,
        back_reference: c.opt()?,
        committee_name: c.opt()?,
    })
}

fn transfer_values(r: &TransferRecord) -> Values {
    let mut v = Values::default();
    v.text(&r.recipient_committee_id)
        .coded(&r.amendment_type)
        .coded(&r.report_type)
        .coded(&r.election_type)
        .opt(&r.image_number)
        .coded(&r.transaction_type)
        .coded(&r.entity_type)
        .text(&r.raw_sender)
        .name(&r.sender_name)
        .address(&r.address)
        .opt(&r.employer)
        .opt(&r.occupation)
        .date(r.date)
        .amount(r.amount)
        .opt(&r.other_id)
        .opt(&r.transaction_id)
        .opt(&r.file_number)
        .opt(&r.memo_code)
        .opt(&r.memo_text)
        .opt(&r.committee_name)
        .opt(&r.candidate_name)
        .opt(&r.party);
    v
}

fn transfer_from_row(c: &mut Columns<'_, '_>) -> rusqlite::Result<TransferRecord> {
    Ok(TransferRecord {
        recipient_committee_id: c.text()?,
        amendment_type: c.coded()?,
        report_type: c.coded()?,
        election_type: c.coded()?,
        image_number: c.opt()?,
        transaction_type: c.coded()?,
        entity_type: c.coded()?,
        raw_sender: c.text()?,
        sender_name: c.name()?,
        address: c.address()?,
        employer: c.opt()?,
        occupation: c.opt()?,
        date: c.date()?,
        amount: c.amount()?,
        other_id: c.opt()?,
        transaction_id: c.opt()?,
        file_number: c.opt()?,
        memo_code: c.opt()?,
        memo_text: c.opt()?,
        committee_name: c.opt()?,
        candidate_name: c.opt()?,
        party: c.opt()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn open_test_db() -> Db {
        let db = Db::open_in_memory().expect("open in-memory db");
        db.init().expect("init schema");
        db
    }

    fn coded(code: &str, label: &str) -> Coded {
        Coded {
            code: Some(code.to_string()),
            label: Some(label.to_string()),
        }
    }

    fn address() -> Address {
        Address {
            street1: Some("1 Main St".to_string()),
            street2: None,
            city: Some("Philadelphia".to_string()),
            state: Some("PA".to_string()),
            zip_primary: Some("19103".to_string()),
            zip_secondary: Some("1234".to_string()),
        }
    }

    fn person() -> ParsedName {
        ParsedName {
            name_full: "John A Smith".to_string(),
            first_last: "John Smith".to_string(),
            first: "John".to_string(),
            middle: "A".to_string(),
            last: "Smith".to_string(),
        }
    }

    fn sample_tables() -> CleanTables {
        CleanTables {
            committees: vec![CommitteeRecord {
                committee_id: "C001".to_string(),
                committee_name: "ACTBLUE".to_string(),
                treasurer: Some("Jane Doe".to_string()),
                address: address(),
                designation: coded("U", "Unauthorized"),
                committee_type: coded("V", "PAC with Non-Contribution Account - Nonqualified"),
                party: Coded::default(),
                frequency: coded("M", "Monthly filer"),
                category: Coded {
                    code: Some("Z".to_string()),
                    label: None,
                },
                connection: None,
                candidate_id: None,
            }],
            individuals: vec![ContributionRecord {
                recipient_committee_id: "C001".to_string(),
                amendment_type: coded("N", "New"),
                election_type: coded("P2020", "Primary"),
                entity_type: coded("IND", "Individual"),
                raw_name: "SMITH, JOHN A".to_string(),
                name: person(),
                address: address(),
                employer: Some("Acme".to_string()),
                date: NaiveDate::from_ymd_opt(2020, 1, 15),
                amount: dec!(1234.50),
                recipient_name: Some("ACTBLUE".to_string()),
                ..Default::default()
            }],
            expenditures: vec![ExpenditureRecord {
                committee_id: "C001".to_string(),
                report_year: Some(2020),
                raw_payee: "STAPLES".to_string(),
                payee: ParsedName::organization("Staples"),
                amount: dec!(-45.10),
                date: None,
                category: coded("001", "Administrative/Salary/Overhead Expenses"),
                ..Default::default()
            }],
            candidates: vec![CandidateRecord {
                candidate_id: "H001".to_string(),
                raw_name: "SMITH, JOHN A".to_string(),
                name: person(),
                party: coded("DEM", "Democratic Party"),
                election_year: Some(2020),
                committee_id: Some("C001".to_string()),
                committee_name: Some("ACTBLUE".to_string()),
                ..Default::default()
            }],
            transfers: vec![TransferRecord {
                recipient_committee_id: "C001".to_string(),
                raw_sender: "DOE FOR CONGRESS".to_string(),
                sender_name: ParsedName::organization("Doe For Congress"),
                amount: dec!(5000),
                date: NaiveDate::from_ymd_opt(2020, 6, 1),
                party: Some("Unresolved".to_string()),
                ..Default::default()
            }],
        }
    }

    #[test]
    fn test_init_sets_user_version() {
        let db = open_test_db();
        let version: i32 = db
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
        // Second init is a no-op.
        db.init().unwrap();
    }

    #[test]
    fn test_newer_schema_rejected() {
        let db = Db::open_in_memory().unwrap();
        db.conn
            .pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .unwrap();
        assert!(matches!(db.init(), Err(DbError::SchemaTooNew { .. })));
    }

    #[test]
    fn test_roundtrip_preserves_values() {
        let mut db = open_test_db();
        let tables = sample_tables();
        db.save_tables(&tables).unwrap();
        let loaded = db.load_tables().unwrap();
        assert_eq!(loaded, tables);
        assert_eq!(loaded.individuals[0].amount.to_string(), "1234.50");
    }

    #[test]
    fn test_save_replaces_previous_rows() {
        let mut db = open_test_db();
        let tables = sample_tables();
        db.save_tables(&tables).unwrap();
        db.save_tables(&tables).unwrap();
        let counts = db.table_counts().unwrap();
        assert_eq!(counts.individuals, 1);
        assert_eq!(counts.transfers, 1);
    }

    #[test]
    fn test_load_preserves_order() {
        let mut db = open_test_db();
        let mut tables = CleanTables::default();
        for id in ["C003", "C001", "C002"] {
            tables.committees.push(CommitteeRecord {
                committee_id: id.to_string(),
                committee_name: format!("Committee {}", id),
                ..Default::default()
            });
        }
        db.save_tables(&tables).unwrap();
        let ids: Vec<String> = db
            .load_tables()
            .unwrap()
            .committees
            .into_iter()
            .map(|c| c.committee_id)
            .collect();
        assert_eq!(ids, vec!["C003", "C001", "C002"]);
    }

    #[test]
    fn test_meta_roundtrip() {
        let db = open_test_db();
        assert_eq!(db.get_meta("last_run").unwrap(), None);
        db.set_meta("last_run", "a").unwrap();
        db.set_meta("last_run", "b").unwrap();
        assert_eq!(db.get_meta("last_run").unwrap().as_deref(), Some("b"));

        db.set_meta_json("counts", &TableCounts::default()).unwrap();
        let json = db.get_meta("counts").unwrap().unwrap();
        assert!(json.contains("\"committees\":0"));
    }

    #[test]
    fn test_column_lists_match_schema() {
        let db = open_test_db();
        for (table, columns) in [
            ("committees", COMMITTEE_COLUMNS),
            ("individuals", INDIVIDUAL_COLUMNS),
            ("candidates", CANDIDATE_COLUMNS),
            ("expenditures", EXPENDITURE_COLUMNS),
            ("transfers", TRANSFER_COLUMNS),
        ] {
            let sql = format!("PRAGMA table_info({})", table);
            let mut stmt = db.conn.prepare(&sql).unwrap();
            let names: Vec<String> = stmt
                .query_map([], |row| row.get::<_, String>(1))
                .unwrap()
                .map(|r| r.unwrap())
                .filter(|n| n != "row_id")
                .collect();
            let expected: Vec<String> =
                columns.split(',').map(|c| c.trim().to_string()).collect();
            assert_eq!(names, expected, "{}", table);
        }
    }
}
