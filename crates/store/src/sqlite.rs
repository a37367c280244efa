//! SQLite repository implementation.
//!
//! Schema:
//! - `investors`: root entity; both public-key columns are nullable and
//!   unique, so each key namespace maps onto at most one investor
//! - `revenue_periods`: one row per settlement unit, UNIQUE(month, year)
//! - `payouts`: one row per (investor, period), status mutated only by the
//!   external settlement process
//!
//! A settlement (period plus its whole payout set) commits in a single
//! transaction; a duplicate period aborts the transaction and surfaces as
//! `StoreError::Conflict` with nothing persisted.

use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

use capstream_core::time::unix_now;
use capstream_domain::{
    Investor, InvestorDirectory, InvestorId, InvestorUpdate, KeyKind, NewInvestor, NewPayout,
    NewRevenuePeriod, Payout, PayoutDetail, PayoutStatus, RevenuePeriod, SettlementLedger,
    StoreError, StoreResult,
};

/// SQLite-backed store implementing both repository traits.
///
/// The connection sits behind a mutex: rusqlite connections are not
/// shareable across threads, and the serialization also gives every
/// repository call single-logical-operation semantics.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create or open a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(db_err)?;

        conn.pragma_update(None, "journal_mode", "WAL").map_err(db_err)?;
        conn.pragma_update(None, "synchronous", "NORMAL").map_err(db_err)?;
        conn.pragma_update(None, "foreign_keys", "ON").map_err(db_err)?;

        Self::init_schema(&conn)?;

        info!(path = %path.display(), "store opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> StoreResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS investors (
                id TEXT PRIMARY KEY,
                assertion_key TEXT UNIQUE,
                account_key TEXT UNIQUE,
                name TEXT,
                email TEXT,
                investment_amount REAL NOT NULL,
                investment_date TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS revenue_periods (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                month TEXT NOT NULL,
                year INTEGER NOT NULL,
                total_revenue REAL NOT NULL,
                investor_share_percentage REAL NOT NULL,
                total_investor_payout REAL NOT NULL,
                created_at INTEGER NOT NULL,
                UNIQUE(month, year)
            );

            CREATE TABLE IF NOT EXISTS payouts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                investor_id TEXT NOT NULL REFERENCES investors(id),
                revenue_period_id INTEGER NOT NULL REFERENCES revenue_periods(id),
                amount REAL NOT NULL,
                share_percentage REAL NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                settlement_ref TEXT,
                created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_payouts_investor ON payouts(investor_id);
            CREATE INDEX IF NOT EXISTS idx_payouts_period ON payouts(revenue_period_id);
            "#,
        )
        .map_err(db_err)?;

        Ok(())
    }
}

impl InvestorDirectory for SqliteStore {
    fn investor_by_key(&self, kind: KeyKind, key: &str) -> StoreResult<Option<Investor>> {
        let column = match kind {
            KeyKind::Assertion => "assertion_key",
            KeyKind::Account => "account_key",
        };
        let conn = self.conn.lock().map_err(lock_err)?;
        let sql = format!("{INVESTOR_SELECT} WHERE {column} = ?1");
        conn.query_row(&sql, [key], investor_from_row)
            .optional()
            .map_err(db_err)
    }

    fn investor_by_id(&self, id: &InvestorId) -> StoreResult<Option<Investor>> {
        let conn = self.conn.lock().map_err(lock_err)?;
        let sql = format!("{INVESTOR_SELECT} WHERE id = ?1");
        conn.query_row(&sql, [id.as_str()], investor_from_row)
            .optional()
            .map_err(db_err)
    }

    fn list_investors(&self) -> StoreResult<Vec<Investor>> {
        let conn = self.conn.lock().map_err(lock_err)?;
        let sql = format!("{INVESTOR_SELECT} ORDER BY rowid");
        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let investors = stmt
            .query_map([], investor_from_row)
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;
        Ok(investors)
    }

    fn create_investor(&self, investor: NewInvestor) -> StoreResult<Investor> {
        investor.validate().map_err(StoreError::Validation)?;

        let record = Investor {
            id: InvestorId::generate(),
            assertion_key: investor.assertion_key,
            account_key: investor.account_key,
            name: investor.name,
            email: investor.email,
            investment_amount: investor.investment_amount,
            investment_date: investor.investment_date,
            created_at: unix_now(),
        };

        let conn = self.conn.lock().map_err(lock_err)?;
        conn.execute(
            r#"
            INSERT INTO investors (
                id, assertion_key, account_key, name, email,
                investment_amount, investment_date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                record.id.as_str(),
                record.assertion_key,
                record.account_key,
                record.name,
                record.email,
                record.investment_amount,
                record.investment_date,
                record.created_at as i64,
            ],
        )
        .map_err(db_err)?;

        debug!(investor_id = %record.id, "investor created");
        Ok(record)
    }

    fn update_investor(&self, id: &InvestorId, update: InvestorUpdate) -> StoreResult<Investor> {
        let mut conn = self.conn.lock().map_err(lock_err)?;
        let tx = conn.transaction().map_err(db_err)?;

        let sql = format!("{INVESTOR_SELECT} WHERE id = ?1");
        let mut investor = tx
            .query_row(&sql, [id.as_str()], investor_from_row)
            .optional()
            .map_err(db_err)?
            .ok_or_else(|| StoreError::NotFound(format!("investor {id}")))?;

        if let Some(name) = update.name {
            investor.name = Some(name);
        }
        if let Some(email) = update.email {
            investor.email = Some(email);
        }
        if let Some(amount) = update.investment_amount {
            if !(amount > 0.0) {
                return Err(StoreError::Validation(
                    "investment_amount must be positive".to_string(),
                ));
            }
            investor.investment_amount = amount;
        }
        if let Some(date) = update.investment_date {
            investor.investment_date = date;
        }

        tx.execute(
            r#"
            UPDATE investors
            SET name = ?2, email = ?3, investment_amount = ?4, investment_date = ?5
            WHERE id = ?1
            "#,
            params![
                investor.id.as_str(),
                investor.name,
                investor.email,
                investor.investment_amount,
                investor.investment_date,
            ],
        )
        .map_err(db_err)?;
        tx.commit().map_err(db_err)?;

        Ok(investor)
    }
}

impl SettlementLedger for SqliteStore {
    fn find_revenue_period(&self, month: &str, year: i32) -> StoreResult<Option<RevenuePeriod>> {
        let conn = self.conn.lock().map_err(lock_err)?;
        let sql = format!("{PERIOD_SELECT} WHERE month = ?1 AND year = ?2");
        conn.query_row(&sql, params![month, year], period_from_row)
            .optional()
            .map_err(db_err)
    }

    fn list_revenue_periods(&self) -> StoreResult<Vec<RevenuePeriod>> {
        let conn = self.conn.lock().map_err(lock_err)?;
        let sql = format!("{PERIOD_SELECT} ORDER BY year DESC, id DESC");
        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let periods = stmt
            .query_map([], period_from_row)
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;
        Ok(periods)
    }

    fn record_settlement(
        &self,
        period: NewRevenuePeriod,
        payouts: Vec<NewPayout>,
    ) -> StoreResult<(RevenuePeriod, Vec<Payout>)> {
        let mut conn = self.conn.lock().map_err(lock_err)?;
        let tx = conn.transaction().map_err(db_err)?;
        let created_at = unix_now();

        tx.execute(
            r#"
            INSERT INTO revenue_periods (
                month, year, total_revenue, investor_share_percentage,
                total_investor_payout, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                period.month,
                period.year,
                period.total_revenue,
                period.investor_share_percentage,
                period.total_investor_payout,
                created_at as i64,
            ],
        )
        .map_err(db_err)?;
        let period_id = tx.last_insert_rowid();

        let mut stored_payouts = Vec::with_capacity(payouts.len());
        for payout in payouts {
            tx.execute(
                r#"
                INSERT INTO payouts (
                    investor_id, revenue_period_id, amount, share_percentage,
                    status, settlement_ref, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6)
                "#,
                params![
                    payout.investor_id.as_str(),
                    period_id,
                    payout.amount,
                    payout.share_percentage,
                    PayoutStatus::Pending.as_str(),
                    created_at as i64,
                ],
            )
            .map_err(db_err)?;

            stored_payouts.push(Payout {
                id: tx.last_insert_rowid(),
                investor_id: payout.investor_id,
                revenue_period_id: period_id,
                amount: payout.amount,
                share_percentage: payout.share_percentage,
                status: PayoutStatus::Pending,
                settlement_ref: None,
                created_at,
            });
        }

        tx.commit().map_err(db_err)?;

        debug!(
            period_id = period_id,
            payout_count = stored_payouts.len(),
            "settlement recorded"
        );

        Ok((
            RevenuePeriod {
                id: period_id,
                month: period.month,
                year: period.year,
                total_revenue: period.total_revenue,
                investor_share_percentage: period.investor_share_percentage,
                total_investor_payout: period.total_investor_payout,
                created_at,
            },
            stored_payouts,
        ))
    }

    fn payouts_for_investor(&self, id: &InvestorId) -> StoreResult<Vec<PayoutDetail>> {
        let conn = self.conn.lock().map_err(lock_err)?;
        let mut stmt = conn
            .prepare(
                r#"
                SELECT p.id, p.investor_id, p.revenue_period_id, p.amount,
                       p.share_percentage, p.status, p.settlement_ref, p.created_at,
                       rp.month, rp.year, rp.total_revenue, rp.total_investor_payout
                FROM payouts p
                JOIN revenue_periods rp ON p.revenue_period_id = rp.id
                WHERE p.investor_id = ?1
                ORDER BY rp.year DESC, rp.id DESC
                "#,
            )
            .map_err(db_err)?;

        let details = stmt
            .query_map([id.as_str()], |row| {
                Ok(PayoutDetail {
                    payout: payout_from_row(row)?,
                    month: row.get(8)?,
                    year: row.get(9)?,
                    total_revenue: row.get(10)?,
                    total_investor_payout: row.get(11)?,
                })
            })
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;
        Ok(details)
    }

    fn update_payout_status(
        &self,
        payout_id: i64,
        status: PayoutStatus,
        settlement_ref: Option<String>,
    ) -> StoreResult<()> {
        let conn = self.conn.lock().map_err(lock_err)?;
        let changed = conn
            .execute(
                "UPDATE payouts SET status = ?2, settlement_ref = ?3 WHERE id = ?1",
                params![payout_id, status.as_str(), settlement_ref],
            )
            .map_err(db_err)?;

        if changed == 0 {
            return Err(StoreError::NotFound(format!("payout {payout_id}")));
        }
        Ok(())
    }
}

const INVESTOR_SELECT: &str = r#"
    SELECT id, assertion_key, account_key, name, email,
           investment_amount, investment_date, created_at
    FROM investors
"#;

const PERIOD_SELECT: &str = r#"
    SELECT id, month, year, total_revenue, investor_share_percentage,
           total_investor_payout, created_at
    FROM revenue_periods
"#;

fn investor_from_row(row: &Row) -> rusqlite::Result<Investor> {
    Ok(Investor {
        id: InvestorId::from(row.get::<_, String>(0)?),
        assertion_key: row.get(1)?,
        account_key: row.get(2)?,
        name: row.get(3)?,
        email: row.get(4)?,
        investment_amount: row.get(5)?,
        investment_date: row.get(6)?,
        created_at: row.get::<_, i64>(7)? as u64,
    })
}

fn period_from_row(row: &Row) -> rusqlite::Result<RevenuePeriod> {
    Ok(RevenuePeriod {
        id: row.get(0)?,
        month: row.get(1)?,
        year: row.get(2)?,
        total_revenue: row.get(3)?,
        investor_share_percentage: row.get(4)?,
        total_investor_payout: row.get(5)?,
        created_at: row.get::<_, i64>(6)? as u64,
    })
}

fn payout_from_row(row: &Row) -> rusqlite::Result<Payout> {
    let status_raw: String = row.get(5)?;
    let status = PayoutStatus::parse(&status_raw).unwrap_or(PayoutStatus::Pending);
    Ok(Payout {
        id: row.get(0)?,
        investor_id: InvestorId::from(row.get::<_, String>(1)?),
        revenue_period_id: row.get(2)?,
        amount: row.get(3)?,
        share_percentage: row.get(4)?,
        status,
        settlement_ref: row.get(6)?,
        created_at: row.get::<_, i64>(7)? as u64,
    })
}

fn db_err(err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(inner, message)
            if inner.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::Conflict(message.unwrap_or_else(|| "constraint violation".to_string()))
        }
        other => StoreError::Backend(other.to_string()),
    }
}

fn lock_err<T>(_: std::sync::PoisonError<T>) -> StoreError {
    StoreError::Backend("store connection lock poisoned".to_string())
}
