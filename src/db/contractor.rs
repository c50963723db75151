use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct ContractorStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractorStatus {
    Active,
    Inactive,
}

impl ContractorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractorStatus::Active => "active",
            ContractorStatus::Inactive => "inactive",
        }
    }

    fn from_db(s: &str) -> Self {
        match s {
            "active" => ContractorStatus::Active,
            _ => ContractorStatus::Inactive,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Contractor {
    pub id: i64,
    pub company: String,
    pub trade: String,
    pub contact_name: String,
    pub phone: String,
    pub email: String,
    pub rating: Option<i64>,
    pub insurance_expiry: Option<String>,
    pub notes: Option<String>,
    pub status: ContractorStatus,
    pub created_at: String,
}

#[derive(sqlx::FromRow)]
struct ContractorRow {
    id: i64,
    company: String,
    trade: String,
    contact_name: String,
    phone: String,
    email: String,
    rating: Option<i64>,
    insurance_expiry: Option<String>,
    notes: Option<String>,
    status: String,
    created_at: String,
}

impl From<ContractorRow> for Contractor {
    fn from(row: ContractorRow) -> Self {
        Self {
            id: row.id,
            company: row.company,
            trade: row.trade,
            contact_name: row.contact_name,
            phone: row.phone,
            email: row.email,
            rating: row.rating,
            insurance_expiry: row.insurance_expiry,
            notes: row.notes,
            status: ContractorStatus::from_db(&row.status),
            created_at: row.created_at,
        }
    }
}

/// Fields for a new contractor, or the replacement values of an update.
pub struct NewContractor<'a> {
    pub company: &'a str,
    pub trade: &'a str,
    pub contact_name: &'a str,
    pub phone: &'a str,
    pub email: &'a str,
    pub rating: Option<i64>,
    pub insurance_expiry: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub status: ContractorStatus,
}

impl ContractorStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a contractor. Fails with a unique violation when the company
    /// already has a contractor with the same contact name.
    pub async fn create(&self, contractor: &NewContractor<'_>) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO contractors (company, trade, contact_name, phone, email, rating, insurance_expiry, notes, status) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(contractor.company)
        .bind(contractor.trade)
        .bind(contractor.contact_name)
        .bind(contractor.phone)
        .bind(contractor.email)
        .bind(contractor.rating)
        .bind(contractor.insurance_expiry)
        .bind(contractor.notes)
        .bind(contractor.status.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn get(&self, id: i64) -> Result<Option<Contractor>, sqlx::Error> {
        let row: Option<ContractorRow> = sqlx::query_as(
            "SELECT id, company, trade, contact_name, phone, email, rating, insurance_expiry, notes, status, created_at FROM contractors WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Contractor::from))
    }

    /// List contractors by company, then contact name.
    pub async fn list(&self) -> Result<Vec<Contractor>, sqlx::Error> {
        let rows: Vec<ContractorRow> = sqlx::query_as(
            "SELECT id, company, trade, contact_name, phone, email, rating, insurance_expiry, notes, status, created_at FROM contractors ORDER BY company, contact_name, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Contractor::from).collect())
    }

    /// Overwrite every editable field of a contractor.
    pub async fn update(
        &self,
        id: i64,
        contractor: &NewContractor<'_>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE contractors SET company = ?, trade = ?, contact_name = ?, phone = ?, email = ?, rating = ?, insurance_expiry = ?, notes = ?, status = ? WHERE id = ?",
        )
        .bind(contractor.company)
        .bind(contractor.trade)
        .bind(contractor.contact_name)
        .bind(contractor.phone)
        .bind(contractor.email)
        .bind(contractor.rating)
        .bind(contractor.insurance_expiry)
        .bind(contractor.notes)
        .bind(contractor.status.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a contractor. Tasks assigned to it become unassigned.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM contractors WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
