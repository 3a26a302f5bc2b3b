use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{DonationId, DonorId, HospitalId, RecipientId, RequestId, StaffId};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::{
    BloodGroup, Category, CatalogError, Donation, DonationItem, DonationType, Donor, Hospital,
    InvalidValue, InventoryLevel, Ledger, NewDonation, NewDonor, NewHospital, NewRecipient,
    NewRequest, NewStaff, OrganType, PendingRequest, Recipient, Request, RequestorRef, Result,
    Staff,
    store::{CatalogStore, CatalogTx, validate_amount},
};

const DONOR_COLUMNS: &str = "donor_id, full_name, gender, dob, contact_no, email, \
    medical_history, organ_eligibility, blood_group, address";

const RECIPIENT_COLUMNS: &str = "recipient_id, full_name, gender, dob, contact_no, email, \
    medical_condition, required_organ, required_blood_group, address";

const STAFF_COLUMNS: &str =
    "staff_id, full_name, role, contact_no, email, username, password_hash";

const DONATION_COLUMNS: &str =
    "donation_id, donor_id, donation_date, donation_type, organ_type, quantity, verified_by";

const REQUEST_COLUMNS: &str = "request_id, requestor_type, recipient_id, hospital_id, \
    request_type, req_blood_group, organ_type, quantity, request_date, status, \
    fulfilled_by, fulfilled_at";

/// PostgreSQL-backed catalog store implementation.
#[derive(Clone)]
pub struct PostgresCatalog {
    pool: PgPool,
}

impl PostgresCatalog {
    /// Creates a new PostgreSQL catalog store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }
}

/// Transaction over a [`PostgresCatalog`]. Rolls back when dropped uncommitted.
pub struct PostgresTx {
    tx: Transaction<'static, Postgres>,
}

fn ledger_table(ledger: Ledger) -> (&'static str, &'static str) {
    match ledger {
        Ledger::Blood => ("blood_inventory", "blood_group"),
        Ledger::Organ => ("organ_inventory", "organ_type"),
    }
}

fn parse_column<T>(value: &str) -> Result<T>
where
    T: FromStr<Err = InvalidValue>,
{
    value
        .parse()
        .map_err(|e: InvalidValue| CatalogError::Corrupt(e.to_string()))
}

fn organ_column(value: String) -> Result<OrganType> {
    OrganType::new(value).map_err(|e| CatalogError::Corrupt(e.to_string()))
}

fn quantity_column(value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| CatalogError::Corrupt(format!("quantity {value}")))
}

fn stock_column(value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| CatalogError::Corrupt(format!("stock {value}")))
}

/// Maps constraint violations on writes onto catalog errors.
fn map_write_error(err: sqlx::Error) -> CatalogError {
    if let sqlx::Error::Database(ref db_err) = err {
        let constraint = db_err.constraint().unwrap_or_default().to_string();
        if db_err.is_unique_violation() {
            return CatalogError::Duplicate(constraint);
        }
        if db_err.is_foreign_key_violation() {
            return CatalogError::MissingReference(constraint);
        }
    }
    CatalogError::Database(err)
}

fn row_to_donor(row: &PgRow) -> Result<Donor> {
    let blood_group: String = row.try_get("blood_group")?;
    Ok(Donor {
        id: DonorId::new(row.try_get("donor_id")?),
        full_name: row.try_get("full_name")?,
        gender: row.try_get("gender")?,
        dob: row.try_get("dob")?,
        contact: row.try_get("contact_no")?,
        email: row.try_get("email")?,
        medical_history: row.try_get("medical_history")?,
        organ_eligible: row.try_get("organ_eligibility")?,
        blood_group: parse_column(&blood_group)?,
        address: row.try_get("address")?,
    })
}

fn row_to_recipient(row: &PgRow) -> Result<Recipient> {
    let required_organ: Option<String> = row.try_get("required_organ")?;
    let required_blood_group: Option<String> = row.try_get("required_blood_group")?;
    Ok(Recipient {
        id: RecipientId::new(row.try_get("recipient_id")?),
        full_name: row.try_get("full_name")?,
        gender: row.try_get("gender")?,
        dob: row.try_get("dob")?,
        contact: row.try_get("contact_no")?,
        email: row.try_get("email")?,
        medical_condition: row.try_get("medical_condition")?,
        required_organ: required_organ.map(organ_column).transpose()?,
        required_blood_group: required_blood_group
            .as_deref()
            .map(parse_column::<BloodGroup>)
            .transpose()?,
        address: row.try_get("address")?,
    })
}

fn row_to_hospital(row: &PgRow) -> Result<Hospital> {
    Ok(Hospital {
        id: HospitalId::new(row.try_get("hospital_id")?),
        name: row.try_get("hospital_name")?,
        address: row.try_get("address")?,
        contact: row.try_get("contact_no")?,
    })
}

fn row_to_staff(row: &PgRow) -> Result<Staff> {
    Ok(Staff {
        id: StaffId::new(row.try_get("staff_id")?),
        full_name: row.try_get("full_name")?,
        role: row.try_get("role")?,
        contact: row.try_get("contact_no")?,
        email: row.try_get("email")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
    })
}

fn row_to_donation(row: &PgRow) -> Result<Donation> {
    let donation_type: String = row.try_get("donation_type")?;
    let organ_type: Option<String> = row.try_get("organ_type")?;
    let quantity = quantity_column(row.try_get("quantity")?)?;

    let item = match (parse_column::<DonationType>(&donation_type)?, organ_type) {
        (DonationType::Blood, None) => DonationItem::Blood { units: quantity },
        (DonationType::Organ, Some(organ)) => DonationItem::Organ {
            organ: organ_column(organ)?,
        },
        (kind, organ) => {
            return Err(CatalogError::Corrupt(format!(
                "{kind} donation with organ type {organ:?}"
            )));
        }
    };

    Ok(Donation {
        id: DonationId::new(row.try_get("donation_id")?),
        donor_id: DonorId::new(row.try_get("donor_id")?),
        date: row.try_get("donation_date")?,
        item,
        verified_by: row.try_get::<Option<i64>, _>("verified_by")?.map(StaffId::new),
    })
}

fn row_to_request(row: &PgRow) -> Result<Request> {
    let requestor_type: String = row.try_get("requestor_type")?;
    let recipient_id: Option<i64> = row.try_get("recipient_id")?;
    let hospital_id: Option<i64> = row.try_get("hospital_id")?;
    let requestor = match (requestor_type.as_str(), recipient_id, hospital_id) {
        ("Recipient", Some(id), None) => RequestorRef::Recipient(RecipientId::new(id)),
        ("Hospital", None, Some(id)) => RequestorRef::Hospital(HospitalId::new(id)),
        _ => {
            return Err(CatalogError::Corrupt(format!(
                "requestor {requestor_type} with recipient {recipient_id:?} and hospital {hospital_id:?}"
            )));
        }
    };

    let request_type: String = row.try_get("request_type")?;
    let blood_group: Option<String> = row.try_get("req_blood_group")?;
    let organ_type: Option<String> = row.try_get("organ_type")?;
    let need = match (parse_column::<DonationType>(&request_type)?, blood_group, organ_type) {
        (DonationType::Blood, Some(group), None) => Category::Blood(parse_column(&group)?),
        (DonationType::Organ, None, Some(organ)) => Category::Organ(organ_column(organ)?),
        (kind, group, organ) => {
            return Err(CatalogError::Corrupt(format!(
                "{kind} request with blood group {group:?} and organ type {organ:?}"
            )));
        }
    };

    let status: String = row.try_get("status")?;
    Ok(Request {
        id: RequestId::new(row.try_get("request_id")?),
        requestor,
        need,
        quantity: quantity_column(row.try_get("quantity")?)?,
        requested_on: row.try_get("request_date")?,
        status: parse_column(&status)?,
        fulfilled_by: row.try_get::<Option<i64>, _>("fulfilled_by")?.map(StaffId::new),
        fulfilled_at: row.try_get("fulfilled_at")?,
    })
}

#[async_trait]
impl CatalogTx for PostgresTx {
    async fn get_donor(&mut self, id: DonorId) -> Result<Option<Donor>> {
        let sql = format!("SELECT {DONOR_COLUMNS} FROM donors WHERE donor_id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(row_to_donor).transpose()
    }

    async fn staff_exists(&mut self, id: StaffId) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM staff WHERE staff_id = $1)")
                .bind(id.as_i64())
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(exists)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn lock_request(&mut self, id: RequestId) -> Result<Option<Request>> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM requests WHERE request_id = $1 FOR UPDATE");
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(row_to_request).transpose()
    }

    async fn insert_donation(&mut self, donation: NewDonation) -> Result<Donation> {
        let sql = format!(
            r#"
            INSERT INTO donations (donor_id, donation_date, donation_type, organ_type, quantity, verified_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {DONATION_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(donation.donor_id.as_i64())
            .bind(donation.date)
            .bind(donation.item.donation_type().as_str())
            .bind(donation.item.organ_type().map(OrganType::as_str))
            .bind(i64::from(donation.item.quantity()))
            .bind(donation.verified_by.map(|id| id.as_i64()))
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_write_error)?;
        row_to_donation(&row)
    }

    #[tracing::instrument(level = "debug", skip(self, category), fields(category = %category))]
    async fn credit(&mut self, category: &Category, amount: u32) -> Result<u64> {
        validate_amount(amount)?;
        let (table, key) = ledger_table(category.ledger());
        let sql = format!(
            r#"
            INSERT INTO {table} ({key}, quantity, last_updated)
            VALUES ($1, $2, NOW())
            ON CONFLICT ({key}) DO UPDATE SET
                quantity = {table}.quantity + EXCLUDED.quantity,
                last_updated = NOW()
            RETURNING quantity
            "#
        );
        let quantity: i64 = sqlx::query_scalar(&sql)
            .bind(category.key())
            .bind(i64::from(amount))
            .fetch_one(&mut *self.tx)
            .await?;
        stock_column(quantity)
    }

    #[tracing::instrument(level = "debug", skip(self, category), fields(category = %category))]
    async fn debit(&mut self, category: &Category, amount: u32) -> Result<u64> {
        validate_amount(amount)?;
        let (table, key) = ledger_table(category.ledger());

        // The conditional update takes the row lock and checks sufficiency in
        // one statement; the lock is held until the transaction ends.
        let sql = format!(
            r#"
            UPDATE {table}
            SET quantity = quantity - $2, last_updated = NOW()
            WHERE {key} = $1 AND quantity >= $2
            RETURNING quantity
            "#
        );
        let remaining: Option<i64> = sqlx::query_scalar(&sql)
            .bind(category.key())
            .bind(i64::from(amount))
            .fetch_optional(&mut *self.tx)
            .await?;

        if let Some(remaining) = remaining {
            return stock_column(remaining);
        }

        let sql = format!("SELECT quantity FROM {table} WHERE {key} = $1");
        let available: Option<i64> = sqlx::query_scalar(&sql)
            .bind(category.key())
            .fetch_optional(&mut *self.tx)
            .await?;

        let available = stock_column(available.unwrap_or(0))?;
        tracing::debug!(available, "debit refused");
        Err(CatalogError::InsufficientStock {
            category: category.to_string(),
            requested: amount,
            available,
        })
    }

    #[tracing::instrument(level = "debug", skip(self, at))]
    async fn mark_fulfilled(
        &mut self,
        id: RequestId,
        staff_id: StaffId,
        at: DateTime<Utc>,
    ) -> Result<Option<Request>> {
        let sql = format!(
            r#"
            UPDATE requests
            SET status = 'Fulfilled', fulfilled_by = $2, fulfilled_at = $3
            WHERE request_id = $1 AND status = 'Pending'
            RETURNING {REQUEST_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .bind(staff_id.as_i64())
            .bind(at)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_write_error)?;
        row.as_ref().map(row_to_request).transpose()
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for PostgresCatalog {
    type Tx = PostgresTx;

    async fn begin(&self) -> Result<PostgresTx> {
        let tx = self.pool.begin().await.inspect_err(|err| {
            tracing::warn!(error = %err, "could not open catalog transaction");
        })?;
        Ok(PostgresTx { tx })
    }

    async fn insert_donor(&self, donor: NewDonor) -> Result<Donor> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO donors
                (full_name, gender, dob, contact_no, email, medical_history, organ_eligibility, blood_group, address)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING donor_id
            "#,
        )
        .bind(&donor.full_name)
        .bind(&donor.gender)
        .bind(donor.dob)
        .bind(&donor.contact)
        .bind(&donor.email)
        .bind(&donor.medical_history)
        .bind(donor.organ_eligible)
        .bind(donor.blood_group.as_str())
        .bind(&donor.address)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(donor.into_row(DonorId::new(id)))
    }

    async fn insert_recipient(&self, recipient: NewRecipient) -> Result<Recipient> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO recipients
                (full_name, gender, dob, contact_no, email, medical_condition, required_organ, required_blood_group, address)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING recipient_id
            "#,
        )
        .bind(&recipient.full_name)
        .bind(&recipient.gender)
        .bind(recipient.dob)
        .bind(&recipient.contact)
        .bind(&recipient.email)
        .bind(&recipient.medical_condition)
        .bind(recipient.required_organ.as_ref().map(OrganType::as_str))
        .bind(recipient.required_blood_group.map(|g| g.as_str()))
        .bind(&recipient.address)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(recipient.into_row(RecipientId::new(id)))
    }

    async fn insert_hospital(&self, hospital: NewHospital) -> Result<Hospital> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO hospitals (hospital_name, address, contact_no)
            VALUES ($1, $2, $3)
            RETURNING hospital_id
            "#,
        )
        .bind(&hospital.name)
        .bind(&hospital.address)
        .bind(&hospital.contact)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(Hospital {
            id: HospitalId::new(id),
            name: hospital.name,
            address: hospital.address,
            contact: hospital.contact,
        })
    }

    async fn insert_staff(&self, staff: NewStaff) -> Result<Staff> {
        let sql = format!(
            r#"
            INSERT INTO staff (full_name, role, contact_no, email, username, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {STAFF_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(&staff.full_name)
            .bind(&staff.role)
            .bind(&staff.contact)
            .bind(&staff.email)
            .bind(&staff.username)
            .bind(&staff.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;
        row_to_staff(&row)
    }

    async fn insert_request(&self, request: NewRequest) -> Result<Request> {
        let (recipient_id, hospital_id) = match request.requestor {
            RequestorRef::Recipient(id) => (Some(id.as_i64()), None),
            RequestorRef::Hospital(id) => (None, Some(id.as_i64())),
        };
        let (blood_group, organ_type) = match &request.need {
            Category::Blood(group) => (Some(group.as_str()), None),
            Category::Organ(organ) => (None, Some(organ.as_str())),
        };

        let sql = format!(
            r#"
            INSERT INTO requests
                (requestor_type, recipient_id, hospital_id, request_type, req_blood_group, organ_type, quantity, request_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {REQUEST_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(request.requestor.kind())
            .bind(recipient_id)
            .bind(hospital_id)
            .bind(request.need.kind().as_str())
            .bind(blood_group)
            .bind(organ_type)
            .bind(i64::from(request.quantity))
            .bind(request.requested_on)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;
        row_to_request(&row)
    }

    async fn get_donor(&self, id: DonorId) -> Result<Option<Donor>> {
        let sql = format!("SELECT {DONOR_COLUMNS} FROM donors WHERE donor_id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_donor).transpose()
    }

    async fn get_recipient(&self, id: RecipientId) -> Result<Option<Recipient>> {
        let sql = format!("SELECT {RECIPIENT_COLUMNS} FROM recipients WHERE recipient_id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_recipient).transpose()
    }

    async fn get_hospital(&self, id: HospitalId) -> Result<Option<Hospital>> {
        let row = sqlx::query(
            "SELECT hospital_id, hospital_name, address, contact_no FROM hospitals WHERE hospital_id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_hospital).transpose()
    }

    async fn get_staff(&self, id: StaffId) -> Result<Option<Staff>> {
        let sql = format!("SELECT {STAFF_COLUMNS} FROM staff WHERE staff_id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_staff).transpose()
    }

    async fn get_staff_by_username(&self, username: &str) -> Result<Option<Staff>> {
        let sql = format!("SELECT {STAFF_COLUMNS} FROM staff WHERE username = $1");
        let row = sqlx::query(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_staff).transpose()
    }

    async fn get_request(&self, id: RequestId) -> Result<Option<Request>> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM requests WHERE request_id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_request).transpose()
    }

    async fn list_donors(&self) -> Result<Vec<Donor>> {
        let sql = format!("SELECT {DONOR_COLUMNS} FROM donors ORDER BY donor_id DESC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_donor).collect()
    }

    async fn list_staff(&self) -> Result<Vec<Staff>> {
        let sql = format!("SELECT {STAFF_COLUMNS} FROM staff ORDER BY staff_id DESC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_staff).collect()
    }

    async fn list_donations(&self) -> Result<Vec<Donation>> {
        let sql = format!("SELECT {DONATION_COLUMNS} FROM donations ORDER BY donation_id ASC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_donation).collect()
    }

    async fn donations_for_donor(&self, donor_id: DonorId) -> Result<Vec<Donation>> {
        let sql = format!(
            "SELECT {DONATION_COLUMNS} FROM donations WHERE donor_id = $1 ORDER BY donation_id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(donor_id.as_i64())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_donation).collect()
    }

    async fn list_pending_requests(&self) -> Result<Vec<PendingRequest>> {
        let rows = sqlx::query(
            r#"
            SELECT
                r.request_id, r.requestor_type, r.recipient_id, r.hospital_id,
                r.request_type, r.req_blood_group, r.organ_type, r.quantity,
                r.request_date, r.status, r.fulfilled_by, r.fulfilled_at,
                COALESCE(rec.full_name, h.hospital_name) AS requestor_name
            FROM requests r
            LEFT JOIN recipients rec ON r.recipient_id = rec.recipient_id
            LEFT JOIN hospitals h ON r.hospital_id = h.hospital_id
            WHERE r.status = 'Pending'
            ORDER BY r.request_date ASC, r.request_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<PendingRequest> {
                Ok(PendingRequest {
                    request: row_to_request(row)?,
                    requestor_name: row.try_get("requestor_name")?,
                })
            })
            .collect()
    }

    async fn inventory(&self, ledger: Ledger) -> Result<Vec<InventoryLevel>> {
        let (table, key) = ledger_table(ledger);
        let sql = format!(
            "SELECT {key} AS category_key, quantity, last_updated FROM {table} ORDER BY {key} ASC"
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| -> Result<InventoryLevel> {
                let key: String = row.try_get("category_key")?;
                let category = match ledger {
                    Ledger::Blood => Category::Blood(parse_column::<BloodGroup>(&key)?),
                    Ledger::Organ => Category::Organ(organ_column(key)?),
                };
                Ok(InventoryLevel {
                    category,
                    quantity: stock_column(row.try_get("quantity")?)?,
                    last_updated: row.try_get("last_updated")?,
                })
            })
            .collect()
    }

    async fn stock_level(&self, category: &Category) -> Result<u64> {
        let (table, key) = ledger_table(category.ledger());
        let sql = format!("SELECT quantity FROM {table} WHERE {key} = $1");
        let quantity: Option<i64> = sqlx::query_scalar(&sql)
            .bind(category.key())
            .fetch_optional(&self.pool)
            .await?;
        stock_column(quantity.unwrap_or(0))
    }
}
