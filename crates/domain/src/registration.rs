//! Registration of donors, recipients, hospitals and staff, plus staff login.

use std::sync::Arc;

use catalog::{
    CatalogStore, Donor, Hospital, NewDonor, NewHospital, NewRecipient, NewStaff, Recipient,
    StaffProfile,
};
use garde::Validate;
use serde::Deserialize;

use crate::credentials::{Argon2PasswordService, PasswordService, UNKNOWN_USER_HASH};
use crate::error::DomainError;
use crate::validation::{
    blank_to_none, parse_blood_group, parse_date, parse_organ_type, validate_struct,
};

/// Input for registering a donor.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RegisterDonor {
    #[garde(length(min = 1))]
    pub full_name: String,
    #[garde(skip)]
    pub gender: Option<String>,
    #[garde(skip)]
    pub dob: Option<String>,
    #[garde(pattern(r"^[\d\+\-\s]{7,15}$"))]
    pub contact: Option<String>,
    #[garde(email)]
    pub email: Option<String>,
    #[garde(skip)]
    #[serde(alias = "medical")]
    pub medical_history: Option<String>,
    #[garde(skip)]
    #[serde(default, alias = "organ")]
    pub organ_eligible: bool,
    #[garde(length(min = 1))]
    pub blood_group: String,
    #[garde(skip)]
    pub address: Option<String>,
}

impl RegisterDonor {
    fn normalized(self) -> Self {
        Self {
            full_name: self.full_name.trim().to_string(),
            gender: blank_to_none(self.gender),
            dob: blank_to_none(self.dob),
            contact: blank_to_none(self.contact),
            email: blank_to_none(self.email),
            medical_history: blank_to_none(self.medical_history),
            organ_eligible: self.organ_eligible,
            blood_group: self.blood_group.trim().to_string(),
            address: blank_to_none(self.address),
        }
    }
}

/// Input for registering a recipient.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RegisterRecipient {
    #[garde(length(min = 1))]
    pub full_name: String,
    #[garde(skip)]
    pub gender: Option<String>,
    #[garde(skip)]
    pub dob: Option<String>,
    #[garde(pattern(r"^[\d\+\-\s]{7,15}$"))]
    pub contact: Option<String>,
    #[garde(email)]
    pub email: Option<String>,
    #[garde(skip)]
    #[serde(alias = "medical")]
    pub medical_condition: Option<String>,
    #[garde(skip)]
    pub required_organ: Option<String>,
    #[garde(skip)]
    #[serde(alias = "required_blood")]
    pub required_blood_group: Option<String>,
    #[garde(skip)]
    pub address: Option<String>,
}

impl RegisterRecipient {
    fn normalized(self) -> Self {
        Self {
            full_name: self.full_name.trim().to_string(),
            gender: blank_to_none(self.gender),
            dob: blank_to_none(self.dob),
            contact: blank_to_none(self.contact),
            email: blank_to_none(self.email),
            medical_condition: blank_to_none(self.medical_condition),
            required_organ: blank_to_none(self.required_organ),
            required_blood_group: blank_to_none(self.required_blood_group),
            address: blank_to_none(self.address),
        }
    }
}

/// Input for registering a hospital.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RegisterHospital {
    #[garde(length(min = 1))]
    pub name: String,
    #[garde(skip)]
    pub address: Option<String>,
    #[garde(pattern(r"^[\d\+\-\s]{7,15}$"))]
    pub contact: Option<String>,
}

/// Input for registering a staff member. The password arrives in clear text
/// and is hashed before it reaches the store.
#[derive(Clone, Default, Deserialize, Validate)]
pub struct RegisterStaff {
    #[garde(length(min = 1))]
    pub full_name: String,
    #[garde(length(min = 1))]
    pub role: String,
    #[garde(pattern(r"^[\d\+\-\s]{7,15}$"))]
    pub contact: Option<String>,
    #[garde(email)]
    pub email: Option<String>,
    #[garde(pattern(r"^[A-Za-z0-9_]{3,}$"))]
    pub username: String,
    #[garde(length(min = 1))]
    pub password: String,
}

impl std::fmt::Debug for RegisterStaff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterStaff")
            .field("full_name", &self.full_name)
            .field("role", &self.role)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Service for creating the rows the rest of the system refers to.
pub struct RegistrationService<S: CatalogStore> {
    store: S,
    passwords: Arc<dyn PasswordService>,
}

impl<S: CatalogStore> RegistrationService<S> {
    /// Creates a registration service hashing passwords with Argon2.
    pub fn new(store: S) -> Self {
        Self::with_password_service(store, Arc::new(Argon2PasswordService::new()))
    }

    pub fn with_password_service(store: S, passwords: Arc<dyn PasswordService>) -> Self {
        Self { store, passwords }
    }

    #[tracing::instrument(skip(self, cmd), fields(name = %cmd.full_name))]
    pub async fn register_donor(&self, cmd: RegisterDonor) -> Result<Donor, DomainError> {
        let cmd = cmd.normalized();
        validate_struct(&cmd)?;

        let dob = cmd.dob.as_deref().map(|d| parse_date("DOB", d)).transpose()?;
        let blood_group = parse_blood_group(&cmd.blood_group)?;

        let donor = self
            .store
            .insert_donor(NewDonor {
                full_name: cmd.full_name,
                gender: cmd.gender,
                dob,
                contact: cmd.contact,
                email: cmd.email,
                medical_history: cmd.medical_history,
                organ_eligible: cmd.organ_eligible,
                blood_group,
                address: cmd.address,
            })
            .await?;

        tracing::info!(donor_id = %donor.id, %blood_group, "donor registered");
        Ok(donor)
    }

    #[tracing::instrument(skip(self, cmd), fields(name = %cmd.full_name))]
    pub async fn register_recipient(
        &self,
        cmd: RegisterRecipient,
    ) -> Result<Recipient, DomainError> {
        let cmd = cmd.normalized();
        validate_struct(&cmd)?;

        let dob = cmd.dob.as_deref().map(|d| parse_date("DOB", d)).transpose()?;
        let required_organ = cmd
            .required_organ
            .as_deref()
            .map(parse_organ_type)
            .transpose()?;
        let required_blood_group = cmd
            .required_blood_group
            .as_deref()
            .map(parse_blood_group)
            .transpose()?;

        let recipient = self
            .store
            .insert_recipient(NewRecipient {
                full_name: cmd.full_name,
                gender: cmd.gender,
                dob,
                contact: cmd.contact,
                email: cmd.email,
                medical_condition: cmd.medical_condition,
                required_organ,
                required_blood_group,
                address: cmd.address,
            })
            .await?;

        tracing::info!(recipient_id = %recipient.id, "recipient registered");
        Ok(recipient)
    }

    #[tracing::instrument(skip(self, cmd), fields(name = %cmd.name))]
    pub async fn register_hospital(&self, cmd: RegisterHospital) -> Result<Hospital, DomainError> {
        let cmd = RegisterHospital {
            name: cmd.name.trim().to_string(),
            address: blank_to_none(cmd.address),
            contact: blank_to_none(cmd.contact),
        };
        validate_struct(&cmd)?;

        let hospital = self
            .store
            .insert_hospital(NewHospital {
                name: cmd.name,
                address: cmd.address,
                contact: cmd.contact,
            })
            .await?;

        tracing::info!(hospital_id = %hospital.id, "hospital registered");
        Ok(hospital)
    }

    /// Registers a staff member. A taken username or email yields
    /// [`DomainError::Conflict`].
    #[tracing::instrument(skip(self, cmd), fields(username = %cmd.username))]
    pub async fn register_staff(&self, cmd: RegisterStaff) -> Result<StaffProfile, DomainError> {
        let cmd = RegisterStaff {
            full_name: cmd.full_name.trim().to_string(),
            role: cmd.role.trim().to_string(),
            contact: blank_to_none(cmd.contact),
            email: blank_to_none(cmd.email),
            username: cmd.username.trim().to_string(),
            password: cmd.password,
        };
        validate_struct(&cmd)?;

        let password_hash = self.passwords.hash_password(&cmd.password)?;
        let staff = self
            .store
            .insert_staff(NewStaff {
                full_name: cmd.full_name,
                role: cmd.role,
                contact: cmd.contact,
                email: cmd.email,
                username: cmd.username,
                password_hash,
            })
            .await?;

        tracing::info!(staff_id = %staff.id, "staff registered");
        Ok(staff.profile())
    }

    /// Checks a username and password. Unknown users and wrong passwords fail
    /// identically.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<StaffProfile, DomainError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(DomainError::Validation(
                "Missing username or password".to_string(),
            ));
        }

        let Some(staff) = self.store.get_staff_by_username(username).await? else {
            // Pay the same hashing cost as a wrong password.
            let _ = self.passwords.verify_password(password, UNKNOWN_USER_HASH);
            return Err(DomainError::InvalidCredentials);
        };

        if !self
            .passwords
            .verify_password(password, &staff.password_hash)?
        {
            return Err(DomainError::InvalidCredentials);
        }

        Ok(staff.profile())
    }
}
