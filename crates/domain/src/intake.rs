//! Request intake: validates and files requests in `Pending` state.

use catalog::{CatalogStore, Category, DonationType, NewRequest, Request, RequestorRef};
use chrono::Utc;
use common::{HospitalId, RecipientId};

use crate::error::DomainError;
use crate::validation::{
    blank_to_none, parse_blood_group, parse_date, parse_organ_type, positive_quantity,
};

/// Builds a requestor from the two optional references a client may send.
/// Exactly one of them must be set.
pub fn resolve_requestor(
    recipient_id: Option<RecipientId>,
    hospital_id: Option<HospitalId>,
) -> Result<RequestorRef, DomainError> {
    match (recipient_id, hospital_id) {
        (Some(id), None) => Ok(RequestorRef::Recipient(id)),
        (None, Some(id)) => Ok(RequestorRef::Hospital(id)),
        (Some(_), Some(_)) => Err(DomainError::Validation(
            "A request has either a recipient or a hospital, not both".to_string(),
        )),
        (None, None) => Err(DomainError::Validation(
            "Recipient ID or Hospital ID required".to_string(),
        )),
    }
}

/// Input for filing a request.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub requestor: RequestorRef,
    pub request_type: DonationType,
    /// Required for blood requests.
    pub blood_group: Option<String>,
    /// Required for organ requests.
    pub organ_type: Option<String>,
    /// Absent means one; organ requests are always one.
    pub quantity: Option<i64>,
    /// `YYYY-MM-DD`; defaults to today (UTC).
    pub request_date: Option<String>,
}

impl SubmitRequest {
    pub fn blood(requestor: RequestorRef, blood_group: impl Into<String>, units: i64) -> Self {
        Self {
            requestor,
            request_type: DonationType::Blood,
            blood_group: Some(blood_group.into()),
            organ_type: None,
            quantity: Some(units),
            request_date: None,
        }
    }

    pub fn organ(requestor: RequestorRef, organ: impl Into<String>) -> Self {
        Self {
            requestor,
            request_type: DonationType::Organ,
            blood_group: None,
            organ_type: Some(organ.into()),
            quantity: None,
            request_date: None,
        }
    }

    pub fn dated(mut self, date: impl Into<String>) -> Self {
        self.request_date = Some(date.into());
        self
    }

    fn need(&self) -> Result<(Category, u32), DomainError> {
        match self.request_type {
            DonationType::Blood => {
                let group = blank_to_none(self.blood_group.clone()).ok_or_else(|| {
                    DomainError::Validation("Blood group required for blood requests".to_string())
                })?;
                let quantity = positive_quantity("Quantity", self.quantity.unwrap_or(1))?;
                Ok((Category::Blood(parse_blood_group(&group)?), quantity))
            }
            DonationType::Organ => {
                let organ = blank_to_none(self.organ_type.clone()).ok_or_else(|| {
                    DomainError::Validation("Organ type required for organ requests".to_string())
                })?;
                Ok((Category::Organ(parse_organ_type(&organ)?), 1))
            }
        }
    }
}

pub struct RequestIntake<S: CatalogStore> {
    store: S,
}

impl<S: CatalogStore> RequestIntake<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Files a request. Inventory is not consulted.
    #[tracing::instrument(skip(self), fields(requestor = cmd.requestor.kind()))]
    pub async fn submit(&self, cmd: SubmitRequest) -> Result<Request, DomainError> {
        let (need, quantity) = cmd.need()?;
        let requested_on = match blank_to_none(cmd.request_date.clone()) {
            Some(date) => parse_date("request date", &date)?,
            None => Utc::now().date_naive(),
        };

        let exists = match cmd.requestor {
            RequestorRef::Recipient(id) => self.store.get_recipient(id).await?.is_some(),
            RequestorRef::Hospital(id) => self.store.get_hospital(id).await?.is_some(),
        };
        if !exists {
            return Err(match cmd.requestor {
                RequestorRef::Recipient(id) => DomainError::not_found("Recipient", id),
                RequestorRef::Hospital(id) => DomainError::not_found("Hospital", id),
            });
        }

        let request = self
            .store
            .insert_request(NewRequest {
                requestor: cmd.requestor,
                need,
                quantity,
                requested_on,
            })
            .await?;

        metrics::counter!("requests_submitted_total", "type" => request.need.kind().as_str())
            .increment(1);
        tracing::info!(
            request_id = %request.id,
            need = %request.need,
            quantity,
            "request submitted"
        );
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{
        BloodGroup, InMemoryCatalog, Ledger, NewHospital, NewRecipient, OrganType, RequestStatus,
    };
    use chrono::NaiveDate;

    async fn seed_hospital(store: &InMemoryCatalog) -> RequestorRef {
        let hospital = store
            .insert_hospital(NewHospital {
                name: "St. Mary".into(),
                address: None,
                contact: None,
            })
            .await
            .unwrap();
        RequestorRef::Hospital(hospital.id)
    }

    #[test]
    fn requestor_must_be_exactly_one() {
        assert_eq!(
            resolve_requestor(Some(RecipientId::new(1)), None).unwrap(),
            RequestorRef::Recipient(RecipientId::new(1))
        );
        assert_eq!(
            resolve_requestor(None, Some(HospitalId::new(2))).unwrap(),
            RequestorRef::Hospital(HospitalId::new(2))
        );
        assert!(resolve_requestor(None, None).is_err());
        assert!(resolve_requestor(Some(RecipientId::new(1)), Some(HospitalId::new(2))).is_err());
    }

    #[tokio::test]
    async fn blood_request_is_filed_pending_without_touching_stock() {
        let store = InMemoryCatalog::new();
        let hospital = seed_hospital(&store).await;

        let request = RequestIntake::new(store.clone())
            .submit(SubmitRequest::blood(hospital, "B-", 4).dated("2024-04-02"))
            .await
            .unwrap();

        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.need, Category::Blood(BloodGroup::BNeg));
        assert_eq!(request.quantity, 4);
        assert_eq!(request.requested_on, NaiveDate::from_ymd_opt(2024, 4, 2).unwrap());
        assert!(store.inventory(Ledger::Blood).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn organ_request_quantity_is_forced_to_one() {
        let store = InMemoryCatalog::new();
        let recipient = store
            .insert_recipient(NewRecipient {
                full_name: "Rae".into(),
                gender: None,
                dob: None,
                contact: None,
                email: None,
                medical_condition: None,
                required_organ: None,
                required_blood_group: None,
                address: None,
            })
            .await
            .unwrap();

        let mut cmd = SubmitRequest::organ(RequestorRef::Recipient(recipient.id), "Liver");
        cmd.quantity = Some(3);
        let request = RequestIntake::new(store).submit(cmd).await.unwrap();

        assert_eq!(request.quantity, 1);
        assert_eq!(request.need, Category::Organ(OrganType::new("Liver").unwrap()));
    }

    #[tokio::test]
    async fn unknown_requestor_is_not_found() {
        let result = RequestIntake::new(InMemoryCatalog::new())
            .submit(SubmitRequest::blood(
                RequestorRef::Hospital(HospitalId::new(77)),
                "O+",
                1,
            ))
            .await;
        assert!(matches!(
            result,
            Err(DomainError::NotFound { entity: "Hospital", .. })
        ));
    }

    #[tokio::test]
    async fn malformed_requests_are_rejected() {
        let store = InMemoryCatalog::new();
        let hospital = seed_hospital(&store).await;
        let intake = RequestIntake::new(store.clone());

        let mut missing_group = SubmitRequest::blood(hospital, "", 1);
        missing_group.blood_group = None;

        for cmd in [
            missing_group,
            SubmitRequest::blood(hospital, "X+", 1),
            SubmitRequest::blood(hospital, "O+", 0),
            SubmitRequest::organ(hospital, " "),
            SubmitRequest::blood(hospital, "O+", 1).dated("2024/01/01"),
        ] {
            assert!(matches!(
                intake.submit(cmd).await,
                Err(DomainError::Validation(_))
            ));
        }
        assert!(store.list_pending_requests().await.unwrap().is_empty());
    }
}
