//! REST client for the records backend.
//!
//! Every request carries the session's bearer token and the acting user's identity headers.
//! Non-2xx responses become [`ClinicError::Http`] with the (truncated) response body.

use crate::client::{AttendanceGateway, TemplateCatalog};
use crate::constants::{ACTOR_ID_HEADER, ACTOR_ROLE_HEADER, ACTOR_SPECIALTY_HEADER};
use crate::error::{ClinicError, ClinicResult};
use crate::models::{
    Appointment, AttendanceRecord, MedicalRecord, QueueEntry, RecordPayload, Template,
};
use crate::session::Session;
use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const ERROR_BODY_LIMIT: usize = 200;

pub struct HttpClinicClient {
    http: Client,
    base_url: String,
    session: Arc<Session>,
}

impl HttpClinicClient {
    /// Creates a client for the API at `base_url`, acting as the session's user.
    pub fn new(base_url: impl Into<String>, session: Arc<Session>) -> ClinicResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let user = &self.session.user;
        let mut builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.session.token)
            .header(ACTOR_ID_HEADER, &user.id)
            .header(ACTOR_ROLE_HEADER, user.role.as_str());

        if let Some(specialty) = user.specialty() {
            match HeaderValue::from_bytes(specialty.as_bytes()) {
                Ok(value) => builder = builder.header(ACTOR_SPECIALTY_HEADER, value),
                Err(_) => tracing::warn!("specialty cannot be sent as a header; omitting it"),
            }
        }
        builder
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClinicResult<T> {
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClinicError::Http {
                status: status.as_u16(),
                message: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl TemplateCatalog for HttpClinicClient {
    async fn list_templates(&self) -> ClinicResult<Vec<Template>> {
        self.send(self.request(Method::GET, "/forms/templates"))
            .await
            .map_err(|e| e.into_fetch("templates"))
    }
}

#[async_trait]
impl AttendanceGateway for HttpClinicClient {
    async fn get_record(&self, appointment_id: &str) -> ClinicResult<AttendanceRecord> {
        let path = format!("/attendance/{appointment_id}/record");
        self.send(self.request(Method::GET, &path)).await
    }

    async fn finish(
        &self,
        appointment_id: &str,
        payload: &RecordPayload,
    ) -> ClinicResult<MedicalRecord> {
        let path = format!("/attendance/{appointment_id}/finish");
        self.send(self.request(Method::POST, &path).json(payload)).await
    }

    async fn my_appointments(&self) -> ClinicResult<Vec<QueueEntry>> {
        self.send(self.request(Method::GET, "/attendance/my-appointments")).await
    }

    async fn start(&self, appointment_id: &str) -> ClinicResult<Appointment> {
        let path = format!("/attendance/{appointment_id}/start");
        self.send(self.request(Method::POST, &path)).await
    }

    async fn cancel(&self, appointment_id: &str) -> ClinicResult<Appointment> {
        let path = format!("/attendance/{appointment_id}/cancel");
        self.send(self.request(Method::POST, &path)).await
    }

    async fn patient_history(&self, patient_id: &str) -> ClinicResult<Vec<MedicalRecord>> {
        let path = format!("/attendance/patient/{patient_id}/history");
        self.send(self.request(Method::GET, &path)).await
    }
}
