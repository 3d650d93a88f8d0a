//! REST bindings for the HMS list/detail resources

use crate::cache::{cache_key, CacheKey, KeyPart};
use crate::error::Result;
use crate::http::{ApiClient, ApiRequest, ApiResponse};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;

/// Backend collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Patients,
    Appointments,
    Bills,
    MedicalRecords,
    LabTests,
    Prescriptions,
    Users,
    Wards,
    Claims,
    Schemes,
}

impl Resource {
    pub const ALL: [Resource; 10] = [
        Resource::Patients,
        Resource::Appointments,
        Resource::Bills,
        Resource::MedicalRecords,
        Resource::LabTests,
        Resource::Prescriptions,
        Resource::Users,
        Resource::Wards,
        Resource::Claims,
        Resource::Schemes,
    ];

    /// Collection path, e.g. `/api/lab-tests`
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Patients => "/api/patients",
            Resource::Appointments => "/api/appointments",
            Resource::Bills => "/api/bills",
            Resource::MedicalRecords => "/api/medical-records",
            Resource::LabTests => "/api/lab-tests",
            Resource::Prescriptions => "/api/prescriptions",
            Resource::Users => "/api/users",
            Resource::Wards => "/api/wards",
            Resource::Claims => "/api/claims",
            Resource::Schemes => "/api/schemes",
        }
    }

    /// Cache key prefix for list queries
    pub fn cache_name(&self) -> &'static str {
        // Same as the last path segment
        &self.path()["/api/".len()..]
    }

    /// Cache key prefix for single-item queries (`ward`, `lab-test`, ...)
    pub fn detail_name(&self) -> &'static str {
        match self {
            Resource::Patients => "patient",
            Resource::Appointments => "appointment",
            Resource::Bills => "bill",
            Resource::MedicalRecords => "medical-record",
            Resource::LabTests => "lab-test",
            Resource::Prescriptions => "prescription",
            Resource::Users => "user",
            Resource::Wards => "ward",
            Resource::Claims => "claim",
            Resource::Schemes => "scheme",
        }
    }

    /// Path of one item
    pub fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.path(), urlencoding::encode(id))
    }

    /// Key for a list query with the given filter values
    pub fn list_key<I, P>(&self, params: I) -> CacheKey
    where
        I: IntoIterator<Item = P>,
        P: Into<KeyPart>,
    {
        cache_key(self.cache_name(), params)
    }

    /// Key for one item
    pub fn detail_key(&self, id: impl Into<KeyPart>) -> CacheKey {
        CacheKey::new(self.detail_name()).with(id)
    }

    /// Look up by path or cache name (`/api/users`, `users`)
    pub fn parse(name: &str) -> Option<Resource> {
        let name = name.trim_end_matches('/');
        Self::ALL
            .into_iter()
            .find(|r| r.path() == name || r.cache_name() == name)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cache_name())
    }
}

/// Typed verb + path binding for one collection
///
/// `T` is the row type returned by list and detail calls.
#[derive(Debug, Clone)]
pub struct ResourceApi<T> {
    client: ApiClient,
    resource: Resource,
    _row: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> ResourceApi<T> {
    pub fn new(client: ApiClient, resource: Resource) -> Self {
        Self {
            client,
            resource,
            _row: PhantomData,
        }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    /// `GET /api/{resource}` with optional query parameters
    pub async fn list(&self, params: &[(&str, &str)]) -> Result<Vec<T>> {
        let request = params
            .iter()
            .fold(ApiRequest::get(self.resource.path()), |req, (k, v)| req.query(*k, *v));
        self.client.send_json(request).await
    }

    /// `GET /api/{resource}/{id}`
    pub async fn get(&self, id: impl fmt::Display) -> Result<T> {
        self.client
            .get_json(&self.resource.item_path(&id.to_string()))
            .await
    }

    /// `POST /api/{resource}`
    pub async fn create<B: Serialize + ?Sized>(&self, body: &B) -> Result<T> {
        self.client.post_json(self.resource.path(), body).await
    }

    /// `PUT /api/{resource}/{id}`
    pub async fn update<B: Serialize + ?Sized>(&self, id: impl fmt::Display, body: &B) -> Result<T> {
        self.client
            .put_json(&self.resource.item_path(&id.to_string()), body)
            .await
    }

    /// `DELETE /api/{resource}/{id}`
    pub async fn delete(&self, id: impl fmt::Display) -> Result<ApiResponse> {
        self.client
            .delete(&self.resource.item_path(&id.to_string()))
            .await
    }
}
