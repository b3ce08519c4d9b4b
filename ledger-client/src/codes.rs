//! Reference code endpoints

use crate::LedgerClient;
use crate::error::Result;
use ledger_core::domain::code::{CodeType, SystemCode};
use ledger_core::dto::code::{CreateCodeType, CreateSystemCode, UpdateSystemCode};
use serde::Deserialize;

#[derive(Deserialize)]
struct ResolvedCode {
    code_id: i64,
}

impl LedgerClient {
    pub async fn list_code_types(&self) -> Result<Vec<CodeType>> {
        let response = self.client.get(self.url("/code-types")).send().await?;
        self.handle_response(response).await
    }

    pub async fn create_code_type(&self, req: CreateCodeType) -> Result<CodeType> {
        let response = self
            .client
            .post(self.url("/code-types"))
            .json(&req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// List codes, optionally for one type and only active ones
    pub async fn list_codes(
        &self,
        code_type: Option<&str>,
        active_only: bool,
    ) -> Result<Vec<SystemCode>> {
        let mut request = self
            .client
            .get(self.url("/codes"))
            .query(&[("active_only", active_only)]);

        if let Some(code_type) = code_type {
            request = request.query(&[("code_type", code_type)]);
        }

        let response = request.send().await?;
        self.handle_response(response).await
    }

    pub async fn get_code(&self, code_id: i64) -> Result<SystemCode> {
        let response = self
            .client
            .get(self.url(&format!("/codes/{}", code_id)))
            .send()
            .await?;

        self.handle_response(response).await
    }

    pub async fn create_code(&self, req: CreateSystemCode) -> Result<SystemCode> {
        let response = self
            .client
            .post(self.url("/codes"))
            .json(&req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    pub async fn update_code(&self, code_id: i64, req: UpdateSystemCode) -> Result<SystemCode> {
        let response = self
            .client
            .put(self.url(&format!("/codes/{}", code_id)))
            .json(&req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    pub async fn deactivate_code(&self, code_id: i64) -> Result<()> {
        let response = self
            .client
            .post(self.url(&format!("/codes/{}/deactivate", code_id)))
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Delete a code
    ///
    /// Refused with a conflict while anything references the code.
    pub async fn delete_code(&self, code_id: i64) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/codes/{}", code_id)))
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Resolve an active code to its id
    pub async fn resolve_code(&self, code_type: &str, common_cd: &str) -> Result<i64> {
        let response = self
            .client
            .get(self.url(&format!("/codes/resolve/{}/{}", code_type, common_cd)))
            .send()
            .await?;

        let resolved: ResolvedCode = self.handle_response(response).await?;
        Ok(resolved.code_id)
    }
}
