//! HTTP client for the Trello REST API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, CatalogEntry, Mutations};
use crate::config::TrelloConfig;
use crate::error::TrelloError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Trello REST client.
pub struct TrelloClient {
    api_key: String,
    token: SecretString,
    base_url: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct NamedRecord {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct LabelRecord {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    color: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MemberRecord {
    id: String,
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    username: String,
}

impl From<NamedRecord> for CatalogEntry {
    fn from(record: NamedRecord) -> Self {
        CatalogEntry::new(record.name, record.id)
    }
}

impl From<LabelRecord> for CatalogEntry {
    fn from(record: LabelRecord) -> Self {
        // Unnamed labels are addressed by their colour.
        let name = if record.name.trim().is_empty() {
            record.color.unwrap_or_default()
        } else {
            record.name
        };
        CatalogEntry::new(name, record.id)
    }
}

impl From<MemberRecord> for CatalogEntry {
    fn from(record: MemberRecord) -> Self {
        let name = if record.full_name.trim().is_empty() {
            record.username
        } else {
            record.full_name
        };
        CatalogEntry::new(name, record.id)
    }
}

impl TrelloClient {
    pub fn new(config: &TrelloConfig) -> Result<Self, TrelloError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TrelloError::Request {
                operation: "HTTP-Client erstellen".into(),
                reason: e.to_string(),
            })?;
        info!(base_url = %config.base_url, "Trello client ready");
        Ok(Self {
            api_key: config.api_key.clone(),
            token: config.token.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/{path}", self.base_url))
            .query(&[
                ("key", self.api_key.as_str()),
                ("token", self.token.expose_secret()),
            ])
    }

    /// Send a request and map transport failures and non-2xx statuses.
    async fn send(
        &self,
        operation: &str,
        builder: RequestBuilder,
    ) -> Result<Response, TrelloError> {
        let response = builder.send().await.map_err(|e| TrelloError::Request {
            operation: operation.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(operation, status = status.as_u16(), body = %body, "Trello request rejected");
            return Err(TrelloError::Status {
                operation: operation.to_string(),
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }
        debug!(operation, status = status.as_u16(), "Trello request ok");
        Ok(response)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        operation: &str,
        builder: RequestBuilder,
    ) -> Result<T, TrelloError> {
        let response = self.send(operation, builder).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| TrelloError::InvalidResponse {
                operation: operation.to_string(),
                reason: e.to_string(),
            })
    }

    async fn fetch_entries<T>(
        &self,
        operation: &str,
        builder: RequestBuilder,
    ) -> Result<Vec<CatalogEntry>, TrelloError>
    where
        T: DeserializeOwned + Into<CatalogEntry>,
    {
        let records: Vec<T> = self.fetch(operation, builder).await?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    async fn update_card(&self, operation: &str, card_id: &str, fields: &[(&str, &str)])
    -> Result<(), TrelloError> {
        let builder = self
            .request(Method::PUT, &format!("cards/{card_id}"))
            .query(fields);
        self.send(operation, builder).await.map(drop)
    }
}

#[async_trait]
impl Catalog for TrelloClient {
    async fn list_boards(&self) -> Result<Vec<CatalogEntry>, TrelloError> {
        let builder = self
            .request(Method::GET, "members/me/boards")
            .query(&[("filter", "open"), ("fields", "name,id")]);
        self.fetch_entries::<NamedRecord>("Boards laden", builder).await
    }

    async fn list_lists(&self, board_id: &str) -> Result<Vec<CatalogEntry>, TrelloError> {
        let builder = self
            .request(Method::GET, &format!("boards/{board_id}/lists"))
            .query(&[("filter", "open"), ("fields", "name,id")]);
        self.fetch_entries::<NamedRecord>("Listen laden", builder).await
    }

    async fn list_cards(&self, list_id: &str) -> Result<Vec<CatalogEntry>, TrelloError> {
        let builder = self
            .request(Method::GET, &format!("lists/{list_id}/cards"))
            .query(&[("fields", "name,id")]);
        self.fetch_entries::<NamedRecord>("Karten laden", builder).await
    }

    async fn list_labels(&self, board_id: &str) -> Result<Vec<CatalogEntry>, TrelloError> {
        let builder = self
            .request(Method::GET, &format!("boards/{board_id}/labels"))
            .query(&[("fields", "name,color,id")]);
        self.fetch_entries::<LabelRecord>("Labels laden", builder).await
    }

    async fn list_members(&self, board_id: &str) -> Result<Vec<CatalogEntry>, TrelloError> {
        let builder = self
            .request(Method::GET, &format!("boards/{board_id}/members"))
            .query(&[("fields", "fullName,username,id")]);
        self.fetch_entries::<MemberRecord>("Mitglieder laden", builder).await
    }
}

#[async_trait]
impl Mutations for TrelloClient {
    async fn create_card(&self, list_id: &str, title: &str, desc: &str)
    -> Result<(), TrelloError> {
        let builder = self
            .request(Method::POST, "cards")
            .query(&[("idList", list_id), ("name", title), ("desc", desc)]);
        self.send("Karte erstellen", builder).await.map(drop)
    }

    async fn create_list(&self, board_id: &str, name: &str) -> Result<(), TrelloError> {
        let builder = self
            .request(Method::POST, "lists")
            .query(&[("idBoard", board_id), ("name", name), ("pos", "bottom")]);
        self.send("Liste erstellen", builder).await.map(drop)
    }

    async fn rename_card(&self, card_id: &str, new_name: &str) -> Result<(), TrelloError> {
        self.update_card("Karte umbenennen", card_id, &[("name", new_name)])
            .await
    }

    async fn rename_list(&self, list_id: &str, new_name: &str) -> Result<(), TrelloError> {
        let builder = self
            .request(Method::PUT, &format!("lists/{list_id}"))
            .query(&[("name", new_name)]);
        self.send("Liste umbenennen", builder).await.map(drop)
    }

    async fn move_card(&self, card_id: &str, target_list_id: &str) -> Result<(), TrelloError> {
        self.update_card("Karte verschieben", card_id, &[("idList", target_list_id)])
            .await
    }

    async fn archive_card(&self, card_id: &str) -> Result<(), TrelloError> {
        self.update_card("Karte archivieren", card_id, &[("closed", "true")])
            .await
    }

    async fn delete_card(&self, card_id: &str) -> Result<(), TrelloError> {
        let builder = self.request(Method::DELETE, &format!("cards/{card_id}"));
        self.send("Karte löschen", builder).await.map(drop)
    }

    async fn add_comment(&self, card_id: &str, text: &str) -> Result<(), TrelloError> {
        let builder = self
            .request(Method::POST, &format!("cards/{card_id}/actions/comments"))
            .query(&[("text", text)]);
        self.send("Kommentar hinzufügen", builder).await.map(drop)
    }

    async fn update_description(&self, card_id: &str, text: &str) -> Result<(), TrelloError> {
        self.update_card("Beschreibung ändern", card_id, &[("desc", text)])
            .await
    }

    async fn set_due_date(&self, card_id: &str, due: Option<NaiveDate>)
    -> Result<(), TrelloError> {
        // Trello clears the due date when `due` is sent empty.
        let value = due.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
        self.update_card("Fälligkeitsdatum setzen", card_id, &[("due", value.as_str())])
            .await
    }

    async fn add_label(&self, card_id: &str, label_id: &str) -> Result<(), TrelloError> {
        let builder = self
            .request(Method::POST, &format!("cards/{card_id}/idLabels"))
            .query(&[("value", label_id)]);
        self.send("Label hinzufügen", builder).await.map(drop)
    }

    async fn remove_label(&self, card_id: &str, label_id: &str) -> Result<(), TrelloError> {
        let builder = self.request(Method::DELETE, &format!("cards/{card_id}/idLabels/{label_id}"));
        self.send("Label entfernen", builder).await.map(drop)
    }

    async fn add_member(&self, card_id: &str, member_id: &str) -> Result<(), TrelloError> {
        let builder = self
            .request(Method::POST, &format!("cards/{card_id}/idMembers"))
            .query(&[("value", member_id)]);
        self.send("Mitglied zuweisen", builder).await.map(drop)
    }

    async fn remove_member(&self, card_id: &str, member_id: &str) -> Result<(), TrelloError> {
        let builder =
            self.request(Method::DELETE, &format!("cards/{card_id}/idMembers/{member_id}"));
        self.send("Mitglied entfernen", builder).await.map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> TrelloClient {
        TrelloClient::new(&TrelloConfig {
            api_key: "key".into(),
            token: SecretString::from("token"),
            base_url: "https://api.trello.com/1/".into(),
        })
        .unwrap()
    }

    #[test]
    fn requests_carry_credentials() {
        let request = client()
            .request(Method::GET, "members/me/boards")
            .build()
            .unwrap();
        assert_eq!(request.url().path(), "/1/members/me/boards");
        let query = request.url().query().unwrap_or_default();
        assert!(query.contains("key=key"));
        assert!(query.contains("token=token"));
    }

    #[test]
    fn label_without_name_uses_colour() {
        let label: LabelRecord =
            serde_json::from_str(r#"{"id": "lab1", "name": "", "color": "red"}"#).unwrap();
        assert_eq!(CatalogEntry::from(label), CatalogEntry::new("red", "lab1"));
    }

    #[test]
    fn member_prefers_full_name() {
        let member: MemberRecord =
            serde_json::from_str(r#"{"id": "m1", "fullName": "Anna Schmidt", "username": "anna"}"#)
                .unwrap();
        assert_eq!(CatalogEntry::from(member), CatalogEntry::new("Anna Schmidt", "m1"));

        let member: MemberRecord =
            serde_json::from_str(r#"{"id": "m2", "fullName": "", "username": "bert"}"#).unwrap();
        assert_eq!(CatalogEntry::from(member).name, "bert");
    }

    #[test]
    fn board_records_ignore_extra_fields() {
        let boards: Vec<NamedRecord> = serde_json::from_str(
            r#"[{"id": "b1", "name": "Haushalt", "closed": false}, {"id": "b2"}]"#,
        )
        .unwrap();
        let entries: Vec<CatalogEntry> = boards.into_iter().map(Into::into).collect();
        assert_eq!(entries[0], CatalogEntry::new("Haushalt", "b1"));
        assert_eq!(entries[1].name, "");
    }
}
