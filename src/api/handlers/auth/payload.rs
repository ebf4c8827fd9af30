//! Authorization payload assembly.
//!
//! Pure read composition: operator profile plus the operator's module and
//! capability grants for their company. Login, verify, and resolve-session
//! all return exactly this shape. Field names keep the legacy wire contract
//! the frontend already speaks.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use tracing::{info_span, Instrument};
use utoipa::ToSchema;

/// Public profile of an operator. The password hash never leaves storage.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct OperatorProfile {
    pub id: i64,
    pub username: String,
    #[serde(rename = "nombre")]
    pub full_name: Option<String>,
    pub email: String,
    #[serde(rename = "id_empresa")]
    pub company_id: i64,
    #[serde(rename = "fecha_creacion")]
    pub created_at: DateTime<Utc>,
}

/// A module the operator may open, enabled for their company.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ModuleGrant {
    #[serde(rename = "nombre_menu")]
    pub menu_name: String,
    #[serde(rename = "id_modulo")]
    pub module_id: i64,
    pub icon: Option<String>,
}

/// A menu entry / capability granted to the operator.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CapabilityGrant {
    pub id: i64,
    pub url: String,
    #[serde(rename = "texto")]
    pub label: String,
    #[serde(rename = "etiqueta")]
    pub tag: Option<String>,
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
    #[serde(rename = "nivel_menu")]
    pub menu_level: i32,
    #[serde(rename = "orden")]
    pub position: i32,
    #[serde(rename = "modificable")]
    pub editable: bool,
    #[serde(rename = "separador_up")]
    pub separator_above: bool,
    #[serde(rename = "id_modulo")]
    pub module_id: i64,
}

/// Response shape shared by login, verify, and resolve-session.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AuthPayload {
    #[serde(rename = "operador")]
    pub operator: OperatorProfile,
    #[serde(rename = "modulos")]
    pub modules: Vec<ModuleGrant>,
    #[serde(rename = "funcionalidades")]
    pub capabilities: Vec<CapabilityGrant>,
}

pub(super) async fn build_payload(
    pool: &PgPool,
    operator_id: i64,
    company_id: i64,
) -> Result<AuthPayload> {
    let operator = fetch_operator_profile(pool, operator_id)
        .await?
        .context("operator row disappeared during payload assembly")?;
    let modules = fetch_module_grants(pool, operator_id, company_id).await?;
    let capabilities = fetch_capability_grants(pool, operator_id).await?;

    Ok(AuthPayload {
        operator,
        modules,
        capabilities,
    })
}

async fn fetch_operator_profile(
    pool: &PgPool,
    operator_id: i64,
) -> Result<Option<OperatorProfile>> {
    let query = r"
        SELECT id, username, full_name, email, company_id, created_at
        FROM operators
        WHERE id = $1
        LIMIT 1
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(operator_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to fetch operator profile")?;

    Ok(row.map(|row| OperatorProfile {
        id: row.get("id"),
        username: row.get("username"),
        full_name: row.get("full_name"),
        email: row.get("email"),
        company_id: row.get("company_id"),
        created_at: row.get("created_at"),
    }))
}

async fn fetch_module_grants(
    pool: &PgPool,
    operator_id: i64,
    company_id: i64,
) -> Result<Vec<ModuleGrant>> {
    let query = r"
        SELECT m.menu_name, m.id AS module_id, m.icon
        FROM operator_modules om
        JOIN company_modules cm
          ON cm.module_id = om.module_id
         AND cm.company_id = $2
         AND cm.active
        JOIN modules m
          ON m.id = om.module_id
         AND m.active
        WHERE om.operator_id = $1
        ORDER BY m.position
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .bind(operator_id)
        .bind(company_id)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to fetch module grants")?;

    Ok(rows
        .into_iter()
        .map(|row| ModuleGrant {
            menu_name: row.get("menu_name"),
            module_id: row.get("module_id"),
            icon: row.get("icon"),
        })
        .collect())
}

async fn fetch_capability_grants(pool: &PgPool, operator_id: i64) -> Result<Vec<CapabilityGrant>> {
    let query = r"
        SELECT c.id, c.url, c.label, c.tag, c.description,
               c.menu_level, c.position, c.editable, c.separator_above,
               c.module_id
        FROM operator_capabilities oc
        JOIN capabilities c ON c.id = oc.capability_id
        WHERE oc.operator_id = $1
        ORDER BY c.module_id, c.position
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .bind(operator_id)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to fetch capability grants")?;

    Ok(rows
        .into_iter()
        .map(|row| CapabilityGrant {
            id: row.get("id"),
            url: row.get("url"),
            label: row.get("label"),
            tag: row.get("tag"),
            description: row.get("description"),
            menu_level: row.get("menu_level"),
            position: row.get("position"),
            editable: row.get("editable"),
            separator_above: row.get("separator_above"),
            module_id: row.get("module_id"),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::{AuthPayload, CapabilityGrant, ModuleGrant, OperatorProfile};
    use anyhow::{Context, Result};
    use chrono::Utc;

    fn sample_payload() -> AuthPayload {
        AuthPayload {
            operator: OperatorProfile {
                id: 1,
                username: "ana".to_string(),
                full_name: Some("Ana Rojas".to_string()),
                email: "ana@example.com".to_string(),
                company_id: 9,
                created_at: Utc::now(),
            },
            modules: vec![ModuleGrant {
                menu_name: "Logística".to_string(),
                module_id: 4,
                icon: Some("truck".to_string()),
            }],
            capabilities: vec![CapabilityGrant {
                id: 11,
                url: "/logistica/bodegas/".to_string(),
                label: "Bodegas".to_string(),
                tag: None,
                description: None,
                menu_level: 1,
                position: 2,
                editable: true,
                separator_above: false,
                module_id: 4,
            }],
        }
    }

    #[test]
    fn payload_uses_legacy_wire_keys() -> Result<()> {
        let value = serde_json::to_value(sample_payload())?;

        let operator = value.get("operador").context("missing operador")?;
        assert_eq!(
            operator.get("username").and_then(serde_json::Value::as_str),
            Some("ana")
        );
        assert_eq!(
            operator.get("id_empresa").and_then(serde_json::Value::as_i64),
            Some(9)
        );
        // The hash must never appear anywhere in the payload.
        assert!(value.to_string().to_lowercase().find("password").is_none());

        let modules = value
            .get("modulos")
            .and_then(serde_json::Value::as_array)
            .context("missing modulos")?;
        assert_eq!(
            modules[0].get("nombre_menu").and_then(serde_json::Value::as_str),
            Some("Logística")
        );

        let capabilities = value
            .get("funcionalidades")
            .and_then(serde_json::Value::as_array)
            .context("missing funcionalidades")?;
        assert_eq!(
            capabilities[0].get("texto").and_then(serde_json::Value::as_str),
            Some("Bodegas")
        );
        assert_eq!(
            capabilities[0]
                .get("nivel_menu")
                .and_then(serde_json::Value::as_i64),
            Some(1)
        );
        Ok(())
    }

    #[test]
    fn payload_round_trips() -> Result<()> {
        let value = serde_json::to_value(sample_payload())?;
        let decoded: AuthPayload = serde_json::from_value(value)?;
        assert_eq!(decoded.operator.username, "ana");
        assert_eq!(decoded.modules.len(), 1);
        assert_eq!(decoded.capabilities.len(), 1);
        Ok(())
    }
}
