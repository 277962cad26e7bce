//! Order encoding preview. Builds the exact `pedido.incluir` form without calling the ERP.

use axum::{
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};

use crate::erp::{FormValue, NestedPayload, TinyClient};

const HIDDEN_TOKEN: &str = "***HIDDEN***";

fn order_checks(order: &Value) -> Value {
    let cliente = order.get("cliente");
    let itens = order.get("itens").and_then(Value::as_array);
    json!({
        "has_cliente": cliente.is_some(),
        "cliente_nome": cliente.and_then(|c| c.get("nome")).cloned().unwrap_or(Value::Null),
        "has_itens": itens.is_some(),
        "item_count": itens.map(Vec::len).unwrap_or(0),
    })
}

/// POST /debug/pedido/preview
pub async fn preview_order(body: Bytes) -> Response {
    let order: Value = match serde_json::from_slice(&body) {
        Ok(order) => order,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "detail": "Invalid JSON" })),
            )
                .into_response()
        }
    };

    let payload = match NestedPayload::from_argument("pedido", Some(&order)) {
        Ok(payload) => payload,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "detail": e.to_string() })),
            )
                .into_response()
        }
    };

    let checks = order_checks(payload.value());
    let form = TinyClient::order_form(payload);
    let serialized = form
        .get("pedido")
        .map(FormValue::as_str)
        .unwrap_or_default()
        .to_string();

    let wire: Map<String, Value> = form
        .into_form(HIDDEN_TOKEN)
        .into_iter()
        .map(|(name, value)| (name, Value::String(value)))
        .collect();

    Json(json!({
        "status": "preview",
        "endpoint": "pedido.incluir",
        "serialized": serialized,
        "form": wire,
        "checks": checks,
    }))
    .into_response()
}
