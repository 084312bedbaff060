use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{Map, Value};

use crate::{
    error::AppError,
    models::user::UserData,
    state::AppState,
    types::UserId,
    validation::{handle, normalize::filter_parameters, validated, InputBag, UserRequest},
};

pub async fn store_user(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<UserData>), AppError> {
    let input = into_input(payload)?;
    let data = handle(&UserRequest::store(), input, state.presence.as_ref())?;
    Ok((StatusCode::CREATED, Json(data)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<UserData>, AppError> {
    let target: UserId = user_id
        .parse()
        .map_err(|_| AppError::NotFound("User not found".to_string()))?;
    let input = into_input(payload)?;
    let data = handle(&UserRequest::update(target), input, state.presence.as_ref())?;
    Ok(Json(data))
}

/// Validates listing parameters and returns the ones that shape the query.
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, AppError> {
    let input = query_to_input(params);
    let data = validated(&UserRequest::index(), input, state.presence.as_ref())?;
    Ok(Json(serde_json::json!({ "filters": filter_parameters(&data) })))
}

fn into_input(payload: Value) -> Result<InputBag, AppError> {
    match payload {
        Value::Object(map) => Ok(map),
        _ => Err(AppError::BadRequest(
            "Request body must be a JSON object".to_string(),
        )),
    }
}

/// Builds nested input from query pairs: `filter[status]=x` becomes
/// `{"filter": {"status": "x"}}` and `roles[]=1` appends to an array.
/// Later plain keys overwrite earlier ones.
pub fn query_to_input(params: Vec<(String, String)>) -> InputBag {
    let mut input = InputBag::new();
    for (key, value) in params {
        let value = Value::String(value);
        match split_bracket(&key) {
            Some((root, "")) => match input
                .entry(root.to_string())
                .or_insert_with(|| Value::Array(Vec::new()))
            {
                Value::Array(items) => items.push(value),
                slot => *slot = Value::Array(vec![value]),
            },
            Some((root, sub)) => {
                let slot = input
                    .entry(root.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if !slot.is_object() {
                    *slot = Value::Object(Map::new());
                }
                if let Value::Object(nested) = slot {
                    nested.insert(sub.to_string(), value);
                }
            }
            None => {
                input.insert(key, value);
            }
        }
    }
    input
}

fn split_bracket(key: &str) -> Option<(&str, &str)> {
    let (root, rest) = key.split_once('[')?;
    let sub = rest.strip_suffix(']')?;
    (!root.is_empty() && !sub.contains(['[', ']'])).then_some((root, sub))
}
