//! The profile endpoints: viewing and editing the caller's account details
//! and managing their profile picture.

use axum::{
    extract::{Json, Multipart, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use time::OffsetDateTime;

use crate::{
    auth::Claims,
    error::require_field,
    stores::{ProfileUpdate, UserStore},
    AppState, Error,
};

/// The fields for a profile update request. Omitted fields are left
/// unchanged.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileForm {
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

/// Handler for reading the caller's profile.
pub async fn get_profile(State(state): State<AppState>, claims: Claims) -> Result<Response, Error> {
    let user = state.user_store.get(claims.user_id())?;

    Ok(Json(json!({
        "success": true,
        "user": user.to_view(),
    }))
    .into_response())
}

/// Handler for updating the caller's profile.
///
/// # Errors
/// Returns [Error::MissingField] if a supplied field is blank.
pub async fn update_profile(
    State(state): State<AppState>,
    claims: Claims,
    Json(form): Json<UpdateProfileForm>,
) -> Result<Response, Error> {
    if let Some(full_name) = &form.full_name {
        require_field(full_name, "fullName")?;
    }
    if let Some(phone) = &form.phone {
        require_field(phone, "phone")?;
    }

    let user = state.user_store.update_profile(
        claims.user_id(),
        ProfileUpdate {
            full_name: form.full_name,
            phone: form.phone,
        },
    )?;

    Ok(Json(json!({
        "success": true,
        "message": "profile updated",
        "user": user.to_view(),
    }))
    .into_response())
}

/// Handler for uploading a profile picture.
///
/// Stores the new image first and only then replaces the user's avatar, so a
/// storage failure leaves the old picture in place. The old stored object is
/// deleted best-effort afterwards.
///
/// # Errors
/// Returns [Error::MultipartError] if the form has no file field, or
/// [Error::NotAnImage] if the uploaded file is not an image.
pub async fn upload_picture(
    State(state): State<AppState>,
    claims: Claims,
    mut multipart: Multipart,
) -> Result<Response, Error> {
    let field = multipart
        .next_field()
        .await
        .map_err(|error| Error::MultipartError(error.to_string()))?
        .ok_or_else(|| Error::MultipartError("no file in form".to_owned()))?;

    let content_type = field
        .content_type()
        .ok_or(Error::NotAnImage)?
        .to_owned();

    let Some(subtype) = content_type.strip_prefix("image/") else {
        return Err(Error::NotAnImage);
    };
    let extension = subtype.to_owned();

    let bytes = field
        .bytes()
        .await
        .map_err(|error| Error::MultipartError(error.to_string()))?;

    let user_id = claims.user_id();
    let old_avatar_key = state.user_store.get(user_id)?.avatar_key;

    let key = format!(
        "avatars/{user_id}-{}.{extension}",
        OffsetDateTime::now_utc().unix_timestamp_nanos()
    );
    let stored = state.object_storage.put(&key, &content_type, &bytes)?;

    let user = state
        .user_store
        .set_avatar(user_id, &stored.url, &stored.key)?;

    if let Some(old_key) = old_avatar_key {
        if let Err(error) = state.object_storage.delete(&old_key) {
            tracing::warn!("could not delete replaced avatar {old_key}: {error}");
        }
    }

    Ok(Json(json!({
        "success": true,
        "message": "profile picture updated",
        "user": user.to_view(),
    }))
    .into_response())
}

/// Handler for deleting the caller's profile picture.
///
/// # Errors
/// Returns [Error::NoAvatar] if the user has no picture to delete.
pub async fn delete_picture(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Response, Error> {
    let user_id = claims.user_id();
    let user = state.user_store.get(user_id)?;

    let Some(avatar_key) = user.avatar_key else {
        return Err(Error::NoAvatar);
    };

    if let Err(error) = state.object_storage.delete(&avatar_key) {
        tracing::warn!("could not delete avatar {avatar_key}: {error}");
    }

    let user = state.user_store.clear_avatar(user_id)?;

    Ok(Json(json!({
        "success": true,
        "message": "profile picture deleted",
        "user": user.to_view(),
    }))
    .into_response())
}

#[cfg(test)]
mod profile_tests {
    use axum::{
        routing::{get, post, put},
        Router,
    };
    use axum_test::{
        multipart::{MultipartForm, Part},
        TestServer,
    };
    use serde_json::{json, Value};

    use crate::{
        app_state::test_state::get_test_state,
        auth::encode_session_token,
        models::{PasswordHash, User},
        stores::{NewUser, UserStore},
        AppState,
    };

    use super::{delete_picture, get_profile, update_profile, upload_picture};

    fn get_test_server(state: AppState) -> TestServer {
        let app = Router::new()
            .route("/api/profile", get(get_profile).put(update_profile))
            .route(
                "/api/profile/picture",
                post(upload_picture).delete(delete_picture),
            )
            .with_state(state);

        TestServer::new(app)
    }

    fn insert_test_user(state: &AppState) -> (User, String) {
        let user = state
            .user_store
            .create(NewUser {
                full_name: "Jane Doe".to_owned(),
                email: "foo@bar.baz".parse().unwrap(),
                phone: "021555123".to_owned(),
                password_hash: PasswordHash::from_raw_password("hunter22", 4).unwrap(),
            })
            .unwrap();
        let token = encode_session_token(user.id, &state.jwt_keys).unwrap();

        (user, token)
    }

    fn png_form() -> MultipartForm {
        MultipartForm::new().add_part(
            "avatar",
            Part::bytes(vec![0x89, b'P', b'N', b'G'])
                .file_name("avatar.png")
                .mime_type("image/png"),
        )
    }

    #[tokio::test]
    async fn get_profile_returns_user_view() {
        let state = get_test_state();
        let (_, token) = insert_test_user(&state);
        let server = get_test_server(state);

        let response = server
            .get("/api/profile")
            .authorization_bearer(token)
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["user"]["fullName"], json!("Jane Doe"));
        assert!(body["user"].get("password").is_none());
    }

    #[tokio::test]
    async fn update_profile_changes_only_supplied_fields() {
        let state = get_test_state();
        let (_, token) = insert_test_user(&state);
        let server = get_test_server(state);

        let response = server
            .put("/api/profile")
            .authorization_bearer(token)
            .json(&json!({"phone": "0800838383"}))
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["user"]["phone"], json!("0800838383"));
        assert_eq!(body["user"]["fullName"], json!("Jane Doe"));
    }

    #[tokio::test]
    async fn update_profile_rejects_blank_name() {
        let state = get_test_state();
        let (_, token) = insert_test_user(&state);
        let server = get_test_server(state);

        server
            .put("/api/profile")
            .authorization_bearer(token)
            .json(&json!({"fullName": "   "}))
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn upload_sets_avatar_url() {
        let state = get_test_state();
        let (_, token) = insert_test_user(&state);
        let server = get_test_server(state);

        let response = server
            .post("/api/profile/picture")
            .authorization_bearer(token)
            .multipart(png_form())
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert!(body["user"]["avatarUrl"]
            .as_str()
            .is_some_and(|url| url.contains("avatars/")));
    }

    #[tokio::test]
    async fn upload_rejects_non_image() {
        let state = get_test_state();
        let (_, token) = insert_test_user(&state);
        let server = get_test_server(state);

        let form = MultipartForm::new().add_part(
            "avatar",
            Part::bytes(b"not an image".to_vec())
                .file_name("notes.txt")
                .mime_type("text/plain"),
        );

        server
            .post("/api/profile/picture")
            .authorization_bearer(token)
            .multipart(form)
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn delete_removes_avatar() {
        let state = get_test_state();
        let (_, token) = insert_test_user(&state);
        let server = get_test_server(state);

        server
            .post("/api/profile/picture")
            .authorization_bearer(token.clone())
            .multipart(png_form())
            .await
            .assert_status_ok();

        let response = server
            .delete("/api/profile/picture")
            .authorization_bearer(token)
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["user"]["avatarUrl"], json!(null));
    }

    #[tokio::test]
    async fn delete_fails_without_avatar() {
        let state = get_test_state();
        let (_, token) = insert_test_user(&state);
        let server = get_test_server(state);

        server
            .delete("/api/profile/picture")
            .authorization_bearer(token)
            .await
            .assert_status_bad_request();
    }
}
