use super::handlers::{admin, auth, chirps, health, users};
use utoipa::{
    Modify, OpenApi,
    openapi::{
        Contact, InfoBuilder, License,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};

/// Every documented route is listed here and registered in [`super::router`].
#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthz,
        health::health,
        users::create_user,
        users::update_user,
        auth::session::login,
        auth::session::refresh,
        auth::session::revoke,
        chirps::validate_chirp,
        chirps::create_chirp,
        chirps::list_chirps,
        chirps::get_chirp,
        chirps::delete_chirp,
        admin::metrics,
        admin::reset,
    ),
    components(schemas(
        health::Health,
        users::UserResponse,
        users::UserCredentials,
        auth::types::LoginRequest,
        auth::types::LoginResponse,
        auth::types::TokenResponse,
        chirps::ChirpRequest,
        chirps::ChirpResponse,
        chirps::ValidateChirpResponse,
        admin::ResetResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Readiness and build information"),
        (name = "users", description = "Registration and profile updates"),
        (name = "auth", description = "Login, token refresh and logout"),
        (name = "chirps", description = "Short posts"),
        (name = "admin", description = "File server metrics and dev reset")
    )
)]
struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info = cargo_info();
    doc
}

fn cargo_info() -> utoipa::openapi::Info {
    // Use Cargo.toml metadata instead of the derive defaults.
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.contact = cargo_contact();
    info.license = cargo_license();
    info
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(';').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    if let Some(start) = author.find('<') {
        let name = author[..start].trim();
        let email = author[start + 1..].trim_end_matches('>').trim();
        let name = if name.is_empty() { None } else { Some(name) };
        let email = if email.is_empty() { None } else { Some(email) };
        (name, email)
    } else {
        let name = author.trim();
        (if name.is_empty() { None } else { Some(name) }, None)
    }
}
