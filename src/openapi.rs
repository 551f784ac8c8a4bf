use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::models::{ClassEntry, ClassPayload, NextClass, NotesPayload, UnitNotes, UnitSummary};

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        components.add_security_scheme(
            "query_token",
            SecurityScheme::ApiKey(ApiKey::Query(ApiKeyValue::new("token"))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz_live,
        crate::handlers::healthz_ready,
        crate::handlers::list_timetable,
        crate::handlers::create_class,
        crate::handlers::get_class,
        crate::handlers::update_class,
        crate::handlers::delete_class,
        crate::handlers::put_class_notes,
        crate::handlers::next_class,
        crate::handlers::classes_for_day,
        crate::handlers::get_ical,
        crate::handlers::list_units,
        crate::handlers::unit_classes,
        crate::handlers::get_unit_notes,
        crate::handlers::put_unit_notes
    ),
    components(schemas(
        ClassEntry,
        ClassPayload,
        UnitSummary,
        NextClass,
        UnitNotes,
        NotesPayload
    )),
    tags(
        (name = "timetable", description = "Class timetable and reminder operations"),
        (name = "units", description = "Per-unit views and notes")
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;
