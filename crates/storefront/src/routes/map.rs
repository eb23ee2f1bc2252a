//! Store location map.
//!
//! `GET /mapa` shows the default location. `POST /mapa` recenters the map on
//! submitted coordinates, falling back to the default when they are invalid.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Form, extract::State};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use myshop_core::Coordinates;

use super::cart::{CartSummary, cart_summary};
use crate::error::Result;
use crate::state::AppState;

/// Half-width of the embedded map's bounding box, in degrees.
const VIEW_SPAN: f64 = 0.01;

/// Coordinates as posted by the map form.
#[derive(Debug, Default, Deserialize)]
pub struct MapForm {
    pub lat: Option<String>,
    pub lon: Option<String>,
}

/// Map page template.
#[derive(Template, WebTemplate)]
#[template(path = "map.html")]
pub struct MapTemplate {
    pub cart: CartSummary,
    pub lat: f64,
    pub lon: f64,
    pub embed_url: String,
}

/// `OpenStreetMap` embed URL centered on `coords` with a marker.
fn embed_url(coords: Coordinates) -> String {
    let (lat, lon) = (coords.lat(), coords.lon());
    let south = (lat - VIEW_SPAN).max(-90.0);
    let north = (lat + VIEW_SPAN).min(90.0);
    let west = (lon - VIEW_SPAN).max(-180.0);
    let east = (lon + VIEW_SPAN).min(180.0);

    format!(
        "https://www.openstreetmap.org/export/embed.html?bbox={west},{south},{east},{north}&layer=mapnik&marker={lat},{lon}"
    )
}

/// Resolve the posted form to coordinates, logging rejected input.
fn resolve(form: &MapForm) -> Coordinates {
    Coordinates::parse(form.lat.as_deref(), form.lon.as_deref()).unwrap_or_else(|error| {
        tracing::warn!(
            %error,
            lat = form.lat.as_deref().unwrap_or_default(),
            lon = form.lon.as_deref().unwrap_or_default(),
            "Invalid map coordinates, using default location"
        );
        Coordinates::DEFAULT
    })
}

async fn render(state: &AppState, session: Session, coords: Coordinates) -> Result<MapTemplate> {
    Ok(MapTemplate {
        cart: cart_summary(state, session).await?,
        lat: coords.lat(),
        lon: coords.lon(),
        embed_url: embed_url(coords),
    })
}

/// Display the map at the default location.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<MapTemplate> {
    render(&state, session, Coordinates::DEFAULT).await
}

/// Display the map at the submitted location.
#[instrument(skip(state, session))]
pub async fn locate(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<MapForm>,
) -> Result<MapTemplate> {
    render(&state, session, resolve(&form)).await
}
