//! Street View Static API tool.
//!
//! Lets an agent look around a candidate location. View history lives in a
//! [`StreetViewState`] owned by the caller and passed to every fetch.

use crate::error::{GeoBenchError, Result};
use crate::geo::Coordinate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const STREET_VIEW_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/streetview";

/// Parameters of one Street View image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreetViewRequest {
    pub lat: f64,
    pub lng: f64,
    /// Compass heading in degrees, 0 = north.
    pub heading: f64,
    /// Camera pitch in degrees, 0 = horizontal.
    pub pitch: f64,
    /// Horizontal field of view in degrees.
    pub fov: f64,
}

impl StreetViewRequest {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            heading: 0.0,
            pitch: 0.0,
            fov: 90.0,
        }
    }

    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = heading;
        self
    }

    pub fn with_pitch(mut self, pitch: f64) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn with_fov(mut self, fov: f64) -> Self {
        self.fov = fov;
        self
    }
}

/// A view that was fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRecord {
    pub lat: f64,
    pub lng: f64,
    pub heading: f64,
    pub pitch: f64,
    pub cardinal_direction: String,
}

/// Per-sample view history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreetViewState {
    pub init_heading: f64,
    pub init_pitch: f64,
    pub history: Vec<ViewRecord>,
    pub img_paths: Vec<PathBuf>,
}

/// Eight-point compass direction for a heading in degrees.
pub fn cardinal_direction(heading: f64) -> &'static str {
    const DIRECTIONS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    let sector = ((heading.rem_euclid(360.0) + 22.5) / 45.0).floor() as usize;
    DIRECTIONS[sector % 8]
}

/// Client for the Street View Static API.
pub struct StreetViewTool {
    client: Client,
    api_key: String,
    output_dir: PathBuf,
}

impl StreetViewTool {
    /// Images are written under `output_dir`.
    pub fn new(api_key: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Request URL for a view.
    pub fn url(&self, request: &StreetViewRequest) -> String {
        format!(
            "{}?size=640x640&radius=500&location={},{}&fov={}&heading={}&pitch={}&key={}",
            STREET_VIEW_ENDPOINT,
            request.lat,
            request.lng,
            request.fov,
            request.heading,
            request.pitch,
            self.api_key
        )
    }

    /// Where the image for a view is stored.
    pub fn image_path(&self, request: &StreetViewRequest) -> PathBuf {
        self.output_dir.join(format!(
            "{}_{}_{}_{}.jpg",
            request.lat, request.lng, request.heading, request.pitch
        ))
    }

    /// Fetch one view, save it, and append it to `state`.
    ///
    /// `state` is only updated when the image was written.
    pub async fn fetch(
        &self,
        state: &mut StreetViewState,
        request: StreetViewRequest,
    ) -> Result<PathBuf> {
        if self.api_key.is_empty() {
            return Err(GeoBenchError::StreetView(
                "Google Maps API key is not provided.".to_string(),
            ));
        }
        Coordinate::new(request.lat, request.lng)
            .map_err(|e| GeoBenchError::StreetView(e.to_string()))?;

        let response = self.client.get(self.url(&request)).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            warn!(%status, "street view request failed");
            return Err(GeoBenchError::StreetView(format!(
                "Failed to fetch image: {} - {}",
                status,
                String::from_utf8_lossy(&body)
            )));
        }

        let path = self.image_path(&request);
        write_image(&self.output_dir, &path, &body).await?;
        info!(path = %path.display(), "saved street view image");

        if state.history.is_empty() {
            state.init_heading = request.heading;
            state.init_pitch = request.pitch;
        }
        state.img_paths.push(path.clone());
        state.history.push(ViewRecord {
            lat: request.lat,
            lng: request.lng,
            heading: request.heading,
            pitch: request.pitch,
            cardinal_direction: cardinal_direction(request.heading).to_string(),
        });

        Ok(path)
    }
}

async fn write_image(dir: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| GeoBenchError::io(dir, e))?;
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| GeoBenchError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cardinal_direction() {
        assert_eq!(cardinal_direction(0.0), "N");
        assert_eq!(cardinal_direction(22.4), "N");
        assert_eq!(cardinal_direction(22.5), "NE");
        assert_eq!(cardinal_direction(90.0), "E");
        assert_eq!(cardinal_direction(180.0), "S");
        assert_eq!(cardinal_direction(270.0), "W");
        assert_eq!(cardinal_direction(337.5), "N");
        assert_eq!(cardinal_direction(359.0), "N");
        assert_eq!(cardinal_direction(-90.0), "W");
        assert_eq!(cardinal_direction(405.0), "NE");
    }

    #[test]
    fn test_url_and_image_path() {
        let tool = StreetViewTool::new("KEY", "output");
        let request = StreetViewRequest::new(48.85, 2.35)
            .with_heading(90.0)
            .with_pitch(10.0)
            .with_fov(100.0);

        assert_eq!(
            tool.url(&request),
            "https://maps.googleapis.com/maps/api/streetview?size=640x640&radius=500&location=48.85,2.35&fov=100&heading=90&pitch=10&key=KEY"
        );
        assert_eq!(
            tool.image_path(&request),
            PathBuf::from("output").join("48.85_2.35_90_10.jpg")
        );
    }

    #[test]
    fn test_request_defaults() {
        let request = StreetViewRequest::new(1.0, 2.0);
        assert_eq!(request.heading, 0.0);
        assert_eq!(request.pitch, 0.0);
        assert_eq!(request.fov, 90.0);
    }

    #[test]
    fn test_fetch_requires_api_key() {
        let dir = TempDir::new().unwrap();
        let tool = StreetViewTool::new("", dir.path());
        let mut state = StreetViewState::default();

        let result = tokio_test::block_on(tool.fetch(&mut state, StreetViewRequest::new(1.0, 2.0)));
        assert!(matches!(result, Err(GeoBenchError::StreetView(_))));
        assert!(state.history.is_empty());
        assert!(state.img_paths.is_empty());
    }

    #[test]
    fn test_fetch_rejects_invalid_location() {
        let dir = TempDir::new().unwrap();
        let tool = StreetViewTool::new("KEY", dir.path());
        let mut state = StreetViewState::default();

        let result = tokio_test::block_on(tool.fetch(&mut state, StreetViewRequest::new(120.0, 2.0)));
        assert!(matches!(result, Err(GeoBenchError::StreetView(_))));
        assert!(state.history.is_empty());
    }
}
