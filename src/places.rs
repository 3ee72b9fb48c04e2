//! Places-autocomplete adapter.
//!
//! Backs the address field on the profile form: partial input to ranked
//! suggestions, then a place id to a formatted address once one is picked.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct PlacesConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
    /// Region codes suggestions are restricted to.
    pub region_codes: Vec<String>,
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            base_url: "https://places.googleapis.com/v1".to_string(),
            api_key: String::new(),
            timeout_secs: 10,
            region_codes: vec!["US".to_string()],
        }
    }
}

#[derive(Debug)]
pub enum PlacesError {
    Http(reqwest::Error),
    /// Place-details response without the requested field.
    MissingAddress,
}

impl From<reqwest::Error> for PlacesError {
    fn from(err: reqwest::Error) -> Self {
        PlacesError::Http(err)
    }
}

impl fmt::Display for PlacesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacesError::Http(err) => write!(f, "places request failed: {}", err),
            PlacesError::MissingAddress => write!(f, "place has no formatted address"),
        }
    }
}

impl std::error::Error for PlacesError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlacesError::Http(err) => Some(err),
            PlacesError::MissingAddress => None,
        }
    }
}

/// One autocomplete suggestion: display text plus the id to resolve it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceSuggestion {
    pub place_id: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct PlacesClient {
    config: PlacesConfig,
    client: reqwest::blocking::Client,
}

impl PlacesClient {
    pub fn new(config: PlacesConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Suggestions for a partial address. Inputs of two characters or
    /// fewer short-circuit to an empty list; the form debounces at the
    /// same length.
    pub fn autocomplete(&self, input: &str) -> Result<Vec<PlaceSuggestion>, PlacesError> {
        if input.chars().count() <= 2 {
            return Ok(Vec::new());
        }

        let url = format!("{}/places:autocomplete", self.config.base_url);
        let request = AutocompleteRequest {
            input,
            included_region_codes: &self.config.region_codes,
        };

        let body: AutocompleteResponse = self
            .client
            .post(url)
            .header("X-Goog-Api-Key", &self.config.api_key)
            .json(&request)
            .send()?
            .error_for_status()?
            .json()?;

        let suggestions = body
            .suggestions
            .into_iter()
            .map(|s| PlaceSuggestion {
                place_id: s.place_prediction.place_id,
                text: s.place_prediction.text.text,
            })
            .collect::<Vec<_>>();
        debug!(input, count = suggestions.len(), "autocomplete");
        Ok(suggestions)
    }

    /// Resolves a picked suggestion to its formatted address.
    pub fn formatted_address(&self, place_id: &str) -> Result<String, PlacesError> {
        let url = format!(
            "{}/places/{}?fields=formattedAddress&key={}",
            self.config.base_url, place_id, self.config.api_key
        );

        let body: PlaceDetailsResponse = self
            .client
            .get(url)
            .send()?
            .error_for_status()?
            .json()?;

        body.formatted_address.ok_or(PlacesError::MissingAddress)
    }
}

#[derive(Debug, Serialize)]
struct AutocompleteRequest<'a> {
    input: &'a str,
    #[serde(rename = "includedRegionCodes")]
    included_region_codes: &'a [String],
}

#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    #[serde(default)]
    suggestions: Vec<SuggestionWire>,
}

#[derive(Debug, Deserialize)]
struct SuggestionWire {
    #[serde(rename = "placePrediction")]
    place_prediction: PlacePrediction,
}

#[derive(Debug, Deserialize)]
struct PlacePrediction {
    #[serde(rename = "placeId")]
    place_id: String,
    text: PredictionText,
}

#[derive(Debug, Deserialize)]
struct PredictionText {
    text: String,
}

#[derive(Debug, Deserialize)]
struct PlaceDetailsResponse {
    #[serde(rename = "formattedAddress")]
    formatted_address: Option<String>,
}
