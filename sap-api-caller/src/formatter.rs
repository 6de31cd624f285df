//! Conversion of raw OData v2 responses into product group records.
//!
//! Responses have the shape:
//! ```json
//! {
//!   "d": {
//!     "results": [
//!       {
//!         "MaterialGroup": "A001",
//!         "to_Text": { "__deferred": { "uri": "https://.../A_ProductGroup('A001')/to_Text" } }
//!       }
//!     ]
//!   }
//! }
//! ```

use crate::errors::ConvertError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Above this many results the conversion logs the count.
const LARGE_RESULT_THRESHOLD: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProductGroup {
    pub material_group: String,
    /// Deferred navigation URI to the text entity, when returned
    pub to_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProductGroupText {
    pub material_group: String,
    pub language: String,
    pub material_group_name: String,
    pub material_group_text: String,
}

#[derive(Deserialize)]
struct ODataResponse<T> {
    d: ODataResults<T>,
}

#[derive(Deserialize)]
struct ODataResults<T> {
    results: Vec<T>,
}

#[derive(Deserialize)]
struct Deferred {
    #[serde(rename = "__deferred")]
    deferred: DeferredUri,
}

#[derive(Deserialize)]
struct DeferredUri {
    uri: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawProductGroup {
    material_group: String,
    #[serde(rename = "to_Text")]
    to_text: Option<Deferred>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawProductGroupText {
    material_group: String,
    language: String,
    #[serde(default)]
    material_group_name: String,
    #[serde(default)]
    material_group_text: String,
}

fn parse_results<T: DeserializeOwned>(
    raw: &[u8],
    entity: &'static str,
) -> Result<Vec<T>, ConvertError> {
    let response: ODataResponse<T> = serde_json::from_slice(raw)
        .map_err(|source| ConvertError::Unmarshal { entity, source })?;

    let results = response.d.results;
    if results.is_empty() {
        return Err(ConvertError::NoResults);
    }
    if results.len() > LARGE_RESULT_THRESHOLD {
        tracing::info!(
            entity,
            count = results.len(),
            "raw data has more than {LARGE_RESULT_THRESHOLD} results"
        );
    }
    Ok(results)
}

pub fn convert_to_product_group(raw: &[u8]) -> Result<Vec<ProductGroup>, ConvertError> {
    let results: Vec<RawProductGroup> = parse_results(raw, "ProductGroup")?;

    Ok(results
        .into_iter()
        .map(|r| ProductGroup {
            material_group: r.material_group,
            to_text: r.to_text.map(|d| d.deferred.uri),
        })
        .collect())
}

pub fn convert_to_product_group_text(raw: &[u8]) -> Result<Vec<ProductGroupText>, ConvertError> {
    let results: Vec<RawProductGroupText> = parse_results(raw, "ProductGroupText")?;

    Ok(results
        .into_iter()
        .map(|r| ProductGroupText {
            material_group: r.material_group,
            language: r.language,
            material_group_name: r.material_group_name,
            material_group_text: r.material_group_text,
        })
        .collect())
}
